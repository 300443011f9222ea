// Shared test support code for unit and integration tests.

pub mod provider;
pub mod registry;
pub mod remote;

pub use provider::{ProviderServer, StubService};
pub use registry::RecordingRegistry;
pub use remote::FakeRemote;
