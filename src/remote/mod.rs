//! Remote service control: the provider API behind a small trait.

pub mod info;
pub mod render;


use crate::model::ServiceStatus;

// Re-export main types
pub use info::ServiceInfo;
pub use render::RenderClient;

/// Control-plane operations on remote services.
///
/// Implementations absorb every transport fault: a failed lookup is `None`, a
/// failed operation is `false`. Callers never see why a call failed.
#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    /// Looks a service up on the provider.
    async fn fetch(&self, service_id: &str) -> Option<ServiceInfo>;

    /// Suspends a service, returning whether the provider confirmed it.
    async fn set_suspended(&self, service_id: &str) -> bool;

    /// Resumes a suspended service.
    async fn set_resumed(&self, service_id: &str) -> bool;

    /// Restarts a service.
    async fn restart(&self, service_id: &str) -> bool;

    /// Live status derived from [`RemoteClient::fetch`].
    async fn current_status(&self, service_id: &str) -> ServiceStatus {
        self.fetch(service_id)
            .await
            .map(|info| info.status())
            .unwrap_or(ServiceStatus::Unknown)
    }
}
