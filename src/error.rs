//! Errors surfaced by core operations to the command surface.
//!
//! Remote failures are not part of this taxonomy: the remote client absorbs
//! them into absent/false results and the executor records them as failed
//! attempts.

use crate::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error("service {0} not found")]
    NotFound(String),
    #[error("user {0} is not authorized")]
    Unauthorized(i64),
    #[error(transparent)]
    Persistence(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, OpsError>;
