//! Service registry: persistent records, ownership and the audit log.

pub mod sqlite;


use crate::model::{AuditLogEntry, ServiceRecord, ServiceStatus, UnknownValueError};

// Re-export main types
pub use sqlite::SqliteRegistry;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("corrupt record {service_id}: {source}")]
    Corrupt {
        service_id: String,
        #[source]
        source: UnknownValueError,
    },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Store of service records. Every write is atomic per record.
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Creates the record or refreshes its name, adding `owner_id` to the owners.
    async fn upsert(&self, service_id: &str, name: &str, owner_id: i64) -> Result<()>;

    /// Records owned by `owner_id`, or every record when `None`.
    async fn list_for(&self, owner_id: Option<i64>) -> Result<Vec<ServiceRecord>>;

    /// Point lookup.
    async fn get(&self, service_id: &str) -> Result<Option<ServiceRecord>>;

    /// Overwrites the cached status.
    async fn set_status(&self, service_id: &str, status: ServiceStatus) -> Result<()>;

    /// Appends an audit entry.
    async fn append_log(&self, entry: &AuditLogEntry) -> Result<()>;

    /// Deletes a record with its ownership. Audit entries stay.
    async fn remove(&self, service_id: &str) -> Result<bool>;

    /// Most recent audit entries of a service, newest first.
    async fn logs_for(&self, service_id: &str, limit: usize) -> Result<Vec<AuditLogEntry>>;

    /// Gracefully closes the store.
    async fn close(&self) {}
}
