// Registry wrapper that counts writes and injects persistence failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::model::{AuditLogEntry, ServiceRecord, ServiceStatus};
use crate::registry::{Registry, RegistryError, Result, SqliteRegistry};

pub struct RecordingRegistry {
    inner: SqliteRegistry,
    status_writes: AtomicUsize,
    log_writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl RecordingRegistry {
    /// Wraps a fresh in-memory SQLite registry.
    pub async fn new() -> Arc<Self> {
        let inner = SqliteRegistry::connect("sqlite::memory:", 1)
            .await
            .expect("failed to open in-memory registry");
        Arc::new(Self {
            inner,
            status_writes: AtomicUsize::new(0),
            log_writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        })
    }

    /// Seeds a record with a cached status.
    pub async fn seed(&self, service_id: &str, name: &str, owner_id: i64, status: ServiceStatus) {
        self.inner.upsert(service_id, name, owner_id).await.unwrap();
        self.inner.set_status(service_id, status).await.unwrap();
    }

    /// Makes every following write fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::Relaxed);
    }

    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::Relaxed)
    }

    pub fn log_writes(&self) -> usize {
        self.log_writes.load(Ordering::Relaxed)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(RegistryError::Persistence(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Registry for RecordingRegistry {
    async fn upsert(&self, service_id: &str, name: &str, owner_id: i64) -> Result<()> {
        self.check_writable()?;
        self.inner.upsert(service_id, name, owner_id).await
    }

    async fn list_for(&self, owner_id: Option<i64>) -> Result<Vec<ServiceRecord>> {
        self.inner.list_for(owner_id).await
    }

    async fn get(&self, service_id: &str) -> Result<Option<ServiceRecord>> {
        self.inner.get(service_id).await
    }

    async fn set_status(&self, service_id: &str, status: ServiceStatus) -> Result<()> {
        self.check_writable()?;
        self.status_writes.fetch_add(1, Ordering::Relaxed);
        self.inner.set_status(service_id, status).await
    }

    async fn append_log(&self, entry: &AuditLogEntry) -> Result<()> {
        self.check_writable()?;
        self.log_writes.fetch_add(1, Ordering::Relaxed);
        self.inner.append_log(entry).await
    }

    async fn remove(&self, service_id: &str) -> Result<bool> {
        self.check_writable()?;
        self.inner.remove(service_id).await
    }

    async fn logs_for(&self, service_id: &str, limit: usize) -> Result<Vec<AuditLogEntry>> {
        self.inner.logs_for(service_id, limit).await
    }
}
