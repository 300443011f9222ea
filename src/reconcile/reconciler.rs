//! Refreshes registry status from the provider before anything reads it.

use std::sync::Arc;
use tracing::debug;

use crate::model::ServiceRecord;
use crate::registry::{self, Registry};
use crate::remote::RemoteClient;

/// Brings cached statuses in line with the provider.
///
/// Every view and every batch decision goes through here, so nothing acts on
/// a status older than the current request.
#[derive(Clone)]
pub struct Reconciler {
    registry: Arc<dyn Registry>,
    remote: Arc<dyn RemoteClient>,
}

impl Reconciler {
    pub fn new(registry: Arc<dyn Registry>, remote: Arc<dyn RemoteClient>) -> Self {
        Self { registry, remote }
    }

    /// Reconciles every record visible to `owner_id` (all records for `None`),
    /// sequentially and in registry order.
    pub async fn reconcile(&self, owner_id: Option<i64>) -> registry::Result<Vec<ServiceRecord>> {
        let mut services = self.registry.list_for(owner_id).await?;
        for service in services.iter_mut() {
            self.refresh(service).await?;
        }

        metrics::counter!("opsbot_reconciled_services_total").increment(services.len() as u64);
        debug!(
            component = "reconciler",
            event = "reconciled",
            owner_id = ?owner_id,
            services = services.len(),
            "statuses reconciled"
        );

        Ok(services)
    }

    /// Reconciles a single record; `None` when it is not registered.
    pub async fn reconcile_one(&self, service_id: &str) -> registry::Result<Option<ServiceRecord>> {
        let Some(mut service) = self.registry.get(service_id).await? else {
            return Ok(None);
        };
        self.refresh(&mut service).await?;
        Ok(Some(service))
    }

    async fn refresh(&self, service: &mut ServiceRecord) -> registry::Result<()> {
        let status = self.remote.current_status(&service.service_id).await;
        self.registry.set_status(&service.service_id, status).await?;
        service.status = status;
        Ok(())
    }
}
