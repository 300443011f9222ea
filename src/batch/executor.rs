//! Batch executor: eligibility filter, per-service calls, audit, tally.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{OpsError, Result};
use crate::model::{Action, AuditLogEntry, BatchAction, BatchTally, ServiceRecord};
use crate::reconcile::Reconciler;
use crate::registry::{self, Registry};
use crate::remote::RemoteClient;

/// Result of a single-service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpOutcome {
    pub service: ServiceRecord,
    pub action: Action,
    pub succeeded: bool,
}

/// Runs remote operations and records their outcome.
///
/// A failed remote call is final for the run: it is counted and audited,
/// never retried. A registry failure aborts the run and is returned.
#[derive(Clone)]
pub struct BatchExecutor {
    registry: Arc<dyn Registry>,
    remote: Arc<dyn RemoteClient>,
    reconciler: Reconciler,
    concurrency: usize,
}

impl BatchExecutor {
    /// `concurrency` bounds in-flight remote calls per batch; 1 is sequential.
    pub fn new(
        registry: Arc<dyn Registry>,
        remote: Arc<dyn RemoteClient>,
        concurrency: usize,
    ) -> Self {
        let reconciler = Reconciler::new(registry.clone(), remote.clone());
        Self {
            registry,
            remote,
            reconciler,
            concurrency: concurrency.max(1),
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Reconciles the owner's services and applies `action` to the eligible ones.
    pub async fn run_batch(
        &self,
        owner_id: Option<i64>,
        action: BatchAction,
        actor_id: i64,
    ) -> registry::Result<BatchTally> {
        let services = self.reconciler.reconcile(owner_id).await?;

        let mut tally = BatchTally::default();
        let mut eligible = Vec::with_capacity(services.len());
        for service in &services {
            if action.is_eligible(service.status) {
                eligible.push(service.service_id.clone());
            } else {
                tally.skip();
            }
        }

        // Outcomes are folded here, by a single consumer, in completion order.
        let op = action.action();
        let mut outcomes = stream::iter(eligible)
            .map(|service_id: String| async move { self.apply(&service_id, op, actor_id).await })
            .buffer_unordered(self.concurrency);
        while let Some(outcome) = outcomes.next().await {
            tally.record(outcome?);
        }

        metrics::counter!("opsbot_batch_runs_total", "action" => action.as_str()).increment(1);
        info!(
            component = "batch",
            event = "finished",
            action = action.as_str(),
            actor_id = actor_id,
            attempted = tally.attempted,
            succeeded = tally.succeeded,
            failed = tally.failed,
            skipped = tally.skipped,
            "batch run finished"
        );

        Ok(tally)
    }

    pub async fn suspend(&self, service_id: &str, actor_id: i64) -> Result<OpOutcome> {
        self.single(service_id, Action::Suspend, actor_id).await
    }

    pub async fn resume(&self, service_id: &str, actor_id: i64) -> Result<OpOutcome> {
        self.single(service_id, Action::Resume, actor_id).await
    }

    pub async fn restart(&self, service_id: &str, actor_id: i64) -> Result<OpOutcome> {
        self.single(service_id, Action::Restart, actor_id).await
    }

    async fn single(&self, service_id: &str, action: Action, actor_id: i64) -> Result<OpOutcome> {
        let mut service = self
            .registry
            .get(service_id)
            .await?
            .ok_or_else(|| OpsError::NotFound(service_id.to_string()))?;

        let succeeded = self.apply(service_id, action, actor_id).await?;
        if succeeded {
            if let Some(status) = action.target_status() {
                service.status = status;
            }
        }

        Ok(OpOutcome {
            service,
            action,
            succeeded,
        })
    }

    /// One remote call plus its registry side effects.
    async fn apply(&self, service_id: &str, action: Action, actor_id: i64) -> registry::Result<bool> {
        let succeeded = match action {
            Action::Suspend => self.remote.set_suspended(service_id).await,
            Action::Resume => self.remote.set_resumed(service_id).await,
            Action::Restart => self.remote.restart(service_id).await,
        };

        if succeeded {
            if let Some(status) = action.target_status() {
                self.registry.set_status(service_id, status).await?;
            }
        } else {
            warn!(
                component = "batch",
                event = "operation_failed",
                action = action.as_str(),
                service_id = service_id,
                actor_id = actor_id,
                "remote operation failed"
            );
        }

        self.registry
            .append_log(&AuditLogEntry::for_outcome(service_id, action, actor_id, succeeded))
            .await?;

        let outcome = if succeeded { "success" } else { "failure" };
        metrics::counter!(
            "opsbot_remote_operations_total",
            "action" => action.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        Ok(succeeded)
    }
}
