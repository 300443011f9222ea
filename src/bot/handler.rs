//! Turns parsed commands and callbacks into core calls and replies.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::access::Access;
use crate::batch::BatchExecutor;
use crate::bot::command::{Callback, Command};
use crate::bot::view::{self, Reply};
use crate::error::{OpsError, Result};
use crate::model::BatchAction;
use crate::registry::Registry;
use crate::remote::RemoteClient;

/// Operator issuing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: i64,
    pub first_name: String,
}

/// Entry point of the chat surface. Cheap to share behind an `Arc`.
pub struct Dispatcher {
    registry: Arc<dyn Registry>,
    remote: Arc<dyn RemoteClient>,
    executor: BatchExecutor,
    access: Access,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<dyn Registry>,
        remote: Arc<dyn RemoteClient>,
        executor: BatchExecutor,
        access: Access,
    ) -> Self {
        Self {
            registry,
            remote,
            executor,
            access,
        }
    }

    pub fn is_allowed(&self, user_id: i64) -> bool {
        self.access.is_allowed(user_id)
    }

    pub async fn handle_command(&self, operator: &Operator, command: Command) -> Reply {
        let label = format!("{:?}", command);
        // /start is a greeting and open to everyone.
        let allowed = match command {
            Command::Start => Ok(()),
            _ => self.authorize(operator.id),
        };
        let result = match allowed {
            Ok(()) => self.command(operator, command).await,
            Err(e) => Err(e),
        };
        self.into_reply(operator.id, &label, result)
    }

    pub async fn handle_callback(&self, operator: &Operator, callback: Callback) -> Reply {
        let label = callback.to_string();
        let result = match self.authorize(operator.id) {
            Ok(()) => self.callback(operator.id, callback).await,
            Err(e) => Err(e),
        };
        self.into_reply(operator.id, &label, result)
    }

    fn authorize(&self, user_id: i64) -> Result<()> {
        if self.access.is_allowed(user_id) {
            Ok(())
        } else {
            Err(OpsError::Unauthorized(user_id))
        }
    }

    fn into_reply(&self, user_id: i64, request: &str, result: Result<Reply>) -> Reply {
        match result {
            Ok(reply) => reply,
            Err(OpsError::NotFound(service_id)) => view::not_found(&service_id),
            Err(OpsError::Unauthorized(user_id)) => {
                warn!(
                    component = "dispatcher",
                    event = "unauthorized",
                    user_id = user_id,
                    request = request,
                    "request rejected"
                );
                view::unauthorized()
            }
            Err(e @ OpsError::Persistence(_)) => {
                error!(
                    component = "dispatcher",
                    event = "request_failed",
                    user_id = user_id,
                    request = request,
                    error = %e,
                    "request failed"
                );
                view::internal_error()
            }
        }
    }

    async fn command(&self, operator: &Operator, command: Command) -> Result<Reply> {
        let user_id = operator.id;
        match command {
            Command::Start => Ok(view::welcome(&operator.first_name)),
            Command::Manage => self.manage(user_id).await,
            Command::AddService {
                service_id: Some(service_id),
                name,
            } => self.add_service(user_id, &service_id, name).await,
            Command::AddService { service_id: None, .. } => Ok(view::add_service_usage()),
            Command::Refresh => {
                let services = self.executor.reconciler().reconcile(Some(user_id)).await?;
                if services.is_empty() {
                    return Ok(view::empty_registry());
                }
                Ok(view::refreshed(services.len()))
            }
            Command::RemoveService {
                service_id: Some(service_id),
            } => self.remove_service(user_id, &service_id).await,
            Command::RemoveService { service_id: None } => Ok(view::remove_service_usage()),
            Command::Unknown(name) => Ok(view::unknown_command(&name)),
        }
    }

    async fn callback(&self, user_id: i64, callback: Callback) -> Result<Reply> {
        match callback {
            Callback::Refresh | Callback::Back => self.manage(user_id).await,
            Callback::SuspendAll => self.batch(user_id, BatchAction::SuspendAll).await,
            Callback::ResumeAll => self.batch(user_id, BatchAction::ResumeAll).await,
            Callback::View(service_id) => {
                let service = self
                    .executor
                    .reconciler()
                    .reconcile_one(&service_id)
                    .await?
                    .ok_or(OpsError::NotFound(service_id))?;
                let last = self.registry.logs_for(&service.service_id, 1).await?;
                Ok(view::service(&service, last.first()))
            }
            Callback::Suspend(service_id) => {
                Ok(view::op_result(&self.executor.suspend(&service_id, user_id).await?))
            }
            Callback::Resume(service_id) => {
                Ok(view::op_result(&self.executor.resume(&service_id, user_id).await?))
            }
            Callback::Restart(service_id) => {
                Ok(view::op_result(&self.executor.restart(&service_id, user_id).await?))
            }
        }
    }

    // The chat surface is always scoped to the caller; `reconcile(None)` is
    // left for admin tooling, even when access is open.
    async fn manage(&self, user_id: i64) -> Result<Reply> {
        let services = self.executor.reconciler().reconcile(Some(user_id)).await?;
        Ok(view::manage(&services))
    }

    async fn batch(&self, user_id: i64, action: BatchAction) -> Result<Reply> {
        let tally = self.executor.run_batch(Some(user_id), action, user_id).await?;
        // Fresh statuses after the run.
        let services = self.executor.reconciler().reconcile(Some(user_id)).await?;
        Ok(view::batch_result(action, &tally, &services))
    }

    async fn add_service(&self, user_id: i64, service_id: &str, name: Option<String>) -> Result<Reply> {
        let Some(info) = self.remote.fetch(service_id).await else {
            return Ok(view::remote_not_found(service_id));
        };
        let status = info.status();
        let name = name
            .or(info.name)
            .unwrap_or_else(|| service_id.to_string());

        self.registry.upsert(service_id, &name, user_id).await?;
        self.registry.set_status(service_id, status).await?;

        info!(
            component = "dispatcher",
            event = "service_added",
            service_id = service_id,
            owner_id = user_id,
            "service registered"
        );
        Ok(view::service_added(service_id, &name))
    }

    async fn remove_service(&self, user_id: i64, service_id: &str) -> Result<Reply> {
        let owned = self
            .registry
            .get(service_id)
            .await?
            .is_some_and(|s| s.is_owned_by(user_id));
        if !owned || !self.registry.remove(service_id).await? {
            return Err(OpsError::NotFound(service_id.to_string()));
        }

        info!(
            component = "dispatcher",
            event = "service_removed",
            service_id = service_id,
            owner_id = user_id,
            "service unregistered"
        );
        Ok(view::service_removed(service_id))
    }
}
