//! Audit log entries written for every attempted remote operation.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use super::{ServiceStatus, UnknownValueError};

/// Detail recorded when the provider did not confirm an operation.
pub const API_REQUEST_FAILED: &str = "API request failed";

/// Remote operation kinds that get audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Suspend,
    Resume,
    Restart,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Suspend => "suspend",
            Action::Resume => "resume",
            Action::Restart => "restart",
        }
    }

    /// Status a confirmed operation leaves the service in. Restart keeps it.
    pub fn target_status(self) -> Option<ServiceStatus> {
        match self {
            Action::Suspend => Some(ServiceStatus::Suspended),
            Action::Resume => Some(ServiceStatus::Active),
            Action::Restart => None,
        }
    }
}

impl FromStr for Action {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "suspend" => Ok(Action::Suspend),
            "resume" => Ok(Action::Resume),
            "restart" => Ok(Action::Restart),
            other => Err(UnknownValueError(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one attempted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    pub service_id: String,
    pub action: Action,
    pub actor_id: i64,
    pub succeeded: bool,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn success(service_id: &str, action: Action, actor_id: i64) -> Self {
        Self {
            service_id: service_id.to_string(),
            action,
            actor_id,
            succeeded: true,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(service_id: &str, action: Action, actor_id: i64, detail: &str) -> Self {
        Self {
            service_id: service_id.to_string(),
            action,
            actor_id,
            succeeded: false,
            detail: Some(detail.to_string()),
            timestamp: Utc::now(),
        }
    }

    /// Builds the entry matching a remote call outcome.
    pub fn for_outcome(service_id: &str, action: Action, actor_id: i64, succeeded: bool) -> Self {
        if succeeded {
            Self::success(service_id, action, actor_id)
        } else {
            Self::failure(service_id, action, actor_id, API_REQUEST_FAILED)
        }
    }
}
