//! Normalized view of a provider service payload.

use serde_json::Value;

use crate::model::ServiceStatus;

const SUSPENDED: &str = "suspended";

/// What the rest of the system is allowed to know about a remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: Option<String>,
    pub suspended: bool,
}

impl ServiceInfo {
    /// Normalizes a provider payload.
    ///
    /// The service may be wrapped in a `service` object. The `suspended` field
    /// is either a boolean or a string such as `"suspended"`/`"not_suspended"`.
    /// Returns `None` when the payload is not a JSON object or the service
    /// object is empty, since nothing about its state is known then.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let outer = payload.as_object()?;
        let service = match outer.get("service") {
            Some(Value::Object(inner)) => inner,
            _ => outer,
        };
        if service.is_empty() {
            return None;
        }

        let suspended = match service.get("suspended") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => s == SUSPENDED,
            _ => false,
        };
        let name = service
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self { name, suspended })
    }

    pub fn status(&self) -> ServiceStatus {
        if self.suspended {
            ServiceStatus::Suspended
        } else {
            ServiceStatus::Active
        }
    }
}
