//! Service status as cached in the registry.

use std::fmt;
use std::str::FromStr;

/// Closed set of states a registered service can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceStatus {
    Active,
    Suspended,
    #[default]
    Unknown,
    Deploying,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized stored value {0:?}")]
pub struct UnknownValueError(pub String);

impl ServiceStatus {
    /// Returns the stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Suspended => "suspended",
            ServiceStatus::Unknown => "unknown",
            ServiceStatus::Deploying => "deploying",
        }
    }

    /// Status marker used in chat views.
    pub fn emoji(self) -> &'static str {
        match self {
            ServiceStatus::Active => "🟢",
            ServiceStatus::Suspended => "🔴",
            ServiceStatus::Unknown => "⚪",
            ServiceStatus::Deploying => "🟡",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            ServiceStatus::Active => "Active",
            ServiceStatus::Suspended => "Suspended",
            ServiceStatus::Unknown => "Unknown",
            ServiceStatus::Deploying => "Deploying",
        }
    }
}

impl FromStr for ServiceStatus {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ServiceStatus::Active),
            "suspended" => Ok(ServiceStatus::Suspended),
            "unknown" => Ok(ServiceStatus::Unknown),
            "deploying" => Ok(ServiceStatus::Deploying),
            other => Err(UnknownValueError(other.to_string())),
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
