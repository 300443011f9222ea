//! Registered service record.

use std::collections::BTreeSet;

use super::ServiceStatus;

/// A service known to the registry together with the operators that own it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub service_id: String,
    pub name: String,
    pub owners: BTreeSet<i64>,
    pub status: ServiceStatus,
}

impl ServiceRecord {
    /// Creates a record for a freshly registered service.
    pub fn new(service_id: impl Into<String>, name: impl Into<String>, owner_id: i64) -> Self {
        Self {
            service_id: service_id.into(),
            name: name.into(),
            owners: BTreeSet::from([owner_id]),
            status: ServiceStatus::Unknown,
        }
    }

    pub fn is_owned_by(&self, owner_id: i64) -> bool {
        self.owners.contains(&owner_id)
    }
}
