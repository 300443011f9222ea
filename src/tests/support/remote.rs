// In-process fake of the provider control API.

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::model::ServiceStatus;
use crate::remote::{RemoteClient, ServiceInfo};

/// Fake remote whose payloads and failures are scripted by the test.
///
/// Payloads go through [`ServiceInfo::from_payload`], so the real status
/// normalization is exercised.
#[derive(Default)]
pub struct FakeRemote {
    payloads: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<(String, &'static str)>>,
    fetches: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Scripts the provider-side status. `Unknown` makes the service absent.
    pub fn with_status(&self, service_id: &str, status: ServiceStatus) {
        let payload = match status {
            ServiceStatus::Active => json!({"id": service_id, "suspended": "not_suspended"}),
            ServiceStatus::Suspended => json!({"service": {"id": service_id, "suspended": "suspended"}}),
            ServiceStatus::Unknown => {
                self.payloads.lock().remove(service_id);
                return;
            }
            // The provider has no such state; it reports the service as running.
            ServiceStatus::Deploying => json!({"id": service_id, "suspended": false}),
        };
        self.set_payload(service_id, payload);
    }

    pub fn set_payload(&self, service_id: &str, payload: Value) {
        self.payloads.lock().insert(service_id.to_string(), payload);
    }

    /// Every operation on `service_id` fails, like a timed out request.
    pub fn fail_ops(&self, service_id: &str) {
        self.failing.lock().insert(service_id.to_string());
    }

    /// Delays operations on `service_id` to shuffle completion order.
    pub fn delay_ops(&self, service_id: &str, delay: Duration) {
        self.delays.lock().insert(service_id.to_string(), delay);
    }

    /// Operations issued so far, in call order.
    pub fn calls(&self) -> Vec<(String, &'static str)> {
        self.calls.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    async fn operate(&self, service_id: &str, op: &'static str, suspended: Option<bool>) -> bool {
        self.calls.lock().push((service_id.to_string(), op));

        let delay = self.delays.lock().get(service_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().contains(service_id) {
            return false;
        }
        let mut payloads = self.payloads.lock();
        let Some(payload) = payloads.get_mut(service_id) else {
            return false;
        };
        if let Some(suspended) = suspended {
            *payload = json!({"id": service_id, "suspended": suspended});
        }
        true
    }
}

#[async_trait::async_trait]
impl RemoteClient for FakeRemote {
    async fn fetch(&self, service_id: &str) -> Option<ServiceInfo> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let payload = self.payloads.lock().get(service_id).cloned()?;
        ServiceInfo::from_payload(&payload)
    }

    async fn set_suspended(&self, service_id: &str) -> bool {
        self.operate(service_id, "suspend", Some(true)).await
    }

    async fn set_resumed(&self, service_id: &str) -> bool {
        self.operate(service_id, "resume", Some(false)).await
    }

    async fn restart(&self, service_id: &str) -> bool {
        self.operate(service_id, "restart", None).await
    }
}
