use super::{Admins, Api, Batch, Config, Logs, Metrics, OpsbotBox, Remote, Storage, Telegram};
use std::time::Duration;

/// Creates a new test configuration with an in-memory registry.
pub fn new_test_config() -> Config {
    Config {
        opsbot: OpsbotBox {
            env: super::TEST.to_string(),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            api: Some(Api {
                enabled: true,
                host: Some("127.0.0.1".to_string()),
                port: Some(0),
            }),
            telegram: Some(Telegram {
                token: Some("test-token".to_string()),
                api_base: Some("http://127.0.0.1:1".to_string()),
                poll_timeout: Some(Duration::from_secs(1)),
                request_timeout: Some(Duration::from_secs(5)),
            }),
            remote: Some(Remote {
                api_base: Some("http://127.0.0.1:1/v1".to_string()),
                api_key: Some("test-key".to_string()),
                timeout: Some(Duration::from_secs(2)),
            }),
            storage: Some(Storage {
                url: Some("sqlite::memory:".to_string()),
                max_connections: Some(1),
            }),
            access: Some(Admins { admins: vec![] }),
            batch: Some(Batch {
                concurrency: Some(1),
            }),
            metrics: Some(Metrics { enabled: false }),
        },
    }
}
