// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
#[allow(dead_code)]
pub const DEBUG: &str = "debug";
#[allow(dead_code)]
pub const TEST: &str = "test";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Opsbot {
    #[serde(rename = "opsbot")]
    pub opsbot: OpsbotBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpsbotBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub api: Option<Api>,
    pub telegram: Option<Telegram>,
    pub remote: Option<Remote>,
    #[serde(rename = "registry")]
    pub storage: Option<Storage>,
    pub access: Option<Admins>,
    pub batch: Option<Batch>,
    pub metrics: Option<Metrics>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

/// Health and metrics HTTP server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Api {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            enabled: true,
            host: None,
            port: None,
        }
    }
}

impl Api {
    pub fn addr(&self) -> String {
        format!(
            "{}:{}",
            self.host.as_deref().unwrap_or(DEFAULT_HOST),
            self.port.unwrap_or(DEFAULT_PORT)
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Telegram {
    pub token: Option<String>,
    #[serde(rename = "api_base")]
    pub api_base: Option<String>,
    #[serde(rename = "poll_timeout", default, with = "humantime_serde")]
    pub poll_timeout: Option<Duration>,
    #[serde(rename = "request_timeout", default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

/// Provider control API.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Remote {
    #[serde(rename = "api_base")]
    pub api_base: Option<String>,
    #[serde(rename = "api_key")]
    pub api_key: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Storage {
    pub url: Option<String>,
    #[serde(rename = "max_connections")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Admins {
    #[serde(default)]
    pub admins: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Batch {
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metrics {
    pub enabled: bool,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_debug(&self) -> bool;
    #[allow(dead_code)]
    fn is_dev(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn api(&self) -> Option<&Api>;
    fn telegram(&self) -> Option<&Telegram>;
    fn remote(&self) -> Option<&Remote>;
    fn storage(&self) -> Option<&Storage>;
    fn admins(&self) -> &[i64];
    fn batch_concurrency(&self) -> usize;
    fn is_metrics_enabled(&self) -> bool;
}

// Config type alias for convenience
pub type Config = Opsbot;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.opsbot.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.opsbot.env == PROD
    }

    fn is_debug(&self) -> bool {
        self.opsbot.env == DEBUG
    }

    fn is_dev(&self) -> bool {
        self.opsbot.env == DEV
    }

    fn is_test(&self) -> bool {
        self.opsbot.env == TEST
    }

    fn api(&self) -> Option<&Api> {
        self.opsbot.api.as_ref()
    }

    fn telegram(&self) -> Option<&Telegram> {
        self.opsbot.telegram.as_ref()
    }

    fn remote(&self) -> Option<&Remote> {
        self.opsbot.remote.as_ref()
    }

    fn storage(&self) -> Option<&Storage> {
        self.opsbot.storage.as_ref()
    }

    fn admins(&self) -> &[i64] {
        self.opsbot
            .access
            .as_ref()
            .map(|a| a.admins.as_slice())
            .unwrap_or(&[])
    }

    fn batch_concurrency(&self) -> usize {
        self.opsbot
            .batch
            .as_ref()
            .and_then(|b| b.concurrency)
            .unwrap_or(1)
            .max(1)
    }

    fn is_metrics_enabled(&self) -> bool {
        self.opsbot.metrics.as_ref().is_some_and(|m| m.enabled)
    }
}

impl Config {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::from_yaml_str(&data, |key| std::env::var(key).ok())
            .with_context(|| format!("load config from {:?}", abs_path))
    }

    /// Parses YAML, applies overrides from `env` and validates the result.
    pub fn from_yaml_str<F>(data: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg: Opsbot = serde_yaml::from_str(data).context("unmarshal yaml")?;
        cfg.apply_env(env)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let cfg = &mut self.opsbot;

        if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
            cfg.telegram.get_or_insert_with(Telegram::default).token = Some(token);
        }
        if let Some(key) = get("RENDER_API_KEY") {
            cfg.remote.get_or_insert_with(Remote::default).api_key = Some(key);
        }
        if let Some(url) = get("DATABASE_URL") {
            cfg.storage.get_or_insert_with(Storage::default).url = Some(url);
        }
        if let Some(raw) = get("ADMIN_USER_ID") {
            cfg.access.get_or_insert_with(Admins::default).admins = parse_admins(&raw)?;
        }
        if let Some(port) = get("PORT") {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {:?}", port))?;
            cfg.api.get_or_insert_with(Api::default).port = Some(port);
        }
        if let Some(host) = get("HOST") {
            cfg.api.get_or_insert_with(Api::default).host = Some(host);
        }
        if let Some(flag) = get("DISABLE_HEALTH_SERVER") {
            if matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes") {
                cfg.api.get_or_insert_with(Api::default).enabled = false;
            }
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        fn present(v: Option<&String>) -> bool {
            v.is_some_and(|s| !s.is_empty())
        }

        if !present(self.telegram().and_then(|t| t.token.as_ref())) {
            anyhow::bail!("telegram.token is required (or TELEGRAM_BOT_TOKEN)");
        }
        if !present(self.remote().and_then(|r| r.api_key.as_ref())) {
            anyhow::bail!("remote.api_key is required (or RENDER_API_KEY)");
        }
        if !present(self.storage().and_then(|s| s.url.as_ref())) {
            anyhow::bail!("registry.url is required (or DATABASE_URL)");
        }
        Ok(())
    }
}

/// Parses a comma-separated list of operator ids.
pub fn parse_admins(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<i64>()
                .with_context(|| format!("admin id must be an integer, got {:?}", id))
        })
        .collect()
}

// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;
