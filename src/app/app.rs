// Main bot application implementation.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::access::Access;
use crate::batch::BatchExecutor;
use crate::bot::{Dispatcher, Poller, TelegramClient};
use crate::config::{Config, ConfigTrait, DEFAULT_MAX_CONNECTIONS};
use crate::controller::{self, Controller};
use crate::http::{client, HttpServer};
use crate::registry::{Registry, SqliteRegistry};
use crate::remote::{RemoteClient, RenderClient};
use crate::shutdown::GracefulShutdown;

/// Encapsulates the bot's long-lived components.
#[derive(Clone)]
pub struct App {
    shutdown_token: CancellationToken,
    registry: Arc<dyn Registry>,
    poller: Arc<Poller>,
    server: Option<Arc<HttpServer>>,
}

impl App {
    /// Builds every component from configuration. Nothing runs until [`App::serve`].
    pub async fn new(
        shutdown_token: CancellationToken,
        cfg: Config,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let http_client = client::create_client()?;

        let storage = cfg.storage().context("registry configuration is required")?;
        let url = storage.url.as_deref().context("registry.url is required")?;
        let registry: Arc<dyn Registry> = Arc::new(
            SqliteRegistry::connect(url, storage.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS))
                .await
                .context("failed to open service registry")?,
        );

        let remote: Arc<dyn RemoteClient> =
            Arc::new(RenderClient::new(cfg.remote(), http_client.clone())?);
        let executor = BatchExecutor::new(registry.clone(), remote.clone(), cfg.batch_concurrency());
        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            remote,
            executor,
            Access::from_admins(cfg.admins()),
        ));

        let telegram = Arc::new(TelegramClient::new(cfg.telegram(), http_client)?);
        let poller = Arc::new(Poller::new(telegram, dispatcher));

        let server = match cfg.api() {
            Some(api) if !api.enabled => None,
            api => {
                let api = api.cloned().unwrap_or_default();
                Some(HttpServer::new(
                    shutdown_token.clone(),
                    api,
                    Self::controllers(metrics),
                ))
            }
        };

        Ok(Self {
            shutdown_token,
            registry,
            poller,
            server,
        })
    }

    fn controllers(metrics: Option<PrometheusHandle>) -> Vec<Box<dyn Controller>> {
        let mut controllers: Vec<Box<dyn Controller>> = Vec::with_capacity(2);
        if let Some(handle) = metrics {
            controllers.push(Box::new(controller::PrometheusMetricsController::new(handle)));
        }
        controllers.push(Box::new(controller::HealthController::new()));
        controllers
    }

    /// Starts the health server and the update poller in the background.
    pub fn serve(&self, gsh: &GracefulShutdown) {
        if let Some(server) = self.server.clone() {
            gsh.add(1);
            let gsh = gsh.clone();
            tokio::spawn(async move {
                if let Err(e) = server.listen_and_serve().await {
                    error!(
                        component = "app",
                        scope = "server",
                        event = "serve_failed",
                        error = %e,
                        "server failed to serve"
                    );
                }
                gsh.done();
            });
        } else {
            info!(component = "app", scope = "server", event = "disabled", "health server disabled");
        }

        gsh.add(1);
        let app = self.clone();
        let gsh = gsh.clone();
        tokio::spawn(async move {
            app.poller.run(app.shutdown_token.clone()).await;
            app.close().await;
            gsh.done();
        });

        info!(component = "app", event = "started", "application lifecycle");
    }

    /// Closes application resources.
    pub async fn close(&self) {
        self.registry.close().await;
        self.shutdown_token.cancel();

        info!(component = "app", event = "stopped", "application lifecycle");
    }
}
