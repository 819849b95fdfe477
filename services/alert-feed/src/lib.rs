//! Alert Feed - incremental alert poller with item authorization
//!
//! Polls a REST endpoint for alerts newer than a watermark, reconciles them
//! into an alert table, and serves the table on a web dashboard.

pub mod alert;
pub mod authorize;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod io;
pub mod notifier;
pub mod poller;
pub mod reconciler;
pub mod row;
pub mod sink;

pub use config::{load_config, Config};
pub use error::{AlertFeedError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::authorize::Authorizer;
use crate::client::AlertsApi;
use crate::dashboard::DashboardState;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::{LogNotifier, Notifier, ToastBoard};
use crate::poller::Poller;
use crate::reconciler::Reconciler;
use crate::sink::{new_table_handle, AlertTable, TableHandle};

/// Assembles an [`AlertFeed`] from configuration, with optional injected
/// collaborators for testing
pub struct AlertFeedBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    notifiers: Option<Vec<Arc<dyn Notifier>>>,
    cancel: Option<CancellationToken>,
}

impl AlertFeedBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            notifiers: None,
            cancel: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Replace the default log notifier. The dashboard toast board is always added.
    pub fn with_notifiers(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers = Some(notifiers);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> Result<AlertFeed> {
        self.config.validate()?;

        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::default()));
        let api = Arc::new(AlertsApi::new(&self.config.feed.base_url, http)?);

        let toasts = ToastBoard::new(self.config.dashboard.toast_history_size);
        let mut notifiers = self
            .notifiers
            .unwrap_or_else(|| vec![Arc::new(LogNotifier) as Arc<dyn Notifier>]);
        notifiers.push(Arc::new(toasts.clone()));

        let table = new_table_handle();
        let reconciler = if self.config.feed.dedupe_by_identity {
            Reconciler::with_dedupe()
        } else {
            Reconciler::new()
        };
        let mut poller = Poller::new(Arc::clone(&api), Arc::clone(&table), reconciler);
        if self.config.feed.notify_new_alerts {
            poller = poller.with_new_alert_notices(notifiers.clone());
        }

        let authorizer = Arc::new(Authorizer::new(api, notifiers));

        Ok(AlertFeed {
            config: self.config,
            poller: Arc::new(poller),
            authorizer,
            table,
            toasts,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// A configured alert feed, ready to start
pub struct AlertFeed {
    config: Config,
    poller: Arc<Poller<AlertTable>>,
    authorizer: Arc<Authorizer>,
    table: TableHandle,
    toasts: ToastBoard,
    cancel: CancellationToken,
}

impl AlertFeed {
    pub fn table(&self) -> TableHandle {
        Arc::clone(&self.table)
    }

    pub fn poller(&self) -> Arc<Poller<AlertTable>> {
        Arc::clone(&self.poller)
    }

    pub fn authorizer(&self) -> Arc<Authorizer> {
        Arc::clone(&self.authorizer)
    }

    pub fn toasts(&self) -> ToastBoard {
        self.toasts.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Dashboard router over this feed's table
    pub fn router(&self) -> axum::Router {
        dashboard::build_router(DashboardState {
            table: self.table(),
            authorizer: self.authorizer(),
            toasts: self.toasts(),
        })
    }

    /// Run the feed until the cancellation token fires (ctrl-c by default)
    pub async fn start(self) -> Result<()> {
        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Shutdown signal received");
            cancel_for_signal.cancel();
        });

        if self.config.dashboard.enabled {
            let dashboard_port = self.config.dashboard.port;
            let router = self.router();
            let cancel_for_dashboard = self.cancel.clone();

            tokio::spawn(async move {
                let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
                tracing::info!("Dashboard listening on http://{}", addr);

                let listener = match tokio::net::TcpListener::bind(addr).await {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::error!(
                            "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                            dashboard_port,
                            e
                        );
                        return;
                    }
                };

                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        cancel_for_dashboard.cancelled().await;
                    })
                    .await
                    .ok();

                tracing::debug!("Dashboard stopped");
            });
        }

        tracing::info!(
            "Alert feed started, polling {} every {:?}",
            self.config.feed.base_url,
            self.config.feed.polling_interval
        );

        self.poller
            .run(self.config.feed.polling_interval, self.cancel.clone())
            .await;

        tracing::info!("Alert feed stopped");
        Ok(())
    }
}
