//! BDD test world for the alert feed service

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use cucumber::World;
use tokio::sync::Mutex;

use alert_feed::alert::AlertRecord;
use alert_feed::authorize::{AuthorizeFailure, Authorizer, Control};
use alert_feed::client::AlertsApi;
use alert_feed::io::{HttpClient, HttpResponse};
use alert_feed::notifier::{Notifier, ToastBoard};
use alert_feed::poller::{PollOutcome, Poller};
use alert_feed::reconciler::Reconciler;
use alert_feed::sink::{new_table_handle, AlertTable, TableHandle};

/// A recorded HTTP request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
}

/// An HTTP client that records requests and replays queued responses.
/// With nothing queued it answers `200 []`.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<alert_feed::Result<HttpResponse>>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedHttpClient {
    pub async fn respond(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
    }

    pub async fn fail(&self, reason: &str) {
        self.responses
            .lock()
            .await
            .push_back(Err(alert_feed::AlertFeedError::Http(reason.to_string())));
    }

    pub async fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().await.last().cloned()
    }

    async fn next(&self, method: &str, url: &str) -> alert_feed::Result<HttpResponse> {
        self.requests.lock().await.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
        });
        self.responses.lock().await.pop_front().unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 200,
                body: "[]".to_string(),
            })
        })
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str) -> alert_feed::Result<HttpResponse> {
        self.next("GET", url).await
    }

    async fn patch_json(
        &self,
        url: &str,
        _body: &serde_json::Value,
    ) -> alert_feed::Result<HttpResponse> {
        self.next("PATCH", url).await
    }
}

#[derive(Debug, Default, World)]
pub struct AlertFeedWorld {
    pub http: Arc<ScriptedHttpClient>,
    pub base_url: Option<String>,
    pub dedupe: bool,

    // Feed
    pub table: Option<TableHandle>,
    pub poller: Option<Arc<Poller<AlertTable>>>,
    pub toasts: Option<ToastBoard>,
    pub last_outcome: Option<PollOutcome>,
    pub rows_before_poll: usize,
    pub queued_alerts: Vec<AlertRecord>,

    // Authorization
    pub authorizer: Option<Arc<Authorizer>>,
    pub authorize_result: Option<Result<Control, AuthorizeFailure>>,

    // Dashboard
    pub response_status: Option<u16>,
    pub response_body: Option<String>,

    // Lifecycle
    pub cancelled: bool,
    pub build_succeeded: Option<bool>,
    pub start_succeeded: Option<bool>,
}

impl AlertFeedWorld {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| "http://alerts.test".to_string())
    }

    pub fn api(&self) -> Arc<AlertsApi> {
        let http: Arc<dyn HttpClient> = self.http.clone();
        Arc::new(AlertsApi::new(&self.base_url(), http).expect("valid base url"))
    }

    pub fn toasts(&mut self) -> ToastBoard {
        self.toasts.get_or_insert_with(|| ToastBoard::new(10)).clone()
    }

    pub fn table(&mut self) -> TableHandle {
        self.table.get_or_insert_with(new_table_handle).clone()
    }

    /// The poller under test, created on first use
    pub fn poller(&mut self) -> Arc<Poller<AlertTable>> {
        if let Some(poller) = &self.poller {
            return Arc::clone(poller);
        }
        let reconciler = if self.dedupe {
            Reconciler::with_dedupe()
        } else {
            Reconciler::new()
        };
        let toasts: Arc<dyn Notifier> = Arc::new(self.toasts());
        let poller = Arc::new(
            Poller::new(self.api(), self.table(), reconciler).with_new_alert_notices(vec![toasts]),
        );
        self.poller = Some(Arc::clone(&poller));
        poller
    }

    /// The authorizer under test, created on first use
    pub fn authorizer(&mut self) -> Arc<Authorizer> {
        if let Some(authorizer) = &self.authorizer {
            return Arc::clone(authorizer);
        }
        let toasts: Arc<dyn Notifier> = Arc::new(self.toasts());
        let authorizer = Arc::new(Authorizer::new(self.api(), vec![toasts]));
        self.authorizer = Some(Arc::clone(&authorizer));
        authorizer
    }
}
