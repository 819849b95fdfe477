//! Client for the alerts and items REST endpoints

use std::sync::Arc;

use reqwest::Url;
use serde::Deserialize;

use crate::alert::AlertRecord;
use crate::io::{HttpClient, HttpResponse};
use crate::AlertFeedError;

pub const ALERTS_LIST_PATH: &str = "/api/v1/alerts/list/";
pub const ITEMS_PATH: &str = "/api/v1/items/";

/// Body returned by the item authorization endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizeResponse {
    pub is_authorized: bool,
}

/// REST client for the alert feed server
pub struct AlertsApi {
    base_url: Url,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for AlertsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertsApi")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl AlertsApi {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> crate::Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|e| {
            AlertFeedError::Config(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AlertFeedError::Config(format!(
                "Base URL '{}' cannot carry a path",
                trimmed
            )));
        }
        tracing::debug!("Created AlertsApi for {}", base_url);
        Ok(Self { base_url, http })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    /// URL for the full list, or for alerts strictly newer than `since`
    pub fn alerts_url(&self, since: Option<&str>) -> String {
        let mut url = self.endpoint(ALERTS_LIST_PATH);
        if let Some(since) = since {
            url.query_pairs_mut().append_pair("since", since);
        }
        url.into()
    }

    /// URL of the authorize endpoint. The id is sent as one encoded
    /// path segment.
    pub fn authorize_url(&self, item_id: &str) -> crate::Result<String> {
        if matches!(item_id, "" | "." | "..") {
            return Err(AlertFeedError::InvalidItemId(item_id.to_string()));
        }
        let mut url = self.endpoint(ITEMS_PATH);
        url.path_segments_mut()
            .map_err(|_| AlertFeedError::InvalidItemId(item_id.to_string()))?
            .pop_if_empty()
            .extend([item_id, "authorize", ""]);
        Ok(url.into())
    }

    /// Fetch alerts, newest first
    pub async fn fetch_alerts(&self, since: Option<&str>) -> crate::Result<Vec<AlertRecord>> {
        let url = self.alerts_url(since);
        let response = self.http.get(&url).await?;
        let response = ensure_success(response, &url)?;
        let alerts: Vec<AlertRecord> = serde_json::from_str(&response.body)?;
        tracing::debug!("Fetched {} alerts from {}", alerts.len(), url);
        Ok(alerts)
    }

    /// Ask the server to authorize `item_id`
    pub async fn authorize_item(&self, item_id: &str) -> crate::Result<AuthorizeResponse> {
        let url = self.authorize_url(item_id)?;
        let response = self.http.patch_json(&url, &serde_json::json!({})).await?;
        let response = ensure_success(response, &url)?;
        Ok(serde_json::from_str(&response.body)?)
    }
}

fn ensure_success(response: HttpResponse, url: &str) -> crate::Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(AlertFeedError::Status {
            status: response.status,
            url: url.to_string(),
        })
    }
}
