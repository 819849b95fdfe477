//! Web dashboard: the alert table, detail views, toasts and JSON API endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::authorize::Authorizer;
use crate::notifier::{NoticeLevel, ToastBoard};
use crate::row::RowId;
use crate::sink::{AlertDetails, TableHandle, TableRow};

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub table: TableHandle,
    pub authorizer: Arc<Authorizer>,
    pub toasts: ToastBoard,
}

/// Build the dashboard axum router
pub fn build_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/alerts/{row_id}", get(detail_page_handler))
        .route("/api/alerts", get(alerts_handler))
        .route("/api/alerts/{row_id}/details", get(details_handler))
        .route("/api/items/{item_id}/authorize", post(authorize_handler))
        .route("/api/items/{item_id}/control", get(control_handler))
        .route("/api/toasts", get(toasts_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
{body}
</body>
</html>"#,
        title = escape_html(title),
        body = body,
    ))
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let table = dashboard.table.read().await;

    let alert_rows: String = if table.is_empty() {
        format!(
            r#"<tr><td colspan="3" style="padding: 0.5rem; text-align: center; color: #6c757d;">{}</td></tr>"#,
            table.placeholder().text()
        )
    } else {
        table
            .sorted_rows()
            .into_iter()
            .map(|row| match row {
                TableRow::Error { message } => format!(
                    r#"<tr><td colspan="3" style="padding: 0.5rem; text-align: center; color: #721c24; background-color: #f8d7da;">{}</td></tr>"#,
                    escape_html(message)
                ),
                TableRow::Alert(alert) => {
                    let message = if alert.interactive {
                        format!(
                            r#"<a href="/alerts/{}">{}</a>"#,
                            alert.id,
                            escape_html(&alert.message)
                        )
                    } else {
                        escape_html(&alert.message)
                    };
                    format!(
                        r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.5rem;">
                        <span style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: #fff; background-color: {};">{} {}</span>
                    </td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;" data-sort="{}">{}</td>
                </tr>"#,
                        alert.category.tone.color(),
                        alert.category.icon,
                        escape_html(&alert.category.label),
                        message,
                        alert
                            .timestamp
                            .sort_key_ms
                            .map(|key| key.to_string())
                            .unwrap_or_default(),
                        escape_html(&alert.timestamp.display)
                    )
                }
            })
            .collect()
    };
    drop(table);

    let toast_items: String = dashboard
        .toasts
        .snapshot()
        .await
        .iter()
        .rev()
        .map(|notice| {
            let (color, bg) = match notice.level {
                NoticeLevel::Success => ("#155724", "#d4edda"),
                NoticeLevel::Error => ("#721c24", "#f8d7da"),
                NoticeLevel::Info => ("#0c5460", "#d1ecf1"),
            };
            format!(
                r#"<li style="padding: 0.5rem; margin-bottom: 0.25rem; border-radius: 0.25rem; color: {}; background-color: {};">{}</li>"#,
                color,
                bg,
                escape_html(&notice.message)
            )
        })
        .collect();

    let body = format!(
        r#"    <script>setInterval(() => location.reload(), 5000);</script>
    <h1>Alerts</h1>
    <section>
        <ul id="toasts" style="list-style: none; padding: 0;">{toast_items}</ul>
    </section>
    <section>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Type</th>
                    <th style="padding: 0.5rem; text-align: left;">Message</th>
                    <th style="padding: 0.5rem; text-align: left;">Date</th>
                </tr>
            </thead>
            <tbody id="alert-body">{alert_rows}</tbody>
        </table>
    </section>"#,
    );

    page("Alerts", &body)
}

fn lookup_details(table: &crate::sink::AlertTable, row_id: u64) -> Option<AlertDetails> {
    let mut surface: Option<AlertDetails> = None;
    table.open_details(RowId(row_id), &mut surface);
    surface
}

async fn detail_page_handler(
    State(dashboard): State<DashboardState>,
    Path(row_id): Path<u64>,
) -> Response {
    let details = lookup_details(&*dashboard.table.read().await, row_id);
    match details {
        Some(details) => {
            let body = format!(
                r#"    <h1>Alert details</h1>
    <p id="alert-message">{}</p>
    <pre id="alert-details" style="white-space: pre-wrap; background-color: #f8f9fa; padding: 1rem;">{}</pre>
    <a href="/">Back</a>"#,
                escape_html(&details.message),
                escape_html(&details.details)
            );
            page("Alert details", &body).into_response()
        }
        None => (StatusCode::NOT_FOUND, page("Not found", "    <p>Alert not found.</p>"))
            .into_response(),
    }
}

async fn alerts_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let table = dashboard.table.read().await;
    let rows: Vec<TableRow> = table.sorted_rows().into_iter().cloned().collect();
    Json(rows)
}

async fn details_handler(
    State(dashboard): State<DashboardState>,
    Path(row_id): Path<u64>,
) -> Response {
    match lookup_details(&*dashboard.table.read().await, row_id) {
        Some(details) => Json(details).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "No details for this alert" })),
        )
            .into_response(),
    }
}

async fn authorize_handler(
    State(dashboard): State<DashboardState>,
    Path(item_id): Path<String>,
) -> Response {
    match dashboard.authorizer.authorize(&item_id).await {
        Ok(control) => Json(control).into_response(),
        Err(failure) => (StatusCode::BAD_GATEWAY, Json(failure)).into_response(),
    }
}

async fn control_handler(
    State(dashboard): State<DashboardState>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    Json(dashboard.authorizer.control(&item_id))
}

async fn toasts_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.toasts.snapshot().await)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
