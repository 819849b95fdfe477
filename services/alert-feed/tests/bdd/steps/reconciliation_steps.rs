//! BDD step definitions for the reconciliation feature

use cucumber::gherkin::Step;
use cucumber::{given, then, when};

use alert_feed::alert::{AlertRecord, AlertType};
use alert_feed::poller::PollOutcome;
use alert_feed::sink::{AlertDetails, Placeholder, TableRow};

use crate::world::AlertFeedWorld;

fn table_messages(rows: &[TableRow]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| match row {
            TableRow::Alert(alert) => Some(alert.message.clone()),
            TableRow::Error { .. } => None,
        })
        .collect()
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',').map(|item| item.trim().to_string()).collect()
}

// --- Given steps ---

#[given(expr = "an alert feed for {string}")]
fn alert_feed_for(world: &mut AlertFeedWorld, base_url: String) {
    world.base_url = Some(base_url);
}

#[given("identity de-duplication is enabled")]
fn dedupe_enabled(world: &mut AlertFeedWorld) {
    world.dedupe = true;
}

#[given("the server answers with alerts:")]
async fn server_answers_with_alerts(world: &mut AlertFeedWorld, step: &Step) {
    let table = step.table.as_ref().expect("alerts table");
    let header = &table.rows[0];
    let column = |name: &str| header.iter().position(|h| h == name);
    let (kind, message, created_at) = (
        column("alert_type").expect("alert_type column"),
        column("message").expect("message column"),
        column("created_at").expect("created_at column"),
    );
    let details = column("details");

    let records: Vec<AlertRecord> = table.rows[1..]
        .iter()
        .map(|cells| {
            let record = AlertRecord::new(
                AlertType::from(cells[kind].clone()),
                &cells[message],
                &cells[created_at],
            );
            match details.map(|i| cells[i].as_str()) {
                Some(text) if !text.is_empty() => record.with_details(text),
                _ => record,
            }
        })
        .collect();

    let body = serde_json::to_string(&records).expect("serializable alerts");
    world.http.respond(200, body).await;
    world.queued_alerts = records;
}

#[given("the server answers with no alerts")]
async fn server_answers_with_no_alerts(world: &mut AlertFeedWorld) {
    world.http.respond(200, "[]").await;
}

#[given(expr = "the server answers with status {int}")]
async fn server_answers_with_status(world: &mut AlertFeedWorld, status: u16) {
    world.http.respond(status, "Server Error").await;
}

#[given(expr = "the server answers with body {string}")]
async fn server_answers_with_body(world: &mut AlertFeedWorld, body: String) {
    world.http.respond(200, body).await;
}

#[given("the server is unreachable")]
async fn server_is_unreachable(world: &mut AlertFeedWorld) {
    world.http.fail("connection refused").await;
}

#[given("the feed has polled")]
async fn feed_has_polled(world: &mut AlertFeedWorld) {
    let poller = world.poller();
    poller.poll().await;
}

// --- When steps ---

#[when("the feed polls")]
async fn feed_polls(world: &mut AlertFeedWorld) {
    let poller = world.poller();
    let rows_before_poll = world.table().read().await.len();
    world.rows_before_poll = rows_before_poll;
    world.last_outcome = Some(poller.poll().await);
}

// --- Then steps ---

#[then(expr = "the request was {string}")]
async fn request_was(world: &mut AlertFeedWorld, expected: String) {
    let request = world.http.last_request().await.expect("no request sent");
    assert_eq!(format!("{} {}", request.method, request.url), expected);
}

#[then(expr = "{int} request was sent")]
async fn requests_sent(world: &mut AlertFeedWorld, count: usize) {
    assert_eq!(world.http.requests.lock().await.len(), count);
}

#[then(expr = "the table shows messages {string}")]
async fn table_shows_messages(world: &mut AlertFeedWorld, expected: String) {
    let table = world.table();
    let table = table.read().await;
    assert_eq!(table_messages(table.rows()), split_list(&expected));
}

#[then(expr = "the table shows the placeholder {string}")]
async fn table_shows_placeholder(world: &mut AlertFeedWorld, text: String) {
    let table = world.table();
    let table = table.read().await;
    assert!(table.is_empty(), "expected no rows, got {:?}", table.rows());
    assert_eq!(table.placeholder(), Placeholder::Empty);
    assert_eq!(table.placeholder().text(), text);
}

#[then(expr = "the table shows the error row {string}")]
async fn table_shows_error_row(world: &mut AlertFeedWorld, message: String) {
    let table = world.table();
    let table = table.read().await;
    assert_eq!(table.rows(), &[TableRow::Error { message }]);
}

#[then("the table has no error row")]
async fn table_has_no_error_row(world: &mut AlertFeedWorld) {
    let table = world.table();
    let table = table.read().await;
    assert!(!table
        .rows()
        .iter()
        .any(|row| matches!(row, TableRow::Error { .. })));
}

#[then(expr = "exactly {int} row was added")]
async fn rows_added(world: &mut AlertFeedWorld, count: usize) {
    assert_eq!(world.last_outcome, Some(PollOutcome::Appended(count)));
    let total = world.table().read().await.len();
    assert_eq!(total, world.rows_before_poll + count);
}

#[then("the watermark is unset")]
async fn watermark_unset(world: &mut AlertFeedWorld) {
    let poller = world.poller();
    assert!(!poller.watermark().await.is_set());
}

#[then(expr = "the watermark is {string}")]
async fn watermark_is(world: &mut AlertFeedWorld, expected: String) {
    let poller = world.poller();
    assert_eq!(poller.watermark().await.get(), Some(expected.as_str()));
}

#[then(expr = "a toast says {string}")]
async fn toast_says(world: &mut AlertFeedWorld, message: String) {
    let notices = world.toasts().snapshot().await;
    assert!(
        notices.iter().any(|notice| notice.message == message),
        "expected toast '{}', got {:?}",
        message,
        notices
    );
}

#[then("no toast was raised")]
async fn no_toast(world: &mut AlertFeedWorld) {
    assert!(world.toasts().snapshot().await.is_empty());
}

#[then(expr = "row {int} opens the message and details of alert {int}")]
async fn row_opens_details(world: &mut AlertFeedWorld, position: usize, alert: usize) {
    let record = world.queued_alerts[alert - 1].clone();
    let table = world.table();
    let table = table.read().await;
    let TableRow::Alert(row) = &table.rows()[position - 1] else {
        panic!("row {} is not an alert row", position);
    };
    assert!(row.interactive);

    let mut surface: Option<AlertDetails> = None;
    assert!(table.open_details(row.id, &mut surface));
    assert_eq!(
        surface,
        Some(AlertDetails {
            message: record.message.clone(),
            details: record.details.clone().unwrap_or_default(),
        })
    );
    assert_eq!(table.record(row.id), Some(&record));
}

#[then(expr = "the row {string} is not interactive")]
async fn row_not_interactive(world: &mut AlertFeedWorld, message: String) {
    let table = world.table();
    let table = table.read().await;
    let row = table
        .rows()
        .iter()
        .find_map(|row| match row {
            TableRow::Alert(alert) if alert.message == message => Some(alert),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no row '{}'", message));
    assert!(!row.interactive);

    let mut surface: Option<AlertDetails> = None;
    assert!(!table.open_details(row.id, &mut surface));
    assert!(table.record(row.id).is_none());
}
