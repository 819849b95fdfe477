//! Cursor-based poller: fetches alerts newer than the watermark and hands
//! them to the reconciler

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::alert::{parse_timestamp, AlertRecord};
use crate::client::AlertsApi;
use crate::error::FailureKind;
use crate::notifier::{notify_all, Notice, Notifier};
use crate::reconciler::{ReconcileMode, Reconciler};
use crate::sink::PresentationSink;

/// Text of the error row shown when the initial load fails
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load alerts.";

/// `created_at` of the newest alert seen so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermark(Option<String>);

impl Watermark {
    pub fn unset() -> Self {
        Self(None)
    }

    pub fn at(created_at: &str) -> Self {
        Self(Some(created_at.to_string()))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Move the cursor to `created_at`. A cursor that goes backwards means
    /// clock skew or a misbehaving server; it is logged and still applied.
    fn advance_to(&mut self, created_at: &str) {
        if let Some(previous) = self.0.as_deref() {
            if let (Some(old), Some(new)) = (parse_timestamp(previous), parse_timestamp(created_at))
            {
                if new < old {
                    tracing::warn!(
                        "Alert watermark moved backwards from {} to {}",
                        previous,
                        created_at
                    );
                }
            }
        }
        self.0 = Some(created_at.to_string());
    }
}

/// The watermark a non-empty newest-first batch moves to
pub fn next_watermark(batch: &[AlertRecord]) -> Option<&str> {
    batch.first().map(|record| record.created_at.as_str())
}

/// What a single poll did to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// First load: the view was rebuilt with this many rows
    Replaced(usize),
    /// This many rows were added above the existing ones
    Appended(usize),
    /// First load found no alerts; the empty placeholder is shown
    EmptyShown,
    /// No new alerts since the watermark
    Unchanged,
    /// First load failed; the error row is shown
    ErrorShown,
    /// A later poll failed; the view was left alone
    FailedSilently,
    /// A newer poll was applied first; this response was dropped
    Stale,
}

#[derive(Debug)]
struct FeedState {
    watermark: Watermark,
    last_applied_seq: u64,
    reconciler: Reconciler,
}

/// Polls the alerts endpoint and reconciles results into a sink.
///
/// Each poll is tagged with a sequence number when it is issued. A response
/// is applied only if no newer poll has been applied and the watermark it
/// was requested with is still current.
pub struct Poller<S> {
    api: Arc<AlertsApi>,
    sink: Arc<RwLock<S>>,
    state: Mutex<FeedState>,
    next_seq: AtomicU64,
    notifiers: Vec<Arc<dyn Notifier>>,
    notify_new_alerts: bool,
}

impl<S> std::fmt::Debug for Poller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("api", &self.api)
            .field("notify_new_alerts", &self.notify_new_alerts)
            .finish()
    }
}

impl<S> Poller<S>
where
    S: PresentationSink + 'static,
{
    pub fn new(api: Arc<AlertsApi>, sink: Arc<RwLock<S>>, reconciler: Reconciler) -> Self {
        Self {
            api,
            sink,
            state: Mutex::new(FeedState {
                watermark: Watermark::unset(),
                last_applied_seq: 0,
                reconciler,
            }),
            next_seq: AtomicU64::new(0),
            notifiers: Vec::new(),
            notify_new_alerts: false,
        }
    }

    /// Send a notice to `notifiers` whenever a poll appends new alerts
    pub fn with_new_alert_notices(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notify_new_alerts = !notifiers.is_empty();
        self.notifiers = notifiers;
        self
    }

    pub async fn watermark(&self) -> Watermark {
        self.state.lock().await.watermark.clone()
    }

    /// Run one fetch-and-reconcile cycle
    pub async fn poll(&self) -> PollOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let issued_with = self.watermark().await;

        let result = self.api.fetch_alerts(issued_with.get()).await;
        let outcome = self.apply(seq, &issued_with, result).await;
        tracing::debug!("Poll #{} (since {:?}): {:?}", seq, issued_with.get(), outcome);

        if let PollOutcome::Appended(count) = outcome {
            if count > 0 && self.notify_new_alerts {
                let noun = if count == 1 { "alert" } else { "alerts" };
                notify_all(&self.notifiers, &Notice::info(format!("{} new {}", count, noun)))
                    .await;
            }
        }
        outcome
    }

    async fn apply(
        &self,
        seq: u64,
        issued_with: &Watermark,
        result: crate::Result<Vec<AlertRecord>>,
    ) -> PollOutcome {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if seq <= state.last_applied_seq || state.watermark != *issued_with {
            tracing::debug!(
                "Dropping stale poll #{} (last applied #{})",
                seq,
                state.last_applied_seq
            );
            return PollOutcome::Stale;
        }
        state.last_applied_seq = seq;

        let mut sink = self.sink.write().await;
        match result {
            Err(e) => {
                match e.kind() {
                    FailureKind::DecodeFailure => {
                        tracing::error!("Alert response could not be decoded: {}", e)
                    }
                    _ => tracing::error!("Failed to load alerts: {}", e),
                }
                if state.watermark.is_set() {
                    PollOutcome::FailedSilently
                } else {
                    sink.clear();
                    sink.show_error(LOAD_ERROR_MESSAGE);
                    PollOutcome::ErrorShown
                }
            }
            Ok(batch) => {
                let Some(cursor) = next_watermark(&batch) else {
                    if state.watermark.is_set() {
                        return PollOutcome::Unchanged;
                    }
                    sink.clear();
                    sink.show_empty();
                    return PollOutcome::EmptyShown;
                };

                let mode = ReconcileMode::for_watermark(&state.watermark);
                let inserted = state.reconciler.reconcile(&batch, mode, &mut *sink);
                state.watermark.advance_to(cursor);

                match mode {
                    ReconcileMode::FullReplace => PollOutcome::Replaced(inserted),
                    ReconcileMode::IncrementalAppend => PollOutcome::Appended(inserted),
                }
            }
        }
    }

    /// Poll now and then on every `interval` until `cancel` fires. Each
    /// poll runs as its own task; in-flight polls are aborted on cancel.
    pub async fn run(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Alert polling cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    while in_flight.try_join_next().is_some() {}
                    let poller = Arc::clone(&self);
                    in_flight.spawn(async move { poller.poll().await });
                }
            }
        }

        in_flight.shutdown().await;
    }
}
