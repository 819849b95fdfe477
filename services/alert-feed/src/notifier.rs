//! Transient notifications (toasts) for feed and authorization events

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub timestamp_epoch_ms: u64,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp_epoch_ms: current_epoch_ms(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Trait for surfacing notices
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "toast")
    fn type_name(&self) -> &str;

    /// Deliver a notice
    async fn notify(&self, notice: &Notice) -> crate::Result<()>;
}

/// Send `notice` to every notifier; failures are logged and skipped
pub async fn notify_all(notifiers: &[Arc<dyn Notifier>], notice: &Notice) {
    for notifier in notifiers {
        if let Err(e) = notifier.notify(notice).await {
            tracing::warn!("Notice via '{}' failed: {}", notifier.type_name(), e);
        }
    }
}

/// Writes notices to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn type_name(&self) -> &str {
        "log"
    }

    async fn notify(&self, notice: &Notice) -> crate::Result<()> {
        match notice.level {
            NoticeLevel::Error => tracing::warn!("{}", notice.message),
            NoticeLevel::Info | NoticeLevel::Success => tracing::info!("{}", notice.message),
        }
        Ok(())
    }
}

/// Keeps the most recent notices for the dashboard
#[derive(Debug, Clone)]
pub struct ToastBoard {
    notices: Arc<RwLock<VecDeque<Notice>>>,
    max_size: usize,
}

impl ToastBoard {
    pub fn new(max_size: usize) -> Self {
        Self {
            notices: Arc::new(RwLock::new(VecDeque::with_capacity(max_size))),
            max_size,
        }
    }

    pub async fn push(&self, notice: Notice) {
        if self.max_size == 0 {
            return;
        }
        let mut notices = self.notices.write().await;
        if notices.len() >= self.max_size {
            notices.pop_front();
        }
        notices.push_back(notice);
    }

    /// Notices, oldest first
    pub async fn snapshot(&self) -> Vec<Notice> {
        self.notices.read().await.iter().cloned().collect()
    }
}

#[async_trait]
impl Notifier for ToastBoard {
    fn type_name(&self) -> &str {
        "toast"
    }

    async fn notify(&self, notice: &Notice) -> crate::Result<()> {
        self.push(notice.clone()).await;
        Ok(())
    }
}

pub(crate) fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
