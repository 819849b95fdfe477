//! One-shot item authorization with a per-item control state

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::client::AlertsApi;
use crate::notifier::{notify_all, Notice, Notifier};

pub const REFUSED_MESSAGE: &str = "Failed to authorize the item.";
pub const ERROR_MESSAGE: &str = "Error authorizing the item.";

/// State of the control that triggers authorization for one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    #[default]
    Idle,
    Pending,
    Authorized,
}

impl ControlState {
    pub fn label(&self) -> &'static str {
        match self {
            ControlState::Idle => "Authorize",
            ControlState::Pending => "Authorizing...",
            ControlState::Authorized => "Authorized",
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(self, ControlState::Idle)
    }
}

/// Control as rendered for an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub item_id: String,
    pub state: ControlState,
    pub label: &'static str,
    pub enabled: bool,
}

impl Control {
    fn new(item_id: &str, state: ControlState) -> Self {
        Self {
            item_id: item_id.to_string(),
            state,
            label: state.label(),
            enabled: state.enabled(),
        }
    }
}

/// An authorization attempt that did not end with the item authorized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizeFailure {
    pub error: String,
    pub control: Control,
}

type Controls = Mutex<HashMap<String, ControlState>>;

fn lock(controls: &Controls) -> MutexGuard<'_, HashMap<String, ControlState>> {
    controls.lock().unwrap_or_else(PoisonError::into_inner)
}

fn store(controls: &Controls, item_id: &str, state: ControlState) {
    let mut controls = lock(controls);
    if state == ControlState::Idle {
        controls.remove(item_id);
    } else {
        controls.insert(item_id.to_string(), state);
    }
}

/// Holds an item in `Pending` while its request is in flight. Dropped
/// before `settle`, it puts the item back to `Idle`.
struct PendingGuard<'a> {
    controls: &'a Controls,
    item_id: &'a str,
    armed: bool,
}

impl PendingGuard<'_> {
    fn settle(mut self, state: ControlState) {
        self.armed = false;
        store(self.controls, self.item_id, state);
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(
                "Authorization of item {} was abandoned, control reset",
                self.item_id
            );
            store(self.controls, self.item_id, ControlState::Idle);
        }
    }
}

/// Runs the authorization action and tracks each item's control.
/// Only items that are pending or authorized are kept in the map.
pub struct Authorizer {
    api: Arc<AlertsApi>,
    controls: Controls,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("api", &self.api)
            .field("notifiers", &self.notifiers.len())
            .finish()
    }
}

impl Authorizer {
    pub fn new(api: Arc<AlertsApi>, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self {
            api,
            controls: Mutex::new(HashMap::new()),
            notifiers,
        }
    }

    /// Current control for `item_id`
    pub fn control(&self, item_id: &str) -> Control {
        let state = lock(&self.controls)
            .get(item_id)
            .copied()
            .unwrap_or_default();
        Control::new(item_id, state)
    }

    /// Authorize `item_id`. A control that is pending or already
    /// authorized is returned as is without another request.
    pub async fn authorize(&self, item_id: &str) -> Result<Control, AuthorizeFailure> {
        let guard = {
            let mut controls = lock(&self.controls);
            if let Some(state) = controls.get(item_id).filter(|state| !state.enabled()) {
                tracing::debug!("Ignoring authorize for item {} in state {:?}", item_id, state);
                return Ok(Control::new(item_id, *state));
            }
            controls.insert(item_id.to_string(), ControlState::Pending);
            PendingGuard {
                controls: &self.controls,
                item_id,
                armed: true,
            }
        };

        let settled = match self.api.authorize_item(item_id).await {
            Ok(response) if response.is_authorized => Ok(()),
            Ok(_) => {
                tracing::warn!("Server refused to authorize item {}", item_id);
                Err(REFUSED_MESSAGE)
            }
            Err(e) => {
                tracing::error!("Authorizing item {} failed: {}", item_id, e);
                match e {
                    crate::AlertFeedError::Status { .. } => Err(REFUSED_MESSAGE),
                    _ => Err(ERROR_MESSAGE),
                }
            }
        };

        let state = if settled.is_ok() {
            ControlState::Authorized
        } else {
            ControlState::Idle
        };
        guard.settle(state);
        let control = Control::new(item_id, state);

        match settled {
            Ok(()) => {
                tracing::info!("Item {} authorized", item_id);
                Ok(control)
            }
            Err(message) => {
                notify_all(&self.notifiers, &Notice::error(message)).await;
                Err(AuthorizeFailure {
                    error: message.to_string(),
                    control,
                })
            }
        }
    }
}
