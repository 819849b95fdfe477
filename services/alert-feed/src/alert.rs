//! Alert records as emitted by the alerts endpoint

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Category of an alert. Unknown kinds are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertType {
    Info,
    Error,
    Success,
    Warning,
    Debug,
    Timeout,
    Validation,
    Interruption,
    Other(String),
}

impl AlertType {
    /// The string used for this kind on the wire
    pub fn wire_name(&self) -> &str {
        match self {
            AlertType::Info => "Informacao",
            AlertType::Error => "Erro",
            AlertType::Success => "Sucesso",
            AlertType::Warning => "Alerta",
            AlertType::Debug => "Debug",
            AlertType::Timeout => "Timeout",
            AlertType::Validation => "Validacao",
            AlertType::Interruption => "Interrupcao",
            AlertType::Other(raw) => raw,
        }
    }

    /// Display style for the category column
    pub fn style(&self) -> CategoryStyle {
        let (tone, icon, label) = match self {
            AlertType::Info => (Tone::Primary, "info-circle", "Informação"),
            AlertType::Error => (Tone::Danger, "exclamation-triangle", "Erro"),
            AlertType::Success => (Tone::Success, "check-circle", "Sucesso"),
            AlertType::Warning => (Tone::Warning, "exclamation-circle", "Alerta"),
            AlertType::Debug => (Tone::Muted, "terminal", "Debug"),
            AlertType::Timeout => (Tone::Dark, "hourglass-split", "Timeout"),
            AlertType::Validation => (Tone::Info, "shield-check", "Validação"),
            AlertType::Interruption => (Tone::Dark, "slash-circle", "Interrupção"),
            AlertType::Other(raw) => {
                return CategoryStyle {
                    tone: Tone::Secondary,
                    icon: "bell",
                    label: raw.clone(),
                }
            }
        };
        CategoryStyle {
            tone,
            icon,
            label: label.to_string(),
        }
    }
}

impl From<String> for AlertType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Informacao" => AlertType::Info,
            "Erro" => AlertType::Error,
            "Sucesso" => AlertType::Success,
            "Alerta" => AlertType::Warning,
            "Debug" => AlertType::Debug,
            "Timeout" => AlertType::Timeout,
            "Validacao" => AlertType::Validation,
            "Interrupcao" => AlertType::Interruption,
            _ => AlertType::Other(raw),
        }
    }
}

impl From<AlertType> for String {
    fn from(kind: AlertType) -> Self {
        match kind {
            AlertType::Other(raw) => raw,
            known => known.wire_name().to_string(),
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Color tone of a category label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Primary,
    Danger,
    Success,
    Warning,
    Muted,
    Dark,
    Info,
    Secondary,
}

impl Tone {
    /// Foreground color used by the dashboard
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Primary => "#0d6efd",
            Tone::Danger => "#dc3545",
            Tone::Success => "#198754",
            Tone::Warning => "#ffc107",
            Tone::Muted => "#6c757d",
            Tone::Dark => "#212529",
            Tone::Info => "#0dcaf0",
            Tone::Secondary => "#6c757d",
        }
    }
}

/// Styled category label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    pub tone: Tone,
    pub icon: &'static str,
    pub label: String,
}

/// One server-emitted alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robot: Option<serde_json::Value>,
    pub alert_type: AlertType,
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    pub created_at: String,
}

/// Composite identity used for optional client-side de-duplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertIdentity {
    pub created_at: String,
    pub message: String,
}

impl AlertRecord {
    pub fn new(alert_type: AlertType, message: &str, created_at: &str) -> Self {
        Self {
            id: None,
            robot: None,
            alert_type,
            message: message.to_string(),
            details: None,
            created_at: created_at.to_string(),
        }
    }

    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    /// True when the record carries non-empty technical details
    pub fn has_details(&self) -> bool {
        self.details.as_deref().is_some_and(|d| !d.is_empty())
    }

    pub fn identity(&self) -> AlertIdentity {
        AlertIdentity {
            created_at: self.created_at.clone(),
            message: self.message.clone(),
        }
    }

    /// Parse `created_at` as an RFC 3339 timestamp
    pub fn created_at_parsed(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.created_at)
    }
}

/// Parse an ISO-8601 timestamp. Values without an offset are read as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.fixed_offset())
}
