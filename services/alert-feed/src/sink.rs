//! Presentation sink contract and the in-memory alert table behind the dashboard

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::alert::AlertRecord;
use crate::row::{to_row, AlertRow, RowId};

pub const NO_MESSAGE: &str = "No message.";
pub const NO_DETAILS: &str = "No technical details available.";

/// Row table that reconciled alerts are rendered into
pub trait PresentationSink: Send + Sync {
    /// Remove every row, including error rows
    fn clear(&mut self);

    /// Add a batch of rows in one pass
    fn insert_all(&mut self, rows: Vec<(AlertRow, AlertRecord)>);

    /// Add a single row, above all existing rows when `at_top` is set
    fn insert_one(&mut self, row: AlertRow, record: AlertRecord, at_top: bool);

    /// Show the empty-state placeholder
    fn show_empty(&mut self);

    /// Show a single error-state row
    fn show_error(&mut self, message: &str);
}

/// Surface that displays the details of one alert
pub trait DetailSurface {
    fn show_details(&mut self, message: &str, details: &str);
}

/// A row as held by the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableRow {
    Alert(AlertRow),
    Error { message: String },
}

/// What the table shows when it has no rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    Loading,
    Empty,
}

impl Placeholder {
    pub fn text(&self) -> &'static str {
        match self {
            Placeholder::Loading => "Loading alerts...",
            Placeholder::Empty => "No alerts found.",
        }
    }
}

/// Message and details shown by a detail surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertDetails {
    pub message: String,
    pub details: String,
}

impl DetailSurface for Option<AlertDetails> {
    fn show_details(&mut self, message: &str, details: &str) {
        *self = Some(AlertDetails {
            message: message.to_string(),
            details: details.to_string(),
        });
    }
}

/// In-memory alert table. Records of interactive rows are kept in a side
/// map keyed by row id, so opening a row never round-trips through markup.
#[derive(Debug)]
pub struct AlertTable {
    rows: Vec<TableRow>,
    records: HashMap<RowId, AlertRecord>,
    placeholder: Placeholder,
}

impl Default for AlertTable {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            records: HashMap::new(),
            placeholder: Placeholder::Loading,
        }
    }
}

impl AlertTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in insertion order (top first)
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn placeholder(&self) -> Placeholder {
        self.placeholder
    }

    /// Rows ordered newest first by the timestamp sort key. Rows without a
    /// key keep their relative order after the keyed ones; error rows stay on top.
    pub fn sorted_rows(&self) -> Vec<&TableRow> {
        let mut rows: Vec<&TableRow> = self.rows.iter().collect();
        rows.sort_by_key(|row| match row {
            TableRow::Error { .. } => (0, 0),
            TableRow::Alert(alert) => match alert.timestamp.sort_key_ms {
                Some(key) => (1, -key),
                None => (2, 0),
            },
        });
        rows
    }

    /// The stored record behind an interactive row
    pub fn record(&self, id: RowId) -> Option<&AlertRecord> {
        self.records.get(&id)
    }

    /// Row click binding: show the details of `id` on `surface`.
    /// Returns false when the row is unknown or not interactive.
    pub fn open_details(&self, id: RowId, surface: &mut dyn DetailSurface) -> bool {
        let Some(record) = self.records.get(&id) else {
            return false;
        };
        let message = if record.message.is_empty() {
            NO_MESSAGE
        } else {
            record.message.as_str()
        };
        let details = record
            .details
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(NO_DETAILS);
        surface.show_details(message, details);
        true
    }

    fn remember(&mut self, row: &AlertRow, record: AlertRecord) {
        if row.interactive {
            self.records.insert(row.id, record);
        }
    }
}

impl PresentationSink for AlertTable {
    fn clear(&mut self) {
        self.rows.clear();
        self.records.clear();
    }

    fn insert_all(&mut self, rows: Vec<(AlertRow, AlertRecord)>) {
        self.rows.reserve(rows.len());
        for (row, record) in rows {
            self.remember(&row, record);
            self.rows.push(TableRow::Alert(row));
        }
    }

    fn insert_one(&mut self, row: AlertRow, record: AlertRecord, at_top: bool) {
        self.remember(&row, record);
        if at_top {
            self.rows.insert(0, TableRow::Alert(row));
        } else {
            self.rows.push(TableRow::Alert(row));
        }
    }

    fn show_empty(&mut self) {
        self.placeholder = Placeholder::Empty;
    }

    fn show_error(&mut self, message: &str) {
        self.rows.push(TableRow::Error {
            message: message.to_string(),
        });
    }
}

/// Thread-safe shared table handle
pub type TableHandle = Arc<RwLock<AlertTable>>;

pub fn new_table_handle() -> TableHandle {
    Arc::new(RwLock::new(AlertTable::new()))
}

/// Render `record` as row `id`, paired with the record the table keeps for it
pub fn row_with_record(record: &AlertRecord, id: RowId) -> (AlertRow, AlertRecord) {
    (to_row(record, id), record.clone())
}
