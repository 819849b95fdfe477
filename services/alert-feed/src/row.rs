//! Pure transformation of alert records into table rows

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::alert::{AlertRecord, CategoryStyle};

/// Display format of the timestamp column
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Identifier of a rendered row, unique for the lifetime of a reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out increasing row ids
#[derive(Debug, Default)]
pub struct RowIdAllocator {
    next: u64,
}

impl RowIdAllocator {
    pub fn allocate(&mut self) -> RowId {
        self.next += 1;
        RowId(self.next)
    }
}

/// Timestamp column: locale-formatted display plus the epoch sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimestampCell {
    pub display: String,
    pub sort_key_ms: Option<i64>,
}

/// A renderable alert row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRow {
    pub id: RowId,
    pub category: CategoryStyle,
    pub message: String,
    /// Set when the record has details; the row then opens a detail view on click
    pub interactive: bool,
    pub timestamp: TimestampCell,
}

/// Map a record to a row. Pure apart from reading the local time zone.
pub fn to_row(record: &AlertRecord, id: RowId) -> AlertRow {
    AlertRow {
        id,
        category: record.alert_type.style(),
        message: record.message.clone(),
        interactive: record.has_details(),
        timestamp: timestamp_cell(&record.created_at, &Local),
    }
}

/// Build the timestamp column for `raw`, rendering the display text in `tz`
pub fn timestamp_cell<Tz: TimeZone>(raw: &str, tz: &Tz) -> TimestampCell
where
    Tz::Offset: fmt::Display,
{
    match crate::alert::parse_timestamp(raw) {
        Some(parsed) => TimestampCell {
            display: format_timestamp(&parsed.with_timezone(tz)),
            sort_key_ms: Some(parsed.timestamp_millis()),
        },
        None => {
            tracing::warn!("Unparsable alert timestamp '{}'", raw);
            TimestampCell {
                display: raw.to_string(),
                sort_key_ms: None,
            }
        }
    }
}

pub fn format_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    dt.format(TIMESTAMP_FORMAT).to_string()
}
