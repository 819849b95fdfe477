//! Merges fetched alert batches into the presentation sink

use std::collections::HashSet;

use crate::alert::{AlertIdentity, AlertRecord};
use crate::poller::Watermark;
use crate::row::RowIdAllocator;
use crate::sink::{row_with_record, PresentationSink};

/// How a batch is merged into the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Discard the view and rebuild it from the batch
    FullReplace,
    /// Prepend the batch above the rows already shown
    IncrementalAppend,
}

impl ReconcileMode {
    pub fn for_watermark(watermark: &Watermark) -> Self {
        if watermark.is_set() {
            ReconcileMode::IncrementalAppend
        } else {
            ReconcileMode::FullReplace
        }
    }
}

/// Reconciles newest-first batches into a sink.
///
/// Incremental batches are trusted to be disjoint from what is already
/// shown: the server's `since` filter must be strictly greater-than. When
/// that cannot be guaranteed, enable identity de-duplication.
#[derive(Debug, Default)]
pub struct Reconciler {
    row_ids: RowIdAllocator,
    seen: Option<HashSet<AlertIdentity>>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciler that skips records whose `(created_at, message)` was already rendered
    pub fn with_dedupe() -> Self {
        Self {
            row_ids: RowIdAllocator::default(),
            seen: Some(HashSet::new()),
        }
    }

    pub fn dedupes(&self) -> bool {
        self.seen.is_some()
    }

    /// Merge `batch` into `sink`, returning the number of rows inserted
    pub fn reconcile<S>(&mut self, batch: &[AlertRecord], mode: ReconcileMode, sink: &mut S) -> usize
    where
        S: PresentationSink + ?Sized,
    {
        match mode {
            ReconcileMode::FullReplace => {
                if let Some(seen) = self.seen.as_mut() {
                    seen.clear();
                }
                let mut rows = Vec::with_capacity(batch.len());
                for record in batch {
                    if self.mark_seen(record) {
                        rows.push(row_with_record(record, self.row_ids.allocate()));
                    }
                }
                let inserted = rows.len();
                sink.clear();
                sink.insert_all(rows);
                inserted
            }
            ReconcileMode::IncrementalAppend => {
                // Oldest first, so the batch ends up on top in its own newest-first order
                let mut inserted = 0;
                for record in batch.iter().rev() {
                    if !self.mark_seen(record) {
                        tracing::debug!(
                            "Skipping duplicate alert '{}' at {}",
                            record.message,
                            record.created_at
                        );
                        continue;
                    }
                    let (row, record) = row_with_record(record, self.row_ids.allocate());
                    sink.insert_one(row, record, true);
                    inserted += 1;
                }
                inserted
            }
        }
    }

    /// Record the identity of `record`; false if it was already seen
    fn mark_seen(&mut self, record: &AlertRecord) -> bool {
        match self.seen.as_mut() {
            Some(seen) => seen.insert(record.identity()),
            None => true,
        }
    }
}
