//! Bulk loading: one multi-row insert per planned batch, strictly in order.
//!
//! A failed batch stops the load immediately. Nothing is retried and
//! nothing already committed is rolled back; the partial [`LoadReport`] is
//! returned with the error. The loader never clears the table, that is the
//! caller's job before a fresh load.

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::access::{DatabaseAccess, PlaceholderStyle, SqlValue, TargetTable};
use crate::cancel::CancelToken;
use crate::error::{Failed, HarnessError};
use crate::plan::{Batch, LoadSpec};
use crate::rowgen::RowGenerator;
use crate::session::Session;

/// Sent to the progress observer after every committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    /// 1-based position of the batch in the plan.
    pub batch_number: u64,
    pub start_index: u64,
    pub rows_in_batch: u64,
    /// Cumulative rows committed so far.
    pub rows_loaded: u64,
}

/// Outcome of a load, produced once after the last batch (or the stop).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Rows requested by the `LoadSpec`.
    pub total_rows: u64,
    /// Rows actually committed.
    pub rows_loaded: u64,
    pub batches_completed: u64,
    pub total_duration: Duration,
    /// The load stopped on a cancel signal before the plan was exhausted.
    pub cancelled: bool,
}

impl LoadReport {
    fn empty(total_rows: u64) -> Self {
        Self {
            total_rows,
            rows_loaded: 0,
            batches_completed: 0,
            total_duration: Duration::ZERO,
            cancelled: false,
        }
    }
}

/// Build `INSERT INTO table(column) VALUES (p1), (p2), ...` for `rows` rows.
pub fn insert_statement(
    table: &TargetTable,
    style: PlaceholderStyle,
    rows: u64,
) -> String {
    let mut sql = format!(
        "INSERT INTO {}({}) VALUES ",
        table.name(),
        table.value_column()
    );
    sql.reserve(rows as usize * 10);
    for position in 1..=rows as usize {
        if position > 1 {
            sql.push_str(", ");
        }
        sql.push('(');
        sql.push_str(&style.marker(position));
        sql.push(')');
    }
    sql
}

pub struct BulkLoader {
    table: TargetTable,
    generator: Box<dyn RowGenerator>,
    progress: Option<Sender<LoadProgress>>,
    cancel: CancelToken,
}

impl BulkLoader {
    pub fn new(table: TargetTable, generator: Box<dyn RowGenerator>) -> Self {
        Self {
            table,
            generator,
            progress: None,
            cancel: CancelToken::new(),
        }
    }

    /// Report each committed batch on `tx`. Sending never blocks, and a
    /// dropped receiver is ignored.
    pub fn with_progress(mut self, tx: Sender<LoadProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn table(&self) -> &TargetTable {
        &self.table
    }

    fn batch_values(&self, batch: &Batch) -> Vec<SqlValue> {
        batch
            .indices()
            .map(|i| SqlValue::Integer(self.generator.value_for(i)))
            .collect()
    }

    fn notify(&self, progress: LoadProgress) {
        if let Some(tx) = &self.progress {
            // Observer may have gone away; the load carries on regardless.
            let _ = tx.send(progress);
        }
    }

    /// Load every batch of `spec` into the target table.
    pub fn load<D: DatabaseAccess>(
        &self,
        session: &mut Session<D>,
        spec: &LoadSpec,
    ) -> Result<LoadReport, Failed<LoadReport>> {
        let style = session.backend().placeholder_style();
        let started = Instant::now();
        let mut report = LoadReport::empty(spec.total_rows());

        log::info!(
            "Loading {} rows into {} in {} batches of {}",
            spec.total_rows(),
            self.table.name(),
            spec.batch_count(),
            spec.batch_size()
        );

        // All batches but the last share one row count, so the statement is
        // rebuilt at most twice.
        let mut sql = String::new();
        let mut sql_rows = 0;

        for (i, batch) in spec.batches().enumerate() {
            if self.cancel.is_cancelled() {
                log::warn!(
                    "Load cancelled after {} of {} batches",
                    report.batches_completed,
                    spec.batch_count()
                );
                report.cancelled = true;
                break;
            }

            let values = self.batch_values(&batch);
            if sql_rows != batch.count {
                sql = insert_statement(&self.table, style, batch.count);
                sql_rows = batch.count;
            }

            if let Err(cause) = session.backend().execute(&sql, &values) {
                log::error!(
                    "Batch {} (rows {}..{}) failed: {cause}",
                    i + 1,
                    batch.start_index,
                    batch.end_index()
                );
                report.total_duration = started.elapsed();
                return Err(Failed::new(
                    report,
                    HarnessError::BatchLoadFailed {
                        start_index: batch.start_index,
                        cause,
                    },
                ));
            }

            report.batches_completed += 1;
            report.rows_loaded += batch.count;
            log::debug!(
                "Inserted batch: {} to {}",
                batch.start_index + 1,
                batch.end_index()
            );
            self.notify(LoadProgress {
                batch_number: i as u64 + 1,
                start_index: batch.start_index,
                rows_in_batch: batch.count,
                rows_loaded: report.rows_loaded,
            });
        }

        report.total_duration = started.elapsed();
        log::info!(
            "Loaded {} rows in {} batches ({:.2}s)",
            report.rows_loaded,
            report.batches_completed,
            report.total_duration.as_secs_f64()
        );
        Ok(report)
    }
}
