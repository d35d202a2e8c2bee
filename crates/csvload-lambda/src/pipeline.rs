//! Ingest-and-load pipeline
//!
//! Reads one CSV stream row by row, discards the header, maps every data row
//! to a [`TransactionRecord`] and submits the records in write groups of at
//! most `max_batch_size`. A group is flushed as soon as it is full and once
//! more at end of stream, so N data rows produce `ceil(N / max_batch_size)`
//! bulk writes when every write succeeds.
//!
//! A record whose `Id` is already pending in the current group replaces the
//! pending one, so a submitted group never carries duplicate keys.
//!
//! Read errors (malformed quoting, invalid UTF-8, short rows) stop ingestion. Groups already
//! flushed stay written and the group being filled is dropped. The run still
//! returns a report, with an `aborted` outcome. Write errors are handled by
//! the configured [`WriteFailurePolicy`].

use csv_async::{AsyncReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;
use tracing::{debug, error, info, instrument, warn};

use crate::batch::WriteGroup;
use crate::config::{LoaderConfig, WriteFailurePolicy};
use crate::error::{LoaderError, LoaderResult};
use crate::event::ObjectLocation;
use crate::quote::QuoteGuard;
use crate::record::TransactionRecord;
use crate::sink::BatchWriter;

/// How a load ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// The stream was read to the end
    #[default]
    Completed,
    /// A read error stopped ingestion before the end of the stream
    Aborted { reason: String },
}

/// Summary of one load, returned as the function response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoadReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectLocation>,
    pub table: String,
    /// Data rows mapped to records, header excluded
    pub rows_read: u64,
    /// Write groups flushed
    pub batches: u64,
    /// Bulk write calls issued, retries included
    pub write_calls: u64,
    /// Records the store accepted
    pub records_written: u64,
    /// Groups that still had unapplied records after the policy gave up
    pub batches_failed: u64,
    /// Records that were never applied
    pub records_failed: u64,
    /// Rows that replaced a pending record with the same `Id`
    pub records_merged: u64,
    pub outcome: LoadOutcome,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == LoadOutcome::Completed
    }
}

/// Streams CSV rows into the table through a [`BatchWriter`]
pub struct LoadPipeline<'a> {
    writer: &'a dyn BatchWriter,
    config: &'a LoaderConfig,
}

impl<'a> LoadPipeline<'a> {
    pub fn new(writer: &'a dyn BatchWriter, config: &'a LoaderConfig) -> Self {
        Self { writer, config }
    }

    /// Load every data row of `reader`
    ///
    /// Returns an error only when the write failure policy is
    /// [`WriteFailurePolicy::Abort`] and a batch fails.
    #[instrument(skip_all, fields(table = %self.config.table_name))]
    pub async fn run<R>(&self, reader: R) -> LoaderResult<LoadReport>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut report = LoadReport {
            table: self.config.table_name.clone(),
            ..LoadReport::default()
        };

        match self.ingest(reader, &mut report).await {
            Ok(()) => {
                info!(
                    rows = report.rows_read,
                    written = report.records_written,
                    failed = report.records_failed,
                    merged = report.records_merged,
                    "Finished loading rows"
                );
                Ok(report)
            },
            Err(e) if e.is_read_error() => {
                error!(
                    error = %e,
                    rows = report.rows_read,
                    written = report.records_written,
                    "Stopped reading input; unflushed rows were discarded"
                );
                report.outcome = LoadOutcome::Aborted {
                    reason: e.to_string(),
                };
                Ok(report)
            },
            Err(e) => Err(e),
        }
    }

    async fn ingest<R>(&self, reader: R, report: &mut LoadReport) -> LoaderResult<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut csv = AsyncReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .create_reader(QuoteGuard::new(reader));

        let mut row = StringRecord::new();
        let mut counter: u64 = 0;
        let mut group = WriteGroup::new(self.config.max_batch_size);

        while csv.read_record(&mut row).await? {
            if counter == 0 {
                debug!(header = ?row, "Skipping header row");
                counter += 1;
                continue;
            }

            let record = TransactionRecord::from_row(counter, &row, self.config.id_strategy)?;
            report.rows_read += 1;
            counter += 1;

            if let Some(pending) = group.find_mut(|pending: &TransactionRecord| pending.id == record.id) {
                debug!(id = %record.id, "Replacing pending record with the same id");
                *pending = record;
                report.records_merged += 1;
                continue;
            }

            if let Some(batch) = group.push(record) {
                self.flush(batch, report).await?;
            }
        }

        if let Some(batch) = group.take() {
            self.flush(batch, report).await?;
        }

        Ok(())
    }

    /// Submit one full or final group under the write failure policy
    async fn flush(&self, batch: Vec<TransactionRecord>, report: &mut LoadReport) -> LoaderResult<()> {
        let table = self.config.table_name.as_str();
        let policy = self.config.write_failure_policy;

        report.batches += 1;
        let mut pending = batch;
        let mut retry = 0u32;

        loop {
            info!(count = pending.len(), table, "Writing item(s) to table");
            report.write_calls += 1;

            let failure = match self.writer.write_batch(table, &pending).await {
                Ok(unprocessed) if unprocessed.is_empty() => {
                    report.records_written += pending.len() as u64;
                    return Ok(());
                },
                Ok(unprocessed) => {
                    let applied = pending.len().saturating_sub(unprocessed.len());
                    report.records_written += applied as u64;
                    pending = unprocessed;
                    LoaderError::Unprocessed {
                        table: table.to_string(),
                        count: pending.len(),
                    }
                },
                Err(e) => e,
            };

            if policy == WriteFailurePolicy::Abort {
                report.batches_failed += 1;
                report.records_failed += pending.len() as u64;
                error!(error = %failure, records = pending.len(), "Batch write failed; aborting");
                return Err(failure);
            }

            retry += 1;
            match policy.backoff(retry) {
                Some(delay) => {
                    warn!(
                        error = %failure,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        records = pending.len(),
                        "Batch write failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                },
                None => {
                    error!(
                        error = %failure,
                        records = pending.len(),
                        "Batch write failed; continuing with next batch"
                    );
                    report.batches_failed += 1;
                    report.records_failed += pending.len() as u64;
                    return Ok(());
                },
            }
        }
    }
}
