// Batch Upsert Executor

use crate::config::BatchConfig;
use crate::error::StoreError;
use crate::graph::{GraphStore, Params};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default records per write transaction
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default attempts per batch, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

/// Batching and retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        BatchPolicy {
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl From<&BatchConfig> for BatchPolicy {
    fn from(config: &BatchConfig) -> Self {
        BatchPolicy {
            batch_size: config.batch_size.max(1),
            max_attempts: config.max_retries.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Aggregate result of uploading one record set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub prepared: usize,
    pub processed: usize,
    pub failed: usize,
    pub batches: usize,
    pub failed_batches: usize,
    /// Cancellation stopped the upload before every batch was attempted
    pub interrupted: bool,
}

impl BatchOutcome {
    /// Records never attempted because of cancellation
    pub fn skipped(&self) -> usize {
        self.prepared - self.processed - self.failed
    }
}

/// Sequential, retried batch writer
///
/// Issues one write transaction at a time. A batch that fails on every
/// attempt is counted as failed and the executor moves on to the next one.
pub struct BatchUpsertExecutor<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    policy: BatchPolicy,
    cancel: CancellationToken,
    progress: bool,
}

impl<'a, S: GraphStore + ?Sized> BatchUpsertExecutor<'a, S> {
    pub fn new(store: &'a S, policy: BatchPolicy, cancel: CancellationToken) -> Self {
        BatchUpsertExecutor {
            store,
            policy,
            cancel,
            progress: true,
        }
    }

    /// Disable the terminal progress bar
    pub fn without_progress(mut self) -> Self {
        self.progress = false;
        self
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Upload `records` with `statement`, one transaction per batch
    ///
    /// Cancellation is checked before each batch; a batch already in flight
    /// always runs to completion, retries included.
    pub async fn execute<R: Serialize>(&self, label: &str, statement: &str, records: &[R]) -> BatchOutcome {
        let batch_size = self.policy.batch_size.max(1);
        let total_batches = records.len().div_ceil(batch_size);
        let mut outcome = BatchOutcome {
            prepared: records.len(),
            ..BatchOutcome::default()
        };

        info!(
            label,
            records = records.len(),
            batches = total_batches,
            batch_size,
            "Uploading {} {} in {} batches",
            records.len(),
            label,
            total_batches
        );

        let progress = self.progress_bar(label, records.len());

        for (index, chunk) in records.chunks(batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    label,
                    completed = index,
                    remaining = total_batches - index,
                    "Upload of {} interrupted after {} / {} batches",
                    label,
                    index,
                    total_batches
                );
                outcome.interrupted = true;
                break;
            }

            let batch = index + 1;
            match self.run_batch(label, statement, batch, total_batches, chunk).await {
                Ok(()) => outcome.processed += chunk.len(),
                Err(e) => {
                    error!(
                        label,
                        batch,
                        records = chunk.len(),
                        error = %e,
                        "Batch {} / {} of {} failed permanently",
                        batch,
                        total_batches,
                        label
                    );
                    outcome.failed += chunk.len();
                    outcome.failed_batches += 1;
                },
            }
            outcome.batches += 1;
            progress.inc(chunk.len() as u64);
        }

        progress.finish_and_clear();

        info!(
            label,
            processed = outcome.processed,
            failed = outcome.failed,
            failed_batches = outcome.failed_batches,
            "Finished uploading {}: {} processed, {} failed",
            label,
            outcome.processed,
            outcome.failed
        );

        outcome
    }

    /// One batch with bounded, fixed-delay retries
    async fn run_batch<R: Serialize>(
        &self,
        label: &str,
        statement: &str,
        batch: usize,
        total_batches: usize,
        chunk: &[R],
    ) -> Result<(), StoreError> {
        // Encoding is deterministic, so a failure here is not retried
        let rows = encode(chunk)?;
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(label, batch, attempt, "Writing batch {} / {}", batch, total_batches);

            match self.store.write_batch(statement, &rows).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < max_attempts => {
                    warn!(
                        label,
                        batch,
                        attempt,
                        error = %e,
                        "Batch attempt {}/{} failed, retrying in {:?}",
                        attempt,
                        max_attempts,
                        self.policy.retry_delay
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                    attempt += 1;
                },
                Err(e) => return Err(e),
            }
        }
    }

    fn progress_bar(&self, label: &str, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Uploading {}", label));
        pb
    }
}

/// Serialize records into statement parameter maps
pub fn encode<R: Serialize>(records: &[R]) -> Result<Vec<Params>, StoreError> {
    records
        .iter()
        .map(|record| match serde_json::to_value(record) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(StoreError::Encoding(format!(
                "expected a record object, got {}",
                other
            ))),
            Err(e) => Err(StoreError::Encoding(e.to_string())),
        })
        .collect()
}
