//! Failure recorder: persists dead-letter notifications into the DLQ table.
//!
//! One invocation handles one SQS batch (at most 25 messages, matching the
//! `BatchWriteItem` ceiling). The whole batch is parsed, then written in a
//! single request. Items DynamoDB leaves unprocessed are resubmitted, and
//! only those, until none remain.

use std::sync::Arc;

use aws_lambda_events::sqs::SqsMessage;
use backon::{BackoffBuilder, ExponentialBuilder};
use tracing::{error, info, warn};

use crate::dlq::{parse_batch, FailureRecord, ParseError};
use crate::storage::schema::failure_to_item;
use crate::storage::{FailureWriter, StorageError, MAX_BATCH_WRITE_ITEMS};
use crate::utils::retry::unprocessed_items_backoff;

/// Errors from recording a batch.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("SQS batch size exceeds Dynamo batch write operation, received: {0} events")]
    BatchTooLarge(usize),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, RecorderError>;

/// Outcome of a persisted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PersistReport {
    /// Records written.
    pub records: usize,
    /// `BatchWriteItem` calls issued, including resubmissions.
    pub attempts: usize,
}

/// Writes failure batches, resubmitting unprocessed items.
pub struct Recorder {
    writer: Arc<dyn FailureWriter>,
    backoff: ExponentialBuilder,
}

impl Recorder {
    pub fn new(writer: Arc<dyn FailureWriter>) -> Self {
        Self {
            writer,
            backoff: unprocessed_items_backoff(),
        }
    }

    /// Replace the delay policy between resubmissions.
    pub fn with_backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }

    /// Parse and persist one SQS batch.
    pub async fn record(&self, messages: &[SqsMessage]) -> Result<PersistReport> {
        check_batch_size(messages.len())?;

        let records = parse_batch(messages).map_err(|e| {
            error!(error = %e, batch_size = messages.len(), "Failed to parse DLQ batch");
            e
        })?;

        self.persist(&records).await
    }

    /// Persist already-parsed records.
    pub async fn persist(&self, records: &[FailureRecord]) -> Result<PersistReport> {
        check_batch_size(records.len())?;

        if records.is_empty() {
            return Ok(PersistReport {
                records: 0,
                attempts: 0,
            });
        }

        let mut pending: Vec<_> = records.iter().map(failure_to_item).collect();
        let mut delays = self.backoff.clone().build();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let submitted = pending.len();
            pending = self.writer.batch_put(pending).await.map_err(|e| {
                error!(
                    error = %e,
                    attempt = attempts,
                    submitted,
                    "BatchWriteItem rejected"
                );
                e
            })?;

            if pending.is_empty() {
                break;
            }

            let delay = delays.next().unwrap_or_default();
            warn!(
                attempt = attempts,
                submitted,
                unprocessed = pending.len(),
                delay_ms = delay.as_millis() as u64,
                "Unprocessed items returned, retrying"
            );
            tokio::time::sleep(delay).await;
        }

        info!(
            records = records.len(),
            attempts, "Persisted delivery failures"
        );

        Ok(PersistReport {
            records: records.len(),
            attempts,
        })
    }
}

fn check_batch_size(size: usize) -> Result<()> {
    if size > MAX_BATCH_WRITE_ITEMS {
        error!(batch_size = size, "DLQ batch exceeds BatchWriteItem limit");
        return Err(RecorderError::BatchTooLarge(size));
    }
    Ok(())
}
