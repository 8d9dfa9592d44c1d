//! SQS-triggered handler for the failure recorder.

use std::sync::Arc;

use aws_lambda_events::sqs::SqsEvent;
use lambda_runtime::{Error as LambdaError, LambdaEvent};
use tracing::{error, info};

use crate::recorder::{PersistReport, Recorder};

/// Handles one dead-letter SQS batch per invocation.
///
/// A returned error fails the invocation, so SQS redelivers the whole batch.
/// Rewrites are idempotent because records are keyed by rule, target and
/// send time.
pub struct DlqBatchHandler {
    recorder: Arc<Recorder>,
}

impl DlqBatchHandler {
    pub fn new(recorder: Arc<Recorder>) -> Self {
        Self { recorder }
    }

    pub async fn handle(&self, event: LambdaEvent<SqsEvent>) -> Result<PersistReport, LambdaError> {
        let (payload, context) = event.into_parts();
        let batch_size = payload.records.len();
        info!(request_id = %context.request_id, batch_size, "Received DLQ batch");

        match self.recorder.record(&payload.records).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(request_id = %context.request_id, error = %e, "Failed to record DLQ batch");
                Err(e.into())
            }
        }
    }
}
