//! event-dlq: Failure recorder Lambda
//!
//! Persists EventBridge dead-letter messages into the DLQ table.
//!
//! ## Architecture
//! ```text
//! [EventBridge target] --(DLQ)--> [SQS] --(batch <= 25)--> [event-dlq]
//!                                                               |
//!                                                               v
//!                                                  DynamoDB BatchWriteItem
//! ```
//!
//! ## Configuration
//! - DDB_DLQ_TABLE_NAME: DLQ table (required)
//! - HUB_LOG: tracing filter (default: info)

use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error as LambdaError};
use tracing::info;

use integration_hub_dlq::config::RecorderConfig;
use integration_hub_dlq::handlers::DlqBatchHandler;
use integration_hub_dlq::recorder::Recorder;
use integration_hub_dlq::storage::{dynamo, DynamoFailureTable};
use integration_hub_dlq::utils::bootstrap::{init_tracing, load_aws_config};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let config = RecorderConfig::from_env()?;
    let sdk_config = load_aws_config().await;

    let table = DynamoFailureTable::new(dynamo::client(&sdk_config), &config.dlq_table);
    let handler = DlqBatchHandler::new(Arc::new(Recorder::new(Arc::new(table))));

    info!(table = %config.dlq_table, "event-dlq started");

    let handler = &handler;
    run(service_fn(move |event| async move { handler.handle(event).await })).await
}
