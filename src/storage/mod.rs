//! Storage abstractions for the DLQ and applications tables.
//!
//! Both tables are DynamoDB tables. Implementations exchange raw DynamoDB
//! items so that shape validation ([`schema`]) happens in one place,
//! regardless of which backend produced the item.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

pub mod dynamo;
pub mod mock;
pub mod schema;

pub use dynamo::{DynamoApplicationTable, DynamoFailureTable};
pub use mock::{MockApplicationDirectory, MockFailureStore};
pub use schema::{ApplicationDetail, StoredFailure};

/// A raw DynamoDB item.
pub type Item = HashMap<String, AttributeValue>;

/// DynamoDB's per-request limit for `BatchWriteItem`.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("DynamoDB {operation} failed: {message}")]
    Dynamo {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid {kind} record: missing or malformed attribute {attribute}")]
    InvalidRecord {
        kind: &'static str,
        attribute: &'static str,
    },

    #[error("Failed to build DynamoDB request: {0}")]
    Request(String),

    #[error("Injected failure: {0}")]
    Injected(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// One page of a paginated read.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Item>,
    /// Continuation cursor. `None` when this was the last page.
    pub last_evaluated_key: Option<Item>,
}

/// Write side of the DLQ table.
#[async_trait]
pub trait FailureWriter: Send + Sync {
    /// Write up to [`MAX_BATCH_WRITE_ITEMS`] items in one request.
    ///
    /// Returns the items the store left unprocessed (throttling); the
    /// caller decides whether to resubmit them.
    async fn batch_put(&self, items: Vec<Item>) -> Result<Vec<Item>>;
}

/// Read side of the DLQ table's `HourTimestamp` index.
#[async_trait]
pub trait FailureIndex: Send + Sync {
    /// Fetch one page of items whose `HourTimestamp` equals `hour_timestamp`.
    async fn query_hour_page(
        &self,
        hour_timestamp: i64,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page>;
}

/// The applications directory table.
#[async_trait]
pub trait ApplicationDirectory: Send + Sync {
    /// Fetch one page of a full table scan.
    async fn scan_page(&self, exclusive_start_key: Option<Item>) -> Result<Page>;
}
