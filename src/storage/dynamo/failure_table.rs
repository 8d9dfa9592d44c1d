//! DynamoDB DLQ table.

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use crate::storage::schema::HOUR_TIMESTAMP;
use crate::storage::{FailureIndex, FailureWriter, Item, Page, Result, StorageError};

/// DLQ table, written by the recorder and queried by the notifier.
pub struct DynamoFailureTable {
    client: Client,
    table_name: String,
    hour_index: Option<String>,
}

impl DynamoFailureTable {
    /// Create a handle for writing to `table_name`.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        info!(table = %table_name, "Using DynamoDB DLQ table");
        Self {
            client,
            table_name,
            hour_index: None,
        }
    }

    /// Enable hour-bucket queries through the named GSI.
    pub fn with_hour_index(mut self, index_name: impl Into<String>) -> Self {
        self.hour_index = Some(index_name.into());
        self
    }
}

#[async_trait]
impl FailureWriter for DynamoFailureTable {
    async fn batch_put(&self, items: Vec<Item>) -> Result<Vec<Item>> {
        let requests = items
            .into_iter()
            .map(|item| {
                let put = PutRequest::builder()
                    .set_item(Some(item))
                    .build()
                    .map_err(|e| StorageError::Request(e.to_string()))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>>>()?;
        let submitted = requests.len();

        let output = self
            .client
            .batch_write_item()
            .request_items(&self.table_name, requests)
            .send()
            .await
            .map_err(|e| StorageError::Dynamo {
                operation: "BatchWriteItem",
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let unprocessed: Vec<Item> = output
            .unprocessed_items()
            .and_then(|tables| tables.get(&self.table_name))
            .map(|requests| {
                requests
                    .iter()
                    .filter_map(|r| r.put_request())
                    .map(|put| put.item().clone())
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            table = %self.table_name,
            submitted,
            unprocessed = unprocessed.len(),
            "BatchWriteItem completed"
        );

        Ok(unprocessed)
    }
}

#[async_trait]
impl FailureIndex for DynamoFailureTable {
    async fn query_hour_page(
        &self,
        hour_timestamp: i64,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page> {
        let index_name = self.hour_index.as_deref().ok_or_else(|| {
            StorageError::Request(format!(
                "no {} index configured for table {}",
                HOUR_TIMESTAMP, self.table_name
            ))
        })?;

        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(index_name)
            .key_condition_expression("#hour = :hour")
            .expression_attribute_names("#hour", HOUR_TIMESTAMP)
            .expression_attribute_values(":hour", AttributeValue::N(hour_timestamp.to_string()))
            .set_exclusive_start_key(exclusive_start_key)
            .send()
            .await
            .map_err(|e| StorageError::Dynamo {
                operation: "Query",
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(
            table = %self.table_name,
            index = %index_name,
            hour_timestamp,
            count = output.count(),
            "Queried DLQ hour bucket"
        );

        Ok(Page {
            items: output.items().to_vec(),
            last_evaluated_key: output
                .last_evaluated_key()
                .filter(|key| !key.is_empty())
                .cloned(),
        })
    }
}
