//! DynamoDB applications directory.

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::Client;
use tracing::debug;

use crate::storage::{ApplicationDirectory, Item, Page, Result, StorageError};

/// Applications table, scanned by the notifier.
pub struct DynamoApplicationTable {
    client: Client,
    table_name: String,
}

impl DynamoApplicationTable {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl ApplicationDirectory for DynamoApplicationTable {
    async fn scan_page(&self, exclusive_start_key: Option<Item>) -> Result<Page> {
        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .set_exclusive_start_key(exclusive_start_key)
            .send()
            .await
            .map_err(|e| StorageError::Dynamo {
                operation: "Scan",
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(
            table = %self.table_name,
            count = output.count(),
            "Scanned applications page"
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
