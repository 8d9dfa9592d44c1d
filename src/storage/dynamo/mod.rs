//! DynamoDB storage implementations.

mod application_table;
mod failure_table;

pub use application_table::DynamoApplicationTable;
pub use failure_table::DynamoFailureTable;

use aws_config::sts::AssumeRoleProvider;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client;

use crate::credentials::SESSION_NAME;

/// Build a DynamoDB client with the function's own credentials.
pub fn client(sdk_config: &SdkConfig) -> Client {
    Client::new(sdk_config)
}

/// Build a DynamoDB client that acts as `role_arn`.
///
/// Credentials are refreshed by the provider before they expire, so the
/// client can be kept for the lifetime of a warm execution environment.
pub async fn assumed_role_client(sdk_config: &SdkConfig, role_arn: &str) -> Client {
    let provider = AssumeRoleProvider::builder(role_arn)
        .session_name(SESSION_NAME)
        .configure(sdk_config)
        .build()
        .await;

    let dynamo_config = aws_sdk_dynamodb::config::Builder::from(sdk_config)
        .credentials_provider(provider)
        .build();
    Client::from_conf(dynamo_config)
}
