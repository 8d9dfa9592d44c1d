//! dlq-notification: Failure notifier Lambda
//!
//! Runs hourly. Emails each subscriber application a summary of the
//! delivery failures recorded in the previous hour.
//!
//! ## Architecture
//! ```text
//! [schedule] --> [dlq-notification] --query--> DLQ table (hour index)
//!                        |          --scan---> applications table
//!                        v
//!             STS AssumeRole(SES_ROLE) --> SES
//! ```
//!
//! ## Configuration
//! - BROKER, NODE_ENV
//! - DDB_DLQ_TABLE_NAME, DDB_DLQ_INDEX_NAME, DDB_APPLICATIONS_TABLE_NAME
//! - SES_ROLE, SENDER_EMAIL, INTEGRATION_TEAM_EMAILS (`;`-separated)
//! - ASSUME_PROD_ROLE_ARN: required on non-production brokers, whose
//!   applications directory is read from the production account
//! - HUB_LOG: tracing filter (default: info)

use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error as LambdaError};
use tracing::info;

use integration_hub_dlq::config::{ConfigError, NotifierConfig, ASSUME_PROD_ROLE_ENV_VAR};
use integration_hub_dlq::credentials::StsRoleAssumer;
use integration_hub_dlq::email::SesEmailSender;
use integration_hub_dlq::handlers::ScheduleHandler;
use integration_hub_dlq::notifier::Notifier;
use integration_hub_dlq::storage::{dynamo, DynamoApplicationTable, DynamoFailureTable};
use integration_hub_dlq::utils::bootstrap::{init_tracing, load_aws_config};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let config = NotifierConfig::from_env()?;
    let sdk_config = load_aws_config().await;

    let failures = DynamoFailureTable::new(dynamo::client(&sdk_config), &config.dlq_table)
        .with_hour_index(&config.dlq_index);

    let applications_client = if config.is_production_broker() {
        dynamo::client(&sdk_config)
    } else {
        let role_arn = config
            .assume_prod_role_arn
            .as_deref()
            .ok_or(ConfigError::Missing(ASSUME_PROD_ROLE_ENV_VAR))?;
        dynamo::assumed_role_client(&sdk_config, role_arn).await
    };
    let applications = DynamoApplicationTable::new(applications_client, &config.applications_table);

    let roles = StsRoleAssumer::new(aws_sdk_sts::Client::new(&sdk_config));
    let sender = SesEmailSender::new(sdk_config.clone());

    info!(
        broker = %config.broker,
        environment = %config.environment,
        dlq_table = %config.dlq_table,
        applications_table = %config.applications_table,
        "dlq-notification started"
    );

    let notifier = Notifier::new(
        Arc::new(config),
        Arc::new(failures),
        Arc::new(applications),
        Arc::new(roles),
        Arc::new(sender),
    );
    let handler = ScheduleHandler::new(Arc::new(notifier));

    let handler = &handler;
    run(service_fn(move |event| async move { handler.handle(event).await })).await
}
