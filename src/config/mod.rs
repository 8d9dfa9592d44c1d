//! Lambda configuration.
//!
//! Both functions read their settings from environment variables once at
//! cold start, validate them eagerly, and pass the resulting value into
//! every component. Missing or empty values are fatal.

use std::collections::HashMap;

use ::config::{Config as ConfigLib, Environment};
use serde::Deserialize;

/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "HUB_LOG";

/// Environment variable holding the broker deployment label.
pub const BROKER_ENV_VAR: &str = "BROKER";
/// Environment variable holding the applications table name.
pub const APPLICATIONS_TABLE_ENV_VAR: &str = "DDB_APPLICATIONS_TABLE_NAME";
/// Environment variable holding the DLQ table name.
pub const DLQ_TABLE_ENV_VAR: &str = "DDB_DLQ_TABLE_NAME";
/// Environment variable holding the DLQ `HourTimestamp` index name.
pub const DLQ_INDEX_ENV_VAR: &str = "DDB_DLQ_INDEX_NAME";
/// Environment variable holding the deployment environment name.
pub const ENVIRONMENT_ENV_VAR: &str = "NODE_ENV";
/// Environment variable holding the role assumed for SES.
pub const SES_ROLE_ENV_VAR: &str = "SES_ROLE";
/// Environment variable holding the role used to read production tables.
pub const ASSUME_PROD_ROLE_ENV_VAR: &str = "ASSUME_PROD_ROLE_ARN";
/// Environment variable holding the notification sender address.
pub const SENDER_EMAIL_ENV_VAR: &str = "SENDER_EMAIL";
/// Environment variable holding the integration team BCC list.
pub const INTEGRATION_TEAM_EMAILS_ENV_VAR: &str = "INTEGRATION_TEAM_EMAILS";

/// Broker labels that identify the production deployment.
const PRODUCTION_BROKERS: [&str; 3] = ["prd", "prod", "production"];

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Raw environment view. Keys are lowercased by the `config` crate.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEnv {
    broker: Option<String>,
    ddb_applications_table_name: Option<String>,
    ddb_dlq_table_name: Option<String>,
    ddb_dlq_index_name: Option<String>,
    node_env: Option<String>,
    ses_role: Option<String>,
    assume_prod_role_arn: Option<String>,
    sender_email: Option<String>,
    integration_team_emails: Option<String>,
}

impl RawEnv {
    /// Load from the process environment, or from `source` when given.
    fn load(source: Option<HashMap<String, String>>) -> Result<Self> {
        let raw = ConfigLib::builder()
            .add_source(Environment::default().source(source))
            .build()?
            .try_deserialize()?;
        Ok(raw)
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    optional(value).ok_or(ConfigError::Missing(name))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a `"; "` delimited address list.
pub fn parse_address_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration for the failure recorder.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// DLQ table the failures are written to.
    pub dlq_table: String,
}

impl RecorderConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_raw(RawEnv::load(None)?)
    }

    /// Load from an explicit variable map.
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_raw(RawEnv::load(Some(vars))?)
    }

    fn from_raw(raw: RawEnv) -> Result<Self> {
        Ok(Self {
            dlq_table: required(raw.ddb_dlq_table_name, DLQ_TABLE_ENV_VAR)?,
        })
    }
}

/// Configuration for the hourly failure notifier.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Broker deployment label, e.g. `PRD` or `NPD`.
    pub broker: String,
    pub applications_table: String,
    pub dlq_table: String,
    pub dlq_index: String,
    /// Deployment environment name.
    pub environment: String,
    /// Role assumed before sending email.
    pub ses_role_arn: String,
    /// Role assumed to read the production applications table.
    /// Always set for non-production brokers.
    pub assume_prod_role_arn: Option<String>,
    pub sender_email: String,
    /// Addresses blind-copied on every notification.
    pub integration_team_emails: Vec<String>,
}

impl NotifierConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_raw(RawEnv::load(None)?)
    }

    /// Load from an explicit variable map.
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_raw(RawEnv::load(Some(vars))?)
    }

    fn from_raw(raw: RawEnv) -> Result<Self> {
        let broker = required(raw.broker, BROKER_ENV_VAR)?;
        let assume_prod_role_arn = optional(raw.assume_prod_role_arn);
        if !is_production_broker(&broker) && assume_prod_role_arn.is_none() {
            return Err(ConfigError::Missing(ASSUME_PROD_ROLE_ENV_VAR));
        }

        let integration_team_emails = parse_address_list(&required(
            raw.integration_team_emails,
            INTEGRATION_TEAM_EMAILS_ENV_VAR,
        )?);
        if integration_team_emails.is_empty() {
            return Err(ConfigError::Missing(INTEGRATION_TEAM_EMAILS_ENV_VAR));
        }

        Ok(Self {
            broker,
            applications_table: required(
                raw.ddb_applications_table_name,
                APPLICATIONS_TABLE_ENV_VAR,
            )?,
            dlq_table: required(raw.ddb_dlq_table_name, DLQ_TABLE_ENV_VAR)?,
            dlq_index: required(raw.ddb_dlq_index_name, DLQ_INDEX_ENV_VAR)?,
            environment: required(raw.node_env, ENVIRONMENT_ENV_VAR)?,
            ses_role_arn: required(raw.ses_role, SES_ROLE_ENV_VAR)?,
            assume_prod_role_arn,
            sender_email: required(raw.sender_email, SENDER_EMAIL_ENV_VAR)?,
            integration_team_emails,
        })
    }

    /// Whether this is the production broker deployment.
    pub fn is_production_broker(&self) -> bool {
        is_production_broker(&self.broker)
    }
}

fn is_production_broker(broker: &str) -> bool {
    PRODUCTION_BROKERS
        .iter()
        .any(|label| broker.eq_ignore_ascii_case(label))
}
