//! Shared utilities for integration tests.
//!
//! Wires both pipelines to one in-memory DLQ table, so that what the
//! recorder writes is what the notifier reads.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use integration_hub_dlq::config::NotifierConfig;
use integration_hub_dlq::credentials::MockRoleAssumer;
use integration_hub_dlq::email::MockEmailSender;
use integration_hub_dlq::notifier::Notifier;
use integration_hub_dlq::recorder::Recorder;
use integration_hub_dlq::storage::{MockApplicationDirectory, MockFailureStore};
use integration_hub_dlq::utils::retry::immediate_backoff;

/// 2024-05-01T10:15:30.123Z
pub const IN_WINDOW_MS: i64 = 1_714_558_530_123;
/// 2024-05-01T09:59:59.000Z, one bucket too early.
pub const BEFORE_WINDOW_MS: i64 = 1_714_557_599_000;
/// 2024-05-01T10:00:00Z
pub const WINDOW_HOUR: i64 = 1_714_557_600;

pub const SES_ROLE: &str = "arn:aws:iam::111111111111:role/ses-sender";
pub const TEAM_EMAIL: &str = "integration-team@example.com";

/// Invocation time whose previous hour is [`WINDOW_HOUR`].
pub fn run_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 11, 6, 0).unwrap()
}

pub fn notifier_config() -> NotifierConfig {
    let vars: HashMap<String, String> = [
        ("BROKER", "PRD"),
        ("DDB_APPLICATIONS_TABLE_NAME", "Applications"),
        ("DDB_DLQ_TABLE_NAME", "EventDLQ"),
        ("DDB_DLQ_INDEX_NAME", "HourTimestampIndex"),
        ("NODE_ENV", "test"),
        ("SES_ROLE", SES_ROLE),
        ("SENDER_EMAIL", "integration-hub@example.com"),
        ("INTEGRATION_TEAM_EMAILS", TEAM_EMAIL),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    NotifierConfig::from_map(vars).unwrap()
}

/// Both pipelines over shared mocks.
pub struct Harness {
    pub store: Arc<MockFailureStore>,
    pub directory: Arc<MockApplicationDirectory>,
    pub roles: Arc<MockRoleAssumer>,
    pub sender: Arc<MockEmailSender>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MockFailureStore::new()),
            directory: Arc::new(MockApplicationDirectory::new()),
            roles: Arc::new(MockRoleAssumer::new()),
            sender: Arc::new(MockEmailSender::new()),
        }
    }

    pub fn recorder(&self) -> Recorder {
        Recorder::new(self.store.clone()).with_backoff(immediate_backoff())
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(
            Arc::new(notifier_config()),
            self.store.clone(),
            self.directory.clone(),
            self.roles.clone(),
            self.sender.clone(),
        )
    }
}
