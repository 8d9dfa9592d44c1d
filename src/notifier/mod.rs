//! Hourly delivery-failure notifier.
//!
//! ## Flow
//! ```text
//! DLQ table (HourTimestamp GSI) --query prev hour--> group by SubscriberApp
//!                                                          |
//!                applications table --scan--> resolve name + support emails
//!                                                          |
//!                           STS AssumeRole(SES_ROLE) --> SES, one email per app
//! ```
//!
//! The run fails if any step fails. Email sends are the exception to
//! fail-fast: all of them are attempted, and the run fails afterwards if
//! any did.

mod directory;
mod dispatch;
mod summary;
mod template;
mod window;

pub use directory::{resolve_applications, DirectoryError};
pub use dispatch::{build_message, send_all, SendOutcome};
pub use summary::{group_by_application, AppFailureSummary, ResolvedAppSummary};
pub use template::{render_html, subject, SUBJECT_MARKER};
pub use window::{failures_in_hour, previous_hour_bucket};

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::config::NotifierConfig;
use crate::credentials::{CredentialsError, RoleAssumer};
use crate::email::EmailSender;
use crate::storage::{ApplicationDirectory, FailureIndex, StorageError};

/// Errors from a notifier run.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("failed to load delivery failures for hour {hour_timestamp}: {source}")]
    Query {
        hour_timestamp: i64,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(
        "failed to send {} of {attempted} notification(s): {}",
        .failed.len(),
        .failed.join(", ")
    )]
    Dispatch {
        attempted: usize,
        failed: Vec<String>,
    },
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReport {
    pub hour_timestamp: i64,
    pub failures: usize,
    /// Applications notified, sorted by short name.
    pub notified: Vec<String>,
}

/// The notifier pipeline with its collaborators.
pub struct Notifier {
    config: Arc<NotifierConfig>,
    failures: Arc<dyn FailureIndex>,
    directory: Arc<dyn ApplicationDirectory>,
    roles: Arc<dyn RoleAssumer>,
    sender: Arc<dyn EmailSender>,
}

impl Notifier {
    pub fn new(
        config: Arc<NotifierConfig>,
        failures: Arc<dyn FailureIndex>,
        directory: Arc<dyn ApplicationDirectory>,
        roles: Arc<dyn RoleAssumer>,
        sender: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            config,
            failures,
            directory,
            roles,
            sender,
        }
    }

    /// Notify every application with failures in the hour before `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<NotificationReport, NotifierError> {
        let hour_timestamp = previous_hour_bucket(now);

        let failures = failures_in_hour(self.failures.as_ref(), hour_timestamp)
            .await
            .map_err(|source| {
                error!(hour_timestamp, error = %source, "Failed to query delivery failures");
                NotifierError::Query {
                    hour_timestamp,
                    source,
                }
            })?;

        if failures.is_empty() {
            info!(hour_timestamp, "No delivery failures in window");
            return Ok(NotificationReport {
                hour_timestamp,
                failures: 0,
                notified: Vec::new(),
            });
        }

        let groups = group_by_application(&failures);
        let short_names: BTreeSet<String> = groups.keys().cloned().collect();
        info!(
            hour_timestamp,
            failures = failures.len(),
            applications = short_names.len(),
            "Grouped delivery failures"
        );

        let details = resolve_applications(self.directory.as_ref(), &short_names).await?;
        let resolved: Vec<ResolvedAppSummary> = groups
            .into_iter()
            .filter_map(|(short_name, summary)| {
                details
                    .get(&short_name)
                    .map(|detail| ResolvedAppSummary::new(summary, detail))
            })
            .collect();

        let credentials = self
            .roles
            .assume_role(&self.config.ses_role_arn)
            .await
            .map_err(|e| {
                error!(role_arn = %self.config.ses_role_arn, error = %e, "Failed to assume SES role");
                e
            })?;

        let outcomes = send_all(&self.config, self.sender.as_ref(), &credentials, &resolved).await;
        let attempted = outcomes.len();
        let (sent, failed): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition(|o| o.result.is_ok());

        if !failed.is_empty() {
            let failed: Vec<String> = failed.into_iter().map(|o| o.application).collect();
            error!(
                hour_timestamp,
                attempted,
                failed = ?failed,
                "Some delivery failure notifications were not sent"
            );
            return Err(NotifierError::Dispatch { attempted, failed });
        }

        info!(hour_timestamp, notified = sent.len(), "Notifications sent");
        Ok(NotificationReport {
            hour_timestamp,
            failures: failures.len(),
            notified: sent.into_iter().map(|o| o.application).collect(),
        })
    }
}
