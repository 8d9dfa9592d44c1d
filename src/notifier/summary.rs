//! Per-application failure summaries.

use std::collections::{BTreeMap, BTreeSet};

use crate::storage::{ApplicationDetail, StoredFailure};

/// Failures for one application within the window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppFailureSummary {
    pub short_name: String,
    /// Distinct subscriptions that failed.
    pub subscriptions: BTreeSet<String>,
    /// Every failure counts, including repeats of one subscription.
    pub failed_events_count: usize,
}

/// A summary joined with its application's directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAppSummary {
    pub summary: AppFailureSummary,
    pub display_name: String,
    pub support_emails: Vec<String>,
}

impl ResolvedAppSummary {
    pub fn new(summary: AppFailureSummary, detail: &ApplicationDetail) -> Self {
        Self {
            summary,
            display_name: detail.name.clone(),
            support_emails: detail.support_emails.clone(),
        }
    }
}

/// Group failures by `SubscriberApp`.
pub fn group_by_application(failures: &[StoredFailure]) -> BTreeMap<String, AppFailureSummary> {
    failures
        .iter()
        .fold(BTreeMap::new(), |mut groups, failure| {
            let entry = groups
                .entry(failure.subscriber_app.clone())
                .or_insert_with(|| AppFailureSummary {
                    short_name: failure.subscriber_app.clone(),
                    ..Default::default()
                });
            entry.subscriptions.insert(failure.subscription_id.clone());
            entry.failed_events_count += 1;
            groups
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(app: &str, subscription: &str, sort_key: &str) -> StoredFailure {
        StoredFailure {
            partition_key: format!("ERR#{subscription}#Target"),
            sort_key: sort_key.to_string(),
            subscriber_app: app.to_string(),
            subscription_id: subscription.to_string(),
        }
    }

    #[test]
    fn test_group_counts_every_failure_and_dedups_subscriptions() {
        let failures = vec![
            failure("App1", "SubX", "#1"),
            failure("App1", "SubX", "#2"),
            failure("App1", "SubY", "#3"),
        ];

        let groups = group_by_application(&failures);

        assert_eq!(groups.len(), 1);
        let app1 = &groups["App1"];
        assert_eq!(app1.short_name, "App1");
        assert_eq!(app1.failed_events_count, 3);
        assert_eq!(
            app1.subscriptions,
            BTreeSet::from(["SubX".to_string(), "SubY".to_string()])
        );
    }

    #[test]
    fn test_group_separates_applications() {
        let failures = vec![
            failure("App1", "App1.a", "#1"),
            failure("App2", "App2.b", "#2"),
            failure("App1", "App1.a", "#3"),
        ];

        let groups = group_by_application(&failures);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["App1"].failed_events_count, 2);
        assert_eq!(groups["App2"].failed_events_count, 1);
        assert_eq!(groups["App2"].subscriptions.len(), 1);
    }

    #[test]
    fn test_group_is_deterministic() {
        let failures = vec![failure("B", "B.1", "#1"), failure("A", "A.1", "#2")];
        assert_eq!(
            group_by_application(&failures),
            group_by_application(&failures)
        );
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert!(group_by_application(&[]).is_empty());
    }
}
