//! Notifier pipeline tests, fed by the recorder.

use aws_lambda_events::sqs::SqsMessage;

use integration_hub_dlq::notifier::{DirectoryError, NotifierError};
use integration_hub_dlq::test_utils::dlq_message;

use crate::common::*;

async fn record(harness: &Harness, failures: &[(&str, i64)]) {
    let messages: Vec<SqsMessage> = failures
        .iter()
        .map(|(rule, sent_ms)| dlq_message(rule, "Target.Api-PRD", *sent_ms))
        .collect();
    for chunk in messages.chunks(25) {
        harness.recorder().record(chunk).await.unwrap();
    }
}

async fn register_apps(harness: &Harness) {
    harness
        .directory
        .add_application("App1", "Maintenance System", &["maint@example.com"])
        .await;
    harness
        .directory
        .add_application(
            "App2",
            "Billing",
            &["billing@example.com", "billing-oncall@example.com"],
        )
        .await;
}

#[tokio::test]
async fn test_one_email_per_application() {
    let harness = Harness::new();
    register_apps(&harness).await;
    record(
        &harness,
        &[
            ("App1.orders.Created.x1", IN_WINDOW_MS),
            ("App1.orders.Created.x1", IN_WINDOW_MS + 1),
            ("App1.orders.Updated.x2", IN_WINDOW_MS + 2),
            ("App2.invoices.Paid.x9", IN_WINDOW_MS + 3),
            // Previous bucket, not reported.
            ("App2.invoices.Paid.x9", BEFORE_WINDOW_MS),
        ],
    )
    .await;

    let report = harness.notifier().run(run_at()).await.unwrap();

    assert_eq!(report.hour_timestamp, WINDOW_HOUR);
    assert_eq!(report.failures, 4);
    assert_eq!(report.notified, vec!["App1", "App2"]);
    assert_eq!(harness.roles.assumed_roles().await, vec![SES_ROLE]);

    let mut sent = harness.sender.sent().await;
    sent.sort_by(|a, b| a.subject.cmp(&b.subject));
    assert_eq!(sent.len(), 2);

    let billing = &sent[0];
    assert_eq!(
        billing.subject,
        "Alert! Billing - Event delivery failure(s) - Integration Hub"
    );
    assert_eq!(
        billing.to,
        vec!["billing@example.com", "billing-oncall@example.com"]
    );
    assert_eq!(billing.bcc, vec![TEAM_EMAIL]);
    assert!(billing.html_body.contains("<strong>1</strong>"));
    assert!(billing.html_body.contains("App2.invoices.Paid.x9"));

    let maintenance = &sent[1];
    assert_eq!(maintenance.to, vec!["maint@example.com"]);
    assert!(maintenance.html_body.contains("<strong>3</strong>"));
    assert!(maintenance
        .html_body
        .contains("App1.orders.Created.x1, App1.orders.Updated.x2"));
}

#[tokio::test]
async fn test_quiet_hour_sends_nothing() {
    let harness = Harness::new();
    register_apps(&harness).await;
    record(&harness, &[("App1.orders.Created.x1", BEFORE_WINDOW_MS)]).await;

    let report = harness.notifier().run(run_at()).await.unwrap();

    assert_eq!(report.failures, 0);
    assert!(report.notified.is_empty());
    assert_eq!(harness.directory.scan_calls(), 0);
    assert!(harness.roles.assumed_roles().await.is_empty());
    assert_eq!(harness.sender.attempts().await, 0);
}

#[tokio::test]
async fn test_every_page_of_the_window_is_counted() {
    let harness = Harness::new();
    register_apps(&harness).await;
    harness.store.set_page_size(7);
    let failures: Vec<(&str, i64)> = (0..30)
        .map(|i| ("App1.orders.Created.x1", IN_WINDOW_MS + i))
        .collect();
    record(&harness, &failures).await;

    let report = harness.notifier().run(run_at()).await.unwrap();

    assert_eq!(report.failures, 30);
    assert_eq!(harness.store.query_calls(), 5);
    let sent = harness.sender.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html_body.contains("<strong>30</strong>"));
}

#[tokio::test]
async fn test_unknown_application_aborts_before_sending() {
    let harness = Harness::new();
    register_apps(&harness).await;
    record(
        &harness,
        &[
            ("App1.orders.Created.x1", IN_WINDOW_MS),
            ("Ghost.orders.Created.x1", IN_WINDOW_MS + 1),
        ],
    )
    .await;

    let err = harness.notifier().run(run_at()).await.unwrap_err();

    assert!(matches!(
        err,
        NotifierError::Directory(DirectoryError::NoMatchingDetails(ref app)) if app == "Ghost"
    ));
    assert!(harness.roles.assumed_roles().await.is_empty());
    assert_eq!(harness.sender.attempts().await, 0);
}

#[tokio::test]
async fn test_role_failure_sends_nothing() {
    let harness = Harness::new();
    register_apps(&harness).await;
    harness.roles.set_fail(true).await;
    record(&harness, &[("App1.orders.Created.x1", IN_WINDOW_MS)]).await;

    let err = harness.notifier().run(run_at()).await.unwrap_err();

    assert!(matches!(err, NotifierError::Credentials(_)));
    assert_eq!(harness.sender.attempts().await, 0);
}

#[tokio::test]
async fn test_failed_send_does_not_block_others() {
    let harness = Harness::new();
    register_apps(&harness).await;
    harness.sender.fail_for("maint@example.com").await;
    record(
        &harness,
        &[
            ("App1.orders.Created.x1", IN_WINDOW_MS),
            ("App2.invoices.Paid.x9", IN_WINDOW_MS + 1),
        ],
    )
    .await;

    let err = harness.notifier().run(run_at()).await.unwrap_err();

    match err {
        NotifierError::Dispatch { attempted, failed } => {
            assert_eq!(attempted, 2);
            assert_eq!(failed, vec!["App1"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(harness.sender.attempts().await, 2);
    let sent = harness.sender.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to[0], "billing@example.com");
}

#[tokio::test]
async fn test_applications_are_emailed_concurrently() {
    let harness = Harness::new();
    register_apps(&harness).await;
    harness.sender.hold_until(2).await;
    record(
        &harness,
        &[
            ("App1.orders.Created.x1", IN_WINDOW_MS),
            ("App2.invoices.Paid.x9", IN_WINDOW_MS + 1),
        ],
    )
    .await;

    let report = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        harness.notifier().run(run_at()),
    )
    .await
    .expect("both sends must be in flight together")
    .unwrap();

    assert_eq!(report.notified, vec!["App1", "App2"]);
    assert_eq!(harness.sender.sent().await.len(), 2);
}
