//! Recorder pipeline tests.

use aws_lambda_events::sqs::SqsMessage;
use aws_sdk_dynamodb::types::AttributeValue;

use integration_hub_dlq::recorder::RecorderError;
use integration_hub_dlq::storage::schema::{HOUR_TIMESTAMP, PARTITION_KEY, SORT_KEY, TTL};
use integration_hub_dlq::test_utils::{dlq_message, dlq_message_json};

use crate::common::*;

fn batch(count: i64) -> Vec<SqsMessage> {
    (0..count)
        .map(|i| dlq_message("App1.orders.Created.x1", "App1.Api-PRD", IN_WINDOW_MS + i))
        .collect()
}

#[tokio::test]
async fn test_batch_is_stored_with_keys_and_bucket() {
    let harness = Harness::new();

    let report = harness.recorder().record(&batch(1)).await.unwrap();
    assert_eq!(report.records, 1);
    assert_eq!(report.attempts, 1);

    let stored = harness.store.stored().await;
    assert_eq!(stored.len(), 1);
    let item = &stored[0];
    assert_eq!(
        item.get(PARTITION_KEY),
        Some(&AttributeValue::S(
            "ERR#App1.orders.Created.x1#App1.Api-PRD".to_string()
        ))
    );
    assert_eq!(
        item.get(SORT_KEY),
        Some(&AttributeValue::S("#2024-05-01T10:15:30.123Z".to_string()))
    );
    assert_eq!(
        item.get(HOUR_TIMESTAMP),
        Some(&AttributeValue::N(WINDOW_HOUR.to_string()))
    );
    // SentTimestamp seconds + 60 days.
    assert_eq!(
        item.get(TTL),
        Some(&AttributeValue::N((1_714_558_530 + 5_184_000).to_string()))
    );
}

#[tokio::test]
async fn test_redelivered_batch_does_not_duplicate() {
    let harness = Harness::new();
    let messages = batch(5);

    harness.recorder().record(&messages).await.unwrap();
    harness.recorder().record(&messages).await.unwrap();

    assert_eq!(harness.store.stored_count().await, 5);
}

#[tokio::test]
async fn test_throttled_batch_is_fully_persisted() {
    let harness = Harness::new();
    harness.store.script_unprocessed([10, 4, 1]).await;

    let report = harness.recorder().record(&batch(25)).await.unwrap();

    assert_eq!(report.records, 25);
    assert_eq!(report.attempts, 4);
    assert_eq!(harness.store.stored_count().await, 25);
}

#[tokio::test]
async fn test_oversized_batch_is_rejected_without_writes() {
    let harness = Harness::new();

    let err = harness.recorder().record(&batch(26)).await.unwrap_err();

    assert!(matches!(err, RecorderError::BatchTooLarge(26)));
    assert_eq!(harness.store.put_calls(), 0);
}

#[tokio::test]
async fn test_message_without_rule_arn_fails_whole_batch() {
    let harness = Harness::new();
    let mut broken = dlq_message_json("App1.orders.Created.x1", "App1.Api-PRD", IN_WINDOW_MS);
    broken["messageAttributes"]
        .as_object_mut()
        .unwrap()
        .remove("RULE_ARN");
    let mut messages = batch(2);
    messages.push(serde_json::from_value(broken).unwrap());

    let err = harness.recorder().record(&messages).await.unwrap_err();

    assert!(matches!(err, RecorderError::Parse(_)));
    assert_eq!(harness.store.stored_count().await, 0);
}
