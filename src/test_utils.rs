//! Test fixtures.
//!
//! Builders for realistic EventBridge dead-letter SQS messages, shared by
//! unit tests and the pipeline tests under `tests/`.

use aws_lambda_events::sqs::SqsMessage;
use serde_json::{json, Value};

use crate::dlq::FailureRecord;

/// Account and region used in fixture ARNs.
pub const FIXTURE_ACCOUNT: &str = "144028967590";
pub const FIXTURE_REGION: &str = "ap-southeast-2";

/// Rule ARN on the custom event bus for `rule_name`.
pub fn rule_arn(rule_name: &str) -> String {
    format!(
        "arn:aws:events:{}:{}:rule/EAI-EventBus-PRD/{}",
        FIXTURE_REGION, FIXTURE_ACCOUNT, rule_name
    )
}

/// API destination target ARN for `target_name`.
pub fn target_arn(target_name: &str) -> String {
    format!(
        "arn:aws:events:{}:{}:api-destination/{}/0c1d2e3f",
        FIXTURE_REGION, FIXTURE_ACCOUNT, target_name
    )
}

fn string_attr(value: &str) -> Value {
    json!({
        "stringValue": value,
        "stringListValues": [],
        "binaryListValues": [],
        "dataType": "String"
    })
}

/// JSON of a dead-letter SQS message as Lambda receives it.
pub fn dlq_message_json(rule_name: &str, target_name: &str, sent_ms: i64) -> Value {
    let body = json!({
        "version": "0",
        "id": format!("evt-{sent_ms}"),
        "detail-type": "OrderChanged",
        "source": "fixture.orders",
        "time": "2024-05-01T10:00:00Z",
        "detail": {}
    });

    json!({
        "messageId": format!("msg-{sent_ms}"),
        "receiptHandle": "AQEB",
        "body": body.to_string(),
        "attributes": {
            "ApproximateReceiveCount": "1",
            "SentTimestamp": sent_ms.to_string(),
            "SenderId": "AIDAFIXTURE",
            "ApproximateFirstReceiveTimestamp": (sent_ms + 50).to_string()
        },
        "messageAttributes": {
            "RULE_ARN": string_attr(&rule_arn(rule_name)),
            "TARGET_ARN": string_attr(&target_arn(target_name)),
            "ERROR_CODE": string_attr("SDK_CLIENT_ERROR"),
            "ERROR_MESSAGE": string_attr("Connection timed out"),
            "RETRY_ATTEMPTS": string_attr("185")
        },
        "eventSource": "aws:sqs",
        "eventSourceARN": format!(
            "arn:aws:sqs:{}:{}:EAI-EventBus-DLQ",
            FIXTURE_REGION, FIXTURE_ACCOUNT
        ),
        "awsRegion": FIXTURE_REGION
    })
}

/// A dead-letter SQS message.
pub fn dlq_message(rule_name: &str, target_name: &str, sent_ms: i64) -> SqsMessage {
    serde_json::from_value(dlq_message_json(rule_name, target_name, sent_ms))
        .expect("fixture message deserializes")
}

/// A parsed failure record for `rule_name`, sent at `sent_ms`.
pub fn failure_record(rule_name: &str, sent_ms: i64) -> FailureRecord {
    FailureRecord::from_sqs_message(&dlq_message(rule_name, "Fixture.Api-PRD", sent_ms))
        .expect("fixture message parses")
}
