//! Failure records parsed from EventBridge dead-letter notifications.

use std::collections::BTreeMap;

use aws_lambda_events::sqs::SqsMessage;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use super::arn;

/// Message attribute carrying the rule ARN.
pub const RULE_ARN_ATTR: &str = "RULE_ARN";
/// Message attribute carrying the target ARN.
pub const TARGET_ARN_ATTR: &str = "TARGET_ARN";
/// Message attribute carrying the upstream error code.
pub const ERROR_CODE_ATTR: &str = "ERROR_CODE";
/// Message attribute carrying the upstream error message.
pub const ERROR_MESSAGE_ATTR: &str = "ERROR_MESSAGE";
/// Message attribute carrying the number of delivery attempts.
pub const RETRY_ATTEMPTS_ATTR: &str = "RETRY_ATTEMPTS";
/// Delivery attribute carrying the send time in epoch milliseconds.
pub const SENT_TIMESTAMP_ATTR: &str = "SentTimestamp";

/// Seconds per hour bucket.
pub const HOUR_SECS: i64 = 3_600;
/// Failure records expire this long after they were sent.
pub const RETENTION_SECS: i64 = 60 * 24 * HOUR_SECS;

/// Errors raised while parsing a notification.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Message {message_id} is missing required attribute {attribute}")]
    MissingAttribute {
        message_id: String,
        attribute: &'static str,
    },

    #[error("Message {message_id} has an invalid SentTimestamp: {value}")]
    InvalidSentTimestamp { message_id: String, value: String },

    #[error("Message {message_id} has no body")]
    MissingBody { message_id: String },

    #[error("Message {message_id} body is not a valid event: {source}")]
    InvalidBody {
        message_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Minimal shape of the original EventBridge event.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    source: String,
    #[serde(rename = "detail-type")]
    detail_type: String,
    id: String,
    time: String,
}

/// One delivery failure, as persisted in the DLQ table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// `ERR#<subscription_id>#<target_name>`.
    pub partition_key: String,
    /// `#<ISO-8601 sent timestamp>`.
    pub sort_key: String,
    /// Sent time floored to the hour, epoch seconds.
    pub hour_timestamp: i64,
    /// Expiry, epoch seconds.
    pub ttl: i64,
    pub subscriber_app: String,
    pub subscription_id: String,
    pub target_name: String,
    pub event_id: String,
    pub event_name: String,
    pub event_source: String,
    pub event_timestamp: String,
    pub error_code: String,
    pub error_message: String,
    pub retry_attempts: u32,
    /// Raw original event payload.
    pub body: String,
    pub message_id: String,
    pub source_arn: String,
    pub rule_arn: String,
    pub target_arn: String,
    /// SQS delivery attributes, sorted for stable output.
    pub attributes: BTreeMap<String, String>,
}

impl FailureRecord {
    /// Parse one dead-letter notification.
    pub fn from_sqs_message(message: &SqsMessage) -> Result<Self, ParseError> {
        let message_id = message.message_id.clone().unwrap_or_default();

        let rule_arn = required_attribute(message, RULE_ARN_ATTR, &message_id)?;
        let target_arn = required_attribute(message, TARGET_ARN_ATTR, &message_id)?;

        let sent_raw = message
            .attributes
            .get(SENT_TIMESTAMP_ATTR)
            .ok_or_else(|| ParseError::MissingAttribute {
                message_id: message_id.clone(),
                attribute: SENT_TIMESTAMP_ATTR,
            })?;
        let sent_at = sent_raw
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| ParseError::InvalidSentTimestamp {
                message_id: message_id.clone(),
                value: sent_raw.clone(),
            })?;

        let body = message
            .body
            .clone()
            .ok_or_else(|| ParseError::MissingBody {
                message_id: message_id.clone(),
            })?;
        let event: EventEnvelope =
            serde_json::from_str(&body).map_err(|source| ParseError::InvalidBody {
                message_id: message_id.clone(),
                source,
            })?;

        let subscription_id = arn::rule_name(&rule_arn);
        let target_name = arn::target_name(&target_arn);
        let sent_secs = sent_at.timestamp();

        Ok(Self {
            partition_key: format!("ERR#{}#{}", subscription_id, target_name),
            sort_key: format!("#{}", sent_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            hour_timestamp: hour_bucket(sent_secs),
            ttl: sent_secs + RETENTION_SECS,
            subscriber_app: arn::subscriber_app(&subscription_id),
            subscription_id,
            target_name,
            event_id: event.id,
            event_name: event.detail_type,
            event_source: event.source,
            event_timestamp: event.time,
            error_code: string_attribute(message, ERROR_CODE_ATTR).unwrap_or_default(),
            error_message: string_attribute(message, ERROR_MESSAGE_ATTR).unwrap_or_default(),
            retry_attempts: string_attribute(message, RETRY_ATTEMPTS_ATTR)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0),
            body,
            message_id,
            source_arn: message.event_source_arn.clone().unwrap_or_default(),
            rule_arn,
            target_arn,
            attributes: message
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }
}

/// Parse a whole batch, failing on the first malformed notification.
pub fn parse_batch(messages: &[SqsMessage]) -> Result<Vec<FailureRecord>, ParseError> {
    messages.iter().map(FailureRecord::from_sqs_message).collect()
}

/// Floor epoch seconds to the start of their hour.
pub fn hour_bucket(epoch_secs: i64) -> i64 {
    epoch_secs - epoch_secs.rem_euclid(HOUR_SECS)
}

fn string_attribute(message: &SqsMessage, name: &str) -> Option<String> {
    message
        .message_attributes
        .get(name)
        .and_then(|attr| attr.string_value.clone())
}

fn required_attribute(
    message: &SqsMessage,
    name: &'static str,
    message_id: &str,
) -> Result<String, ParseError> {
    string_attribute(message, name).ok_or_else(|| ParseError::MissingAttribute {
        message_id: message_id.to_string(),
        attribute: name,
    })
}
