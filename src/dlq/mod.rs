//! Dead-letter notification parsing.
//!
//! EventBridge delivers events it could not hand to a target into an SQS
//! dead-letter queue, annotated with the rule and target ARNs plus the
//! error that exhausted its retry policy. This module turns those
//! messages into [`FailureRecord`]s.
//!
//! ## Keys
//!
//! - Partition key: `ERR#{subscription_id}#{target_name}`
//! - Sort key: `#{sent timestamp, ISO-8601}`
//! - `HourTimestamp`: sent time floored to the hour, the notifier's query key

pub mod arn;
mod record;

pub use record::{
    hour_bucket, parse_batch, FailureRecord, ParseError, ERROR_CODE_ATTR, ERROR_MESSAGE_ATTR,
    HOUR_SECS, RETENTION_SECS, RETRY_ATTEMPTS_ATTR, RULE_ARN_ATTR, SENT_TIMESTAMP_ATTR,
    TARGET_ARN_ATTR,
};
