//! Table schemas: attribute names and item conversions.
//!
//! DLQ table:
//! - PK: `PartitionKey` (S), SK: `SortKey` (S)
//! - GSI on `HourTimestamp` (N) projecting at least `SubscriberApp`, `SubscriptionId`
//! - `TTL` (N) drives expiry
//!
//! Applications table:
//! - PK: `PK` (S), the application short code
//! - `Name` (S), `SupportEmail` (L of S, SS, or a single S)

use aws_sdk_dynamodb::types::AttributeValue;

use super::{Item, Result, StorageError};
use crate::dlq::FailureRecord;

pub const PARTITION_KEY: &str = "PartitionKey";
pub const SORT_KEY: &str = "SortKey";
pub const HOUR_TIMESTAMP: &str = "HourTimestamp";
pub const TTL: &str = "TTL";
pub const SUBSCRIBER_APP: &str = "SubscriberApp";
pub const SUBSCRIPTION_ID: &str = "SubscriptionId";
pub const TARGET_NAME: &str = "TargetName";
pub const EVENT_ID: &str = "EventId";
pub const EVENT_NAME: &str = "EventName";
pub const EVENT_SOURCE: &str = "EventSource";
pub const EVENT_TIMESTAMP: &str = "EventTimestamp";
pub const ERROR_CODE: &str = "ErrorCode";
pub const ERROR_MESSAGE: &str = "ErrorMessage";
pub const RETRY_ATTEMPTS: &str = "RetryAttempts";
pub const BODY: &str = "Body";
pub const MESSAGE_ID: &str = "MessageId";
pub const SOURCE_ARN: &str = "SourceArn";
pub const RULE_ARN: &str = "RuleArn";
pub const TARGET_ARN: &str = "TargetArn";
pub const ATTRIBUTES: &str = "Attributes";

pub const APP_PK: &str = "PK";
pub const APP_NAME: &str = "Name";
pub const APP_SUPPORT_EMAIL: &str = "SupportEmail";

const FAILURE_KIND: &str = "failure";
const APPLICATION_KIND: &str = "application";

/// Convert a failure record into a DLQ table item.
pub fn failure_to_item(record: &FailureRecord) -> Item {
    let s = |v: &str| AttributeValue::S(v.to_string());
    let n = |v: i64| AttributeValue::N(v.to_string());

    let attributes = record
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), s(v)))
        .collect();

    Item::from([
        (PARTITION_KEY.to_string(), s(&record.partition_key)),
        (SORT_KEY.to_string(), s(&record.sort_key)),
        (HOUR_TIMESTAMP.to_string(), n(record.hour_timestamp)),
        (TTL.to_string(), n(record.ttl)),
        (SUBSCRIBER_APP.to_string(), s(&record.subscriber_app)),
        (SUBSCRIPTION_ID.to_string(), s(&record.subscription_id)),
        (TARGET_NAME.to_string(), s(&record.target_name)),
        (EVENT_ID.to_string(), s(&record.event_id)),
        (EVENT_NAME.to_string(), s(&record.event_name)),
        (EVENT_SOURCE.to_string(), s(&record.event_source)),
        (EVENT_TIMESTAMP.to_string(), s(&record.event_timestamp)),
        (ERROR_CODE.to_string(), s(&record.error_code)),
        (ERROR_MESSAGE.to_string(), s(&record.error_message)),
        (RETRY_ATTEMPTS.to_string(), n(i64::from(record.retry_attempts))),
        (BODY.to_string(), s(&record.body)),
        (MESSAGE_ID.to_string(), s(&record.message_id)),
        (SOURCE_ARN.to_string(), s(&record.source_arn)),
        (RULE_ARN.to_string(), s(&record.rule_arn)),
        (TARGET_ARN.to_string(), s(&record.target_arn)),
        (ATTRIBUTES.to_string(), AttributeValue::M(attributes)),
    ])
}

/// The projection of a failure the notifier needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFailure {
    pub partition_key: String,
    pub sort_key: String,
    pub subscriber_app: String,
    pub subscription_id: String,
}

impl TryFrom<&Item> for StoredFailure {
    type Error = StorageError;

    fn try_from(item: &Item) -> Result<Self> {
        Ok(Self {
            partition_key: string_attr(item, PARTITION_KEY, FAILURE_KIND)?,
            sort_key: string_attr(item, SORT_KEY, FAILURE_KIND)?,
            subscriber_app: string_attr(item, SUBSCRIBER_APP, FAILURE_KIND)?,
            subscription_id: string_attr(item, SUBSCRIPTION_ID, FAILURE_KIND)?,
        })
    }
}

/// An entry of the applications directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDetail {
    /// Application short code.
    pub pk: String,
    /// Display name.
    pub name: String,
    pub support_emails: Vec<String>,
}

impl TryFrom<&Item> for ApplicationDetail {
    type Error = StorageError;

    fn try_from(item: &Item) -> Result<Self> {
        let support_emails = match item.get(APP_SUPPORT_EMAIL) {
            Some(AttributeValue::L(values)) => values
                .iter()
                .map(|v| match v {
                    AttributeValue::S(s) => Ok(s.clone()),
                    _ => Err(invalid(APPLICATION_KIND, APP_SUPPORT_EMAIL)),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(AttributeValue::Ss(values)) => values.clone(),
            Some(AttributeValue::S(value)) => vec![value.clone()],
            None => Vec::new(),
            Some(_) => return Err(invalid(APPLICATION_KIND, APP_SUPPORT_EMAIL)),
        };

        Ok(Self {
            pk: string_attr(item, APP_PK, APPLICATION_KIND)?,
            name: string_attr(item, APP_NAME, APPLICATION_KIND)?,
            support_emails: support_emails
                .into_iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        })
    }
}

fn string_attr(item: &Item, attribute: &'static str, kind: &'static str) -> Result<String> {
    match item.get(attribute) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        _ => Err(invalid(kind, attribute)),
    }
}

fn invalid(kind: &'static str, attribute: &'static str) -> StorageError {
    StorageError::InvalidRecord { kind, attribute }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn record() -> FailureRecord {
        FailureRecord {
            partition_key: "ERR#App1.orders.Created.x1#App1.Api-PRD".to_string(),
            sort_key: "#2024-05-01T10:15:30.123Z".to_string(),
            hour_timestamp: 1_714_557_600,
            ttl: 1_719_742_530,
            subscriber_app: "App1".to_string(),
            subscription_id: "App1.orders.Created.x1".to_string(),
            target_name: "App1.Api-PRD".to_string(),
            event_id: "evt-1".to_string(),
            event_name: "Created".to_string(),
            event_source: "orders".to_string(),
            event_timestamp: "2024-05-01T10:15:29Z".to_string(),
            error_code: "SDK_CLIENT_ERROR".to_string(),
            error_message: "timeout".to_string(),
            retry_attempts: 3,
            body: "{}".to_string(),
            message_id: "m-1".to_string(),
            source_arn: "arn:aws:sqs:ap-southeast-2:1:dlq".to_string(),
            rule_arn: "arn:aws:events:ap-southeast-2:1:rule/bus/App1.orders.Created.x1"
                .to_string(),
            target_arn: "arn:aws:events:ap-southeast-2:1:api-destination/App1.Api-PRD/x"
                .to_string(),
            attributes: BTreeMap::from([(
                "SentTimestamp".to_string(),
                "1714558530123".to_string(),
            )]),
        }
    }

    #[test]
    fn test_failure_item_carries_keys_and_numbers() {
        let item = failure_to_item(&record());

        assert_eq!(
            item.get(PARTITION_KEY),
            Some(&AttributeValue::S(
                "ERR#App1.orders.Created.x1#App1.Api-PRD".to_string()
            ))
        );
        assert_eq!(
            item.get(HOUR_TIMESTAMP),
            Some(&AttributeValue::N("1714557600".to_string()))
        );
        assert_eq!(
            item.get(RETRY_ATTEMPTS),
            Some(&AttributeValue::N("3".to_string()))
        );
        match item.get(ATTRIBUTES) {
            Some(AttributeValue::M(attrs)) => assert_eq!(
                attrs.get("SentTimestamp"),
                Some(&AttributeValue::S("1714558530123".to_string()))
            ),
            other => panic!("expected map attribute, got {other:?}"),
        }
    }

    #[test]
    fn test_stored_failure_from_written_item() {
        let stored = StoredFailure::try_from(&failure_to_item(&record())).unwrap();
        assert_eq!(stored.subscriber_app, "App1");
        assert_eq!(stored.subscription_id, "App1.orders.Created.x1");
        assert_eq!(stored.sort_key, "#2024-05-01T10:15:30.123Z");
    }

    #[test]
    fn test_stored_failure_rejects_missing_attribute() {
        let mut item = failure_to_item(&record());
        item.remove(SUBSCRIPTION_ID);

        let err = StoredFailure::try_from(&item).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidRecord {
                attribute: SUBSCRIPTION_ID,
                ..
            }
        ));
    }

    #[test]
    fn test_stored_failure_rejects_wrong_type() {
        let mut item = failure_to_item(&record());
        item.insert(SUBSCRIBER_APP.to_string(), AttributeValue::N("1".to_string()));

        assert!(StoredFailure::try_from(&item).is_err());
    }

    #[test]
    fn test_application_detail_support_email_shapes() {
        let base = |emails: AttributeValue| {
            Item::from([
                (APP_PK.to_string(), AttributeValue::S("App1".to_string())),
                (APP_NAME.to_string(), AttributeValue::S("Application One".to_string())),
                (APP_SUPPORT_EMAIL.to_string(), emails),
            ])
        };

        let list = ApplicationDetail::try_from(&base(AttributeValue::L(vec![
            AttributeValue::S("a@example.com".to_string()),
            AttributeValue::S(" ".to_string()),
        ])))
        .unwrap();
        assert_eq!(list.support_emails, vec!["a@example.com"]);
        assert_eq!(list.name, "Application One");

        let set = ApplicationDetail::try_from(&base(AttributeValue::Ss(vec![
            "a@example.com".to_string(),
            "b@example.com".to_string(),
        ])))
        .unwrap();
        assert_eq!(set.support_emails.len(), 2);

        let single =
            ApplicationDetail::try_from(&base(AttributeValue::S("a@example.com".to_string())))
                .unwrap();
        assert_eq!(single.support_emails, vec!["a@example.com"]);

        assert!(ApplicationDetail::try_from(&base(AttributeValue::Bool(true))).is_err());
    }
}
