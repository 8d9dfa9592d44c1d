//! Integration Hub delivery-failure pipeline.
//!
//! Two Lambda functions share this crate:
//!
//! - `event-dlq` records EventBridge dead-letter notifications into the
//!   DLQ DynamoDB table ([`recorder`]).
//! - `dlq-notification` runs hourly, summarises the previous hour's
//!   failures per application and emails each application's support
//!   contacts ([`notifier`]).
//!
//! AWS services sit behind the traits in [`storage`], [`credentials`] and
//! [`email`], so both pipelines run against in-memory fakes in tests.

pub mod config;
pub mod credentials;
pub mod dlq;
pub mod email;
pub mod handlers;
pub mod notifier;
pub mod recorder;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod utils;
