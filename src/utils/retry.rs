//! Retry utilities: backoff builders.
//!
//! Uses `backon` for exponential backoff with jitter.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Backoff between resubmissions of unprocessed `BatchWriteItem` items.
///
/// - Min delay: 50ms
/// - Max delay: 2s
/// - Unlimited attempts (the Lambda timeout is the outer bound)
/// - Jitter enabled
pub fn unprocessed_items_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(50))
        .with_max_delay(Duration::from_secs(2))
        .without_max_times()
        .with_jitter()
}

/// Backoff with no delay, for tests.
pub fn immediate_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::ZERO)
        .with_max_delay(Duration::ZERO)
        .without_max_times()
}
