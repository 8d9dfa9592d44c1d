//! Previous-hour failure window.

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::dlq::{hour_bucket, HOUR_SECS};
use crate::storage::{FailureIndex, Result, StoredFailure};

/// The hour bucket immediately preceding `now`.
///
/// A run at 10:06 covers 09:00-10:00. A run delayed past 11:00 covers
/// 10:00-11:00 and the 09:00 bucket is never reported.
pub fn previous_hour_bucket(now: DateTime<Utc>) -> i64 {
    hour_bucket(now.timestamp()) - HOUR_SECS
}

/// Fetch every failure in `hour_timestamp`, following pagination to the end.
///
/// Any item that fails shape validation aborts the whole query.
pub async fn failures_in_hour(
    index: &dyn FailureIndex,
    hour_timestamp: i64,
) -> Result<Vec<StoredFailure>> {
    let mut failures = Vec::new();
    let mut start_key = None;
    let mut pages = 0;

    loop {
        let page = index.query_hour_page(hour_timestamp, start_key.take()).await?;
        pages += 1;

        for item in &page.items {
            let failure = StoredFailure::try_from(item).map_err(|e| {
                error!(error = %e, hour_timestamp, "Corrupt DLQ record in hour bucket");
                e
            })?;
            failures.push(failure);
        }

        match page.last_evaluated_key {
            Some(key) => start_key = Some(key),
            None => break,
        }
    }

    debug!(hour_timestamp, pages, count = failures.len(), "Loaded failure window");
    Ok(failures)
}
