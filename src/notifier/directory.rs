//! Application directory lookup.

use std::collections::{BTreeSet, HashMap};

use aws_sdk_dynamodb::types::AttributeValue;
use tracing::{debug, error, warn};

use crate::storage::schema::APP_PK;
use crate::storage::{ApplicationDetail, ApplicationDirectory, Item, StorageError};

/// Errors from resolving application short codes.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("no matching details for application {0}")]
    NoMatchingDetails(String),

    #[error("no support emails for application {0}")]
    NoSupportEmails(String),

    #[error("failed to scan applications directory: {0}")]
    Scan(#[source] StorageError),
}

/// Resolve every short code in `short_names` to its directory entry.
///
/// The directory is scanned once, to completion. Only rows whose `PK` is
/// requested are validated; unrelated rows never fail the lookup. Any
/// unresolved code fails the lookup as a whole. An empty request performs
/// no scan.
pub async fn resolve_applications(
    directory: &dyn ApplicationDirectory,
    short_names: &BTreeSet<String>,
) -> Result<HashMap<String, ApplicationDetail>, DirectoryError> {
    if short_names.is_empty() {
        return Ok(HashMap::new());
    }

    let all = scan_requested(directory, short_names).await?;

    let mut resolved = HashMap::with_capacity(short_names.len());
    for short_name in short_names {
        let detail = all.get(short_name).ok_or_else(|| {
            error!(application = %short_name, "Application missing from directory");
            DirectoryError::NoMatchingDetails(short_name.clone())
        })?;
        if detail.support_emails.is_empty() {
            error!(application = %short_name, "Application has no support emails");
            return Err(DirectoryError::NoSupportEmails(short_name.clone()));
        }
        resolved.insert(short_name.clone(), detail.clone());
    }

    Ok(resolved)
}

async fn scan_requested(
    directory: &dyn ApplicationDirectory,
    short_names: &BTreeSet<String>,
) -> Result<HashMap<String, ApplicationDetail>, DirectoryError> {
    let mut by_pk = HashMap::new();
    let mut start_key = None;

    loop {
        let page = directory
            .scan_page(start_key.take())
            .await
            .map_err(DirectoryError::Scan)?;

        for item in &page.items {
            let Some(pk) = row_key(item) else {
                warn!("Skipping applications row without a string PK");
                continue;
            };
            if !short_names.contains(pk) {
                continue;
            }
            let detail = ApplicationDetail::try_from(item).map_err(DirectoryError::Scan)?;
            by_pk.insert(detail.pk.clone(), detail);
        }

        match page.last_evaluated_key {
            Some(key) => start_key = Some(key),
            None => break,
        }
    }

    debug!(matched = by_pk.len(), "Scanned applications directory");
    Ok(by_pk)
}

fn row_key(item: &Item) -> Option<&str> {
    match item.get(APP_PK) {
        Some(AttributeValue::S(pk)) => Some(pk.as_str()),
        _ => None,
    }
}
