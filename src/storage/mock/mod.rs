//! In-memory storage implementations for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::RwLock;

use super::schema::{HOUR_TIMESTAMP, PARTITION_KEY, SORT_KEY};
use super::{
    ApplicationDirectory, FailureIndex, FailureWriter, Item, Page, Result, StorageError,
};

/// Cursor attribute used by the mock pagination.
const OFFSET_CURSOR: &str = "__offset";

/// Mock DLQ table.
///
/// Items are keyed by (`PartitionKey`, `SortKey`) like the real table, so
/// rewriting the same record replaces it. Pages are cut at `page_size`.
pub struct MockFailureStore {
    items: RwLock<Vec<Item>>,
    /// Per-call count of items to report as unprocessed, consumed in order.
    unprocessed_script: RwLock<VecDeque<usize>>,
    fail_on_put: AtomicBool,
    fail_on_query: AtomicBool,
    page_size: AtomicUsize,
    put_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl Default for MockFailureStore {
    fn default() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            unprocessed_script: RwLock::new(VecDeque::new()),
            fail_on_put: AtomicBool::new(false),
            fail_on_query: AtomicBool::new(false),
            page_size: AtomicUsize::new(100),
            put_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
        }
    }
}

impl MockFailureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script how many items each successive `batch_put` leaves unprocessed.
    pub async fn script_unprocessed(&self, counts: impl IntoIterator<Item = usize>) {
        *self.unprocessed_script.write().await = counts.into_iter().collect();
    }

    pub fn set_fail_on_put(&self, fail: bool) {
        self.fail_on_put.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_on_query(&self, fail: bool) {
        self.fail_on_query.store(fail, Ordering::SeqCst);
    }

    pub fn set_page_size(&self, size: usize) {
        self.page_size.store(size.max(1), Ordering::SeqCst);
    }

    /// Insert an item directly, bypassing `batch_put` bookkeeping.
    pub async fn insert_raw(&self, item: Item) {
        upsert(&mut *self.items.write().await, item);
    }

    pub async fn stored(&self) -> Vec<Item> {
        self.items.read().await.clone()
    }

    pub async fn stored_count(&self) -> usize {
        self.items.read().await.len()
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FailureWriter for MockFailureStore {
    async fn batch_put(&self, mut items: Vec<Item>) -> Result<Vec<Item>> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_put.load(Ordering::SeqCst) {
            return Err(StorageError::Injected(
                "ProvisionedThroughputExceededException".to_string(),
            ));
        }

        let unprocessed_count = self
            .unprocessed_script
            .write()
            .await
            .pop_front()
            .unwrap_or(0)
            .min(items.len());
        let unprocessed = items.split_off(items.len() - unprocessed_count);

        let mut stored = self.items.write().await;
        for item in items {
            upsert(&mut stored, item);
        }

        Ok(unprocessed)
    }
}

#[async_trait]
impl FailureIndex for MockFailureStore {
    async fn query_hour_page(
        &self,
        hour_timestamp: i64,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_query.load(Ordering::SeqCst) {
            return Err(StorageError::Injected("query failed".to_string()));
        }

        let wanted = AttributeValue::N(hour_timestamp.to_string());
        let matching: Vec<Item> = self
            .items
            .read()
            .await
            .iter()
            .filter(|item| item.get(HOUR_TIMESTAMP) == Some(&wanted))
            .cloned()
            .collect();

        Ok(paginate(
            matching,
            exclusive_start_key,
            self.page_size.load(Ordering::SeqCst),
        ))
    }
}

/// Mock applications directory.
pub struct MockApplicationDirectory {
    items: RwLock<Vec<Item>>,
    fail_on_scan: AtomicBool,
    page_size: AtomicUsize,
    scan_calls: AtomicUsize,
}

impl Default for MockApplicationDirectory {
    fn default() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            fail_on_scan: AtomicBool::new(false),
            page_size: AtomicUsize::new(100),
            scan_calls: AtomicUsize::new(0),
        }
    }
}

impl MockApplicationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an application with its display name and support emails.
    pub async fn add_application(&self, pk: &str, name: &str, support_emails: &[&str]) {
        use super::schema::{APP_NAME, APP_PK, APP_SUPPORT_EMAIL};

        let emails = support_emails
            .iter()
            .map(|e| AttributeValue::S(e.to_string()))
            .collect();
        self.items.write().await.push(Item::from([
            (APP_PK.to_string(), AttributeValue::S(pk.to_string())),
            (APP_NAME.to_string(), AttributeValue::S(name.to_string())),
            (APP_SUPPORT_EMAIL.to_string(), AttributeValue::L(emails)),
        ]));
    }

    pub async fn insert_raw(&self, item: Item) {
        self.items.write().await.push(item);
    }

    pub fn set_fail_on_scan(&self, fail: bool) {
        self.fail_on_scan.store(fail, Ordering::SeqCst);
    }

    pub fn set_page_size(&self, size: usize) {
        self.page_size.store(size.max(1), Ordering::SeqCst);
    }

    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApplicationDirectory for MockApplicationDirectory {
    async fn scan_page(&self, exclusive_start_key: Option<Item>) -> Result<Page> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_scan.load(Ordering::SeqCst) {
            return Err(StorageError::Injected("scan failed".to_string()));
        }

        let items = self.items.read().await.clone();
        Ok(paginate(
            items,
            exclusive_start_key,
            self.page_size.load(Ordering::SeqCst),
        ))
    }
}

fn upsert(items: &mut Vec<Item>, item: Item) {
    let key = |i: &Item| (i.get(PARTITION_KEY).cloned(), i.get(SORT_KEY).cloned());
    let new_key = key(&item);
    match items.iter_mut().find(|existing| key(existing) == new_key) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

fn paginate(items: Vec<Item>, start: Option<Item>, page_size: usize) -> Page {
    let offset = start
        .as_ref()
        .and_then(|key| match key.get(OFFSET_CURSOR) {
            Some(AttributeValue::N(n)) => n.parse::<usize>().ok(),
            _ => None,
        })
        .unwrap_or(0);

    let total = items.len();
    let end = offset.saturating_add(page_size).min(total);
    let page: Vec<Item> = items.into_iter().skip(offset).take(page_size).collect();

    let last_evaluated_key = (end < total)
        .then(|| Item::from([(OFFSET_CURSOR.to_string(), AttributeValue::N(end.to_string()))]));

    Page {
        items: page,
        last_evaluated_key,
    }
}
