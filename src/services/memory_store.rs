//! In-memory bucket store used by the test suite.
//!
//! Listing follows S3 ListObjectsV2 rules closely enough for the cleanup:
//! lexicographic key order, prefix filtering, delimiter grouping into common
//! prefixes, max-keys clamped to 1..=1000, and continuation tokens that
//! name the last entry returned. Faults can be injected per key, per prefix,
//! or for whole operations, and every call is recorded.

use crate::{
    models::object::{DeleteError, ObjectSummary},
    services::storage_client::{ListPage, StorageClient, StorageError, StorageResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Mutex,
};

const MAX_KEYS_LIMIT: usize = 1000;

/// A storage call as seen by [`MemoryStorage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    ListCommonPrefixes { bucket: String },
    ListObjects { bucket: String, prefix: String },
    DeleteObjects { bucket: String, keys: Vec<String> },
}

#[derive(Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, DateTime<Utc>>>,
    failing_keys: HashMap<String, String>,
    failing_list_prefixes: HashSet<String>,
    fail_prefix_listing: bool,
    fail_deletes: bool,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
    page_size: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap every page at `page_size` entries, below the 1000 the service allows.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn put(&self, bucket: &str, key: &str, last_modified: DateTime<Utc>) {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), last_modified);
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.lock().buckets.entry(bucket.to_string()).or_default();
    }

    /// Make deletes of `key` report a per-key error and leave the object in place.
    pub fn fail_key(&self, key: &str, message: &str) {
        self.lock()
            .failing_keys
            .insert(key.to_string(), message.to_string());
    }

    /// Make object listings under `prefix` fail with a request error.
    pub fn fail_listing_under(&self, prefix: &str) {
        self.lock().failing_list_prefixes.insert(prefix.to_string());
    }

    pub fn fail_prefix_listing(&self) {
        self.lock().fail_prefix_listing = true;
    }

    /// Make every delete request fail as a whole.
    pub fn fail_deletes(&self) {
        self.lock().fail_deletes = true;
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn delete_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::DeleteObjects { .. }))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn page_limit(&self, max_keys: Option<i32>) -> usize {
        let requested = max_keys
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(MAX_KEYS_LIMIT);
        let limit = self.page_size.map_or(requested, |size| size.min(requested));
        limit.clamp(1, MAX_KEYS_LIMIT)
    }
}

/// Take up to `limit` entries strictly after `token`, S3 style.
fn take_page<T, F>(entries: Vec<T>, token: Option<&str>, limit: usize, name: F) -> ListPage<T>
where
    F: Fn(&T) -> &str,
{
    let mut rows: Vec<T> = entries
        .into_iter()
        .filter(|entry| token.is_none_or(|token| name(entry) > token))
        .take(limit + 1)
        .collect();

    let mut next_token = None;
    if rows.len() > limit {
        rows.truncate(limit);
        next_token = rows.last().map(|last| name(last).to_string());
    }

    ListPage {
        items: rows,
        next_token,
    }
}

/// Compute a synthetic "common prefix" for S3 list semantics.
///
/// Returns `Some(prefix)` when the key continues past `delimiter`.
fn compute_common_prefix(key: &str, delimiter: &str) -> Option<String> {
    key.find(delimiter)
        .map(|pos| key[..pos + delimiter.len()].to_string())
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn list_common_prefixes(
        &self,
        bucket: &str,
        delimiter: &str,
        continuation_token: Option<String>,
    ) -> StorageResult<ListPage<String>> {
        let limit = self.page_limit(None);
        let mut state = self.lock();
        state.calls.push(Call::ListCommonPrefixes {
            bucket: bucket.to_string(),
        });
        if state.fail_prefix_listing {
            return Err(StorageError::Request("injected listing failure".into()));
        }
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| StorageError::Request(format!("NoSuchBucket: {bucket}")))?;

        let prefixes: BTreeSet<String> = objects
            .keys()
            .filter_map(|key| compute_common_prefix(key, delimiter))
            .collect();

        Ok(take_page(
            prefixes.into_iter().collect(),
            continuation_token.as_deref(),
            limit,
            |prefix| prefix.as_str(),
        ))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: Option<i32>,
        continuation_token: Option<String>,
    ) -> StorageResult<ListPage<ObjectSummary>> {
        let limit = self.page_limit(max_keys);
        let mut state = self.lock();
        state.calls.push(Call::ListObjects {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        });
        if state.failing_list_prefixes.contains(prefix) {
            return Err(StorageError::Request(format!(
                "injected listing failure under {prefix}"
            )));
        }
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| StorageError::Request(format!("NoSuchBucket: {bucket}")))?;

        let matching: Vec<ObjectSummary> = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, last_modified)| ObjectSummary {
                key: key.clone(),
                last_modified: *last_modified,
            })
            .collect();

        Ok(take_page(
            matching,
            continuation_token.as_deref(),
            limit,
            |object| object.key.as_str(),
        ))
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        keys: Vec<String>,
    ) -> StorageResult<Vec<DeleteError>> {
        let mut state = self.lock();
        state.calls.push(Call::DeleteObjects {
            bucket: bucket.to_string(),
            keys: keys.clone(),
        });
        if state.fail_deletes {
            return Err(StorageError::Request("injected delete failure".into()));
        }
        if keys.is_empty() || keys.len() > MAX_KEYS_LIMIT {
            return Err(StorageError::Request(format!(
                "MalformedXML: {} keys in one request",
                keys.len()
            )));
        }

        let State {
            buckets,
            failing_keys,
            ..
        } = &mut *state;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::Request(format!("NoSuchBucket: {bucket}")))?;

        let mut errors = Vec::new();
        for key in keys {
            match failing_keys.get(&key) {
                Some(message) => errors.push(DeleteError::new(key, message.clone())),
                None => {
                    objects.remove(&key);
                }
            }
        }
        Ok(errors)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_compute_common_prefix() {
        assert_eq!(
            compute_common_prefix("deploy-1/index.html", "/"),
            Some("deploy-1/".to_string())
        );
        assert_eq!(compute_common_prefix("README.md", "/"), None);
    }

    #[tokio::test]
    async fn test_common_prefixes_skip_root_keys_and_page() {
        let store = MemoryStorage::new().with_page_size(2);
        for key in ["a/1", "a/2", "b/1", "c/x/y", "root.txt"] {
            store.put("bucket", key, ts());
        }

        let first = store
            .list_common_prefixes("bucket", "/", None)
            .await
            .unwrap();
        assert_eq!(first.items, vec!["a/".to_string(), "b/".to_string()]);
        assert_eq!(first.next_token.as_deref(), Some("b/"));

        let second = store
            .list_common_prefixes("bucket", "/", first.next_token)
            .await
            .unwrap();
        assert_eq!(second.items, vec!["c/".to_string()]);
        assert_eq!(second.next_token, None);
    }

    #[tokio::test]
    async fn test_list_objects_respects_max_keys() {
        let store = MemoryStorage::new();
        for key in ["a/1", "a/2", "a/3", "b/1"] {
            store.put("bucket", key, ts());
        }

        let page = store
            .list_objects("bucket", "a/", Some(1), None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].key, "a/1");
        assert_eq!(page.next_token.as_deref(), Some("a/1"));
    }

    #[tokio::test]
    async fn test_missing_bucket_is_request_error() {
        let store = MemoryStorage::new();
        let result = store.list_common_prefixes("nope", "/", None).await;
        assert!(matches!(result, Err(StorageError::Request(_))));
    }

    #[tokio::test]
    async fn test_delete_reports_failing_keys_and_keeps_them() {
        let store = MemoryStorage::new();
        store.put("bucket", "a/1", ts());
        store.put("bucket", "a/2", ts());
        store.fail_key("a/2", "Access Denied");

        let errors = store
            .delete_objects("bucket", vec!["a/1".into(), "a/2".into()])
            .await
            .unwrap();

        assert_eq!(errors, vec![DeleteError::new("a/2", "Access Denied")]);
        assert_eq!(store.keys("bucket"), vec!["a/2".to_string()]);
        assert_eq!(store.delete_calls(), 1);
    }
}
