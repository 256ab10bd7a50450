//! The object-storage contract the cleanup is written against.
//!
//! Each listing call returns one page plus an optional continuation token.
//! [`paginate`] turns repeated calls into a lazy stream of pages that ends
//! when the service stops handing out tokens.

use crate::models::object::{DeleteError, ObjectSummary};
use async_trait::async_trait;
use futures::{Stream, stream};
use std::future::Future;
use thiserror::Error;

/// Failure of a storage call as a whole, as opposed to a per-key
/// [`DeleteError`] inside a successful delete request.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("could not build request: {0}")]
    BuildRequest(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    /// Token for the following page; `None` on the last page.
    pub next_token: Option<String>,
}

impl<T> ListPage<T> {
    #[cfg(test)]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Bucket operations used by the cleanup.
///
/// Implementations must be `Send + Sync` to support async contexts.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// List one page of first-level common prefixes of `bucket`.
    async fn list_common_prefixes(
        &self,
        bucket: &str,
        delimiter: &str,
        continuation_token: Option<String>,
    ) -> StorageResult<ListPage<String>>;

    /// List one page of objects whose key starts with `prefix`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: Option<i32>,
        continuation_token: Option<String>,
    ) -> StorageResult<ListPage<ObjectSummary>>;

    /// Delete `keys` in one batch request, returning the keys that failed.
    async fn delete_objects(
        &self,
        bucket: &str,
        keys: Vec<String>,
    ) -> StorageResult<Vec<DeleteError>>;

    /// Get the backend type name (for logging/debugging).
    fn backend_name(&self) -> &'static str;
}

/// Drive `fetch` from the first page until the last, yielding each page's items.
///
/// `fetch` receives the continuation token of the previous page (`None` for
/// the first call). A token that repeats the one just used is reported as a
/// malformed response instead of looping forever.
pub fn paginate<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = StorageResult<Vec<T>>> + 'a
where
    T: 'a,
    F: FnMut(Option<String>) -> Fut + 'a,
    Fut: Future<Output = StorageResult<ListPage<T>>> + 'a,
{
    // `None` once the last page has been yielded.
    let cursor: Option<Option<String>> = Some(None);

    stream::try_unfold((fetch, cursor), |(mut fetch, cursor)| async move {
        let Some(token) = cursor else {
            return Ok(None);
        };

        let page = fetch(token.clone()).await?;
        let next = match page.next_token {
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                return Err(StorageError::Malformed(format!(
                    "continuation token `{next}` did not advance"
                )));
            }
            Some(next) => Some(Some(next)),
            None => None,
        };

        Ok(Some((page.items, (fetch, next))))
    })
}
