//! Enumerates the deployment folders of a bucket.

use crate::{
    errors::{CleanupError, CleanupResult},
    models::prefix::Prefix,
    services::storage_client::{StorageClient, paginate},
};
use futures::{TryStreamExt, pin_mut};
use std::collections::HashSet;
use tracing::debug;

/// Collect every first-level common prefix of `bucket`, across all pages.
///
/// Prefixes keep the order the service lists them in; repeats across pages
/// are dropped. Any failed page fails the whole listing, since a partial
/// folder set would skew every retention decision made from it.
pub async fn list_prefixes<C>(client: &C, bucket: &str, delimiter: &str) -> CleanupResult<Vec<Prefix>>
where
    C: StorageClient + ?Sized,
{
    let listing_error = |source| CleanupError::Listing {
        bucket: bucket.to_string(),
        source,
    };

    let pages = paginate(move |token| client.list_common_prefixes(bucket, delimiter, token));
    pin_mut!(pages);

    let mut seen = HashSet::new();
    let mut prefixes = Vec::new();
    while let Some(page) = pages.try_next().await.map_err(listing_error)? {
        debug!(bucket, count = page.len(), "Received prefix page");
        for prefix in page {
            if seen.insert(prefix.clone()) {
                prefixes.push(Prefix::new(prefix));
            }
        }
    }

    Ok(prefixes)
}
