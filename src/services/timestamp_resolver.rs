//! Dates each deployment folder by sampling one of its objects.
//!
//! Deployments are uploaded in a single burst, so the first object the
//! service returns under a prefix stands in for the whole folder. That costs
//! one request per prefix instead of a scan of every object.

use crate::{
    errors::{CleanupError, CleanupResult},
    models::prefix::{OrderedPrefixes, Prefix, PrefixTimestamp},
    services::storage_client::StorageClient,
};
use tracing::debug;

/// Resolve a timestamp for every prefix and order them newest first.
///
/// A prefix with no objects under it is an error rather than something to
/// skip: leaving it out would make an empty folder immortal.
pub async fn resolve_timestamps<C>(
    client: &C,
    bucket: &str,
    prefixes: Vec<Prefix>,
) -> CleanupResult<OrderedPrefixes>
where
    C: StorageClient + ?Sized,
{
    let mut entries = Vec::with_capacity(prefixes.len());

    for prefix in prefixes {
        let page = client
            .list_objects(bucket, prefix.as_str(), Some(1), None)
            .await
            .map_err(|err| CleanupError::Resolution {
                prefix: prefix.to_string(),
                reason: err.to_string(),
            })?;

        let Some(sample) = page.items.into_iter().next() else {
            return Err(CleanupError::Resolution {
                prefix: prefix.to_string(),
                reason: "no objects found under prefix".into(),
            });
        };

        debug!(%prefix, key = %sample.key, last_modified = %sample.last_modified, "Resolved prefix timestamp");
        entries.push(PrefixTimestamp::new(prefix, sample.last_modified));
    }

    Ok(OrderedPrefixes::from_unordered(entries))
}
