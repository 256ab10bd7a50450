//! Removes every object under a prefix, one listing page at a time.

use crate::{
    errors::{CleanupError, CleanupResult, DeleteStage},
    models::{object::DeleteError, prefix::Prefix},
    services::storage_client::{StorageClient, paginate},
};
use futures::{TryStreamExt, pin_mut};
use tracing::{debug, warn};

/// Upper bound on keys in one delete request.
pub const MAX_DELETE_BATCH: usize = 1000;

/// Delete all objects under `prefix`, returning the keys that failed.
///
/// Each listing page is deleted before the next one is requested. Per-key
/// failures reported inside a successful batch are collected in encounter
/// order; a failed listing or batch request aborts with
/// [`CleanupError::DeleteTransport`].
pub async fn delete_prefix<C>(
    client: &C,
    bucket: &str,
    prefix: &Prefix,
) -> CleanupResult<Vec<DeleteError>>
where
    C: StorageClient + ?Sized,
{
    let transport_error = |stage| {
        move |source| CleanupError::DeleteTransport {
            stage,
            prefix: prefix.to_string(),
            source,
        }
    };

    let pages = paginate(move |token| {
        client.list_objects(bucket, prefix.as_str(), Some(MAX_DELETE_BATCH as i32), token)
    });
    pin_mut!(pages);

    let mut errors = Vec::new();
    let mut deleted = 0usize;
    while let Some(page) = pages
        .try_next()
        .await
        .map_err(transport_error(DeleteStage::FetchKeys))?
    {
        let keys: Vec<String> = page.into_iter().map(|object| object.key).collect();

        for batch in keys.chunks(MAX_DELETE_BATCH) {
            let failed = client
                .delete_objects(bucket, batch.to_vec())
                .await
                .map_err(transport_error(DeleteStage::DeleteBatch))?;

            for err in &failed {
                warn!(key = %err.key, message = %err.message, "Object was not deleted");
            }
            debug!(%prefix, requested = batch.len(), failed = failed.len(), "Delete batch finished");
            deleted += batch.len().saturating_sub(failed.len());
            errors.extend(failed);
        }
    }

    debug!(%prefix, deleted, failed = errors.len(), "Prefix processed");
    Ok(errors)
}
