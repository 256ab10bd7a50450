//! CleanupService: one end-to-end retention run over a bucket.
//!
//! list prefixes -> date them -> select -> delete each selected prefix.
//! Structural failures abort immediately. Per-key delete failures are
//! gathered across every selected prefix and reported together at the end.

use crate::{
    errors::{CleanupError, CleanupResult},
    models::{policy::RetentionPolicy, prefix::Prefix},
    services::{
        bulk_deleter::delete_prefix, prefix_lister::list_prefixes, retention::select_for_deletion,
        storage_client::StorageClient, timestamp_resolver::resolve_timestamps,
    },
};
use chrono::{NaiveDate, Utc};
use tracing::info;

/// Delimiter that separates deployment folders from their contents.
pub const DEFAULT_DELIMITER: &str = "/";

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Number of prefixes found in the bucket.
    pub listed: usize,
    /// Prefixes whose objects were all removed.
    pub deleted_prefixes: Vec<Prefix>,
}

impl CleanupSummary {
    pub fn retained(&self) -> usize {
        self.listed - self.deleted_prefixes.len()
    }
}

pub struct CleanupService<C> {
    client: C,
    delimiter: String,
}

impl<C: StorageClient> CleanupService<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Apply `policy` to `bucket`, judging ages against today's UTC date.
    pub async fn run(&self, bucket: &str, policy: RetentionPolicy) -> CleanupResult<CleanupSummary> {
        self.run_on(bucket, policy, Utc::now().date_naive()).await
    }

    /// Apply `policy` to `bucket`, judging ages against `today`.
    ///
    /// Every selected prefix is attempted even when earlier ones reported
    /// per-key failures; those failures come back together as
    /// [`CleanupError::DeleteFailures`].
    pub async fn run_on(
        &self,
        bucket: &str,
        policy: RetentionPolicy,
        today: NaiveDate,
    ) -> CleanupResult<CleanupSummary> {
        info!(
            bucket,
            backend = self.client.backend_name(),
            keep_count = policy.keep_count,
            max_age_days = policy.max_age_days,
            "Starting deployment cleanup"
        );

        let prefixes = list_prefixes(&self.client, bucket, &self.delimiter).await?;
        let listed = prefixes.len();
        info!(bucket, count = listed, "Found deployment folders");

        let ordered = resolve_timestamps(&self.client, bucket, prefixes).await?;
        let selected = select_for_deletion(&ordered, &policy, today);
        info!(
            bucket,
            selected = selected.len(),
            retained = listed - selected.len(),
            "Selected deployment folders for deletion"
        );

        let mut errors = Vec::new();
        for prefix in &selected {
            info!("Deleting prefix {prefix}...");
            let failed = delete_prefix(&self.client, bucket, prefix).await?;
            errors.extend(failed);
        }

        if !errors.is_empty() {
            return Err(CleanupError::DeleteFailures { errors });
        }

        Ok(CleanupSummary {
            listed,
            deleted_prefixes: selected,
        })
    }
}
