//! Chooses which deployment folders to delete.

use crate::models::{
    policy::RetentionPolicy,
    prefix::{DeletionSet, OrderedPrefixes},
};
use chrono::NaiveDate;

/// Select the prefixes to delete from `ordered` (newest first).
///
/// The first `keep_count` prefixes are always kept. With the age test
/// disabled everything after them goes; otherwise a prefix past the floor is
/// only deleted when its timestamp is strictly before the policy cutoff for
/// `today`. The count is a minimum, so young prefixes past it survive.
///
/// Because the input is sorted by time, the result is always a trailing run
/// of `ordered`, in the same order.
pub fn select_for_deletion(
    ordered: &OrderedPrefixes,
    policy: &RetentionPolicy,
    today: NaiveDate,
) -> DeletionSet {
    let cutoff = policy.cutoff(today);

    ordered
        .iter()
        .skip(policy.keep_count)
        .filter(|entry| cutoff.is_none_or(|cutoff| entry.last_modified < cutoff))
        .map(|entry| entry.prefix.clone())
        .collect()
}
