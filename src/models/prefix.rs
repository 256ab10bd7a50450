//! Represents deployment "folders": first-level common prefixes of a bucket.

use chrono::{DateTime, Utc};
use std::fmt;

/// A key prefix ending in the listing delimiter, treated as one deployment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix(String);

impl Prefix {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Prefix {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A prefix dated by the last-modified time of one sampled object under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixTimestamp {
    pub prefix: Prefix,
    pub last_modified: DateTime<Utc>,
}

impl PrefixTimestamp {
    pub fn new(prefix: impl Into<Prefix>, last_modified: DateTime<Utc>) -> Self {
        Self {
            prefix: prefix.into(),
            last_modified,
        }
    }
}

/// Prefixes sorted newest first.
///
/// The sort is stable, so prefixes sharing a timestamp keep the order in
/// which they were listed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderedPrefixes(Vec<PrefixTimestamp>);

impl OrderedPrefixes {
    /// Order `entries` by timestamp descending.
    pub fn from_unordered(mut entries: Vec<PrefixTimestamp>) -> Self {
        entries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Self(entries)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrefixTimestamp> {
        self.0.iter()
    }
}

/// Prefixes selected for removal, in the same newest-first order as the
/// [`OrderedPrefixes`] they were drawn from.
pub type DeletionSet = Vec<Prefix>;
