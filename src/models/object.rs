//! Represents objects seen while listing, and objects that failed to delete.

use chrono::{DateTime, Utc};
use std::fmt;

/// A single object returned by a bucket listing.
///
/// Only the fields the cleanup needs are kept: the key to delete it by and
/// the modification time used to date its deployment folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Timestamp when object was last modified.
    pub last_modified: DateTime<Utc>,
}

/// A key that the storage service refused to delete inside an otherwise
/// successful batch request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteError {
    /// Key of the object that is still present.
    pub key: String,

    /// Message reported by the storage service.
    pub message: String,
}

impl DeleteError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DeleteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Deleting key {} produced error: {}",
            self.key, self.message
        )
    }
}
