//! Error taxonomy for a cleanup run.
//!
//! Every variant except [`CleanupError::DeleteFailures`] aborts the run as
//! soon as it occurs. Per-key delete failures are accumulated across all
//! selected prefixes and only surface once every prefix has been attempted.

use crate::{models::object::DeleteError, services::storage_client::StorageError};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanupError {
    /// Bad input or credentials, detected before any storage call.
    #[error("{0}")]
    Config(String),

    #[error("Error getting folder list from bucket `{bucket}`: {source}")]
    Listing {
        bucket: String,
        #[source]
        source: StorageError,
    },

    #[error("Error getting folder list sorted by timestamp. Error occurred on prefix {prefix}: {reason}")]
    Resolution { prefix: String, reason: String },

    #[error("{stage} {prefix}: {source}")]
    DeleteTransport {
        stage: DeleteStage,
        prefix: String,
        #[source]
        source: StorageError,
    },

    #[error("{} object(s) could not be deleted", .errors.len())]
    DeleteFailures { errors: Vec<DeleteError> },
}

pub type CleanupResult<T> = Result<T, CleanupError>;

/// Which request of a prefix deletion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStage {
    /// Listing the keys under the prefix.
    FetchKeys,
    /// A delete-batch request.
    DeleteBatch,
}

impl fmt::Display for DeleteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FetchKeys => "Unable to fetch keys for prefix",
            Self::DeleteBatch => "There was an error deleting objects for prefix",
        })
    }
}

impl CleanupError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Lines to print before exiting with a failure status.
    ///
    /// Fatal errors produce a single diagnostic; accumulated per-key failures
    /// produce one line per key.
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            Self::DeleteFailures { errors } => errors.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }
}
