//! Error taxonomy for a batch run.
//!
//! [`SyncError`] is fatal and aborts the whole batch. [`GroupError`] is
//! recoverable: the batch driver records it and moves on to the next group.

use std::path::PathBuf;

use thiserror::Error;

use crate::contract::BoxError;
use crate::grouping::GroupKey;

/// Failures that stop the batch before or instead of any group processing.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to retrieve secret {secret_id}: {source}")]
    Secret {
        secret_id: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to connect to remote server: {0}")]
    Connection(#[source] BoxError),
    #[error("failed to list remote files: {0}")]
    Listing(#[source] BoxError),
}

/// A single group failed. Objects uploaded before the failure are kept in
/// `published`; they are not rolled back.
#[derive(Debug, Error)]
#[error("error processing group {key}: {kind}")]
pub struct GroupError {
    pub key: GroupKey,
    #[source]
    pub kind: GroupErrorKind,
    pub published: Vec<String>,
}

impl GroupError {
    pub fn new(key: GroupKey, kind: GroupErrorKind, published: Vec<String>) -> Self {
        Self {
            key,
            kind,
            published,
        }
    }

    pub fn is_size_violation(&self) -> bool {
        matches!(self.kind, GroupErrorKind::SizeLimitExceeded { .. })
    }
}

#[derive(Debug, Error)]
pub enum GroupErrorKind {
    #[error("failed to fetch {file}: {source}")]
    Fetch {
        file: String,
        #[source]
        source: BoxError,
    },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to extract {}: {source}", archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("archive {} contains no files", archive.display())]
    EmptyArchive { archive: PathBuf },
    /// Size policy violation, distinct from I/O failures.
    #[error("compressed artifact {artifact} is {size} bytes, exceeding the {limit} byte limit")]
    SizeLimitExceeded {
        artifact: String,
        size: u64,
        limit: u64,
    },
    #[error("failed to upload {object}: {source}")]
    Upload {
        object: String,
        #[source]
        source: BoxError,
    },
    #[error("remote name {0:?} is not a plain file name")]
    UnsafeName(String),
}
