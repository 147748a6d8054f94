use std::io;

use thiserror::Error;

use crate::types::BatchReport;

/// Failure reported by an [`ObjectStorage`](crate::storage::ObjectStorage) backend.
///
/// Backends normalise their own error shapes into this enum once, so the
/// enumerator and dispatcher only ever match on these variants.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service error {code}: {message}")]
    Service { code: String, message: String },

    #[error("object not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("failed to retrieve page no. {page}")]
    Page {
        page: usize,
        #[source]
        source: StorageError,
    },

    #[error("invalid URL-encoded key {raw:?}")]
    KeyDecode { raw: String },
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("response has no body")]
    MissingBody,

    #[error("key does not map to a file inside the destination: {0:?}")]
    UnsafeName(String),

    #[error("local write failed: {0}")]
    Io(#[from] io::Error),

    #[error("download task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not create destination directory: {0}")]
    Destination(#[source] io::Error),

    #[error("listing aborted after {} dispatched downloads", .partial.total)]
    Enumeration {
        #[source]
        source: EnumerationError,
        partial: BatchReport,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("AWS_ACCESS_KEY and AWS_SECRET_KEY must be provided together")]
    PartialCredentials,

    #[error("page size must be between 1 and {max}, got {got}")]
    PageSize { got: i32, max: i32 },

    #[error("invalid include pattern {pattern:?}: {message}")]
    IncludePattern { pattern: String, message: String },

    #[error("invalid endpoint {endpoint:?}: {message}")]
    Endpoint { endpoint: String, message: String },
}
