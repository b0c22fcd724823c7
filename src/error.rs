// Typed errors for the library seams.
// Application plumbing (tracker, CLI) wraps these in anyhow.

use crate::models::RecordKind;

/// Whole-file CSV problems. Either one aborts an import with no mutation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("CSV file is empty")]
    Empty,

    #[error("invalid CSV format: first header must be `RecordType`, found `{found}`")]
    InvalidHeader { found: String },
}

/// Record store lookups that did not hit a record
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} index {index} is out of bounds ({len} records)")]
    IndexOutOfBounds {
        kind: RecordKind,
        index: usize,
        len: usize,
    },

    #[error("no {kind} with id {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("id prefix `{prefix}` matches {matches} {kind} records")]
    AmbiguousId {
        kind: RecordKind,
        prefix: String,
        matches: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored value under `{key}` is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown filter mode `{0}` (expected all, daily, weekly, monthly or yearly)")]
pub struct UnknownFilterMode(pub String);
