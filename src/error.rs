//! # Error Types
//!
//! The closed error taxonomy for the backup engine. Each variant corresponds to
//! one of the failure kinds named by the storage contract: a store failure, a
//! semantic violation of the content-addressed model, or a filesystem error
//! surfaced while walking a source tree or writing a restored one.
//!
//! All write operations run inside a [`crate::store::Store`] transaction; any
//! variant here returned from within one triggers a rollback before the error
//! reaches the caller, so the database is never left mid-write.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for every fallible operation in the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying storage substrate failed (disk full, corruption, lock
    /// contention, or any other I/O failure reported by SQLite).
    #[error("store I/O error: {0}")]
    StoreIo(#[from] rusqlite::Error),

    /// The database was opened but its schema is absent or incompatible with
    /// this binary.
    #[error("schema error: {0}")]
    Schema(String),

    /// A snapshot id was referenced that does not exist.
    #[error("unknown snapshot: {0}")]
    UnknownSnapshot(i64),

    /// A `FileRef`'s hash has no corresponding row in `contents` — implies
    /// prior corruption or an external tamper.
    #[error("content missing for hash {0}")]
    MissingContent(String),

    /// A `contents` row's stored bytes do not hash to its `hash` column.
    #[error("content corrupt for hash {0}")]
    CorruptContent(String),

    /// A source or target filesystem operation failed.
    #[error("file I/O error at {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source entry could not be read because of a permission error, and the
    /// walker was not configured to skip unreadable files.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A file exceeded the configured size cap. Recoverable: the caller skips
    /// the file and continues the snapshot.
    #[error("file too large: {path} ({size} bytes, cap is {cap} bytes)")]
    TooLarge { path: PathBuf, size: u64, cap: u64 },

    /// A store-level integrity invariant was violated by a write. Indicates a
    /// bug in the engine or external tampering with the database file.
    #[error("constraint violated: {0}")]
    Constraint(String),
}

pub type Result<T> = std::result::Result<T, Error>;
