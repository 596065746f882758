//! # Domain Errors
//!
//! Error types for the validator protection database.
//!
//! ## Taxonomy
//!
//! - `CodecError` - a history buffer violates the layout invariant. Always a
//!   data-corruption or programming signal, never retried.
//! - `KVStoreError` - the underlying key-value backend failed.
//! - `DbError` - everything the database surfaces to callers, including
//!   migration failures wrapping any of the above.

use thiserror::Error;

/// Encoded history layout violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Buffer shorter than the header or not header + k * entry bytes long.
    #[error("malformed encoded history: {len} bytes is not {header} + k * {entry}")]
    MalformedEncoding {
        len: usize,
        header: usize,
        entry: usize,
    },
}

/// Key-value backend errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// Backend I/O failure.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// The backend could not be opened.
    #[error("KV store could not be opened: {message}")]
    OpenFailed { message: String },
}

/// Errors surfaced by the validator database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    /// Stored history failed layout validation.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Storage backend fault.
    #[error("storage fault: {0}")]
    Storage(#[from] KVStoreError),

    /// A stored record could not be (de)serialized.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// A stored scalar had the wrong width.
    #[error("corrupt record in bucket {bucket}: expected {expected} bytes, found {found}")]
    CorruptRecord {
        bucket: &'static str,
        expected: usize,
        found: usize,
    },

    /// The data directory is held by another process.
    #[error("database lock: {message}")]
    Lock { message: String },

    /// Migration aborted; the completion marker was not written.
    #[error("attestation history migration failed: {source}")]
    Migration {
        #[source]
        source: Box<DbError>,
    },
}

impl DbError {
    /// Wrap an error raised while migrating legacy history.
    pub fn migration(source: DbError) -> Self {
        DbError::Migration {
            source: Box::new(source),
        }
    }
}

impl From<bincode::Error> for DbError {
    fn from(err: bincode::Error) -> Self {
        DbError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_wraps_source() {
        let inner = DbError::Storage(KVStoreError::IOError {
            message: "disk gone".into(),
        });
        let err = DbError::migration(inner.clone());
        match &err {
            DbError::Migration { source } => assert_eq!(**source, inner),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::MalformedEncoding {
            len: 9,
            header: 8,
            entry: 40,
        };
        assert_eq!(
            err.to_string(),
            "malformed encoded history: 9 bytes is not 8 + k * 40"
        );
    }
}
