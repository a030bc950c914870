//! Store error taxonomy

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Result of opening (or switching) the backing store
pub type OpenResult = Result<(), StoreError>;

/// Result of a mutation; the enclosing transaction is rolled back on `Err`
pub type MutationResult<T> = Result<T, StoreError>;

/// Errors that can occur while operating the tags store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tags database is not open")]
    NotOpen,

    #[error("failed to open tags database {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("schema statement failed `{statement}`: {source}")]
    Schema {
        statement: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("query failed: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("mutation failed: {0}")]
    Mutation(#[source] rusqlite::Error),

    #[error("storage I/O error or corruption: {0}")]
    Corruption(#[source] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Classify a query error, promoting I/O and corruption signatures
    pub fn query(err: rusqlite::Error) -> Self {
        if is_corruption(&err) {
            Self::Corruption(err)
        } else {
            Self::Query(err)
        }
    }

    /// Classify a mutation error, promoting I/O and corruption signatures
    pub fn mutation(err: rusqlite::Error) -> Self {
        if is_corruption(&err) {
            Self::Corruption(err)
        } else {
            Self::Mutation(err)
        }
    }

    /// Whether this error should trigger a reopen of the backing file
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption(_))
    }
}

fn is_corruption(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::SystemIoFailure | ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_io_error_is_classified_as_corruption() {
        let err = StoreError::query(sqlite_failure(rusqlite::ffi::SQLITE_IOERR));
        assert!(err.is_corruption());

        let err = StoreError::mutation(sqlite_failure(rusqlite::ffi::SQLITE_CORRUPT));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_constraint_error_keeps_its_category() {
        let err = StoreError::mutation(sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT));
        assert!(matches!(err, StoreError::Mutation(_)));

        let err = StoreError::query(rusqlite::Error::InvalidQuery);
        assert!(matches!(err, StoreError::Query(_)));
    }
}
