//! Error types for lifecycle operations.
//!
//! Two layers of errors exist. [`LifecycleError`] is what the public API
//! returns: every variant carries a human-readable cause string rather than a
//! wrapped error so errors can be cloned and compared in tests.
//! [`EngineError`] is the error type of persistence engines and file
//! collaborators; it is stringified when it crosses into a `LifecycleError`.
//!
//! # Example
//!
//! ```
//! use netabase_lifecycle::errors::{LifecycleError, LifecycleResult};
//!
//! fn open() -> LifecycleResult<()> {
//!     Err(LifecycleError::SetupFailed("disk full".into()))
//! }
//!
//! assert_eq!(open(), Err(LifecycleError::SetupFailed("disk full".into())));
//! ```

use crate::schema::SchemaVersion;
use thiserror::Error;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The target schema is missing from the plan's catalog, the catalog is
    /// malformed, or a schema fails cloud-structural validation.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The stage chain breaks an ordering, contiguity, duplicate or direction rule.
    #[error("Invalid migration plan: {0}")]
    InvalidMigrationPlan(String),

    /// Opening the store failed and no rollback attempt succeeded.
    #[error("Setup failed: {0}")]
    SetupFailed(String),

    #[error("Backup failed: {0}")]
    BackupFailed(String),

    #[error("Restore failed: {0}")]
    RestoreFailed(String),

    /// A path that exists in the API but has no implementation behind it.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Another setup, backup or restore holds the container.
    #[error("Container is busy with another operation")]
    Busy,
}

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[cfg(feature = "redb")]
    #[error(transparent)]
    RedbError(#[from] RedbError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    EncodeError(#[from] bincode::error::EncodeError),

    #[error(transparent)]
    DecodeError(#[from] bincode::error::DecodeError),

    /// The store on disk is at a version the plan cannot carry to the requested one.
    #[error("Store is at schema v{stored} and cannot be opened at v{requested}")]
    IncompatibleStore {
        stored: SchemaVersion,
        requested: SchemaVersion,
    },

    #[error("Migration hook failed: {0}")]
    HookFailed(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "redb")]
#[derive(Error, Debug)]
pub enum RedbError {
    #[error(transparent)]
    DatabaseError(#[from] redb::DatabaseError),
    #[error(transparent)]
    TransactionError(#[from] redb::TransactionError),
    #[error(transparent)]
    TableError(#[from] redb::TableError),
    #[error(transparent)]
    CommitError(#[from] redb::CommitError),
    #[error(transparent)]
    StorageError(#[from] redb::StorageError),
}

#[cfg(feature = "redb")]
macro_rules! impl_from_redb {
    ($($err:ty => $variant:ident),*) => {
        $(
            impl From<$err> for EngineError {
                fn from(err: $err) -> Self {
                    EngineError::RedbError(RedbError::$variant(err))
                }
            }
        )*
    };
}

#[cfg(feature = "redb")]
impl_from_redb!(
    redb::DatabaseError => DatabaseError,
    redb::TransactionError => TransactionError,
    redb::TableError => TableError,
    redb::CommitError => CommitError,
    redb::StorageError => StorageError
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_compare_by_cause() {
        assert_eq!(
            LifecycleError::InvalidSchema("v3 missing".into()),
            LifecycleError::InvalidSchema("v3 missing".into())
        );
        assert_ne!(
            LifecycleError::InvalidSchema("v3 missing".into()),
            LifecycleError::InvalidMigrationPlan("v3 missing".into())
        );
    }

    #[test]
    fn incompatible_store_message_names_both_versions() {
        let err = EngineError::IncompatibleStore {
            stored: SchemaVersion::new(3, 0, 0),
            requested: SchemaVersion::new(1, 2, 0),
        };
        assert_eq!(
            err.to_string(),
            "Store is at schema v3.0.0 and cannot be opened at v1.2.0"
        );
    }
}
