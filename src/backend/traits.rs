//! Collaborator trait definitions.
//!
//! These traits define what the lifecycle core needs from the host
//! persistence layer. Implementations are free to block; the container
//! calls them while holding its operation lock.

use crate::errors::{EngineResult, LifecycleResult};
use crate::migration::MigrationPlan;
use crate::schema::VersionedSchema;
use std::io;
use std::path::Path;

/// Opens or creates a store at a schema.
///
/// The engine owns the actual migration of records: given the plan it is
/// expected to carry an existing store to `schema`, running the hooks of any
/// custom stages, or fail without installing anything.
pub trait PersistenceEngine: Send + Sync {
    /// Handle to an open store.
    type Handle: Send;

    fn open_store(
        &self,
        schema: &VersionedSchema,
        plan: &MigrationPlan,
        location: &Path,
        cloud_sync: bool,
    ) -> EngineResult<Self::Handle>;
}

/// The file operations backup and restore need.
pub trait FileSystem: Send + Sync {
    /// Copies `from` over `to`, returning the number of bytes copied.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;

    fn file_exists(&self, path: &Path) -> bool;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Access to the cloud account the store replicates through.
pub trait CloudAccount: Send + Sync {
    /// Whether a usable account exists. Never fails; problems read as `false`.
    fn cloud_account_available(&self) -> bool;

    /// Publishes `schema` to the replication service.
    fn push_schema(&self, schema: &VersionedSchema) -> LifecycleResult<()>;
}
