//! Collaborator interfaces.
//!
//! The lifecycle core drives three external capabilities through these
//! traits: a persistence engine that opens a store at a schema, a file
//! system for the backup copy, and a cloud account probe. The crate ships
//! [`StdFileSystem`] and [`NoCloudAccount`]; engines live in
//! [`databases`](crate::databases).

mod traits;

pub use traits::{CloudAccount, FileSystem, PersistenceEngine};

use crate::errors::{LifecycleError, LifecycleResult};
use crate::schema::VersionedSchema;
use std::fs;
use std::io;
use std::path::Path;

/// [`FileSystem`] over `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

/// A [`CloudAccount`] that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCloudAccount;

impl CloudAccount for NoCloudAccount {
    fn cloud_account_available(&self) -> bool {
        false
    }

    fn push_schema(&self, schema: &VersionedSchema) -> LifecycleResult<()> {
        Err(LifecycleError::NotImplemented(format!(
            "pushing {} without a cloud account",
            schema.version_string()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaVersion;

    #[test]
    fn std_file_system_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = StdFileSystem;
        let nested = dir.path().join("a/b");
        fs.create_dir_all(&nested).unwrap();

        let source = nested.join("store");
        std::fs::write(&source, b"records").unwrap();
        let copy = nested.join("copy");

        assert_eq!(fs.copy_file(&source, &copy).unwrap(), 7);
        assert!(fs.file_exists(&copy));
        assert!(!fs.file_exists(&nested), "directories are not files");
        fs.remove_file(&copy).unwrap();
        assert!(!fs.file_exists(&copy));
    }

    #[test]
    fn no_cloud_account_is_unavailable() {
        let cloud = NoCloudAccount;
        assert!(!cloud.cloud_account_available());
        assert!(matches!(
            cloud.push_schema(&VersionedSchema::new("App", SchemaVersion::new(1, 0, 0))),
            Err(LifecycleError::NotImplemented(_))
        ));
    }
}
