use crate::backend::FileSystem;
use crate::errors::{LifecycleError, LifecycleResult};
use crate::logging::Logger;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Keeps a single backup copy next to the store file.
///
/// Every backup overwrites the previous one; restore copies it back over
/// the store.
pub struct BackupManager {
    files: Arc<dyn FileSystem>,
    store_path: PathBuf,
    backup_path: PathBuf,
    logger: Logger,
}

impl BackupManager {
    pub fn new(
        files: Arc<dyn FileSystem>,
        store_path: PathBuf,
        backup_path: PathBuf,
        logger: &Logger,
    ) -> Self {
        Self {
            files,
            store_path,
            backup_path,
            logger: logger.category("lifecycle.backup"),
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn has_backup(&self) -> bool {
        self.files.file_exists(&self.backup_path)
    }

    /// Copies the store over the backup.
    ///
    /// Returns `Ok(None)` without touching anything when there is no store
    /// yet, and the number of bytes copied otherwise.
    pub fn backup(&self) -> LifecycleResult<Option<u64>> {
        if !self.files.file_exists(&self.store_path) {
            self.logger.notice(format!(
                "No store at {}, nothing to back up",
                self.store_path.display()
            ));
            return Ok(None);
        }

        let copied = self
            .replace(&self.store_path, &self.backup_path)
            .map_err(|e| {
                self.logger.error(format!("Backup failed: {e}"));
                LifecycleError::BackupFailed(e.to_string())
            })?;
        self.logger.info(format!(
            "Backed up {} bytes to {}",
            copied,
            self.backup_path.display()
        ));
        Ok(Some(copied))
    }

    /// Copies the backup over the store.
    pub fn restore(&self) -> LifecycleResult<u64> {
        if !self.has_backup() {
            return Err(self.missing_backup());
        }

        let copied = self
            .replace(&self.backup_path, &self.store_path)
            .map_err(|e| {
                self.logger.error(format!("Restore failed: {e}"));
                LifecycleError::RestoreFailed(e.to_string())
            })?;
        self.logger.info(format!(
            "Restored {} bytes to {}",
            copied,
            self.store_path.display()
        ));
        Ok(copied)
    }

    pub(crate) fn missing_backup(&self) -> LifecycleError {
        self.logger.error(format!(
            "No backup found at {}",
            self.backup_path.display()
        ));
        LifecycleError::RestoreFailed(format!(
            "no backup found at {}",
            self.backup_path.display()
        ))
    }

    fn replace(&self, from: &Path, to: &Path) -> std::io::Result<u64> {
        if let Some(parent) = to.parent() {
            self.files.create_dir_all(parent)?;
        }
        if self.files.file_exists(to) {
            self.files.remove_file(to)?;
        }
        self.files.copy_file(from, to)
    }
}
