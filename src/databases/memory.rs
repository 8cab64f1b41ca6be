//! In-memory engine, file system and cloud account.
//!
//! The three pieces share state through cheap clones, so a preview or test
//! can hand one clone to a container and keep another to inspect and script
//! it. The engine keeps each store as a file in a [`MemoryFileSystem`]
//! whose contents are the store's schema version; backup and restore
//! therefore move versions around exactly as they would move real files.

use super::apply_plan;
use crate::backend::{CloudAccount, FileSystem, PersistenceEngine};
use crate::errors::{EngineError, EngineResult, LifecycleError, LifecycleResult};
use crate::logging::Logger;
use crate::migration::MigrationPlan;
use crate::schema::{SchemaVersion, VersionedSchema};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`FileSystem`] kept in a shared map.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    fail_copies: Arc<AtomicBool>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        lock(&self.files).insert(path.into(), contents.into());
    }

    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        lock(&self.files).get(path).cloned()
    }

    /// Makes every following copy fail with an I/O error.
    pub fn fail_copies(&self, fail: bool) {
        self.fail_copies.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        lock(&self.files).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileSystem for MemoryFileSystem {
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        if self.fail_copies.load(Ordering::SeqCst) {
            return Err(io::Error::other(format!(
                "copy of {} refused",
                from.display()
            )));
        }
        let mut files = lock(&self.files);
        let contents = files.get(from).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", from.display()))
        })?;
        let len = contents.len() as u64;
        files.insert(to.to_path_buf(), contents);
        Ok(len)
    }

    fn file_exists(&self, path: &Path) -> bool {
        lock(&self.files).contains_key(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        lock(&self.files)
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
            })
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// One call to [`MemoryEngine::open_store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAttempt {
    pub version: SchemaVersion,
    pub cloud_sync: bool,
    pub location: PathBuf,
}

/// Handle returned by [`MemoryEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    pub schema: SchemaVersion,
    pub cloud_sync: bool,
    pub location: PathBuf,
}

#[derive(Debug, Default)]
struct EngineScript {
    failing: HashSet<SchemaVersion>,
    fail_with_cloud_sync: bool,
    attempts: Vec<OpenAttempt>,
}

/// A scriptable [`PersistenceEngine`].
///
/// Opening records an [`OpenAttempt`], then fails if the version was marked
/// with [`fail_at`](Self::fail_at) (or cloud sync was requested after
/// [`fail_with_cloud_sync`](Self::fail_with_cloud_sync)). Otherwise it
/// follows the plan like any engine and writes the resulting version into
/// the store file.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    files: MemoryFileSystem,
    script: Arc<Mutex<EngineScript>>,
    logger: Logger,
}

impl MemoryEngine {
    pub fn new(files: MemoryFileSystem, logger: &Logger) -> Self {
        Self {
            files,
            script: Arc::default(),
            logger: logger.category("lifecycle.engine.memory"),
        }
    }

    pub fn files(&self) -> &MemoryFileSystem {
        &self.files
    }

    /// Makes opening at `version` fail.
    pub fn fail_at(&self, version: SchemaVersion) -> &Self {
        lock(&self.script).failing.insert(version);
        self
    }

    pub fn fail_with_cloud_sync(&self) -> &Self {
        lock(&self.script).fail_with_cloud_sync = true;
        self
    }

    pub fn attempts(&self) -> Vec<OpenAttempt> {
        lock(&self.script).attempts.clone()
    }

    /// Version recorded in the store file at `location`.
    pub fn stored_version(&self, location: &Path) -> Option<SchemaVersion> {
        let bytes = self.files.read(location)?;
        String::from_utf8(bytes).ok()?.parse().ok()
    }
}

impl PersistenceEngine for MemoryEngine {
    type Handle = MemoryStore;

    fn open_store(
        &self,
        schema: &VersionedSchema,
        plan: &MigrationPlan,
        location: &Path,
        cloud_sync: bool,
    ) -> EngineResult<MemoryStore> {
        {
            let mut script = lock(&self.script);
            script.attempts.push(OpenAttempt {
                version: schema.version,
                cloud_sync,
                location: location.to_path_buf(),
            });
            if script.failing.contains(&schema.version) {
                return Err(EngineError::Other(format!(
                    "{} cannot be opened",
                    schema.version_string()
                )));
            }
            if cloud_sync && script.fail_with_cloud_sync {
                return Err(EngineError::Other("cloud sync could not be enabled".into()));
            }
        }

        let stored = self.stored_version(location);
        apply_plan(plan, stored, schema.version, location, &self.logger, |version| {
            self.files.write(location, version.to_string());
            Ok(())
        })?;

        Ok(MemoryStore {
            schema: schema.version,
            cloud_sync,
            location: location.to_path_buf(),
        })
    }
}

/// A [`CloudAccount`] whose availability is set by hand.
#[derive(Debug, Clone, Default)]
pub struct MemoryCloudAccount {
    available: Arc<AtomicBool>,
    pushed: Arc<Mutex<Vec<SchemaVersion>>>,
}

impl MemoryCloudAccount {
    pub fn available() -> Self {
        let account = Self::default();
        account.set_available(true);
        account
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Versions pushed so far, oldest first.
    pub fn pushed(&self) -> Vec<SchemaVersion> {
        lock(&self.pushed).clone()
    }
}

impl CloudAccount for MemoryCloudAccount {
    fn cloud_account_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn push_schema(&self, schema: &VersionedSchema) -> LifecycleResult<()> {
        if !self.cloud_account_available() {
            return Err(LifecycleError::SetupFailed(format!(
                "no cloud account to push {} to",
                schema.version_string()
            )));
        }
        lock(&self.pushed).push(schema.version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{HookContext, HookError, MigrationDirection, MigrationStage};
    use std::sync::atomic::AtomicUsize;

    const V1: SchemaVersion = SchemaVersion::new(1, 0, 0);
    const V2: SchemaVersion = SchemaVersion::new(2, 0, 0);

    fn schemas() -> Vec<VersionedSchema> {
        vec![VersionedSchema::new("App", V1), VersionedSchema::new("App", V2)]
    }

    #[test]
    fn copy_requires_a_source() {
        let files = MemoryFileSystem::new();
        let err = files
            .copy_file(Path::new("/missing"), Path::new("/copy"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        files.write("/store", "1.0.0");
        assert_eq!(files.copy_file(Path::new("/store"), Path::new("/copy")).unwrap(), 5);
        assert_eq!(files.read(Path::new("/copy")).unwrap(), b"1.0.0");

        files.fail_copies(true);
        assert!(files.copy_file(Path::new("/store"), Path::new("/copy")).is_err());
    }

    #[test]
    fn custom_stage_hooks_run_around_the_step() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (before, after) = (calls.clone(), calls.clone());
        let plan = MigrationPlan::new(
            schemas(),
            vec![MigrationStage::custom_with_hooks(
                V1,
                V2,
                Some(Arc::new(move |ctx: &HookContext| -> Result<(), HookError> {
                    assert_eq!(ctx.to, V2);
                    before.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })),
                Some(Arc::new(move |_: &HookContext| -> Result<(), HookError> {
                    after.fetch_add(10, Ordering::SeqCst);
                    Ok(())
                })),
            )],
            MigrationDirection::Forward,
        );

        let engine = MemoryEngine::new(MemoryFileSystem::new(), &Logger::new("tests", "memory"));
        let location = Path::new("/stores/app.store");
        engine.files().write(location, "1.0.0");

        let store = engine.open_store(&schemas()[1], &plan, location, false).unwrap();
        assert_eq!(store.schema, V2);
        assert_eq!(calls.load(Ordering::SeqCst), 11);
        assert_eq!(engine.stored_version(location), Some(V2));
    }

    #[test]
    fn scripted_failures_are_recorded() {
        let engine = MemoryEngine::new(MemoryFileSystem::new(), &Logger::new("tests", "memory"));
        engine.fail_at(V2).fail_with_cloud_sync();
        let plan = MigrationPlan::new(schemas(), vec![], MigrationDirection::Forward);
        let location = Path::new("/stores/app.store");

        assert!(engine.open_store(&schemas()[1], &plan, location, false).is_err());
        assert!(engine.open_store(&schemas()[0], &plan, location, true).is_err());
        assert!(engine.open_store(&schemas()[0], &plan, location, false).is_ok());

        let attempts: Vec<_> = engine
            .attempts()
            .into_iter()
            .map(|a| (a.version, a.cloud_sync))
            .collect();
        assert_eq!(attempts, vec![(V2, false), (V1, true), (V1, false)]);
    }

    #[test]
    fn cloud_account_records_pushes() {
        let account = MemoryCloudAccount::default();
        assert!(account.push_schema(&schemas()[0]).is_err());
        account.set_available(true);
        account.push_schema(&schemas()[1]).unwrap();
        assert_eq!(account.pushed(), vec![V2]);
    }
}
