//! The lifecycle container.
//!
//! A [`Container`] owns one store: it validates the configuration at
//! construction, then brings the store up with [`Container::setup`], which
//! backs up the existing file, probes the cloud account, opens the store at
//! the target schema and, when allowed, rolls back through earlier schemas
//! until one opens.
//!
//! ```
//! use netabase_lifecycle::prelude::*;
//! use netabase_lifecycle::databases::memory::{MemoryCloudAccount, MemoryEngine, MemoryFileSystem};
//!
//! let v1 = SchemaVersion::new(1, 0, 0);
//! let v2 = SchemaVersion::new(2, 0, 0);
//! let target = VersionedSchema::new("Notes", v2);
//! let configuration = StoreConfiguration::builder()
//!     .identifier("com.example.notes")
//!     .name("notes")
//!     .schema(target.clone())
//!     .plan(MigrationPlan::new(
//!         vec![VersionedSchema::new("Notes", v1), target],
//!         vec![MigrationStage::lightweight(v1, v2)],
//!         MigrationDirection::Forward,
//!     ))
//!     .build();
//!
//! let logger = Logger::new("com.example.notes", "lifecycle");
//! let engine = MemoryEngine::new(MemoryFileSystem::new(), &logger);
//! engine.fail_at(v2);
//! let container = Container::with_collaborators(
//!     configuration,
//!     ContainerConfig::new("/notes"),
//!     engine.clone(),
//!     engine.files().clone(),
//!     MemoryCloudAccount::default(),
//! )
//! .unwrap();
//!
//! container.setup(true).unwrap();
//! assert_eq!(container.state(), SetupState::Ready);
//! assert_eq!(container.active_version(), Some(v1));
//! ```

mod analytics;
mod backup;
mod cloud;

pub use analytics::{Analytics, MAX_OPERATION_EVENTS, MetricValue, OperationEvent};
pub use backup::BackupManager;
pub use cloud::CloudManager;

use crate::backend::{CloudAccount, FileSystem, NoCloudAccount, PersistenceEngine, StdFileSystem};
use crate::config::ContainerConfig;
use crate::configuration::Configuration;
use crate::errors::{LifecycleError, LifecycleResult};
use crate::logging::Logger;
use crate::schema::{SchemaVersion, VersionedSchema};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use strum::{AsRefStr, Display, EnumString};

/// Where a container is in its setup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SetupState {
    #[default]
    Unconfigured,
    Validating,
    BackingUp,
    ProbingCloud,
    OpeningStore,
    Ready,
    Failed,
}

struct Slot<H> {
    state: SetupState,
    handle: Option<H>,
    active_version: Option<SchemaVersion>,
    cloud_sync: bool,
}

impl<H> Slot<H> {
    fn release(&mut self) -> bool {
        self.active_version = None;
        self.cloud_sync = false;
        self.handle.take().is_some()
    }
}

struct Opened<H> {
    handle: H,
    version: SchemaVersion,
    cloud_sync: bool,
    rollback_depth: u64,
}

/// Owns one store and runs its setup, backup and restore.
///
/// All three operations take the same lock for their whole duration, so at
/// most one runs at a time; the plain methods wait for it, the `try_`
/// variants return [`LifecycleError::Busy`] instead.
pub struct Container<E: PersistenceEngine> {
    configuration: Arc<dyn Configuration>,
    settings: ContainerConfig,
    store_path: PathBuf,
    engine: E,
    backup: BackupManager,
    cloud: CloudManager,
    analytics: Analytics,
    logger: Logger,
    slot: Mutex<Slot<E::Handle>>,
}

impl<E: PersistenceEngine> Container<E> {
    /// A container over the real file system and no cloud account.
    pub fn new<C: Configuration + 'static>(
        configuration: C,
        settings: ContainerConfig,
        engine: E,
    ) -> LifecycleResult<Self> {
        Self::with_collaborators(configuration, settings, engine, StdFileSystem, NoCloudAccount)
    }

    /// Validates `configuration` and builds a container around it.
    ///
    /// Nothing is created when validation fails.
    pub fn with_collaborators<C, F, A>(
        configuration: C,
        settings: ContainerConfig,
        engine: E,
        files: F,
        cloud: A,
    ) -> LifecycleResult<Self>
    where
        C: Configuration + 'static,
        F: FileSystem + 'static,
        A: CloudAccount + 'static,
    {
        let logger = Logger::new(configuration.identifier(), "lifecycle");
        configuration.validate(&logger)?;

        let store_path = settings.store_path(configuration.name());
        let backup = BackupManager::new(
            Arc::new(files),
            store_path.clone(),
            settings.backup_path(),
            &logger,
        );
        let cloud = CloudManager::new(
            Box::new(cloud),
            configuration.cloud_container().map(str::to_string),
            &logger,
        );
        logger.info(format!(
            "Container for {} configured at {}",
            configuration.schema().version_string(),
            store_path.display()
        ));

        Ok(Self {
            configuration: Arc::new(configuration),
            analytics: Analytics::new(&logger),
            settings,
            store_path,
            engine,
            backup,
            cloud,
            logger,
            slot: Mutex::new(Slot {
                state: SetupState::Unconfigured,
                handle: None,
                active_version: None,
                cloud_sync: false,
            }),
        })
    }

    /// Brings the store up at the configured schema.
    ///
    /// Any previous handle is released first. With `allow_rollback`, a
    /// failed open is retried at each earlier schema of the plan, newest
    /// first and with cloud sync disabled, until one succeeds. When none
    /// does, the first failure is returned as
    /// [`SetupFailed`](LifecycleError::SetupFailed) and the container is
    /// left [`Failed`](SetupState::Failed) without a handle.
    pub fn setup(&self, allow_rollback: bool) -> LifecycleResult<()> {
        let mut slot = self.lock();
        self.run_setup(&mut slot, allow_rollback)
    }

    pub fn try_setup(&self, allow_rollback: bool) -> LifecycleResult<()> {
        let mut slot = self.try_lock()?;
        self.run_setup(&mut slot, allow_rollback)
    }

    /// [`setup`](Self::setup) with the rollback setting of the
    /// container's [`ContainerConfig`].
    pub fn start(&self) -> LifecycleResult<()> {
        self.setup(self.settings.allow_rollback)
    }

    /// Copies the store file over the backup. `Ok(None)` when there is no
    /// store file yet.
    pub fn backup(&self) -> LifecycleResult<Option<u64>> {
        let _slot = self.lock();
        self.run_backup()
    }

    pub fn try_backup(&self) -> LifecycleResult<Option<u64>> {
        let _slot = self.try_lock()?;
        self.run_backup()
    }

    /// Releases the store and copies the backup over the store file.
    ///
    /// The container returns to [`Unconfigured`](SetupState::Unconfigured);
    /// call [`setup`](Self::setup) again to reopen. Without a backup the
    /// open store and its state are left as they were.
    pub fn restore(&self) -> LifecycleResult<u64> {
        let mut slot = self.lock();
        self.run_restore(&mut slot)
    }

    pub fn try_restore(&self) -> LifecycleResult<u64> {
        let mut slot = self.try_lock()?;
        self.run_restore(&mut slot)
    }

    pub fn state(&self) -> SetupState {
        self.lock().state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SetupState::Ready
    }

    /// The schema version the current handle was opened at.
    pub fn active_version(&self) -> Option<SchemaVersion> {
        self.lock().active_version
    }

    pub fn cloud_sync_enabled(&self) -> bool {
        self.lock().cloud_sync
    }

    /// Runs `f` against the open store, if there is one.
    pub fn with_store<R>(&self, f: impl FnOnce(&E::Handle) -> R) -> Option<R> {
        self.lock().handle.as_ref().map(f)
    }

    pub fn store(&self) -> Option<E::Handle>
    where
        E::Handle: Clone,
    {
        self.lock().handle.clone()
    }

    pub fn configuration(&self) -> &dyn Configuration {
        self.configuration.as_ref()
    }

    pub fn settings(&self) -> &ContainerConfig {
        &self.settings
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn backup_path(&self) -> &Path {
        self.backup.backup_path()
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    fn lock(&self) -> MutexGuard<'_, Slot<E::Handle>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_lock(&self) -> LifecycleResult<MutexGuard<'_, Slot<E::Handle>>> {
        match self.slot.try_lock() {
            Ok(slot) => Ok(slot),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                self.logger.notice("Container busy, rejecting operation");
                Err(LifecycleError::Busy)
            }
        }
    }

    fn transition(&self, slot: &mut Slot<E::Handle>, state: SetupState) {
        self.logger.debug(format!("{} -> {}", slot.state, state));
        slot.state = state;
    }

    fn run_setup(&self, slot: &mut Slot<E::Handle>, allow_rollback: bool) -> LifecycleResult<()> {
        let started = Utc::now();
        self.analytics.track_operation("setup");
        self.logger.info(format!(
            "Setting up {}",
            self.configuration.schema().version_string()
        ));
        if slot.release() {
            self.logger.debug("Released previous store handle");
        }

        match self.bring_up(slot, allow_rollback) {
            Ok(opened) => {
                slot.handle = Some(opened.handle);
                slot.active_version = Some(opened.version);
                slot.cloud_sync = opened.cloud_sync;
                self.transition(slot, SetupState::Ready);

                let elapsed = (Utc::now() - started).num_milliseconds().max(0) as u64;
                self.analytics.record_metric("setup.duration_ms", elapsed);
                self.analytics
                    .record_metric("setup.rollback_depth", opened.rollback_depth);
                self.analytics.record_metric("setup.cloud_sync", opened.cloud_sync);
                self.logger.info(format!(
                    "Store ready at v{}{}",
                    opened.version,
                    if opened.cloud_sync { " with cloud sync" } else { "" }
                ));
                Ok(())
            }
            Err(cause) => {
                self.transition(slot, SetupState::Failed);
                self.logger.fault(format!("Failed to setup container: {cause}"));
                Err(LifecycleError::SetupFailed(cause))
            }
        }
    }

    fn bring_up(
        &self,
        slot: &mut Slot<E::Handle>,
        allow_rollback: bool,
    ) -> Result<Opened<E::Handle>, String> {
        let target = self.configuration.schema();

        self.transition(slot, SetupState::Validating);
        self.configuration
            .validate(&self.logger)
            .map_err(|e| e.to_string())?;

        self.transition(slot, SetupState::BackingUp);
        if let Some(bytes) = self.backup.backup().map_err(|e| e.to_string())? {
            self.analytics.record_metric("backup.bytes", bytes);
        }

        self.transition(slot, SetupState::ProbingCloud);
        let cloud_sync = self.cloud.check_availability();
        if cloud_sync {
            self.cloud
                .initialize_schema(target)
                .map_err(|e| e.to_string())?;
        }

        self.transition(slot, SetupState::OpeningStore);
        self.open_with_rollback(target, cloud_sync, allow_rollback)
    }

    fn open_with_rollback(
        &self,
        target: &VersionedSchema,
        cloud_sync: bool,
        allow_rollback: bool,
    ) -> Result<Opened<E::Handle>, String> {
        let plan = self.configuration.plan();
        let mut schema = target;
        let mut cloud_sync = cloud_sync;
        let mut rollback_depth = 0;
        let mut first_failure = None;

        loop {
            self.logger.debug(format!("Opening store at {}", schema.version_string()));
            match self
                .engine
                .open_store(schema, plan, &self.store_path, cloud_sync)
            {
                Ok(handle) => {
                    if rollback_depth > 0 {
                        self.logger.notice(format!(
                            "Rolled back to {} after {} failed attempt(s)",
                            schema.version_string(),
                            rollback_depth
                        ));
                    }
                    return Ok(Opened {
                        handle,
                        version: schema.version,
                        cloud_sync,
                        rollback_depth,
                    });
                }
                Err(err) => {
                    self.logger.error(format!(
                        "Failed to open store at {}: {err}",
                        schema.version_string()
                    ));
                    if first_failure.is_none() {
                        first_failure = Some(err.to_string());
                    }
                }
            }

            if !allow_rollback {
                break;
            }
            let Some(previous) = plan.previous_schema(schema.version) else {
                self.logger.error("No earlier schema left to roll back to");
                break;
            };
            self.logger.info(format!(
                "Rolling back to {} without cloud sync",
                previous.version_string()
            ));
            schema = previous;
            cloud_sync = false;
            rollback_depth += 1;
        }

        Err(first_failure.unwrap_or_default())
    }

    fn run_backup(&self) -> LifecycleResult<Option<u64>> {
        self.analytics.track_operation("backup");
        let copied = self.backup.backup()?;
        if let Some(bytes) = copied {
            self.analytics.record_metric("backup.bytes", bytes);
        }
        Ok(copied)
    }

    fn run_restore(&self, slot: &mut Slot<E::Handle>) -> LifecycleResult<u64> {
        self.analytics.track_operation("restore");
        if !self.backup.has_backup() {
            return Err(self.backup.missing_backup());
        }
        if slot.release() {
            self.logger.debug("Released store handle for restore");
        }
        self.transition(slot, SetupState::Unconfigured);
        self.backup.restore()
    }
}
