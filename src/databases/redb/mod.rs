//! File-backed persistence engine over `redb`.
//!
//! The engine keeps the store's schema version in a metadata table. Opening
//! a store reads that version, lets the plan decide how to reach the
//! requested schema, and records every step it takes. Record transformation
//! itself happens inside the custom stages' hooks.

use super::apply_plan;
use crate::backend::PersistenceEngine;
use crate::errors::EngineResult;
use crate::logging::Logger;
use crate::migration::MigrationPlan;
use crate::schema::{SchemaVersion, VersionedSchema};
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Metadata table name for storing schema version information.
const SCHEMA_META_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("__netabase_lifecycle_schema_meta__");
const VERSION_KEY: &str = "version";

/// An open redb store.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<redb::Database>,
    schema: SchemaVersion,
    location: PathBuf,
    cloud_sync: bool,
}

impl RedbStore {
    /// The schema version the store was opened at.
    pub fn schema_version(&self) -> SchemaVersion {
        self.schema
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn cloud_sync(&self) -> bool {
        self.cloud_sync
    }

    /// The version recorded in the store's metadata table.
    pub fn stored_version(&self) -> EngineResult<Option<SchemaVersion>> {
        read_version(&self.db)
    }

    /// Get the raw database reference for advanced operations.
    pub fn raw_db(&self) -> &Arc<redb::Database> {
        &self.db
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("schema", &self.schema)
            .field("location", &self.location)
            .field("cloud_sync", &self.cloud_sync)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RedbEngine {
    logger: Logger,
}

impl RedbEngine {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.category("lifecycle.engine.redb"),
        }
    }
}

impl PersistenceEngine for RedbEngine {
    type Handle = RedbStore;

    fn open_store(
        &self,
        schema: &VersionedSchema,
        plan: &MigrationPlan,
        location: &Path,
        cloud_sync: bool,
    ) -> EngineResult<RedbStore> {
        if let Some(parent) = location.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(location)?;

        let stored = read_version(&db)?;
        apply_plan(plan, stored, schema.version, location, &self.logger, |version| {
            write_version(&db, version)
        })?;

        self.logger.debug(format!(
            "Opened {} at {}",
            schema.version_string(),
            location.display()
        ));
        Ok(RedbStore {
            db: Arc::new(db),
            schema: schema.version,
            location: location.to_path_buf(),
            cloud_sync,
        })
    }
}

fn read_version(db: &redb::Database) -> EngineResult<Option<SchemaVersion>> {
    let read_txn = db.begin_read()?;
    let table = match read_txn.open_table(SCHEMA_META_TABLE) {
        Ok(table) => table,
        Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    match table.get(VERSION_KEY)? {
        Some(bytes) => {
            let (version, _): (SchemaVersion, usize) =
                bincode::decode_from_slice(bytes.value(), bincode::config::standard())?;
            Ok(Some(version))
        }
        None => Ok(None),
    }
}

fn write_version(db: &redb::Database, version: SchemaVersion) -> EngineResult<()> {
    let bytes = bincode::encode_to_vec(version, bincode::config::standard())?;
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(SCHEMA_META_TABLE)?;
        table.insert(VERSION_KEY, bytes.as_slice())?;
    }
    write_txn.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use crate::migration::{MigrationDirection, MigrationStage};

    const V1: SchemaVersion = SchemaVersion::new(1, 0, 0);
    const V2: SchemaVersion = SchemaVersion::new(2, 0, 0);

    fn plan() -> MigrationPlan {
        MigrationPlan::new(
            vec![VersionedSchema::new("App", V1), VersionedSchema::new("App", V2)],
            vec![MigrationStage::lightweight(V1, V2)],
            MigrationDirection::Forward,
        )
    }

    #[test]
    fn records_version_and_migrates_forward() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("nested/app.store");
        let engine = RedbEngine::new(&Logger::new("tests", "redb"));

        let store = engine
            .open_store(&VersionedSchema::new("App", V1), &plan(), &location, false)
            .unwrap();
        assert_eq!(store.stored_version().unwrap(), Some(V1));
        drop(store);

        let store = engine
            .open_store(&VersionedSchema::new("App", V2), &plan(), &location, true)
            .unwrap();
        assert_eq!(store.stored_version().unwrap(), Some(V2));
        assert_eq!(store.schema_version(), V2);
        assert!(store.cloud_sync());
        drop(store);

        let err = engine
            .open_store(&VersionedSchema::new("App", V1), &plan(), &location, false)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::IncompatibleStore {
                stored: V2,
                requested: V1
            }
        ));
    }
}
