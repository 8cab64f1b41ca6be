//! Prelude module for convenient imports.
//!
//! ```rust
//! use netabase_lifecycle::prelude::*;
//! ```

pub use crate::backend::{
    CloudAccount, FileSystem, NoCloudAccount, PersistenceEngine, StdFileSystem,
};
pub use crate::config::ContainerConfig;
pub use crate::configuration::{Configuration, StoreConfiguration, validate_configuration};
pub use crate::container::{Container, MetricValue, SetupState};
#[cfg(feature = "redb")]
pub use crate::databases::redb::{RedbEngine, RedbStore};
pub use crate::errors::{EngineError, EngineResult, LifecycleError, LifecycleResult};
pub use crate::logging::Logger;
pub use crate::migration::{
    MigrationDecision, MigrationDirection, MigrationPlan, MigrationStage, StageKind,
    StageValidator, StageViolation, ValidationStrictness,
};
pub use crate::schema::cloud::{CloudCompatibility, CloudViolation};
pub use crate::schema::{
    AttributeSchema, DeleteRule, EntitySchema, RelationshipSchema, SchemaVersion,
    VersionedSchema,
};
