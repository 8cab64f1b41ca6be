//! Store configurations and their validation.
//!
//! Any type exposing the five read-only fields of [`Configuration`] can
//! describe an app's store. [`StoreConfiguration`] is the ready-made one.
//!
//! ```
//! use netabase_lifecycle::prelude::*;
//!
//! let v1 = SchemaVersion::new(1, 0, 0);
//! let v2 = SchemaVersion::new(2, 0, 0);
//! let target = VersionedSchema::new("Contacts", v2);
//!
//! let configuration = StoreConfiguration::builder()
//!     .identifier("com.example.contacts")
//!     .name("contacts")
//!     .schema(target.clone())
//!     .plan(
//!         MigrationPlan::builder()
//!             .schemas(vec![VersionedSchema::new("Contacts", v1), target])
//!             .stages(vec![MigrationStage::lightweight(v1, v2)])
//!             .build(),
//!     )
//!     .build();
//!
//! let logger = Logger::new(configuration.identifier(), "lifecycle");
//! assert!(configuration.validate(&logger).is_ok());
//! ```

use crate::errors::{LifecycleError, LifecycleResult};
use crate::logging::Logger;
use crate::migration::{MigrationPlan, StageValidator};
use crate::schema::VersionedSchema;
use crate::schema::cloud::CloudCompatibility;
use std::collections::HashSet;
use typed_builder::TypedBuilder;

/// Storage settings of one app.
pub trait Configuration: Send + Sync {
    /// The app's identifier; also the logging subsystem.
    fn identifier(&self) -> &str;

    /// The replication container, when the store syncs to the cloud.
    fn cloud_container(&self) -> Option<&str>;

    fn name(&self) -> &str;

    /// The schema the store should be opened at.
    fn schema(&self) -> &VersionedSchema;

    fn plan(&self) -> &MigrationPlan;

    fn validate(&self, logger: &Logger) -> LifecycleResult<()> {
        validate_configuration(self, logger)
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct StoreConfiguration {
    #[builder(setter(into))]
    pub identifier: String,
    #[builder(setter(into))]
    pub name: String,
    #[builder(default, setter(strip_option, into))]
    pub cloud_container: Option<String>,
    pub schema: VersionedSchema,
    pub plan: MigrationPlan,
}

impl Configuration for StoreConfiguration {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn cloud_container(&self) -> Option<&str> {
        self.cloud_container.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &VersionedSchema {
        &self.schema
    }

    fn plan(&self) -> &MigrationPlan {
        &self.plan
    }
}

/// Cross-checks a configuration's target schema, plan and cloud settings.
///
/// Fails with [`LifecycleError::InvalidSchema`] when the target schema is not
/// in the plan's catalog, the catalog declares a version twice, or (for cloud
/// configurations) any catalog schema fails the cloud-structural check; and
/// with [`LifecycleError::InvalidMigrationPlan`] when the stages are illegal.
pub fn validate_configuration<C: Configuration + ?Sized>(
    configuration: &C,
    logger: &Logger,
) -> LifecycleResult<()> {
    let logger = logger.category("lifecycle.configuration");
    let plan = configuration.plan();
    let target = configuration.schema();

    let mut declared = HashSet::new();
    if let Some(duplicate) = plan.schemas.iter().find(|s| !declared.insert(s.version)) {
        logger.error(format!(
            "Schema catalog declares v{} more than once",
            duplicate.version
        ));
        return Err(LifecycleError::InvalidSchema(format!(
            "schema catalog declares v{} more than once",
            duplicate.version
        )));
    }

    if !plan.contains_schema(target.version) {
        logger.error(format!(
            "{} is not part of the migration plan for {}",
            target.version_string(),
            configuration.identifier()
        ));
        return Err(LifecycleError::InvalidSchema(format!(
            "{} is not part of the migration plan",
            target.version_string()
        )));
    }

    let validator = StageValidator::new(&logger);
    if let Err(violation) = validator.check(plan, configuration.cloud_container()) {
        logger.error(format!(
            "Invalid migration plan for {}: {violation}",
            configuration.identifier()
        ));
        return Err(LifecycleError::InvalidMigrationPlan(violation.to_string()));
    }

    if let Some(container) = configuration.cloud_container() {
        logger.info(format!(
            "Validating {} schemas for cloud container {container}",
            plan.schemas.len()
        ));
        let compatibility = CloudCompatibility::new(&logger);
        let failures = plan
            .schemas
            .iter()
            .filter(|schema| !compatibility.validate_for_cloud_sync(schema))
            .count();
        if failures > 0 {
            logger.error(format!(
                "{failures} schema(s) cannot be synced to {container}"
            ));
            return Err(LifecycleError::InvalidSchema(format!(
                "{failures} schema(s) are not valid for cloud sync"
            )));
        }
    }

    logger.debug(format!(
        "Configuration {} is valid",
        configuration.identifier()
    ));
    Ok(())
}
