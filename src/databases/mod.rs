//! Persistence engines.
//!
//! - [`redb`]: a file-backed engine over `redb` (feature `redb`, on by default)
//! - [`memory`]: an in-memory engine, file system and cloud account, useful
//!   for previews and tests
//!
//! Both engines record the schema version a store was last opened at, ask
//! the plan how to get from there to the requested version, and run the
//! hooks of every custom stage on the way.

pub mod memory;
#[cfg(feature = "redb")]
pub mod redb;

use crate::errors::{EngineError, EngineResult};
use crate::logging::Logger;
use crate::migration::{HookContext, MigrationDecision, MigrationPlan};
use crate::schema::SchemaVersion;
use std::path::Path;

/// Carries a store recorded at `stored` to `requested`.
///
/// `record` persists a version as the store's current one; it is called
/// once for a new store and once after every executed stage.
pub(crate) fn apply_plan(
    plan: &MigrationPlan,
    stored: Option<SchemaVersion>,
    requested: SchemaVersion,
    location: &Path,
    logger: &Logger,
    mut record: impl FnMut(SchemaVersion) -> EngineResult<()>,
) -> EngineResult<()> {
    match plan.decide(stored, requested) {
        MigrationDecision::Create => {
            logger.debug(format!("Creating store at v{requested}"));
            record(requested)
        }
        MigrationDecision::UpToDate => {
            logger.debug(format!("Store already at v{requested}"));
            Ok(())
        }
        MigrationDecision::Migrate(steps) => {
            for step in steps {
                logger.info(format!("Running {step}"));
                let context = HookContext {
                    from: step.from(),
                    to: step.to(),
                    store_location: location.to_path_buf(),
                };
                if let Some(hook) = step.will_migrate() {
                    hook(&context).map_err(|e| EngineError::HookFailed(e.0))?;
                }
                record(step.to())?;
                if let Some(hook) = step.did_migrate() {
                    hook(&context).map_err(|e| EngineError::HookFailed(e.0))?;
                }
            }
            Ok(())
        }
        MigrationDecision::WrongDirection { from, to, .. }
        | MigrationDecision::Unreachable { from, to } => Err(EngineError::IncompatibleStore {
            stored: from,
            requested: to,
        }),
    }
}
