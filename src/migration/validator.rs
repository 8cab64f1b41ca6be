//! Stage chain validation.
//!
//! The validator proves, before any data is touched, that a plan's stages
//! form a legal path for its declared direction. All bookkeeping lives in
//! the call that performs the check, so one validator can be shared freely.

use super::plan::{MigrationDirection, MigrationPlan, ValidationStrictness};
use super::stage::MigrationStage;
use crate::configuration::Configuration;
use crate::logging::Logger;
use crate::schema::SchemaVersion;
use std::collections::HashSet;
use std::fmt;

/// The first rule a stage list breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageViolation {
    NotSorted {
        direction: MigrationDirection,
    },
    BrokenChain {
        previous_to: SchemaVersion,
        from: SchemaVersion,
    },
    DuplicateSource(SchemaVersion),
    DuplicateTarget(SchemaVersion),
    WrongOrder {
        direction: MigrationDirection,
        from: SchemaVersion,
        to: SchemaVersion,
    },
    CustomStageWithCloud {
        from: SchemaVersion,
        to: SchemaVersion,
        container: String,
    },
    LightweightInBackwardPlan {
        from: SchemaVersion,
        to: SchemaVersion,
    },
    NotInCatalog(SchemaVersion),
    WrongCatalogOrder {
        direction: MigrationDirection,
        from: SchemaVersion,
        to: SchemaVersion,
    },
}

impl fmt::Display for StageViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageViolation::NotSorted { direction } => match direction {
                MigrationDirection::Forward => {
                    write!(f, "forward migration stages must be sorted in ascending order")
                }
                MigrationDirection::Backward => {
                    write!(f, "backward migration stages must be sorted in descending order")
                }
            },
            StageViolation::BrokenChain { previous_to, from } => write!(
                f,
                "invalid migration chain: previous version v{previous_to} doesn't match current fromVersion v{from}"
            ),
            StageViolation::DuplicateSource(version) => {
                write!(f, "duplicate fromVersion v{version} in migration chain")
            }
            StageViolation::DuplicateTarget(version) => {
                write!(f, "duplicate toVersion v{version} in migration chain")
            }
            StageViolation::WrongOrder {
                direction: MigrationDirection::Forward,
                from,
                to,
            } => write!(
                f,
                "invalid version order: fromVersion v{from} should be less than toVersion v{to}"
            ),
            StageViolation::WrongOrder {
                direction: MigrationDirection::Backward,
                from,
                to,
            } => write!(
                f,
                "invalid version order for backward migration: toVersion v{to} should be less than fromVersion v{from}"
            ),
            StageViolation::CustomStageWithCloud {
                from,
                to,
                container,
            } => write!(
                f,
                "custom migration v{from} -> v{to} cannot run on a store synced to cloud container {container}"
            ),
            StageViolation::LightweightInBackwardPlan { from, to } => write!(
                f,
                "lightweight stage v{from} -> v{to} in a backward plan; backward stages must be custom"
            ),
            StageViolation::NotInCatalog(version) => {
                write!(f, "schema v{version} is not declared in the plan's catalog")
            }
            StageViolation::WrongCatalogOrder {
                direction,
                from,
                to,
            } => write!(
                f,
                "{direction} stage v{from} -> v{to} runs against the catalog order"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageValidator {
    logger: Logger,
}

impl StageValidator {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.category("lifecycle.migration"),
        }
    }

    /// Whether `plan`'s stages are legal for `configuration`. Violations are logged.
    pub fn validate_stages<C: Configuration + ?Sized>(
        &self,
        plan: &MigrationPlan,
        configuration: &C,
    ) -> bool {
        self.logger.info(format!(
            "Validating {} migration stages for {}",
            plan.direction,
            configuration.identifier()
        ));
        match self.check(plan, configuration.cloud_container()) {
            Ok(()) => true,
            Err(violation) => {
                self.logger.error(format!(
                    "Invalid migration plan for {}: {violation}",
                    configuration.identifier()
                ));
                false
            }
        }
    }

    /// Checks `plan`'s stages, reporting the first violated rule.
    ///
    /// `cloud_container` is the replication container the store syncs to, if
    /// any; custom stages are refused when one is set.
    pub fn check(
        &self,
        plan: &MigrationPlan,
        cloud_container: Option<&str>,
    ) -> Result<(), StageViolation> {
        if plan.stages.is_empty() {
            self.logger.notice("No migration stages defined");
            return Ok(());
        }

        match plan.strictness {
            ValidationStrictness::Contiguous => self.check_chain(plan, cloud_container),
            ValidationStrictness::CatalogOrder => self.check_catalog_order(plan, cloud_container),
        }
    }

    fn check_chain(
        &self,
        plan: &MigrationPlan,
        cloud_container: Option<&str>,
    ) -> Result<(), StageViolation> {
        let direction = plan.direction;
        let sorted = match direction {
            MigrationDirection::Forward => plan.stages.is_sorted_by(|a, b| a.compare(b).is_le()),
            MigrationDirection::Backward => plan.stages.is_sorted_by(|a, b| a.compare(b).is_ge()),
        };
        if !sorted {
            return Err(StageViolation::NotSorted { direction });
        }

        let mut seen_from = HashSet::new();
        let mut seen_to = HashSet::new();
        let mut previous_to: Option<SchemaVersion> = None;

        for stage in &plan.stages {
            self.logger.debug(format!("Validating {stage}"));
            Self::check_kind(stage, direction, cloud_container)?;

            let (from, to) = (stage.from(), stage.to());
            if let Some(previous_to) = previous_to.filter(|previous| *previous != from) {
                return Err(StageViolation::BrokenChain { previous_to, from });
            }
            if seen_from.contains(&from) {
                return Err(StageViolation::DuplicateSource(from));
            }
            if seen_to.contains(&to) {
                return Err(StageViolation::DuplicateTarget(to));
            }
            let ascending = from < to;
            if ascending != (direction == MigrationDirection::Forward) || from == to {
                return Err(StageViolation::WrongOrder {
                    direction,
                    from,
                    to,
                });
            }

            seen_from.insert(from);
            seen_to.insert(to);
            previous_to = Some(to);
        }

        Ok(())
    }

    fn check_catalog_order(
        &self,
        plan: &MigrationPlan,
        cloud_container: Option<&str>,
    ) -> Result<(), StageViolation> {
        let direction = plan.direction;

        for stage in &plan.stages {
            self.logger
                .debug(format!("Validating {stage} against the schema catalog"));
            Self::check_kind(stage, direction, cloud_container)?;

            let (from, to) = (stage.from(), stage.to());
            let from_index = plan
                .catalog_index(from)
                .ok_or(StageViolation::NotInCatalog(from))?;
            let to_index = plan
                .catalog_index(to)
                .ok_or(StageViolation::NotInCatalog(to))?;

            let in_order = match direction {
                MigrationDirection::Forward => from_index < to_index,
                MigrationDirection::Backward => from_index > to_index,
            };
            if !in_order {
                return Err(StageViolation::WrongCatalogOrder {
                    direction,
                    from,
                    to,
                });
            }
        }

        Ok(())
    }

    /// Kind rules shared by both strictness modes.
    fn check_kind(
        stage: &MigrationStage,
        direction: MigrationDirection,
        cloud_container: Option<&str>,
    ) -> Result<(), StageViolation> {
        if direction == MigrationDirection::Backward && !stage.is_custom() {
            return Err(StageViolation::LightweightInBackwardPlan {
                from: stage.from(),
                to: stage.to(),
            });
        }
        if let (true, Some(container)) = (stage.is_custom(), cloud_container) {
            return Err(StageViolation::CustomStageWithCloud {
                from: stage.from(),
                to: stage.to(),
                container: container.to_string(),
            });
        }
        Ok(())
    }
}
