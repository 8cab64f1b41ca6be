//! Migration plans and path resolution.

use super::stage::MigrationStage;
use crate::schema::{SchemaVersion, VersionedSchema};
use strum::{AsRefStr, Display, EnumString};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MigrationDirection {
    /// Stages move from earlier to later schema versions.
    #[default]
    Forward,
    /// Stages move from later to earlier schema versions.
    Backward,
}

/// How strictly a plan's stage chain is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ValidationStrictness {
    /// Stages must form one sorted, contiguous, duplicate-free chain.
    #[default]
    Contiguous,
    /// Each stage is checked on its own against the positions of its
    /// endpoints in the schema catalog. Stages may skip versions.
    CatalogOrder,
}

/// An ordered schema catalog plus the stages that move a store through it.
///
/// ```
/// use netabase_lifecycle::migration::{MigrationPlan, MigrationStage};
/// use netabase_lifecycle::schema::{SchemaVersion, VersionedSchema};
///
/// let v1 = SchemaVersion::new(1, 0, 0);
/// let v2 = SchemaVersion::new(2, 0, 0);
/// let v3 = SchemaVersion::new(3, 0, 0);
///
/// let plan = MigrationPlan::builder()
///     .schemas(vec![
///         VersionedSchema::new("App", v1),
///         VersionedSchema::new("App", v2),
///         VersionedSchema::new("App", v3),
///     ])
///     .stages(vec![
///         MigrationStage::lightweight(v1, v2),
///         MigrationStage::lightweight(v2, v3),
///     ])
///     .build();
///
/// let steps = plan.resolve(v1, v3).unwrap();
/// assert_eq!(steps.len(), 2);
/// assert_eq!(plan.previous_schema(v3).map(|s| s.version), Some(v2));
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct MigrationPlan {
    #[builder(default)]
    pub schemas: Vec<VersionedSchema>,
    #[builder(default)]
    pub stages: Vec<MigrationStage>,
    #[builder(default)]
    pub direction: MigrationDirection,
    #[builder(default)]
    pub strictness: ValidationStrictness,
}

/// What opening a store at a requested version involves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationDecision<'a> {
    /// No store exists yet; it is created at the requested version.
    Create,
    /// The store is already at the requested version.
    UpToDate,
    /// Run these stages in order.
    Migrate(Vec<&'a MigrationStage>),
    /// The requested move runs against the plan's direction.
    WrongDirection {
        direction: MigrationDirection,
        from: SchemaVersion,
        to: SchemaVersion,
    },
    /// No chain of stages connects the two versions.
    Unreachable {
        from: SchemaVersion,
        to: SchemaVersion,
    },
}

impl MigrationDecision<'_> {
    pub fn is_legal(&self) -> bool {
        matches!(
            self,
            MigrationDecision::Create | MigrationDecision::UpToDate | MigrationDecision::Migrate(_)
        )
    }
}

impl MigrationPlan {
    pub fn new(
        schemas: Vec<VersionedSchema>,
        stages: Vec<MigrationStage>,
        direction: MigrationDirection,
    ) -> Self {
        Self {
            schemas,
            stages,
            direction,
            strictness: ValidationStrictness::default(),
        }
    }

    pub fn with_strictness(mut self, strictness: ValidationStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn schema(&self, version: SchemaVersion) -> Option<&VersionedSchema> {
        self.schemas.iter().find(|s| s.version == version)
    }

    pub fn contains_schema(&self, version: SchemaVersion) -> bool {
        self.schema(version).is_some()
    }

    /// Position of `version` in the declared catalog.
    pub fn catalog_index(&self, version: SchemaVersion) -> Option<usize> {
        self.schemas.iter().position(|s| s.version == version)
    }

    /// The latest catalog schema strictly earlier than `version`.
    pub fn previous_schema(&self, version: SchemaVersion) -> Option<&VersionedSchema> {
        self.schemas
            .iter()
            .filter(|s| s.version < version)
            .max_by_key(|s| s.version)
    }

    /// The stages that carry a store from `from` to `to`, in execution order.
    ///
    /// Returns an empty list when the versions are equal and `None` when the
    /// move runs against the plan's direction or the stages never reach `to`.
    pub fn resolve(&self, from: SchemaVersion, to: SchemaVersion) -> Option<Vec<&MigrationStage>> {
        if from == to {
            return Some(Vec::new());
        }
        let forward = from < to;
        if forward != (self.direction == MigrationDirection::Forward) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = from;
        // A chain can never be longer than the number of stages.
        for _ in 0..self.stages.len() {
            let next = self.stages.iter().find(|stage| {
                stage.from() == current
                    && if forward {
                        stage.to() > current && stage.to() <= to
                    } else {
                        stage.to() < current && stage.to() >= to
                    }
            })?;
            path.push(next);
            current = next.to();
            if current == to {
                return Some(path);
            }
        }
        None
    }

    /// Decides, without touching any data, how a store recorded at `stored`
    /// is brought to `requested`.
    pub fn decide(
        &self,
        stored: Option<SchemaVersion>,
        requested: SchemaVersion,
    ) -> MigrationDecision<'_> {
        let Some(stored) = stored else {
            return MigrationDecision::Create;
        };
        if stored == requested {
            return MigrationDecision::UpToDate;
        }
        let forward = stored < requested;
        if forward != (self.direction == MigrationDirection::Forward) {
            return MigrationDecision::WrongDirection {
                direction: self.direction,
                from: stored,
                to: requested,
            };
        }
        match self.resolve(stored, requested) {
            Some(steps) => MigrationDecision::Migrate(steps),
            None => MigrationDecision::Unreachable {
                from: stored,
                to: requested,
            },
        }
    }
}
