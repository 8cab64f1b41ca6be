//! Migration stages: single edges of a migration chain.

use crate::schema::SchemaVersion;
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use strum::{Display, EnumDiscriminants};

/// What a hook is told about the step it runs around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookContext {
    pub from: SchemaVersion,
    pub to: SchemaVersion,
    pub store_location: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HookError(pub String);

/// Record-transform callback attached to a custom stage.
///
/// Hooks are only ever invoked by a persistence engine while it executes a
/// plan. Validation looks at the stage kind and versions, never at hooks.
pub type MigrationHook = Arc<dyn Fn(&HookContext) -> Result<(), HookError> + Send + Sync>;

/// One directed edge `from -> to` in a migration chain.
///
/// ```
/// use netabase_lifecycle::migration::{MigrationStage, StageKind};
/// use netabase_lifecycle::schema::SchemaVersion;
///
/// let v1 = SchemaVersion::new(1, 0, 0);
/// let v2 = SchemaVersion::new(2, 0, 0);
///
/// let forward = MigrationStage::lightweight(v1, v2);
/// let back = MigrationStage::custom(v2, v1);
///
/// assert_eq!(forward.kind(), StageKind::Lightweight);
/// assert_eq!(back.kind(), StageKind::Custom);
/// assert!(forward.compare(&back).is_lt());
/// ```
#[derive(Clone, EnumDiscriminants)]
#[strum_discriminants(name(StageKind), derive(Display, Hash))]
pub enum MigrationStage {
    /// Expressible purely as a structural diff between the two schemas.
    Lightweight {
        from: SchemaVersion,
        to: SchemaVersion,
    },
    /// Carries explicit record-transform hooks run before and after the step.
    Custom {
        from: SchemaVersion,
        to: SchemaVersion,
        will_migrate: Option<MigrationHook>,
        did_migrate: Option<MigrationHook>,
    },
}

impl MigrationStage {
    pub fn lightweight(from: SchemaVersion, to: SchemaVersion) -> Self {
        MigrationStage::Lightweight { from, to }
    }

    /// A custom stage without hooks.
    pub fn custom(from: SchemaVersion, to: SchemaVersion) -> Self {
        MigrationStage::Custom {
            from,
            to,
            will_migrate: None,
            did_migrate: None,
        }
    }

    pub fn custom_with_hooks(
        from: SchemaVersion,
        to: SchemaVersion,
        will_migrate: Option<MigrationHook>,
        did_migrate: Option<MigrationHook>,
    ) -> Self {
        MigrationStage::Custom {
            from,
            to,
            will_migrate,
            did_migrate,
        }
    }

    pub fn from(&self) -> SchemaVersion {
        match self {
            MigrationStage::Lightweight { from, .. } | MigrationStage::Custom { from, .. } => *from,
        }
    }

    pub fn to(&self) -> SchemaVersion {
        match self {
            MigrationStage::Lightweight { to, .. } | MigrationStage::Custom { to, .. } => *to,
        }
    }

    pub fn kind(&self) -> StageKind {
        StageKind::from(self)
    }

    pub fn is_custom(&self) -> bool {
        self.kind() == StageKind::Custom
    }

    pub fn will_migrate(&self) -> Option<&MigrationHook> {
        match self {
            MigrationStage::Custom { will_migrate, .. } => will_migrate.as_ref(),
            MigrationStage::Lightweight { .. } => None,
        }
    }

    pub fn did_migrate(&self) -> Option<&MigrationHook> {
        match self {
            MigrationStage::Custom { did_migrate, .. } => did_migrate.as_ref(),
            MigrationStage::Lightweight { .. } => None,
        }
    }

    /// Orders stages by source version only; `to` and kind are ignored.
    ///
    /// Chain sortedness is checked against this relation. It is not
    /// consistent with `PartialEq`, which compares whole edges.
    pub fn compare(&self, other: &MigrationStage) -> Ordering {
        self.from().cmp(&other.from())
    }

    /// Whether both stages leave the same source version.
    pub fn same_source(&self, other: &MigrationStage) -> bool {
        self.from() == other.from()
    }
}

/// Two stages are equal when they are the same edge of the same kind.
/// Hooks are opaque and take no part in equality.
impl PartialEq for MigrationStage {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.from() == other.from() && self.to() == other.to()
    }
}

impl Eq for MigrationStage {}

impl fmt::Debug for MigrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStage::Lightweight { from, to } => f
                .debug_struct("Lightweight")
                .field("from", from)
                .field("to", to)
                .finish(),
            MigrationStage::Custom {
                from,
                to,
                will_migrate,
                did_migrate,
            } => f
                .debug_struct("Custom")
                .field("from", from)
                .field("to", to)
                .field("will_migrate", &will_migrate.is_some())
                .field("did_migrate", &did_migrate.is_some())
                .finish(),
        }
    }
}

impl fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} -> v{}", self.kind(), self.from(), self.to())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1: SchemaVersion = SchemaVersion::new(1, 0, 0);
    const V2: SchemaVersion = SchemaVersion::new(2, 0, 0);
    const V3: SchemaVersion = SchemaVersion::new(3, 0, 0);

    #[test]
    fn compare_uses_source_version_only() {
        let a = MigrationStage::lightweight(V1, V3);
        let b = MigrationStage::custom(V1, V2);
        let c = MigrationStage::lightweight(V2, V3);

        assert_eq!(a.compare(&b), Ordering::Equal);
        assert_eq!(a.compare(&c), Ordering::Less);
        assert_eq!(c.compare(&b), Ordering::Greater);
    }

    #[test]
    fn equality_covers_the_whole_edge() {
        assert_eq!(MigrationStage::lightweight(V1, V2), MigrationStage::lightweight(V1, V2));
        // Same source, different target: different edges.
        assert_ne!(MigrationStage::lightweight(V1, V2), MigrationStage::lightweight(V1, V3));
        assert!(MigrationStage::lightweight(V1, V2).same_source(&MigrationStage::lightweight(V1, V3)));
        // Same edge, different kind.
        assert_ne!(MigrationStage::lightweight(V1, V2), MigrationStage::custom(V1, V2));
    }

    #[test]
    fn hooks_do_not_affect_equality() {
        let hook: MigrationHook = Arc::new(|_| Ok(()));
        let with_hooks = MigrationStage::custom_with_hooks(V2, V1, Some(hook.clone()), Some(hook));
        assert_eq!(with_hooks, MigrationStage::custom(V2, V1));
        assert!(with_hooks.will_migrate().is_some());
        assert!(MigrationStage::custom(V2, V1).did_migrate().is_none());
    }

    #[test]
    fn display_names_kind_and_versions() {
        assert_eq!(
            MigrationStage::custom(V3, V2).to_string(),
            "Custom v3.0.0 -> v2.0.0"
        );
    }
}
