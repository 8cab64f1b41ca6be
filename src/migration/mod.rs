//! Migration planning.
//!
//! A [`MigrationPlan`] pairs an ordered catalog of schemas with the
//! [`MigrationStage`]s that move a store between them. Before any store is
//! opened the [`StageValidator`] proves the stages form a legal path for the
//! plan's [`MigrationDirection`], and [`MigrationPlan::decide`] works out
//! which stages a particular open has to run.
//!
//! Forward plans move to later versions and may mix lightweight and custom
//! stages. Backward plans move to earlier versions and consist of custom
//! stages only. Forward and backward stages never share a plan.

mod plan;
mod stage;
mod validator;

pub use plan::{MigrationDecision, MigrationDirection, MigrationPlan, ValidationStrictness};
pub use stage::{HookContext, HookError, MigrationHook, MigrationStage, StageKind};
pub use validator::{StageValidator, StageViolation};
