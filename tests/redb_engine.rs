/// End-to-end tests over the redb engine and the real file system
mod common;

use common::*;
use netabase_lifecycle::migration::{HookContext, HookError};
use netabase_lifecycle::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_redb_container_lifecycle() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let engine = RedbEngine::new(&logger());

    let container = Container::new(
        configuration(V1, forward_plan(&[V1, V2])),
        settings(dir.path()),
        engine.clone(),
    )
    .unwrap();
    container.setup(false).unwrap();
    assert!(container.store_path().is_file());
    assert!(!container.backup_path().exists());
    let stored = container.with_store(|store| store.stored_version().unwrap());
    assert_eq!(stored, Some(Some(V1)));
    drop(container);

    let container = Container::new(
        configuration(V2, forward_plan(&[V1, V2])),
        settings(dir.path()),
        engine,
    )
    .unwrap();
    container.setup(false).unwrap();
    assert!(container.backup_path().is_file());
    let store = container.store().unwrap();
    assert_eq!(store.schema_version(), V2);
    assert_eq!(store.stored_version().unwrap(), Some(V2));
    drop(store);

    container.restore().unwrap();
    container.setup(false).unwrap();
    assert_eq!(container.active_version(), Some(V2));
}

#[test]
fn test_redb_unreachable_target_rolls_back() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let engine = RedbEngine::new(&logger());

    let container = Container::new(
        configuration(V2, forward_plan(&[V1, V2])),
        settings(dir.path()),
        engine.clone(),
    )
    .unwrap();
    container.setup(false).unwrap();
    drop(container);

    // V3 is catalogued but no stage reaches it, so the store stays at V2.
    let plan = MigrationPlan::new(
        catalog(&[V1, V2, V3]),
        vec![MigrationStage::lightweight(V1, V2)],
        MigrationDirection::Forward,
    );
    let container = Container::new(configuration(V3, plan), settings(dir.path()), engine).unwrap();

    let err = container.setup(false).unwrap_err();
    assert_eq!(
        err,
        LifecycleError::SetupFailed(
            "Store is at schema v2.0.0 and cannot be opened at v3.0.0".into()
        )
    );

    container.setup(true).unwrap();
    assert_eq!(container.active_version(), Some(V2));
}

#[test]
fn test_redb_custom_stage_hooks_run_once() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let plan = |hooked: bool| {
        let counter = counter.clone();
        let stage = if hooked {
            MigrationStage::custom_with_hooks(
                V1,
                V2,
                Some(Arc::new(move |context: &HookContext| -> Result<(), HookError> {
                    assert!(context.store_location.is_file());
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })),
                None,
            )
        } else {
            MigrationStage::custom(V1, V2)
        };
        MigrationPlan::new(catalog(&[V1, V2]), vec![stage], MigrationDirection::Forward)
    };

    let engine = RedbEngine::new(&logger());
    let container =
        Container::new(configuration(V1, plan(false)), settings(dir.path()), engine.clone())
            .unwrap();
    container.setup(false).unwrap();
    drop(container);

    let container =
        Container::new(configuration(V2, plan(true)), settings(dir.path()), engine).unwrap();
    container.setup(false).unwrap();
    container.setup(false).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
