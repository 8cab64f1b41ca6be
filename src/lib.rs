//! # Netabase Lifecycle
//!
//! Versioned schemas, migration planning and store lifecycle management for
//! embedded stores.
//!
//! ## Features
//!
//! - **Versioned schemas**: entity, attribute and relationship declarations
//!   tied to a semantic version, importable from and exportable to TOML
//! - **Migration plans**: lightweight and custom stages, validated as a
//!   contiguous chain (or against catalog order for rollback plans) before
//!   any store is touched
//! - **Cloud checks**: structural rules a schema must meet to replicate
//! - **Containers**: backup, cloud probe, open and automatic rollback to
//!   earlier schemas, one operation at a time
//! - **Engines**: a `redb`-backed store and an in-memory engine for previews
//!   and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netabase_lifecycle::prelude::*;
//!
//! let v1 = SchemaVersion::new(1, 0, 0);
//! let v2 = SchemaVersion::new(2, 0, 0);
//! let person = |version| {
//!     VersionedSchema::new("Contacts", version).with_entity(
//!         EntitySchema::new("Person").with_attribute(AttributeSchema::new("name", "String")),
//!     )
//! };
//!
//! let configuration = StoreConfiguration::builder()
//!     .identifier("com.example.contacts")
//!     .name("contacts")
//!     .schema(person(v2))
//!     .plan(MigrationPlan::new(
//!         vec![person(v1), person(v2)],
//!         vec![MigrationStage::lightweight(v1, v2)],
//!         MigrationDirection::Forward,
//!     ))
//!     .build();
//!
//! let logger = Logger::new("com.example.contacts", "lifecycle");
//! let container = Container::new(
//!     configuration,
//!     ContainerConfig::new("/var/lib/contacts"),
//!     RedbEngine::new(&logger),
//! )?;
//! container.setup(true)?;
//! # Ok::<(), LifecycleError>(())
//! ```

pub mod backend;
pub mod config;
pub mod configuration;
pub mod container;
pub mod databases;
pub mod errors;
pub mod logging;
pub mod migration;
pub mod prelude;
pub mod schema;
