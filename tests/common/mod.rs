// Common test utilities and helpers
#![allow(dead_code)]

use netabase_lifecycle::prelude::*;
use std::path::Path;

pub const V1: SchemaVersion = SchemaVersion::new(1, 0, 0);
pub const V2: SchemaVersion = SchemaVersion::new(2, 0, 0);
pub const V3: SchemaVersion = SchemaVersion::new(3, 0, 0);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn logger() -> Logger {
    Logger::new("tests.lifecycle", "tests")
}

/// The contacts schema at `version`; every version adds to the last.
pub fn contacts_schema(version: SchemaVersion) -> VersionedSchema {
    let mut person = EntitySchema::new("Person")
        .with_attribute(AttributeSchema::new("name", "String").with_default("\"\""))
        .with_relationship(
            RelationshipSchema::to_many("groups", "Group").with_inverse("members"),
        );
    if version >= V2 {
        person = person.with_attribute(AttributeSchema::new("email", "String").optional());
    }
    if version >= V3 {
        person = person.with_attribute(AttributeSchema::new("phone", "String").optional());
    }
    let group = EntitySchema::new("Group")
        .with_attribute(AttributeSchema::new("title", "String").with_default("\"\""))
        .with_relationship(
            RelationshipSchema::to_many("members", "Person").with_inverse("groups"),
        );

    VersionedSchema::new("Contacts", version)
        .with_entity(person)
        .with_entity(group)
}

pub fn catalog(versions: &[SchemaVersion]) -> Vec<VersionedSchema> {
    versions.iter().copied().map(contacts_schema).collect()
}

/// A forward plan with a lightweight stage between each pair of versions.
pub fn forward_plan(versions: &[SchemaVersion]) -> MigrationPlan {
    let stages = versions
        .windows(2)
        .map(|pair| MigrationStage::lightweight(pair[0], pair[1]))
        .collect();
    MigrationPlan::new(catalog(versions), stages, MigrationDirection::Forward)
}

pub fn configuration(target: SchemaVersion, plan: MigrationPlan) -> StoreConfiguration {
    StoreConfiguration::builder()
        .identifier("com.example.contacts")
        .name("contacts")
        .schema(contacts_schema(target))
        .plan(plan)
        .build()
}

pub fn cloud_configuration(target: SchemaVersion, plan: MigrationPlan) -> StoreConfiguration {
    StoreConfiguration::builder()
        .identifier("com.example.contacts")
        .name("contacts")
        .cloud_container("iCloud.com.example.contacts")
        .schema(contacts_schema(target))
        .plan(plan)
        .build()
}

pub fn settings(dir: &Path) -> ContainerConfig {
    ContainerConfig::new(dir)
}
