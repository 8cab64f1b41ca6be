//! Versioned schema declarations.
//!
//! A [`VersionedSchema`] is an immutable description of a data shape at one
//! [`SchemaVersion`]: its entities, their attributes and their relationships.
//! Schemas are declared once (in code or in TOML) and a configuration's
//! migration plan orders several of them into an evolution sequence.
//!
//! ```
//! use netabase_lifecycle::schema::*;
//!
//! let schema = VersionedSchema::new("Contacts", SchemaVersion::new(1, 0, 0))
//!     .with_entity(
//!         EntitySchema::new("Person")
//!             .with_attribute(AttributeSchema::new("name", "String").with_default("\"\""))
//!             .with_relationship(
//!                 RelationshipSchema::to_many("groups", "Group").with_inverse("people"),
//!             ),
//!     );
//!
//! assert_eq!(schema.version_string(), "Contacts v1.0.0");
//! let round_trip = VersionedSchema::from_toml(&schema.to_toml()).unwrap();
//! assert_eq!(round_trip, schema);
//! ```

pub mod cloud;
mod version;

pub use version::{ParseVersionError, SchemaVersion};

use crate::errors::{LifecycleError, LifecycleResult};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionedSchema {
    pub name: String,
    pub version: SchemaVersion,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntitySchema>,
}

impl VersionedSchema {
    pub fn new(name: impl Into<String>, version: SchemaVersion) -> Self {
        Self {
            name: name.into(),
            version,
            entities: Vec::new(),
        }
    }

    pub fn with_entity(mut self, entity: EntitySchema) -> Self {
        self.entities.push(entity);
        self
    }

    /// `"<name> v<major>.<minor>.<patch>"`, the form used in diagnostics.
    pub fn version_string(&self) -> String {
        format!("{} v{}", self.name, self.version)
    }

    pub fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Convert the schema to a TOML string.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self)
            .unwrap_or_else(|e| format!("# Error serializing to TOML: {}", e))
    }

    pub fn from_toml(source: &str) -> LifecycleResult<Self> {
        toml::from_str(source).map_err(|e| LifecycleError::InvalidSchema(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipSchema>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeSchema) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_relationship(mut self, relationship: RelationshipSchema) -> Self {
        self.relationships.push(relationship);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeSchema {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub unique: bool,
    /// Literal default value, if the attribute declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            optional: false,
            unique: false,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// What happens to related records when the owning record is deleted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeleteRule {
    #[default]
    Nullify,
    Cascade,
    /// Refuse the deletion while related records exist.
    Deny,
    NoAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationshipSchema {
    pub name: String,
    /// Name of the destination entity.
    pub destination: String,
    #[serde(default)]
    pub to_many: bool,
    #[serde(default)]
    pub optional: bool,
    /// Name of the inverse relationship on the destination entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
    #[serde(default)]
    pub delete_rule: DeleteRule,
}

impl RelationshipSchema {
    /// An optional to-one relationship with the default delete rule.
    pub fn to_one(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
            to_many: false,
            optional: true,
            inverse: None,
            delete_rule: DeleteRule::default(),
        }
    }

    /// An optional to-many relationship with the default delete rule.
    pub fn to_many(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            to_many: true,
            ..Self::to_one(name, destination)
        }
    }

    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    pub fn with_inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }

    pub fn with_delete_rule(mut self, rule: DeleteRule) -> Self {
        self.delete_rule = rule;
        self
    }

    pub fn has_inverse(&self) -> bool {
        self.inverse.is_some()
    }
}
