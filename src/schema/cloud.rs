//! Structural checks a schema must pass before it can be replicated.
//!
//! Replicated stores materialise records partially and out of order on each
//! device, so some shapes that are fine locally cannot be synced. The check
//! visits every entity and collects every violation instead of stopping at
//! the first one.

use super::{DeleteRule, VersionedSchema};
use crate::logging::Logger;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudViolation {
    UniqueAttribute {
        entity: String,
        attribute: String,
    },
    MissingDefault {
        entity: String,
        attribute: String,
    },
    RequiredRelationship {
        entity: String,
        relationship: String,
    },
    MissingInverse {
        entity: String,
        relationship: String,
    },
    DenyDeleteRule {
        entity: String,
        relationship: String,
    },
}

impl fmt::Display for CloudViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudViolation::UniqueAttribute { entity, attribute } => write!(
                f,
                "{entity}.{attribute} is unique; replicated stores cannot enforce uniqueness"
            ),
            CloudViolation::MissingDefault { entity, attribute } => write!(
                f,
                "{entity}.{attribute} is required but declares no default value"
            ),
            CloudViolation::RequiredRelationship {
                entity,
                relationship,
            } => write!(f, "{entity}.{relationship} must be optional"),
            CloudViolation::MissingInverse {
                entity,
                relationship,
            } => write!(f, "{entity}.{relationship} declares no inverse relationship"),
            CloudViolation::DenyDeleteRule {
                entity,
                relationship,
            } => write!(f, "{entity}.{relationship} uses the deny delete rule"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudCompatibility {
    logger: Logger,
}

impl CloudCompatibility {
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.category("lifecycle.cloud-schema"),
        }
    }

    /// Every rule violation in `schema`, in entity declaration order.
    pub fn violations(schema: &VersionedSchema) -> Vec<CloudViolation> {
        let mut violations = Vec::new();

        for entity in &schema.entities {
            for attribute in &entity.attributes {
                if attribute.unique {
                    violations.push(CloudViolation::UniqueAttribute {
                        entity: entity.name.clone(),
                        attribute: attribute.name.clone(),
                    });
                }
                if !attribute.optional && !attribute.has_default() {
                    violations.push(CloudViolation::MissingDefault {
                        entity: entity.name.clone(),
                        attribute: attribute.name.clone(),
                    });
                }
            }

            for relationship in &entity.relationships {
                if !relationship.optional {
                    violations.push(CloudViolation::RequiredRelationship {
                        entity: entity.name.clone(),
                        relationship: relationship.name.clone(),
                    });
                }
                if !relationship.has_inverse() {
                    violations.push(CloudViolation::MissingInverse {
                        entity: entity.name.clone(),
                        relationship: relationship.name.clone(),
                    });
                }
                if relationship.delete_rule == DeleteRule::Deny {
                    violations.push(CloudViolation::DenyDeleteRule {
                        entity: entity.name.clone(),
                        relationship: relationship.name.clone(),
                    });
                }
            }
        }

        violations
    }

    /// Logs every violation and returns whether the schema can be synced.
    pub fn validate_for_cloud_sync(&self, schema: &VersionedSchema) -> bool {
        self.logger.debug(format!(
            "Validating {} for cloud sync",
            schema.version_string()
        ));

        let violations = Self::violations(schema);
        for violation in &violations {
            self.logger
                .error(format!("{}: {violation}", schema.version_string()));
        }
        violations.is_empty()
    }
}
