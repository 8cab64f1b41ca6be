use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic version identifying one [`VersionedSchema`](super::VersionedSchema).
///
/// Ordering is lexicographic over `(major, minor, patch)`.
///
/// ```
/// use netabase_lifecycle::schema::SchemaVersion;
///
/// let v = "1.4.2".parse::<SchemaVersion>().unwrap();
/// assert_eq!(v, SchemaVersion::new(1, 4, 2));
/// assert!(SchemaVersion::new(1, 10, 0) > v);
/// assert_eq!(v.to_string(), "1.4.2");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid schema version '{input}': expected major.minor.patch")]
pub struct ParseVersionError {
    pub input: String,
}

impl FromStr for SchemaVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError {
            input: s.to_string(),
        };
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u32, ParseVersionError> {
            parts
                .next()
                .ok_or_else(invalid)?
                .parse::<u32>()
                .map_err(|_| invalid())
        };
        let version = SchemaVersion::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}
