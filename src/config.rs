//! Container settings.
//!
//! Where a container keeps its store and backup, built with `typed-builder`
//! the same way as the rest of the crate's configuration values.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use typed_builder::TypedBuilder;

/// File name of the backup, always a sibling of the store file.
pub const BACKUP_FILE_NAME: &str = "backup.store";

/// Settings for one [`Container`](crate::container::Container).
///
/// # Examples
///
/// ```
/// use netabase_lifecycle::config::ContainerConfig;
/// use std::path::PathBuf;
///
/// let config = ContainerConfig::builder()
///     .store_directory("/data/contacts")
///     .allow_rollback(true)
///     .build();
///
/// assert_eq!(config.store_path("contacts"), PathBuf::from("/data/contacts/contacts.store"));
/// assert_eq!(config.backup_path(), PathBuf::from("/data/contacts/backup.store"));
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct ContainerConfig {
    /// Directory holding the store file and its backup
    #[builder(setter(into))]
    pub store_directory: PathBuf,

    /// Store file name; `<configuration name>.store` when unset
    #[builder(default, setter(strip_option, into))]
    pub store_file_name: Option<String>,

    /// Whether `setup` falls back to earlier schemas when opening fails
    #[builder(default = false)]
    pub allow_rollback: bool,
}

impl ContainerConfig {
    pub fn new<P: Into<PathBuf>>(store_directory: P) -> Self {
        Self {
            store_directory: store_directory.into(),
            store_file_name: None,
            allow_rollback: false,
        }
    }

    /// Settings for a fresh directory under the system temp dir.
    pub fn temp() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self::new(std::env::temp_dir().join(format!("netabase_lifecycle_{nanos:032x}")))
    }

    pub fn store_path(&self, configuration_name: &str) -> PathBuf {
        match &self.store_file_name {
            Some(file_name) => self.store_directory.join(file_name),
            None => self.store_directory.join(format!("{configuration_name}.store")),
        }
    }

    pub fn backup_path(&self) -> PathBuf {
        self.store_directory.join(BACKUP_FILE_NAME)
    }

    pub fn store_directory(&self) -> &Path {
        &self.store_directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_config_defaults() {
        let config = ContainerConfig::new("/tmp/lifecycle");
        assert!(!config.allow_rollback);
        assert_eq!(config.store_file_name, None);
        assert_eq!(config.store_path("app"), PathBuf::from("/tmp/lifecycle/app.store"));
    }

    #[test]
    fn test_container_config_builder() {
        let config = ContainerConfig::builder()
            .store_directory(PathBuf::from("/tmp/custom"))
            .store_file_name("main.db")
            .build();
        assert_eq!(config.store_path("ignored"), PathBuf::from("/tmp/custom/main.db"));
        assert_eq!(config.backup_path(), PathBuf::from("/tmp/custom/backup.store"));
    }

    #[test]
    fn test_temp_config_lives_under_temp_dir() {
        let config = ContainerConfig::temp();
        assert!(config.store_directory().starts_with(std::env::temp_dir()));
    }
}
