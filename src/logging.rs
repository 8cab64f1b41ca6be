//! Injected logging handle.
//!
//! Components never log through a process-wide logger of their own. Each one
//! receives a [`Logger`] at construction, which tags every record with the
//! owning subsystem (usually the configuration identifier) and a category,
//! and forwards it to the `log` facade using `subsystem::category` as target.
//!
//! ```
//! use netabase_lifecycle::logging::Logger;
//!
//! let logger = Logger::new("com.example.app", "lifecycle");
//! let migration = logger.category("lifecycle.migration");
//! assert_eq!(migration.target(), "com.example.app::lifecycle.migration");
//! migration.debug("validating stages");
//! ```

use log::Level;
use std::fmt::Display;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Logger {
    subsystem: Arc<str>,
    target: Arc<str>,
}

impl Logger {
    pub fn new(subsystem: impl Into<String>, category: &str) -> Self {
        let subsystem: String = subsystem.into();
        let target = format!("{subsystem}::{category}");
        Self {
            subsystem: subsystem.into(),
            target: target.into(),
        }
    }

    /// A logger for another category of the same subsystem.
    pub fn category(&self, category: &str) -> Self {
        Self {
            subsystem: self.subsystem.clone(),
            target: format!("{}::{category}", self.subsystem).into(),
        }
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn debug(&self, message: impl Display) {
        self.emit(Level::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.emit(Level::Info, message);
    }

    /// Something unremarkable but worth seeing, such as an empty plan.
    pub fn notice(&self, message: impl Display) {
        self.emit(Level::Info, message);
    }

    pub fn warning(&self, message: impl Display) {
        self.emit(Level::Warn, message);
    }

    pub fn error(&self, message: impl Display) {
        self.emit(Level::Error, message);
    }

    /// An unrecovered failure of a whole operation.
    pub fn fault(&self, message: impl Display) {
        self.emit(Level::Error, format_args!("FAULT: {message}"));
    }

    fn emit(&self, level: Level, message: impl Display) {
        log::log!(target: self.target(), level, "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keeps_subsystem() {
        let logger = Logger::new("com.example", "lifecycle");
        let child = logger.category("lifecycle.backup");
        assert_eq!(child.subsystem(), "com.example");
        assert_eq!(child.target(), "com.example::lifecycle.backup");
        assert_eq!(logger.target(), "com.example::lifecycle");
    }
}
