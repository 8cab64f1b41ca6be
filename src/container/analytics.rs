use crate::logging::Logger;
use chrono::{DateTime, Utc};
use derive_more::From;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, From, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Float(f64),
    Flag(bool),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(value) => write!(f, "{value}"),
            MetricValue::Float(value) => write!(f, "{value}"),
            MetricValue::Flag(value) => write!(f, "{value}"),
            MetricValue::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEvent {
    pub name: String,
    pub at: DateTime<Utc>,
}

/// Number of operation events kept; older events are dropped first.
pub const MAX_OPERATION_EVENTS: usize = 256;

/// Operation log and last-value metrics of one container.
///
/// The log keeps the latest [`MAX_OPERATION_EVENTS`] operations.
pub struct Analytics {
    events: Mutex<VecDeque<OperationEvent>>,
    metrics: Mutex<HashMap<String, MetricValue>>,
    logger: Logger,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Analytics {
    pub fn new(logger: &Logger) -> Self {
        Self {
            events: Mutex::default(),
            metrics: Mutex::default(),
            logger: logger.category("lifecycle.analytics"),
        }
    }

    pub fn track_operation(&self, name: &str) {
        self.logger.debug(format!("Operation: {name}"));
        let mut events = lock(&self.events);
        if events.len() == MAX_OPERATION_EVENTS {
            events.pop_front();
        }
        events.push_back(OperationEvent {
            name: name.to_string(),
            at: Utc::now(),
        });
    }

    /// Records `value` under `name`, replacing any earlier value.
    pub fn record_metric(&self, name: &str, value: impl Into<MetricValue>) {
        let value = value.into();
        self.logger.debug(format!("Metric {name} = {value}"));
        lock(&self.metrics).insert(name.to_string(), value);
    }

    /// Logged operations, oldest first.
    pub fn operations(&self) -> Vec<OperationEvent> {
        lock(&self.events).iter().cloned().collect()
    }

    pub fn operation_count(&self, name: &str) -> usize {
        lock(&self.events).iter().filter(|e| e.name == name).count()
    }

    pub fn metric(&self, name: &str) -> Option<MetricValue> {
        lock(&self.metrics).get(name).cloned()
    }
}
