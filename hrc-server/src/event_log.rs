//! Bounded advisory log
//!
//! Holds the most recent entries, newest first. Appending past capacity
//! evicts the oldest entry.

use chrono::{DateTime, Utc};
use hrc_core::PersonaId;
use serde::Serialize;
use std::collections::VecDeque;

pub const LOG_CAPACITY: usize = 10;

/// Who produced a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "persona", rename_all = "lowercase")]
pub enum LogSource {
    Hot,
    Persona(PersonaId),
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLogEntry {
    pub source: LogSource,
    pub text: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<EventLogEntry>,
    capacity: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend an entry and return a copy of it
    pub fn push(&mut self, source: LogSource, text: impl Into<String>) -> EventLogEntry {
        let entry = EventLogEntry {
            source,
            text: text.into(),
            at: Utc::now(),
        };
        self.entries.push_front(entry.clone());
        self.entries.truncate(self.capacity);
        entry
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &EventLogEntry> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<EventLogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, source: LogSource) -> usize {
        self.entries.iter().filter(|e| e.source == source).count()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
