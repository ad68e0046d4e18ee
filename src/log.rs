//! Logging sink for errors the store swallows at its public boundary

use std::fmt;
use std::sync::{Arc, Mutex};

/// Receiver for the store's internal diagnostics.
///
/// Every error the public API swallows is reported here before the call
/// falls back to its default. The store never logs lookup misses or
/// decode failures.
pub trait LogSink: Send + Sync {
    fn error(&self, message: &str);

    fn warn(&self, message: &str);

    fn info(&self, message: &str);
}

/// Discards everything. The default sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn error(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}

    fn info(&self, _message: &str) {}
}

/// Forwards to `tracing` under the `settings_store` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn error(&self, message: &str) {
        tracing::error!(target: "settings_store", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "settings_store", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "settings_store", "{}", message);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warn,
    Info,
}

/// Keeps every message in memory; handy in tests and diagnostics panels.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(Level, String)>>>,
}

impl fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySink")
            .field("records", &self.records().len())
            .finish()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, message)| message)
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, message.to_string()));
        }
    }
}

impl LogSink for MemorySink {
    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }
}
