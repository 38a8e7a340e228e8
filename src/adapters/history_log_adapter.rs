//! In-memory log history with per-level filtering.
//!
//! Rendered lines look like:
//!
//! ```text
//! [1] [2024-05-01 12:00:00] [INFO] Store has been reset.
//! [2] [2024-05-01 12:00:00] [WARNING] Ignored variable or unsupported type: foo
//! ```
//!
//! Line numbers count visible entries only, so they restart from 1 whenever a
//! level filter changes.

use crate::ports::log_port::{LogLevel, LogPort};
use chrono::{DateTime, Local};
use std::cell::{Cell, RefCell};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// 1-based position in the full history.
    pub line: usize,
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    fn render(&self, number: usize) -> String {
        format!(
            "[{number}] [{}] [{}] {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.level,
            self.message
        )
    }
}

pub struct HistoryLogAdapter {
    entries: RefCell<Vec<LogEntry>>,
    // INFO, WARNING, ERROR
    enabled: Cell<[bool; 3]>,
}

fn level_slot(level: LogLevel) -> usize {
    match level {
        LogLevel::Info => 0,
        LogLevel::Warning => 1,
        LogLevel::Error => 2,
    }
}

impl Default for HistoryLogAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLogAdapter {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            enabled: Cell::new([true; 3]),
        }
    }

    /// Every recorded entry, filters ignored.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn set_enabled(&self, level: LogLevel, enabled: bool) {
        let mut flags = self.enabled.get();
        flags[level_slot(level)] = enabled;
        self.enabled.set(flags);
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.enabled.get()[level_slot(level)]
    }

    /// Entries whose level is currently enabled.
    pub fn visible(&self) -> Vec<LogEntry> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| self.is_enabled(e.level))
            .cloned()
            .collect()
    }

    pub fn render(&self) -> String {
        self.visible()
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.render(i + 1) + "\n")
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl LogPort for HistoryLogAdapter {
    fn log(&self, level: LogLevel, message: &str) {
        let mut entries = self.entries.borrow_mut();
        let line = entries.len() + 1;
        entries.push(LogEntry {
            line,
            timestamp: Local::now(),
            level,
            message: message.to_string(),
        });
    }
}
