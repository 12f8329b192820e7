//! Diagnostic output.
//!
//! The library never prints on its own. Every component reports through a
//! [`Logger`] handed in by the caller, so hosts can redirect diagnostics:
//! - [`ConsoleLogger`] - coloured terminal output used by the binary
//! - [`MemoryLogger`] - records entries for inspection
//! - [`NullLogger`] - discards everything
//!
//! `formatter` holds the pure formatting helpers shared by the console sink.

use std::sync::Mutex;

use crate::boundary::BoundaryWarning;

pub mod formatter;

pub use formatter::{format_message, format_snapshot};

/// Severity of a diagnostic event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Unmodified output line of a VCS command
    Raw,
    Trace,
    Success,
    Info,
    Warning,
    Error,
}

/// Sink for diagnostic events.
///
/// Only [`Logger::log`] is required; the level helpers forward to it.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn raw(&self, message: &str) {
        self.log(Level::Raw, message);
    }

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }

    fn success(&self, message: &str) {
        self.log(Level::Success, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    /// Report a non-fatal boundary condition as a warning
    fn boundary(&self, warning: &BoundaryWarning) {
        self.warning(&warning.to_string());
    }
}

/// Logger that discards all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Logger writing coloured lines to stderr.
///
/// Raw and trace events are only shown in verbose mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger {
    verbose: bool,
}

impl ConsoleLogger {
    pub fn new(verbose: bool) -> Self {
        ConsoleLogger { verbose }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, message: &str) {
        if !self.verbose && level < Level::Success {
            return;
        }
        eprintln!("{}", format_message(level, message));
    }
}

/// Logger keeping every event in memory
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events in arrival order
    pub fn entries(&self) -> Vec<(Level, String)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages recorded at exactly `level`
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push((level, message.to_string()));
    }
}
