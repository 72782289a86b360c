//! Structured JSON logger for formtree
//!
//! One event is one JSON line with deterministic (sorted) key order.
//! Logging is synchronous and unbuffered; WARN and below go to stdout,
//! ERROR and FATAL to stderr. Compilation and evaluation never fail
//! because a log line could not be written.

use std::fmt;
use std::io::{self, Write};

use serde_json::{Map, Value};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues (pruned tracker edges, unresolved references)
    Warn = 2,
    /// Operation failures (expression runtime errors)
    Error = 3,
    /// Unrecoverable configuration problems
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that outputs one JSON line per event.
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields.
    ///
    /// ERROR and FATAL route to stderr, everything else to stdout.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = Self::render(severity, event, fields);
        if severity >= Severity::Error {
            Self::emit(&mut io::stderr(), &line);
        } else {
            Self::emit(&mut io::stdout(), &line);
        }
    }

    /// Render one log line with deterministic sorted key order. Keys are
    /// sorted explicitly so the output is independent of the serde_json
    /// map's iteration order.
    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut entries: Vec<(String, String)> = Vec::with_capacity(fields.len() + 2);
        entries.push(("event".to_string(), event.to_string()));
        entries.push(("severity".to_string(), severity.as_str().to_string()));
        for (key, value) in fields {
            entries.push(((*key).to_string(), (*value).to_string()));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut map = Map::new();
        for (key, value) in entries {
            map.insert(key, Value::String(value));
        }
        Value::Object(map).to_string()
    }

    /// One write, one flush, failures ignored.
    fn emit<W: Write>(writer: &mut W, line: &str) {
        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }

    /// Log at TRACE level
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    /// Log at FATAL level
    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }
}
