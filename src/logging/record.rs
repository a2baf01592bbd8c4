//! Log records and severities
//!
//! A [`LogRecord`] is what producers hand to the [`Logger`](super::Logger).
//! It is rendered into a single line before it reaches any sink.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Severity of a log record
///
/// Variants are declared from least to most severe, so `Critical > Error`
/// holds under the derived ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Verbose,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Get the display name for this severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "Debug",
            Severity::Verbose => "Verbose",
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Critical => "Critical",
        }
    }

    /// Whether a record of this severity passes a `threshold` filter
    pub fn passes(&self, threshold: Severity) -> bool {
        *self >= threshold
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Pad so width specifiers like `{:<8}` line columns up
        f.pad(self.as_str())
    }
}

/// A single log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Local wall-clock time the record was created
    pub timestamp: NaiveDateTime,
    /// Severity of the record
    pub severity: Severity,
    /// Component that produced the record
    pub source: String,
    /// Message text
    pub text: String,
}

impl LogRecord {
    /// Create a new record stamped with `timestamp`
    pub fn new(
        timestamp: NaiveDateTime,
        severity: Severity,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            severity,
            source: source.into(),
            text: text.into(),
        }
    }

    /// Render the record as the line handed to sinks
    ///
    /// Format: `[SRC/Severity] text`, where `SRC` is the first three
    /// characters of the source as given
    pub fn to_line(&self) -> String {
        let tag: String = self.source.chars().take(3).collect();
        format!("[{}/{:<8}] {}", tag, self.severity, self.text)
    }
}
