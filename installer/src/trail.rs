//! Audit trail threaded through a verification run.
//!
//! Every component records what it did, and every failure (transient or
//! fatal), into the run's [`AuditTrail`]. Entries are also forwarded to the
//! `log` facade so embedding applications see them through their own logger.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::fmt;

/// Severity of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Progress information.
    Info,
    /// A recoverable problem, such as a retried download.
    Warn,
    /// A failure.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

/// A single timestamped audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// When the entry was recorded.
    pub at: DateTime<Utc>,
    /// Entry severity.
    pub level: Level,
    /// Human-readable message.
    pub message: String,
}

/// Ordered record of everything that happened during one run.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    entries: Vec<Entry>,
}

impl AuditTrail {
    /// Creates an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an informational entry.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.push(Level::Info, message);
    }

    /// Records a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.push(Level::Warn, message);
    }

    /// Records an error.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.push(Level::Error, message);
    }

    fn push(&mut self, level: Level, message: String) {
        self.entries.push(Entry {
            at: Utc::now(),
            level,
            message,
        });
    }

    /// Returns the recorded entries in order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the messages in order, without timestamps or levels.
    ///
    /// # Examples
    ///
    /// ```
    /// use installer_verify::trail::AuditTrail;
    ///
    /// let mut trail = AuditTrail::new();
    /// trail.info("acquired installer");
    /// trail.warn("no shebang");
    /// assert_eq!(trail.messages(), vec!["acquired installer", "no shebang"]);
    /// ```
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    /// Consumes the trail, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// Returns true if any entry's message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}
