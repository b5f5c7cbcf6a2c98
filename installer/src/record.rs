//! The terminal, immutable result of a verification run.
//!
//! A [`ResultRecord`] is what the reporter renders and what CI consumes.
//! Its `status` and `exit_code` are always consistent because the code is
//! derived from the status at construction.

use crate::stage::Check;
use crate::status::Status;
use crate::trail::Entry;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one verification run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub(crate) app_name: String,
    pub(crate) install_dir: Utf8PathBuf,
    pub(crate) status: Status,
    pub(crate) exit_code: i32,
    pub(crate) simulated: bool,
    pub(crate) timestamp_start: DateTime<Utc>,
    pub(crate) timestamp_end: DateTime<Utc>,
    pub(crate) duration_seconds: i64,
    pub(crate) checks_run: Vec<Check>,
    pub(crate) errors: Vec<String>,
    pub(crate) messages: Vec<String>,
    #[serde(skip)]
    pub(crate) entries: Vec<Entry>,
}

impl ResultRecord {
    /// Application label, empty for uninstall-only runs without one.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Target install directory.
    #[must_use]
    pub fn install_dir(&self) -> &Utf8Path {
        &self.install_dir
    }

    /// Terminal status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Process exit code; always `self.status().exit_code()`.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Whether install evidence was simulated.
    #[must_use]
    pub fn simulated(&self) -> bool {
        self.simulated
    }

    /// When the run started.
    #[must_use]
    pub fn timestamp_start(&self) -> DateTime<Utc> {
        self.timestamp_start
    }

    /// When the run ended.
    #[must_use]
    pub fn timestamp_end(&self) -> DateTime<Utc> {
        self.timestamp_end
    }

    /// Checks visited, in order.
    #[must_use]
    pub fn checks_run(&self) -> &[Check] {
        &self.checks_run
    }

    /// Failures recorded during the run, in order.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// The audit trail messages, in order.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// The audit trail with timestamps and levels.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
