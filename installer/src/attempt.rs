//! Mutable state of a run in progress.
//!
//! An [`Attempt`] is created when a run starts, moves forward through
//! [`Stage`]s, and is consumed exactly once by [`Attempt::into_record`].

use crate::error::{Result, VerifyError};
use crate::record::ResultRecord;
use crate::request::InstallRequest;
use crate::stage::{Check, Stage};
use crate::status::Status;
use crate::trail::AuditTrail;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};

/// State threaded through the orchestrator for one run.
#[derive(Debug)]
pub struct Attempt {
    stage: Stage,
    local_installer: Option<Utf8PathBuf>,
    simulated: bool,
    errors: Vec<String>,
    checks_run: Vec<Check>,
    trail: AuditTrail,
    started_at: DateTime<Utc>,
}

impl Default for Attempt {
    fn default() -> Self {
        Self::new()
    }
}

impl Attempt {
    /// Starts a new attempt in [`Stage::Start`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            stage: Stage::Start,
            local_installer: None,
            simulated: false,
            errors: Vec::new(),
            checks_run: Vec::new(),
            trail: AuditTrail::new(),
            started_at: Utc::now(),
        }
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::StageOrder`] if `next` would move backwards or
    /// leave a terminal stage.
    pub fn advance(&mut self, next: Stage) -> Result<()> {
        if !self.stage.can_advance_to(next) {
            return Err(VerifyError::StageOrder {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }

    /// Records that `check` was run.
    pub fn record_check(&mut self, check: Check) {
        self.checks_run.push(check);
    }

    /// Records a failure that does not end the run.
    pub fn record_error(&mut self, err: &VerifyError) {
        let message = err.to_string();
        self.trail.error(message.clone());
        self.errors.push(message);
    }

    /// Records `err` and moves to the matching failed stage.
    pub fn fail(&mut self, err: &VerifyError) {
        self.record_error(err);
        if !self.stage.is_terminal() {
            self.stage = Stage::Failed(err.kind());
        }
    }

    /// Remembers where the acquired installer lives.
    pub fn set_local_installer(&mut self, path: Utf8PathBuf) {
        self.local_installer = Some(path);
    }

    /// Path of the acquired installer, once acquisition has succeeded.
    #[must_use]
    pub fn local_installer(&self) -> Option<&Utf8Path> {
        self.local_installer.as_deref()
    }

    /// Marks the install as simulated.
    pub fn mark_simulated(&mut self) {
        self.simulated = true;
    }

    /// Whether the install was simulated.
    #[must_use]
    pub fn simulated(&self) -> bool {
        self.simulated
    }

    /// The audit trail, for components that record into it.
    pub fn trail_mut(&mut self) -> &mut AuditTrail {
        &mut self.trail
    }

    /// The audit trail so far.
    #[must_use]
    pub fn trail(&self) -> &AuditTrail {
        &self.trail
    }

    /// Terminal status implied by the current stage.
    ///
    /// A run that never reached a terminal stage is an unexpected error.
    #[must_use]
    pub fn terminal_status(&self) -> Status {
        match self.stage {
            Stage::Done => Status::Success,
            Stage::Failed(kind) => Status::from(kind),
            _ => Status::UnexpectedError,
        }
    }

    /// Consumes the attempt and produces the run's result record.
    #[must_use]
    pub fn into_record(mut self, request: &InstallRequest) -> ResultRecord {
        if !self.stage.is_terminal() {
            self.trail
                .error(format!("run ended in non-terminal stage {}", self.stage));
        }
        let status = self.terminal_status();
        self.trail.info(format!("final status: {status}"));

        let timestamp_end = Utc::now();
        let entries = self.trail.into_entries();
        ResultRecord {
            app_name: request.app_name.clone().unwrap_or_default(),
            install_dir: request.install_dir.clone(),
            status,
            exit_code: status.exit_code(),
            simulated: self.simulated,
            timestamp_start: self.started_at,
            timestamp_end,
            duration_seconds: (timestamp_end - self.started_at).num_seconds(),
            checks_run: self.checks_run,
            errors: self.errors,
            messages: entries.iter().map(|e| e.message.clone()).collect(),
            entries,
        }
    }
}
