//! Verification stages and the checks recorded while visiting them.
//!
//! Stages only move forward. [`Stage::can_advance_to`] encodes the ordering
//! so the orchestrator rejects backward or post-terminal transitions instead
//! of silently accepting them.

use crate::error::FailureKind;
use serde::Serialize;
use std::fmt;

/// A state of the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Initial state; request checks happen here.
    Start,
    /// Best-effort removal of a previous install before reinstalling.
    Uninstall,
    /// Removal is the only requested operation.
    UninstallOnly,
    /// Obtaining the installer.
    Acquire,
    /// Checking the acquired file.
    VerifyIntegrity,
    /// Running (or simulating) the installer.
    Install,
    /// Checking post-install evidence.
    Validate,
    /// Terminal success.
    Done,
    /// Terminal failure of the given class.
    Failed(FailureKind),
}

impl Stage {
    /// Returns true for `Done` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Start => 0,
            Self::Uninstall | Self::UninstallOnly => 1,
            Self::Acquire => 2,
            Self::VerifyIntegrity => 3,
            Self::Install => 4,
            Self::Validate => 5,
            Self::Done | Self::Failed(_) => 6,
        }
    }

    /// Returns true when moving from `self` to `next` keeps the machine
    /// moving forward.
    ///
    /// Any non-terminal stage may fail. `UninstallOnly` may only terminate.
    ///
    /// # Examples
    ///
    /// ```
    /// use installer_verify::error::FailureKind;
    /// use installer_verify::stage::Stage;
    ///
    /// assert!(Stage::Acquire.can_advance_to(Stage::VerifyIntegrity));
    /// assert!(Stage::Install.can_advance_to(Stage::Failed(FailureKind::InstallExecution)));
    /// assert!(!Stage::Validate.can_advance_to(Stage::Install));
    /// assert!(!Stage::UninstallOnly.can_advance_to(Stage::Acquire));
    /// ```
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(self, Self::UninstallOnly) {
            return next.is_terminal();
        }
        next.rank() > self.rank()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Uninstall => "uninstall",
            Self::UninstallOnly => "uninstall_only",
            Self::Acquire => "acquire",
            Self::VerifyIntegrity => "verify_integrity",
            Self::Install => "install",
            Self::Validate => "validate",
            Self::Done => "done",
            Self::Failed(FailureKind::Download) => "failed(download)",
            Self::Failed(FailureKind::InstallExecution) => "failed(install_execution)",
            Self::Failed(FailureKind::Validation) => "failed(validation)",
            Self::Failed(FailureKind::Unexpected) => "failed(unexpected)",
        };
        f.write_str(name)
    }
}

/// A check performed during a run, reported in the summary's `checksRun`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Check {
    /// Removal of the install directory.
    Uninstall,
    /// Installer acquisition.
    Download,
    /// Integrity inspection of the acquired file.
    SanityCheck,
    /// Installer execution or simulation.
    Install,
    /// Post-install evidence check.
    Validate,
}
