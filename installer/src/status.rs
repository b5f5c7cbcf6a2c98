//! Terminal run status and its exit-code contract.
//!
//! CI callers branch on the process exit code alone, so the mapping from
//! [`Status`] to code is a fixed table that must never depend on anything
//! else about the run.

use crate::error::FailureKind;
use serde::Serialize;
use std::fmt;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for acquisition or integrity failures.
pub const EXIT_DOWNLOAD_FAILED: i32 = 2;
/// Exit code for installer execution failures.
pub const EXIT_INSTALL_FAILED: i32 = 3;
/// Exit code for post-install validation failures.
pub const EXIT_VALIDATION_FAILED: i32 = 4;
/// Exit code for unexpected or internal errors.
pub const EXIT_UNEXPECTED: i32 = 9;

/// Terminal status of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Every requested stage completed.
    Success,
    /// Acquisition or integrity checking failed.
    DownloadFailed,
    /// The installer (or uninstall-only removal) failed.
    InstallFailed,
    /// Post-install evidence was missing or malformed.
    ValidationFailed,
    /// Anything else.
    UnexpectedError,
}

impl Status {
    /// Returns the process exit code for this status.
    ///
    /// # Examples
    ///
    /// ```
    /// use installer_verify::status::Status;
    ///
    /// assert_eq!(Status::Success.exit_code(), 0);
    /// assert_eq!(Status::ValidationFailed.exit_code(), 4);
    /// ```
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => EXIT_SUCCESS,
            Self::DownloadFailed => EXIT_DOWNLOAD_FAILED,
            Self::InstallFailed => EXIT_INSTALL_FAILED,
            Self::ValidationFailed => EXIT_VALIDATION_FAILED,
            Self::UnexpectedError => EXIT_UNEXPECTED,
        }
    }

    /// Returns the status label used in the JSON summary.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::DownloadFailed => "download_failed",
            Self::InstallFailed => "install_failed",
            Self::ValidationFailed => "validation_failed",
            Self::UnexpectedError => "unexpected_error",
        }
    }
}

impl From<FailureKind> for Status {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Download => Self::DownloadFailed,
            FailureKind::InstallExecution => Self::InstallFailed,
            FailureKind::Validation => Self::ValidationFailed,
            FailureKind::Unexpected => Self::UnexpectedError,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
