//! Error types for installer verification.
//!
//! Each variant belongs to one failure class of the verification contract.
//! [`VerifyError::kind`] performs that classification so the orchestrator can
//! map a failure to a terminal status without inspecting messages.

use crate::stage::Stage;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Failure classes recognised by the verification pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Acquisition or integrity failure.
    Download,
    /// Installer subprocess or filesystem failure during install/uninstall.
    InstallExecution,
    /// Post-install evidence missing or malformed.
    Validation,
    /// Anything the other classes do not anticipate, including injected faults.
    Unexpected,
}

/// Errors that can occur while verifying an installer.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The installer could not be obtained from its source.
    #[error("download failed for {source_ref}: {reason}")]
    Download {
        /// The build source as given by the caller.
        source_ref: String,
        /// Description of the failure.
        reason: String,
    },

    /// The acquired file does not look like a usable installer.
    #[error("integrity check failed for {path}: {reason}")]
    Integrity {
        /// Path of the inspected installer.
        path: Utf8PathBuf,
        /// Description of the failed check.
        reason: String,
    },

    /// Running the installer, or preparing its evidence, failed.
    #[error("installer execution failed: {reason}")]
    InstallExecution {
        /// Description of the failure.
        reason: String,
    },

    /// Post-install evidence is missing or malformed.
    #[error("post-install validation failed for {path}: {reason}")]
    Validation {
        /// Path that failed validation.
        path: Utf8PathBuf,
        /// Description of the failed check.
        reason: String,
    },

    /// The request lacks fields required for the requested operation.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Description of the missing or malformed field.
        reason: String,
    },

    /// A fault injected through the request for testing.
    #[error("injected fault: {0}")]
    InjectedFault(String),

    /// The configuration file could not be read or parsed.
    #[error("configuration error in {path}: {reason}")]
    Config {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The state machine was asked to move backwards or out of a terminal state.
    #[error("illegal stage transition from {from} to {to}")]
    StageOrder {
        /// Stage the attempt was in.
        from: Stage,
        /// Stage that was requested.
        to: Stage,
    },

    /// An I/O operation failed outside any classified check.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifyError {
    /// Returns the failure class this error belongs to.
    ///
    /// Integrity failures count as download failures: from the caller's
    /// perspective a corrupt download and a missing one are the same fault.
    ///
    /// # Examples
    ///
    /// ```
    /// use installer_verify::error::{FailureKind, VerifyError};
    ///
    /// let err = VerifyError::Integrity {
    ///     path: "/tmp/installer.sh".into(),
    ///     reason: "file is empty".to_owned(),
    /// };
    /// assert_eq!(err.kind(), FailureKind::Download);
    /// ```
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Download { .. } | Self::Integrity { .. } => FailureKind::Download,
            Self::InstallExecution { .. } => FailureKind::InstallExecution,
            Self::Validation { .. } => FailureKind::Validation,
            Self::InvalidRequest { .. }
            | Self::InjectedFault(_)
            | Self::Config { .. }
            | Self::StageOrder { .. }
            | Self::Io(_) => FailureKind::Unexpected,
        }
    }
}

/// Result type alias using [`VerifyError`].
pub type Result<T> = std::result::Result<T, VerifyError>;
