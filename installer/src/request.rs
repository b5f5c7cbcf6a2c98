//! Inputs for a single verification run.

use crate::error::{Result, VerifyError};
use camino::{Utf8Component, Utf8PathBuf};
use std::fmt;

/// A fault injected into a run to exercise the unexpected-error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFault {
    /// Fail at the start of the run as if something unanticipated happened.
    Unexpected,
}

impl fmt::Display for InjectedFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unexpected => f.write_str("forced exception for testing status code 9"),
        }
    }
}

/// Inputs for one run. Built once and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
    /// Local path or HTTP(S) URL of the installer.
    pub build_source: Option<String>,
    /// Label of the application being installed.
    pub app_name: Option<String>,
    /// Absolute directory the installer should populate.
    pub install_dir: Utf8PathBuf,
    /// Simulate the install instead of running the installer.
    pub dry_run: bool,
    /// Remove `install_dir` (before installing, if a source is given).
    pub uninstall_requested: bool,
    /// Explicit path for the text log.
    pub log_path: Option<Utf8PathBuf>,
    /// Fault to inject, if any.
    pub fault: Option<InjectedFault>,
}

/// The operation a valid request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan<'a> {
    /// Only remove the install directory.
    UninstallOnly,
    /// Acquire, check, run and validate an installer.
    Install {
        /// Build source as given.
        source: &'a str,
        /// Application label.
        app_name: &'a str,
        /// Remove any previous install first.
        uninstall_first: bool,
    },
}

impl InstallRequest {
    /// Works out what the request asks for, rejecting incomplete requests.
    ///
    /// An empty build source is accepted here; the acquirer rejects it as a
    /// download failure.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidRequest`] when `install_dir` is empty,
    /// relative or contains `.`/`..` components, or when an install lacks a
    /// build source or application name.
    ///
    /// # Examples
    ///
    /// ```
    /// use installer_verify::request::{InstallRequest, Plan};
    ///
    /// let request = InstallRequest {
    ///     install_dir: "/tmp/myapp".into(),
    ///     uninstall_requested: true,
    ///     ..InstallRequest::default()
    /// };
    /// assert_eq!(request.plan()?, Plan::UninstallOnly);
    /// # Ok::<(), installer_verify::error::VerifyError>(())
    /// ```
    pub fn plan(&self) -> Result<Plan<'_>> {
        if self.install_dir.as_str().is_empty() {
            return Err(invalid("install directory is required"));
        }
        if !self.install_dir.is_absolute() {
            return Err(invalid(&format!(
                "install directory must be absolute, got {}",
                self.install_dir
            )));
        }
        if self
            .install_dir
            .components()
            .any(|c| matches!(c, Utf8Component::ParentDir | Utf8Component::CurDir))
        {
            return Err(invalid(&format!(
                "install directory must not contain `.` or `..`, got {}",
                self.install_dir
            )));
        }

        let Some(source) = self.build_source.as_deref() else {
            if self.uninstall_requested {
                return Ok(Plan::UninstallOnly);
            }
            return Err(invalid("a build source is required to install"));
        };

        let app_name = self
            .app_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| invalid("an application name is required to install"))?;

        Ok(Plan::Install {
            source,
            app_name,
            uninstall_first: self.uninstall_requested,
        })
    }
}

fn invalid(reason: &str) -> VerifyError {
    VerifyError::InvalidRequest {
        reason: reason.to_owned(),
    }
}
