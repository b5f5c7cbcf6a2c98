//! Idempotent removal of an install directory.

use crate::error::{Result, VerifyError};
use camino::{Utf8Component, Utf8Path};
use std::io::ErrorKind;

/// What an uninstall did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// Something was removed.
    Removed,
    /// Nothing was there to remove.
    AlreadyAbsent,
}

/// Removes `install_dir` and everything beneath it.
///
/// A stray file at the path is removed too. Absence counts as success, so
/// calling this twice in a row is safe.
///
/// # Errors
///
/// Returns [`VerifyError::InstallExecution`] if removal fails, if
/// `install_dir` is a filesystem root or steps through `..`.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use installer_verify::uninstall::{UninstallOutcome, uninstall};
///
/// let dir = tempfile::tempdir()?;
/// let target = Utf8PathBuf::from_path_buf(dir.path().join("app")).expect("utf-8 path");
/// std::fs::create_dir_all(target.join("bin"))?;
///
/// assert_eq!(uninstall(&target)?, UninstallOutcome::Removed);
/// assert_eq!(uninstall(&target)?, UninstallOutcome::AlreadyAbsent);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn uninstall(install_dir: &Utf8Path) -> Result<UninstallOutcome> {
    let relative_hop = install_dir
        .components()
        .any(|c| matches!(c, Utf8Component::ParentDir | Utf8Component::CurDir));
    if install_dir.as_str().is_empty() || install_dir.parent().is_none() || relative_hop {
        return Err(VerifyError::InstallExecution {
            reason: format!("refusing to remove {install_dir:?}"),
        });
    }

    let metadata = match std::fs::symlink_metadata(install_dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(UninstallOutcome::AlreadyAbsent),
        Err(e) => return Err(removal_error(install_dir, &e)),
    };

    let removal = if metadata.is_dir() {
        std::fs::remove_dir_all(install_dir)
    } else {
        std::fs::remove_file(install_dir)
    };
    match removal {
        Ok(()) => Ok(UninstallOutcome::Removed),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(UninstallOutcome::AlreadyAbsent),
        Err(e) => Err(removal_error(install_dir, &e)),
    }
}

fn removal_error(install_dir: &Utf8Path, err: &std::io::Error) -> VerifyError {
    VerifyError::InstallExecution {
        reason: format!("cannot remove {install_dir}: {err}"),
    }
}
