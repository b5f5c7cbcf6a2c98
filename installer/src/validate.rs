//! Post-install evidence checks.

use crate::error::{Result, VerifyError};
use crate::trail::AuditTrail;
use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;

/// Evidence found by a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Path of the version marker.
    pub marker_path: Utf8PathBuf,
    /// Trimmed marker contents.
    pub version: String,
}

/// Checks that an install left its expected evidence behind.
#[derive(Debug, Clone)]
pub struct PostInstallValidator {
    settle_delay: Duration,
    marker_file: String,
}

impl PostInstallValidator {
    /// Creates a validator that waits `settle_delay` before looking for
    /// `marker_file` inside the install directory.
    #[must_use]
    pub fn new(settle_delay: Duration, marker_file: impl Into<String>) -> Self {
        Self {
            settle_delay,
            marker_file: marker_file.into(),
        }
    }

    /// Validates `install_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Validation`] if the directory is missing or is
    /// not a directory, or if the marker is missing, not a file, or empty.
    pub fn validate(
        &self,
        install_dir: &Utf8Path,
        trail: &mut AuditTrail,
    ) -> Result<ValidationReport> {
        if !self.settle_delay.is_zero() {
            trail.info(format!(
                "waiting {} ms before validation",
                self.settle_delay.as_millis()
            ));
            std::thread::sleep(self.settle_delay);
        }

        let marker_path = install_dir.join(&self.marker_file);
        let dir_exists = install_dir.is_dir();
        let marker_exists = marker_path.is_file();
        trail.info(format!(
            "validation: dir exists: {dir_exists}, {}: {marker_exists}",
            self.marker_file
        ));

        if !dir_exists {
            let reason = if install_dir.exists() {
                "install path is not a directory"
            } else {
                "install directory does not exist"
            };
            return Err(validation_error(install_dir, reason));
        }
        if !marker_exists {
            return Err(validation_error(
                &marker_path,
                "version marker is missing or not a file",
            ));
        }

        let contents = std::fs::read_to_string(&marker_path).map_err(|e| {
            validation_error(&marker_path, &format!("cannot read version marker: {e}"))
        })?;
        let version = contents.trim();
        if version.is_empty() {
            return Err(validation_error(&marker_path, "version marker is empty"));
        }

        trail.info(format!("installed version: {version}"));
        Ok(ValidationReport {
            version: version.to_owned(),
            marker_path,
        })
    }
}

fn validation_error(path: &Utf8Path, reason: &str) -> VerifyError {
    VerifyError::Validation {
        path: path.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct InstallDir {
        _dir: TempDir,
        path: Utf8PathBuf,
    }

    #[fixture]
    fn install_dir() -> InstallDir {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("myapp")).expect("utf-8 path");
        InstallDir { _dir: dir, path }
    }

    fn validator() -> PostInstallValidator {
        PostInstallValidator::new(Duration::ZERO, "version.txt")
    }

    #[rstest]
    fn accepts_directory_with_marker(install_dir: InstallDir) {
        std::fs::create_dir_all(&install_dir.path).expect("create install dir");
        std::fs::write(install_dir.path.join("version.txt"), "1.2.3\n").expect("write marker");
        let mut trail = AuditTrail::new();

        let report = validator()
            .validate(&install_dir.path, &mut trail)
            .expect("evidence present");

        assert_eq!(report.version, "1.2.3");
        assert!(trail.contains("installed version: 1.2.3"));
    }

    #[rstest]
    fn rejects_missing_directory(install_dir: InstallDir) {
        let err = validator()
            .validate(&install_dir.path, &mut AuditTrail::new())
            .expect_err("missing dir");

        assert!(err.to_string().contains("does not exist"));
    }

    #[rstest]
    fn rejects_file_in_place_of_directory(install_dir: InstallDir) {
        std::fs::write(&install_dir.path, "oops").expect("write file");

        let err = validator()
            .validate(&install_dir.path, &mut AuditTrail::new())
            .expect_err("file is not a dir");

        assert!(err.to_string().contains("not a directory"));
    }

    #[rstest]
    #[case::missing(None, "missing")]
    #[case::empty(Some("   \n"), "empty")]
    fn rejects_unusable_marker(
        install_dir: InstallDir,
        #[case] contents: Option<&str>,
        #[case] expected: &str,
    ) {
        std::fs::create_dir_all(&install_dir.path).expect("create install dir");
        if let Some(contents) = contents {
            std::fs::write(install_dir.path.join("version.txt"), contents).expect("write marker");
        }

        let err = validator()
            .validate(&install_dir.path, &mut AuditTrail::new())
            .expect_err("marker unusable");

        assert!(matches!(err, VerifyError::Validation { .. }));
        assert!(err.to_string().contains(expected), "{err}");
    }

    #[rstest]
    fn settle_delay_is_recorded(install_dir: InstallDir) {
        std::fs::create_dir_all(&install_dir.path).expect("create install dir");
        std::fs::write(install_dir.path.join("version.txt"), "1.0.0").expect("write marker");
        let mut trail = AuditTrail::new();

        PostInstallValidator::new(Duration::from_millis(5), "version.txt")
            .validate(&install_dir.path, &mut trail)
            .expect("evidence present");

        assert!(trail.contains("waiting 5 ms"));
    }
}
