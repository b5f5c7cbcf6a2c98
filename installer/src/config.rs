//! Runtime tuning for verification runs.
//!
//! Values are deserialised from an optional TOML file and fall back to
//! defaults suited to CI runners. Unknown keys are rejected so that a typo in
//! a pipeline's config fails loudly instead of being ignored.

use crate::acquire::RetryPolicy;
use crate::error::{Result, VerifyError};
use crate::runner::RunnerSettings;
use camino::Utf8Path;
use serde::Deserialize;
use std::time::Duration;

/// Verification settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Total number of fetch attempts for remote installers.
    pub download_attempts: u32,
    /// Delay between fetch attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Global HTTP timeout per fetch attempt, in seconds.
    pub download_timeout_secs: u64,
    /// Installer subprocess timeout, in seconds.
    pub install_timeout_secs: u64,
    /// Wait before post-install validation, in milliseconds.
    pub settle_delay_ms: u64,
    /// Name of the version marker file inside the install directory.
    pub marker_file: String,
    /// Contents written to the marker by simulated installs.
    pub simulated_version: String,
    /// Interpreter used to run the installer.
    pub shell: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            download_attempts: 3,
            retry_delay_ms: 2_000,
            download_timeout_secs: 30,
            install_timeout_secs: 120,
            settle_delay_ms: 0,
            marker_file: "version.txt".to_owned(),
            simulated_version: "1.0.0".to_owned(),
            shell: "bash".to_owned(),
        }
    }
}

impl VerifierConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Config`] if the file cannot be read, does not
    /// parse, or holds values that fail [`Self::validate`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| VerifyError::Config {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        Self::parse(path, &contents)
    }

    /// Parses configuration from TOML text; `path` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Config`] on parse or validation failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use installer_verify::config::VerifierConfig;
    ///
    /// let config = VerifierConfig::parse(Utf8Path::new("ci.toml"), "settle_delay_ms = 250\n")?;
    /// assert_eq!(config.settle_delay_ms, 250);
    /// assert_eq!(config.download_attempts, 3);
    /// # Ok::<(), installer_verify::error::VerifyError>(())
    /// ```
    pub fn parse(path: &Utf8Path, contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| VerifyError::Config {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        config.validate().map_err(|reason| VerifyError::Config {
            path: path.to_owned(),
            reason,
        })?;
        Ok(config)
    }

    /// Checks values that deserialise fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.download_attempts == 0 {
            return Err("download_attempts must be at least 1".to_owned());
        }
        if self.install_timeout_secs == 0 {
            return Err("install_timeout_secs must be at least 1".to_owned());
        }
        let marker = self.marker_file.trim();
        if marker.is_empty() || marker.contains('/') || marker == "." || marker == ".." {
            return Err(format!(
                "marker_file must be a plain file name, got {:?}",
                self.marker_file
            ));
        }
        if self.shell.trim().is_empty() {
            return Err("shell must not be empty".to_owned());
        }
        Ok(())
    }

    /// Retry behaviour for remote acquisition.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.download_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// HTTP timeout for a single fetch attempt.
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Wait applied before post-install validation.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Settings for the installer runner.
    #[must_use]
    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            shell: self.shell.clone(),
            timeout: Duration::from_secs(self.install_timeout_secs),
            marker_file: self.marker_file.clone(),
            simulated_version: self.simulated_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_ci_baseline() {
        let config = VerifierConfig::default();

        assert_eq!(config.download_attempts, 3);
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.marker_file, "version.txt");
        assert_eq!(config.runner_settings().timeout, Duration::from_secs(120));
    }

    #[rstest]
    fn deserialises_overrides_from_toml() {
        let source = concat!(
            "download_attempts = 5\n",
            "retry_delay_ms = 10\n",
            "marker_file = \"VERSION\"\n",
        );

        let config = VerifierConfig::parse(Utf8Path::new("ci.toml"), source)
            .expect("expected configuration to parse successfully");

        assert_eq!(config.retry_policy().attempts, 5);
        assert_eq!(config.retry_policy().delay, Duration::from_millis(10));
        assert_eq!(config.marker_file, "VERSION");
        assert_eq!(config.shell, "bash");
    }

    #[rstest]
    fn rejects_unknown_fields() {
        let outcome = VerifierConfig::parse(Utf8Path::new("ci.toml"), "retries = 3\n");

        assert!(matches!(outcome, Err(VerifyError::Config { .. })));
    }

    #[rstest]
    #[case::zero_attempts("download_attempts = 0\n")]
    #[case::zero_timeout("install_timeout_secs = 0\n")]
    #[case::nested_marker("marker_file = \"bin/version.txt\"\n")]
    #[case::blank_marker("marker_file = \"  \"\n")]
    #[case::blank_shell("shell = \"\"\n")]
    fn rejects_unusable_values(#[case] source: &str) {
        let outcome = VerifierConfig::parse(Utf8Path::new("ci.toml"), source);

        assert!(
            matches!(outcome, Err(VerifyError::Config { .. })),
            "expected {source:?} to be rejected"
        );
    }

    #[rstest]
    fn load_reports_missing_file() {
        let temp_dir = tempfile::tempdir().expect("create tempdir");
        let path = camino::Utf8PathBuf::from_path_buf(temp_dir.path().join("absent.toml"))
            .expect("utf-8 temp path");

        let err = VerifierConfig::load(&path).expect_err("missing file should fail");

        assert!(err.to_string().contains("absent.toml"));
    }
}
