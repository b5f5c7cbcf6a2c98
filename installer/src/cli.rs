//! CLI argument definitions for the installer verifier.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::VerifierConfig;
use crate::error::{Result, VerifyError};
use crate::request::{InjectedFault, InstallRequest};
use camino::Utf8PathBuf;
use clap::Parser;

/// Verify that an installer installs, validates and uninstalls cleanly.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "installer-verify")]
#[command(version, about)]
#[command(long_about = concat!(
    "Verify that an installer installs, validates and uninstalls cleanly.\n\n",
    "The installer is fetched from a local path or an HTTP(S) URL, sanity ",
    "checked, run non-interactively with INSTALL_DIR and APP_NAME set, and the ",
    "install directory is then checked for a version marker. Installers that ",
    "fail only because they need interactive privileges are simulated instead.\n\n",
    "A text log and a JSON summary are written for every run.",
))]
#[command(after_help = concat!(
    "EXIT CODES:\n",
    "  0  success\n",
    "  2  download or integrity failure\n",
    "  3  installer execution failure\n",
    "  4  post-install validation failure\n",
    "  9  unexpected error\n\n",
    "EXAMPLES:\n",
    "  Verify a local installer:\n",
    "    $ installer-verify --build-url ./installer.sh --app-name MyApp --install-dir /tmp/myapp\n\n",
    "  Reinstall from a URL without running it:\n",
    "    $ installer-verify --build-url https://example.com/install.sh --app-name MyApp \\\n",
    "        --install-dir /tmp/myapp --uninstall --dry-run\n\n",
    "  Remove a previous install:\n",
    "    $ installer-verify --install-dir /tmp/myapp --uninstall",
))]
pub struct Cli {
    /// Local path or HTTP(S) URL of the installer.
    #[arg(long, value_name = "PATH|URL")]
    pub build_url: Option<String>,

    /// Label of the application being installed.
    #[arg(long, value_name = "NAME")]
    pub app_name: Option<String>,

    /// Absolute directory the installer should populate.
    #[arg(long, value_name = "DIR")]
    pub install_dir: Utf8PathBuf,

    /// Simulate the install instead of running the installer.
    #[arg(long)]
    pub dry_run: bool,

    /// Remove the install directory (before installing, if a build URL is given).
    #[arg(long)]
    pub uninstall: bool,

    /// Write the text log here instead of the report directory.
    #[arg(long, value_name = "FILE")]
    pub log_path: Option<Utf8PathBuf>,

    /// Fail with an unexpected error to exercise exit code 9.
    #[arg(long)]
    pub force_exception: bool,

    /// TOML file with verification settings.
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Directory for the log and JSON summary.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub report_dir: Utf8PathBuf,

    /// Wait this long before validating the install.
    #[arg(long, value_name = "MS")]
    pub settle_delay_ms: Option<u64>,

    /// Kill the installer after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub install_timeout_secs: Option<u64>,

    /// Suppress progress output (the final status is still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Builds the request for this invocation.
    #[must_use]
    pub fn to_request(&self) -> InstallRequest {
        InstallRequest {
            build_source: self.build_url.clone(),
            app_name: self.app_name.clone(),
            install_dir: self.install_dir.clone(),
            dry_run: self.dry_run,
            uninstall_requested: self.uninstall,
            log_path: self.log_path.clone(),
            fault: self.force_exception.then_some(InjectedFault::Unexpected),
        }
    }

    /// Applies command-line overrides on top of `config` and validates the
    /// merged result.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Config`] if an override makes the configuration
    /// unusable, such as `--install-timeout-secs 0`.
    pub fn apply_overrides(&self, mut config: VerifierConfig) -> Result<VerifierConfig> {
        if let Some(ms) = self.settle_delay_ms {
            config.settle_delay_ms = ms;
        }
        if let Some(secs) = self.install_timeout_secs {
            config.install_timeout_secs = secs;
        }
        config.validate().map_err(|reason| VerifyError::Config {
            path: self
                .config
                .clone()
                .unwrap_or_else(|| Utf8PathBuf::from("<command line>")),
            reason,
        })?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
