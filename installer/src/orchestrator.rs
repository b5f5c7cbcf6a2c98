//! Drives one verification run from request to result record.
//!
//! The orchestrator owns no I/O policy of its own: downloads go through a
//! [`Fetcher`], installer processes through a [`ProcessLauncher`], and all
//! tuning comes from [`VerifierConfig`]. Every path through [`Orchestrator::run`]
//! ends in a [`ResultRecord`]; errors are folded into the record rather than
//! returned.

use crate::acquire::{Acquirer, Fetcher};
use crate::attempt::Attempt;
use crate::config::VerifierConfig;
use crate::error::{Result, VerifyError};
use crate::integrity::check_integrity;
use crate::record::ResultRecord;
use crate::request::{InstallRequest, Plan};
use crate::runner::{InstallerRunner, ProcessLauncher};
use crate::stage::{Check, Stage};
use crate::uninstall::{UninstallOutcome, uninstall};
use crate::validate::PostInstallValidator;
use camino::Utf8Path;

type ValidateHook<'a> = Box<dyn Fn(&Utf8Path) + 'a>;

/// Runs verification attempts.
pub struct Orchestrator<'a> {
    config: &'a VerifierConfig,
    fetcher: &'a dyn Fetcher,
    launcher: &'a dyn ProcessLauncher,
    before_validate: Option<ValidateHook<'a>>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator with the given collaborators.
    #[must_use]
    pub fn new(
        config: &'a VerifierConfig,
        fetcher: &'a dyn Fetcher,
        launcher: &'a dyn ProcessLauncher,
    ) -> Self {
        Self {
            config,
            fetcher,
            launcher,
            before_validate: None,
        }
    }

    /// Registers a hook called with the install directory after the install
    /// step and before validation.
    #[must_use]
    pub fn with_before_validate(mut self, hook: impl Fn(&Utf8Path) + 'a) -> Self {
        self.before_validate = Some(Box::new(hook));
        self
    }

    /// Runs one verification attempt for `request`.
    #[must_use]
    pub fn run(&self, request: &InstallRequest) -> ResultRecord {
        let mut attempt = Attempt::new();
        attempt
            .trail_mut()
            .info(format!("verification started for {}", request.install_dir));
        if let Err(err) = self.drive(request, &mut attempt) {
            attempt.fail(&err);
        }
        attempt.into_record(request)
    }

    /// Builds the record for a run that could not start, such as one with an
    /// unusable configuration.
    #[must_use]
    pub fn abort(request: &InstallRequest, err: &VerifyError) -> ResultRecord {
        let mut attempt = Attempt::new();
        attempt.fail(err);
        attempt.into_record(request)
    }

    fn drive(&self, request: &InstallRequest, attempt: &mut Attempt) -> Result<()> {
        if let Some(fault) = request.fault {
            return Err(VerifyError::InjectedFault(fault.to_string()));
        }

        match request.plan()? {
            Plan::UninstallOnly => self.uninstall_only(&request.install_dir, attempt),
            Plan::Install {
                source,
                app_name,
                uninstall_first,
            } => {
                if uninstall_first {
                    self.uninstall_before_install(&request.install_dir, attempt)?;
                }
                self.install(request, source, app_name, attempt)
            }
        }
    }

    fn uninstall_only(&self, install_dir: &Utf8Path, attempt: &mut Attempt) -> Result<()> {
        attempt.advance(Stage::UninstallOnly)?;
        attempt.record_check(Check::Uninstall);
        let outcome = uninstall(install_dir)?;
        attempt
            .trail_mut()
            .info(describe_uninstall(install_dir, outcome));
        attempt.advance(Stage::Done)
    }

    /// Removal failures here are recorded but do not stop the install.
    fn uninstall_before_install(&self, install_dir: &Utf8Path, attempt: &mut Attempt) -> Result<()> {
        attempt.advance(Stage::Uninstall)?;
        attempt.record_check(Check::Uninstall);
        match uninstall(install_dir) {
            Ok(outcome) => attempt
                .trail_mut()
                .info(describe_uninstall(install_dir, outcome)),
            Err(err) => attempt.record_error(&err),
        }
        Ok(())
    }

    fn install(
        &self,
        request: &InstallRequest,
        source: &str,
        app_name: &str,
        attempt: &mut Attempt,
    ) -> Result<()> {
        let install_dir = request.install_dir.as_path();

        attempt.advance(Stage::Acquire)?;
        attempt.record_check(Check::Download);
        let acquirer = Acquirer::new(self.fetcher, self.config.retry_policy());
        let installer = acquirer.acquire(source, attempt.trail_mut())?;
        attempt.set_local_installer(installer.path().to_owned());

        attempt.advance(Stage::VerifyIntegrity)?;
        attempt.record_check(Check::SanityCheck);
        let report = check_integrity(installer.path())?;
        attempt.trail_mut().info(format!(
            "sanity check passed: {} bytes, sha256 {}",
            report.size, report.sha256
        ));
        if !report.has_shebang {
            attempt.trail_mut().warn(format!(
                "installer has no shebang line; running it with {}",
                self.config.shell
            ));
        }

        attempt.advance(Stage::Install)?;
        attempt.record_check(Check::Install);
        let runner = InstallerRunner::new(self.launcher, self.config.runner_settings());
        let outcome = runner.run_install(
            installer.path(),
            install_dir,
            app_name,
            request.dry_run,
            attempt.trail_mut(),
        )?;
        if outcome.simulated {
            attempt.mark_simulated();
        }

        if let Some(hook) = &self.before_validate {
            hook(install_dir);
        }

        attempt.advance(Stage::Validate)?;
        attempt.record_check(Check::Validate);
        let validator =
            PostInstallValidator::new(self.config.settle_delay(), self.config.marker_file.as_str());
        validator.validate(install_dir, attempt.trail_mut())?;
        attempt.advance(Stage::Done)
    }
}

fn describe_uninstall(install_dir: &Utf8Path, outcome: UninstallOutcome) -> String {
    match outcome {
        UninstallOutcome::Removed => format!("uninstalled {install_dir}"),
        UninstallOutcome::AlreadyAbsent => format!("nothing to uninstall at {install_dir}"),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
