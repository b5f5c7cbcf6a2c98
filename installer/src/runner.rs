//! Installer execution with a classified simulation fallback.
//!
//! The installer runs non-interactively under a timeout. Its outcome is
//! classified into [`InstallOutcome`] before anything else happens, so a
//! genuine failure can never be mistaken for the privilege-prompt case that
//! triggers simulation.

use crate::error::{Result, VerifyError};
use crate::trail::AuditTrail;
use camino::Utf8Path;
use std::io::{ErrorKind, Read};
use std::process::{Command, ExitStatus, Output, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Exit codes that indicate the installer could not obtain privileges:
/// `EX_NOPERM` and the shell's "cannot execute".
const PRIVILEGE_EXIT_CODES: [i32; 2] = [77, 126];

/// Lowercase stderr fragments emitted by privilege prompts and denials.
const PRIVILEGE_PATTERNS: [&str; 6] = [
    "sudo:",
    "a terminal is required",
    "a password is required",
    "must be run as root",
    "permission denied",
    "operation not permitted",
];

/// How long to wait for captured output after the installer has exited.
const OUTPUT_GRACE: Duration = Duration::from_secs(5);

/// A fully specified installer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    /// Program to execute (the interpreter).
    pub program: String,
    /// Arguments, starting with the installer path.
    pub args: Vec<String>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
    /// Maximum run time before the process is killed.
    pub timeout: Duration,
}

impl InstallCommand {
    /// Returns the value of an environment variable set for this command.
    #[must_use]
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Errors raised while launching or waiting for the installer.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The process outlived its timeout and was killed.
    #[error("installer timed out after {} seconds", timeout.as_secs())]
    TimedOut {
        /// The timeout that expired.
        timeout: Duration,
    },

    /// Waiting for the process failed.
    #[error("I/O error while waiting for installer: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstraction for running the installer process.
pub trait ProcessLauncher {
    /// Runs `command` to completion and returns its captured output.
    ///
    /// # Errors
    ///
    /// Returns a [`LaunchError`] if the process cannot be started, cannot be
    /// waited on, or exceeds its timeout.
    fn launch(&self, command: &InstallCommand) -> std::result::Result<Output, LaunchError>;
}

/// Launches installers as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, command: &InstallCommand) -> std::result::Result<Output, LaunchError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: command.program.clone(),
            source,
        })?;
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        match child.wait_timeout(command.timeout)? {
            Some(status) => Ok(Output {
                status,
                stdout: collect(stdout),
                stderr: collect(stderr),
            }),
            None => {
                // Timed out: kill and reap.
                let _ = child.kill();
                let _ = child.wait();
                Err(LaunchError::TimedOut {
                    timeout: command.timeout,
                })
            }
        }
    }
}

/// Reads a pipe to the end on a helper thread so a chatty installer cannot
/// fill the pipe buffer and stall.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if pipe.read_to_end(&mut buf).is_ok() {
            let _ = tx.send(buf);
        }
    });
    rx
}

/// Collects drained output. Background processes spawned by the installer
/// may hold the pipe open, so the wait is bounded.
fn collect(rx: Option<Receiver<Vec<u8>>>) -> Vec<u8> {
    rx.and_then(|rx| rx.recv_timeout(OUTPUT_GRACE).ok())
        .unwrap_or_default()
}

/// Classified result of running the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The installer exited 0.
    Succeeded,
    /// The installer failed because it needed privileges the runner cannot
    /// grant; evidence will be simulated.
    NeedsPrivilegeFallback {
        /// Which signal of privilege failure was observed.
        reason: String,
    },
    /// The installer failed for any other reason.
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

/// Classifies the result of a launch.
///
/// # Examples
///
/// ```
/// use installer_verify::runner::{InstallOutcome, classify_outcome};
/// use std::process::{Command, Output};
///
/// let output: Output = Command::new("true").output()?;
/// assert_eq!(classify_outcome(&Ok(output)), InstallOutcome::Succeeded);
/// # Ok::<(), std::io::Error>(())
/// ```
#[must_use]
pub fn classify_outcome(result: &std::result::Result<Output, LaunchError>) -> InstallOutcome {
    let output = match result {
        Ok(output) => output,
        Err(LaunchError::Spawn { program, source })
            if source.kind() == ErrorKind::PermissionDenied =>
        {
            return InstallOutcome::NeedsPrivilegeFallback {
                reason: format!("permission denied starting {program}"),
            };
        }
        Err(err) => {
            return InstallOutcome::Failed {
                reason: err.to_string(),
            };
        }
    };

    if output.status.success() {
        return InstallOutcome::Succeeded;
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    match privilege_reason(output.status, &stderr) {
        Some(reason) => InstallOutcome::NeedsPrivilegeFallback { reason },
        None => InstallOutcome::Failed {
            reason: failure_reason(output.status, &stderr),
        },
    }
}

fn privilege_reason(status: ExitStatus, stderr: &str) -> Option<String> {
    if let Some(code) = status.code().filter(|c| PRIVILEGE_EXIT_CODES.contains(c)) {
        return Some(format!("installer exited with privilege code {code}"));
    }
    if let Some(reason) = signal_reason(status) {
        return Some(reason);
    }
    let lower = stderr.to_ascii_lowercase();
    PRIVILEGE_PATTERNS
        .iter()
        .find(|pattern| lower.contains(*pattern))
        .map(|pattern| format!("installer stderr matched {pattern:?}"))
}

#[cfg(unix)]
fn signal_reason(status: ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;

    status
        .signal()
        .filter(|sig| [libc::SIGHUP, libc::SIGTTIN, libc::SIGTTOU].contains(sig))
        .map(|sig| format!("installer stopped by signal {sig} while waiting for a terminal"))
}

#[cfg(not(unix))]
fn signal_reason(_status: ExitStatus) -> Option<String> {
    None
}

fn failure_reason(status: ExitStatus, stderr: &str) -> String {
    match stderr.lines().rev().find(|line| !line.trim().is_empty()) {
        Some(line) => format!("installer exited with {status}: {}", line.trim()),
        None => format!("installer exited with {status}"),
    }
}

/// Settings for [`InstallerRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Interpreter used to run the installer.
    pub shell: String,
    /// Subprocess timeout.
    pub timeout: Duration,
    /// Name of the version marker inside the install directory.
    pub marker_file: String,
    /// Marker contents written by simulated installs.
    pub simulated_version: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            shell: "bash".to_owned(),
            timeout: Duration::from_secs(120),
            marker_file: "version.txt".to_owned(),
            simulated_version: "1.0.0".to_owned(),
        }
    }
}

/// What [`InstallerRunner::run_install`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// True when evidence was written by the runner instead of the installer.
    pub simulated: bool,
}

/// Runs installers, or simulates them when real execution is not possible.
pub struct InstallerRunner<'a> {
    launcher: &'a dyn ProcessLauncher,
    settings: RunnerSettings,
}

impl<'a> InstallerRunner<'a> {
    /// Creates a runner that starts processes through `launcher`.
    #[must_use]
    pub fn new(launcher: &'a dyn ProcessLauncher, settings: RunnerSettings) -> Self {
        Self { launcher, settings }
    }

    /// Builds the command used to run `installer`.
    ///
    /// The installer learns its target through `INSTALL_DIR` and `APP_NAME`;
    /// the remaining variables ask common installer frameworks not to prompt.
    #[must_use]
    pub fn command_for(
        &self,
        installer: &Utf8Path,
        install_dir: &Utf8Path,
        app_name: &str,
    ) -> InstallCommand {
        let env = [
            ("INSTALL_DIR", install_dir.as_str()),
            ("APP_NAME", app_name),
            ("NONINTERACTIVE", "1"),
            ("CI", "1"),
            ("DEBIAN_FRONTEND", "noninteractive"),
        ];
        InstallCommand {
            program: self.settings.shell.clone(),
            args: vec![installer.as_str().to_owned()],
            env: env
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            timeout: self.settings.timeout,
        }
    }

    /// Runs the installer, falling back to simulation on privilege failures.
    ///
    /// With `dry_run` set no process is started and evidence is simulated.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InstallExecution`] if the installer fails for a
    /// reason other than missing privileges, or if simulated evidence cannot
    /// be written.
    pub fn run_install(
        &self,
        installer: &Utf8Path,
        install_dir: &Utf8Path,
        app_name: &str,
        dry_run: bool,
        trail: &mut AuditTrail,
    ) -> Result<RunOutcome> {
        if dry_run {
            trail.info(format!(
                "dry run: would install {installer} to {install_dir}"
            ));
            self.simulate(install_dir, trail)?;
            return Ok(RunOutcome { simulated: true });
        }

        match self.execute(installer, install_dir, app_name, trail) {
            InstallOutcome::Succeeded => {
                trail.info("installer exited successfully");
                Ok(RunOutcome { simulated: false })
            }
            InstallOutcome::NeedsPrivilegeFallback { reason } => {
                trail.warn(format!("{reason}; falling back to simulated install"));
                self.simulate(install_dir, trail)?;
                Ok(RunOutcome { simulated: true })
            }
            InstallOutcome::Failed { reason } => Err(VerifyError::InstallExecution { reason }),
        }
    }

    /// Runs the installer and classifies how it ended.
    ///
    /// Captured output is recorded in `trail`. Nothing is simulated here.
    pub fn execute(
        &self,
        installer: &Utf8Path,
        install_dir: &Utf8Path,
        app_name: &str,
        trail: &mut AuditTrail,
    ) -> InstallOutcome {
        let command = self.command_for(installer, install_dir, app_name);
        trail.info(format!(
            "running installer: {} {}",
            command.program,
            command.args.join(" ")
        ));
        let result = self.launcher.launch(&command);
        if let Ok(output) = &result {
            record_streams(output, trail);
        }
        classify_outcome(&result)
    }

    /// Writes the evidence a successful install would leave behind.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InstallExecution`] if the directory or marker
    /// cannot be created.
    pub fn simulate(&self, install_dir: &Utf8Path, trail: &mut AuditTrail) -> Result<()> {
        std::fs::create_dir_all(install_dir).map_err(|e| VerifyError::InstallExecution {
            reason: format!("cannot create install directory {install_dir}: {e}"),
        })?;
        let marker = install_dir.join(&self.settings.marker_file);
        std::fs::write(&marker, &self.settings.simulated_version).map_err(|e| {
            VerifyError::InstallExecution {
                reason: format!("cannot write version marker {marker}: {e}"),
            }
        })?;
        trail.info(format!("simulated installation to {install_dir}"));
        Ok(())
    }
}

fn record_streams(output: &Output, trail: &mut AuditTrail) {
    for (name, bytes) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim();
        if !text.is_empty() {
            trail.info(format!("installer {name}: {text}"));
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
