//! Shared test utilities for the verification crate.

use crate::acquire::{FetchError, Fetcher};
use crate::runner::{InstallCommand, LaunchError, ProcessLauncher};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates an `ExitStatus` for a process terminated by `signal`.
#[cfg(unix)]
pub fn signal_status(signal: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(signal)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given exit code and stderr.
pub fn failure_output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// A stub implementation of `ProcessLauncher` for testing.
///
/// Returns queued results in order and records every command it receives,
/// so tests can assert both on what was launched and on how often.
#[derive(Debug, Default)]
pub struct StubLauncher {
    results: RefCell<VecDeque<Result<Output, LaunchError>>>,
    launched: RefCell<Vec<InstallCommand>>,
}

impl StubLauncher {
    /// Creates a `StubLauncher` that returns `results` in order.
    pub fn new(results: Vec<Result<Output, LaunchError>>) -> Self {
        Self {
            results: RefCell::new(results.into()),
            launched: RefCell::new(Vec::new()),
        }
    }

    /// Creates a `StubLauncher` that must never be invoked.
    pub fn unused() -> Self {
        Self::default()
    }

    /// Returns the commands launched so far.
    pub fn launched(&self) -> Vec<InstallCommand> {
        self.launched.borrow().clone()
    }

    /// Returns how many times the launcher was invoked.
    pub fn launch_count(&self) -> usize {
        self.launched.borrow().len()
    }
}

impl ProcessLauncher for StubLauncher {
    fn launch(&self, command: &InstallCommand) -> Result<Output, LaunchError> {
        self.launched.borrow_mut().push(command.clone());
        self.results
            .borrow_mut()
            .pop_front()
            .expect("unexpected installer launch")
    }
}

/// A scripted `Fetcher` for testing remote acquisition.
///
/// Each queued entry is either a body to write to the destination or the
/// error to return for that attempt.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: RefCell<VecDeque<Result<Vec<u8>, FetchError>>>,
    requested: RefCell<Vec<String>>,
}

impl StubFetcher {
    /// Creates a `StubFetcher` that answers with `responses` in order.
    pub fn new(responses: Vec<Result<Vec<u8>, FetchError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requested: RefCell::new(Vec::new()),
        }
    }

    /// Returns how many fetches were attempted.
    pub fn fetch_count(&self) -> usize {
        self.requested.borrow().len()
    }
}

impl Fetcher for StubFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.requested.borrow_mut().push(url.to_owned());
        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .expect("unexpected fetch");
        let body = response?;
        std::fs::write(dest, body)?;
        Ok(())
    }
}
