//! Tests for installer execution, classification and simulation.

use super::*;
use crate::test_utils::{StubLauncher, exit_status, failure_output, success_output};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Sandbox {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Sandbox {
    fn install_dir(&self) -> Utf8PathBuf {
        self.root.join("myapp")
    }

    fn installer(&self) -> Utf8PathBuf {
        self.root.join("installer.sh")
    }
}

#[fixture]
fn sandbox() -> Sandbox {
    let dir = tempfile::tempdir().expect("create tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).expect("utf-8 temp path");
    Sandbox { _dir: dir, root }
}

fn execute(launcher: &StubLauncher, sandbox: &Sandbox) -> (InstallOutcome, AuditTrail) {
    let runner = InstallerRunner::new(launcher, RunnerSettings::default());
    let mut trail = AuditTrail::new();
    let outcome = runner.execute(
        &sandbox.installer(),
        &sandbox.install_dir(),
        "MyApp",
        &mut trail,
    );
    (outcome, trail)
}

#[rstest]
#[case::ex_noperm(failure_output(77, ""))]
#[case::cannot_execute(failure_output(126, ""))]
#[case::sudo_prompt(failure_output(1, "sudo: a terminal is required to read the password"))]
#[case::root_required(failure_output(1, "This script must be run as root"))]
#[case::denied(failure_output(2, "mkdir: cannot create directory '/opt/x': Permission denied"))]
fn privilege_failures_trigger_fallback(#[case] output: Output) {
    let outcome = classify_outcome(&Ok(output));
    assert!(
        matches!(outcome, InstallOutcome::NeedsPrivilegeFallback { .. }),
        "unexpected outcome: {outcome:?}"
    );
}

#[cfg(unix)]
#[rstest]
#[case::hangup(libc::SIGHUP)]
#[case::tty_input(libc::SIGTTIN)]
fn terminal_signals_trigger_fallback(#[case] signal: i32) {
    let output = Output {
        status: crate::test_utils::signal_status(signal),
        stdout: Vec::new(),
        stderr: Vec::new(),
    };
    assert!(matches!(
        classify_outcome(&Ok(output)),
        InstallOutcome::NeedsPrivilegeFallback { .. }
    ));
}

#[cfg(unix)]
#[test]
fn other_signals_are_failures() {
    let output = Output {
        status: crate::test_utils::signal_status(libc::SIGSEGV),
        stdout: Vec::new(),
        stderr: Vec::new(),
    };
    assert!(matches!(
        classify_outcome(&Ok(output)),
        InstallOutcome::Failed { .. }
    ));
}

#[test]
fn generic_failure_keeps_last_stderr_line() {
    let output = failure_output(1, "checking deps\nerror: unsupported distribution\n\n");

    let outcome = classify_outcome(&Ok(output));

    match outcome {
        InstallOutcome::Failed { reason } => {
            assert!(reason.contains("unsupported distribution"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn spawn_permission_denied_triggers_fallback() {
    let result = Err(LaunchError::Spawn {
        program: "bash".to_owned(),
        source: std::io::Error::from(ErrorKind::PermissionDenied),
    });
    assert!(matches!(
        classify_outcome(&result),
        InstallOutcome::NeedsPrivilegeFallback { .. }
    ));
}

#[rstest]
#[case::missing_interpreter(LaunchError::Spawn {
    program: "bash".to_owned(),
    source: std::io::Error::from(ErrorKind::NotFound),
})]
#[case::timeout(LaunchError::TimedOut { timeout: Duration::from_secs(1) })]
fn launch_errors_are_failures(#[case] err: LaunchError) {
    assert!(matches!(
        classify_outcome(&Err(err)),
        InstallOutcome::Failed { .. }
    ));
}

#[rstest]
fn command_passes_target_through_environment(sandbox: Sandbox) {
    let launcher = StubLauncher::unused();
    let runner = InstallerRunner::new(&launcher, RunnerSettings::default());

    let command = runner.command_for(&sandbox.installer(), &sandbox.install_dir(), "MyApp");

    assert_eq!(command.program, "bash");
    assert_eq!(command.args, vec![sandbox.installer().into_string()]);
    assert_eq!(
        command.env_value("INSTALL_DIR"),
        Some(sandbox.install_dir().as_str())
    );
    assert_eq!(command.env_value("APP_NAME"), Some("MyApp"));
    assert_eq!(command.env_value("NONINTERACTIVE"), Some("1"));
}

#[rstest]
fn successful_installer_leaves_evidence_alone(sandbox: Sandbox) {
    let launcher = StubLauncher::new(vec![Ok(Output {
        status: exit_status(0),
        stdout: b"installed\n".to_vec(),
        stderr: Vec::new(),
    })]);

    let (outcome, trail) = execute(&launcher, &sandbox);

    assert_eq!(outcome, InstallOutcome::Succeeded);
    assert!(trail.contains("installer stdout: installed"));
    assert!(!sandbox.install_dir().exists(), "runner must not fake evidence");
}

#[rstest]
fn privilege_failure_is_classified_without_simulating(sandbox: Sandbox) {
    let launcher = StubLauncher::new(vec![Ok(failure_output(
        1,
        "sudo: a password is required",
    ))]);

    let (outcome, trail) = execute(&launcher, &sandbox);

    assert!(matches!(
        outcome,
        InstallOutcome::NeedsPrivilegeFallback { .. }
    ));
    assert!(trail.contains("installer stderr: sudo: a password is required"));
    assert!(!sandbox.install_dir().exists());
}

#[rstest]
fn genuine_failure_is_not_masked(sandbox: Sandbox) {
    let launcher = StubLauncher::new(vec![Ok(failure_output(3, "checksum mismatch"))]);

    let (outcome, _trail) = execute(&launcher, &sandbox);

    match outcome {
        InstallOutcome::Failed { reason } => assert!(reason.contains("checksum mismatch")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(launcher.launch_count(), 1);
}

fn run_install(
    launcher: &StubLauncher,
    sandbox: &Sandbox,
    dry_run: bool,
) -> (Result<RunOutcome>, AuditTrail) {
    let runner = InstallerRunner::new(launcher, RunnerSettings::default());
    let mut trail = AuditTrail::new();
    let result = runner.run_install(
        &sandbox.installer(),
        &sandbox.install_dir(),
        "MyApp",
        dry_run,
        &mut trail,
    );
    (result, trail)
}

#[rstest]
fn dry_run_simulates_without_launching(sandbox: Sandbox) {
    let launcher = StubLauncher::unused();

    let (result, trail) = run_install(&launcher, &sandbox, true);

    assert!(result.expect("dry run should succeed").simulated);
    assert_eq!(launcher.launch_count(), 0);
    assert!(trail.contains("dry run"));
}

#[rstest]
fn run_install_falls_back_on_privilege_failure(sandbox: Sandbox) {
    let launcher = StubLauncher::new(vec![Ok(failure_output(77, ""))]);

    let (result, trail) = run_install(&launcher, &sandbox, false);

    assert!(result.expect("fallback should succeed").simulated);
    assert!(sandbox.install_dir().join("version.txt").is_file());
    assert!(trail.contains("falling back to simulated install"));
}

#[rstest]
fn run_install_reports_success_as_real(sandbox: Sandbox) {
    let launcher = StubLauncher::new(vec![Ok(success_output())]);

    let (result, _trail) = run_install(&launcher, &sandbox, false);

    assert!(!result.expect("install should succeed").simulated);
}

#[rstest]
fn run_install_propagates_genuine_failure(sandbox: Sandbox) {
    let launcher = StubLauncher::new(vec![Ok(failure_output(3, "checksum mismatch"))]);

    let (result, _trail) = run_install(&launcher, &sandbox, false);

    let err = result.expect_err("failure should propagate");
    assert!(matches!(err, VerifyError::InstallExecution { .. }));
    assert!(!sandbox.install_dir().exists());
}

#[rstest]
fn simulation_writes_marker(sandbox: Sandbox) {
    let launcher = StubLauncher::unused();
    let runner = InstallerRunner::new(&launcher, RunnerSettings::default());
    let mut trail = AuditTrail::new();

    runner
        .simulate(&sandbox.install_dir(), &mut trail)
        .expect("simulate");

    let marker = std::fs::read_to_string(sandbox.install_dir().join("version.txt"))
        .expect("marker written");
    assert_eq!(marker, "1.0.0");
    assert_eq!(launcher.launch_count(), 0);
}

#[rstest]
fn simulation_reports_uncreatable_directory(sandbox: Sandbox) {
    let blocker = sandbox.root.join("blocker");
    std::fs::write(&blocker, "not a directory").expect("write blocker");
    let launcher = StubLauncher::unused();
    let runner = InstallerRunner::new(&launcher, RunnerSettings::default());
    let mut trail = AuditTrail::new();

    let err = runner
        .simulate(&blocker.join("myapp"), &mut trail)
        .expect_err("cannot create under a file");

    assert!(matches!(err, VerifyError::InstallExecution { .. }));
}

#[cfg(unix)]
#[rstest]
fn system_launcher_runs_a_real_script(sandbox: Sandbox) {
    let script = sandbox.installer();
    std::fs::write(
        &script,
        "#!/bin/sh\nmkdir -p \"$INSTALL_DIR\"\nprintf '2.0.0' > \"$INSTALL_DIR/version.txt\"\n",
    )
    .expect("write script");
    let settings = RunnerSettings {
        shell: "sh".to_owned(),
        ..RunnerSettings::default()
    };
    let runner = InstallerRunner::new(&SystemLauncher, settings);
    let mut trail = AuditTrail::new();

    let outcome = runner.execute(&script, &sandbox.install_dir(), "MyApp", &mut trail);

    assert_eq!(outcome, InstallOutcome::Succeeded);
    let marker = std::fs::read_to_string(sandbox.install_dir().join("version.txt"))
        .expect("marker written by script");
    assert_eq!(marker, "2.0.0");
}

#[cfg(unix)]
#[test]
fn system_launcher_kills_hung_installer() {
    let command = InstallCommand {
        program: "sh".to_owned(),
        args: vec!["-c".to_owned(), "sleep 30".to_owned()],
        env: Vec::new(),
        timeout: Duration::from_millis(200),
    };

    let err = SystemLauncher
        .launch(&command)
        .expect_err("sleep should time out");

    assert!(matches!(err, LaunchError::TimedOut { .. }));
}

#[test]
fn success_output_is_classified_as_success() {
    assert_eq!(
        classify_outcome(&Ok(success_output())),
        InstallOutcome::Succeeded
    );
}
