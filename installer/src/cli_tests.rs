//! Tests for CLI parsing and request construction.

use super::*;
use rstest::rstest;

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["installer-verify", "--install-dir", "/tmp/myapp"]);
    assert!(cli.build_url.is_none());
    assert!(cli.app_name.is_none());
    assert_eq!(cli.install_dir, Utf8PathBuf::from("/tmp/myapp"));
    assert!(!cli.dry_run);
    assert!(!cli.uninstall);
    assert!(!cli.force_exception);
    assert!(!cli.quiet);
    assert!(cli.config.is_none());
    assert_eq!(cli.report_dir, Utf8PathBuf::from("."));
}

#[test]
fn cli_requires_install_dir() {
    let result = Cli::try_parse_from(["installer-verify", "--build-url", "./installer.sh"]);
    assert!(result.is_err());
}

#[test]
fn cli_builds_install_request() {
    let cli = Cli::parse_from([
        "installer-verify",
        "--build-url",
        "./installer.sh",
        "--app-name",
        "MyApp",
        "--install-dir",
        "/tmp/myapp",
        "--uninstall",
        "--dry-run",
        "--log-path",
        "/tmp/run.log",
    ]);

    let request = cli.to_request();

    assert_eq!(request.build_source.as_deref(), Some("./installer.sh"));
    assert_eq!(request.app_name.as_deref(), Some("MyApp"));
    assert!(request.uninstall_requested);
    assert!(request.dry_run);
    assert_eq!(request.log_path, Some(Utf8PathBuf::from("/tmp/run.log")));
    assert!(request.fault.is_none());
}

#[rstest]
#[case::absent(&[][..], None)]
#[case::present(&["--force-exception"][..], Some(InjectedFault::Unexpected))]
fn force_exception_maps_to_fault(#[case] extra: &[&str], #[case] expected: Option<InjectedFault>) {
    let mut args = vec!["installer-verify", "--install-dir", "/tmp/myapp"];
    args.extend_from_slice(extra);

    let cli = Cli::parse_from(args);

    assert_eq!(cli.to_request().fault, expected);
}

#[test]
fn overrides_replace_config_values() {
    let cli = Cli::parse_from([
        "installer-verify",
        "--install-dir",
        "/tmp/myapp",
        "--settle-delay-ms",
        "250",
        "--install-timeout-secs",
        "5",
    ]);

    let config = cli
        .apply_overrides(VerifierConfig::default())
        .expect("valid overrides");

    assert_eq!(config.settle_delay_ms, 250);
    assert_eq!(config.install_timeout_secs, 5);
    assert_eq!(config.download_attempts, 3);
}

#[test]
fn missing_overrides_keep_config_values() {
    let cli = Cli::parse_from(["installer-verify", "--install-dir", "/tmp/myapp", "-q"]);
    let base = VerifierConfig {
        settle_delay_ms: 10,
        ..VerifierConfig::default()
    };

    let config = cli.apply_overrides(base.clone()).expect("valid config");

    assert_eq!(config, base);
    assert!(cli.quiet);
}

#[test]
fn zero_timeout_override_is_rejected() {
    let cli = Cli::parse_from([
        "installer-verify",
        "--install-dir",
        "/tmp/myapp",
        "--install-timeout-secs",
        "0",
    ]);

    let err = cli
        .apply_overrides(VerifierConfig::default())
        .expect_err("override must be rejected");

    assert!(
        matches!(&err, VerifyError::Config { reason, .. } if reason == "install_timeout_secs must be at least 1"),
        "{err}"
    );
    assert_eq!(err.kind(), crate::error::FailureKind::Unexpected);
}
