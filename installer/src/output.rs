//! Terminal output for the verifier CLI.

use crate::record::ResultRecord;
use crate::report::ReportPaths;
use std::io::Write;

/// Writes one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// One-line summary of a run.
///
/// # Example
///
/// ```
/// use installer_verify::error::VerifyError;
/// use installer_verify::orchestrator::Orchestrator;
/// use installer_verify::output::status_line;
/// use installer_verify::request::InstallRequest;
///
/// let err = VerifyError::InvalidRequest { reason: "no install directory".to_owned() };
/// let record = Orchestrator::abort(&InstallRequest::default(), &err);
///
/// assert_eq!(status_line(&record), "Verification finished: unexpected_error (exit 9)");
/// ```
#[must_use]
pub fn status_line(record: &ResultRecord) -> String {
    let simulated = if record.simulated() {
        ", simulated"
    } else {
        ""
    };
    format!(
        "Verification finished: {} (exit {}{simulated})",
        record.status(),
        record.exit_code()
    )
}

/// Writes the run's messages, errors and report locations to `stderr`.
///
/// With `quiet` set only errors and the status line are written.
pub fn print_summary(
    record: &ResultRecord,
    reports: Option<&ReportPaths>,
    quiet: bool,
    stderr: &mut dyn Write,
) {
    if !quiet {
        for message in record.messages() {
            write_stderr_line(stderr, format!("  {message}"));
        }
        write_stderr_line(stderr, "");
    }
    for error in record.errors() {
        write_stderr_line(stderr, format!("error: {error}"));
    }
    if let (Some(paths), false) = (reports, quiet) {
        write_stderr_line(stderr, format!("Log written to {}", paths.log));
        write_stderr_line(stderr, format!("Summary written to {}", paths.summary));
    }
    write_stderr_line(stderr, status_line(record));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VerifierConfig;
    use crate::orchestrator::Orchestrator;
    use crate::request::InstallRequest;
    use crate::test_utils::{StubFetcher, StubLauncher};
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn missing_installer_record() -> ResultRecord {
        let config = VerifierConfig::default();
        let request = InstallRequest {
            build_source: Some("/nonexistent/installer.sh".to_owned()),
            app_name: Some("MyApp".to_owned()),
            install_dir: "/tmp/installer-verify-output-test".into(),
            ..InstallRequest::default()
        };
        Orchestrator::new(&config, &StubFetcher::default(), &StubLauncher::unused()).run(&request)
    }

    #[test]
    fn status_line_names_status_and_code() {
        let record = missing_installer_record();
        assert_eq!(
            status_line(&record),
            "Verification finished: download_failed (exit 2)"
        );
    }

    #[rstest]
    #[case::verbose(false, true)]
    #[case::quiet(true, false)]
    fn summary_respects_quiet(#[case] quiet: bool, #[case] expect_messages: bool) {
        let record = missing_installer_record();
        let paths = ReportPaths {
            log: Utf8PathBuf::from("/tmp/run.log"),
            summary: Utf8PathBuf::from("/tmp/MyApp_summary.json"),
        };
        let mut stderr = Vec::new();

        print_summary(&record, Some(&paths), quiet, &mut stderr);

        let text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(text.contains("error: download failed"));
        assert!(text.ends_with("(exit 2)\n"));
        assert_eq!(text.contains("verification started"), expect_messages);
        assert_eq!(text.contains("Log written to /tmp/run.log"), expect_messages);
    }
}
