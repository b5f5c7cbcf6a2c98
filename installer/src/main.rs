//! Installer verifier CLI entrypoint.
//!
//! This binary runs one verification attempt, writes its text log and JSON
//! summary, and exits with the status code of the attempt.

use clap::Parser;
use installer_verify::acquire::HttpFetcher;
use installer_verify::cli::Cli;
use installer_verify::config::VerifierConfig;
use installer_verify::error::Result;
use installer_verify::orchestrator::Orchestrator;
use installer_verify::output::{print_summary, write_stderr_line};
use installer_verify::record::ResultRecord;
use installer_verify::report::Reporter;
use installer_verify::runner::SystemLauncher;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let exit_code = run(&cli, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> i32 {
    let request = cli.to_request();
    let record = match load_config(cli) {
        Ok(config) => {
            let fetcher = HttpFetcher::new(config.download_timeout());
            Orchestrator::new(&config, &fetcher, &SystemLauncher).run(&request)
        }
        Err(err) => Orchestrator::abort(&request, &err),
    };
    report(cli, &record, stderr);
    record.exit_code()
}

/// Loads the configuration file, if any, and applies CLI overrides.
fn load_config(cli: &Cli) -> Result<VerifierConfig> {
    let base = match &cli.config {
        Some(path) => VerifierConfig::load(path)?,
        None => VerifierConfig::default(),
    };
    cli.apply_overrides(base)
}

/// Writes reports and the terminal summary. Failures here never change the
/// exit code.
fn report(cli: &Cli, record: &ResultRecord, stderr: &mut dyn Write) {
    let reporter = Reporter::new(cli.report_dir.clone(), cli.log_path.clone());
    let paths = match reporter.write(record) {
        Ok(paths) => Some(paths),
        Err(err) => {
            write_stderr_line(stderr, format!("warning: {err}"));
            None
        }
    };
    print_summary(record, paths.as_ref(), cli.quiet, stderr);
}
