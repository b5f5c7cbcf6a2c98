//! Writes the text log and JSON summary for a finished run.

use crate::record::ResultRecord;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Creating the report directory failed.
    #[error("failed to create report directory {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialising the summary failed.
    #[error("failed to serialise summary: {source}")]
    Serialize {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing a report file failed.
    #[error("failed to write report {path}: {source}")]
    Write {
        /// File that could not be written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Locations of the reports written for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// The text log.
    pub log: Utf8PathBuf,
    /// The JSON summary.
    pub summary: Utf8PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    #[serde(flatten)]
    record: &'a ResultRecord,
    log_path: &'a Utf8Path,
}

/// Renders result records to disk.
#[derive(Debug, Clone)]
pub struct Reporter {
    report_dir: Utf8PathBuf,
    log_override: Option<Utf8PathBuf>,
}

impl Reporter {
    /// Creates a reporter writing into `report_dir`. An explicit
    /// `log_override` is used verbatim for the text log.
    #[must_use]
    pub fn new(report_dir: impl Into<Utf8PathBuf>, log_override: Option<Utf8PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            log_override,
        }
    }

    /// Paths the reports for `record` will be written to.
    #[must_use]
    pub fn paths_for(&self, record: &ResultRecord) -> ReportPaths {
        let slug = timestamp_slug(record.timestamp_start());
        let log = self.log_override.clone().unwrap_or_else(|| {
            self.report_dir
                .join(format!("install_verification_{slug}.log"))
        });
        let summary = self.report_dir.join(format!(
            "{}_summary_{slug}.json",
            file_stem(record.app_name())
        ));
        ReportPaths { log, summary }
    }

    /// Writes the text log and the JSON summary for `record`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if a directory or file cannot be written.
    pub fn write(&self, record: &ResultRecord) -> Result<ReportPaths, ReportError> {
        let paths = self.paths_for(record);

        create_parent(&paths.log)?;
        write_file(&paths.log, &render_log(record))?;

        create_parent(&paths.summary)?;
        let summary = Summary {
            record,
            log_path: &paths.log,
        };
        let mut json = serde_json::to_string_pretty(&summary)
            .map_err(|source| ReportError::Serialize { source })?;
        json.push('\n');
        write_file(&paths.summary, &json)?;

        log::debug!("wrote reports {} and {}", paths.log, paths.summary);
        Ok(paths)
    }
}

/// Formats `at` as `YYYYMMDDTHHMMSS` for report file names.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use installer_verify::report::timestamp_slug;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
/// assert_eq!(timestamp_slug(at), "20240309T070501");
/// ```
#[must_use]
pub fn timestamp_slug(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S").to_string()
}

/// Renders the audit trail as one `<timestamp> <LEVEL> <message>` line per
/// entry.
#[must_use]
pub fn render_log(record: &ResultRecord) -> String {
    record
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "{} {} {}\n",
                entry.at.to_rfc3339_opts(SecondsFormat::Millis, true),
                entry.level,
                entry.message
            )
        })
        .collect()
}

/// Turns an application label into something safe to embed in a file name.
fn file_stem(app_name: &str) -> String {
    let stem: String = app_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.trim_matches(['_', '.']).is_empty() {
        "installer".to_owned()
    } else {
        stem
    }
}

fn create_parent(path: &Utf8Path) -> Result<(), ReportError> {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|source| ReportError::CreateDirectory {
                path: parent.to_owned(),
                source,
            }),
        _ => Ok(()),
    }
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<(), ReportError> {
    std::fs::write(path, contents).map_err(|source| ReportError::Write {
        path: path.to_owned(),
        source,
    })
}
