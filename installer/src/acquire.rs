//! Installer acquisition from a local path or a remote URL.
//!
//! Remote fetching goes through the [`Fetcher`] trait so tests can script
//! network behaviour without touching the network. Only failures classified
//! as transient are retried; everything else surfaces as a single
//! [`VerifyError::Download`].

use crate::error::{Result, VerifyError};
use crate::trail::AuditTrail;
use camino::{Utf8Path, Utf8PathBuf};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// File name used when a URL does not end in a usable one.
const FALLBACK_FILE_NAME: &str = "installer.sh";

/// Trait for fetching a remote installer into a local file.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher {
    /// Fetches `url` and writes the body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing whether the failure is worth
    /// retrying.
    fn fetch(&self, url: &str, dest: &Path) -> std::result::Result<(), FetchError>;
}

/// Errors arising from a single fetch attempt.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP status {status} from {url}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request failed before a status was received, or the body could
    /// not be read.
    #[error("transport error for {url}: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// Writing the downloaded file failed.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Returns true when retrying the same request could succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use installer_verify::acquire::FetchError;
    ///
    /// let busy = FetchError::Status { url: "https://example.test".to_owned(), status: 503 };
    /// let missing = FetchError::Status { url: "https://example.test".to_owned(), status: 404 };
    /// assert!(busy.is_transient());
    /// assert!(!missing.is_transient());
    /// ```
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(status, 408 | 425 | 429 | 500..=599),
            Self::Transport { .. } => true,
            Self::Io(_) => false,
        }
    }
}

/// HTTP-based fetcher using `ureq`.
#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> std::result::Result<(), FetchError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file).map_err(|e| {
            FetchError::Transport {
                url: url.to_owned(),
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => FetchError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => FetchError::Transport {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// Bounded retry behaviour for remote acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// An installer available as a local file.
///
/// Remote installers live in a scratch directory owned by this value and
/// removed when it is dropped.
#[derive(Debug)]
pub struct AcquiredInstaller {
    path: Utf8PathBuf,
    scratch: Option<TempDir>,
}

impl AcquiredInstaller {
    /// Path to the local installer file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns true when the installer was downloaded into scratch space.
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        self.scratch.is_some()
    }
}

/// Obtains installers, retrying transient network failures.
pub struct Acquirer<'a> {
    fetcher: &'a dyn Fetcher,
    policy: RetryPolicy,
}

impl<'a> Acquirer<'a> {
    /// Creates an acquirer using `fetcher` for remote sources.
    #[must_use]
    pub fn new(fetcher: &'a dyn Fetcher, policy: RetryPolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Acquires the installer named by `source`.
    ///
    /// `http://` and `https://` sources are downloaded; anything else is
    /// treated as a local path and used in place.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Download`] if the source is empty, the local
    /// file is missing or unreadable, or every permitted fetch attempt
    /// failed.
    pub fn acquire(&self, source: &str, trail: &mut AuditTrail) -> Result<AcquiredInstaller> {
        let source = source.trim();
        if source.is_empty() {
            return Err(VerifyError::Download {
                source_ref: String::new(),
                reason: "build source is empty".to_owned(),
            });
        }
        if is_remote(source) {
            self.download(source, trail)
        } else {
            let installer = acquire_local(source)?;
            trail.info(format!("using local installer {}", installer.path));
            Ok(installer)
        }
    }

    fn download(&self, url: &str, trail: &mut AuditTrail) -> Result<AcquiredInstaller> {
        let download_error = |reason: String| VerifyError::Download {
            source_ref: url.to_owned(),
            reason,
        };
        let scratch = tempfile::Builder::new()
            .prefix("installer-verify-")
            .tempdir()
            .map_err(|e| download_error(format!("cannot create scratch directory: {e}")))?;
        let dest = scratch.path().join(remote_file_name(url));
        let attempts = self.policy.attempts.max(1);

        let mut last_failure = String::new();
        for attempt in 1..=attempts {
            match self.fetcher.fetch(url, &dest) {
                Ok(()) => {
                    trail.info(format!(
                        "downloaded {url} on attempt {attempt}/{attempts}"
                    ));
                    make_executable(&dest)
                        .map_err(|e| download_error(format!("cannot mark executable: {e}")))?;
                    let path = Utf8PathBuf::from_path_buf(dest).map_err(|p| {
                        download_error(format!("scratch path {} is not UTF-8", p.display()))
                    })?;
                    return Ok(AcquiredInstaller {
                        path,
                        scratch: Some(scratch),
                    });
                }
                Err(err) => {
                    trail.warn(format!(
                        "download attempt {attempt}/{attempts} failed: {err}"
                    ));
                    if !err.is_transient() {
                        return Err(download_error(err.to_string()));
                    }
                    last_failure = err.to_string();
                    if attempt < attempts {
                        std::thread::sleep(self.policy.delay);
                    }
                }
            }
        }

        Err(download_error(format!(
            "gave up after {attempts} attempt(s): {last_failure}"
        )))
    }
}

/// Returns true for sources fetched over HTTP(S).
#[must_use]
pub fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn acquire_local(source: &str) -> Result<AcquiredInstaller> {
    let local_error = |reason: String| VerifyError::Download {
        source_ref: source.to_owned(),
        reason,
    };
    let path = Utf8Path::new(source);
    let metadata = std::fs::metadata(path)
        .map_err(|e| local_error(format!("installer not found: {e}")))?;
    if !metadata.is_file() {
        return Err(local_error("installer is not a regular file".to_owned()));
    }
    std::fs::File::open(path).map_err(|e| local_error(format!("installer not readable: {e}")))?;
    let path = path
        .canonicalize_utf8()
        .map_err(|e| local_error(format!("cannot resolve installer path: {e}")))?;
    Ok(AcquiredInstaller {
        path,
        scratch: None,
    })
}

/// Derives a safe local file name from the last URL path segment.
fn remote_file_name(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query.rsplit('/').next().unwrap_or_default();
    let is_safe = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if is_safe { segment } else { FALLBACK_FILE_NAME }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "acquire_tests.rs"]
mod tests;
