//! Sanity checks on an acquired installer.
//!
//! The installer is opaque: only presence, size and a cheap "is this text?"
//! probe over the first 512 bytes are checked. The whole file is still
//! streamed once so its SHA-256 can go into the audit trail. A missing shebang is reported but tolerated because
//! installers are run through an explicit interpreter.

use crate::error::{Result, VerifyError};
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;

/// Number of leading bytes inspected for the script probe.
const PROBE_LEN: usize = 512;

/// Facts gathered about an installer that passed the checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    /// File size in bytes.
    pub size: u64,
    /// Whether the file starts with `#!`.
    pub has_shebang: bool,
    /// Lowercase hex SHA-256 of the whole file, for the audit trail.
    pub sha256: String,
}

/// Checks that `path` is a non-empty file that plausibly holds a script.
///
/// # Errors
///
/// Returns [`VerifyError::Integrity`] if the file is missing, not a regular
/// file, empty, unreadable, or contains NUL bytes in its first 512 bytes.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use installer_verify::integrity::check_integrity;
///
/// let dir = tempfile::tempdir()?;
/// let script = dir.path().join("install.sh");
/// std::fs::write(&script, "#!/bin/sh\necho hi\n")?;
/// let script = Utf8PathBuf::from_path_buf(script).expect("utf-8 path");
///
/// let report = check_integrity(&script)?;
/// assert!(report.has_shebang);
/// assert_eq!(report.size, 18);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn check_integrity(path: &Utf8Path) -> Result<IntegrityReport> {
    let integrity_error = |reason: String| VerifyError::Integrity {
        path: path.to_owned(),
        reason,
    };

    let metadata =
        fs::metadata(path).map_err(|e| integrity_error(format!("cannot stat installer: {e}")))?;
    if !metadata.is_file() {
        return Err(integrity_error("installer is not a regular file".to_owned()));
    }
    if metadata.len() == 0 {
        return Err(integrity_error("installer is empty".to_owned()));
    }

    let mut file =
        fs::File::open(path).map_err(|e| integrity_error(format!("cannot open installer: {e}")))?;
    let mut hasher = Sha256::new();
    let mut probe = Vec::with_capacity(PROBE_LEN);
    let mut buffer = [0u8; 8192];
    let mut size = 0u64;
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| integrity_error(format!("cannot read installer: {e}")))?;
        if bytes_read == 0 {
            break;
        }
        let chunk = &buffer[..bytes_read];
        if probe.len() < PROBE_LEN {
            let take = (PROBE_LEN - probe.len()).min(chunk.len());
            probe.extend_from_slice(&chunk[..take]);
        }
        hasher.update(chunk);
        size += bytes_read as u64;
    }

    if size == 0 {
        return Err(integrity_error("installer is empty".to_owned()));
    }
    if probe.contains(&0) {
        return Err(integrity_error(
            "installer contains binary data and does not look like a script".to_owned(),
        ));
    }

    Ok(IntegrityReport {
        size,
        has_shebang: probe.starts_with(b"#!"),
        sha256: format!("{:x}", hasher.finalize()),
    })
}
