//! Test support utilities for verification behaviour tests.
//!
//! Provides sandboxed directories and small shell installers that behave the
//! way real installers do: they read `INSTALL_DIR` and write a version marker.

use camino::{Utf8Path, Utf8PathBuf};
use installer_verify::config::VerifierConfig;
use tempfile::TempDir;

/// Installer that creates `INSTALL_DIR` and writes `version.txt`.
pub const MARKER_INSTALLER: &str = concat!(
    "#!/bin/sh\n",
    "set -e\n",
    "mkdir -p \"$INSTALL_DIR\"\n",
    "printf '2.4.0\\n' > \"$INSTALL_DIR/version.txt\"\n",
    "echo \"installed $APP_NAME\"\n",
);

/// A temporary directory with a UTF-8 root path.
pub struct Sandbox {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Sandbox {
    /// Creates an empty sandbox.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create sandbox");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).expect("utf-8 sandbox path");
        Self { _dir: dir, root }
    }

    /// Sandbox root.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Writes an installer script named `name` and returns its path.
    pub fn write_script(&self, name: &str, body: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, body).expect("write installer script");
        path
    }
}

/// Configuration that runs installers with `sh` and never sleeps between
/// retries.
pub fn test_config() -> VerifierConfig {
    VerifierConfig {
        shell: "sh".to_owned(),
        retry_delay_ms: 0,
        ..VerifierConfig::default()
    }
}
