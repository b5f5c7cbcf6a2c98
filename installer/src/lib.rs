//! Installer verification library.
//!
//! This crate verifies that a software installer can be fetched, sanity
//! checked, run non-interactively, validated afterwards and uninstalled
//! cleanly. It is used by the `installer-verify` CLI binary and can be driven
//! programmatically, with stubbed collaborators, from tests.
//!
//! # Modules
//!
//! - [`acquire`] - Local and HTTP(S) installer acquisition with retries
//! - [`attempt`] - Mutable per-run state and stage tracking
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration with CI-friendly defaults
//! - [`error`] - Error taxonomy and failure classes
//! - [`integrity`] - Sanity checks on acquired installers
//! - [`orchestrator`] - End-to-end run sequencing
//! - [`output`] - Terminal summaries
//! - [`record`] - Immutable run results
//! - [`report`] - Text log and JSON summary writers
//! - [`request`] - Run inputs and request validation
//! - [`runner`] - Installer execution and outcome classification
//! - [`stage`] - Run stages and checks
//! - [`status`] - Terminal statuses and exit codes
//! - [`trail`] - Timestamped audit trail
//! - [`uninstall`] - Idempotent install directory removal
//! - [`validate`] - Post-install evidence checks

pub mod acquire;
pub mod attempt;
pub mod cli;
pub mod config;
pub mod error;
pub mod integrity;
pub mod orchestrator;
pub mod output;
pub mod record;
pub mod report;
pub mod request;
pub mod runner;
pub mod stage;
pub mod status;
pub mod trail;
pub mod uninstall;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
