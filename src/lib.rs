//! # sftp-backup
//!
//! Scheduled backups to an SFTP server: archive local files and directories
//! into a timestamped `.tar.gz`, upload it, and keep only the newest `N`
//! archives in the remote directory.
//!
//! ## Overview
//!
//! A run is a short, single-threaded sequence:
//!
//! 1. Validate the job (sources, remote directory, prefix, credentials).
//! 2. Create a private workspace under the work root.
//! 3. Compress every source into `{prefix}_{YYYYMMDD}_{HHMMSS}.tar.gz`.
//! 4. Connect over SFTP, ensure the remote directory, upload.
//! 5. Rank the remote `.tar` archives by their embedded timestamp and delete
//!    everything past the newest `N`.
//! 6. Remove the workspace, whatever happened in steps 3 to 5.
//!
//! ## Usage
//!
//! ```no_run
//! use sftp_backup::config::{BackupJob, Credentials};
//! use sftp_backup::lifecycle;
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! let job = BackupJob::builder(
//!     vec![PathBuf::from("/etc/hosts"), PathBuf::from("/var/www")],
//!     "/backups/nightly",
//!     "nightly",
//!     Credentials::new("backup.example.com", "backup", "secret"),
//! )
//! .keep_num(7)
//! .build()?;
//!
//! let report = lifecycle::run(&job)?;
//! println!("Uploaded {}", report.archive_name);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`archive`]: Archive naming and tar.gz creation
//! - [`cloud`]: Remote store abstraction, SFTP client, upload and prune
//! - [`retention`]: Ranking remote archives and choosing what to delete
//! - [`lifecycle`]: Workspace handling and the top-level run
//! - [`config`]: Job validation and the YAML job file
//! - [`security`]: Credential scrubbing for printed errors
//! - [`cli`]: Command-line interface definitions
//! - [`constants`]: Defaults and tuning values
//! - [`error`]: The crate error type

/// Archive naming and tar.gz creation
pub mod archive;

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Remote storage (SFTP) and the upload/prune transport
pub mod cloud;

/// Job configuration and validation
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Error types
pub mod error;

/// Workspace management and run sequencing
pub mod lifecycle;

/// Retention planning for remote archives
pub mod retention;

/// Credential scrubbing for operator-facing output
pub mod security;

pub use error::{BackupError, Result};
