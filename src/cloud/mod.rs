//! Remote side of a backup run.
//!
//! This module uploads the finished archive to an SFTP host and prunes the
//! remote directory so only the newest archives remain.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   transport     │────▶│  RemoteStore    │────▶│  SFTP Server    │
//! │ (upload, prune) │     │  (trait; ssh2)  │     │                 │
//! └────────┬────────┘     └─────────────────┘     └─────────────────┘
//!          │
//!    ┌─────▼──────┐
//!    │ retention  │
//!    │   plan     │
//!    └────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```no_run
//! use sftp_backup::cloud::sftp::SftpConnector;
//! use sftp_backup::cloud::transport::upload_and_prune;
//! use sftp_backup::config::Credentials;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # fn example() -> sftp_backup::error::Result<()> {
//! let creds = Credentials::new("backup.example.com", "backup", "secret");
//!
//! let summary = upload_and_prune(
//!     &SftpConnector,
//!     Path::new("/tmp/backup_20240104_000000/nightly_20240104_000000.tar.gz"),
//!     "/backups/nightly",
//!     "nightly_20240104_000000.tar.gz",
//!     7,
//!     &creds,
//!     Duration::from_secs(30),
//! )?;
//!
//! println!("Removed {} old archives", summary.removed.len());
//! # Ok(())
//! # }
//! ```

/// Remote store and connector traits
pub mod remote;

/// SFTP implementation of the remote store
pub mod sftp;

/// Upload, remote directory handling, and pruning
pub mod transport;

pub use remote::{Connector, RemoteStore};
pub use transport::{upload_and_prune, PruneSummary};
