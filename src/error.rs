//! Error types for the backup pipeline.
//!
//! Each stage of a run has its own variant so callers (and the exit message)
//! can tell a bad configuration apart from a dropped connection or a failed
//! prune.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::archive::naming::ArchiveNameError;

/// Result type alias using `BackupError`.
pub type Result<T> = std::result::Result<T, BackupError>;

/// A single remote file that could not be removed during pruning.
#[derive(Debug)]
pub struct DeletionFailure {
    /// Remote path that was targeted.
    pub remote_path: String,
    /// Underlying SFTP error.
    pub source: io::Error,
}

impl fmt::Display for DeletionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.remote_path, self.source)
    }
}

/// Errors that can occur while running a backup job.
#[derive(Error, Debug)]
pub enum BackupError {
    /// Job is missing a required field or has an invalid value.
    #[error("invalid backup job: {0}")]
    Configuration(String),

    /// Temporary workspace could not be created or removed.
    #[error("failed to {action} workspace {path}: {source}")]
    Workspace {
        /// `"create"` or `"remove"`.
        action: &'static str,
        /// Workspace directory.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A source was missing or unreadable, or the archive could not be written.
    #[error("failed to archive {path}: {source}")]
    Archive {
        /// Source or destination path involved.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// TCP connect, SSH handshake, or SFTP subsystem setup failed.
    #[error("failed to connect to {endpoint}: {source}")]
    Connection {
        /// `host:port` that was dialed.
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Server rejected the username/password.
    #[error("authentication failed for {user}@{endpoint}: {message}")]
    Authentication {
        /// Username presented.
        user: String,
        /// `host:port` that was dialed.
        endpoint: String,
        /// Server or library message.
        message: String,
    },

    /// Remote directory could not be created for a reason other than it
    /// already existing.
    #[error("failed to create remote directory {dir}: {source}")]
    RemoteDirectory {
        /// Remote directory path.
        dir: String,
        #[source]
        source: io::Error,
    },

    /// Upload of the archive failed.
    #[error("failed to upload to {remote_path}: {source}")]
    Transfer {
        /// Destination path on the server.
        remote_path: String,
        #[source]
        source: io::Error,
    },

    /// Remote directory could not be listed.
    #[error("failed to list remote directory {dir}: {source}")]
    Listing {
        /// Remote directory path.
        dir: String,
        #[source]
        source: io::Error,
    },

    /// Filename did not follow the `{prefix}_{YYYYMMDD}_{HHMMSS}` shape.
    #[error(transparent)]
    Parse(#[from] ArchiveNameError),

    /// One or more old archives could not be removed. Every entry of the
    /// prune set was still attempted.
    #[error("failed to remove {} old archive(s): {}", .failures.len(), join_failures(.failures))]
    Deletion {
        /// Per-entry failures.
        failures: Vec<DeletionFailure>,
    },
}

fn join_failures(failures: &[DeletionFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
