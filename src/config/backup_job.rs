use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_KEEP_NUM, SFTP_DEFAULT_PORT};
use crate::error::{BackupError, Result};

/// Login details for the SFTP host. Password authentication only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: SFTP_DEFAULT_PORT,
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// `host:port`, with IPv6 literals bracketed (`[::1]:22`).
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

// Keep the password out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// A validated, immutable description of one backup run.
///
/// Built through [`BackupJob::builder`]; every required field is checked in
/// [`BackupJobBuilder::build`] before anything touches the filesystem or the
/// network.
#[derive(Debug, Clone)]
pub struct BackupJob {
    sources: Vec<PathBuf>,
    remote_dir: String,
    prefix: String,
    credentials: Credentials,
    keep_num: usize,
    connection_timeout: Duration,
    work_root: Option<PathBuf>,
}

impl BackupJob {
    /// Start building a job. The source list is owned by the job; each job
    /// gets its own.
    pub fn builder(
        sources: Vec<PathBuf>,
        remote_dir: impl Into<String>,
        prefix: impl Into<String>,
        credentials: Credentials,
    ) -> BackupJobBuilder {
        BackupJobBuilder {
            sources,
            remote_dir: remote_dir.into(),
            prefix: prefix.into(),
            credentials,
            keep_num: DEFAULT_KEEP_NUM,
            connection_timeout: Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS),
            work_root: None,
        }
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn remote_dir(&self) -> &str {
        &self.remote_dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Number of newest archives kept on the remote host.
    pub fn keep_num(&self) -> usize {
        self.keep_num
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Directory under which the per-run workspace is created.
    pub fn work_root(&self) -> PathBuf {
        self.work_root.clone().unwrap_or_else(env::temp_dir)
    }
}

/// Builder for [`BackupJob`].
#[derive(Debug, Clone)]
pub struct BackupJobBuilder {
    sources: Vec<PathBuf>,
    remote_dir: String,
    prefix: String,
    credentials: Credentials,
    keep_num: usize,
    connection_timeout: Duration,
    work_root: Option<PathBuf>,
}

impl BackupJobBuilder {
    pub fn keep_num(mut self, keep_num: usize) -> Self {
        self.keep_num = keep_num;
        self
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn work_root(mut self, root: impl AsRef<Path>) -> Self {
        self.work_root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Validate and freeze the job.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Configuration`] if the source list is empty,
    /// any required string is empty, the prefix contains `.` or a path
    /// separator, the port is 0, or the retention count is 0.
    pub fn build(self) -> Result<BackupJob> {
        if self.sources.is_empty() {
            return Err(config_err("at least one source path is required"));
        }
        if self.sources.iter().any(|s| s.as_os_str().is_empty()) {
            return Err(config_err("source paths must not be empty"));
        }
        if self.remote_dir.trim().is_empty() {
            return Err(config_err("remote directory must not be empty"));
        }
        validate_prefix(&self.prefix)?;

        let creds = &self.credentials;
        if creds.host.trim().is_empty() {
            return Err(config_err("SFTP host must not be empty"));
        }
        if creds.port == 0 {
            return Err(config_err("SFTP port must not be 0"));
        }
        if creds.user.is_empty() {
            return Err(config_err("SFTP user must not be empty"));
        }
        if creds.password.is_empty() {
            return Err(config_err("SFTP password must not be empty"));
        }
        if self.keep_num == 0 {
            return Err(config_err("retention count must be at least 1"));
        }

        Ok(BackupJob {
            sources: self.sources,
            remote_dir: self.remote_dir,
            prefix: self.prefix,
            credentials: self.credentials,
            keep_num: self.keep_num,
            connection_timeout: self.connection_timeout,
            work_root: self.work_root,
        })
    }
}

/// The prefix is the part of the filename before the timestamp. A `.` would
/// be taken as the start of the extension when the name is read back, and a
/// separator would place the archive outside the remote directory.
fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(config_err("prefix must not be empty"));
    }
    if let Some(c) = prefix.chars().find(|c| matches!(c, '.' | '/' | '\\') || c.is_control()) {
        return Err(BackupError::Configuration(format!(
            "prefix '{}' must not contain {:?}",
            prefix, c
        )));
    }
    Ok(())
}

fn config_err(msg: &str) -> BackupError {
    BackupError::Configuration(msg.to_string())
}
