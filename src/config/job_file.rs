use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::backup_job::{BackupJob, Credentials};
use crate::config::env_vars::expand_env_vars;

/// On-disk (YAML) form of a backup job.
///
/// Every field is optional so a file can hold just the shared settings and
/// leave the rest to the command line. Values given on the command line win
/// (see [`JobFile::merge`]).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobFile {
    pub sources: Vec<String>,
    pub remote_dir: Option<String>,
    pub prefix: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub keep: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub work_dir: Option<PathBuf>,
}

impl JobFile {
    /// Load a job from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read job file: {}", path.display()))?;

        let job: JobFile = serde_yaml::from_str(&content)
            .context(format!("Failed to parse YAML job file: {}", path.display()))?;

        debug!("Loaded job file from {}", path.display());
        Ok(job)
    }

    /// Save a job to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize job to YAML")?;

        fs::write(path, yaml).context(format!("Failed to write job file to {}", path.display()))?;

        info!("Saved job file to {}", path.display());
        Ok(())
    }

    /// Example job written by `init-config`. The password is left out on
    /// purpose; it is expected to come from the environment.
    pub fn example() -> Self {
        Self {
            sources: vec!["/etc/hosts".to_string(), "${HOME}/documents".to_string()],
            remote_dir: Some("/backups/nightly".to_string()),
            prefix: Some("nightly".to_string()),
            host: Some("backup.example.com".to_string()),
            port: Some(22),
            user: Some("backup".to_string()),
            password: None,
            keep: Some(7),
            timeout_secs: Some(30),
            work_dir: None,
        }
    }

    /// Overlay `overrides` on top of `self`. A non-empty source list in
    /// `overrides` replaces the file's list rather than extending it.
    pub fn merge(self, overrides: JobFile) -> Self {
        Self {
            sources: if overrides.sources.is_empty() {
                self.sources
            } else {
                overrides.sources
            },
            remote_dir: overrides.remote_dir.or(self.remote_dir),
            prefix: overrides.prefix.or(self.prefix),
            host: overrides.host.or(self.host),
            port: overrides.port.or(self.port),
            user: overrides.user.or(self.user),
            password: overrides.password.or(self.password),
            keep: overrides.keep.or(self.keep),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
            work_dir: overrides.work_dir.or(self.work_dir),
        }
    }

    /// Turn the merged settings into a validated [`BackupJob`]. Environment
    /// variables in source paths are expanded here.
    pub fn into_job(self) -> Result<BackupJob> {
        let sources = self
            .sources
            .iter()
            .map(|s| PathBuf::from(expand_env_vars(s)))
            .collect();

        let mut credentials = Credentials::new(
            self.host.unwrap_or_default(),
            self.user.unwrap_or_default(),
            self.password.unwrap_or_default(),
        );
        if let Some(port) = self.port {
            credentials = credentials.with_port(port);
        }

        let mut builder = BackupJob::builder(
            sources,
            self.remote_dir.unwrap_or_default(),
            self.prefix.unwrap_or_default(),
            credentials,
        );
        if let Some(keep) = self.keep {
            builder = builder.keep_num(keep);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.connection_timeout(Duration::from_secs(secs));
        }
        if let Some(dir) = self.work_dir {
            builder = builder.work_root(dir);
        }

        Ok(builder.build()?)
    }
}
