use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::JobFile;
use crate::constants::{DEFAULT_CONFIG_PATH, PASSWORD_ENV_VAR};

/// Command-line arguments for sftp-backup.
///
/// Every job setting is optional here so a `--config` file can supply it;
/// whatever is given on the command line takes precedence over the file.
/// Numeric defaults (port 22, keep 7, timeout 30s) are applied when neither
/// source sets a value.
#[derive(Parser, Debug)]
#[clap(
    name = "sftp-backup",
    version,
    about = "Archive local files and directories, upload them over SFTP, and prune old backups"
)]
pub struct Args {
    /// File or directory to back up (repeatable)
    #[clap(short, long = "source", value_name = "PATH")]
    pub sources: Vec<String>,

    /// Remote directory that holds the archives
    #[clap(short = 'd', long)]
    pub remote_dir: Option<String>,

    /// Archive filename prefix, e.g. "nightly"
    #[clap(short, long)]
    pub prefix: Option<String>,

    /// SFTP server hostname
    #[clap(long)]
    pub host: Option<String>,

    /// SFTP server port (default: 22)
    #[clap(long)]
    pub port: Option<u16>,

    /// SFTP username
    #[clap(short, long)]
    pub user: Option<String>,

    /// SFTP password
    #[clap(long, env = PASSWORD_ENV_VAR, hide_env_values = true)]
    pub password: Option<String>,

    /// Number of archives to keep on the server (default: 7)
    #[clap(short, long)]
    pub keep: Option<usize>,

    /// Connection timeout in seconds (default: 30)
    #[clap(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory for the per-run workspace (default: system temp dir)
    #[clap(long)]
    pub work_dir: Option<PathBuf>,

    /// Path to a YAML job file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

impl Args {
    /// The job settings given on the command line, ready to be merged over
    /// a job file.
    pub fn to_job_file(&self) -> JobFile {
        JobFile {
            sources: self.sources.clone(),
            remote_dir: self.remote_dir.clone(),
            prefix: self.prefix.clone(),
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            keep: self.keep,
            timeout_secs: self.timeout,
            work_dir: self.work_dir.clone(),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an example job file
    InitConfig {
        /// Path to output job file
        #[clap(default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}
