// Re-export all items from the submodules
mod backup_job;
mod env_vars;
mod job_file;

pub use backup_job::{BackupJob, BackupJobBuilder, Credentials};

pub use job_file::JobFile;

pub use env_vars::{expand_env_vars, expand_with};
