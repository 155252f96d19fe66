//! Global constants for the backup tool.
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make configuration changes easier.

// Retention
/// Number of archives kept on the remote host when no count is given
pub const DEFAULT_KEEP_NUM: usize = 7;

// Connection constants
/// Default SFTP port
pub const SFTP_DEFAULT_PORT: u16 = 22;

/// Default connection timeout in seconds
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Status code libssh2 reports when `mkdir` hits an existing path
/// (`LIBSSH2_FX_FILE_ALREADY_EXISTS`)
pub const SFTP_FX_FILE_ALREADY_EXISTS: i32 = 11;

// Buffer size constants
/// Chunk size for SFTP uploads (1MB)
pub const SFTP_UPLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Buffer in front of the gzip encoder when writing archives (512KB)
pub const ARCHIVE_WRITE_BUFFER_SIZE: usize = 512 * 1024;

// Local workspace
/// Prefix of the per-run workspace directory under the temp root
pub const WORKSPACE_DIR_PREFIX: &str = "backup";

// Configuration
/// Default path for `init-config`
pub const DEFAULT_CONFIG_PATH: &str = "backup.yaml";

/// Environment variable consulted for the SFTP password
pub const PASSWORD_ENV_VAR: &str = "SFTP_BACKUP_PASSWORD";
