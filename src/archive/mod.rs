//! Local archive creation and the archive filename convention.
//!
//! ## Components
//!
//! - **Compression**: gzip tar creation from a list of files and directories
//! - **Naming**: `{prefix}_{YYYYMMDD}_{HHMMSS}.tar.gz` encoding, and the
//!   reverse mapping from a listed filename to its ordering key
//!
//! ## Example
//!
//! ```no_run
//! use sftp_backup::archive::compress::compress;
//! use sftp_backup::archive::naming::{ArchiveName, Timestamp};
//! use std::path::Path;
//!
//! # fn example() -> sftp_backup::error::Result<()> {
//! let name = ArchiveName::new("nightly", Timestamp::now());
//! let dest = Path::new("/tmp/backup_work").join(name.file_name());
//!
//! let report = compress(&["/etc/hosts", "/srv/data"], &dest)?;
//! println!("Archived {} files", report.files_added);
//! # Ok(())
//! # }
//! ```

/// Gzip tar creation
pub mod compress;

/// Archive filename encoding and sort-key decoding
pub mod naming;

pub use compress::{compress, ArchiveReport};
pub use naming::{ArchiveName, ArchiveNameError, Timestamp};
