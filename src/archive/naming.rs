//! Archive filename convention.
//!
//! Archives are named `{prefix}_{YYYYMMDD}_{HHMMSS}.tar.gz`. The remote
//! directory has no other index, so the filename is the only record of when
//! an archive was taken. [`ArchiveName`] produces names and [`sort_key`]
//! reads the ordering key back out of any listed name; both sides of the
//! convention live here and nowhere else.

use std::fmt;

use chrono::{Datelike, Local, NaiveDateTime, SubsecRound, Timelike};
use thiserror::Error;

/// `strftime` pattern for the timestamp part of archive and workspace names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension appended to every archive produced by this tool.
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// Substring that marks a remote entry as an archive. Matching is by
/// substring so `.tar.bz2`, `.tar.xz` and friends are still recognised.
pub const ARCHIVE_MARKER: &str = ".tar";

/// A remote filename that does not carry a parsable timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot derive timestamp from '{name}': {reason}")]
pub struct ArchiveNameError {
    /// Offending filename.
    pub name: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

/// Second-resolution local time at which a job started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Current local time, truncated to whole seconds.
    pub fn now() -> Self {
        Self(Local::now().naive_local().trunc_subsecs(0))
    }

    pub fn from_naive(datetime: NaiveDateTime) -> Self {
        Self(datetime.trunc_subsecs(0))
    }

    /// Parse a `YYYYMMDD_HHMMSS` string.
    pub fn parse(value: &str) -> Result<Self, ArchiveNameError> {
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|_| ArchiveNameError {
                name: value.to_string(),
                reason: "expected YYYYMMDD_HHMMSS",
            })
    }

    /// The 14-digit `YYYYMMDDHHMMSS` integer used to rank archives.
    pub fn sort_key(&self) -> u64 {
        let date = self.0.date();
        let time = self.0.time();
        let year = u64::try_from(date.year()).unwrap_or(0);

        year * 10_000_000_000
            + u64::from(date.month()) * 100_000_000
            + u64::from(date.day()) * 1_000_000
            + u64::from(time.hour()) * 10_000
            + u64::from(time.minute()) * 100
            + u64::from(time.second())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// Name of one archive in a backup series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    prefix: String,
    timestamp: Timestamp,
}

impl ArchiveName {
    /// The prefix is assumed to have been validated by
    /// [`BackupJob`](crate::config::BackupJob) (no `.`, no path separators).
    pub fn new(prefix: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            prefix: prefix.into(),
            timestamp,
        }
    }

    /// `{prefix}_{YYYYMMDD}_{HHMMSS}.tar.gz`
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.prefix, self.timestamp, ARCHIVE_EXTENSION)
    }

    /// Key this name will decode to once it is listed remotely.
    pub fn sort_key(&self) -> u64 {
        self.timestamp.sort_key()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Whether a listed remote entry should be considered for retention.
pub fn is_archive_candidate(name: &str) -> bool {
    name.contains(ARCHIVE_MARKER)
}

/// Derive the ordering key from a remote filename.
///
/// Everything from the first `.` on is dropped, the remainder is split on
/// `_`, and the last two components (or the only one, if there is just one)
/// are concatenated and read as an integer. For
/// `nightly_20240115_093000.tar.gz` this gives `20240115093000`.
pub fn sort_key(name: &str) -> Result<u64, ArchiveNameError> {
    let stem = name.split('.').next().unwrap_or_default();
    let parts: Vec<&str> = stem.split('_').collect();
    let tail = &parts[parts.len().saturating_sub(2)..];
    let digits = tail.concat();

    if digits.is_empty() {
        return Err(ArchiveNameError {
            name: name.to_string(),
            reason: "no timestamp before the extension",
        });
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ArchiveNameError {
            name: name.to_string(),
            reason: "timestamp components are not numeric",
        });
    }

    digits.parse::<u64>().map_err(|_| ArchiveNameError {
        name: name.to_string(),
        reason: "timestamp does not fit in 64 bits",
    })
}
