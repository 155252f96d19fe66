//! Retention policy: which remote archives survive a run.
//!
//! The decision is made purely from the names in a directory listing. Each
//! name containing `.tar` is given a sort key (see
//! [`naming::sort_key`](crate::archive::naming::sort_key)), the list is
//! ranked newest first, and everything past the first `keep_num` entries is
//! marked for deletion.
//!
//! Names that contain `.tar` but carry no parsable timestamp are reported
//! and left alone: they are neither counted against `keep_num` nor deleted.

use log::warn;

use crate::archive::naming::{is_archive_candidate, sort_key, ArchiveNameError};

/// A listed remote archive and its derived ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArchiveEntry {
    pub name: String,
    pub sort_key: u64,
}

/// Outcome of applying the retention policy to one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Newest entries, at most `keep_num`, newest first.
    pub keep: Vec<RemoteArchiveEntry>,
    /// Everything ranked after `keep`, newest first.
    pub prune: Vec<RemoteArchiveEntry>,
    /// `.tar` names without a usable timestamp.
    pub malformed: Vec<ArchiveNameError>,
}

/// Split a directory listing into archives to keep and archives to delete.
///
/// Ranking is a stable sort on the key, descending, so archives with equal
/// keys keep their listing order.
pub fn plan<I, S>(names: I, keep_num: usize) -> RetentionPlan
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();
    let mut malformed = Vec::new();

    for name in names {
        let name = name.as_ref();
        if !is_archive_candidate(name) {
            continue;
        }

        match sort_key(name) {
            Ok(key) => entries.push(RemoteArchiveEntry {
                name: name.to_string(),
                sort_key: key,
            }),
            Err(e) => {
                warn!("Ignoring remote file during retention: {}", e);
                malformed.push(e);
            }
        }
    }

    entries.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
    let prune = entries.split_off(keep_num.min(entries.len()));

    RetentionPlan {
        keep: entries,
        prune,
        malformed,
    }
}
