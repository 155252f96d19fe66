use std::io;
use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};

use crate::cloud::remote::{remote_join, Connector, RemoteStore};
use crate::config::Credentials;
use crate::error::{BackupError, DeletionFailure, Result};
use crate::retention;

/// What the prune step did to the remote directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneSummary {
    /// Archives left in place, newest first.
    pub kept: Vec<String>,
    /// Archives deleted, newest first.
    pub removed: Vec<String>,
    /// `.tar` names without a timestamp, left untouched.
    pub skipped: Vec<String>,
}

/// Upload `local_archive` as `remote_dir/filename`, then prune the remote
/// directory down to the `keep_num` newest archives.
///
/// The session is closed once it has been opened, whatever the outcome of
/// the later steps. A failed disconnect is logged and does not change the
/// result.
///
/// # Errors
///
/// Any [`BackupError`] raised while connecting, creating the remote
/// directory, uploading, listing, or deleting. Nothing is pruned if the
/// upload fails.
pub fn upload_and_prune<C: Connector>(
    connector: &C,
    local_archive: &Path,
    remote_dir: &str,
    filename: &str,
    keep_num: usize,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<PruneSummary> {
    info!("Connecting to sftp://{}@{}", credentials.user, credentials.endpoint());
    let mut store = connector.connect(credentials, timeout)?;

    let result = sync_archive(&mut store, local_archive, remote_dir, filename, keep_num);

    if let Err(e) = store.disconnect() {
        warn!("Failed to close SFTP session cleanly: {}", e);
    }

    result
}

/// Everything after connecting: ensure the directory, upload, prune.
pub fn sync_archive<S: RemoteStore>(
    store: &mut S,
    local_archive: &Path,
    remote_dir: &str,
    filename: &str,
    keep_num: usize,
) -> Result<PruneSummary> {
    ensure_remote_dir(store, remote_dir)?;

    let remote_path = remote_join(remote_dir, filename);
    let bytes = store
        .upload(local_archive, &remote_path)
        .map_err(|source| BackupError::Transfer {
            remote_path: remote_path.clone(),
            source,
        })?;
    info!("Backup file uploaded to {} ({} bytes)", remote_path, bytes);

    prune(store, remote_dir, keep_num)
}

/// Create `dir` on the remote host if it is not already there.
///
/// Only the "already exists" outcome of `mkdir` is tolerated: either the
/// server says so explicitly, or a follow-up stat finds a directory at that
/// path. Anything else (permission denied, missing parent, a file in the way)
/// is returned.
pub fn ensure_remote_dir<S: RemoteStore>(store: &mut S, dir: &str) -> Result<()> {
    let err = match store.mkdir(dir) {
        Ok(()) => {
            debug!("Created remote directory {}", dir);
            return Ok(());
        }
        Err(e) => e,
    };

    if err.kind() == io::ErrorKind::AlreadyExists {
        debug!("Remote directory {} already exists", dir);
        return Ok(());
    }

    match store.is_dir(dir) {
        Ok(true) => {
            debug!("Remote directory {} already exists", dir);
            Ok(())
        }
        Ok(false) => Err(BackupError::RemoteDirectory {
            dir: dir.to_string(),
            source: err,
        }),
        Err(stat_err) => {
            debug!("Could not stat {} after mkdir failed: {}", dir, stat_err);
            Err(BackupError::RemoteDirectory {
                dir: dir.to_string(),
                source: err,
            })
        }
    }
}

/// Delete every archive in `remote_dir` ranked after the `keep_num` newest.
///
/// Each deletion is attempted even if an earlier one failed; failures are
/// collected and returned together as [`BackupError::Deletion`].
pub fn prune<S: RemoteStore>(store: &mut S, remote_dir: &str, keep_num: usize) -> Result<PruneSummary> {
    let names = store.list_dir(remote_dir).map_err(|source| BackupError::Listing {
        dir: remote_dir.to_string(),
        source,
    })?;

    let plan = retention::plan(&names, keep_num);
    debug!(
        "Retention over {} listed entries: {} kept, {} to prune, {} skipped",
        names.len(),
        plan.keep.len(),
        plan.prune.len(),
        plan.malformed.len()
    );

    let mut removed = Vec::with_capacity(plan.prune.len());
    let mut failures = Vec::new();

    for entry in &plan.prune {
        let remote_path = remote_join(remote_dir, &entry.name);
        match store.remove_file(&remote_path) {
            Ok(()) => {
                info!("Removed old archive {}", remote_path);
                removed.push(entry.name.clone());
            }
            Err(source) => {
                warn!("Failed to remove old archive {}: {}", remote_path, source);
                failures.push(DeletionFailure { remote_path, source });
            }
        }
    }

    if !failures.is_empty() {
        return Err(BackupError::Deletion { failures });
    }

    info!("Keeping the newest {} archive(s) in {}", plan.keep.len(), remote_dir);

    Ok(PruneSummary {
        kept: plan.keep.into_iter().map(|e| e.name).collect(),
        removed,
        skipped: plan.malformed.into_iter().map(|e| e.name).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::remote::MockRemoteStore;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::path::PathBuf;

    fn io_err(kind: io::ErrorKind) -> io::Error {
        io::Error::new(kind, "simulated")
    }

    #[test]
    fn test_ensure_remote_dir_created() {
        let mut store = MockRemoteStore::new();
        store.expect_mkdir().with(eq("/backups")).times(1).returning(|_| Ok(()));
        store.expect_is_dir().never();

        ensure_remote_dir(&mut store, "/backups").unwrap();
    }

    #[test]
    fn test_ensure_remote_dir_already_exists_kind() {
        let mut store = MockRemoteStore::new();
        store
            .expect_mkdir()
            .returning(|_| Err(io_err(io::ErrorKind::AlreadyExists)));
        store.expect_is_dir().never();

        ensure_remote_dir(&mut store, "/backups").unwrap();
    }

    #[test]
    fn test_ensure_remote_dir_generic_failure_but_directory_present() {
        let mut store = MockRemoteStore::new();
        store.expect_mkdir().returning(|_| Err(io_err(io::ErrorKind::Other)));
        store.expect_is_dir().with(eq("/backups")).returning(|_| Ok(true));

        ensure_remote_dir(&mut store, "/backups").unwrap();
    }

    #[test]
    fn test_ensure_remote_dir_permission_denied_propagates() {
        let mut store = MockRemoteStore::new();
        store
            .expect_mkdir()
            .returning(|_| Err(io_err(io::ErrorKind::PermissionDenied)));
        store.expect_is_dir().returning(|_| Ok(false));

        let err = ensure_remote_dir(&mut store, "/root/backups").unwrap_err();

        match err {
            BackupError::RemoteDirectory { dir, source } => {
                assert_eq!(dir, "/root/backups");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("Expected remote directory error, got {:?}", other),
        }
    }

    #[test]
    fn test_ensure_remote_dir_stat_failure_keeps_mkdir_error() {
        let mut store = MockRemoteStore::new();
        store
            .expect_mkdir()
            .returning(|_| Err(io_err(io::ErrorKind::PermissionDenied)));
        store
            .expect_is_dir()
            .returning(|_| Err(io_err(io::ErrorKind::Other)));

        let err = ensure_remote_dir(&mut store, "/x").unwrap_err();
        assert!(matches!(
            err,
            BackupError::RemoteDirectory { ref source, .. } if source.kind() == io::ErrorKind::PermissionDenied
        ));
    }

    #[test]
    fn test_sync_archive_upload_failure_skips_prune() {
        let mut store = MockRemoteStore::new();
        store.expect_mkdir().returning(|_| Ok(()));
        store
            .expect_upload()
            .withf(|local, remote| {
                local == PathBuf::from("/tmp/w/n_20240104_000000.tar.gz").as_path()
                    && remote == "/backups/n_20240104_000000.tar.gz"
            })
            .returning(|_, _| Err(io_err(io::ErrorKind::ConnectionReset)));
        store.expect_list_dir().never();
        store.expect_remove_file().never();

        let err = sync_archive(
            &mut store,
            Path::new("/tmp/w/n_20240104_000000.tar.gz"),
            "/backups",
            "n_20240104_000000.tar.gz",
            2,
        )
        .unwrap_err();

        match err {
            BackupError::Transfer { remote_path, .. } => {
                assert_eq!(remote_path, "/backups/n_20240104_000000.tar.gz");
            }
            other => panic!("Expected transfer error, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_archive_runs_steps_in_order() {
        let mut seq = Sequence::new();
        let mut store = MockRemoteStore::new();
        store
            .expect_mkdir()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        store
            .expect_upload()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(42));
        store
            .expect_list_dir()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["n_20240104_000000.tar.gz".to_string()]));
        store.expect_remove_file().never();

        let summary = sync_archive(
            &mut store,
            Path::new("/tmp/a.tar.gz"),
            "/backups",
            "n_20240104_000000.tar.gz",
            7,
        )
        .unwrap();

        assert_eq!(summary.kept, vec!["n_20240104_000000.tar.gz"]);
        assert!(summary.removed.is_empty());
    }

    #[test]
    fn test_prune_listing_failure() {
        let mut store = MockRemoteStore::new();
        store
            .expect_list_dir()
            .returning(|_| Err(io_err(io::ErrorKind::PermissionDenied)));

        let err = prune(&mut store, "/backups", 2).unwrap_err();
        assert!(matches!(err, BackupError::Listing { ref dir, .. } if dir == "/backups"));
    }

    #[test]
    fn test_prune_removes_oldest() {
        let mut store = MockRemoteStore::new();
        store.expect_list_dir().with(eq("/backups/")).returning(|_| {
            Ok(vec![
                "nightly_20240101_000000.tar.gz".to_string(),
                "nightly_20240102_000000.tar.gz".to_string(),
                "nightly_20240103_000000.tar.gz".to_string(),
                "nightly_20240104_000000.tar.gz".to_string(),
                "notes.txt".to_string(),
            ])
        });
        store
            .expect_remove_file()
            .with(eq("/backups/nightly_20240102_000000.tar.gz"))
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_remove_file()
            .with(eq("/backups/nightly_20240101_000000.tar.gz"))
            .times(1)
            .returning(|_| Ok(()));

        let summary = prune(&mut store, "/backups/", 2).unwrap();

        assert_eq!(
            summary.kept,
            vec!["nightly_20240104_000000.tar.gz", "nightly_20240103_000000.tar.gz"]
        );
        assert_eq!(
            summary.removed,
            vec!["nightly_20240102_000000.tar.gz", "nightly_20240101_000000.tar.gz"]
        );
    }

    #[test]
    fn test_prune_continues_after_deletion_failure() {
        let mut store = MockRemoteStore::new();
        store.expect_list_dir().returning(|_| {
            Ok(vec![
                "x_20240101_000000.tar.gz".to_string(),
                "x_20240102_000000.tar.gz".to_string(),
                "x_20240103_000000.tar.gz".to_string(),
                "x_20240104_000000.tar.gz".to_string(),
            ])
        });
        store
            .expect_remove_file()
            .with(eq("/b/x_20240102_000000.tar.gz"))
            .times(1)
            .returning(|_| Err(io_err(io::ErrorKind::PermissionDenied)));
        store
            .expect_remove_file()
            .with(eq("/b/x_20240101_000000.tar.gz"))
            .times(1)
            .returning(|_| Ok(()));

        let err = prune(&mut store, "/b", 2).unwrap_err();

        match err {
            BackupError::Deletion { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].remote_path, "/b/x_20240102_000000.tar.gz");
            }
            other => panic!("Expected deletion error, got {:?}", other),
        }
    }

    #[test]
    fn test_prune_skips_malformed() {
        let mut store = MockRemoteStore::new();
        store.expect_list_dir().returning(|_| {
            Ok(vec![
                "manual-copy.tar.gz".to_string(),
                "x_20240101_000000.tar.gz".to_string(),
            ])
        });
        store.expect_remove_file().never();

        let summary = prune(&mut store, "/b", 1).unwrap();

        assert_eq!(summary.kept, vec!["x_20240101_000000.tar.gz"]);
        assert_eq!(summary.skipped, vec!["manual-copy.tar.gz"]);
    }
}
