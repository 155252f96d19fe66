//! Shared fixtures for integration tests: an in-memory SFTP server and job
//! builders that point at it.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sftp_backup::cloud::remote::remote_join;
use sftp_backup::cloud::{Connector, RemoteStore};
use sftp_backup::config::{BackupJob, Credentials};
use sftp_backup::error::{BackupError, Result};

/// State of the fake server, shared between the test and every session.
#[derive(Debug, Default)]
pub struct ServerState {
    pub dirs: BTreeSet<String>,
    /// Full remote path to file contents.
    pub files: BTreeMap<String, Vec<u8>>,
    pub connects: usize,
    pub disconnects: usize,
    pub refuse_connection: bool,
    pub reject_password: bool,
    pub fail_upload: bool,
    pub fail_list: bool,
    /// Remote paths whose removal fails.
    pub undeletable: HashSet<String>,
}

/// In-memory SFTP server. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server with `dir` present and holding empty files named `names`.
    pub fn with_files(dir: &str, names: &[&str]) -> Self {
        let server = Self::new();
        {
            let mut state = server.state();
            state.dirs.insert(dir.to_string());
            for name in names {
                state.files.insert(remote_join(dir, name), Vec::new());
            }
        }
        server
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    /// Sorted names of the files directly inside `dir`.
    pub fn names_in(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.state()
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect()
    }

    pub fn contents(&self, remote_path: &str) -> Option<Vec<u8>> {
        self.state().files.get(remote_path).cloned()
    }
}

impl Connector for FakeServer {
    type Store = FakeSession;

    fn connect(&self, credentials: &Credentials, _timeout: Duration) -> Result<FakeSession> {
        let mut state = self.state();
        if state.refuse_connection {
            return Err(BackupError::Connection {
                endpoint: credentials.endpoint(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            });
        }
        if state.reject_password {
            return Err(BackupError::Authentication {
                user: credentials.user.clone(),
                endpoint: credentials.endpoint(),
                message: "password rejected".to_string(),
            });
        }
        state.connects += 1;
        Ok(FakeSession {
            state: Arc::clone(&self.state),
        })
    }
}

/// One open session on a [`FakeServer`].
pub struct FakeSession {
    state: Arc<Mutex<ServerState>>,
}

impl FakeSession {
    fn state(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(pos) => &path[..pos],
        None => ".",
    }
}

impl RemoteStore for FakeSession {
    fn mkdir(&mut self, dir: &str) -> io::Result<()> {
        let mut state = self.state();
        if state.dirs.contains(dir) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "file already exists"));
        }
        state.dirs.insert(dir.to_string());
        Ok(())
    }

    fn is_dir(&mut self, path: &str) -> io::Result<bool> {
        Ok(self.state().dirs.contains(path))
    }

    fn upload(&mut self, local_path: &Path, remote_path: &str) -> io::Result<u64> {
        let data = fs::read(local_path)?;
        let mut state = self.state();
        if state.fail_upload {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection lost"));
        }
        if !state.dirs.contains(parent_of(remote_path)) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        }
        let len = data.len() as u64;
        state.files.insert(remote_path.to_string(), data);
        Ok(len)
    }

    fn list_dir(&mut self, dir: &str) -> io::Result<Vec<String>> {
        let state = self.state();
        if state.fail_list {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        Ok(state
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    fn remove_file(&mut self, remote_path: &str) -> io::Result<()> {
        let mut state = self.state();
        if state.undeletable.contains(remote_path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        match state.files.remove(remote_path) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }

    fn disconnect(&mut self) -> io::Result<()> {
        self.state().disconnects += 1;
        Ok(())
    }
}

/// A job over `sources` that writes its workspace under `work_root`.
pub fn job(sources: Vec<PathBuf>, remote_dir: &str, prefix: &str, keep: usize, work_root: &Path) -> BackupJob {
    BackupJob::builder(
        sources,
        remote_dir,
        prefix,
        Credentials::new("sftp.test", "backup", "pw"),
    )
    .keep_num(keep)
    .work_root(work_root)
    .build()
    .unwrap()
}

/// Create `rel` under `root` with `contents`, making parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Entry names of a tar.gz, in archive order.
pub fn archive_entries(bytes: &[u8]) -> Vec<String> {
    let decoder = flate2::read::GzDecoder::new(bytes);
    let mut archive = tar::Archive::new(decoder);
    archive
        .entries()
        .unwrap()
        .map(|entry| entry.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect()
}

/// True when `root` has no entries left.
pub fn is_empty_dir(root: &Path) -> bool {
    fs::read_dir(root).map(|mut it| it.next().is_none()).unwrap_or(true)
}
