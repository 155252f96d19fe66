use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};
use tempfile::TempDir;

use crate::archive::naming::Timestamp;
use crate::constants::WORKSPACE_DIR_PREFIX;
use crate::error::{BackupError, Result};

/// Private scratch directory for one run.
///
/// A `tempfile::TempDir` with a fixed name and no random suffix. The
/// directory is removed exactly once: by [`close`](Self::close) on the
/// normal path, or by `Drop` if the guard goes out of scope any other way
/// (early return, `?`, panic).
#[derive(Debug)]
pub struct TempWorkspace {
    dir: Option<TempDir>,
}

impl TempWorkspace {
    /// Create `{root}/backup_{timestamp}`.
    ///
    /// # Errors
    ///
    /// [`BackupError::Workspace`] if the directory cannot be created,
    /// including when it already exists: another run started in the same
    /// second owns it.
    pub fn create(root: &Path, timestamp: Timestamp) -> Result<Self> {
        let name = format!("{}_{}", WORKSPACE_DIR_PREFIX, timestamp);
        let create_err = |source| BackupError::Workspace {
            action: "create",
            path: root.join(&name),
            source,
        };

        fs::create_dir_all(root).map_err(create_err)?;
        let dir = tempfile::Builder::new()
            .prefix(&name)
            .rand_bytes(0)
            .tempdir_in(root)
            .map_err(create_err)?;

        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// Remove the workspace and everything in it.
    ///
    /// A workspace that has already disappeared counts as removed.
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => remove(dir),
            None => Ok(()),
        }
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = remove(dir) {
                warn!("{}", e);
            }
        }
    }
}

fn remove(dir: TempDir) -> Result<()> {
    let path = dir.path().to_path_buf();
    match dir.close() {
        Ok(()) => {
            debug!("Removed workspace {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(BackupError::Workspace {
            action: "remove",
            path,
            source,
        }),
    }
}
