use std::io;
use std::path::Path;
use std::time::Duration;

use crate::config::Credentials;
use crate::error::Result;

/// Operations the transport needs from an open remote session.
///
/// Paths are remote, `/`-separated strings. Errors are plain `io::Error`s;
/// the transport maps them onto the stage that failed. Implementations
/// should report an existing directory from [`mkdir`](Self::mkdir) as
/// [`io::ErrorKind::AlreadyExists`] where the server makes that possible.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteStore {
    /// Create a single directory.
    fn mkdir(&mut self, dir: &str) -> io::Result<()>;

    /// Whether `path` exists and is a directory.
    fn is_dir(&mut self, path: &str) -> io::Result<bool>;

    /// Copy a local file to `remote_path`, returning the bytes written.
    fn upload(&mut self, local_path: &Path, remote_path: &str) -> io::Result<u64>;

    /// Names (not full paths) of the non-directory entries in `dir`.
    fn list_dir(&mut self, dir: &str) -> io::Result<Vec<String>>;

    fn remove_file(&mut self, remote_path: &str) -> io::Result<()>;

    /// Close the session. Called once, whatever happened before.
    fn disconnect(&mut self) -> io::Result<()>;
}

/// Opens authenticated [`RemoteStore`] sessions.
pub trait Connector {
    type Store: RemoteStore;

    /// # Errors
    ///
    /// [`BackupError::Connection`](crate::error::BackupError::Connection) or
    /// [`BackupError::Authentication`](crate::error::BackupError::Authentication).
    fn connect(&self, credentials: &Credentials, timeout: Duration) -> Result<Self::Store>;
}

/// Join a remote directory and a file name with exactly one `/`.
pub fn remote_join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}
