use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info};
use ssh2::{ErrorCode, Session, Sftp};

use crate::cloud::remote::{Connector, RemoteStore};
use crate::config::Credentials;
use crate::constants::{SFTP_FX_FILE_ALREADY_EXISTS, SFTP_UPLOAD_CHUNK_SIZE};
use crate::error::{BackupError, Result};

/// `LIBSSH2_FX_NO_SUCH_FILE`
const SFTP_FX_NO_SUCH_FILE: i32 = 2;

/// Opens password-authenticated SFTP sessions with `ssh2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SftpConnector;

impl Connector for SftpConnector {
    type Store = SftpStore;

    fn connect(&self, credentials: &Credentials, timeout: Duration) -> Result<SftpStore> {
        SftpStore::connect(credentials, timeout)
    }
}

/// An open SFTP session.
pub struct SftpStore {
    session: Session,
    sftp: Sftp,
    endpoint: String,
}

impl SftpStore {
    /// Create an authenticated session and its SFTP subsystem
    pub fn connect(credentials: &Credentials, timeout: Duration) -> Result<Self> {
        let endpoint = credentials.endpoint();
        let conn_err = |source: io::Error| BackupError::Connection {
            endpoint: endpoint.clone(),
            source,
        };

        // Create TCP connection
        let tcp = connect_tcp(&endpoint, timeout).map_err(&conn_err)?;

        // Set connection timeout
        tcp.set_read_timeout(Some(timeout)).map_err(&conn_err)?;
        tcp.set_write_timeout(Some(timeout)).map_err(&conn_err)?;

        // Create SSH session
        let mut session = Session::new().map_err(|e| conn_err(e.into()))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        session.handshake().map_err(|e| conn_err(e.into()))?;

        // Authenticate with password
        session
            .userauth_password(&credentials.user, credentials.password())
            .map_err(|e| BackupError::Authentication {
                user: credentials.user.clone(),
                endpoint: endpoint.clone(),
                message: e.message().to_string(),
            })?;

        // Verify authentication
        if !session.authenticated() {
            return Err(BackupError::Authentication {
                user: credentials.user.clone(),
                endpoint: endpoint.clone(),
                message: "server did not accept the credentials".to_string(),
            });
        }

        // Create SFTP subsystem
        let sftp = session.sftp().map_err(|e| conn_err(e.into()))?;

        debug!("Opened SFTP session to {}@{}", credentials.user, endpoint);
        Ok(Self {
            session,
            sftp,
            endpoint,
        })
    }
}

impl RemoteStore for SftpStore {
    fn mkdir(&mut self, dir: &str) -> io::Result<()> {
        self.sftp.mkdir(Path::new(dir), 0o755).map_err(sftp_io_error)
    }

    fn is_dir(&mut self, path: &str) -> io::Result<bool> {
        match self.sftp.stat(Path::new(path)) {
            Ok(stat) => Ok(stat.is_dir()),
            Err(e) if e.code() == ErrorCode::SFTP(SFTP_FX_NO_SUCH_FILE) => Ok(false),
            Err(e) => Err(sftp_io_error(e)),
        }
    }

    fn upload(&mut self, local_path: &Path, remote_path: &str) -> io::Result<u64> {
        let start_time = Instant::now();
        let local_file = fs::File::open(local_path)?;
        let mut reader = BufReader::new(local_file);

        let mut remote_file = self
            .sftp
            .create(Path::new(remote_path))
            .map_err(sftp_io_error)?;

        // Stream in chunks so large archives are never held in memory
        let mut buffer = vec![0u8; SFTP_UPLOAD_CHUNK_SIZE];
        let mut uploaded = 0u64;
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            remote_file.write_all(&buffer[..bytes_read])?;
            uploaded += bytes_read as u64;
        }
        remote_file.flush()?;

        let elapsed = start_time.elapsed();
        let throughput = if elapsed.as_secs() > 0 {
            uploaded / elapsed.as_secs()
        } else {
            uploaded
        };
        debug!(
            "Uploaded {} to sftp://{}{} in {:?} ({} KB/s)",
            local_path.display(),
            self.endpoint,
            remote_path,
            elapsed,
            throughput / 1024
        );

        Ok(uploaded)
    }

    fn list_dir(&mut self, dir: &str) -> io::Result<Vec<String>> {
        let entries = self.sftp.readdir(Path::new(dir)).map_err(sftp_io_error)?;

        Ok(entries
            .into_iter()
            .filter(|(_, stat)| !stat.is_dir())
            .filter_map(|(path, _)| path.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect())
    }

    fn remove_file(&mut self, remote_path: &str) -> io::Result<()> {
        self.sftp.unlink(Path::new(remote_path)).map_err(sftp_io_error)
    }

    fn disconnect(&mut self) -> io::Result<()> {
        self.session
            .disconnect(None, "backup finished", None)
            .map_err(io::Error::from)?;
        info!("Disconnected from {}", self.endpoint);
        Ok(())
    }
}

/// Try each resolved address in turn, bounded by `timeout`
fn connect_tcp(endpoint: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in endpoint.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connection attempt to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("{} did not resolve to any address", endpoint))
    }))
}

/// Like `io::Error::from(ssh2::Error)`, but keeps "already exists" visible as
/// [`io::ErrorKind::AlreadyExists`].
fn sftp_io_error(e: ssh2::Error) -> io::Error {
    if e.code() == ErrorCode::SFTP(SFTP_FX_FILE_ALREADY_EXISTS) {
        io::Error::new(io::ErrorKind::AlreadyExists, e)
    } else {
        io::Error::from(e)
    }
}
