use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info, warn};
use tar::Builder;
use walkdir::WalkDir;

use crate::constants::ARCHIVE_WRITE_BUFFER_SIZE;
use crate::error::{BackupError, Result};

/// Outcome of a successful [`compress`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Archive that was written.
    pub path: PathBuf,
    /// Number of file entries in the archive.
    pub files_added: usize,
    /// Uncompressed bytes read from the sources.
    pub bytes_read: u64,
    /// Size of the compressed archive on disk.
    pub archive_size: u64,
}

/// Write all `sources` into a gzip-compressed tar at `destination`.
///
/// A source that is a regular file is stored under its path as given (minus
/// any root or `.` components, since tar entry names are relative). A source
/// that is a directory is walked recursively and every regular file in it is
/// stored under its base name only, so nested directory structure is
/// flattened.
///
/// # Errors
///
/// Returns [`BackupError::Archive`] if a source does not exist or cannot be
/// read, or if the archive cannot be written. A partially written archive is
/// left in place for the caller to clean up.
pub fn compress<P: AsRef<Path>>(sources: &[P], destination: &Path) -> Result<ArchiveReport> {
    let start = Instant::now();

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| archive_err(parent, e))?;
    }

    let file = File::create(destination).map_err(|e| archive_err(destination, e))?;
    let encoder = GzEncoder::new(
        BufWriter::with_capacity(ARCHIVE_WRITE_BUFFER_SIZE, file),
        Compression::default(),
    );
    let mut archive = TarWriter::new(encoder);

    for source in sources {
        let source = source.as_ref();
        let metadata = fs::metadata(source).map_err(|e| archive_err(source, e))?;

        if metadata.is_file() {
            archive.append(source, &file_entry_name(source))?;
        } else if metadata.is_dir() {
            add_directory(&mut archive, source)?;
        } else {
            warn!("Skipping {}: not a regular file or directory", source.display());
        }
    }

    let files_added = archive.files_added;
    let bytes_read = archive.bytes_read;

    let mut writer = archive
        .builder
        .into_inner()
        .map_err(|e| archive_err(destination, e))?
        .finish()
        .map_err(|e| archive_err(destination, e))?;
    writer.flush().map_err(|e| archive_err(destination, e))?;
    drop(writer);

    let archive_size = fs::metadata(destination)
        .map_err(|e| archive_err(destination, e))?
        .len();

    info!(
        "Archived {} files ({} bytes) into {} ({} bytes) in {:?}",
        files_added,
        bytes_read,
        destination.display(),
        archive_size,
        start.elapsed()
    );

    Ok(ArchiveReport {
        path: destination.to_path_buf(),
        files_added,
        bytes_read,
        archive_size,
    })
}

/// Tar builder plus the bookkeeping needed for the report and for spotting
/// entry names that collide after flattening.
struct TarWriter<W: Write> {
    builder: Builder<W>,
    seen: HashSet<PathBuf>,
    files_added: usize,
    bytes_read: u64,
}

impl<W: Write> TarWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            builder: Builder::new(inner),
            seen: HashSet::new(),
            files_added: 0,
            bytes_read: 0,
        }
    }

    fn append(&mut self, path: &Path, entry_name: &Path) -> Result<()> {
        let size = fs::metadata(path).map_err(|e| archive_err(path, e))?.len();

        self.builder
            .append_path_with_name(path, entry_name)
            .map_err(|e| archive_err(path, e))?;

        if !self.seen.insert(entry_name.to_path_buf()) {
            warn!(
                "Archive already holds an entry named {}; {} was added as a duplicate",
                entry_name.display(),
                path.display()
            );
        }

        debug!("Added {} as {}", path.display(), entry_name.display());
        self.files_added += 1;
        self.bytes_read += size;
        Ok(())
    }
}

fn add_directory<W: Write>(archive: &mut TarWriter<W>, dir: &Path) -> Result<()> {
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            archive_err(&path, io::Error::from(e))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        // Directory sources are flattened to base names.
        let entry_name = PathBuf::from(entry.file_name());
        archive.append(entry.path(), &entry_name)?;
    }

    Ok(())
}

/// Entry name for a file given directly as a source: the path as given, with
/// root, drive prefix, `.` and `..` components dropped. Tar refuses entry
/// names that are absolute or climb out with `..`.
fn file_entry_name(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| {
            !matches!(
                c,
                Component::Prefix(_) | Component::RootDir | Component::CurDir | Component::ParentDir
            )
        })
        .collect()
}

fn archive_err(path: &Path, source: io::Error) -> BackupError {
    BackupError::Archive {
        path: path.to_path_buf(),
        source,
    }
}
