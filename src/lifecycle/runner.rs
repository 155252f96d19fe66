use std::time::Instant;

use log::{info, warn};

use crate::archive::compress::{compress, ArchiveReport};
use crate::archive::naming::{ArchiveName, Timestamp};
use crate::cloud::remote::Connector;
use crate::cloud::sftp::SftpConnector;
use crate::cloud::transport::{upload_and_prune, PruneSummary};
use crate::config::BackupJob;
use crate::error::Result;
use crate::lifecycle::workspace::TempWorkspace;

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Filename the archive was uploaded under.
    pub archive_name: String,
    pub archive: ArchiveReport,
    pub prune: PruneSummary,
}

/// Run `job` now, over SFTP.
pub fn run(job: &BackupJob) -> Result<RunReport> {
    run_at(job, Timestamp::now(), &SftpConnector)
}

/// Run `job` as if it started at `timestamp`, connecting through `connector`.
///
/// The workspace is created first and is gone again by the time this
/// returns, on success and on every error path. If the run itself failed,
/// that error is returned and a cleanup failure is only logged; if the run
/// succeeded, a cleanup failure is returned.
pub fn run_at<C: Connector>(job: &BackupJob, timestamp: Timestamp, connector: &C) -> Result<RunReport> {
    let start = Instant::now();
    let name = ArchiveName::new(job.prefix(), timestamp);

    let workspace = TempWorkspace::create(&job.work_root(), timestamp)?;
    let result = run_stages(job, &name, &workspace, connector);
    let cleanup = workspace.close();

    match (result, cleanup) {
        (Ok(report), Ok(())) => {
            info!("Backup {} finished in {:?}", report.archive_name, start.elapsed());
            Ok(report)
        }
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            warn!("{}", cleanup_err);
            Err(e)
        }
    }
}

fn run_stages<C: Connector>(
    job: &BackupJob,
    name: &ArchiveName,
    workspace: &TempWorkspace,
    connector: &C,
) -> Result<RunReport> {
    let file_name = name.file_name();
    let archive_path = workspace.path().join(&file_name);
    info!("Temp file: {}", archive_path.display());

    info!("Compressing {} source(s)", job.sources().len());
    let archive = compress(job.sources(), &archive_path)?;
    info!("Compression finished");

    info!("Uploading {} to {}", file_name, job.remote_dir());
    let prune = upload_and_prune(
        connector,
        &archive_path,
        job.remote_dir(),
        &file_name,
        job.keep_num(),
        job.credentials(),
        job.connection_timeout(),
    )?;
    info!("Upload finished");

    Ok(RunReport {
        archive_name: file_name,
        archive,
        prune,
    })
}
