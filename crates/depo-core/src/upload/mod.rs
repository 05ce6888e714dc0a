//! Chunked file upload to the repository.
//!
//! Files go strictly one at a time, parts strictly in ascending order. Every
//! step yields a fresh [`UploadFileStatus`] snapshot to the progress callback,
//! starting with one before any I/O. A callback answering [`Flow::Halt`]
//! cancels at that step boundary. A [`CancelToken`] is checked at every step
//! boundary and again after each network call; a call already started when
//! it was set runs to the end and its result is discarded. There is no
//! retry: a failed step ends that file with the error on its last snapshot and
//! the next file is attempted.

mod cancel;
mod deposit;
pub mod hash;

use std::io::SeekFrom;
use std::sync::Arc;

use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::files::{HostCapabilities, RootDir};
use crate::flow::Flow;
use crate::repository::{NewFile, Part, RepositoryApi, RepositoryError};

pub use cancel::CancelToken;
pub use deposit::{deposit_batch, deposit_row, DepositResult};

/// Remote status recorded once a file's upload is finalized.
pub const COMPLETED: &str = "completed";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("this host cannot read local files")]
    UnsupportedHost,
    #[error("no root directory is set")]
    NoRootDir,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Progress of one file. A new snapshot is reported after every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFileStatus {
    /// 0-based position in the run's file list.
    pub file_index: usize,
    pub total_files: usize,
    pub remote_status: Option<String>,
    pub content_hash: Option<String>,
    pub name: String,
    /// Last part sent (1-based), 0 before the first.
    pub part_number: u32,
    pub part_count: usize,
    pub error: Option<String>,
}

impl UploadFileStatus {
    fn new(file_index: usize, total_files: usize, name: &str) -> Self {
        Self {
            file_index,
            total_files,
            remote_status: None,
            content_hash: None,
            name: name.to_string(),
            part_number: 0,
            part_count: 0,
            error: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.error.is_none() && self.remote_status.as_deref() == Some(COMPLETED)
    }
}

/// What an upload run needs besides the repository.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub host: HostCapabilities,
    pub root: Option<Arc<RootDir>>,
    pub hash_chunk_bytes: usize,
    pub cancel: CancelToken,
}

impl UploadOptions {
    pub fn new(root: Option<Arc<RootDir>>, hash_chunk_bytes: usize) -> Self {
        Self {
            host: HostCapabilities::detect(),
            root,
            hash_chunk_bytes,
            cancel: CancelToken::new(),
        }
    }

    /// The root to read from, if this host can read local files at all.
    pub fn readable_root(&self) -> Result<&RootDir, UploadError> {
        if !self.host.native_file_access {
            return Err(UploadError::UnsupportedHost);
        }
        self.root.as_deref().ok_or(UploadError::NoRootDir)
    }
}

/// Final snapshot of every file attempted, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRun {
    pub files: Vec<UploadFileStatus>,
    pub cancelled: bool,
}

impl UploadRun {
    pub fn completed(&self) -> usize {
        self.files.iter().filter(|f| f.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }
}

/// Why one file stopped early.
enum Stop {
    Cancelled,
    Failed(String),
}

impl From<RepositoryError> for Stop {
    fn from(e: RepositoryError) -> Self {
        Stop::Failed(e.to_string())
    }
}

impl From<std::io::Error> for Stop {
    fn from(e: std::io::Error) -> Self {
        Stop::Failed(e.to_string())
    }
}

struct Step<'a, F> {
    on_progress: &'a mut F,
    cancel: &'a CancelToken,
}

impl<F> Step<'_, F>
where
    F: FnMut(&UploadFileStatus) -> Flow,
{
    /// Report a snapshot at a step boundary. No later step starts once the
    /// token is set or the callback halts.
    fn report(&mut self, snap: &UploadFileStatus) -> Result<(), Stop> {
        if (self.on_progress)(snap).is_halt() || self.cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }
        Ok(())
    }

    /// Gate on the result of a network call.
    fn network<T>(&self, res: Result<T, RepositoryError>) -> Result<T, Stop> {
        if self.cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }
        Ok(res?)
    }
}

/// Upload `names` (resolved under the root) to record `record_id`.
pub async fn upload_files<R, F>(
    repo: &R,
    record_id: u64,
    names: &[String],
    opts: &UploadOptions,
    mut on_progress: F,
) -> Result<UploadRun, UploadError>
where
    R: RepositoryApi + ?Sized,
    F: FnMut(&UploadFileStatus) -> Flow,
{
    let root = opts.readable_root()?;
    let mut run = UploadRun::default();
    let mut step = Step {
        on_progress: &mut on_progress,
        cancel: &opts.cancel,
    };

    for (index, name) in names.iter().enumerate() {
        let mut snap = UploadFileStatus::new(index, names.len(), name);
        match upload_one(repo, record_id, root, opts, &mut snap, &mut step).await {
            Ok(()) => {
                tracing::info!(record_id, file = %name, parts = snap.part_count, "file uploaded");
                run.files.push(snap);
            }
            Err(Stop::Cancelled) => {
                tracing::info!(record_id, file = %name, "upload cancelled");
                run.files.push(snap);
                run.cancelled = true;
                break;
            }
            Err(Stop::Failed(msg)) => {
                tracing::warn!(record_id, file = %name, error = %msg, "file upload failed");
                snap.error = Some(msg);
                let halted = step.report(&snap).is_err();
                run.files.push(snap);
                if halted {
                    run.cancelled = true;
                    break;
                }
            }
        }
    }
    Ok(run)
}

async fn upload_one<R, F>(
    repo: &R,
    record_id: u64,
    root: &RootDir,
    opts: &UploadOptions,
    snap: &mut UploadFileStatus,
    step: &mut Step<'_, F>,
) -> Result<(), Stop>
where
    R: RepositoryApi + ?Sized,
    F: FnMut(&UploadFileStatus) -> Flow,
{
    step.report(snap)?;

    let (mut file, size) = root
        .open(&snap.name)
        .await
        .map_err(|e| Stop::Failed(e.to_string()))?;
    step.report(snap)?;

    let hash = hash::sha256_reader(&mut file, opts.hash_chunk_bytes).await?;
    snap.content_hash = Some(hash.clone());
    step.report(snap)?;

    let announced = NewFile {
        name: snap.name.clone(),
        size,
        hash,
    };
    let location = step.network(repo.initiate_upload(record_id, &announced).await)?;
    step.report(snap)?;

    let manifest = step.network(repo.fetch_manifest(&location).await)?;
    let mut parts = manifest.parts;
    parts.sort_by_key(|p| p.part_no);
    if let Some(bad) = parts.iter().find(|p| p.end > size || p.start > p.end) {
        return Err(Stop::Failed(format!(
            "part {} ({}..{}) is outside the {}-byte file",
            bad.part_no, bad.start, bad.end, size
        )));
    }
    snap.remote_status = Some(manifest.status);
    snap.part_count = parts.len();
    step.report(snap)?;

    for part in &parts {
        let bytes = read_part(&mut file, part).await?;
        step.network(repo.put_part(&location, part, bytes).await)?;
        snap.part_number = part.part_no;
        step.report(snap)?;
    }

    step.network(repo.complete_upload(&location).await)?;
    snap.remote_status = Some(COMPLETED.to_string());
    step.report(snap)?;
    Ok(())
}

async fn read_part(file: &mut File, part: &Part) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(part.start)).await?;
    let mut buf = vec![0u8; part.len() as usize];
    file.read_exact(&mut buf).await?;
    Ok(buf)
}
