//! Deposit validated rows: create the record, then upload its files.

use super::{upload_files, UploadError, UploadFileStatus, UploadOptions, UploadRun};
use crate::batch::{BatchOutcome, RowOutcome};
use crate::fields::FieldDescriptor;
use crate::flow::Flow;
use crate::record::build_record;
use crate::repository::RepositoryApi;

/// What happened to one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepositResult {
    pub row_id: u64,
    pub record_id: Option<u64>,
    pub upload: UploadRun,
    /// Record creation failure; the row's files were not attempted.
    pub error: Option<String>,
}

impl DepositResult {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
            && !self.upload.cancelled
            && self.upload.files.iter().all(UploadFileStatus::is_completed)
    }
}

/// Create the record for `row` and upload every file it references.
pub async fn deposit_row<R, F>(
    repo: &R,
    fields: &[FieldDescriptor],
    row: &RowOutcome,
    opts: &UploadOptions,
    on_progress: F,
) -> Result<DepositResult, UploadError>
where
    R: RepositoryApi + ?Sized,
    F: FnMut(&UploadFileStatus) -> Flow,
{
    opts.readable_root()?;
    let record = build_record(fields, &row.data);
    let record_id = repo.create_record(&record).await?;
    tracing::info!(row = row.status.row_number, record_id, "record created");

    let names: Vec<String> = row.files.iter().map(|f| f.name.clone()).collect();
    let upload = upload_files(repo, record_id, &names, opts, on_progress).await?;
    Ok(DepositResult {
        row_id: row.status.id,
        record_id: Some(record_id),
        upload,
        error: None,
    })
}

/// Deposit every valid row in order. A row whose record cannot be created is
/// reported and skipped; a cancelled upload stops the batch.
pub async fn deposit_batch<R, F>(
    repo: &R,
    fields: &[FieldDescriptor],
    batch: &BatchOutcome,
    opts: &UploadOptions,
    mut on_progress: F,
) -> Result<Vec<DepositResult>, UploadError>
where
    R: RepositoryApi + ?Sized,
    F: FnMut(u64, &UploadFileStatus) -> Flow,
{
    opts.readable_root()?;
    let mut results = Vec::new();
    for row in batch.valid_rows() {
        if opts.cancel.is_cancelled() {
            break;
        }
        let id = row.status.id;
        let result = match deposit_row(repo, fields, row, opts, |s| on_progress(id, s)).await {
            Ok(r) => r,
            Err(UploadError::Repository(e)) => {
                tracing::warn!(row = row.status.row_number, error = %e, "record creation failed");
                DepositResult {
                    row_id: id,
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
            Err(e) => return Err(e),
        };
        let cancelled = result.upload.cancelled;
        results.push(result);
        if cancelled {
            break;
        }
    }
    Ok(results)
}
