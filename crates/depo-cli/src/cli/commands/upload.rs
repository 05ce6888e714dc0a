//! `depo upload` – validate, then deposit every valid row with its files.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use depo_core::config::DepoConfig;
use depo_core::files::RootDir;
use depo_core::flow::Flow;
use depo_core::report;
use depo_core::upload::{deposit_batch, UploadFileStatus, UploadOptions};

use super::validate::{print_validation, repository_from_config, validate_sheet};

fn print_progress(row: u64, s: &UploadFileStatus) {
    let stage = match (&s.error, s.remote_status.as_deref(), &s.content_hash) {
        (Some(e), _, _) => format!("failed: {}", e),
        (None, Some(status), _) if s.part_count > 0 => {
            format!("{} part {}/{}", status.to_lowercase(), s.part_number, s.part_count)
        }
        (None, Some(status), _) => status.to_lowercase(),
        (None, None, Some(_)) => "hashed".to_string(),
        (None, None, None) => "starting".to_string(),
    };
    println!(
        "row {:<4} file {}/{} {:<24} {}",
        row,
        s.file_index + 1,
        s.total_files,
        s.name,
        stage
    );
}

pub async fn run_upload(
    cfg: &DepoConfig,
    sheet_path: &Path,
    root: PathBuf,
    acknowledge_duplicates: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let Some(repo) = repository_from_config(cfg)? else {
        bail!("uploading needs an API token in ${}", cfg.api_token_env);
    };

    let v = validate_sheet(cfg, sheet_path, Some(root.clone()), Some(&repo)).await?;
    print_validation(&v);
    if let Some(path) = report_path {
        report::write_summary_file(path, &v.outcome.rows)?;
    }
    let blockers = v.report.upload_blockers(acknowledge_duplicates);
    if !blockers.is_empty() {
        bail!("not uploading:\n  {}", blockers.join("\n  "));
    }

    let opts = UploadOptions::new(Some(Arc::new(RootDir::new(root))), cfg.hash_chunk_bytes);
    let cancel = opts.cancel.clone();
    let stop = opts.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("cancelling after the current step...");
            cancel.cancel();
        }
    });

    let results = deposit_batch(&repo, &cfg.fields, &v.outcome, &opts, |row, s| {
        print_progress(row, s);
        if stop.is_cancelled() {
            Flow::Halt
        } else {
            Flow::Continue
        }
    })
    .await?;

    let done = results.iter().filter(|r| r.is_complete()).count();
    for r in results.iter().filter(|r| !r.is_complete()) {
        if let Some(e) = &r.error {
            println!("row id {}: record not created: {}", r.row_id, e);
        }
    }
    println!("{} of {} records deposited", done, v.outcome.valid_rows().count());
    if done < v.outcome.valid_rows().count() {
        bail!("{} records were not fully deposited", v.outcome.valid_rows().count() - done);
    }
    Ok(())
}
