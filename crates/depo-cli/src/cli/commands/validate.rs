//! `depo validate` – run every row and the cross-row checks, print the result.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use depo_core::aggregate::{AggregateReport, AggregateStatus};
use depo_core::batch::{Batch, BatchOutcome};
use depo_core::checks::CheckContext;
use depo_core::config::DepoConfig;
use depo_core::files::RootDir;
use depo_core::registry::RegistryLimits;
use depo_core::repository::{HttpRepository, RepositoryApi};
use depo_core::{report, sheet};

pub struct Validation {
    pub outcome: BatchOutcome,
    pub report: AggregateReport,
}

/// Load the sheet and validate it. With a repository, vocabularies and the
/// remaining quota come from the server; without one, configured options are
/// used and the quota check is skipped.
pub async fn validate_sheet(
    cfg: &DepoConfig,
    sheet_path: &Path,
    root: Option<PathBuf>,
    repo: Option<&HttpRepository>,
) -> Result<Validation> {
    let sheet = sheet::load_csv(sheet_path)?;
    let mut ctx = CheckContext::from_config(cfg, sheet.headers.clone(), root.map(RootDir::new));

    let mut remaining = None;
    if let Some(repo) = repo {
        let enums = repo
            .enumerations()
            .await
            .context("fetch repository vocabularies")?;
        enums.apply_to(&mut ctx);
        let account = repo.account().await.context("fetch account quota")?;
        remaining = Some(account.remaining());
    }

    let outcome = Batch::new(sheet.rows, ctx, RegistryLimits::from_config(cfg))
        .run()
        .await;
    let report = outcome.aggregate(remaining);
    Ok(Validation { outcome, report })
}

/// Repository client if a token is configured.
pub fn repository_from_config(cfg: &DepoConfig) -> Result<Option<HttpRepository>> {
    if cfg.api_token().is_none() {
        return Ok(None);
    }
    Ok(Some(HttpRepository::from_config(cfg)?))
}

pub fn print_validation(v: &Validation) {
    println!("{:<6} {:<8} {:<8} {}", "ROW", "STATE", "WARN", "ERRORS");
    for row in &v.outcome.rows {
        let s = &row.status;
        let errors = s
            .errors
            .iter()
            .map(|e| format!("[{}] {}", e.kind, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        println!(
            "{:<6} {:<8} {:<8} {}",
            s.row_number,
            s.state.as_str(),
            s.warnings.len(),
            errors
        );
    }
    if let Some(reason) = &v.outcome.halted {
        println!("Batch stopped early: {}", reason);
    }

    for (name, result) in [("titles", &v.report.uniqueness), ("quota", &v.report.quota)] {
        match result.status {
            AggregateStatus::Valid => println!("{}: ok", name),
            AggregateStatus::Skipped => println!("{}: not checked", name),
            AggregateStatus::Error => {
                for e in &result.errors {
                    println!("{}: {}", name, e.message);
                }
            }
        }
    }
    println!(
        "{} of {} rows valid",
        v.outcome.valid_rows().count(),
        v.outcome.rows.len()
    );
}

pub async fn run_validate(
    cfg: &DepoConfig,
    sheet_path: &Path,
    root: Option<PathBuf>,
    report_path: Option<&Path>,
) -> Result<()> {
    let repo = repository_from_config(cfg)?;
    if repo.is_none() {
        tracing::info!(env = %cfg.api_token_env, "no API token; validating offline");
    }
    let v = validate_sheet(cfg, sheet_path, root, repo.as_ref()).await?;
    print_validation(&v);
    if let Some(path) = report_path {
        report::write_summary_file(path, &v.outcome.rows)?;
    }
    Ok(())
}
