//! CLI for depo: validate a metadata sheet and deposit it to the repository.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use depo_core::config;
use std::path::PathBuf;

use commands::{run_checksum, run_fields, run_upload, run_validate};

/// Top-level CLI for depo.
#[derive(Debug, Parser)]
#[command(name = "depo")]
#[command(about = "depo: validate spreadsheet metadata and deposit records with their files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Validate every row of a sheet and run the cross-row checks.
    Validate {
        /// CSV sheet: one header row, one record per line.
        sheet: PathBuf,
        /// Directory the referenced files live in.
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
        /// Write a CSV summary of every row to this file.
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Validate a sheet, then create a record for every valid row and upload its files.
    Upload {
        /// CSV sheet: one header row, one record per line.
        sheet: PathBuf,
        /// Directory the referenced files live in.
        #[arg(long, value_name = "DIR")]
        root: PathBuf,
        /// Proceed even if several rows share a title.
        #[arg(long)]
        acknowledge_duplicates: bool,
        /// Write a CSV summary of every row to this file.
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Show the field catalog and header mapping in effect.
    Fields,

    /// Print size and SHA-256 of files, as announced to the repository on upload.
    Checksum {
        /// File names, relative to --root.
        #[arg(required = true)]
        files: Vec<String>,
        /// Resolve names under this directory, as a sheet's file column is.
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Validate {
                sheet,
                root,
                report,
            } => run_validate(&cfg, &sheet, root, report.as_deref()).await?,
            CliCommand::Upload {
                sheet,
                root,
                acknowledge_duplicates,
                report,
            } => run_upload(&cfg, &sheet, root, acknowledge_duplicates, report.as_deref()).await?,
            CliCommand::Fields => run_fields(&cfg),
            CliCommand::Checksum { files, root } => run_checksum(&cfg, &root, &files).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
