//! CSV summary of a processed batch, one line per row.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::batch::RowOutcome;

pub const HEADER: [&str; 7] = [
    "RowID",
    "Status",
    "Error",
    "Warnings",
    "Started",
    "Completed",
    "DurationSec",
];

fn timestamp(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Write the summary for `rows` to any writer.
pub fn write_summary<W: Write>(writer: W, rows: &[RowOutcome]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for row in rows {
        let s = &row.status;
        let errors = s
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        wtr.write_record([
            s.id.to_string(),
            s.state.as_str().to_string(),
            errors,
            s.warnings.join("; "),
            timestamp(s.started_at),
            timestamp(s.completed_at),
            s.duration_secs()
                .map(|d| format!("{:.2}", d))
                .unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_summary_file(path: &Path, rows: &[RowOutcome]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("create report {}", path.display()))?;
    write_summary(file, rows).with_context(|| format!("write report {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "summary written");
    Ok(())
}
