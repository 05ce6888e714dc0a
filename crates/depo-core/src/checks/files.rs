//! File reference check: every referenced file must exist under the root.
//!
//! Problems are reported one entry at a time without halting, so a single pass
//! lists every bad reference in the row. Sizes of good files accumulate in the
//! row's scratch for the quota aggregate.

use anyhow::Result;

use super::{CheckInput, ResolvedFile};
use crate::error::{DataError, DataErrorKind};
use crate::fields::FieldType;
use crate::row::Emitter;

pub(super) async fn run(input: CheckInput<'_>, emit: &mut Emitter<'_>) -> Result<()> {
    let CheckInput {
        data, ctx, scratch, ..
    } = input;

    let file_fields: Vec<&str> = ctx
        .fields
        .iter()
        .filter(|f| f.field_type == FieldType::Files)
        .map(|f| f.name.as_str())
        .collect();
    if file_fields.is_empty() {
        emit.skipped("no file field configured");
        return Ok(());
    }

    let mut names: Vec<String> = Vec::new();
    for field in &file_fields {
        if let Some(value) = data.get(*field) {
            for name in value.entries() {
                if names.iter().any(|n| n == name) {
                    if emit
                        .warning(format!("file '{}' is listed more than once", name))
                        .is_halt()
                    {
                        return Ok(());
                    }
                    continue;
                }
                names.push(name.to_string());
            }
        }
    }
    if names.is_empty() {
        emit.success("no files referenced");
        return Ok(());
    }

    if !ctx.host.native_file_access {
        emit.failed(DataError::new(
            DataErrorKind::UnsupportedHost,
            "this host cannot read local files",
        ));
        return Ok(());
    }
    let Some(root) = ctx.root.as_ref() else {
        emit.failed(DataError::new(
            DataErrorKind::NoRootDir,
            format!("{} file(s) referenced but no root directory is set", names.len()),
        ));
        return Ok(());
    };

    scratch.quota_used = 0;
    scratch.files.clear();
    let mut bad = 0usize;
    for name in &names {
        match root.size_of(name).await {
            Ok(size) => {
                scratch.quota_used += size;
                scratch.files.push(ResolvedFile {
                    name: name.clone(),
                    size,
                });
                if size == 0
                    && emit
                        .warning(format!("file '{}' is empty (0 bytes)", name))
                        .is_halt()
                {
                    return Ok(());
                }
            }
            Err(e) => {
                bad += 1;
                tracing::debug!(file = %name, error = %e, "file reference unusable");
                if emit.problem(e.to_data_error()).is_halt() {
                    return Ok(());
                }
            }
        }
    }

    if bad > 0 {
        emit.failed_with_details(format!("{} of {} referenced files are unusable", bad, names.len()));
    } else {
        emit.success(format!(
            "{} file(s), {} bytes",
            scratch.files.len(),
            scratch.quota_used
        ));
    }
    Ok(())
}
