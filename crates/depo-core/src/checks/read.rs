//! Read step: positional cells -> named, typed field values.

use anyhow::Result;

use super::CheckInput;
use crate::error::{DataError, DataErrorKind};
use crate::fields::{FieldDescriptor, FieldType, FieldValue};
use crate::row::Emitter;

/// A single cell expanded according to its descriptor.
struct Expanded {
    value: FieldValue,
    warnings: Vec<String>,
}

fn expand(field: &FieldDescriptor, raw: &str, delimiter: &str) -> Result<Expanded, DataError> {
    if field.field_type == FieldType::Json {
        let doc: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
            DataError::new(
                DataErrorKind::InvalidJsonError,
                format!("field '{}' is not valid JSON: {}", field.name, e),
            )
        })?;
        let mut warnings = Vec::new();
        if let Some(schema) = &field.schema {
            let report = schema.validate(&doc).map_err(|e| {
                DataError::new(
                    DataErrorKind::InvalidJsonError,
                    format!("field '{}': {}", field.name, e),
                )
            })?;
            if !report.unknown_keys.is_empty() {
                warnings.push(format!(
                    "field '{}' has unrecognized keys: {}",
                    field.name,
                    report.unknown_keys.join(", ")
                ));
            }
        }
        return Ok(Expanded {
            value: FieldValue::Json(doc),
            warnings,
        });
    }

    let value = if field.is_list() {
        let items = raw
            .split(delimiter)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        FieldValue::List(items)
    } else {
        FieldValue::Text(raw.to_string())
    };
    Ok(Expanded {
        value,
        warnings: Vec::new(),
    })
}

pub(super) fn run(input: CheckInput<'_>, emit: &mut Emitter<'_>) -> Result<()> {
    let CheckInput {
        cells, data, ctx, ..
    } = input;

    if cells.len() > ctx.headers.len() {
        emit.failed(DataError::new(
            DataErrorKind::InvalidInputData,
            format!(
                "row has {} values but the sheet has only {} headers",
                cells.len(),
                ctx.headers.len()
            ),
        ));
        return Ok(());
    }

    data.clear();
    let mut unmapped = Vec::new();
    for (header, raw) in ctx.headers.iter().zip(cells) {
        let raw = raw.trim();
        let Some(field) = ctx.mapping.field_for(header).and_then(|name| ctx.field(name)) else {
            if !raw.is_empty() {
                unmapped.push(header.as_str());
            }
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        match expand(field, raw, &ctx.list_delimiter) {
            Ok(expanded) => {
                for w in expanded.warnings {
                    if emit.warning(w).is_halt() {
                        return Ok(());
                    }
                }
                if !expanded.value.is_empty() {
                    data.insert(field.name.clone(), expanded.value);
                }
            }
            Err(err) => {
                emit.failed(err);
                return Ok(());
            }
        }
    }

    if !unmapped.is_empty() {
        let msg = format!("ignored columns with no matching field: {}", unmapped.join(", "));
        if emit.warning(msg).is_halt() {
            return Ok(());
        }
    }

    for field in ctx.fields.iter().filter(|f| f.is_mandatory) {
        if data.get(&field.name).map_or(true, FieldValue::is_empty) {
            emit.failed(DataError::new(
                DataErrorKind::InvalidInputData,
                format!("mandatory field '{}' is empty", field.name),
            ));
            return Ok(());
        }
    }

    emit.success(format!("{} fields read", data.len()));
    Ok(())
}
