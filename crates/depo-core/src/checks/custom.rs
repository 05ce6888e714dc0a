//! Per-field length constraints from configuration.

use anyhow::Result;

use super::CheckInput;
use crate::error::{DataError, DataErrorKind};
use crate::fields::FieldValue;
use crate::row::Emitter;

pub(super) fn run(input: CheckInput<'_>, emit: &mut Emitter<'_>) -> Result<()> {
    let CheckInput { data, ctx, .. } = input;
    if ctx.constraints.is_empty() {
        emit.skipped("no length constraints configured");
        return Ok(());
    }

    let mut checked = 0usize;
    for (name, constraint) in &ctx.constraints {
        // Optional fields left empty are not checked.
        let Some(value) = data.get(name) else {
            continue;
        };
        let (len, unit) = match value {
            FieldValue::Text(s) => (s.chars().count(), "characters"),
            FieldValue::List(items) => (items.len(), "entries"),
            FieldValue::Json(_) => {
                emit.failed(DataError::new(
                    DataErrorKind::InvalidTypeError,
                    format!("field '{}' must be text or a list to check its length", name),
                ));
                return Ok(());
            }
        };
        checked += 1;
        if let Some(min) = constraint.min_length {
            if len < min {
                emit.failed(DataError::new(
                    DataErrorKind::InvalidLengthError,
                    format!("field '{}' has {} {}, minimum is {}", name, len, unit, min),
                ));
                return Ok(());
            }
        }
        if let Some(max) = constraint.max_length {
            if len > max {
                emit.failed(DataError::new(
                    DataErrorKind::InvalidLengthError,
                    format!("field '{}' has {} {}, maximum is {}", name, len, unit, max),
                ));
                return Ok(());
            }
        }
    }

    emit.success(format!("{} constrained field(s) checked", checked));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::{ctx, run_check};
    use super::super::Check;
    use super::*;
    use crate::config::LengthConstraint;
    use crate::fields::RowData;
    use crate::row::CheckStatus;

    fn constrained(field: &str, min: Option<usize>, max: Option<usize>) -> crate::checks::CheckContext {
        let mut c = ctx();
        c.constraints.clear();
        c.constraints.insert(
            field.to_string(),
            LengthConstraint {
                min_length: min,
                max_length: max,
            },
        );
        c
    }

    #[tokio::test]
    async fn too_short_title_fails() {
        let c = constrained("title", Some(3), Some(10));
        let mut data = RowData::new();
        data.insert("title".into(), FieldValue::Text("ab".into()));
        let out = run_check(Check::CustomFields, &c, data).await;
        let err = out.history.last().unwrap().error.clone().unwrap();
        assert_eq!(err.kind, DataErrorKind::InvalidLengthError);
    }

    #[tokio::test]
    async fn empty_optional_field_is_skipped() {
        let c = constrained("description", Some(10), None);
        let out = run_check(Check::CustomFields, &c, RowData::new()).await;
        assert_eq!(out.history.last().unwrap().status, CheckStatus::Success);
    }

    #[tokio::test]
    async fn json_value_is_a_type_error() {
        let c = constrained("custom_fields", None, Some(5));
        let mut data = RowData::new();
        data.insert("custom_fields".into(), FieldValue::Json(serde_json::json!({"a": 1})));
        let out = run_check(Check::CustomFields, &c, data).await;
        let err = out.history.last().unwrap().error.clone().unwrap();
        assert_eq!(err.kind, DataErrorKind::InvalidTypeError);
    }

    #[tokio::test]
    async fn list_length_counts_entries() {
        let c = constrained("keywords", None, Some(2));
        let mut data = RowData::new();
        data.insert(
            "keywords".into(),
            FieldValue::List(vec!["a".into(), "b".into(), "c".into()]),
        );
        let out = run_check(Check::CustomFields, &c, data).await;
        assert_eq!(out.history.last().unwrap().status, CheckStatus::Failed);
    }

    #[tokio::test]
    async fn no_constraints_skips() {
        let mut c = ctx();
        c.constraints.clear();
        let out = run_check(Check::CustomFields, &c, RowData::new()).await;
        assert_eq!(out.history.last().unwrap().status, CheckStatus::Skipped);
    }
}
