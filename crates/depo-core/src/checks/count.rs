//! Keyword and category count bounds.

use anyhow::Result;

use super::CheckInput;
use crate::config::CountBounds;
use crate::error::{DataError, DataErrorKind};
use crate::fields::{FieldValue, CATEGORIES_FIELD, KEYWORDS_FIELD};
use crate::row::Emitter;

fn run_count(
    input: CheckInput<'_>,
    emit: &mut Emitter<'_>,
    field: &str,
    bounds: Option<CountBounds>,
    kind: DataErrorKind,
) -> Result<()> {
    let Some(bounds) = bounds else {
        emit.failed(DataError::new(
            DataErrorKind::MissingContextError,
            format!("no {} count bounds configured", field),
        ));
        return Ok(());
    };
    let n = input.data.get(field).map_or(0, FieldValue::count);
    if bounds.contains(n) {
        emit.success(format!("{} {}", n, field));
    } else {
        emit.failed(DataError::new(
            kind,
            format!(
                "expected between {} and {} {}, found {}",
                bounds.min, bounds.max, field, n
            ),
        ));
    }
    Ok(())
}

pub(super) fn run_keywords(input: CheckInput<'_>, emit: &mut Emitter<'_>) -> Result<()> {
    let bounds = input.ctx.keywords;
    run_count(input, emit, KEYWORDS_FIELD, bounds, DataErrorKind::KeywordCountError)
}

pub(super) fn run_categories(input: CheckInput<'_>, emit: &mut Emitter<'_>) -> Result<()> {
    let bounds = input.ctx.categories;
    run_count(input, emit, CATEGORIES_FIELD, bounds, DataErrorKind::CategoryCountError)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{ctx, run_check};
    use super::super::Check;
    use super::*;
    use crate::fields::RowData;
    use crate::row::CheckStatus;

    fn keywords(n: usize) -> RowData {
        let mut data = RowData::new();
        data.insert(
            KEYWORDS_FIELD.to_string(),
            FieldValue::List((0..n).map(|i| format!("k{}", i)).collect()),
        );
        data
    }

    #[tokio::test]
    async fn missing_bounds_is_context_error() {
        let mut c = ctx();
        c.keywords = None;
        let out = run_check(Check::KeywordCount, &c, keywords(2)).await;
        let err = out.history.last().unwrap().error.clone().unwrap();
        assert_eq!(err.kind, DataErrorKind::MissingContextError);
    }

    #[tokio::test]
    async fn bounds_are_inclusive() {
        let mut c = ctx();
        c.keywords = Some(CountBounds { min: 2, max: 3 });
        for (n, ok) in [(1, false), (2, true), (3, true), (4, false)] {
            let out = run_check(Check::KeywordCount, &c, keywords(n)).await;
            let last = out.history.last().unwrap();
            if ok {
                assert_eq!(last.status, CheckStatus::Success, "n = {}", n);
            } else {
                assert_eq!(
                    last.error.as_ref().unwrap().kind,
                    DataErrorKind::KeywordCountError,
                    "n = {}",
                    n
                );
            }
        }
    }

    #[tokio::test]
    async fn absent_categories_count_as_zero() {
        let mut c = ctx();
        c.categories = Some(CountBounds { min: 1, max: 5 });
        let out = run_check(Check::CategoryCount, &c, RowData::new()).await;
        let err = out.history.last().unwrap().error.clone().unwrap();
        assert_eq!(err.kind, DataErrorKind::CategoryCountError);
        assert!(err.message.contains("found 0"));
    }
}
