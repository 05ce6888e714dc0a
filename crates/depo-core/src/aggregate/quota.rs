//! Remaining-quota check over every row's referenced file sizes.

use super::AggregateResult;
use crate::error::{DataError, DataErrorKind};

/// Valid when the total fits in `remaining` (inclusive). Skipped when the
/// remaining quota is unknown.
pub fn check_quota<I>(sizes: I, remaining: Option<u64>) -> AggregateResult
where
    I: IntoIterator<Item = u64>,
{
    let Some(limit) = remaining else {
        return AggregateResult::skipped();
    };
    let total: u64 = sizes.into_iter().fold(0u64, u64::saturating_add);
    if total <= limit {
        return AggregateResult::valid();
    }
    AggregateResult::from_errors(vec![DataError::new(
        DataErrorKind::QuotaExceededError,
        format!(
            "Total file size of {} bytes exceeds the remaining quota of {} bytes by {} bytes",
            total,
            limit,
            total - limit
        ),
    )])
}
