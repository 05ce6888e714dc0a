//! Date fields: calendar dates or offset-carrying timestamps.
//!
//! Accepted: `YYYY-MM-DD`, `YYYY-MM`, `YYYY`, and RFC 3339 timestamps with an
//! explicit offset (`Z` or `±hh:mm`). Timestamps without an offset are
//! rejected because their instant is ambiguous.

use anyhow::Result;
use chrono::{DateTime, NaiveDate};

use super::CheckInput;
use crate::error::{DataError, DataErrorKind};
use crate::fields::FieldType;
use crate::row::Emitter;

pub(crate) fn parse_date(s: &str) -> Result<(), String> {
    let s = s.trim();
    if s.contains('T') || (s.contains(' ') && s.len() > 10) {
        return DateTime::parse_from_rfc3339(s).map(|_| ()).map_err(|_| {
            format!(
                "'{}' is not an RFC 3339 timestamp with a UTC offset (e.g. 2024-05-01T12:00:00Z)",
                s
            )
        });
    }
    let digits = |part: &str, n: usize| part.len() == n && part.chars().all(|c| c.is_ascii_digit());
    let parts: Vec<&str> = s.split('-').collect();
    let ok = match parts.as_slice() {
        &[y] => digits(y, 4),
        &[y, m] => {
            digits(y, 4)
                && digits(m, 2)
                && NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").is_ok()
        }
        &[y, m, d] => {
            digits(y, 4)
                && digits(m, 2)
                && digits(d, 2)
                && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("'{}' is not a date in YYYY-MM-DD form", s))
    }
}

pub(super) fn run(input: CheckInput<'_>, emit: &mut Emitter<'_>) -> Result<()> {
    let CheckInput { data, ctx, .. } = input;
    let mut checked = 0usize;
    let mut problems = Vec::new();
    for field in ctx.fields.iter().filter(|f| f.field_type == FieldType::Date) {
        let Some(value) = data.get(&field.name) else {
            continue;
        };
        for entry in value.entries() {
            checked += 1;
            if let Err(e) = parse_date(entry) {
                problems.push(format!("{}: {}", field.name, e));
            }
        }
    }
    if problems.is_empty() {
        emit.success(format!("{} date(s) checked", checked));
    } else {
        emit.failed(DataError::new(DataErrorKind::InvalidDateError, problems.join("; ")));
    }
    Ok(())
}
