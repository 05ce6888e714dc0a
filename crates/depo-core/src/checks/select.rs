//! Controlled-vocabulary check for fields with an option set.
//!
//! Values are matched after normalizing case and punctuation, then by
//! string similarity. A close match replaces the cell value in place and is
//! reported as a warning; a value with no match fails the row.

use anyhow::Result;

use super::CheckInput;
use crate::error::{DataError, DataErrorKind};
use crate::fields::FieldValue;
use crate::row::Emitter;

/// Lowercase, keep letters and digits, collapse everything else to single spaces.
fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best option for `value`, if any is close enough.
pub(crate) fn best_match<'a>(value: &str, options: &'a [String], threshold: f64) -> Option<&'a str> {
    if let Some(exact) = options.iter().find(|o| o.as_str() == value) {
        return Some(exact);
    }
    let wanted = normalize(value);
    if let Some(loose) = options.iter().find(|o| normalize(o) == wanted) {
        return Some(loose);
    }
    options
        .iter()
        .map(|o| (o, strsim::normalized_levenshtein(&wanted, &normalize(o))))
        .filter(|(_, score)| *score >= threshold)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(o, _)| o.as_str())
}

pub(super) fn run(input: CheckInput<'_>, emit: &mut Emitter<'_>) -> Result<()> {
    let CheckInput { data, ctx, .. } = input;

    let mut checked = 0usize;
    let mut invalid: Vec<String> = Vec::new();
    for field in &ctx.fields {
        let Some(options) = field.options.as_ref().filter(|o| !o.is_empty()) else {
            continue;
        };
        let Some(value) = data.get_mut(&field.name) else {
            continue;
        };
        let slots: Vec<&mut String> = match value {
            FieldValue::Text(s) => vec![s],
            FieldValue::List(items) => items.iter_mut().collect(),
            FieldValue::Json(_) => {
                emit.failed(DataError::new(
                    DataErrorKind::InvalidTypeError,
                    format!("field '{}' must be text, not JSON", field.name),
                ));
                return Ok(());
            }
        };
        let mut notices = Vec::new();
        for slot in slots {
            checked += 1;
            match best_match(slot.as_str(), options, ctx.fuzzy_threshold) {
                Some(option) if option == slot.as_str() => {}
                Some(option) => {
                    notices.push(format!(
                        "{}: '{}' was changed to '{}'",
                        field.name, slot, option
                    ));
                    *slot = option.to_string();
                }
                None => invalid.push(format!("'{}' is not a valid {}", slot, field.name)),
            }
        }
        for notice in notices {
            if emit.warning(notice).is_halt() {
                return Ok(());
            }
        }
    }

    if invalid.is_empty() {
        emit.success(format!("{} value(s) checked", checked));
    } else {
        emit.failed(DataError::new(
            DataErrorKind::InvalidOptionError,
            invalid.join("; "),
        ));
    }
    Ok(())
}
