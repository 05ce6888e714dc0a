//! Duplicate title detection across rows.

use std::collections::HashMap;

use super::AggregateResult;
use crate::error::{DataError, DataErrorKind};

/// Group rows by title (trimmed, case-insensitive). Every title used by more
/// than one row yields one `DuplicateTitleError`, in order of first appearance.
///
/// `rows` pairs each row's sheet line number with its title, if it has one.
pub fn check_titles<'a, I>(rows: I) -> AggregateResult
where
    I: IntoIterator<Item = (usize, Option<&'a str>)>,
{
    // Groups stay in first-appearance order; the map only indexes them.
    let mut groups: Vec<(&'a str, Vec<usize>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (row_number, title) in rows {
        let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        let next = groups.len();
        let i = *index.entry(title.to_lowercase()).or_insert(next);
        if i == next {
            groups.push((title, Vec::new()));
        }
        groups[i].1.push(row_number);
    }

    let errors = groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(title, members)| {
            let list = members
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            DataError::new(
                DataErrorKind::DuplicateTitleError,
                format!(
                    "Title \"{}\" is used by {} rows: {}",
                    title,
                    members.len(),
                    list
                ),
            )
        })
        .collect();
    AggregateResult::from_errors(errors)
}
