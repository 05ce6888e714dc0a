//! Check units run by every row task, in order.
//!
//! Each check reads the expanded row, the field descriptors and the shared
//! [`CheckContext`], reports through an [`Emitter`] and always ends with a
//! terminal result. A missing configuration value is a failed check with
//! `MissingContextError`, never a panic. An `Err` return is reserved for
//! unexpected failures; the row task turns it into `UnhandledError`.

mod context;
mod count;
mod custom;
mod date;
mod files;
mod read;
mod select;

use anyhow::Result;

use crate::fields::RowData;
use crate::row::Emitter;

pub use context::{CheckContext, ResolvedFile, RowScratch};

/// Everything a check may look at for one row.
pub struct CheckInput<'a> {
    /// Raw positional cells from the sheet.
    pub cells: &'a [String],
    pub data: &'a mut RowData,
    pub ctx: &'a CheckContext,
    pub scratch: &'a mut RowScratch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Map cells onto named fields.
    Read,
    Files,
    SelectValues,
    KeywordCount,
    CategoryCount,
    CustomFields,
    Dates,
    /// Returns `Err` without reporting a result.
    #[cfg(test)]
    Fault,
    /// Panics when the row's first cell is "panic"; succeeds otherwise.
    #[cfg(test)]
    Panic,
}

impl Check {
    /// Registration order used for every row.
    pub const PIPELINE: [Check; 7] = [
        Check::Read,
        Check::Files,
        Check::SelectValues,
        Check::KeywordCount,
        Check::CategoryCount,
        Check::CustomFields,
        Check::Dates,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Check::Read => "read",
            Check::Files => "files",
            Check::SelectValues => "select_values",
            Check::KeywordCount => "keyword_count",
            Check::CategoryCount => "category_count",
            Check::CustomFields => "custom_fields",
            Check::Dates => "dates",
            #[cfg(test)]
            Check::Fault => "fault",
            #[cfg(test)]
            Check::Panic => "panic",
        }
    }

    pub async fn run(self, input: CheckInput<'_>, emit: &mut Emitter<'_>) -> Result<()> {
        match self {
            Check::Read => read::run(input, emit),
            Check::Files => files::run(input, emit).await,
            Check::SelectValues => select::run(input, emit),
            Check::KeywordCount => count::run_keywords(input, emit),
            Check::CategoryCount => count::run_categories(input, emit),
            Check::CustomFields => custom::run(input, emit),
            Check::Dates => date::run(input, emit),
            #[cfg(test)]
            Check::Fault => Err(anyhow::anyhow!("lookup table unavailable")),
            #[cfg(test)]
            Check::Panic => {
                if input.cells.first().map(String::as_str) == Some("panic") {
                    panic!("row task blew up");
                }
                emit.success("no panic");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Run a single check against a detached row.

    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::row::{CheckHistory, DetachedSink, RowStatus};

    pub(crate) struct Outcome {
        pub history: CheckHistory,
        pub status: RowStatus,
        pub data: RowData,
        pub scratch: RowScratch,
    }

    pub(crate) async fn run_check(check: Check, ctx: &CheckContext, data: RowData) -> Outcome {
        run_with_cells(check, ctx, Vec::new(), data).await
    }

    pub(crate) async fn run_with_cells(
        check: Check,
        ctx: &CheckContext,
        cells: Vec<String>,
        mut data: RowData,
    ) -> Outcome {
        let mut histories = vec![CheckHistory::new(check.name())];
        let mut status = RowStatus::new(1, 2);
        status.advance(crate::row::RowState::Parsing);
        let mut scratch = RowScratch::default();
        let terminated = AtomicBool::new(false);
        {
            let mut emit = crate::row::Emitter::new(
                0,
                &mut histories,
                &mut status,
                &terminated,
                &DetachedSink,
            );
            let input = CheckInput {
                cells: &cells,
                data: &mut data,
                ctx,
                scratch: &mut scratch,
            };
            check.run(input, &mut emit).await.unwrap();
        }
        Outcome {
            history: histories.remove(0),
            status,
            data,
            scratch,
        }
    }

    pub(crate) fn ctx() -> CheckContext {
        CheckContext::from_config(&crate::config::DepoConfig::default(), Vec::new(), None)
    }
}
