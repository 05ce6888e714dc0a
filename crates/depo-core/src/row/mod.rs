//! Row task: validation state machine for one sheet line.
//!
//! A row runs its checks strictly in registration order, one at a time.
//! Rows are independent of each other and run concurrently. The terminated
//! flag is shared with the registry; once set, the row stops at its next emit
//! and no further patch from it is applied.

mod emit;
mod history;
mod status;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::checks::{Check, CheckContext, CheckInput, RowScratch};
use crate::error::{DataError, DataErrorKind};
use crate::fields::{FieldValue, RowData, TITLE_FIELD};
use crate::flow::Flow;

pub use emit::{Ack, DetachedSink, Emitter, PatchSink};
pub use history::{CheckHistory, CheckResult, CheckStatus};
pub use status::{RowPatch, RowState, RowStatus};

pub struct RowTask {
    cells: Vec<String>,
    data: RowData,
    scratch: RowScratch,
    checks: Vec<Check>,
    histories: Vec<CheckHistory>,
    status: RowStatus,
    terminated: Arc<AtomicBool>,
    sink: Arc<dyn PatchSink>,
}

impl RowTask {
    pub fn new(
        id: u64,
        row_number: usize,
        cells: Vec<String>,
        checks: Vec<Check>,
        sink: Arc<dyn PatchSink>,
    ) -> Self {
        let histories = checks.iter().map(|c| CheckHistory::new(c.name())).collect();
        Self {
            cells,
            data: RowData::new(),
            scratch: RowScratch::default(),
            checks,
            histories,
            status: RowStatus::new(id, row_number),
            terminated: Arc::new(AtomicBool::new(false)),
            sink,
        }
    }

    pub fn id(&self) -> u64 {
        self.status.id
    }

    pub fn row_number(&self) -> usize {
        self.status.row_number
    }

    pub fn status(&self) -> &RowStatus {
        &self.status
    }

    pub fn data(&self) -> &RowData {
        &self.data
    }

    pub fn scratch(&self) -> &RowScratch {
        &self.scratch
    }

    pub fn histories(&self) -> &[CheckHistory] {
        &self.histories
    }

    pub fn title(&self) -> Option<&str> {
        self.data.get(TITLE_FIELD).and_then(FieldValue::as_text)
    }

    /// Handle the registry keeps to halt this row from outside.
    pub fn terminate_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.terminated)
    }

    /// Stop this row: every later patch attempt is a no-op.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// True iff every check's history ends in a terminal entry.
    pub fn is_complete(&self) -> bool {
        self.histories.iter().all(CheckHistory::is_terminal)
    }

    /// Run every registered check in order. Returns once the row is complete.
    pub async fn run_all_checks(&mut self, ctx: &CheckContext) {
        self.status.started_at = Some(Utc::now());
        self.status.advance(RowState::Parsing);
        let row = self.status.row_number;

        for index in 0..self.checks.len() {
            if self.is_terminated() {
                break;
            }
            let check = self.checks[index];
            tracing::debug!(row, check = check.name(), "check started");

            let RowTask {
                cells,
                data,
                scratch,
                histories,
                status,
                terminated,
                sink,
                ..
            } = self;
            let mut emit = Emitter::new(index, histories, status, terminated, &**sink);
            if emit.emit(CheckResult::in_progress()).is_halt() {
                break;
            }
            let input = CheckInput {
                cells,
                data,
                ctx,
                scratch,
            };
            if let Err(e) = check.run(input, &mut emit).await {
                tracing::warn!(row, check = check.name(), error = %e, "check failed unexpectedly");
                emit.failed(DataError::new(
                    DataErrorKind::UnhandledError,
                    format!("{}: {:#}", check.name(), e),
                ));
            }
            if !emit.finished() && emit.flow() == Flow::Continue {
                emit.failed(DataError::new(
                    DataErrorKind::UnhandledError,
                    format!("{} finished without a result", check.name()),
                ));
            }
            let flow = emit.flow();
            tracing::debug!(row, check = check.name(), ?flow, "check finished");
            if flow.is_halt() {
                break;
            }
        }

        self.settle();
        tracing::info!(
            row,
            state = self.status.state.as_str(),
            errors = self.status.errors.len(),
            warnings = self.status.warnings.len(),
            "row settled"
        );
    }

    /// Mark every unfinished check skipped and fix the final state locally.
    /// A row stopped from outside fails the first check it never finished.
    fn settle(&mut self) {
        let mut halted = self.is_terminated() && !self.status.state.is_final();
        for h in self.histories.iter_mut().filter(|h| !h.is_terminal()) {
            if halted {
                h.push(CheckResult::failed(DataError::new(
                    DataErrorKind::BatchHalted,
                    "batch stopped before this check finished",
                )));
                halted = false;
            } else {
                h.push(CheckResult::skipped("row stopped before this check finished"));
            }
        }
        self.status.recompute(&self.histories);
        if !self.status.state.is_final() {
            self.status.errors.push(DataError::new(
                DataErrorKind::BatchHalted,
                "validation stopped before the row finished",
            ));
            self.status.advance(RowState::Error);
        }
    }
}
