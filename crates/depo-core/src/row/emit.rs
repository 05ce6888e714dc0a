//! The sink a check reports through.
//!
//! Every emit appends to the current check's history, recomputes the row
//! status and forwards a patch to the registry. The returned [`Flow`] tells
//! the check whether to keep going: `Halt` after a failure, after the row was
//! terminated, or when the registry asks the whole batch to stop.

use std::sync::atomic::{AtomicBool, Ordering};

use super::history::{CheckHistory, CheckResult, CheckStatus};
use super::status::{RowPatch, RowStatus};
use crate::error::DataError;
use crate::flow::Flow;

/// Registry answer to a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Continue,
    /// The batch is stopping (halted, cleared, or every row already settled).
    StopBatch,
}

/// Receives row patches. Implemented by the registry.
pub trait PatchSink: Send + Sync {
    fn apply(&self, patch: RowPatch) -> Ack;
}

/// Sink that accepts everything; for running a row on its own.
pub struct DetachedSink;

impl PatchSink for DetachedSink {
    fn apply(&self, _patch: RowPatch) -> Ack {
        Ack::Continue
    }
}

pub struct Emitter<'a> {
    check: usize,
    histories: &'a mut [CheckHistory],
    status: &'a mut RowStatus,
    terminated: &'a AtomicBool,
    sink: &'a dyn PatchSink,
    halted: bool,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(
        check: usize,
        histories: &'a mut [CheckHistory],
        status: &'a mut RowStatus,
        terminated: &'a AtomicBool,
        sink: &'a dyn PatchSink,
    ) -> Self {
        Self {
            check,
            histories,
            status,
            terminated,
            sink,
            halted: false,
        }
    }

    /// Report a result for the current check.
    pub fn emit(&mut self, result: CheckResult) -> Flow {
        if self.halted || self.terminated.load(Ordering::Acquire) {
            self.halted = true;
            return Flow::Halt;
        }
        let failed = result.status == CheckStatus::Failed;
        if !self.histories[self.check].push(result) {
            return Flow::Continue;
        }
        self.status.recompute(self.histories);

        let patch = RowPatch {
            status: self.status.clone(),
            complete: self.histories.iter().all(CheckHistory::is_terminal),
        };
        if self.sink.apply(patch) == Ack::StopBatch {
            self.terminated.store(true, Ordering::Release);
            self.halted = true;
        }
        if failed {
            self.halted = true;
        }
        if self.halted {
            Flow::Halt
        } else {
            Flow::Continue
        }
    }

    pub fn success(&mut self, details: impl Into<String>) -> Flow {
        self.emit(CheckResult::success().details(details))
    }

    pub fn skipped(&mut self, reason: impl Into<String>) -> Flow {
        self.emit(CheckResult::skipped(reason))
    }

    pub fn failed(&mut self, error: DataError) -> Flow {
        self.emit(CheckResult::failed(error))
    }

    /// Terminal failure whose errors were already reported as problems.
    pub fn failed_with_details(&mut self, details: impl Into<String>) -> Flow {
        self.emit(CheckResult::new(CheckStatus::Failed).details(details))
    }

    pub fn problem(&mut self, error: DataError) -> Flow {
        self.emit(CheckResult::problem(error))
    }

    pub fn warning(&mut self, message: impl Into<String>) -> Flow {
        self.emit(CheckResult::warn(message))
    }

    /// True once the current check has a terminal entry.
    pub fn finished(&self) -> bool {
        self.histories[self.check].is_terminal()
    }

    /// Whether the row should stop after the current check.
    pub fn flow(&self) -> Flow {
        if self.halted || self.terminated.load(Ordering::Acquire) {
            Flow::Halt
        } else {
            Flow::Continue
        }
    }
}
