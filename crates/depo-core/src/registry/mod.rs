//! Row registry: the batch-wide view of every row task.
//!
//! Rows forward a patch after every emit. The registry keeps the latest status
//! per row, counts failed rows against `max_errors` and folds excess warnings.
//! Halting the batch sets every unsettled row's terminated flag and marks it
//! `Error` under the same lock that applies patches, so a row's final status
//! is decided exactly once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::DepoConfig;
use crate::error::{DataError, DataErrorKind};
use crate::row::{Ack, PatchSink, RowPatch, RowState, RowStatus};

/// Batch-wide limits taken from config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Halt the batch once this many rows are in error (0 = never).
    pub max_errors: usize,
    /// Warnings kept per row in the registry view (0 = all).
    pub max_warnings: usize,
}

impl RegistryLimits {
    pub fn from_config(cfg: &DepoConfig) -> Self {
        Self {
            max_errors: cfg.max_errors,
            max_warnings: cfg.max_warnings,
        }
    }
}

struct Entry {
    status: RowStatus,
    complete: bool,
    terminated: Arc<AtomicBool>,
}

impl Entry {
    /// Stop the row and record why. No-op once the row is final.
    fn force_error(&mut self, error: DataError) {
        self.terminated.store(true, Ordering::Release);
        if self.status.state.is_final() {
            return;
        }
        self.status.errors.push(error);
        self.status.advance(RowState::Parsing);
        self.status.advance(RowState::Error);
    }
}

#[derive(Default)]
struct State {
    rows: BTreeMap<u64, Entry>,
    failed_rows: usize,
    halted: Option<String>,
}

impl State {
    fn halt(&mut self, reason: &str) {
        if self.halted.is_some() {
            return;
        }
        tracing::warn!(reason, "batch halted");
        self.halted = Some(reason.to_string());
        for entry in self.rows.values_mut() {
            entry.force_error(DataError::new(DataErrorKind::BatchHalted, reason));
        }
    }
}

pub struct RowRegistry {
    limits: RegistryLimits,
    state: Mutex<State>,
}

impl RowRegistry {
    pub fn new(limits: RegistryLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track a row. `terminated` is the row's own flag; the registry sets it
    /// when the batch halts.
    pub fn register(&self, id: u64, row_number: usize, terminated: Arc<AtomicBool>) {
        let mut state = self.lock();
        let mut entry = Entry {
            status: RowStatus::new(id, row_number),
            complete: false,
            terminated,
        };
        if let Some(reason) = state.halted.clone() {
            entry.force_error(DataError::new(DataErrorKind::BatchHalted, reason));
        }
        state.rows.insert(id, entry);
    }

    /// Stop every row that has not settled yet.
    pub fn halt(&self, reason: &str) {
        self.lock().halt(reason);
    }

    pub fn halt_reason(&self) -> Option<String> {
        self.lock().halted.clone()
    }

    pub fn status(&self, id: u64) -> Option<RowStatus> {
        self.lock().rows.get(&id).map(|e| e.status.clone())
    }

    /// Current status of every row, ordered by id.
    pub fn snapshot(&self) -> Vec<RowStatus> {
        self.lock().rows.values().map(|e| e.status.clone()).collect()
    }

    pub fn failed_rows(&self) -> usize {
        self.lock().failed_rows
    }

    /// True once every registered row has a final state.
    pub fn all_settled(&self) -> bool {
        self.lock().rows.values().all(|e| e.status.state.is_final())
    }

    /// Adopt a row's locally settled status if no patch delivered it.
    pub fn settle(&self, status: &RowStatus) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(entry) = state.rows.get_mut(&status.id) else {
            return;
        };
        if entry.status.state.is_final() {
            return;
        }
        entry.status = fold_warnings(status.clone(), self.limits.max_warnings);
        entry.complete = true;
        if entry.status.state == RowState::Error {
            state.failed_rows += 1;
        }
    }

    /// Mark a row failed from outside, e.g. when its task panicked.
    pub fn fail_row(&self, id: u64, error: DataError) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(entry) = state.rows.get_mut(&id) else {
            return;
        };
        if entry.status.state.is_final() {
            return;
        }
        entry.force_error(error);
        entry.complete = true;
        state.failed_rows += 1;
    }
}

impl PatchSink for RowRegistry {
    fn apply(&self, patch: RowPatch) -> Ack {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.halted.is_some() {
            return Ack::StopBatch;
        }
        let id = patch.status.id;
        let Some(entry) = state.rows.get_mut(&id) else {
            tracing::debug!(id, "patch for unknown row ignored");
            return Ack::StopBatch;
        };
        if entry.terminated.load(Ordering::Acquire) || entry.status.state.is_final() {
            return Ack::StopBatch;
        }

        entry.status = fold_warnings(patch.status, self.limits.max_warnings);
        entry.complete = patch.complete;
        if entry.status.state != RowState::Error {
            return Ack::Continue;
        }

        state.failed_rows += 1;
        let max = self.limits.max_errors;
        if max > 0 && state.failed_rows >= max {
            let reason = format!("{} rows failed validation (limit {})", state.failed_rows, max);
            state.halt(&reason);
        }
        Ack::Continue
    }
}

/// Keep the first `max` warnings and summarize the rest in one entry.
fn fold_warnings(mut status: RowStatus, max: usize) -> RowStatus {
    if max > 0 && status.warnings.len() > max {
        let extra = status.warnings.len() - max;
        status.warnings.truncate(max);
        status.warnings.push(format!("… and {} more", extra));
    }
    status
}

#[cfg(test)]
mod tests;
