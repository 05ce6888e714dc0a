//! Externally visible row status and the patch a row sends to its registry.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::history::CheckHistory;
use crate::error::DataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowState {
    Pending,
    Parsing,
    Valid,
    Error,
}

impl RowState {
    pub fn is_final(self) -> bool {
        matches!(self, RowState::Valid | RowState::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RowState::Pending => "pending",
            RowState::Parsing => "parsing",
            RowState::Valid => "valid",
            RowState::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowStatus {
    pub id: u64,
    /// 1-based line number in the sheet (the header is line 1).
    pub row_number: usize,
    pub state: RowState,
    pub errors: Vec<DataError>,
    pub warnings: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RowStatus {
    pub fn new(id: u64, row_number: usize) -> Self {
        Self {
            id,
            row_number,
            state: RowState::Pending,
            errors: Vec::new(),
            warnings: Vec::new(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Move to `next` if allowed. Only pending→parsing and parsing→{valid, error}
    /// are accepted; a final state never changes.
    pub fn advance(&mut self, next: RowState) -> bool {
        let allowed = matches!(
            (self.state, next),
            (RowState::Pending, RowState::Parsing)
                | (RowState::Parsing, RowState::Valid)
                | (RowState::Parsing, RowState::Error)
        );
        if allowed {
            self.state = next;
            if next.is_final() {
                self.completed_at = Some(Utc::now());
            }
        }
        allowed
    }

    /// Rebuild the error and warning lists from every check so far and
    /// derive the state: any failed check means error, all checks terminal
    /// means valid.
    pub fn recompute(&mut self, histories: &[CheckHistory]) {
        self.errors = histories
            .iter()
            .flat_map(|h| h.entries().iter().filter_map(|r| r.error.clone()))
            .collect();
        self.warnings = histories
            .iter()
            .flat_map(|h| h.entries().iter().filter_map(|r| r.warning.clone()))
            .collect();
        if histories.iter().any(CheckHistory::failed) {
            self.advance(RowState::Error);
        } else if histories.iter().all(CheckHistory::is_terminal) {
            self.advance(RowState::Valid);
        }
    }

    /// Seconds between start and completion, if both are known.
    pub fn duration_secs(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(s), Some(c)) => Some((c - s).num_milliseconds().max(0) as f64 / 1000.0),
            _ => None,
        }
    }
}

/// Status update forwarded from a row task to its registry after every emit.
#[derive(Debug, Clone)]
pub struct RowPatch {
    pub status: RowStatus,
    pub complete: bool,
}
