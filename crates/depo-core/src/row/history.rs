//! Per-check result history for one row.

use serde::Serialize;

use crate::error::DataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pending,
    InProgress,
    Success,
    Skipped,
    Failed,
}

impl CheckStatus {
    /// Terminal statuses end a check's reporting for the row.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CheckStatus::Success | CheckStatus::Skipped | CheckStatus::Failed
        )
    }
}

/// One entry reported by a check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DataError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl CheckResult {
    pub fn new(status: CheckStatus) -> Self {
        Self {
            status,
            details: None,
            error: None,
            warning: None,
        }
    }

    pub fn pending() -> Self {
        Self::new(CheckStatus::Pending)
    }

    pub fn in_progress() -> Self {
        Self::new(CheckStatus::InProgress)
    }

    pub fn success() -> Self {
        Self::new(CheckStatus::Success)
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::new(CheckStatus::Skipped).details(reason)
    }

    /// Terminal failure carrying the error that caused it.
    pub fn failed(error: DataError) -> Self {
        Self::new(CheckStatus::Failed).error(error)
    }

    /// Non-terminal entry that records a problem and lets the check go on.
    pub fn problem(error: DataError) -> Self {
        Self::new(CheckStatus::InProgress).error(error)
    }

    /// Non-terminal entry carrying a warning.
    pub fn warn(message: impl Into<String>) -> Self {
        let mut r = Self::new(CheckStatus::InProgress);
        r.warning = Some(message.into());
        r
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn error(mut self, error: DataError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Append-only history of one check for one row. Frozen once the last entry is terminal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckHistory {
    pub check: &'static str,
    entries: Vec<CheckResult>,
}

impl CheckHistory {
    pub fn new(check: &'static str) -> Self {
        Self {
            check,
            entries: vec![CheckResult::pending()],
        }
    }

    /// Append an entry; returns false (and drops it) if the check is already frozen.
    pub fn push(&mut self, result: CheckResult) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.entries.push(result);
        true
    }

    pub fn entries(&self) -> &[CheckResult] {
        &self.entries
    }

    pub fn last(&self) -> Option<&CheckResult> {
        self.entries.last()
    }

    pub fn is_terminal(&self) -> bool {
        self.last().map_or(false, |r| r.status.is_terminal())
    }

    pub fn failed(&self) -> bool {
        self.last().map_or(false, |r| r.status == CheckStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataErrorKind;

    #[test]
    fn history_freezes_on_terminal() {
        let mut h = CheckHistory::new("files");
        assert!(!h.is_terminal());
        assert!(h.push(CheckResult::in_progress()));
        assert!(h.push(CheckResult::warn("empty file")));
        assert!(!h.is_terminal());
        assert!(h.push(CheckResult::success()));
        assert!(h.is_terminal());
        assert!(!h.push(CheckResult::failed(DataError::new(
            DataErrorKind::UnhandledError,
            "late"
        ))));
        assert_eq!(h.entries().len(), 4);
        assert!(!h.failed());
    }
}
