//! Cross-row checks run once every row task has been joined.
//!
//! Both checks read settled row outcomes only. Their results gate the upload:
//! quota must hold, and duplicate titles must be absent or acknowledged.

mod quota;
mod uniqueness;

use serde::Serialize;

use crate::error::DataError;

pub use quota::check_quota;
pub use uniqueness::check_titles;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatus {
    Valid,
    Error,
    /// Not evaluated (e.g. the remaining quota is unknown offline).
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub status: AggregateStatus,
    pub errors: Vec<DataError>,
}

impl AggregateResult {
    pub fn valid() -> Self {
        Self {
            status: AggregateStatus::Valid,
            errors: Vec::new(),
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: AggregateStatus::Skipped,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<DataError>) -> Self {
        if errors.is_empty() {
            Self::valid()
        } else {
            Self {
                status: AggregateStatus::Error,
                errors,
            }
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == AggregateStatus::Error
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub uniqueness: AggregateResult,
    pub quota: AggregateResult,
}

impl AggregateReport {
    /// Reasons the batch may not be uploaded yet; empty when it may.
    pub fn upload_blockers(&self, duplicates_acknowledged: bool) -> Vec<String> {
        let mut out = Vec::new();
        if self.quota.is_error() {
            out.extend(self.quota.errors.iter().map(|e| e.message.clone()));
        }
        if self.uniqueness.is_error() && !duplicates_acknowledged {
            out.extend(
                self.uniqueness
                    .errors
                    .iter()
                    .map(|e| format!("{} (acknowledge duplicates to proceed)", e.message)),
            );
        }
        out
    }

    pub fn ready_for_upload(&self, duplicates_acknowledged: bool) -> bool {
        self.upload_blockers(duplicates_acknowledged).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataErrorKind;

    fn report(dupes: bool, over_quota: bool) -> AggregateReport {
        let err = |kind, msg: &str| vec![DataError::new(kind, msg)];
        AggregateReport {
            uniqueness: if dupes {
                AggregateResult::from_errors(err(DataErrorKind::DuplicateTitleError, "dup"))
            } else {
                AggregateResult::valid()
            },
            quota: if over_quota {
                AggregateResult::from_errors(err(DataErrorKind::QuotaExceededError, "quota"))
            } else {
                AggregateResult::skipped()
            },
        }
    }

    #[test]
    fn duplicates_block_until_acknowledged() {
        let r = report(true, false);
        assert!(!r.ready_for_upload(false));
        assert!(r.ready_for_upload(true));
    }

    #[test]
    fn quota_blocks_regardless_of_acknowledgment() {
        let r = report(true, true);
        assert!(!r.ready_for_upload(true));
        assert_eq!(r.upload_blockers(true), vec!["quota".to_string()]);
        assert_eq!(r.upload_blockers(false).len(), 2);
    }

    #[test]
    fn clean_batch_is_ready() {
        assert!(report(false, false).ready_for_upload(false));
    }
}
