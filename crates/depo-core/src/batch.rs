//! One loaded sheet: spawns a task per row, joins them all, then hands the
//! settled outcomes to the aggregate checks.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::aggregate::{check_quota, check_titles, AggregateReport};
use crate::checks::{Check, CheckContext, ResolvedFile};
use crate::error::{DataError, DataErrorKind};
use crate::fields::RowData;
use crate::registry::{RegistryLimits, RowRegistry};
use crate::row::{PatchSink, RowState, RowStatus, RowTask};

/// Settled result of one row.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    /// Registry view: warnings folded, batch halts applied.
    pub status: RowStatus,
    pub title: Option<String>,
    pub data: RowData,
    pub files: Vec<ResolvedFile>,
    pub quota_used: u64,
}

impl RowOutcome {
    fn from_task(task: &RowTask) -> Self {
        Self {
            status: task.status().clone(),
            title: task.title().map(str::to_string),
            data: task.data().clone(),
            files: task.scratch().files.clone(),
            quota_used: task.scratch().quota_used,
        }
    }

    /// Outcome for a row whose task never returned.
    fn lost(status: RowStatus) -> Self {
        Self {
            status,
            title: None,
            data: RowData::new(),
            files: Vec::new(),
            quota_used: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status.state == RowState::Valid
    }
}

pub struct Batch {
    ctx: Arc<CheckContext>,
    registry: Arc<RowRegistry>,
    tasks: Vec<RowTask>,
}

impl Batch {
    /// Create a row task per data row. Ids start at 1; row numbers are sheet
    /// line numbers (the header is line 1).
    pub fn new(rows: Vec<Vec<String>>, ctx: CheckContext, limits: RegistryLimits) -> Self {
        Self::with_checks(rows, ctx, limits, &Check::PIPELINE)
    }

    pub(crate) fn with_checks(
        rows: Vec<Vec<String>>,
        ctx: CheckContext,
        limits: RegistryLimits,
        checks: &[Check],
    ) -> Self {
        let registry = Arc::new(RowRegistry::new(limits));
        let sink: Arc<dyn PatchSink> = registry.clone();
        let tasks = rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| {
                let task = RowTask::new(
                    i as u64 + 1,
                    i + 2,
                    cells,
                    checks.to_vec(),
                    Arc::clone(&sink),
                );
                registry.register(task.id(), task.row_number(), task.terminate_handle());
                task
            })
            .collect();
        Self {
            ctx: Arc::new(ctx),
            registry,
            tasks,
        }
    }

    /// Handle for halting the batch or watching progress while it runs.
    pub fn registry(&self) -> Arc<RowRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every row concurrently and wait for all of them.
    pub async fn run(self) -> BatchOutcome {
        let Batch {
            ctx,
            registry,
            tasks,
        } = self;
        let ids: Vec<u64> = tasks.iter().map(RowTask::id).collect();
        tracing::info!(rows = ids.len(), "batch started");

        let mut join_set = JoinSet::new();
        for mut task in tasks {
            let ctx = Arc::clone(&ctx);
            join_set.spawn(async move {
                task.run_all_checks(&ctx).await;
                RowOutcome::from_task(&task)
            });
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok(outcome) => {
                    registry.settle(&outcome.status);
                    outcomes.push(outcome);
                }
                Err(e) => tracing::error!(error = %e, "row task did not finish"),
            }
        }

        let finished: BTreeSet<u64> = outcomes.iter().map(|o| o.status.id).collect();
        for id in ids.iter().filter(|id| !finished.contains(id)) {
            registry.fail_row(
                *id,
                DataError::new(DataErrorKind::UnhandledError, "row task panicked"),
            );
            if let Some(status) = registry.status(*id) {
                outcomes.push(RowOutcome::lost(status));
            }
        }

        for outcome in outcomes.iter_mut() {
            if let Some(status) = registry.status(outcome.status.id) {
                outcome.status = status;
            }
        }
        outcomes.sort_by_key(|o| o.status.id);

        let halted = registry.halt_reason();
        tracing::info!(
            rows = outcomes.len(),
            valid = outcomes.iter().filter(|o| o.is_valid()).count(),
            halted = halted.is_some(),
            "batch settled"
        );
        BatchOutcome {
            rows: outcomes,
            halted,
        }
    }
}

/// Every row settled, ordered by id.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub rows: Vec<RowOutcome>,
    /// Why the batch was stopped early, if it was.
    pub halted: Option<String>,
}

impl BatchOutcome {
    /// Run the cross-row checks. `remaining_quota` is `None` when unknown.
    pub fn aggregate(&self, remaining_quota: Option<u64>) -> AggregateReport {
        AggregateReport {
            uniqueness: check_titles(
                self.rows
                    .iter()
                    .map(|r| (r.status.row_number, r.title.as_deref())),
            ),
            quota: check_quota(self.rows.iter().map(|r| r.quota_used), remaining_quota),
        }
    }

    pub fn valid_rows(&self) -> impl Iterator<Item = &RowOutcome> {
        self.rows.iter().filter(|r| r.is_valid())
    }

    pub fn error_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.status.state == RowState::Error)
            .count()
    }
}
