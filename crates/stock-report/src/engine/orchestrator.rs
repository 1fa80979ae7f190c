//! Runs a task schema concurrently and joins results in declared order

use super::{ScoringContext, WorkerPool};
use crate::error::{ReportError, Result};
use crate::tasks::TaskSchema;
use futures::future::join_all;
use report_core::ScoringTaskResult;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Fan-out/fan-in executor for scoring tasks
///
/// Every task of a schema is spawned on the task pool, all are awaited, and
/// results are read back in schema order. A task that fails produces its
/// sentinel result; only a failure of the join machinery itself (a cancelled
/// task or a shut-down pool) fails the run.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    pool: WorkerPool,
}

impl Orchestrator {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    #[instrument(skip_all, fields(entity = %ctx.entity, tasks = schema.len()))]
    pub async fn run(
        &self,
        schema: &TaskSchema,
        ctx: Arc<ScoringContext>,
    ) -> Result<Vec<ScoringTaskResult>> {
        if self.pool.is_shut_down() {
            return Err(ReportError::Orchestration(format!(
                "{} pool is shut down",
                self.pool.name()
            )));
        }

        let handles = schema.descriptors().iter().map(|descriptor| {
            let task = Arc::clone(&descriptor.task);
            let ctx = Arc::clone(&ctx);
            self.pool.spawn(async move { task.score(&ctx).await })
        });
        let joined = join_all(handles).await;

        let mut results = Vec::with_capacity(schema.len());
        for (descriptor, outcome) in schema.descriptors().iter().zip(joined) {
            let result = match outcome {
                Ok(Ok(result)) if result.is_failed() => ScoringTaskResult::failed(&descriptor.name),
                Ok(Ok(mut result)) => {
                    result.name.clone_from(&descriptor.name);
                    result
                }
                Ok(Err(e)) => return Err(e),
                Err(e) if e.is_panic() => {
                    warn!(task = %descriptor.name, "Scoring task panicked");
                    ScoringTaskResult::failed(&descriptor.name)
                }
                Err(e) => {
                    return Err(ReportError::Orchestration(format!(
                        "task '{}' did not complete: {e}",
                        descriptor.name
                    )));
                }
            };
            if result.is_failed() {
                warn!(task = %descriptor.name, "Scoring task returned the failure sentinel");
            }
            results.push(result);
        }

        let failed = results.iter().filter(|r| r.is_failed()).count();
        info!(failed, "All scoring tasks joined");
        Ok(results)
    }
}
