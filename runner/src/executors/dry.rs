use super::{Executor, ExecutorError, Submission};
use crate::{job::JobDir, sweep::Combination};
use tracing::info;

/// Executor that leaves the scheduler alone and only reports what would be submitted
#[derive(Clone, Debug)]
pub struct DryRunExecutor;

impl Executor for DryRunExecutor {
    fn submit(
        &mut self,
        job: &JobDir,
        combination: &Combination,
    ) -> Result<Submission, ExecutorError> {
        info!(
            index = combination.index,
            script = ?job.script,
            "Dry run, not submitting"
        );

        Ok(Submission::Skipped)
    }
}
