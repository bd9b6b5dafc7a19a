mod dry;
mod slurm;

use crate::{config::ExecutorConfig, job::JobDir, sweep::Combination};
use std::{io, path::PathBuf, process::ExitStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Failed to spawn submission command {command:?}")]
    Spawn {
        command: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Submission of {script:?} was rejected ({status}): {stderr}")]
    Rejected {
        script: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}

/// Outcome of handing a single job directory to an executor
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    // accepted by the scheduler, the id is only known if it was reported back
    Queued { job_id: Option<u64> },
    // nothing was submitted
    Skipped,
}

pub trait Executor {
    fn submit(
        &mut self,
        job: &JobDir,
        combination: &Combination,
    ) -> Result<Submission, ExecutorError>;
}

#[derive(Clone, Debug)]
pub enum Executors {
    Slurm(slurm::SlurmExecutor),
    DryRun(dry::DryRunExecutor),
}

impl Executors {
    pub fn load(config: &ExecutorConfig) -> Self {
        match config {
            ExecutorConfig::Slurm { command, args } => {
                Self::Slurm(slurm::SlurmExecutor::new(command.clone(), args.clone()))
            }
            ExecutorConfig::DryRun => Self::DryRun(dry::DryRunExecutor),
        }
    }

    pub fn submit(
        &mut self,
        job: &JobDir,
        combination: &Combination,
    ) -> Result<Submission, ExecutorError> {
        match self {
            Self::Slurm(executor) => executor.submit(job, combination),
            Self::DryRun(executor) => executor.submit(job, combination),
        }
    }
}
