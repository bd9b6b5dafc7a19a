#[cfg(test)]
#[path = "sweep_test.rs"]
mod sweep_test;

use crate::{
    config::{ConfigErrors, Scalar, SweepConfig},
    executors::{ExecutorError, Executors, Submission},
    job::{self, JobError},
};
use itertools::{iproduct, Itertools};
use std::{fs, io, path::PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Sweep config is invalid")]
    Config(#[from] ConfigErrors),
    #[error("Failed to create working directory {path:?}")]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to build job directory {directory:?}")]
    Job {
        directory: PathBuf,
        #[source]
        source: JobError,
    },
    #[error("Failed to submit job")]
    Submit(#[from] ExecutorError),
}

/// One point of the parameter grid together with the directory it is materialized in
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    // position in submission order
    pub index: usize,
    pub num_nodes: u64,
    pub time_step: Scalar,
    pub x_max: Scalar,
    pub lmax: u64,
    pub directory: PathBuf,
}

impl Combination {
    pub fn directory_name(num_nodes: u64, time_step: Scalar, x_max: Scalar, lmax: u64) -> String {
        format!("n_{num_nodes}_dt_{time_step}_bs_{x_max}_l_{lmax}")
    }

    /// scheduler job name, tagged with the submission index
    pub fn job_name(&self, prefix: &str) -> String {
        format!("{prefix}_{:.3}", self.index as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub combination: Combination,
    pub submission: Submission,
}

/// Cartesian product of all parameters, iterated radius, angular cutoff, time step, grid size
/// from outermost to innermost. The alternate environment submits in reverse.
pub fn combinations(config: &SweepConfig) -> Vec<Combination> {
    let parameters = &config.parameters;

    let mut combinations = iproduct!(
        parameters.x_max.iter(),
        parameters.lmax.iter(),
        parameters.time_step.iter(),
        parameters.num_nodes.iter()
    )
    .map(|(&x_max, &lmax, &time_step, &num_nodes)| Combination {
        index: 0,
        num_nodes,
        time_step,
        x_max,
        lmax,
        directory: config.working_directory.join(Combination::directory_name(
            num_nodes, time_step, x_max, lmax,
        )),
    })
    .collect_vec();

    if config.alternate {
        combinations.reverse();
    }

    combinations
        .iter_mut()
        .enumerate()
        .for_each(|(index, combination)| combination.index = index);

    combinations
}

/// Materialize and submit every combination, strictly one after another.
/// The first failure aborts the sweep and leaves already built directories in place.
#[instrument(skip_all, fields(working_directory = ?config.working_directory), level = "info")]
pub fn run(config: &SweepConfig, executor: &mut Executors) -> Result<Vec<Submitted>, SweepError> {
    let logs = config.compile_log_glob()?;

    fs::create_dir_all(&config.working_directory).map_err(|source| {
        SweepError::WorkingDirectory {
            path: config.working_directory.clone(),
            source,
        }
    })?;

    let combinations = combinations(config);
    let total = combinations.len();
    info!("Preparing {total} jobs");

    let mut submitted = Vec::with_capacity(total);
    for combination in combinations {
        info!(directory = ?combination.directory, "Building job {}/{total}", combination.index + 1);

        let job = job::materialize(config, &combination, &logs).map_err(|source| {
            SweepError::Job {
                directory: combination.directory.clone(),
                source,
            }
        })?;
        let submission = executor.submit(&job, &combination)?;

        submitted.push(Submitted {
            combination,
            submission,
        });
    }

    info!("Done with submitting {total} jobs");

    Ok(submitted)
}
