use super::{Executor, ExecutorError, Submission};
use crate::{
    job::{JobDir, SCRIPT_FILE},
    sweep::Combination,
};
use std::{
    path::PathBuf,
    process::{Command, Stdio},
};
use tracing::{debug, info, instrument, warn};

/// Executor that hands each batch script to `sbatch`, run from inside the job directory.
/// Jobs are fire and forget, nothing waits for them to finish.
#[derive(Clone, Debug)]
pub struct SlurmExecutor {
    command: PathBuf,
    args: Vec<String>,
}

impl SlurmExecutor {
    pub fn new(command: PathBuf, args: Vec<String>) -> Self {
        Self { command, args }
    }
}

/// Extract the job id from sbatch output, either `Submitted batch job <id>` or the
/// `--parsable` form `<id>[;cluster]`
pub fn parse_job_id(stdout: &str) -> Option<u64> {
    stdout.lines().map(str::trim).find_map(|line| {
        let id = match line.strip_prefix("Submitted batch job ") {
            Some(rest) => rest.split_whitespace().next(),
            None => line.split(';').next(),
        };

        id.and_then(|id| id.parse().ok())
    })
}

impl Executor for SlurmExecutor {
    #[instrument(skip_all, fields(index = combination.index), level = "debug")]
    fn submit(
        &mut self,
        job: &JobDir,
        combination: &Combination,
    ) -> Result<Submission, ExecutorError> {
        debug!("Running {:?} {:?} in {:?}", self.command, self.args, job.path);

        let output = Command::new(&self.command)
            .args(self.args.iter())
            .arg(SCRIPT_FILE)
            .current_dir(&job.path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ExecutorError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(ExecutorError::Rejected {
                script: job.script.clone(),
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }

        let job_id = parse_job_id(&stdout);
        match job_id {
            Some(id) => info!(job_id = id, "Submitted {}", combination.directory.display()),
            None => warn!(
                stdout = %stdout.trim(),
                "Submitted {} but no job id was reported",
                combination.directory.display()
            ),
        }

        Ok(Submission::Queued { job_id })
    }
}
