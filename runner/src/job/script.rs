use crate::{config::ClusterProfile, job::RESULTS_LOG};
use std::{fmt, path::Path};

/// Slurm batch script for a single job directory
#[derive(Debug, Clone)]
pub struct JobScript<'a> {
    pub job_name: String,
    pub profile: &'a ClusterProfile,
    pub binary: &'a str,
}

impl<'a> JobScript<'a> {
    pub fn new(job_name: String, profile: &'a ClusterProfile, binary: &'a str) -> Self {
        Self {
            job_name,
            profile,
            binary,
        }
    }

    fn repo_dir(&self) -> &Path {
        &self.profile.repo_dir
    }
}

impl fmt::Display for JobScript<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = self.profile;

        writeln!(f, "#!/usr/bin/bash")?;
        writeln!(f, "#SBATCH --job-name {}", self.job_name)?;
        writeln!(f, "#SBATCH --output {}.o%j", self.job_name)?;

        write!(f, "#SBATCH --partition={}", profile.partition)?;
        if let Some(ref qos) = profile.qos {
            write!(f, " --qos={qos}")?;
        }
        writeln!(f)?;
        if !profile.exclude.is_empty() {
            writeln!(f, "#SBATCH --exclude={}", profile.exclude.join(","))?;
        }
        writeln!(f, "#SBATCH --nodes {}", profile.nodes)?;
        writeln!(f, "#SBATCH --ntasks {}", profile.ntasks)?;
        writeln!(f, "#SBATCH --nice={:?}", profile.nice)?;
        writeln!(f, "#SBATCH --mem={}", profile.mem)?;

        writeln!(f)?;
        writeln!(f, "source ~/.bashrc")?;
        writeln!(f)?;
        writeln!(f, "REPO_DIR=\"{}\"", self.repo_dir().display())?;
        writeln!(f, "hostname")?;
        writeln!(f, "pwd")?;
        writeln!(f)?;

        // the eigenstates have to exist before the propagation can start
        writeln!(
            f,
            "mpirun -np $SLURM_NTASKS $REPO_DIR/{} tise >> {RESULTS_LOG}",
            self.binary
        )?;
        writeln!(
            f,
            "mpirun -np $SLURM_NTASKS $REPO_DIR/{} >> {RESULTS_LOG}",
            self.binary
        )
    }
}
