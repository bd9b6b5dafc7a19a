pub mod input;
pub mod script;

#[cfg(test)]
mod input_test;

use crate::{config::SweepConfig, sweep::Combination};
use globset::GlobMatcher;
use input::InputError;
use script::JobScript;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, instrument};

pub const INPUT_FILE: &str = "input.json";
pub const SCRIPT_FILE: &str = "Queue_h.bash";
pub const RESULTS_LOG: &str = "results.log";

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to remove {path:?}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create job directory {path:?}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to copy {from:?} to {to:?}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to list {path:?}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Data file {0:?} has no file name")]
    NoFileName(PathBuf),
    #[error("Failed to prepare the input document")]
    Input(#[from] InputError),
}

/// A fully materialized job directory, ready to be submitted
#[derive(Debug, Clone, PartialEq)]
pub struct JobDir {
    pub path: PathBuf,
    pub script: PathBuf,
}

/// Remove whatever exists at `path`, a missing path is not an error
pub fn remove_existing(path: &Path) -> Result<(), JobError> {
    let result = match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => {
            debug!(path = ?path, "Removed previous job directory");
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(JobError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Remove every file in `directory` whose name matches `logs`, returns the number removed
pub fn clear_logs(directory: &Path, logs: &GlobMatcher) -> Result<usize, JobError> {
    let entries = fs::read_dir(directory).map_err(|source| JobError::ReadDirectory {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|source| JobError::ReadDirectory {
            path: directory.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_file() && logs.is_match(entry.file_name()) {
            fs::remove_file(&path).map_err(|source| JobError::Remove {
                path: path.clone(),
                source,
            })?;
            removed += 1;
        }
    }

    Ok(removed)
}

fn copy_into(from: &Path, to: PathBuf) -> Result<(), JobError> {
    fs::copy(from, &to)
        .map(|bytes| debug!("Copied {bytes} bytes from {from:?}"))
        .map_err(|source| JobError::Copy {
            from: from.to_path_buf(),
            to,
            source,
        })
}

/// Build the directory for one combination from scratch: copy the template and data files,
/// rewrite the input document, write the batch script and drop stale logs
#[instrument(skip(config, logs), fields(index = combination.index), level = "debug")]
pub fn materialize(
    config: &SweepConfig,
    combination: &Combination,
    logs: &GlobMatcher,
) -> Result<JobDir, JobError> {
    let directory = &combination.directory;

    remove_existing(directory)?;
    fs::create_dir(directory).map_err(|source| JobError::CreateDirectory {
        path: directory.clone(),
        source,
    })?;

    let input_path = directory.join(INPUT_FILE);
    copy_into(&config.template_path(), input_path.clone())?;
    for data_file in config.data_paths() {
        let file_name = data_file
            .file_name()
            .ok_or_else(|| JobError::NoFileName(data_file.clone()))?;
        copy_into(&data_file, directory.join(file_name))?;
    }

    input::rewrite(&input_path, combination)?;

    let script_path = directory.join(SCRIPT_FILE);
    let script = JobScript::new(
        combination.job_name(&config.job_prefix),
        config.profile(),
        &config.binary,
    );
    fs::write(&script_path, script.to_string()).map_err(|source| JobError::Write {
        path: script_path.clone(),
        source,
    })?;

    let removed = clear_logs(directory, logs)?;
    if removed > 0 {
        debug!("Removed {removed} stale log files");
    }

    Ok(JobDir {
        path: directory.clone(),
        script: script_path,
    })
}
