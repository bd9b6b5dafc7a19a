use crate::job::input;
use globset::{GlobBuilder, GlobMatcher};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    env, fmt,
    fs::{self, File},
    io::Error,
    os::unix::fs::MetadataExt,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, error, warn};

// check if a file is executable
pub fn check_executable(path: &Path) -> Result<bool, ConfigErrors> {
    if !path.is_file() {
        Err(ConfigErrors::FileNotFound(path.to_path_buf()))
    } else {
        match File::open(path).map(|file| file.metadata()) {
            Ok(Ok(metadata)) => Ok((metadata.mode() & 0o111) != 0),
            Ok(Err(e)) | Err(e) => Err(ConfigErrors::MetadataNotFound(e)),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to read sweep config {path:?}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: Error,
    },
    #[error("Sweep config is malformed")]
    ParseConfig(#[from] serde_yaml::Error),
    #[error("Unable to determine the current directory")]
    CurrentDirectory(#[source] Error),
    #[error("Log glob was invalid")]
    InvalidGlob(#[from] globset::Error),
    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),
    #[error("Metadata not found")]
    MetadataNotFound(#[from] Error),
}

/// Numeric parameter value that keeps the form it was written in, so `500` stays `500` in
/// directory names and in the input document while `0.05` stays a real
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Real(f64),
}

impl Scalar {
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Integer(_) => true,
            Self::Real(value) => value.is_finite(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            // Debug keeps the trailing `.0` on integral reals
            Self::Real(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<Scalar> for serde_json::Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Integer(value) => value.into(),
            Scalar::Real(value) => serde_json::Number::from_f64(value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    // root of the sweep, every job directory is created directly below it
    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,
    // base input document, relative paths are resolved against working_directory
    #[serde(default = "default_template")]
    pub template: PathBuf,
    // shared files copied verbatim into every job directory
    #[serde(default = "default_data_files")]
    pub data_files: Vec<PathBuf>,
    // select the alternate cluster profile, this also reverses the submission order
    #[serde(default)]
    pub alternate: bool,
    #[serde(default = "default_job_prefix")]
    pub job_prefix: String,
    // name of the compute binary inside the profile's repo_dir
    #[serde(default = "default_binary")]
    pub binary: String,
    // stale logs matching this glob are removed before submission
    #[serde(default = "default_log_glob")]
    pub log_glob: String,

    pub parameters: Parameters,
    #[serde(default)]
    pub profiles: Profiles,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// The four swept axes, each written back into the input document
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    #[serde(alias = "n")]
    pub num_nodes: Vec<u64>,
    #[serde(alias = "dt")]
    pub time_step: Vec<Scalar>,
    #[serde(alias = "R")]
    pub x_max: Vec<Scalar>,
    #[serde(alias = "L")]
    pub lmax: Vec<u64>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct Profiles {
    #[serde(default = "default_profile")]
    pub default: ClusterProfile,
    #[serde(default = "alternate_profile")]
    pub alternate: ClusterProfile,
}

impl Default for Profiles {
    fn default() -> Self {
        Self {
            default: default_profile(),
            alternate: alternate_profile(),
        }
    }
}

/// Resource requests and binary location for one cluster
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClusterProfile {
    pub partition: String,
    #[serde(default)]
    pub qos: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub nodes: u32,
    pub ntasks: u32,
    pub nice: f64,
    pub mem: String,
    pub repo_dir: PathBuf,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum ExecutorConfig {
    // hand every job script to the scheduler's submission command
    Slurm {
        #[serde(default = "default_submit_command")]
        command: PathBuf,
        #[serde(default)]
        args: Vec<String>,
    },
    // build every job directory but only log the submission
    DryRun,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::Slurm {
            command: default_submit_command(),
            args: Vec::new(),
        }
    }
}

impl SweepConfig {
    /// parse a sweep config without touching the filesystem
    pub fn from_yaml(source: &str) -> Result<Self, ConfigErrors> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// read a sweep config and anchor its working directory to the current directory
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        let source = fs::read_to_string(path).map_err(|source| ConfigErrors::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&source)?;

        if config.working_directory.is_relative() {
            let current = env::current_dir().map_err(ConfigErrors::CurrentDirectory)?;
            config.working_directory = current.join(&config.working_directory);
        }
        debug!(working_directory = ?config.working_directory, "Loaded sweep config from {path:?}");

        Ok(config)
    }

    /// profile selected by the environment flag
    pub fn profile(&self) -> &ClusterProfile {
        if self.alternate {
            &self.profiles.alternate
        } else {
            &self.profiles.default
        }
    }

    pub fn template_path(&self) -> PathBuf {
        self.working_directory.join(&self.template)
    }

    pub fn data_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.data_files
            .iter()
            .map(|file| self.working_directory.join(file))
    }

    pub fn binary_path(&self) -> PathBuf {
        self.profile().repo_dir.join(&self.binary)
    }

    /// Compile the glob used to clear stale logs, matched against file names only
    pub fn compile_log_glob(&self) -> Result<GlobMatcher, ConfigErrors> {
        Ok(GlobBuilder::new(&self.log_glob)
            .literal_separator(true)
            .build()?
            .compile_matcher())
    }

    /// Report every problem with the sweep before anything is created on disk,
    /// returns true if at least one error was found
    pub fn preflight_checks(&self) -> bool {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut contains_error = false;

        let axes = [
            (
                "num_nodes",
                self.parameters.num_nodes.iter().map(u64::to_string).collect_vec(),
            ),
            (
                "time_step",
                self.parameters.time_step.iter().map(Scalar::to_string).collect_vec(),
            ),
            (
                "x_max",
                self.parameters.x_max.iter().map(Scalar::to_string).collect_vec(),
            ),
            (
                "lmax",
                self.parameters.lmax.iter().map(u64::to_string).collect_vec(),
            ),
        ];

        for (name, values) in axes.iter() {
            if values.is_empty() {
                error!("parameters.{name} is empty, the sweep would not produce any job");
                contains_error = true;
            }

            for duplicate in values.iter().duplicates() {
                error!("parameters.{name} contains {duplicate} more than once, job directories would collide");
                contains_error = true;
            }
        }

        for value in self
            .parameters
            .time_step
            .iter()
            .chain(self.parameters.x_max.iter())
            .filter(|value| !value.is_finite())
        {
            error!("parameters contain the non-finite value {value}");
            contains_error = true;
        }

        if let Err(e) = self.compile_log_glob() {
            error!("log_glob '{}' is invalid: {e}", self.log_glob);
            contains_error = true;
        }

        let template = self.template_path();
        if !template.is_file() {
            error!(
                "Failed to find template. Either not a file or not found at {}",
                template.to_string_lossy()
            );
            contains_error = true;
        } else {
            match input::load(&template).and_then(|document| input::validate_basis(&document)) {
                Ok(()) => debug!("Template {template:?} passed validation"),
                Err(e) => {
                    error!("Template {} is not a valid input: {e}", template.to_string_lossy());
                    contains_error = true;
                }
            }
        }

        for data_file in self.data_paths() {
            if !data_file.is_file() {
                error!(
                    "Failed to find data file. Either not a file or not found at {}",
                    data_file.to_string_lossy()
                );
                contains_error = true;
            } else if data_file.file_name().is_none() {
                error!("Data file {} has no file name", data_file.to_string_lossy());
                contains_error = true;
            }
        }

        // the binary usually only exists on the cluster, so this is never fatal
        let binary = self.binary_path();
        match check_executable(&binary) {
            Ok(true) => debug!("Found compute binary at {binary:?}"),
            Ok(false) => warn!(
                "Compute binary {} is not executable, jobs will fail to start",
                binary.to_string_lossy()
            ),
            Err(e) => warn!(
                "Compute binary {} could not be checked locally: {e}",
                binary.to_string_lossy()
            ),
        }

        contains_error
    }
}

fn default_working_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_template() -> PathBuf {
    PathBuf::from("base_input.json")
}

fn default_data_files() -> Vec<PathBuf> {
    vec![PathBuf::from("yukawa.h5")]
}

fn default_job_prefix() -> String {
    "Ar_conv_ip".to_string()
}

fn default_binary() -> String {
    "bspline_tdse.out".to_string()
}

fn default_log_glob() -> String {
    "*.log".to_string()
}

fn default_submit_command() -> PathBuf {
    PathBuf::from("sbatch")
}

fn default_profile() -> ClusterProfile {
    ClusterProfile {
        partition: "jila".to_string(),
        qos: None,
        exclude: Vec::new(),
        nodes: 1,
        ntasks: 16,
        nice: 1.0,
        mem: "16G".to_string(),
        repo_dir: PathBuf::from("/data/becker/begh0305/Research/bspline_tdse"),
    }
}

fn alternate_profile() -> ClusterProfile {
    ClusterProfile {
        partition: "compute".to_string(),
        qos: Some("normal".to_string()),
        exclude: vec![
            "photon13".to_string(),
            "photon16".to_string(),
            "photon11".to_string(),
        ],
        nodes: 1,
        ntasks: 8,
        nice: 1.0,
        mem: "16G".to_string(),
        repo_dir: PathBuf::from("/home/becker/begh0305/Documents/bspline_code/bspline_tdse"),
    }
}
