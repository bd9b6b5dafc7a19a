mod config;
mod executors;
mod job;
mod sweep;

use clap::{Parser, Subcommand};
use config::{ExecutorConfig, SweepConfig};
use executors::Executors;
use std::{error::Error, path::PathBuf, process::exit};
use sweep::SweepError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Build one job directory per parameter combination and submit it to Slurm
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Sweep description
    #[arg(short, long, default_value = "sweep.yaml", value_name = "FILE")]
    config: PathBuf,

    /// Use the alternate cluster profile and submit in reverse order
    #[arg(long)]
    alternate: bool,

    /// Build every job directory but do not submit anything
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Build and submit all jobs (default)
    Submit,
    /// List the combinations in submission order without touching the filesystem
    Plan,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        error!("{error}");

        let mut source = error.source();
        while let Some(cause) = source {
            error!("caused by: {cause}");
            source = cause.source();
        }

        exit(1)
    }
}

fn run(cli: Cli) -> Result<(), SweepError> {
    let mut config = SweepConfig::load(&cli.config)?;

    config.alternate |= cli.alternate;
    if cli.dry_run {
        config.executor = ExecutorConfig::DryRun;
    }

    match cli.command.unwrap_or(Command::Submit) {
        Command::Plan => {
            for combination in sweep::combinations(&config) {
                println!(
                    "{}\t{}",
                    combination.job_name(&config.job_prefix),
                    combination.directory.display()
                );
            }
        }
        Command::Submit => {
            if config.preflight_checks() {
                error!("Preflight checks failed, no job directory was touched");
                exit(1)
            }

            let mut executor = Executors::load(&config.executor);
            let submitted = sweep::run(&config, &mut executor)?;
            info!("Prepared {} job directories", submitted.len());
        }
    }

    Ok(())
}
