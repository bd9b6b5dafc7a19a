mod estimate;
mod sequence;

use clap::Parser;
use estimate::{estimate, summary};
use sequence::LinearParabolic;
use std::process::exit;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Recommend a node count for a linear-parabolic radial grid
#[derive(Parser, Debug)]
#[command(author, version, about, allow_negative_numbers = true)]
struct Cli {
    /// Inner edge of the grid
    r_min: f64,
    /// Outer edge of the grid
    r_max: f64,
    /// Radius at which the slope constraint has to hold
    r0: f64,
    /// Largest allowed node spacing
    slope: f64,

    /// Also print the resulting node positions and their largest spacing
    #[arg(long)]
    sequence: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let estimate = estimate(cli.r_min, cli.r_max, cli.r0, cli.slope);
    debug!(
        break_point = estimate.break_point,
        nodes = estimate.nodes,
        "Estimated node count"
    );
    println!("{}", summary(cli.slope, cli.r0, estimate.nodes));

    if cli.sequence {
        match LinearParabolic::from_estimate(
            estimate.nodes,
            estimate.break_point,
            cli.r_min,
            cli.r_max,
        ) {
            Ok(sequence) => {
                println!(
                    "{} nodes, break point at node {}",
                    sequence.nodes(),
                    sequence.break_point()
                );
                for (i, position) in sequence.positions().iter().enumerate() {
                    println!("{}\t{position:?}", i + 1);
                }
                println!("max spacing: {:?}", sequence.max_spacing());
            }
            Err(e) => {
                error!("Unable to build the node sequence: {e}");
                exit(1)
            }
        }
    }
}
