//! Benchmark driver and CLI.
//!
//! Two modes:
//! - `convbench bench [--strategy winograd|direct]` — run one timed sweep
//!   and print the comma-joined ms vector on stdout.
//! - `convbench [--out-dir DIR]` — run both sweeps in-process, compute the
//!   per-batch ratio matrices, and write one heat-map PNG per batch size.
//!
//! Strategy selection is an explicit flag, never ambient process state, so
//! both sweeps can run inside a single process. Diagnostics go to stderr
//! via `tracing`; stdout stays clean for the benchmark-mode timing line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use convbench::{compare, plot, sweep};
use convbench_core::Strategy;

#[derive(Parser)]
#[command(
    name = "convbench",
    about = "Benchmark Winograd vs direct 2D convolution across a parameter grid"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory where heat-map images are written (driver mode).
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Run one timed sweep and print the comma-joined ms vector to stdout.
    Bench {
        /// Convolution strategy to measure.
        #[arg(long, default_value = "winograd", value_parser = parse_strategy)]
        strategy: Strategy,
    },
}

fn parse_strategy(s: &str) -> std::result::Result<Strategy, String> {
    s.parse().map_err(|e: convbench_core::Error| e.to_string())
}

fn main() -> convbench::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Bench { strategy }) => {
            info!(%strategy, "running benchmark sweep");
            let samples = sweep::run_sweep(strategy)?;
            println!("{}", sweep::format_line(&samples));
        }
        None => {
            std::fs::create_dir_all(&cli.out_dir)?;

            info!("sweeping with the winograd strategy");
            let winograd = sweep::run_sweep(Strategy::Winograd)?;
            info!("sweeping with the direct strategy");
            let direct = sweep::run_sweep(Strategy::Direct)?;

            let matrices = compare::ratio_matrices(&winograd, &direct)?;
            for matrix in &matrices {
                let path = cli.out_dir.join(plot::heatmap_filename(matrix.batch));
                plot::render_heatmap(matrix, &path)?;
                info!(batch = matrix.batch, "wrote {}", path.display());
            }
        }
    }
    Ok(())
}
