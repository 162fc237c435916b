// fraggen/src/main.rs

mod engine;
mod plan;
mod utils;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use colored::Colorize;
use fragio::prelude::*;

use crate::engine::{Fragmenter, FillerSource, materialize_source_files};
use crate::plan::{Plan, RunOverrides, parse_size_arg};
use crate::utils::{LogLevel, set_log_level};

#[derive(Parser)]
#[command(name = "fraggen", version, about = "Volume fragmentation generator", long_about = None)]
struct Cli {
    /// Only print final counts and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print per-phase details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fragment a volume with the fill → clear → refill cycle
    Run {
        /// Volume root to fragment (must exist and be writable)
        #[arg(long)]
        volume: Option<PathBuf>,

        /// Run profile (TOML); command-line flags override its values
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Clear/refill cycles to run
        #[arg(short, long)]
        iterations: Option<u32>,

        /// Small filler size for the seeding pass, e.g. 64K
        #[arg(long, value_parser = parse_size_arg)]
        small: Option<u64>,

        /// Large filler size for refill passes, e.g. 192K
        #[arg(long, value_parser = parse_size_arg)]
        large: Option<u64>,

        /// Pre-supplied filler source file (repeatable, round-robined)
        #[arg(long = "source")]
        sources: Vec<PathBuf>,

        /// Round-robin over source1.txt..sourceN.txt at the volume root
        #[arg(long)]
        source_count: Option<u32>,

        /// Seed for generated filler content
        #[arg(long)]
        seed: Option<u64>,

        /// Only validate and print the plan, don't write anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate junk source files to feed `run --source`
    Sources {
        /// Directory to place source{N}.txt files in
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Size of one source file, e.g. 64K (repeatable)
        #[arg(long = "size", value_parser = parse_size_arg, required = true)]
        sizes: Vec<u64>,

        /// Seed for the junk content
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    set_log_level(match (cli.quiet, cli.verbose) {
        (true, _) => LogLevel::Quiet,
        (_, true) => LogLevel::Verbose,
        _ => LogLevel::Normal,
    });

    match cli.command {
        Commands::Run {
            volume,
            profile,
            iterations,
            small,
            large,
            sources,
            source_count,
            seed,
            dry_run,
        } => {
            let plan = Plan::resolve(
                profile.as_deref(),
                RunOverrides {
                    volume,
                    iterations,
                    small,
                    large,
                    sources,
                    source_count,
                    seed,
                },
            )?;
            plan.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
            plan.print_summary();

            if dry_run {
                log_normal!("Dry run mode: no data will be written.");
                return Ok(());
            }

            let source =
                FillerSource::materialize(&plan.filler).map_err(|e| anyhow::anyhow!("{}", e))?;
            let mut io = StdVolumeIO;
            let cancel = CancelToken::new();
            let t0 = Instant::now();
            let report = Fragmenter::new(&mut io, plan.volume.clone(), source)
                .run(plan.iterations, &cancel)
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            log_normal!(
                "{} {} files seeded per branch ({}), {} refill files written ({}) in {:.1}s",
                "Fragmentation finished.".green(),
                utils::sep_u64(report.seeded),
                utils::pretty_bytes(report.seeded_bytes),
                utils::sep_u64(report.refill_files()),
                utils::pretty_bytes(report.refill_bytes()),
                t0.elapsed().as_secs_f32(),
            );
        }
        Commands::Sources { dir, sizes, seed } => {
            let written = materialize_source_files(&dir, &sizes, seed)?;
            log_normal!(
                "{} {} source files in '{}'",
                "Done.".green(),
                written.len(),
                dir.display()
            );
        }
    }

    Ok(())
}
