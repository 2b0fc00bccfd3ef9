use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use r2ks::{Coordinator, ExecMode, ListSource, PairPlan, RankFile, RunConfig, StdoutSink};

#[derive(Parser, Debug)]
#[command(
    name = "r2ks",
    about = "Weighted rank-rank KS scoring across every pair of ranked gene lists"
)]
struct Cli {
    /// Rank-list data file: a `num_genes num_lists` header line, then one
    /// whitespace-separated list per line.
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Weighting pivot rank; 0 disables weighting.
    #[arg(short = 'w', long = "pivot", default_value_t = 0)]
    pivot: u32,

    /// Also test each pair against the reversed second list and keep the
    /// larger statistic.
    #[arg(short = 't', long = "two-tailed")]
    two_tailed: bool,

    /// Execution mode for the pairwise workload.
    #[arg(long, value_enum, default_value_t = Mode::Threads)]
    mode: Mode,

    /// Worker count (thread-pool size, or total worker processes in worker
    /// mode). Defaults to the available parallelism.
    #[arg(long)]
    workers: Option<usize>,

    /// Also score each list against itself, as a sanity baseline.
    #[arg(long)]
    include_self_pairs: bool,

    /// Verbose diagnostics on stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    /// Shared-memory thread pool.
    Threads,
    /// Coordinator plus message-passing workers.
    Workers,
}

impl From<Mode> for ExecMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Threads => ExecMode::Threads,
            Mode::Workers => ExecMode::Workers,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let source = RankFile::open(&cli.file)
        .with_context(|| format!("failed to open rank data file {}", cli.file.display()))?;
    tracing::info!(
        num_genes = source.num_genes(),
        num_lists = source.num_lists(),
        "loaded rank file header"
    );

    let config = {
        let config = RunConfig::default().with_pivot(cli.pivot);
        if cli.two_tailed {
            config.two_tailed()
        } else {
            config
        }
    };
    let workers = match cli.workers {
        Some(workers) => workers,
        None => std::thread::available_parallelism().map_or(1, |n| n.get()),
    };

    let plan = PairPlan::new(source.num_lists()).with_self_pairs(cli.include_self_pairs);
    let coordinator = Coordinator::new(&source, config, workers);

    let start = Instant::now();
    let emitted = coordinator
        .run(&plan, cli.mode.into(), &StdoutSink)
        .context("pairwise evaluation failed")?;
    println!("Wall clock time: {}", start.elapsed().as_secs_f64());

    tracing::info!(emitted, "run complete");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
