use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dyadic_stream::{
    path::read_increment_csv, CacheStats, DyadicInterval, DynamicStream, RealInterval,
    Resolution, StreamConfig, TruncatedLie,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dyadic-stream", about = "Cached log-signatures over dyadic interval trees")]
struct Cli {
    /// Log cache activity (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log-signature over a general interval [start, end).
    Query {
        /// Increment file (`param,x1,...,xw` per line).
        path: PathBuf,
        /// Left endpoint (included).
        #[arg(long)]
        start: f64,
        /// Right endpoint (excluded).
        #[arg(long)]
        end: f64,
        /// Dyadic resolution of the dissection and refinement.
        #[arg(long, default_value_t = 8)]
        resolution: Resolution,
        /// Truncation depth (1 or 2).
        #[arg(long, default_value_t = 2)]
        depth: u8,
        /// Recompute split children from the data instead of halving.
        #[arg(long)]
        exact: bool,
        /// Run the query this many times against the same cache.
        #[arg(long, default_value_t = 1)]
        repeat: usize,
        /// Finest resolution the cache accepts.
        #[arg(long, default_value_t = 32)]
        max_resolution: Resolution,
    },
    /// Log-signature over the dyadic interval [offset·2^-power, (offset+1)·2^-power).
    Dyadic {
        /// Increment file (`param,x1,...,xw` per line).
        path: PathBuf,
        /// Dyadic offset k.
        #[arg(long, allow_hyphen_values = true)]
        offset: i64,
        /// Dyadic power n.
        #[arg(long, allow_hyphen_values = true)]
        power: Resolution,
        /// Accuracy requested for the cached node.
        #[arg(long, default_value_t = 8)]
        resolution: Resolution,
        /// Truncation depth (1 or 2).
        #[arg(long, default_value_t = 2)]
        depth: u8,
        /// Recompute split children from the data instead of halving.
        #[arg(long)]
        exact: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            path,
            start,
            end,
            resolution,
            depth,
            exact,
            repeat,
            max_resolution,
        } => run_query(path, start, end, resolution, depth, exact, repeat, max_resolution)?,
        Commands::Dyadic {
            path,
            offset,
            power,
            resolution,
            depth,
            exact,
        } => run_dyadic(path, offset, power, resolution, depth, exact)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[allow(clippy::too_many_arguments)]
fn run_query(
    path: PathBuf,
    start: f64,
    end: f64,
    resolution: Resolution,
    depth: u8,
    exact: bool,
    repeat: usize,
    max_resolution: Resolution,
) -> Result<()> {
    let increments = read_increment_csv(&path, depth)?.with_exact_refinement(exact);
    let config = StreamConfig::default()
        .with_max_resolution(max_resolution)
        .context("invalid --max-resolution")?;
    let stream = DynamicStream::<TruncatedLie>::new(config);
    let interval = RealInterval::new(start, end).context("invalid query interval")?;

    let mut previous = CacheStats::default();
    for round in 1..=repeat.max(1) {
        let lsig = stream
            .log_signature(interval, resolution, &increments)
            .with_context(|| format!("query {} failed", interval))?;
        let stats = stream.stats();
        println!("round {}\tinterval={}\tlogsig={}", round, interval, lsig);
        println!("\t{}", stats.since(&previous).report());
        previous = stats;
    }

    print_summary(&stream);
    Ok(())
}

fn run_dyadic(
    path: PathBuf,
    offset: i64,
    power: Resolution,
    resolution: Resolution,
    depth: u8,
    exact: bool,
) -> Result<()> {
    let increments = read_increment_csv(&path, depth)?.with_exact_refinement(exact);
    let stream = DynamicStream::<TruncatedLie>::new(StreamConfig::default());
    let interval = DyadicInterval::new(offset, power);

    let lsig = stream
        .log_signature(interval, resolution, &increments)
        .with_context(|| format!("query {} failed", interval))?;
    let accuracy = stream.accuracy_of(&interval).unwrap_or(power);
    println!("interval={}\taccuracy={}\tlogsig={}", interval, accuracy, lsig);

    print_summary(&stream);
    Ok(())
}

fn print_summary(stream: &DynamicStream<TruncatedLie>) {
    let root = stream
        .root()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "cache: nodes={}\troot={}\tfingerprint={}",
        stream.len(),
        root,
        stream.fingerprint().to_hex()
    );
    println!("\t{}", stream.stats().report());
}
