//! interaction-graph CLI entrypoint

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use interaction_graph::export::export_graphml;
use interaction_graph::{
    Accumulator, AccumulatorConfig, Checkpoint, JsonLinesStore, MultiSlotPolicy,
    RecoveryMode, TargetAnomalyPolicy, ingest_lines,
};

// ══════════════════════════════════════════════════════════════════════════════
// ARGUMENTS
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Parser)]
#[command(name = "interaction-graph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build weighted author interaction graphs from stored posts")]
#[command(long_about = r#"
Stores raw post documents as JSON lines, then folds them into a directed
graph where an edge A -> B counts how often A replied to, quoted, or
reposted B. The graph is written as GraphML.

EXAMPLES:
  # Store posts piped from a stream client
  stream-client --track '#rustlang' | interaction-graph ingest --store posts.jsonl

  # Build the graph, resumable every million records
  interaction-graph build --store posts.jsonl --output graph.graphml \
      --checkpoint graph.checkpoint.json

ENVIRONMENT VARIABLES:
  INTERACTION_GRAPH_STORE     Record store path
  INTERACTION_GRAPH_OUTPUT    GraphML output path
  RUST_LOG                    Log filter (default: info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append JSON documents read from stdin, one per line, to a record store
    Ingest {
        /// Record store (JSON lines file)
        #[arg(long, env = "INTERACTION_GRAPH_STORE")]
        store: PathBuf,
    },

    /// Accumulate a record store into a graph and export it as GraphML
    Build(BuildArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Record store (JSON lines file)
    #[arg(long, env = "INTERACTION_GRAPH_STORE")]
    store: PathBuf,

    /// GraphML output path
    #[arg(short, long, env = "INTERACTION_GRAPH_OUTPUT")]
    output: PathBuf,

    /// What to do with records lacking an author
    #[arg(long, value_enum, default_value_t = RecoveryMode::SkipAndContinue)]
    recovery: RecoveryMode,

    /// How to count one post naming the same target in several slots
    #[arg(long, value_enum, default_value_t = MultiSlotPolicy::CountEach)]
    multi_slot: MultiSlotPolicy,

    /// What to do with quote/repost slots lacking an author
    #[arg(long, value_enum, default_value_t = TargetAnomalyPolicy::Ignore)]
    target_anomaly: TargetAnomalyPolicy,

    /// Drop author -> self edges
    #[arg(long)]
    no_self_loops: bool,

    /// Log progress every N records (0 disables)
    #[arg(long, default_value_t = 100_000)]
    progress_interval: u64,

    /// Checkpoint file; resumed from if present, rewritten as the build advances
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Records between checkpoint writes
    #[arg(long, default_value_t = 1_000_000, requires = "checkpoint")]
    checkpoint_every: u64,
}

impl BuildArgs {
    fn config(&self) -> AccumulatorConfig {
        AccumulatorConfig::default()
            .with_recovery(self.recovery)
            .with_multi_slot(self.multi_slot)
            .with_target_anomaly(self.target_anomaly)
            .with_self_loops(!self.no_self_loops)
            .with_progress_interval(self.progress_interval)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// COMMANDS
// ══════════════════════════════════════════════════════════════════════════════

fn ingest(store: PathBuf) -> Result<()> {
    let store = JsonLinesStore::open(&store)
        .with_context(|| format!("opening record store {}", store.display()))?;
    let report = ingest_lines(io::stdin().lock(), &store)?;
    print_json(&report)
}

fn build(args: BuildArgs) -> Result<()> {
    let store = JsonLinesStore::open(&args.store)
        .with_context(|| format!("opening record store {}", args.store.display()))?;

    let resumed = match &args.checkpoint {
        Some(path) => Checkpoint::load_if_exists(path)?,
        None => None,
    };
    let (mut acc, source) = match resumed {
        Some(checkpoint) => {
            info!(records = checkpoint.records_consumed, "resuming from checkpoint");
            let source = checkpoint.skip_consumed(store.source()?)?;
            (Accumulator::resume(checkpoint, args.config()), source)
        }
        None => (Accumulator::with_config(args.config()), store.source()?.skip(0)),
    };

    match &args.checkpoint {
        Some(path) => acc
            .accumulate_checkpointed(source, path, args.checkpoint_every)
            .with_context(|| format!("accumulation aborted (checkpoint {})", path.display()))?,
        None => acc.accumulate_from(source).context("accumulation aborted")?,
    };

    export_graphml(acc.graph(), &args.output)
        .with_context(|| format!("exporting GraphML to {}", args.output.display()))?;
    print_json(&acc.report())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest { store } => ingest(store),
        Commands::Build(args) => build(args),
    }
}
