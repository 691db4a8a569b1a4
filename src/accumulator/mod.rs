//! # Graph Accumulator
//!
//! Folds post records into an [`InteractionGraph`]. For every record the
//! author becomes a node, and every target derived from the record's reply,
//! quote and repost slots gets one more unit of weight on `author → target`.
//!
//! The fold is single-threaded and order-independent: edges are keyed by
//! the ordered pair, so any permutation of the same records produces the
//! same graph.
//!
//! ```text
//! RecordSource ──▶ process(record) ──▶ upsert_edge(author, target) ──▶ InteractionGraph
//!                      │
//!                      └─ MalformedRecord ──▶ RecoveryMode (skip / abort)
//! ```

pub mod config;

use std::path::Path;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info, trace, warn};

use crate::checkpoint::Checkpoint;
use crate::model::{InteractionGraph, PostRecord};
use crate::storage::RecordSource;
use crate::{Error, Result};

pub use config::{AccumulatorConfig, MultiSlotPolicy, RecoveryMode, TargetAnomalyPolicy};

// ============================================================================
// Report
// ============================================================================

/// Counters for one accumulator's lifetime (carried across checkpoints).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulationReport {
    /// Records pulled from the input, decodable or not.
    pub records_seen: u64,
    /// Records that contributed to the graph.
    pub records_applied: u64,
    /// Malformed records dropped under `skip-and-continue`.
    pub records_skipped: u64,
    /// Edge increments performed.
    pub interactions: u64,
    pub nodes: usize,
    pub edges: usize,
}

// ============================================================================
// Accumulator
// ============================================================================

/// Owns the graph under construction for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    graph: InteractionGraph,
    config: AccumulatorConfig,
    report: AccumulationReport,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AccumulatorConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Continue a run from a saved checkpoint.
    pub fn resume(checkpoint: Checkpoint, config: AccumulatorConfig) -> Self {
        debug!(
            records_consumed = checkpoint.records_consumed,
            nodes = checkpoint.graph.node_count(),
            edges = checkpoint.graph.edge_count(),
            "resuming from checkpoint"
        );
        Self { graph: checkpoint.graph, config, report: checkpoint.report }
    }

    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// Read-only view of the graph built so far.
    pub fn graph(&self) -> &InteractionGraph {
        &self.graph
    }

    /// Hand the finished graph off (e.g. to the exporter).
    pub fn into_graph(self) -> InteractionGraph {
        self.graph
    }

    /// Counters so far, with current node/edge totals.
    pub fn report(&self) -> AccumulationReport {
        AccumulationReport {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            ..self.report.clone()
        }
    }

    /// Snapshot the run so it can be resumed after an interruption.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::capture(self.graph.clone(), self.report())
    }

    // ========================================================================
    // Core operations
    // ========================================================================

    /// Apply one record. Returns the number of edge increments made.
    ///
    /// Fails with [`Error::MalformedRecord`] when the record has no usable
    /// author, or (under [`TargetAnomalyPolicy::Reject`]) a slot without a
    /// target. A failed record leaves the graph untouched.
    pub fn process(&mut self, record: &PostRecord) -> Result<usize> {
        self.report.records_seen += 1;

        let author = record
            .author()
            .ok_or_else(|| Error::MalformedRecord("missing or empty author_id".into()))?;

        let mut targets: SmallVec<[&str; 3]> = SmallVec::new();
        for slot in record.slots() {
            match slot.target {
                Some(target) if !self.config.self_loops && target == author => {
                    trace!(author, kind = %slot.kind, "dropping self-interaction");
                }
                Some(target) => targets.push(target),
                None if self.config.target_anomaly == TargetAnomalyPolicy::Reject => {
                    return Err(Error::MalformedRecord(format!(
                        "{} slot has no target author",
                        slot.kind
                    )));
                }
                None => trace!(author, kind = %slot.kind, "slot without target author"),
            }
        }

        if self.config.multi_slot == MultiSlotPolicy::OncePerTarget {
            targets.sort_unstable();
            targets.dedup();
        }

        if self.graph.add_node(author) {
            trace!(author, "new author node");
        }
        for target in &targets {
            self.upsert_edge(author, target);
        }

        self.report.records_applied += 1;
        Ok(targets.len())
    }

    /// One interaction `from → to`. Creates nodes and edge on first sight,
    /// otherwise bumps the weight. Returns the new weight.
    pub fn upsert_edge(&mut self, from: &str, to: &str) -> u64 {
        self.report.interactions += 1;
        let weight = self.graph.add_interaction(from, to);
        if weight == 1 {
            trace!(from, to, "new edge");
        }
        weight
    }

    /// Apply every record of a single-pass sequence, in arrival order.
    pub fn accumulate<I>(&mut self, records: I) -> Result<AccumulationReport>
    where
        I: IntoIterator<Item = PostRecord>,
    {
        self.accumulate_from(records.into_iter().map(Ok::<PostRecord, Error>))
    }

    /// Drain a record source. Decode failures count as malformed records
    /// and follow the configured [`RecoveryMode`]; any other error aborts.
    pub fn accumulate_from<S>(&mut self, mut source: S) -> Result<AccumulationReport>
    where
        S: RecordSource,
    {
        let _span = tracing::info_span!("accumulate").entered();
        let seen_before = self.report.records_seen;
        self.drain(&mut source, u64::MAX)?;
        Ok(self.finish(seen_before))
    }

    /// Drain a record source in chunks of `every` records, saving a
    /// checkpoint to `path` after each chunk that consumed anything.
    ///
    /// If the run aborts, `path` holds the checkpoint of the last completed
    /// chunk. Combine with [`Accumulator::resume`] and
    /// [`Checkpoint::skip_consumed`] to pick up where it stopped.
    pub fn accumulate_checkpointed<S>(
        &mut self,
        mut source: S,
        path: impl AsRef<Path>,
        every: u64,
    ) -> Result<AccumulationReport>
    where
        S: RecordSource,
    {
        let path = path.as_ref();
        let every = every.max(1);
        let _span = tracing::info_span!("accumulate", checkpoint = %path.display()).entered();
        let seen_before = self.report.records_seen;

        loop {
            let chunk_start = self.report.records_seen;
            self.drain(&mut source, every)?;
            if self.report.records_seen == chunk_start {
                break;
            }
            self.checkpoint().save(path)?;
        }
        Ok(self.finish(seen_before))
    }

    /// Apply up to `limit` records from `source`.
    fn drain<S>(&mut self, source: &mut S, limit: u64) -> Result<()>
    where
        S: RecordSource,
    {
        let mut taken = 0;
        while taken < limit {
            let Some(item) = source.next_record() else { break };
            taken += 1;

            let outcome = match item {
                Ok(record) => self.process(&record).map(|_| ()),
                Err(err) => {
                    self.report.records_seen += 1;
                    Err(err)
                }
            };

            match outcome {
                Ok(()) => {}
                Err(err) if err.is_malformed_record()
                    && self.config.recovery == RecoveryMode::SkipAndContinue =>
                {
                    self.report.records_skipped += 1;
                    warn!(record = self.report.records_seen, error = %err, "skipping malformed record");
                }
                Err(err) => {
                    warn!(
                        record = self.report.records_seen,
                        error = %err,
                        nodes = self.graph.node_count(),
                        edges = self.graph.edge_count(),
                        "accumulation aborted"
                    );
                    return Err(err);
                }
            }

            let every = self.config.progress_interval;
            if every > 0 && self.report.records_seen % every == 0 {
                debug!(
                    records = self.report.records_seen,
                    nodes = self.graph.node_count(),
                    edges = self.graph.edge_count(),
                    "accumulation progress"
                );
            }
        }
        Ok(())
    }

    fn finish(&self, seen_before: u64) -> AccumulationReport {
        let report = self.report();
        info!(
            records = report.records_seen - seen_before,
            applied = report.records_applied,
            skipped = report.records_skipped,
            nodes = report.nodes,
            edges = report.edges,
            "accumulation finished"
        );
        report
    }
}
