//! # interaction-graph — Author Interaction Graphs from Post Records
//!
//! Folds a stream of social-media post records into a weighted directed
//! graph: one node per author, one edge per (author, target) pair, where the
//! edge weight counts how many times the author replied to, quoted, or
//! reposted the target.
//!
//! ## Design Principles
//!
//! 1. **Typed records**: `PostRecord` is validated at the decoding boundary;
//!    missing fields are `None`, never a runtime key lookup
//! 2. **Single owner**: the `Accumulator` owns its `InteractionGraph` for the
//!    whole run and only lends it out read-only
//! 3. **Lazy input**: any iterator is a record source; nothing is materialized
//! 4. **Durable output**: GraphML is written to a temp file and renamed
//!
//! ## Quick Start
//!
//! ```rust
//! use interaction_graph::{Accumulator, PostRecord};
//!
//! # fn example() -> interaction_graph::Result<()> {
//! let records = vec![
//!     PostRecord::new("a").replying_to("b"),
//!     PostRecord::new("a").replying_to("b"),
//!     PostRecord::new("c").quoting("a"),
//! ];
//!
//! let mut acc = Accumulator::new();
//! let report = acc.accumulate(records)?;
//! assert_eq!(report.records_applied, 3);
//!
//! let graph = acc.into_graph();
//! assert_eq!(graph.weight("a", "b"), Some(2));
//! assert_eq!(graph.weight("c", "a"), Some(1));
//!
//! let mut out = Vec::new();
//! interaction_graph::export::write_graphml(&graph, &mut out)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Record Stores
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `storage::memory` | Shared in-memory store with snapshot reads |
//! | `JsonLinesStore` | `storage::jsonl` | Durable newline-delimited JSON file |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod accumulator;
pub mod export;
pub mod storage;
pub mod checkpoint;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    AuthorId, Edge, InteractionGraph, InteractionKind,
    PostRecord, TargetRef, UserRef,
};

// ============================================================================
// Re-exports: Accumulation
// ============================================================================

pub use accumulator::{
    Accumulator, AccumulatorConfig, AccumulationReport,
    MultiSlotPolicy, RecoveryMode, TargetAnomalyPolicy,
};

// ============================================================================
// Re-exports: Storage and checkpoints
// ============================================================================

pub use storage::{
    JsonLinesStore, MemoryStore, RecordSink, RecordSource,
    IngestReport, ingest_lines,
};
pub use checkpoint::Checkpoint;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record without a usable author, or one that failed to decode.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("GraphML error at byte {position}: {message}")]
    GraphMl { position: usize, message: String },

    /// An author identifier GraphML (XML 1.0) cannot represent.
    #[error("Identifier {0:?} contains characters XML 1.0 cannot represent")]
    InvalidIdentifier(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors the skip-and-continue recovery mode may swallow.
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Error::MalformedRecord(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
