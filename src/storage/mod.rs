//! # Record Stores
//!
//! The boundary between ingestion and accumulation. Ingestion appends opaque
//! JSON documents through [`RecordSink`]; accumulation reads them back as
//! typed [`PostRecord`]s through [`RecordSource`].
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `memory` | Shared, append-only, snapshot-consistent reads |
//! | `JsonLinesStore` | `jsonl` | One JSON document per line in a file |

pub mod memory;
pub mod jsonl;
pub mod ingest;

use serde_json::Value as Json;

use crate::model::PostRecord;
use crate::Result;

pub use memory::{MemorySnapshot, MemoryStore};
pub use jsonl::{JsonLinesSource, JsonLinesStore};
pub use ingest::{IngestReport, ingest_lines};

// ============================================================================
// Source / sink contracts
// ============================================================================

/// Produces post records one at a time until exhausted.
///
/// Single-pass and forward-only: a source that has returned `None` is done.
/// Any iterator of `Result<PostRecord>` is a source.
pub trait RecordSource {
    /// The next record, an error for a record that could not be read,
    /// or `None` at end of sequence.
    fn next_record(&mut self) -> Option<Result<PostRecord>>;
}

impl<I> RecordSource for I
where
    I: Iterator<Item = Result<PostRecord>>,
{
    fn next_record(&mut self) -> Option<Result<PostRecord>> {
        self.next()
    }
}

/// Accepts raw post documents for later graph construction.
///
/// Sinks are shared between producer threads, so appends take `&self`.
pub trait RecordSink: Send + Sync {
    fn append(&self, document: Json) -> Result<()>;

    /// Make previously appended documents durable. No-op by default.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
