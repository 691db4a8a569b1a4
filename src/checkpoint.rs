//! Accumulation checkpoints.
//!
//! An interrupted run normally starts over, because the graph lives only in
//! memory. A checkpoint saves the graph together with how many input records
//! it already reflects. Re-open the same source, skip that many records, and
//! the resumed run ends with exactly the graph an uninterrupted run would
//! have produced, provided the source yields records in the same order.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accumulator::AccumulationReport;
use crate::export::write_atomic;
use crate::model::InteractionGraph;
use crate::{Error, Result};

/// Serializable snapshot of an accumulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Input records already reflected in `graph`, malformed ones included.
    pub records_consumed: u64,
    pub created_at: DateTime<Utc>,
    pub report: AccumulationReport,
    pub graph: InteractionGraph,
}

impl Checkpoint {
    pub(crate) fn capture(graph: InteractionGraph, report: AccumulationReport) -> Self {
        Self {
            records_consumed: report.records_seen,
            created_at: Utc::now(),
            report,
            graph,
        }
    }

    /// Write the checkpoint as JSON, atomically replacing any previous one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, |w| Ok(serde_json::to_writer(w, self)?))?;
        debug!(path = %path.display(), records = self.records_consumed, "checkpoint saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let checkpoint: Checkpoint = serde_json::from_reader(reader)
            .map_err(|e| Error::Checkpoint(format!("{}: {e}", path.display())))?;
        if checkpoint.records_consumed != checkpoint.report.records_seen {
            return Err(Error::Checkpoint(format!(
                "{}: records_consumed {} disagrees with report ({})",
                path.display(),
                checkpoint.records_consumed,
                checkpoint.report.records_seen
            )));
        }
        Ok(checkpoint)
    }

    /// Load `path` if it exists.
    pub fn load_if_exists(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Drop the records this checkpoint already covers from a re-opened source.
    ///
    /// Fails if the consumed count does not fit in `usize` on this platform.
    pub fn skip_consumed<I: Iterator>(&self, source: I) -> Result<std::iter::Skip<I>> {
        let n = usize::try_from(self.records_consumed).map_err(|_| {
            Error::Checkpoint(format!(
                "{} consumed records cannot be skipped on this platform",
                self.records_consumed
            ))
        })?;
        Ok(source.skip(n))
    }
}
