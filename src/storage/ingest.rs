//! Line-oriented ingestion into a record sink.
//!
//! Reads one JSON document per line (the shape a streaming API client
//! emits) and appends every JSON object to the sink as-is. Lines that are
//! not JSON objects, or not UTF-8 at all, are logged and dropped; read or
//! sink failures stop ingestion.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::{info, warn};

use crate::Result;
use super::RecordSink;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub lines_read: u64,
    pub stored: u64,
    pub rejected: u64,
}

/// Append every JSON object read from `reader` to `sink`.
pub fn ingest_lines<R, S>(mut reader: R, sink: &S) -> Result<IngestReport>
where
    R: BufRead,
    S: RecordSink + ?Sized,
{
    let mut report = IngestReport::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        report.lines_read += 1;
        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        // Invalid UTF-8 is rejected by the parser like any other bad line.
        match serde_json::from_slice::<Json>(line) {
            Ok(doc @ Json::Object(_)) => {
                sink.append(doc)?;
                report.stored += 1;
            }
            Ok(other) => {
                report.rejected += 1;
                warn!(line = report.lines_read, kind = json_kind(&other), "not a JSON object, dropped");
            }
            Err(e) => {
                report.rejected += 1;
                warn!(line = report.lines_read, error = %e, "unparsable line, dropped");
            }
        }
    }

    sink.flush()?;
    info!(
        lines = report.lines_read,
        stored = report.stored,
        rejected = report.rejected,
        "ingestion finished"
    );
    Ok(report)
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
