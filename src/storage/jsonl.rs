//! Newline-delimited JSON record store.
//!
//! Each appended document is serialized onto its own line and flushed, so a
//! crash loses at most the line being written. Reading opens an independent
//! handle and streams the file lazily; a torn or otherwise unparsable line
//! comes back as a malformed record carrying its line number.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value as Json;
use tracing::debug;

use crate::model::PostRecord;
use crate::{Error, Result};
use super::RecordSink;

/// File-backed append-only document store.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "opened record store");
        Ok(Self { path, writer: Mutex::new(BufWriter::new(file)) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stream every stored record, oldest first.
    pub fn source(&self) -> Result<JsonLinesSource> {
        self.writer.lock().flush()?;
        JsonLinesSource::open(&self.path)
    }
}

impl RecordSink for JsonLinesStore {
    fn append(&self, document: Json) -> Result<()> {
        if document.is_null() {
            return Err(Error::Store("refusing to store a null document".into()));
        }
        let mut line = serde_json::to_vec(&document)?;
        line.push(b'\n');

        let mut writer = self.writer.lock();
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }
}

/// Lazy reader over a JSON-lines file.
///
/// Lines are read as raw bytes so a line that is not valid UTF-8 decodes
/// to a malformed record instead of failing the read.
#[derive(Debug)]
pub struct JsonLinesSource {
    reader: BufReader<File>,
    buf: Vec<u8>,
    line_no: usize,
}

impl JsonLinesSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self { reader: BufReader::new(file), buf: Vec::new(), line_no: 0 })
    }
}

impl Iterator for JsonLinesSource {
    type Item = Result<PostRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(Error::Io(e))),
            }
            self.line_no += 1;
            let line = self.buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            return Some(
                serde_json::from_slice::<PostRecord>(line)
                    .map_err(|e| Error::MalformedRecord(format!("line {}: {e}", self.line_no))),
            );
        }
    }
}
