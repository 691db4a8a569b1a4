//! In-memory record store.
//!
//! An append-only `Vec` of documents behind a `parking_lot::RwLock`. Clones
//! share the same storage, so producers on other threads can keep appending
//! while a snapshot is being accumulated.
//!
//! ## Snapshot semantics
//!
//! [`MemoryStore::snapshot`] fixes the record count at the moment it is
//! taken. Documents appended afterwards are not visible to that snapshot,
//! and because the store never removes or rewrites a document, every index
//! below the fixed count stays valid for the snapshot's lifetime.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value as Json;

use crate::model::PostRecord;
use crate::{Error, Result};
use super::RecordSink;

/// Shared in-memory document store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<Vec<Json>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// A source over exactly the documents present right now.
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            docs: Arc::clone(&self.docs),
            pos: 0,
            end: self.len(),
        }
    }
}

impl RecordSink for MemoryStore {
    fn append(&self, document: Json) -> Result<()> {
        self.docs.write().push(document);
        Ok(())
    }
}

/// Forward-only view over a fixed prefix of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySnapshot {
    docs: Arc<RwLock<Vec<Json>>>,
    pos: usize,
    end: usize,
}

impl MemorySnapshot {
    /// Documents this snapshot will yield in total.
    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }
}

impl Iterator for MemorySnapshot {
    type Item = Result<PostRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let docs = self.docs.read();
        let Some(doc) = docs.get(self.pos) else {
            return Some(Err(Error::Store(format!(
                "snapshot index {} beyond store length {}",
                self.pos,
                docs.len()
            ))));
        };
        let ordinal = self.pos + 1;
        self.pos += 1;
        Some(
            PostRecord::deserialize(doc)
                .map_err(|e| Error::MalformedRecord(format!("document {ordinal}: {e}"))),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.end - self.pos;
        (left, Some(left))
    }
}
