//! Boundary records and the in-memory index snapshot
//!
//! A snapshot is built once per corpus handle and never mutated afterwards.
//! Records keep scan order; `positions` gives O(1) lookup by document id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;
use tracing::warn;

/// Location and metadata of one top-level document in the source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryRecord {
    pub document_id: String,
    pub title: String,
    /// 0-based index of the opening line
    pub line_start: usize,
    /// 0-based index of the closing line
    pub line_end: usize,
    /// Offset of the first byte of the opening line
    pub byte_start: u64,
    /// Offset just past the closing line (including its terminator)
    pub byte_end: u64,
    /// Categories in first-seen order, without duplicates
    pub categories: Vec<String>,
}

impl BoundaryRecord {
    /// Length of the document's byte range
    pub fn byte_len(&self) -> u64 {
        self.byte_end.saturating_sub(self.byte_start)
    }

    /// Add a category unless it is already present
    pub fn push_category(&mut self, category: String) {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
    }
}

/// Ordered mapping `document_id -> BoundaryRecord` plus the source mtime at capture
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSnapshot {
    records: Vec<BoundaryRecord>,
    positions: HashMap<String, usize>,
    source_mtime: SystemTime,
}

impl IndexSnapshot {
    /// Build a snapshot from records in scan order
    ///
    /// A repeated id keeps its first position and takes the later record.
    pub fn from_records(records: impl IntoIterator<Item = BoundaryRecord>, source_mtime: SystemTime) -> Self {
        let mut snapshot = IndexSnapshot {
            records: Vec::new(),
            positions: HashMap::new(),
            source_mtime,
        };

        for record in records {
            match snapshot.positions.get(&record.document_id) {
                Some(&pos) => {
                    warn!(document_id = %record.document_id, "duplicate document id, keeping the later record");
                    snapshot.records[pos] = record;
                }
                None => {
                    snapshot.positions.insert(record.document_id.clone(), snapshot.records.len());
                    snapshot.records.push(record);
                }
            }
        }

        snapshot
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a document by id
    pub fn get(&self, document_id: &str) -> Option<&BoundaryRecord> {
        self.positions.get(document_id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.positions.contains_key(document_id)
    }

    /// Document ids in scan order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.document_id.as_str())
    }

    /// Records in scan order
    pub fn iter(&self) -> std::slice::Iter<'_, BoundaryRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[BoundaryRecord] {
        &self.records
    }

    /// Source file modification time when the snapshot was captured
    pub fn source_mtime(&self) -> SystemTime {
        self.source_mtime
    }
}

impl<'s> IntoIterator for &'s IndexSnapshot {
    type Item = &'s BoundaryRecord;
    type IntoIter = std::slice::Iter<'s, BoundaryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
