//! In-memory docid indexes derived from a lookup table.

use std::collections::BTreeMap;

use ahash::AHashMap;
use log::warn;

use crate::lookup::{DocId, RowId};

/// Ordered docid -> rowid mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocidIndex {
    entries: BTreeMap<DocId, RowId>,
}

impl DocidIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping, returning the previous rowid for the docid.
    pub fn insert(&mut self, docid: DocId, rowid: RowId) -> Option<RowId> {
        self.entries.insert(docid, rowid)
    }

    pub fn lookup(&self, docid: DocId) -> Option<RowId> {
        self.entries.get(&docid).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate mappings in ascending docid order.
    pub fn iter(&self) -> impl Iterator<Item = (DocId, RowId)> + '_ {
        self.entries.iter().map(|(&docid, &rowid)| (docid, rowid))
    }

    /// Build the inverted rowid -> docid view.
    pub fn reverse(&self) -> ReverseIndex {
        ReverseIndex::from(self)
    }
}

impl FromIterator<(DocId, RowId)> for DocidIndex {
    fn from_iter<I: IntoIterator<Item = (DocId, RowId)>>(iter: I) -> Self {
        DocidIndex {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Inverted rowid -> docid view, built once for bulk reporting.
#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    rows: AHashMap<RowId, DocId>,
    collisions: usize,
}

impl ReverseIndex {
    /// The docid stored for a row, if any.
    pub fn reverse_lookup(&self, rowid: RowId) -> Option<DocId> {
        self.rows.get(&rowid).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of docids that shared a row with a later docid.
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

impl From<&DocidIndex> for ReverseIndex {
    /// Rows claimed by several docids resolve to the largest docid.
    fn from(index: &DocidIndex) -> Self {
        let mut rows = AHashMap::with_capacity(index.len());
        let mut collisions = 0;

        for (docid, rowid) in index.iter() {
            if let Some(previous) = rows.insert(rowid, docid) {
                warn!(
                    "Row {rowid} is mapped by docid {previous} and docid {docid}; keeping {docid}"
                );
                collisions += 1;
            }
        }

        ReverseIndex { rows, collisions }
    }
}
