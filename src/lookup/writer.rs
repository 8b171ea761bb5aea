//! Lookup table writer.
//!
//! Serializes sorted `(docid, rowid)` pairs into the checkpoint + block layout
//! read by [`LookupTable`](crate::lookup::LookupTable). Used to produce
//! fixtures for tests and benchmarks.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{LivenessError, Result};
use crate::lookup::{
    CHECKPOINT_SIZE, DOCS_PER_CHECKPOINT, DocId, HEADER_SIZE, INVALID_ROWID, RowId,
};
use crate::util::varint::write_u64_be;

/// Builder for lookup table buffers.
#[derive(Debug, Clone)]
pub struct LookupTableWriter {
    docs_per_checkpoint: u32,
    entries: Vec<(DocId, RowId)>,
}

impl Default for LookupTableWriter {
    fn default() -> Self {
        LookupTableWriter {
            docs_per_checkpoint: DOCS_PER_CHECKPOINT,
            entries: Vec::new(),
        }
    }
}

impl LookupTableWriter {
    /// Create a writer with a custom checkpoint spacing.
    pub fn new(docs_per_checkpoint: u32) -> Result<Self> {
        if docs_per_checkpoint == 0 {
            return Err(LivenessError::other(
                "docs_per_checkpoint must be greater than zero",
            ));
        }
        Ok(LookupTableWriter {
            docs_per_checkpoint,
            entries: Vec::new(),
        })
    }

    /// Append a mapping. Docids must be added in strictly increasing order.
    pub fn add(&mut self, docid: DocId, rowid: RowId) -> Result<()> {
        if rowid == INVALID_ROWID {
            return Err(LivenessError::other(format!(
                "rowid {rowid:#x} is reserved as the block terminator"
            )));
        }
        if let Some(&(last, _)) = self.entries.last()
            && docid <= last
        {
            return Err(LivenessError::other(format!(
                "docid {docid} added after {last}"
            )));
        }
        self.entries.push((docid, rowid));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the table.
    pub fn finish(self) -> Result<Vec<u8>> {
        let num_docs = u32::try_from(self.entries.len())
            .map_err(|_| LivenessError::other("too many documents for a lookup table"))?;
        let max_docid = self.entries.last().map_or(0, |&(docid, _)| docid);
        let chunk_size = self.docs_per_checkpoint as usize;

        let mut blocks = Vec::new();
        let mut block_starts = Vec::new();
        for chunk in self.entries.chunks(chunk_size) {
            block_starts.push((chunk[0].0, blocks.len()));

            let (mut previous, first_rowid) = chunk[0];
            blocks.write_u32::<LittleEndian>(first_rowid)?;
            for &(docid, rowid) in &chunk[1..] {
                write_u64_be(&mut blocks, docid - previous);
                blocks.write_u32::<LittleEndian>(rowid)?;
                previous = docid;
            }
        }

        let payload_start = HEADER_SIZE + block_starts.len() * CHECKPOINT_SIZE;
        let mut out = Vec::with_capacity(payload_start + blocks.len());
        out.write_u32::<LittleEndian>(num_docs)?;
        out.write_u32::<LittleEndian>(self.docs_per_checkpoint)?;
        out.write_u64::<LittleEndian>(max_docid)?;
        for (first_docid, relative) in block_starts {
            out.write_u64::<LittleEndian>(first_docid)?;
            out.write_u64::<LittleEndian>((payload_start + relative) as u64)?;
        }
        out.extend_from_slice(&blocks);

        Ok(out)
    }
}
