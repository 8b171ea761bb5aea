//! Header and checkpoint parsing for the lookup table.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::error::{LivenessError, Result};
use crate::lookup::block::{Block, BlockCursor};
use crate::lookup::index::DocidIndex;
use crate::lookup::{CHECKPOINT_SIZE, DocId, HEADER_SIZE, RowId};

/// Fixed header at the start of a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    /// Number of docid slots stored in the blocks.
    pub num_docs: u32,

    /// Maximum number of entries per block.
    pub docs_per_checkpoint: u32,

    /// Largest docid stored in the table.
    pub max_docid: DocId,
}

impl TableHeader {
    /// Read the header from the start of a table buffer.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(LivenessError::format(format!(
                "lookup table is {} bytes, shorter than its {HEADER_SIZE}-byte header",
                bytes.len()
            )));
        }

        let header = TableHeader {
            num_docs: LittleEndian::read_u32(&bytes[0..4]),
            docs_per_checkpoint: LittleEndian::read_u32(&bytes[4..8]),
            max_docid: LittleEndian::read_u64(&bytes[8..16]),
        };

        if header.num_docs > 0 && header.docs_per_checkpoint == 0 {
            return Err(LivenessError::format(
                "lookup table declares documents but zero docs per checkpoint",
            ));
        }

        Ok(header)
    }

    /// Number of checkpoints implied by the header.
    pub fn checkpoint_count(&self) -> usize {
        if self.num_docs == 0 {
            return 0;
        }
        self.num_docs.div_ceil(self.docs_per_checkpoint) as usize
    }

    /// Number of entry slots in the block addressed by checkpoint `index`.
    ///
    /// Every block is full except possibly the last one.
    pub fn docs_in_block(&self, index: usize) -> u32 {
        if index + 1 < self.checkpoint_count() {
            return self.docs_per_checkpoint;
        }
        match self.num_docs % self.docs_per_checkpoint {
            0 => self.docs_per_checkpoint,
            leftover => leftover,
        }
    }
}

/// Sparse index entry pointing at the block that starts with `first_docid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// Docid of the first entry of the block.
    pub first_docid: DocId,

    /// Absolute byte offset of the block inside the table buffer.
    pub block_offset: u64,
}

/// Parse and validate the checkpoint array of a table buffer.
///
/// The `first_docid` sequence must be strictly increasing, and block offsets
/// must be strictly increasing and point past the checkpoint array into the
/// buffer.
pub fn parse_checkpoints(bytes: &[u8]) -> Result<Vec<Checkpoint>> {
    let header = TableHeader::parse(bytes)?;
    parse_checkpoints_with(bytes, &header)
}

fn parse_checkpoints_with(bytes: &[u8], header: &TableHeader) -> Result<Vec<Checkpoint>> {
    let count = header.checkpoint_count();
    let payload_start = count
        .checked_mul(CHECKPOINT_SIZE)
        .and_then(|size| size.checked_add(HEADER_SIZE))
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| {
            LivenessError::format(format!(
                "lookup table declares {count} checkpoints but only {} bytes follow the header",
                bytes.len() - HEADER_SIZE
            ))
        })?;

    let mut checkpoints: Vec<Checkpoint> = Vec::with_capacity(count);
    for i in 0..count {
        let pos = HEADER_SIZE + i * CHECKPOINT_SIZE;
        let checkpoint = Checkpoint {
            first_docid: LittleEndian::read_u64(&bytes[pos..pos + 8]),
            block_offset: LittleEndian::read_u64(&bytes[pos + 8..pos + 16]),
        };

        if checkpoint.block_offset < payload_start as u64
            || checkpoint.block_offset >= bytes.len() as u64
        {
            return Err(LivenessError::format(format!(
                "checkpoint {i} points at offset {} outside the block payload [{payload_start}, {})",
                checkpoint.block_offset,
                bytes.len()
            )));
        }

        if let Some(previous) = checkpoints.last() {
            if checkpoint.first_docid <= previous.first_docid {
                return Err(LivenessError::format(format!(
                    "checkpoint {i} docid {} does not follow {}",
                    checkpoint.first_docid, previous.first_docid
                )));
            }
            if checkpoint.block_offset <= previous.block_offset {
                return Err(LivenessError::format(format!(
                    "checkpoint {i} offset {} does not follow {}",
                    checkpoint.block_offset, previous.block_offset
                )));
            }
        }

        checkpoints.push(checkpoint);
    }

    Ok(checkpoints)
}

/// Find the index of the last checkpoint whose `first_docid <= docid`.
///
/// Returns `None` when `docid` precedes the first checkpoint.
pub fn find_checkpoint(checkpoints: &[Checkpoint], docid: DocId) -> Option<usize> {
    let upper = checkpoints.partition_point(|cp| cp.first_docid <= docid);
    upper.checked_sub(1)
}

/// A parsed lookup table borrowing the raw file buffer.
#[derive(Debug, Clone)]
pub struct LookupTable<'a> {
    bytes: &'a [u8],
    header: TableHeader,
    checkpoints: Vec<Checkpoint>,
}

impl<'a> LookupTable<'a> {
    /// Parse the header and checkpoints. Blocks are decoded on demand.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let header = TableHeader::parse(bytes)?;
        let checkpoints = parse_checkpoints_with(bytes, &header)?;

        debug!(
            "Parsed lookup table: {} docs, {} checkpoints, max docid {}",
            header.num_docs,
            checkpoints.len(),
            header.max_docid
        );

        Ok(LookupTable {
            bytes,
            header,
            checkpoints,
        })
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Index of the checkpoint whose block may contain `docid`.
    pub fn find_checkpoint(&self, docid: DocId) -> Option<usize> {
        find_checkpoint(&self.checkpoints, docid)
    }

    /// Open a cursor over the block addressed by checkpoint `index`.
    pub fn block_cursor(&self, index: usize) -> Result<BlockCursor<'a>> {
        let checkpoint = self.checkpoints.get(index).copied().ok_or_else(|| {
            LivenessError::other(format!(
                "checkpoint {index} does not exist ({} checkpoints)",
                self.checkpoints.len()
            ))
        })?;

        let next = self.checkpoints.get(index + 1);
        let end = next.map_or(self.bytes.len(), |cp| cp.block_offset as usize);
        let start = checkpoint.block_offset as usize;

        Ok(BlockCursor::new(
            &self.bytes[start..end],
            checkpoint,
            self.header.docs_in_block(index),
            next.map(|cp| cp.first_docid),
        ))
    }

    /// Decode every entry of the block addressed by checkpoint `index`.
    pub fn decode_block(&self, index: usize) -> Result<Block> {
        let cursor = self.block_cursor(index)?;
        let checkpoint = *cursor.checkpoint();
        let entries = cursor.collect::<Result<Vec<_>>>()?;
        Ok(Block {
            checkpoint,
            entries,
        })
    }

    /// Resolve a docid to its rowid, decoding at most one block.
    pub fn lookup(&self, docid: DocId) -> Result<Option<RowId>> {
        let Some(index) = self.find_checkpoint(docid) else {
            return Ok(None);
        };

        for entry in self.block_cursor(index)? {
            let entry = entry?;
            if entry.docid == docid {
                return Ok(Some(entry.rowid));
            }
            if entry.docid > docid {
                break;
            }
        }

        Ok(None)
    }

    /// Decode all blocks in checkpoint order into a docid -> rowid index.
    pub fn full_index(&self) -> Result<DocidIndex> {
        let mut index = DocidIndex::new();
        for i in 0..self.checkpoints.len() {
            for entry in self.block_cursor(i)? {
                let entry = entry?;
                index.insert(entry.docid, entry.rowid);
            }
        }

        debug!(
            "Built docid index with {} entries from {} blocks",
            index.len(),
            self.checkpoints.len()
        );

        Ok(index)
    }
}
