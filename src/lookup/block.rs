//! Block decoding for the lookup table.
//!
//! A block starts with the bare rowid of the checkpoint's own docid. Every
//! following entry is a big-endian varint docid delta and a little-endian
//! `u32` rowid. Decoding keeps a running docid, so it is expressed as a cursor
//! yielding one entry at a time; point lookups stop as soon as they pass the
//! target.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{LivenessError, Result};
use crate::lookup::table::Checkpoint;
use crate::lookup::{DocId, INVALID_ROWID, RowId};
use crate::util::varint::decode_u64_be;

/// One decoded `(docid, rowid)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEntry {
    pub docid: DocId,
    pub rowid: RowId,
}

/// A fully decoded block, entries ascending by docid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub checkpoint: Checkpoint,
    pub entries: Vec<BlockEntry>,
}

impl Block {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sequential cursor over the entries of one block.
///
/// The cursor stops at the `INVALID_ROWID` terminator, after the block's
/// entry budget, or when the byte range ends on an entry boundary. Any error
/// ends the iteration.
#[derive(Debug, Clone)]
pub struct BlockCursor<'a> {
    data: &'a [u8],
    pos: usize,
    checkpoint: Checkpoint,
    remaining: u32,
    current_docid: DocId,
    upper_docid: Option<DocId>,
    started: bool,
    finished: bool,
}

impl<'a> BlockCursor<'a> {
    /// Create a cursor over `data`, the block's byte range.
    ///
    /// `max_entries` is the number of slots the header assigns to the block;
    /// `upper_docid` is the next checkpoint's first docid, if any.
    pub fn new(
        data: &'a [u8],
        checkpoint: Checkpoint,
        max_entries: u32,
        upper_docid: Option<DocId>,
    ) -> Self {
        BlockCursor {
            data,
            pos: 0,
            checkpoint,
            remaining: max_entries,
            current_docid: checkpoint.first_docid,
            upper_docid,
            started: false,
            finished: false,
        }
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_rowid(&mut self) -> Result<RowId> {
        let end = self.pos + 4;
        if end > self.data.len() {
            return Err(self.corrupt(format!(
                "truncated rowid at byte {} of {}",
                self.pos,
                self.data.len()
            )));
        }
        let rowid = LittleEndian::read_u32(&self.data[self.pos..end]);
        self.pos = end;
        Ok(rowid)
    }

    /// Decode a delta entry. `None` means the terminator was reached.
    fn read_delta_entry(&mut self) -> Result<Option<BlockEntry>> {
        let (delta, read) = decode_u64_be(&self.data[self.pos..])
            .map_err(|e| self.corrupt(format!("bad docid delta at byte {}: {e}", self.pos)))?;
        self.pos += read;

        let rowid = self.read_rowid()?;
        if rowid == INVALID_ROWID {
            return Ok(None);
        }

        if delta == 0 {
            return Err(self.corrupt(format!(
                "docid {} repeats inside the block",
                self.current_docid
            )));
        }

        let docid = self
            .current_docid
            .checked_add(delta)
            .ok_or_else(|| self.corrupt("docid delta overflows u64"))?;

        if let Some(upper) = self.upper_docid
            && docid >= upper
        {
            return Err(self.corrupt(format!(
                "docid {docid} reaches the next checkpoint at {upper}"
            )));
        }

        self.current_docid = docid;
        Ok(Some(BlockEntry { docid, rowid }))
    }

    fn corrupt<S: Into<String>>(&self, msg: S) -> LivenessError {
        LivenessError::format(format!(
            "block at offset {} (first docid {}): {}",
            self.checkpoint.block_offset,
            self.checkpoint.first_docid,
            msg.into()
        ))
    }
}

impl Iterator for BlockCursor<'_> {
    type Item = Result<BlockEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished || self.remaining == 0 {
                return None;
            }

            let result = if !self.started {
                self.started = true;
                self.remaining -= 1;
                match self.read_rowid() {
                    // An empty base slot carries no row; keep decoding.
                    Ok(INVALID_ROWID) => continue,
                    Ok(rowid) => Ok(Some(BlockEntry {
                        docid: self.checkpoint.first_docid,
                        rowid,
                    })),
                    Err(e) => Err(e),
                }
            } else if self.pos == self.data.len() {
                Ok(None)
            } else {
                self.remaining -= 1;
                self.read_delta_entry()
            };

            return match result {
                Ok(Some(entry)) => Some(Ok(entry)),
                Ok(None) => {
                    self.finished = true;
                    None
                }
                Err(e) => {
                    self.finished = true;
                    Some(Err(e))
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::varint::write_u64_be;
    use byteorder::WriteBytesExt;

    fn checkpoint(first_docid: DocId) -> Checkpoint {
        Checkpoint {
            first_docid,
            block_offset: 48,
        }
    }

    fn push_entry(bytes: &mut Vec<u8>, delta: u64, rowid: RowId) {
        write_u64_be(bytes, delta);
        bytes.write_u32::<LittleEndian>(rowid).unwrap();
    }

    fn block_bytes(first_rowid: RowId, entries: &[(u64, RowId)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.write_u32::<LittleEndian>(first_rowid).unwrap();
        for &(delta, rowid) in entries {
            push_entry(&mut bytes, delta, rowid);
        }
        bytes
    }

    fn decode_all(cursor: BlockCursor<'_>) -> Result<Vec<(DocId, RowId)>> {
        cursor
            .map(|entry| entry.map(|e| (e.docid, e.rowid)))
            .collect()
    }

    #[test]
    fn test_running_docid() {
        let bytes = block_bytes(7, &[(3, 8), (200, 2), (1, 40)]);
        let cursor = BlockCursor::new(&bytes, checkpoint(100), 64, None);

        assert_eq!(
            decode_all(cursor).unwrap(),
            vec![(100, 7), (103, 8), (303, 2), (304, 40)]
        );
    }

    #[test]
    fn test_entry_budget_stops_decoding() {
        let bytes = block_bytes(1, &[(1, 2), (1, 3), (1, 4)]);
        let cursor = BlockCursor::new(&bytes, checkpoint(10), 2, None);

        assert_eq!(decode_all(cursor).unwrap(), vec![(10, 1), (11, 2)]);
    }

    #[test]
    fn test_terminator_ends_block() {
        let bytes = block_bytes(5, &[(2, 6), (1, INVALID_ROWID), (1, 9)]);
        let cursor = BlockCursor::new(&bytes, checkpoint(50), 64, None);

        assert_eq!(decode_all(cursor).unwrap(), vec![(50, 5), (52, 6)]);
    }

    #[test]
    fn test_empty_base_slot_is_skipped() {
        let bytes = block_bytes(INVALID_ROWID, &[(4, 11)]);
        let cursor = BlockCursor::new(&bytes, checkpoint(20), 64, None);

        assert_eq!(decode_all(cursor).unwrap(), vec![(24, 11)]);
    }

    #[test]
    fn test_truncated_rowid() {
        let mut bytes = block_bytes(5, &[(2, 6)]);
        bytes.extend_from_slice(&[0x01, 0xAA, 0xBB]); // delta, then half a rowid
        let mut cursor = BlockCursor::new(&bytes, checkpoint(1), 64, None);

        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().unwrap().unwrap_err().is_format());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_truncated_varint() {
        let mut bytes = block_bytes(5, &[]);
        bytes.push(0x81); // continuation flag with nothing after it
        let cursor = BlockCursor::new(&bytes, checkpoint(1), 64, None);

        assert!(decode_all(cursor).unwrap_err().is_format());
    }

    #[test]
    fn test_truncated_first_rowid() {
        let bytes = [0x01, 0x00];
        let cursor = BlockCursor::new(&bytes, checkpoint(1), 64, None);
        assert!(decode_all(cursor).unwrap_err().is_format());
    }

    #[test]
    fn test_zero_delta_rejected() {
        let bytes = block_bytes(5, &[(0, 6)]);
        let cursor = BlockCursor::new(&bytes, checkpoint(1), 64, None);

        let err = decode_all(cursor).unwrap_err();
        assert!(err.to_string().contains("repeats"));
    }

    #[test]
    fn test_docid_past_next_checkpoint() {
        let bytes = block_bytes(5, &[(9, 6), (1, 7)]);
        let cursor = BlockCursor::new(&bytes, checkpoint(0), 64, Some(10));

        let err = decode_all(cursor).unwrap_err();
        assert!(err.to_string().contains("next checkpoint"));
    }

    #[test]
    fn test_block_entries() {
        let bytes = block_bytes(1, &[(2, 2), (5, 3)]);
        let cursor = BlockCursor::new(&bytes, checkpoint(10), 64, None);
        let entries = cursor.collect::<Result<Vec<_>>>().unwrap();
        let block = Block {
            checkpoint: checkpoint(10),
            entries,
        };

        assert_eq!(block.len(), 3);
        assert!(!block.is_empty());
        let docids: Vec<DocId> = block.entries.iter().map(|e| e.docid).collect();
        assert_eq!(docids, vec![10, 12, 17]);
    }
}
