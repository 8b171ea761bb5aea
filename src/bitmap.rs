//! Liveness bitmap codec.
//!
//! A segment's `.spm` file is a dense array of little-endian 32-bit words.
//! Row `i` lives in word `i >> 5`, bit `i & 31` (LSB first); a set bit means
//! the row is killed. The whole file is decoded at once, mutated in memory and
//! encoded back as a complete buffer.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{LivenessError, Result};

/// Number of rows covered by one bitmap word.
pub const ROWS_PER_WORD: u64 = 32;

/// Size of one bitmap word on disk.
const WORD_BYTES: usize = 4;

/// In-memory liveness bitmap of one segment.
///
/// The capacity is always a whole number of words, so a bitmap produced by
/// [`LivenessBitmap::grow`] encodes to a buffer that decodes back to itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessBitmap {
    words: Vec<u32>,
}

impl LivenessBitmap {
    /// Create an all-alive bitmap able to address at least `rows` rows.
    pub fn with_capacity(rows: u64) -> Self {
        let mut bitmap = LivenessBitmap::default();
        bitmap.grow(rows);
        bitmap
    }

    /// Decode a `.spm` buffer.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % WORD_BYTES != 0 {
            return Err(LivenessError::format(format!(
                "bitmap length {} is not a multiple of {WORD_BYTES}",
                bytes.len()
            )));
        }

        let mut words = vec![0u32; bytes.len() / WORD_BYTES];
        LittleEndian::read_u32_into(bytes, &mut words);

        Ok(LivenessBitmap { words })
    }

    /// Encode the bitmap into its on-disk form.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.words.len() * WORD_BYTES];
        LittleEndian::write_u32_into(&self.words, &mut bytes);
        bytes
    }

    /// Total number of addressable row slots.
    pub fn row_capacity(&self) -> u64 {
        self.words.len() as u64 * ROWS_PER_WORD
    }

    /// The raw words backing the bitmap.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Check whether a row is killed.
    pub fn is_killed(&self, rowid: u64) -> Result<bool> {
        let (word, mask) = self.locate(rowid)?;
        Ok(self.words[word] & mask != 0)
    }

    /// Mark a row as killed.
    ///
    /// Returns `true` if the bit was newly set and `false` if the row was
    /// already killed. Rows beyond the capacity are rejected; call
    /// [`LivenessBitmap::grow`] first.
    pub fn mark_killed(&mut self, rowid: u64) -> Result<bool> {
        let (word, mask) = self.locate(rowid)?;
        let was_killed = self.words[word] & mask != 0;
        self.words[word] |= mask;
        Ok(!was_killed)
    }

    /// Append zero words until `row_capacity() >= new_capacity`.
    ///
    /// Returns the number of words appended. Existing bits are untouched and
    /// a bitmap never shrinks.
    pub fn grow(&mut self, new_capacity: u64) -> usize {
        let needed = new_capacity.div_ceil(ROWS_PER_WORD) as usize;
        let added = needed.saturating_sub(self.words.len());
        if added > 0 {
            self.words.resize(needed, 0);
        }
        added
    }

    /// Iterate over killed rows in ascending order.
    pub fn killed_rows(&self) -> impl Iterator<Item = u64> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, word)| **word != 0)
            .flat_map(|(index, &word)| {
                let base = index as u64 * ROWS_PER_WORD;
                (0..ROWS_PER_WORD)
                    .filter(move |bit| word & (1u32 << bit) != 0)
                    .map(move |bit| base + bit)
            })
    }

    /// Number of killed rows.
    pub fn killed_count(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    fn locate(&self, rowid: u64) -> Result<(usize, u32)> {
        if rowid >= self.row_capacity() {
            return Err(LivenessError::out_of_range(rowid, self.row_capacity()));
        }
        let word = (rowid / ROWS_PER_WORD) as usize;
        let mask = 1u32 << (rowid % ROWS_PER_WORD);
        Ok((word, mask))
    }
}
