//! Docid lookup table (`.spt`) decoding.
//!
//! The table maps external document ids to row ids. It starts with a small
//! header, followed by a sparse checkpoint array and a payload of
//! delta-encoded blocks. Point lookups binary-search the checkpoints and
//! decode a single block; bulk workflows decode every block once and build a
//! [`DocidIndex`].
//!
//! ```text
//! +-----------------------------+
//! | num_docs            u32 LE  |
//! | docs_per_checkpoint u32 LE  |
//! | max_docid           u64 LE  |
//! +-----------------------------+
//! | first_docid u64 | offset u64|  x ceil(num_docs / docs_per_checkpoint)
//! +-----------------------------+
//! | rowid u32 | (delta varint, rowid u32)*  |  one block per checkpoint
//! +-----------------------------+
//! ```

pub mod block;
pub mod index;
pub mod table;
pub mod writer;

pub use block::{Block, BlockCursor, BlockEntry};
pub use index::{DocidIndex, ReverseIndex};
pub use table::{Checkpoint, LookupTable, TableHeader, find_checkpoint, parse_checkpoints};
pub use writer::LookupTableWriter;

/// External document identifier.
pub type DocId = u64;

/// Dense row position inside a segment.
pub type RowId = u32;

/// Rowid sentinel marking an empty slot or the end of a block.
pub const INVALID_ROWID: RowId = 0xFFFF_FFFF;

/// Checkpoint spacing written by the index engine.
pub const DOCS_PER_CHECKPOINT: u32 = 64;

/// Size of the fixed table header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of one checkpoint record in bytes.
pub const CHECKPOINT_SIZE: usize = 16;
