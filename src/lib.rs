//! # liveness
//!
//! Reads and edits the liveness state of search index segments.
//!
//! A segment keeps two files next to each other:
//!
//! - `<table>.spm`, a bitmap of killed rows stored as little-endian `u32` words
//! - `<table>.spt`, a checkpointed, delta-compressed table mapping each
//!   docid to the row that stores it
//!
//! The crate can list the docids of every killed row and mark a batch of
//! docids as killed, rewriting the bitmap atomically.
//!
//! ```
//! use liveness::bitmap::LivenessBitmap;
//! use liveness::lookup::LookupTableWriter;
//! use liveness::reconcile::extract_killed_docids;
//!
//! # fn main() -> liveness::error::Result<()> {
//! let mut writer = LookupTableWriter::default();
//! writer.add(123, 5)?;
//! let spt = writer.finish()?;
//!
//! let mut bitmap = LivenessBitmap::with_capacity(64);
//! bitmap.mark_killed(5)?;
//!
//! assert_eq!(extract_killed_docids(&bitmap.encode(), &spt)?, vec![123]);
//! # Ok(())
//! # }
//! ```

pub mod bitmap;
pub mod cli;
pub mod error;
pub mod lookup;
pub mod reconcile;
pub mod storage;
pub mod util;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
