//! Workflows combining the bitmap codec and the lookup table decoder.
//!
//! Both workflows run as a single pass over already-loaded buffers:
//!
//! - **extract**: killed rows in the bitmap → docids, via the inverted table.
//! - **mark**: docids → rows via point lookups, then bitmap mutation. The new
//!   bitmap is fully encoded before anything is written back.

pub mod docids;
pub mod extract;
pub mod mark;
pub mod segment;

pub use docids::{parse_docid_list, read_docid_list};
pub use extract::{KilledReport, extract_killed, extract_killed_docids};
pub use mark::{MarkConfig, MarkOutcome, mark_killed_docids};
pub use segment::{SegmentPaths, SegmentReconciler, SegmentStats};
