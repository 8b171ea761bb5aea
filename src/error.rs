//! Error types for the liveness library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`LivenessError`] enum. The variants line up with how a run reacts to them:
//! format and input errors abort the run, out-of-range errors tell the caller
//! that the bitmap has to grow before a row can be addressed.
//!
//! # Examples
//!
//! ```
//! use liveness::error::{LivenessError, Result};
//!
//! fn check_length(bytes: &[u8]) -> Result<()> {
//!     if bytes.len() % 4 != 0 {
//!         return Err(LivenessError::format("bitmap length is not a multiple of 4"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_length(&[0u8; 5]).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for liveness operations.
#[derive(Error, Debug)]
pub enum LivenessError {
    /// I/O errors (reading or writing segment files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A buffer violates the structure of the `.spm` or `.spt` format.
    #[error("Format error: {0}")]
    Format(String),

    /// A row is addressed beyond the current bitmap capacity.
    #[error("Row {rowid} is out of range for a bitmap of {capacity} rows")]
    OutOfRange { rowid: u64, capacity: u64 },

    /// A line of the docid input list could not be parsed.
    #[error("Input error on line {line}: {message}")]
    Input { line: usize, message: String },

    /// Storage-related errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with LivenessError.
pub type Result<T> = std::result::Result<T, LivenessError>;

impl LivenessError {
    /// Create a new format error.
    pub fn format<S: Into<String>>(msg: S) -> Self {
        LivenessError::Format(msg.into())
    }

    /// Create a new out-of-range error.
    pub fn out_of_range(rowid: u64, capacity: u64) -> Self {
        LivenessError::OutOfRange { rowid, capacity }
    }

    /// Create a new input error for a 1-based line number.
    pub fn input<S: Into<String>>(line: usize, msg: S) -> Self {
        LivenessError::Input {
            line,
            message: msg.into(),
        }
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        LivenessError::Storage(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LivenessError::Other(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        LivenessError::Storage(format!("Not found: {}", msg.into()))
    }

    /// Whether this error comes from a structurally broken file.
    pub fn is_format(&self) -> bool {
        matches!(self, LivenessError::Format(_))
    }
}
