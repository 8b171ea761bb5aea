//! Storage abstraction for segment files.
//!
//! The reconciler reads and rewrites whole files through the [`Storage`]
//! trait, so the same workflows run against the file system or an in-memory
//! map in tests.
//!
//! # Storage Types
//!
//! ## FileStorage
//! - Files resolved relative to a root directory (absolute names pass through)
//! - Whole-file rewrites go to a temporary file in the same directory which is
//!   then renamed over the original
//!
//! ## MemoryStorage
//! - In-memory storage for testing
//!
//! # Example
//!
//! ```
//! use liveness::storage::{StorageConfig, StorageFactory};
//! use liveness::storage::memory::MemoryStorageConfig;
//!
//! # fn main() -> liveness::error::Result<()> {
//! let storage = StorageFactory::create(StorageConfig::Memory(MemoryStorageConfig::default()))?;
//! storage.write_file("t.0.spm", &[0u8; 8])?;
//! assert_eq!(storage.read_file("t.0.spm")?.len(), 8);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{LivenessError, Result};

pub mod file;
pub mod memory;

/// A trait for storage backends holding segment files.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Read a whole file.
    fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Replace the contents of a file.
    ///
    /// Readers observe either the old or the new contents, never a partial
    /// write.
    fn write_file(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Get the size of a file in bytes.
    fn file_size(&self, name: &str) -> Result<u64>;
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageConfig {
    /// File-based storage configuration (includes root directory)
    File(file::FileStorageConfig),

    /// Memory-based storage configuration
    Memory(memory::MemoryStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File(file::FileStorageConfig::default())
    }
}

/// A factory for creating storage instances.
pub struct StorageFactory;

impl StorageFactory {
    /// Create a new storage instance with the given configuration.
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::Memory(mem_config) => {
                Ok(Arc::new(memory::MemoryStorage::new(mem_config)))
            }
            StorageConfig::File(file_config) => Ok(Arc::new(file::FileStorage::new(file_config)?)),
        }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// File not found.
    FileNotFound(String),

    /// Permission denied.
    PermissionDenied(String),

    /// I/O error.
    IoError(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::PermissionDenied(name) => write!(f, "Permission denied: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for LivenessError {
    fn from(err: StorageError) -> Self {
        LivenessError::storage(err.to_string())
    }
}

impl StorageError {
    /// Classify an I/O error raised while touching `name`.
    pub fn from_io(name: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::FileNotFound(name.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                StorageError::PermissionDenied(name.to_string())
            }
            _ => StorageError::IoError(format!("{name}: {err}")),
        }
    }

    /// Classify an I/O error raised while rewriting `name`.
    pub fn from_write_io(name: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(format!(
                "{name} (make sure you have write permission to the file and its directory)"
            )),
            _ => Self::from_io(name, err),
        }
    }
}
