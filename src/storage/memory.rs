//! In-memory storage implementation for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::{LivenessError, Result};
use crate::storage::{Storage, StorageError};

/// Configuration for memory storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStorageConfig {
    /// Initial capacity of the file map.
    pub initial_capacity: usize,
}

/// An in-memory storage implementation.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Box<[u8]>>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStorage {
    /// Create a new memory storage.
    pub fn new(config: MemoryStorageConfig) -> Self {
        MemoryStorage {
            files: Arc::new(Mutex::new(HashMap::with_capacity(config.initial_capacity))),
            writes: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a new memory storage with default configuration.
    pub fn new_default() -> Self {
        Self::new(MemoryStorageConfig::default())
    }

    /// Get the number of files stored.
    pub fn file_count(&self) -> Result<usize> {
        Ok(self.lock_files()?.len())
    }

    /// Number of completed `write_file` calls.
    pub fn write_count(&self) -> Result<usize> {
        self.writes
            .lock()
            .map(|count| *count)
            .map_err(|_| LivenessError::storage("memory storage lock poisoned"))
    }

    fn lock_files(&self) -> Result<MutexGuard<'_, HashMap<String, Box<[u8]>>>> {
        self.files
            .lock()
            .map_err(|_| LivenessError::storage("memory storage lock poisoned"))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new_default()
    }
}

impl Storage for MemoryStorage {
    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let files = self.lock_files()?;
        files
            .get(name)
            .map(|data| data.to_vec())
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()).into())
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        self.lock_files()?
            .insert(name.to_string(), data.to_vec().into_boxed_slice());
        let mut writes = self
            .writes
            .lock()
            .map_err(|_| LivenessError::storage("memory storage lock poisoned"))?;
        *writes += 1;
        Ok(())
    }

    fn file_exists(&self, name: &str) -> bool {
        self.lock_files()
            .map(|files| files.contains_key(name))
            .unwrap_or(false)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        let files = self.lock_files()?;
        files
            .get(name)
            .map(|data| data.len() as u64)
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()).into())
    }
}
