//! File-based storage implementation.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LivenessError, Result};
use crate::storage::{Storage, StorageError};

/// Configuration for file storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStorageConfig {
    /// Root directory that relative file names resolve against.
    pub path: PathBuf,

    /// Whether to fsync rewritten files and their directory.
    pub sync_writes: bool,
}

impl FileStorageConfig {
    /// Create a configuration rooted at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileStorageConfig {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        FileStorageConfig {
            path: PathBuf::from("."),
            sync_writes: true,
        }
    }
}

/// A file-based storage implementation.
#[derive(Debug)]
pub struct FileStorage {
    /// The root directory for storage.
    directory: PathBuf,
    /// Storage configuration.
    config: FileStorageConfig,
}

impl FileStorage {
    /// Create a new file storage rooted at the configured directory.
    pub fn new(config: FileStorageConfig) -> Result<Self> {
        let directory = config.path.clone();

        if !directory.is_dir() {
            return Err(LivenessError::storage(format!(
                "Path is not a directory: {}",
                directory.display()
            )));
        }

        Ok(FileStorage { directory, config })
    }

    /// Get the full path for a file name.
    ///
    /// Absolute names are used as they are.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    fn parent_dir(path: &Path) -> &Path {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Storage for FileStorage {
    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(name);
        let data = fs::read(&path).map_err(|e| StorageError::from_io(name, e))?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(data)
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.file_path(name);
        let dir = Self::parent_dir(&path);
        let write_err = |e| StorageError::from_write_io(name, e);

        let mut temp = tempfile::Builder::new()
            .prefix(".liveness_")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(write_err)?;

        // Keep the original mode; temporary files are created owner-only.
        if let Ok(metadata) = fs::metadata(&path) {
            temp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(write_err)?;
        }

        temp.write_all(data).map_err(write_err)?;
        if self.config.sync_writes {
            temp.as_file().sync_all().map_err(write_err)?;
        }

        temp.persist(&path).map_err(|e| write_err(e.error))?;

        #[cfg(unix)]
        if self.config.sync_writes {
            File::open(dir)
                .and_then(|d| d.sync_all())
                .map_err(write_err)?;
        }

        debug!("Replaced {} with {} bytes", path.display(), data.len());
        Ok(())
    }

    fn file_exists(&self, name: &str) -> bool {
        self.file_path(name).is_file()
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        let metadata =
            fs::metadata(self.file_path(name)).map_err(|e| StorageError::from_io(name, e))?;
        Ok(metadata.len())
    }
}
