//! Segment-level workflows over a [`Storage`] backend.

use std::collections::BTreeSet;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::bitmap::LivenessBitmap;
use crate::error::{LivenessError, Result};
use crate::lookup::{DocId, LookupTable, RowId};
use crate::reconcile::extract::{KilledReport, extract_killed};
use crate::reconcile::mark::{MarkConfig, MarkOutcome, mark_killed_docids};
use crate::storage::Storage;

/// Extension of the liveness bitmap file.
pub const BITMAP_EXTENSION: &str = "spm";

/// Extension of the docid lookup table file.
pub const LOOKUP_EXTENSION: &str = "spt";

/// Names of the two files making up a segment's liveness state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentPaths {
    pub bitmap: String,
    pub lookup: String,
}

impl SegmentPaths {
    /// Resolve a table prefix such as `data/t/t.0` to `t.0.spm` / `t.0.spt`.
    pub fn from_prefix(prefix: &str) -> Self {
        SegmentPaths {
            bitmap: format!("{prefix}.{BITMAP_EXTENSION}"),
            lookup: format!("{prefix}.{LOOKUP_EXTENSION}"),
        }
    }

    pub fn new<B: Into<String>, L: Into<String>>(bitmap: B, lookup: L) -> Self {
        SegmentPaths {
            bitmap: bitmap.into(),
            lookup: lookup.into(),
        }
    }
}

/// Summary of a segment's liveness state.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentStats {
    pub paths: SegmentPaths,
    pub num_docs: u32,
    pub docs_per_checkpoint: u32,
    pub max_docid: DocId,
    pub checkpoints: usize,
    pub mapped_docids: usize,
    pub row_capacity: u64,
    pub killed_rows: u64,
    pub killed_docids: usize,
}

/// Runs the liveness workflows against one segment.
///
/// The segment is assumed to be exclusively owned for the duration of a call;
/// the index engine must not be touching the same files.
#[derive(Debug, Clone)]
pub struct SegmentReconciler {
    storage: Arc<dyn Storage>,
    paths: SegmentPaths,
}

impl SegmentReconciler {
    pub fn new(storage: Arc<dyn Storage>, paths: SegmentPaths) -> Self {
        SegmentReconciler { storage, paths }
    }

    pub fn paths(&self) -> &SegmentPaths {
        &self.paths
    }

    /// Fail early with an operator-facing message when a file is absent.
    pub fn check_files(&self) -> Result<()> {
        if !self.storage.file_exists(&self.paths.lookup) {
            return Err(LivenessError::not_found(format!(
                ".{LOOKUP_EXTENSION} file {}",
                self.paths.lookup
            )));
        }
        if !self.storage.file_exists(&self.paths.bitmap) {
            return Err(LivenessError::not_found(format!(
                ".{BITMAP_EXTENSION} file {} (the table may need to be created first)",
                self.paths.bitmap
            )));
        }
        Ok(())
    }

    /// Report the docids of every killed row.
    pub fn extract_killed(&self) -> Result<KilledReport> {
        self.check_files()?;

        info!("Reading killed rows from {}", self.paths.bitmap);
        let spm = self.storage.read_file(&self.paths.bitmap)?;
        info!("Reading docid lookup from {}", self.paths.lookup);
        let spt = self.storage.read_file(&self.paths.lookup)?;

        extract_killed(&spm, &spt)
    }

    /// Mark `docids` as killed and atomically rewrite the bitmap.
    pub fn mark_killed(
        &self,
        docids: &BTreeSet<DocId>,
        config: &MarkConfig,
    ) -> Result<MarkOutcome> {
        self.check_files()?;

        info!("Found {} document IDs to mark as killed", docids.len());
        info!("Reading docid lookup from {}", self.paths.lookup);
        let spt = self.storage.read_file(&self.paths.lookup)?;
        info!("Reading bitmap from {}", self.paths.bitmap);
        let spm = self.storage.read_file(&self.paths.bitmap)?;

        let mut outcome = mark_killed_docids(&spm, &spt, docids, config)?;

        if config.dry_run {
            info!("Dry run: leaving {} untouched", self.paths.bitmap);
        } else {
            info!("Writing {} bytes to {}", outcome.bitmap.len(), self.paths.bitmap);
            self.storage.write_file(&self.paths.bitmap, &outcome.bitmap)?;
            outcome.persisted = true;
        }

        Ok(outcome)
    }

    /// Decode both files and summarize them.
    pub fn stats(&self) -> Result<SegmentStats> {
        self.check_files()?;

        let spm = self.storage.read_file(&self.paths.bitmap)?;
        let spt = self.storage.read_file(&self.paths.lookup)?;

        let bitmap = LivenessBitmap::decode(&spm)?;
        let table = LookupTable::parse(&spt)?;
        let index = table.full_index()?;
        let reverse = index.reverse();
        let killed_docids: BTreeSet<DocId> = bitmap
            .killed_rows()
            .filter_map(|row| RowId::try_from(row).ok())
            .filter_map(|rowid| reverse.reverse_lookup(rowid))
            .collect();
        let header = table.header();

        Ok(SegmentStats {
            paths: self.paths.clone(),
            num_docs: header.num_docs,
            docs_per_checkpoint: header.docs_per_checkpoint,
            max_docid: header.max_docid,
            checkpoints: table.checkpoints().len(),
            mapped_docids: index.len(),
            row_capacity: bitmap.row_capacity(),
            killed_rows: bitmap.killed_count(),
            killed_docids: killed_docids.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupTableWriter;
    use crate::storage::memory::MemoryStorage;

    fn segment(pairs: &[(DocId, u32)], rows: u64) -> (MemoryStorage, SegmentReconciler) {
        let storage = MemoryStorage::new_default();
        let mut writer = LookupTableWriter::default();
        for &(docid, rowid) in pairs {
            writer.add(docid, rowid).unwrap();
        }
        let paths = SegmentPaths::from_prefix("t.0");
        storage
            .write_file(&paths.lookup, &writer.finish().unwrap())
            .unwrap();
        storage
            .write_file(&paths.bitmap, &LivenessBitmap::with_capacity(rows).encode())
            .unwrap();

        let reconciler = SegmentReconciler::new(Arc::new(storage.clone()), paths);
        (storage, reconciler)
    }

    #[test]
    fn test_paths_from_prefix() {
        let paths = SegmentPaths::from_prefix("/var/lib/idx/t/t.0");
        assert_eq!(paths.bitmap, "/var/lib/idx/t/t.0.spm");
        assert_eq!(paths.lookup, "/var/lib/idx/t/t.0.spt");
    }

    #[test]
    fn test_missing_files_reported() {
        let storage = Arc::new(MemoryStorage::new_default());
        let reconciler = SegmentReconciler::new(storage.clone(), SegmentPaths::from_prefix("t"));

        let err = reconciler.extract_killed().unwrap_err();
        assert!(err.to_string().contains("t.spt"));

        storage.write_file("t.spt", &[0u8; 16]).unwrap();
        let err = reconciler.extract_killed().unwrap_err();
        assert!(err.to_string().contains("t.spm"));
    }

    #[test]
    fn test_mark_then_extract() {
        let (storage, reconciler) = segment(&[(123, 5), (200, 9)], 64);

        let outcome = reconciler
            .mark_killed(&[123].into_iter().collect(), &MarkConfig::default())
            .unwrap();
        assert!(outcome.persisted);
        assert_eq!(storage.write_count().unwrap(), 3);

        let report = reconciler.extract_killed().unwrap();
        assert_eq!(report.docids, vec![123]);
    }

    #[test]
    fn test_dry_run_leaves_bitmap() {
        let (storage, reconciler) = segment(&[(123, 5)], 64);
        let before = storage.read_file("t.0.spm").unwrap();
        let config = MarkConfig {
            dry_run: true,
            ..MarkConfig::default()
        };

        let outcome = reconciler
            .mark_killed(&[123].into_iter().collect(), &config)
            .unwrap();

        assert!(!outcome.persisted);
        assert_eq!(outcome.newly_killed, 1);
        assert_eq!(storage.read_file("t.0.spm").unwrap(), before);
    }

    #[test]
    fn test_stats() {
        let (_storage, reconciler) = segment(&[(1, 0), (2, 1), (3, 2)], 32);
        reconciler
            .mark_killed(&[2].into_iter().collect(), &MarkConfig::default())
            .unwrap();

        let stats = reconciler.stats().unwrap();
        assert_eq!(stats.num_docs, 3);
        assert_eq!(stats.checkpoints, 1);
        assert_eq!(stats.mapped_docids, 3);
        assert_eq!(stats.row_capacity, 32);
        assert_eq!(stats.killed_rows, 1);
        assert_eq!(stats.killed_docids, 1);
        assert_eq!(stats.max_docid, 3);
    }
}
