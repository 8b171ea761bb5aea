//! Marking docids as killed.
//!
//! `ParseInput -> LoadTable -> ResolveRowids -> LoadBitmap -> ApplyMarks`.
//! The result carries the complete re-encoded bitmap; persisting it is left to
//! the caller so nothing is written until every mark has been applied.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::bitmap::LivenessBitmap;
use crate::error::{LivenessError, Result};
use crate::lookup::{DocId, LookupTable, RowId};

/// Configuration for the mark workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkConfig {
    /// Grow the bitmap when a resolved row is beyond its capacity.
    pub allow_grow: bool,

    /// Compute the new bitmap without writing it back.
    pub dry_run: bool,

    /// How many missing docids to list in the warning.
    pub max_reported_missing: usize,
}

impl Default for MarkConfig {
    fn default() -> Self {
        MarkConfig {
            allow_grow: true,
            dry_run: false,
            max_reported_missing: 10,
        }
    }
}

/// Result of a mark pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarkOutcome {
    /// The complete encoded bitmap after all marks.
    #[serde(skip)]
    pub bitmap: Vec<u8>,

    /// Docids found in the lookup table with their rows.
    pub resolved: Vec<(DocId, RowId)>,

    /// Docids absent from the lookup table.
    pub missing: Vec<DocId>,

    /// Rows whose bit went from alive to killed.
    pub newly_killed: usize,

    /// Rows that were already killed.
    pub already_killed: usize,

    /// Words appended to the bitmap to fit the resolved rows.
    pub words_added: usize,

    /// Whether the bitmap was written back.
    pub persisted: bool,
}

impl MarkOutcome {
    /// Whether the encoded bitmap differs from the input.
    pub fn changed(&self) -> bool {
        self.newly_killed > 0 || self.words_added > 0
    }
}

/// Resolve `docids` through the lookup table and set their bits.
///
/// Missing docids are logged and skipped. A pass that resolves nothing still
/// succeeds and returns the bitmap unchanged.
pub fn mark_killed_docids(
    spm: &[u8],
    spt: &[u8],
    docids: &BTreeSet<DocId>,
    config: &MarkConfig,
) -> Result<MarkOutcome> {
    let table = LookupTable::parse(spt)?;

    let mut outcome = MarkOutcome::default();
    for &docid in docids {
        match table.lookup(docid)? {
            Some(rowid) => outcome.resolved.push((docid, rowid)),
            None => outcome.missing.push(docid),
        }
    }
    report_missing(&outcome.missing, config.max_reported_missing);

    let mut bitmap = LivenessBitmap::decode(spm)?;

    if let Some(max_row) = outcome
        .resolved
        .iter()
        .map(|&(_, rowid)| u64::from(rowid))
        .max()
        && max_row >= bitmap.row_capacity()
    {
        if !config.allow_grow {
            return Err(LivenessError::out_of_range(max_row, bitmap.row_capacity()));
        }
        let before = bitmap.row_capacity();
        outcome.words_added = bitmap.grow(max_row + 1);
        info!(
            "Growing bitmap from {before} to {} rows to fit row {max_row}",
            bitmap.row_capacity()
        );
    }

    for &(docid, rowid) in &outcome.resolved {
        if bitmap.mark_killed(u64::from(rowid))? {
            outcome.newly_killed += 1;
        } else {
            debug!("Docid {docid} (row {rowid}) is already killed");
            outcome.already_killed += 1;
        }
    }

    info!(
        "Resolved {} of {} docids: {} newly killed, {} already killed",
        outcome.resolved.len(),
        docids.len(),
        outcome.newly_killed,
        outcome.already_killed
    );

    outcome.bitmap = bitmap.encode();
    Ok(outcome)
}

fn report_missing(missing: &[DocId], limit: usize) {
    for line in missing_report(missing, limit) {
        warn!("{line}");
    }
}

/// Warning lines for docids absent from the lookup table.
fn missing_report(missing: &[DocId], limit: usize) -> Vec<String> {
    if missing.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!("{} document IDs not found in lookup table", missing.len())];
    lines.extend(missing.iter().take(limit).map(|docid| format!("  {docid}")));
    if missing.len() > limit {
        lines.push(format!("  ... and {} more", missing.len() - limit));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupTableWriter;

    fn table(pairs: &[(DocId, RowId)]) -> Vec<u8> {
        let mut writer = LookupTableWriter::default();
        for &(docid, rowid) in pairs {
            writer.add(docid, rowid).unwrap();
        }
        writer.finish().unwrap()
    }

    fn ids(values: &[DocId]) -> BTreeSet<DocId> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_marks_resolved_docid() {
        let spt = table(&[(123, 5)]);
        let spm = LivenessBitmap::with_capacity(64).encode();

        let outcome =
            mark_killed_docids(&spm, &spt, &ids(&[123]), &MarkConfig::default()).unwrap();
        let bitmap = LivenessBitmap::decode(&outcome.bitmap).unwrap();

        assert!(bitmap.is_killed(5).unwrap());
        assert_eq!(bitmap.killed_count(), 1);
        assert_eq!(outcome.resolved, vec![(123, 5)]);
        assert_eq!(outcome.newly_killed, 1);
        assert!(outcome.changed());
    }

    #[test]
    fn test_missing_docids_are_not_fatal() {
        let spt = table(&[(123, 5)]);
        let spm = LivenessBitmap::with_capacity(64).encode();

        let outcome =
            mark_killed_docids(&spm, &spt, &ids(&[999, 123]), &MarkConfig::default()).unwrap();

        assert_eq!(outcome.missing, vec![999]);
        assert_eq!(outcome.resolved, vec![(123, 5)]);
        assert_eq!(
            missing_report(&outcome.missing, 10),
            vec!["1 document IDs not found in lookup table", "  999"]
        );
    }

    #[test]
    fn test_missing_report_truncates() {
        let missing: Vec<DocId> = (1..=13).collect();
        let lines = missing_report(&missing, 10);

        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "13 document IDs not found in lookup table");
        assert_eq!(lines[10], "  10");
        assert_eq!(lines[11], "  ... and 3 more");
        assert!(missing_report(&[], 10).is_empty());
    }

    #[test]
    fn test_nothing_resolved_keeps_bitmap() {
        let spt = table(&[(123, 5)]);
        let mut original = LivenessBitmap::with_capacity(64);
        original.mark_killed(9).unwrap();
        let spm = original.encode();

        let outcome =
            mark_killed_docids(&spm, &spt, &ids(&[1, 2]), &MarkConfig::default()).unwrap();

        assert_eq!(outcome.bitmap, spm);
        assert!(!outcome.changed());
        assert_eq!(outcome.missing, vec![1, 2]);
    }

    #[test]
    fn test_already_killed_rows_counted() {
        let spt = table(&[(123, 5), (124, 6)]);
        let mut original = LivenessBitmap::with_capacity(32);
        original.mark_killed(5).unwrap();

        let outcome = mark_killed_docids(
            &original.encode(),
            &spt,
            &ids(&[123, 124]),
            &MarkConfig::default(),
        )
        .unwrap();

        assert_eq!(outcome.newly_killed, 1);
        assert_eq!(outcome.already_killed, 1);
    }

    #[test]
    fn test_grows_for_rows_past_capacity() {
        let spt = table(&[(1, 2), (2, 100)]);
        let spm = LivenessBitmap::with_capacity(32).encode();

        let outcome =
            mark_killed_docids(&spm, &spt, &ids(&[1, 2]), &MarkConfig::default()).unwrap();
        let bitmap = LivenessBitmap::decode(&outcome.bitmap).unwrap();

        assert_eq!(outcome.words_added, 3);
        assert_eq!(bitmap.row_capacity(), 128);
        assert!(bitmap.is_killed(2).unwrap());
        assert!(bitmap.is_killed(100).unwrap());
    }

    #[test]
    fn test_growth_disabled_is_out_of_range() {
        let spt = table(&[(2, 100)]);
        let spm = LivenessBitmap::with_capacity(32).encode();
        let config = MarkConfig {
            allow_grow: false,
            ..MarkConfig::default()
        };

        let err = mark_killed_docids(&spm, &spt, &ids(&[2]), &config).unwrap_err();
        assert!(matches!(
            err,
            LivenessError::OutOfRange {
                rowid: 100,
                capacity: 32
            }
        ));
    }

    #[test]
    fn test_format_errors_abort() {
        let spt = table(&[(123, 5)]);
        let err =
            mark_killed_docids(&[0u8; 6], &spt, &ids(&[123]), &MarkConfig::default()).unwrap_err();
        assert!(err.is_format());

        let spm = LivenessBitmap::with_capacity(32).encode();
        let err =
            mark_killed_docids(&spm, &[0u8; 3], &ids(&[123]), &MarkConfig::default()).unwrap_err();
        assert!(err.is_format());
    }
}
