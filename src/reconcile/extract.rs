//! Killed docid extraction.
//!
//! `LoadBitmap -> LoadTable -> BuildReverseIndex -> Emit`, one pass. The
//! lookup table is decoded in full once and inverted, so reporting stays
//! linear in the number of killed rows.

use std::collections::BTreeSet;

use log::debug;
use serde::Serialize;

use crate::bitmap::LivenessBitmap;
use crate::error::Result;
use crate::lookup::{DocId, LookupTable, RowId};

/// Result of an extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KilledReport {
    /// Killed docids, ascending and deduplicated.
    pub docids: Vec<DocId>,

    /// Number of killed rows in the bitmap.
    pub killed_rows: u64,

    /// Killed rows without a docid in the lookup table.
    pub unmapped_rows: u64,
}

/// Map every killed row of a bitmap buffer back to its docid.
pub fn extract_killed(spm: &[u8], spt: &[u8]) -> Result<KilledReport> {
    let bitmap = LivenessBitmap::decode(spm)?;
    let table = LookupTable::parse(spt)?;
    let reverse = table.full_index()?.reverse();

    let mut docids = BTreeSet::new();
    let mut report = KilledReport::default();

    for row in bitmap.killed_rows() {
        report.killed_rows += 1;
        // Rows with no counterpart were hard-deleted from the table.
        match RowId::try_from(row)
            .ok()
            .and_then(|rowid| reverse.reverse_lookup(rowid))
        {
            Some(docid) => {
                docids.insert(docid);
            }
            None => report.unmapped_rows += 1,
        }
    }

    report.docids = docids.into_iter().collect();

    debug!(
        "{} killed rows, {} mapped to docids, {} unmapped",
        report.killed_rows,
        report.docids.len(),
        report.unmapped_rows
    );

    Ok(report)
}

/// Killed docids of a segment, ascending.
pub fn extract_killed_docids(spm: &[u8], spt: &[u8]) -> Result<Vec<DocId>> {
    Ok(extract_killed(spm, spt)?.docids)
}
