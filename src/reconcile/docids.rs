//! Docid input list parsing.
//!
//! One decimal docid per line. Blank lines and lines whose first
//! non-whitespace character is `#` are ignored. Any other line that is not a
//! valid `u64` fails the whole list.

use std::collections::BTreeSet;
use std::io::{self, BufRead};

use crate::error::{LivenessError, Result};
use crate::lookup::DocId;

/// Parse a docid list held in memory.
pub fn parse_docid_list(text: &str) -> Result<BTreeSet<DocId>> {
    read_docid_list(text.as_bytes())
}

/// Read a docid list, deduplicating and sorting the docids.
pub fn read_docid_list<R: BufRead>(reader: R) -> Result<BTreeSet<DocId>> {
    let mut docids = BTreeSet::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => LivenessError::input(line_num + 1, e.to_string()),
            _ => e.into(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let docid = trimmed.parse::<DocId>().map_err(|e| {
            LivenessError::input(line_num + 1, format!("invalid docid {trimmed:?}: {e}"))
        })?;
        docids.insert(docid);
    }

    Ok(docids)
}
