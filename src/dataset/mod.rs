// Sparse dataset loading
//
// Reads labeled sparse feature files and scans the same files for the
// per-sample metadata (dates, content hashes) that the evaluation needs to
// bound periods and cross-reference external detection verdicts.

mod matrix;
mod metadata;
mod svmlight;

pub use matrix::{SparseMatrix, SparseRow};
pub use metadata::{
    find_date, find_identifier, scan_date_range, scan_dates, scan_identifiers,
};
pub use svmlight::{parse_svmlight, read_labels, read_svmlight, LabeledData};

use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Feed every line of a file to `f` with its 1-based line number
///
/// Lines are decoded lossily: sample paths embedded in comments are not
/// guaranteed to be UTF-8.
pub(crate) fn read_lines<F>(path: &Path, mut f: F) -> Result<()>
where
    F: FnMut(usize, &str) -> Result<()>,
{
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);
        f(line_no, line.trim_end_matches(['\n', '\r']))?;
    }
    Ok(())
}

/// Label is malicious (positive class)
pub fn is_positive(label: f64) -> bool {
    label > 0.5
}

/// Label is benign (negative class)
pub fn is_negative(label: f64) -> bool {
    label < 0.5
}
