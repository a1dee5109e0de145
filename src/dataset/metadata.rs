// Per-sample metadata scanners
//
// Sample dates and content hashes are embedded in feature file comments
// (typically the sample's storage path). At most one match per line is taken,
// and the order of encounter defines sample order.

use super::read_lines;
use crate::error::{EvalError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const DATE_PATTERN: &str = r"(\d{4})/(\d{2})/(\d{2})";
const SHA256_PATTERN: &str = r"[a-fA-F0-9]{64}";

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATE_PATTERN).expect("date pattern is valid"))
}

fn sha256_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SHA256_PATTERN).expect("sha256 pattern is valid"))
}

/// First `YYYY/MM/DD` date on a line, if any
pub fn find_date(line: &str) -> std::result::Result<Option<NaiveDate>, String> {
    let Some(caps) = date_regex().captures(line) else {
        return Ok(None);
    };
    let field = |i: usize| caps[i].parse::<u32>().map_err(|e| e.to_string());
    let (year, month, day) = (field(1)?, field(2)?, field(3)?);
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .map(Some)
        .ok_or_else(|| format!("invalid calendar date '{}'", &caps[0]))
}

/// First 64-hex-character identifier on a line, lowercased
pub fn find_identifier(line: &str) -> Option<String> {
    sha256_regex()
        .find(line)
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// All sample dates of a file, in order of encounter
pub fn scan_dates(path: &Path) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::new();
    read_lines(path, |line_no, line| {
        if let Some(date) = find_date(line).map_err(|msg| EvalError::parse(path, line_no, msg))? {
            dates.push(date);
        }
        Ok(())
    })?;
    Ok(dates)
}

/// Earliest and latest sample date of a file (None when it has no dates)
pub fn scan_date_range(path: &Path) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let dates = scan_dates(path)?;
    let start = dates.iter().min().copied();
    let end = dates.iter().max().copied();
    Ok(start.zip(end))
}

/// All sample identifiers (SHA-256 content hashes) of a file, in order
pub fn scan_identifiers(path: &Path) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    read_lines(path, |_, line| {
        if let Some(id) = find_identifier(line) {
            ids.push(id);
        }
        Ok(())
    })?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "9F86D081884C7D659A2FEAA0C55AD015A3BF4F1B2B0B822CD15D6C15B0F00A08";

    #[test]
    fn test_find_date_first_match_only() {
        let d = find_date("1 1:1 # /a/2014/03/07/x and 2015/01/01").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2014, 3, 7));
    }

    #[test]
    fn test_find_date_none() {
        assert_eq!(find_date("1 2:1 # no date here").unwrap(), None);
    }

    #[test]
    fn test_find_date_invalid_calendar_date() {
        assert!(find_date("# 2014/02/30").is_err());
    }

    #[test]
    fn test_find_identifier_lowercases() {
        let line = format!("0 3:1 # /store/{}.pdf", HASH);
        assert_eq!(find_identifier(&line), Some(HASH.to_ascii_lowercase()));
    }

    #[test]
    fn test_find_identifier_requires_64_hex() {
        assert_eq!(find_identifier("# deadbeef"), None);
    }

    #[test]
    fn test_scan_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.libsvm");
        let contents = format!(
            "1 1:1 # 2014/01/09/{h}\n0 2:1 # 2014/01/06/{h}\n0 2:1 # no metadata\n",
            h = HASH
        );
        std::fs::write(&path, contents).unwrap();

        let dates = scan_dates(&path).unwrap();
        assert_eq!(dates.len(), 2);
        let (start, end) = scan_date_range(&path).unwrap().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2014, 1, 6).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2014, 1, 9).unwrap());
        assert_eq!(scan_identifiers(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_scan_date_range_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.libsvm");
        std::fs::write(&path, "1 1:1\n").unwrap();
        assert_eq!(scan_date_range(&path).unwrap(), None);
    }
}
