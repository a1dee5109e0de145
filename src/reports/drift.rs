use crate::dataset::read_lines;
use crate::error::Result;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Feature set change from one period to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftRow {
    /// Features in the older period
    pub old: usize,
    /// Features only in the newer period
    pub added: usize,
    /// Features only in the older period
    pub removed: usize,
    /// Features in both
    pub same: usize,
    /// Features in the newer period
    pub new: usize,
}

impl DriftRow {
    pub fn between(older: &[String], newer: &[String]) -> Self {
        let a: HashSet<&str> = older.iter().map(String::as_str).collect();
        let b: HashSet<&str> = newer.iter().map(String::as_str).collect();
        DriftRow {
            old: older.len(),
            added: b.difference(&a).count(),
            removed: a.difference(&b).count(),
            same: a.intersection(&b).count(),
            new: newer.len(),
        }
    }

    /// `count` as a whole percentage of OLD
    fn percent_of_old(&self, count: usize) -> Option<f64> {
        (self.old > 0).then(|| (100.0 * count as f64 / self.old as f64).round())
    }
}

/// Drift rows of one method's consecutive feature sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDrift {
    pub method: String,
    pub rows: Vec<DriftRow>,
}

/// Compare each feature list with the next one
pub fn feature_drift(method: &str, lists: &[Vec<String>]) -> FeatureDrift {
    FeatureDrift {
        method: method.to_string(),
        rows: lists
            .windows(2)
            .map(|w| DriftRow::between(&w[0], &w[1]))
            .collect(),
    }
}

/// Feature names of one period
///
/// Plain lists hold one name per line (blank lines skipped). Structural
/// path dumps separate path components with NUL bytes: a doubled NUL is
/// dropped, a single NUL becomes `/`, and the header line plus the text
/// after the final newline are not names.
pub fn read_feature_names(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    if bytes.contains(&0) {
        return Ok(parse_path_dump(&String::from_utf8_lossy(&bytes)));
    }

    let mut names = Vec::new();
    read_lines(path, |_, line| {
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
        Ok(())
    })?;
    Ok(names)
}

fn parse_path_dump(text: &str) -> Vec<String> {
    let joined = text.replace("\0\0", "").replace('\0', "/");
    let lines: Vec<&str> = joined.split('\n').collect();
    match lines.len() {
        0..=2 => Vec::new(),
        n => lines[1..n - 1].iter().map(|l| l.to_string()).collect(),
    }
}

impl fmt::Display for FeatureDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:#^79}", format!(" {} ", self.method))?;
        writeln!(
            f,
            "{:<6}|{:^7}|{:^14}|{:^14}|{:^14}|{:^7}",
            "Period", "OLD", "Add", "Del", "Same", "NEW"
        )?;
        for (i, row) in self.rows.iter().enumerate() {
            let cell = |count: usize| match row.percent_of_old(count) {
                Some(p) => format!("{} ({}%)", count, p),
                None => format!("{} (-)", count),
            };
            writeln!(
                f,
                "{:^6}|{:>7}|{:>14}|{:>14}|{:>14}|{:>7}",
                format!("{}-{}", i + 1, i + 2),
                row.old,
                cell(row.added),
                cell(row.removed),
                cell(row.same),
                row.new
            )?;
        }
        Ok(())
    }
}
