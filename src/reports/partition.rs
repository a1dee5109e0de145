use super::write_date_span;
use crate::dataset::{is_negative, is_positive, read_labels, scan_date_range};
use crate::error::{EvalError, Result};
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Class counts of one period's files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodCounts {
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub pos_tr: usize,
    pub neg_tr: usize,
    pub pos_te: usize,
    pub neg_te: usize,
}

/// Dataset partitioning across periods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionReport {
    pub periods: Vec<PeriodCounts>,
}

impl PartitionReport {
    pub fn key_dates(&self) -> Vec<NaiveDate> {
        self.periods.iter().map(|p| p.start).collect()
    }
}

fn class_counts(labels: &[f64]) -> (usize, usize) {
    (
        labels.iter().filter(|&&l| is_positive(l)).count(),
        labels.iter().filter(|&&l| is_negative(l)).count(),
    )
}

/// Count samples per class without parsing features
pub fn partition_dataset(train_files: &[PathBuf], test_files: &[PathBuf]) -> Result<PartitionReport> {
    if train_files.len() != test_files.len() || train_files.is_empty() {
        return Err(EvalError::InvalidConfiguration(format!(
            "There must be an equal, nonzero number of training and test files ({} vs {})",
            train_files.len(),
            test_files.len()
        )));
    }

    let mut periods = Vec::with_capacity(train_files.len());
    for (train, test) in train_files.iter().zip(test_files) {
        let (start, end) = scan_date_range(test)?.ok_or_else(|| {
            EvalError::InvalidConfiguration(format!(
                "Test file {} contains no YYYY/MM/DD sample dates",
                test.display()
            ))
        })?;
        let (pos_te, neg_te) = class_counts(&read_labels(test)?);
        let (pos_tr, neg_tr) = class_counts(&read_labels(train)?);
        periods.push(PeriodCounts {
            index: 0,
            start,
            end,
            pos_tr,
            neg_tr,
            pos_te,
            neg_te,
        });
    }

    if periods.windows(2).any(|w| w[0].start > w[1].start) {
        warn!("Test files are not in chronological order; reordering periods by start date");
        periods.sort_by_key(|p| p.start);
    }
    for (i, p) in periods.iter_mut().enumerate() {
        p.index = i + 1;
        info!("Period {} [{} - {}]", p.index, p.start, p.end);
        info!("Training: {} malicious, {} benign", p.pos_tr, p.neg_tr);
        info!("Test: {} malicious, {} benign", p.pos_te, p.neg_te);
    }

    Ok(PartitionReport { periods })
}

impl fmt::Display for PartitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<6} {:<10} {:<10} {:>10} {:>10} {:>10} {:>10}",
            "Period", "Start", "End", "pos_tr", "neg_tr", "pos_te", "neg_te"
        )?;
        for p in &self.periods {
            writeln!(
                f,
                "{:<6} {:<10} {:<10} {:>10} {:>10} {:>10} {:>10}",
                p.index,
                p.start.to_string(),
                p.end.to_string(),
                p.pos_tr, p.neg_tr, p.pos_te, p.neg_te
            )?;
        }
        writeln!(f)?;
        write_date_span(f, &self.key_dates())
    }
}
