use super::write_date_span;
use crate::error::{EvalError, Result};
use crate::experiment::AveragedResult;
use crate::metrics::STAT_NAMES;
use crate::results::ResultBundle;
use chrono::NaiveDate;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Human-readable description of a statistic
pub fn metric_label(name: &str) -> Option<&'static str> {
    Some(match name {
        "neg_tr" => "Benign training",
        "pos_tr" => "Malicious training",
        "neg_te" => "Benign evaluation",
        "pos_te" => "Malicious evaluation",
        "acc" => "Accuracy",
        "AUC" => "Area under ROC",
        "TPR" => "True positive rate",
        "FPR" => "False positive rate",
        _ => return None,
    })
}

/// Averaged results of one named method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodResult {
    pub name: String,
    pub averaged: AveragedResult,
}

impl MethodResult {
    /// Load a result bundle and average its runs
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        info!("Loading results for method {} [{}]", name, path.display());
        let bundle = ResultBundle::load(path)?;
        Ok(MethodResult {
            name: name.to_string(),
            averaged: bundle.average()?,
        })
    }
}

/// Per-period comparison of several methods on the same periods
#[derive(Debug, Clone)]
pub struct MethodComparison {
    methods: Vec<MethodResult>,
    metrics: Vec<String>,
}

impl MethodComparison {
    pub fn new(methods: Vec<MethodResult>, metrics: Vec<String>) -> Result<Self> {
        let Some(first) = methods.first() else {
            return Err(EvalError::InvalidConfiguration(
                "at least one method is required".to_string(),
            ));
        };
        if metrics.is_empty() {
            return Err(EvalError::InvalidConfiguration(
                "at least one metric is required".to_string(),
            ));
        }
        if let Some(unknown) = metrics.iter().find(|m| !STAT_NAMES.contains(&m.as_str())) {
            return Err(EvalError::InvalidConfiguration(format!(
                "unknown metric '{}' (expected one of {})",
                unknown,
                STAT_NAMES.join(", ")
            )));
        }

        let expected = first.averaged.stats.len();
        for (i, method) in methods.iter().enumerate() {
            if method.averaged.stats.len() != expected {
                return Err(EvalError::InconsistentPeriodCount {
                    run: i + 1,
                    expected,
                    found: method.averaged.stats.len(),
                });
            }
        }

        Ok(MethodComparison { methods, metrics })
    }

    pub fn key_dates(&self) -> &[NaiveDate] {
        self.methods
            .first()
            .map_or(&[][..], |m| m.averaged.key_dates.as_slice())
    }

    /// Value of `metric` for every method at period `period` (0-based)
    pub fn row(&self, metric: &str, period: usize) -> Vec<Option<f64>> {
        self.methods
            .iter()
            .map(|m| m.averaged.stats.get(period).and_then(|s| s.get(metric)))
            .collect()
    }
}

impl fmt::Display for MethodComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dates = self.key_dates();
        for metric in &self.metrics {
            writeln!(
                f,
                "=== {} ({}) ===",
                metric_label(metric).unwrap_or(metric.as_str()),
                metric
            )?;
            write!(f, "{:<6} {:<10}", "Period", "Date")?;
            for m in &self.methods {
                write!(f, " {:>14}", m.name)?;
            }
            writeln!(f)?;

            for (p, date) in dates.iter().enumerate() {
                write!(f, "{:<6} {:<10}", p + 1, date.to_string())?;
                for value in self.row(metric, p) {
                    match value {
                        Some(v) => write!(f, " {:>14.4}", v)?,
                        None => write!(f, " {:>14}", "-")?,
                    }
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        write_date_span(f, dates)
    }
}
