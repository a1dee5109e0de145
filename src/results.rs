//! Persisted experiment results
//!
//! A [`ResultBundle`] holds the raw per-run rows (every period's statistics
//! concatenated), the per-run detector counts, the period start dates and the
//! statistic names. Comparison tools load bundles and call
//! [`ResultBundle::average`] instead of averaging on their own.

use crate::avstats::AvStats;
use crate::baseline::FileFormat;
use crate::error::{EvalError, Result};
use crate::experiment::{average_runs, AveragedResult, ExperimentResult, RunResult};
use crate::metrics::{StatVector, STAT_COUNT, STAT_NAMES};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// On-disk form of an experiment (JSON or MessagePack)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    /// One row per run: `STAT_COUNT` values per period, periods in order
    pub res: Vec<Vec<f64>>,
    /// Detector counts per run
    pub avstats: Vec<AvStats>,
    /// Start date of every period
    pub key_dates: Vec<NaiveDate>,
    /// Statistic names in row order
    pub stats: Vec<String>,
}

impl ResultBundle {
    pub fn from_result(result: &ExperimentResult) -> Self {
        ResultBundle {
            res: result.runs.iter().map(RunResult::row).collect(),
            avstats: result.runs.iter().map(|r| r.avstats.clone()).collect(),
            key_dates: result.key_dates().to_vec(),
            stats: STAT_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn n_runs(&self) -> usize {
        self.res.len()
    }

    pub fn n_periods(&self) -> usize {
        self.key_dates.len()
    }

    /// Check the bundle's shape
    pub fn validate(&self) -> Result<()> {
        if self.stats.len() != STAT_COUNT || self.stats.iter().zip(STAT_NAMES).any(|(a, b)| a != b) {
            return Err(EvalError::InvalidBundle(format!(
                "unexpected statistic names {:?}",
                self.stats
            )));
        }
        if self.res.is_empty() {
            return Err(EvalError::InvalidBundle("bundle holds no runs".to_string()));
        }
        if self.avstats.len() != self.res.len() {
            return Err(EvalError::InvalidBundle(format!(
                "{} result rows but {} detector count maps",
                self.res.len(),
                self.avstats.len()
            )));
        }
        for (i, row) in self.res.iter().enumerate() {
            if row.len() % STAT_COUNT != 0 {
                return Err(EvalError::InvalidBundle(format!(
                    "row {} has {} values, not a multiple of {}",
                    i + 1,
                    row.len(),
                    STAT_COUNT
                )));
            }
            if row.len() / STAT_COUNT != self.key_dates.len() {
                return Err(EvalError::InvalidBundle(format!(
                    "row {} covers {} periods but the bundle has {} dates",
                    i + 1,
                    row.len() / STAT_COUNT,
                    self.key_dates.len()
                )));
            }
        }
        Ok(())
    }

    /// Rebuild the runs from the stored rows
    pub fn runs(&self) -> Result<Vec<RunResult>> {
        self.validate()?;
        self.res
            .iter()
            .zip(&self.avstats)
            .map(|(row, avstats)| {
                let stats = row
                    .chunks(STAT_COUNT)
                    .map(StatVector::from_slice)
                    .collect::<Result<Vec<_>>>()?;
                Ok(RunResult {
                    stats,
                    start_dates: self.key_dates.clone(),
                    avstats: avstats.clone(),
                })
            })
            .collect()
    }

    /// Average over all stored runs
    pub fn average(&self) -> Result<AveragedResult> {
        average_runs(&self.runs()?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = match FileFormat::from_path(path) {
            FileFormat::Json => serde_json::to_vec_pretty(self)
                .map_err(|e| EvalError::Serialization(e.to_string()))?,
            FileFormat::MessagePack => rmp_serde::to_vec_named(self)
                .map_err(|e| EvalError::Serialization(e.to_string()))?,
        };
        std::fs::write(path, bytes)?;
        info!("Saving results [{}]", path.display());
        Ok(())
    }

    /// Load and validate a bundle
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let bundle: ResultBundle = match FileFormat::from_path(path) {
            FileFormat::Json => serde_json::from_slice(&bytes)
                .map_err(|e| EvalError::Serialization(format!("{}: {}", path.display(), e)))?,
            FileFormat::MessagePack => rmp_serde::from_slice(&bytes)
                .map_err(|e| EvalError::Serialization(format!("{}: {}", path.display(), e)))?,
        };
        bundle.validate()?;
        Ok(bundle)
    }
}

impl From<&ExperimentResult> for ResultBundle {
    fn from(result: &ExperimentResult) -> Self {
        ResultBundle::from_result(result)
    }
}
