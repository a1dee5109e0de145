//! Per-detector detection counts
//!
//! [`AvStats`] counts, for every detector, how many malicious test samples it
//! flagged. Two keys are reserved: [`TOTAL_KEY`] counts every malicious
//! sample and [`HIDOST_KEY`] counts the ones the evaluated classifier caught.
//! Counts are combined by key union, with absent keys reading as zero.

use crate::baseline::VerdictLookup;
use crate::dataset::is_positive;
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Reserved key: malicious test samples seen
pub const TOTAL_KEY: &str = "Total";

/// Reserved key: malicious test samples the classifier detected
pub const HIDOST_KEY: &str = "Hidost";

fn is_reserved(name: &str) -> bool {
    name == TOTAL_KEY || name == HIDOST_KEY
}

/// Detector name -> true-positive count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvStats {
    counts: BTreeMap<String, u64>,
}

impl AvStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for `key` (zero when never seen)
    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, key: &str, by: u64) {
        *self.counts.entry(key.to_string()).or_insert(0) += by;
    }

    pub fn total(&self) -> u64 {
        self.get(TOTAL_KEY)
    }

    pub fn hidost(&self) -> u64 {
        self.get(HIDOST_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Key-union sum of two count maps
    pub fn merge(&self, other: &AvStats) -> AvStats {
        let mut counts = self.counts.clone();
        for (key, &value) in &other.counts {
            *counts.entry(key.clone()).or_insert(0) += value;
        }
        AvStats { counts }
    }
}

impl FromIterator<(String, u64)> for AvStats {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut stats = AvStats::new();
        for (key, value) in iter {
            stats.increment(&key, value);
        }
        stats
    }
}

/// Baseline contribution of one test split
///
/// Every malicious sample adds one to `Total` and one to each detector that
/// flagged it. Malicious samples with an unknown identifier only add to
/// `Total`. `Hidost` counts the malicious samples predicted malicious.
pub fn baseline_contribution(
    labels: &[f64],
    predictions: &[bool],
    ids: &[Option<String>],
    lookup: &dyn VerdictLookup,
) -> Result<AvStats> {
    for (what, found) in [("predictions", predictions.len()), ("test identifiers", ids.len())] {
        if found != labels.len() {
            return Err(EvalError::LengthMismatch {
                what,
                expected: labels.len(),
                found,
            });
        }
    }

    let mut stats = AvStats::new();
    let mut unknown = 0usize;
    for ((&label, &predicted), id) in labels.iter().zip(predictions).zip(ids) {
        if !is_positive(label) {
            continue;
        }
        stats.increment(TOTAL_KEY, 1);
        if predicted {
            stats.increment(HIDOST_KEY, 1);
        }

        let Some(detectors) = id.as_deref().and_then(|id| lookup.detections(id)) else {
            unknown += 1;
            continue;
        };
        for detector in detectors {
            if is_reserved(detector) {
                debug!("Skipping detector named like reserved key '{}'", detector);
                continue;
            }
            stats.increment(detector, 1);
        }
    }

    if unknown > 0 {
        debug!("{} malicious samples without baseline verdicts", unknown);
    }
    // Keep the reserved keys present even for a split without malicious samples
    stats.increment(TOTAL_KEY, 0);
    stats.increment(HIDOST_KEY, 0);
    Ok(stats)
}

/// Fold run results into one map
pub fn merge_all<'a>(runs: impl IntoIterator<Item = &'a AvStats>) -> AvStats {
    runs.into_iter()
        .fold(AvStats::new(), |acc, run| acc.merge(run))
}

/// Mean count per key over `runs` (absent keys count as zero in every run)
pub fn average(runs: &[AvStats]) -> BTreeMap<String, f64> {
    if runs.is_empty() {
        return BTreeMap::new();
    }
    let n = runs.len() as f64;
    merge_all(runs)
        .iter()
        .map(|(k, v)| (k.to_string(), v as f64 / n))
        .collect()
}
