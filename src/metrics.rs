//! Per-period performance statistics
//!
//! Turns one period's labels, predictions and scores into a [`StatVector`]:
//! class counts of both splits, accuracy, AUROC and the true/false positive
//! rates. A test split missing one class is reported as
//! [`EvalError::DegenerateSplit`] rather than a silent 0 or NaN.

use crate::dataset::{is_negative, is_positive};
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Canonical ordering of the statistics in a [`StatVector`]
pub const STAT_NAMES: [&str; 8] = ["neg_tr", "pos_tr", "neg_te", "pos_te", "acc", "AUC", "TPR", "FPR"];

/// Number of values per period
pub const STAT_COUNT: usize = STAT_NAMES.len();

/// Confusion table of one test split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Tally predictions against true labels (label > 0.5 is malicious)
    pub fn from_predictions(labels: &[f64], predictions: &[bool]) -> Self {
        let mut cm = ConfusionMatrix::default();
        for (&label, &predicted) in labels.iter().zip(predictions) {
            match (is_positive(label), predicted) {
                (true, true) => cm.tp += 1,
                (true, false) => cm.fn_ += 1,
                (false, true) => cm.fp += 1,
                (false, false) => cm.tn += 1,
            }
        }
        cm
    }

    pub fn positives(&self) -> usize {
        self.tp + self.fn_
    }

    pub fn negatives(&self) -> usize {
        self.tn + self.fp
    }

    pub fn total(&self) -> usize {
        self.positives() + self.negatives()
    }
}

/// Statistics of one period, in [`STAT_NAMES`] order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatVector {
    pub neg_tr: f64,
    pub pos_tr: f64,
    pub neg_te: f64,
    pub pos_te: f64,
    pub acc: f64,
    pub auc: f64,
    pub tpr: f64,
    pub fpr: f64,
}

impl StatVector {
    pub fn to_array(&self) -> [f64; STAT_COUNT] {
        [
            self.neg_tr,
            self.pos_tr,
            self.neg_te,
            self.pos_te,
            self.acc,
            self.auc,
            self.tpr,
            self.fpr,
        ]
    }

    pub fn from_array(values: [f64; STAT_COUNT]) -> Self {
        let [neg_tr, pos_tr, neg_te, pos_te, acc, auc, tpr, fpr] = values;
        StatVector {
            neg_tr,
            pos_tr,
            neg_te,
            pos_te,
            acc,
            auc,
            tpr,
            fpr,
        }
    }

    /// Build from a slice of exactly [`STAT_COUNT`] values
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let array: [f64; STAT_COUNT] = values.try_into().map_err(|_| EvalError::LengthMismatch {
            what: "statistics",
            expected: STAT_COUNT,
            found: values.len(),
        })?;
        Ok(Self::from_array(array))
    }

    /// Value by canonical name (e.g. "AUC", "TPR")
    pub fn get(&self, name: &str) -> Option<f64> {
        STAT_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.to_array()[i])
    }

    /// Element-wise mean (None for an empty input)
    ///
    /// Running mean per field: identical inputs average to themselves exactly.
    pub fn mean(vectors: &[StatVector]) -> Option<StatVector> {
        if vectors.is_empty() {
            return None;
        }
        let mut mean = [0.0; STAT_COUNT];
        for (k, v) in vectors.iter().enumerate() {
            let k = (k + 1) as f64;
            for (m, x) in mean.iter_mut().zip(v.to_array()) {
                *m += (x - *m) / k;
            }
        }
        Some(StatVector::from_array(mean))
    }
}

/// Everything the statistic computer needs from one period
#[derive(Debug, Clone, Copy)]
pub struct Evaluation<'a> {
    pub train_labels: &'a [f64],
    pub test_labels: &'a [f64],
    pub predictions: &'a [bool],
    pub scores: &'a [f64],
}

/// Compute the statistics of period `period` (1-based, used in errors/logs)
pub fn compute_stats(period: usize, eval: &Evaluation<'_>) -> Result<StatVector> {
    let n = eval.test_labels.len();
    for (what, found) in [
        ("predictions", eval.predictions.len()),
        ("scores", eval.scores.len()),
    ] {
        if found != n {
            return Err(EvalError::LengthMismatch {
                what,
                expected: n,
                found,
            });
        }
    }

    let cm = ConfusionMatrix::from_predictions(eval.test_labels, eval.predictions);
    let (positives, negatives) = (cm.positives(), cm.negatives());
    if positives == 0 || negatives == 0 {
        return Err(EvalError::DegenerateSplit {
            period,
            positives,
            negatives,
        });
    }

    let neg_tr = eval.train_labels.iter().filter(|&&l| is_negative(l)).count();
    let pos_tr = eval.train_labels.iter().filter(|&&l| is_positive(l)).count();

    let acc = (cm.tp + cm.tn) as f64 / n as f64;
    let auc = roc_auc(eval.test_labels, eval.scores)?;
    let tpr = cm.tp as f64 / positives as f64;
    let fpr = cm.fp as f64 / negatives as f64;

    info!("Period {}: TP={} FP={} TN={} FN={}", period, cm.tp, cm.fp, cm.tn, cm.fn_);
    info!(
        "Period {}: train neg={} pos={}, test neg={} pos={}",
        period, neg_tr, pos_tr, negatives, positives
    );
    info!(
        "Period {}: accuracy={:.4} AUROC={:.4} TPR={:.4} FPR={:.4}",
        period, acc, auc, tpr, fpr
    );

    Ok(StatVector {
        neg_tr: neg_tr as f64,
        pos_tr: pos_tr as f64,
        neg_te: negatives as f64,
        pos_te: positives as f64,
        acc,
        auc,
        tpr,
        fpr,
    })
}

/// Area under the ROC curve by the trapezoidal rule
///
/// Samples are swept in descending score order; samples with tied scores move
/// the curve in a single (diagonal) step. Both classes must be present.
pub fn roc_auc(labels: &[f64], scores: &[f64]) -> Result<f64> {
    if labels.len() != scores.len() {
        return Err(EvalError::LengthMismatch {
            what: "scores",
            expected: labels.len(),
            found: scores.len(),
        });
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(EvalError::Classifier("NaN decision score".to_string()));
    }

    let positives = labels.iter().filter(|&&l| is_positive(l)).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(EvalError::DegenerateSplit {
            period: 0,
            positives,
            negatives,
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut area = 0.0;
    let (mut tp, mut fp) = (0usize, 0usize);
    let (mut prev_tp, mut prev_fp) = (0usize, 0usize);
    let mut k = 0;
    while k < order.len() {
        let threshold = scores[order[k]];
        while k < order.len() && scores[order[k]] == threshold {
            if is_positive(labels[order[k]]) {
                tp += 1;
            } else {
                fp += 1;
            }
            k += 1;
        }
        area += (fp - prev_fp) as f64 * (tp + prev_tp) as f64 / 2.0;
        prev_tp = tp;
        prev_fp = fp;
    }

    Ok(area / (positives as f64 * negatives as f64))
}
