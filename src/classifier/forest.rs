//! Random forest classifier
//!
//! Bagged CART trees grown to purity on bootstrap samples, with a random
//! subset of candidate features at every split (Gini impurity). The score of a
//! sample is the mean over trees of the malicious fraction in its leaf.
//!
//! # References
//!
//! Breiman, L. (2001). Random forests. Machine Learning, 45(1), 5-32.

use super::{check_training_set, Classifier, Scored};
use crate::config::ForestParams;
use crate::dataset::{SparseMatrix, SparseRow};
use crate::error::{EvalError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use tracing::debug;

/// A node of a decision tree
#[derive(Debug, Clone)]
enum TreeNode {
    /// Samples with `value <= threshold` go left
    Internal {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    /// Fraction of (bootstrap-weighted) malicious samples in the leaf
    Leaf { positive_fraction: f64 },
}

impl TreeNode {
    fn predict(&self, row: &SparseRow) -> f64 {
        match self {
            TreeNode::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                if row.get(*feature) <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
            TreeNode::Leaf { positive_fraction } => *positive_fraction,
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
            TreeNode::Leaf { .. } => 0,
        }
    }
}

/// Single CART tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: TreeNode,
}

impl DecisionTree {
    pub fn predict_proba(&self, row: &SparseRow) -> f64 {
        self.root.predict(row)
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

/// Best split found for one node
struct Split {
    feature: usize,
    threshold: f64,
    /// Size-weighted Gini impurity of the two children
    impurity: f64,
}

struct TreeBuilder<'a> {
    x: &'a SparseMatrix,
    y: &'a [bool],
    max_features: usize,
    min_samples_split: usize,
    max_depth: Option<usize>,
}

impl<'a> TreeBuilder<'a> {
    fn grow(&self, seed: u64) -> DecisionTree {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = self.x.n_rows();
        let mut samples: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        let root = self.build_node(&mut samples, 0, &mut rng);
        DecisionTree { root }
    }

    fn build_node(&self, samples: &mut [usize], depth: usize, rng: &mut StdRng) -> TreeNode {
        let total = samples.len();
        let positives = samples.iter().filter(|&&i| self.y[i]).count();
        let leaf = TreeNode::Leaf {
            positive_fraction: if total == 0 {
                0.0
            } else {
                positives as f64 / total as f64
            },
        };

        if total < self.min_samples_split || positives == 0 || positives == total {
            return leaf;
        }
        if self.max_depth.is_some_and(|max| depth >= max) {
            return leaf;
        }

        let Some(split) = self.best_split(samples, positives, rng) else {
            return leaf;
        };

        // Partition in place: left block holds value <= threshold
        let mut boundary = 0;
        for k in 0..samples.len() {
            if self.x.row(samples[k]).get(split.feature) <= split.threshold {
                samples.swap(boundary, k);
                boundary += 1;
            }
        }
        let (left_samples, right_samples) = samples.split_at_mut(boundary);

        let left = Box::new(self.build_node(left_samples, depth + 1, rng));
        let right = Box::new(self.build_node(right_samples, depth + 1, rng));

        TreeNode::Internal {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        }
    }

    /// Search `max_features` randomly chosen non-constant features
    ///
    /// Features absent from every sample in the node are constant (all zero),
    /// so only features stored in at least one node sample are candidates.
    fn best_split(&self, samples: &[usize], positives: usize, rng: &mut StdRng) -> Option<Split> {
        let present: BTreeSet<usize> = samples
            .iter()
            .flat_map(|&i| self.x.row(i).iter().map(|(col, _)| col))
            .collect();
        let mut candidates: Vec<usize> = present.into_iter().collect();
        candidates.shuffle(rng);

        let mut best: Option<Split> = None;
        let mut visited = 0;
        let mut column: Vec<(f64, bool)> = Vec::with_capacity(samples.len());

        for feature in candidates {
            if visited >= self.max_features {
                break;
            }
            column.clear();
            column.extend(samples.iter().map(|&i| (self.x.row(i).get(feature), self.y[i])));
            let Some((threshold, impurity)) = best_threshold(&mut column, positives) else {
                continue;
            };
            visited += 1;
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }

        best
    }
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

/// Best threshold on one feature column (None when the column is constant)
///
/// Returns the threshold and the size-weighted child impurity.
fn best_threshold(column: &mut [(f64, bool)], positives: usize) -> Option<(f64, f64)> {
    column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let total = column.len();

    let mut best: Option<(f64, f64)> = None;
    let mut left_total = 0;
    let mut left_pos = 0;

    for k in 0..total.saturating_sub(1) {
        left_total += 1;
        if column[k].1 {
            left_pos += 1;
        }
        let (lo, hi) = (column[k].0, column[k + 1].0);
        if lo == hi {
            continue;
        }

        let right_total = total - left_total;
        let right_pos = positives - left_pos;
        let impurity = left_total as f64 * gini(left_pos, left_total)
            + right_total as f64 * gini(right_pos, right_total);

        if best.map_or(true, |(_, b)| impurity < b) {
            let mut threshold = lo + (hi - lo) / 2.0;
            if threshold >= hi {
                threshold = lo;
            }
            best = Some((threshold, impurity));
        }
    }

    best
}

/// Random forest - ensemble of CART trees
pub struct RandomForest {
    params: ForestParams,
    seed: u64,
    n_jobs: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Create an unfitted forest; `n_jobs` worker threads grow the trees
    pub fn new(params: ForestParams, seed: u64, n_jobs: usize) -> Self {
        RandomForest {
            params,
            seed,
            n_jobs: n_jobs.max(1),
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean positive-leaf fraction over all trees
    pub fn predict_proba(&self, row: &SparseRow) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_proba(row)).sum::<f64>() / self.trees.len() as f64
    }

    fn grow_all(&self, builder: &TreeBuilder<'_>, seeds: &[u64]) -> Result<Vec<DecisionTree>> {
        if self.n_jobs <= 1 || seeds.len() <= 1 {
            return Ok(seeds.iter().map(|&s| builder.grow(s)).collect());
        }

        let chunk_size = seeds.len().div_ceil(self.n_jobs);
        let grown = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = seeds
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move |_| {
                        chunk.iter().map(|&s| builder.grow(s)).collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join())
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .map_err(|_| EvalError::Classifier("forest worker thread panicked".to_string()))?
        .map_err(|_| EvalError::Classifier("forest worker thread panicked".to_string()))?;

        Ok(grown.into_iter().flatten().collect())
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "RandomForest"
    }

    fn fit(&mut self, features: &SparseMatrix, labels: &[bool]) -> Result<()> {
        check_training_set(features, labels)?;

        let n_features = features.n_cols();
        let max_features = self
            .params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
            .max(1);

        let builder = TreeBuilder {
            x: features,
            y: labels,
            max_features,
            min_samples_split: self.params.min_samples_split.max(2),
            max_depth: self.params.max_depth,
        };

        // Seeds are fixed before any thread starts, so the forest does not
        // depend on the worker count
        let mut rng = StdRng::seed_from_u64(self.seed);
        let seeds: Vec<u64> = (0..self.params.n_trees).map(|_| rng.gen()).collect();

        self.trees = self.grow_all(&builder, &seeds)?;

        debug!(
            "Grew {} trees (max_features={}, max depth={})",
            self.trees.len(),
            max_features,
            self.trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );
        Ok(())
    }

    fn score(&self, features: &SparseMatrix) -> Result<Scored> {
        if self.trees.is_empty() {
            return Err(EvalError::Classifier("random forest is not fitted".to_string()));
        }
        let scores: Vec<f64> = features.rows().iter().map(|r| self.predict_proba(r)).collect();
        let predictions = scores.iter().map(|&p| p > 0.5).collect();
        Ok(Scored {
            predictions,
            scores,
        })
    }
}
