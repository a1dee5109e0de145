//! Soft-margin SVM with an RBF kernel
//!
//! Dual problem solved by sequential minimal optimization with the maximal
//! violating pair working set:
//!
//! ```text
//! min  1/2 a'Qa - e'a    s.t.  y'a = 0,  0 <= a_i <= C
//! Q_ij = y_i y_j K(x_i, x_j),   K(x, z) = exp(-gamma * |x - z|^2)
//! ```
//!
//! Decision value: `f(x) = sum_i a_i y_i K(x_i, x) - rho`, positive iff > 0.

use super::{check_training_set, Classifier, Scored};
use crate::config::SvmParams;
use crate::dataset::{SparseMatrix, SparseRow};
use crate::error::{EvalError, Result};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, warn};

/// Quadratic coefficients below this are clamped (non-PSD guard)
const TAU: f64 = 1e-12;

fn rbf(gamma: f64, a: &SparseRow, a_norm: f64, b: &SparseRow, b_norm: f64) -> f64 {
    let dist = (a_norm + b_norm - 2.0 * a.dot(b)).max(0.0);
    (-gamma * dist).exp()
}

/// Kernel rows of the training set, computed on demand
///
/// At most `capacity` rows are held; the oldest row is evicted first.
struct KernelCache<'a> {
    x: &'a SparseMatrix,
    norms: Vec<f64>,
    gamma: f64,
    capacity: usize,
    rows: HashMap<usize, Rc<[f64]>>,
    order: VecDeque<usize>,
    misses: usize,
}

impl<'a> KernelCache<'a> {
    fn new(x: &'a SparseMatrix, gamma: f64, capacity: usize) -> Self {
        KernelCache {
            x,
            norms: x.rows().iter().map(SparseRow::squared_norm).collect(),
            gamma,
            capacity: capacity.max(2),
            rows: HashMap::new(),
            order: VecDeque::new(),
            misses: 0,
        }
    }

    fn row(&mut self, i: usize) -> Rc<[f64]> {
        if let Some(row) = self.rows.get(&i) {
            return Rc::clone(row);
        }
        self.misses += 1;

        let xi = self.x.row(i);
        let ni = self.norms[i];
        let row: Rc<[f64]> = self
            .x
            .rows()
            .iter()
            .zip(&self.norms)
            .map(|(xj, &nj)| rbf(self.gamma, xi, ni, xj, nj))
            .collect();

        if self.order.len() >= self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.rows.remove(&old);
            }
        }
        self.order.push_back(i);
        self.rows.insert(i, Rc::clone(&row));
        row
    }
}

/// SMO solver state
struct Solver<'a> {
    y: Vec<f64>,
    alpha: Vec<f64>,
    grad: Vec<f64>,
    c: f64,
    cache: KernelCache<'a>,
}

impl<'a> Solver<'a> {
    fn new(x: &'a SparseMatrix, labels: &[bool], params: &SvmParams) -> Self {
        let n = labels.len();
        Solver {
            y: labels.iter().map(|&l| if l { 1.0 } else { -1.0 }).collect(),
            alpha: vec![0.0; n],
            grad: vec![-1.0; n],
            c: params.c,
            cache: KernelCache::new(x, params.gamma, params.cache_rows),
        }
    }

    fn at_upper(&self, t: usize) -> bool {
        self.alpha[t] >= self.c
    }

    fn at_lower(&self, t: usize) -> bool {
        self.alpha[t] <= 0.0
    }

    /// Maximal violating pair, or None once the KKT gap is below `tol`
    fn select_working_set(&self, tol: f64) -> Option<(usize, usize)> {
        let mut gmax = f64::NEG_INFINITY;
        let mut gmax2 = f64::NEG_INFINITY;
        let mut i = None;
        let mut j = None;

        for t in 0..self.y.len() {
            let up_candidate = if self.y[t] > 0.0 {
                !self.at_upper(t)
            } else {
                !self.at_lower(t)
            };
            if up_candidate && -self.y[t] * self.grad[t] >= gmax {
                gmax = -self.y[t] * self.grad[t];
                i = Some(t);
            }

            let low_candidate = if self.y[t] > 0.0 {
                !self.at_lower(t)
            } else {
                !self.at_upper(t)
            };
            if low_candidate && self.y[t] * self.grad[t] >= gmax2 {
                gmax2 = self.y[t] * self.grad[t];
                j = Some(t);
            }
        }

        if gmax + gmax2 < tol {
            return None;
        }
        i.zip(j)
    }

    /// Optimize the pair analytically and update the gradient
    fn update_pair(&mut self, i: usize, j: usize) {
        let k_i = self.cache.row(i);
        let k_j = self.cache.row(j);
        let (yi, yj) = (self.y[i], self.y[j]);
        let c = self.c;
        let q_ij = yi * yj * k_i[j];
        // RBF diagonal is exp(0) = 1
        let (qd_i, qd_j) = (1.0, 1.0);

        let old_ai = self.alpha[i];
        let old_aj = self.alpha[j];
        let (mut ai, mut aj) = (old_ai, old_aj);

        if yi != yj {
            let mut quad = qd_i + qd_j + 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (-self.grad[i] - self.grad[j]) / quad;
            let diff = ai - aj;
            ai += delta;
            aj += delta;

            if diff > 0.0 {
                if aj < 0.0 {
                    aj = 0.0;
                    ai = diff;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = -diff;
            }
            if diff > 0.0 {
                if ai > c {
                    ai = c;
                    aj = c - diff;
                }
            } else if aj > c {
                aj = c;
                ai = c + diff;
            }
        } else {
            let mut quad = qd_i + qd_j - 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (self.grad[i] - self.grad[j]) / quad;
            let sum = ai + aj;
            ai -= delta;
            aj += delta;

            if sum > c {
                if ai > c {
                    ai = c;
                    aj = sum - c;
                }
            } else if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if sum > c {
                if aj > c {
                    aj = c;
                    ai = sum - c;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
        }

        self.alpha[i] = ai;
        self.alpha[j] = aj;

        let d_ai = (ai - old_ai) * yi;
        let d_aj = (aj - old_aj) * yj;
        for t in 0..self.grad.len() {
            self.grad[t] += self.y[t] * (k_i[t] * d_ai + k_j[t] * d_aj);
        }
    }

    /// Bias from the free support vectors (midpoint of the feasible range
    /// when none is free)
    fn rho(&self) -> f64 {
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut sum_free = 0.0;
        let mut n_free = 0usize;

        for t in 0..self.y.len() {
            let yg = self.y[t] * self.grad[t];
            if self.at_upper(t) {
                if self.y[t] < 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else if self.at_lower(t) {
                if self.y[t] > 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else {
                n_free += 1;
                sum_free += yg;
            }
        }

        if n_free > 0 {
            sum_free / n_free as f64
        } else {
            (ub + lb) / 2.0
        }
    }
}

/// Trained decision function
#[derive(Debug, Clone)]
struct SvmModel {
    support: Vec<SparseRow>,
    support_norms: Vec<f64>,
    /// a_i * y_i per support vector
    coef: Vec<f64>,
    rho: f64,
}

/// RBF-kernel support vector classifier
pub struct RbfSvm {
    params: SvmParams,
    model: Option<SvmModel>,
}

impl RbfSvm {
    pub fn new(params: SvmParams) -> Self {
        RbfSvm {
            params,
            model: None,
        }
    }

    pub fn n_support(&self) -> usize {
        self.model.as_ref().map_or(0, |m| m.support.len())
    }

    /// Signed distance-like score for one sample
    pub fn decision_value(&self, row: &SparseRow) -> Option<f64> {
        let model = self.model.as_ref()?;
        let norm = row.squared_norm();
        let sum: f64 = model
            .support
            .iter()
            .zip(&model.support_norms)
            .zip(&model.coef)
            .map(|((sv, &sv_norm), &coef)| coef * rbf(self.params.gamma, sv, sv_norm, row, norm))
            .sum();
        Some(sum - model.rho)
    }
}

impl Classifier for RbfSvm {
    fn name(&self) -> &'static str {
        "SVM-RBF"
    }

    fn fit(&mut self, features: &SparseMatrix, labels: &[bool]) -> Result<()> {
        check_training_set(features, labels)?;
        let positives = labels.iter().filter(|&&l| l).count();
        if positives == 0 || positives == labels.len() {
            return Err(EvalError::Classifier(format!(
                "SVM training set has a single class ({} positive of {})",
                positives,
                labels.len()
            )));
        }

        let n = labels.len();
        let max_iter = self
            .params
            .max_iter
            .unwrap_or_else(|| 10_000_000usize.max(n.saturating_mul(100)));

        let mut solver = Solver::new(features, labels, &self.params);
        let mut iter = 0;
        while let Some((i, j)) = solver.select_working_set(self.params.tolerance) {
            if iter >= max_iter {
                warn!("SVM solver reached max_iter={} before converging", max_iter);
                break;
            }
            solver.update_pair(i, j);
            iter += 1;
        }
        let rho = solver.rho();

        let mut support = Vec::new();
        let mut support_norms = Vec::new();
        let mut coef = Vec::new();
        for t in 0..n {
            if solver.alpha[t] > 0.0 {
                support.push(features.row(t).clone());
                support_norms.push(solver.cache.norms[t]);
                coef.push(solver.alpha[t] * solver.y[t]);
            }
        }

        debug!(
            "SMO finished: {} iterations, {} support vectors, {} kernel rows computed, rho={:.6}",
            iter,
            support.len(),
            solver.cache.misses,
            rho
        );

        self.model = Some(SvmModel {
            support,
            support_norms,
            coef,
            rho,
        });
        Ok(())
    }

    fn score(&self, features: &SparseMatrix) -> Result<Scored> {
        let scores = features
            .rows()
            .iter()
            .map(|r| self.decision_value(r))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| EvalError::Classifier("SVM is not fitted".to_string()))?;
        let predictions = scores.iter().map(|&s| s > 0.0).collect();
        Ok(Scored {
            predictions,
            scores,
        })
    }
}
