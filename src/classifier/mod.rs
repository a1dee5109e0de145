//! Classifier adapter: fit one model per period and score its test split
//!
//! Two model families are available behind the [`Classifier`] trait:
//!
//! - [`RandomForest`]: bagged CART trees, scores are the mean positive-leaf
//!   fraction (probability of malicious)
//! - [`RbfSvm`]: soft-margin SVM with an RBF kernel trained by SMO, scores are
//!   signed decision values
//!
//! Both scores grow with the likelihood of the positive class, so either is a
//! valid input for ROC analysis.

mod forest;
mod svm;

pub use forest::RandomForest;
pub use svm::RbfSvm;

use crate::config::{validate_subsample, ClassifierKind, ExperimentConfig};
use crate::dataset::{is_positive, LabeledData, SparseMatrix};
use crate::error::{EvalError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Predicted labels and continuous scores for a test split
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    /// Predicted malicious (true) or benign (false), one per test row
    pub predictions: Vec<bool>,
    /// Decision score per test row, larger means more likely malicious
    pub scores: Vec<f64>,
}

/// A binary classifier over sparse feature rows
pub trait Classifier: Send {
    /// Short model name for logs
    fn name(&self) -> &'static str;

    /// Fit on `features` with `labels` (true = malicious)
    fn fit(&mut self, features: &SparseMatrix, labels: &[bool]) -> Result<()>;

    /// Predict and score every row of `features`
    fn score(&self, features: &SparseMatrix) -> Result<Scored>;
}

/// Per-period fitting context handed to a [`ModelFactory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitContext {
    /// Seed for every random choice the model makes
    pub seed: u64,
    /// Worker threads the model may use while fitting
    pub n_jobs: usize,
}

/// Builds a fresh, unfitted model for each period
pub trait ModelFactory {
    fn build(&self, ctx: FitContext) -> Box<dyn Classifier>;
}

impl<F> ModelFactory for F
where
    F: Fn(FitContext) -> Box<dyn Classifier>,
{
    fn build(&self, ctx: FitContext) -> Box<dyn Classifier> {
        self(ctx)
    }
}

/// Model factory driven by the experiment configuration
#[derive(Debug, Clone)]
pub struct ConfiguredFactory {
    config: ExperimentConfig,
}

impl ConfiguredFactory {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    pub fn kind(&self) -> ClassifierKind {
        self.config.classifier
    }
}

impl ModelFactory for ConfiguredFactory {
    fn build(&self, ctx: FitContext) -> Box<dyn Classifier> {
        match self.config.classifier {
            ClassifierKind::Rf => Box::new(RandomForest::new(
                self.config.forest.clone(),
                ctx.seed,
                ctx.n_jobs,
            )),
            ClassifierKind::Svm => Box::new(RbfSvm::new(self.config.svm.clone())),
        }
    }
}

/// Preprocessing applied around every fit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdapterOptions {
    pub binarize: bool,
    /// Bootstrap fraction in (0, 1]; None trains on the full split
    pub subsample: Option<f64>,
    /// Fitting threads when not subsampling
    pub n_jobs: usize,
}

impl AdapterOptions {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            binarize: config.binarize,
            subsample: config.subsample,
            n_jobs: config.effective_jobs(),
        }
    }
}

/// Outcome of one fit-and-score pass
#[derive(Debug, Clone)]
pub struct AdapterOutput {
    /// Labels the model was actually trained on (after subsampling)
    pub train_labels: Vec<f64>,
    pub scored: Scored,
}

/// Trains a model on one period's training split and scores its test split
pub struct ClassifierAdapter<'a> {
    factory: &'a dyn ModelFactory,
    options: AdapterOptions,
}

impl<'a> ClassifierAdapter<'a> {
    pub fn new(factory: &'a dyn ModelFactory, options: AdapterOptions) -> Result<Self> {
        if let Some(f) = options.subsample {
            validate_subsample(f)?;
        }
        Ok(Self { factory, options })
    }

    /// Fit on `train`, then score `test`
    ///
    /// Both splits are consumed: the training matrix is released as soon as
    /// the model is fitted, the test matrix once it is scored.
    pub fn train_and_score(
        &self,
        train: LabeledData,
        test: SparseMatrix,
        seed: u64,
    ) -> Result<AdapterOutput> {
        let mut rng = StdRng::seed_from_u64(seed);

        let LabeledData {
            features: mut x_train,
            labels: mut y_train,
        } = train;

        if let Some(fraction) = self.options.subsample {
            validate_subsample(fraction)?;
            let n = x_train.n_rows();
            let new_size = (n as f64 * fraction).round() as usize;
            let picks: Vec<usize> = if n == 0 {
                Vec::new()
            } else {
                (0..new_size).map(|_| rng.gen_range(0..n)).collect()
            };
            debug!("Subsampling training set: {} of {} rows (with replacement)", new_size, n);
            x_train = x_train.select_rows(&picks);
            y_train = picks.iter().map(|&i| y_train[i]).collect();
        }

        if self.options.binarize {
            x_train.binarize();
        }

        let n_jobs = if self.options.subsample.is_some() {
            1
        } else {
            self.options.n_jobs.max(1)
        };
        let ctx = FitContext {
            seed: rng.gen(),
            n_jobs,
        };
        let mut model = self.factory.build(ctx);

        let targets: Vec<bool> = y_train.iter().map(|&y| is_positive(y)).collect();
        info!(
            "Training {} on {:?} (nnz={}, jobs={})",
            model.name(),
            x_train.shape(),
            x_train.nnz(),
            n_jobs
        );
        model.fit(&x_train, &targets)?;
        let n_features = x_train.n_cols();
        drop(x_train);

        let mut x_test = test.with_n_cols(n_features);
        if self.options.binarize {
            x_test.binarize();
        }
        let scored = model.score(&x_test)?;

        let n_test = x_test.n_rows();
        for (what, found) in [
            ("predictions", scored.predictions.len()),
            ("scores", scored.scores.len()),
        ] {
            if found != n_test {
                return Err(EvalError::LengthMismatch {
                    what,
                    expected: n_test,
                    found,
                });
            }
        }

        Ok(AdapterOutput {
            train_labels: y_train,
            scored,
        })
    }
}

/// Training rows must be non-empty and aligned with their labels
pub(crate) fn check_training_set(features: &SparseMatrix, labels: &[bool]) -> Result<()> {
    if features.n_rows() != labels.len() {
        return Err(EvalError::LengthMismatch {
            what: "training labels",
            expected: features.n_rows(),
            found: labels.len(),
        });
    }
    if labels.is_empty() {
        return Err(EvalError::Classifier("training set is empty".to_string()));
    }
    Ok(())
}
