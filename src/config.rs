// Experiment configuration
//
// Defaults reproduce the published drift experiment: a 200-tree random forest
// or an RBF SVM with gamma = 0.0025 and C = 12, evaluated once per period.
// A TOML file can override any field; CLI flags override the file.

use crate::error::{EvalError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Classifier variant trained for every period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Random forest (probability-of-malicious scores)
    #[default]
    #[value(name = "rf", alias = "RF")]
    #[serde(alias = "RF")]
    Rf,
    /// SVM with RBF kernel (signed decision values)
    #[value(name = "svm", alias = "SVM")]
    #[serde(alias = "SVM")]
    Svm,
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierKind::Rf => write!(f, "RandomForest"),
            ClassifierKind::Svm => write!(f, "SVM-RBF"),
        }
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees in the ensemble
    pub n_trees: usize,

    /// Candidate features per split (None = sqrt of the feature count)
    pub max_features: Option<usize>,

    /// Minimum samples a node needs to be split
    pub min_samples_split: usize,

    /// Depth limit (None = grow until leaves are pure)
    pub max_depth: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_features: None,
            min_samples_split: 2,
            max_depth: None,
        }
    }
}

/// RBF-kernel SVM hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmParams {
    /// Kernel width: K(x, y) = exp(-gamma * |x - y|^2)
    pub gamma: f64,

    /// Soft-margin penalty
    pub c: f64,

    /// Stopping tolerance on the maximal KKT violation
    pub tolerance: f64,

    /// Iteration cap (None = max(10^7, 100 * n_samples))
    pub max_iter: Option<usize>,

    /// Kernel rows kept in the solver cache
    pub cache_rows: usize,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            gamma: 0.0025,
            c: 12.0,
            tolerance: 1e-3,
            max_iter: None,
            cache_rows: 1024,
        }
    }
}

/// Full configuration of a temporal evaluation experiment
///
/// # Example
/// ```
/// use drifteval::config::ExperimentConfig;
///
/// let config = ExperimentConfig::default();
/// assert_eq!(config.count, 1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// How many times the whole period sweep is repeated
    pub count: usize,

    pub classifier: ClassifierKind,

    /// Coerce every nonzero feature value to 1 (train and test alike)
    pub binarize: bool,

    /// Bootstrap fraction of the training set, in (0, 1]
    ///
    /// Rows are drawn with replacement. Subsampling forces single-threaded
    /// fitting.
    pub subsample: Option<f64>,

    /// Worker threads for forest fitting (0 = all available cores)
    pub n_jobs: usize,

    /// Base seed; None draws fresh entropy for every run
    pub seed: Option<u64>,

    pub forest: ForestParams,

    pub svm: SvmParams,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            count: 1,
            classifier: ClassifierKind::Rf,
            binarize: false,
            subsample: None,
            n_jobs: 0,
            seed: None,
            forest: ForestParams::default(),
            svm: SvmParams::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load a configuration from a TOML file (missing fields take defaults)
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| EvalError::InvalidConfiguration(e.to_string()))
    }

    /// Thread count actually used for fitting
    pub fn effective_jobs(&self) -> usize {
        if self.subsample.is_some() {
            return 1;
        }
        match self.n_jobs {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(EvalError::InvalidConfiguration(
                "count must be at least 1".to_string(),
            ));
        }

        if let Some(f) = self.subsample {
            validate_subsample(f)?;
        }

        if self.forest.n_trees == 0 {
            return Err(EvalError::InvalidConfiguration(
                "forest.n_trees must be at least 1".to_string(),
            ));
        }

        if self.forest.min_samples_split < 2 {
            return Err(EvalError::InvalidConfiguration(format!(
                "forest.min_samples_split must be >= 2, got {}",
                self.forest.min_samples_split
            )));
        }

        if self.forest.max_features == Some(0) {
            return Err(EvalError::InvalidConfiguration(
                "forest.max_features must be at least 1".to_string(),
            ));
        }

        if !(self.svm.gamma > 0.0 && self.svm.gamma.is_finite()) {
            return Err(EvalError::InvalidConfiguration(format!(
                "svm.gamma must be positive, got {}",
                self.svm.gamma
            )));
        }

        if !(self.svm.c > 0.0 && self.svm.c.is_finite()) {
            return Err(EvalError::InvalidConfiguration(format!(
                "svm.c must be positive, got {}",
                self.svm.c
            )));
        }

        if !(self.svm.tolerance > 0.0 && self.svm.tolerance.is_finite()) {
            return Err(EvalError::InvalidConfiguration(format!(
                "svm.tolerance must be positive, got {}",
                self.svm.tolerance
            )));
        }

        Ok(())
    }
}

/// Subsampling fraction must lie in (0, 1]
pub fn validate_subsample(fraction: f64) -> Result<()> {
    if fraction > 0.0 && fraction <= 1.0 {
        Ok(())
    } else {
        Err(EvalError::InvalidConfiguration(format!(
            "subsample fraction must be in (0, 1], got {}",
            fraction
        )))
    }
}
