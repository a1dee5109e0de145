//! drifteval - temporal drift evaluation of malware classifiers
//!
//! Trains a classifier on consecutive time periods of a labeled sparse
//! dataset, evaluates each model on the following period, and compares the
//! detections with an external antivirus baseline. Sweeps can be repeated and
//! averaged, and results are persisted for later comparison.

pub mod avstats;
pub mod baseline;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod metrics;
pub mod period;
pub mod reports;
pub mod results;

pub use error::{EvalError, Result};
