//! Temporal periods: one train/test split each
//!
//! A period's test split covers the time window right after its training
//! data. Periods are always handed out in chronological order of their test
//! start dates, which the downstream time series relies on.

use crate::dataset::{read_svmlight, scan_date_range, scan_identifiers, LabeledData};
use crate::error::{EvalError, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Time window covered by a period's test split
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PeriodBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One fully loaded train/test split
#[derive(Debug, Clone)]
pub struct Period {
    /// 1-based position in the chronological sweep
    pub index: usize,
    pub bounds: PeriodBounds,
    pub train: LabeledData,
    /// Test split, always as wide as `train`
    pub test: LabeledData,
    /// Content hash per test sample (None when the file carries none)
    pub test_ids: Vec<Option<String>>,
}

impl Period {
    /// Assemble a period, reconciling the test width with the training width
    ///
    /// `test_ids` must either be empty (no identifiers known) or align with
    /// the test rows one-to-one.
    pub fn new(
        index: usize,
        bounds: PeriodBounds,
        train: LabeledData,
        mut test: LabeledData,
        test_ids: Vec<String>,
    ) -> Result<Self> {
        check_len("training labels", train.features.n_rows(), train.labels.len())?;
        check_len("test labels", test.features.n_rows(), test.labels.len())?;

        let n_features = train.features.n_cols();
        test.features = std::mem::take(&mut test.features).with_n_cols(n_features);

        let n_test = test.n_samples();
        let test_ids = if test_ids.is_empty() {
            vec![None; n_test]
        } else {
            check_len("test identifiers", n_test, test_ids.len())?;
            test_ids.into_iter().map(Some).collect()
        };

        Ok(Period {
            index,
            bounds,
            train,
            test,
            test_ids,
        })
    }

    pub fn n_features(&self) -> usize {
        self.train.features.n_cols()
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(EvalError::LengthMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

/// Loader contract for the period sweep
pub trait PeriodSource {
    /// Number of periods
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Test window of the period at 0-based position `index`
    fn bounds(&self, index: usize) -> PeriodBounds;

    /// Load the period at 0-based position `index`
    fn load(&self, index: usize) -> Result<Period>;

    /// Start dates of all periods, in sweep order
    fn start_dates(&self) -> Vec<NaiveDate> {
        (0..self.len()).map(|i| self.bounds(i).start).collect()
    }
}

#[derive(Debug, Clone)]
struct PeriodFiles {
    train: PathBuf,
    test: PathBuf,
    bounds: PeriodBounds,
}

/// Periods backed by paired training/test feature files
#[derive(Debug, Clone)]
pub struct FilePeriodSource {
    pairs: Vec<PeriodFiles>,
}

impl FilePeriodSource {
    /// Pair training and test files and order the pairs chronologically
    ///
    /// Every test file is scanned for dates up front so that unusable input
    /// is reported before any model is trained.
    pub fn new(train_files: &[PathBuf], test_files: &[PathBuf]) -> Result<Self> {
        if train_files.len() != test_files.len() {
            return Err(EvalError::InvalidConfiguration(format!(
                "There must be an equal number of training and test files ({} vs {})",
                train_files.len(),
                test_files.len()
            )));
        }
        if train_files.is_empty() {
            return Err(EvalError::InvalidConfiguration(
                "At least one training/test file pair is required".to_string(),
            ));
        }

        let mut pairs = Vec::with_capacity(train_files.len());
        for (train, test) in train_files.iter().zip(test_files) {
            let bounds = test_bounds(test)?;
            pairs.push(PeriodFiles {
                train: train.clone(),
                test: test.clone(),
                bounds,
            });
        }

        let already_sorted = pairs.windows(2).all(|w| w[0].bounds.start <= w[1].bounds.start);
        if !already_sorted {
            warn!("Test files are not in chronological order; reordering periods by start date");
            pairs.sort_by_key(|p| p.bounds.start);
        }

        for (i, p) in pairs.iter().enumerate() {
            info!(
                "Period {} [{} - {}]: train={} test={}",
                i + 1,
                p.bounds.start,
                p.bounds.end,
                p.train.display(),
                p.test.display()
            );
        }

        Ok(FilePeriodSource { pairs })
    }
}

fn test_bounds(test: &Path) -> Result<PeriodBounds> {
    match scan_date_range(test)? {
        Some((start, end)) => Ok(PeriodBounds { start, end }),
        None => Err(EvalError::InvalidConfiguration(format!(
            "Test file {} contains no YYYY/MM/DD sample dates",
            test.display()
        ))),
    }
}

impl PeriodSource for FilePeriodSource {
    fn len(&self) -> usize {
        self.pairs.len()
    }

    fn bounds(&self, index: usize) -> PeriodBounds {
        self.pairs[index].bounds
    }

    fn load(&self, index: usize) -> Result<Period> {
        let files = &self.pairs[index];

        let train = read_svmlight(&files.train, None)?;
        let (n_train, n_features) = train.features.shape();
        info!("Training set size: ({}, {})", n_train, n_features);

        let test = read_svmlight(&files.test, Some(n_features))?;
        info!("Test set size: {:?}", test.features.shape());

        let ids = scan_identifiers(&files.test)?;
        if ids.is_empty() {
            warn!(
                "No sample identifiers in {}; baseline verdicts unavailable for this period",
                files.test.display()
            );
        }

        Period::new(index + 1, files.bounds, train, test, ids)
    }
}

/// Periods held in memory (cloned out on every load)
#[derive(Debug, Clone, Default)]
pub struct InMemoryPeriodSource {
    periods: Vec<Period>,
}

impl InMemoryPeriodSource {
    /// Order the periods chronologically and renumber them
    pub fn new(mut periods: Vec<Period>) -> Self {
        periods.sort_by_key(|p| p.bounds.start);
        for (i, p) in periods.iter_mut().enumerate() {
            p.index = i + 1;
        }
        InMemoryPeriodSource { periods }
    }
}

impl PeriodSource for InMemoryPeriodSource {
    fn len(&self) -> usize {
        self.periods.len()
    }

    fn bounds(&self, index: usize) -> PeriodBounds {
        self.periods[index].bounds
    }

    fn load(&self, index: usize) -> Result<Period> {
        Ok(self.periods[index].clone())
    }
}
