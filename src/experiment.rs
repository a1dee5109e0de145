//! Temporal evaluation experiment
//!
//! Drives `count` repetitions of the period sweep. Every period is trained,
//! scored, summarized into a [`StatVector`] and cross-referenced against the
//! detection baseline, strictly in chronological order. After the last run
//! the per-period statistics and the detector counts are averaged.
//!
//! ```text
//! Idle -> SweepingPeriods -> RunComplete -> Idle   (count times)
//! Idle -> AveragingRuns -> Done
//! ```

use crate::avstats::{self, baseline_contribution, AvStats};
use crate::baseline::VerdictLookup;
use crate::classifier::{AdapterOptions, ClassifierAdapter, ModelFactory};
use crate::config::ExperimentConfig;
use crate::error::{EvalError, Result};
use crate::metrics::{compute_stats, Evaluation, StatVector};
use crate::period::{Period, PeriodSource};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Where the experiment currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentPhase {
    Idle,
    /// Running repetition `run` (1-based)
    SweepingPeriods { run: usize },
    RunComplete { run: usize },
    AveragingRuns,
    Done,
}

/// One full sweep over all periods
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// One vector per period, chronological
    pub stats: Vec<StatVector>,
    /// Test start date per period
    pub start_dates: Vec<NaiveDate>,
    pub avstats: AvStats,
}

impl RunResult {
    /// All periods' statistics concatenated into one row
    pub fn row(&self) -> Vec<f64> {
        self.stats.iter().flat_map(StatVector::to_array).collect()
    }
}

/// Per-period statistics averaged over all runs
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedResult {
    pub stats: Vec<StatVector>,
    pub avstats: BTreeMap<String, f64>,
    pub key_dates: Vec<NaiveDate>,
}

impl AveragedResult {
    /// First and last period start date
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.key_dates.first()?, *self.key_dates.last()?))
    }

    /// Days spanned by the period start dates, both ends included
    pub fn total_days(&self) -> Option<i64> {
        self.date_range()
            .map(|(first, last)| (last - first).num_days() + 1)
    }

    /// Series of one statistic across periods, by canonical name
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        self.stats.iter().map(|s| s.get(name)).collect()
    }
}

/// All runs of an experiment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExperimentResult {
    pub runs: Vec<RunResult>,
}

impl ExperimentResult {
    /// Start dates of the first run
    pub fn key_dates(&self) -> &[NaiveDate] {
        self.runs.first().map_or(&[][..], |r| r.start_dates.as_slice())
    }

    pub fn average(&self) -> Result<AveragedResult> {
        average_runs(&self.runs)
    }
}

/// Average runs element-wise
///
/// Every run must cover the same periods with the same start dates. The
/// dates of the first run are carried over unchanged.
pub fn average_runs(runs: &[RunResult]) -> Result<AveragedResult> {
    let first = runs
        .first()
        .ok_or_else(|| EvalError::InvalidConfiguration("no runs to average".to_string()))?;
    let n_periods = first.stats.len();

    for (i, run) in runs.iter().enumerate() {
        if run.stats.len() != n_periods || run.start_dates.len() != n_periods {
            return Err(EvalError::InconsistentPeriodCount {
                run: i + 1,
                expected: n_periods,
                found: run.stats.len().min(run.start_dates.len()),
            });
        }
        if run.start_dates != first.start_dates {
            return Err(EvalError::InconsistentPeriodDates { run: i + 1 });
        }
    }

    let stats = (0..n_periods)
        .map(|p| {
            let column: Vec<StatVector> = runs.iter().map(|r| r.stats[p]).collect();
            StatVector::mean(&column).unwrap_or_default()
        })
        .collect();

    let counts: Vec<AvStats> = runs.iter().map(|r| r.avstats.clone()).collect();

    Ok(AveragedResult {
        stats,
        avstats: avstats::average(&counts),
        key_dates: first.start_dates.clone(),
    })
}

/// Everything a finished experiment produced
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    pub result: ExperimentResult,
    pub averaged: AveragedResult,
}

/// Per-period seed for run `run`, period `period` (both 1-based)
pub fn period_seed(base: Option<u64>, run: usize, period: usize) -> u64 {
    match base {
        Some(base) => {
            let mixed = base
                .wrapping_add((run as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
                .wrapping_add((period as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9));
            splitmix64(mixed)
        }
        None => rand::random(),
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Repeated temporal evaluation over a period source
pub struct Experiment<'a> {
    source: &'a dyn PeriodSource,
    adapter: ClassifierAdapter<'a>,
    baseline: &'a dyn VerdictLookup,
    count: usize,
    seed: Option<u64>,
    phase: ExperimentPhase,
}

impl<'a> Experiment<'a> {
    pub fn new(
        config: &ExperimentConfig,
        source: &'a dyn PeriodSource,
        factory: &'a dyn ModelFactory,
        baseline: &'a dyn VerdictLookup,
    ) -> Result<Self> {
        config.validate()?;
        if source.is_empty() {
            return Err(EvalError::InvalidConfiguration(
                "no periods to evaluate".to_string(),
            ));
        }
        let adapter = ClassifierAdapter::new(factory, AdapterOptions::from_config(config))?;
        Ok(Experiment {
            source,
            adapter,
            baseline,
            count: config.count,
            seed: config.seed,
            phase: ExperimentPhase::Idle,
        })
    }

    pub fn phase(&self) -> ExperimentPhase {
        self.phase
    }

    fn transition(&mut self, next: ExperimentPhase) {
        debug!("Experiment phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Run every repetition, then average
    pub fn run(&mut self) -> Result<ExperimentOutcome> {
        info!("Running {} experiments over {} periods", self.count, self.source.len());

        let mut runs = Vec::with_capacity(self.count);
        for run in 1..=self.count {
            info!("{:#^79}", format!(" Experiment {} ", run));
            runs.push(self.perform_run(run)?);
        }

        self.transition(ExperimentPhase::AveragingRuns);
        info!("Averaging results");
        let result = ExperimentResult { runs };
        let averaged = result.average()?;

        if let (Some((first, last)), Some(days)) = (averaged.date_range(), averaged.total_days()) {
            info!("Dates ranging from {} to {}", first, last);
            info!("Total days: {}", days);
        }
        self.transition(ExperimentPhase::Done);

        Ok(ExperimentOutcome { result, averaged })
    }

    /// One sweep over all periods in chronological order
    pub fn perform_run(&mut self, run: usize) -> Result<RunResult> {
        self.transition(ExperimentPhase::SweepingPeriods { run });

        let mut stats = Vec::with_capacity(self.source.len());
        let mut start_dates = Vec::with_capacity(self.source.len());
        let mut run_avstats = AvStats::new();

        for index in 0..self.source.len() {
            let period = self.source.load(index)?;
            info!(
                "Period {} [{} - {}]",
                period.index, period.bounds.start, period.bounds.end
            );
            start_dates.push(period.bounds.start);

            let (stat, contribution) = self.evaluate_period(run, period)?;
            stats.push(stat);
            run_avstats = run_avstats.merge(&contribution);
        }

        self.transition(ExperimentPhase::RunComplete { run });
        self.transition(ExperimentPhase::Idle);

        Ok(RunResult {
            stats,
            start_dates,
            avstats: run_avstats,
        })
    }

    fn evaluate_period(&self, run: usize, period: Period) -> Result<(StatVector, AvStats)> {
        let Period {
            index,
            train,
            test,
            test_ids,
            ..
        } = period;

        let seed = period_seed(self.seed, run, index);
        let out = self.adapter.train_and_score(train, test.features, seed)?;

        let stat = compute_stats(
            index,
            &Evaluation {
                train_labels: &out.train_labels,
                test_labels: &test.labels,
                predictions: &out.scored.predictions,
                scores: &out.scored.scores,
            },
        )?;
        let contribution =
            baseline_contribution(&test.labels, &out.scored.predictions, &test_ids, self.baseline)?;
        debug!(
            "Period {}: {} malicious, {} detected by classifier",
            index,
            contribution.total(),
            contribution.hidost()
        );

        Ok((stat, contribution))
    }
}
