//! CLI argument parsing for drifteval

use crate::config::{ClassifierKind, ExperimentConfig};
use crate::error::Result;
use crate::metrics::STAT_NAMES;
use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "drifteval")]
#[command(version)]
#[command(
    about = "Temporal drift evaluation of malware classifiers against antivirus baselines",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose debug output (trace level)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Train and evaluate a classifier over consecutive time periods
    Run(RunArgs),
    /// Compare averaged per-period metrics of several result bundles
    Compare(CompareArgs),
    /// Detector detection rates stored in a result bundle
    Avstats(AvstatsArgs),
    /// Per-period class counts of the train/test files
    Partition(PartitionArgs),
    /// Feature set changes between consecutive periods
    FeatureDrift(FeatureDriftArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Training data file(s), one per period
    #[arg(long, num_args = 1.., required = true, value_name = "FILE")]
    pub train: Vec<PathBuf>,

    /// Test data file(s), paired with --train
    #[arg(long, num_args = 1.., required = true, value_name = "FILE")]
    pub test: Vec<PathBuf>,

    /// How many times to perform the experiment
    #[arg(short = 'c', long = "count", value_name = "N")]
    pub count: Option<usize>,

    /// Antivirus detection store (JSON, or MessagePack for .msgpack/.mp)
    #[arg(short = 's', long = "avstats", value_name = "STORE")]
    pub avstats: PathBuf,

    /// Use binary features
    #[arg(long)]
    pub binarize: bool,

    /// Classifier (rf or svm)
    #[arg(long, value_enum)]
    pub classifier: Option<ClassifierKind>,

    /// Training set subsampling fraction in (0, 1]
    #[arg(long, value_name = "FRACTION")]
    pub subsample: Option<f64>,

    /// Where to save all results/statistics
    #[arg(long = "res-out", value_name = "PATH")]
    pub res_out: Option<PathBuf>,

    /// TOML experiment configuration (flags take precedence)
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Base seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads for forest fitting (0 = all cores)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,
}

impl RunArgs {
    /// Configuration file (or defaults) with the flags applied on top
    pub fn to_config(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_toml_file(path)?,
            None => ExperimentConfig::default(),
        };
        if let Some(count) = self.count {
            config.count = count;
        }
        if self.binarize {
            config.binarize = true;
        }
        if let Some(kind) = self.classifier {
            config.classifier = kind;
        }
        if self.subsample.is_some() {
            config.subsample = self.subsample;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(jobs) = self.jobs {
            config.n_jobs = jobs;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Result files of all methods
    #[arg(long, num_args = 1.., required = true, value_name = "FILE")]
    pub res: Vec<PathBuf>,

    /// Names of all methods, in the same order as result files
    #[arg(long, num_args = 1.., required = true, value_name = "NAME")]
    pub methods: Vec<String>,

    /// Which metrics to compare on
    #[arg(
        long,
        num_args = 1..,
        required = true,
        value_parser = PossibleValuesParser::new(STAT_NAMES)
    )]
    pub metrics: Vec<String>,
}

#[derive(Args, Debug)]
pub struct AvstatsArgs {
    /// Result file produced by `run --res-out`
    #[arg(long, value_name = "FILE")]
    pub res: PathBuf,
}

#[derive(Args, Debug)]
pub struct PartitionArgs {
    /// Training data file(s)
    #[arg(long, num_args = 1.., required = true, value_name = "FILE")]
    pub train: Vec<PathBuf>,

    /// Test data file(s)
    #[arg(long, num_args = 1.., required = true, value_name = "FILE")]
    pub test: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FeatureDriftArgs {
    /// Feature name files of consecutive periods (one name per line)
    #[arg(long, num_args = 2.., required = true, value_name = "FILE")]
    pub features: Vec<PathBuf>,

    /// Method name shown in the report header
    #[arg(long, default_value = "features")]
    pub method: String,
}
