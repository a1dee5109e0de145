use anyhow::{Context, Result};
use clap::Parser;
use drifteval::baseline::BaselineStore;
use drifteval::classifier::ConfiguredFactory;
use drifteval::cli::{
    AvstatsArgs, Cli, Command, CompareArgs, FeatureDriftArgs, PartitionArgs, RunArgs,
};
use drifteval::experiment::Experiment;
use drifteval::period::FilePeriodSource;
use drifteval::reports::{
    feature_drift, partition_dataset, read_feature_names, AvRates, ExperimentSummary,
    MethodComparison, MethodResult,
};
use drifteval::results::ResultBundle;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber (info by default, trace with --debug)
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: RunArgs) -> Result<()> {
    let config = args.to_config().context("Invalid experiment configuration")?;
    let source = FilePeriodSource::new(&args.train, &args.test)?;

    info!("Loading antivirus detection data");
    let baseline = BaselineStore::load(&args.avstats)
        .with_context(|| format!("Failed to load detection store {}", args.avstats.display()))?;

    let factory = ConfiguredFactory::new(config.clone());
    info!("Classifier: {}", factory.kind());
    let mut experiment = Experiment::new(&config, &source, &factory, &baseline)?;
    let outcome = experiment.run()?;

    if let Some(path) = &args.res_out {
        ResultBundle::from_result(&outcome.result)
            .save(path)
            .with_context(|| format!("Failed to save results to {}", path.display()))?;
    }

    print!("{}", ExperimentSummary(&outcome.averaged));
    Ok(())
}

fn compare(args: CompareArgs) -> Result<()> {
    if args.res.len() != args.methods.len() {
        anyhow::bail!(
            "There must be an equal number of result files and method names ({} vs {})",
            args.res.len(),
            args.methods.len()
        );
    }
    let methods = args
        .res
        .iter()
        .zip(&args.methods)
        .map(|(path, name)| {
            MethodResult::load(name, path)
                .with_context(|| format!("Failed to load results {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let comparison = MethodComparison::new(methods, args.metrics)?;
    print!("{}", comparison);
    Ok(())
}

fn avstats(args: AvstatsArgs) -> Result<()> {
    let bundle = ResultBundle::load(&args.res)
        .with_context(|| format!("Failed to load results {}", args.res.display()))?;
    let averaged = bundle.average()?;
    print!("{}", AvRates::new(&averaged.avstats)?);
    Ok(())
}

fn partition(args: PartitionArgs) -> Result<()> {
    let report = partition_dataset(&args.train, &args.test)?;
    print!("{}", report);
    Ok(())
}

fn drift(args: FeatureDriftArgs) -> Result<()> {
    let lists = args
        .features
        .iter()
        .map(|path| {
            read_feature_names(path)
                .with_context(|| format!("Failed to read feature file {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    print!("{}", feature_drift(&args.method, &lists));
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Command::Run(args) => run(args),
        Command::Compare(args) => compare(args),
        Command::Avstats(args) => avstats(args),
        Command::Partition(args) => partition(args),
        Command::FeatureDrift(args) => drift(args),
    }
}
