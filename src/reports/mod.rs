// Text reports over experiment inputs and outputs
//
// - comparison: per-period metric table for several methods (result bundles)
// - rates: detector detection rates relative to the malicious total
// - partition: per-period class counts of the train/test files
// - drift: feature set changes between consecutive periods
// - summary: averaged statistics of a single experiment
//
// Reports implement Display; the CLI prints them to stdout.

mod comparison;
mod drift;
mod partition;
mod rates;
mod summary;

pub use comparison::{metric_label, MethodComparison, MethodResult};
pub use drift::{feature_drift, read_feature_names, DriftRow, FeatureDrift};
pub use partition::{partition_dataset, PartitionReport, PeriodCounts};
pub use rates::{AvRates, DetectorRate};
pub use summary::ExperimentSummary;

use chrono::NaiveDate;
use std::fmt;

/// Trailing "Dates ranging from ... / Total days: ..." lines
pub(crate) fn write_date_span(f: &mut fmt::Formatter<'_>, dates: &[NaiveDate]) -> fmt::Result {
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        writeln!(f, "Dates ranging from {} to {}", first, last)?;
        writeln!(f, "Total days: {}", (*last - *first).num_days() + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests;
