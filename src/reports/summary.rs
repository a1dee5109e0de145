use super::write_date_span;
use crate::experiment::AveragedResult;
use crate::metrics::STAT_NAMES;
use std::fmt;

/// Averaged per-period statistics of one experiment
pub struct ExperimentSummary<'a>(pub &'a AveragedResult);

impl fmt::Display for ExperimentSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        write!(f, "{:<6} {:<10}", "Period", "Date")?;
        for name in STAT_NAMES {
            write!(f, " {:>9}", name)?;
        }
        writeln!(f)?;

        for (p, (stat, date)) in result.stats.iter().zip(&result.key_dates).enumerate() {
            write!(f, "{:<6} {:<10}", p + 1, date.to_string())?;
            let values = stat.to_array();
            // class counts are averages of integers, rates are fractions
            for v in &values[..4] {
                write!(f, " {:>9.1}", v)?;
            }
            for v in &values[4..] {
                write!(f, " {:>9.4}", v)?;
            }
            writeln!(f)?;
        }

        if !result.avstats.is_empty() {
            writeln!(f)?;
            writeln!(f, "{:<24} {:>12}", "detector", "detections")?;
            for (name, count) in &result.avstats {
                writeln!(f, "{:<24} {:>12.2}", name, count)?;
            }
        }
        writeln!(f)?;
        write_date_span(f, &result.key_dates)
    }
}
