use crate::avstats::TOTAL_KEY;
use crate::error::{EvalError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Detections of one detector relative to the malicious total
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorRate {
    pub name: String,
    pub detections: f64,
    pub rate: f64,
}

/// Detector detection rates, highest first
#[derive(Debug, Clone, PartialEq)]
pub struct AvRates {
    pub total: f64,
    pub rates: Vec<DetectorRate>,
}

impl AvRates {
    /// Rates from averaged detector counts; `Total` must be positive
    pub fn new(avstats: &BTreeMap<String, f64>) -> Result<Self> {
        let total = avstats.get(TOTAL_KEY).copied().unwrap_or(0.0);
        if total <= 0.0 {
            return Err(EvalError::InvalidBundle(
                "detector counts have no malicious samples (Total is 0)".to_string(),
            ));
        }

        let mut rates: Vec<DetectorRate> = avstats
            .iter()
            .map(|(name, &detections)| DetectorRate {
                name: name.clone(),
                detections,
                rate: detections / total,
            })
            .collect();
        rates.sort_by(|a, b| {
            b.detections
                .total_cmp(&a.detections)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(AvRates { total, rates })
    }

    pub fn rate(&self, name: &str) -> Option<f64> {
        self.rates.iter().find(|r| r.name == name).map(|r| r.rate)
    }
}

impl fmt::Display for AvRates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} {:>12} {:>8}", "detector", "detections", "rate")?;
        writeln!(f, "{} {} {}", "-".repeat(24), "-".repeat(12), "-".repeat(8))?;
        for r in &self.rates {
            writeln!(
                f,
                "{:<24} {:>12.2} {:>7.2}%",
                r.name,
                r.detections,
                100.0 * r.rate
            )?;
        }
        Ok(())
    }
}
