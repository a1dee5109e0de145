//! External detection baseline (antivirus verdicts per sample)
//!
//! The store maps a sample's content hash to a record whose `report` field
//! holds one verdict per detector. Records may carry other fields; they are
//! ignored. Verdicts are interpreted with JSON truthiness, so `false`, `null`,
//! `0`, `""`, `[]` and `{}` all mean "not detected".

use crate::error::{EvalError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

/// Per-sample verdict lookup used by the baseline merger
pub trait VerdictLookup {
    /// Detectors that flagged sample `id`, or None for an unknown sample
    fn detections(&self, id: &str) -> Option<&[String]>;
}

/// On-disk record; everything but `report` is ignored
#[derive(Debug, Deserialize)]
struct BaselineRecord {
    #[serde(default)]
    report: BTreeMap<String, Value>,
}

/// Serialization format of a baseline or result file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    MessagePack,
}

impl FileFormat {
    /// `.msgpack` and `.mp` are MessagePack, anything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("msgpack") || ext.eq_ignore_ascii_case("mp") => {
                FileFormat::MessagePack
            }
            _ => FileFormat::Json,
        }
    }
}

/// In-memory baseline: identifier -> detectors with a positive verdict
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineStore {
    detections: HashMap<String, Vec<String>>,
}

impl BaselineStore {
    /// Load a JSON or MessagePack store
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let records: HashMap<String, BaselineRecord> = match FileFormat::from_path(path) {
            FileFormat::Json => serde_json::from_slice(&bytes)
                .map_err(|e| EvalError::Serialization(format!("{}: {}", path.display(), e)))?,
            FileFormat::MessagePack => rmp_serde::from_slice(&bytes)
                .map_err(|e| EvalError::Serialization(format!("{}: {}", path.display(), e)))?,
        };
        let store = Self::from_records(records);
        info!(
            "Loaded baseline verdicts for {} samples from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parse a JSON store held in memory
    pub fn from_json_str(text: &str) -> Result<Self> {
        let records: HashMap<String, BaselineRecord> =
            serde_json::from_str(text).map_err(|e| EvalError::Serialization(e.to_string()))?;
        Ok(Self::from_records(records))
    }

    fn from_records(records: HashMap<String, BaselineRecord>) -> Self {
        let detections = records
            .into_iter()
            .map(|(id, record)| {
                let detectors = record
                    .report
                    .into_iter()
                    .filter(|(_, verdict)| is_truthy(verdict))
                    .map(|(name, _)| name)
                    .collect();
                (id.to_lowercase(), detectors)
            })
            .collect();
        BaselineStore { detections }
    }

    /// Insert (or replace) the positive detectors of one sample
    pub fn insert(&mut self, id: &str, detectors: impl IntoIterator<Item = impl Into<String>>) {
        let mut detectors: Vec<String> = detectors.into_iter().map(Into::into).collect();
        detectors.sort();
        self.detections.insert(id.to_lowercase(), detectors);
    }

    /// Number of known samples
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

impl VerdictLookup for BaselineStore {
    fn detections(&self, id: &str) -> Option<&[String]> {
        self.detections.get(id).map(Vec::as_slice)
    }
}

/// JSON truthiness of a verdict value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
