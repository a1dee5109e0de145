// svmlight / libsvm feature file reader
//
// Format: `<label> <index>:<value> <index>:<value> ... # comment`
// Indices are 1-based. `qid:` tokens are accepted and ignored.

use super::matrix::{SparseMatrix, SparseRow};
use super::read_lines;
use crate::error::{EvalError, Result};
use std::path::Path;

/// Feature matrix with one label per row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledData {
    pub features: SparseMatrix,
    pub labels: Vec<f64>,
}

impl LabeledData {
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }
}

/// Read a feature file from disk
///
/// With `n_features` set, the matrix has exactly that many columns and any
/// feature index beyond it is ignored. Otherwise the width is the largest
/// index seen in the file.
pub fn read_svmlight(path: &Path, n_features: Option<usize>) -> Result<LabeledData> {
    let mut parser = SvmlightParser::new(path, n_features);
    read_lines(path, |line_no, line| parser.feed(line_no, line))?;
    Ok(parser.finish())
}

/// Parse feature file contents already held in memory
pub fn parse_svmlight(input: &str, n_features: Option<usize>) -> Result<LabeledData> {
    let mut parser = SvmlightParser::new(Path::new("<memory>"), n_features);
    for (i, line) in input.lines().enumerate() {
        parser.feed(i + 1, line)?;
    }
    Ok(parser.finish())
}

/// Read only the label column of a feature file
pub fn read_labels(path: &Path) -> Result<Vec<f64>> {
    let mut labels = Vec::new();
    read_lines(path, |line_no, line| {
        let body = strip_comment(line);
        if let Some(token) = body.split_whitespace().next() {
            labels.push(parse_label(path, line_no, token)?);
        }
        Ok(())
    })?;
    Ok(labels)
}

struct SvmlightParser<'a> {
    path: &'a Path,
    n_features: Option<usize>,
    max_col: usize,
    rows: Vec<SparseRow>,
    labels: Vec<f64>,
}

impl<'a> SvmlightParser<'a> {
    fn new(path: &'a Path, n_features: Option<usize>) -> Self {
        SvmlightParser {
            path,
            n_features,
            max_col: 0,
            rows: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn feed(&mut self, line_no: usize, line: &str) -> Result<()> {
        let body = strip_comment(line);
        let mut tokens = body.split_whitespace();
        let Some(label_token) = tokens.next() else {
            return Ok(());
        };
        let label = parse_label(self.path, line_no, label_token)?;

        let mut entries = Vec::new();
        for token in tokens {
            if token.starts_with("qid:") {
                continue;
            }
            let (index, value) = token.split_once(':').ok_or_else(|| {
                EvalError::parse(self.path, line_no, format!("expected index:value, got '{}'", token))
            })?;
            let index: u32 = index.parse().map_err(|_| {
                EvalError::parse(self.path, line_no, format!("invalid feature index '{}'", index))
            })?;
            if index == 0 {
                return Err(EvalError::parse(
                    self.path,
                    line_no,
                    "feature indices are 1-based, found index 0",
                ));
            }
            let value: f64 = value.parse().map_err(|_| {
                EvalError::parse(self.path, line_no, format!("invalid feature value '{}'", value))
            })?;
            if !value.is_finite() {
                return Err(EvalError::parse(
                    self.path,
                    line_no,
                    format!("non-finite feature value '{}'", value),
                ));
            }

            let col = index - 1;
            if let Some(n) = self.n_features {
                if col as usize >= n {
                    continue;
                }
            }
            self.max_col = self.max_col.max(index as usize);
            entries.push((col, value));
        }

        self.rows.push(SparseRow::new(entries));
        self.labels.push(label);
        Ok(())
    }

    fn finish(self) -> LabeledData {
        let n_cols = self.n_features.unwrap_or(self.max_col);
        LabeledData {
            features: SparseMatrix::from_rows(self.rows, n_cols),
            labels: self.labels,
        }
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_label(path: &Path, line_no: usize, token: &str) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(label) if label.is_finite() => Ok(label),
        _ => Err(EvalError::parse(
            path,
            line_no,
            format!("invalid label '{}'", token),
        )),
    }
}
