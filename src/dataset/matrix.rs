// Row-oriented sparse feature matrix
//
// Feature files are extremely sparse (structural path features), so rows keep
// only their nonzero entries with strictly increasing column indices.

/// One sample's nonzero features, sorted by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseRow {
    indices: Vec<u32>,
    values: Vec<f64>,
}

impl SparseRow {
    /// Build a row from `(column, value)` pairs in any order
    ///
    /// Zero values are dropped. For duplicated columns the last value wins,
    /// matching how a feature file line is read left to right.
    pub fn new(mut entries: Vec<(u32, f64)>) -> Self {
        // Stable sort keeps duplicates in input order so the last one survives
        entries.sort_by_key(|&(col, _)| col);

        let mut indices: Vec<u32> = Vec::with_capacity(entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(entries.len());
        for (col, value) in entries {
            if indices.last() == Some(&col) {
                if let Some(last) = values.last_mut() {
                    *last = value;
                }
            } else {
                indices.push(col);
                values.push(value);
            }
        }

        let mut row = SparseRow { indices, values };
        row.drop_zeros();
        row
    }

    /// Build a row from a dense slice
    pub fn from_dense(values: &[f64]) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i as u32, v))
            .collect();
        SparseRow::new(entries)
    }

    /// Value at `col` (zero when not stored)
    pub fn get(&self, col: usize) -> f64 {
        match self.indices.binary_search(&(col as u32)) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate over stored `(column, value)` entries
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .zip(self.values.iter())
            .map(|(&c, &v)| (c as usize, v))
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Sparse dot product (merge of two sorted index lists)
    pub fn dot(&self, other: &SparseRow) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Drop every entry at or beyond `n_cols`
    fn truncate(&mut self, n_cols: usize) {
        let keep = self.indices.partition_point(|&c| (c as usize) < n_cols);
        self.indices.truncate(keep);
        self.values.truncate(keep);
    }

    fn binarize(&mut self) {
        for v in &mut self.values {
            *v = 1.0;
        }
    }

    fn drop_zeros(&mut self) {
        if self.values.iter().all(|&v| v != 0.0) {
            return;
        }
        let (indices, values) = self
            .indices
            .iter()
            .zip(self.values.iter())
            .filter(|(_, &v)| v != 0.0)
            .map(|(&c, &v)| (c, v))
            .unzip();
        self.indices = indices;
        self.values = values;
    }
}

/// Sparse matrix with an explicit column count
///
/// The column count is part of the matrix identity: a test matrix is always
/// reinterpreted with the training matrix's column count before scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseMatrix {
    rows: Vec<SparseRow>,
    n_cols: usize,
}

impl SparseMatrix {
    /// Empty matrix with `n_cols` columns
    pub fn new(n_cols: usize) -> Self {
        SparseMatrix {
            rows: Vec::new(),
            n_cols,
        }
    }

    /// Build from rows, truncating any entry beyond `n_cols`
    pub fn from_rows(rows: Vec<SparseRow>, n_cols: usize) -> Self {
        let mut matrix = SparseMatrix { rows, n_cols };
        for row in &mut matrix.rows {
            row.truncate(n_cols);
        }
        matrix
    }

    /// Build from dense rows (all rows must share one width)
    pub fn from_dense(rows: &[Vec<f64>]) -> Self {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let rows = rows.iter().map(|r| SparseRow::from_dense(r)).collect();
        SparseMatrix::from_rows(rows, n_cols)
    }

    pub fn push_row(&mut self, mut row: SparseRow) {
        row.truncate(self.n_cols);
        self.rows.push(row);
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// `(n_rows, n_cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.n_cols)
    }

    pub fn row(&self, i: usize) -> &SparseRow {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }

    /// Total stored entries
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(SparseRow::nnz).sum()
    }

    /// Reinterpret with exactly `n_cols` columns
    ///
    /// Entries beyond the new width are dropped; a wider matrix is implicitly
    /// zero-padded since absent entries already read as zero.
    pub fn with_n_cols(mut self, n_cols: usize) -> Self {
        if n_cols < self.n_cols {
            for row in &mut self.rows {
                row.truncate(n_cols);
            }
        }
        self.n_cols = n_cols;
        self
    }

    /// Coerce every stored (nonzero) value to 1
    pub fn binarize(&mut self) {
        for row in &mut self.rows {
            row.binarize();
        }
    }

    /// New matrix made of the given rows (indices may repeat)
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        SparseMatrix {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            n_cols: self.n_cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_sorts_and_drops_zeros() {
        let row = SparseRow::new(vec![(5, 2.0), (1, 0.0), (3, 1.5)]);
        let entries: Vec<_> = row.iter().collect();
        assert_eq!(entries, vec![(3, 1.5), (5, 2.0)]);
        assert_eq!(row.nnz(), 2);
    }

    #[test]
    fn test_row_duplicate_column_last_wins() {
        let row = SparseRow::new(vec![(2, 1.0), (2, 7.0)]);
        assert_eq!(row.get(2), 7.0);
        assert_eq!(row.nnz(), 1);
    }

    #[test]
    fn test_row_get_missing_is_zero() {
        let row = SparseRow::new(vec![(4, 3.0)]);
        assert_eq!(row.get(0), 0.0);
        assert_eq!(row.get(4), 3.0);
        assert_eq!(row.get(1000), 0.0);
    }

    #[test]
    fn test_row_dot_and_norm() {
        let a = SparseRow::from_dense(&[1.0, 0.0, 2.0, 3.0]);
        let b = SparseRow::from_dense(&[0.0, 5.0, 4.0, 1.0]);
        assert_eq!(a.dot(&b), 11.0);
        assert_eq!(a.squared_norm(), 14.0);
    }

    #[test]
    fn test_with_n_cols_truncates_extra_features() {
        let m = SparseMatrix::from_dense(&[vec![1.0, 0.0, 0.0, 4.0], vec![0.0, 2.0, 3.0, 0.0]]);
        let m = m.with_n_cols(2);
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.row(0).nnz(), 1);
        assert_eq!(m.row(1).get(1), 2.0);
        assert_eq!(m.row(1).get(2), 0.0);
    }

    #[test]
    fn test_with_n_cols_pads_narrow_matrix() {
        let m = SparseMatrix::from_dense(&[vec![1.0, 2.0]]).with_n_cols(10);
        assert_eq!(m.n_cols(), 10);
        assert_eq!(m.row(0).get(9), 0.0);
        assert_eq!(m.nnz(), 2);
    }

    #[test]
    fn test_binarize_sets_nonzero_to_one() {
        let mut m = SparseMatrix::from_dense(&[vec![0.0, 3.5, -2.0]]);
        m.binarize();
        assert_eq!(m.row(0).get(0), 0.0);
        assert_eq!(m.row(0).get(1), 1.0);
        assert_eq!(m.row(0).get(2), 1.0);
    }

    #[test]
    fn test_select_rows_with_repeats() {
        let m = SparseMatrix::from_dense(&[vec![1.0], vec![2.0], vec![3.0]]);
        let s = m.select_rows(&[2, 2, 0]);
        assert_eq!(s.n_rows(), 3);
        assert_eq!(s.row(0).get(0), 3.0);
        assert_eq!(s.row(1).get(0), 3.0);
        assert_eq!(s.row(2).get(0), 1.0);
    }

    #[test]
    fn test_push_row_respects_width() {
        let mut m = SparseMatrix::new(3);
        m.push_row(SparseRow::new(vec![(0, 1.0), (7, 1.0)]));
        assert_eq!(m.nnz(), 1);
    }
}
