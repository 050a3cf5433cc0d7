//! # Sparse binary matrix
//!
//! A [`SparseBitMatrix`] stores a matrix over GF(2) as a list of rows, each row being the
//! ascending list of column indices where the entry is `1`. Storage and the cost of the row and
//! column operations below are proportional to the number of `1` entries, which is what makes
//! generator derivation and encoding practical for long LDPC codes.
//!
//! # Examples
//!
//! ```
//! use ldpc_codec::SparseBitMatrix;
//!
//! let mut mat = SparseBitMatrix::from_rows(4, vec![vec![0, 2], vec![1, 2, 3]])?;
//! mat.xor_rows(1, 0);
//! assert_eq!(mat.row(1), [0, 1, 3]);
//! assert_eq!(mat.col_sizes(0 .. 2), [2, 1, 1, 1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Binary matrix with sparse row storage
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize, Serialize)]
#[serde(try_from = "RawBitMatrix")]
pub struct SparseBitMatrix {
    /// Number of columns
    cols: usize,
    /// Ascending column indices of the `1` entries in each row
    rows: Vec<Vec<usize>>,
}

impl SparseBitMatrix {
    /// Returns all-zero matrix of given dimensions.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            rows: vec![Vec::new(); rows],
        }
    }

    /// Returns matrix with given rows.
    ///
    /// # Parameters
    ///
    /// - `cols`: Number of columns.
    ///
    /// - `rows`: Column indices of the `1` entries in each row, in any order.
    ///
    /// # Errors
    ///
    /// Returns an error if any index is not less than `cols`, or if any index is repeated within a
    /// row.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::SparseBitMatrix;
    ///
    /// let mat = SparseBitMatrix::from_rows(3, vec![vec![2, 0], vec![1]])?;
    /// assert_eq!(mat.row(0), [0, 2]);
    /// assert!(SparseBitMatrix::from_rows(3, vec![vec![3]]).is_err());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_rows(cols: usize, mut rows: Vec<Vec<usize>>) -> Result<Self, Error> {
        for (i, row) in rows.iter_mut().enumerate() {
            row.sort_unstable();
            if let Some(&last) = row.last() {
                if last >= cols {
                    return Err(Error::InvalidInput(format!(
                        "Column index {last} in row {i} is out of range for {cols} columns"
                    )));
                }
            }
            if row.windows(2).any(|w| w[0] == w[1]) {
                return Err(Error::InvalidInput(format!(
                    "Row {i} contains a repeated column index"
                )));
            }
        }
        Ok(Self { cols, rows })
    }

    /// Returns number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns total number of `1` entries.
    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Returns ascending column indices of the `1` entries in a row.
    #[must_use]
    pub fn row(&self, i: usize) -> &[usize] {
        &self.rows[i]
    }

    /// Returns iterator over all rows.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Returns `true` if entry `(row, col)` is `1`.
    #[must_use]
    pub fn test(&self, row: usize, col: usize) -> bool {
        self.rows[row].binary_search(&col).is_ok()
    }

    /// Returns smallest column index set in a row, or `None` for an all-zero row.
    #[must_use]
    pub fn first(&self, row: usize) -> Option<usize> {
        self.rows[row].first().copied()
    }

    /// Returns number of `1` entries in each row.
    #[must_use]
    pub fn row_sizes(&self) -> Vec<usize> {
        self.rows.iter().map(Vec::len).collect()
    }

    /// Returns number of `1` entries in each column, counting only rows in a given range.
    #[must_use]
    pub fn col_sizes(&self, rows: Range<usize>) -> Vec<usize> {
        let mut sizes = vec![0; self.cols];
        for row in &self.rows[rows] {
            for &col in row {
                sizes[col] += 1;
            }
        }
        sizes
    }

    /// Adds (modulo 2) row `src` into row `dst`.
    pub fn xor_rows(&mut self, dst: usize, src: usize) {
        if dst == src {
            self.rows[dst].clear();
        } else {
            self.rows[dst] = symmetric_difference(&self.rows[dst], &self.rows[src]);
        }
    }

    /// Adds (modulo 2) a sorted list of column indices into row `dst`.
    pub fn xor_into_row(&mut self, dst: usize, other: &[usize]) {
        self.rows[dst] = symmetric_difference(&self.rows[dst], other);
    }

    /// Exchanges two rows.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        self.rows.swap(a, b);
    }

    /// Exchanges columns `c1` and `c2` in every row of a given range.
    pub fn swap_cols(&mut self, c1: usize, c2: usize, rows: Range<usize>) {
        if c1 == c2 {
            return;
        }
        for row in &mut self.rows[rows] {
            let pos1 = row.binary_search(&c1);
            let pos2 = row.binary_search(&c2);
            match (pos1, pos2) {
                (Ok(p), Err(_)) => {
                    row.remove(p);
                    insert_sorted(row, c2);
                }
                (Err(_), Ok(p)) => {
                    row.remove(p);
                    insert_sorted(row, c1);
                }
                _ => {}
            }
        }
    }

    /// Moves column `from` to position `to`, shifting the columns in between by one position.
    pub fn move_col(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        for row in &mut self.rows {
            let mut moved = false;
            for col in row.iter_mut() {
                if *col == from {
                    *col = to;
                    moved = true;
                } else if from > to && (to .. from).contains(col) {
                    *col += 1;
                } else if from < to && (from + 1 ..= to).contains(col) {
                    *col -= 1;
                }
            }
            if moved {
                row.sort_unstable();
            }
        }
    }

    /// Returns independent copy of the window given by a row range and a column range, with
    /// indices renumbered relative to the window origin.
    #[must_use]
    pub fn submatrix(&self, rows: Range<usize>, cols: Range<usize>) -> Self {
        Self {
            cols: cols.len(),
            rows: self.rows[rows]
                .iter()
                .map(|row| {
                    row.iter()
                        .filter(|col| cols.contains(col))
                        .map(|col| col - cols.start)
                        .collect()
                })
                .collect(),
        }
    }

    /// Returns transpose of the matrix.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut rows = vec![Vec::new(); self.cols];
        for (i, row) in self.rows.iter().enumerate() {
            for &col in row {
                rows[col].push(i);
            }
        }
        Self {
            cols: self.rows.len(),
            rows,
        }
    }
}

/// Returns sorted symmetric difference of two sorted index lists.
fn symmetric_difference(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i ..]);
    out.extend_from_slice(&b[j ..]);
    out
}

/// Inserts a value into a sorted list that does not contain it.
fn insert_sorted(row: &mut Vec<usize>, col: usize) {
    let pos = row.partition_point(|&c| c < col);
    row.insert(pos, col);
}

/// Unchecked serialized form of a [`SparseBitMatrix`]
#[derive(Deserialize)]
struct RawBitMatrix {
    cols: usize,
    rows: Vec<Vec<usize>>,
}

impl TryFrom<RawBitMatrix> for SparseBitMatrix {
    type Error = Error;

    fn try_from(raw: RawBitMatrix) -> Result<Self, Error> {
        Self::from_rows(raw.cols, raw.rows)
    }
}
