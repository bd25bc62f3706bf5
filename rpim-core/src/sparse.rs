//! Sparse matrix helpers.
//!
//! CSR (Compressed Sparse Row) storage from `nalgebra-sparse` is used for the
//! 0/1 local-to-global selector of every support domain and for assembled
//! global stiffness blocks. Products with the selector are done row by row;
//! each row holds exactly one unit entry.

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::csr::CsrMatrix as NalgebraCsr;
use std::ops::{AddAssign, Range};

/// Compressed Sparse Row matrix.
pub type CsrMatrix = NalgebraCsr<f64>;

/// Builder for a sparse matrix from (row, col, value) triplets.
///
/// Duplicates are summed when converting to CSR.
#[derive(Debug, Clone)]
pub struct TripletMatrix {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletMatrix {
    /// Create an empty builder.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self::with_capacity(n_rows, n_cols, 0)
    }

    /// Create with estimated capacity.
    pub fn with_capacity(n_rows: usize, n_cols: usize, nnz_estimate: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: Vec::with_capacity(nnz_estimate),
            cols: Vec::with_capacity(nnz_estimate),
            values: Vec::with_capacity(nnz_estimate),
        }
    }

    /// Add a value at (row, col). Exact zeros are skipped.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.n_rows, "Row index out of bounds");
        debug_assert!(col < self.n_cols, "Column index out of bounds");

        if value != 0.0 {
            self.rows.push(row);
            self.cols.push(col);
            self.values.push(value);
        }
    }

    /// Scatter `scale · submatrix` into the rows and columns `dof_indices`.
    pub fn add_submatrix(&mut self, dof_indices: &[usize], submatrix: &DMatrix<f64>, scale: f64) {
        debug_assert_eq!(submatrix.nrows(), dof_indices.len());
        debug_assert_eq!(submatrix.ncols(), dof_indices.len());

        for (i, &row) in dof_indices.iter().enumerate() {
            for (j, &col) in dof_indices.iter().enumerate() {
                self.add(row, col, scale * submatrix[(i, j)]);
            }
        }
    }

    /// Append all triplets of another builder of the same shape.
    pub fn extend(&mut self, other: TripletMatrix) {
        debug_assert_eq!((self.n_rows, self.n_cols), (other.n_rows, other.n_cols));
        self.rows.extend(other.rows);
        self.cols.extend(other.cols);
        self.values.extend(other.values);
    }

    /// Number of stored triplets.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Matrix shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Convert to CSR, summing duplicate entries.
    pub fn to_csr(self) -> Result<CsrMatrix> {
        let coo = CooMatrix::try_from_triplets(
            self.n_rows,
            self.n_cols,
            self.rows,
            self.cols,
            self.values,
        )
        .map_err(|e| Error::Assembly(format!("invalid triplet data: {}", e)))?;
        Ok(CsrMatrix::from(&coo))
    }
}

/// Dense accumulator for assembled force vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    values: Vec<f64>,
}

impl SparseVector {
    /// Create a zero vector of given size.
    pub fn zeros(size: usize) -> Self {
        Self {
            values: vec![0.0; size],
        }
    }

    /// Add a value at the given index.
    pub fn add(&mut self, index: usize, value: f64) {
        self.values[index] += value;
    }

    /// Add `scale · values` at the given indices.
    pub fn add_subvector(&mut self, indices: &[usize], values: &DVector<f64>, scale: f64) {
        debug_assert_eq!(indices.len(), values.len());
        for (&idx, &val) in indices.iter().zip(values.iter()) {
            self.values[idx] += scale * val;
        }
    }

    /// Vector length.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The underlying values.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Consume into a dense nalgebra vector.
    pub fn into_dvector(self) -> DVector<f64> {
        DVector::from_vec(self.values)
    }
}

impl AddAssign<&SparseVector> for SparseVector {
    fn add_assign(&mut self, rhs: &SparseVector) {
        debug_assert_eq!(self.values.len(), rhs.values.len());
        for (a, b) in self.values.iter_mut().zip(rhs.values.iter()) {
            *a += *b;
        }
    }
}

/// 0/1 selector with one unit entry per row: row `r` picks column `cols[r]`.
pub fn selector_matrix(n_cols: usize, cols: &[usize]) -> Result<CsrMatrix> {
    if let Some(&bad) = cols.iter().find(|&&c| c >= n_cols) {
        return Err(Error::IndexConsistency(format!(
            "selector column {} out of range ({} columns)",
            bad, n_cols
        )));
    }
    CsrMatrix::try_from_csr_data(
        cols.len(),
        n_cols,
        (0..=cols.len()).collect(),
        cols.to_vec(),
        vec![1.0; cols.len()],
    )
    .map_err(|e| Error::Assembly(format!("invalid selector: {}", e)))
}

/// `A · x` for a CSR matrix and dense vector.
pub fn csr_mul_vec(a: &CsrMatrix, x: &DVector<f64>) -> Result<DVector<f64>> {
    if x.len() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.ncols(),
            found: x.len(),
        });
    }
    Ok(DVector::from_iterator(
        a.nrows(),
        a.row_iter().map(|row| {
            row.col_indices()
                .iter()
                .zip(row.values())
                .map(|(&c, &v)| v * x[c])
                .sum::<f64>()
        }),
    ))
}

/// `Aᵀ · y` for a CSR matrix and dense vector.
pub fn csr_transpose_mul_vec(a: &CsrMatrix, y: &DVector<f64>) -> Result<DVector<f64>> {
    if y.len() != a.nrows() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            found: y.len(),
        });
    }
    let mut out = DVector::zeros(a.ncols());
    for (r, c, &v) in a.triplet_iter() {
        out[c] += v * y[r];
    }
    Ok(out)
}

/// Copy the block `rows × cols` of a CSR matrix into a new CSR matrix.
pub fn csr_block(a: &CsrMatrix, rows: Range<usize>, cols: Range<usize>) -> Result<CsrMatrix> {
    let mut block = TripletMatrix::new(rows.len(), cols.len());
    for (r, c, &v) in a.triplet_iter() {
        if rows.contains(&r) && cols.contains(&c) {
            block.add(r - rows.start, c - cols.start, v);
        }
    }
    block.to_csr()
}
