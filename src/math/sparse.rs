//! Sparse matrix utilities for the global stiffness system
//!
//! Assembly works on explicit sparse rows (ordered column → value maps),
//! which makes insert-or-accumulate and "is this entry present" cheap and
//! unambiguous. The reduced system is converted to CSR for the solvers.

use std::collections::BTreeMap;

use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::analysis::CancelToken;
use crate::error::{FemError, FemResult};

/// Pivots smaller than this fraction of the row scale count as zero
const PIVOT_EPS: f64 = 1e-14;

/// One row of a sparse matrix: column index → accumulated value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseRow {
    entries: BTreeMap<usize, f64>,
}

impl SparseRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value at a column, creating the entry if absent
    #[inline]
    pub fn add(&mut self, col: usize, value: f64) {
        *self.entries.entry(col).or_insert(0.0) += value;
    }

    /// Overwrite (or create) the entry at a column
    pub fn set(&mut self, col: usize, value: f64) {
        self.entries.insert(col, value);
    }

    pub fn get(&self, col: usize) -> Option<f64> {
        self.entries.get(&col).copied()
    }

    /// Entries in ascending column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().map(|(&c, &v)| (c, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest absolute value in the row
    pub fn max_abs(&self) -> f64 {
        self.entries.values().fold(0.0, |m, v| m.max(v.abs()))
    }

    /// Drop entries whose magnitude is below `threshold`, returning how many went
    pub fn prune(&mut self, threshold: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, v| v.abs() >= threshold);
        before - self.entries.len()
    }
}

/// Square matrix stored as sparse rows
#[derive(Debug, Clone, Default)]
pub struct SparseRowMatrix {
    rows: Vec<SparseRow>,
    max_abs: f64,
}

impl SparseRowMatrix {
    /// Create an empty `size` x `size` matrix
    pub fn new(size: usize) -> Self {
        Self {
            rows: vec![SparseRow::new(); size],
            max_abs: 0.0,
        }
    }

    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Accumulate a value, tracking the largest magnitude seen so far
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        let r = &mut self.rows[row];
        r.add(col, value);
        if let Some(v) = r.get(col) {
            self.max_abs = self.max_abs.max(v.abs());
        }
    }

    /// Scatter a dense element matrix at the given global indices
    pub fn add_element_matrix(&mut self, dofs: &[usize], k_elem: &DMatrix<f64>) {
        for (i, &di) in dofs.iter().enumerate() {
            for (j, &dj) in dofs.iter().enumerate() {
                let v = k_elem[(i, j)];
                if v != 0.0 {
                    self.add(di, dj, v);
                }
            }
        }
    }

    pub fn row(&self, i: usize) -> &SparseRow {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }

    /// Largest magnitude seen during accumulation
    pub fn max_abs(&self) -> f64 {
        self.max_abs
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row].get(col).unwrap_or(0.0)
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(SparseRow::len).sum()
    }

    /// Drop entries below `ratio` x the largest magnitude, row by row.
    ///
    /// Each row is pruned independently, so the result need not keep a
    /// symmetric sparsity pattern.
    pub fn prune(&mut self, ratio: f64) -> usize {
        let threshold = ratio * self.max_abs;
        let removed: usize = self.rows.iter_mut().map(|r| r.prune(threshold)).sum();
        debug!("pruned {} entries below {:e}", removed, threshold);
        removed
    }

    /// Congruent rotation Tᵀ·K·T, where T is block diagonal with the given
    /// 3x3 blocks on the listed indices and identity elsewhere.
    ///
    /// Rows are rotated first. The rows holding each rotated column are then
    /// collected in a single pass, so only those rows are visited for the
    /// column rotation.
    pub fn rotate_blocks(&mut self, blocks: &[([usize; 3], nalgebra::Matrix3<f64>)]) {
        for (idx, r) in blocks {
            self.rotate_rows(*idx, r);
        }

        let mut block_of = vec![None; self.size()];
        for (b, (idx, _)) in blocks.iter().enumerate() {
            for &c in idx {
                block_of[c] = Some(b);
            }
        }
        let mut touched: Vec<Vec<usize>> = vec![Vec::new(); blocks.len()];
        for (i, row) in self.rows.iter().enumerate() {
            for (c, _) in row.iter() {
                if let Some(b) = block_of[c] {
                    if touched[b].last() != Some(&i) {
                        touched[b].push(i);
                    }
                }
            }
        }

        for ((idx, r), rows) in blocks.iter().zip(&touched) {
            for &i in rows {
                let row = &mut self.rows[i];
                let old: Vec<f64> = idx.iter().map(|&c| row.get(c).unwrap_or(0.0)).collect();
                for (a, &ca) in idx.iter().enumerate() {
                    let v: f64 = (0..3).map(|b| old[b] * r[(b, a)]).sum();
                    row.set(ca, v);
                }
            }
        }
    }

    /// Replace rows `idx` by Rᵀ·rows
    fn rotate_rows(&mut self, idx: [usize; 3], r: &nalgebra::Matrix3<f64>) {
        let old: Vec<SparseRow> = idx.iter().map(|&i| self.rows[i].clone()).collect();
        for (a, &ia) in idx.iter().enumerate() {
            let mut row = SparseRow::new();
            for (b, old_row) in old.iter().enumerate() {
                let f = r[(b, a)];
                if f != 0.0 {
                    for (c, v) in old_row.iter() {
                        row.add(c, f * v);
                    }
                }
            }
            self.rows[ia] = row;
        }
    }

    /// Convert to CSR format
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let n = self.size();
        let mut coo = CooMatrix::new(n, n);
        for (i, row) in self.rows.iter().enumerate() {
            for (j, v) in row.iter() {
                coo.push(i, j, v);
            }
        }
        CsrMatrix::from(&coo)
    }

    /// Convert to dense matrix (for comparison/debugging)
    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.size();
        let mut mat = DMatrix::zeros(n, n);
        for (i, row) in self.rows.iter().enumerate() {
            for (j, v) in row.iter() {
                mat[(i, j)] = v;
            }
        }
        mat
    }

    /// Check value symmetry within a relative tolerance
    pub fn is_symmetric(&self, rel_tol: f64) -> bool {
        let tol = rel_tol * self.max_abs.max(f64::MIN_POSITIVE);
        self.rows.iter().enumerate().all(|(i, row)| {
            row.iter().all(|(j, v)| (v - self.get(j, i)).abs() <= tol)
        })
    }
}

/// LU factors of a sparse matrix, stored by rows.
///
/// `lower` holds the strictly lower part of unit-diagonal L, `upper`
/// the strictly upper part of U, and `diag` the diagonal of U.
#[derive(Debug, Clone)]
pub struct SparseLu {
    lower: Vec<Vec<(usize, f64)>>,
    upper: Vec<Vec<(usize, f64)>>,
    diag: Vec<f64>,
}

/// Fill-in policy for [`SparseLu::factorize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillIn {
    /// Complete LU; entries outside the input pattern are created as needed
    Full,
    /// ILU(0); updates falling outside the input pattern are discarded
    None,
}

impl SparseLu {
    /// Row-wise (IKJ) Gaussian elimination without pivoting.
    ///
    /// A zero pivot is fatal for both policies.
    pub fn factorize(a: &CsrMatrix<f64>, fill: FillIn, cancel: &CancelToken) -> FemResult<Self> {
        let n = a.nrows();
        let mut lower = Vec::with_capacity(n);
        let mut upper: Vec<Vec<(usize, f64)>> = Vec::with_capacity(n);
        let mut diag = Vec::with_capacity(n);

        for i in 0..n {
            if i % 256 == 0 {
                cancel.check()?;
            }

            let row = a.row(i);
            let mut w: BTreeMap<usize, f64> = row
                .col_indices()
                .iter()
                .zip(row.values())
                .map(|(&c, &v)| (c, v))
                .collect();
            let scale = w.values().fold(0.0_f64, |m, v| m.max(v.abs()));

            // Eliminate columns k < i in ascending order; full LU may add new ones
            let mut next = w.range(..i).next().map(|(&k, _)| k);
            while let Some(k) = next {
                let lik = w[&k] / diag[k];
                w.insert(k, lik);
                if lik != 0.0 {
                    for &(j, ukj) in &upper[k] {
                        match fill {
                            FillIn::Full => *w.entry(j).or_insert(0.0) -= lik * ukj,
                            FillIn::None => {
                                if let Some(v) = w.get_mut(&j) {
                                    *v -= lik * ukj;
                                }
                            }
                        }
                    }
                }
                next = w.range(k + 1..i).next().map(|(&c, _)| c);
            }

            let d = w.get(&i).copied().unwrap_or(0.0);
            if !d.is_finite() || d.abs() <= PIVOT_EPS * scale || d == 0.0 {
                return Err(FemError::SingularMatrix { row: i });
            }

            lower.push(w.range(..i).map(|(&c, &v)| (c, v)).collect());
            upper.push(w.range(i + 1..).map(|(&c, &v)| (c, v)).collect());
            diag.push(d);
        }

        let nnz: usize = lower.iter().chain(upper.iter()).map(Vec::len).sum::<usize>() + n;
        debug!("factorized {} rows ({:?} fill), {} stored entries", n, fill, nnz);

        Ok(Self { lower, upper, diag })
    }

    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// Solve L·U·x = b by forward and back substitution
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        let n = self.size();
        let mut x = b.clone();

        for i in 0..n {
            let mut sum = x[i];
            for &(k, lik) in &self.lower[i] {
                sum -= lik * x[k];
            }
            x[i] = sum;
        }

        for i in (0..n).rev() {
            let mut sum = x[i];
            for &(j, uij) in &self.upper[i] {
                sum -= uij * x[j];
            }
            x[i] = sum / self.diag[i];
        }

        x
    }
}

/// Outcome of a preconditioned conjugate gradient run
#[derive(Debug, Clone)]
pub struct PcgOutcome {
    pub solution: DVector<f64>,
    pub iterations: usize,
    /// Final squared residual norm
    pub residual: f64,
    pub converged: bool,
}

/// Solve a sparse system with ILU-preconditioned conjugate gradients.
///
/// Convergence is reached when the squared residual norm drops below
/// `tol` (absolute, not normalized). At most `max_iter` iterations run;
/// the last iterate is returned when the cap is hit.
pub fn solve_pcg(
    a: &CsrMatrix<f64>,
    b: &DVector<f64>,
    precond: &SparseLu,
    tol: f64,
    max_iter: usize,
    cancel: &CancelToken,
) -> FemResult<PcgOutcome> {
    let n = a.nrows();
    let mut x = DVector::zeros(n);
    let mut r = b.clone();
    let mut rr = r.dot(&r);

    if rr < tol {
        return Ok(PcgOutcome { solution: x, iterations: 0, residual: rr, converged: true });
    }

    let mut z = precond.solve(&r);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iter in 0..max_iter {
        cancel.check()?;

        let ap = sparse_matvec(a, &p);
        let p_ap = p.dot(&ap);
        if p_ap == 0.0 {
            return Err(FemError::SingularMatrix { row: iter });
        }

        let alpha = rz / p_ap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        rr = r.dot(&r);
        if rr < tol {
            return Ok(PcgOutcome { solution: x, iterations: iter + 1, residual: rr, converged: true });
        }

        z = precond.solve(&r);
        let rz_new = r.dot(&z);
        let beta = rz_new / rz;
        rz = rz_new;

        // p = z + beta * p
        p = &z + beta * &p;
    }

    Ok(PcgOutcome { solution: x, iterations: max_iter, residual: rr, converged: false })
}

/// Sparse matrix-vector multiplication
#[inline]
pub fn sparse_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut y = DVector::zeros(n);

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..n {
        let start = row_offsets[row];
        let end = row_offsets[row + 1];

        let mut sum = 0.0;
        for idx in start..end {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }

    y
}
