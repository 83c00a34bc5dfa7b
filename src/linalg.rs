//! Dense numeric helpers for vector batches.
//!
//! Vector batches are `ndarray::Array2<f64>` with one sample per row. Column
//! statistics and row norms are computed directly on `ndarray`; decompositions
//! (SVD, least squares) go through `nalgebra`, converting at the boundary.

use crate::error::{Result, TranslateError};
use nalgebra::{DMatrix, SVD};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};

/// Iteration cap for the SVD sweep; hitting it is reported as a numerical error.
const SVD_MAX_ITER: usize = 10_000;

/// Mean of each column (axis 0).
pub fn col_mean(x: ArrayView2<'_, f64>) -> Array1<f64> {
    x.mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()))
}

/// Standard deviation of each column.
///
/// `ddof` is the delta degrees of freedom (1 for sample std, 0 for population
/// std). When `nrows <= ddof` the divisor would be non-positive; such columns
/// report a std of 0.
pub fn col_std(x: ArrayView2<'_, f64>, ddof: usize) -> Array1<f64> {
    let nrows = x.nrows();
    let ncols = x.ncols();
    if nrows <= ddof {
        return Array1::zeros(ncols);
    }

    let means = col_mean(x);
    let mut stds = Array1::zeros(ncols);
    for col in 0..ncols {
        let var_sum: f64 = x
            .column(col)
            .iter()
            .map(|v| {
                let diff = v - means[col];
                diff * diff
            })
            .sum();
        stds[col] = (var_sum / (nrows - ddof) as f64).sqrt();
    }
    stds
}

/// Euclidean norm of each row.
pub fn row_norms(x: ArrayView2<'_, f64>) -> Array1<f64> {
    x.map_axis(Axis(1), |row| row.dot(&row).sqrt())
}

/// Append `pad` zero-valued columns.
pub fn pad_columns(x: ArrayView2<'_, f64>, pad: usize) -> Array2<f64> {
    let mut out = Array2::zeros((x.nrows(), x.ncols() + pad));
    out.slice_mut(s![.., ..x.ncols()]).assign(&x);
    out
}

/// Drop the last `pad` columns.
pub fn truncate_columns(x: ArrayView2<'_, f64>, pad: usize) -> Result<Array2<f64>> {
    if pad > x.ncols() {
        return Err(TranslateError::InvalidParameter(format!(
            "cannot drop {} columns from a batch with {} columns",
            pad,
            x.ncols()
        )));
    }
    Ok(x.slice(s![.., ..x.ncols() - pad]).to_owned())
}

pub(crate) fn to_dmatrix(x: ArrayView2<'_, f64>) -> DMatrix<f64> {
    DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[[i, j]])
}

pub(crate) fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Thin singular value decomposition `m = U · diag(s) · Vᵗ`.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub u: Array2<f64>,
    pub singular_values: Array1<f64>,
    pub v_t: Array2<f64>,
}

fn svd_factors(m: DMatrix<f64>) -> Result<SVD<f64, nalgebra::Dyn, nalgebra::Dyn>> {
    SVD::try_new(m, true, true, f64::EPSILON, SVD_MAX_ITER)
        .ok_or_else(|| TranslateError::Numerical("SVD did not converge".to_string()))
}

/// Singular value decomposition of a dense matrix.
pub fn svd(m: ArrayView2<'_, f64>) -> Result<Decomposition> {
    let factors = svd_factors(to_dmatrix(m))?;
    let u = factors
        .u
        .as_ref()
        .ok_or_else(|| TranslateError::Numerical("SVD produced no U factor".to_string()))?;
    let v_t = factors
        .v_t
        .as_ref()
        .ok_or_else(|| TranslateError::Numerical("SVD produced no Vᵗ factor".to_string()))?;

    Ok(Decomposition {
        u: from_dmatrix(u),
        singular_values: factors.singular_values.iter().copied().collect(),
        v_t: from_dmatrix(v_t),
    })
}

/// Nearest orthogonal matrix in Frobenius norm: `U · Vᵗ` of the SVD of `m`.
pub fn nearest_orthogonal(m: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let d = svd(m)?;
    Ok(d.u.dot(&d.v_t))
}

/// Least-squares solution `M` minimizing `‖b − a·M‖_F`.
///
/// Solved through the SVD of `a`. Singular values below
/// `max(σ) · max(rows, cols) · ε` are treated as zero, so rank-deficient or
/// near-singular inputs yield the minimum-norm solution instead of Inf/NaN.
pub fn lstsq(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    if a.nrows() != b.nrows() {
        return Err(TranslateError::ShapeMismatch {
            source_rows: a.nrows(),
            target_rows: b.nrows(),
        });
    }

    let factors = svd_factors(to_dmatrix(a))?;
    let max_sv = factors.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = max_sv * a.nrows().max(a.ncols()) as f64 * f64::EPSILON;

    let solution = factors
        .solve(&to_dmatrix(b), cutoff)
        .map_err(|e| TranslateError::Numerical(format!("least squares failed: {e}")))?;
    Ok(from_dmatrix(&solution))
}

/// Element-wise closeness with `|a - b| <= atol + rtol * |b|`.
pub fn allclose(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>, rtol: f64, atol: f64) -> bool {
    a.shape() == b.shape()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| (x - y).abs() <= atol + rtol * y.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_col_mean() {
        let x = array![[0.0, 1.0], [0.0, 1.0], [1.0, 3.0]];
        let mean = col_mean(x.view());
        assert!((mean[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((mean[1] - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_col_std_sample_and_population() {
        let x = array![[1.0], [3.0]];
        assert!((col_std(x.view(), 0)[0] - 1.0).abs() < 1e-12);
        assert!((col_std(x.view(), 1)[0] - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_col_std_single_row_is_zero() {
        let x = array![[4.0, 5.0]];
        assert_eq!(col_std(x.view(), 1).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_row_norms() {
        let x = array![[3.0, 4.0], [0.0, 0.0]];
        assert_eq!(row_norms(x.view()).to_vec(), vec![5.0, 0.0]);
    }

    #[test]
    fn test_pad_and_truncate() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let padded = pad_columns(x.view(), 2);
        assert_eq!(padded, array![[1.0, 2.0, 0.0, 0.0], [3.0, 4.0, 0.0, 0.0]]);
        assert_eq!(truncate_columns(padded.view(), 2).unwrap(), x);
    }

    #[test]
    fn test_truncate_too_many_columns() {
        let x = array![[1.0, 2.0]];
        assert!(matches!(
            truncate_columns(x.view(), 3),
            Err(TranslateError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_svd_reconstructs_matrix() {
        let m = array![[2.0, 0.5, 1.0], [0.0, 1.0, -1.0], [3.0, 1.0, 0.0]];
        let d = svd(m.view()).unwrap();
        let sigma = Array2::from_diag(&d.singular_values);
        let rebuilt = d.u.dot(&sigma).dot(&d.v_t);
        assert!(allclose(rebuilt.view(), m.view(), 1e-10, 1e-10));
    }

    #[test]
    fn test_nearest_orthogonal_is_orthogonal() {
        let m = array![[2.0, 0.5], [0.3, 1.0]];
        let r = nearest_orthogonal(m.view()).unwrap();
        let eye = Array2::<f64>::eye(2);
        assert!(allclose(r.dot(&r.t()).view(), eye.view(), 1e-10, 1e-10));
    }

    #[test]
    fn test_lstsq_exact_system() {
        // b = a · [[2], [-1]]
        let a = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let b = array![[2.0], [-1.0], [1.0]];
        let m = lstsq(a.view(), b.view()).unwrap();
        assert!(allclose(m.view(), array![[2.0], [-1.0]].view(), 1e-10, 1e-10));
    }

    #[test]
    fn test_lstsq_rank_deficient_is_finite() {
        // duplicated column: singular normal equations
        let a = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let b = array![[1.0], [2.0], [3.0]];
        let m = lstsq(a.view(), b.view()).unwrap();
        assert!(m.iter().all(|v| v.is_finite()));
        let fitted = a.dot(&m);
        assert!(allclose(fitted.view(), b.view(), 1e-8, 1e-8));
    }

    #[test]
    fn test_lstsq_row_mismatch() {
        let a = array![[1.0], [2.0]];
        let b = array![[1.0]];
        assert!(matches!(
            lstsq(a.view(), b.view()),
            Err(TranslateError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_allclose_shape_mismatch() {
        let a = array![[1.0, 2.0]];
        let b = array![[1.0], [2.0]];
        assert!(!allclose(a.view(), b.view(), 1e-5, 1e-8));
    }
}
