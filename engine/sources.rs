use crate::error::{GmcaError, ensure_len, ensure_shape, ensure_source_index};
use ndarray::linalg::general_mat_vec_mul;
use ndarray::{Array1, Array2, ArrayView2, Zip};

/// Proximal operator of `t·|x|`: shrinks `value` toward zero by `threshold`.
#[inline]
pub fn soft_threshold(value: f64, threshold: f64) -> f64 {
    let magnitude = value.abs() - threshold;
    if magnitude > 0.0 {
        magnitude.copysign(value)
    } else {
        0.0
    }
}

/// Replaces row `index` of `sources` with the soft-thresholded correlation
/// `soft(A[:,i]ᵗ·R_i, lam_s)`.
///
/// Exact for a unit-norm mixing column. `scratch_column` receives a copy of
/// `A[:,i]` and `scratch_correlation` the correlation row before thresholding.
pub fn update_sources(
    sources: &mut Array2<f64>,
    mixing: ArrayView2<f64>,
    scratch_correlation: &mut Array1<f64>,
    residual: ArrayView2<f64>,
    scratch_column: &mut Array1<f64>,
    lam_s: f64,
    index: usize,
) -> Result<(), GmcaError> {
    let (n_channels, n_samples) = residual.dim();
    let n_sources = mixing.ncols();
    ensure_shape("mixing", (n_channels, n_sources), mixing.dim())?;
    ensure_shape("sources", (n_sources, n_samples), sources.dim())?;
    ensure_len("scratch_correlation", n_samples, scratch_correlation.len())?;
    ensure_len("scratch_column", n_channels, scratch_column.len())?;
    ensure_source_index(index, n_sources)?;
    if !(lam_s >= 0.0) {
        return Err(GmcaError::InvalidParameter(format!(
            "sparsity threshold must be non-negative, got {lam_s}"
        )));
    }

    scratch_column.assign(&mixing.column(index));
    general_mat_vec_mul(1.0, &residual.t(), &*scratch_column, 0.0, &mut *scratch_correlation);

    Zip::from(sources.row_mut(index))
        .and(&*scratch_correlation)
        .for_each(|s, &c| *s = soft_threshold(c, lam_s));

    Ok(())
}
