use crate::error::{GmcaError, ensure_shape};
use ndarray::{Array2, ArrayBase, ArrayView2, Axis, Data, Ix2, s};
use ndarray_linalg::SVD;

/// Scales every column of `matrix` to unit L2 norm in place.
///
/// All-zero columns are left untouched, so dead sources stay dead.
pub fn normalize_columns(matrix: &mut Array2<f64>) {
    for mut column in matrix.axis_iter_mut(Axis(1)) {
        let norm = column.dot(&column).sqrt();
        if norm > 0.0 {
            column.mapv_inplace(|v| v / norm);
        }
    }
}

/// Indices of mixing columns that are exactly the zero vector.
pub fn dead_sources(mixing: ArrayView2<f64>) -> Vec<usize> {
    mixing
        .axis_iter(Axis(1))
        .enumerate()
        .filter(|(_, column)| column.iter().all(|&v| v == 0.0))
        .map(|(index, _)| index)
        .collect()
}

/// `‖A·S − X‖₁`, the entrywise L1 norm of the reconstruction error.
pub fn l1_reconstruction_error(
    observations: ArrayView2<f64>,
    mixing: ArrayView2<f64>,
    sources: ArrayView2<f64>,
) -> Result<f64, GmcaError> {
    let (n_channels, n_samples) = observations.dim();
    let n_sources = mixing.ncols();
    ensure_shape("mixing", (n_channels, n_sources), mixing.dim())?;
    ensure_shape("sources", (n_sources, n_samples), sources.dim())?;
    let reconstruction = mixing.dot(&sources);
    Ok(reconstruction
        .iter()
        .zip(observations.iter())
        .map(|(&fit, &obs)| (fit - obs).abs())
        .sum())
}

/// Moore-Penrose pseudo-inverse through the singular value decomposition.
///
/// Singular values below `max(rows, cols) * eps * sigma_max` are treated as zero,
/// so zero columns and collinear columns yield the least-norm solution instead
/// of blowing up.
pub fn pseudo_inverse<S>(matrix: &ArrayBase<S, Ix2>) -> Result<Array2<f64>, GmcaError>
where
    S: Data<Elem = f64>,
{
    let (rows, cols) = matrix.dim();
    if rows == 0 || cols == 0 {
        return Ok(Array2::zeros((cols, rows)));
    }

    let (u, sigma, vt) = matrix.svd(true, true)?;
    let u = u.ok_or(GmcaError::MissingSingularVectors)?;
    let vt = vt.ok_or(GmcaError::MissingSingularVectors)?;

    let rank_bound = rows.min(cols);
    let sigma_max = sigma.iter().fold(0.0_f64, |max, &v| max.max(v));
    let tolerance = sigma_max * rows.max(cols) as f64 * f64::EPSILON;

    // Rows of V^T scaled by 1/sigma; truncated directions become zero rows.
    let mut scaled_vt = vt.slice(s![..rank_bound, ..]).to_owned();
    for (mut row, &value) in scaled_vt.axis_iter_mut(Axis(0)).zip(sigma.iter()) {
        if value > tolerance {
            row.mapv_inplace(|v| v / value);
        } else {
            row.fill(0.0);
        }
    }

    Ok(scaled_vt.t().dot(&u.slice(s![.., ..rank_bound]).t()))
}
