use crate::error::{
    GmcaError, ensure_len, ensure_prior_weights, ensure_shape, ensure_source_index,
};
use ndarray::{Array2, ArrayView2};

/// Re-estimates column `index` of the mixing matrix from the residual `R_i`.
///
/// The target is `S[i,:]·R_iᵗ + lam_p[i]·A_p[:,i]`; with `enforce_nonneg` its
/// negative entries are clipped before normalization. A target with no positive
/// mass leaves an all-zero column behind (a dead source), which is not an error.
pub fn update_mixing(
    sources: ArrayView2<f64>,
    mixing: &mut Array2<f64>,
    residual: ArrayView2<f64>,
    lam_p: &[f64],
    prior_mixing: ArrayView2<f64>,
    enforce_nonneg: bool,
    index: usize,
) -> Result<(), GmcaError> {
    let (n_channels, n_samples) = residual.dim();
    let n_sources = mixing.ncols();
    ensure_shape("mixing", (n_channels, n_sources), mixing.dim())?;
    ensure_shape("sources", (n_sources, n_samples), sources.dim())?;
    ensure_shape("prior_mixing", (n_channels, n_sources), prior_mixing.dim())?;
    ensure_len("lam_p", n_sources, lam_p.len())?;
    ensure_prior_weights(lam_p)?;
    ensure_source_index(index, n_sources)?;

    let mut target = residual.dot(&sources.row(index));
    target.scaled_add(lam_p[index], &prior_mixing.column(index));
    if enforce_nonneg {
        target.mapv_inplace(|v| v.max(0.0));
    }

    let norm = target.dot(&target).sqrt();
    let alive = if enforce_nonneg {
        target.sum() > 0.0
    } else {
        norm > 0.0
    };

    let mut column = mixing.column_mut(index);
    if alive {
        column.zip_mut_with(&target, |a, &t| *a = t / norm);
    } else {
        column.fill(0.0);
    }

    Ok(())
}
