use crate::error::{GmcaError, ensure_shape, ensure_source_index};
use ndarray::linalg::general_mat_mul;
use ndarray::{Array2, ArrayView2, Zip};

/// Writes `R_i = X − A·S + A[:,i]·S[i,:]` into `residual`.
///
/// The full product `A·S` is recomputed into `reconstruction` on every call,
/// so the residual never depends on what a previous call left behind.
pub fn remainder(
    observations: ArrayView2<f64>,
    sources: ArrayView2<f64>,
    mixing: ArrayView2<f64>,
    reconstruction: &mut Array2<f64>,
    residual: &mut Array2<f64>,
    index: usize,
) -> Result<(), GmcaError> {
    let (n_channels, n_samples) = observations.dim();
    let n_sources = mixing.ncols();
    ensure_shape("mixing", (n_channels, n_sources), mixing.dim())?;
    ensure_shape("sources", (n_sources, n_samples), sources.dim())?;
    ensure_shape("reconstruction", (n_channels, n_samples), reconstruction.dim())?;
    ensure_shape("residual", (n_channels, n_samples), residual.dim())?;
    ensure_source_index(index, n_sources)?;

    general_mat_mul(1.0, &mixing, &sources, 0.0, &mut *reconstruction);

    let source_row = sources.row(index);
    Zip::from(residual.rows_mut())
        .and(observations.rows())
        .and(reconstruction.rows())
        .and(mixing.column(index))
        .par_for_each(|mut out, obs, fit, &weight| {
            Zip::from(&mut out)
                .and(&obs)
                .and(&fit)
                .and(&source_row)
                .for_each(|r, &x, &m, &s| *r = x - m + weight * s);
        });

    Ok(())
}
