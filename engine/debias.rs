use crate::error::{GmcaError, ensure_shape};
use crate::linalg::pseudo_inverse;
use ndarray::{Array2, ArrayView2};

/// Minimum-residual sources for a fixed mixing matrix: `S = pinv(A)·X`.
///
/// Removes the shrinkage left by soft-thresholding. Dead mixing columns are
/// absorbed by the pseudo-inverse truncation and receive the least-norm rows.
pub fn debias(
    observations: ArrayView2<f64>,
    mixing: ArrayView2<f64>,
) -> Result<Array2<f64>, GmcaError> {
    let n_channels = observations.nrows();
    ensure_shape("mixing", (n_channels, mixing.ncols()), mixing.dim())?;
    Ok(pseudo_inverse(&mixing)?.dot(&observations))
}

/// Overwrites `sources` with [`debias`] of the current mixing matrix.
pub fn debias_into(
    observations: ArrayView2<f64>,
    mixing: ArrayView2<f64>,
    sources: &mut Array2<f64>,
) -> Result<(), GmcaError> {
    ensure_shape(
        "sources",
        (mixing.ncols(), observations.ncols()),
        sources.dim(),
    )?;
    let solution = debias(observations, mixing)?;
    sources.assign(&solution);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    #[test]
    fn recovers_sources_of_a_noiseless_mixture() {
        let mixing = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let truth = array![[1.0, -2.0, 3.0], [0.5, 0.0, -1.0]];
        let observations = mixing.dot(&truth);
        let sources = debias(observations.view(), mixing.view()).unwrap();
        assert_abs_diff_eq!(sources, truth, epsilon = 1e-12);
    }

    #[test]
    fn repeated_debiasing_is_bit_identical() {
        let mixing = array![[0.6, 0.0, 0.0], [0.8, 0.0, 1.0], [0.0, 0.0, 0.0]];
        let observations = array![[1.0, 2.0, 3.0, 4.0], [0.5, -1.0, 2.0, 0.0], [9.0, 9.0, 9.0, 9.0]];
        let mut sources = Array2::zeros((3, 4));
        debias_into(observations.view(), mixing.view(), &mut sources).unwrap();
        let first = sources.clone();
        debias_into(observations.view(), mixing.view(), &mut sources).unwrap();
        assert_eq!(first, sources);
        // The dead middle source gets the least-norm answer.
        assert!(sources.row(1).iter().all(|&v| v.abs() < 1e-12));
    }

    #[test]
    fn wrong_source_shape_is_rejected() {
        let mixing = Array2::<f64>::eye(2);
        let observations = Array2::<f64>::ones((2, 3));
        let mut sources = Array2::zeros((3, 3));
        assert!(matches!(
            debias_into(observations.view(), mixing.view(), &mut sources),
            Err(GmcaError::ShapeMismatch { operand: "sources", .. })
        ));
    }
}
