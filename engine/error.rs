use ndarray_linalg::error::LinalgError;
use thiserror::Error;

/// Failures surfaced by the separation engine.
///
/// Numerical degeneracies (dead mixing columns, rank-deficient mixing matrices)
/// are absorbed by the engine and never appear here.
#[derive(Debug, Error)]
pub enum GmcaError {
    #[error("Shape mismatch for {operand}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        operand: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Length mismatch for {operand}: expected {expected}, found {found}")]
    LengthMismatch {
        operand: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Source index {index} is out of range for {n_sources} sources")]
    SourceIndexOutOfRange { index: usize, n_sources: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Singular value decomposition returned no singular vectors")]
    MissingSingularVectors,

    #[error("Singular value decomposition failed: {0}")]
    Linalg(#[from] LinalgError),
}

/// Fails unless `found` has exactly the `expected` dimensions.
pub(crate) fn ensure_shape(
    operand: &'static str,
    expected: (usize, usize),
    found: (usize, usize),
) -> Result<(), GmcaError> {
    if expected != found {
        return Err(GmcaError::ShapeMismatch {
            operand,
            expected,
            found,
        });
    }
    Ok(())
}

pub(crate) fn ensure_len(
    operand: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), GmcaError> {
    if expected != found {
        return Err(GmcaError::LengthMismatch {
            operand,
            expected,
            found,
        });
    }
    Ok(())
}

pub(crate) fn ensure_source_index(index: usize, n_sources: usize) -> Result<(), GmcaError> {
    if index >= n_sources {
        return Err(GmcaError::SourceIndexOutOfRange { index, n_sources });
    }
    Ok(())
}

/// Prior weights pull mixing columns toward the prior and must be finite and non-negative.
pub(crate) fn ensure_prior_weights(lam_p: &[f64]) -> Result<(), GmcaError> {
    if let Some(bad) = lam_p.iter().find(|&&w| !(w >= 0.0) || !w.is_finite()) {
        return Err(GmcaError::InvalidParameter(format!(
            "lam_p weights must be finite and non-negative, got {bad}"
        )));
    }
    Ok(())
}
