use ndarray::{Array1, Array2};

/// Pre-sized scratch buffers reused across the per-source inner loop.
///
/// Every primitive writes a buffer before reading it, so a workspace carries no
/// state between calls. Callers must not rely on buffer contents surviving an
/// `optimize` invocation.
#[derive(Clone, Debug)]
pub struct Workspace {
    /// Full reconstruction `A·S`, shape (F, P).
    pub reconstruction: Array2<f64>,
    /// Residual `R_i` for the source being visited, shape (F, P).
    pub residual: Array2<f64>,
    /// Correlation row `A[:,i]ᵗ·R_i`, length P.
    pub correlation: Array1<f64>,
    /// Contiguous copy of the visited mixing column, length F.
    pub column: Array1<f64>,
}

impl Workspace {
    pub fn new(n_channels: usize, n_samples: usize) -> Self {
        Self {
            reconstruction: Array2::zeros((n_channels, n_samples)),
            residual: Array2::zeros((n_channels, n_samples)),
            correlation: Array1::zeros(n_samples),
            column: Array1::zeros(n_channels),
        }
    }

    /// (channels, samples) this workspace was sized for.
    pub fn dims(&self) -> (usize, usize) {
        self.residual.dim()
    }
}
