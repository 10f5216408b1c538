use crate::anneal::{AnnealConfig, ThresholdSchedule};
use crate::debias::debias_into;
use crate::error::{GmcaError, ensure_len, ensure_prior_weights, ensure_shape};
use crate::linalg::{dead_sources, l1_reconstruction_error, normalize_columns};
use crate::mixing::update_mixing;
use crate::remainder::remainder;
use crate::sources::update_sources;
use crate::sweep::SweepOrder;
use crate::workspace::Workspace;
use ndarray::linalg::general_mat_vec_mul;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Optional knobs of [`optimize`]. The defaults reproduce a plain,
/// unconstrained run with no sparsity and no debiasing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmcaOptions {
    /// Target soft threshold reached by the annealing schedule.
    pub lam_s: f64,
    /// Replace S by the minimum-residual solution after the last iteration.
    pub ret_min_rmse: bool,
    /// Debias after every `rate`-th iteration (1-indexed); `None` never does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rmse_rate: Option<usize>,
    /// Clip negative mixing weights before renormalizing.
    pub enforce_nonneg_a: bool,
    /// Seed of the sweep order; `None` draws one from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub anneal: AnnealConfig,
}

impl Default for GmcaOptions {
    fn default() -> Self {
        Self {
            lam_s: 0.0,
            ret_min_rmse: false,
            min_rmse_rate: None,
            enforce_nonneg_a: false,
            seed: None,
            anneal: AnnealConfig::default(),
        }
    }
}

impl GmcaOptions {
    pub(crate) fn validate(&self) -> Result<(), GmcaError> {
        if !(self.lam_s >= 0.0) || !self.lam_s.is_finite() {
            return Err(GmcaError::InvalidParameter(format!(
                "lam_s must be finite and non-negative, got {}",
                self.lam_s
            )));
        }
        if self.min_rmse_rate == Some(0) {
            return Err(GmcaError::InvalidParameter(
                "min_rmse_rate must be at least 1".to_string(),
            ));
        }
        self.anneal.validate()
    }

    fn debias_due(&self, iteration: usize) -> bool {
        match self.min_rmse_rate {
            Some(rate) => (iteration + 1) % rate == 0,
            None => false,
        }
    }
}

/// Summary of one [`optimize`] call. The matrices themselves are updated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizeReport {
    pub iterations: usize,
    pub initial_threshold: f64,
    pub final_threshold: f64,
    pub debias_count: usize,
    /// Sources whose mixing column is exactly zero at the end of the run.
    pub dead_sources: Vec<usize>,
}

/// Runs `n_iterations` sweeps of GMCA on `observations ≈ mixing · sources`.
///
/// Each iteration anneals the threshold, shuffles the source order, and for
/// every source computes its residual, soft-thresholds its row of `sources`,
/// then re-estimates its column of `mixing` (pulled toward `prior_mixing` by
/// `lam_p`). When `options.min_rmse_rate = Some(r)`, the sources are replaced
/// by `pinv(A)·X` after every iteration `t` (1-indexed) with `t % r == 0`;
/// `options.ret_min_rmse` does the same once more after the last iteration.
///
/// `mixing` and `sources` are both the starting point and the output. The
/// non-zero columns of `mixing` are rescaled to unit norm before the first
/// sweep.
#[allow(clippy::too_many_arguments)]
pub fn optimize(
    observations: ArrayView2<f64>,
    n_sources: usize,
    n_iterations: usize,
    mixing: &mut Array2<f64>,
    sources: &mut Array2<f64>,
    prior_mixing: ArrayView2<f64>,
    lam_p: &[f64],
    options: &GmcaOptions,
) -> Result<OptimizeReport, GmcaError> {
    validate_problem(observations, n_sources, mixing, sources, prior_mixing, lam_p)?;
    options.validate()?;

    let (n_channels, n_samples) = observations.dim();
    let started = Instant::now();
    let mut workspace = Workspace::new(n_channels, n_samples);
    normalize_columns(mixing);

    let peak = peak_correlation(observations, sources.view(), mixing.view(), &mut workspace)?;
    let schedule = ThresholdSchedule::new(peak, options.lam_s, n_iterations, &options.anneal);
    let mut sweep = SweepOrder::new(n_sources, options.seed);

    log::info!(
        "Starting GMCA: {} channels x {} samples, {} sources, {} iterations, threshold {:.4e} -> {:.4e}",
        n_channels,
        n_samples,
        n_sources,
        n_iterations,
        schedule.start(),
        schedule.target()
    );

    let mut dead: Vec<bool> = vec![false; n_sources];
    for index in dead_sources(mixing.view()) {
        dead[index] = true;
    }
    let mut debias_count = 0;
    let mut threshold = schedule.target();

    for iteration in 0..n_iterations {
        threshold = schedule.threshold(iteration);
        let order = sweep.next_order();

        for &i in order {
            remainder(
                observations,
                sources.view(),
                mixing.view(),
                &mut workspace.reconstruction,
                &mut workspace.residual,
                i,
            )?;
            update_sources(
                sources,
                mixing.view(),
                &mut workspace.correlation,
                workspace.residual.view(),
                &mut workspace.column,
                threshold,
                i,
            )?;
            update_mixing(
                sources.view(),
                mixing,
                workspace.residual.view(),
                lam_p,
                prior_mixing,
                options.enforce_nonneg_a,
                i,
            )?;
        }

        for index in dead_sources(mixing.view()) {
            if !dead[index] {
                dead[index] = true;
                log::warn!(
                    "Source {} died at iteration {}: its mixing column is now zero",
                    index,
                    iteration + 1
                );
            }
        }

        if options.debias_due(iteration) {
            debias_into(observations, mixing.view(), sources)?;
            debias_count += 1;
        }

        if log::log_enabled!(log::Level::Debug) {
            let error = l1_reconstruction_error(observations, mixing.view(), sources.view())?;
            log::debug!(
                "[GMCA Iter #{}] order {:?} | threshold {:.4e} | L1 error {:.6e}",
                iteration + 1,
                order,
                threshold,
                error
            );
        }
    }

    if options.ret_min_rmse {
        debias_into(observations, mixing.view(), sources)?;
        debias_count += 1;
    }

    let report = OptimizeReport {
        iterations: n_iterations,
        initial_threshold: schedule.start(),
        final_threshold: threshold,
        debias_count,
        dead_sources: dead_sources(mixing.view()),
    };
    log::info!(
        "GMCA finished in {:.2?}: {} debias steps, {} dead sources",
        started.elapsed(),
        report.debias_count,
        report.dead_sources.len()
    );
    Ok(report)
}

fn validate_problem(
    observations: ArrayView2<f64>,
    n_sources: usize,
    mixing: &Array2<f64>,
    sources: &Array2<f64>,
    prior_mixing: ArrayView2<f64>,
    lam_p: &[f64],
) -> Result<(), GmcaError> {
    let (n_channels, n_samples) = observations.dim();
    if n_sources == 0 {
        return Err(GmcaError::InvalidParameter(
            "at least one source is required".to_string(),
        ));
    }
    if n_channels == 0 || n_samples == 0 {
        return Err(GmcaError::InvalidParameter(format!(
            "observations must be non-empty, got {n_channels}x{n_samples}"
        )));
    }
    ensure_shape("mixing", (n_channels, n_sources), mixing.dim())?;
    ensure_shape("sources", (n_sources, n_samples), sources.dim())?;
    ensure_shape("prior_mixing", (n_channels, n_sources), prior_mixing.dim())?;
    ensure_len("lam_p", n_sources, lam_p.len())?;
    ensure_prior_weights(lam_p)
}

/// Largest `|A[:,k]ᵗ·R_k|` over all sources and samples of the starting point.
fn peak_correlation(
    observations: ArrayView2<f64>,
    sources: ArrayView2<f64>,
    mixing: ArrayView2<f64>,
    workspace: &mut Workspace,
) -> Result<f64, GmcaError> {
    let mut peak = 0.0_f64;
    for k in 0..mixing.ncols() {
        remainder(
            observations,
            sources,
            mixing,
            &mut workspace.reconstruction,
            &mut workspace.residual,
            k,
        )?;
        workspace.column.assign(&mixing.column(k));
        general_mat_vec_mul(
            1.0,
            &workspace.residual.t(),
            &workspace.column,
            0.0,
            &mut workspace.correlation,
        );
        peak = workspace
            .correlation
            .iter()
            .fold(peak, |max, &c| max.max(c.abs()));
    }
    Ok(peak)
}
