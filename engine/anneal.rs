use crate::error::GmcaError;
use serde::{Deserialize, Serialize};

/// Tunables of the sparsity-threshold annealing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    /// The schedule starts at `start_factor · lam_s`, capped by the peak
    /// correlation observed before the first sweep.
    pub start_factor: f64,
    /// Fraction of the iterations spent decaying; the rest run at `lam_s`.
    pub decay_fraction: f64,
    /// With `lam_s == 0` the schedule starts at this fraction of the peak
    /// correlation and decays linearly to zero. Zero disables annealing.
    pub zero_target_fraction: f64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            start_factor: 5.0,
            decay_fraction: 0.5,
            zero_target_fraction: 1e-3,
        }
    }
}

impl AnnealConfig {
    pub(crate) fn validate(&self) -> Result<(), GmcaError> {
        if !(self.start_factor >= 1.0) || !self.start_factor.is_finite() {
            return Err(GmcaError::InvalidParameter(format!(
                "anneal.start_factor must be a finite value >= 1, got {}",
                self.start_factor
            )));
        }
        if !(self.decay_fraction > 0.0 && self.decay_fraction <= 1.0) {
            return Err(GmcaError::InvalidParameter(format!(
                "anneal.decay_fraction must lie in (0, 1], got {}",
                self.decay_fraction
            )));
        }
        if !(self.zero_target_fraction >= 0.0 && self.zero_target_fraction <= 1.0) {
            return Err(GmcaError::InvalidParameter(format!(
                "anneal.zero_target_fraction must lie in [0, 1], got {}",
                self.zero_target_fraction
            )));
        }
        Ok(())
    }
}

/// Decay of the soft threshold toward the target `lam_s`.
///
/// Geometric for a positive target, linear for a zero target. Monotone
/// non-increasing; returns exactly the target from iteration
/// `decay_iterations - 1` onwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdSchedule {
    start: f64,
    target: f64,
    decay_iterations: usize,
}

impl ThresholdSchedule {
    pub fn new(peak_correlation: f64, target: f64, n_iterations: usize, config: &AnnealConfig) -> Self {
        let start = if target > 0.0 {
            (config.start_factor * target).min(peak_correlation).max(target)
        } else {
            config.zero_target_fraction * peak_correlation
        };
        let decay_iterations = ((config.decay_fraction * n_iterations as f64).ceil() as usize).max(1);
        Self {
            start,
            target,
            decay_iterations,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Threshold for the 0-indexed `iteration`.
    pub fn threshold(&self, iteration: usize) -> f64 {
        let step = iteration + 1;
        if !(self.start > self.target) || step >= self.decay_iterations {
            return self.target;
        }
        let progress = step as f64 / self.decay_iterations as f64;
        if self.target > 0.0 {
            let value = self.start * (self.target / self.start).powf(progress);
            value.max(self.target)
        } else {
            self.start * (1.0 - progress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn decays_monotonically_and_lands_exactly_on_target() {
        let config = AnnealConfig::default();
        let schedule = ThresholdSchedule::new(1e6, 2.0, 40, &config);
        assert_eq!(schedule.start(), 10.0);

        let values: Vec<f64> = (0..40).map(|it| schedule.threshold(it)).collect();
        assert!(values[0] < 10.0 && values[0] > 2.0);
        for pair in values.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        for &v in &values[19..] {
            assert_eq!(v, 2.0);
        }
        assert!(values[18] > 2.0);
    }

    #[test]
    fn start_is_capped_by_peak_correlation() {
        let schedule = ThresholdSchedule::new(3.0, 1.0, 10, &AnnealConfig::default());
        assert_eq!(schedule.start(), 3.0);
        // A peak below the target never lowers the start under the target.
        let schedule = ThresholdSchedule::new(0.5, 1.0, 10, &AnnealConfig::default());
        assert_eq!(schedule.start(), 1.0);
        assert!((0..10).all(|it| schedule.threshold(it) == 1.0));
    }

    #[test]
    fn zero_target_decays_linearly_to_exactly_zero() {
        let config = AnnealConfig {
            zero_target_fraction: 0.1,
            ..AnnealConfig::default()
        };
        let schedule = ThresholdSchedule::new(50.0, 0.0, 20, &config);
        assert_eq!(schedule.start(), 5.0);

        let values: Vec<f64> = (0..20).map(|it| schedule.threshold(it)).collect();
        assert_abs_diff_eq!(values[0], 4.5, epsilon = 1e-12);
        assert_abs_diff_eq!(values[4], 2.5, epsilon = 1e-12);
        assert!(values[8] > 0.0);
        for pair in values.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert!(values[9..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_target_fraction_of_zero_disables_annealing() {
        let config = AnnealConfig {
            zero_target_fraction: 0.0,
            ..AnnealConfig::default()
        };
        let schedule = ThresholdSchedule::new(50.0, 0.0, 100, &config);
        assert!((0..100).all(|it| schedule.threshold(it) == 0.0));
    }

    #[test]
    fn single_iteration_runs_at_target() {
        let schedule = ThresholdSchedule::new(50.0, 1.0, 1, &AnnealConfig::default());
        assert_eq!(schedule.threshold(0), 1.0);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad_factor = AnnealConfig {
            start_factor: 0.5,
            ..AnnealConfig::default()
        };
        assert!(bad_factor.validate().is_err());
        let bad_fraction = AnnealConfig {
            decay_fraction: 0.0,
            ..AnnealConfig::default()
        };
        assert!(bad_fraction.validate().is_err());
        let bad_zero_start = AnnealConfig {
            zero_target_fraction: -0.5,
            ..AnnealConfig::default()
        };
        assert!(bad_zero_start.validate().is_err());
        assert!(AnnealConfig::default().validate().is_ok());
    }
}
