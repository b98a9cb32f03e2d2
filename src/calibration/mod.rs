//! Probability calibration
//!
//! Maps raw classifier scores to calibrated probabilities:
//! - Platt scaling (sigmoid fit of decision scores)
//! - Isotonic regression by pool-adjacent-violators (ROC convex hull)
//! - Reliability curves and calibration metrics (ECE, MCE, Brier score)

mod platt;
mod isotonic;
mod metrics;

pub use platt::{
    sigmoid_calibrate, sigmoid_fit, ConvergenceWarning, PlattScaling, SigmoidConfig, SigmoidFit,
    SigmoidParams,
};
pub use isotonic::{
    pav_rocch, pav_rocch_weighted, pool_adjacent_violators, CalibrationMapping,
    IsotonicRegression, LevelSet,
};
pub use metrics::{
    brier_score, compute_calibration_metrics, expected_calibration_error,
    maximum_calibration_error, reliability_curve, CalibrationMetrics, ReliabilityConfig,
    ReliabilityTable,
};

use crate::error::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Calibration method type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum CalibrationType {
    /// Platt scaling (two-parameter logistic map)
    Sigmoid,
    /// Isotonic regression (non-parametric, monotone)
    Isotonic,
}

impl CalibrationType {
    /// Unfitted calibrator of this type with default settings
    pub fn calibrator(self) -> Box<dyn Calibrator> {
        match self {
            CalibrationType::Sigmoid => Box::new(PlattScaling::new()),
            CalibrationType::Isotonic => Box::new(IsotonicRegression::new()),
        }
    }
}

/// Trait for probability calibrators
pub trait Calibrator: Send + Sync {
    /// Fit the calibrator on classifier scores and true labels
    fn fit(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<()>;

    /// Calibrate scores into probabilities
    fn calibrate(&self, scores: &Array1<f64>) -> Result<Array1<f64>>;

    /// Fit and calibrate in one step
    fn fit_calibrate(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<Array1<f64>> {
        self.fit(scores, labels)?;
        self.calibrate(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_calibrators_are_monotone_in_score() {
        let scores = array![-2.0, -1.0, -0.5, 0.0, 0.3, 0.8, 1.5, 2.5];
        let labels = array![0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0];

        for kind in [CalibrationType::Sigmoid, CalibrationType::Isotonic] {
            let mut calibrator = kind.calibrator();
            let probs = calibrator.fit_calibrate(&scores, &labels).unwrap();
            assert_eq!(probs.len(), scores.len());
            for i in 1..probs.len() {
                assert!(probs[i] >= probs[i - 1] - 1e-12, "{:?} not monotone", kind);
            }
            assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }
}
