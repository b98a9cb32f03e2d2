//! ROC analysis configuration

use crate::curve::RateKind;
use serde::{Deserialize, Serialize};

/// Which operating points [`RocAnalysis::evaluate`](super::RocAnalysis::evaluate)
/// should locate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Neyman-Pearson constraint on sensitivity or specificity
    pub neyman_pearson: Option<RateKind>,

    /// Minimum rate for the Neyman-Pearson point; also the PPV/NPV target
    pub min_rate: f64,

    /// Locate the minimum-error (Bayes) point
    pub bayes_error: bool,

    /// Locate the point at this score threshold
    pub decision_threshold: Option<f64>,

    /// Locate the points with PPV and NPV closest to `min_rate`
    pub predictive_values: bool,

    /// Locate the maximum Youden's J point
    pub youden: bool,

    /// Locate the point with the largest chi-square statistic
    pub chi_square: bool,

    /// Thin the reported curve to its vertices. Areas and operating points
    /// are always computed on the full curve.
    pub drop_intermediate: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            neyman_pearson: None,
            min_rate: 0.95,
            bayes_error: false,
            decision_threshold: None,
            predictive_values: false,
            youden: false,
            chi_square: false,
            drop_intermediate: false,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operating point, with a sensitivity constraint
    pub fn all_points() -> Self {
        Self {
            neyman_pearson: Some(RateKind::Sensitivity),
            bayes_error: true,
            predictive_values: true,
            youden: true,
            chi_square: true,
            ..Self::default()
        }
    }

    /// Builder method to request a Neyman-Pearson point
    pub fn with_neyman_pearson(mut self, kind: RateKind, min_rate: f64) -> Self {
        self.neyman_pearson = Some(kind);
        self.min_rate = min_rate;
        self
    }

    pub fn with_min_rate(mut self, min_rate: f64) -> Self {
        self.min_rate = min_rate;
        self
    }

    pub fn with_bayes_error(mut self, enabled: bool) -> Self {
        self.bayes_error = enabled;
        self
    }

    pub fn with_decision_threshold(mut self, threshold: f64) -> Self {
        self.decision_threshold = Some(threshold);
        self
    }

    pub fn with_predictive_values(mut self, enabled: bool) -> Self {
        self.predictive_values = enabled;
        self
    }

    pub fn with_youden(mut self, enabled: bool) -> Self {
        self.youden = enabled;
        self
    }

    pub fn with_chi_square(mut self, enabled: bool) -> Self {
        self.chi_square = enabled;
        self
    }

    pub fn with_drop_intermediate(mut self, drop: bool) -> Self {
        self.drop_intermediate = drop;
        self
    }
}
