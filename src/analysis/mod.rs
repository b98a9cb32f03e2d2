//! One-call ROC analysis
//!
//! [`RocAnalysis::evaluate`] builds the curve for a [`Dataset`], integrates
//! it, and locates every operating point an [`AnalysisConfig`] asks for. The
//! resulting [`RocReport`] holds plain numbers for a plotting layer to read.

mod config;
mod views;

pub use config::AnalysisConfig;
pub use views::{CurveSeries, CurveView};

use crate::curve::{auc_standard_error, partial_auc, RateKind, RocCurve};
use crate::dataset::{ClassCounts, Dataset};
use crate::error::Result;
use crate::operating::{
    bayes_error, best_npv, best_ppv, decision_threshold, max_chi_square, max_youden_j,
    neyman_pearson, OperatingPoint, ScoredPoint,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Neyman-Pearson request and the point meeting it, if any
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintResult {
    pub kind: RateKind,
    pub min_rate: f64,
    pub point: Option<OperatingPoint>,
}

/// Requested decision threshold and the point it selects, if any
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub threshold: f64,
    pub point: Option<OperatingPoint>,
}

/// Everything [`RocAnalysis::evaluate`] computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocReport {
    pub curve: RocCurve,
    pub counts: ClassCounts,
    pub auc: f64,
    /// Hanley-McNeil term for `auc`
    pub auc_std_error: f64,
    pub neyman_pearson: Option<ConstraintResult>,
    pub decision: Option<ThresholdResult>,
    pub bayes_error: Option<ScoredPoint>,
    pub best_ppv: Option<ScoredPoint>,
    pub best_npv: Option<ScoredPoint>,
    pub youden_j: Option<ScoredPoint>,
    pub max_chi_square: Option<ScoredPoint>,
}

impl RocReport {
    /// Coordinates of the reported curve on the given axes
    pub fn series(&self, view: CurveView) -> CurveSeries {
        view.series(&self.curve, self.counts)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Entry point for a full ROC analysis
pub struct RocAnalysis;

impl RocAnalysis {
    pub fn evaluate(dataset: &Dataset, config: &AnalysisConfig) -> Result<RocReport> {
        // Integration and point searches need every threshold
        let full = RocCurve::from_dataset(dataset, false)?;
        let counts = dataset.class_counts()?;

        let auc = partial_auc(&full, 0.0, 1.0, RateKind::Specificity)?;
        let auc_std_error = auc_standard_error(auc, counts);

        let neyman_pearson = config.neyman_pearson.map(|kind| {
            let point = neyman_pearson(&full, config.min_rate, kind);
            if point.is_none() {
                debug!(?kind, min_rate = config.min_rate, "Neyman-Pearson constraint unreachable");
            }
            ConstraintResult {
                kind,
                min_rate: config.min_rate,
                point,
            }
        });

        let decision = config.decision_threshold.map(|threshold| {
            let point = decision_threshold(&full, threshold);
            if point.is_none() {
                debug!(threshold, "no curve point at or below decision threshold");
            }
            ThresholdResult { threshold, point }
        });

        let (best_ppv, best_npv) = if config.predictive_values {
            (
                Some(best_ppv(&full, counts, config.min_rate)?),
                Some(best_npv(&full, counts, config.min_rate)?),
            )
        } else {
            (None, None)
        };

        let curve = if config.drop_intermediate {
            RocCurve::from_dataset(dataset, true)?
        } else {
            full.clone()
        };

        Ok(RocReport {
            bayes_error: config.bayes_error.then(|| bayes_error(&full, counts)),
            youden_j: config.youden.then(|| max_youden_j(&full)),
            max_chi_square: config.chi_square.then(|| max_chi_square(&full, counts)),
            curve,
            counts,
            auc,
            auc_std_error,
            neyman_pearson,
            decision,
            best_ppv,
            best_npv,
        })
    }
}
