//! Plot-ready series derived from a curve

use crate::curve::RocCurve;
use crate::dataset::ClassCounts;
use crate::operating::{negative_predictive_value, positive_predictive_value};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Axes a curve can be drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveView {
    /// x = specificity, y = sensitivity
    SensitivitySpecificity,
    /// x = fpr, y = tpr
    Roc,
    /// x = recall (tpr), y = precision (PPV); the sentinel point is skipped
    PrecisionRecall,
    /// x = specificity, y = NPV
    InversePrecisionRecall,
}

/// Paired coordinates of one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSeries {
    pub view: CurveView,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
}

impl CurveSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

impl CurveView {
    pub fn series(self, curve: &RocCurve, counts: ClassCounts) -> CurveSeries {
        let (x, y) = match self {
            CurveView::SensitivitySpecificity => (curve.tnr(), curve.tpr().clone()),
            CurveView::Roc => (curve.fpr().clone(), curve.tpr().clone()),
            CurveView::PrecisionRecall => {
                let points: Vec<_> = curve.points().skip(1).collect();
                (
                    points.iter().map(|p| p.tpr).collect(),
                    points
                        .iter()
                        .map(|p| positive_predictive_value(p.tpr, p.fpr, counts))
                        .collect(),
                )
            }
            CurveView::InversePrecisionRecall => (
                curve.tnr(),
                curve
                    .points()
                    .map(|p| negative_predictive_value(p.tpr, p.fpr, counts))
                    .collect(),
            ),
        };
        CurveSeries { view: self, x, y }
    }
}
