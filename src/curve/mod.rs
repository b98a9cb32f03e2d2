//! ROC curve construction
//!
//! Turns a [`Dataset`] into a monotone sequence of `(fpr, tpr, threshold)`
//! triples, one per distinct score, prefixed with a "reject all" sentinel.
//!
//! - [`RocCurve::from_dataset`] - sort, aggregate ties, optionally drop
//!   collinear points
//! - [`auc`] - full and partial area under the curve, Hanley-McNeil term

pub mod auc;

pub use auc::{auc, auc_standard_error, full_auc, partial_auc};

use crate::dataset::Dataset;
use crate::error::{Result, RocError};
use crate::operating::OperatingPoint;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which rate a constraint or window refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateKind {
    /// True positive rate (TPR)
    Sensitivity,
    /// True negative rate (TNR = 1 - FPR)
    Specificity,
}

/// Options for building a curve from raw arrays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Drop points that are not vertices of the curve. Leave this off when
    /// the curve feeds a partial AUC.
    pub drop_intermediate: bool,
    /// Label value treated as the positive class
    pub pos_label: Option<f64>,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            drop_intermediate: false,
            pos_label: None,
        }
    }
}

impl CurveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to drop intermediate (collinear) points
    pub fn with_drop_intermediate(mut self, drop: bool) -> Self {
        self.drop_intermediate = drop;
        self
    }

    /// Builder method to set the positive label
    pub fn with_pos_label(mut self, pos_label: f64) -> Self {
        self.pos_label = Some(pos_label);
        self
    }
}

/// Receiver operating characteristic curve.
///
/// Ordered by decreasing threshold: `fpr` and `tpr` are non-decreasing, the
/// first point is `(0, 0)` with threshold `max(score) + 1` and the last point
/// is `(1, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    fpr: Array1<f64>,
    tpr: Array1<f64>,
    thresholds: Array1<f64>,
}

impl RocCurve {
    /// Build the curve for a dataset.
    ///
    /// # Errors
    ///
    /// `InputError` if the dataset lacks one of the two classes (by count or
    /// by total weight).
    pub fn from_dataset(dataset: &Dataset, drop_intermediate: bool) -> Result<Self> {
        if dataset.is_single_class() {
            return Err(RocError::InputError(format!(
                "ROC curve needs both classes, got {} positives and {} negatives",
                dataset.n_pos(),
                dataset.n_neg()
            )));
        }

        let labels = dataset.labels();
        let scores = dataset.scores();
        let weights = dataset.weights();
        let n = dataset.len();

        // Descending score; stable so equal scores keep input order
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut tps = Vec::new();
        let mut fps = Vec::new();
        let mut thresholds = Vec::new();
        let mut tp = 0.0;
        let mut fp = 0.0;

        let mut i = 0;
        while i < n {
            // All samples sharing a score land on the same point
            let current = scores[order[i]];
            while i < n && scores[order[i]] == current {
                let k = order[i];
                if labels[k] > 0.5 {
                    tp += weights[k];
                } else {
                    fp += weights[k];
                }
                i += 1;
            }
            tps.push(tp);
            fps.push(fp);
            thresholds.push(current);
        }

        if tp <= 0.0 || fp <= 0.0 {
            return Err(RocError::InputError(format!(
                "ROC curve needs positive weight in both classes, got {} positive and {} negative",
                tp, fp
            )));
        }

        let n_distinct = thresholds.len();
        let keep = if drop_intermediate {
            vertex_indices(&fps, &tps)
        } else {
            (0..n_distinct).collect()
        };

        let sentinel = thresholds[0] + 1.0;
        let mut fpr = Vec::with_capacity(keep.len() + 1);
        let mut tpr = Vec::with_capacity(keep.len() + 1);
        let mut thr = Vec::with_capacity(keep.len() + 1);
        fpr.push(0.0);
        tpr.push(0.0);
        thr.push(sentinel);
        for &k in &keep {
            fpr.push(fps[k] / fp);
            tpr.push(tps[k] / tp);
            thr.push(thresholds[k]);
        }

        debug!(
            samples = n,
            thresholds = n_distinct,
            points = fpr.len(),
            dropped = n_distinct - keep.len(),
            "built ROC curve"
        );

        Ok(Self {
            fpr: Array1::from_vec(fpr),
            tpr: Array1::from_vec(tpr),
            thresholds: Array1::from_vec(thr),
        })
    }

    /// Wrap externally computed rates, checking the curve invariants
    pub fn from_arrays(
        fpr: Array1<f64>,
        tpr: Array1<f64>,
        thresholds: Array1<f64>,
    ) -> Result<Self> {
        let n = fpr.len();
        if tpr.len() != n || thresholds.len() != n {
            return Err(RocError::InputError(format!(
                "fpr, tpr and thresholds lengths differ: {}, {}, {}",
                n,
                tpr.len(),
                thresholds.len()
            )));
        }
        if n < 2 {
            return Err(RocError::InputError(format!(
                "ROC curve needs at least 2 points, got {}",
                n
            )));
        }
        if fpr[0] != 0.0 || tpr[0] != 0.0 || fpr[n - 1] != 1.0 || tpr[n - 1] != 1.0 {
            return Err(RocError::InputError(
                "ROC curve must run from (0, 0) to (1, 1)".to_string(),
            ));
        }
        for i in 1..n {
            if fpr[i] < fpr[i - 1] || tpr[i] < tpr[i - 1] {
                return Err(RocError::InputError(format!(
                    "rates decrease at index {}",
                    i
                )));
            }
            if thresholds[i] > thresholds[i - 1] {
                return Err(RocError::InputError(format!(
                    "thresholds increase at index {}",
                    i
                )));
            }
        }
        Ok(Self {
            fpr,
            tpr,
            thresholds,
        })
    }

    /// Number of points, sentinel included
    pub fn len(&self) -> usize {
        self.fpr.len()
    }

    /// A built curve always has at least two points
    pub fn is_empty(&self) -> bool {
        self.fpr.is_empty()
    }

    /// False positive rates, non-decreasing
    pub fn fpr(&self) -> &Array1<f64> {
        &self.fpr
    }

    /// True positive rates, non-decreasing
    pub fn tpr(&self) -> &Array1<f64> {
        &self.tpr
    }

    /// Decision thresholds, non-increasing
    pub fn thresholds(&self) -> &Array1<f64> {
        &self.thresholds
    }

    /// Specificities (`1 - fpr`)
    pub fn tnr(&self) -> Array1<f64> {
        self.fpr.mapv(|f| 1.0 - f)
    }

    /// The `i`-th point; panics when out of range, like slice indexing
    pub fn point(&self, i: usize) -> OperatingPoint {
        OperatingPoint {
            fpr: self.fpr[i],
            tpr: self.tpr[i],
            threshold: self.thresholds[i],
        }
    }

    /// Points in decreasing-threshold order
    pub fn points(&self) -> impl Iterator<Item = OperatingPoint> + '_ {
        (0..self.len()).map(move |i| self.point(i))
    }
}

/// Build a curve straight from label and score arrays
pub fn roc_curve(
    labels: &Array1<f64>,
    scores: &Array1<f64>,
    weights: Option<&Array1<f64>>,
    config: &CurveConfig,
) -> Result<RocCurve> {
    let dataset = Dataset::from_parts(labels, scores, weights, config.pos_label)?;
    RocCurve::from_dataset(&dataset, config.drop_intermediate)
}

/// Indices of the cumulative-count points that are curve vertices.
///
/// A point is dropped when it lies on the segment from the last kept point
/// (the `(0, 0)` sentinel at first) to its successor. The end point is
/// always kept.
fn vertex_indices(fps: &[f64], tps: &[f64]) -> Vec<usize> {
    let n = fps.len();
    let mut keep = Vec::with_capacity(n);
    let (mut last_fp, mut last_tp) = (0.0, 0.0);
    for i in 0..n.saturating_sub(1) {
        let cross = (fps[i] - last_fp) * (tps[i + 1] - tps[i])
            - (tps[i] - last_tp) * (fps[i + 1] - fps[i]);
        if cross != 0.0 {
            keep.push(i);
            last_fp = fps[i];
            last_tp = tps[i];
        }
    }
    if n > 0 {
        keep.push(n - 1);
    }
    keep
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn labelled_scores() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        proptest::collection::vec((any::<bool>(), 0u8..20), 2..60).prop_map(|rows| {
            let mut labels: Vec<f64> = rows.iter().map(|(l, _)| if *l { 1.0 } else { 0.0 }).collect();
            // guarantee both classes
            labels[0] = 1.0;
            labels[1] = 0.0;
            let scores = rows.iter().map(|(_, s)| *s as f64 / 10.0).collect();
            (labels, scores)
        })
    }

    proptest! {
        #[test]
        fn curve_is_monotone((labels, scores) in labelled_scores(), drop in any::<bool>()) {
            let ds = Dataset::from_slices(&labels, &scores).unwrap();
            let curve = RocCurve::from_dataset(&ds, drop).unwrap();
            let n = curve.len();
            prop_assert!(n >= 2);
            prop_assert_eq!(curve.fpr()[0], 0.0);
            prop_assert_eq!(curve.tpr()[0], 0.0);
            prop_assert_eq!(curve.fpr()[n - 1], 1.0);
            prop_assert_eq!(curve.tpr()[n - 1], 1.0);
            for i in 1..n {
                prop_assert!(curve.fpr()[i - 1] <= curve.fpr()[i]);
                prop_assert!(curve.tpr()[i - 1] <= curve.tpr()[i]);
                prop_assert!(curve.thresholds()[i - 1] > curve.thresholds()[i]);
            }
        }

        #[test]
        fn dropping_points_keeps_area((labels, scores) in labelled_scores()) {
            let ds = Dataset::from_slices(&labels, &scores).unwrap();
            let full = RocCurve::from_dataset(&ds, false).unwrap();
            let light = RocCurve::from_dataset(&ds, true).unwrap();
            prop_assert!((auc::full_auc(&full) - auc::full_auc(&light)).abs() < 1e-9);
        }

        #[test]
        fn thinned_curve_has_only_vertices((labels, scores) in labelled_scores()) {
            let ds = Dataset::from_slices(&labels, &scores).unwrap();
            let curve = RocCurve::from_dataset(&ds, true).unwrap();
            let (fpr, tpr) = (curve.fpr(), curve.tpr());
            for i in 1..curve.len() - 1 {
                let cross = (fpr[i] - fpr[i - 1]) * (tpr[i + 1] - tpr[i])
                    - (tpr[i] - tpr[i - 1]) * (fpr[i + 1] - fpr[i]);
                prop_assert!(cross.abs() > 1e-12, "point {} is not a vertex", i);
            }
        }
    }
}
