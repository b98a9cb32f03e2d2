//! Operating point selection
//!
//! Linear scans over a built [`RocCurve`] (decreasing-threshold order) that
//! locate decision, constraint and optimal points. Scans that can fail to
//! find a point return `None` instead of an all-zero point, since a genuine
//! point at the origin is indistinguishable from "not found".

mod chi_square;

pub use chi_square::{chi_square, chi_square_array, chi_square_grid, max_chi_square, CHI_SQUARE_LEVELS};

use crate::curve::{RateKind, RocCurve};
use crate::dataset::ClassCounts;
use crate::error::{Result, RocError};
use serde::{Deserialize, Serialize};

/// A point on the ROC curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub fpr: f64,
    pub tpr: f64,
    pub threshold: f64,
}

impl OperatingPoint {
    /// Specificity (`1 - fpr`)
    pub fn tnr(&self) -> f64 {
        1.0 - self.fpr
    }

    /// Miss rate (`1 - tpr`)
    pub fn fnr(&self) -> f64 {
        1.0 - self.tpr
    }
}

/// An operating point together with the statistic it was selected on
/// (Youden's J, error rate, PPV, NPV or chi-square)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub value: f64,
    pub point: OperatingPoint,
}

/// Positive predictive value, `tp / (tp + fp)`; 0 when `tpr == 0`
pub fn positive_predictive_value(tpr: f64, fpr: f64, counts: ClassCounts) -> f64 {
    if tpr == 0.0 {
        return 0.0;
    }
    let tp = tpr * counts.positives();
    tp / (tp + fpr * counts.negatives())
}

/// Negative predictive value, `tn / (tn + fn)`; 0 when `tnr == 0`
pub fn negative_predictive_value(tpr: f64, fpr: f64, counts: ClassCounts) -> f64 {
    let tnr = 1.0 - fpr;
    if tnr == 0.0 {
        return 0.0;
    }
    let tn = tnr * counts.negatives();
    tn / (tn + (1.0 - tpr) * counts.positives())
}

/// First point (highest threshold first) whose threshold is `<= threshold`
pub fn decision_threshold(curve: &RocCurve, threshold: f64) -> Option<OperatingPoint> {
    curve.points().find(|p| p.threshold <= threshold)
}

/// Neyman-Pearson point for a minimum sensitivity or specificity.
///
/// Sensitivity: the first point with `tpr >= min_rate`. Specificity: the last
/// point before `tnr` first drops below `min_rate`, i.e. the most sensitive
/// point still meeting the constraint. `None` when no point qualifies.
pub fn neyman_pearson(curve: &RocCurve, min_rate: f64, kind: RateKind) -> Option<OperatingPoint> {
    match kind {
        RateKind::Sensitivity => curve.points().find(|p| p.tpr >= min_rate),
        RateKind::Specificity => match curve.points().position(|p| p.tnr() < min_rate) {
            Some(0) => None,
            Some(i) => Some(curve.point(i - 1)),
            // tnr reaches 0 at the last point, so only min_rate <= 0 gets here
            None => Some(curve.point(curve.len() - 1)),
        },
    }
}

/// Point maximising Youden's J (`tpr + tnr - 1`).
///
/// Ties keep the first point reaching the maximum.
pub fn max_youden_j(curve: &RocCurve) -> ScoredPoint {
    let youden = |p: &OperatingPoint| p.tpr + p.tnr() - 1.0;
    let first = curve.point(0);
    let mut best = ScoredPoint {
        value: youden(&first),
        point: first,
    };
    for p in curve.points().skip(1) {
        let j = youden(&p);
        if j > best.value {
            best = ScoredPoint { value: j, point: p };
        }
    }
    best
}

/// Point with the minimum total error rate (empirical Bayes error).
///
/// Rates are turned into correct-decision counts (`tpr·Np + tnr·Nn`); the
/// first point with the largest count wins and its error rate is
/// `1 - count / (Nn + Np)`.
pub fn bayes_error(curve: &RocCurve, counts: ClassCounts) -> ScoredPoint {
    let correct =
        |p: &OperatingPoint| p.tpr * counts.positives() + p.tnr() * counts.negatives();
    let mut best_count = correct(&curve.point(0));
    let mut best_point = curve.point(0);
    for p in curve.points().skip(1) {
        let c = correct(&p);
        if c > best_count {
            best_count = c;
            best_point = p;
        }
    }
    ScoredPoint {
        value: 1.0 - best_count / counts.total(),
        point: best_point,
    }
}

fn check_target(name: &str, target: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&target) {
        return Err(RocError::invalid_parameter(name, target, "must lie in [0, 1]"));
    }
    Ok(())
}

/// Point whose PPV is closest to `target_ppv`.
///
/// Points with `tpr == 0` are skipped. Ties on distance keep the *last* such
/// point (non-strict comparison), unlike [`best_npv`].
pub fn best_ppv(curve: &RocCurve, counts: ClassCounts, target_ppv: f64) -> Result<ScoredPoint> {
    check_target("target_ppv", target_ppv)?;
    let mut best: Option<ScoredPoint> = None;
    let mut best_diff = 1.0;
    for p in curve.points().filter(|p| p.tpr != 0.0) {
        let ppv = positive_predictive_value(p.tpr, p.fpr, counts);
        let diff = (target_ppv - ppv).abs();
        if diff <= best_diff {
            best_diff = diff;
            best = Some(ScoredPoint { value: ppv, point: p });
        }
    }
    best.ok_or_else(|| {
        RocError::ComputationError(format!("no curve point within reach of PPV {}", target_ppv))
    })
}

/// Point whose NPV is closest to `target_npv`.
///
/// Points with `tnr == 0` are skipped. Ties on distance keep the *first* such
/// point (strict comparison), unlike [`best_ppv`].
pub fn best_npv(curve: &RocCurve, counts: ClassCounts, target_npv: f64) -> Result<ScoredPoint> {
    check_target("target_npv", target_npv)?;
    let mut best: Option<ScoredPoint> = None;
    let mut best_diff = 1.0;
    for p in curve.points().filter(|p| p.tnr() != 0.0) {
        let npv = negative_predictive_value(p.tpr, p.fpr, counts);
        let diff = (target_npv - npv).abs();
        if diff < best_diff {
            best_diff = diff;
            best = Some(ScoredPoint { value: npv, point: p });
        }
    }
    best.ok_or_else(|| {
        RocError::ComputationError(format!("no curve point within reach of NPV {}", target_npv))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use ndarray::array;

    /// Four positives and four negatives so every rate is an exact quarter.
    ///
    /// | thr | fpr  | tpr  |
    /// |-----|------|------|
    /// | 1.9 | 0    | 0    |
    /// | 0.9 | 0    | 0.25 |
    /// | 0.8 | 0    | 0.5  |
    /// | 0.7 | 0.25 | 0.5  |
    /// | 0.6 | 0.5  | 0.5  |
    /// | 0.5 | 0.5  | 0.75 |
    /// | 0.3 | 0.5  | 1    |
    /// | 0.2 | 0.75 | 1    |
    /// | 0.1 | 1    | 1    |
    fn quarters() -> (RocCurve, ClassCounts) {
        let ds = Dataset::new(
            &array![1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0],
            &array![0.9, 0.8, 0.7, 0.6, 0.5, 0.3, 0.2, 0.1],
        )
        .unwrap();
        (RocCurve::from_dataset(&ds, false).unwrap(), ds.class_counts().unwrap())
    }

    #[test]
    fn test_decision_threshold() {
        let (curve, _) = quarters();
        let p = decision_threshold(&curve, 0.65).unwrap();
        assert_eq!(p.threshold, 0.6);
        assert_eq!((p.fpr, p.tpr), (0.5, 0.5));
        assert!(decision_threshold(&curve, 0.0).is_none());
        // The sentinel meets any threshold above the top score
        assert_eq!(decision_threshold(&curve, 5.0).unwrap(), curve.point(0));
    }

    #[test]
    fn test_neyman_pearson_sensitivity() {
        let (curve, _) = quarters();
        let p = neyman_pearson(&curve, 0.9, RateKind::Sensitivity).unwrap();
        assert_eq!(p.threshold, 0.3);
        assert_eq!(p.tpr, 1.0);
        assert!(neyman_pearson(&curve, 1.5, RateKind::Sensitivity).is_none());
    }

    #[test]
    fn test_neyman_pearson_specificity() {
        let (curve, _) = quarters();
        let p = neyman_pearson(&curve, 0.9, RateKind::Specificity).unwrap();
        assert_eq!(p.threshold, 0.8);
        let p = neyman_pearson(&curve, 0.75, RateKind::Specificity).unwrap();
        assert_eq!(p.threshold, 0.7);
        assert_eq!(p.tnr(), 0.75);
        // unreachable: even the sentinel has tnr 1 < 1.1
        assert!(neyman_pearson(&curve, 1.1, RateKind::Specificity).is_none());
        assert_eq!(neyman_pearson(&curve, 0.0, RateKind::Specificity).unwrap().fpr, 1.0);
    }

    #[test]
    fn test_max_youden_j() {
        let (curve, _) = quarters();
        let best = max_youden_j(&curve);
        let expected = curve
            .points()
            .map(|p| p.tpr + (1.0 - p.fpr) - 1.0)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(best.value, expected);
        assert_eq!(best.value, 0.5);
        // J = 0.5 at thresholds 0.8 and 0.3; the first is kept
        assert_eq!(best.point.threshold, 0.8);
    }

    #[test]
    fn test_max_youden_j_below_chance() {
        let curve = RocCurve::from_arrays(
            array![0.0, 0.5, 1.0],
            array![0.0, 0.25, 1.0],
            array![2.0, 1.0, 0.0],
        )
        .unwrap();
        let best = max_youden_j(&curve);
        assert_eq!(best.value, 0.0);
        assert_eq!(best.point.threshold, 2.0);
    }

    #[test]
    fn test_bayes_error() {
        let (curve, counts) = quarters();
        let best = bayes_error(&curve, counts);
        // 6 of 8 decisions correct at best
        assert_eq!(best.value, 0.25);
        assert_eq!(best.point.threshold, 0.8);
    }

    #[test]
    fn test_best_ppv_and_npv() {
        let (curve, counts) = quarters();
        let ppv = best_ppv(&curve, counts, 1.0).unwrap();
        assert_eq!(ppv.value, 1.0);
        // PPV 1 at thresholds 0.9 and 0.8; ties keep the last
        assert_eq!(ppv.point.threshold, 0.8);

        let npv = best_npv(&curve, counts, 1.0).unwrap();
        assert_eq!(npv.value, 1.0);
        // NPV 1 at thresholds 0.3 and 0.2; ties keep the first
        assert_eq!(npv.point.threshold, 0.3);

        assert!(matches!(
            best_ppv(&curve, counts, 1.5),
            Err(RocError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_best_ppv_intermediate_target() {
        let (curve, counts) = quarters();
        // PPV at threshold 0.5 is 3 / (3 + 2) = 0.6
        let ppv = best_ppv(&curve, counts, 0.6).unwrap();
        assert!((ppv.value - 0.6).abs() < 1e-12);
        assert_eq!(ppv.point.threshold, 0.5);
    }

    #[test]
    fn test_predictive_value_guards() {
        let counts = ClassCounts::new(10.0, 10.0).unwrap();
        assert_eq!(positive_predictive_value(0.0, 0.0, counts), 0.0);
        assert_eq!(negative_predictive_value(1.0, 1.0, counts), 0.0);
        assert!((positive_predictive_value(0.5, 0.5, counts) - 0.5).abs() < 1e-12);
    }
}
