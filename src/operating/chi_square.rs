//! Chi-square statistic of the 2x2 contingency table at an operating point

use super::{OperatingPoint, ScoredPoint};
use crate::curve::RocCurve;
use crate::dataset::ClassCounts;
use crate::error::{Result, RocError};
use ndarray::{Array1, Array2, Zip};

/// Added to every expected count so empty margins do not divide by zero
const EXPECTED_FLOOR: f64 = 1e-6;

/// Contour levels for chi-square plots with one degree of freedom.
///
/// 3.84, 6.63 and 7.88 are the critical values at alpha = 0.05, 0.01 and
/// 0.005; the rest double from 16.
pub const CHI_SQUARE_LEVELS: [f64; 11] = [
    3.84, 6.63, 7.88, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0,
];

/// Pearson chi-square of the confusion matrix implied by `(tpr, fpr)`
pub fn chi_square(tpr: f64, fpr: f64, counts: ClassCounts) -> f64 {
    let nn = counts.negatives();
    let np = counts.positives();
    let n = counts.total();

    let tp = tpr * np;
    let fp = fpr * nn;
    let tn = (1.0 - fpr) * nn;
    let fn_ = (1.0 - tpr) * np;

    // predicted-positive and predicted-negative marginals
    let rp = tp + fp;
    let rn = tn + fn_;

    let etp = rp * np / n + EXPECTED_FLOOR;
    let efp = rp * nn / n + EXPECTED_FLOOR;
    let etn = rn * nn / n + EXPECTED_FLOOR;
    let efn = rn * np / n + EXPECTED_FLOOR;

    (tp - etp).powi(2) / etp
        + (fp - efp).powi(2) / efp
        + (tn - etn).powi(2) / etn
        + (fn_ - efn).powi(2) / efn
}

/// Elementwise [`chi_square`] over paired rate arrays
pub fn chi_square_array(
    tpr: &Array1<f64>,
    fpr: &Array1<f64>,
    counts: ClassCounts,
) -> Result<Array1<f64>> {
    if tpr.len() != fpr.len() {
        return Err(RocError::InputError(format!(
            "tpr length {} != fpr length {}",
            tpr.len(),
            fpr.len()
        )));
    }
    Ok(Zip::from(tpr)
        .and(fpr)
        .map_collect(|&t, &f| chi_square(t, f, counts)))
}

/// Chi-square surface over the ROC square for contour plots.
///
/// Cell `(i, j)` holds the statistic at `fpr = i / resolution`,
/// `tpr = j / resolution`. Cells below the chance diagonal (`j < i`) are 0.
pub fn chi_square_grid(resolution: usize, counts: ClassCounts) -> Result<Array2<f64>> {
    if resolution == 0 {
        return Err(RocError::invalid_parameter(
            "resolution",
            resolution,
            "must be at least 1",
        ));
    }
    let step = 1.0 / resolution as f64;
    Ok(Array2::from_shape_fn((resolution, resolution), |(i, j)| {
        if j >= i {
            chi_square(j as f64 * step, i as f64 * step, counts)
        } else {
            0.0
        }
    }))
}

/// Curve point with the largest chi-square; ties keep the first
pub fn max_chi_square(curve: &RocCurve, counts: ClassCounts) -> ScoredPoint {
    let score = |p: &OperatingPoint| chi_square(p.tpr, p.fpr, counts);
    let first = curve.point(0);
    let mut best = ScoredPoint {
        value: score(&first),
        point: first,
    };
    for p in curve.points().skip(1) {
        let chi = score(&p);
        if chi > best.value {
            best = ScoredPoint { value: chi, point: p };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use ndarray::array;

    fn hundred_each() -> ClassCounts {
        ClassCounts::new(100.0, 100.0).unwrap()
    }

    #[test]
    fn test_perfect_separation_is_large() {
        let chi = chi_square(1.0, 0.0, hundred_each());
        // 4 cells of (100 - 50)^2 / 50
        assert!((chi - 200.0).abs() < 1e-3);
        assert!(chi > CHI_SQUARE_LEVELS[0]);
    }

    #[test]
    fn test_chance_is_near_zero() {
        let chi = chi_square(0.5, 0.5, hundred_each());
        assert!(chi.abs() < 1e-6);
    }

    #[test]
    fn test_empty_margin_is_finite() {
        // Nothing predicted positive: rp = 0
        let chi = chi_square(0.0, 0.0, hundred_each());
        assert!(chi.is_finite());
        assert!(chi < 1e-3);
    }

    #[test]
    fn test_array_matches_scalar() {
        let tpr = array![1.0, 0.5, 0.8];
        let fpr = array![0.0, 0.5, 0.1];
        let chi = chi_square_array(&tpr, &fpr, hundred_each()).unwrap();
        for i in 0..3 {
            assert_eq!(chi[i], chi_square(tpr[i], fpr[i], hundred_each()));
        }
        assert!(chi_square_array(&tpr, &array![0.0], hundred_each()).is_err());
    }

    #[test]
    fn test_grid_upper_triangle() {
        let grid = chi_square_grid(10, hundred_each()).unwrap();
        assert_eq!(grid.dim(), (10, 10));
        assert_eq!(grid[[5, 2]], 0.0);
        assert!(grid[[0, 9]] > grid[[0, 5]]);
        assert!(chi_square_grid(0, hundred_each()).is_err());
    }

    #[test]
    fn test_max_chi_square_point() {
        let ds = Dataset::new(
            &array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
            &array![0.1, 0.2, 0.3, 0.6, 0.5, 0.7, 0.8, 0.9],
        )
        .unwrap();
        let curve = RocCurve::from_dataset(&ds, false).unwrap();
        let best = max_chi_square(&curve, ds.class_counts().unwrap());
        // threshold 0.7 (tpr 0.75, fpr 0) and 0.5 (tpr 1, fpr 0.25) are the
        // best balanced splits
        assert!(best.point.threshold == 0.7 || best.point.threshold == 0.5);
        for p in curve.points() {
            assert!(chi_square(p.tpr, p.fpr, ds.class_counts().unwrap()) <= best.value);
        }
    }
}
