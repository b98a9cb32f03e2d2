//! Area under the ROC curve
//!
//! Trapezoidal integration over the whole curve or over a specificity /
//! sensitivity window (McClish-style partial AUC), plus the Hanley & McNeil
//! closed-form uncertainty term.

use super::{RateKind, RocCurve};
use crate::dataset::ClassCounts;
use crate::error::{Result, RocError};
use ndarray::{s, ArrayView1};

/// Trapezoidal rule over points already sorted by `x`
fn trapezoid(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let mut area = 0.0;
    for i in 1..x.len() {
        area += (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0;
    }
    area
}

/// Area under an arbitrary `(x, y)` polyline.
///
/// Points are integrated in `(x, y)` order; input that is not sorted by `x`
/// is reordered first.
///
/// # Errors
///
/// `InputError` on mismatched lengths or fewer than two points.
pub fn auc(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<f64> {
    if x.len() != y.len() {
        return Err(RocError::InputError(format!(
            "x length {} != y length {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(RocError::InputError(format!(
            "at least 2 points are needed to compute an area, got {}",
            x.len()
        )));
    }

    let sorted = x.iter().zip(x.iter().skip(1)).all(|(a, b)| a <= b);
    if sorted {
        return Ok(trapezoid(x, y));
    }

    let mut order: Vec<usize> = (0..x.len()).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]).then(y[a].total_cmp(&y[b])));
    let xs: Vec<f64> = order.iter().map(|&i| x[i]).collect();
    let ys: Vec<f64> = order.iter().map(|&i| y[i]).collect();
    Ok(trapezoid(ArrayView1::from(&xs), ArrayView1::from(&ys)))
}

/// Full area under the curve, in `[0, 1]`
pub fn full_auc(curve: &RocCurve) -> f64 {
    // fpr is non-decreasing by construction, so no reordering is needed
    trapezoid(curve.fpr().view(), curve.tpr().view())
}

/// Partial area under the curve between two operating points.
///
/// With [`RateKind::Specificity`] the window `[op1, op2]` is a range of
/// specificity (a vertical slice, `fpr` in `[1 - op2, 1 - op1]`). With
/// [`RateKind::Sensitivity`] it is a range of sensitivity (a horizontal
/// slice); the area is assembled from the vertical slice between the
/// bounding curve points plus a rectangular correction. Build the curve with
/// `drop_intermediate = false` for an accurate result.
///
/// `partial_auc(curve, 0.0, 1.0, _)` is the full AUC.
///
/// # Errors
///
/// `DomainError` if `op1 >= op2`; `InvalidParameter` if either bound lies
/// outside `[0, 1]`.
pub fn partial_auc(curve: &RocCurve, op1: f64, op2: f64, kind: RateKind) -> Result<f64> {
    if !(0.0..=1.0).contains(&op1) {
        return Err(RocError::invalid_parameter("op1", op1, "must lie in [0, 1]"));
    }
    if !(0.0..=1.0).contains(&op2) {
        return Err(RocError::invalid_parameter("op2", op2, "must lie in [0, 1]"));
    }
    if op1 >= op2 {
        return Err(RocError::DomainError(format!(
            "op1 ({}) must be less than op2 ({})",
            op1, op2
        )));
    }
    if op1 == 0.0 && op2 == 1.0 {
        return Ok(full_auc(curve));
    }

    Ok(match kind {
        RateKind::Specificity => fpr_window_auc(curve, 1.0 - op2, 1.0 - op1),
        RateKind::Sensitivity => tpr_window_auc(curve, op1, op2),
    })
}

/// Area under the run of curve points whose fpr lies in `[lo, hi]`
fn fpr_window_auc(curve: &RocCurve, lo: f64, hi: f64) -> f64 {
    let fpr = curve.fpr();
    let start = fpr.iter().position(|&f| f >= lo);
    let end = fpr.iter().rposition(|&f| f <= hi);
    match (start, end) {
        (Some(first), Some(last)) if first < last => trapezoid(
            fpr.slice(s![first..=last]),
            curve.tpr().slice(s![first..=last]),
        ),
        _ => 0.0,
    }
}

/// Horizontal slice: integral of specificity over `tpr` in `[op1, op2]`
fn tpr_window_auc(curve: &RocCurve, op1: f64, op2: f64) -> f64 {
    let fpr = curve.fpr();
    let tpr = curve.tpr();
    let last = curve.len() - 1;

    // tpr ends at 1 and starts at 0, so both scans always stop on a point
    let lower = tpr.iter().position(|&t| t >= op1).unwrap_or(last);
    let upper = tpr.iter().rposition(|&t| t <= op2).unwrap_or(0);

    if lower > upper {
        // No curve point inside the band: it crosses the single segment
        // between `upper` and `lower`, along which fpr is linear in tpr.
        let (f0, t0) = (fpr[upper], tpr[upper]);
        let (f1, t1) = (fpr[lower], tpr[lower]);
        let mid = (op1 + op2) / 2.0;
        let f_mid = f0 + (mid - t0) * (f1 - f0) / (t1 - t0);
        return (op2 - op1) * (1.0 - f_mid);
    }

    let sp2 = 1.0 - fpr[lower];
    let sp1 = 1.0 - fpr[upper];
    let vertical = fpr_window_auc(curve, fpr[lower], fpr[upper]);
    vertical + (op2 - op1) * sp1 - (sp2 - sp1) * op1
}

/// Hanley & McNeil (1982) uncertainty term for an AUC estimate.
///
/// Returns `[A(1-A) + (Np-1)(Q1-A²) + (Nn-1)(Q2-A²)] / (Nn·Np)` with
/// `Q1 = A/(2-A)` and `Q2 = 2A²/(1+A)`. This is the Wilcoxon variance
/// expression; its square root is the conventional standard error.
pub fn auc_standard_error(auc: f64, counts: ClassCounts) -> f64 {
    let nn = counts.negatives();
    let np = counts.positives();
    let a2 = auc * auc;
    let q1 = auc / (2.0 - auc);
    let q2 = 2.0 * a2 / (1.0 + auc);
    (auc * (1.0 - auc) + (np - 1.0) * (q1 - a2) + (nn - 1.0) * (q2 - a2)) / (nn * np)
}
