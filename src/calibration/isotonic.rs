//! Isotonic regression calibration
//!
//! Pool-adjacent-violators (PAV) turns score-sorted labels into the
//! non-decreasing sequence closest to them in squared error. Read as a
//! score-to-probability map it traces the ROC convex hull (Fawcett &
//! Niculescu-Mizil, 2007).

use crate::calibration::Calibrator;
use crate::error::{Result, RocError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Contiguous run of sorted indices sharing one calibrated value (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSet {
    pub start: usize,
    pub end: usize,
}

impl LevelSet {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// A level set always holds at least one index
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }
}

/// Result of [`pav_rocch`]: samples sorted by score with their calibrated
/// probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationMapping {
    /// Scores, ascending
    pub scores: Vec<f64>,
    /// Targets in score order
    pub targets: Vec<f64>,
    /// Non-decreasing calibrated values, one per sample
    pub calibrated: Vec<f64>,
    /// Blocks pooled by PAV, covering `0..len` in order. Adjacent blocks may
    /// share a calibrated value, since equal neighbours are not merged.
    pub level_sets: Vec<LevelSet>,
}

impl CalibrationMapping {
    pub fn len(&self) -> usize {
        self.calibrated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calibrated.is_empty()
    }

    /// Level set containing sorted index `index`
    pub fn level_set_of(&self, index: usize) -> Option<LevelSet> {
        let pos = self.level_sets.partition_point(|ls| ls.end < index);
        self.level_sets
            .get(pos)
            .copied()
            .filter(|ls| ls.contains(index))
    }
}

/// Pool of adjacent samples during PAV
struct Block {
    value: f64,
    weight: f64,
    start: usize,
    end: usize,
}

impl Block {
    fn absorb(&mut self, next: Block) {
        let total = self.weight + next.weight;
        self.value = if total > 0.0 {
            (self.value * self.weight + next.value * next.weight) / total
        } else {
            let (n1, n2) = ((self.end - self.start + 1) as f64, (next.end - next.start + 1) as f64);
            (self.value * n1 + next.value * n2) / (n1 + n2)
        };
        self.weight = total;
        self.end = next.end;
    }
}

/// Weighted pool-adjacent-violators in one pass.
///
/// Each value enters as its own block; while the newest block's mean falls
/// below its predecessor's, the two are pooled into their weighted mean.
/// Returns the fitted sequence and its level sets.
pub fn pool_adjacent_violators(y: &[f64], weights: &[f64]) -> Result<(Vec<f64>, Vec<LevelSet>)> {
    if y.len() != weights.len() {
        return Err(RocError::InputError(format!(
            "values length {} != weights length {}",
            y.len(),
            weights.len()
        )));
    }

    let mut blocks: Vec<Block> = Vec::with_capacity(y.len());
    for (i, (&value, &weight)) in y.iter().zip(weights).enumerate() {
        blocks.push(Block {
            value,
            weight,
            start: i,
            end: i,
        });
        while blocks.len() > 1 && blocks[blocks.len() - 2].value > blocks[blocks.len() - 1].value {
            if let Some(top) = blocks.pop() {
                if let Some(prev) = blocks.last_mut() {
                    prev.absorb(top);
                }
            }
        }
    }

    let mut fitted = Vec::with_capacity(y.len());
    let mut level_sets = Vec::with_capacity(blocks.len());
    for block in &blocks {
        fitted.extend(std::iter::repeat(block.value).take(block.end - block.start + 1));
        level_sets.push(LevelSet {
            start: block.start,
            end: block.end,
        });
    }
    Ok((fitted, level_sets))
}

/// PAV calibration of `score` against `target` (labels in `{0,1}` give
/// probabilities).
///
/// Samples are sorted by ascending score (ties keep input order).
pub fn pav_rocch(target: &Array1<f64>, score: &Array1<f64>) -> Result<CalibrationMapping> {
    pav_rocch_weighted(target, score, &Array1::ones(target.len()))
}

/// [`pav_rocch`] with non-negative sample weights
pub fn pav_rocch_weighted(
    target: &Array1<f64>,
    score: &Array1<f64>,
    weights: &Array1<f64>,
) -> Result<CalibrationMapping> {
    let n = target.len();
    if n == 0 {
        return Err(RocError::InputError("empty input".to_string()));
    }
    if score.len() != n || weights.len() != n {
        return Err(RocError::InputError(format!(
            "target length {}, score length {} and weights length {} must match",
            n,
            score.len(),
            weights.len()
        )));
    }
    if score.iter().chain(target.iter()).any(|v| !v.is_finite()) {
        return Err(RocError::InputError(
            "targets and scores must be finite".to_string(),
        ));
    }
    if weights.iter().any(|&w| !(w.is_finite() && w >= 0.0)) {
        return Err(RocError::InputError(
            "weights must be finite and non-negative".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| score[a].total_cmp(&score[b]));

    let scores: Vec<f64> = order.iter().map(|&i| score[i]).collect();
    let targets: Vec<f64> = order.iter().map(|&i| target[i]).collect();
    let sorted_weights: Vec<f64> = order.iter().map(|&i| weights[i]).collect();

    let (calibrated, level_sets) = pool_adjacent_violators(&targets, &sorted_weights)?;
    debug!(samples = n, level_sets = level_sets.len(), "isotonic fit");

    Ok(CalibrationMapping {
        scores,
        targets,
        calibrated,
        level_sets,
    })
}

/// Isotonic regression calibrator
///
/// Fits PAV on training scores and evaluates new scores by linear
/// interpolation between the fitted knots, constant beyond the ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsotonicRegression {
    /// Knot scores, strictly increasing
    x_values: Option<Vec<f64>>,
    /// Knot probabilities, non-decreasing
    y_values: Option<Vec<f64>>,
    /// Whether to clip predictions to [0, 1]
    clip: bool,
}

impl IsotonicRegression {
    /// Create new isotonic regression calibrator
    pub fn new() -> Self {
        Self {
            x_values: None,
            y_values: None,
            clip: true,
        }
    }

    /// Set whether to clip output to [0, 1]
    pub fn with_clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }

    /// Fit with sample weights
    pub fn fit_weighted(
        &mut self,
        scores: &Array1<f64>,
        labels: &Array1<f64>,
        weights: &Array1<f64>,
    ) -> Result<()> {
        let mapping = pav_rocch_weighted(labels, scores, weights)?;
        let weights: Vec<f64> = {
            // Weights in score order, needed to average tied scores
            let mut order: Vec<usize> = (0..scores.len()).collect();
            order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
            order.iter().map(|&i| weights[i]).collect()
        };
        self.build_knots(&mapping, &weights);
        Ok(())
    }

    /// Knots of the fitted step function, `(scores, probabilities)`
    pub fn knots(&self) -> Option<(&[f64], &[f64])> {
        match (&self.x_values, &self.y_values) {
            (Some(x), Some(y)) => Some((x.as_slice(), y.as_slice())),
            _ => None,
        }
    }

    /// Collapse tied scores into one knot and drop knots inside flat runs
    fn build_knots(&mut self, mapping: &CalibrationMapping, weights: &[f64]) {
        let mut xs: Vec<f64> = Vec::new();
        let mut ys: Vec<f64> = Vec::new();

        let n = mapping.len();
        let mut i = 0;
        while i < n {
            let x = mapping.scores[i];
            let (mut sum, mut weight, mut count) = (0.0, 0.0, 0.0);
            let mut plain = 0.0;
            while i < n && mapping.scores[i] == x {
                sum += mapping.calibrated[i] * weights[i];
                weight += weights[i];
                plain += mapping.calibrated[i];
                count += 1.0;
                i += 1;
            }
            xs.push(x);
            ys.push(if weight > 0.0 { sum / weight } else { plain / count });
        }

        let mut x_vals = Vec::with_capacity(xs.len());
        let mut y_vals = Vec::with_capacity(ys.len());
        for k in 0..xs.len() {
            let interior = k > 0 && k + 1 < xs.len();
            if interior && ys[k - 1] == ys[k] && ys[k] == ys[k + 1] {
                continue;
            }
            x_vals.push(xs[k]);
            y_vals.push(ys[k]);
        }

        self.x_values = Some(x_vals);
        self.y_values = Some(y_vals);
    }

    fn interpolate(x_vals: &[f64], y_vals: &[f64], x: f64) -> f64 {
        let (first, last) = (0, x_vals.len() - 1);
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= x_vals[first] {
            return y_vals[first];
        }
        if x >= x_vals[last] {
            return y_vals[last];
        }

        // x_vals[lo] <= x < x_vals[hi]
        let hi = x_vals.partition_point(|&k| k <= x);
        let lo = hi - 1;
        let (x0, x1) = (x_vals[lo], x_vals[hi]);
        let (y0, y1) = (y_vals[lo], y_vals[hi]);
        y0 + (x - x0) / (x1 - x0) * (y1 - y0)
    }
}

impl Default for IsotonicRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibrator for IsotonicRegression {
    fn fit(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<()> {
        self.fit_weighted(scores, labels, &Array1::ones(scores.len()))
    }

    fn calibrate(&self, scores: &Array1<f64>) -> Result<Array1<f64>> {
        let (x_vals, y_vals) = self.knots().ok_or(RocError::ModelNotFitted)?;
        Ok(scores.mapv(|s| {
            let p = Self::interpolate(x_vals, y_vals, s);
            if self.clip {
                p.clamp(0.0, 1.0)
            } else {
                p
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Quadratic merge-scan: repeatedly pool the level sets around the first
    /// adjacent violation until the sequence is monotone.
    fn merge_scan(y: &[f64]) -> (Vec<f64>, Vec<(usize, usize)>) {
        let n = y.len();
        let mut v = y.to_vec();
        let mut levels: Vec<(usize, usize)> = (0..n).map(|i| (i, i)).collect();
        while let Some(viol) = (0..n.saturating_sub(1)).find(|&i| v[i + 1] - v[i] < 0.0) {
            let start = levels[viol].0;
            let last = levels[viol + 1].1;
            let mean = y[start..=last].iter().sum::<f64>() / (last - start + 1) as f64;
            for i in start..=last {
                v[i] = mean;
                levels[i] = (start, last);
            }
        }
        levels.dedup();
        (v, levels)
    }

    #[test]
    fn test_pav_matches_merge_scan() {
        let y = vec![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let (fitted, level_sets) = pool_adjacent_violators(&y, &vec![1.0; y.len()]).unwrap();
        let (expected, expected_levels) = merge_scan(&y);
        for (a, b) in fitted.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        let levels: Vec<(usize, usize)> = level_sets.iter().map(|l| (l.start, l.end)).collect();
        assert_eq!(levels, expected_levels);
    }

    #[test]
    fn test_pav_rocch_sorts_by_score() {
        let target = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let score = array![0.0, 0.1, 0.4, 0.35, 0.8, 1.0];
        let mapping = pav_rocch(&target, &score).unwrap();

        assert_eq!(mapping.scores, vec![0.0, 0.1, 0.35, 0.4, 0.8, 1.0]);
        assert_eq!(mapping.targets, vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
        assert_eq!(mapping.calibrated, vec![0.0, 0.0, 0.5, 0.5, 1.0, 1.0]);
        // Equal neighbours are not violations, so only the 1,0 pair pools
        assert_eq!(mapping.level_sets.len(), 5);
        assert_eq!(mapping.level_set_of(3), Some(LevelSet { start: 2, end: 3 }));
        assert_eq!(mapping.level_set_of(9), None);
    }

    #[test]
    fn test_weighted_pooling() {
        let (fitted, level_sets) = pool_adjacent_violators(&[1.0, 0.0], &[3.0, 1.0]).unwrap();
        assert_eq!(fitted, vec![0.75, 0.75]);
        assert_eq!(level_sets, vec![LevelSet { start: 0, end: 1 }]);
    }

    #[test]
    fn test_pav_rejects_bad_input() {
        assert!(pav_rocch(&array![0.0, 1.0], &array![0.5]).is_err());
        assert!(pav_rocch(&Array1::zeros(0), &Array1::zeros(0)).is_err());
        assert!(pool_adjacent_violators(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_isotonic_basic() {
        let probs = array![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
        let labels = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];

        let mut calibrator = IsotonicRegression::new();
        calibrator.fit(&probs, &labels).unwrap();

        let calibrated = calibrator.calibrate(&probs).unwrap();
        assert_eq!(calibrated, labels);
        // Between the last 0 and the first 1 the map is linear
        let mid = calibrator.calibrate(&array![0.45]).unwrap();
        assert!((mid[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_isotonic_non_monotonic_input() {
        let probs = array![0.1, 0.3, 0.5, 0.7, 0.9];
        let labels = array![0.0, 1.0, 0.0, 1.0, 1.0];

        let mut calibrator = IsotonicRegression::new();
        calibrator.fit(&probs, &labels).unwrap();

        let calibrated = calibrator.calibrate(&probs).unwrap();
        assert_eq!(calibrated, array![0.0, 0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_isotonic_tied_scores_share_a_value() {
        let mut calibrator = IsotonicRegression::new();
        calibrator
            .fit(&array![0.2, 0.5, 0.5, 0.9], &array![0.0, 1.0, 0.0, 1.0])
            .unwrap();
        let (x, y) = calibrator.knots().unwrap();
        assert_eq!(x, &[0.2, 0.5, 0.9]);
        assert_eq!(y, &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_not_fitted() {
        let calibrator = IsotonicRegression::new();
        assert!(matches!(
            calibrator.calibrate(&array![0.5]),
            Err(RocError::ModelNotFitted)
        ));
    }
}
