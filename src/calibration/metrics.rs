//! Calibration metrics

use crate::error::{Result, RocError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Binning settings for [`reliability_curve`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Number of equal-width bins over [0, 1]
    pub bins: usize,
    /// Rescale scores so min -> 0 and max -> 1 before binning
    pub normalize: bool,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            bins: 10,
            normalize: true,
        }
    }
}

impl ReliabilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Reliability curve data, one entry per bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityTable {
    /// Bin centers `(i + 0.5) / bins`
    pub bin_centers: Vec<f64>,
    /// Mean (possibly normalized) score in each bin, 0 when empty
    pub mean_predicted: Vec<f64>,
    /// Mean target in each bin, 0 when empty
    pub empirical_positive_rate: Vec<f64>,
    /// Number of samples in each bin
    pub counts: Vec<usize>,
}

impl ReliabilityTable {
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Calibration metrics container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationMetrics {
    /// Expected Calibration Error
    pub ece: f64,
    /// Maximum Calibration Error
    pub mce: f64,
    /// Brier Score
    pub brier_score: f64,
    /// Average confidence
    pub avg_confidence: f64,
    /// Accuracy at the 0.5 cut
    pub accuracy: f64,
    pub reliability: ReliabilityTable,
}

fn check_lengths(target: &Array1<f64>, score: &Array1<f64>) -> Result<()> {
    if target.is_empty() {
        return Err(RocError::InputError("empty input".to_string()));
    }
    if target.len() != score.len() {
        return Err(RocError::InputError(format!(
            "target length {} != score length {}",
            target.len(),
            score.len()
        )));
    }
    Ok(())
}

/// Bin scores into equal-width cells and compare mean score with the
/// observed positive rate.
///
/// Cell `i` holds scores in `(i / bins, (i + 1) / bins]`. Empty cells report
/// 0 for both means. When normalizing a constant score vector, every score
/// maps to 1.
pub fn reliability_curve(
    target: &Array1<f64>,
    score: &Array1<f64>,
    config: &ReliabilityConfig,
) -> Result<ReliabilityTable> {
    check_lengths(target, score)?;
    if config.bins == 0 {
        return Err(RocError::invalid_parameter("bins", config.bins, "must be at least 1"));
    }
    if score.iter().any(|s| !s.is_finite()) {
        return Err(RocError::InputError("scores must be finite".to_string()));
    }

    let score = if config.normalize {
        let min = score.fold(f64::INFINITY, |m, &s| m.min(s));
        let max = score.fold(f64::NEG_INFINITY, |m, &s| m.max(s));
        let range = max - min;
        if range > 0.0 {
            score.mapv(|s| (s - min) / range)
        } else {
            Array1::ones(score.len())
        }
    } else {
        score.clone()
    };

    let bins = config.bins;
    let mut table = ReliabilityTable {
        bin_centers: Vec::with_capacity(bins),
        mean_predicted: Vec::with_capacity(bins),
        empirical_positive_rate: Vec::with_capacity(bins),
        counts: Vec::with_capacity(bins),
    };

    for i in 0..bins {
        // Pin the top edge so a score of exactly 1.0 always lands in the last bin
        let lo = i as f64 / bins as f64;
        let hi = if i + 1 == bins {
            1.0
        } else {
            (i + 1) as f64 / bins as f64
        };
        let (mut score_sum, mut target_sum, mut count) = (0.0, 0.0, 0usize);
        for (&s, &t) in score.iter().zip(target.iter()) {
            if s > lo && s <= hi {
                score_sum += s;
                target_sum += t;
                count += 1;
            }
        }

        table.bin_centers.push((i as f64 + 0.5) / bins as f64);
        table.counts.push(count);
        if count > 0 {
            table.mean_predicted.push(score_sum / count as f64);
            table.empirical_positive_rate.push(target_sum / count as f64);
        } else {
            table.mean_predicted.push(0.0);
            table.empirical_positive_rate.push(0.0);
        }
    }

    Ok(table)
}

/// Compute Expected Calibration Error (ECE)
///
/// ECE = sum_i (|B_i| / n) * |acc(B_i) - conf(B_i)|
///
/// where B_i is bin i, acc is accuracy, conf is average confidence
pub fn expected_calibration_error(table: &ReliabilityTable) -> f64 {
    let n = table.total();
    if n == 0 {
        return 0.0;
    }
    (0..table.bins())
        .filter(|&i| table.counts[i] > 0)
        .map(|i| {
            let gap = (table.empirical_positive_rate[i] - table.mean_predicted[i]).abs();
            table.counts[i] as f64 / n as f64 * gap
        })
        .sum()
}

/// Compute Maximum Calibration Error (MCE)
///
/// MCE = max_i |acc(B_i) - conf(B_i)|
pub fn maximum_calibration_error(table: &ReliabilityTable) -> f64 {
    (0..table.bins())
        .filter(|&i| table.counts[i] > 0)
        .map(|i| (table.empirical_positive_rate[i] - table.mean_predicted[i]).abs())
        .fold(0.0, f64::max)
}

/// Compute Brier Score
///
/// Brier = (1/n) * sum_i (p_i - y_i)^2
pub fn brier_score(probs: &Array1<f64>, labels: &Array1<f64>) -> Result<f64> {
    check_lengths(labels, probs)?;
    let n = probs.len() as f64;
    let score: f64 = probs
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| (p - y).powi(2))
        .sum();
    Ok(score / n)
}

/// Compute all calibration metrics for probabilities already in [0, 1]
pub fn compute_calibration_metrics(
    probs: &Array1<f64>,
    labels: &Array1<f64>,
    n_bins: usize,
) -> Result<CalibrationMetrics> {
    let config = ReliabilityConfig::new().with_bins(n_bins).with_normalize(false);
    let reliability = reliability_curve(labels, probs, &config)?;
    let brier = brier_score(probs, labels)?;

    let avg_confidence = probs.mean().unwrap_or(0.0);
    let correct = probs
        .iter()
        .zip(labels.iter())
        .filter(|(&p, &y)| (p >= 0.5) == (y > 0.5))
        .count();
    let accuracy = correct as f64 / probs.len() as f64;

    Ok(CalibrationMetrics {
        ece: expected_calibration_error(&reliability),
        mce: maximum_calibration_error(&reliability),
        brier_score: brier,
        avg_confidence,
        accuracy,
        reliability,
    })
}
