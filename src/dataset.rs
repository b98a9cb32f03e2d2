//! Validated binary-classification samples
//!
//! A [`Dataset`] is the single entry point for caller-supplied arrays: labels
//! are remapped to `{0, 1}`, scores and weights are checked, and class counts
//! are derived once.

use crate::error::{Result, RocError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// One labelled, scored observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 1.0 for the positive class, 0.0 otherwise
    pub label: f64,
    /// Classifier output (probability, decision value, ...)
    pub score: f64,
    /// Sample weight, 1.0 unless supplied
    pub weight: f64,
}

/// Number of negative and positive samples behind a curve.
///
/// Both counts are strictly positive; construct through [`ClassCounts::new`]
/// or [`Dataset::class_counts`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassCounts {
    negatives: f64,
    positives: f64,
}

impl ClassCounts {
    /// Create class counts, rejecting empty or non-finite classes
    pub fn new(negatives: f64, positives: f64) -> Result<Self> {
        if !(negatives.is_finite() && negatives > 0.0) {
            return Err(RocError::InputError(format!(
                "negative class count must be positive, got {}",
                negatives
            )));
        }
        if !(positives.is_finite() && positives > 0.0) {
            return Err(RocError::InputError(format!(
                "positive class count must be positive, got {}",
                positives
            )));
        }
        Ok(Self {
            negatives,
            positives,
        })
    }

    /// Number of negative samples (`Nn`)
    pub fn negatives(&self) -> f64 {
        self.negatives
    }

    /// Number of positive samples (`Np`)
    pub fn positives(&self) -> f64 {
        self.positives
    }

    /// `Nn + Np`
    pub fn total(&self) -> f64 {
        self.negatives + self.positives
    }
}

/// Ordered collection of samples with labels already mapped to `{0, 1}`
#[derive(Debug, Clone)]
pub struct Dataset {
    labels: Array1<f64>,
    scores: Array1<f64>,
    weights: Array1<f64>,
}

impl Dataset {
    /// Build an unweighted dataset from binary labels (`{0,1}` or `{-1,1}`)
    pub fn new(labels: &Array1<f64>, scores: &Array1<f64>) -> Result<Self> {
        Self::from_parts(labels, scores, None, None)
    }

    /// Build a dataset from slices, see [`Dataset::new`]
    pub fn from_slices(labels: &[f64], scores: &[f64]) -> Result<Self> {
        Self::new(&Array1::from_vec(labels.to_vec()), &Array1::from_vec(scores.to_vec()))
    }

    /// Build a dataset with optional sample weights and positive-label remap.
    ///
    /// With `pos_label = Some(v)`, samples labelled `v` are positive and every
    /// other label is negative. Without it, labels must all lie in `{0, 1}` or
    /// all in `{-1, 1}`, and `1` is positive.
    pub fn from_parts(
        labels: &Array1<f64>,
        scores: &Array1<f64>,
        weights: Option<&Array1<f64>>,
        pos_label: Option<f64>,
    ) -> Result<Self> {
        let n = labels.len();
        if n == 0 {
            return Err(RocError::InputError("empty dataset".to_string()));
        }
        if scores.len() != n {
            return Err(RocError::InputError(format!(
                "labels length {} != scores length {}",
                n,
                scores.len()
            )));
        }
        if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
            return Err(RocError::InputError(format!(
                "score at index {} is not finite",
                i
            )));
        }

        let weights = match weights {
            Some(w) => {
                if w.len() != n {
                    return Err(RocError::InputError(format!(
                        "weights length {} != labels length {}",
                        w.len(),
                        n
                    )));
                }
                if let Some(i) = w.iter().position(|&x| !(x.is_finite() && x >= 0.0)) {
                    return Err(RocError::InputError(format!(
                        "weight at index {} must be finite and non-negative",
                        i
                    )));
                }
                w.clone()
            }
            None => Array1::ones(n),
        };

        let labels = match pos_label {
            Some(pos) => labels.mapv(|y| if y == pos { 1.0 } else { 0.0 }),
            None => binarize(labels)?,
        };

        Ok(Self {
            labels,
            scores: scores.clone(),
            weights,
        })
    }

    /// Number of samples (`N`)
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed dataset
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels mapped to `{0, 1}`
    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    pub fn scores(&self) -> &Array1<f64> {
        &self.scores
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Iterate over samples in input order
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.labels
            .iter()
            .zip(self.scores.iter())
            .zip(self.weights.iter())
            .map(|((&label, &score), &weight)| Sample {
                label,
                score,
                weight,
            })
    }

    /// Number of positive samples (`Np`)
    pub fn n_pos(&self) -> usize {
        self.labels.iter().filter(|&&y| y > 0.5).count()
    }

    /// Number of negative samples (`Nn`)
    pub fn n_neg(&self) -> usize {
        self.len() - self.n_pos()
    }

    /// True when one of the classes is absent
    pub fn is_single_class(&self) -> bool {
        self.n_pos() == 0 || self.n_neg() == 0
    }

    /// Unweighted class counts; fails on a single-class dataset
    pub fn class_counts(&self) -> Result<ClassCounts> {
        let n_pos = self.n_pos();
        let n_neg = self.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(RocError::InputError(format!(
                "both classes are required, got {} positives and {} negatives",
                n_pos, n_neg
            )));
        }
        ClassCounts::new(n_neg as f64, n_pos as f64)
    }

    /// Sum of sample weights per class, as `(negatives, positives)`
    pub fn weighted_class_totals(&self) -> (f64, f64) {
        self.samples().fold((0.0, 0.0), |(neg, pos), s| {
            if s.label > 0.5 {
                (neg, pos + s.weight)
            } else {
                (neg + s.weight, pos)
            }
        })
    }
}

/// Map `{0,1}` or `{-1,1}` labels to `{0,1}`
fn binarize(labels: &Array1<f64>) -> Result<Array1<f64>> {
    let mut has_zero = false;
    let mut has_minus_one = false;
    for &y in labels.iter() {
        if y == 0.0 {
            has_zero = true;
        } else if y == -1.0 {
            has_minus_one = true;
        } else if y != 1.0 {
            return Err(RocError::InputError(format!(
                "label {} is not binary; pass pos_label to select the positive class",
                y
            )));
        }
    }
    if has_zero && has_minus_one {
        return Err(RocError::InputError(
            "labels mix {0, 1} and {-1, 1} encodings; pass pos_label".to_string(),
        ));
    }
    Ok(labels.mapv(|y| if y == 1.0 { 1.0 } else { 0.0 }))
}
