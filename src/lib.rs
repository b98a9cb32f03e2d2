//! roc-calibrate - ROC analysis and probability calibration for binary classifiers
//!
//! This crate turns raw `(label, score)` pairs into:
//! - ROC curves with full and partial area under the curve
//! - Operating points (Neyman-Pearson, Youden's J, Bayes error, PPV/NPV, chi-square)
//! - Calibrated probabilities (Platt scaling, isotonic regression)
//! - Reliability curves and calibration metrics
//!
//! # Modules
//!
//! ## Curves
//! - [`dataset`] - Validated samples and class counts
//! - [`curve`] - ROC curve construction, AUC and partial AUC
//! - [`operating`] - Operating point selection and chi-square
//!
//! ## Calibration
//! - [`calibration`] - Platt scaling, PAV isotonic regression, reliability curves
//!
//! ## Reporting
//! - [`analysis`] - One-call analysis bundling the above into a serializable report
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use roc_calibrate::prelude::*;
//!
//! let labels = array![0.0, 0.0, 1.0, 1.0];
//! let scores = array![0.1, 0.4, 0.35, 0.8];
//! let curve = roc_curve(&labels, &scores, None, &CurveConfig::default())?;
//! assert_eq!(full_auc(&curve), 0.75);
//! # Ok::<(), RocError>(())
//! ```

// Core error handling
pub mod error;

// Curves and operating points
pub mod dataset;
pub mod curve;
pub mod operating;

// Calibration
pub mod calibration;

// Reporting
pub mod analysis;

pub use error::{Result, RocError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, RocError};

    // Data
    pub use crate::dataset::{ClassCounts, Dataset, Sample};

    // Curves
    pub use crate::curve::{
        auc, auc_standard_error, full_auc, partial_auc, roc_curve, CurveConfig, RateKind,
        RocCurve,
    };

    // Operating points
    pub use crate::operating::{
        bayes_error, best_npv, best_ppv, chi_square, decision_threshold, max_chi_square,
        max_youden_j, neyman_pearson, OperatingPoint, ScoredPoint,
    };

    // Calibration
    pub use crate::calibration::{
        pav_rocch, reliability_curve, sigmoid_calibrate, sigmoid_fit, CalibrationType,
        Calibrator, IsotonicRegression, PlattScaling, ReliabilityConfig, SigmoidConfig,
        SigmoidParams,
    };

    // Analysis
    pub use crate::analysis::{AnalysisConfig, CurveView, RocAnalysis, RocReport};
}
