//! Platt scaling (sigmoid calibration)

use crate::calibration::Calibrator;
use crate::error::{Result, RocError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Floor inside the logarithms of the objective
const LOG_FLOOR: f64 = f64::MIN_POSITIVE;
/// Armijo sufficient-decrease constant
const ARMIJO_C1: f64 = 1e-4;
/// Step halvings tried before the line search gives up
const MAX_BACKTRACKS: usize = 60;

/// Fitted sigmoid `p(s) = 1 / (1 + exp(A·s + B))`
///
/// `A < 0` means probability grows with the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidParams {
    pub a: f64,
    pub b: f64,
}

impl SigmoidParams {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Calibrated probability of a single score
    pub fn probability(&self, score: f64) -> f64 {
        let (p, _) = probabilities(self.a * score + self.b);
        p
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Optimizer settings for [`sigmoid_fit`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigmoidConfig {
    /// Iteration budget
    pub max_iter: usize,
    /// Stop once every gradient component is below this
    pub gtol: f64,
}

impl Default for SigmoidConfig {
    fn default() -> Self {
        Self {
            max_iter: 400,
            gtol: 1e-5,
        }
    }
}

impl SigmoidConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }
}

/// The optimizer stopped before reaching the gradient tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceWarning {
    pub iterations: usize,
    /// Largest gradient component at the returned iterate
    pub gradient_norm: f64,
}

/// Outcome of [`sigmoid_fit`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigmoidFit {
    pub params: SigmoidParams,
    pub iterations: usize,
    /// Objective value at `params`
    pub loss: f64,
    pub warning: Option<ConvergenceWarning>,
}

impl SigmoidFit {
    pub fn converged(&self) -> bool {
        self.warning.is_none()
    }
}

/// `(P, 1 - P)` for `P = 1 / (1 + exp(f))` without overflow
fn probabilities(f: f64) -> (f64, f64) {
    if f >= 0.0 {
        let e = (-f).exp();
        (e / (1.0 + e), 1.0 / (1.0 + e))
    } else {
        let e = f.exp();
        (1.0 / (1.0 + e), e / (1.0 + e))
    }
}

/// Training data with the smoothed targets already applied
struct Objective<'a> {
    scores: &'a [f64],
    targets: Vec<f64>,
    weights: Vec<f64>,
}

impl Objective<'_> {
    fn loss(&self, x: [f64; 2]) -> f64 {
        let mut loss = 0.0;
        for ((&s, &t), &w) in self.scores.iter().zip(&self.targets).zip(&self.weights) {
            let (p, q) = probabilities(x[0] * s + x[1]);
            loss -= w * (t * (p + LOG_FLOOR).ln() + (1.0 - t) * (q + LOG_FLOOR).ln());
        }
        loss
    }

    fn gradient(&self, x: [f64; 2]) -> [f64; 2] {
        let mut grad = [0.0; 2];
        for ((&s, &t), &w) in self.scores.iter().zip(&self.targets).zip(&self.weights) {
            let (p, q) = probabilities(x[0] * s + x[1]);
            let g = (t * q - (1.0 - t) * p) * w;
            grad[0] += g * s;
            grad[1] += g;
        }
        grad
    }
}

fn dot(u: [f64; 2], v: [f64; 2]) -> f64 {
    u[0] * v[0] + u[1] * v[1]
}

fn mat_vec(h: &[[f64; 2]; 2], v: [f64; 2]) -> [f64; 2] {
    [dot(h[0], v), dot(h[1], v)]
}

fn inf_norm(v: [f64; 2]) -> f64 {
    v[0].abs().max(v[1].abs())
}

const IDENTITY: [[f64; 2]; 2] = [[1.0, 0.0], [0.0, 1.0]];

/// Fit Platt's sigmoid to decision scores.
///
/// Labels `> 0` count as positive. Targets are smoothed to
/// `(N+ + 1) / (N+ + 2)` and `1 / (N- + 2)`, and the weighted cross-entropy
/// is minimised by BFGS from `A = 0, B = ln((N- + 1) / (N+ + 1))`.
/// Running out of iterations is not an error: the last iterate is returned
/// with a [`ConvergenceWarning`].
pub fn sigmoid_fit(
    target: &Array1<f64>,
    score: &Array1<f64>,
    weights: Option<&Array1<f64>>,
    config: &SigmoidConfig,
) -> Result<SigmoidFit> {
    let n = target.len();
    if n == 0 {
        return Err(RocError::InputError("empty input".to_string()));
    }
    if score.len() != n {
        return Err(RocError::InputError(format!(
            "target length {} != score length {}",
            n,
            score.len()
        )));
    }
    if score.iter().any(|s| !s.is_finite()) {
        return Err(RocError::InputError("scores must be finite".to_string()));
    }
    if target.iter().any(|t| !t.is_finite()) {
        return Err(RocError::InputError("targets must be finite".to_string()));
    }
    let weights: Vec<f64> = match weights {
        Some(w) if w.len() != n => {
            return Err(RocError::InputError(format!(
                "weights length {} != sample count {}",
                w.len(),
                n
            )))
        }
        Some(w) if w.iter().any(|&v| !(v.is_finite() && v >= 0.0)) => {
            return Err(RocError::InputError(
                "weights must be finite and non-negative".to_string(),
            ))
        }
        Some(w) => w.to_vec(),
        None => vec![1.0; n],
    };
    if config.max_iter == 0 {
        return Err(RocError::invalid_parameter(
            "max_iter",
            config.max_iter,
            "must be at least 1",
        ));
    }

    let prior0 = target.iter().filter(|&&t| t <= 0.0).count() as f64;
    let prior1 = n as f64 - prior0;
    let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
    let lo_target = 1.0 / (prior0 + 2.0);

    let scores = score.to_vec();
    let objective = Objective {
        scores: &scores,
        targets: target
            .iter()
            .map(|&t| if t > 0.0 { hi_target } else { lo_target })
            .collect(),
        weights,
    };

    let mut x = [0.0, ((prior0 + 1.0) / (prior1 + 1.0)).ln()];
    let mut fx = objective.loss(x);
    let mut grad = objective.gradient(x);
    let mut h = IDENTITY;
    let mut scaled = false;
    let mut iterations = 0;

    while iterations < config.max_iter && inf_norm(grad) >= config.gtol {
        iterations += 1;

        let mut dir = mat_vec(&h, grad).map(|v| -v);
        let mut slope = dot(grad, dir);
        if slope >= 0.0 {
            // Lost positive definiteness; restart from steepest descent
            h = IDENTITY;
            scaled = false;
            dir = grad.map(|v| -v);
            slope = dot(grad, dir);
        }

        let mut step = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let candidate = [x[0] + step * dir[0], x[1] + step * dir[1]];
            let f_new = objective.loss(candidate);
            if f_new <= fx + ARMIJO_C1 * step * slope {
                accepted = Some((candidate, f_new));
                break;
            }
            step *= 0.5;
        }
        let Some((x_new, f_new)) = accepted else {
            debug!(iterations, "sigmoid line search stalled");
            break;
        };

        let grad_new = objective.gradient(x_new);
        let s = [x_new[0] - x[0], x_new[1] - x[1]];
        let y = [grad_new[0] - grad[0], grad_new[1] - grad[1]];
        let ys = dot(y, s);
        if ys > 1e-12 {
            if !scaled {
                let gamma = ys / dot(y, y);
                h = [[gamma, 0.0], [0.0, gamma]];
                scaled = true;
            }
            let rho = 1.0 / ys;
            let hy = mat_vec(&h, y);
            let yhy = dot(y, hy);
            for i in 0..2 {
                for j in 0..2 {
                    h[i][j] += -rho * (hy[i] * s[j] + s[i] * hy[j])
                        + (rho * rho * yhy + rho) * s[i] * s[j];
                }
            }
        }

        x = x_new;
        fx = f_new;
        grad = grad_new;
    }

    let gradient_norm = inf_norm(grad);
    let warning = if gradient_norm < config.gtol {
        debug!(iterations, loss = fx, a = x[0], b = x[1], "sigmoid fit converged");
        None
    } else {
        warn!(
            iterations,
            gradient_norm, "sigmoid fit stopped before reaching gradient tolerance"
        );
        Some(ConvergenceWarning {
            iterations,
            gradient_norm,
        })
    };

    Ok(SigmoidFit {
        params: SigmoidParams::new(x[0], x[1]),
        iterations,
        loss: fx,
        warning,
    })
}

/// Apply fitted sigmoid parameters to scores
pub fn sigmoid_calibrate(scores: &Array1<f64>, params: SigmoidParams) -> Array1<f64> {
    scores.mapv(|s| params.probability(s))
}

/// Platt scaling calibrator
///
/// Fits a sigmoid function: P(y=1|f) = 1 / (1 + exp(A*f + B))
/// where f is the uncalibrated decision score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlattScaling {
    params: Option<SigmoidParams>,
    config: SigmoidConfig,
    last_fit: Option<SigmoidFit>,
}

impl PlattScaling {
    /// Create new Platt scaling calibrator
    pub fn new() -> Self {
        Self::with_config(SigmoidConfig::default())
    }

    pub fn with_config(config: SigmoidConfig) -> Self {
        Self {
            params: None,
            config,
            last_fit: None,
        }
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    /// Use previously fitted parameters without refitting
    pub fn from_params(params: SigmoidParams) -> Self {
        Self {
            params: Some(params),
            ..Self::new()
        }
    }

    /// Get fitted parameters
    pub fn parameters(&self) -> Option<SigmoidParams> {
        self.params
    }

    /// Diagnostics of the most recent [`Calibrator::fit`]
    pub fn last_fit(&self) -> Option<&SigmoidFit> {
        self.last_fit.as_ref()
    }
}

impl Default for PlattScaling {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibrator for PlattScaling {
    fn fit(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<()> {
        let fit = sigmoid_fit(labels, scores, None, &self.config)?;
        self.params = Some(fit.params);
        self.last_fit = Some(fit);
        Ok(())
    }

    fn calibrate(&self, scores: &Array1<f64>) -> Result<Array1<f64>> {
        let params = self.params.ok_or(RocError::ModelNotFitted)?;
        Ok(sigmoid_calibrate(scores, params))
    }
}
