use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::Axis;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{Matrix, Vector};

/// L1-regularized least squares.
///
/// Minimizes `(1 / (2 * n_samples)) * ||y - Xw - b||^2 + alpha * ||w||_1`
/// with cyclic coordinate descent. Convergence is judged on the duality gap.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lasso {
    pub coefficients: Option<Vector>,
    pub intercept: Option<f64>,
    alpha: f64,
    fit_intercept: bool,
    max_iter: usize,
    tolerance: f64,
    n_iter: Option<usize>,
    dual_gap: Option<f64>,
}

struct DescentOutcome {
    coefficients: Vector,
    n_iter: usize,
    dual_gap: f64,
    converged: bool,
}

impl Lasso {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            alpha: 1.0,
            fit_intercept: true,
            max_iter: 1000,
            tolerance: 1e-4,
            n_iter: None,
            dual_gap: None,
        }
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        if !(alpha >= 0.0) {
            panic!("alpha must be non-negative, got {}", alpha);
        }
        self.alpha = alpha;
        self
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        if max_iter == 0 {
            panic!("max_iter must be positive");
        }
        self.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        if !(tolerance > 0.0) {
            panic!("tolerance must be positive, got {}", tolerance);
        }
        self.tolerance = tolerance;
        self
    }

    pub fn get_alpha(&self) -> f64 {
        self.alpha
    }

    /// Coordinate descent sweeps used by the last fit.
    pub fn n_iter(&self) -> Option<usize> {
        self.n_iter
    }

    /// Duality gap at the end of the last fit.
    pub fn dual_gap(&self) -> Option<f64> {
        self.dual_gap
    }

    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(Error::ShapeMismatch(format!(
                "X has {} samples but y has {}",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(Error::EmptyInput("X must have at least one sample"));
        }
        if x.ncols() == 0 {
            return Err(Error::EmptyInput("X must have at least one feature"));
        }
        if self.alpha == 0.0 {
            log::warn!("fitting Lasso with alpha = 0; use ordinary least squares instead");
        }

        let (outcome, intercept) = if self.fit_intercept {
            let y_mean = y.sum() / y.len() as f64;
            let x_means = x.mean_axis(Axis(0)).ok_or(Error::EmptyInput("X is empty"))?;
            let x_centered = x - &x_means;
            let y_centered = y - y_mean;

            let outcome = self.coordinate_descent(&x_centered, &y_centered);
            let intercept = y_mean - outcome.coefficients.dot(&x_means);
            (outcome, intercept)
        } else {
            (self.coordinate_descent(x, y), 0.0)
        };

        if !outcome.converged {
            log::warn!(
                "Lasso did not converge after {} iterations (duality gap {:.3e}); \
                 consider increasing max_iter",
                outcome.n_iter,
                outcome.dual_gap
            );
        }

        self.coefficients = Some(outcome.coefficients);
        self.intercept = Some(intercept);
        self.n_iter = Some(outcome.n_iter);
        self.dual_gap = Some(outcome.dual_gap);
        Ok(())
    }

    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        let coeffs = self.coefficients.as_ref().ok_or(Error::NotFitted)?;
        let intercept = self.intercept.unwrap_or(0.0);

        if x.ncols() != coeffs.len() {
            return Err(Error::ShapeMismatch(format!(
                "Number of features in X ({}) doesn't match training data ({})",
                x.ncols(),
                coeffs.len()
            )));
        }

        Ok(x.dot(coeffs) + intercept)
    }

    pub fn score(&self, x: &Matrix, y: &Vector) -> Result<f64> {
        let y_pred = self.predict(x)?;
        crate::metrics::r2_score(y, &y_pred)
    }

    /// Writes the model, fitted or not, as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| Error::json(path, e))?;
        writer.flush().map_err(|e| Error::io(path, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::json(path, e))
    }

    fn coordinate_descent(&self, x: &Matrix, y: &Vector) -> DescentOutcome {
        let (n_samples, n_features) = x.dim();
        // the solver works on the un-normalized objective
        let alpha = self.alpha * n_samples as f64;
        let gap_tolerance = self.tolerance * y.dot(y);

        let norm_cols: Vector = x.axis_iter(Axis(1)).map(|col| col.dot(&col)).collect();
        let mut beta = Vector::zeros(n_features);
        let mut residual = y.clone();

        let mut dual_gap = f64::INFINITY;
        let mut n_iter = 0;

        for iteration in 0..self.max_iter {
            n_iter = iteration + 1;
            let mut w_max = 0.0_f64;
            let mut d_w_max = 0.0_f64;

            for j in 0..n_features {
                if norm_cols[j] == 0.0 {
                    continue;
                }

                let column = x.column(j);
                let beta_old = beta[j];
                if beta_old != 0.0 {
                    residual.scaled_add(beta_old, &column);
                }

                let rho = column.dot(&residual);
                beta[j] = soft_threshold(rho, alpha) / norm_cols[j];

                if beta[j] != 0.0 {
                    residual.scaled_add(-beta[j], &column);
                }

                d_w_max = d_w_max.max((beta[j] - beta_old).abs());
                w_max = w_max.max(beta[j].abs());
            }

            let last = iteration + 1 == self.max_iter;
            if w_max == 0.0 || d_w_max / w_max < self.tolerance || last {
                dual_gap = duality_gap(x, y, &beta, &residual, alpha);
                if dual_gap <= gap_tolerance {
                    return DescentOutcome {
                        coefficients: beta,
                        n_iter,
                        dual_gap,
                        converged: true,
                    };
                }
            }
        }

        DescentOutcome {
            coefficients: beta,
            n_iter,
            dual_gap,
            converged: false,
        }
    }
}

/// Gap between the primal objective and the dual objective evaluated at a
/// rescaled residual. Both are in the `n_samples`-scaled form.
fn duality_gap(x: &Matrix, y: &Vector, beta: &Vector, residual: &Vector, alpha: f64) -> f64 {
    let xt_residual = x.t().dot(residual);
    let dual_norm = xt_residual.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let residual_norm2 = residual.dot(residual);

    let (constant, mut gap) = if dual_norm > alpha {
        let constant = alpha / dual_norm;
        (constant, 0.5 * residual_norm2 * (1.0 + constant * constant))
    } else {
        (1.0, residual_norm2)
    };

    let l1_norm = beta.mapv(f64::abs).sum();
    gap += alpha * l1_norm - constant * residual.dot(y);
    gap
}

fn soft_threshold(z: f64, gamma: f64) -> f64 {
    if z > gamma {
        z - gamma
    } else if z < -gamma {
        z + gamma
    } else {
        0.0
    }
}

impl Default for Lasso {
    fn default() -> Self {
        Self::new()
    }
}
