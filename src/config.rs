use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scalar parameters of one experiment run.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub seed: u64,

    // data generation
    pub n_train_samp: usize,
    pub n_test_samp: usize,
    pub n_features: usize,
    pub sparsity: f64,
    pub noise: f64,
    pub bias: f64,

    // model
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            n_train_samp: 1000,
            n_test_samp: 1000,
            n_features: 1000,
            sparsity: 0.1,
            noise: 0.0,
            bias: 0.0,
            alpha: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// Config as stored on a run record: the declared values plus the derived
/// ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    #[serde(flatten)]
    pub config: ExperimentConfig,
    pub n_informative: usize,
}

impl ExperimentConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| Error::json(path, e))
    }

    /// Number of features with a non-zero true coefficient.
    pub fn n_informative(&self) -> usize {
        (self.n_features as f64 * self.sparsity) as usize
    }

    pub fn n_samples(&self) -> usize {
        self.n_train_samp + self.n_test_samp
    }

    pub fn resolved(&self) -> ResolvedConfig {
        ResolvedConfig {
            config: self.clone(),
            n_informative: self.n_informative(),
        }
    }

    /// Applies a `key=value` override.
    pub fn apply_update(&mut self, update: &str) -> Result<()> {
        let (key, value) = update
            .split_once('=')
            .ok_or_else(|| Error::InvalidConfig(format!("expected key=value, got '{}'", update)))?;
        let key = key.trim();
        let value = value.trim();

        match key {
            "seed" => self.seed = parse_value(key, value)?,
            "n_train_samp" => self.n_train_samp = parse_value(key, value)?,
            "n_test_samp" => self.n_test_samp = parse_value(key, value)?,
            "n_features" => self.n_features = parse_value(key, value)?,
            "sparsity" => self.sparsity = parse_value(key, value)?,
            "noise" => self.noise = parse_value(key, value)?,
            "bias" => self.bias = parse_value(key, value)?,
            "alpha" => self.alpha = parse_value(key, value)?,
            "max_iter" => self.max_iter = parse_value(key, value)?,
            "tol" => self.tol = parse_value(key, value)?,
            "n_informative" => {
                return Err(Error::InvalidConfig(
                    "n_informative is derived from n_features * sparsity; set sparsity instead"
                        .to_string(),
                ));
            }
            other => return Err(Error::InvalidConfig(format!("unknown config key '{}'", other))),
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.n_train_samp > 0, "n_train_samp must be positive")?;
        ensure(self.n_test_samp > 0, "n_test_samp must be positive")?;
        ensure(self.n_features > 0, "n_features must be positive")?;
        ensure(self.max_iter > 0, "max_iter must be positive")?;

        for (name, value) in [
            ("sparsity", self.sparsity),
            ("noise", self.noise),
            ("bias", self.bias),
            ("alpha", self.alpha),
            ("tol", self.tol),
        ] {
            ensure(value.is_finite(), &format!("{} must be finite, got {}", name, value))?;
        }

        ensure(
            (0.0..=1.0).contains(&self.sparsity),
            &format!("sparsity must be within [0, 1], got {}", self.sparsity),
        )?;
        ensure(self.alpha >= 0.0, &format!("alpha must be non-negative, got {}", self.alpha))?;
        ensure(self.noise >= 0.0, &format!("noise must be non-negative, got {}", self.noise))?;
        ensure(self.tol > 0.0, &format!("tol must be positive, got {}", self.tol))?;

        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            concat!(
                "seed = {}\n",
                "n_train_samp = {}\n",
                "n_test_samp = {}\n",
                "n_features = {}\n",
                "sparsity = {}\n",
                "n_informative = {}\n",
                "noise = {}\n",
                "bias = {}\n",
                "alpha = {}\n",
                "max_iter = {}\n",
                "tol = {}"
            ),
            self.seed,
            self.n_train_samp,
            self.n_test_samp,
            self.n_features,
            self.sparsity,
            self.n_informative(),
            self.noise,
            self.bias,
            self.alpha,
            self.max_iter,
            self.tol,
        )
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("invalid value '{}' for {}", value, key)))
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidConfig(message.to_string()))
    }
}
