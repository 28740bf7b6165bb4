//! The experiment itself: generate a sparse regression problem, fit a Lasso,
//! and record how far the fit lands from the truth.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ExperimentConfig;
use crate::dataset::{make_regression, RegressionSpec};
use crate::error::{Error, Result};
use crate::linear_model::Lasso;
use crate::logging::run_timestamp;
use crate::metrics::root_mean_squared_error;
use crate::tracking::RunStore;

/// Where a run writes its files.
#[derive(Debug, Clone)]
pub struct ExperimentPaths {
    /// Root of the per-run outputs; model files go to `<output>/artifacts`.
    pub output: PathBuf,
    /// Tracking store directory.
    pub store: PathBuf,
}

impl ExperimentPaths {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        let store = output.join("runs");
        Self { output, store }
    }

    pub fn with_store(mut self, store: impl Into<PathBuf>) -> Self {
        self.store = store.into();
        self
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.output.join("logs")
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.output.join("artifacts")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentOutcome {
    pub run_id: u64,
    pub rmse_y: f64,
    pub rmse_coef: f64,
    /// R² of the fitted model on the test partition.
    pub score: f64,
    pub model_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Experiment {
    name: String,
    config: ExperimentConfig,
    paths: ExperimentPaths,
    comment: Option<String>,
}

impl Experiment {
    pub fn new(name: impl Into<String>, config: ExperimentConfig, paths: ExperimentPaths) -> Self {
        Self {
            name: name.into(),
            config,
            paths,
            comment: None,
        }
    }

    pub fn comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Runs the experiment and records it in the tracking store.
    ///
    /// Once the run record exists, any failure marks it `FAILED` before the
    /// error is returned.
    pub fn run(&self) -> Result<ExperimentOutcome> {
        self.config.validate()?;

        let mut store = RunStore::open(&self.paths.store)?;
        let config = serde_json::to_value(self.config.resolved())
            .map_err(|e| Error::json(store.dir(), e))?;

        log::info!("Running command 'run'");
        let run_id = store.start_run(&self.name, config, self.comment.clone())?;
        log::info!("Started run with ID \"{}\"", run_id);
        let started = Instant::now();

        match self.execute(&mut store, run_id) {
            Ok(outcome) => {
                store.complete_run(run_id, Some(outcome.score))?;
                log::info!("Result: {}", outcome.score);
                log::info!("Completed after {:.3}s", started.elapsed().as_secs_f64());
                Ok(outcome)
            }
            Err(err) => {
                log::error!("Failed after {:.3}s: {}", started.elapsed().as_secs_f64(), err);
                if let Err(store_err) = store.fail_run(run_id, &err.to_string()) {
                    log::error!("could not mark run {} as failed: {}", run_id, store_err);
                }
                Err(err)
            }
        }
    }

    fn execute(&self, store: &mut RunStore, run_id: u64) -> Result<ExperimentOutcome> {
        let config = &self.config;

        log::info!(
            "Generating {} samples with {} features ({} informative)",
            config.n_samples(),
            config.n_features,
            config.n_informative()
        );
        let regression = make_regression(&RegressionSpec {
            n_samples: config.n_samples(),
            n_features: config.n_features,
            n_informative: config.n_informative(),
            bias: config.bias,
            noise: config.noise,
            seed: config.seed,
        })?;

        let (train, test) = regression.dataset.train_test_split(
            config.n_train_samp,
            config.n_test_samp,
            config.seed,
        )?;

        log::info!("Fitting Lasso with alpha = {}", config.alpha);
        let mut model = Lasso::new()
            .alpha(config.alpha)
            .max_iter(config.max_iter)
            .tolerance(config.tol);
        model.fit(&train.features, &train.targets)?;
        log::info!(
            "Coordinate descent stopped after {} iterations (duality gap {:.3e})",
            model.n_iter().unwrap_or(0),
            model.dual_gap().unwrap_or(f64::NAN)
        );

        let predictions = model.predict(&test.features)?;
        let rmse_y = root_mean_squared_error(&test.targets, &predictions)?;
        store.update_info(run_id, "rmse_y", rmse_y)?;

        let coefficients = model.coefficients.as_ref().ok_or(Error::NotFitted)?;
        let rmse_coef = root_mean_squared_error(&regression.coef, coefficients)?;
        store.update_info(run_id, "rmse_coef", rmse_coef)?;
        log::info!("rmse_y = {}, rmse_coef = {}", rmse_y, rmse_coef);

        let model_path = self.save_model(&model)?;
        store.add_artifact(run_id, "model", &model_path)?;
        log::info!("Saved model to {}", model_path.display());

        let score = model.score(&test.features, &test.targets)?;

        Ok(ExperimentOutcome {
            run_id,
            rmse_y,
            rmse_coef,
            score,
            model_path,
        })
    }

    fn save_model(&self, model: &Lasso) -> Result<PathBuf> {
        let dir = self.paths.artifacts_dir();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let path = dir.join(format!("{}-model.json", run_timestamp()));
        model.save(&path)?;
        Ok(path)
    }
}

/// Loads the model artifact written by a run.
pub fn load_model(path: &Path) -> Result<Lasso> {
    Lasso::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::RunStatus;

    fn small_config() -> ExperimentConfig {
        ExperimentConfig {
            seed: 3,
            n_train_samp: 120,
            n_test_samp: 40,
            n_features: 30,
            sparsity: 0.1,
            alpha: 0.1,
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn test_run_records_metrics_and_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExperimentPaths::new(dir.path().join("output"));
        let experiment = Experiment::new("test", small_config(), paths.clone())
            .comment(Some("smoke".to_string()));

        let outcome = experiment.run().unwrap();

        assert!(outcome.rmse_y >= 0.0);
        assert!(outcome.rmse_coef >= 0.0);
        assert!(outcome.score > 0.9, "score = {}", outcome.score);
        assert!(outcome.model_path.starts_with(paths.artifacts_dir()));

        let store = RunStore::open(&paths.store).unwrap();
        let run = store.get(outcome.run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.experiment, "test");
        assert_eq!(run.info["rmse_y"], outcome.rmse_y);
        assert_eq!(run.info["rmse_coef"], outcome.rmse_coef);
        assert_eq!(run.result, Some(outcome.score));
        assert_eq!(run.config["n_informative"], 3);
        assert_eq!(run.comment.as_deref(), Some("smoke"));
        assert_eq!(run.artifacts.len(), 1);
        assert_eq!(run.artifacts[0].name, "model");
        assert!(run.artifacts[0].stored.exists());
    }

    #[test]
    fn test_saved_model_reloads_with_identical_coefficients() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExperimentPaths::new(dir.path());
        let outcome = Experiment::new("test", small_config(), paths.clone()).run().unwrap();

        let model = load_model(&outcome.model_path).unwrap();
        let coefficients = model.coefficients.as_ref().unwrap();
        assert_eq!(coefficients.len(), 30);
        assert!(coefficients.iter().any(|c| *c != 0.0));

        let store = RunStore::open(&paths.store).unwrap();
        let stored = &store.get(outcome.run_id).unwrap().artifacts[0].stored;
        let copy = load_model(stored).unwrap();
        assert_eq!(copy.coefficients, model.coefficients);
        assert_eq!(copy.intercept, model.intercept);
    }

    #[test]
    fn test_runs_get_sequential_ids() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExperimentPaths::new(dir.path()).with_store(dir.path().join("db"));

        let first = Experiment::new("test", small_config(), paths.clone()).run().unwrap();
        let second = Experiment::new("test", small_config(), paths.clone()).run().unwrap();

        assert_eq!(first.run_id, 1);
        assert_eq!(second.run_id, 2);
        // same seed, same data, same fit
        assert_eq!(first.rmse_coef, second.rmse_coef);
        assert_eq!(RunStore::open(&paths.store).unwrap().runs().len(), 2);
    }

    #[test]
    fn test_invalid_config_creates_no_run() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExperimentPaths::new(dir.path());
        let config = ExperimentConfig {
            alpha: -1.0,
            ..small_config()
        };

        let err = Experiment::new("test", config, paths.clone()).run().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(!paths.store.exists());
    }

    #[test]
    fn test_failure_marks_run_failed() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        fs::create_dir_all(&output).unwrap();
        // a file where the artifacts directory should go
        fs::write(output.join("artifacts"), "").unwrap();

        let paths = ExperimentPaths::new(&output);
        let err = Experiment::new("test", small_config(), paths.clone()).run().unwrap_err();
        assert!(matches!(err, Error::Io { .. }));

        let store = RunStore::open(&paths.store).unwrap();
        let run = &store.runs()[0];
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.fail_trace.is_some());
        assert!(run.info.contains_key("rmse_y"));
    }
}
