use ndarray::Axis;
use ndarray_rand::rand_distr::{StandardNormal, Uniform};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::{Matrix, Vector};

#[derive(Clone, Debug)]
pub struct Dataset {
    pub features: Matrix,
    pub targets: Vector,
}

impl Dataset {
    pub fn new(features: Matrix, targets: Vector) -> Result<Self> {
        if features.nrows() != targets.len() {
            return Err(Error::ShapeMismatch(format!(
                "features have {} samples but targets have {}",
                features.nrows(),
                targets.len()
            )));
        }

        Ok(Self { features, targets })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
        }
    }

    /// Shuffles the rows with `seed`, then takes the first `test_size` rows as
    /// the test set and the next `train_size` rows as the training set.
    ///
    /// Returns `(train, test)`. Rows beyond `train_size + test_size` are
    /// dropped.
    pub fn train_test_split(
        &self,
        train_size: usize,
        test_size: usize,
        seed: u64,
    ) -> Result<(Self, Self)> {
        if train_size == 0 || test_size == 0 {
            return Err(Error::InvalidConfig(
                "train and test partitions must both be non-empty".to_string(),
            ));
        }

        let n_samples = self.n_samples();
        if train_size + test_size > n_samples {
            return Err(Error::InvalidConfig(format!(
                "train_size ({}) + test_size ({}) exceeds the {} available samples",
                train_size, test_size, n_samples
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut permutation: Vec<usize> = (0..n_samples).collect();
        permutation.shuffle(&mut rng);

        let test = self.select(&permutation[..test_size]);
        let train = self.select(&permutation[test_size..test_size + train_size]);

        Ok((train, test))
    }
}

/// Synthetic linear regression problem together with the coefficients that
/// generated it.
#[derive(Clone, Debug)]
pub struct Regression {
    pub dataset: Dataset,
    pub coef: Vector,
}

#[derive(Clone, Debug)]
pub struct RegressionSpec {
    pub n_samples: usize,
    pub n_features: usize,
    pub n_informative: usize,
    pub bias: f64,
    pub noise: f64,
    pub seed: u64,
}

/// Random regression problem with a sparse ground truth.
///
/// Features are standard normal. Only `n_informative` coefficients are
/// non-zero, each drawn from `U[0, 100)`. Targets are `X·coef + bias`, plus
/// Gaussian noise with standard deviation `noise`. Samples are shuffled, then
/// features are shuffled together with their coefficients so the informative
/// columns are scattered.
pub fn make_regression(spec: &RegressionSpec) -> Result<Regression> {
    if spec.n_samples == 0 {
        return Err(Error::EmptyInput("n_samples must be positive"));
    }
    if spec.n_features == 0 {
        return Err(Error::EmptyInput("n_features must be positive"));
    }

    let n_informative = spec.n_informative.min(spec.n_features);
    let mut rng = StdRng::seed_from_u64(spec.seed);

    let features = Matrix::random_using((spec.n_samples, spec.n_features), StandardNormal, &mut rng);

    let mut coef = Vector::zeros(spec.n_features);
    if n_informative > 0 {
        let informative = Vector::random_using(n_informative, Uniform::new(0.0, 100.0), &mut rng);
        coef.slice_mut(ndarray::s![..n_informative]).assign(&informative);
    }

    let mut targets = features.dot(&coef) + spec.bias;
    if spec.noise > 0.0 {
        let noise = Vector::random_using(spec.n_samples, StandardNormal, &mut rng);
        targets.scaled_add(spec.noise, &noise);
    }

    let mut rows: Vec<usize> = (0..spec.n_samples).collect();
    rows.shuffle(&mut rng);
    let features = features.select(Axis(0), &rows);
    let targets = targets.select(Axis(0), &rows);

    let mut columns: Vec<usize> = (0..spec.n_features).collect();
    columns.shuffle(&mut rng);
    let features = features.select(Axis(1), &columns);
    let coef = coef.select(Axis(0), &columns);

    Ok(Regression {
        dataset: Dataset::new(features, targets)?,
        coef,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn spec(n_samples: usize, n_features: usize, n_informative: usize) -> RegressionSpec {
        RegressionSpec {
            n_samples,
            n_features,
            n_informative,
            bias: 0.0,
            noise: 0.0,
            seed: 1,
        }
    }

    #[test]
    fn test_dataset_creation() {
        let features = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let targets = array![1.0, 2.0, 3.0];

        let dataset = Dataset::new(features, targets).unwrap();
        assert_eq!(dataset.n_samples(), 3);
        assert_eq!(dataset.n_features(), 2);
    }

    #[test]
    fn test_dataset_mismatch() {
        let features = array![[1.0], [2.0]];
        let targets = array![1.0];
        assert!(Dataset::new(features, targets).is_err());
    }

    #[test]
    fn test_train_test_split_sizes() {
        let features = Matrix::zeros((100, 5));
        let targets = Vector::zeros(100);
        let dataset = Dataset::new(features, targets).unwrap();

        let (train, test) = dataset.train_test_split(80, 20, 7).unwrap();
        assert_eq!(train.n_samples(), 80);
        assert_eq!(test.n_samples(), 20);
        assert_eq!(train.n_samples() + test.n_samples(), dataset.n_samples());
        assert_eq!(train.n_features(), 5);
    }

    #[test]
    fn test_train_test_split_partitions_rows() {
        let targets: Vector = (0..10).map(|i| i as f64).collect();
        let features = targets.clone().insert_axis(Axis(1));
        let dataset = Dataset::new(features, targets).unwrap();

        let (train, test) = dataset.train_test_split(6, 4, 3).unwrap();

        let mut seen: Vec<f64> = train.targets.iter().chain(test.targets.iter()).copied().collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert_eq!(seen, expected);

        // rows stay aligned with their targets
        for (row, target) in train.features.rows().into_iter().zip(train.targets.iter()) {
            assert_eq!(row[0], *target);
        }
    }

    #[test]
    fn test_train_test_split_too_large() {
        let dataset = Dataset::new(Matrix::zeros((10, 2)), Vector::zeros(10)).unwrap();
        assert!(dataset.train_test_split(8, 3, 0).is_err());
        assert!(dataset.train_test_split(10, 0, 0).is_err());
    }

    #[test]
    fn test_make_regression_shapes_and_sparsity() {
        let regression = make_regression(&spec(50, 20, 4)).unwrap();

        assert_eq!(regression.dataset.n_samples(), 50);
        assert_eq!(regression.dataset.n_features(), 20);
        assert_eq!(regression.coef.len(), 20);

        let nonzero = regression.coef.iter().filter(|c| **c != 0.0).count();
        assert_eq!(nonzero, 4);
        assert!(regression.coef.iter().all(|c| (0.0..100.0).contains(c)));
    }

    #[test]
    fn test_make_regression_noise_free_targets() {
        let regression = make_regression(&spec(30, 8, 3)).unwrap();
        let expected = regression.dataset.features.dot(&regression.coef);

        for (a, b) in expected.iter().zip(regression.dataset.targets.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_make_regression_is_deterministic() {
        let a = make_regression(&spec(20, 5, 2)).unwrap();
        let b = make_regression(&spec(20, 5, 2)).unwrap();
        assert_eq!(a.dataset.features, b.dataset.features);
        assert_eq!(a.coef, b.coef);

        let mut other = spec(20, 5, 2);
        other.seed = 2;
        let c = make_regression(&other).unwrap();
        assert_ne!(a.dataset.features, c.dataset.features);
    }

    #[test]
    fn test_make_regression_clamps_informative() {
        let regression = make_regression(&spec(10, 3, 10)).unwrap();
        assert!(regression.coef.iter().all(|c| *c > 0.0));
    }

    #[test]
    fn test_make_regression_rejects_empty() {
        assert!(make_regression(&spec(0, 3, 1)).is_err());
        assert!(make_regression(&spec(3, 0, 0)).is_err());
    }
}
