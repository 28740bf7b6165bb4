//! Linear models for regression.
//!
//! Only the L1-regularized `Lasso` is provided; it is the model the
//! experiment fits.
//!
//! # Examples
//!
//! ```rust
//! use lasso_experiment::Lasso;
//! use ndarray::array;
//!
//! let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
//! let y = array![2.0, 4.0, 6.0, 8.0];
//!
//! let mut model = Lasso::new().alpha(0.1);
//! model.fit(&x, &y).unwrap();
//! let predictions = model.predict(&x).unwrap();
//! assert_eq!(predictions.len(), 4);
//! assert_eq!(model.coefficients.as_ref().unwrap()[1], 0.0);
//! ```

mod lasso;

pub use lasso::Lasso;
