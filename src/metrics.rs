use crate::error::{Error, Result};
use crate::Vector;

fn check_lengths(y_true: &Vector, y_pred: &Vector) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::ShapeMismatch(format!(
            "y_true has {} entries but y_pred has {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(Error::EmptyInput("metrics need at least one value"));
    }
    Ok(())
}

pub fn mean_squared_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let diff = y_true - y_pred;
    Ok(diff.mapv(|x| x * x).sum() / diff.len() as f64)
}

/// Square root of [`mean_squared_error`]. Also used to compare fitted
/// coefficients against the generating ones.
pub fn root_mean_squared_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    Ok(mean_squared_error(y_true, y_pred)?.sqrt())
}

pub fn mean_absolute_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let diff = y_true - y_pred;
    Ok(diff.mapv(f64::abs).sum() / diff.len() as f64)
}

pub fn r2_score(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let y_mean = y_true.sum() / y_true.len() as f64;
    let ss_res = (y_true - y_pred).mapv(|x| x * x).sum();
    let ss_tot = y_true.mapv(|x| (x - y_mean) * (x - y_mean)).sum();

    if ss_tot == 0.0 {
        // constant target: perfect only if the residual is zero too
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_squared_error() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![1.0, 2.0, 3.0];

        let mse = mean_squared_error(&y_true, &y_pred).unwrap();
        assert!((mse - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_rmse_known_value() {
        let y_true = array![0.0, 0.0, 0.0, 0.0];
        let y_pred = array![1.0, -1.0, 1.0, -1.0];

        let rmse = root_mean_squared_error(&y_true, &y_pred).unwrap();
        assert!((rmse - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rmse_perfect_fit_is_zero() {
        let y = array![3.5, -2.0, 7.25];
        assert_eq!(root_mean_squared_error(&y, &y).unwrap(), 0.0);
    }

    #[test]
    fn test_rmse_non_negative() {
        let y_true = array![1.0, -4.0, 2.5, 0.0];
        let y_pred = array![-3.0, 2.0, 2.5, 10.0];

        assert!(root_mean_squared_error(&y_true, &y_pred).unwrap() >= 0.0);
    }

    #[test]
    fn test_mean_absolute_error() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![2.0, 2.0, 1.0];

        let mae = mean_absolute_error(&y_true, &y_pred).unwrap();
        assert!((mae - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_r2_score() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![1.0, 2.0, 3.0, 4.0];

        let r2 = r2_score(&y_true, &y_pred).unwrap();
        assert!((r2 - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_r2_score_mean_predictor() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![2.0, 2.0, 2.0];

        assert!(r2_score(&y_true, &y_pred).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let y_true = array![1.0, 2.0];
        let y_pred = array![1.0];

        assert!(matches!(
            mean_squared_error(&y_true, &y_pred),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        let empty = Vector::zeros(0);
        assert!(matches!(
            root_mean_squared_error(&empty, &empty),
            Err(Error::EmptyInput(_))
        ));
    }
}
