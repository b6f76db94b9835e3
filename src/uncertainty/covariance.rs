//! # Covariance Matrix Estimation
//!
//! At the minimum of a negative log-likelihood the inverse Hessian estimates
//! the covariance of the parameters. The Hessian is taken numerically with
//! central differences and inverted with a pseudo-inverse.

use ndarray::{Array1, Array2};

use crate::error::{FitError, Result};
use crate::objective::Objective;
use crate::utils::finite_difference::hessian;
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Singular values below this are treated as zero by the pseudo-inverse.
const PSEUDO_INVERSE_EPSILON: f64 = 1e-12;

/// Parameter uncertainties at a best-fit point.
#[derive(Debug, Clone)]
pub struct CovarianceEstimate {
    pub hessian: Array2<f64>,
    pub covariance: Array2<f64>,
    /// Square roots of the covariance diagonal (0 where it is not positive).
    pub sigma: Array1<f64>,
    pub correlation: Array2<f64>,
}

/// Estimate the covariance of an objective at its best-fit point.
///
/// # Arguments
///
/// * `objective` - The cost, e.g. a [`FitSession`](crate::objective::FitSession)
/// * `best_fit` - Parameter vector at the minimum
/// * `step` - Finite difference step (optional, default `1e-2`)
///
/// # Errors
///
/// * `DimensionMismatch` if `best_fit` has the wrong length
/// * `NumericalError` if the cost is not finite around `best_fit`
/// * `SingularMatrix` if the Hessian has a zero determinant
pub fn covariance<O: Objective + ?Sized>(
    objective: &O,
    best_fit: &Array1<f64>,
    step: Option<f64>,
) -> Result<CovarianceEstimate> {
    if best_fit.len() != objective.parameter_count() {
        return Err(FitError::DimensionMismatch(format!(
            "expected {} parameters, got {}",
            objective.parameter_count(),
            best_fit.len()
        )));
    }

    let hess = hessian(|p| objective.eval_cost(p), best_fit, step)?;
    if hess.iter().any(|h| !h.is_finite()) {
        return Err(FitError::NumericalError(
            "Hessian has non-finite entries, the step may leave the allowed domain".to_string(),
        ));
    }

    let covariance = covariance_from_hessian(&hess)?;
    let sigma = standard_errors_from_covariance(&covariance);
    let correlation = calculate_correlation(&covariance);

    Ok(CovarianceEstimate {
        hessian: hess,
        covariance,
        sigma,
        correlation,
    })
}

/// Invert a Hessian into a covariance matrix.
pub fn covariance_from_hessian(hess: &Array2<f64>) -> Result<Array2<f64>> {
    if hess.nrows() != hess.ncols() {
        return Err(FitError::DimensionMismatch(format!(
            "Hessian must be square, got {}x{}",
            hess.nrows(),
            hess.ncols()
        )));
    }

    let matrix = ndarray_to_nalgebra(hess);
    if matrix.determinant() == 0.0 {
        return Err(FitError::SingularMatrix);
    }

    let inverse = matrix
        .pseudo_inverse(PSEUDO_INVERSE_EPSILON)
        .map_err(|e| FitError::NumericalError(format!("pseudo-inverse failed: {}", e)))?;
    let covariance = nalgebra_to_ndarray(&inverse);

    if let Some(i) = covariance.diag().iter().position(|v| *v <= 0.0) {
        log::warn!(
            "covariance diagonal {} is not positive, the point is not a minimum",
            i
        );
    }

    Ok(covariance)
}

/// Calculate the correlation matrix from a covariance matrix.
///
/// correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j]), with 1 on the
/// diagonal and 0 where the denominator is not positive.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Standard errors: square roots of the covariance diagonal.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
