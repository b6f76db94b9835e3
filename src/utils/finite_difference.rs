//! Finite difference methods for numerical differentiation.
//!
//! Steps are absolute and the same for every parameter. Costs with very
//! different parameter scales should choose the step accordingly.

use crate::error::{FitError, Result};
use ndarray::{Array1, Array2};

/// Default step size for finite differences.
pub const DEFAULT_STEP: f64 = 1e-2;

/// Compute the Hessian matrix using central finite differences.
///
/// H[i,j] = ∂²f/∂param[i]∂param[j]; the result is symmetric by construction.
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `params` - The parameter values at which to evaluate the Hessian
/// * `step` - The step size (optional, default [`DEFAULT_STEP`])
pub fn hessian<F>(f: F, params: &Array1<f64>, step: Option<f64>) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let h = checked_step(step)?;
    let n_params = params.len();
    let mut hess = Array2::zeros((n_params, n_params));

    let f0 = f(params)?;

    let shifted = |moves: &[(usize, f64)]| -> Result<f64> {
        let mut p = params.clone();
        for &(index, delta) in moves {
            p[index] += delta;
        }
        f(&p)
    };

    for i in 0..n_params {
        let f_p = shifted(&[(i, h)])?;
        let f_m = shifted(&[(i, -h)])?;
        hess[[i, i]] = (f_p - 2.0 * f0 + f_m) / (h * h);

        for j in 0..i {
            let f_pp = shifted(&[(i, h), (j, h)])?;
            let f_pm = shifted(&[(i, h), (j, -h)])?;
            let f_mp = shifted(&[(i, -h), (j, h)])?;
            let f_mm = shifted(&[(i, -h), (j, -h)])?;

            hess[[i, j]] = (f_pp - f_pm - f_mp + f_mm) / (4.0 * h * h);
            hess[[j, i]] = hess[[i, j]];
        }
    }

    Ok(hess)
}

fn checked_step(step: Option<f64>) -> Result<f64> {
    let h = step.unwrap_or(DEFAULT_STEP);
    if !(h > 0.0 && h.is_finite()) {
        return Err(FitError::InvalidConfig(format!(
            "finite difference step must be positive, got {}",
            h
        )));
    }
    Ok(h)
}
