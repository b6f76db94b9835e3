//! # Uncertainty Estimation
//!
//! Parameter uncertainties from the curvature of the cost at its minimum:
//! the covariance is the (pseudo-)inverse of the numerical Hessian, the
//! standard errors its diagonal roots and the correlation its normalized form.

mod covariance;

pub use covariance::{
    calculate_correlation, covariance, covariance_from_hessian, standard_errors_from_covariance,
    CovarianceEstimate,
};
