//! Numerical helpers for the uncertainty estimates.

pub mod finite_difference;
pub mod matrix_convert;
