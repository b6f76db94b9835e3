//! Parallel evaluation of toy datasets.
//!
//! A [`FitModel`] is read-only, so many toys can be evaluated against it at
//! once. Each toy gets its own [`FitSession`](crate::objective::FitSession).

use ndarray::Array1;
use rayon::prelude::*;

use crate::config::CostOptions;
use crate::error::Result;
use crate::objective::{ExternalData, FitModel, Objective};

/// Evaluate the cost of every toy dataset at the same parameters.
///
/// # Arguments
///
/// * `model` - The fit model shared by all toys
/// * `params` - Parameter vector in registry order
/// * `toys` - One external dataset per toy
/// * `options` - Cost options applied to every toy
///
/// # Returns
///
/// * One cost per toy, in input order
pub fn evaluate_toys(
    model: &FitModel,
    params: &Array1<f64>,
    toys: &[ExternalData],
    options: &CostOptions,
) -> Vec<Result<f64>> {
    toys.par_iter()
        .map(|toy| {
            let session = model.session(options.clone()).with_data(toy);
            session.eval_cost(params)
        })
        .collect()
}

/// Like [`evaluate_toys`], but stops at the first failing toy.
pub fn try_evaluate_toys(
    model: &FitModel,
    params: &Array1<f64>,
    toys: &[ExternalData],
    options: &CostOptions,
) -> Result<Array1<f64>> {
    let costs: Result<Vec<f64>> = toys
        .par_iter()
        .map(|toy| model.cost(params, Some(toy), options))
        .collect();
    Ok(Array1::from_vec(costs?))
}
