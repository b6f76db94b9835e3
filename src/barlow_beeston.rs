//! Barlow-Beeston treatment of finite Monte Carlo statistics.
//!
//! Every bin gets a nuisance scale β on the predicted value, constrained by
//! a Gaussian of relative width `sqrt(variance)/model`. Profiling β with the
//! Poisson likelihood gives the quadratic
//!
//! ```text
//! β² + (v/m − 1)·β − d·v/m² = 0
//! ```
//!
//! whose positive root is the per-bin correction. Bins with no prediction or
//! no Monte Carlo variance are left uncorrected (β = 1, no penalty).

use ndarray::{Array1, ArrayBase, Data, Ix1, Zip};

use crate::error::{FitError, Result};

fn is_correctable(model: f64, variance: f64) -> bool {
    model != 0.0 && model.is_finite() && variance > 0.0 && variance.is_finite()
}

/// Solve for the scale of one bin.
///
/// # Arguments
///
/// * `data` - Observed bin content
/// * `model` - Predicted bin content
/// * `variance` - Monte Carlo variance of the prediction
pub fn solve(data: f64, model: f64, variance: f64) -> f64 {
    if !is_correctable(model, variance) {
        return 1.0;
    }

    let b = variance / model - 1.0;
    let c = -data * variance / (model * model);
    let discriminant = b * b - 4.0 * c;
    if discriminant < 0.0 {
        return 1.0;
    }

    (-b + discriminant.sqrt()) / 2.0
}

/// Gaussian penalty `(1 − β)² / (2·v/m²)` of a bin scale.
pub fn penalty(beta: f64, model: f64, variance: f64) -> f64 {
    if !is_correctable(model, variance) {
        return 0.0;
    }
    (1.0 - beta).powi(2) * model * model / (2.0 * variance)
}

/// Result of correcting a whole histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct BinCorrection {
    /// Corrected prediction `β·m` per bin.
    pub model: Array1<f64>,
    pub beta: Array1<f64>,
    /// Sum of the per-bin penalties.
    pub penalty: f64,
}

/// Apply [`solve`] and [`penalty`] to every bin.
pub fn correct_bins<S1, S2, S3>(
    data: &ArrayBase<S1, Ix1>,
    model: &ArrayBase<S2, Ix1>,
    variance: &ArrayBase<S3, Ix1>,
) -> Result<BinCorrection>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    S3: Data<Elem = f64>,
{
    if data.len() != model.len() || variance.len() != model.len() {
        return Err(FitError::DimensionMismatch(format!(
            "Barlow-Beeston needs equal lengths, got data {}, model {}, variance {}",
            data.len(),
            model.len(),
            variance.len()
        )));
    }

    let beta = Zip::from(data)
        .and(model)
        .and(variance)
        .map_collect(|&d, &m, &v| solve(d, m, v));

    let mut penalty_sum = 0.0;
    Zip::from(&beta)
        .and(model)
        .and(variance)
        .for_each(|&b, &m, &v| penalty_sum += penalty(b, m, v));

    Ok(BinCorrection {
        model: &beta * model,
        beta,
        penalty: penalty_sum,
    })
}
