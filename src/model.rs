//! Mixture model evaluation.
//!
//! The [`MixtureModel`] turns a parameter vector into the predicted bin
//! contents of one category:
//!
//! 1. the parameter vector is split into POIs, normalization and shape
//!    nuisances (registry order);
//! 2. every stacked process row gets a normalization multiplier, the product
//!    of the normalization parameters switched on for it (switched-off
//!    parameters contribute a factor 1);
//! 3. the morphing weights `[1, 0, w₂(s₁), ½s₁, w₂(s₂), ½s₂, ...]` contract
//!    the tensor into one morphed template per row;
//! 4. each row is scaled by its signal amplitude ratio (1 for background
//!    processes) and its normalization multiplier, and the rows are summed.
//!
//! The predicted variance is the sum of the unscaled variance rows; it is
//! not rescaled by the amplitudes or normalizations.

use ndarray::{Array1, Array2, Axis};

use crate::amplitudes::ReferenceAmplitudes;
use crate::config::{FitConfig, MorphingOrder};
use crate::error::{FitError, Result};
use crate::parameters::registry::N_BRANCHING_FRACTIONS;
use crate::parameters::ParameterRegistry;
use crate::templates::{CategoryModel, ProcessKind, ProcessSpec};

/// Predicted bin contents of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub value: Array1<f64>,
    pub variance: Array1<f64>,
}

/// Evaluates category predictions from a parameter vector.
#[derive(Debug, Clone)]
pub struct MixtureModel {
    n_poi: usize,
    n_norm: usize,
    n_shape: usize,
    reference: ReferenceAmplitudes,
    morphing: MorphingOrder,
    processes: Vec<ProcessSpec>,
    n_slots: usize,
}

impl MixtureModel {
    pub fn new(registry: &ParameterRegistry, config: &FitConfig) -> Self {
        Self {
            n_poi: registry.n_poi(),
            n_norm: registry.n_norm(),
            n_shape: registry.n_shape(),
            reference: ReferenceAmplitudes::new(config.reference_beta, config.br_tau),
            morphing: config.morphing,
            processes: config.processes.clone(),
            n_slots: config.processes.iter().map(|p| p.slot_count()).sum(),
        }
    }

    /// Expected length of the parameter vector.
    pub fn parameter_count(&self) -> usize {
        self.n_poi + self.n_norm + self.n_shape
    }

    /// Expected length of a process amplitude vector.
    pub fn slot_count(&self) -> usize {
        self.n_slots
    }

    pub fn morphing(&self) -> MorphingOrder {
        self.morphing
    }

    fn check_params(&self, params: &Array1<f64>) -> Result<()> {
        if params.len() != self.parameter_count() {
            return Err(FitError::DimensionMismatch(format!(
                "expected {} parameters, got {}",
                self.parameter_count(),
                params.len()
            )));
        }
        Ok(())
    }

    /// W branching fractions `[e, mu, tau, h]`, the leading POIs.
    pub fn branching_fractions(&self, params: &Array1<f64>) -> Result<[f64; 4]> {
        self.check_params(params)?;
        let mut beta = [0.0; N_BRANCHING_FRACTIONS];
        for (b, p) in beta.iter_mut().zip(params.iter()) {
            *b = *p;
        }
        Ok(beta)
    }

    /// Amplitude ratio of every process slot: one entry per simple process
    /// (always 1) and one per decay channel of each composite process.
    pub fn process_amplitudes(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let beta = self.branching_fractions(params)?;

        let mut amplitudes = Vec::with_capacity(self.n_slots);
        for process in &self.processes {
            match process.kind {
                ProcessKind::Simple => amplitudes.push(1.0),
                ProcessKind::Composite(topology) => {
                    amplitudes.extend(self.reference.ratio(beta, topology).iter())
                }
            }
        }
        Ok(Array1::from_vec(amplitudes))
    }

    /// Morphing weights contracted against each row block of the tensor.
    pub fn shape_weights(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_params(params)?;
        let shape = params.slice(ndarray::s![self.n_poi + self.n_norm..]);

        let mut weights = Array1::zeros(2 + 2 * self.n_shape);
        weights[0] = 1.0;
        for (k, s) in shape.iter().enumerate() {
            weights[2 + 2 * k] = match self.morphing {
                MorphingOrder::Quadratic => 0.5 * s * s,
                MorphingOrder::Linear => 0.0,
            };
            weights[3 + 2 * k] = 0.5 * s;
        }
        Ok(weights)
    }

    /// Product of the switched-on normalization parameters of every row.
    pub fn normalization(&self, params: &Array1<f64>, category: &CategoryModel) -> Result<Array1<f64>> {
        self.check_params(params)?;
        let norm = params.slice(ndarray::s![self.n_poi..self.n_poi + self.n_norm]);
        let mask = category.norm_mask();
        if mask.ncols() != self.n_norm {
            return Err(FitError::DimensionMismatch(format!(
                "{}: norm mask has {} columns, registry has {} normalization parameters",
                category.key(),
                mask.ncols(),
                self.n_norm
            )));
        }

        Ok(mask
            .outer_iter()
            .map(|row| {
                row.iter()
                    .zip(norm.iter())
                    .filter(|(on, _)| **on)
                    .map(|(_, value)| *value)
                    .product()
            })
            .collect())
    }

    /// Final scale of every stacked row: masked amplitude times normalization.
    fn row_scales(
        &self,
        params: &Array1<f64>,
        category: &CategoryModel,
        amplitudes: Option<&Array1<f64>>,
    ) -> Result<Array1<f64>> {
        let computed;
        let amplitudes = match amplitudes {
            Some(a) => a,
            None => {
                computed = self.process_amplitudes(params)?;
                &computed
            }
        };

        let mask = category.process_mask();
        if amplitudes.len() != mask.len() {
            return Err(FitError::DimensionMismatch(format!(
                "{}: expected {} process amplitudes, got {}",
                category.key(),
                mask.len(),
                amplitudes.len()
            )));
        }

        let selected: Array1<f64> = amplitudes
            .iter()
            .zip(mask.iter())
            .filter(|(_, on)| **on)
            .map(|(a, _)| *a)
            .collect();

        Ok(selected * self.normalization(params, category)?)
    }

    /// Scaled, morphed template of every stacked row, shape `(rows, n_bins)`.
    ///
    /// Rows follow [`CategoryModel::row_labels`].
    pub fn predict_components(
        &self,
        params: &Array1<f64>,
        category: &CategoryModel,
        amplitudes: Option<&Array1<f64>>,
    ) -> Result<Array2<f64>> {
        let scales = self.row_scales(params, category, amplitudes)?;
        let morphed = category.morph(&self.shape_weights(params)?)?;
        Ok(morphed * &scales.insert_axis(Axis(1)))
    }

    /// Predicted value and variance of a category.
    ///
    /// # Arguments
    ///
    /// * `params` - Parameter vector in registry order
    /// * `category` - The category to predict
    /// * `amplitudes` - Process amplitudes overriding those computed from the POIs
    /// * `randomize` - Add the category's frozen fluctuation `sqrt(variance)·r`
    pub fn predict(
        &self,
        params: &Array1<f64>,
        category: &CategoryModel,
        amplitudes: Option<&Array1<f64>>,
        randomize: bool,
    ) -> Result<Prediction> {
        let components = self.predict_components(params, category, amplitudes)?;
        let mut value = components.sum_axis(Axis(0));
        let variance = category.raw_variance().clone();

        if randomize {
            value = value + variance.mapv(f64::sqrt) * category.fluctuation();
        }

        Ok(Prediction { value, variance })
    }
}
