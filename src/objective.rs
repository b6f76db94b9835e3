//! The objective aggregator.
//!
//! [`FitModel`] bundles the parameter registry, the template store and the
//! mixture model. It is immutable after construction and every evaluation
//! returns its diagnostics instead of caching them, so one model can be
//! shared between threads. [`FitSession`] is the per-fit handle an optimizer
//! drives through the [`Objective`] trait; it keeps the evaluation count and
//! the diagnostics of the last evaluation.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use ndarray::{arr1, Array1, Array2, ArrayView1, CowArray};

use crate::barlow_beeston;
use crate::config::{CostOptions, CostType, FitConfig};
use crate::error::{FitError, Result};
use crate::model::{MixtureModel, Prediction};
use crate::parameters::registry::N_BRANCHING_FRACTIONS;
use crate::parameters::{ParameterRegistry, ParameterTable};
use crate::templates::{BinnedData, CategoryId, TemplateProvider, TemplateStore};

/// A scalar function of a real parameter vector, as seen by a minimizer.
///
/// Points outside the allowed domain evaluate to `+∞` rather than failing.
pub trait Objective {
    /// Length of the parameter vector.
    fn parameter_count(&self) -> usize;

    /// Evaluate the cost at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64>;
}

/// Per-category data replacing the stored data, e.g. a toy dataset.
pub type ExternalData = HashMap<CategoryId, BinnedData>;

/// Cost contribution of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCost {
    pub category: CategoryId,
    /// Poisson or chi-square cost of the category's bins.
    pub cost: f64,
    /// Sum of the Barlow-Beeston penalties (0 without MC-stat treatment).
    pub mc_stat_penalty: f64,
    /// Barlow-Beeston scale per bin, when MC-stat treatment is on.
    pub beta: Option<Array1<f64>>,
}

/// Breakdown of one objective evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Non-vetoed categories in id order.
    pub categories: Vec<CategoryCost>,
    /// Gaussian priors of the nuisance parameters.
    pub prior: f64,
    /// `(1 − Σβ)² / 2ε²`
    pub sum_constraint: f64,
    /// The branching fractions were outside `(0, 1)` and nothing was evaluated.
    pub rejected: bool,
}

impl Diagnostics {
    fn rejected() -> Self {
        Self {
            rejected: true,
            ..Self::default()
        }
    }

    pub fn category(&self, id: CategoryId) -> Option<&CategoryCost> {
        self.categories.iter().find(|c| c.category == id)
    }

    /// Sum of the category costs and their penalties.
    pub fn data_cost(&self) -> f64 {
        self.categories
            .iter()
            .map(|c| c.cost + c.mc_stat_penalty)
            .sum()
    }
}

/// Cost and diagnostics of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CostEvaluation {
    pub cost: f64,
    pub diagnostics: Diagnostics,
}

fn poisson_cost(data: ArrayView1<f64>, model: ArrayView1<f64>) -> f64 {
    data.iter()
        .zip(model.iter())
        .filter(|(d, m)| **m > 0.0 && **d > 0.0)
        .map(|(d, m)| -d * m.ln() + m)
        .sum()
}

fn chi2_cost(
    data: ArrayView1<f64>,
    data_variance: ArrayView1<f64>,
    model: ArrayView1<f64>,
    model_variance: ArrayView1<f64>,
) -> f64 {
    let mut cost = 0.0;
    for i in 0..data.len() {
        let variance = data_variance[i] + model_variance[i];
        if variance > 0.0 {
            cost += 0.5 * (data[i] - model[i]).powi(2) / variance;
        }
    }
    cost
}

/// The immutable fit model: registry, templates and mixture evaluator.
#[derive(Debug, Clone)]
pub struct FitModel {
    config: FitConfig,
    registry: ParameterRegistry,
    store: TemplateStore,
    mixture: MixtureModel,
    vetoed: Vec<bool>,
}

impl FitModel {
    /// Build a model from the parameter table and the provider's templates.
    pub fn new(config: FitConfig, table: &ParameterTable, provider: &TemplateProvider) -> Result<Self> {
        config.validate()?;
        let processes = config.process_names();
        let registry = ParameterRegistry::from_table(table, &config.selections, &processes)?;
        let store = TemplateStore::build(&registry, provider, &config)?;
        Self::from_parts(config, registry, store)
    }

    /// Assemble a model from an already built registry and store.
    pub fn from_parts(config: FitConfig, registry: ParameterRegistry, store: TemplateStore) -> Result<Self> {
        let mixture = MixtureModel::new(&registry, &config);
        if mixture.slot_count() != store.n_slots() {
            return Err(FitError::DimensionMismatch(format!(
                "store has {} process slots, configuration has {}",
                store.n_slots(),
                mixture.slot_count()
            )));
        }

        let unconstrained = registry.unconstrained_nuisances();
        if !unconstrained.is_empty() {
            log::warn!(
                "no prior on nuisance parameters with zero initial uncertainty: {}",
                unconstrained.join(", ")
            );
        }

        let mut vetoed = vec![false; store.len()];
        for key in &config.vetoed_categories {
            match store.id(&key.selection, &key.category) {
                Ok(id) => vetoed[id.index()] = true,
                Err(_) => log::warn!("vetoed category {} is not in the template store", key),
            }
        }

        Ok(Self {
            config,
            registry,
            store,
            mixture,
            vetoed,
        })
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn mixture(&self) -> &MixtureModel {
        &self.mixture
    }

    pub fn parameter_count(&self) -> usize {
        self.registry.len()
    }

    /// Initial parameter values, a natural starting point for a minimizer.
    pub fn initial_values(&self) -> Array1<f64> {
        self.registry.initial_values()
    }

    pub fn is_vetoed(&self, id: CategoryId) -> bool {
        self.vetoed.get(id.index()).copied().unwrap_or(false)
    }

    pub fn predict(&self, params: &Array1<f64>, id: CategoryId, randomize: bool) -> Result<Prediction> {
        self.mixture.predict(params, self.store.get(id)?, None, randomize)
    }

    /// Per-process morphed and scaled templates, rows as in
    /// [`CategoryModel::row_labels`](crate::templates::CategoryModel::row_labels).
    pub fn predict_components(&self, params: &Array1<f64>, id: CategoryId) -> Result<Array2<f64>> {
        self.mixture.predict_components(params, self.store.get(id)?, None)
    }

    /// Integrated predicted yield of every process row of a category.
    pub fn expected_yields(&self, params: &Array1<f64>, id: CategoryId) -> Result<Vec<(String, f64)>> {
        let category = self.store.get(id)?;
        let components = self.mixture.predict_components(params, category, None)?;
        Ok(category
            .row_labels()
            .iter()
            .cloned()
            .zip(components.outer_iter().map(|row| row.sum()))
            .collect())
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

    /// Evaluate the cost and its breakdown.
    ///
    /// # Arguments
    ///
    /// * `params` - Parameter vector in registry order
    /// * `data` - Data replacing the stored data of every category, if given
    /// * `options` - Cost type and per-evaluation switches
    ///
    /// # Returns
    ///
    /// * `+∞` if a branching fraction lies outside `(0, 1)`
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` for a wrongly sized parameter vector or data
    /// * `MissingData` if `data` lacks a non-vetoed category
    pub fn evaluate(
        &self,
        params: &Array1<f64>,
        data: Option<&ExternalData>,
        options: &CostOptions,
    ) -> Result<CostEvaluation> {
        self.check_params(params)?;

        let beta = params.slice(ndarray::s![..N_BRANCHING_FRACTIONS]);
        if beta.iter().any(|b| !(*b > 0.0 && *b < 1.0)) {
            return Ok(CostEvaluation {
                cost: f64::INFINITY,
                diagnostics: Diagnostics::rejected(),
            });
        }

        let amplitudes = self.mixture.process_amplitudes(params)?;
        let mut diagnostics = Diagnostics::default();
        for (id, category) in self.store.iter() {
            if self.vetoed[id.index()] {
                continue;
            }

            let observed = match data {
                Some(external) => external.get(&id).ok_or_else(|| {
                    FitError::MissingData(format!("no data for category {}", category.key()))
                })?,
                None => category.data(),
            };
            if observed.len() != category.n_bins() {
                return Err(FitError::DimensionMismatch(format!(
                    "{}: data has {} bins, templates have {}",
                    category.key(),
                    observed.len(),
                    category.n_bins()
                )));
            }

            let prediction = self
                .mixture
                .predict(params, category, Some(&amplitudes), options.randomize_templates)?;
            let (mut model, model_variance, d, data_variance) = if options.no_shape {
                (
                    arr1(&[prediction.value.sum()]),
                    arr1(&[prediction.variance.sum()]),
                    CowArray::from(arr1(&[observed.values.sum()])),
                    CowArray::from(arr1(&[observed.variances.sum()])),
                )
            } else {
                (
                    prediction.value,
                    prediction.variance,
                    CowArray::from(observed.values.view()),
                    CowArray::from(observed.variances.view()),
                )
            };

            let mut mc_stat_penalty = 0.0;
            let mut bin_beta = None;
            if options.do_mc_stat {
                let correction = barlow_beeston::correct_bins(&d, &model, &model_variance)?;
                model = correction.model;
                mc_stat_penalty = correction.penalty;
                bin_beta = Some(correction.beta);
            }

            let cost = match options.cost_type {
                CostType::Poisson => poisson_cost(d.view(), model.view()),
                CostType::Chi2 => chi2_cost(
                    d.view(),
                    data_variance.view(),
                    model.view(),
                    model_variance.view(),
                ),
            };

            diagnostics.categories.push(CategoryCost {
                category: id,
                cost,
                mc_stat_penalty,
                beta: bin_beta,
            });
        }

        diagnostics.prior = self.prior(params);

        let epsilon = self.config.sum_constraint_width;
        diagnostics.sum_constraint = (1.0 - beta.sum()).powi(2) / (2.0 * epsilon * epsilon);

        let cost = diagnostics.data_cost() + diagnostics.prior + diagnostics.sum_constraint;
        Ok(CostEvaluation { cost, diagnostics })
    }

    /// Gaussian priors of the nuisance parameters with a positive initial uncertainty.
    fn prior(&self, params: &Array1<f64>) -> f64 {
        self.registry
            .parameters()
            .iter()
            .zip(params.iter())
            .skip(self.registry.n_poi())
            .filter(|(p, _)| p.initial_uncertainty() > 0.0)
            .map(|(p, value)| {
                let sigma = p.initial_uncertainty();
                (value - p.initial_value()).powi(2) / (2.0 * sigma * sigma)
            })
            .sum()
    }

    /// The scalar cost only.
    pub fn cost(&self, params: &Array1<f64>, data: Option<&ExternalData>, options: &CostOptions) -> Result<f64> {
        Ok(self.evaluate(params, data, options)?.cost)
    }

    /// Start a fit session with fixed options, evaluating the stored data.
    pub fn session(&self, options: CostOptions) -> FitSession<'_> {
        FitSession {
            model: self,
            options,
            data: None,
            evaluations: Cell::new(0),
            last: RefCell::new(None),
        }
    }
}

/// One fit: a model, fixed options and optionally external data.
///
/// Keeps bookkeeping in interior cells, so a session belongs to a single
/// thread; concurrent fits each create their own.
#[derive(Debug)]
pub struct FitSession<'a> {
    model: &'a FitModel,
    options: CostOptions,
    data: Option<&'a ExternalData>,
    evaluations: Cell<usize>,
    last: RefCell<Option<Diagnostics>>,
}

impl<'a> FitSession<'a> {
    /// Evaluate against the given data instead of the stored data.
    pub fn with_data(mut self, data: &'a ExternalData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn model(&self) -> &'a FitModel {
        self.model
    }

    pub fn options(&self) -> &CostOptions {
        &self.options
    }

    /// Number of evaluations since creation or the last [`reset`](Self::reset).
    pub fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    /// Diagnostics of the most recent successful evaluation.
    pub fn last_diagnostics(&self) -> Option<Diagnostics> {
        self.last.borrow().clone()
    }

    pub fn reset(&self) {
        self.evaluations.set(0);
        *self.last.borrow_mut() = None;
    }

    /// Evaluate and record the diagnostics.
    pub fn evaluate(&self, params: &Array1<f64>) -> Result<CostEvaluation> {
        self.evaluations.set(self.evaluations.get() + 1);
        let evaluation = self.model.evaluate(params, self.data, &self.options)?;
        *self.last.borrow_mut() = Some(evaluation.diagnostics.clone());
        Ok(evaluation)
    }
}

impl Objective for FitSession<'_> {
    fn parameter_count(&self) -> usize {
        self.model.parameter_count()
    }

    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        Ok(self.evaluate(params)?.cost)
    }
}
