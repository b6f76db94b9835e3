//! # nllfit-rs
//!
//! `nllfit-rs` is the likelihood engine of a binned template fit measuring
//! the W boson leptonic branching fractions.
//!
//! The library provides:
//! - A parameter registry resolving POIs, normalization and shape nuisances
//! - A template store turning per-category Monte Carlo templates into dense tensors
//! - Signal amplitudes for single and double W decay topologies
//! - A mixture model predicting bin contents with quadratic template morphing
//! - Barlow-Beeston treatment of finite Monte Carlo statistics
//! - An objective aggregating Poisson or chi-square costs, priors and the
//!   branching fraction sum constraint into a scalar for any minimizer
//! - Covariance estimation from the numerical Hessian (`matrix` feature)
//!
//! ## Basic Usage
//!
//! ```
//! use nllfit_rs::{
//!     CategoryTemplates, CostOptions, FitConfig, FitModel, Histogram, Objective,
//!     ParameterKind, ParameterRow, ParameterTable, ProcessSpec, Template, TemplateProvider,
//! };
//!
//! let selections = ["mumu"];
//! let processes = ["zjets"];
//!
//! let mut table = ParameterTable::new();
//! for (name, value) in [("beta_e", 0.108), ("beta_mu", 0.108), ("beta_tau", 0.108), ("beta_h", 0.676)] {
//!     table.push(
//!         ParameterRow::new(name, ParameterKind::Poi, value, 0.0)
//!             .with_columns(&selections, true)
//!             .with_columns(&processes, true),
//!     );
//! }
//!
//! let provider = TemplateProvider::new().with_category(
//!     "mumu",
//!     "cat_0",
//!     CategoryTemplates::new(Histogram::poisson(vec![11.0, 19.0]))
//!         .with_simple("zjets", Template::new(vec![10.0, 20.0], vec![1.0, 2.0])),
//! );
//!
//! let config = FitConfig::default()
//!     .with_selections(&selections)
//!     .with_processes(vec![ProcessSpec::simple("zjets")]);
//! let model = FitModel::new(config, &table, &provider)?;
//!
//! let session = model.session(CostOptions::new());
//! let cost = session.eval_cost(&model.initial_values())?;
//! assert!(cost.is_finite());
//! # Ok::<(), nllfit_rs::FitError>(())
//! ```

pub mod amplitudes;
pub mod barlow_beeston;
pub mod config;
pub mod error;
pub mod model;
pub mod objective;
pub mod parallel;
pub mod parameters;
pub mod templates;

#[cfg(feature = "matrix")]
mod utils;

#[cfg(feature = "matrix")]
pub mod uncertainty;

// Re-exports for convenience
pub use amplitudes::{amplitudes, ReferenceAmplitudes, Topology};
pub use config::{CategoryKey, CostOptions, CostType, FitConfig, MorphingOrder};
pub use error::{FitError, Result};
pub use model::{MixtureModel, Prediction};
pub use objective::{
    CategoryCost, CostEvaluation, Diagnostics, ExternalData, FitModel, FitSession, Objective,
};
pub use parameters::{Parameter, ParameterKind, ParameterRegistry, ParameterRow, ParameterTable};
pub use templates::{
    BinnedData, CategoryId, CategoryModel, CategoryTemplates, Histogram, ProcessKind,
    ProcessSpec, ProcessTemplates, Template, TemplateProvider, TemplateStore,
};

#[cfg(feature = "matrix")]
pub use uncertainty::{covariance, CovarianceEstimate};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
