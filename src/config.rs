//! Configuration options for the fit engine.
//!
//! [`FitConfig`] holds everything that is fixed for the lifetime of a
//! [`FitModel`](crate::objective::FitModel): the analysis layout (selections
//! and processes), the template significance cut, the reference branching
//! fractions the templates were generated at, and the constraint settings.
//! [`CostOptions`] holds the per-evaluation switches of the objective.

use serde::{Deserialize, Serialize};

use crate::amplitudes::{Topology, REFERENCE_BETA, TAU_BRANCHING_FRACTIONS};
use crate::error::{FitError, Result};
use crate::templates::ProcessSpec;

/// Likelihood used to compare a category's prediction with data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostType {
    /// Poisson negative log-likelihood (constant terms dropped).
    Poisson,
    /// Gaussian chi-square with data and model variances combined.
    Chi2,
}

impl Default for CostType {
    fn default() -> Self {
        CostType::Poisson
    }
}

/// Interpolation used for shape nuisance parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphingOrder {
    /// `nominal + s·(up - down)/2`
    Linear,
    /// Quadratic through the nominal, up and down templates at `s = 0, +1, -1`.
    Quadratic,
}

impl Default for MorphingOrder {
    fn default() -> Self {
        MorphingOrder::Quadratic
    }
}

/// A `(selection, category)` pair named by strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryKey {
    pub selection: String,
    pub category: String,
}

impl CategoryKey {
    pub fn new(selection: &str, category: &str) -> Self {
        Self {
            selection: selection.to_string(),
            category: category.to_string(),
        }
    }
}

impl std::fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.selection, self.category)
    }
}

/// Configuration of the fit engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Selections to fit, in order. Default: the seven lepton selections
    pub selections: Vec<String>,

    /// Processes stacked into every category tensor, in order.
    /// Default: zjets, diboson, fakes, ttbar, t, wjets
    pub processes: Vec<ProcessSpec>,

    /// Templates with `Σ nominal / sqrt(Σ data variance)` below this are masked.
    /// Default: None (no masking)
    pub significance_cut: Option<f64>,

    /// W branching fractions `[e, mu, tau, h]` the templates were generated at.
    pub reference_beta: [f64; 4],

    /// Tau branching fractions `[e, mu, h]`.
    pub br_tau: [f64; 3],

    /// Width ε of the `(1 - Σβ)² / 2ε²` sum constraint. Default: 1e-6
    pub sum_constraint_width: f64,

    /// Shape morphing order. Default: Quadratic
    pub morphing: MorphingOrder,

    /// Categories excluded from the cost.
    pub vetoed_categories: Vec<CategoryKey>,

    /// Seed of the frozen per-bin normal fluctuations. Default: 0
    pub seed: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            selections: ["ee", "mumu", "emu", "etau", "mutau", "e4j", "mu4j"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            processes: vec![
                ProcessSpec::simple("zjets"),
                ProcessSpec::simple("diboson"),
                ProcessSpec::simple("fakes"),
                ProcessSpec::composite("ttbar", Topology::DoubleW),
                ProcessSpec::composite("t", Topology::DoubleW),
                ProcessSpec::composite("wjets", Topology::SingleW),
            ],
            significance_cut: None,
            reference_beta: REFERENCE_BETA,
            br_tau: TAU_BRANCHING_FRACTIONS,
            sum_constraint_width: 1e-6,
            morphing: MorphingOrder::default(),
            vetoed_categories: Vec::new(),
            seed: 0,
        }
    }
}

impl FitConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FitConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_selections<S: AsRef<str>>(mut self, selections: &[S]) -> Self {
        self.selections = selections.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_processes(mut self, processes: Vec<ProcessSpec>) -> Self {
        self.processes = processes;
        self
    }

    pub fn with_significance_cut(mut self, cut: f64) -> Self {
        self.significance_cut = Some(cut);
        self
    }

    pub fn with_reference_beta(mut self, beta: [f64; 4]) -> Self {
        self.reference_beta = beta;
        self
    }

    pub fn with_br_tau(mut self, br_tau: [f64; 3]) -> Self {
        self.br_tau = br_tau;
        self
    }

    pub fn with_sum_constraint_width(mut self, width: f64) -> Self {
        self.sum_constraint_width = width;
        self
    }

    pub fn with_morphing(mut self, order: MorphingOrder) -> Self {
        self.morphing = order;
        self
    }

    pub fn with_vetoed_category(mut self, selection: &str, category: &str) -> Self {
        self.vetoed_categories.push(CategoryKey::new(selection, category));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Names of the configured processes, in order.
    pub fn process_names(&self) -> Vec<String> {
        self.processes.iter().map(|p| p.name.clone()).collect()
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.selections.is_empty() {
            return Err(FitError::InvalidConfig("no selections configured".to_string()));
        }
        if self.processes.is_empty() {
            return Err(FitError::InvalidConfig("no processes configured".to_string()));
        }

        let mut names = self.process_names();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.processes.len() {
            return Err(FitError::InvalidConfig("duplicate process names".to_string()));
        }

        if !(self.sum_constraint_width > 0.0) {
            return Err(FitError::InvalidConfig(format!(
                "sum constraint width must be positive, got {}",
                self.sum_constraint_width
            )));
        }

        if self.reference_beta.iter().any(|b| !(*b > 0.0 && *b < 1.0)) {
            return Err(FitError::InvalidConfig(format!(
                "reference branching fractions must lie in (0, 1): {:?}",
                self.reference_beta
            )));
        }
        let beta_sum: f64 = self.reference_beta.iter().sum();
        if (beta_sum - 1.0).abs() > 1e-9 {
            return Err(FitError::InvalidConfig(format!(
                "reference branching fractions sum to {}",
                beta_sum
            )));
        }

        if self.br_tau.iter().any(|b| !(*b > 0.0)) {
            return Err(FitError::InvalidConfig(format!(
                "tau branching fractions must be positive: {:?}",
                self.br_tau
            )));
        }

        Ok(())
    }
}

/// Switches of a single objective evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostOptions {
    /// Likelihood used per bin. Default: Poisson
    pub cost_type: CostType,

    /// Integrate every category into a single bin before computing the cost.
    pub no_shape: bool,

    /// Profile the Monte Carlo statistical uncertainty with Barlow-Beeston.
    pub do_mc_stat: bool,

    /// Add the frozen per-bin fluctuations to the prediction.
    pub randomize_templates: bool,
}

impl CostOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cost_type(mut self, cost_type: CostType) -> Self {
        self.cost_type = cost_type;
        self
    }

    pub fn with_no_shape(mut self, no_shape: bool) -> Self {
        self.no_shape = no_shape;
        self
    }

    pub fn with_mc_stat(mut self, do_mc_stat: bool) -> Self {
        self.do_mc_stat = do_mc_stat;
        self
    }

    pub fn with_randomized_templates(mut self, randomize: bool) -> Self {
        self.randomize_templates = randomize;
        self
    }
}
