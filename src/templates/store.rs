//! Dense per-category model tensors.

use std::collections::HashMap;

use ndarray::{s, Array1, Array2, Array3, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::config::{CategoryKey, FitConfig};
use crate::error::{FitError, Result};
use crate::parameters::ParameterRegistry;
use crate::templates::{
    BinnedData, CategoryTemplates, ProcessKind, ProcessTemplates, Template, TemplateProvider,
};

/// Dense index of a `(selection, category)` pair, assigned at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(usize);

impl CategoryId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The resolved model of one category.
#[derive(Debug, Clone)]
pub struct CategoryModel {
    key: CategoryKey,
    /// Shape `(rows, 2 + 2·n_shape, n_bins)`.
    tensor: Array3<f64>,
    /// One entry per process slot of the fit layout.
    process_mask: Vec<bool>,
    /// Shape `(rows, n_norm)`.
    norm_mask: Array2<bool>,
    row_labels: Vec<String>,
    raw_variance: Array1<f64>,
    data: BinnedData,
    fluctuation: Array1<f64>,
}

impl CategoryModel {
    pub fn key(&self) -> &CategoryKey {
        &self.key
    }

    pub fn selection(&self) -> &str {
        &self.key.selection
    }

    pub fn category(&self) -> &str {
        &self.key.category
    }

    pub fn n_bins(&self) -> usize {
        self.tensor.len_of(Axis(2))
    }

    /// Number of stacked process rows.
    pub fn n_rows(&self) -> usize {
        self.tensor.len_of(Axis(0))
    }

    pub fn tensor(&self) -> &Array3<f64> {
        &self.tensor
    }

    pub fn process_mask(&self) -> &[bool] {
        &self.process_mask
    }

    pub fn norm_mask(&self) -> &Array2<bool> {
        &self.norm_mask
    }

    /// `process` or `process/channel` for every stacked row.
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Stored observed data.
    pub fn data(&self) -> &BinnedData {
        &self.data
    }

    /// Sum over stacked rows of the unscaled variance row.
    pub fn raw_variance(&self) -> &Array1<f64> {
        &self.raw_variance
    }

    /// Standard-normal vector drawn once per bin at build time.
    pub fn fluctuation(&self) -> &Array1<f64> {
        &self.fluctuation
    }

    /// Contract every row block with the morphing weights, giving the
    /// morphed template of each row, shape `(rows, n_bins)`.
    pub fn morph(&self, weights: &Array1<f64>) -> Result<Array2<f64>> {
        if weights.len() != self.tensor.len_of(Axis(1)) {
            return Err(FitError::DimensionMismatch(format!(
                "{}: expected {} morphing weights, got {}",
                self.key,
                self.tensor.len_of(Axis(1)),
                weights.len()
            )));
        }

        let mut morphed = Array2::zeros((self.n_rows(), self.n_bins()));
        for (mut row, block) in morphed.outer_iter_mut().zip(self.tensor.outer_iter()) {
            row.assign(&weights.dot(&block));
        }
        Ok(morphed)
    }
}

/// Accumulates the rows of one category while walking the process list.
struct CategoryBuilder<'a> {
    registry: &'a ParameterRegistry,
    key: &'a CategoryKey,
    n_bins: usize,
    width: usize,
    significance_cut: Option<f64>,
    data_variance_total: f64,
    blocks: Vec<Array2<f64>>,
    norm_flags: Vec<bool>,
    row_labels: Vec<String>,
    process_mask: Vec<bool>,
}

impl<'a> CategoryBuilder<'a> {
    fn absent(&mut self, process: &str, slots: usize) {
        log::debug!("{}: process '{}' absent, masking {} slot(s)", self.key, process, slots);
        self.process_mask.extend(std::iter::repeat(false).take(slots));
    }

    fn significance(&self, template: &Template) -> f64 {
        let total = template.total();
        let denominator = self.data_variance_total.sqrt();
        if denominator > 0.0 {
            total / denominator
        } else if total > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    fn add(&mut self, process: &str, label: String, template: &Template) -> Result<()> {
        let location = format!("{}/{}", self.key, label);
        template.validate(&location, self.n_bins)?;

        if let Some(cut) = self.significance_cut {
            let significance = self.significance(template);
            if significance < cut {
                log::debug!("{}: significance {:.3e} below cut {}, masked", location, significance, cut);
                self.process_mask.push(false);
                return Ok(());
            }
        }

        let mut block = Array2::zeros((self.width, self.n_bins));
        block.row_mut(0).assign(&Array1::from_vec(template.values.clone()));
        block.row_mut(1).assign(&Array1::from_vec(template.variances.clone()));

        let selection = &self.key.selection;
        for (k, parameter) in self.registry.shape_parameters().iter().enumerate() {
            if !parameter.affects(selection, process) {
                continue;
            }
            match template.deltas(parameter.name()) {
                Some((plus, minus)) => {
                    block.row_mut(2 + 2 * k).assign(&plus);
                    block.row_mut(3 + 2 * k).assign(&minus);
                }
                None => log::debug!(
                    "{}: no variation for shape parameter '{}'",
                    location,
                    parameter.name()
                ),
            }
        }

        self.norm_flags.extend(
            self.registry
                .norm_parameters()
                .iter()
                .map(|p| p.affects(selection, process)),
        );
        self.blocks.push(block);
        self.row_labels.push(label);
        self.process_mask.push(true);
        Ok(())
    }

    fn finish<R: Rng>(self, data: BinnedData, rng: &mut R) -> Result<CategoryModel> {
        let n_rows = self.blocks.len();
        let mut tensor = Array3::zeros((n_rows, self.width, self.n_bins));
        for (i, block) in self.blocks.iter().enumerate() {
            tensor.slice_mut(s![i, .., ..]).assign(block);
        }

        let norm_mask = Array2::from_shape_vec((n_rows, self.registry.n_norm()), self.norm_flags)
            .map_err(|e| FitError::DimensionMismatch(format!("{}: norm mask: {}", self.key, e)))?;

        let raw_variance = tensor.index_axis(Axis(1), 1).sum_axis(Axis(0));
        let fluctuation: Array1<f64> = (0..self.n_bins)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();

        Ok(CategoryModel {
            key: self.key.clone(),
            tensor,
            process_mask: self.process_mask,
            norm_mask,
            row_labels: self.row_labels,
            raw_variance,
            data,
            fluctuation,
        })
    }
}

/// Read-only store of every category model, indexed by [`CategoryId`].
#[derive(Debug, Clone)]
pub struct TemplateStore {
    categories: Vec<CategoryModel>,
    index: HashMap<CategoryKey, CategoryId>,
    n_slots: usize,
}

impl TemplateStore {
    /// Resolve the provider's templates into dense category models.
    ///
    /// Categories are numbered in selection order (as configured), then by
    /// category name.
    ///
    /// # Errors
    ///
    /// * `InvalidTemplate` if a configured selection has no templates, a
    ///   template does not match its process kind, or a composite process
    ///   names an unknown decay channel
    /// * `NegativeVariance` / `DimensionMismatch` for malformed histograms
    pub fn build(
        registry: &ParameterRegistry,
        provider: &TemplateProvider,
        config: &FitConfig,
    ) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let n_slots = config.processes.iter().map(|p| p.slot_count()).sum();

        let mut categories = Vec::new();
        let mut index = HashMap::new();

        for selection in &config.selections {
            let selection_templates = provider.selection(selection).ok_or_else(|| {
                FitError::InvalidTemplate(format!("no templates for selection '{}'", selection))
            })?;

            for (category, templates) in selection_templates {
                let key = CategoryKey::new(selection, category);
                let model = Self::build_category(registry, config, &key, templates, &mut rng)?;
                index.insert(key, CategoryId(categories.len()));
                categories.push(model);
            }
        }

        for name in provider.selection_names() {
            if !config.selections.iter().any(|s| s == name) {
                log::debug!("selection '{}' is not configured, skipped", name);
            }
        }

        log::info!(
            "template store: {} categories, {} process slots",
            categories.len(),
            n_slots
        );

        Ok(Self {
            categories,
            index,
            n_slots,
        })
    }

    fn build_category<R: Rng>(
        registry: &ParameterRegistry,
        config: &FitConfig,
        key: &CategoryKey,
        templates: &CategoryTemplates,
        rng: &mut R,
    ) -> Result<CategoryModel> {
        templates.data.validate(&format!("{}/data", key))?;
        let data = templates.data.to_binned();

        let mut builder = CategoryBuilder {
            registry,
            key,
            n_bins: data.len(),
            width: 2 + 2 * registry.n_shape(),
            significance_cut: config.significance_cut,
            data_variance_total: data.variances.sum(),
            blocks: Vec::new(),
            norm_flags: Vec::new(),
            row_labels: Vec::new(),
            process_mask: Vec::new(),
        };

        for process in &config.processes {
            match (process.kind, templates.processes.get(&process.name)) {
                (_, None) => builder.absent(&process.name, process.slot_count()),
                (ProcessKind::Simple, Some(ProcessTemplates::Simple(template))) => {
                    builder.add(&process.name, process.name.clone(), template)?;
                }
                (ProcessKind::Composite(topology), Some(ProcessTemplates::Composite(channels))) => {
                    let labels = topology.channel_labels();
                    if let Some(unknown) = channels.keys().find(|c| !labels.contains(&c.as_str())) {
                        return Err(FitError::InvalidTemplate(format!(
                            "{}/{}: unknown decay channel '{}'",
                            key, process.name, unknown
                        )));
                    }
                    for label in labels {
                        match channels.get(*label) {
                            Some(template) => builder.add(
                                &process.name,
                                format!("{}/{}", process.name, label),
                                template,
                            )?,
                            None => builder.absent(&format!("{}/{}", process.name, label), 1),
                        }
                    }
                }
                (kind, Some(_)) => {
                    return Err(FitError::InvalidTemplate(format!(
                        "{}/{}: templates do not match process kind {:?}",
                        key, process.name, kind
                    )));
                }
            }
        }

        builder.finish(data, rng)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of process slots (length of every process mask).
    pub fn n_slots(&self) -> usize {
        self.n_slots
    }

    /// Look up the id of a `(selection, category)` pair.
    pub fn id(&self, selection: &str, category: &str) -> Result<CategoryId> {
        let key = CategoryKey::new(selection, category);
        self.index
            .get(&key)
            .copied()
            .ok_or_else(|| FitError::UnknownCategory(key.to_string()))
    }

    pub fn get(&self, id: CategoryId) -> Result<&CategoryModel> {
        self.categories
            .get(id.0)
            .ok_or_else(|| FitError::UnknownCategory(id.to_string()))
    }

    /// All categories in id order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &CategoryModel)> {
        self.categories
            .iter()
            .enumerate()
            .map(|(i, c)| (CategoryId(i), c))
    }

    pub fn ids(&self) -> impl Iterator<Item = CategoryId> {
        (0..self.categories.len()).map(CategoryId)
    }
}
