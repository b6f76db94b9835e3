//! The parameter registry.
//!
//! The registry is the read-only, resolved form of a [`ParameterTable`]. Its
//! parameter order defines the layout of every parameter vector passed to the
//! objective: all POIs first, then normalization, then shape parameters, each
//! group keeping the order of the table.

use std::collections::{BTreeMap, HashMap, HashSet};

use ndarray::Array1;

use crate::error::{FitError, Result};
use crate::parameters::table::{ParameterKind, ParameterRow, ParameterTable};

/// Number of leading POIs that are W branching fractions.
pub const N_BRANCHING_FRACTIONS: usize = 4;

/// Looks up the applicability flag of every required column of a row.
fn resolve_columns<S: AsRef<str>>(
    row: &ParameterRow,
    columns: &[S],
) -> Result<BTreeMap<String, bool>> {
    let mut flags = BTreeMap::new();
    for column in columns {
        let column = column.as_ref();
        let applies = row
            .columns
            .get(column)
            .copied()
            .ok_or_else(|| FitError::MissingColumn {
                parameter: row.name.clone(),
                column: column.to_string(),
            })?;
        flags.insert(column.to_string(), applies);
    }
    Ok(flags)
}

/// A resolved fit parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    initial_value: f64,
    initial_uncertainty: f64,
    active: bool,
    selections: BTreeMap<String, bool>,
    processes: BTreeMap<String, bool>,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    pub fn initial_uncertainty(&self) -> f64 {
        self.initial_uncertainty
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the parameter applies to the selection. Unknown selections do not apply.
    pub fn applies_to_selection(&self, selection: &str) -> bool {
        self.selections.get(selection).copied().unwrap_or(false)
    }

    /// Whether the parameter applies to the process. Unknown processes do not apply.
    pub fn applies_to_process(&self, process: &str) -> bool {
        self.processes.get(process).copied().unwrap_or(false)
    }

    /// Active and applicable to both the selection and the process.
    pub fn affects(&self, selection: &str, process: &str) -> bool {
        self.active && self.applies_to_selection(selection) && self.applies_to_process(process)
    }
}

/// Read-only lookup structure over the fit parameters.
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    parameters: Vec<Parameter>,
    index: HashMap<String, usize>,
    n_poi: usize,
    n_norm: usize,
    n_shape: usize,
}

impl ParameterRegistry {
    /// Build the registry from a parameter table.
    ///
    /// # Arguments
    ///
    /// * `table` - The parameter table
    /// * `selections` - Selections every row must carry a column for
    /// * `processes` - Processes every row must carry a column for
    ///
    /// # Errors
    ///
    /// * `MissingColumn` if a row lacks a selection or process column
    /// * `DuplicateParameter` if a name appears twice
    /// * `InvalidParameter` for non-finite values, negative uncertainties, or
    ///   fewer than four POIs
    pub fn from_table<S: AsRef<str>, P: AsRef<str>>(
        table: &ParameterTable,
        selections: &[S],
        processes: &[P],
    ) -> Result<Self> {
        let mut parameters = Vec::with_capacity(table.len());
        let mut seen = HashSet::new();

        for row in table.rows() {
            if !seen.insert(row.name.as_str()) {
                return Err(FitError::DuplicateParameter(row.name.clone()));
            }

            if !row.value.is_finite() {
                return Err(FitError::InvalidParameter(format!(
                    "initial value of '{}' is not finite",
                    row.name
                )));
            }
            if !row.uncertainty.is_finite() || row.uncertainty < 0.0 {
                return Err(FitError::InvalidParameter(format!(
                    "initial uncertainty of '{}' must be finite and non-negative, got {}",
                    row.name, row.uncertainty
                )));
            }

            let selection_flags = resolve_columns(row, selections)?;
            let process_flags = resolve_columns(row, processes)?;

            parameters.push(Parameter {
                name: row.name.clone(),
                kind: row.kind,
                initial_value: row.value,
                initial_uncertainty: row.uncertainty,
                active: row.active,
                selections: selection_flags,
                processes: process_flags,
            });
        }

        // Stable, so table order is kept within each kind.
        parameters.sort_by_key(|p| p.kind);

        let count = |kind| parameters.iter().filter(|p| p.kind == kind).count();
        let n_poi = count(ParameterKind::Poi);
        let n_norm = count(ParameterKind::Norm);
        let n_shape = count(ParameterKind::Shape);

        if n_poi < N_BRANCHING_FRACTIONS {
            return Err(FitError::InvalidParameter(format!(
                "expected at least {} POIs (branching fractions), found {}",
                N_BRANCHING_FRACTIONS, n_poi
            )));
        }

        let index = parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();

        log::info!(
            "parameter registry: {} POI, {} normalization, {} shape parameters",
            n_poi,
            n_norm,
            n_shape
        );

        Ok(Self {
            parameters,
            index,
            n_poi,
            n_norm,
            n_shape,
        })
    }

    pub fn n_poi(&self) -> usize {
        self.n_poi
    }

    pub fn n_norm(&self) -> usize {
        self.n_norm
    }

    pub fn n_shape(&self) -> usize {
        self.n_shape
    }

    /// Total number of parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// All parameters in vector order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn poi_parameters(&self) -> &[Parameter] {
        &self.parameters[..self.n_poi]
    }

    pub fn norm_parameters(&self) -> &[Parameter] {
        &self.parameters[self.n_poi..self.n_poi + self.n_norm]
    }

    pub fn shape_parameters(&self) -> &[Parameter] {
        &self.parameters[self.n_poi + self.n_norm..]
    }

    /// Position of a parameter in the parameter vector.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Result<&Parameter> {
        self.index_of(name)
            .map(|i| &self.parameters[i])
            .ok_or_else(|| FitError::ParameterNotFound(name.to_string()))
    }

    /// Parameter names in vector order.
    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name()).collect()
    }

    pub fn initial_values(&self) -> Array1<f64> {
        self.parameters.iter().map(|p| p.initial_value).collect()
    }

    pub fn initial_uncertainties(&self) -> Array1<f64> {
        self.parameters.iter().map(|p| p.initial_uncertainty).collect()
    }

    /// Nuisance parameters with zero initial uncertainty. They carry no prior.
    pub fn unconstrained_nuisances(&self) -> Vec<&str> {
        self.parameters[self.n_poi..]
            .iter()
            .filter(|p| !(p.initial_uncertainty > 0.0))
            .map(|p| p.name())
            .collect()
    }

    /// Whether the named parameter applies to the selection.
    pub fn applies_to_selection(&self, name: &str, selection: &str) -> Result<bool> {
        Ok(self.get(name)?.applies_to_selection(selection))
    }

    /// Whether the named parameter applies to the process.
    pub fn applies_to_process(&self, name: &str, process: &str) -> Result<bool> {
        Ok(self.get(name)?.applies_to_process(process))
    }
}
