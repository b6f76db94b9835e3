//! Template histograms as delivered by the template provider.

use std::collections::BTreeMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// Up and down variations of a template for one shape parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeVariation {
    pub up: Vec<f64>,
    pub down: Vec<f64>,
}

/// Per-bin values and variances of a histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub values: Vec<f64>,
    pub variances: Vec<f64>,
}

impl Histogram {
    pub fn new(values: Vec<f64>, variances: Vec<f64>) -> Self {
        Self { values, variances }
    }

    /// A histogram of counts with Poisson variances (`variance = value`).
    pub fn poisson(values: Vec<f64>) -> Self {
        let variances = values.clone();
        Self { values, variances }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check lengths, finiteness and non-negative variances.
    pub fn validate(&self, location: &str) -> Result<()> {
        check_length(location, "variances", self.values.len(), self.variances.len())?;
        check_finite(location, "values", &self.values)?;
        check_variances(location, &self.variances)
    }

    /// Convert to the dense representation used by the fit.
    pub fn to_binned(&self) -> BinnedData {
        BinnedData {
            values: Array1::from_vec(self.values.clone()),
            variances: Array1::from_vec(self.variances.clone()),
        }
    }
}

/// Dense per-bin values and variances of observed (or toy) data.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedData {
    pub values: Array1<f64>,
    pub variances: Array1<f64>,
}

impl BinnedData {
    pub fn new(values: Array1<f64>, variances: Array1<f64>) -> Result<Self> {
        if values.len() != variances.len() {
            return Err(FitError::DimensionMismatch(format!(
                "{} values but {} variances",
                values.len(),
                variances.len()
            )));
        }
        Ok(Self { values, variances })
    }

    /// Counts with Poisson variances (`variance = value`).
    pub fn poisson(values: Array1<f64>) -> Self {
        let variances = values.clone();
        Self { values, variances }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A Monte Carlo template: nominal values, variances, and shape variations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub values: Vec<f64>,
    pub variances: Vec<f64>,
    /// Variations keyed by shape parameter name.
    #[serde(default)]
    pub variations: BTreeMap<String, ShapeVariation>,
}

impl Template {
    /// Create a template without shape variations.
    pub fn new(values: Vec<f64>, variances: Vec<f64>) -> Self {
        Self {
            values,
            variances,
            variations: BTreeMap::new(),
        }
    }

    /// Add the up/down variation of a shape parameter.
    pub fn with_variation(mut self, parameter: &str, up: Vec<f64>, down: Vec<f64>) -> Self {
        self.variations
            .insert(parameter.to_string(), ShapeVariation { up, down });
        self
    }

    /// Build a template from named columns.
    ///
    /// `val` and `var` hold the nominal values and variances; every
    /// `<parameter>_up` column must be paired with a `<parameter>_down` column.
    /// Other columns are ignored.
    pub fn from_columns(mut columns: BTreeMap<String, Vec<f64>>) -> Result<Self> {
        let values = columns
            .remove("val")
            .ok_or_else(|| FitError::InvalidTemplate("missing 'val' column".to_string()))?;
        let variances = columns
            .remove("var")
            .ok_or_else(|| FitError::InvalidTemplate("missing 'var' column".to_string()))?;

        let ups: Vec<String> = columns
            .keys()
            .filter_map(|k| k.strip_suffix("_up").map(|p| p.to_string()))
            .collect();

        let mut template = Template::new(values, variances);
        for parameter in ups {
            let up = columns.remove(&format!("{}_up", parameter)).unwrap_or_default();
            let down = columns.remove(&format!("{}_down", parameter)).ok_or_else(|| {
                FitError::InvalidTemplate(format!(
                    "'{}_up' column without matching '{}_down'",
                    parameter, parameter
                ))
            })?;
            template = template.with_variation(&parameter, up, down);
        }

        if let Some(orphan) = columns.keys().find(|k| k.ends_with("_down")) {
            return Err(FitError::InvalidTemplate(format!(
                "'{}' column without matching up variation",
                orphan
            )));
        }
        for ignored in columns.keys() {
            log::debug!("ignoring template column '{}'", ignored);
        }

        Ok(template)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check that every array has `n_bins` entries, values are finite and
    /// variances are non-negative.
    pub fn validate(&self, location: &str, n_bins: usize) -> Result<()> {
        check_length(location, "values", n_bins, self.values.len())?;
        check_length(location, "variances", n_bins, self.variances.len())?;
        check_finite(location, "values", &self.values)?;
        check_variances(location, &self.variances)?;

        for (parameter, variation) in &self.variations {
            let where_up = format!("{}_up", parameter);
            let where_down = format!("{}_down", parameter);
            check_length(location, &where_up, n_bins, variation.up.len())?;
            check_length(location, &where_down, n_bins, variation.down.len())?;
            check_finite(location, &where_up, &variation.up)?;
            check_finite(location, &where_down, &variation.down)?;
        }

        Ok(())
    }

    /// Sum of the nominal values.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Symmetric and antisymmetric deviations `(δ⁺, δ⁻)` of a shape variation:
    /// `δ⁺ = (up - nom) + (down - nom)`, `δ⁻ = (up - nom) - (down - nom)`.
    pub fn deltas(&self, parameter: &str) -> Option<(Array1<f64>, Array1<f64>)> {
        let variation = self.variations.get(parameter)?;
        let nominal = Array1::from_vec(self.values.clone());
        let up = Array1::from_vec(variation.up.clone()) - &nominal;
        let down = Array1::from_vec(variation.down.clone()) - &nominal;
        Some((&up + &down, up - down))
    }
}

fn check_length(location: &str, what: &str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(FitError::DimensionMismatch(format!(
            "{}: expected {} bins in '{}', got {}",
            location, expected, what, got
        )));
    }
    Ok(())
}

fn check_finite(location: &str, what: &str, values: &[f64]) -> Result<()> {
    if let Some(bin) = values.iter().position(|v| !v.is_finite()) {
        return Err(FitError::InvalidTemplate(format!(
            "{}: non-finite entry in '{}' at bin {}",
            location, what, bin
        )));
    }
    Ok(())
}

fn check_variances(location: &str, variances: &[f64]) -> Result<()> {
    for (bin, &value) in variances.iter().enumerate() {
        if !value.is_finite() {
            return Err(FitError::InvalidTemplate(format!(
                "{}: non-finite variance at bin {}",
                location, bin
            )));
        }
        if value < 0.0 {
            return Err(FitError::NegativeVariance {
                location: location.to_string(),
                bin,
                value,
            });
        }
    }
    Ok(())
}
