//! Parameter tables as supplied by the parameter provider.
//!
//! A table has one row per fit parameter. Besides the fixed columns (name,
//! kind, initial value, initial uncertainty, active flag) every row carries
//! one boolean column per selection and per process stating whether the
//! parameter applies to it. In JSON the applicability columns sit next to
//! the fixed ones:
//!
//! ```json
//! [
//!   {"name": "beta_e", "kind": "poi", "value": 0.108, "uncertainty": 0.01,
//!    "active": true, "mumu": true, "zjets": false, "ttbar": true}
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Role of a parameter in the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Parameter of interest (branching fraction).
    Poi,
    /// Normalization nuisance parameter, multiplies a process.
    Norm,
    /// Shape nuisance parameter, morphs a template.
    Shape,
}

/// One row of a parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    pub name: String,
    pub kind: ParameterKind,
    pub value: f64,
    pub uncertainty: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Applicability columns keyed by selection or process name.
    #[serde(flatten)]
    pub columns: BTreeMap<String, bool>,
}

fn default_active() -> bool {
    true
}

impl ParameterRow {
    /// Create an active row with no applicability columns.
    pub fn new(name: &str, kind: ParameterKind, value: f64, uncertainty: f64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value,
            uncertainty,
            active: true,
            columns: BTreeMap::new(),
        }
    }

    /// Set one applicability column.
    pub fn with_column(mut self, column: &str, applies: bool) -> Self {
        self.columns.insert(column.to_string(), applies);
        self
    }

    /// Set several applicability columns to the same value.
    pub fn with_columns<S: AsRef<str>>(mut self, columns: &[S], applies: bool) -> Self {
        for column in columns {
            self.columns.insert(column.as_ref().to_string(), applies);
        }
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// An ordered collection of parameter rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTable {
    rows: Vec<ParameterRow>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<ParameterRow>) -> Self {
        Self { rows }
    }

    /// Parse a table from a JSON array of rows.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a table from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn push(&mut self, row: ParameterRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ParameterRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
