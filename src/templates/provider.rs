//! The template collection handed over by the template provider.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::templates::CategoryTemplates;

/// Templates of every category of every selection.
///
/// In JSON this is a nested object `selection → category → CategoryTemplates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateProvider {
    selections: BTreeMap<String, BTreeMap<String, CategoryTemplates>>,
}

impl TemplateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Insert (or replace) the templates of one category.
    pub fn insert(&mut self, selection: &str, category: &str, templates: CategoryTemplates) {
        self.selections
            .entry(selection.to_string())
            .or_default()
            .insert(category.to_string(), templates);
    }

    pub fn with_category(mut self, selection: &str, category: &str, templates: CategoryTemplates) -> Self {
        self.insert(selection, category, templates);
        self
    }

    /// Categories of a selection, ordered by name.
    pub fn selection(&self, selection: &str) -> Option<&BTreeMap<String, CategoryTemplates>> {
        self.selections.get(selection)
    }

    pub fn selection_names(&self) -> impl Iterator<Item = &str> {
        self.selections.keys().map(|s| s.as_str())
    }
}
