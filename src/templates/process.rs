//! Processes and their per-category template collections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::amplitudes::Topology;

/// How a process is represented in the template collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    /// A single template, not reweighted by the branching fractions.
    Simple,
    /// One template per W decay channel of the topology, reweighted by the
    /// branching fractions.
    Composite(Topology),
}

/// A process of the fit layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    pub kind: ProcessKind,
}

impl ProcessSpec {
    pub fn simple(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ProcessKind::Simple,
        }
    }

    pub fn composite(name: &str, topology: Topology) -> Self {
        Self {
            name: name.to_string(),
            kind: ProcessKind::Composite(topology),
        }
    }

    /// Number of process-mask slots the process occupies in every category.
    pub fn slot_count(&self) -> usize {
        match self.kind {
            ProcessKind::Simple => 1,
            ProcessKind::Composite(topology) => topology.channel_count(),
        }
    }

    pub fn is_signal(&self) -> bool {
        matches!(self.kind, ProcessKind::Composite(_))
    }
}

/// The templates of one process in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessTemplates {
    Simple(super::Template),
    /// Sub-templates keyed by decay channel label.
    Composite(BTreeMap<String, super::Template>),
}

/// Data and process templates of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTemplates {
    pub data: super::Histogram,
    #[serde(default)]
    pub processes: BTreeMap<String, ProcessTemplates>,
}

impl CategoryTemplates {
    pub fn new(data: super::Histogram) -> Self {
        Self {
            data,
            processes: BTreeMap::new(),
        }
    }

    pub fn with_simple(mut self, process: &str, template: super::Template) -> Self {
        self.processes
            .insert(process.to_string(), ProcessTemplates::Simple(template));
        self
    }

    pub fn with_composite(
        mut self,
        process: &str,
        templates: BTreeMap<String, super::Template>,
    ) -> Self {
        self.processes
            .insert(process.to_string(), ProcessTemplates::Composite(templates));
        self
    }
}
