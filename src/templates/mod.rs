//! # Template Store
//!
//! Monte Carlo templates arrive per selection, category and process from an
//! external provider ([`TemplateProvider`]). The [`TemplateStore`] resolves
//! them once into one dense [`CategoryModel`] per `(selection, category)`,
//! addressed by a [`CategoryId`].
//!
//! A category model stacks, for every process slot that is present and
//! significant, a block of rows
//!
//! ```text
//! [value, variance, δ⁺(s₁), δ⁻(s₁), δ⁺(s₂), δ⁻(s₂), ...]
//! ```
//!
//! over the bins, where `s₁, s₂, ...` are the shape parameters of the
//! registry. Composite processes occupy one slot per W decay channel.

pub mod process;
pub mod provider;
pub mod store;
pub mod template;

pub use process::{CategoryTemplates, ProcessKind, ProcessSpec, ProcessTemplates};
pub use provider::TemplateProvider;
pub use store::{CategoryId, CategoryModel, TemplateStore};
pub use template::{BinnedData, Histogram, ShapeVariation, Template};
