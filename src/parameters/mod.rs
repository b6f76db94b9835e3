//! # Parameter Registry
//!
//! Fit parameters come from an external parameter table with one row per
//! parameter. This module loads such tables ([`ParameterTable`]) and resolves
//! them into a read-only [`ParameterRegistry`].
//!
//! ## Parameter vector layout
//!
//! Every parameter vector handed to the objective is ordered
//!
//! 1. POIs (`n_poi`), the first four being the W branching fractions
//!    `[β_e, β_μ, β_τ, β_h]`
//! 2. normalization nuisance parameters (`n_norm`)
//! 3. shape nuisance parameters (`n_shape`)
//!
//! ## Example Usage
//!
//! ```rust
//! use nllfit_rs::parameters::{ParameterKind, ParameterRegistry, ParameterRow, ParameterTable};
//!
//! let selections = ["mumu"];
//! let processes = ["zjets", "ttbar"];
//!
//! let mut table = ParameterTable::new();
//! for (name, value) in [("beta_e", 0.108), ("beta_mu", 0.108), ("beta_tau", 0.108), ("beta_h", 0.676)] {
//!     table.push(
//!         ParameterRow::new(name, ParameterKind::Poi, value, 0.01)
//!             .with_columns(&selections, true)
//!             .with_columns(&processes, true),
//!     );
//! }
//! table.push(
//!     ParameterRow::new("xs_zjets", ParameterKind::Norm, 1.0, 0.05)
//!         .with_columns(&selections, true)
//!         .with_column("zjets", true)
//!         .with_column("ttbar", false),
//! );
//!
//! let registry = ParameterRegistry::from_table(&table, &selections, &processes).unwrap();
//! assert_eq!(registry.n_poi(), 4);
//! assert_eq!(registry.n_norm(), 1);
//! assert!(registry.applies_to_process("xs_zjets", "zjets").unwrap());
//! ```

pub mod registry;
pub mod table;


// Re-export key types
pub use registry::{Parameter, ParameterRegistry, N_BRANCHING_FRACTIONS};
pub use table::{ParameterKind, ParameterRow, ParameterTable};
