//! Signal amplitudes for W boson decay topologies.
//!
//! Signal templates are generated at a reference set of branching fractions.
//! Each template corresponds to one decay channel (single W) or one pair of
//! decay channels (two W bosons). Re-weighting a template to a new set of
//! branching fractions means scaling it by the ratio of the channel amplitude
//! at the new point to the amplitude at the reference point.
//!
//! The single W channels are, in order:
//!
//! | index | label    | amplitude      |
//! |-------|----------|----------------|
//! | 0     | `e`      | β_e            |
//! | 1     | `mu`     | β_μ            |
//! | 2     | `tau_e`  | β_τ · br_e     |
//! | 3     | `tau_mu` | β_τ · br_μ     |
//! | 4     | `tau_h`  | β_τ · br_h     |
//! | 5     | `h`      | β_h            |
//!
//! Two W channels enumerate every unordered pair (self-pairs included) of
//! the six single W channels in the order of [`DOUBLE_W_PAIRS`]. The
//! amplitude of a pair is the product of the single amplitudes, doubled
//! for pairs of distinct channels, so the double W amplitudes sum to the
//! square of the single W sum.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Reference W branching fractions `[e, mu, tau, h]` used to generate templates.
pub const REFERENCE_BETA: [f64; 4] = [0.108, 0.108, 0.108, 0.676];

/// Tau branching fractions `[e, mu, h]`.
pub const TAU_BRANCHING_FRACTIONS: [f64; 3] = [0.1783, 0.1741, 0.6476];

/// Labels of the single W decay channels.
pub const SINGLE_W_CHANNELS: [&str; 6] = ["e", "mu", "tau_e", "tau_mu", "tau_h", "h"];

/// Single W channel index pairs of each two W decay channel.
pub const DOUBLE_W_PAIRS: [(usize, usize); 21] = [
    (0, 0),
    (1, 1),
    (0, 1),
    (2, 2),
    (3, 3),
    (2, 3),
    (2, 4),
    (3, 4),
    (0, 2),
    (4, 4),
    (0, 3),
    (0, 4),
    (1, 2),
    (1, 3),
    (1, 4),
    (0, 5),
    (1, 5),
    (2, 5),
    (3, 5),
    (4, 5),
    (5, 5),
];

/// Labels of the two W decay channels, aligned with [`DOUBLE_W_PAIRS`].
pub const DOUBLE_W_CHANNELS: [&str; 21] = [
    "e+e",
    "mu+mu",
    "e+mu",
    "tau_e+tau_e",
    "tau_mu+tau_mu",
    "tau_e+tau_mu",
    "tau_e+tau_h",
    "tau_mu+tau_h",
    "e+tau_e",
    "tau_h+tau_h",
    "e+tau_mu",
    "e+tau_h",
    "mu+tau_e",
    "mu+tau_mu",
    "mu+tau_h",
    "e+h",
    "mu+h",
    "tau_e+h",
    "tau_mu+h",
    "tau_h+h",
    "h+h",
];

/// Number of W bosons decaying in a signal process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// One W boson, e.g. W+jets.
    SingleW,
    /// Two W bosons, e.g. ttbar or tW.
    DoubleW,
}

impl Topology {
    /// Number of decay channels (and therefore sub-templates) of the topology.
    pub fn channel_count(&self) -> usize {
        self.channel_labels().len()
    }

    /// Decay channel labels in amplitude order.
    pub fn channel_labels(&self) -> &'static [&'static str] {
        match self {
            Topology::SingleW => &SINGLE_W_CHANNELS,
            Topology::DoubleW => &DOUBLE_W_CHANNELS,
        }
    }
}

/// Computes the decay channel amplitudes for the given branching fractions.
///
/// # Arguments
///
/// * `beta` - W branching fractions `[e, mu, tau, h]`
/// * `br_tau` - tau branching fractions `[e, mu, h]`
/// * `topology` - single or double W decay
///
/// # Returns
///
/// * 6 amplitudes for [`Topology::SingleW`], 21 for [`Topology::DoubleW`]
pub fn amplitudes(beta: [f64; 4], br_tau: [f64; 3], topology: Topology) -> Array1<f64> {
    let single = [
        beta[0],
        beta[1],
        beta[2] * br_tau[0],
        beta[2] * br_tau[1],
        beta[2] * br_tau[2],
        beta[3],
    ];

    match topology {
        Topology::SingleW => Array1::from_vec(single.to_vec()),
        Topology::DoubleW => DOUBLE_W_PAIRS
            .iter()
            .map(|&(i, j)| {
                let factor = if i == j { 1.0 } else { 2.0 };
                factor * single[i] * single[j]
            })
            .collect(),
    }
}

/// Amplitudes at the reference point of both topologies, computed once.
#[derive(Debug, Clone)]
pub struct ReferenceAmplitudes {
    br_tau: [f64; 3],
    single_w: Array1<f64>,
    double_w: Array1<f64>,
}

impl ReferenceAmplitudes {
    /// Create the reference for the given branching fractions.
    pub fn new(reference_beta: [f64; 4], br_tau: [f64; 3]) -> Self {
        Self {
            br_tau,
            single_w: amplitudes(reference_beta, br_tau, Topology::SingleW),
            double_w: amplitudes(reference_beta, br_tau, Topology::DoubleW),
        }
    }

    /// Reference amplitudes of one topology.
    pub fn get(&self, topology: Topology) -> &Array1<f64> {
        match topology {
            Topology::SingleW => &self.single_w,
            Topology::DoubleW => &self.double_w,
        }
    }

    /// Scale factors to apply to templates generated at the reference point.
    pub fn ratio(&self, beta: [f64; 4], topology: Topology) -> Array1<f64> {
        amplitudes(beta, self.br_tau, topology) / self.get(topology)
    }
}

impl Default for ReferenceAmplitudes {
    fn default() -> Self {
        Self::new(REFERENCE_BETA, TAU_BRANCHING_FRACTIONS)
    }
}
