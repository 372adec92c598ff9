//! Topology Module: Persistent Homology of Point Clouds
//!
//! - Vietoris-Rips filtration of a scan
//! - Exact persistence via boundary matrix reduction
//! - Persistence diagrams, their per-dimension split and Betti numbers
//!
//! ## Mathematical Background
//!
//! For a point cloud X we build a nested family of simplicial complexes
//! K_ε(X) indexed by the scale parameter ε. Persistent homology tracks
//! the birth and death of topological features (connected components,
//! loops, voids) across this filtration.
//!
//! The engine is reached through [`PersistenceBackend`]; [`RipsBackend`] is
//! the built-in one.

mod backend;
mod betti;
mod persistence;
mod reduction;
mod vietoris_rips;

pub use backend::{
    persistence_diagram,
    persistence_diagram_with,
    PersistenceBackend,
    PersistenceSummary,
    RipsBackend,
};
pub use betti::{BettiCurve, BettiNumbers};
pub use persistence::{Pair, PersistenceDiagram, PersistenceInterval};
pub use reduction::{pairing_to_diagram, reduce, Pairing};
pub use vietoris_rips::{euclidean_distance_matrix, FilteredSimplex, VietorisRips};
