//! # body-tda
//!
//! Persistent homology of 3D body scans.
//!
//! A scan (mesh or point cloud) is loaded as a set of 3D points, rescaled
//! so that every subject has the same height, and summarized by the
//! persistence diagram of its Vietoris-Rips filtration. Diagrams of two
//! scans are then compared with the bottleneck and Wasserstein distances,
//! or vectorized as silhouettes for downstream statistics.
//!
//! ## Pipeline
//!
//! 1. **Load**: OBJ, OFF, PLY, STL, XYZ and VTK files ([`mesh`])
//! 2. **Normalize**: uniform scaling to a target height, 1.7 by default
//! 3. **Persistence**: (birth, death) intervals in dimensions 0..=2
//!    ([`topology`])
//! 4. **Compare**: bottleneck and Wasserstein distances ([`distance`])
//! 5. **Vectorize**: silhouettes, landscapes and persistent entropy
//!    ([`information`])
//!
//! [`pipeline::ScanPipeline`] chains the steps from a [`Config`].
//!
//! ## References
//!
//! - Edelsbrunner & Harer, "Computational Topology" (2010)
//! - Cohen-Steiner, Edelsbrunner & Harer, "Stability of Persistence
//!   Diagrams" (2007)
//! - Chazal et al., "Stochastic Convergence of Persistence Landscapes and
//!   Silhouettes" (2014)

pub mod config;
pub mod distance;
pub mod error;
pub mod information;
pub mod mesh;
pub mod pipeline;
pub mod plot;
pub mod topology;

pub use config::Config;
pub use error::{Result, TdaError};

// Re-exports from mesh
pub use mesh::{load_scan, scan_height, scan_normalization, write_xyz, Point3, ScanFormat};

// Re-exports from topology
pub use topology::{
    persistence_diagram,
    BettiNumbers,
    Pair,
    PersistenceBackend,
    PersistenceDiagram,
    PersistenceInterval,
    PersistenceSummary,
    RipsBackend,
};

// Re-exports from distance
pub use distance::{bottleneck_distance, wasserstein_distance, DiagramMetric};

// Re-exports from information
pub use information::{PersistenceLandscape, Silhouette, SilhouetteWeight, TopologicalEntropy};

pub use pipeline::{Comparison, ScanPipeline, ScanReport};
pub use plot::plot_persistence_diagram;
