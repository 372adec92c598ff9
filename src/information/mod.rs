//! Information Module: Vectorizations of Persistence Diagrams
//!
//! Diagrams are multisets, awkward for statistics. This module maps them
//! to functions and vectors:
//!
//! - Silhouettes: weighted average of interval tent functions
//! - Landscapes: k-th largest tent value, k = 1, 2, ...
//! - Persistent entropy: Shannon entropy of normalized lifetimes
//!
//! All three are built from the tent function of an interval [b, d):
//!
//!   Λ(t) = max(0, min(t − b, d − t))

mod entropy;
mod landscape;
mod silhouette;

pub use entropy::TopologicalEntropy;
pub use landscape::PersistenceLandscape;
pub use silhouette::{sample_range_of, vectorize, Silhouette, SilhouetteWeight};

/// Tent function for persistence interval
pub(crate) fn tent_function(t: f64, birth: f64, death: f64) -> f64 {
    let mid = (birth + death) / 2.0;

    if t < birth || t > death {
        0.0
    } else if t <= mid {
        t - birth
    } else {
        death - t
    }
}
