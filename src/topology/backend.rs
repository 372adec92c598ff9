//! Persistence engines
//!
//! The rest of the crate only needs "points in, diagram out". Engines sit
//! behind [`PersistenceBackend`] so a different complex (alpha, witness,
//! sparse Rips) can be swapped in without touching callers.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::persistence::{Pair, PersistenceDiagram};
use super::reduction::{pairing_to_diagram, reduce};
use super::vietoris_rips::VietorisRips;
use crate::config::PersistenceConfig;
use crate::error::{Result, TdaError};
use crate::mesh::{points_to_array, Point3};

/// Computes the persistence diagram of a point cloud
pub trait PersistenceBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Intervals of dimension `0..=max_dimension` with persistence strictly
    /// greater than `min_persistence`
    fn compute(
        &self,
        points: &[Point3],
        max_dimension: usize,
        min_persistence: f64,
    ) -> Result<PersistenceDiagram>;
}

/// Vietoris-Rips filtration reduced with the standard algorithm
///
/// When the complex would exceed `max_simplices` and `fit_edge_length` is
/// set, the edge threshold is lowered to the largest value that fits and
/// the complex is coned off there: features still alive at the threshold
/// get it as their death. Without `fit_edge_length` the oversized complex
/// is a `ComplexTooLarge` error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RipsBackend {
    pub max_edge_length: f64,
    pub max_simplices: usize,
    pub fit_edge_length: bool,
}

impl Default for RipsBackend {
    fn default() -> Self {
        let config = PersistenceConfig::default();
        Self {
            max_edge_length: config.max_edge_length,
            max_simplices: config.max_simplices,
            fit_edge_length: config.fit_edge_length,
        }
    }
}

impl RipsBackend {
    pub fn from_config(config: &PersistenceConfig) -> Self {
        Self {
            max_edge_length: config.max_edge_length,
            max_simplices: config.max_simplices,
            fit_edge_length: config.fit_edge_length,
        }
    }
}

impl PersistenceBackend for RipsBackend {
    fn name(&self) -> &'static str {
        "vietoris-rips"
    }

    fn compute(
        &self,
        points: &[Point3],
        max_dimension: usize,
        min_persistence: f64,
    ) -> Result<PersistenceDiagram> {
        if points.is_empty() {
            return Err(TdaError::EmptyScan);
        }
        if !(self.max_edge_length > 0.0) {
            return Err(TdaError::InvalidParameter(format!(
                "max_edge_length must be positive, got {}",
                self.max_edge_length
            )));
        }

        let start = Instant::now();
        let vr = VietorisRips::from_points(&points_to_array(points), self.max_edge_length);
        let top = max_dimension + 1;
        let simplices = match vr.filtration(top, self.max_simplices) {
            Ok(simplices) => simplices,
            Err(TdaError::ComplexTooLarge { limit }) if self.fit_edge_length => {
                let threshold = vr.fit_edge_length(top, limit)
                    .ok_or(TdaError::ComplexTooLarge { limit })?;
                warn!(
                    requested = self.max_edge_length,
                    threshold,
                    max_simplices = limit,
                    "complex too large, truncating at a lower edge threshold"
                );
                vr.with_max_edge_length(threshold).truncated_filtration(top, limit)?
            }
            Err(e) => return Err(e),
        };
        let pairing = reduce(&simplices);

        let mut diagram = pairing_to_diagram(&simplices, &pairing, max_dimension);
        diagram.retain_persistent(min_persistence);
        diagram.sort_by_significance();

        debug!(
            backend = self.name(),
            n_points = points.len(),
            n_simplices = simplices.len(),
            n_intervals = diagram.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "computed persistence"
        );
        Ok(diagram)
    }
}

/// A diagram together with its per-dimension split
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistenceSummary {
    pub diagram: PersistenceDiagram,
    /// Entry i holds the (birth, death) pairs of dimension i
    #[serde(skip)]
    pub per_dimension: Vec<Vec<Pair>>,
}

impl PersistenceSummary {
    pub fn new(diagram: PersistenceDiagram, dimension: usize) -> Self {
        let per_dimension = diagram.per_dimension(dimension);
        Self { diagram, per_dimension }
    }

    /// Highest homology dimension covered by `per_dimension`
    pub fn dimension(&self) -> usize {
        self.per_dimension.len().saturating_sub(1)
    }
}

/// Persistence of a point cloud with the default Rips engine
///
/// Reference parameters: `dimension = 2`, `min_persistence = 0.0003`
/// (see [`crate::config::DEFAULT_DIMENSION`] and
/// [`crate::config::DEFAULT_MIN_PERSISTENCE`]).
pub fn persistence_diagram(
    points: &[Point3],
    dimension: usize,
    min_persistence: f64,
) -> Result<PersistenceSummary> {
    persistence_diagram_with(&RipsBackend::default(), points, dimension, min_persistence)
}

pub fn persistence_diagram_with(
    backend: &dyn PersistenceBackend,
    points: &[Point3],
    dimension: usize,
    min_persistence: f64,
) -> Result<PersistenceSummary> {
    if min_persistence.is_nan() {
        return Err(TdaError::InvalidParameter("min_persistence is NaN".into()));
    }
    let diagram = backend.compute(points, dimension, min_persistence)?;
    info!(
        backend = backend.name(),
        n_points = points.len(),
        n_intervals = diagram.len(),
        "persistence diagram ready"
    );
    Ok(PersistenceSummary::new(diagram, dimension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(n: usize, radius: f64) -> Vec<Point3> {
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                [radius * t.cos(), radius * t.sin(), 0.0]
            })
            .collect()
    }

    #[test]
    fn test_circle_has_one_long_loop() {
        let summary = persistence_diagram(&circle(12, 1.0), 1, 0.01).unwrap();

        assert_eq!(summary.per_dimension.len(), 2);
        let h1 = &summary.per_dimension[1];
        assert_eq!(h1.len(), 1);
        let (birth, death) = h1[0];
        // births at the chord length, death once the hexagon chords appear
        assert!(birth < 0.6 && death > 1.5, "loop ({birth}, {death})");

        let h0 = &summary.per_dimension[0];
        assert_eq!(h0.iter().filter(|(_, d)| d.is_infinite()).count(), 1);
    }

    #[test]
    fn test_min_persistence_filters_consistently() {
        let summary = persistence_diagram(&circle(12, 1.0), 1, 0.6).unwrap();
        // H0 deaths are all at the chord length ~0.517, below the threshold
        assert_eq!(summary.per_dimension[0].len(), 1);
        assert_eq!(summary.diagram.dim(0).len(), 1);
        assert_eq!(summary.per_dimension[1].len(), 1);
    }

    #[test]
    fn test_diagram_sorted_by_dimension_descending() {
        let summary = persistence_diagram(&circle(10, 1.0), 2, 0.0).unwrap();
        let dims: Vec<usize> = summary.diagram.intervals.iter().map(|i| i.dimension).collect();
        assert!(dims.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(summary.dimension(), 2);
    }

    #[test]
    fn test_threshold_leaves_cycle_open() {
        let backend = RipsBackend {
            max_edge_length: 0.6,
            max_simplices: usize::MAX,
            fit_edge_length: true,
        };
        let summary = persistence_diagram_with(&backend, &circle(12, 1.0), 1, 0.0).unwrap();
        // no chord long enough to fill the loop
        assert_eq!(summary.per_dimension[1], vec![(summary.per_dimension[1][0].0, f64::INFINITY)]);
    }

    #[test]
    fn test_single_point_and_empty() {
        let summary = persistence_diagram(&[[0.0, 0.0, 0.0]], 2, 0.0).unwrap();
        assert_eq!(summary.per_dimension[0], vec![(0.0, f64::INFINITY)]);
        assert!(summary.per_dimension[1].is_empty());

        assert!(matches!(persistence_diagram(&[], 2, 0.0), Err(TdaError::EmptyScan)));
    }

    #[test]
    fn test_too_large_complex() {
        let backend = RipsBackend {
            max_edge_length: f64::INFINITY,
            max_simplices: 50,
            fit_edge_length: false,
        };
        let err = persistence_diagram_with(&backend, &circle(20, 1.0), 2, 0.0).unwrap_err();
        assert!(matches!(err, TdaError::ComplexTooLarge { limit: 50 }));
    }

    #[test]
    fn test_oversized_complex_is_truncated() {
        // full complex up to triangles: 12 + 66 + 220 simplices
        let backend = RipsBackend {
            max_edge_length: f64::INFINITY,
            max_simplices: 150,
            fit_edge_length: true,
        };
        let summary = persistence_diagram_with(&backend, &circle(12, 1.0), 1, 0.0).unwrap();

        let essential = summary.diagram.intervals.iter().filter(|i| i.is_essential()).count();
        assert_eq!(essential, 1);
        // the loop is cut at the fitted threshold, below the diameter
        let h1 = &summary.per_dimension[1];
        assert_eq!(h1.len(), 1);
        assert!(h1[0].1.is_finite() && h1[0].1 < 2.0);
        assert!(h1[0].0 < 0.6);

        let tiny = RipsBackend { max_simplices: 5, ..backend };
        assert!(matches!(
            persistence_diagram_with(&tiny, &circle(12, 1.0), 1, 0.0),
            Err(TdaError::ComplexTooLarge { limit: 5 })
        ));
    }
}
