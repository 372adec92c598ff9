//! Distance Module: Comparing Persistence Diagrams
//!
//! Two diagrams are compared by the cheapest way of matching their points,
//! where any point may instead be sent to the diagonal (a feature of zero
//! persistence):
//!
//! - Bottleneck: the largest displacement of an optimal matching (L∞)
//! - Wasserstein W_q: the q-th root of the summed q-th powers of the
//!   displacements, measured with an L_p ground metric
//!
//! Essential points (infinite death) are matched among themselves by
//! sorted birth. When the two diagrams hold different numbers of them, no
//! finite matching exists and the distance is +∞.

mod bottleneck;
mod essential;
mod wasserstein;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DistanceConfig;
use crate::error::{Result, TdaError};
use crate::topology::Pair;

pub use bottleneck::{bottleneck, bottleneck_distance};
pub use wasserstein::{wasserstein, wasserstein_distance};

/// Diagram distance selected at runtime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramMetric {
    /// Maximum bottleneck distance over dimensions `0..=dimension`
    Bottleneck { dimension: usize },
    /// Per-dimension W_order distances pooled with exponent `internal_p`
    Wasserstein { order: f64, internal_p: f64 },
}

impl DiagramMetric {
    pub fn bottleneck(config: &DistanceConfig) -> Self {
        DiagramMetric::Bottleneck { dimension: config.bottleneck_dimension }
    }

    pub fn wasserstein(config: &DistanceConfig) -> Self {
        DiagramMetric::Wasserstein {
            order: config.wasserstein_order,
            internal_p: config.internal_p,
        }
    }

    /// Distance between two per-dimension diagrams
    pub fn evaluate(&self, a: &[Vec<Pair>], b: &[Vec<Pair>]) -> Result<f64> {
        match *self {
            DiagramMetric::Bottleneck { dimension } => bottleneck_distance(a, b, dimension),
            DiagramMetric::Wasserstein { order, internal_p } => {
                wasserstein_distance(a, b, internal_p, order)
            }
        }
    }
}

/// Symmetric matrix of pairwise distances, computed in parallel
pub fn pairwise_matrix(diagrams: &[Vec<Vec<Pair>>], metric: DiagramMetric) -> Result<Array2<f64>> {
    let n = diagrams.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect();

    let values: Vec<f64> = pairs
        .par_iter()
        .map(|&(i, j)| metric.evaluate(&diagrams[i], &diagrams[j]))
        .collect::<Result<_>>()?;

    let mut matrix = Array2::<f64>::zeros((n, n));
    for (&(i, j), &d) in pairs.iter().zip(&values) {
        matrix[[i, j]] = d;
        matrix[[j, i]] = d;
    }

    debug!(n_diagrams = n, ?metric, "computed pairwise distance matrix");
    Ok(matrix)
}

fn check_pairs(pairs: &[Pair]) -> Result<()> {
    for &(b, d) in pairs {
        if b.is_nan() || d.is_nan() || b.is_infinite() || d < b {
            return Err(TdaError::InvalidParameter(format!(
                "malformed persistence pair ({b}, {d})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairwise_matrix_symmetric() {
        let diagrams = vec![
            vec![vec![(0.0, 1.0)]],
            vec![vec![(0.0, 2.0)]],
            vec![vec![]],
        ];
        let m = pairwise_matrix(&diagrams, DiagramMetric::Bottleneck { dimension: 0 }).unwrap();

        assert_eq!(m.dim(), (3, 3));
        assert_eq!(m[[0, 0]], 0.0);
        assert_eq!(m[[0, 1]], m[[1, 0]]);
        assert!((m[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((m[[1, 2]] - 1.0).abs() < 1e-12);
        assert!((m[[0, 2]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_metric_from_config() {
        let config = DistanceConfig::default();
        assert_eq!(DiagramMetric::bottleneck(&config), DiagramMetric::Bottleneck { dimension: 2 });
        assert_eq!(
            DiagramMetric::wasserstein(&config),
            DiagramMetric::Wasserstein { order: 2.0, internal_p: 2.0 }
        );
    }

    #[test]
    fn test_malformed_pairs_rejected() {
        assert!(check_pairs(&[(0.0, 1.0), (0.5, f64::INFINITY)]).is_ok());
        assert!(check_pairs(&[(1.0, 0.5)]).is_err());
        assert!(check_pairs(&[(f64::NAN, 1.0)]).is_err());
    }
}
