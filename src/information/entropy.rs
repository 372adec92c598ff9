//! Topological Entropy: Information Content of Persistence Diagrams
//!
//! H_P = -Σᵢ pᵢ log(pᵢ),  pᵢ = lᵢ / L
//!
//! where lᵢ = dᵢ - bᵢ is the lifetime of a finite interval and L the total
//! lifetime. A scan dominated by one long-lived feature has entropy near
//! zero; many equally persistent features push it towards log(n).

use serde::Serialize;

use crate::topology::PersistenceDiagram;

/// Topological entropy measures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TopologicalEntropy {
    /// Persistent entropy (Shannon) over all finite intervals
    pub persistent_entropy: f64,
    /// Normalized entropy [0, 1]
    pub normalized_entropy: f64,
    /// Σ_d (d + 1) · H_P(dimension d)
    pub weighted_entropy: f64,
    /// Total lifetime (normalization constant)
    pub total_lifetime: f64,
}

impl TopologicalEntropy {
    pub fn from_diagram(pd: &PersistenceDiagram) -> Self {
        let lifetimes: Vec<f64> = pd.intervals.iter()
            .filter(|i| !i.is_essential())
            .map(|i| i.persistence())
            .collect();
        let total_lifetime: f64 = lifetimes.iter().sum();
        let persistent_entropy = shannon(&lifetimes, total_lifetime);

        let normalized_entropy = if lifetimes.len() > 1 {
            persistent_entropy / (lifetimes.len() as f64).ln()
        } else {
            0.0
        };

        // Higher-dimensional features weigh more: β₀ × 1, β₁ × 2, β₂ × 3
        let weighted_entropy = (0..=pd.max_dimension().unwrap_or(0))
            .map(|d| (d + 1) as f64 * pd.persistence_entropy(d))
            .sum();

        Self {
            persistent_entropy,
            normalized_entropy,
            weighted_entropy,
            total_lifetime,
        }
    }
}

fn shannon(lifetimes: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    lifetimes.iter()
        .map(|l| l / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::PersistenceInterval;

    #[test]
    fn test_entropy_uniform() {
        // Three intervals with equal lifetime
        let mut pd = PersistenceDiagram::new();
        pd.add(PersistenceInterval::new(0.0, 1.0, 0));
        pd.add(PersistenceInterval::new(0.0, 1.0, 0));
        pd.add(PersistenceInterval::new(0.0, 1.0, 0));
        pd.add(PersistenceInterval::new(0.0, f64::INFINITY, 0));

        let entropy = TopologicalEntropy::from_diagram(&pd);

        // Uniform distribution has entropy ln(3)
        assert!((entropy.persistent_entropy - 3.0_f64.ln()).abs() < 1e-12);
        assert!((entropy.normalized_entropy - 1.0).abs() < 1e-12);
        assert_eq!(entropy.total_lifetime, 3.0);
    }

    #[test]
    fn test_entropy_single() {
        let mut pd = PersistenceDiagram::new();
        pd.add(PersistenceInterval::new(0.0, 1.0, 0));

        let entropy = TopologicalEntropy::from_diagram(&pd);
        assert_eq!(entropy.persistent_entropy, 0.0);
        assert_eq!(entropy.normalized_entropy, 0.0);
    }

    #[test]
    fn test_weighted_entropy() {
        let pd = PersistenceDiagram::from_intervals(vec![
            PersistenceInterval::new(0.0, 1.0, 1),
            PersistenceInterval::new(0.0, 1.0, 1),
        ]);
        let entropy = TopologicalEntropy::from_diagram(&pd);
        assert!((entropy.weighted_entropy - 2.0 * 2.0_f64.ln()).abs() < 1e-12);
    }
}
