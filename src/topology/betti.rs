//! Betti numbers of a scan at a given scale
//!
//! - β₀: separate pieces (a scan with loose debris has several)
//! - β₁: loops, e.g. the gap between an arm and the torso
//! - β₂: enclosed cavities
//!
//! Read straight off a persistence diagram: βₖ(ε) is the number of
//! dimension-k intervals alive at ε.

use serde::Serialize;

use super::PersistenceDiagram;

/// Betti numbers at a specific filtration value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BettiNumbers {
    pub beta_0: usize,
    pub beta_1: usize,
    pub beta_2: usize,
    pub epsilon: f64,
}

impl BettiNumbers {
    pub fn new(beta_0: usize, beta_1: usize, beta_2: usize, epsilon: f64) -> Self {
        Self { beta_0, beta_1, beta_2, epsilon }
    }

    pub fn at(pd: &PersistenceDiagram, epsilon: f64) -> Self {
        Self::new(
            pd.betti_at(0, epsilon),
            pd.betti_at(1, epsilon),
            pd.betti_at(2, epsilon),
            epsilon,
        )
    }

    /// β₀ + β₁ + β₂
    pub fn total(&self) -> usize {
        self.beta_0 + self.beta_1 + self.beta_2
    }

    /// Euler characteristic χ = β₀ - β₁ + β₂
    pub fn euler_characteristic(&self) -> i64 {
        self.beta_0 as i64 - self.beta_1 as i64 + self.beta_2 as i64
    }
}

/// Betti curve: Betti numbers on a uniform grid `0..=max_epsilon`
#[derive(Debug, Clone, Serialize)]
pub struct BettiCurve {
    pub values: Vec<BettiNumbers>,
}

impl BettiCurve {
    pub fn compute(pd: &PersistenceDiagram, max_epsilon: f64, n_steps: usize) -> Self {
        let n_steps = n_steps.max(1);
        let values = (0..=n_steps)
            .map(|step| BettiNumbers::at(pd, max_epsilon * step as f64 / n_steps as f64))
            .collect();
        Self { values }
    }

    /// (ε, β₁) samples
    pub fn beta_1_curve(&self) -> Vec<(f64, usize)> {
        self.values.iter().map(|b| (b.epsilon, b.beta_1)).collect()
    }

    /// Trapezoidal area under the β₁ curve
    pub fn integrated_beta_1(&self) -> f64 {
        self.values.windows(2)
            .map(|w| {
                let de = w[1].epsilon - w[0].epsilon;
                de * (w[1].beta_1 + w[0].beta_1) as f64 / 2.0
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::PersistenceInterval;

    fn square_diagram() -> PersistenceDiagram {
        let s2 = 2.0_f64.sqrt();
        PersistenceDiagram::from_intervals(vec![
            PersistenceInterval::new(0.0, f64::INFINITY, 0),
            PersistenceInterval::new(0.0, 1.0, 0),
            PersistenceInterval::new(0.0, 1.0, 0),
            PersistenceInterval::new(0.0, 1.0, 0),
            PersistenceInterval::new(1.0, s2, 1),
        ])
    }

    #[test]
    fn test_betti_numbers_of_square() {
        let pd = square_diagram();
        let early = BettiNumbers::at(&pd, 0.5);
        assert_eq!((early.beta_0, early.beta_1), (4, 0));

        let mid = BettiNumbers::at(&pd, 1.2);
        assert_eq!((mid.beta_0, mid.beta_1), (1, 1));
        assert_eq!(mid.euler_characteristic(), 0);

        let late = BettiNumbers::at(&pd, 2.0);
        assert_eq!(late.total(), 1);
    }

    #[test]
    fn test_integrated_beta_1_approximates_lifetime() {
        let curve = BettiCurve::compute(&square_diagram(), 2.0, 2000);
        let area = curve.integrated_beta_1();
        assert!((area - (2.0_f64.sqrt() - 1.0)).abs() < 1e-2);
        assert_eq!(curve.beta_1_curve().len(), 2001);
    }
}
