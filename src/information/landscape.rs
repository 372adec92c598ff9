//! Persistence Landscapes: Functional Summaries of Persistence Diagrams
//!
//! The k-th landscape function λₖ(t) is the k-th largest tent value at t.
//! Landscapes are stable and live in a Banach space, so scans can be
//! averaged and compared with ordinary L^p norms.

use super::tent_function;
use crate::error::{Result, TdaError};
use crate::topology::Pair;

/// Persistence landscape representation
#[derive(Debug, Clone)]
pub struct PersistenceLandscape {
    /// Landscape functions λₖ(t) for k = 1, 2, ... as (t, value) samples
    pub functions: Vec<Vec<(f64, f64)>>,
    /// Number of landscape functions
    pub k_max: usize,
    /// Grid resolution
    pub resolution: usize,
}

impl PersistenceLandscape {
    /// Compute the first `k_max` landscape functions of the finite pairs
    ///
    /// The grid has `resolution + 1` points over `sample_range`, or over the
    /// smallest birth to largest death when no range is given.
    pub fn from_pairs(
        pairs: &[Pair],
        k_max: usize,
        resolution: usize,
        sample_range: Option<(f64, f64)>,
    ) -> Result<Self> {
        if k_max == 0 || resolution == 0 {
            return Err(TdaError::InvalidParameter(
                "landscape needs k_max >= 1 and resolution >= 1".into(),
            ));
        }

        let intervals: Vec<Pair> = pairs.iter().copied().filter(|p| p.1.is_finite()).collect();
        if intervals.is_empty() && sample_range.is_none() {
            return Ok(Self {
                functions: vec![vec![(0.0, 0.0)]; k_max],
                k_max,
                resolution,
            });
        }

        let (min_t, max_t) = sample_range.unwrap_or_else(|| {
            let lo = intervals.iter().map(|i| i.0).fold(f64::INFINITY, f64::min);
            let hi = intervals.iter().map(|i| i.1).fold(f64::NEG_INFINITY, f64::max);
            (lo, hi)
        });
        let dt = (max_t - min_t) / resolution as f64;

        let mut functions = vec![Vec::with_capacity(resolution + 1); k_max];
        let mut values = Vec::with_capacity(intervals.len());

        for i in 0..=resolution {
            let t = min_t + i as f64 * dt;

            values.clear();
            values.extend(intervals.iter().map(|&(b, d)| tent_function(t, b, d)));
            values.sort_by(|a, b| b.total_cmp(a));

            for (k, func) in functions.iter_mut().enumerate() {
                func.push((t, values.get(k).copied().unwrap_or(0.0)));
            }
        }

        Ok(Self {
            functions,
            k_max,
            resolution,
        })
    }

    /// L^p norm of the k-th landscape function
    pub fn lp_norm(&self, k: usize, p: f64) -> f64 {
        let Some(func) = self.functions.get(k) else {
            return 0.0;
        };
        if func.len() < 2 {
            return 0.0;
        }

        let integral: f64 = func.windows(2)
            .map(|w| {
                let dt = w[1].0 - w[0].0;
                dt * (w[1].1.abs().powf(p) + w[0].1.abs().powf(p)) / 2.0
            })
            .sum();

        integral.powf(1.0 / p)
    }

    /// L^2 norm of all landscape functions combined
    pub fn total_l2_norm(&self) -> f64 {
        (0..self.k_max).map(|k| self.lp_norm(k, 2.0).powi(2)).sum::<f64>().sqrt()
    }

    /// Inner product with another landscape on the same grid
    pub fn inner_product(&self, other: &PersistenceLandscape) -> Result<f64> {
        if self.k_max != other.k_max || self.resolution != other.resolution {
            return Err(TdaError::InvalidParameter(
                "landscapes have different shapes".into(),
            ));
        }

        let mut product = 0.0;
        for (f1, f2) in self.functions.iter().zip(&other.functions) {
            if f1.len() != f2.len() {
                continue;
            }
            for i in 1..f1.len() {
                let dt = f1[i].0 - f1[i - 1].0;
                product += dt * (f1[i].1 * f2[i].1 + f1[i - 1].1 * f2[i - 1].1) / 2.0;
            }
        }
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_landscape_single() {
        let landscape = PersistenceLandscape::from_pairs(&[(0.0, 2.0)], 1, 100, None).unwrap();

        // Maximum at the midpoint with value 1.0
        let max_val = landscape.functions[0].iter()
            .map(|(_, v)| *v)
            .fold(0.0, f64::max);
        assert_relative_eq!(max_val, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_second_landscape_sees_overlap_only() {
        let pairs = [(0.0, 4.0), (1.0, 3.0)];
        let landscape = PersistenceLandscape::from_pairs(&pairs, 2, 4, None).unwrap();

        let second: Vec<f64> = landscape.functions[1].iter().map(|&(_, v)| v).collect();
        assert_eq!(second, vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!(landscape.lp_norm(5, 2.0) == 0.0);
    }

    #[test]
    fn test_inner_product_matches_norm() {
        let l = PersistenceLandscape::from_pairs(&[(0.0, 2.0), (0.5, 1.0)], 2, 200, None).unwrap();
        let ip = l.inner_product(&l).unwrap();
        assert_relative_eq!(ip.sqrt(), l.total_l2_norm(), epsilon = 1e-9);

        let other = PersistenceLandscape::from_pairs(&[(0.0, 2.0)], 3, 200, None).unwrap();
        assert!(l.inner_product(&other).is_err());
    }
}
