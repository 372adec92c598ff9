//! Persistence Silhouettes
//!
//! A silhouette is the weighted average of the tent functions of a
//! diagram's finite intervals:
//!
//!   φ(t) = Σᵢ wᵢ Λᵢ(t) / Σᵢ wᵢ,   Λᵢ(t) = max(0, min(t − bᵢ, dᵢ − t))
//!
//! Sampled on a fixed grid it becomes a vector; two silhouettes on the
//! same grid can be compared with any L^p norm.

use serde::{Deserialize, Serialize};

use super::tent_function;
use crate::config::SilhouetteConfig;
use crate::error::{Result, TdaError};
use crate::topology::Pair;

/// Interval weights wᵢ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SilhouetteWeight {
    /// wᵢ = 1
    Uniform,
    /// wᵢ = (dᵢ − bᵢ)^power
    Persistence { power: f64 },
}

impl SilhouetteWeight {
    fn weight(&self, (birth, death): Pair) -> f64 {
        match *self {
            SilhouetteWeight::Uniform => 1.0,
            SilhouetteWeight::Persistence { power } => (death - birth).powf(power),
        }
    }
}

/// Silhouette sampled on an evenly spaced grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Silhouette {
    pub grid: Vec<f64>,
    pub values: Vec<f64>,
}

impl Silhouette {
    /// Sample the silhouette of `pairs` at `resolution` points
    ///
    /// Essential pairs are ignored. Without an explicit `sample_range` the
    /// grid spans the smallest birth to the largest death.
    pub fn from_pairs(
        pairs: &[Pair],
        weight: SilhouetteWeight,
        resolution: usize,
        sample_range: Option<(f64, f64)>,
    ) -> Result<Self> {
        if resolution == 0 {
            return Err(TdaError::InvalidParameter("silhouette resolution must be at least 1".into()));
        }
        let finite: Vec<Pair> = pairs.iter().copied().filter(|p| p.1.is_finite()).collect();

        let (lo, hi) = match sample_range {
            Some(range) => range,
            None => sample_range_of(&[finite.as_slice()]).unwrap_or((0.0, 0.0)),
        };
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(TdaError::InvalidParameter(format!(
                "invalid silhouette sample range ({lo}, {hi})"
            )));
        }

        let grid = linspace(lo, hi, resolution);
        let weights: Vec<f64> = finite.iter().map(|&p| weight.weight(p)).collect();
        let total: f64 = weights.iter().sum();

        let values = grid.iter()
            .map(|&t| {
                if total <= 0.0 {
                    return 0.0;
                }
                finite.iter()
                    .zip(&weights)
                    .map(|(&(b, d), w)| w * tent_function(t, b, d))
                    .sum::<f64>()
                    / total
            })
            .collect();

        Ok(Self { grid, values })
    }

    pub fn from_config(
        pairs: &[Pair],
        config: &SilhouetteConfig,
        sample_range: Option<(f64, f64)>,
    ) -> Result<Self> {
        Self::from_pairs(pairs, config.weight, config.resolution, sample_range)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Trapezoidal L^p distance to a silhouette sampled on the same grid
    pub fn lp_distance(&self, other: &Silhouette, p: f64) -> Result<f64> {
        if self.grid.len() != other.grid.len()
            || self.grid.iter().zip(&other.grid).any(|(a, b)| (a - b).abs() > 1e-12)
        {
            return Err(TdaError::InvalidParameter(
                "silhouettes are sampled on different grids".into(),
            ));
        }
        if !(p >= 1.0) {
            return Err(TdaError::InvalidParameter(format!("L^p exponent must be >= 1, got {p}")));
        }

        let diff: Vec<f64> = self.values.iter().zip(&other.values).map(|(a, b)| (a - b).abs()).collect();
        if p.is_infinite() {
            return Ok(diff.into_iter().fold(0.0, f64::max));
        }
        if self.grid.len() < 2 {
            return Ok(diff.first().copied().unwrap_or(0.0));
        }

        let integral: f64 = (1..diff.len())
            .map(|i| {
                let dt = self.grid[i] - self.grid[i - 1];
                dt * (diff[i].powf(p) + diff[i - 1].powf(p)) / 2.0
            })
            .sum();
        Ok(integral.powf(1.0 / p))
    }
}

/// Smallest finite birth and largest finite death over several diagrams
pub fn sample_range_of(diagrams: &[&[Pair]]) -> Option<(f64, f64)> {
    let finite = diagrams.iter().flat_map(|d| d.iter()).filter(|p| p.1.is_finite());
    let mut range: Option<(f64, f64)> = None;
    for &(b, d) in finite {
        range = Some(match range {
            None => (b, d),
            Some((lo, hi)) => (lo.min(b), hi.max(d)),
        });
    }
    range
}

/// Concatenated silhouettes of the listed dimensions
///
/// Each dimension uses the sample range of that dimension across
/// `reference` (all diagrams that will be compared), so vectors built from
/// different scans are aligned entry by entry.
pub fn vectorize(
    per_dimension: &[Vec<Pair>],
    dimensions: &[usize],
    config: &SilhouetteConfig,
    reference: &[&[Vec<Pair>]],
) -> Result<Vec<f64>> {
    let mut features = Vec::with_capacity(dimensions.len() * config.resolution);
    for &d in dimensions {
        let pairs = per_dimension.get(d).ok_or_else(|| {
            TdaError::InvalidParameter(format!("diagram has no dimension {d}"))
        })?;
        let others: Vec<&[Pair]> = reference.iter()
            .filter_map(|diagram| diagram.get(d).map(Vec::as_slice))
            .chain(std::iter::once(pairs.as_slice()))
            .collect();
        let range = sample_range_of(&others);
        let silhouette = Silhouette::from_config(pairs, config, range.or(Some((0.0, 0.0))))?;
        features.extend(silhouette.values);
    }
    Ok(features)
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![lo];
    }
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(|i| lo + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_interval_is_its_tent() {
        let s = Silhouette::from_pairs(&[(0.0, 2.0)], SilhouetteWeight::Uniform, 5, None).unwrap();
        assert_eq!(s.grid, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(s.values, vec![0.0, 0.5, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_uniform_average() {
        let pairs = [(0.0, 2.0), (0.0, 4.0)];
        let s = Silhouette::from_pairs(&pairs, SilhouetteWeight::Uniform, 5, None).unwrap();
        // t = 1: tents are 1 and 1
        assert_relative_eq!(s.values[1], 1.0);
        // t = 2: tents are 0 and 2
        assert_relative_eq!(s.values[2], 1.0);
        // t = 3: tents are 0 and 1
        assert_relative_eq!(s.values[3], 0.5);
    }

    #[test]
    fn test_persistence_weight_favours_long_bars() {
        let pairs = [(0.0, 2.0), (0.0, 4.0)];
        let w = SilhouetteWeight::Persistence { power: 1.0 };
        let s = Silhouette::from_pairs(&pairs, w, 5, None).unwrap();
        // t = 2: (2·0 + 4·2) / 6
        assert_relative_eq!(s.values[2], 8.0 / 6.0);
    }

    #[test]
    fn test_essential_ignored_and_empty_is_zero() {
        let s = Silhouette::from_pairs(
            &[(0.0, f64::INFINITY)],
            SilhouetteWeight::Uniform,
            10,
            None,
        )
        .unwrap();
        assert_eq!(s.len(), 10);
        assert!(s.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_invalid_resolution() {
        assert!(Silhouette::from_pairs(&[(0.0, 1.0)], SilhouetteWeight::Uniform, 0, None).is_err());
    }

    #[test]
    fn test_lp_distance() {
        let range = Some((0.0, 2.0));
        let a = Silhouette::from_pairs(&[(0.0, 2.0)], SilhouetteWeight::Uniform, 201, range).unwrap();
        let b = Silhouette::from_pairs(&[], SilhouetteWeight::Uniform, 201, range).unwrap();

        // ∫ tent = 1 for a tent of height 1 over [0, 2]
        assert_relative_eq!(a.lp_distance(&b, 1.0).unwrap(), 1.0, epsilon = 1e-3);
        assert_relative_eq!(a.lp_distance(&b, f64::INFINITY).unwrap(), 1.0);
        assert_relative_eq!(a.lp_distance(&a, 2.0).unwrap(), 0.0);

        let c = Silhouette::from_pairs(&[(0.0, 2.0)], SilhouetteWeight::Uniform, 50, range).unwrap();
        assert!(a.lp_distance(&c, 2.0).is_err());
    }

    #[test]
    fn test_vectorize_aligns_ranges() {
        let a = vec![vec![(0.0, 1.0)], vec![(0.5, 1.0)]];
        let b = vec![vec![(0.0, 3.0)], vec![]];
        let config = SilhouetteConfig { resolution: 4, weight: SilhouetteWeight::Uniform };

        let va = vectorize(&a, &[0, 1], &config, &[b.as_slice()]).unwrap();
        let vb = vectorize(&b, &[0, 1], &config, &[a.as_slice()]).unwrap();
        assert_eq!(va.len(), 8);
        assert_eq!(vb.len(), 8);
        // dimension 0 grid is 0, 1, 2, 3 for both
        assert_eq!(&vb[..4], &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(&va[..4], &[0.0, 0.0, 0.0, 0.0]);

        assert!(vectorize(&a, &[2], &config, &[]).is_err());
    }

    #[test]
    fn test_sample_range_of() {
        let a = [(0.5, 1.0), (0.2, f64::INFINITY)];
        let b = [(0.1, 0.4)];
        assert_eq!(sample_range_of(&[&a[..], &b[..]]), Some((0.1, 1.0)));
        assert_eq!(sample_range_of(&[]), None);
    }
}
