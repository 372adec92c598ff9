//! Scan measurement and normalization
//!
//! Scans from different subjects and devices come in arbitrary units. Before
//! their topology is compared every scan is rescaled uniformly so its
//! vertical extent matches a common target height.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::{debug, warn};

use super::Point3;
use crate::error::{Result, TdaError};

/// Vertical extent of a scan: `max(z) - min(z)`
pub fn scan_height(points: &[Point3]) -> Result<f64> {
    let (min, max) = bounding_box(points)?;
    Ok(max[2] - min[2])
}

/// Axis-aligned bounding box `(min, max)`
pub fn bounding_box(points: &[Point3]) -> Result<(Point3, Point3)> {
    if points.is_empty() {
        return Err(TdaError::EmptyScan);
    }

    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for p in points {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    Ok((min, max))
}

/// Uniformly rescale a scan so that its height equals `target_height`
///
/// All three coordinates are multiplied by the same factor, so body
/// proportions are preserved.
pub fn scan_normalization(points: &[Point3], target_height: f64) -> Result<Vec<Point3>> {
    let mut scaled = points.to_vec();
    normalize_in_place(&mut scaled, target_height)?;
    Ok(scaled)
}

/// In-place variant of [`scan_normalization`]; returns the applied factor
pub fn normalize_in_place(points: &mut [Point3], target_height: f64) -> Result<f64> {
    if !(target_height.is_finite() && target_height > 0.0) {
        return Err(TdaError::InvalidParameter(format!(
            "target height must be positive, got {target_height}"
        )));
    }

    let height = scan_height(points)?;
    if !(height.is_finite() && height > 0.0) {
        return Err(TdaError::DegenerateScan(height));
    }

    let coeff = target_height / height;
    for p in points.iter_mut() {
        for c in p.iter_mut() {
            *c *= coeff;
        }
    }

    debug!(height, target_height, coeff, "normalized scan");
    Ok(coeff)
}

/// Random subset of at most `max_points` points, reproducible for a seed
///
/// The relative order of the kept points is preserved.
pub fn subsample(points: &[Point3], max_points: usize, seed: u64) -> Vec<Point3> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    if max_points == 0 {
        warn!("subsample called with max_points = 0");
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, points.len(), max_points).into_vec();
    picked.sort_unstable();

    debug!(from = points.len(), to = max_points, seed, "subsampled scan");
    picked.into_iter().map(|i| points[i]).collect()
}

/// Pack points into an `n × 3` matrix
pub fn points_to_array(points: &[Point3]) -> Array2<f64> {
    let mut array = Array2::<f64>::zeros((points.len(), 3));
    for (i, p) in points.iter().enumerate() {
        for axis in 0..3 {
            array[[i, axis]] = p[axis];
        }
    }
    array
}
