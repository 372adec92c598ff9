//! Exact bottleneck distance
//!
//! The optimal bottleneck value is one of the pairwise L∞ costs or a
//! point-to-diagonal cost. Candidates are sorted and binary-searched for
//! the smallest value admitting a perfect matching in the augmented
//! bipartite graph:
//!
//! ```text
//!   left  = A ∪ diag(B)      right = B ∪ diag(A)
//!   a_i -- b_j        if ‖a_i − b_j‖∞ ≤ t
//!   a_i -- diag(a_i)  if pers(a_i)/2 ≤ t
//!   diag(b_j) -- b_j  if pers(b_j)/2 ≤ t
//!   diag -- diag      always
//! ```

use tracing::trace;

use super::{check_pairs, essential};
use crate::error::{Result, TdaError};
use crate::topology::Pair;

/// Bottleneck distance between two diagrams of the same dimension
pub fn bottleneck(a: &[Pair], b: &[Pair]) -> Result<f64> {
    check_pairs(a)?;
    check_pairs(b)?;

    let sa = essential::split(a);
    let sb = essential::split(b);
    let essential_cost = match essential::matched_displacements(&sa.essential, &sb.essential) {
        Some(d) => d.into_iter().fold(0.0, f64::max),
        None => return Ok(f64::INFINITY),
    };

    Ok(finite_bottleneck(&sa.finite, &sb.finite).max(essential_cost))
}

/// Maximum of the per-dimension bottleneck distances over `0..=dimension`
pub fn bottleneck_distance(a: &[Vec<Pair>], b: &[Vec<Pair>], dimension: usize) -> Result<f64> {
    if a.len() <= dimension || b.len() <= dimension {
        return Err(TdaError::InvalidParameter(format!(
            "bottleneck over dimensions 0..={dimension} needs {} lists, got {} and {}",
            dimension + 1,
            a.len(),
            b.len()
        )));
    }

    let mut worst = 0.0f64;
    for d in 0..=dimension {
        let distance = bottleneck(&a[d], &b[d])?;
        trace!(dimension = d, distance, "bottleneck");
        worst = worst.max(distance);
    }
    Ok(worst)
}

fn linf(p: Pair, q: Pair) -> f64 {
    (p.0 - q.0).abs().max((p.1 - q.1).abs())
}

fn diagonal_cost(p: Pair) -> f64 {
    (p.1 - p.0) / 2.0
}

fn finite_bottleneck(a: &[Pair], b: &[Pair]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }

    let mut candidates: Vec<f64> = Vec::with_capacity(a.len() * b.len() + a.len() + b.len() + 1);
    candidates.push(0.0);
    for &p in a {
        candidates.push(diagonal_cost(p));
        for &q in b {
            candidates.push(linf(p, q));
        }
    }
    candidates.extend(b.iter().map(|&q| diagonal_cost(q)));
    candidates.sort_by(f64::total_cmp);
    candidates.dedup();

    // sending everything to the diagonal is always feasible
    let (mut lo, mut hi) = (0, candidates.len() - 1);
    while lo < hi {
        let mid = (lo + hi) / 2;
        if has_perfect_matching(a, b, candidates[mid]) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    candidates[lo]
}

/// Perfect matching in the augmented graph at threshold `t` (Kuhn's algorithm)
fn has_perfect_matching(a: &[Pair], b: &[Pair], t: f64) -> bool {
    let (n, m) = (a.len(), b.len());
    let size = n + m;

    // right side: 0..m are points of B, m..m+n are diagonal copies of A
    let adjacency: Vec<Vec<usize>> = (0..size)
        .map(|left| {
            if left < n {
                let p = a[left];
                let mut adj: Vec<usize> = (0..m).filter(|&j| linf(p, b[j]) <= t).collect();
                if diagonal_cost(p) <= t {
                    adj.push(m + left);
                }
                adj
            } else {
                let j = left - n;
                let mut adj = Vec::with_capacity(n + 1);
                if diagonal_cost(b[j]) <= t {
                    adj.push(j);
                }
                adj.extend(m..m + n);
                adj
            }
        })
        .collect();

    let mut match_right: Vec<Option<usize>> = vec![None; size];
    for left in 0..size {
        let mut visited = vec![false; size];
        if !augment(left, &adjacency, &mut match_right, &mut visited) {
            return false;
        }
    }
    true
}

fn augment(
    left: usize,
    adjacency: &[Vec<usize>],
    match_right: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &right in &adjacency[left] {
        if visited[right] {
            continue;
        }
        visited[right] = true;
        let free = match match_right[right] {
            None => true,
            Some(other) => augment(other, adjacency, match_right, visited),
        };
        if free {
            match_right[right] = Some(left);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_diagrams() {
        let d = vec![(0.0, 1.0), (0.2, 0.7), (0.5, f64::INFINITY)];
        assert_eq!(bottleneck(&d, &d).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_against_point() {
        assert_relative_eq!(bottleneck(&[(1.0, 3.0)], &[]).unwrap(), 1.0);
        assert_eq!(bottleneck(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_point_to_point_vs_diagonal() {
        // Direct match costs 0.5, both-to-diagonal costs 2
        let a = [(0.0, 4.0)];
        let b = [(0.5, 4.5)];
        assert_relative_eq!(bottleneck(&a, &b).unwrap(), 0.5);

        // Direct match costs 3, diagonal route costs max(0.5, 0.25)
        let a = [(0.0, 1.0)];
        let b = [(3.0, 3.5)];
        assert_relative_eq!(bottleneck(&a, &b).unwrap(), 0.5);
    }

    #[test]
    fn test_known_value() {
        // Reference example: diagrams [[2.7, 3.7], [9.6, 14.], [34.2, 34.974]]
        // and [[2.8, 4.45], [9.5, 14.1]] are at bottleneck distance 0.75
        let a = [(2.7, 3.7), (9.6, 14.0), (34.2, 34.974)];
        let b = [(2.8, 4.45), (9.5, 14.1)];
        assert_relative_eq!(bottleneck(&a, &b).unwrap(), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_essential_points() {
        let a = [(0.0, f64::INFINITY), (0.0, 1.0)];
        let b = [(0.3, f64::INFINITY)];
        assert_relative_eq!(bottleneck(&a, &b).unwrap(), 0.5);

        let c = [(0.0, f64::INFINITY), (0.1, f64::INFINITY)];
        assert!(bottleneck(&a, &c).unwrap().is_infinite());
    }

    #[test]
    fn test_max_over_dimensions() {
        let a = vec![vec![(0.0, 1.0)], vec![(1.0, 3.0)], vec![]];
        let b = vec![vec![(0.0, 1.2)], vec![], vec![]];
        assert_relative_eq!(bottleneck_distance(&a, &b, 2).unwrap(), 1.0);
        assert_relative_eq!(bottleneck_distance(&a, &b, 0).unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_dimension() {
        let a = vec![vec![(0.0, 1.0)]];
        assert!(matches!(
            bottleneck_distance(&a, &a, 2),
            Err(TdaError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_symmetry() {
        let a = [(0.0, 1.0), (0.4, 2.0), (1.0, 1.3)];
        let b = [(0.1, 1.1), (0.5, 1.5)];
        assert_relative_eq!(bottleneck(&a, &b).unwrap(), bottleneck(&b, &a).unwrap());
    }
}
