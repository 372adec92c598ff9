//! Wasserstein distance between persistence diagrams
//!
//! W_q(A, B) = (min over matchings Σ ‖a − γ(a)‖_p^q)^(1/q), where points may
//! be matched to their L_p projection onto the diagonal. The finite part is
//! solved exactly as an assignment problem on the (n+m)×(n+m) matrix
//!
//! ```text
//!            B          diag(A)
//!   A     [ C(a,b)    | δ(a) on i=j, ∞ elsewhere ]
//!   diag  [ δ(b) on   | 0                        ]
//!   (B)   [ i=j, ∞    |                          ]
//! ```

use tracing::trace;

use super::{check_pairs, essential};
use crate::error::{Result, TdaError};
use crate::topology::Pair;

/// W_order distance with L_internal_p ground metric for one dimension
pub fn wasserstein(a: &[Pair], b: &[Pair], order: f64, internal_p: f64) -> Result<f64> {
    validate(order, internal_p)?;
    check_pairs(a)?;
    check_pairs(b)?;

    let sa = essential::split(a);
    let sb = essential::split(b);
    let essential_cost: f64 = match essential::matched_displacements(&sa.essential, &sb.essential) {
        Some(d) => d.into_iter().map(|x| x.powf(order)).sum(),
        None => return Ok(f64::INFINITY),
    };

    let finite_cost = finite_cost(&sa.finite, &sb.finite, order, internal_p);
    Ok((finite_cost + essential_cost).powf(1.0 / order))
}

/// Per-dimension Wasserstein distances pooled as `(Σ dᵢ^p)^(1/p)`
///
/// `p` is the ground-metric exponent and `order` the Wasserstein order.
/// Every dimension listed in `a` is compared with the same entry of `b`.
pub fn wasserstein_distance(a: &[Vec<Pair>], b: &[Vec<Pair>], p: f64, order: f64) -> Result<f64> {
    validate(order, p)?;
    if a.len() != b.len() {
        return Err(TdaError::InvalidParameter(format!(
            "diagrams cover {} and {} dimensions",
            a.len(),
            b.len()
        )));
    }

    let mut distances = Vec::with_capacity(a.len());
    for (d, (da, db)) in a.iter().zip(b).enumerate() {
        let distance = wasserstein(da, db, order, p)?;
        trace!(dimension = d, distance, "wasserstein");
        distances.push(distance);
    }

    if distances.iter().any(|d| d.is_infinite()) {
        return Ok(f64::INFINITY);
    }
    if p.is_infinite() {
        return Ok(distances.into_iter().fold(0.0, f64::max));
    }
    Ok(distances.iter().map(|d| d.powf(p)).sum::<f64>().powf(1.0 / p))
}

fn validate(order: f64, internal_p: f64) -> Result<()> {
    if !(order >= 1.0 && order.is_finite()) {
        return Err(TdaError::InvalidParameter(format!(
            "Wasserstein order must be a finite value >= 1, got {order}"
        )));
    }
    if !(internal_p >= 1.0) {
        return Err(TdaError::InvalidParameter(format!(
            "ground metric exponent must be >= 1, got {internal_p}"
        )));
    }
    Ok(())
}

fn ground_distance(p: Pair, q: Pair, internal_p: f64) -> f64 {
    let (dx, dy) = ((p.0 - q.0).abs(), (p.1 - q.1).abs());
    if internal_p.is_infinite() {
        dx.max(dy)
    } else {
        (dx.powf(internal_p) + dy.powf(internal_p)).powf(1.0 / internal_p)
    }
}

/// L_p distance from (b, d) to its projection ((b+d)/2, (b+d)/2)
fn diagonal_distance(p: Pair, internal_p: f64) -> f64 {
    let half = (p.1 - p.0) / 2.0;
    if internal_p.is_infinite() {
        half
    } else {
        half * 2f64.powf(1.0 / internal_p)
    }
}

fn finite_cost(a: &[Pair], b: &[Pair], order: f64, internal_p: f64) -> f64 {
    let (n, m) = (a.len(), b.len());
    if n == 0 && m == 0 {
        return 0.0;
    }
    if n == 0 {
        return b.iter().map(|&q| diagonal_distance(q, internal_p).powf(order)).sum();
    }
    if m == 0 {
        return a.iter().map(|&p| diagonal_distance(p, internal_p).powf(order)).sum();
    }

    let size = n + m;
    let mut cost = vec![vec![0.0; size]; size];
    for i in 0..n {
        for j in 0..m {
            cost[i][j] = ground_distance(a[i], b[j], internal_p).powf(order);
        }
        for k in 0..n {
            cost[i][m + k] = if k == i {
                diagonal_distance(a[i], internal_p).powf(order)
            } else {
                f64::INFINITY
            };
        }
    }
    for j in 0..m {
        for k in 0..m {
            cost[n + j][k] = if k == j {
                diagonal_distance(b[j], internal_p).powf(order)
            } else {
                f64::INFINITY
            };
        }
        // diagonal ↔ diagonal entries stay 0
    }

    hungarian(&cost)
}

/// Minimum-cost perfect assignment on a square matrix (O(n³) potentials)
///
/// Forbidden entries are `f64::INFINITY`; the matrix must admit a finite
/// assignment.
fn hungarian(cost: &[Vec<f64>]) -> f64 {
    let n = cost.len();
    // 1-based potentials; column 0 is the virtual start
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    let mut row_of_col = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        row_of_col[0] = row;
        let mut j0 = 0;
        let mut min_to = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = row_of_col[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < min_to[j] {
                    min_to[j] = reduced;
                    way[j] = j0;
                }
                if min_to[j] < delta {
                    delta = min_to[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[row_of_col[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_to[j] -= delta;
                }
            }

            j0 = j1;
            if row_of_col[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            row_of_col[j0] = row_of_col[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    (1..=n).map(|j| cost[row_of_col[j] - 1][j - 1]).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hungarian_small() {
        let cost = vec![
            vec![4.0, 1.0, 3.0],
            vec![2.0, 0.0, 5.0],
            vec![3.0, 2.0, 2.0],
        ];
        assert_relative_eq!(hungarian(&cost), 5.0);
    }

    #[test]
    fn test_hungarian_with_forbidden_entries() {
        let inf = f64::INFINITY;
        let cost = vec![vec![inf, 1.0], vec![2.0, inf]];
        assert_relative_eq!(hungarian(&cost), 3.0);
    }

    #[test]
    fn test_identical_is_zero() {
        let d = [(0.0, 1.0), (0.3, 0.9), (0.1, f64::INFINITY)];
        assert_relative_eq!(wasserstein(&d, &d, 2.0, 2.0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_point_to_diagonal() {
        // (0, 2) is at L2 distance sqrt(2) from (1, 1)
        let w = wasserstein(&[(0.0, 2.0)], &[], 2.0, 2.0).unwrap();
        assert_relative_eq!(w, 2.0_f64.sqrt(), epsilon = 1e-12);

        // L∞ ground metric: half the persistence
        let w = wasserstein(&[(0.0, 2.0)], &[], 1.0, f64::INFINITY).unwrap();
        assert_relative_eq!(w, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matching_vs_diagonal() {
        // Close points: cheaper to match directly
        let a = [(0.0, 4.0)];
        let b = [(0.0, 4.5)];
        assert_relative_eq!(wasserstein(&a, &b, 1.0, 2.0).unwrap(), 0.5, epsilon = 1e-12);

        // Far apart short bars: both go to the diagonal
        let a = [(0.0, 1.0)];
        let b = [(5.0, 6.0)];
        let expected = 2.0 * 0.5 * 2.0_f64.sqrt();
        assert_relative_eq!(wasserstein(&a, &b, 1.0, 2.0).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_order_two() {
        // Two points each moved by 1 along the death axis: W2 = sqrt(1 + 1)
        let a = [(0.0, 5.0), (1.0, 8.0)];
        let b = [(0.0, 6.0), (1.0, 9.0)];
        assert_relative_eq!(
            wasserstein(&a, &b, 2.0, 2.0).unwrap(),
            2.0_f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_essential_parts() {
        let a = [(0.0, f64::INFINITY), (0.0, 4.0)];
        let b = [(0.5, f64::INFINITY), (0.0, 4.0)];
        assert_relative_eq!(wasserstein(&a, &b, 1.0, 2.0).unwrap(), 0.5, epsilon = 1e-12);

        let c = [(0.0, 4.0)];
        assert!(wasserstein(&a, &c, 1.0, 2.0).unwrap().is_infinite());
    }

    #[test]
    fn test_pooled_over_dimensions() {
        let a = vec![vec![(0.0, 2.0)], vec![(0.0, 4.0)]];
        let b = vec![vec![], vec![(0.0, 4.0)]];
        // only dimension 0 differs
        assert_relative_eq!(
            wasserstein_distance(&a, &b, 2.0, 2.0).unwrap(),
            2.0_f64.sqrt(),
            epsilon = 1e-12
        );

        let b = vec![vec![], vec![]];
        let d1 = 2.0_f64.sqrt();
        let d2 = 2.0 * 2.0_f64.sqrt();
        assert_relative_eq!(
            wasserstein_distance(&a, &b, 2.0, 2.0).unwrap(),
            (d1 * d1 + d2 * d2).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(wasserstein(&[], &[], 0.5, 2.0).is_err());
        assert!(wasserstein(&[], &[], 2.0, 0.0).is_err());
        let a = vec![vec![(0.0, 1.0)]];
        let b = vec![vec![(0.0, 1.0)], vec![]];
        assert!(matches!(
            wasserstein_distance(&a, &b, 2.0, 2.0),
            Err(TdaError::InvalidParameter(_))
        ));
    }
}
