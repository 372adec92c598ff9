//! Exact Persistent Homology via the Standard Algorithm
//!
//! 1. Take a filtered simplicial complex in filtration order
//! 2. Build its boundary matrix over Z/2Z
//! 3. Reduce columns left to right until every pivot ("low") is unique
//! 4. A column j with low i pairs simplex i (birth) with simplex j (death);
//!    a zero column that is never used as a pivot row starts an essential class
//!
//! Columns are processed from the highest dimension down. Once column j
//! gets low i, column i is known to reduce to zero and is skipped
//! ("clearing", Chen & Kerber 2011).
//!
//! ## Reference
//!
//! Edelsbrunner, Letscher, Zomorodian (2002). "Topological Persistence
//! and Simplification". Discrete & Computational Geometry.

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::debug;

use super::persistence::{PersistenceDiagram, PersistenceInterval};
use super::vietoris_rips::FilteredSimplex;

/// Sparse Z/2 column: sorted row indices of the non-zero entries
#[derive(Debug, Clone, Default)]
struct SparseColumn {
    rows: Vec<usize>,
}

impl SparseColumn {
    /// Lowest (maximum) non-zero index
    fn low(&self) -> Option<usize> {
        self.rows.last().copied()
    }

    /// Symmetric difference with another column - addition in Z/2Z
    fn add_assign(&mut self, other: &SparseColumn) {
        let mut merged = Vec::with_capacity(self.rows.len() + other.rows.len());
        let (mut a, mut b) = (0, 0);
        while a < self.rows.len() && b < other.rows.len() {
            match self.rows[a].cmp(&other.rows[b]) {
                std::cmp::Ordering::Less => {
                    merged.push(self.rows[a]);
                    a += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(other.rows[b]);
                    b += 1;
                }
                std::cmp::Ordering::Equal => {
                    a += 1;
                    b += 1;
                }
            }
        }
        merged.extend_from_slice(&self.rows[a..]);
        merged.extend_from_slice(&other.rows[b..]);
        self.rows = merged;
    }
}

/// Birth/death simplex indices produced by the reduction
#[derive(Debug, Clone, Default)]
pub struct Pairing {
    /// (birth simplex, death simplex) index pairs
    pub pairs: Vec<(usize, usize)>,
    /// Simplices creating a class that is never killed
    pub essential: Vec<usize>,
}

/// Reduce the boundary matrix of an ordered filtration
///
/// `simplices` must list every face before its cofaces.
pub fn reduce(simplices: &[FilteredSimplex]) -> Pairing {
    let index: HashMap<&[usize], usize> = simplices.iter()
        .enumerate()
        .map(|(idx, s)| (s.vertices.as_slice(), idx))
        .collect();

    let m = simplices.len();
    let mut columns: Vec<SparseColumn> = vec![SparseColumn::default(); m];
    let mut pivot_of_row: Vec<Option<usize>> = vec![None; m];
    let mut cleared = vec![false; m];
    let (mut additions, mut skipped) = (0usize, 0usize);
    let mut face = Vec::new();

    // stable: filtration order is kept within a dimension
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by_key(|&idx| Reverse(simplices[idx].dimension()));

    for col_idx in order {
        let simplex = &simplices[col_idx];
        if simplex.dimension() == 0 {
            continue;
        }
        if cleared[col_idx] {
            skipped += 1;
            continue;
        }

        // Boundary of [v0, ..., vk] = sum of [v0, ..., v̂i, ..., vk]
        let mut boundary = SparseColumn::default();
        for skip in 0..simplex.vertices.len() {
            face.clear();
            face.extend(simplex.vertices.iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, &v)| v));
            if let Some(&face_idx) = index.get(face.as_slice()) {
                boundary.rows.push(face_idx);
            }
        }
        boundary.rows.sort_unstable();

        while let Some(low) = boundary.low() {
            match pivot_of_row[low] {
                Some(pivot_col) => {
                    boundary.add_assign(&columns[pivot_col]);
                    additions += 1;
                }
                None => break,
            }
        }

        if let Some(low) = boundary.low() {
            pivot_of_row[low] = Some(col_idx);
            cleared[low] = true;
        }
        columns[col_idx] = boundary;
    }

    let mut pairing = Pairing::default();
    for (col_idx, column) in columns.iter().enumerate() {
        if let Some(low) = column.low() {
            pairing.pairs.push((low, col_idx));
        } else if pivot_of_row[col_idx].is_none() {
            pairing.essential.push(col_idx);
        }
    }

    debug!(
        n_simplices = m,
        n_pairs = pairing.pairs.len(),
        n_essential = pairing.essential.len(),
        additions,
        skipped,
        "reduced boundary matrix"
    );
    pairing
}

/// Turn a pairing into intervals of dimension ≤ `max_dimension`
///
/// Zero-length pairs are kept; filtering by persistence happens later.
pub fn pairing_to_diagram(
    simplices: &[FilteredSimplex],
    pairing: &Pairing,
    max_dimension: usize,
) -> PersistenceDiagram {
    let mut diagram = PersistenceDiagram::new();

    for &(birth, death) in &pairing.pairs {
        let dim = simplices[birth].dimension();
        if dim <= max_dimension {
            diagram.add(PersistenceInterval::new(
                simplices[birth].value,
                simplices[death].value,
                dim,
            ));
        }
    }

    for &idx in &pairing.essential {
        let dim = simplices[idx].dimension();
        if dim <= max_dimension {
            diagram.add(PersistenceInterval::new(simplices[idx].value, f64::INFINITY, dim));
        }
    }

    diagram
}
