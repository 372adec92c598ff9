//! Vietoris-Rips Filtration Construction
//!
//! The Vietoris-Rips complex VR_ε(X) is a simplicial complex where:
//! - 0-simplices are the points in X
//! - A k-simplex [v₀, ..., vₖ] exists iff d(vᵢ, vⱼ) ≤ ε for all i,j
//!
//! Sweeping ε from 0 upward gives a filtration: every simplex enters at
//! the length of its longest edge. Simplices are enumerated as cliques of
//! the ε-neighbourhood graph, expanding each simplex only with vertices of
//! higher index.

use ndarray::{Array2, Axis};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{Result, TdaError};

/// A simplex in the filtration with its entry value
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSimplex {
    /// Vertex indices (sorted ascending)
    pub vertices: Vec<usize>,
    /// Filtration value when the simplex appears
    pub value: f64,
}

impl FilteredSimplex {
    pub fn dimension(&self) -> usize {
        self.vertices.len() - 1
    }
}

/// Vietoris-Rips filtration builder
pub struct VietorisRips {
    /// Distance matrix (precomputed)
    distances: Array2<f64>,
    /// Edges longer than this never enter the complex
    max_edge_length: f64,
}

impl VietorisRips {
    /// Create from a precomputed distance matrix
    pub fn from_distance_matrix(distances: Array2<f64>, max_edge_length: f64) -> Self {
        Self { distances, max_edge_length }
    }

    /// Create from an `n × d` point matrix (computes distance matrix)
    pub fn from_points(points: &Array2<f64>, max_edge_length: f64) -> Self {
        Self {
            distances: euclidean_distance_matrix(points),
            max_edge_length,
        }
    }

    pub fn n_points(&self) -> usize {
        self.distances.nrows()
    }

    pub fn distances(&self) -> &Array2<f64> {
        &self.distances
    }

    pub fn max_edge_length(&self) -> f64 {
        self.max_edge_length
    }

    /// Copy of this builder with a different edge threshold
    pub fn with_max_edge_length(self, max_edge_length: f64) -> Self {
        Self { max_edge_length, ..self }
    }

    /// All simplices of dimension ≤ `max_simplex_dim`, in filtration order
    ///
    /// Order: value, then dimension, then vertex list, so every face
    /// precedes its cofaces. Fails with `ComplexTooLarge` once more than
    /// `limit` simplices have been generated.
    pub fn filtration(&self, max_simplex_dim: usize, limit: usize) -> Result<Vec<FilteredSimplex>> {
        let mut simplices = Vec::new();
        self.for_each_clique(self.max_edge_length, max_simplex_dim, &mut |vertices, value| {
            if simplices.len() >= limit {
                return Err(TdaError::ComplexTooLarge { limit });
            }
            simplices.push(FilteredSimplex { vertices: vertices.to_vec(), value });
            Ok(())
        })?;

        sort_filtration(&mut simplices);
        debug!(
            n_points = self.n_points(),
            n_simplices = simplices.len(),
            max_simplex_dim,
            "built Rips filtration"
        );
        Ok(simplices)
    }

    /// [`filtration`](Self::filtration) coned off at the edge threshold
    ///
    /// An extra apex vertex (index `n_points`) enters at the threshold
    /// together with the cone over every simplex of dimension below
    /// `max_simplex_dim`. Classes still alive at the threshold die there
    /// instead of becoming essential; only the global H0 class survives.
    /// With an unbounded threshold this is the plain filtration.
    pub fn truncated_filtration(
        &self,
        max_simplex_dim: usize,
        limit: usize,
    ) -> Result<Vec<FilteredSimplex>> {
        let threshold = self.max_edge_length;
        if !threshold.is_finite() {
            return self.filtration(max_simplex_dim, limit);
        }
        if limit == 0 {
            return Err(TdaError::ComplexTooLarge { limit });
        }

        let apex = self.n_points();
        let mut simplices = vec![FilteredSimplex { vertices: vec![apex], value: threshold }];
        self.for_each_clique(threshold, max_simplex_dim, &mut |vertices, value| {
            let cone = vertices.len() <= max_simplex_dim;
            if simplices.len() + 1 + usize::from(cone) > limit {
                return Err(TdaError::ComplexTooLarge { limit });
            }
            simplices.push(FilteredSimplex { vertices: vertices.to_vec(), value });
            if cone {
                let mut coned = vertices.to_vec();
                coned.push(apex);
                simplices.push(FilteredSimplex { vertices: coned, value: threshold });
            }
            Ok(())
        })?;

        sort_filtration(&mut simplices);
        debug!(
            n_points = self.n_points(),
            n_simplices = simplices.len(),
            threshold,
            max_simplex_dim,
            "built truncated Rips filtration"
        );
        Ok(simplices)
    }

    /// Largest edge threshold, no larger than the current one, whose
    /// [`truncated_filtration`](Self::truncated_filtration) holds at most
    /// `limit` simplices
    ///
    /// Candidates are 0 and the pairwise distances. `None` when even the
    /// vertices and their cone edges exceed `limit`.
    pub fn fit_edge_length(&self, max_simplex_dim: usize, limit: usize) -> Option<f64> {
        let n = self.n_points();
        let mut lengths: Vec<f64> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .map(|(i, j)| self.distances[[i, j]])
            .filter(|&d| d <= self.max_edge_length)
            .collect();
        lengths.push(0.0);
        lengths.sort_by(f64::total_cmp);
        lengths.dedup();

        if !self.fits(lengths[0], max_simplex_dim, limit) {
            return None;
        }
        // invariant: lengths[lo] fits, lengths[hi] does not (or is past the end)
        let (mut lo, mut hi) = (0, lengths.len());
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.fits(lengths[mid], max_simplex_dim, limit) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Some(lengths[lo])
    }

    /// Does the truncated complex at `threshold` hold at most `limit` simplices?
    fn fits(&self, threshold: f64, max_simplex_dim: usize, limit: usize) -> bool {
        let mut count = 1usize;
        self.for_each_clique(threshold, max_simplex_dim, &mut |vertices, _| {
            count += if vertices.len() <= max_simplex_dim { 2 } else { 1 };
            if count > limit {
                Err(TdaError::ComplexTooLarge { limit })
            } else {
                Ok(())
            }
        })
        .is_ok()
    }

    fn for_each_clique<F>(&self, threshold: f64, max_simplex_dim: usize, visit: &mut F) -> Result<()>
    where
        F: FnMut(&[usize], f64) -> Result<()>,
    {
        let n = self.n_points();
        let mut simplex = Vec::with_capacity(max_simplex_dim + 1);

        for v in 0..n {
            let upper: Vec<usize> = (v + 1..n).filter(|&u| self.distances[[v, u]] <= threshold).collect();
            simplex.clear();
            simplex.push(v);
            self.expand(&mut simplex, 0.0, &upper, threshold, max_simplex_dim, visit)?;
        }
        Ok(())
    }

    fn expand<F>(
        &self,
        simplex: &mut Vec<usize>,
        value: f64,
        candidates: &[usize],
        threshold: f64,
        max_simplex_dim: usize,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&[usize], f64) -> Result<()>,
    {
        visit(simplex.as_slice(), value)?;
        if simplex.len() > max_simplex_dim {
            return Ok(());
        }

        for (idx, &u) in candidates.iter().enumerate() {
            let entry = simplex.iter()
                .map(|&w| self.distances[[w, u]])
                .fold(value, f64::max);
            let next: Vec<usize> = candidates[idx + 1..].iter()
                .copied()
                .filter(|&w| self.distances[[u, w]] <= threshold)
                .collect();

            simplex.push(u);
            self.expand(simplex, entry, &next, threshold, max_simplex_dim, visit)?;
            simplex.pop();
        }
        Ok(())
    }

    /// Count connected components at scale ε using Union-Find
    pub fn count_components_at(&self, epsilon: f64) -> usize {
        let n = self.n_points();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut [usize], i: usize) -> usize {
            let mut root = i;
            while parent[root] != root {
                root = parent[root];
            }
            let mut cur = i;
            while parent[cur] != root {
                let next = parent[cur];
                parent[cur] = root;
                cur = next;
            }
            root
        }

        let mut components = n;
        for i in 0..n {
            for j in i + 1..n {
                if self.distances[[i, j]] <= epsilon.min(self.max_edge_length) {
                    let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                    if ri != rj {
                        parent[ri] = rj;
                        components -= 1;
                    }
                }
            }
        }
        components
    }
}

fn sort_filtration(simplices: &mut [FilteredSimplex]) {
    simplices.sort_by(|a, b| {
        a.value.total_cmp(&b.value)
            .then(a.dimension().cmp(&b.dimension()))
            .then_with(|| a.vertices.cmp(&b.vertices))
    });
}

/// Euclidean distance matrix of the rows of `points`, filled in parallel
pub fn euclidean_distance_matrix(points: &Array2<f64>) -> Array2<f64> {
    let n = points.nrows();

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let pi = points.row(i);
            (0..n)
                .map(|j| {
                    let pj = points.row(j);
                    let dist_sq: f64 = pi.iter().zip(pj.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                    dist_sq.sqrt()
                })
                .collect()
        })
        .collect();

    let mut dm = Array2::<f64>::zeros((n, n));
    for (i, row) in rows.into_iter().enumerate() {
        dm.index_axis_mut(Axis(0), i).assign(&ndarray::Array1::from(row));
    }
    dm
}
