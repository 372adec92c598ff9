//! Persistence Diagrams
//!
//! A persistence interval [b, d) represents a topological feature that is
//! "born" at filtration value b and "dies" at value d. Features that never
//! die (d = +∞) are essential: the connected component of the whole scan,
//! and any cycle still open at the largest filtration value.
//!
//! ## Two Views
//!
//! - `PersistenceDiagram`: every interval tagged with its dimension.
//! - `per_dimension()`: one list of (birth, death) pairs per dimension,
//!   the layout consumed by the distance and vectorization functions.

use serde::{Deserialize, Serialize};

/// A (birth, death) pair; death may be `f64::INFINITY`
pub type Pair = (f64, f64);

/// A persistence interval [birth, death) in a given homology dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistenceInterval {
    pub dimension: usize,
    pub birth: f64,
    #[serde(with = "infinite_as_null")]
    pub death: f64,
}

impl PersistenceInterval {
    pub fn new(birth: f64, death: f64, dimension: usize) -> Self {
        Self { dimension, birth, death }
    }

    /// Lifetime of the feature
    pub fn persistence(&self) -> f64 {
        if self.death.is_infinite() {
            f64::INFINITY
        } else {
            self.death - self.birth
        }
    }

    /// Is this an essential feature (infinite persistence)?
    pub fn is_essential(&self) -> bool {
        self.death.is_infinite()
    }

    pub fn pair(&self) -> Pair {
        (self.birth, self.death)
    }

    /// Alive at scale `epsilon`: birth ≤ ε < death
    pub fn contains(&self, epsilon: f64) -> bool {
        self.birth <= epsilon && epsilon < self.death
    }
}

/// Persistence diagram: collection of intervals over all dimensions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceDiagram {
    pub intervals: Vec<PersistenceInterval>,
}

impl PersistenceDiagram {
    pub fn new() -> Self {
        Self { intervals: Vec::new() }
    }

    pub fn from_intervals(intervals: Vec<PersistenceInterval>) -> Self {
        Self { intervals }
    }

    pub fn add(&mut self, interval: PersistenceInterval) {
        self.intervals.push(interval);
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Highest dimension with at least one interval
    pub fn max_dimension(&self) -> Option<usize> {
        self.intervals.iter().map(|i| i.dimension).max()
    }

    /// Get all intervals for a given dimension
    pub fn dim(&self, d: usize) -> Vec<&PersistenceInterval> {
        self.intervals.iter().filter(|i| i.dimension == d).collect()
    }

    /// Finite intervals for dimension d
    pub fn finite(&self, d: usize) -> Vec<&PersistenceInterval> {
        self.intervals.iter()
            .filter(|i| i.dimension == d && !i.is_essential())
            .collect()
    }

    /// (birth, death) pairs of dimension d, essential ones included
    pub fn intervals_in_dimension(&self, d: usize) -> Vec<Pair> {
        self.intervals.iter()
            .filter(|i| i.dimension == d)
            .map(PersistenceInterval::pair)
            .collect()
    }

    /// Split into `max_dimension + 1` lists; entry i holds dimension i
    pub fn per_dimension(&self, max_dimension: usize) -> Vec<Vec<Pair>> {
        (0..=max_dimension).map(|d| self.intervals_in_dimension(d)).collect()
    }

    /// Keep intervals with persistence strictly greater than `min_persistence`
    ///
    /// Essential intervals always survive. A negative threshold keeps
    /// zero-length intervals as well.
    pub fn retain_persistent(&mut self, min_persistence: f64) {
        self.intervals.retain(|i| i.is_essential() || i.persistence() > min_persistence);
    }

    /// Order by dimension (descending), then persistence (descending)
    pub fn sort_by_significance(&mut self) {
        self.intervals.sort_by(|a, b| {
            b.dimension.cmp(&a.dimension)
                .then_with(|| b.persistence().total_cmp(&a.persistence()))
                .then_with(|| a.birth.total_cmp(&b.birth))
        });
    }

    /// Number of finite intervals in dimension d
    pub fn count(&self, d: usize) -> usize {
        self.finite(d).len()
    }

    /// Number of features of dimension d alive at scale ε
    pub fn betti_at(&self, d: usize, epsilon: f64) -> usize {
        self.intervals.iter()
            .filter(|i| i.dimension == d && i.contains(epsilon))
            .count()
    }

    /// Total persistence in dimension d
    pub fn total_persistence(&self, d: usize) -> f64 {
        self.finite(d).iter().map(|i| i.persistence()).sum()
    }

    /// Shannon entropy of the normalized finite lifetimes of dimension d
    pub fn persistence_entropy(&self, d: usize) -> f64 {
        let lifetimes: Vec<f64> = self.finite(d).iter()
            .map(|i| i.persistence())
            .filter(|&p| p > 0.0)
            .collect();

        let total: f64 = lifetimes.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }

        lifetimes.iter()
            .map(|p| p / total)
            .map(|prob| -prob * prob.ln())
            .sum()
    }

    /// Largest finite birth or death value, 0 for an empty diagram
    pub fn max_finite_value(&self) -> f64 {
        self.intervals.iter()
            .flat_map(|i| [i.birth, i.death])
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

/// JSON has no infinity: essential deaths are written as `null`
mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> PersistenceDiagram {
        PersistenceDiagram::from_intervals(vec![
            PersistenceInterval::new(0.0, f64::INFINITY, 0),
            PersistenceInterval::new(0.0, 0.5, 0),
            PersistenceInterval::new(0.0, 0.0001, 0),
            PersistenceInterval::new(1.0, 1.414, 1),
            PersistenceInterval::new(1.2, 1.3, 1),
            PersistenceInterval::new(0.9, 0.9, 2),
        ])
    }

    #[test]
    fn test_per_dimension_split() {
        let split = sample().per_dimension(2);
        assert_eq!(split.len(), 3);
        assert_eq!(split[0].len(), 3);
        assert_eq!(split[1], vec![(1.0, 1.414), (1.2, 1.3)]);
        assert_eq!(split[2], vec![(0.9, 0.9)]);

        // asking for more dimensions than present yields empty lists
        assert!(sample().per_dimension(4)[3].is_empty());
    }

    #[test]
    fn test_retain_persistent_is_strict() {
        let mut pd = sample();
        pd.retain_persistent(0.0001);
        assert_eq!(pd.dim(0).len(), 2);
        assert_eq!(pd.dim(2).len(), 0);
        assert!(pd.dim(0).iter().any(|i| i.is_essential()));

        let mut all = sample();
        all.retain_persistent(-1.0);
        assert_eq!(all.len(), 6);

        let mut essential_only = sample();
        essential_only.retain_persistent(f64::INFINITY);
        assert_eq!(essential_only.len(), 1);
        assert!(essential_only.intervals[0].is_essential());
    }

    #[test]
    fn test_sort_by_significance() {
        let mut pd = sample();
        pd.sort_by_significance();
        let dims: Vec<usize> = pd.intervals.iter().map(|i| i.dimension).collect();
        assert_eq!(dims, vec![2, 1, 1, 0, 0, 0]);
        assert_relative_eq!(pd.intervals[1].birth, 1.0);
        assert!(pd.intervals[3].is_essential());
    }

    #[test]
    fn test_betti_at() {
        let pd = sample();
        assert_eq!(pd.betti_at(0, 0.0), 3);
        assert_eq!(pd.betti_at(0, 0.2), 2);
        assert_eq!(pd.betti_at(0, 10.0), 1);
        assert_eq!(pd.betti_at(1, 1.25), 2);
    }

    #[test]
    fn test_entropy_two_equal_lifetimes() {
        let pd = PersistenceDiagram::from_intervals(vec![
            PersistenceInterval::new(0.0, 1.0, 1),
            PersistenceInterval::new(2.0, 3.0, 1),
        ]);
        assert_relative_eq!(pd.persistence_entropy(1), 2.0f64.ln(), epsilon = 1e-12);
        assert_eq!(pd.persistence_entropy(0), 0.0);
        assert_relative_eq!(pd.total_persistence(1), 2.0);
    }

    #[test]
    fn test_json_uses_null_for_infinity() {
        let pd = sample();
        let json = serde_json::to_string(&pd).unwrap();
        assert!(json.contains("\"death\":null"));

        let back: PersistenceDiagram = serde_json::from_str(&json).unwrap();
        assert!(back.intervals[0].is_essential());
        assert_eq!(back.intervals[3], pd.intervals[3]);
    }

    #[test]
    fn test_max_finite_value() {
        assert_relative_eq!(sample().max_finite_value(), 1.414);
        assert_eq!(PersistenceDiagram::new().max_finite_value(), 0.0);
    }
}
