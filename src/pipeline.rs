//! Scan processing pipeline
//!
//! load → normalize to target height → subsample → persistence
//!
//! A [`ScanPipeline`] holds a [`Config`] and the persistence engine, and
//! turns scans into [`ScanReport`]s that can then be compared pairwise.

use std::path::Path;
use std::time::Instant;

use ndarray::Array2;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::distance::{bottleneck_distance, pairwise_matrix, wasserstein_distance, DiagramMetric};
use crate::error::{Result, TdaError};
use crate::information::{sample_range_of, Silhouette, TopologicalEntropy};
use crate::mesh::{load_scan, normalize_in_place, scan_height, subsample, Point3};
use crate::topology::{
    persistence_diagram_with, BettiNumbers, PersistenceBackend, PersistenceSummary, RipsBackend,
};

/// Everything computed for one scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub source: String,
    pub n_points: usize,
    /// Points left after subsampling
    pub n_used: usize,
    /// Height before normalization
    pub raw_height: f64,
    pub scale: f64,
    pub summary: PersistenceSummary,
    pub entropy: TopologicalEntropy,
}

impl ScanReport {
    /// Betti numbers of the processed scan at filtration value `epsilon`
    pub fn betti_at(&self, epsilon: f64) -> BettiNumbers {
        BettiNumbers::at(&self.summary.diagram, epsilon)
    }
}

/// Distances between two processed scans
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub bottleneck: f64,
    pub wasserstein: f64,
    /// L2 distance between silhouettes, summed over dimensions in quadrature
    pub silhouette_l2: f64,
}

pub struct ScanPipeline {
    config: Config,
    backend: Box<dyn PersistenceBackend>,
}

impl ScanPipeline {
    /// Pipeline with the Rips engine configured from `config.persistence`
    pub fn new(config: Config) -> Result<Self> {
        let backend = Box::new(RipsBackend::from_config(&config.persistence));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: Config, backend: Box<dyn PersistenceBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn process(&self, path: impl AsRef<Path>) -> Result<ScanReport> {
        let path = path.as_ref();
        let points = load_scan(path)?;
        self.process_points(path.display().to_string(), points)
    }

    pub fn process_points(&self, source: String, mut points: Vec<Point3>) -> Result<ScanReport> {
        let start = Instant::now();
        let n_points = points.len();
        let raw_height = scan_height(&points)?;
        let scale = normalize_in_place(&mut points, self.config.scan.target_height)?;

        let scan = &self.config.scan;
        let points = if scan.max_points > 0 && n_points > scan.max_points {
            debug!(source = %source, from = n_points, to = scan.max_points, "subsampling scan");
            subsample(&points, scan.max_points, scan.seed)
        } else {
            points
        };

        let persistence = &self.config.persistence;
        let summary = persistence_diagram_with(
            self.backend.as_ref(),
            &points,
            persistence.dimension,
            persistence.min_persistence,
        )?;
        let entropy = TopologicalEntropy::from_diagram(&summary.diagram);

        info!(
            source = %source,
            n_points,
            raw_height,
            n_intervals = summary.diagram.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scan processed"
        );
        Ok(ScanReport {
            source,
            n_points,
            n_used: points.len(),
            raw_height,
            scale,
            summary,
            entropy,
        })
    }

    /// Process a batch of scans in parallel, failing on the first error
    pub fn process_many<P>(&self, paths: &[P]) -> Result<Vec<ScanReport>>
    where
        P: AsRef<Path> + Sync,
    {
        paths.par_iter().map(|p| self.process(p)).collect()
    }

    pub fn compare(&self, a: &ScanReport, b: &ScanReport) -> Result<Comparison> {
        let (da, db) = (&a.summary.per_dimension, &b.summary.per_dimension);
        if da.len() != db.len() {
            return Err(TdaError::InvalidParameter(format!(
                "reports cover {} and {} dimensions",
                da.len(),
                db.len()
            )));
        }
        let distance = &self.config.distance;
        let top = a.summary.dimension();

        let bottleneck_dim = distance.bottleneck_dimension.min(top);
        if bottleneck_dim < distance.bottleneck_dimension {
            warn!(
                requested = distance.bottleneck_dimension,
                available = top,
                "bottleneck dimension clamped"
            );
        }
        let bottleneck = bottleneck_distance(da, db, bottleneck_dim)?;
        let wasserstein = wasserstein_distance(da, db, distance.internal_p, distance.wasserstein_order)?;

        let mut squared = 0.0;
        for (pa, pb) in da.iter().zip(db) {
            let range = sample_range_of(&[pa.as_slice(), pb.as_slice()]).or(Some((0.0, 0.0)));
            let sa = Silhouette::from_config(pa, &self.config.silhouette, range)?;
            let sb = Silhouette::from_config(pb, &self.config.silhouette, range)?;
            squared += sa.lp_distance(&sb, 2.0)?.powi(2);
        }

        let comparison = Comparison {
            bottleneck,
            wasserstein,
            silhouette_l2: squared.sqrt(),
        };
        debug!(a = %a.source, b = %b.source, ?comparison, "scans compared");
        Ok(comparison)
    }

    /// Pairwise distance matrix of processed scans
    pub fn distance_matrix(&self, reports: &[ScanReport], metric: DiagramMetric) -> Result<Array2<f64>> {
        let diagrams: Vec<Vec<Vec<_>>> = reports.iter()
            .map(|r| r.summary.per_dimension.clone())
            .collect();
        pairwise_matrix(&diagrams, metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;

    fn ring(n: usize, radius: f64, height: f64) -> Vec<Point3> {
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                let z = height * i as f64 / (n - 1) as f64;
                [radius * t.cos(), radius * t.sin(), z]
            })
            .collect()
    }

    fn pipeline(max_points: usize) -> ScanPipeline {
        let mut config = Config::default();
        config.scan = ScanConfig { max_points, ..ScanConfig::default() };
        config.persistence.dimension = 1;
        config.distance.bottleneck_dimension = 1;
        config.silhouette.resolution = 50;
        ScanPipeline::new(config).unwrap()
    }

    #[test]
    fn test_process_points_normalizes_height() {
        let report = pipeline(0).process_points("ring".into(), ring(16, 1.0, 3.4)).unwrap();
        assert_eq!(report.n_points, 16);
        assert_eq!(report.n_used, 16);
        assert!((report.raw_height - 3.4).abs() < 1e-12);
        assert!((report.scale - 0.5).abs() < 1e-12);
        assert_eq!(report.summary.dimension(), 1);
        assert_eq!(report.betti_at(0.0).beta_0, 16);
    }

    #[test]
    fn test_subsampling_caps_points() {
        let report = pipeline(10).process_points("ring".into(), ring(40, 1.0, 1.0)).unwrap();
        assert_eq!(report.n_points, 40);
        assert_eq!(report.n_used, 10);
    }

    #[test]
    fn test_compare_identical_scans_is_zero() {
        let p = pipeline(0);
        let a = p.process_points("a".into(), ring(12, 1.0, 1.0)).unwrap();
        let b = p.process_points("b".into(), ring(12, 1.0, 1.0)).unwrap();
        let c = p.compare(&a, &b).unwrap();
        assert_eq!(c.bottleneck, 0.0);
        assert!(c.wasserstein.abs() < 1e-9);
        assert!(c.silhouette_l2.abs() < 1e-12);
    }

    #[test]
    fn test_compare_different_scans() {
        let p = pipeline(0);
        let a = p.process_points("a".into(), ring(12, 1.0, 1.0)).unwrap();
        let b = p.process_points("b".into(), ring(12, 3.0, 1.0)).unwrap();
        let c = p.compare(&a, &b).unwrap();
        assert!(c.bottleneck > 0.0);
        assert!(c.wasserstein >= c.bottleneck - 1e-9);

        let m = p.distance_matrix(&[a, b], DiagramMetric::Bottleneck { dimension: 1 }).unwrap();
        assert_eq!(m[[0, 1]], c.bottleneck);
        assert_eq!(m[[1, 0]], m[[0, 1]]);
    }

    #[test]
    fn test_degenerate_scan_rejected() {
        let flat = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        assert!(matches!(
            pipeline(0).process_points("flat".into(), flat),
            Err(TdaError::DegenerateScan(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.scan.target_height = -1.0;
        assert!(ScanPipeline::new(config).is_err());
    }
}
