//! Pipeline configuration
//!
//! Every knob of the scan → diagram → distance pipeline lives here. The
//! defaults reproduce the reference parameters used for body scans
//! (target height 1.7, homology up to H2, min persistence 3e-4, W2 with
//! L2 ground metric). A TOML file may override any subset:
//!
//! ```toml
//! [scan]
//! target_height = 1.8
//! max_points = 250
//!
//! [persistence]
//! dimension = 1
//! max_edge_length = 0.4
//!
//! [distance]
//! internal_p = inf
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TdaError};
use crate::information::SilhouetteWeight;

/// Height every scan is rescaled to before analysis (metres).
pub const DEFAULT_TARGET_HEIGHT: f64 = 1.7;
/// Highest homology dimension computed by default.
pub const DEFAULT_DIMENSION: usize = 2;
/// Intervals with persistence at or below this value are discarded.
pub const DEFAULT_MIN_PERSISTENCE: f64 = 0.0003;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scan: ScanConfig,
    pub persistence: PersistenceConfig,
    pub distance: DistanceConfig,
    pub silhouette: SilhouetteConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub target_height: f64,
    /// Scans larger than this are randomly subsampled before the filtration
    /// is built. 0 keeps every point.
    pub max_points: usize,
    pub seed: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_height: DEFAULT_TARGET_HEIGHT,
            max_points: 300,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersistenceConfig {
    pub dimension: usize,
    pub min_persistence: f64,
    pub max_edge_length: f64,
    /// Simplex budget of one filtration
    pub max_simplices: usize,
    /// Over budget, lower the edge threshold until the complex fits
    /// instead of failing; features alive at the threshold die there.
    pub fit_edge_length: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            min_persistence: DEFAULT_MIN_PERSISTENCE,
            max_edge_length: f64::INFINITY,
            max_simplices: 1_000_000,
            fit_edge_length: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistanceConfig {
    pub bottleneck_dimension: usize,
    pub wasserstein_order: f64,
    /// Ground metric exponent; also the exponent used to pool the
    /// per-dimension Wasserstein distances.
    pub internal_p: f64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            bottleneck_dimension: DEFAULT_DIMENSION,
            wasserstein_order: 2.0,
            internal_p: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SilhouetteConfig {
    pub resolution: usize,
    pub weight: SilhouetteWeight,
}

impl Default for SilhouetteConfig {
    fn default() -> Self {
        Self {
            resolution: 100,
            weight: SilhouetteWeight::Uniform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    pub max_intervals: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            max_intervals: 1000,
            width: 1200,
            height: 500,
        }
    }
}

impl Config {
    /// Parse a TOML document; missing sections and fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| TdaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TdaError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TdaError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(TdaError::InvalidParameter(msg));

        if !(self.scan.target_height.is_finite() && self.scan.target_height > 0.0) {
            return invalid(format!(
                "scan.target_height must be positive, got {}",
                self.scan.target_height
            ));
        }
        if self.persistence.min_persistence.is_nan() {
            return invalid("persistence.min_persistence is NaN".into());
        }
        if !(self.persistence.max_edge_length > 0.0) {
            return invalid(format!(
                "persistence.max_edge_length must be positive, got {}",
                self.persistence.max_edge_length
            ));
        }
        if !(self.distance.wasserstein_order.is_finite() && self.distance.wasserstein_order >= 1.0) {
            return invalid(format!(
                "distance.wasserstein_order must be finite and >= 1, got {}",
                self.distance.wasserstein_order
            ));
        }
        if !(self.distance.internal_p >= 1.0) {
            return invalid(format!(
                "distance.internal_p must be >= 1, got {}",
                self.distance.internal_p
            ));
        }
        if self.silhouette.resolution == 0 {
            return invalid("silhouette.resolution must be at least 1".into());
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            return invalid("plot.width and plot.height must be non-zero".into());
        }
        Ok(())
    }
}
