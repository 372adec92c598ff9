//! Mesh Module: Body Scans as Point Clouds
//!
//! A body scan is reduced to the list of its vertex coordinates; faces and
//! attributes carry no information for the filtration. This module reads
//! the common scanner export formats, measures and rescales scans, and
//! converts them to the dense matrices used by the topology engine.

mod loader;
mod scan;

pub use loader::{load_scan, write_xyz, ScanFormat};
pub use scan::{
    bounding_box,
    normalize_in_place,
    points_to_array,
    scan_height,
    scan_normalization,
    subsample,
};

/// A scan vertex `[x, y, z]`; `z` is the vertical axis.
pub type Point3 = [f64; 3];
