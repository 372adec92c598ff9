//! Plot Module: Persistence Diagram and Barcode as SVG
//!
//! One figure, two panels side by side:
//!
//! ```text
//! ┌──────────────────────┬──────────────────────┐
//! │ death            ∞ - │ H2 ━━                │
//! │   ·  ·   ╱           │ H1 ━━━━━             │
//! │  ·    ╱    ● H0      │ H0 ━━━━━━━━━━━━━━━━━▶│
//! │     ╱      ● H1      │                      │
//! │   ╱  birth           │           filtration │
//! └──────────────────────┴──────────────────────┘
//! ```
//!
//! Essential intervals are drawn on a dashed "∞" line placed above the
//! largest finite value.

mod svg;

use std::path::Path;

use tracing::info;

use crate::config::PlotConfig;
use crate::error::{Result, TdaError};
use crate::topology::PersistenceDiagram;

pub use svg::render_svg;

/// Write the diagram and barcode panels of `diagram` to an SVG file
pub fn plot_persistence_diagram(
    diagram: &PersistenceDiagram,
    path: impl AsRef<Path>,
    config: &PlotConfig,
) -> Result<()> {
    let path = path.as_ref();
    let document = render_svg(diagram, config)?;
    std::fs::write(path, document).map_err(|e| TdaError::io(path, e))?;
    info!(path = %path.display(), n_intervals = diagram.len(), "wrote persistence plot");
    Ok(())
}
