//! body-tda: persistent homology of body scans from the command line
//!
//! ```text
//! body-tda height scan.obj
//! body-tda normalize scan.ply -o scan_170.xyz
//! body-tda diagram scan.stl --json pd.json --plot pd.svg
//! body-tda compare a.obj b.obj
//! body-tda matrix scans/*.ply --metric wasserstein
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use body_tda::mesh::bounding_box;
use body_tda::{
    load_scan, plot_persistence_diagram, scan_height, scan_normalization, write_xyz, Config,
    DiagramMetric, ScanPipeline,
};

#[derive(Parser)]
#[command(name = "body-tda")]
#[command(version, about = "Persistent homology of 3D body scans")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the height (z extent) of a scan
    Height {
        scan: PathBuf,
    },

    /// Rescale a scan to a target height and write it as XYZ
    Normalize {
        scan: PathBuf,

        /// Output point cloud
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        target_height: Option<f64>,
    },

    /// Compute the persistence diagram of a scan
    Diagram {
        scan: PathBuf,

        /// Highest homology dimension
        #[arg(short, long)]
        dimension: Option<usize>,

        #[arg(long)]
        min_persistence: Option<f64>,

        /// Subsample to at most this many points (0 keeps all)
        #[arg(long)]
        max_points: Option<usize>,

        /// Write the report here instead of stdout
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write an SVG plot of the diagram and barcode
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Distances between the diagrams of two scans
    Compare {
        a: PathBuf,
        b: PathBuf,
    },

    /// Pairwise distance matrix of several scans
    Matrix {
        #[arg(required = true, num_args = 2..)]
        scans: Vec<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = MetricKind::Bottleneck)]
        metric: MetricKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricKind {
    Bottleneck,
    Wasserstein,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Height { scan } => {
            let points = load_scan(&scan).with_context(|| format!("reading {}", scan.display()))?;
            let height = scan_height(&points)?;
            let (min, max) = bounding_box(&points)?;
            print_json(&json!({
                "scan": scan.display().to_string(),
                "n_points": points.len(),
                "height": height,
                "bounding_box": { "min": min, "max": max },
            }))
        }

        Commands::Normalize { scan, output, target_height } => {
            let target = target_height.unwrap_or(config.scan.target_height);
            let points = load_scan(&scan).with_context(|| format!("reading {}", scan.display()))?;
            let scaled = scan_normalization(&points, target)
                .with_context(|| format!("normalizing {}", scan.display()))?;
            write_xyz(&output, &scaled)?;
            info!(output = %output.display(), target, "normalized scan written");
            Ok(())
        }

        Commands::Diagram { scan, dimension, min_persistence, max_points, json, plot } => {
            if let Some(d) = dimension {
                config.persistence.dimension = d;
            }
            if let Some(m) = min_persistence {
                config.persistence.min_persistence = m;
            }
            if let Some(n) = max_points {
                config.scan.max_points = n;
            }
            let pipeline = ScanPipeline::new(config)?;
            let report = pipeline.process(&scan)
                .with_context(|| format!("processing {}", scan.display()))?;

            if let Some(svg) = &plot {
                plot_persistence_diagram(&report.summary.diagram, svg, &pipeline.config().plot)?;
            }
            match json {
                Some(path) => {
                    let text = serde_json::to_string_pretty(&report)?;
                    std::fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "report written");
                    Ok(())
                }
                None => print_json(&report),
            }
        }

        Commands::Compare { a, b } => {
            let pipeline = ScanPipeline::new(config)?;
            let reports = pipeline.process_many(&[a, b])?;
            let comparison = pipeline.compare(&reports[0], &reports[1])?;
            print_json(&json!({
                "a": reports[0].source,
                "b": reports[1].source,
                "distances": comparison,
            }))
        }

        Commands::Matrix { scans, metric } => {
            let pipeline = ScanPipeline::new(config)?;
            let distance = &pipeline.config().distance;
            let metric = match metric {
                MetricKind::Bottleneck => {
                    // a dimension missing from the diagrams is an error downstream
                    let mut m = DiagramMetric::bottleneck(distance);
                    if let DiagramMetric::Bottleneck { dimension } = &mut m {
                        *dimension = (*dimension).min(pipeline.config().persistence.dimension);
                    }
                    m
                }
                MetricKind::Wasserstein => DiagramMetric::wasserstein(distance),
            };

            let reports = pipeline.process_many(&scans)?;
            let matrix = pipeline.distance_matrix(&reports, metric)?;
            let rows: Vec<Vec<f64>> = matrix.outer_iter().map(|row| row.to_vec()).collect();
            let names: Vec<&str> = reports.iter().map(|r| r.source.as_str()).collect();
            print_json(&json!({
                "scans": names,
                "metric": metric,
                "matrix": rows,
            }))
        }
    }
}
