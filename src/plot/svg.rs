use crate::config::PlotConfig;
use crate::error::{Result, TdaError};
use crate::topology::{PersistenceDiagram, PersistenceInterval};

/// Matplotlib "Set1" colours, one per homology dimension
const PALETTE: [&str; 6] = ["#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#a65628"];

const MARGIN: f64 = 50.0;
const TICKS: usize = 5;

fn colour(dimension: usize) -> &'static str {
    PALETTE[dimension % PALETTE.len()]
}

/// Value range shared by both panels
struct Scale {
    lo: f64,
    hi: f64,
    infinity: f64,
}

impl Scale {
    fn new(intervals: &[PersistenceInterval]) -> Self {
        let finite = intervals.iter()
            .flat_map(|i| [i.birth, i.death])
            .filter(|v| v.is_finite());
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in finite {
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() {
            (min, max) = (0.0, 1.0);
        }
        if max - min <= 0.0 {
            max = min + 1.0;
        }

        let span = max - min;
        let infinity = max + 0.1 * span;
        let pad = 0.05 * (infinity - min);
        Self { lo: min - pad, hi: infinity + pad, infinity }
    }

    fn clamp(&self, v: f64) -> f64 {
        if v.is_infinite() {
            self.infinity
        } else {
            v
        }
    }

    fn unit(&self, v: f64) -> f64 {
        (self.clamp(v) - self.lo) / (self.hi - self.lo)
    }
}

/// Plot area of one panel
struct Panel {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Panel {
    fn x(&self, scale: &Scale, v: f64) -> f64 {
        self.left + scale.unit(v) * self.width
    }

    fn y(&self, scale: &Scale, v: f64) -> f64 {
        self.top + self.height - scale.unit(v) * self.height
    }

    fn frame(&self, out: &mut String, title: &str) {
        out.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"none\" stroke=\"#333\"/>\n",
            self.left, self.top, self.width, self.height
        ));
        out.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"14\">{title}</text>\n",
            self.left + self.width / 2.0,
            self.top - 12.0
        ));
    }

    fn x_ticks(&self, out: &mut String, scale: &Scale, label: &str) {
        let bottom = self.top + self.height;
        for k in 0..TICKS {
            let v = scale.lo + (scale.infinity - scale.lo) * k as f64 / (TICKS - 1) as f64;
            let x = self.x(scale, v);
            out.push_str(&format!(
                "<line x1=\"{x:.1}\" y1=\"{bottom:.1}\" x2=\"{x:.1}\" y2=\"{:.1}\" stroke=\"#333\"/>\n\
                 <text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\">{v:.3}</text>\n",
                bottom + 4.0,
                bottom + 16.0
            ));
        }
        out.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\">{label}</text>\n",
            self.left + self.width / 2.0,
            bottom + 34.0
        ));
    }
}

/// Render the persistence diagram and barcode panels as an SVG document
pub fn render_svg(diagram: &PersistenceDiagram, config: &PlotConfig) -> Result<String> {
    if config.width == 0 || config.height == 0 {
        return Err(TdaError::InvalidParameter("plot width and height must be non-zero".into()));
    }

    let mut intervals = diagram.intervals.clone();
    intervals.sort_by(|a, b| b.persistence().total_cmp(&a.persistence()));
    intervals.truncate(config.max_intervals);

    let (width, height) = (config.width as f64, config.height as f64);
    let scale = Scale::new(&intervals);
    let panel_width = (width / 2.0 - 2.0 * MARGIN).max(10.0);
    let panel_height = (height - 2.0 * MARGIN).max(10.0);
    let diagram_panel = Panel { left: MARGIN, top: MARGIN, width: panel_width, height: panel_height };
    let barcode_panel = Panel {
        left: width / 2.0 + MARGIN,
        top: MARGIN,
        width: panel_width,
        height: panel_height,
    };

    let mut out = String::new();
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
        config.width, config.height, config.width, config.height
    ));
    out.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    draw_diagram(&mut out, &diagram_panel, &scale, &intervals);
    draw_barcode(&mut out, &barcode_panel, &scale, &intervals);

    out.push_str("</svg>\n");
    Ok(out)
}

fn draw_diagram(out: &mut String, panel: &Panel, scale: &Scale, intervals: &[PersistenceInterval]) {
    panel.frame(out, "Persistence diagram");
    panel.x_ticks(out, scale, "Birth");

    // diagonal
    out.push_str(&format!(
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#888\"/>\n",
        panel.x(scale, scale.lo),
        panel.y(scale, scale.lo),
        panel.x(scale, scale.hi),
        panel.y(scale, scale.hi)
    ));

    if intervals.iter().any(PersistenceInterval::is_essential) {
        let y = panel.y(scale, scale.infinity);
        out.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#888\" stroke-dasharray=\"4 3\"/>\n\
             <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"12\">∞</text>\n",
            panel.left,
            panel.left + panel.width,
            panel.left - 6.0,
            y + 4.0
        ));
    }

    for interval in intervals {
        out.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"3\" fill=\"{}\" fill-opacity=\"0.7\"/>\n",
            panel.x(scale, interval.birth),
            panel.y(scale, interval.death),
            colour(interval.dimension)
        ));
    }

    // legend
    let mut dims: Vec<usize> = intervals.iter().map(|i| i.dimension).collect();
    dims.sort_unstable();
    dims.dedup();
    for (row, dim) in dims.into_iter().enumerate() {
        let x = panel.left + panel.width - 50.0;
        let y = panel.top + panel.height - 15.0 - 16.0 * row as f64;
        out.push_str(&format!(
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"4\" fill=\"{}\"/>\n\
             <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\">H{dim}</text>\n",
            colour(dim),
            x + 8.0,
            y + 4.0
        ));
    }
}

fn draw_barcode(out: &mut String, panel: &Panel, scale: &Scale, intervals: &[PersistenceInterval]) {
    panel.frame(out, "Persistence barcode");
    panel.x_ticks(out, scale, "Filtration value");

    let mut bars = intervals.to_vec();
    bars.sort_by(|a, b| {
        a.dimension.cmp(&b.dimension)
            .then_with(|| a.birth.total_cmp(&b.birth))
            .then_with(|| a.death.total_cmp(&b.death))
    });
    if bars.is_empty() {
        return;
    }

    let row = panel.height / bars.len() as f64;
    let thickness = (row * 0.8).max(0.5);
    for (i, bar) in bars.iter().enumerate() {
        let x0 = panel.x(scale, bar.birth);
        let x1 = panel.x(scale, bar.death);
        out.push_str(&format!(
            "<rect x=\"{x0:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{thickness:.2}\" fill=\"{}\" fill-opacity=\"0.8\"/>\n",
            panel.top + row * i as f64 + (row - thickness) / 2.0,
            (x1 - x0).max(0.5),
            colour(bar.dimension)
        ));
    }
}
