//! A small retained-mode plotting library.
//!
//! This module is organized into submodules:
//! - `artist`: the drawable object graph (lines, patches, collections, text)
//! - `ticks`: automatic tick placement and labels
//! - `pyplot`: the stateful pyplot-style interface and its render hooks
//!
//! Figures own axes, axes own artists. Everything here is library-specific;
//! the chart engine reads it only through `scene::adapter`.

pub mod artist;
pub mod pyplot;
pub mod ticks;

pub use artist::*;
pub use pyplot::{Pyplot, RenderHook};

use glam::{DVec2, dvec2};
use regex_lite::Regex;

use crate::errors::PlotError;
use crate::types::{Bounds, fmt_num};

/// Figure number; never reused within a process
pub type FigureId = u32;

/// Default figure size in inches
pub const DEFAULT_FIGSIZE: (f64, f64) = (6.4, 4.8);

/// Default property cycle (tab10)
pub const COLOR_CYCLE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Fraction of the data span added on each side when autoscaling
const AUTOSCALE_MARGIN: f64 = 0.05;

/// Fixed view limits of pie axes
const PIE_LIMIT: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

impl Scale {
    pub fn as_str(self) -> &'static str {
        match self {
            Scale::Linear => "linear",
            Scale::Log => "log",
        }
    }

    pub fn parse(s: &str) -> Option<Scale> {
        match s {
            "linear" => Some(Scale::Linear),
            "log" => Some(Scale::Log),
            _ => None,
        }
    }
}

/// A tick position as the user gave it
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Value(f64),
    /// A categorical position; drawn at its index
    Category(String),
}

impl Tick {
    pub fn label(&self, scale: Scale) -> String {
        match self {
            Tick::Value(v) => ticks::tick_label(*v, scale),
            Tick::Category(s) => s.clone(),
        }
    }
}

/// One axis of an axes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axis {
    pub label: String,
    pub scale: Scale,
    /// Explicit tick positions; `None` means automatic
    pub ticks: Option<Vec<Tick>>,
    /// Explicit tick labels, parallel to `ticks`
    pub tick_labels: Option<Vec<String>>,
    pub limits: Option<(f64, f64)>,
}

impl Axis {
    /// Tick positions and labels for the given view limits
    pub fn resolved_ticks(&self, limits: (f64, f64)) -> (Vec<Tick>, Vec<String>) {
        let ticks = match &self.ticks {
            Some(t) => t.clone(),
            None => ticks::auto_ticks(limits.0, limits.1, self.scale)
                .into_iter()
                .map(Tick::Value)
                .collect(),
        };
        let labels = match &self.tick_labels {
            Some(labels) => (0..ticks.len())
                .map(|i| labels.get(i).cloned().unwrap_or_default())
                .collect(),
            None => ticks.iter().map(|t| t.label(self.scale)).collect(),
        };
        (ticks, labels)
    }

    /// Tick positions in data coordinates, categories at their index
    pub fn tick_positions(&self, limits: (f64, f64)) -> Vec<f64> {
        self.resolved_ticks(limits)
            .0
            .iter()
            .enumerate()
            .map(|(i, t)| match t {
                Tick::Value(v) => *v,
                Tick::Category(_) => i as f64,
            })
            .collect()
    }
}

/// Placement of an axes in its figure's subplot grid (1-based index)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub rows: u32,
    pub cols: u32,
    pub index: u32,
}

impl GridCell {
    pub const SINGLE: GridCell = GridCell {
        rows: 1,
        cols: 1,
        index: 1,
    };

    pub fn new(rows: u32, cols: u32, index: u32) -> Result<Self, PlotError> {
        if rows == 0 || cols == 0 {
            return Err(PlotError::value(format!(
                "Number of rows and columns must be positive, not {rows} and {cols}"
            )));
        }
        if index == 0 || index > rows * cols {
            return Err(PlotError::value(format!(
                "num must be an integer with 1 <= num <= {}, not {index}",
                rows * cols
            )));
        }
        Ok(Self { rows, cols, index })
    }

    /// Zero-based (row, column)
    pub fn row_col(&self) -> (u32, u32) {
        let i = self.index - 1;
        (i / self.cols, i % self.cols)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aspect {
    #[default]
    Auto,
    Equal,
}

/// Options for `Axes::plot`
#[derive(Debug, Clone, Default)]
pub struct LineOptions {
    pub label: Option<String>,
    pub color: Option<String>,
    pub linestyle: Option<LineStyle>,
    pub marker: Option<Marker>,
}

/// Options for `Axes::scatter`
#[derive(Debug, Clone, Default)]
pub struct ScatterOptions {
    pub label: Option<String>,
    pub color: Option<String>,
    /// Per-point scalars mapped through the colormap
    pub c: Option<Vec<f64>>,
    pub size: Option<f64>,
}

/// Options for `Axes::bar`
#[derive(Debug, Clone, Default)]
pub struct BarOptions {
    pub label: Option<String>,
    pub color: Option<String>,
    pub width: Option<f64>,
}

/// Options for `Axes::pie`
#[derive(Debug, Clone, Default)]
pub struct PieOptions {
    pub labels: Option<Vec<String>>,
    /// printf-style percentage format such as `%1.1f%%`
    pub autopct: Option<String>,
    pub shadow: bool,
    pub startangle: f64,
}

/// One plotting region
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub cell: GridCell,
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub artists: Vec<Artist>,
    pub legend: bool,
    pub grid: bool,
    pub aspect: Aspect,
    /// Fixed height/width ratio of the axes box
    pub box_aspect: Option<f64>,
    /// Index of the axes this one is the colorbar of
    pub colorbar_for: Option<usize>,
    /// Whether the axes frame (spines) is drawn
    pub frame: bool,
    color_index: usize,
    child_count: usize,
}

impl Axes {
    pub fn new(cell: GridCell) -> Self {
        Self {
            cell,
            title: String::new(),
            xaxis: Axis::default(),
            yaxis: Axis::default(),
            artists: Vec::new(),
            legend: false,
            grid: false,
            aspect: Aspect::Auto,
            box_aspect: None,
            colorbar_for: None,
            frame: true,
            color_index: 0,
            child_count: 0,
        }
    }

    fn next_color(&mut self) -> String {
        let color = COLOR_CYCLE[self.color_index % COLOR_CYCLE.len()];
        self.color_index += 1;
        color.to_string()
    }

    fn auto_label(&mut self) -> String {
        let label = format!("_child{}", self.child_count);
        self.child_count += 1;
        label
    }

    fn label_or_auto(&mut self, label: Option<String>) -> String {
        match label {
            Some(l) => l,
            None => self.auto_label(),
        }
    }

    pub fn add_artist(&mut self, artist: Artist) {
        self.artists.push(artist);
    }

    /// Draw a polyline through `(x[i], y[i])`
    pub fn plot(&mut self, x: Vec<f64>, y: Vec<f64>, opts: LineOptions) -> Result<(), PlotError> {
        if x.len() != y.len() {
            return Err(PlotError::value(format!(
                "x and y must have same first dimension, but have shapes ({},) and ({},)",
                x.len(),
                y.len()
            )));
        }
        let color = match opts.color {
            Some(c) => c,
            None => self.next_color(),
        };
        let label = self.label_or_auto(opts.label);
        let linestyle = opts.linestyle.unwrap_or_default();
        let line = Line2D::new(x, y, color, label).with_style(linestyle, opts.marker);
        self.artists.push(Artist::Line2D(line));
        Ok(())
    }

    /// Draw one marker per point
    pub fn scatter(&mut self, x: Vec<f64>, y: Vec<f64>, opts: ScatterOptions) -> Result<(), PlotError> {
        if x.len() != y.len() {
            return Err(PlotError::value("x and y must be the same size"));
        }
        let color = match opts.color {
            Some(c) => c,
            None => self.next_color(),
        };
        let label = match opts.label {
            Some(l) => l,
            None => format!("_collection{}", self.artists.len()),
        };
        let offsets = x.iter().zip(&y).map(|(&x, &y)| dvec2(x, y)).collect();
        self.artists.push(Artist::PathCollection(PathCollection {
            offsets,
            array: opts.c,
            color,
            size: opts.size.unwrap_or(36.0),
            label,
        }));
        Ok(())
    }

    /// Vertical bars centered on `positions`. Categorical positions are laid
    /// out at their index and become the x tick labels.
    pub fn bar(&mut self, positions: Vec<Tick>, heights: Vec<f64>, opts: BarOptions) -> Result<(), PlotError> {
        if positions.len() != heights.len() {
            return Err(PlotError::value(format!(
                "shape mismatch: objects cannot be broadcast to a single shape: ({},) and ({},)",
                positions.len(),
                heights.len()
            )));
        }
        let width = opts.width.unwrap_or(0.8);
        let color = match opts.color {
            Some(c) => c,
            None => self.next_color(),
        };
        let label = self.label_or_auto(opts.label);

        let categorical = positions.iter().any(|p| matches!(p, Tick::Category(_)));
        if categorical {
            let categories: Vec<Tick> = positions
                .iter()
                .map(|p| match p {
                    Tick::Category(s) => Tick::Category(s.clone()),
                    Tick::Value(v) => Tick::Category(fmt_num(*v)),
                })
                .collect();
            self.xaxis.ticks = Some(categories);
            self.xaxis.tick_labels = None;
        }

        for (i, (pos, height)) in positions.iter().zip(heights).enumerate() {
            let center = match pos {
                Tick::Value(v) if !categorical => *v,
                _ => i as f64,
            };
            self.artists.push(Artist::Rectangle(Rectangle {
                x: center - width / 2.0,
                y: 0.0,
                width,
                height,
                color: color.clone(),
                label: label.clone(),
            }));
        }
        Ok(())
    }

    /// A pie of `values`, one wedge per value, counter-clockwise from
    /// `startangle`. Each wedge gets a label text and, with `autopct`, a
    /// percentage text.
    pub fn pie(&mut self, values: Vec<f64>, opts: PieOptions) -> Result<(), PlotError> {
        if values.iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(PlotError::value("Wedge sizes 'x' must be non negative values"));
        }
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            return Err(PlotError::value("Wedge sizes must sum to a positive value"));
        }
        if let Some(labels) = &opts.labels {
            if labels.len() != values.len() {
                return Err(PlotError::value("'label' must be of length 'x'"));
            }
        }

        let radius = 1.0;
        let mut theta1 = opts.startangle;
        for (i, value) in values.iter().enumerate() {
            let fraction = value / total;
            let theta2 = theta1 + 360.0 * fraction;
            let color = self.next_color();
            let label = opts
                .labels
                .as_ref()
                .map(|l| l[i].clone())
                .unwrap_or_default();
            let wedge = Wedge {
                center: DVec2::ZERO,
                r: radius,
                theta1,
                theta2,
                color,
                label: label.clone(),
            };
            self.artists.push(Artist::Wedge(wedge.clone()));
            if opts.shadow {
                self.artists.push(Artist::Shadow(Shadow {
                    offset: dvec2(0.02, -0.02),
                    source: Box::new(Artist::Wedge(wedge)),
                }));
            }

            let mid = ((theta1 + theta2) / 2.0).to_radians();
            let direction = dvec2(mid.cos(), mid.sin());
            self.artists.push(Artist::Text(Text {
                position: direction * radius * 1.1,
                content: label,
                anchor: if direction.x >= 0.0 {
                    TextAnchor::Start
                } else {
                    TextAnchor::End
                },
            }));
            if let Some(fmt) = &opts.autopct {
                self.artists.push(Artist::Text(Text {
                    position: direction * radius * 0.6,
                    content: format_autopct(fmt, fraction * 100.0),
                    anchor: TextAnchor::Middle,
                }));
            }
            theta1 = theta2;
        }

        self.aspect = Aspect::Equal;
        self.frame = false;
        self.xaxis.ticks = Some(Vec::new());
        self.yaxis.ticks = Some(Vec::new());
        Ok(())
    }

    /// Box-and-whisker plot of each dataset at positions 1..=n
    pub fn boxplot(&mut self, datasets: Vec<Vec<f64>>, labels: Option<Vec<String>>) -> Result<(), PlotError> {
        if datasets.is_empty() {
            return Err(PlotError::value("boxplot requires at least one dataset"));
        }
        if let Some(labels) = &labels {
            if labels.len() != datasets.len() {
                return Err(PlotError::value(
                    "Dimensions of labels and X must be compatible",
                ));
            }
        }
        let half = 0.25;
        let box_color = self.next_color();
        for (i, data) in datasets.iter().enumerate() {
            let stats = BoxStats::compute(data).ok_or_else(|| {
                PlotError::value(format!("dataset {} has no finite values", i + 1))
            })?;
            let x = (i + 1) as f64;
            let (x0, x1) = (x - half, x + half);

            let whisker = |y0: f64, y1: f64| {
                Artist::Line2D(Line2D::new(vec![x, x], vec![y0, y1], "black", "_nolegend_"))
            };
            let cap = |y: f64| {
                Artist::Line2D(Line2D::new(
                    vec![x - half / 2.0, x + half / 2.0],
                    vec![y, y],
                    "black",
                    "_nolegend_",
                ))
            };
            self.artists.push(whisker(stats.q1, stats.whisker_lo));
            self.artists.push(whisker(stats.q3, stats.whisker_hi));
            self.artists.push(cap(stats.whisker_lo));
            self.artists.push(cap(stats.whisker_hi));
            self.artists.push(Artist::PathPatch(PathPatch {
                vertices: vec![
                    dvec2(x0, stats.q1),
                    dvec2(x1, stats.q1),
                    dvec2(x1, stats.q3),
                    dvec2(x0, stats.q3),
                    dvec2(x0, stats.q1),
                ],
                facecolor: box_color.clone(),
                label: "_nolegend_".to_string(),
            }));
            self.artists.push(Artist::Line2D(Line2D::new(
                vec![x0, x1],
                vec![stats.median, stats.median],
                "orange",
                "_nolegend_",
            )));
            let fliers = Line2D::new(
                vec![x; stats.fliers.len()],
                stats.fliers.clone(),
                "black",
                "_nolegend_",
            )
            .with_style(LineStyle::None, Some(Marker::Circle));
            self.artists.push(Artist::Line2D(fliers));
        }

        self.xaxis.ticks = Some((1..=datasets.len()).map(|i| Tick::Value(i as f64)).collect());
        self.xaxis.tick_labels = Some(match labels {
            Some(l) => l,
            None => (1..=datasets.len()).map(|i| i.to_string()).collect(),
        });
        Ok(())
    }

    /// Horizontal line across the whole axes at `y`
    pub fn axhline(&mut self, y: f64, color: Option<String>) {
        let label = self.auto_label();
        let mut line = Line2D::new(vec![0.0, 1.0], vec![y, y], color.unwrap_or_else(|| "black".into()), label);
        line.x_coords = XCoords::AxesFraction;
        self.artists.push(Artist::Line2D(line));
    }

    /// Vertical line across the whole axes at `x`
    pub fn axvline(&mut self, x: f64, color: Option<String>) {
        let label = self.auto_label();
        let mut line = Line2D::new(vec![x, x], vec![0.0, 1.0], color.unwrap_or_else(|| "black".into()), label);
        line.y_coords = YCoords::AxesFraction;
        self.artists.push(Artist::Line2D(line));
    }

    pub fn text(&mut self, x: f64, y: f64, content: impl Into<String>) {
        self.artists.push(Artist::Text(Text {
            position: dvec2(x, y),
            content: content.into(),
            anchor: TextAnchor::Start,
        }));
    }

    /// Union of all artists' data extents
    pub fn data_bounds(&self) -> Bounds {
        let mut b = Bounds::empty();
        for artist in &self.artists {
            b.union(&artist.data_bounds());
        }
        b
    }

    fn has_wedges(&self) -> bool {
        self.artists.iter().any(|a| matches!(a, Artist::Wedge(_)))
    }

    fn has_bars(&self) -> bool {
        self.artists.iter().any(|a| matches!(a, Artist::Rectangle(_)))
    }

    /// View limits: explicit limits win, otherwise the data extent plus
    /// margins. Categorical ticks always stay in view.
    pub fn view_limits(&self) -> ((f64, f64), (f64, f64)) {
        if self.has_wedges() && self.aspect == Aspect::Equal {
            let pie = (-PIE_LIMIT, PIE_LIMIT);
            return (
                self.xaxis.limits.unwrap_or(pie),
                self.yaxis.limits.unwrap_or(pie),
            );
        }
        let mut bounds = self.data_bounds();
        if let Some(ticks) = &self.xaxis.ticks {
            for (i, t) in ticks.iter().enumerate() {
                if let Tick::Category(_) = t {
                    bounds.expand(dvec2(i as f64, f64::NAN));
                }
            }
        }
        let x = self.xaxis.limits.unwrap_or_else(|| {
            autoscale(bounds.min.x, bounds.max.x, self.xaxis.scale, false)
        });
        let y = self.yaxis.limits.unwrap_or_else(|| {
            let sticky_zero = self.has_bars() && bounds.min.y == 0.0;
            autoscale(bounds.min.y, bounds.max.y, self.yaxis.scale, sticky_zero)
        });
        (x, y)
    }
}

/// Data range plus margins; an empty range maps to (0, 1)
fn autoscale(lo: f64, hi: f64, scale: Scale, sticky_zero: bool) -> (f64, f64) {
    if !(lo.is_finite() && hi.is_finite()) {
        return match scale {
            Scale::Linear => (0.0, 1.0),
            Scale::Log => (1.0, 10.0),
        };
    }
    match scale {
        Scale::Linear => {
            if hi == lo {
                return (lo - 0.5, hi + 0.5);
            }
            let pad = (hi - lo) * AUTOSCALE_MARGIN;
            let lo = if sticky_zero { lo } else { lo - pad };
            (lo, hi + pad)
        }
        Scale::Log => {
            let hi = if hi > 0.0 { hi } else { 10.0 };
            let lo = if lo > 0.0 { lo } else { hi / 1000.0 };
            let (llo, lhi) = (lo.log10(), hi.log10());
            let pad = if lhi > llo { (lhi - llo) * AUTOSCALE_MARGIN } else { 0.5 };
            (10_f64.powf(llo - pad), 10_f64.powf(lhi + pad))
        }
    }
}

/// Five-number summary with Tukey whiskers (1.5 IQR)
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub whisker_lo: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_hi: f64,
    pub fliers: Vec<f64>,
}

impl BoxStats {
    pub fn compute(data: &[f64]) -> Option<BoxStats> {
        let mut sorted: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));
        let q1 = percentile(&sorted, 0.25);
        let median = percentile(&sorted, 0.5);
        let q3 = percentile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
        let whisker_lo = sorted
            .iter()
            .copied()
            .find(|v| *v >= lo_fence)
            .unwrap_or(q1)
            .min(q1);
        let whisker_hi = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= hi_fence)
            .unwrap_or(q3)
            .max(q3);
        let fliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < whisker_lo || *v > whisker_hi)
            .collect();
        Some(BoxStats {
            whisker_lo,
            q1,
            median,
            q3,
            whisker_hi,
            fliers,
        })
    }
}

/// Linear-interpolated percentile of sorted data, `p` in 0..=1
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * p;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Render a printf-style percentage format (`%1.1f%%`, `%d%%`, `%.0f`)
pub fn format_autopct(fmt: &str, pct: f64) -> String {
    let spec = Regex::new(r"%[-+ 0#]*\d*(?:\.(\d+))?([fdg])").ok();
    let mut out = String::new();
    let mut rest = fmt;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("%%") {
            out.push('%');
            rest = tail;
            continue;
        }
        if let Some(m) = spec.as_ref().and_then(|re| re.captures(rest)) {
            let whole = m.get(0).map(|g| (g.start(), g.end()));
            if let Some((0, end)) = whole {
                let precision = m
                    .get(1)
                    .and_then(|p| p.as_str().parse::<usize>().ok())
                    .unwrap_or(6);
                match m.get(2).map(|k| k.as_str()) {
                    Some("d") => out.push_str(&format!("{}", pct.round() as i64)),
                    Some("g") => out.push_str(&fmt_num(pct)),
                    _ => out.push_str(&format!("{:.*}", precision, pct)),
                }
                rest = &rest[end..];
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

/// One rendering surface
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub number: FigureId,
    /// Width and height in inches
    pub size: (f64, f64),
    pub suptitle: Option<String>,
    pub axes: Vec<Axes>,
    current_axes: Option<usize>,
}

impl Figure {
    pub fn new(number: FigureId) -> Self {
        Self {
            number,
            size: DEFAULT_FIGSIZE,
            suptitle: None,
            axes: Vec::new(),
            current_axes: None,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = (width, height);
        self
    }

    /// Select the axes at `cell`, creating it if needed. Returns its index.
    pub fn add_subplot(&mut self, cell: GridCell) -> usize {
        let existing = self
            .axes
            .iter()
            .position(|ax| ax.cell == cell && ax.colorbar_for.is_none());
        let idx = match existing {
            Some(i) => i,
            None => {
                self.axes.push(Axes::new(cell));
                self.axes.len() - 1
            }
        };
        self.current_axes = Some(idx);
        idx
    }

    pub fn current_axes_index(&self) -> Option<usize> {
        self.current_axes
    }

    pub fn set_current_axes(&mut self, idx: usize) -> Result<(), PlotError> {
        if idx >= self.axes.len() {
            return Err(PlotError::value(format!(
                "axes index {} out of range (figure has {} axes)",
                idx + 1,
                self.axes.len()
            )));
        }
        self.current_axes = Some(idx);
        Ok(())
    }

    /// Current axes, creating a single full-figure axes on first use
    pub fn gca(&mut self) -> &mut Axes {
        let idx = match self.current_axes {
            Some(i) => i,
            None => self.add_subplot(GridCell::SINGLE),
        };
        &mut self.axes[idx]
    }

    /// Attach a colorbar to the axes at `parent`, scaled to the value range
    /// of its color-mapped collections.
    pub fn add_colorbar(&mut self, parent: usize) -> Result<usize, PlotError> {
        let axes = self
            .axes
            .get(parent)
            .ok_or_else(|| PlotError::value("colorbar parent axes does not exist"))?;
        let mut range: Option<(f64, f64)> = None;
        for artist in &axes.artists {
            if let Artist::PathCollection(PathCollection { array: Some(values), .. }) = artist {
                for v in values.iter().copied().filter(|v| v.is_finite()) {
                    range = Some(match range {
                        Some((lo, hi)) => (lo.min(v), hi.max(v)),
                        None => (v, v),
                    });
                }
            }
        }
        let (vmin, vmax) = range.ok_or_else(|| {
            PlotError::runtime(
                "No mappable was found to use for colorbar creation. \
                 Pass c= to scatter first.",
            )
        })?;

        let mut cbar = Axes::new(axes.cell);
        cbar.colorbar_for = Some(parent);
        cbar.box_aspect = Some(20.0);
        cbar.xaxis.ticks = Some(Vec::new());
        cbar.yaxis.limits = Some(if vmax > vmin { (vmin, vmax) } else { (vmin - 0.5, vmax + 0.5) });
        cbar.artists.push(Artist::ColorbarSolids(ColorbarSolids { vmin, vmax }));
        self.axes.push(cbar);
        Ok(self.axes.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_stats_match_linear_percentiles() {
        let stats = BoxStats::compute(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(stats.q1, 2.25);
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.q3, 4.75);
        assert_eq!(stats.whisker_lo, 1.0);
        assert_eq!(stats.whisker_hi, 5.0);
        assert_eq!(stats.fliers, vec![100.0]);
    }

    #[test]
    fn autopct_formats() {
        assert_eq!(format_autopct("%1.1f%%", 25.0), "25.0%");
        assert_eq!(format_autopct("%d%%", 33.4), "33%");
        assert_eq!(format_autopct("%.2f", 12.3456), "12.35");
    }

    #[test]
    fn categorical_bars_set_ticks() {
        let mut ax = Axes::new(GridCell::SINGLE);
        ax.bar(
            vec![Tick::Category("a".into()), Tick::Category("b".into())],
            vec![3.0, 4.0],
            BarOptions::default(),
        )
        .unwrap();
        let limits = ax.view_limits();
        let (ticks, labels) = ax.xaxis.resolved_ticks(limits.0);
        assert_eq!(ticks.len(), 2);
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(limits.1 .0, 0.0, "bars keep the baseline in view");
    }

    #[test]
    fn pie_emits_label_and_percent_texts_per_wedge() {
        let mut ax = Axes::new(GridCell::SINGLE);
        ax.pie(
            vec![1.0, 3.0],
            PieOptions {
                labels: Some(vec!["a".into(), "b".into()]),
                autopct: Some("%1.1f%%".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let texts: Vec<&str> = ax
            .artists
            .iter()
            .filter_map(|a| match a {
                Artist::Text(t) => Some(t.content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["a", "25.0%", "b", "75.0%"]);
    }

    #[test]
    fn subplot_cells_are_validated() {
        assert!(GridCell::new(2, 2, 5).is_err());
        assert!(GridCell::new(0, 1, 1).is_err());
        assert_eq!(GridCell::new(2, 3, 5).unwrap().row_col(), (1, 1));
    }

    #[test]
    fn colorbar_needs_a_mappable() {
        let mut fig = Figure::new(1);
        fig.gca().plot(vec![0.0], vec![0.0], LineOptions::default()).unwrap();
        assert!(fig.add_colorbar(0).is_err());

        fig.gca()
            .scatter(
                vec![0.0, 1.0],
                vec![0.0, 1.0],
                ScatterOptions {
                    c: Some(vec![2.0, 8.0]),
                    ..Default::default()
                },
            )
            .unwrap();
        let idx = fig.add_colorbar(0).unwrap();
        assert_eq!(fig.axes[idx].colorbar_for, Some(0));
        assert_eq!(fig.axes[idx].yaxis.limits, Some((2.0, 8.0)));
    }
}
