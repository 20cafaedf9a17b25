//! Artist types: everything an axes can draw.
//!
//! These mirror the object graph of a retained-mode plotting library. The
//! chart engine never looks at them directly; `scene::adapter` translates
//! them into neutral primitives.

use glam::DVec2;

use crate::types::Bounds;

/// How a line's vertices are connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
    /// No connecting segments (markers only)
    None,
}

impl LineStyle {
    /// Parse a format code: `-`, `--`, `:`, `-.`, or `none`/empty
    pub fn from_code(code: &str) -> Option<LineStyle> {
        match code {
            "-" | "solid" => Some(LineStyle::Solid),
            "--" | "dashed" => Some(LineStyle::Dashed),
            ":" | "dotted" => Some(LineStyle::Dotted),
            "-." | "dashdot" => Some(LineStyle::DashDot),
            "" | "none" | "None" | " " => Some(LineStyle::None),
            _ => None,
        }
    }

    pub fn dasharray(self) -> Option<&'static str> {
        match self {
            LineStyle::Dashed => Some("6,3"),
            LineStyle::Dotted => Some("1.5,2.5"),
            LineStyle::DashDot => Some("6,2,1.5,2"),
            LineStyle::Solid | LineStyle::None => None,
        }
    }
}

/// Point marker drawn at each vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Point,
    Square,
    Triangle,
    Plus,
    Cross,
}

impl Marker {
    pub fn from_code(code: &str) -> Option<Marker> {
        match code {
            "o" => Some(Marker::Circle),
            "." => Some(Marker::Point),
            "s" => Some(Marker::Square),
            "^" => Some(Marker::Triangle),
            "+" => Some(Marker::Plus),
            "x" => Some(Marker::Cross),
            _ => None,
        }
    }
}

/// Which coordinate system a line's x samples live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XCoords {
    #[default]
    Data,
    /// x in axes fraction (0..1), as used by horizontal reference lines
    AxesFraction,
}

/// Same as `XCoords` for the y samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YCoords {
    #[default]
    Data,
    AxesFraction,
}

/// A polyline with optional markers
#[derive(Debug, Clone, PartialEq)]
pub struct Line2D {
    pub xdata: Vec<f64>,
    pub ydata: Vec<f64>,
    pub linestyle: LineStyle,
    pub marker: Option<Marker>,
    pub color: String,
    pub label: String,
    pub x_coords: XCoords,
    pub y_coords: YCoords,
}

impl Line2D {
    pub fn new(xdata: Vec<f64>, ydata: Vec<f64>, color: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            xdata,
            ydata,
            linestyle: LineStyle::Solid,
            marker: None,
            color: color.into(),
            label: label.into(),
            x_coords: XCoords::Data,
            y_coords: YCoords::Data,
        }
    }

    pub fn with_style(mut self, linestyle: LineStyle, marker: Option<Marker>) -> Self {
        self.linestyle = linestyle;
        self.marker = marker;
        self
    }

    /// Vertices as points, truncated to the shorter of the two sample arrays
    pub fn points(&self) -> Vec<DVec2> {
        self.xdata
            .iter()
            .zip(&self.ydata)
            .map(|(&x, &y)| DVec2::new(x, y))
            .collect()
    }
}

/// A filled rectangle anchored at its lower-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub label: String,
}

/// A pie wedge; angles in degrees, counter-clockwise from +x
#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    pub center: DVec2,
    pub r: f64,
    pub theta1: f64,
    pub theta2: f64,
    pub color: String,
    pub label: String,
}

/// A scatter point cloud
#[derive(Debug, Clone, PartialEq)]
pub struct PathCollection {
    pub offsets: Vec<DVec2>,
    /// Scalar per point mapped through the colormap
    pub array: Option<Vec<f64>>,
    pub color: String,
    pub size: f64,
    pub label: String,
}

/// An arbitrary filled path (box-plot bodies, custom polygons)
#[derive(Debug, Clone, PartialEq)]
pub struct PathPatch {
    pub vertices: Vec<DVec2>,
    pub facecolor: String,
    pub label: String,
}

/// Horizontal anchoring of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

/// A text run placed in data coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub position: DVec2,
    pub content: String,
    pub anchor: TextAnchor,
}

/// Drop shadow drawn under another patch
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub offset: DVec2,
    pub source: Box<Artist>,
}

/// The color ramp of a colorbar axes
#[derive(Debug, Clone, PartialEq)]
pub struct ColorbarSolids {
    pub vmin: f64,
    pub vmax: f64,
}

/// Anything an axes can draw, in drawing order
#[derive(Debug, Clone, PartialEq)]
pub enum Artist {
    Line2D(Line2D),
    Rectangle(Rectangle),
    Wedge(Wedge),
    PathCollection(PathCollection),
    PathPatch(PathPatch),
    Text(Text),
    Shadow(Shadow),
    ColorbarSolids(ColorbarSolids),
}

impl Artist {
    /// The artist's class name, as reported to introspection
    pub fn type_name(&self) -> &'static str {
        match self {
            Artist::Line2D(_) => "Line2D",
            Artist::Rectangle(_) => "Rectangle",
            Artist::Wedge(_) => "Wedge",
            Artist::PathCollection(_) => "PathCollection",
            Artist::PathPatch(_) => "PathPatch",
            Artist::Text(_) => "Text",
            Artist::Shadow(_) => "Shadow",
            Artist::ColorbarSolids(_) => "ColorbarSolids",
        }
    }

    /// Legend label, if the artist carries a user-visible one
    pub fn legend_label(&self) -> Option<&str> {
        let label = match self {
            Artist::Line2D(l) => &l.label,
            Artist::Rectangle(r) => &r.label,
            Artist::PathCollection(c) => &c.label,
            Artist::PathPatch(p) => &p.label,
            Artist::Wedge(w) => &w.label,
            _ => return None,
        };
        if label.is_empty() || label.starts_with('_') {
            None
        } else {
            Some(label)
        }
    }

    /// Extent in data coordinates. Coordinates given in axes fraction and
    /// artists that do not participate in autoscaling contribute nothing.
    pub fn data_bounds(&self) -> Bounds {
        let mut b = Bounds::empty();
        match self {
            Artist::Line2D(l) => {
                for (&x, &y) in l.xdata.iter().zip(&l.ydata) {
                    let x = if l.x_coords == XCoords::Data { x } else { f64::NAN };
                    let y = if l.y_coords == YCoords::Data { y } else { f64::NAN };
                    b.expand(DVec2::new(x, y));
                }
            }
            Artist::Rectangle(r) => {
                b.expand(DVec2::new(r.x, r.y));
                b.expand(DVec2::new(r.x + r.width, r.y + r.height));
            }
            Artist::Wedge(w) => {
                b.expand(w.center - DVec2::splat(w.r));
                b.expand(w.center + DVec2::splat(w.r));
            }
            Artist::PathCollection(c) => {
                for p in &c.offsets {
                    b.expand(*p);
                }
            }
            Artist::PathPatch(p) => {
                for v in &p.vertices {
                    b.expand(*v);
                }
            }
            Artist::Text(_) | Artist::Shadow(_) | Artist::ColorbarSolids(_) => {}
        }
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_lines_do_not_autoscale_their_fraction_axis() {
        let mut line = Line2D::new(vec![0.0, 1.0], vec![3.0, 3.0], "k", "_axhline");
        line.x_coords = XCoords::AxesFraction;
        let b = Artist::Line2D(line).data_bounds();
        assert!(b.min.x.is_infinite());
        assert_eq!(b.min.y, 3.0);
    }

    #[test]
    fn auto_labels_are_not_legend_labels() {
        let line = Artist::Line2D(Line2D::new(vec![], vec![], "k", "_child0"));
        assert_eq!(line.legend_label(), None);
        let line = Artist::Line2D(Line2D::new(vec![], vec![], "k", "sales"));
        assert_eq!(line.legend_label(), Some("sales"));
    }

    #[test]
    fn style_codes() {
        assert_eq!(LineStyle::from_code("--"), Some(LineStyle::Dashed));
        assert_eq!(LineStyle::from_code(""), Some(LineStyle::None));
        assert_eq!(Marker::from_code("o"), Some(Marker::Circle));
        assert_eq!(Marker::from_code("?"), None);
    }
}
