//! Neutral scene model: what a rendered subplot contains, independent of
//! the plotting library that drew it.
//!
//! The classifier and the extractors only ever see these types.

pub mod adapter;

use glam::DVec2;

pub use adapter::{figure_scene, subplot_scene};

use crate::figure::{FigureId, LineStyle, Marker};

/// A polyline primitive
#[derive(Debug, Clone, PartialEq)]
pub struct LinePrimitive {
    pub points: Vec<DVec2>,
    pub style: LineStyle,
    pub color: String,
    pub marker: Option<Marker>,
    pub label: Option<String>,
}

impl LinePrimitive {
    /// Two points sharing an x or a y coordinate
    pub fn is_gridline(&self) -> bool {
        match self.points.as_slice() {
            [a, b] => a.x == b.x || a.y == b.y,
            _ => false,
        }
    }

    /// Markers without connecting segments
    pub fn is_marker_only(&self) -> bool {
        self.marker.is_some() && self.style == LineStyle::None
    }

    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.x)
    }

    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.y)
    }
}

/// One atomic renderable object of a subplot
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line(LinePrimitive),
    /// Filled rectangle; `label` becomes the bar group
    Rectangle {
        x: f64,
        width: f64,
        height: f64,
        label: Option<String>,
    },
    /// Pie wedge, angles in degrees
    Wedge {
        theta_start: f64,
        theta_end: f64,
        radius: f64,
    },
    PointCloud {
        offsets: Vec<DVec2>,
        color_array: Option<Vec<f64>>,
        label: Option<String>,
    },
    ComplexPatch {
        path_vertices: Vec<DVec2>,
    },
    TextLabel {
        content: String,
    },
    Shadow,
}

impl Primitive {
    /// Text and shadows never take part in classification
    pub fn is_decoration(&self) -> bool {
        matches!(self, Primitive::TextLabel { .. } | Primitive::Shadow)
    }

    pub fn is_gridline(&self) -> bool {
        match self {
            Primitive::Line(line) => line.is_gridline(),
            _ => false,
        }
    }

    pub fn as_line(&self) -> Option<&LinePrimitive> {
        match self {
            Primitive::Line(line) => Some(line),
            _ => None,
        }
    }
}

/// Whether a label was generated by the library rather than the user
pub fn is_auto_label(label: Option<&str>) -> bool {
    match label {
        None => true,
        Some(l) => l.is_empty() || l.starts_with('_'),
    }
}

/// A tick position as read off the axis
#[derive(Debug, Clone, PartialEq)]
pub enum TickValue {
    Number(f64),
    Text(String),
}

/// Metadata of one axis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisMeta {
    pub label: String,
    pub scale: String,
    pub ticks: Vec<TickValue>,
    pub tick_labels: Vec<String>,
}

impl AxisMeta {
    /// Tick positions as numbers. If any tick cannot be read as a number the
    /// whole axis falls back to `0..N-1`.
    pub fn positions(&self) -> Vec<f64> {
        let coerced: Option<Vec<f64>> = self
            .ticks
            .iter()
            .map(|t| match t {
                TickValue::Number(v) => Some(*v),
                TickValue::Text(s) => s.trim().parse::<f64>().ok(),
            })
            .collect();
        coerced.unwrap_or_else(|| (0..self.ticks.len()).map(|i| i as f64).collect())
    }
}

/// Textual metadata of a subplot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubplotMeta {
    pub title: String,
    pub x: AxisMeta,
    pub y: AxisMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubplotKind {
    /// Classified and counted
    Data,
    /// Colorbar-like region; neither classified nor counted
    Auxiliary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubplotScene {
    /// Position among the figure's axes, auxiliary ones included
    pub index: usize,
    pub kind: SubplotKind,
    pub primitives: Vec<Primitive>,
    pub meta: SubplotMeta,
    /// Whether a legend was requested
    pub legend: bool,
}

impl SubplotScene {
    pub fn lines(&self) -> impl Iterator<Item = &LinePrimitive> {
        self.primitives.iter().filter_map(Primitive::as_line)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::TextLabel { content } => Some(content.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FigureScene {
    pub id: FigureId,
    pub suptitle: Option<String>,
    pub subplots: Vec<SubplotScene>,
}

impl FigureScene {
    pub fn data_subplots(&self) -> impl Iterator<Item = &SubplotScene> {
        self.subplots.iter().filter(|s| s.kind == SubplotKind::Data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    fn line(points: &[(f64, f64)]) -> LinePrimitive {
        LinePrimitive {
            points: points.iter().map(|&(x, y)| dvec2(x, y)).collect(),
            style: LineStyle::Solid,
            color: "k".into(),
            marker: None,
            label: None,
        }
    }

    #[test]
    fn gridlines_share_a_coordinate() {
        assert!(line(&[(0.0, 0.0), (0.0, 5.0)]).is_gridline());
        assert!(line(&[(0.0, 2.0), (7.0, 2.0)]).is_gridline());
        assert!(!line(&[(0.0, 0.0), (3.0, 4.0)]).is_gridline());
        assert!(!line(&[(0.0, 0.0), (0.0, 5.0), (0.0, 6.0)]).is_gridline());
    }

    #[test]
    fn tick_coercion_falls_back_to_indices() {
        let axis = AxisMeta {
            ticks: vec![TickValue::Number(2.5), TickValue::Text("7".into())],
            ..Default::default()
        };
        assert_eq!(axis.positions(), vec![2.5, 7.0]);
        let axis = AxisMeta {
            ticks: vec![TickValue::Number(2.5), TickValue::Text("Mon".into())],
            ..Default::default()
        };
        assert_eq!(axis.positions(), vec![0.0, 1.0]);
    }

    #[test]
    fn auto_labels() {
        assert!(is_auto_label(None));
        assert!(is_auto_label(Some("_child3")));
        assert!(is_auto_label(Some("")));
        assert!(!is_auto_label(Some("revenue")));
    }
}
