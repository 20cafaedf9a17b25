//! Chart-type extractors: turn a classified subplot's primitives into the
//! canonical element list of its type.

mod bar;
mod boxplot;
mod line;
mod pie;
mod scatter;

use enum_dispatch::enum_dispatch;

pub use bar::{BarExtractor, DEFAULT_GROUP, is_bar_artifact};
pub use boxplot::BoxExtractor;
pub use line::LineExtractor;
pub use pie::PieExtractor;
pub use scatter::ScatterExtractor;

use crate::chart::{ChartType, Elements};
use crate::errors::ExtractError;
use crate::scene::SubplotScene;

/// One extraction algorithm
#[enum_dispatch]
pub trait Extract {
    fn extract(&self, scene: &SubplotScene) -> Result<Elements, ExtractError>;
}

#[enum_dispatch(Extract)]
#[derive(Debug, Clone, Copy)]
pub enum Extractor {
    LineExtractor,
    ScatterExtractor,
    BarExtractor,
    PieExtractor,
    BoxExtractor,
}

impl Extractor {
    /// The extractor for a chart type; `None` for types without elements
    pub fn for_chart(chart_type: ChartType) -> Option<Extractor> {
        match chart_type {
            ChartType::Line => Some(LineExtractor.into()),
            ChartType::Scatter => Some(ScatterExtractor.into()),
            ChartType::Bar => Some(BarExtractor.into()),
            ChartType::Pie => Some(PieExtractor.into()),
            ChartType::BoxAndWhisker => Some(BoxExtractor.into()),
            ChartType::Composite | ChartType::Unknown => None,
        }
    }
}

/// Run the extractor for `chart_type`. Types without an extractor yield an
/// empty list.
pub fn extract(chart_type: ChartType, scene: &SubplotScene) -> Result<Option<Elements>, ExtractError> {
    match Extractor::for_chart(chart_type) {
        Some(extractor) => extractor.extract(scene).map(Some),
        None => Ok(None),
    }
}

/// Label a primitive: its own label, or `"{prefix} {n}"` when it has none or
/// the library generated it.
pub(crate) fn label_or(label: Option<&str>, prefix: &str, n: usize) -> String {
    match label {
        Some(l) if !crate::scene::is_auto_label(Some(l)) => l.to_string(),
        _ => format!("{prefix} {n}"),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use glam::dvec2;

    use crate::figure::{LineStyle, Marker};
    use crate::scene::{AxisMeta, LinePrimitive, Primitive, SubplotKind, SubplotMeta, SubplotScene, TickValue};

    pub fn scene(primitives: Vec<Primitive>) -> SubplotScene {
        SubplotScene {
            index: 0,
            kind: SubplotKind::Data,
            primitives,
            meta: SubplotMeta::default(),
            legend: false,
        }
    }

    pub fn with_x_ticks(mut scene: SubplotScene, ticks: &[(f64, &str)]) -> SubplotScene {
        scene.meta.x = AxisMeta {
            ticks: ticks.iter().map(|(v, _)| TickValue::Number(*v)).collect(),
            tick_labels: ticks.iter().map(|(_, l)| l.to_string()).collect(),
            ..Default::default()
        };
        scene
    }

    pub fn line(points: &[(f64, f64)], label: Option<&str>) -> Primitive {
        Primitive::Line(LinePrimitive {
            points: points.iter().map(|&(x, y)| dvec2(x, y)).collect(),
            style: LineStyle::Solid,
            color: "C0".into(),
            marker: None,
            label: label.map(str::to_string),
        })
    }

    pub fn markers(points: &[(f64, f64)]) -> Primitive {
        Primitive::Line(LinePrimitive {
            points: points.iter().map(|&(x, y)| dvec2(x, y)).collect(),
            style: LineStyle::None,
            color: "k".into(),
            marker: Some(Marker::Circle),
            label: None,
        })
    }

    pub fn title_slots() -> Vec<Primitive> {
        vec![
            Primitive::TextLabel { content: String::new() },
            Primitive::TextLabel { content: String::new() },
            Primitive::TextLabel { content: String::new() },
        ]
    }
}
