//! Canonical chart records: the chart-type taxonomy, per-type elements and
//! the record that is serialized into an artifact.

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Chart-type taxonomy. Anything outside it is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Scatter,
    Bar,
    Pie,
    BoxAndWhisker,
    Composite,
    Unknown,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::BoxAndWhisker => "box_and_whisker",
            ChartType::Composite => "composite",
            ChartType::Unknown => "unknown",
        }
    }

    /// Chart type implied by a subplot title, checked in a fixed order so
    /// "Bar vs line" hints a bar chart.
    pub fn hinted_by(title: &str) -> Option<ChartType> {
        let title = title.to_lowercase();
        if title.contains("pie") {
            Some(ChartType::Pie)
        } else if title.contains("bar") {
            Some(ChartType::Bar)
        } else if title.contains("box") || title.contains("whisker") {
            Some(ChartType::BoxAndWhisker)
        } else if title.contains("scatter") {
            Some(ChartType::Scatter)
        } else if title.contains("line") {
            Some(ChartType::Line)
        } else {
            None
        }
    }

    /// Types that carry axis labels and units
    fn has_axes(self) -> bool {
        matches!(
            self,
            ChartType::Line | ChartType::Scatter | ChartType::Bar | ChartType::BoxAndWhisker
        )
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Elements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineElement {
    pub label: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterElement {
    pub label: String,
    pub points: Vec<[f64; 2]>,
    /// Per-point color scalars, parallel to `points`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarElement {
    pub label: String,
    pub group: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSliceElement {
    pub label: String,
    /// Sweep in degrees
    pub angle: f64,
    pub radius: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStatElement {
    pub label: String,
    pub min: f64,
    pub first_quartile: f64,
    pub median: f64,
    pub third_quartile: f64,
    pub max: f64,
    pub outliers: Vec<f64>,
}

/// Homogeneous element list of one chart type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Elements {
    Line(Vec<LineElement>),
    Scatter(Vec<ScatterElement>),
    Bar(Vec<BarElement>),
    Pie(Vec<PieSliceElement>),
    BoxAndWhisker(Vec<BoxStatElement>),
}

impl Elements {
    pub fn len(&self) -> usize {
        match self {
            Elements::Line(v) => v.len(),
            Elements::Scatter(v) => v.len(),
            Elements::Bar(v) => v.len(),
            Elements::Pie(v) => v.len(),
            Elements::BoxAndWhisker(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Record
// ============================================================================

/// Everything known about one chart (a subplot or a whole figure)
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRecord {
    pub chart_type: ChartType,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_unit: Option<String>,
    pub y_unit: Option<String>,
    pub x_scale: Option<String>,
    pub y_scale: Option<String>,
    pub x_ticks: Option<Vec<f64>>,
    pub x_tick_labels: Option<Vec<String>>,
    pub y_ticks: Option<Vec<f64>>,
    pub y_tick_labels: Option<Vec<String>>,
    pub elements: Option<Elements>,
    /// Base64 PNG
    pub png: Option<String>,
    /// Per-subplot records of a composite chart
    pub subplots: Option<Vec<ChartRecord>>,
}

impl ChartRecord {
    pub fn new(chart_type: ChartType) -> Self {
        Self {
            chart_type,
            title: None,
            x_label: None,
            y_label: None,
            x_unit: None,
            y_unit: None,
            x_scale: None,
            y_scale: None,
            x_ticks: None,
            x_tick_labels: None,
            y_ticks: None,
            y_tick_labels: None,
            elements: None,
            png: None,
            subplots: None,
        }
    }

    pub fn composite(title: Option<String>, png: String, subplots: Vec<ChartRecord>) -> Self {
        Self {
            title,
            png: Some(png),
            subplots: Some(subplots),
            ..Self::new(ChartType::Composite)
        }
    }
}

impl Serialize for ChartRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &record.chart_type)?;
        match &self.title {
            Some(title) => map.serialize_entry("title", title)?,
            // a composite always reports its title slot
            None if self.chart_type == ChartType::Composite => {
                map.serialize_entry("title", &None::<String>)?
            }
            None => {}
        }

        macro_rules! optional {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &record.$field {
                        map.serialize_entry(stringify!($field), value)?;
                    }
                )*
            };
        }
        optional!(
            x_label,
            y_label,
            x_unit,
            y_unit,
            x_scale,
            y_scale,
            x_ticks,
            x_tick_labels,
            y_ticks,
            y_tick_labels,
        );
        if let Some(elements) = self.elements.as_ref().filter(|e| !e.is_empty()) {
            map.serialize_entry("elements", elements)?;
        }
        optional!(png, subplots);
        map.end()
    }
}

/// `repr`-style float: integral values keep one decimal
fn fmt_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else if v.is_nan() {
        "nan".to_string()
    } else {
        format!("{v}")
    }
}

fn fmt_opt(v: &Option<String>) -> String {
    match v {
        Some(s) => s.clone(),
        None => "None".to_string(),
    }
}

fn fmt_list<T>(items: &[T], f: impl Fn(&T) -> String) -> String {
    let inner: Vec<String> = items.iter().map(f).collect();
    format!("[{}]", inner.join(", "))
}

fn fmt_opt_list<T>(items: &Option<Vec<T>>, f: impl Fn(&T) -> String) -> String {
    match items {
        Some(items) => fmt_list(items, f),
        None => "None".to_string(),
    }
}

fn fmt_points(points: &[[f64; 2]]) -> String {
    fmt_list(points, |p| format!("[{}, {}]", fmt_float(p[0]), fmt_float(p[1])))
}

fn quoted(s: &String) -> String {
    format!("'{s}'")
}

/// Text summary of a chart, one `field: value` per line
impl fmt::Display for ChartRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "type: {}", self.chart_type)?;
        writeln!(f, "title: {}", fmt_opt(&self.title))?;

        if self.chart_type.has_axes() {
            writeln!(f, "x_label: {}", fmt_opt(&self.x_label))?;
            writeln!(f, "y_label: {}", fmt_opt(&self.y_label))?;
            writeln!(f, "x_unit: {}", fmt_opt(&self.x_unit))?;
            writeln!(f, "y_unit: {}", fmt_opt(&self.y_unit))?;
        }

        if matches!(self.chart_type, ChartType::Line | ChartType::Scatter) {
            writeln!(f, "x_ticks: {}", fmt_opt_list(&self.x_ticks, |v| fmt_float(*v)))?;
            writeln!(f, "x_tick_labels: {}", fmt_opt_list(&self.x_tick_labels, quoted))?;
            writeln!(f, "x_scale: {}", fmt_opt(&self.x_scale))?;
            writeln!(f, "y_ticks: {}", fmt_opt_list(&self.y_ticks, |v| fmt_float(*v)))?;
            writeln!(f, "y_tick_labels: {}", fmt_opt_list(&self.y_tick_labels, quoted))?;
            writeln!(f, "y_scale: {}", fmt_opt(&self.y_scale))?;
        }

        if self.chart_type == ChartType::Composite {
            writeln!(f, "elements:")?;
            for subplot in self.subplots.iter().flatten() {
                writeln!(f)?;
                writeln!(f, "* {subplot}")?;
            }
            return Ok(());
        }

        let Some(elements) = &self.elements else {
            return Ok(());
        };
        writeln!(f, "elements:")?;
        match elements {
            Elements::Line(items) => {
                for e in items {
                    writeln!(f)?;
                    writeln!(f, "* label: {}", e.label)?;
                    writeln!(f, "* points: {}", fmt_points(&e.points))?;
                }
            }
            Elements::Scatter(items) => {
                for e in items {
                    writeln!(f)?;
                    writeln!(f, "* label: {}", e.label)?;
                    writeln!(f, "* points: {}", fmt_points(&e.points))?;
                }
            }
            Elements::Bar(items) => {
                for e in items {
                    writeln!(f)?;
                    writeln!(f, "* label: {}", e.label)?;
                    writeln!(f, "* group: {}", e.group)?;
                    writeln!(f, "* value: {}", fmt_float(e.value))?;
                }
            }
            Elements::Pie(items) => {
                for e in items {
                    writeln!(f)?;
                    writeln!(f, "* label: {}", e.label)?;
                    writeln!(f, "* angle: {}", fmt_float(e.angle))?;
                    writeln!(f, "* radius: {}", fmt_float(e.radius))?;
                    writeln!(f, "* percent_label: {}", fmt_opt(&e.percent_label))?;
                }
            }
            Elements::BoxAndWhisker(items) => {
                for e in items {
                    writeln!(f)?;
                    writeln!(f, "* label: {}", e.label)?;
                    writeln!(f, "* min: {}", fmt_float(e.min))?;
                    writeln!(f, "* first_quartile: {}", fmt_float(e.first_quartile))?;
                    writeln!(f, "* median: {}", fmt_float(e.median))?;
                    writeln!(f, "* third_quartile: {}", fmt_float(e.third_quartile))?;
                    writeln!(f, "* max: {}", fmt_float(e.max))?;
                    writeln!(f, "* outliers: {}", fmt_list(&e.outliers, |v| fmt_float(*v)))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_hints_follow_precedence() {
        assert_eq!(ChartType::hinted_by("Bar vs Line"), Some(ChartType::Bar));
        assert_eq!(ChartType::hinted_by("PIE of shares"), Some(ChartType::Pie));
        assert_eq!(ChartType::hinted_by("Whiskers"), Some(ChartType::BoxAndWhisker));
        assert_eq!(ChartType::hinted_by("Timeline"), Some(ChartType::Line));
        assert_eq!(ChartType::hinted_by("Revenue"), None);
    }

    #[test]
    fn composite_always_has_title_slot() {
        let record = ChartRecord::composite(None, String::new(), vec![]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"type":"composite","title":null,"png":"","subplots":[]}"#);
    }

    #[test]
    fn empty_elements_are_omitted() {
        let mut record = ChartRecord::new(ChartType::Line);
        record.elements = Some(Elements::Line(vec![]));
        record.png = Some("abc".into());
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"type":"line","png":"abc"}"#);
    }

    #[test]
    fn elements_serialize_without_tags() {
        let elements = Elements::Bar(vec![BarElement {
            label: "Q1".into(),
            group: "revenue".into(),
            value: 3.5,
        }]);
        let json = serde_json::to_string(&elements).unwrap();
        assert_eq!(json, r#"[{"label":"Q1","group":"revenue","value":3.5}]"#);
    }

    #[test]
    fn display_lists_bar_elements() {
        let mut record = ChartRecord::new(ChartType::Bar);
        record.title = Some("Sales".into());
        record.elements = Some(Elements::Bar(vec![BarElement {
            label: "A".into(),
            group: "default".into(),
            value: 2.0,
        }]));
        let expected = "type: bar\n\
                        title: Sales\n\
                        x_label: None\n\
                        y_label: None\n\
                        x_unit: None\n\
                        y_unit: None\n\
                        elements:\n\
                        \n\
                        * label: A\n\
                        * group: default\n\
                        * value: 2.0\n";
        assert_eq!(record.to_string(), expected);
    }
}
