//! Metadata assembly: per-subplot records and the figure-level record.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::chart::{ChartRecord, ChartType, Elements};
use crate::classify::classify;
use crate::extract::extract;
use crate::figure::Figure;
use crate::log::{debug, warn};
use crate::raster::{RasterizedFigure, RenderOptions, rasterize};
use crate::rerender::subplot_png;
use crate::scene::{AxisMeta, SubplotScene, figure_scene};

/// Unit reported for axes whose label carries none
pub const NO_UNIT: &str = "None";

/// First parenthesized part of an axis label, e.g. `"Time (s)"` → `"s"`
pub fn axis_unit(label: &str) -> String {
    static UNIT: OnceLock<Option<Regex>> = OnceLock::new();
    UNIT.get_or_init(|| Regex::new(r"\(([^)]+)\)").ok())
        .as_ref()
        .and_then(|re| re.captures(label))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NO_UNIT.to_string())
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Run one extractor; failures are reported and yield nothing
fn try_extract(chart_type: ChartType, scene: &SubplotScene) -> Option<Elements> {
    match extract(chart_type, scene) {
        Ok(elements) => elements.filter(|e| !e.is_empty()),
        Err(err) => {
            warn!("Error extracting {} data from subplot {}: {}", chart_type, scene.index, err);
            None
        }
    }
}

/// Classify and extract, falling back to the type the title hints at when
/// the structure is inconclusive
pub fn classify_and_extract(scene: &SubplotScene) -> (ChartType, Option<Elements>) {
    let structural = classify(scene);
    let elements = try_extract(structural, scene);
    if elements.is_some() && structural != ChartType::Unknown {
        return (structural, elements);
    }
    if let Some(hint) = ChartType::hinted_by(&scene.meta.title).filter(|h| *h != structural) {
        if let Some(hinted) = try_extract(hint, scene) {
            debug!(subplot = scene.index, hint = hint.as_str(), "title hint adopted");
            return (hint, Some(hinted));
        }
    }
    (structural, elements)
}

fn apply_axis(record: &mut ChartRecord, x: &AxisMeta, y: &AxisMeta) {
    record.x_label = non_empty(&x.label);
    record.y_label = non_empty(&y.label);
    record.x_unit = Some(axis_unit(&x.label));
    record.y_unit = Some(axis_unit(&y.label));
    record.x_scale = Some(x.scale.clone());
    record.y_scale = Some(y.scale.clone());
    record.x_ticks = Some(x.positions());
    record.x_tick_labels = Some(x.tick_labels.clone());
    record.y_ticks = Some(y.positions());
    record.y_tick_labels = Some(y.tick_labels.clone());
}

/// Record of one data subplot, without an image
pub fn subplot_record(scene: &SubplotScene) -> ChartRecord {
    let (chart_type, elements) = classify_and_extract(scene);
    let mut record = ChartRecord::new(chart_type);
    record.title = non_empty(&scene.meta.title);
    apply_axis(&mut record, &scene.meta.x, &scene.meta.y);
    record.elements = elements;
    record
}

/// Record of a whole figure: a single subplot's record, a composite of
/// several, or `unknown` when nothing was plotted
pub fn assemble(figure: &Figure, options: &RenderOptions) -> ChartRecord {
    let scene = figure_scene(figure);
    let raster: Option<RasterizedFigure> = match rasterize(figure, options) {
        Ok(raster) => Some(raster),
        Err(err) => {
            warn!("Error rendering figure {}: {}", figure.number, err);
            None
        }
    };
    let png = raster.as_ref().map(RasterizedFigure::to_base64).unwrap_or_default();

    let data: Vec<&SubplotScene> = scene.data_subplots().collect();
    debug!(figure = figure.number, subplots = data.len(), "assembling");
    match data.as_slice() {
        [] => ChartRecord {
            png: Some(png),
            ..ChartRecord::new(ChartType::Unknown)
        },
        [only] => ChartRecord {
            png: Some(png),
            ..subplot_record(only)
        },
        many => {
            let subplots = many
                .iter()
                .map(|subplot| {
                    let mut record = subplot_record(subplot);
                    match subplot_png(figure, subplot, &record, raster.as_ref(), options) {
                        Ok(png) => record.png = Some(png),
                        Err(err) => warn!("Error re-rendering subplot {}: {}", subplot.index, err),
                    }
                    record
                })
                .collect();
            ChartRecord::composite(scene.suptitle.clone(), png, subplots)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{scene, title_slots};
    use crate::scene::{Primitive, TickValue};
    use glam::dvec2;

    #[test]
    fn units_come_from_parentheses() {
        assert_eq!(axis_unit("Time (s)"), "s");
        assert_eq!(axis_unit("Revenue (USD) (millions)"), "USD");
        assert_eq!(axis_unit("Count"), NO_UNIT);
        assert_eq!(axis_unit("Empty ()"), NO_UNIT);
    }

    #[test]
    fn title_hint_rescues_unknown_structure() {
        // a lone rectangle next to a patch is neither bar nor box structurally
        let mut prims = vec![
            Primitive::Rectangle {
                x: 0.0,
                width: 1.0,
                height: 3.0,
                label: Some("sales".into()),
            },
            Primitive::PointCloud {
                offsets: vec![dvec2(0.0, 0.0)],
                color_array: None,
                label: None,
            },
        ];
        prims.extend(title_slots());
        let mut s = scene(prims);
        assert_eq!(classify_and_extract(&s).0, ChartType::Unknown);
        s.meta.title = "Quarterly bar summary".into();
        let (chart_type, elements) = classify_and_extract(&s);
        assert_eq!(chart_type, ChartType::Bar);
        assert_eq!(elements.map(|e| e.len()), Some(1));
    }

    #[test]
    fn hint_without_elements_keeps_structure() {
        let mut s = scene(title_slots());
        s.meta.title = "pie".into();
        assert_eq!(classify_and_extract(&s), (ChartType::Unknown, None));
    }

    #[test]
    fn record_carries_axis_metadata() {
        let mut s = scene(vec![]);
        s.meta.title = "Speed".into();
        s.meta.x.label = "Time (s)".into();
        s.meta.x.scale = "linear".into();
        s.meta.x.ticks = vec![TickValue::Text("a".into()), TickValue::Number(1.0)];
        s.meta.x.tick_labels = vec!["a".into(), "1".into()];
        let record = subplot_record(&s);
        assert_eq!(record.title.as_deref(), Some("Speed"));
        assert_eq!(record.x_unit.as_deref(), Some("s"));
        assert_eq!(record.y_unit.as_deref(), Some(NO_UNIT));
        assert_eq!(record.y_label, None);
        assert_eq!(record.x_ticks, Some(vec![0.0, 1.0]));
    }
}
