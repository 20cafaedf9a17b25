//! Per-subplot images for composite figures.
//!
//! Each data subplot is redrawn on its own figure from its extracted
//! elements. Box plots are not reconstructed; their image is cut out of the
//! whole-figure raster instead.

use crate::chart::{ChartRecord, ChartType, Elements};
use crate::errors::{PlotError, RenderError};
use crate::extract::{DEFAULT_GROUP, is_bar_artifact};
use crate::figure::{
    Axes, BarOptions, Figure, GridCell, LineOptions, PieOptions, Scale, ScatterOptions, Tick,
};
use crate::log::debug;
use crate::raster::{RasterizedFigure, RenderOptions, encode_base64, rasterize};
use crate::scene::SubplotScene;

/// Slices narrower than this many degrees are dropped when redrawing a pie
const MIN_SLICE_ANGLE: f64 = 1.0;

/// Base64 PNG for one data subplot of a composite figure
pub fn subplot_png(
    figure: &Figure,
    subplot: &SubplotScene,
    record: &ChartRecord,
    whole: Option<&RasterizedFigure>,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    match record.chart_type {
        ChartType::Line | ChartType::Scatter | ChartType::Bar | ChartType::Pie => {
            let isolated = rebuild(record, subplot.legend, options)?;
            let raster = rasterize(&isolated, options)?;
            Ok(raster.to_base64())
        }
        ChartType::BoxAndWhisker | ChartType::Unknown | ChartType::Composite => {
            let whole = whole.ok_or(RenderError::MissingRegion { index: subplot.index })?;
            debug!(figure = figure.number, subplot = subplot.index, "cropping subplot");
            whole.crop(subplot.index).map(|png| encode_base64(&png))
        }
    }
}

/// A fresh single-axes figure reconstructed from a record's elements
pub fn rebuild(record: &ChartRecord, legend: bool, options: &RenderOptions) -> Result<Figure, PlotError> {
    let (w, h) = options.subplot_figsize;
    let mut figure = Figure::new(0).with_size(w, h);
    let axes = figure.gca();

    copy_metadata(record, axes);
    match &record.elements {
        Some(Elements::Bar(bars)) => {
            let bars: Vec<_> = bars.iter().filter(|b| !is_bar_artifact(b)).collect();
            if bars.is_empty() {
                axes.xaxis.ticks = Some(Vec::new());
                axes.xaxis.limits = Some((0.0, 1.0));
                axes.yaxis.limits = Some((0.0, 1.0));
                axes.text(0.5, 0.5, "No valid data");
            } else {
                // one call per group keeps a legend entry per group
                let mut groups: Vec<&str> = Vec::new();
                for bar in &bars {
                    if !groups.contains(&bar.group.as_str()) {
                        groups.push(&bar.group);
                    }
                }
                for group in groups {
                    let (positions, heights): (Vec<Tick>, Vec<f64>) = bars
                        .iter()
                        .enumerate()
                        .filter(|(_, b)| b.group == group)
                        .map(|(i, b)| (Tick::Value(i as f64), b.value))
                        .unzip();
                    let label = (group != DEFAULT_GROUP).then(|| group.to_string());
                    axes.bar(positions, heights, BarOptions { label, ..Default::default() })?;
                }
                axes.xaxis.ticks = Some((0..bars.len()).map(|i| Tick::Value(i as f64)).collect());
                axes.xaxis.tick_labels = Some(bars.iter().map(|b| b.label.clone()).collect());
                axes.xaxis.limits = Some((-0.5, bars.len() as f64 - 0.5));
            }
        }
        Some(Elements::Scatter(clouds)) => {
            for cloud in clouds {
                let (x, y) = cloud.points.iter().map(|p| (p[0], p[1])).unzip();
                axes.scatter(
                    x,
                    y,
                    ScatterOptions {
                        label: Some(cloud.label.clone()),
                        c: cloud.colors.clone(),
                        ..Default::default()
                    },
                )?;
            }
        }
        Some(Elements::Line(lines)) => {
            for line in lines {
                let (x, y) = line.points.iter().map(|p| (p[0], p[1])).unzip();
                axes.plot(
                    x,
                    y,
                    LineOptions {
                        label: Some(line.label.clone()),
                        ..Default::default()
                    },
                )?;
            }
        }
        Some(Elements::Pie(slices)) => {
            let wide: Vec<_> = slices.iter().filter(|s| s.angle > MIN_SLICE_ANGLE).collect();
            let kept: Vec<_> = if wide.is_empty() { slices.iter().collect() } else { wide };
            let values: Vec<f64> = kept.iter().map(|s| s.angle.max(0.0)).collect();
            let labels: Vec<String> = kept.iter().map(|s| s.label.clone()).collect();
            axes.pie(
                values,
                PieOptions {
                    labels: Some(labels),
                    autopct: Some("%1.1f%%".to_string()),
                    ..Default::default()
                },
            )?;
        }
        Some(Elements::BoxAndWhisker(_)) | None => {}
    }
    axes.legend = legend;
    Ok(figure)
}

/// Title, axis labels, scales and ticks of the source subplot
fn copy_metadata(record: &ChartRecord, axes: &mut Axes) {
    axes.cell = GridCell::SINGLE;
    axes.title = record.title.clone().unwrap_or_default();
    axes.xaxis.label = record.x_label.clone().unwrap_or_default();
    axes.yaxis.label = record.y_label.clone().unwrap_or_default();
    axes.xaxis.scale = record.x_scale.as_deref().and_then(Scale::parse).unwrap_or_default();
    axes.yaxis.scale = record.y_scale.as_deref().and_then(Scale::parse).unwrap_or_default();
    if matches!(record.chart_type, ChartType::Line | ChartType::Scatter) {
        if let (Some(ticks), Some(labels)) = (&record.x_ticks, &record.x_tick_labels) {
            axes.xaxis.ticks = Some(ticks.iter().map(|v| Tick::Value(*v)).collect());
            axes.xaxis.tick_labels = Some(labels.clone());
        }
        if let (Some(ticks), Some(labels)) = (&record.y_ticks, &record.y_tick_labels) {
            axes.yaxis.ticks = Some(ticks.iter().map(|v| Tick::Value(*v)).collect());
            axes.yaxis.tick_labels = Some(labels.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{BarElement, PieSliceElement};
    use crate::figure::Artist;

    fn options() -> RenderOptions {
        RenderOptions {
            load_system_fonts: false,
            ..Default::default()
        }
    }

    fn bar(label: &str, group: &str, value: f64) -> BarElement {
        BarElement {
            label: label.into(),
            group: group.into(),
            value,
        }
    }

    #[test]
    fn bars_are_redrawn_without_artifacts() {
        let mut record = ChartRecord::new(ChartType::Bar);
        record.title = Some("Sales".into());
        record.elements = Some(Elements::Bar(vec![
            bar("Mon", "default", 3.0),
            bar("Bar 2", "default", 1.0),
            bar("Wed", "default", 5.0),
        ]));
        let fig = rebuild(&record, false, &options()).unwrap();
        assert_eq!(fig.size, (8.0, 6.0));
        let axes = &fig.axes[0];
        assert_eq!(axes.title, "Sales");
        let rects = axes.artists.iter().filter(|a| matches!(a, Artist::Rectangle(_))).count();
        assert_eq!(rects, 2);
        assert_eq!(axes.xaxis.tick_labels, Some(vec!["Mon".to_string(), "Wed".to_string()]));
        assert_eq!(axes.xaxis.limits, Some((-0.5, 1.5)));
    }

    #[test]
    fn empty_bars_get_a_note() {
        let mut record = ChartRecord::new(ChartType::Bar);
        record.elements = Some(Elements::Bar(vec![bar("Bar 1", "default", 1.0)]));
        let fig = rebuild(&record, false, &options()).unwrap();
        assert!(fig.axes[0]
            .artists
            .iter()
            .any(|a| matches!(a, Artist::Text(t) if t.content == "No valid data")));
    }

    #[test]
    fn thin_slices_are_dropped() {
        let slice = |label: &str, angle: f64| PieSliceElement {
            label: label.into(),
            angle,
            radius: 1.0,
            percent_label: None,
        };
        let mut record = ChartRecord::new(ChartType::Pie);
        record.elements = Some(Elements::Pie(vec![slice("big", 359.5), slice("sliver", 0.5)]));
        let fig = rebuild(&record, false, &options()).unwrap();
        let wedges = fig.axes[0].artists.iter().filter(|a| matches!(a, Artist::Wedge(_))).count();
        assert_eq!(wedges, 1);

        record.elements = Some(Elements::Pie(vec![slice("a", 0.5), slice("b", 0.5)]));
        let fig = rebuild(&record, false, &options()).unwrap();
        let wedges = fig.axes[0].artists.iter().filter(|a| matches!(a, Artist::Wedge(_))).count();
        assert_eq!(wedges, 2, "all-thin pies are kept whole");
    }

    #[test]
    fn degenerate_pies_fail_to_redraw() {
        let mut record = ChartRecord::new(ChartType::Pie);
        record.elements = Some(Elements::Pie(vec![PieSliceElement {
            label: "empty".into(),
            angle: 0.0,
            radius: 1.0,
            percent_label: None,
        }]));
        assert!(rebuild(&record, false, &options()).is_err());

        let figure = Figure::new(1);
        let subplot = SubplotScene {
            index: 0,
            kind: crate::scene::SubplotKind::Data,
            primitives: vec![],
            meta: Default::default(),
            legend: false,
        };
        assert!(matches!(
            subplot_png(&figure, &subplot, &record, None, &options()),
            Err(RenderError::Plot(_))
        ));
    }

    #[test]
    fn box_plots_need_the_whole_figure() {
        let figure = Figure::new(1);
        let record = ChartRecord::new(ChartType::BoxAndWhisker);
        let subplot = SubplotScene {
            index: 0,
            kind: crate::scene::SubplotKind::Data,
            primitives: vec![],
            meta: Default::default(),
            legend: false,
        };
        assert!(matches!(
            subplot_png(&figure, &subplot, &record, None, &options()),
            Err(RenderError::MissingRegion { index: 0 })
        ));
    }
}
