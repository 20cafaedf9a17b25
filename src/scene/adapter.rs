//! Translate the plotting library's artists into neutral primitives.

use glam::{DVec2, dvec2};

use crate::figure::{Artist, Axes, Figure, Scale, Tick, XCoords, YCoords};
use crate::log::debug;

use super::{AxisMeta, FigureScene, LinePrimitive, Primitive, SubplotKind, SubplotMeta, SubplotScene, TickValue};

/// Scene of every axes of `figure`, auxiliary ones included
pub fn figure_scene(figure: &Figure) -> FigureScene {
    let subplots = figure
        .axes
        .iter()
        .enumerate()
        .map(|(index, axes)| subplot_scene(index, axes))
        .collect();
    FigureScene {
        id: figure.number,
        suptitle: figure.suptitle.clone().filter(|s| !s.is_empty()),
        subplots,
    }
}

pub fn subplot_scene(index: usize, axes: &Axes) -> SubplotScene {
    let kind = if is_auxiliary(axes) {
        SubplotKind::Auxiliary
    } else {
        SubplotKind::Data
    };
    let (xlim, ylim) = axes.view_limits();

    let mut primitives: Vec<Primitive> = axes
        .artists
        .iter()
        .filter_map(|artist| primitive(artist, xlim, ylim, axes))
        .collect();

    if axes.grid {
        for x in axes.xaxis.tick_positions(xlim) {
            primitives.push(gridline(dvec2(x, ylim.0), dvec2(x, ylim.1)));
        }
        for y in axes.yaxis.tick_positions(ylim) {
            primitives.push(gridline(dvec2(xlim.0, y), dvec2(xlim.1, y)));
        }
    }

    // title slots: center, left, right
    primitives.push(Primitive::TextLabel {
        content: axes.title.clone(),
    });
    primitives.push(Primitive::TextLabel { content: String::new() });
    primitives.push(Primitive::TextLabel { content: String::new() });

    debug!(index, count = primitives.len(), "adapted subplot");

    SubplotScene {
        index,
        kind,
        primitives,
        meta: SubplotMeta {
            title: axes.title.clone(),
            x: axis_meta(&axes.xaxis, xlim),
            y: axis_meta(&axes.yaxis, ylim),
        },
        legend: axes.legend,
    }
}

/// Colorbar-like regions: a fixed box aspect, a link to a parent axes, or a
/// child whose type name mentions a colorbar
fn is_auxiliary(axes: &Axes) -> bool {
    axes.box_aspect.is_some()
        || axes.colorbar_for.is_some()
        || axes
            .artists
            .iter()
            .any(|a| a.type_name().to_lowercase().contains("colorbar"))
}

fn axis_meta(axis: &crate::figure::Axis, limits: (f64, f64)) -> AxisMeta {
    let (ticks, tick_labels) = axis.resolved_ticks(limits);
    let ticks = ticks
        .iter()
        .enumerate()
        .map(|(i, t)| match t {
            Tick::Value(v) => TickValue::Number(*v),
            // categorical ticks sit at their index
            Tick::Category(_) => TickValue::Number(i as f64),
        })
        .collect();
    AxisMeta {
        label: axis.label.clone(),
        scale: axis.scale.as_str().to_string(),
        ticks,
        tick_labels,
    }
}

fn gridline(a: DVec2, b: DVec2) -> Primitive {
    Primitive::Line(LinePrimitive {
        points: vec![a, b],
        style: crate::figure::LineStyle::Solid,
        color: "#b0b0b0".to_string(),
        marker: None,
        label: None,
    })
}

/// Map an axes-fraction coordinate onto the view limits
fn from_fraction(f: f64, limits: (f64, f64), scale: Scale) -> f64 {
    match scale {
        Scale::Log if limits.0 > 0.0 && limits.1 > 0.0 => limits.0 * (limits.1 / limits.0).powf(f),
        _ => limits.0 + (limits.1 - limits.0) * f,
    }
}

fn label_of(label: &str) -> Option<String> {
    if label.is_empty() { None } else { Some(label.to_string()) }
}

fn primitive(artist: &Artist, xlim: (f64, f64), ylim: (f64, f64), axes: &Axes) -> Option<Primitive> {
    let p = match artist {
        Artist::Line2D(line) => {
            let points = line
                .points()
                .into_iter()
                .map(|p| {
                    let x = match line.x_coords {
                        XCoords::Data => p.x,
                        XCoords::AxesFraction => from_fraction(p.x, xlim, axes.xaxis.scale),
                    };
                    let y = match line.y_coords {
                        YCoords::Data => p.y,
                        YCoords::AxesFraction => from_fraction(p.y, ylim, axes.yaxis.scale),
                    };
                    dvec2(x, y)
                })
                .collect();
            Primitive::Line(LinePrimitive {
                points,
                style: line.linestyle,
                color: line.color.clone(),
                marker: line.marker,
                label: label_of(&line.label),
            })
        }
        Artist::Rectangle(r) => Primitive::Rectangle {
            x: r.x,
            width: r.width,
            height: r.height,
            label: label_of(&r.label),
        },
        Artist::Wedge(w) => Primitive::Wedge {
            theta_start: w.theta1,
            theta_end: w.theta2,
            radius: w.r,
        },
        Artist::PathCollection(c) => Primitive::PointCloud {
            offsets: c.offsets.clone(),
            color_array: c.array.clone(),
            label: label_of(&c.label),
        },
        Artist::PathPatch(p) => Primitive::ComplexPatch {
            path_vertices: p.vertices.clone(),
        },
        Artist::Text(t) => Primitive::TextLabel {
            content: t.content.clone(),
        },
        Artist::Shadow(_) => Primitive::Shadow,
        // the color ramp is drawn, not inspected
        Artist::ColorbarSolids(_) => return None,
    };
    Some(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{BarOptions, GridCell, LineOptions, PieOptions, ScatterOptions};

    #[test]
    fn title_slots_close_every_subplot() {
        let mut axes = Axes::new(GridCell::SINGLE);
        axes.title = "Sales".into();
        axes.plot(vec![0.0, 1.0], vec![1.0, 2.0], LineOptions::default()).unwrap();
        let scene = subplot_scene(0, &axes);
        let n = scene.primitives.len();
        assert_eq!(n, 4);
        assert_eq!(
            scene.primitives[n - 3],
            Primitive::TextLabel {
                content: "Sales".into()
            }
        );
    }

    #[test]
    fn reference_lines_span_the_view() {
        let mut axes = Axes::new(GridCell::SINGLE);
        axes.plot(vec![0.0, 10.0], vec![0.0, 10.0], LineOptions::default()).unwrap();
        axes.axhline(5.0, None);
        let scene = subplot_scene(0, &axes);
        let line = scene.lines().nth(1).unwrap();
        assert!(line.is_gridline());
        assert_eq!(line.points[0].x, -0.5);
        assert_eq!(line.points[1].x, 10.5);
    }

    #[test]
    fn grid_adds_axis_aligned_lines() {
        let mut axes = Axes::new(GridCell::SINGLE);
        axes.scatter(vec![0.0, 10.0], vec![0.0, 10.0], ScatterOptions::default()).unwrap();
        axes.grid = true;
        let scene = subplot_scene(0, &axes);
        assert!(scene.lines().count() > 0);
        assert!(scene.lines().all(LinePrimitive::is_gridline));
    }

    #[test]
    fn colorbars_are_auxiliary() {
        let mut fig = Figure::new(1);
        fig.gca()
            .scatter(
                vec![0.0, 1.0],
                vec![0.0, 1.0],
                ScatterOptions {
                    c: Some(vec![0.0, 1.0]),
                    ..Default::default()
                },
            )
            .unwrap();
        fig.add_colorbar(0).unwrap();
        let scene = figure_scene(&fig);
        assert_eq!(scene.subplots.len(), 2);
        assert_eq!(scene.data_subplots().count(), 1);
        assert_eq!(scene.subplots[1].kind, SubplotKind::Auxiliary);
    }

    #[test]
    fn categorical_ticks_become_indices() {
        let mut axes = Axes::new(GridCell::SINGLE);
        axes.bar(
            vec![Tick::Category("x".into()), Tick::Category("y".into())],
            vec![1.0, 2.0],
            BarOptions::default(),
        )
        .unwrap();
        let scene = subplot_scene(0, &axes);
        assert_eq!(scene.meta.x.ticks, vec![TickValue::Number(0.0), TickValue::Number(1.0)]);
        assert_eq!(scene.meta.x.tick_labels, vec!["x", "y"]);
    }

    #[test]
    fn pie_shadow_is_kept_as_decoration() {
        let mut axes = Axes::new(GridCell::SINGLE);
        axes.pie(
            vec![1.0, 1.0],
            PieOptions {
                shadow: true,
                ..Default::default()
            },
        )
        .unwrap();
        let scene = subplot_scene(0, &axes);
        assert_eq!(scene.primitives.iter().filter(|p| **p == Primitive::Shadow).count(), 2);
    }
}
