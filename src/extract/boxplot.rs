use crate::chart::{BoxStatElement, Elements};
use crate::errors::ExtractError;
use crate::scene::{LinePrimitive, Primitive, SubplotScene};
use crate::types::Bounds;

use super::Extract;

/// Five-number summaries read back from box bodies and their satellite
/// lines (whiskers, median, fliers).
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxExtractor;

/// Relative tolerance when matching lines to a box
const FIT: f64 = 1e-6;

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= FIT * scale.abs().max(1.0)
}

fn is_vertical(line: &LinePrimitive) -> bool {
    line.points.len() >= 2 && line.points.iter().all(|p| p.x == line.points[0].x)
}

fn is_horizontal(line: &LinePrimitive) -> bool {
    line.points.len() >= 2 && line.points.iter().all(|p| p.y == line.points[0].y)
}

/// A whisker starts on the top or bottom edge of its box, which rules out
/// gridlines and reference lines that merely cross the box center
fn leaves_body(line: &LinePrimitive, body: &Bounds) -> bool {
    let scale = body.height();
    line.ys()
        .any(|y| close(y, body.min.y, scale) || close(y, body.max.y, scale))
}

/// Sorted distinct y-values of a path
fn levels(vertices: &[glam::DVec2]) -> Vec<f64> {
    let mut ys: Vec<f64> = vertices.iter().map(|v| v.y).filter(|y| y.is_finite()).collect();
    ys.sort_by(|a, b| a.total_cmp(b));
    ys.dedup();
    ys
}

impl Extract for BoxExtractor {
    fn extract(&self, scene: &SubplotScene) -> Result<Elements, ExtractError> {
        let lines: Vec<&LinePrimitive> = scene.lines().collect();
        let mut elements = Vec::new();

        let boxes = scene.primitives.iter().filter_map(|p| match p {
            Primitive::ComplexPatch { path_vertices } => Some(path_vertices),
            _ => None,
        });

        for (index, vertices) in boxes.enumerate() {
            let ys = levels(vertices);
            if ys.is_empty() {
                return Err(ExtractError::EmptyPath { index });
            }
            let body = Bounds::from_points(vertices.iter());
            let center = body.center().x;
            let span = body.width();

            let (min, q1, median, q3, max) = if ys.len() >= 5 {
                (ys[0], ys[1], ys[2], ys[3], ys[4])
            } else {
                let whiskers: Vec<f64> = lines
                    .iter()
                    .filter(|l| l.marker.is_none() && is_vertical(l))
                    .filter(|l| close(l.points[0].x, center, span))
                    .filter(|l| leaves_body(l, &body))
                    .flat_map(|l| l.ys())
                    .filter(|y| y.is_finite())
                    .collect();
                let (min, max) = if whiskers.is_empty() {
                    (ys[0], ys[ys.len() - 1])
                } else {
                    whiskers
                        .iter()
                        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(*y), hi.max(*y)))
                };

                let median_line = lines.iter().find(|l| {
                    let b = Bounds::from_points(l.points.iter());
                    l.marker.is_none()
                        && is_horizontal(l)
                        && b.min.y >= body.min.y
                        && b.max.y <= body.max.y
                        && close(b.min.x, body.min.x, span)
                        && close(b.max.x, body.max.x, span)
                });
                let Some(median_line) = median_line else {
                    return Err(ExtractError::MissingMedian { index });
                };
                let median = median_line.ys().sum::<f64>() / median_line.points.len() as f64;
                (min, (min + median) / 2.0, median, (median + max) / 2.0, max)
            };

            let outliers = lines
                .iter()
                .filter(|l| l.is_marker_only() && !l.points.is_empty())
                .find(|l| l.xs().all(|x| close(x, center, span)))
                .map(|l| l.ys().collect())
                .unwrap_or_default();

            let label = scene
                .meta
                .x
                .tick_labels
                .get(index)
                .filter(|l| !l.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("Box {}", index + 1));

            elements.push(BoxStatElement {
                label,
                min,
                first_quartile: q1,
                median,
                third_quartile: q3,
                max,
                outliers,
            });
        }
        Ok(Elements::BoxAndWhisker(elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{line, markers, scene, with_x_ticks};
    use glam::dvec2;

    fn patch(points: &[(f64, f64)]) -> Primitive {
        Primitive::ComplexPatch {
            path_vertices: points.iter().map(|&(x, y)| dvec2(x, y)).collect(),
        }
    }

    #[test]
    fn five_levels_round_trip_exactly() {
        let scene = scene(vec![patch(&[
            (1.0, 0.0),
            (1.0, 1.0),
            (1.0, 5.0),
            (1.0, 9.0),
            (1.0, 10.0),
            (1.0, 5.0),
        ])]);
        let Elements::BoxAndWhisker(boxes) = BoxExtractor.extract(&scene).unwrap() else {
            panic!("expected box elements");
        };
        let b = &boxes[0];
        assert_eq!(
            [b.min, b.first_quartile, b.median, b.third_quartile, b.max],
            [0.0, 1.0, 5.0, 9.0, 10.0]
        );
        assert_eq!(b.label, "Box 1");
    }

    #[test]
    fn rectangular_body_uses_whiskers_and_median() {
        let body = [(0.75, 2.0), (1.25, 2.0), (1.25, 6.0), (0.75, 6.0), (0.75, 2.0)];
        let scene = with_x_ticks(
            scene(vec![
                line(&[(1.0, 2.0), (1.0, 0.0)], None),
                line(&[(1.0, 6.0), (1.0, 8.0)], None),
                line(&[(0.875, 0.0), (1.125, 0.0)], None),
                line(&[(0.875, 8.0), (1.125, 8.0)], None),
                patch(&body),
                line(&[(0.75, 4.0), (1.25, 4.0)], None),
                markers(&[(1.0, 20.0), (1.0, -9.0)]),
            ]),
            &[(1.0, "control")],
        );
        let Elements::BoxAndWhisker(boxes) = BoxExtractor.extract(&scene).unwrap() else {
            panic!("expected box elements");
        };
        let b = &boxes[0];
        assert_eq!(b.label, "control");
        assert_eq!(b.min, 0.0);
        assert_eq!(b.max, 8.0);
        assert_eq!(b.median, 4.0);
        assert_eq!(b.first_quartile, 2.0);
        assert_eq!(b.third_quartile, 6.0);
        assert_eq!(b.outliers, vec![20.0, -9.0]);
    }

    #[test]
    fn lines_crossing_the_center_are_not_whiskers() {
        let body = [(0.75, 2.0), (1.25, 2.0), (1.25, 6.0), (0.75, 6.0), (0.75, 2.0)];
        let scene = scene(vec![
            // full-height gridline at the box's tick
            line(&[(1.0, -1.0), (1.0, 11.0)], None),
            line(&[(1.0, 2.0), (1.0, 1.0)], None),
            line(&[(1.0, 6.0), (1.0, 9.0)], None),
            patch(&body),
            line(&[(0.75, 4.0), (1.25, 4.0)], None),
            // horizontal gridline through the body
            line(&[(-1.0, 5.0), (3.0, 5.0)], None),
        ]);
        let Elements::BoxAndWhisker(boxes) = BoxExtractor.extract(&scene).unwrap() else {
            panic!("expected box elements");
        };
        let b = &boxes[0];
        assert_eq!([b.min, b.median, b.max], [1.0, 4.0, 9.0]);
        assert_eq!([b.first_quartile, b.third_quartile], [2.5, 6.5]);
    }

    #[test]
    fn missing_median_is_an_error() {
        let scene = scene(vec![patch(&[(0.0, 1.0), (1.0, 1.0), (1.0, 3.0), (0.0, 3.0)])]);
        assert_eq!(
            BoxExtractor.extract(&scene),
            Err(ExtractError::MissingMedian { index: 0 })
        );
    }

    #[test]
    fn empty_path_is_an_error() {
        let scene = scene(vec![patch(&[])]);
        assert_eq!(BoxExtractor.extract(&scene), Err(ExtractError::EmptyPath { index: 0 }));
    }
}
