//! Structural chart-type classification of one subplot.
//!
//! Only the primitive census is consulted; text and shadows are ignored.
//! Rules are ordered and the first match wins. Classification never fails:
//! anything that does not fit the taxonomy is `Unknown`.

use crate::chart::ChartType;
use crate::scene::{Primitive, SubplotScene};

pub fn classify(scene: &SubplotScene) -> ChartType {
    classify_primitives(&scene.primitives)
}

pub fn classify_primitives(primitives: &[Primitive]) -> ChartType {
    let census: Vec<&Primitive> = primitives.iter().filter(|p| !p.is_decoration()).collect();
    if census.is_empty() {
        return ChartType::Unknown;
    }

    if census.iter().all(|p| matches!(p, Primitive::Line(_))) {
        return ChartType::Line;
    }

    if census
        .iter()
        .all(|p| matches!(p, Primitive::Line(_) | Primitive::ComplexPatch { .. }))
    {
        return ChartType::BoxAndWhisker;
    }

    let data: Vec<&Primitive> = census.into_iter().filter(|p| !p.is_gridline()).collect();
    if data.is_empty() {
        return ChartType::Unknown;
    }
    if data.iter().all(|p| matches!(p, Primitive::PointCloud { .. })) {
        ChartType::Scatter
    } else if data.iter().all(|p| matches!(p, Primitive::Rectangle { .. })) {
        ChartType::Bar
    } else if data.iter().all(|p| matches!(p, Primitive::Wedge { .. })) {
        ChartType::Pie
    } else {
        ChartType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::LineStyle;
    use crate::scene::LinePrimitive;
    use glam::dvec2;

    fn line(points: &[(f64, f64)]) -> Primitive {
        Primitive::Line(LinePrimitive {
            points: points.iter().map(|&(x, y)| dvec2(x, y)).collect(),
            style: LineStyle::Solid,
            color: "C0".into(),
            marker: None,
            label: None,
        })
    }

    fn rect() -> Primitive {
        Primitive::Rectangle {
            x: 0.0,
            width: 1.0,
            height: 2.0,
            label: None,
        }
    }

    fn cloud() -> Primitive {
        Primitive::PointCloud {
            offsets: vec![dvec2(1.0, 2.0)],
            color_array: None,
            label: None,
        }
    }

    fn wedge() -> Primitive {
        Primitive::Wedge {
            theta_start: 0.0,
            theta_end: 90.0,
            radius: 1.0,
        }
    }

    fn text() -> Primitive {
        Primitive::TextLabel { content: "t".into() }
    }

    #[test]
    fn lines_only() {
        let prims: Vec<_> = (0..5).map(|i| line(&[(0.0, i as f64), (1.0, 2.0), (2.0, 0.5)])).collect();
        assert_eq!(classify_primitives(&prims), ChartType::Line);
    }

    #[test]
    fn patch_with_lines_is_a_box_plot() {
        let prims = vec![
            Primitive::ComplexPatch {
                path_vertices: vec![dvec2(0.0, 1.0), dvec2(1.0, 3.0)],
            },
            line(&[(0.5, 0.0), (0.5, 1.0)]),
            line(&[(0.5, 3.0), (0.5, 4.0)]),
        ];
        assert_eq!(classify_primitives(&prims), ChartType::BoxAndWhisker);
    }

    #[test]
    fn gridlines_are_ignored_for_scatter() {
        let prims = vec![
            cloud(),
            cloud(),
            cloud(),
            line(&[(0.0, 0.0), (0.0, 5.0)]),
            line(&[(0.0, 2.0), (9.0, 2.0)]),
            text(),
        ];
        assert_eq!(classify_primitives(&prims), ChartType::Scatter);
    }

    #[test]
    fn non_axis_aligned_line_breaks_scatter() {
        let prims = vec![cloud(), line(&[(0.0, 0.0), (3.0, 4.0)])];
        assert_eq!(classify_primitives(&prims), ChartType::Unknown);
    }

    #[test]
    fn homogeneous_shapes() {
        assert_eq!(classify_primitives(&[rect(), rect(), rect(), rect()]), ChartType::Bar);
        assert_eq!(
            classify_primitives(&[wedge(), wedge(), Primitive::Shadow, wedge(), wedge(), text()]),
            ChartType::Pie
        );
    }

    #[test]
    fn empty_and_mixed_are_unknown() {
        assert_eq!(classify_primitives(&[]), ChartType::Unknown);
        assert_eq!(classify_primitives(&[text(), text(), text()]), ChartType::Unknown);
        assert_eq!(classify_primitives(&[rect(), wedge()]), ChartType::Unknown);
    }
}
