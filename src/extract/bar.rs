use crate::chart::{BarElement, Elements};
use crate::errors::ExtractError;
use crate::scene::{Primitive, SubplotScene, is_auto_label};
use crate::types::Bounds;

use super::Extract;

/// Group assigned to bars without a user label
pub const DEFAULT_GROUP: &str = "default";

/// Bars are filled rectangles of positive height, or failing that, filled
/// paths with a rectangular footprint.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarExtractor;

/// A bar candidate: horizontal extent, value and group label
struct Candidate<'a> {
    x0: f64,
    x1: f64,
    value: f64,
    label: Option<&'a str>,
}

fn rectangles(scene: &SubplotScene) -> Vec<Candidate<'_>> {
    scene
        .primitives
        .iter()
        .filter_map(|p| match p {
            Primitive::Rectangle {
                x,
                width,
                height,
                label,
            } if *height > 0.0 => Some(Candidate {
                x0: x.min(x + width),
                x1: x.max(x + width),
                value: *height,
                label: label.as_deref(),
            }),
            _ => None,
        })
        .collect()
}

fn patches(scene: &SubplotScene) -> Vec<Candidate<'_>> {
    scene
        .primitives
        .iter()
        .filter_map(|p| match p {
            Primitive::ComplexPatch { path_vertices } if path_vertices.len() >= 4 => {
                let b = Bounds::from_points(path_vertices);
                (b.width() > 0.0 && b.height() > 0.0).then_some(Candidate {
                    x0: b.min.x,
                    x1: b.max.x,
                    value: b.height(),
                    label: None,
                })
            }
            _ => None,
        })
        .collect()
}

impl Extract for BarExtractor {
    fn extract(&self, scene: &SubplotScene) -> Result<Elements, ExtractError> {
        let mut candidates = rectangles(scene);
        if candidates.is_empty() {
            candidates = patches(scene);
        }

        let positions = scene.meta.x.positions();
        let tick_labels = &scene.meta.x.tick_labels;

        let elements = candidates
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let label = positions
                    .iter()
                    .zip(tick_labels)
                    .find(|(pos, _)| **pos >= bar.x0 && **pos <= bar.x1)
                    .map(|(_, label)| label.clone())
                    .unwrap_or_else(|| format!("Bar {}", i + 1));
                let group = match bar.label {
                    Some(l) if !is_auto_label(Some(l)) => l.to_string(),
                    _ => DEFAULT_GROUP.to_string(),
                };
                BarElement {
                    label,
                    group,
                    value: bar.value,
                }
            })
            .filter(|e| !is_bar_artifact(e))
            .collect();
        Ok(Elements::Bar(elements))
    }
}

/// A unit-height bar with a generated label in the default group is a
/// rendering artifact (legend handles, axes backgrounds), not data.
pub fn is_bar_artifact(bar: &BarElement) -> bool {
    let generated = bar
        .label
        .strip_prefix("Bar ")
        .is_some_and(|n| n.parse::<usize>().is_ok());
    (bar.value - 1.0).abs() <= 1e-4 && generated && bar.group == DEFAULT_GROUP
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{scene, with_x_ticks};
    use glam::dvec2;

    fn rect(x: f64, height: f64, label: Option<&str>) -> Primitive {
        Primitive::Rectangle {
            x,
            width: 0.8,
            height,
            label: label.map(str::to_string),
        }
    }

    #[test]
    fn artifact_filter() {
        let artifact = BarElement {
            label: "Bar 7".into(),
            group: DEFAULT_GROUP.into(),
            value: 1.0,
        };
        assert!(is_bar_artifact(&artifact));
        let real = BarElement {
            group: "revenue".into(),
            ..artifact.clone()
        };
        assert!(!is_bar_artifact(&real));
        let labeled = BarElement {
            label: "Q1".into(),
            ..artifact
        };
        assert!(!is_bar_artifact(&labeled));
    }

    #[test]
    fn labels_come_from_ticks_inside_the_bar() {
        let scene = with_x_ticks(
            scene(vec![
                rect(-0.4, 3.0, Some("sales")),
                rect(0.6, 5.0, Some("sales")),
                rect(1.6, 0.0, None),
                rect(5.0, 2.0, Some("_child0")),
            ]),
            &[(0.0, "Mon"), (1.0, "Tue"), (2.0, "Wed")],
        );
        let Elements::Bar(bars) = BarExtractor.extract(&scene).unwrap() else {
            panic!("expected bar elements");
        };
        assert_eq!(bars.len(), 3, "zero-height bar is skipped");
        assert_eq!(bars[0].label, "Mon");
        assert_eq!(bars[1].label, "Tue");
        assert_eq!(bars[1].group, "sales");
        assert_eq!(bars[2].label, "Bar 3");
        assert_eq!(bars[2].group, DEFAULT_GROUP);
    }

    #[test]
    fn patches_stand_in_for_missing_rectangles() {
        let scene = scene(vec![
            Primitive::ComplexPatch {
                path_vertices: vec![dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(1.0, 4.0), dvec2(0.0, 4.0)],
            },
            Primitive::ComplexPatch {
                path_vertices: vec![dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(1.0, 0.0), dvec2(0.0, 0.0)],
            },
        ]);
        let Elements::Bar(bars) = BarExtractor.extract(&scene).unwrap() else {
            panic!("expected bar elements");
        };
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].value, 4.0);
    }
}
