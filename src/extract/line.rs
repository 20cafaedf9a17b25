use crate::chart::{Elements, LineElement};
use crate::errors::ExtractError;
use crate::scene::SubplotScene;

use super::{Extract, label_or};

/// One element per line, points in drawing order
#[derive(Debug, Clone, Copy, Default)]
pub struct LineExtractor;

impl Extract for LineExtractor {
    fn extract(&self, scene: &SubplotScene) -> Result<Elements, ExtractError> {
        let elements = scene
            .lines()
            .enumerate()
            .map(|(i, line)| LineElement {
                label: label_or(line.label.as_deref(), "Line", i + 1),
                points: line.points.iter().map(|p| [p.x, p.y]).collect(),
            })
            .collect();
        Ok(Elements::Line(elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{line, scene};

    #[test]
    fn auto_labels_are_numbered() {
        let scene = scene(vec![
            line(&[(0.0, 1.0), (1.0, 2.0)], Some("revenue")),
            line(&[(0.0, 3.0), (1.0, 4.0)], Some("_child1")),
            line(&[(0.0, 3.0)], None),
        ]);
        let Elements::Line(lines) = LineExtractor.extract(&scene).unwrap() else {
            panic!("expected line elements");
        };
        let labels: Vec<&str> = lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["revenue", "Line 2", "Line 3"]);
        assert_eq!(lines[0].points, vec![[0.0, 1.0], [1.0, 2.0]]);
    }
}
