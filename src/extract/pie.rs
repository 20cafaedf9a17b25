use crate::chart::{Elements, PieSliceElement};
use crate::errors::ExtractError;
use crate::scene::{Primitive, SubplotScene};

use super::Extract;

/// Number of title slots closing every subplot's text list
const TITLE_SLOTS: usize = 3;

/// One slice per wedge, labeled from the subplot's texts.
///
/// Texts are paired with wedges positionally: twice as many texts as wedges
/// means (label, percentage) pairs, otherwise the first texts are labels.
/// Extra texts such as legend entries shift this pairing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PieExtractor;

impl Extract for PieExtractor {
    fn extract(&self, scene: &SubplotScene) -> Result<Elements, ExtractError> {
        let wedges: Vec<(f64, f64, f64)> = scene
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Wedge {
                    theta_start,
                    theta_end,
                    radius,
                } => Some((*theta_start, *theta_end, *radius)),
                _ => None,
            })
            .collect();

        let texts: Vec<&str> = scene.texts().collect();
        let labels = &texts[..texts.len().saturating_sub(TITLE_SLOTS)];
        let paired = labels.len() == 2 * wedges.len();

        let mut elements = Vec::with_capacity(wedges.len());
        for (i, (start, end, radius)) in wedges.into_iter().enumerate() {
            let angle = end - start;
            if !angle.is_finite() {
                return Err(ExtractError::InvalidWedge { index: i });
            }
            let (label, percent_label) = if paired {
                (labels.get(2 * i), labels.get(2 * i + 1).map(|s| s.to_string()))
            } else {
                (labels.get(i), None)
            };
            let label = match label {
                Some(l) if !l.is_empty() => l.to_string(),
                _ => format!("Slice {}", i + 1),
            };
            elements.push(PieSliceElement {
                label,
                angle,
                radius,
                percent_label,
            });
        }
        Ok(Elements::Pie(elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{scene, title_slots};

    fn wedge(start: f64, end: f64) -> Primitive {
        Primitive::Wedge {
            theta_start: start,
            theta_end: end,
            radius: 1.0,
        }
    }

    fn text(s: &str) -> Primitive {
        Primitive::TextLabel { content: s.into() }
    }

    #[test]
    fn label_and_percent_pairs() {
        let mut prims = vec![
            wedge(0.0, 90.0),
            text("A"),
            text("25.0%"),
            wedge(90.0, 360.0),
            text("B"),
            text("75.0%"),
        ];
        prims.extend(title_slots());
        let Elements::Pie(slices) = PieExtractor.extract(&scene(prims)).unwrap() else {
            panic!("expected pie elements");
        };
        assert_eq!(slices[0].label, "A");
        assert_eq!(slices[0].angle, 90.0);
        assert_eq!(slices[0].percent_label.as_deref(), Some("25.0%"));
        assert_eq!(slices[1].label, "B");
        assert_eq!(slices[1].angle, 270.0);
    }

    #[test]
    fn missing_labels_are_numbered() {
        let mut prims = vec![wedge(0.0, 120.0), text("only"), wedge(120.0, 360.0)];
        prims.extend(title_slots());
        let Elements::Pie(slices) = PieExtractor.extract(&scene(prims)).unwrap() else {
            panic!("expected pie elements");
        };
        assert_eq!(slices[0].label, "only");
        assert_eq!(slices[0].percent_label, None);
        assert_eq!(slices[1].label, "Slice 2");
    }

    #[test]
    fn non_finite_angle_is_an_error() {
        let prims = vec![wedge(0.0, f64::NAN)];
        assert_eq!(
            PieExtractor.extract(&scene(prims)),
            Err(ExtractError::InvalidWedge { index: 0 })
        );
    }
}
