use crate::chart::{Elements, ScatterElement};
use crate::errors::ExtractError;
use crate::scene::{Primitive, SubplotScene};

use super::{Extract, label_or};

/// One element per point cloud. Points with a non-finite coordinate are
/// dropped together with their color entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScatterExtractor;

impl Extract for ScatterExtractor {
    fn extract(&self, scene: &SubplotScene) -> Result<Elements, ExtractError> {
        let mut elements = Vec::new();
        for primitive in &scene.primitives {
            let Primitive::PointCloud {
                offsets,
                color_array,
                label,
            } = primitive
            else {
                continue;
            };

            // align colors with offsets before filtering
            let colors = color_array.as_ref().map(|values| {
                let mut values = values.clone();
                values.resize(offsets.len(), 0.0);
                values
            });

            let keep: Vec<bool> = offsets.iter().map(|p| p.x.is_finite() && p.y.is_finite()).collect();
            let points = offsets
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(p, _)| [p.x, p.y])
                .collect();
            let colors = colors.map(|values| {
                values
                    .into_iter()
                    .zip(&keep)
                    .filter(|(_, k)| **k)
                    .map(|(c, _)| c)
                    .collect()
            });

            elements.push(ScatterElement {
                label: label_or(label.as_deref(), "Scatter", elements.len() + 1),
                points,
                colors,
            });
        }
        Ok(Elements::Scatter(elements))
    }
}
