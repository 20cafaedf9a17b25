//! Figure rasterization: layout, SVG generation, PNG encoding.

pub mod layout;
pub mod png;
pub mod svg;

pub use png::{crop_png, encode_base64, svg_to_png};

use crate::errors::RenderError;
use crate::figure::Figure;
use crate::log::debug;
use crate::types::PixelRect;

/// Largest canvas edge accepted, in pixels
const MAX_EDGE: f64 = 16384.0;

/// Rendering configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Pixels per inch
    pub dpi: f64,
    /// Size in inches of the isolated figure each subplot is redrawn on
    pub subplot_figsize: (f64, f64),
    /// Load the system font database for text rendering
    pub load_system_fonts: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 100.0,
            subplot_figsize: (8.0, 6.0),
            load_system_fonts: true,
        }
    }
}

/// A rendered figure and where each of its axes landed
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedFigure {
    pub png: Vec<u8>,
    /// Tight region of each axes, parallel to `Figure::axes`
    pub regions: Vec<PixelRect>,
}

impl RasterizedFigure {
    pub fn to_base64(&self) -> String {
        encode_base64(&self.png)
    }

    /// PNG of the axes at `index` cut out of the whole figure
    pub fn crop(&self, index: usize) -> Result<Vec<u8>, RenderError> {
        let region = self
            .regions
            .get(index)
            .copied()
            .ok_or(RenderError::MissingRegion { index })?;
        crop_png(&self.png, region)
    }
}

/// Render `figure` to PNG
pub fn rasterize(figure: &Figure, options: &RenderOptions) -> Result<RasterizedFigure, RenderError> {
    check_size(figure, options)?;
    let layout = layout::layout(figure, options);
    let svg = svg::figure_svg(figure, &layout);
    let png = svg_to_png(&svg, options)?;
    debug!(figure = figure.number, bytes = png.len(), "rasterized");
    Ok(RasterizedFigure {
        png,
        regions: layout.axes.iter().map(|a| a.region).collect(),
    })
}

fn check_size(figure: &Figure, options: &RenderOptions) -> Result<(), RenderError> {
    let width = figure.size.0 * options.dpi;
    let height = figure.size.1 * options.dpi;
    let ok = |v: f64| v.is_finite() && (1.0..=MAX_EDGE).contains(&v);
    if ok(width) && ok(height) {
        Ok(())
    } else {
        Err(RenderError::InvalidSize { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{GridCell, LineOptions};

    fn options() -> RenderOptions {
        RenderOptions {
            load_system_fonts: false,
            ..Default::default()
        }
    }

    #[test]
    fn regions_cover_each_axes() {
        let mut fig = Figure::new(1);
        for i in 1..=2 {
            fig.add_subplot(GridCell::new(1, 2, i).unwrap());
            fig.gca().plot(vec![0.0, 1.0], vec![1.0, 0.0], LineOptions::default()).unwrap();
        }
        let raster = rasterize(&fig, &options()).unwrap();
        assert_eq!(raster.regions.len(), 2);
        assert!(raster.regions[0].right() <= raster.regions[1].x + 1.0);
        let left = image::load_from_memory(&raster.crop(0).unwrap()).unwrap();
        assert!(left.width() < 320);
        assert!(matches!(raster.crop(5), Err(RenderError::MissingRegion { index: 5 })));
    }

    #[test]
    fn degenerate_sizes_are_rejected() {
        let fig = Figure::new(1).with_size(0.0, 4.0);
        assert!(matches!(rasterize(&fig, &options()), Err(RenderError::InvalidSize { .. })));
    }
}
