//! PNG encoding, cropping and transport encoding

use std::io::Cursor;
use std::sync::{Arc, OnceLock};

use base64::Engine;
use usvg::fontdb;

use crate::errors::RenderError;
use crate::types::PixelRect;

use super::RenderOptions;

/// System fonts, loaded once per process and shared read-only
static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

fn system_fonts() -> Arc<fontdb::Database> {
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

/// Rasterize an SVG document on a white background
pub fn svg_to_png(svg: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let mut opt = usvg::Options::default();
    opt.font_family = "DejaVu Sans".to_string();
    if options.load_system_fonts {
        opt.fontdb = system_fonts();
    }
    let tree = usvg::Tree::from_str(svg, &opt)?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or(RenderError::InvalidSize {
        width: size.width() as f64,
        height: size.height() as f64,
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| RenderError::Png(e.to_string()))
}

/// Cut `rect` out of a PNG, clamped to the image
pub fn crop_png(png: &[u8], rect: PixelRect) -> Result<Vec<u8>, RenderError> {
    let img = image::load_from_memory(png)?;
    let (x, y, width, height) = rect.to_pixel_bounds(img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize {
            width: width as f64,
            height: height as f64,
        });
    }
    let cropped = img.crop_imm(x, y, width, height);
    let mut buf = Cursor::new(Vec::new());
    cropped.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
