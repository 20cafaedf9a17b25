//! Small geometric and numeric primitives shared by the library, the
//! adapter and the rasterizer.

use glam::{DVec2, dvec2};

/// Axis-aligned bounding box in whatever space the caller works in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    /// An empty box that any `expand` will replace
    pub fn empty() -> Self {
        Self {
            min: dvec2(f64::INFINITY, f64::INFINITY),
            max: dvec2(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec2>) -> Self {
        let mut b = Self::empty();
        for p in points {
            b.expand(*p);
        }
        b
    }

    /// Grow to include `p`. Non-finite coordinates are ignored per axis.
    pub fn expand(&mut self, p: DVec2) {
        if p.x.is_finite() {
            self.min.x = self.min.x.min(p.x);
            self.max.x = self.max.x.max(p.x);
        }
        if p.y.is_finite() {
            self.min.y = self.min.y.min(p.y);
            self.max.y = self.max.y.max(p.y);
        }
    }

    pub fn union(&mut self, other: &Bounds) {
        self.expand(other.min);
        self.expand(other.max);
    }

    pub fn is_empty(&self) -> bool {
        !(self.min.x <= self.max.x && self.min.y <= self.max.y)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains_x(&self, x: f64, tolerance: f64) -> bool {
        x >= self.min.x - tolerance && x <= self.max.x + tolerance
    }
}

/// Rectangle in raster pixels (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Shrink by independent margins, never below zero size
    pub fn inset(&self, left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            width: (self.width - left - right).max(1.0),
            height: (self.height - top - bottom).max(1.0),
        }
    }

    /// Clamp to a `width`×`height` canvas and round outward to whole pixels
    pub fn to_pixel_bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let x0 = self.x.floor().clamp(0.0, width as f64) as u32;
        let y0 = self.y.floor().clamp(0.0, height as f64) as u32;
        let x1 = self.right().ceil().clamp(0.0, width as f64) as u32;
        let y1 = self.bottom().ceil().clamp(0.0, height as f64) as u32;
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

/// Replace NaN and infinities with zero
#[inline]
pub fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Format a number like C's %g (6 significant figures, trailing zeros trimmed).
pub fn fmt_num(value: f64) -> String {
    fmt_num_precision(value, 6)
}

/// Format a number with specified significant figures, trailing zeros trimmed.
pub fn fmt_num_precision(value: f64, sig_figs: i32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    let abs_val = value.abs();
    let magnitude = abs_val.log10().floor() as i32;
    let scale = 10_f64.powi(sig_figs - 1 - magnitude);
    let rounded = (value * scale).round() / scale;

    let decimals = (sig_figs - 1 - magnitude).max(0) as usize;
    let s = format!("{:.prec$}", rounded, prec = decimals);
    if s.contains('.') {
        let s = s.trim_end_matches('0');
        s.trim_end_matches('.').to_string()
    } else {
        s
    }
}
