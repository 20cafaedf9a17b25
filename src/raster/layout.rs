//! Figure layout: where each axes lands on the canvas and how data
//! coordinates map onto it.

use glam::{DVec2, dvec2};

use crate::figure::{Aspect, Axes, Figure, Scale};
use crate::types::PixelRect;

use super::RenderOptions;

/// Fractions of a grid cell reserved around the data area
const MARGIN_LEFT: f64 = 0.14;
const MARGIN_RIGHT: f64 = 0.05;
const MARGIN_TOP: f64 = 0.11;
const MARGIN_BOTTOM: f64 = 0.13;

/// Fraction of the parent's data area given up to its colorbar
const COLORBAR_SHARE: f64 = 0.15;
const COLORBAR_PAD: f64 = 0.03;

/// Height of the suptitle band as a fraction of the canvas
const SUPTITLE_BAND: f64 = 0.07;

/// Maps data coordinates of one axes to canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataTransform {
    pub rect: PixelRect,
    pub xlim: (f64, f64),
    pub ylim: (f64, f64),
    pub xscale: Scale,
    pub yscale: Scale,
}

fn fraction(v: f64, (lo, hi): (f64, f64), scale: Scale) -> f64 {
    match scale {
        Scale::Linear => {
            if hi == lo {
                0.5
            } else {
                (v - lo) / (hi - lo)
            }
        }
        Scale::Log => {
            if v <= 0.0 || lo <= 0.0 || hi <= 0.0 {
                return f64::NAN;
            }
            let (l, h) = (lo.log10(), hi.log10());
            if h == l { 0.5 } else { (v.log10() - l) / (h - l) }
        }
    }
}

impl DataTransform {
    /// Pixel position of a data point; non-representable points map to NaN
    pub fn to_px(&self, p: DVec2) -> DVec2 {
        let fx = fraction(p.x, self.xlim, self.xscale);
        let fy = fraction(p.y, self.ylim, self.yscale);
        dvec2(self.rect.x + fx * self.rect.width, self.rect.bottom() - fy * self.rect.height)
    }

    /// Pixels per data unit along x (linear axes)
    pub fn x_unit(&self) -> f64 {
        let span = self.xlim.1 - self.xlim.0;
        if span == 0.0 { 0.0 } else { self.rect.width / span }
    }

    pub fn y_unit(&self) -> f64 {
        let span = self.ylim.1 - self.ylim.0;
        if span == 0.0 { 0.0 } else { self.rect.height / span }
    }

    pub fn contains_x(&self, x: f64) -> bool {
        let f = fraction(x, self.xlim, self.xscale);
        (-1e-9..=1.0 + 1e-9).contains(&f)
    }

    pub fn contains_y(&self, y: f64) -> bool {
        let f = fraction(y, self.ylim, self.yscale);
        (-1e-9..=1.0 + 1e-9).contains(&f)
    }
}

/// Placement of one axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesLayout {
    pub transform: DataTransform,
    /// The axes with its labels and title, used for cropping
    pub region: PixelRect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FigureLayout {
    pub width: f64,
    pub height: f64,
    /// Scale of points to pixels
    pub pt: f64,
    pub suptitle_y: f64,
    /// Parallel to `Figure::axes`
    pub axes: Vec<AxesLayout>,
}

pub fn layout(figure: &Figure, options: &RenderOptions) -> FigureLayout {
    let width = figure.size.0 * options.dpi;
    let height = figure.size.1 * options.dpi;
    let band = if figure.suptitle.is_some() { height * SUPTITLE_BAND } else { 0.0 };
    let content = PixelRect::new(0.0, band, width, height - band);

    let mut plots: Vec<PixelRect> = figure
        .axes
        .iter()
        .map(|axes| cell_rect(axes, content))
        .map(|cell| {
            cell.inset(
                cell.width * MARGIN_LEFT,
                cell.height * MARGIN_TOP,
                cell.width * MARGIN_RIGHT,
                cell.height * MARGIN_BOTTOM,
            )
        })
        .collect();

    // colorbars take a strip from the right of their parent
    for (i, axes) in figure.axes.iter().enumerate() {
        let Some(parent) = axes.colorbar_for.filter(|p| *p < plots.len()) else {
            continue;
        };
        let p = plots[parent];
        let strip = p.width * COLORBAR_SHARE;
        let parent_rect = PixelRect::new(p.x, p.y, p.width - strip, p.height);
        let aspect = axes.box_aspect.unwrap_or(20.0).max(1.0);
        let bar_width = (p.height / aspect).min(strip * 0.5);
        plots[parent] = parent_rect;
        plots[i] = PixelRect::new(parent_rect.right() + p.width * COLORBAR_PAD, p.y, bar_width, p.height);
    }

    let axes = figure
        .axes
        .iter()
        .zip(plots)
        .map(|(axes, rect)| {
            let (xlim, ylim) = axes.view_limits();
            let rect = match axes.aspect {
                Aspect::Equal => equal_aspect(rect, xlim, ylim),
                Aspect::Auto => rect,
            };
            let region = region_around(rect, axes, width, height);
            AxesLayout {
                transform: DataTransform {
                    rect,
                    xlim,
                    ylim,
                    xscale: axes.xaxis.scale,
                    yscale: axes.yaxis.scale,
                },
                region,
            }
        })
        .collect();

    FigureLayout {
        width,
        height,
        pt: options.dpi / 72.0,
        suptitle_y: band * 0.65,
        axes,
    }
}

fn cell_rect(axes: &Axes, content: PixelRect) -> PixelRect {
    let (row, col) = axes.cell.row_col();
    let w = content.width / axes.cell.cols as f64;
    let h = content.height / axes.cell.rows as f64;
    PixelRect::new(content.x + col as f64 * w, content.y + row as f64 * h, w, h)
}

/// Shrink `rect` so one data unit spans the same pixels on both axes
fn equal_aspect(rect: PixelRect, xlim: (f64, f64), ylim: (f64, f64)) -> PixelRect {
    let (xspan, yspan) = ((xlim.1 - xlim.0).abs(), (ylim.1 - ylim.0).abs());
    if xspan == 0.0 || yspan == 0.0 {
        return rect;
    }
    let unit = (rect.width / xspan).min(rect.height / yspan);
    let (w, h) = (xspan * unit, yspan * unit);
    PixelRect::new(rect.x + (rect.width - w) / 2.0, rect.y + (rect.height - h) / 2.0, w, h)
}

/// The data area grown by the space its labels need, clamped to the canvas
fn region_around(rect: PixelRect, axes: &Axes, width: f64, height: f64) -> PixelRect {
    let label_w = if axes.colorbar_for.is_some() { rect.width * 3.0 } else { rect.width * 0.16 };
    let left = if axes.colorbar_for.is_some() { 4.0 } else { label_w };
    let right = if axes.colorbar_for.is_some() { label_w } else { rect.width * 0.03 };
    let top = rect.height * 0.12;
    let bottom = rect.height * 0.16;
    let x0 = (rect.x - left).max(0.0);
    let y0 = (rect.y - top).max(0.0);
    let x1 = (rect.right() + right).min(width);
    let y1 = (rect.bottom() + bottom).min(height);
    PixelRect::new(x0, y0, (x1 - x0).max(1.0), (y1 - y0).max(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{GridCell, LineOptions, ScatterOptions};

    #[test]
    fn grid_cells_do_not_overlap() {
        let mut fig = Figure::new(1);
        for i in 1..=4 {
            fig.add_subplot(GridCell::new(2, 2, i).unwrap());
        }
        let l = layout(&fig, &RenderOptions::default());
        assert_eq!(l.width, 640.0);
        let a = l.axes[0].transform.rect;
        let b = l.axes[1].transform.rect;
        let c = l.axes[2].transform.rect;
        assert!(a.right() <= b.x);
        assert!(a.bottom() <= c.y);
    }

    #[test]
    fn linear_and_log_transforms() {
        let t = DataTransform {
            rect: PixelRect::new(0.0, 0.0, 100.0, 100.0),
            xlim: (0.0, 10.0),
            ylim: (1.0, 100.0),
            xscale: Scale::Linear,
            yscale: Scale::Log,
        };
        let p = t.to_px(dvec2(5.0, 10.0));
        assert_eq!(p.x, 50.0);
        assert!((p.y - 50.0).abs() < 1e-9);
        assert!(t.to_px(dvec2(1.0, -1.0)).y.is_nan());
    }

    #[test]
    fn colorbar_strip_is_carved_from_parent() {
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
        fig.gca().plot(vec![0.0], vec![0.0], LineOptions::default()).unwrap();
        fig.add_colorbar(0).unwrap();
        let l = layout(&fig, &RenderOptions::default());
        let parent = l.axes[0].transform.rect;
        let bar = l.axes[1].transform.rect;
        assert!(bar.x > parent.right());
        assert!(bar.width < parent.width);
    }
}
