//! SVG generation for figures

use std::fmt::Write;

use glam::{DVec2, dvec2};

use crate::figure::{
    Artist, Axes, COLOR_CYCLE, Figure, Line2D, LineStyle, Marker, PathCollection, TextAnchor, Wedge,
};
use crate::types::PixelRect;

use super::layout::{AxesLayout, DataTransform, FigureLayout};

const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";

/// Font sizes in points
const TICK_FONT: f64 = 10.0;
const LABEL_FONT: f64 = 10.0;
const TITLE_FONT: f64 = 12.0;
const SUPTITLE_FONT: f64 = 14.0;

const TICK_LENGTH: f64 = 3.5;

/// Stops of the default sequential colormap
const VIRIDIS: [(f64, [u8; 3]); 5] = [
    (0.0, [0x44, 0x01, 0x54]),
    (0.25, [0x3b, 0x52, 0x8b]),
    (0.5, [0x21, 0x91, 0x8c]),
    (0.75, [0x5e, 0xc9, 0x62]),
    (1.0, [0xfd, 0xe7, 0x25]),
];

/// Resolve single-letter and cycle (`C3`) color codes to SVG colors
pub fn color_to_svg(color: &str) -> String {
    match color {
        "b" => "blue".to_string(),
        "g" => "green".to_string(),
        "r" => "red".to_string(),
        "c" => "cyan".to_string(),
        "m" => "magenta".to_string(),
        "y" => "yellow".to_string(),
        "k" => "black".to_string(),
        "w" => "white".to_string(),
        "none" | "None" | "" => "none".to_string(),
        c if c.len() >= 2 && c.starts_with('C') && c[1..].chars().all(|ch| ch.is_ascii_digit()) => {
            let n: usize = c[1..].parse().unwrap_or(0);
            COLOR_CYCLE[n % COLOR_CYCLE.len()].to_string()
        }
        c => escape_xml(c),
    }
}

/// Sample the colormap at `t` in 0..=1
pub fn colormap(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let mut prev = VIRIDIS[0];
    for stop in VIRIDIS {
        if t <= stop.0 {
            let span = stop.0 - prev.0;
            let f = if span > 0.0 { (t - prev.0) / span } else { 0.0 };
            let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
            return format!(
                "#{:02x}{:02x}{:02x}",
                mix(prev.1[0], stop.1[0]),
                mix(prev.1[1], stop.1[1]),
                mix(prev.1[2], stop.1[2])
            );
        }
        prev = stop;
    }
    "#fde725".to_string()
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn anchor_str(anchor: TextAnchor) -> &'static str {
    match anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    }
}

fn finite(p: DVec2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

fn text(out: &mut String, at: DVec2, size: f64, anchor: &str, content: &str, extra: &str) {
    if content.is_empty() || !finite(at) {
        return;
    }
    let _ = writeln!(
        out,
        r#"<text x="{:.2}" y="{:.2}" font-family="{FONT_FAMILY}" font-size="{:.2}" text-anchor="{anchor}" fill="black"{extra}>{}</text>"#,
        at.x,
        at.y,
        size,
        escape_xml(content)
    );
}

fn line(out: &mut String, a: DVec2, b: DVec2, stroke: &str, width: f64) {
    if !finite(a) || !finite(b) {
        return;
    }
    let _ = writeln!(
        out,
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{stroke}" stroke-width="{width:.2}"/>"#,
        a.x, a.y, b.x, b.y
    );
}

/// Render a figure to an SVG document using a precomputed layout
pub fn figure_svg(figure: &Figure, layout: &FigureLayout) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#,
        w = layout.width,
        h = layout.height
    );
    let _ = writeln!(
        out,
        r#"<rect x="0" y="0" width="{:.0}" height="{:.0}" fill="white"/>"#,
        layout.width, layout.height
    );

    if let Some(suptitle) = &figure.suptitle {
        text(
            &mut out,
            dvec2(layout.width / 2.0, layout.suptitle_y),
            SUPTITLE_FONT * layout.pt,
            "middle",
            suptitle,
            "",
        );
    }

    for (i, (axes, placement)) in figure.axes.iter().zip(&layout.axes).enumerate() {
        axes_svg(&mut out, i, axes, placement, layout.pt);
    }

    out.push_str("</svg>\n");
    out
}

fn axes_svg(out: &mut String, index: usize, axes: &Axes, placement: &AxesLayout, pt: f64) {
    let t = &placement.transform;
    let r = t.rect;

    let _ = writeln!(out, r#"<g id="axes{index}">"#);
    let _ = writeln!(
        out,
        r#"<clipPath id="clip{index}"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath>"#,
        r.x, r.y, r.width, r.height
    );

    let (_, xlabels) = axes.xaxis.resolved_ticks(t.xlim);
    let xpos = axes.xaxis.tick_positions(t.xlim);
    let (_, ylabels) = axes.yaxis.resolved_ticks(t.ylim);
    let ypos = axes.yaxis.tick_positions(t.ylim);

    if axes.grid {
        for &x in xpos.iter().filter(|x| t.contains_x(**x)) {
            let px = t.to_px(dvec2(x, t.ylim.0)).x;
            line(out, dvec2(px, r.y), dvec2(px, r.bottom()), "#b0b0b0", 0.8 * pt);
        }
        for &y in ypos.iter().filter(|y| t.contains_y(**y)) {
            let py = t.to_px(dvec2(t.xlim.0, y)).y;
            line(out, dvec2(r.x, py), dvec2(r.right(), py), "#b0b0b0", 0.8 * pt);
        }
    }

    let _ = writeln!(out, r#"<g clip-path="url(#clip{index})">"#);
    for artist in &axes.artists {
        artist_svg(out, index, artist, t, pt, 1.0);
    }
    out.push_str("</g>\n");

    if axes.frame {
        let _ = writeln!(
            out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black" stroke-width="{:.2}"/>"#,
            r.x,
            r.y,
            r.width,
            r.height,
            0.8 * pt
        );
    }

    let tick = TICK_LENGTH * pt;
    let font = TICK_FONT * pt;
    for (&x, label) in xpos.iter().zip(&xlabels) {
        if !t.contains_x(x) {
            continue;
        }
        let px = t.to_px(dvec2(x, t.ylim.0)).x;
        line(out, dvec2(px, r.bottom()), dvec2(px, r.bottom() + tick), "black", 0.8 * pt);
        text(out, dvec2(px, r.bottom() + tick + font), font, "middle", label, "");
    }
    // colorbars carry their scale on the right
    let on_right = axes.colorbar_for.is_some();
    for (&y, label) in ypos.iter().zip(&ylabels) {
        if !t.contains_y(y) {
            continue;
        }
        let py = t.to_px(dvec2(t.xlim.0, y)).y;
        if on_right {
            line(out, dvec2(r.right(), py), dvec2(r.right() + tick, py), "black", 0.8 * pt);
            text(out, dvec2(r.right() + tick * 2.0, py + font * 0.35), font, "start", label, "");
        } else {
            line(out, dvec2(r.x - tick, py), dvec2(r.x, py), "black", 0.8 * pt);
            text(out, dvec2(r.x - tick * 2.0, py + font * 0.35), font, "end", label, "");
        }
    }

    let label_font = LABEL_FONT * pt;
    text(
        out,
        dvec2(r.x + r.width / 2.0, r.bottom() + tick + font + label_font * 1.6),
        label_font,
        "middle",
        &axes.xaxis.label,
        "",
    );
    let ylabel_at = dvec2(r.x - tick - font * 3.2, r.y + r.height / 2.0);
    text(
        out,
        ylabel_at,
        label_font,
        "middle",
        &axes.yaxis.label,
        &format!(r#" transform="rotate(-90 {:.2} {:.2})""#, ylabel_at.x, ylabel_at.y),
    );
    text(
        out,
        dvec2(r.x + r.width / 2.0, r.y - TITLE_FONT * pt * 0.6),
        TITLE_FONT * pt,
        "middle",
        &axes.title,
        "",
    );

    if axes.legend {
        legend_svg(out, axes, r, pt);
    }
    out.push_str("</g>\n");
}

fn artist_svg(out: &mut String, index: usize, artist: &Artist, t: &DataTransform, pt: f64, opacity: f64) {
    match artist {
        Artist::Line2D(l) => line2d_svg(out, l, t, pt),
        Artist::Rectangle(rect) => {
            let a = t.to_px(dvec2(rect.x, rect.y));
            let b = t.to_px(dvec2(rect.x + rect.width, rect.y + rect.height));
            if !finite(a) || !finite(b) {
                return;
            }
            let _ = writeln!(
                out,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="{opacity}"/>"#,
                a.x.min(b.x),
                a.y.min(b.y),
                (b.x - a.x).abs(),
                (b.y - a.y).abs(),
                color_to_svg(&rect.color)
            );
        }
        Artist::Wedge(w) => wedge_svg(out, w, DVec2::ZERO, t, &color_to_svg(&w.color), opacity),
        Artist::Shadow(shadow) => {
            if let Artist::Wedge(w) = shadow.source.as_ref() {
                wedge_svg(out, w, shadow.offset, t, "black", 0.3);
            }
        }
        Artist::PathCollection(c) => collection_svg(out, c, t, pt),
        Artist::PathPatch(p) => {
            let points: Vec<DVec2> = p.vertices.iter().map(|v| t.to_px(*v)).filter(|v| finite(*v)).collect();
            if points.len() < 2 {
                return;
            }
            let _ = writeln!(
                out,
                r#"<path d="{}Z" fill="{}" stroke="black" stroke-width="{:.2}"/>"#,
                path_data(&points),
                color_to_svg(&p.facecolor),
                pt
            );
        }
        Artist::Text(txt) => {
            let at = t.to_px(txt.position);
            text(out, at, TICK_FONT * pt, anchor_str(txt.anchor), &txt.content, "");
        }
        Artist::ColorbarSolids(_) => {
            let r = t.rect;
            let _ = writeln!(out, r#"<linearGradient id="cmap{index}" x1="0" y1="1" x2="0" y2="0">"#);
            for (offset, _) in VIRIDIS {
                let _ = writeln!(out, r#"<stop offset="{offset}" stop-color="{}"/>"#, colormap(offset));
            }
            out.push_str("</linearGradient>\n");
            let _ = writeln!(
                out,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="url(#cmap{index})"/>"#,
                r.x, r.y, r.width, r.height
            );
        }
    }
}

fn path_data(points: &[DVec2]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let _ = write!(d, "{}{:.2},{:.2} ", if i == 0 { "M" } else { "L" }, p.x, p.y);
    }
    d
}

fn line2d_svg(out: &mut String, l: &Line2D, t: &DataTransform, pt: f64) {
    let color = color_to_svg(&l.color);
    let points: Vec<DVec2> = l
        .points()
        .into_iter()
        .map(|p| {
            let x = match l.x_coords {
                crate::figure::XCoords::Data => p.x,
                crate::figure::XCoords::AxesFraction => t.xlim.0 + (t.xlim.1 - t.xlim.0) * p.x,
            };
            let y = match l.y_coords {
                crate::figure::YCoords::Data => p.y,
                crate::figure::YCoords::AxesFraction => t.ylim.0 + (t.ylim.1 - t.ylim.0) * p.y,
            };
            t.to_px(dvec2(x, y))
        })
        .collect();

    if l.linestyle != LineStyle::None {
        // break the polyline at unrepresentable points
        for run in points.split(|p| !finite(*p)).filter(|run| run.len() >= 2) {
            let dash = l
                .linestyle
                .dasharray()
                .map(|d| format!(r#" stroke-dasharray="{d}""#))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                r#"<path d="{}" fill="none" stroke="{color}" stroke-width="{:.2}" stroke-linejoin="round"{dash}/>"#,
                path_data(run),
                1.5 * pt
            );
        }
    }

    if let Some(marker) = l.marker {
        for p in points.iter().filter(|p| finite(**p)) {
            marker_svg(out, marker, *p, 3.0 * pt, &color);
        }
    }
}

fn marker_svg(out: &mut String, marker: Marker, at: DVec2, size: f64, color: &str) {
    match marker {
        Marker::Circle => {
            let _ = writeln!(out, r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{color}"/>"#, at.x, at.y, size);
        }
        Marker::Point => {
            let _ = writeln!(
                out,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{color}"/>"#,
                at.x,
                at.y,
                size / 2.0
            );
        }
        Marker::Square => {
            let _ = writeln!(
                out,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{color}"/>"#,
                at.x - size,
                at.y - size,
                size * 2.0,
                size * 2.0
            );
        }
        Marker::Triangle => {
            let _ = writeln!(
                out,
                r#"<path d="M{:.2},{:.2} L{:.2},{:.2} L{:.2},{:.2} Z" fill="{color}"/>"#,
                at.x,
                at.y - size,
                at.x + size,
                at.y + size,
                at.x - size,
                at.y + size
            );
        }
        Marker::Plus => {
            line(out, at - dvec2(size, 0.0), at + dvec2(size, 0.0), color, size / 2.0);
            line(out, at - dvec2(0.0, size), at + dvec2(0.0, size), color, size / 2.0);
        }
        Marker::Cross => {
            line(out, at - DVec2::splat(size), at + DVec2::splat(size), color, size / 2.0);
            line(out, at + dvec2(-size, size), at + dvec2(size, -size), color, size / 2.0);
        }
    }
}

fn collection_svg(out: &mut String, c: &PathCollection, t: &DataTransform, pt: f64) {
    let radius = c.size.max(0.0).sqrt() / 2.0 * pt;
    let range = c.array.as_ref().and_then(|values| {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lo <= hi).then_some((lo, hi))
    });
    for (i, offset) in c.offsets.iter().enumerate() {
        let at = t.to_px(*offset);
        if !finite(at) {
            continue;
        }
        let fill = match (&c.array, range) {
            (Some(values), Some((lo, hi))) => {
                let v = values.get(i).copied().unwrap_or(lo);
                colormap(if hi > lo { (v - lo) / (hi - lo) } else { 0.5 })
            }
            _ => color_to_svg(&c.color),
        };
        let _ = writeln!(
            out,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{fill}"/>"#,
            at.x, at.y, radius
        );
    }
}

fn wedge_svg(out: &mut String, w: &Wedge, offset: DVec2, t: &DataTransform, fill: &str, opacity: f64) {
    let center = t.to_px(w.center + offset);
    let radius = w.r * t.x_unit();
    let sweep = w.theta2 - w.theta1;
    if !finite(center) || !radius.is_finite() || radius <= 0.0 || !sweep.is_finite() || sweep <= 0.0 {
        return;
    }
    if sweep >= 359.999 {
        let _ = writeln!(
            out,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{fill}" fill-opacity="{opacity}" stroke="white"/>"#,
            center.x, center.y, radius
        );
        return;
    }
    // screen y grows downward, so counter-clockwise data angles flip
    let at = |deg: f64| {
        let rad = deg.to_radians();
        center + dvec2(rad.cos(), -rad.sin()) * radius
    };
    let (a, b) = (at(w.theta1), at(w.theta2));
    let large = if sweep > 180.0 { 1 } else { 0 };
    let _ = writeln!(
        out,
        r#"<path d="M{:.2},{:.2} L{:.2},{:.2} A{:.2},{:.2} 0 {large} 0 {:.2},{:.2} Z" fill="{fill}" fill-opacity="{opacity}" stroke="white"/>"#,
        center.x, center.y, a.x, a.y, radius, radius, b.x, b.y
    );
}

/// Legend box in the upper right of the data area
fn legend_svg(out: &mut String, axes: &Axes, r: PixelRect, pt: f64) {
    let mut entries: Vec<(&str, String)> = Vec::new();
    for artist in &axes.artists {
        let Some(label) = artist.legend_label() else {
            continue;
        };
        if entries.iter().any(|(l, _)| *l == label) {
            continue;
        }
        let color = match artist {
            Artist::Line2D(l) => color_to_svg(&l.color),
            Artist::Rectangle(rect) => color_to_svg(&rect.color),
            Artist::Wedge(w) => color_to_svg(&w.color),
            Artist::PathCollection(c) => color_to_svg(&c.color),
            Artist::PathPatch(p) => color_to_svg(&p.facecolor),
            _ => "black".to_string(),
        };
        entries.push((label, color));
    }
    if entries.is_empty() {
        return;
    }

    let font = TICK_FONT * pt;
    let row = font * 1.5;
    let longest = entries.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0) as f64;
    let width = font * (2.5 + longest * 0.6);
    let height = row * entries.len() as f64 + font * 0.5;
    let x = r.right() - width - font * 0.5;
    let y = r.y + font * 0.5;
    let _ = writeln!(
        out,
        r##"<rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" fill="white" fill-opacity="0.8" stroke="#cccccc"/>"##
    );
    for (i, (label, color)) in entries.iter().enumerate() {
        let cy = y + font * 0.25 + row * (i as f64 + 0.5);
        let _ = writeln!(
            out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{color}"/>"#,
            x + font * 0.4,
            cy - font * 0.35,
            font * 1.2,
            font * 0.7
        );
        text(out, dvec2(x + font * 2.0, cy + font * 0.35), font, "start", label, "");
    }
}
