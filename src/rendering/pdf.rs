//! Serialize a display list into a single-page PDF.
//!
//! Output carries no timestamps and the trailer ID is derived from the
//! content stream, so equal display lists always give equal bytes.

use std::collections::BTreeMap;

use pdf_writer::types::{LineCapStyle, LineJoinStyle};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect as PdfRect, Ref, Str, TextStr};
use sha2::{Digest, Sha256};

use crate::rendering::layout::Rect;
use crate::rendering::metrics::{
    ascent, encode_winansi, limit_lines, line_height, text_width, wrap_text, FontWeight,
};
use crate::rendering::paint::{Align, DisplayList, PaintCommand, Point, Stroke, TextStyle};
use crate::rendering::palette::Color;
use crate::{Error, Result};

/// Bézier control-point factor for quarter circles.
const KAPPA: f32 = 0.552_284_8;

const REGULAR_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");

#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    /// Flate-compress the content stream
    pub compress: bool,
    /// Document title written to the info dictionary
    pub title: String,
    pub producer: String,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            compress: true,
            title: String::new(),
            producer: "healthguard-report".to_string(),
        }
    }
}

fn font_name(weight: FontWeight) -> Name<'static> {
    match weight {
        FontWeight::Regular => REGULAR_FONT,
        FontWeight::Bold => BOLD_FONT,
    }
}

fn gs_name(alpha: u8) -> String {
    format!("GA{}", alpha)
}

fn effective_alpha(color: Color, opacity: f32) -> u8 {
    (color.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8
}

/// Every translucent alpha value used by the list, each needing an ExtGState.
fn collect_alphas(list: &DisplayList) -> Vec<u8> {
    let mut seen = std::collections::BTreeSet::new();
    let mut add = |a: u8| {
        if a < 255 {
            seen.insert(a);
        }
    };
    for cmd in &list.commands {
        match cmd {
            PaintCommand::FillRect { color, .. } | PaintCommand::Circle { fill: color, .. } => add(color.a),
            PaintCommand::StrokeRect { stroke, .. } | PaintCommand::Polyline { stroke, .. } => {
                add(stroke.color.a)
            }
            PaintCommand::RoundedRect { fill, stroke, .. } => {
                if let Some(f) = fill {
                    add(f.a);
                }
                if let Some(s) = stroke {
                    add(s.color.a);
                }
            }
            PaintCommand::Polygon { fill, opacity, .. } => add(effective_alpha(*fill, *opacity)),
            PaintCommand::Text { style, .. } => add(style.color.a),
        }
    }
    seen.into_iter().collect()
}

fn check_finite(values: &[f32]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::RenderError(format!("non-finite coordinate in {:?}", values)))
    }
}

fn check_rect(r: &Rect) -> Result<()> {
    check_finite(&[r.x, r.y, r.width, r.height])
}

fn check_points(points: &[Point], min: usize, what: &str) -> Result<()> {
    if points.len() < min {
        return Err(Error::RenderError(format!(
            "{} needs at least {} points, got {}",
            what,
            min,
            points.len()
        )));
    }
    for p in points {
        check_finite(&[p.x, p.y])?;
    }
    Ok(())
}

/// Writes paint commands into a content stream, flipping page space
/// (top-left origin) into PDF user space (bottom-left origin).
struct Painter {
    content: Content,
    height: f32,
}

impl Painter {
    fn new(height: f32) -> Self {
        Self {
            content: Content::new(),
            height,
        }
    }

    fn flip(&self, y: f32) -> f32 {
        self.height - y
    }

    fn with_alpha(&mut self, alpha: u8) {
        if alpha < 255 {
            self.content.set_parameters(Name(gs_name(alpha).as_bytes()));
        }
    }

    fn fill_color(&mut self, c: Color) {
        let (r, g, b) = c.unit_rgb();
        self.content.set_fill_rgb(r, g, b);
    }

    fn stroke_style(&mut self, s: &Stroke) {
        let (r, g, b) = s.color.unit_rgb();
        self.content.set_stroke_rgb(r, g, b);
        self.content.set_line_width(s.width);
    }

    fn rect_path(&mut self, r: &Rect) {
        let bottom = self.flip(r.y + r.height);
        self.content.rect(r.x, bottom, r.width, r.height);
    }

    fn rounded_path(&mut self, r: &Rect, radius: f32) {
        let rad = radius.min(r.width / 2.0).min(r.height / 2.0).max(0.0);
        let k = rad * KAPPA;
        let (x0, x1) = (r.x, r.x + r.width);
        let (y0, y1) = (self.flip(r.y + r.height), self.flip(r.y));
        let c = &mut self.content;
        c.move_to(x0 + rad, y0);
        c.line_to(x1 - rad, y0);
        c.cubic_to(x1 - rad + k, y0, x1, y0 + rad - k, x1, y0 + rad);
        c.line_to(x1, y1 - rad);
        c.cubic_to(x1, y1 - rad + k, x1 - rad + k, y1, x1 - rad, y1);
        c.line_to(x0 + rad, y1);
        c.cubic_to(x0 + rad - k, y1, x0, y1 - rad + k, x0, y1 - rad);
        c.line_to(x0, y0 + rad);
        c.cubic_to(x0, y0 + rad - k, x0 + rad - k, y0, x0 + rad, y0);
        c.close_path();
    }

    fn circle_path(&mut self, center: Point, r: f32) {
        let k = r * KAPPA;
        let cx = center.x;
        let cy = self.flip(center.y);
        let c = &mut self.content;
        c.move_to(cx + r, cy);
        c.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
        c.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
        c.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
        c.cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
        c.close_path();
    }

    fn points_path(&mut self, points: &[Point]) {
        let ys: Vec<f32> = points.iter().map(|p| self.flip(p.y)).collect();
        if let (Some(first), Some(y)) = (points.first(), ys.first()) {
            self.content.move_to(first.x, *y);
        }
        for (p, y) in points.iter().zip(ys.iter()).skip(1) {
            self.content.line_to(p.x, *y);
        }
    }

    fn paint(&mut self, cmd: &PaintCommand) -> Result<()> {
        match cmd {
            PaintCommand::FillRect { rect, color } => {
                check_rect(rect)?;
                self.content.save_state();
                self.with_alpha(color.a);
                self.fill_color(*color);
                self.rect_path(rect);
                self.content.fill_nonzero();
                self.content.restore_state();
            }
            PaintCommand::StrokeRect { rect, stroke } => {
                check_rect(rect)?;
                self.content.save_state();
                self.with_alpha(stroke.color.a);
                self.stroke_style(stroke);
                self.rect_path(rect);
                self.content.stroke();
                self.content.restore_state();
            }
            PaintCommand::RoundedRect { rect, radius, fill, stroke } => {
                check_rect(rect)?;
                check_finite(&[*radius])?;
                if let Some(color) = fill {
                    self.content.save_state();
                    self.with_alpha(color.a);
                    self.fill_color(*color);
                    self.rounded_path(rect, *radius);
                    self.content.fill_nonzero();
                    self.content.restore_state();
                }
                if let Some(s) = stroke {
                    self.content.save_state();
                    self.with_alpha(s.color.a);
                    self.stroke_style(s);
                    self.rounded_path(rect, *radius);
                    self.content.stroke();
                    self.content.restore_state();
                }
            }
            PaintCommand::Polygon { points, fill, opacity } => {
                check_points(points, 3, "polygon")?;
                self.content.save_state();
                self.with_alpha(effective_alpha(*fill, *opacity));
                self.fill_color(*fill);
                self.points_path(points);
                self.content.close_path();
                self.content.fill_nonzero();
                self.content.restore_state();
            }
            PaintCommand::Polyline { points, stroke } => {
                check_points(points, 2, "polyline")?;
                self.content.save_state();
                self.with_alpha(stroke.color.a);
                self.stroke_style(stroke);
                self.content.set_line_cap(LineCapStyle::RoundCap);
                self.content.set_line_join(LineJoinStyle::RoundJoin);
                self.points_path(points);
                self.content.stroke();
                self.content.restore_state();
            }
            PaintCommand::Circle { center, radius, fill } => {
                check_finite(&[center.x, center.y, *radius])?;
                self.content.save_state();
                self.with_alpha(fill.a);
                self.fill_color(*fill);
                self.circle_path(*center, *radius);
                self.content.fill_nonzero();
                self.content.restore_state();
            }
            PaintCommand::Text { content, x, y, style } => {
                check_finite(&[*x, *y, style.size])?;
                self.text(content, *x, *y, style);
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) {
        let lines = layout_lines(text, style);
        let pitch = line_height(style.size, style.line_gap);
        self.content.save_state();
        self.with_alpha(style.color.a);
        self.fill_color(style.color);
        self.content.begin_text();
        self.content.set_font(font_name(style.weight), style.size);
        if style.letter_spacing != 0.0 {
            self.content.set_char_spacing(style.letter_spacing);
        }
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let line_w = text_width(line, style.size, style.weight, style.letter_spacing);
            let dx = match (style.width, style.align) {
                (Some(w), Align::Center) => (w - line_w) / 2.0,
                (Some(w), Align::Right) => w - line_w,
                _ => 0.0,
            };
            let baseline = self.flip(y + ascent(style.size) + i as f32 * pitch);
            self.content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x + dx, baseline]);
            self.content.show(Str(&encode_winansi(line)));
        }
        self.content.end_text();
        self.content.restore_state();
    }
}

/// Lines a text command occupies once wrapped and truncated.
pub fn layout_lines(text: &str, style: &TextStyle) -> Vec<String> {
    match style.width {
        Some(w) => {
            let lines = wrap_text(text, w, style.size, style.weight, style.letter_spacing);
            match style.max_lines {
                Some(max) => limit_lines(lines, max, w, style.size, style.weight, style.letter_spacing),
                None => lines,
            }
        }
        None => vec![text.to_string()],
    }
}

/// Encode `list` as a one-page PDF document.
pub fn serialize(list: &DisplayList, opts: &PdfOptions) -> Result<Vec<u8>> {
    check_finite(&[list.width, list.height])?;
    if list.width <= 0.0 || list.height <= 0.0 {
        return Err(Error::RenderError(format!(
            "page size {}x{} is empty",
            list.width, list.height
        )));
    }

    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let content_id = Ref::new(4);
    let regular_id = Ref::new(5);
    let bold_id = Ref::new(6);
    let info_id = Ref::new(7);
    let mut next = 8;
    let states: BTreeMap<u8, Ref> = collect_alphas(list)
        .into_iter()
        .map(|a| {
            let r = Ref::new(next);
            next += 1;
            (a, r)
        })
        .collect();

    let mut painter = Painter::new(list.height);
    for cmd in &list.commands {
        painter.paint(cmd)?;
    }
    let raw = painter.content.finish();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(PdfRect::new(0.0, 0.0, list.width, list.height))
        .parent(tree_id)
        .contents(content_id);
    {
        let mut resources = page.resources();
        resources
            .fonts()
            .pair(REGULAR_FONT, regular_id)
            .pair(BOLD_FONT, bold_id);
        if !states.is_empty() {
            let mut gs = resources.ext_g_states();
            for (alpha, r) in &states {
                gs.pair(Name(gs_name(*alpha).as_bytes()), *r);
            }
        }
    }
    page.finish();

    for (weight, id) in [(FontWeight::Regular, regular_id), (FontWeight::Bold, bold_id)] {
        pdf.type1_font(id)
            .base_font(Name(weight.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }
    for (alpha, r) in &states {
        let a = *alpha as f32 / 255.0;
        pdf.ext_graphics(*r).non_stroking_alpha(a).stroking_alpha(a);
    }

    let mut info = pdf.document_info(info_id);
    if !opts.title.is_empty() {
        info.title(TextStr(&opts.title));
    }
    info.producer(TextStr(&opts.producer));
    info.finish();

    let digest = Sha256::digest(&raw);
    let file_id = digest[..16].to_vec();
    pdf.set_file_id((file_id.clone(), file_id));

    if opts.compress {
        let packed = miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6);
        pdf.stream(content_id, &packed).filter(Filter::FlateDecode);
    } else {
        pdf.stream(content_id, &raw);
    }

    Ok(pdf.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::paint::Surface;

    fn sample() -> DisplayList {
        let mut dl = DisplayList::new(200.0, 100.0);
        dl.fill_rect(Rect::new(0.0, 0.0, 200.0, 100.0), Color::hex(0xffffff));
        dl.rounded_rect(
            Rect::new(10.0, 10.0, 80.0, 40.0),
            7.0,
            Some(Color::hex(0xf4f9f6)),
            Some(Stroke::new(Color::hex(0xc2dfd0), 0.7)),
        );
        dl.polygon(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 8.0)],
            Color::hex(0x0d9488),
            0.4,
        );
        dl.text("Hi \u{2014} there", 12.0, 12.0, &TextStyle::bold(9.0, Color::hex(0x059669)));
        dl
    }

    fn plain() -> PdfOptions {
        PdfOptions { compress: false, ..Default::default() }
    }

    #[test]
    fn writes_a_pdf_document() {
        let bytes = serialize(&sample(), &PdfOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let tail = String::from_utf8_lossy(&bytes[bytes.len() - 64..]).to_string();
        assert!(tail.contains("%%EOF"));
    }

    #[test]
    fn uncompressed_stream_is_readable() {
        let bytes = serialize(&sample(), &plain()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Helvetica-Bold"));
        assert!(text.contains("/WinAnsiEncoding"));
        assert!(text.contains("/GA102"));
        assert!(text.contains("/MediaBox"));
    }

    #[test]
    fn same_list_same_bytes() {
        let a = serialize(&sample(), &PdfOptions::default()).unwrap();
        let b = serialize(&sample(), &PdfOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn translucent_states_are_deduplicated() {
        let mut dl = sample();
        dl.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::hex(0).with_alpha(102));
        dl.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::hex(0).with_alpha(0x40));
        assert_eq!(collect_alphas(&dl), vec![0x40, 102]);
    }

    #[test]
    fn non_finite_geometry_is_a_render_error() {
        let mut dl = sample();
        dl.fill_rect(Rect::new(f32::NAN, 0.0, 1.0, 1.0), Color::hex(0));
        let err = serialize(&dl, &plain()).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::Render);
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let mut dl = DisplayList::new(10.0, 10.0);
        dl.polygon(&[Point::new(0.0, 0.0)], Color::hex(0), 1.0);
        assert!(serialize(&dl, &plain()).is_err());
        assert!(serialize(&DisplayList::new(0.0, 10.0), &plain()).is_err());
    }

    #[test]
    fn layout_lines_wraps_and_truncates() {
        let style = TextStyle::regular(7.0, Color::hex(0)).width(40.0);
        assert!(layout_lines("one two three four five six", &style).len() > 1);
        let one = layout_lines("one two three four five six", &style.max_lines(1));
        assert_eq!(one.len(), 1);
        assert!(one[0].ends_with('\u{2026}'));
        let free = TextStyle::regular(7.0, Color::hex(0));
        assert_eq!(layout_lines("a b", &free), vec!["a b".to_string()]);
    }
}
