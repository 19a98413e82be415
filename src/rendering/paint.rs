//! Paint commands and the drawing surface they are recorded on.
//!
//! Every primitive is fully parameterized: there is no pen position, current
//! font or fill state carried between calls. Replaying the same sequence of
//! calls always yields the same display list.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::rendering::layout::Rect;
use crate::rendering::metrics::FontWeight;
use crate::rendering::palette::Color;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

impl Stroke {
    pub const fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Everything needed to place a run of text.
///
/// With `width` set the run is word-wrapped to that width and aligned inside
/// it; without it the run is a single line starting at `x`. `max_lines`
/// truncates wrapped output with an ellipsis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size: f32,
    pub weight: FontWeight,
    pub color: Color,
    pub width: Option<f32>,
    pub align: Align,
    pub line_gap: f32,
    pub letter_spacing: f32,
    pub max_lines: Option<usize>,
}

impl TextStyle {
    pub fn new(size: f32, weight: FontWeight, color: Color) -> Self {
        Self {
            size,
            weight,
            color,
            width: None,
            align: Align::Left,
            line_gap: 0.0,
            letter_spacing: 0.0,
            max_lines: None,
        }
    }

    pub fn regular(size: f32, color: Color) -> Self {
        Self::new(size, FontWeight::Regular, color)
    }

    pub fn bold(size: f32, color: Color) -> Self {
        Self::new(size, FontWeight::Bold, color)
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn line_gap(mut self, gap: f32) -> Self {
        self.line_gap = gap;
        self
    }

    pub fn letter_spacing(mut self, spacing: f32) -> Self {
        self.letter_spacing = spacing;
        self
    }

    pub fn max_lines(mut self, lines: usize) -> Self {
        self.max_lines = Some(lines);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaintCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        stroke: Stroke,
    },
    RoundedRect {
        rect: Rect,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Polygon {
        points: Vec<Point>,
        fill: Color,
        opacity: f32,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
    },
    Circle {
        center: Point,
        radius: f32,
        fill: Color,
    },
    Text {
        content: String,
        x: f32,
        y: f32,
        style: TextStyle,
    },
}

/// Primitive drawing operations over a fixed-size page.
///
/// Coordinates are page space: origin top-left, y grows downward, units are
/// points.
pub trait Surface {
    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke);

    fn rounded_rect(&mut self, rect: Rect, radius: f32, fill: Option<Color>, stroke: Option<Stroke>);

    /// Closed, filled polygon. `opacity` multiplies the color's own alpha.
    fn polygon(&mut self, points: &[Point], fill: Color, opacity: f32);

    /// Open connected line segments.
    fn polyline(&mut self, points: &[Point], stroke: Stroke);

    fn circle(&mut self, center: Point, radius: f32, fill: Color);

    /// Text whose line box top-left is at `(x, y)`.
    fn text(&mut self, content: &str, x: f32, y: f32, style: &TextStyle);
}

/// A surface that records commands in call order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayList {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<PaintCommand>,
}

impl DisplayList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Text commands as `(content, style)` pairs, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = (&str, &TextStyle)> {
        self.commands.iter().filter_map(|c| match c {
            PaintCommand::Text { content, style, .. } => Some((content.as_str(), style)),
            _ => None,
        })
    }

    /// Find the first text command with exactly this content.
    pub fn find_text(&self, needle: &str) -> Option<&PaintCommand> {
        self.commands
            .iter()
            .find(|c| matches!(c, PaintCommand::Text { content, .. } if content == needle))
    }

    /// Hex SHA-256 over the canonical JSON encoding of the commands.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        for cmd in &self.commands {
            // Serializing plain data into a Vec cannot fail.
            if let Ok(bytes) = serde_json::to_vec(cmd) {
                hasher.update(&bytes);
            }
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

impl Surface for DisplayList {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        self.commands.push(PaintCommand::StrokeRect { rect, stroke });
    }

    fn rounded_rect(&mut self, rect: Rect, radius: f32, fill: Option<Color>, stroke: Option<Stroke>) {
        self.commands.push(PaintCommand::RoundedRect { rect, radius, fill, stroke });
    }

    fn polygon(&mut self, points: &[Point], fill: Color, opacity: f32) {
        self.commands.push(PaintCommand::Polygon {
            points: points.to_vec(),
            fill,
            opacity: opacity.clamp(0.0, 1.0),
        });
    }

    fn polyline(&mut self, points: &[Point], stroke: Stroke) {
        self.commands.push(PaintCommand::Polyline { points: points.to_vec(), stroke });
    }

    fn circle(&mut self, center: Point, radius: f32, fill: Color) {
        self.commands.push(PaintCommand::Circle { center, radius, fill });
    }

    fn text(&mut self, content: &str, x: f32, y: f32, style: &TextStyle) {
        self.commands.push(PaintCommand::Text {
            content: content.to_string(),
            x,
            y,
            style: *style,
        });
    }
}
