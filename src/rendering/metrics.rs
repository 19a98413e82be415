//! Text metrics for the two standard fonts the report uses.
//!
//! Widths are the Adobe AFM advance widths (units per 1000 em) for the
//! printable ASCII range of Helvetica and Helvetica-Bold. Characters outside
//! that range are mapped to WinAnsi where possible and measured as such.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontWeight {
    Regular,
    Bold,
}

impl FontWeight {
    /// PostScript name of the standard font for this weight.
    pub fn base_font(&self) -> &'static str {
        match self {
            FontWeight::Regular => "Helvetica",
            FontWeight::Bold => "Helvetica-Bold",
        }
    }
}

const ASCENT: f32 = 0.718;
const LINE_HEIGHT: f32 = 1.15;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Map a char to its WinAnsiEncoding byte. Unsupported chars become `?`.
pub fn winansi_byte(ch: char) -> u8 {
    match ch {
        ' '..='~' => ch as u8,
        '\u{2014}' => 0x97,
        '\u{2026}' => 0x85,
        '\u{2013}' => 0x96,
        '\u{2022}' => 0x95,
        '\u{2019}' => 0x92,
        '\u{2018}' => 0x91,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{00A0}'..='\u{00FF}' => ch as u32 as u8,
        _ => b'?',
    }
}

/// Encode a string for a WinAnsi-encoded standard font.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars().map(winansi_byte).collect()
}

fn byte_width(byte: u8, weight: FontWeight) -> u16 {
    let table = match weight {
        FontWeight::Regular => &HELVETICA,
        FontWeight::Bold => &HELVETICA_BOLD,
    };
    match byte {
        0x20..=0x7e => table[(byte - 0x20) as usize],
        0x97 | 0x85 => 1000,
        0x96 => 556,
        0x95 => 350,
        0x91 | 0x92 => match weight {
            FontWeight::Regular => 222,
            FontWeight::Bold => 278,
        },
        0x93 | 0x94 => 500,
        0xb7 => 278,
        _ => 556,
    }
}

/// Advance width of `text` in points, including per-glyph letter spacing.
pub fn text_width(text: &str, size: f32, weight: FontWeight, letter_spacing: f32) -> f32 {
    let mut units = 0u32;
    let mut glyphs = 0u32;
    for ch in text.chars() {
        units += byte_width(winansi_byte(ch), weight) as u32;
        glyphs += 1;
    }
    units as f32 * size / 1000.0 + letter_spacing * glyphs as f32
}

/// Distance from the top of a line box to its baseline.
pub fn ascent(size: f32) -> f32 {
    size * ASCENT
}

/// Vertical advance between consecutive lines.
pub fn line_height(size: f32, line_gap: f32) -> f32 {
    size * LINE_HEIGHT + line_gap
}

/// Greedy word wrap to `max_width`. Explicit newlines always break. A single
/// word wider than the limit is kept whole on its own line.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    size: f32,
    weight: FontWeight,
    letter_spacing: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut cur = String::new();
        for word in paragraph.split_whitespace() {
            if cur.is_empty() {
                cur.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", cur, word);
            if text_width(&candidate, size, weight, letter_spacing) > max_width {
                lines.push(std::mem::take(&mut cur));
                cur.push_str(word);
            } else {
                cur = candidate;
            }
        }
        lines.push(cur);
    }
    lines
}

/// Keep at most `max_lines` lines. When lines are dropped, or the last kept
/// line is a single word wider than `max_width`, that line is shortened
/// until it fits with a trailing ellipsis.
pub fn limit_lines(
    mut lines: Vec<String>,
    max_lines: usize,
    max_width: f32,
    size: f32,
    weight: FontWeight,
    letter_spacing: f32,
) -> Vec<String> {
    if max_lines == 0 {
        return lines;
    }
    let dropped = lines.len() > max_lines;
    lines.truncate(max_lines);
    let too_wide = lines
        .last()
        .is_some_and(|l| text_width(l, size, weight, letter_spacing) > max_width);
    if !dropped && !too_wide {
        return lines;
    }
    if let Some(last) = lines.last_mut() {
        let mut base: Vec<char> = last.chars().collect();
        loop {
            let candidate = format!("{}\u{2026}", base.iter().collect::<String>().trim_end());
            if base.is_empty() || text_width(&candidate, size, weight, letter_spacing) <= max_width {
                *last = candidate;
                break;
            }
            base.pop();
        }
    }
    lines
}
