//! Brand palette and the risk-color resolver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::RiskLevel;
use crate::Error;

/// An sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn hex(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Components scaled to `0.0..=1.0` for PDF color operators.
    pub fn unit_rgb(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        let bad = || Error::ConfigError(format!("invalid color '{}'", s));
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return Err(bad());
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| bad());
        let a = if digits.len() == 8 { byte(6)? } else { 255 };
        Ok(Color { r: byte(0)?, g: byte(2)?, b: byte(4)?, a })
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Alpha used for the translucent risk pill background.
pub const PILL_TINT_ALPHA: u8 = 0x28;
/// Alpha used for gauge bars that do not match the record's level.
pub const DIMMED_BAR_ALPHA: u8 = 0x40;

/// Named colors used by the compositor. Constant for the life of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub green: Color,
    pub teal: Color,
    pub blue: Color,
    pub dark_bg: Color,
    pub dark_card: Color,
    pub white: Color,
    pub off_white: Color,
    pub muted: Color,
    pub text: Color,
    pub text_light: Color,
    pub red: Color,
    pub amber: Color,
    pub good: Color,
    pub very_high: Color,
    pub border: Color,
    pub light_gray: Color,
    pub mid_gray: Color,
    pub positive_strip: Color,
    pub positive_pill: Color,
    pub negative_strip: Color,
    pub negative_pill: Color,
    pub disclaimer_fill: Color,
    pub disclaimer_border: Color,
    pub disclaimer_text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            green: Color::hex(0x059669),
            teal: Color::hex(0x0d9488),
            blue: Color::hex(0x0284c7),
            dark_bg: Color::hex(0x0b1a12),
            dark_card: Color::hex(0x0f2018),
            white: Color::hex(0xffffff),
            off_white: Color::hex(0xf0fdf4),
            muted: Color::hex(0x6b9e82),
            text: Color::hex(0x0c1f15),
            text_light: Color::hex(0x2d5c41),
            red: Color::hex(0xef4444),
            amber: Color::hex(0xf59e0b),
            good: Color::hex(0x10b981),
            very_high: Color::hex(0xdc2626),
            border: Color::hex(0xc2dfd0),
            light_gray: Color::hex(0xf4f9f6),
            mid_gray: Color::hex(0xe6f4ed),
            positive_strip: Color::hex(0xfef2f2),
            positive_pill: Color::hex(0xfee2e2),
            negative_strip: Color::hex(0xf0fdf4),
            negative_pill: Color::hex(0xdcfce7),
            disclaimer_fill: Color::hex(0xfffbeb),
            disclaimer_border: Color::hex(0xfcd34d),
            disclaimer_text: Color::hex(0x92400e),
        }
    }
}

impl Theme {
    /// Color for a risk level. Total: unknown or absent levels get `muted`.
    pub fn risk_color(&self, level: Option<&RiskLevel>) -> Color {
        match level {
            Some(RiskLevel::Low) => self.good,
            Some(RiskLevel::Moderate) => self.amber,
            Some(RiskLevel::High) => self.red,
            Some(RiskLevel::VeryHigh) => self.very_high,
            Some(RiskLevel::Other(_)) | None => self.muted,
        }
    }

    /// Same as [`Theme::risk_color`] for a raw label such as `"Very High"`.
    pub fn risk_color_for_label(&self, label: &str) -> Color {
        self.risk_color(Some(&RiskLevel::from(label)))
    }

    /// Accent color for the outcome: red when positive, green otherwise.
    pub fn outcome_color(&self, positive: bool) -> Color {
        if positive {
            self.red
        } else {
            self.good
        }
    }
}
