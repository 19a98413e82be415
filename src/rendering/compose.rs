//! The compositor: draws a report onto a [`Surface`] in one fixed pass.
//!
//! Geometry comes from [`ReportLayout`], colors from [`Theme`]. The stage
//! order never changes and no stage looks at what an earlier one drew, so a
//! given record always produces the same sequence of surface calls.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};
use log::{debug, warn};

use crate::record::{humanize_key, RiskLevel, ReportRecord};
use crate::rendering::layout::{ReportLayout, Rect};
use crate::rendering::metrics::text_width;
use crate::rendering::paint::{Align, Point, Stroke, Surface, TextStyle};
use crate::rendering::palette::{Theme, DIMMED_BAR_ALPHA, PILL_TINT_ALPHA};
use crate::{Brand, ReportConfig};

/// Boilerplate drawn in the disclaimer band.
pub const DISCLAIMER: &str = "DISCLAIMER: This AI-generated report is not a substitute for professional \
medical advice, diagnosis, or treatment. Always consult a qualified healthcare provider before making \
health decisions.";

/// Draw stages, in the only order they ever run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Background,
    Header,
    AccentBar,
    SummaryRow,
    ParameterGrid,
    RecommendationsRow,
    Disclaimer,
    Footer,
}

impl Stage {
    pub const SEQUENCE: [Stage; 8] = [
        Stage::Background,
        Stage::Header,
        Stage::AccentBar,
        Stage::SummaryRow,
        Stage::ParameterGrid,
        Stage::RecommendationsRow,
        Stage::Disclaimer,
        Stage::Footer,
    ];
}

/// Outline of a shield as fractions of the logo square.
struct ShieldProfile {
    apex: f32,
    side: f32,
    shoulder: f32,
    lower: f32,
    base: f32,
}

const OUTER_SHIELD: ShieldProfile = ShieldProfile {
    apex: 0.06,
    side: 0.12,
    shoulder: 0.22,
    lower: 0.53,
    base: 0.94,
};

const INNER_SHIELD: ShieldProfile = ShieldProfile {
    apex: 0.13,
    side: 0.20,
    shoulder: 0.26,
    lower: 0.52,
    base: 0.88,
};

/// EKG motif: (x fraction of logo, y offset fraction from the logo midline).
const PULSE: [(f32, f32); 8] = [
    (0.22, 0.0),
    (0.30, 0.0),
    (0.37, -0.12),
    (0.44, 0.12),
    (0.50, -0.09),
    (0.56, 0.06),
    (0.60, 0.0),
    (0.72, 0.0),
];

/// The six shield vertices: apex, right shoulder, right lower, base, left
/// lower, left shoulder.
fn shield_points(logo: Rect, p: &ShieldProfile) -> [Point; 6] {
    let s = logo.width;
    let cx = logo.x + s / 2.0;
    let at = |fx: f32, fy: f32| Point::new(logo.x + s * fx, logo.y + s * fy);
    [
        Point::new(cx, logo.y + s * p.apex),
        at(1.0 - p.side, p.shoulder),
        at(1.0 - p.side, p.lower),
        Point::new(cx, logo.y + s * p.base),
        at(p.side, p.lower),
        at(p.side, p.shoulder),
    ]
}

/// Format the generation timestamp the way the report shows it.
pub fn format_timestamp(at: &DateTime<Utc>, utc_offset_minutes: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
        .unwrap_or_else(|| Utc.fix());
    at.with_timezone(&offset)
        .format("%-d %b %Y, %-I:%M %P")
        .to_string()
}

pub struct Compositor<'a> {
    record: &'a ReportRecord,
    layout: &'a ReportLayout,
    theme: &'a Theme,
    brand: &'a Brand,
    radius: f32,
    inset: f32,
    utc_offset_minutes: i32,
}

impl<'a> Compositor<'a> {
    pub fn new(record: &'a ReportRecord, layout: &'a ReportLayout, config: &'a ReportConfig) -> Self {
        Self {
            record,
            layout,
            theme: &config.theme,
            brand: &config.brand,
            radius: config.page.card_radius,
            inset: config.page.title_inset,
            utc_offset_minutes: config.utc_offset_minutes,
        }
    }

    /// Run every stage in order.
    pub fn draw<S: Surface>(&self, surface: &mut S) {
        if let Some(RiskLevel::Other(label)) = &self.record.result.risk_level {
            warn!(
                "report {}: unknown risk level '{}', using neutral color",
                self.record.report_id, label
            );
        }
        if self.record.result.probability_out_of_range() {
            warn!(
                "report {}: probability {:?} outside 0-100, clamped for display",
                self.record.report_id, self.record.result.probability
            );
        }
        for stage in Stage::SEQUENCE {
            debug!("report {}: drawing {:?}", self.record.report_id, stage);
            self.draw_stage(stage, surface);
        }
    }

    pub fn draw_stage<S: Surface>(&self, stage: Stage, surface: &mut S) {
        match stage {
            Stage::Background => surface.fill_rect(self.layout.page, self.theme.white),
            Stage::Header => self.header(surface),
            Stage::AccentBar => surface.fill_rect(self.layout.accent_bar, self.theme.green),
            Stage::SummaryRow => {
                self.patient_card(surface);
                self.result_card(surface);
            }
            Stage::ParameterGrid => self.parameter_grid(surface),
            Stage::RecommendationsRow => {
                self.recommendations(surface);
                self.risk_gauge(surface);
            }
            Stage::Disclaimer => self.disclaimer(surface),
            Stage::Footer => self.footer(surface),
        }
    }

    fn card<S: Surface>(&self, surface: &mut S, rect: Rect) {
        surface.rounded_rect(
            rect,
            self.radius,
            Some(self.theme.light_gray),
            Some(Stroke::new(self.theme.border, 0.7)),
        );
    }

    /// Uppercase title with an underline rule.
    fn section_title<S: Surface>(&self, surface: &mut S, text: &str, x: f32, y: f32, rule: f32) {
        let style = TextStyle::bold(7.5, self.theme.teal).letter_spacing(0.8);
        surface.text(&text.to_uppercase(), x, y, &style);
        surface.polyline(
            &[Point::new(x, y + 12.0), Point::new(x + rule, y + 12.0)],
            Stroke::new(self.theme.border, 0.5),
        );
    }

    fn header<S: Surface>(&self, surface: &mut S) {
        let t = self.theme;
        let logo = self.layout.logo;
        surface.fill_rect(self.layout.header, t.dark_bg);

        surface.polygon(&shield_points(logo, &OUTER_SHIELD), t.green, 1.0);
        surface.polygon(&shield_points(logo, &INNER_SHIELD), t.teal, 0.4);

        let s = logo.width;
        let cx = logo.x + s / 2.0;
        surface.fill_rect(Rect::new(cx - s * 0.06, logo.y + s * 0.31, s * 0.12, s * 0.38), t.white);
        surface.fill_rect(Rect::new(cx - s * 0.19, logo.y + s * 0.44, s * 0.38, s * 0.12), t.white);

        let mid = logo.y + s * 0.5;
        let pulse: Vec<Point> = PULSE
            .iter()
            .map(|&(fx, fy)| Point::new(logo.x + s * fx, mid + s * fy))
            .collect();
        surface.polyline(&pulse, Stroke::new(t.white.with_alpha(230), s * 0.04));

        // Two-tone wordmark
        let brand_x = logo.x + s + 8.0;
        let lead = TextStyle::bold(22.0, t.white);
        surface.text(&self.brand.name_lead, brand_x, 22.0, &lead);
        let lead_w = text_width(&self.brand.name_lead, lead.size, lead.weight, 0.0);
        surface.text(&self.brand.name_accent, brand_x + lead_w, 22.0, &TextStyle::bold(22.0, t.green));
        surface.text(&self.brand.tagline, brand_x, 47.0, &TextStyle::regular(9.0, t.muted));

        let meta = self.layout.meta;
        let right = |style: TextStyle| style.width(meta.width).align(Align::Right);
        let created = format_timestamp(&self.record.created_at, self.utc_offset_minutes);
        surface.text("REPORT ID", meta.x, meta.y, &right(TextStyle::regular(7.5, t.muted)));
        surface.text(
            self.record.report_id_display(),
            meta.x,
            meta.y + 10.0,
            &right(TextStyle::bold(9.0, t.green)),
        );
        surface.text("GENERATED", meta.x, meta.y + 30.0, &right(TextStyle::regular(7.5, t.muted)));
        surface.text(&created, meta.x, meta.y + 40.0, &right(TextStyle::regular(8.0, t.white)));
    }

    fn patient_card<S: Surface>(&self, surface: &mut S) {
        let t = self.theme;
        let card = self.layout.patient_card;
        self.card(surface, card);
        let x = card.x + self.inset;
        self.section_title(surface, "Patient Information", x, card.y + self.inset, self.rule(card));

        let label_w = 62.0;
        let rows = [
            ("Name", self.record.patient_name_display().to_string()),
            ("Age", self.record.patient_age_display()),
            ("Gender", self.record.patient_gender_display().to_string()),
            ("Disease", self.record.disease_display()),
        ];
        let value_w = card.width - 2.0 * self.inset - label_w - 2.0;
        let mut y = card.y + self.inset + 17.0;
        for (label, value) in rows {
            surface.text(
                &format!("{}:", label),
                x,
                y,
                &TextStyle::regular(8.0, t.muted).width(label_w),
            );
            surface.text(
                &value,
                x + label_w + 2.0,
                y,
                &TextStyle::bold(8.0, t.text).width(value_w).max_lines(1),
            );
            y += 16.0;
        }
    }

    fn result_card<S: Surface>(&self, surface: &mut S) {
        let t = self.theme;
        let card = self.layout.result_card;
        let result = &self.record.result;
        let positive = result.is_positive();
        let accent = t.outcome_color(positive);
        let (strip, pill) = if positive {
            (t.positive_strip, t.positive_pill)
        } else {
            (t.negative_strip, t.negative_pill)
        };
        let risk = t.risk_color(result.risk_level.as_ref());

        self.card(surface, card);
        // Title strip with rounded top corners and a square bottom edge.
        let strip_h = 26.0;
        surface.rounded_rect(Rect::new(card.x, card.y, card.width, strip_h), self.radius, Some(strip), None);
        surface.fill_rect(
            Rect::new(card.x, card.y + self.radius, card.width, strip_h - self.radius),
            strip,
        );
        let x = card.x + self.inset;
        surface.text("PREDICTION RESULT", x, card.y + 9.0, &TextStyle::bold(8.0, accent));
        surface.text(result.outcome_label(), x, card.y + 32.0, &TextStyle::bold(22.0, accent));

        let pill_y = card.y + 62.0;
        let prob = Rect::new(x, pill_y, 90.0, 17.0);
        surface.rounded_rect(prob, 8.0, Some(pill), None);
        surface.text(
            &result.probability_label(),
            prob.x,
            prob.y + 4.0,
            &TextStyle::bold(8.5, accent).width(prob.width).align(Align::Center),
        );

        let risk_pill = Rect::new(x + 96.0, pill_y, 68.0, 17.0);
        surface.rounded_rect(risk_pill, 8.0, Some(risk.with_alpha(PILL_TINT_ALPHA)), None);
        surface.text(
            result.risk_label(),
            risk_pill.x,
            risk_pill.y + 4.0,
            &TextStyle::bold(8.5, risk)
                .width(risk_pill.width)
                .align(Align::Center)
                .max_lines(1),
        );
    }

    fn parameter_grid<S: Surface>(&self, surface: &mut S) {
        let t = self.theme;
        let card = self.layout.parameter_card;
        self.card(surface, card);
        self.section_title(surface, "Input Parameters", card.x + self.inset, card.y + self.inset, self.rule(card));

        for (cell, (key, value)) in self
            .layout
            .parameter_cells
            .iter()
            .zip(self.record.input_parameters.iter())
        {
            surface.text(
                &format!("{}:", humanize_key(key)),
                cell.label.x,
                cell.label.y,
                &TextStyle::regular(7.0, t.muted).width(cell.label.width).max_lines(1),
            );
            surface.text(
                &value.to_string(),
                cell.value.x,
                cell.value.y,
                &TextStyle::bold(7.5, t.text).width(cell.value.width).max_lines(1),
            );
        }
    }

    fn recommendations<S: Surface>(&self, surface: &mut S) {
        let t = self.theme;
        let card = self.layout.recommendations_card;
        self.card(surface, card);
        self.section_title(
            surface,
            "Medical Recommendations",
            card.x + self.inset,
            card.y + self.inset,
            self.rule(card),
        );

        for (line, text) in self
            .layout
            .recommendation_lines
            .iter()
            .zip(self.record.recommendations.iter())
        {
            surface.circle(Point::new(card.x + 15.0, line.y + 4.5), 2.5, t.green);
            surface.text(
                text,
                line.x,
                line.y,
                &TextStyle::regular(7.5, t.text_light)
                    .width(line.width)
                    .line_gap(-1.0)
                    .max_lines(1),
            );
        }
    }

    fn risk_gauge<S: Surface>(&self, surface: &mut S) {
        let t = self.theme;
        let card = self.layout.gauge_card;
        self.card(surface, card);
        self.section_title(surface, "Risk Level", card.x + 8.0, card.y + self.inset, card.width - 16.0);

        let active = self.record.result.risk_level.as_ref().and_then(|l| l.index());
        for (i, (bar, level)) in self.layout.gauge_bars.iter().zip(RiskLevel::ORDERED.iter()).enumerate() {
            let color = t.risk_color(Some(level));
            let is_active = active == Some(i);
            let fill = if is_active { color } else { color.with_alpha(DIMMED_BAR_ALPHA) };
            surface.rounded_rect(*bar, 4.0, Some(fill), None);
            let style = if is_active {
                TextStyle::bold(7.0, color)
            } else {
                TextStyle::regular(7.0, t.muted)
            };
            surface.text(level.label(), bar.right() + 4.0, bar.y + 1.0, &style);
        }
    }

    fn disclaimer<S: Surface>(&self, surface: &mut S) {
        let t = self.theme;
        let band = self.layout.disclaimer;
        surface.rounded_rect(
            band,
            5.0,
            Some(t.disclaimer_fill),
            Some(Stroke::new(t.disclaimer_border, 0.6)),
        );
        surface.text(
            DISCLAIMER,
            band.x + self.inset,
            band.y + 7.0,
            &TextStyle::regular(7.0, t.disclaimer_text).width(band.width - 2.0 * self.inset),
        );
    }

    fn footer<S: Surface>(&self, surface: &mut S) {
        let t = self.theme;
        let band = self.layout.footer;
        surface.fill_rect(band, t.dark_bg);
        surface.text(
            &self.footer_text(),
            band.x,
            band.y + 14.0,
            &TextStyle::regular(7.5, t.muted).width(band.width).align(Align::Center),
        );
    }

    /// Product, year of the report, site and report id, dot-separated.
    pub fn footer_text(&self) -> String {
        format!(
            "{}  \u{00B7}  {}  \u{00B7}  {}  \u{00B7}  {}",
            self.brand.platform_label,
            self.record.created_at.year(),
            self.brand.website,
            self.record.report_id_display()
        )
    }

    fn rule(&self, card: Rect) -> f32 {
        (card.width - 2.0 * self.inset).min(170.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::paint::{DisplayList, PaintCommand};
    use crate::rendering::pdf::layout_lines;

    fn record() -> ReportRecord {
        ReportRecord::from_json(
            r#"{"reportId":"HG-TEST0001","createdAt":"2026-01-05T08:30:00Z",
                "patientName":"Ravi","diseaseType":"Liver",
                "inputParameters":{"totalBilirubin":1.2,"albumin":3.1},
                "result":{"prediction":"Negative","probability":12,"riskLevel":"Low"},
                "recommendations":["Stay hydrated"]}"#,
        )
        .unwrap()
    }

    fn draw(rec: &ReportRecord) -> DisplayList {
        let cfg = ReportConfig::default();
        let layout = ReportLayout::for_record(rec, &cfg.page);
        let mut dl = DisplayList::new(cfg.page.width, cfg.page.height);
        Compositor::new(rec, &layout, &cfg).draw(&mut dl);
        dl
    }

    #[test]
    fn timestamp_uses_configured_offset() {
        let at: DateTime<Utc> = "2026-10-16T10:15:00Z".parse().unwrap();
        assert_eq!(format_timestamp(&at, 330), "16 Oct 2026, 3:45 pm");
        assert_eq!(format_timestamp(&at, 0), "16 Oct 2026, 10:15 am");
        // out-of-range offsets fall back to UTC
        assert_eq!(format_timestamp(&at, 100_000), "16 Oct 2026, 10:15 am");
    }

    #[test]
    fn shield_is_symmetric() {
        let logo = Rect::new(36.0, 16.0, 54.0, 54.0);
        let pts = shield_points(logo, &OUTER_SHIELD);
        let cx = logo.x + 27.0;
        assert_eq!(pts[0].x, cx);
        assert_eq!(pts[3].x, cx);
        assert!(((pts[1].x - cx) - (cx - pts[5].x)).abs() < 1e-4);
        assert!(pts[0].y < pts[1].y && pts[2].y < pts[3].y);
    }

    #[test]
    fn first_and_last_commands_are_background_and_footer() {
        let dl = draw(&record());
        match dl.commands.first() {
            Some(PaintCommand::FillRect { rect, .. }) => assert_eq!(rect.width, dl.width),
            other => panic!("unexpected first command {:?}", other),
        }
        match dl.commands.last() {
            Some(PaintCommand::Text { content, .. }) => {
                assert!(content.contains("HG-TEST0001"));
                assert!(content.contains("2026"));
            }
            other => panic!("unexpected last command {:?}", other),
        }
    }

    #[test]
    fn grid_labels_are_humanized() {
        let dl = draw(&record());
        assert!(dl.find_text("total Bilirubin:").is_some());
        assert!(dl.find_text("albumin:").is_some());
        assert!(dl.find_text("1.2").is_some());
    }

    #[test]
    fn one_bullet_per_recommendation() {
        let dl = draw(&record());
        let bullets = dl
            .commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::Circle { .. }))
            .count();
        assert_eq!(bullets, 1);
    }

    #[test]
    fn bounded_texts_stay_inside_their_boxes() {
        let mut rec = record();
        rec.patient_name = Some("Wolfeschlegelsteinhausenbergerdorffvoralternwarengewissenhaft".into());
        rec.input_parameters
            .insert("albumin", "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789");
        rec.recommendations = vec![
            "Follow a liver-friendly diet with plenty of vegetables, whole grains and lean protein, \
             and avoid fried food"
                .into(),
            "Stay hydrated".into(),
        ];
        let dl = draw(&rec);

        let mut checked = 0;
        for (content, style) in dl.texts() {
            let (Some(width), Some(max)) = (style.width, style.max_lines) else {
                continue;
            };
            let lines = layout_lines(content, style);
            assert!(lines.len() <= max, "{:?} spans {} lines", content, lines.len());
            for line in &lines {
                let w = text_width(line, style.size, style.weight, style.letter_spacing);
                assert!(w <= width, "{:?} is {}pt wide in a {}pt box", line, w, width);
            }
            checked += 1;
        }
        // patient values, grid cells and recommendations
        assert!(checked >= 4 + 2 * 2 + 2);
    }

    #[test]
    fn negative_outcome_uses_good_color() {
        let rec = record();
        let theme = Theme::default();
        assert_eq!(theme.outcome_color(rec.result.is_positive()), theme.good);
        let dl = draw(&rec);
        match dl.find_text("Negative") {
            Some(PaintCommand::Text { style, .. }) => assert_eq!(style.color, theme.good),
            other => panic!("missing outcome label: {:?}", other),
        }
    }
}
