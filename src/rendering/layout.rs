//! Page geometry for the report.
//!
//! Every card rectangle is computed here before anything is drawn. The only
//! inputs are the page constants and the record's *shape* (how many
//! parameters and recommendations it has), so two records with the same
//! counts always get identical geometry.

use serde::{Deserialize, Serialize};

use crate::record::ReportRecord;
use crate::{Error, Result};

/// Axis-aligned rectangle in page space (origin top-left, y down, points).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Shrink by `dx` horizontally and `dy` vertically on every side.
    pub fn inset(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            width: (self.width - 2.0 * dx).max(0.0),
            height: (self.height - 2.0 * dy).max(0.0),
        }
    }
}

/// Fixed page constants. Defaults describe an A4 page in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub header_height: f32,
    pub accent_height: f32,
    pub body_top: f32,
    pub card_gap: f32,
    pub column_gap: f32,
    pub card_radius: f32,
    pub logo_top: f32,
    pub logo_size: f32,
    pub meta_width: f32,
    pub summary_height: f32,
    pub patient_column_ratio: f32,
    pub title_inset: f32,
    pub title_height: f32,
    pub grid_columns: usize,
    pub grid_base_height: f32,
    pub grid_row_pitch: f32,
    pub grid_label_ratio: f32,
    pub grid_value_ratio: f32,
    pub rec_min_height: f32,
    pub rec_base_height: f32,
    pub rec_row_pitch: f32,
    pub gauge_width: f32,
    pub gauge_bar_pitch: f32,
    pub gauge_bar_height: f32,
    pub gauge_label_room: f32,
    pub disclaimer_height: f32,
    pub footer_height: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 36.0,
            header_height: 90.0,
            accent_height: 3.0,
            body_top: 100.0,
            card_gap: 10.0,
            column_gap: 12.0,
            card_radius: 7.0,
            logo_top: 16.0,
            logo_size: 54.0,
            meta_width: 200.0,
            summary_height: 112.0,
            patient_column_ratio: 0.44,
            title_inset: 10.0,
            title_height: 17.0,
            grid_columns: 3,
            grid_base_height: 30.0,
            grid_row_pitch: 14.0,
            grid_label_ratio: 0.50,
            grid_value_ratio: 0.48,
            rec_min_height: 80.0,
            rec_base_height: 30.0,
            rec_row_pitch: 13.0,
            gauge_width: 120.0,
            gauge_bar_pitch: 13.0,
            gauge_bar_height: 9.0,
            gauge_label_room: 44.0,
            disclaimer_height: 30.0,
            footer_height: 34.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("gridRowPitch", self.grid_row_pitch),
            ("recRowPitch", self.rec_row_pitch),
            ("gaugeWidth", self.gauge_width),
            ("headerHeight", self.header_height),
            ("summaryHeight", self.summary_height),
            ("gridBaseHeight", self.grid_base_height),
            ("recMinHeight", self.rec_min_height),
            ("gaugeBarHeight", self.gauge_bar_height),
            ("disclaimerHeight", self.disclaimer_height),
            ("footerHeight", self.footer_height),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::ConfigError(format!("page {} must be positive, got {}", name, v)));
            }
        }
        if self.grid_columns == 0 {
            return Err(Error::ConfigError("page gridColumns must be at least 1".into()));
        }
        if self.margin < 0.0 || self.content_width() <= self.gauge_width + self.column_gap {
            return Err(Error::ConfigError(format!(
                "margins of {} leave no room for the recommendations row on a {}pt page",
                self.margin, self.width
            )));
        }
        if self.gauge_bar_max_width() <= 0.0 {
            return Err(Error::ConfigError("risk gauge is too narrow for its labels".into()));
        }
        Ok(())
    }

    fn gauge_bar_max_width(&self) -> f32 {
        self.gauge_width - 16.0 - self.gauge_label_room
    }
}

/// The counts that drive layout. Field values never affect geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportShape {
    pub parameter_count: usize,
    pub recommendation_count: usize,
}

impl ReportShape {
    pub fn of(record: &ReportRecord) -> Self {
        Self {
            parameter_count: record.input_parameters.len(),
            recommendation_count: record.recommendations.len(),
        }
    }
}

/// One input-parameter slot in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCell {
    pub label: Rect,
    pub value: Rect,
}

/// Computed geometry of a whole report page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLayout {
    pub page: Rect,
    pub header: Rect,
    pub logo: Rect,
    pub meta: Rect,
    pub accent_bar: Rect,
    pub patient_card: Rect,
    pub result_card: Rect,
    pub parameter_card: Rect,
    pub parameter_rows: usize,
    pub parameter_cells: Vec<GridCell>,
    pub recommendations_card: Rect,
    pub recommendation_lines: Vec<Rect>,
    pub gauge_card: Rect,
    pub gauge_bars: [Rect; 4],
    pub disclaimer: Rect,
    pub footer: Rect,
}

/// Rows needed to lay `count` items out in `columns` columns.
pub fn grid_rows(count: usize, columns: usize) -> usize {
    count.div_ceil(columns.max(1))
}

impl ReportLayout {
    /// Compute the page layout for a record shape.
    pub fn compute(shape: ReportShape, g: &PageGeometry) -> Self {
        let ml = g.margin;
        let cw = g.content_width();
        let body = |card: &Rect| card.y + g.title_inset + g.title_height;

        let page = Rect::new(0.0, 0.0, g.width, g.height);
        let header = Rect::new(0.0, 0.0, g.width, g.header_height);
        let logo = Rect::new(ml, g.logo_top, g.logo_size, g.logo_size);
        let meta = Rect::new(
            g.width - ml - g.meta_width,
            20.0,
            g.meta_width,
            g.header_height - 40.0,
        );
        let accent_bar = Rect::new(0.0, g.header_height, g.width, g.accent_height);

        let mut y = g.body_top;

        // Summary row: patient identity left, prediction result right.
        let col1 = cw * g.patient_column_ratio;
        let col2 = cw - col1 - g.column_gap;
        let patient_card = Rect::new(ml, y, col1, g.summary_height);
        let result_card = Rect::new(ml + col1 + g.column_gap, y, col2, g.summary_height);
        y += g.summary_height + g.card_gap;

        // Parameter grid
        let cols = g.grid_columns.max(1);
        let parameter_rows = grid_rows(shape.parameter_count, cols);
        let parameter_card = Rect::new(
            ml,
            y,
            cw,
            g.grid_base_height + parameter_rows as f32 * g.grid_row_pitch,
        );
        let col_w = (cw - 2.0 * g.title_inset) / cols as f32;
        let grid_top = body(&parameter_card);
        let parameter_cells = (0..shape.parameter_count)
            .map(|i| {
                let x = ml + g.title_inset + (i % cols) as f32 * col_w;
                let cy = grid_top + (i / cols) as f32 * g.grid_row_pitch;
                GridCell {
                    label: Rect::new(x, cy, col_w * g.grid_label_ratio, g.grid_row_pitch),
                    value: Rect::new(
                        x + col_w * g.grid_label_ratio,
                        cy,
                        col_w * g.grid_value_ratio,
                        g.grid_row_pitch,
                    ),
                }
            })
            .collect();
        y += parameter_card.height + g.card_gap;

        // Recommendations and risk gauge share one row height.
        let rec_w = cw - g.gauge_width - g.column_gap;
        let row_h = recommendations_height(shape.recommendation_count, g);
        let recommendations_card = Rect::new(ml, y, rec_w, row_h);
        let rec_top = body(&recommendations_card);
        let recommendation_lines = (0..shape.recommendation_count)
            .map(|i| {
                Rect::new(
                    ml + 22.0,
                    rec_top + i as f32 * g.rec_row_pitch,
                    rec_w - 30.0,
                    g.rec_row_pitch,
                )
            })
            .collect();

        let gauge_card = Rect::new(ml + rec_w + g.column_gap, y, g.gauge_width, row_h);
        let bar_top = body(&gauge_card);
        let max_w = g.gauge_bar_max_width();
        let gauge_bars = std::array::from_fn(|i| {
            Rect::new(
                gauge_card.x + 8.0,
                bar_top + i as f32 * g.gauge_bar_pitch,
                max_w * (i + 1) as f32 / 4.0,
                g.gauge_bar_height,
            )
        });
        y += row_h + g.card_gap;

        let disclaimer = Rect::new(ml, y, cw, g.disclaimer_height);
        let footer = Rect::new(0.0, g.height - g.footer_height, g.width, g.footer_height);

        ReportLayout {
            page,
            header,
            logo,
            meta,
            accent_bar,
            patient_card,
            result_card,
            parameter_card,
            parameter_rows,
            parameter_cells,
            recommendations_card,
            recommendation_lines,
            gauge_card,
            gauge_bars,
            disclaimer,
            footer,
        }
    }

    pub fn for_record(record: &ReportRecord, g: &PageGeometry) -> Self {
        Self::compute(ReportShape::of(record), g)
    }

    /// True when the stacked body ends above the footer band.
    pub fn fits_page(&self) -> bool {
        self.disclaimer.bottom() <= self.footer.y
    }
}

/// Height of the recommendations row for `count` entries, never below the
/// configured minimum.
pub fn recommendations_height(count: usize, g: &PageGeometry) -> f32 {
    (g.rec_base_height + count as f32 * g.rec_row_pitch).max(g.rec_min_height)
}
