//! Rendering pipeline: record -> layout -> display list -> PDF bytes.

pub mod compose;
pub mod layout;
pub mod metrics;
pub mod paint;
pub mod palette;
pub mod pdf;

use log::debug;

use crate::record::ReportRecord;
use crate::{Error, ReportConfig, Result};

use self::compose::Compositor;
use self::layout::ReportLayout;
use self::paint::DisplayList;

/// A finished report document.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub width: f32,
    pub height: f32,
    pub pdf_data: Vec<u8>,
    /// Digest of the display list the PDF was encoded from
    pub digest: String,
}

/// Reject records that would not fit on the single report page.
pub fn check_capacity(record: &ReportRecord, config: &ReportConfig) -> Result<()> {
    let params = record.input_parameters.len();
    if params > config.max_parameters {
        return Err(Error::CapacityExceeded {
            what: "input parameters",
            count: params,
            max: config.max_parameters,
        });
    }
    let recs = record.recommendations.len();
    if recs > config.max_recommendations {
        return Err(Error::CapacityExceeded {
            what: "recommendations",
            count: recs,
            max: config.max_recommendations,
        });
    }
    Ok(())
}

/// Lay out and draw `record` into a fresh display list.
pub fn compose(record: &ReportRecord, config: &ReportConfig) -> Result<(ReportLayout, DisplayList)> {
    check_capacity(record, config)?;
    let layout = ReportLayout::for_record(record, &config.page);
    debug!(
        "report {}: {} parameter rows, recommendations card {:.1}pt, disclaimer ends at {:.1}pt",
        record.report_id,
        layout.parameter_rows,
        layout.recommendations_card.height,
        layout.disclaimer.bottom()
    );
    if !layout.fits_page() {
        return Err(Error::RenderError(format!(
            "report body ends at {:.1}pt, below the footer at {:.1}pt",
            layout.disclaimer.bottom(),
            layout.footer.y
        )));
    }
    let mut list = DisplayList::new(config.page.width, config.page.height);
    Compositor::new(record, &layout, config).draw(&mut list);
    Ok((layout, list))
}

/// Full pipeline for one record.
pub fn render(record: &ReportRecord, config: &ReportConfig) -> Result<RenderedReport> {
    let (_, list) = compose(record, config)?;
    let opts = pdf::PdfOptions {
        compress: config.compress,
        title: format!("{} Report {}", config.brand.prefix, record.report_id),
        ..Default::default()
    };
    let pdf_data = pdf::serialize(&list, &opts)?;
    Ok(RenderedReport {
        width: list.width,
        height: list.height,
        pdf_data,
        digest: list.digest(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_checked_before_drawing() {
        let cfg = ReportConfig { max_recommendations: 2, ..Default::default() };
        let mut rec = ReportRecord::from_json(r#"{"reportId":"HG-CAP"}"#).unwrap();
        rec.recommendations = vec!["a".into(), "b".into(), "c".into()];
        match compose(&rec, &cfg) {
            Err(Error::CapacityExceeded { count: 3, max: 2, .. }) => {}
            other => panic!("expected capacity error, got {:?}", other.map(|(_, l)| l.len())),
        }
    }

    #[test]
    fn overflowing_custom_page_is_a_render_error() {
        let mut cfg = ReportConfig::default();
        cfg.page.height = 400.0;
        let rec = ReportRecord::from_json(r#"{"reportId":"HG-SHORT"}"#).unwrap();
        let err = compose(&rec, &cfg).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::Render);
    }

    #[test]
    fn render_returns_pdf_and_digest() {
        let rec = ReportRecord::from_json(r#"{"reportId":"HG-MIN"}"#).unwrap();
        let out = render(&rec, &ReportConfig::default()).unwrap();
        assert!(out.pdf_data.starts_with(b"%PDF-"));
        assert_eq!(out.digest.len(), 64);
        assert_eq!(out.width, 595.28);
    }
}
