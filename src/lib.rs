//! HealthGuard Report Renderer
//!
//! Turns a disease-prediction [`ReportRecord`] into a deterministic,
//! single-page PDF report: a branded header, patient and result cards, an
//! input-parameter grid, recommendations with a risk gauge, a disclaimer
//! and a footer.
//!
//! # Features
//!
//! - **Pure layout**: card geometry depends only on how many parameters and
//!   recommendations a record has, never on their values
//! - **Deterministic output**: the same record and configuration always give
//!   byte-identical PDF output
//! - **Safe degradation**: missing fields render as a placeholder glyph and
//!   unknown risk levels fall back to a neutral color
//!
//! # Example
//!
//! ```no_run
//! use healthguard_report::{ReportConfig, ReportRecord};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = healthguard_report::new_engine(ReportConfig::default())?;
//! let record = ReportRecord::from_json(r#"{"reportId":"HG-ABC12345","diseaseType":"Heart"}"#)?;
//! let pdf = engine.render_to_bytes(&record)?;
//! let path = engine.render_and_store(&record, "uploads")?;
//! println!("{} bytes written to {}", pdf.len(), path.display());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, FailureKind, Result};

pub mod record;
pub use record::{
    DiseaseType, InputParameters, Outcome, ParamValue, ReportRecord, ResultSummary, RiskLevel,
    PLACEHOLDER,
};

pub mod rendering;
pub use rendering::layout::{PageGeometry, ReportLayout};
pub use rendering::palette::{Color, Theme};
pub use rendering::RenderedReport;

pub mod output;

/// Product naming used in the header, footer and output file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Brand {
    /// File name prefix, e.g. `HealthGuard` in `HealthGuard_HG-1.pdf`
    pub prefix: String,
    /// First half of the two-tone wordmark
    pub name_lead: String,
    /// Second half of the wordmark, drawn in the accent color
    pub name_accent: String,
    pub tagline: String,
    pub website: String,
    /// Product label at the start of the footer line
    pub platform_label: String,
}

impl Default for Brand {
    fn default() -> Self {
        Self {
            prefix: "HealthGuard".to_string(),
            name_lead: "Health".to_string(),
            name_accent: "Guard".to_string(),
            tagline: "AI-Powered Disease Prediction Platform".to_string(),
            website: "healthguard.com".to_string(),
            platform_label: "HealthGuard AI Healthcare Platform".to_string(),
        }
    }
}

/// Configuration for the report renderer
///
/// The configuration is read once and then shared immutably; nothing in
/// the renderer mutates it. Defaults produce the standard A4 HealthGuard
/// report.
///
/// # Examples
///
/// ```
/// let cfg = healthguard_report::ReportConfig::default();
/// assert_eq!(cfg.brand.prefix, "HealthGuard");
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    /// Page size and card geometry constants
    pub page: PageGeometry,
    /// Named colors
    pub theme: Theme,
    pub brand: Brand,
    /// Offset from UTC, in minutes, used to print the generation time
    pub utc_offset_minutes: i32,
    /// Whether to Flate-compress the page content
    pub compress: bool,
    /// Largest accepted number of input parameters
    pub max_parameters: usize,
    /// Largest accepted number of recommendations
    pub max_recommendations: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            theme: Theme::default(),
            brand: Brand::default(),
            utc_offset_minutes: 330,
            compress: true,
            max_parameters: 30,
            max_recommendations: 12,
        }
    }
}

impl ReportConfig {
    /// Load a configuration from a JSON file. Missing keys keep defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        let cfg: ReportConfig = serde_json::from_str(&text)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;
        if self.max_parameters == 0 || self.max_recommendations == 0 {
            return Err(Error::ConfigError(
                "maxParameters and maxRecommendations must be at least 1".into(),
            ));
        }
        if self.brand.prefix.trim().is_empty() {
            return Err(Error::ConfigError("brand prefix must not be empty".into()));
        }
        // The largest accepted record must still end above the footer.
        let worst = rendering::layout::ReportShape {
            parameter_count: self.max_parameters,
            recommendation_count: self.max_recommendations,
        };
        if !ReportLayout::compute(worst, &self.page).fits_page() {
            return Err(Error::ConfigError(format!(
                "{} parameters and {} recommendations do not fit on a {}pt page",
                self.max_parameters, self.max_recommendations, self.page.height
            )));
        }
        Ok(())
    }
}

/// A report renderer bound to one configuration.
///
/// Cloning is cheap and clones share the configuration, so one engine can
/// be handed to any number of worker threads or tasks.
#[derive(Debug, Clone)]
pub struct ReportEngine {
    config: Arc<ReportConfig>,
}

impl ReportEngine {
    /// Create an engine after validating `config`.
    pub fn new(config: ReportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Geometry the record would be drawn with.
    pub fn layout(&self, record: &ReportRecord) -> Result<ReportLayout> {
        rendering::check_capacity(record, &self.config)?;
        Ok(ReportLayout::for_record(record, &self.config.page))
    }

    /// Render the full document, keeping the display-list digest.
    pub fn render(&self, record: &ReportRecord) -> Result<RenderedReport> {
        rendering::render(record, &self.config)
    }

    /// Render the record to PDF bytes without touching the filesystem.
    pub fn render_to_bytes(&self, record: &ReportRecord) -> Result<Vec<u8>> {
        output::render_to_bytes(record, &self.config)
    }

    /// Render and write `<storage_root>/reports/<Prefix>_<reportId>.pdf`.
    pub fn render_and_store(&self, record: &ReportRecord, storage_root: impl AsRef<Path>) -> Result<PathBuf> {
        output::render_and_store(record, &self.config, storage_root.as_ref())
    }

    /// [`ReportEngine::render_and_store`] on the blocking pool, bounded by
    /// `timeout`. On timeout the write may still complete in the background.
    pub async fn store_with_timeout(
        &self,
        record: ReportRecord,
        storage_root: PathBuf,
        timeout: Duration,
    ) -> Result<PathBuf> {
        let engine = self.clone();
        let task = tokio::task::spawn_blocking(move || engine.render_and_store(&record, &storage_root));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(Error::RenderError(format!("render task failed: {}", join))),
            Err(_) => Err(Error::Timeout(timeout.as_millis() as u64)),
        }
    }

    /// Content-Disposition file name for this record.
    pub fn download_file_name(&self, record: &ReportRecord) -> String {
        output::download_file_name(&self.config.brand.prefix, &record.report_id)
    }
}

/// Create a report engine with the given configuration
pub fn new_engine(config: ReportConfig) -> Result<ReportEngine> {
    ReportEngine::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.page.width, 595.28);
        assert_eq!(config.page.height, 841.89);
        assert_eq!(config.page.grid_columns, 3);
        assert!(config.compress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_json() {
        let cfg: ReportConfig =
            serde_json::from_str(r#"{"brand":{"prefix":"Acme"},"maxRecommendations":4}"#).unwrap();
        assert_eq!(cfg.brand.prefix, "Acme");
        assert_eq!(cfg.brand.name_lead, "Health");
        assert_eq!(cfg.max_recommendations, 4);
        assert_eq!(cfg.page, PageGeometry::default());
    }

    #[test]
    fn test_caps_must_fit_page() {
        let cfg = ReportConfig { max_parameters: 300, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::ConfigError(_))));
        let cfg = ReportConfig { max_recommendations: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
        assert!(ReportEngine::new(cfg).is_err());
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReportEngine>();
    }
}
