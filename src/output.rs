//! Output adapter: PDF bytes, download naming and on-disk storage.
//!
//! This is the only module that touches the filesystem. Stored reports live
//! at `<root>/reports/<Prefix>_<reportId>.pdf`; storing the same report again
//! replaces the file in place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::info;

use crate::record::ReportRecord;
use crate::rendering;
use crate::{Error, ReportConfig, Result};

/// MIME type of the rendered document.
pub const MIME_TYPE: &str = "application/pdf";

/// File extension of the rendered document.
pub const EXTENSION: &str = "pdf";

/// Directory under the storage root that holds rendered reports.
pub const REPORTS_DIR: &str = "reports";

/// Make a report id safe to use in a download file name.
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`, and an id made only of
/// dots is replaced entirely, so the result can never name a parent
/// directory. The mapping is lossy; storage goes through
/// [`check_report_id`] instead.
pub fn sanitize_report_id(id: &str) -> String {
    let cleaned: String = id
        .trim()
        .chars()
        .map(|c| if is_file_name_char(c) { c } else { '_' })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".repeat(cleaned.len().max(1))
    } else {
        cleaned
    }
}

/// `<prefix>_<reportId>.pdf`
pub fn download_file_name(prefix: &str, report_id: &str) -> String {
    format!("{}_{}.{}", prefix, sanitize_report_id(report_id), EXTENSION)
}

/// Value for an HTTP `Content-Disposition` header.
pub fn content_disposition(prefix: &str, report_id: &str) -> String {
    format!("attachment; filename=\"{}\"", download_file_name(prefix, report_id))
}

fn is_file_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Accept a report id for storage only when it is already a valid file name
/// component, so every stored id maps to its own file.
pub fn check_report_id(report_id: &str) -> Result<&str> {
    if !report_id.is_empty() && report_id.chars().all(is_file_name_char) {
        Ok(report_id)
    } else {
        Err(Error::InvalidRecord(format!(
            "report id {:?} may only contain ASCII letters, digits, '.', '_' and '-'",
            report_id
        )))
    }
}

/// Where `render_and_store` puts a report.
pub fn report_path(storage_root: &Path, prefix: &str, report_id: &str) -> Result<PathBuf> {
    let id = check_report_id(report_id)?;
    Ok(storage_root
        .join(REPORTS_DIR)
        .join(format!("{}_{}.{}", prefix, id, EXTENSION)))
}

/// Render a record to PDF bytes. Never touches the filesystem.
pub fn render_to_bytes(record: &ReportRecord, config: &ReportConfig) -> Result<Vec<u8>> {
    Ok(rendering::render(record, config)?.pdf_data)
}

/// Render a record and write it under `storage_root`, returning the path.
///
/// The bytes go to a temporary sibling first and are then renamed over the
/// target, so readers never observe a half-written report.
pub fn render_and_store(record: &ReportRecord, config: &ReportConfig, storage_root: &Path) -> Result<PathBuf> {
    let target = report_path(storage_root, &config.brand.prefix, &record.report_id)?;
    let bytes = render_to_bytes(record, config)?;
    write_atomically(&target, &bytes)?;
    info!(
        "stored report {} ({} bytes) at {}",
        record.report_id,
        bytes.len(),
        target.display()
    );
    Ok(target)
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .ok_or_else(|| Error::persist(target, std::io::Error::other("target has no parent directory")))?;
    fs::create_dir_all(dir).map_err(|e| Error::persist(dir, e))?;

    let mut tmp_name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    tmp_name.push(format!(".{}-{}.tmp", std::process::id(), seq));
    let tmp = dir.join(tmp_name);

    let write = || -> std::io::Result<()> {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        fs::rename(&tmp, target)
    };
    write().map_err(|e| {
        let _ = fs::remove_file(&tmp);
        Error::persist(target, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_convention() {
        assert_eq!(download_file_name("HealthGuard", "HG-ABC12345"), "HealthGuard_HG-ABC12345.pdf");
        assert_eq!(
            content_disposition("HealthGuard", "HG-1"),
            "attachment; filename=\"HealthGuard_HG-1.pdf\""
        );
    }

    #[test]
    fn report_ids_cannot_escape_reports_dir() {
        assert_eq!(sanitize_report_id("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_report_id(".."), "__");
        assert_eq!(sanitize_report_id(""), "_");
        assert_eq!(sanitize_report_id("a b/c"), "a_b_c");
        assert!(report_path(Path::new("/srv/uploads"), "HealthGuard", "../x").is_err());
        assert!(report_path(Path::new("/srv/uploads"), "HealthGuard", "").is_err());
    }

    #[test]
    fn distinct_ids_get_distinct_paths() {
        let root = Path::new("u");
        let p = report_path(root, "HealthGuard", "HG_1").unwrap();
        assert_eq!(p, Path::new("u/reports/HealthGuard_HG_1.pdf"));
        // ids that would collide after sanitizing are refused instead
        match report_path(root, "HealthGuard", "HG 1") {
            Err(Error::InvalidRecord(msg)) => assert!(msg.contains("HG 1")),
            other => panic!("expected invalid record, got {:?}", other),
        }
        assert_ne!(
            report_path(root, "HealthGuard", "HG-1").unwrap(),
            report_path(root, "HealthGuard", "HG_1").unwrap()
        );
        assert_eq!(check_report_id("HG-ABC12345.v2").unwrap(), "HG-ABC12345.v2");
    }

    #[test]
    fn mime_type_is_pdf() {
        assert_eq!(MIME_TYPE, "application/pdf");
    }
}
