//! Storage tests: on-disk layout, overwrite behavior and the async wrapper.

use std::fs;
use std::time::Duration;

use healthguard_report::output::{MIME_TYPE, REPORTS_DIR};
use healthguard_report::{Error, FailureKind, ReportConfig, ReportEngine, ReportRecord};

const HEART_POSITIVE: &str = include_str!("goldens/records/heart_positive.json");

fn engine() -> ReportEngine {
    ReportEngine::new(ReportConfig::default()).expect("engine")
}

fn record() -> ReportRecord {
    ReportRecord::from_json(HEART_POSITIVE).expect("fixture")
}

#[test]
fn test_store_writes_named_pdf() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine();
    let path = engine.render_and_store(&record(), dir.path()).expect("store");

    assert_eq!(path, dir.path().join(REPORTS_DIR).join("HealthGuard_HG-ABC12345.pdf"));
    assert_eq!(engine.download_file_name(&record()), "HealthGuard_HG-ABC12345.pdf");
    assert_eq!(MIME_TYPE, "application/pdf");

    let on_disk = fs::read(&path).expect("read stored report");
    assert_eq!(on_disk, engine.render_to_bytes(&record()).expect("render"));
}

#[test]
fn test_store_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine();
    let first = engine.render_and_store(&record(), dir.path()).expect("first store");
    let bytes = fs::read(&first).expect("read");
    let second = engine.render_and_store(&record(), dir.path()).expect("second store");
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).expect("read"), bytes);

    // No temp files are left behind.
    let entries: Vec<_> = fs::read_dir(dir.path().join(REPORTS_DIR))
        .expect("list reports")
        .collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_store_into_file_is_persist_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"x").expect("write blocker");

    let err = engine().render_and_store(&record(), &blocker).unwrap_err();
    assert!(matches!(err, Error::PersistError { .. }), "got {:?}", err);
    assert_eq!(err.kind(), FailureKind::Persist);
}

#[test]
fn test_unsafe_report_id_is_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine();
    let mut plain = record();
    plain.report_id = "HG_1".to_string();
    let mut spaced = record();
    spaced.report_id = "HG 1".to_string();

    let stored = engine.render_and_store(&plain, dir.path()).expect("store HG_1");
    let before = fs::read(&stored).expect("read");

    let err = engine.render_and_store(&spaced, dir.path()).unwrap_err();
    assert!(matches!(err, Error::InvalidRecord(_)), "got {:?}", err);
    assert_eq!(err.kind(), FailureKind::Input);
    // the other report's file is untouched
    assert_eq!(fs::read(&stored).expect("read"), before);
    let count = fs::read_dir(dir.path().join(REPORTS_DIR)).expect("list").count();
    assert_eq!(count, 1);
}

#[test]
fn test_render_error_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut rec = record();
    rec.input_parameters = (0..100).map(|i| (format!("p{}", i), i as f64)).collect();
    assert!(engine().render_and_store(&rec, dir.path()).is_err());
    assert!(!dir.path().join(REPORTS_DIR).join("HealthGuard_HG-ABC12345.pdf").exists());
}

#[tokio::test]
async fn test_store_with_timeout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = engine()
        .store_with_timeout(record(), dir.path().to_path_buf(), Duration::from_secs(30))
        .await
        .expect("store within timeout");
    assert!(path.exists());
}

#[tokio::test]
async fn test_concurrent_stores_of_distinct_reports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine();
    let mut tasks = Vec::new();
    for i in 0..4 {
        let mut rec = record();
        rec.report_id = format!("HG-PAR{:05}", i);
        let engine = engine.clone();
        let root = dir.path().to_path_buf();
        tasks.push(tokio::spawn(async move {
            engine.store_with_timeout(rec, root, Duration::from_secs(30)).await
        }));
    }
    for task in tasks {
        task.await.expect("join").expect("store");
    }
    let count = fs::read_dir(dir.path().join(REPORTS_DIR)).expect("list").count();
    assert_eq!(count, 4);
}
