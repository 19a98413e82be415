use std::fs;
use std::path::PathBuf;

use healthguard_report::rendering::compose;
use healthguard_report::{ReportConfig, ReportRecord};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn check_golden(fixture: &str, golden: &str) {
    let json = fs::read_to_string(format!("tests/goldens/records/{}", fixture)).expect("read fixture");
    let record = ReportRecord::from_json(&json).expect("decode fixture");
    let (_, list) = compose(&record, &ReportConfig::default()).expect("compose fixture");

    // The display list digest pins every draw call, so any layout or
    // styling drift shows up here before it reaches the PDF bytes.
    let digest = list.digest();

    let expected_path = golden_path(golden);
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    assert!(
        expected_path.exists(),
        "no golden at {:?}; run with UPDATE_GOLDENS=1 to create it",
        expected_path
    );

    let exp = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(digest, exp.trim(), "display list for {} changed", fixture);
}

#[test]
fn golden_heart_positive_display_list() {
    check_golden("heart_positive.json", "heart_positive.digest");
}

#[test]
fn golden_liver_negative_display_list() {
    check_golden("liver_negative_sparse.json", "liver_negative_sparse.digest");
}
