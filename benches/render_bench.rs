use criterion::{black_box, criterion_group, criterion_main, Criterion};

use healthguard_report::rendering::compose;
use healthguard_report::rendering::layout::ReportLayout;
use healthguard_report::{ReportConfig, ReportEngine, ReportRecord};

const HEART_POSITIVE: &str = include_str!("../tests/goldens/records/heart_positive.json");

fn bench_layout(c: &mut Criterion) {
    let cfg = ReportConfig::default();
    let record = ReportRecord::from_json(HEART_POSITIVE).expect("fixture");
    c.bench_function("layout_for_record", |b| {
        b.iter(|| ReportLayout::for_record(black_box(&record), &cfg.page))
    });
}

fn bench_compose(c: &mut Criterion) {
    let cfg = ReportConfig::default();
    let record = ReportRecord::from_json(HEART_POSITIVE).expect("fixture");
    c.bench_function("compose_display_list", |b| {
        b.iter(|| compose(black_box(&record), &cfg).expect("compose"))
    });
}

fn bench_render_to_bytes(c: &mut Criterion) {
    let engine = ReportEngine::new(ReportConfig::default()).expect("engine");
    let record = ReportRecord::from_json(HEART_POSITIVE).expect("fixture");
    c.bench_function("render_to_bytes", |b| {
        b.iter(|| engine.render_to_bytes(black_box(&record)).expect("render"))
    });
}

criterion_group!(benches, bench_layout, bench_compose, bench_render_to_bytes);
criterion_main!(benches);
