use healthguard_report::rendering::pdf::{serialize, PdfOptions};
use healthguard_report::rendering::paint::{DisplayList, Point, Surface, TextStyle};
use healthguard_report::rendering::layout::Rect;
use healthguard_report::Color;

#[test]
fn smoke_serialize_minimal_page() {
    let mut list = DisplayList::new(200.0, 100.0);
    list.fill_rect(Rect::new(0.0, 0.0, 200.0, 100.0), Color::hex(0xffffff));
    list.circle(Point::new(20.0, 20.0), 5.0, Color::hex(0x059669));
    list.text("Hello", 10.0, 40.0, &TextStyle::bold(12.0, Color::hex(0x0c1f15)));

    let pdf = serialize(&list, &PdfOptions::default()).expect("serialize");
    assert!(pdf.starts_with(b"%PDF-"));
    let tail = String::from_utf8_lossy(&pdf[pdf.len().saturating_sub(16)..]).to_string();
    assert!(tail.contains("%%EOF"));
}

#[test]
fn smoke_uncompressed_content_is_readable() {
    let mut list = DisplayList::new(200.0, 100.0);
    list.text("Hello", 10.0, 40.0, &TextStyle::regular(12.0, Color::hex(0x000000)));
    let opts = PdfOptions {
        compress: false,
        ..Default::default()
    };
    let pdf = serialize(&list, &opts).expect("serialize");
    let text = String::from_utf8_lossy(&pdf);
    assert!(text.contains("(Hello)"));
    assert!(text.contains("/Helvetica"));
}

#[test]
fn smoke_non_finite_geometry_is_rejected() {
    let mut list = DisplayList::new(200.0, 100.0);
    list.fill_rect(Rect::new(f32::NAN, 0.0, 10.0, 10.0), Color::hex(0x000000));
    assert!(serialize(&list, &PdfOptions::default()).is_err());
}
