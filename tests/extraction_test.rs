use pretty_assertions::assert_eq;
use rs_field_picker::field::{apply_exclude_words, generate_field_name};
use rs_field_picker::{dom, scrape, Field, Options, Selector, ValueKind};
use serde_json::{json, Value};

const GALLERY_PAGE: &str = r#"<html><body>
    <div class="photo-gallery">
        <img src="https://img.example/resize/1275x717/front.jpg">
        <img src="https://img.example/resize/200x200/front.jpg">
        <img data-src="https://img.example/resize/1275x717/kitchen.jpg" src="data:image/gif;base64,R0lGOD">
        <img src="https://img.example/resize/200x200/kitchen.jpg">
        <img src="https://img.example/resize/1275x717/front.jpg">
    </div>
    <p class="area">Diện tích: 133,17 m2</p>
    <p class="phone" data-phone="0901 234 567">Show number</p>
    <div class="description"><p>Bright <b>corner</b> unit</p><script>track()</script></div>
</body></html>"#;

fn field(name: &str, css: &str, kind: ValueKind) -> Field {
    let mut field = Field::new(name, Selector::path(css));
    field.value_kind = kind;
    field
}

#[test]
fn gallery_skips_thumbnails_and_repeats() {
    let doc = dom::parse(GALLERY_PAGE);
    let out = scrape(&doc, &[field("Photos", ".photo-gallery", ValueKind::Text)], &Options::default());
    assert_eq!(
        out["Photos"],
        json!([
            "https://img.example/resize/1275x717/front.jpg",
            "https://img.example/resize/1275x717/kitchen.jpg"
        ])
    );
}

#[test]
fn exclude_words_strip_labels() {
    assert_eq!(apply_exclude_words("Diện tích: 133,17 m2", "Diện tích:"), "133,17 m2");
    assert_eq!(apply_exclude_words("Price  5 BILLION vnd", "billion|vnd"), "Price 5");

    let doc = dom::parse(GALLERY_PAGE);
    let mut area = field("Area", "p.area", ValueKind::Text);
    area.exclude_words = "Diện tích:".to_string();
    let out = scrape(&doc, &[area], &Options::default());
    assert_eq!(out["Area"], json!("133,17 m2"));
}

#[test]
fn attribute_and_markup_kinds() {
    let doc = dom::parse(GALLERY_PAGE);
    let fields = [
        field("Phone", "p.phone", ValueKind::DataPhone),
        field("Description", "div.description", ValueKind::Text),
        field("Markup", "div.description p", ValueKind::Html),
    ];
    let out = scrape(&doc, &fields, &Options::default());
    assert_eq!(out["Phone"], json!("0901 234 567"));
    assert_eq!(out["Description"], json!("Bright corner unit"));
    assert_eq!(out["Markup"], json!("Bright <b>corner</b> unit"));
}

#[test]
fn custom_selector_takes_precedence() {
    let doc = dom::parse(GALLERY_PAGE);
    let mut phone = field("Phone", "p.area", ValueKind::Text);
    phone.custom_selector = Some(Selector::axis(r#"//p[@class="phone"]"#));
    let out = scrape(&doc, &[phone], &Options::default());
    assert_eq!(out["Phone"], json!("Show number"));
}

#[test]
fn malformed_selector_scrapes_as_null() {
    let doc = dom::parse(GALLERY_PAGE);
    let broken = [field("Broken", "p[[", ValueKind::Text)];
    let out = scrape(&doc, &broken, &Options::default());
    assert_eq!(out["Broken"], Value::Null);
}

#[test]
fn field_names_stay_unique() {
    let existing = ["Price", "Price (2)"];
    assert_eq!(generate_field_name("Price", "span", existing), "Price (3)");
    assert_eq!(generate_field_name("   ", "img", existing), "img");
}

#[test]
fn stored_fields_survive_json() {
    let mut photos = field("Photos", ".photo-gallery", ValueKind::Src);
    photos.exclude_words = "ad".to_string();
    let json = serde_json::to_string(&vec![photos.clone()]).unwrap();
    assert!(json.contains(r#""valueType":"src""#));

    let restored: Vec<Field> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, vec![photos]);
}
