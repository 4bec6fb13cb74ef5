//! Performance benchmarks for rs-field-picker.
//!
//! Run with: `cargo bench`
//!
//! Benchmarks include:
//! - Detail selector synthesis on a small property page
//! - Two-click listing patterns on generated listings of growing size
//! - Scraping a stored field set

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rs_field_picker::{
    dom, find_common_selector, scrape, synthesize_selector, Field, Options, Selector, SelectorLanguage,
    ValueKind,
};

const DETAIL_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Sunny flat</title></head>
<body>
    <nav><a href="/">Home</a><a href="/rent">Rent</a></nav>
    <main>
        <h1 class="title">Sunny flat near the park</h1>
        <div class="specs">
            <div class="info"><span class="label">Price</span><span class="value">5 billion</span></div>
            <div class="info"><span class="label">Area</span><span class="value">80 m2</span></div>
            <div class="info"><span class="label">Bedrooms</span><span class="value">3</span></div>
        </div>
        <div class="photo-gallery">
            <img src="https://img.example/resize/1275x717/1.jpg">
            <img src="https://img.example/resize/200x200/1.jpg">
            <img data-src="https://img.example/resize/1275x717/2.jpg">
        </div>
        <table><tr><td><b>Direction:</b> East</td></tr></table>
    </main>
</body>
</html>
"#;

fn listing_html(items: usize) -> String {
    let cards: String = (0..items)
        .map(|i| {
            format!(
                r#"<li class="card"><img src="/t/{i}.jpg"><h3><a class="product-link" href="/p/{i}">Item {i}</a></h3><span class="price">{i}00</span></li>"#
            )
        })
        .collect();
    format!(r#"<html><body><ul class="items">{cards}</ul></body></html>"#)
}

fn bench_detail_synthesis(c: &mut Criterion) {
    let doc = dom::parse(DETAIL_HTML);
    let value = dom::select_all(&doc, ".value")[1];
    let img = dom::select_all(&doc, "img")[2];

    c.bench_function("synthesize_value", |b| {
        b.iter(|| synthesize_selector(black_box(&doc), black_box(&value)));
    });
    c.bench_function("synthesize_image", |b| {
        b.iter(|| synthesize_selector(black_box(&doc), black_box(&img)));
    });
}

fn bench_common_selector(c: &mut Criterion) {
    let mut group = c.benchmark_group("common_selector");

    for items in [10, 100, 500] {
        let html = listing_html(items);
        let doc = dom::parse(&html);
        let links = dom::select_all(&doc, "a.product-link");
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::new("two_click", items), &links, |b, links| {
            b.iter(|| find_common_selector(black_box(&doc), &links[0], &links[links.len() - 1]));
        });
    }

    group.finish();
}

fn bench_scrape(c: &mut Criterion) {
    let doc = dom::parse(DETAIL_HTML);
    let mut photos = Field::new("Photos", Selector::path(".photo-gallery"));
    photos.value_kind = ValueKind::Src;
    let fields = vec![
        Field::new("Title", Selector::path("h1.title")),
        Field::new(
            "Price",
            Selector::axis(r#"//span[@class="label"][normalize-space()="Price"]/following-sibling::span"#),
        ),
        Field::new("Direction", Selector::new(SelectorLanguage::Axis, "//td[b]")),
        photos,
    ];
    let options = Options::default();

    c.bench_function("scrape_fields", |b| {
        b.iter(|| scrape(black_box(&doc), black_box(&fields), &options));
    });
}

criterion_group!(benches, bench_detail_synthesis, bench_common_selector, bench_scrape);
criterion_main!(benches);
