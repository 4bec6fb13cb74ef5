use std::collections::HashSet;

use pretty_assertions::assert_eq;
use rs_field_picker::dom::{self, Document, NodeRef};
use rs_field_picker::url_utils::parse_base;
use rs_field_picker::{
    ClickOutcome, Extractor, Field, Options, SelectorLanguage, Session, ValueKind, Verifier,
};
use serde_json::json;

const LISTING_PAGE: &str = r#"<html><body>
    <h1 class="title">Sunny flat near the park</h1>
    <div class="info"><span class="label">Price</span><span class="value">5 billion</span></div>
    <div class="info"><span class="label">Area</span><span class="value">80 m2</span></div>
    <ul class="amenities"><li>garden</li><li>garage</li><li>pool</li></ul>
    <a class="agent" href="/agent/7" data-id="a7">Call the agent</a>
    <p class="note">Same</p>
    <p class="note">Same</p>
</body></html>"#;

fn selecting_session(doc: &Document) -> Session {
    let mut session = Session::new(Options::default());
    session.toggle_selecting(doc, true, None);
    session
}

fn added_field(session: &mut Session, doc: &Document, node: &NodeRef) -> Field {
    match session.click(doc, node).into_result() {
        Ok(ClickOutcome::FieldAdded { field, .. }) => field,
        other => panic!("expected a new field, got {other:?}"),
    }
}

#[test]
fn every_created_field_matches_its_clicked_node() {
    let doc = dom::parse(LISTING_PAGE);
    let mut session = selecting_session(&doc);
    let verifier = Verifier::new(&doc);

    let clicked = [
        dom::select_all(&doc, "h1")[0],
        dom::select_all(&doc, ".value")[0],
        dom::select_all(&doc, ".value")[1],
        dom::select_all(&doc, "ul.amenities li")[1],
        dom::select_all(&doc, "a.agent")[0],
    ];

    for node in &clicked {
        let field = added_field(&mut session, &doc, node);
        let matched = verifier.execute(&field.selector);
        assert!(
            matched.iter().any(|m| dom::is_same(m, node)),
            "`{}` does not match the clicked node",
            field.selector
        );
        if let Some(reference) = &field.element_reference {
            let narrowed = reference.filter(&matched, &verifier, None);
            assert_eq!(narrowed.len(), 1, "reference {reference:?} is ambiguous");
            assert!(dom::is_same(&narrowed[0], node));
        }
    }
    assert_eq!(session.fields().len(), clicked.len());
}

#[test]
fn reclick_removes_then_readds_without_duplicate_names() {
    let doc = dom::parse(LISTING_PAGE);
    let mut session = selecting_session(&doc);
    let notes = dom::select_all(&doc, "p.note");

    let first = added_field(&mut session, &doc, &notes[0]);
    let second = added_field(&mut session, &doc, &notes[1]);
    assert_eq!(first.name, "Same");
    assert_eq!(second.name, "Same (2)");

    let removed = session.click(&doc, &notes[0]).into_result().unwrap();
    assert_eq!(removed, ClickOutcome::FieldRemoved { name: "Same".to_string() });
    assert_eq!(session.fields().len(), 1);

    let readded = added_field(&mut session, &doc, &notes[0]);
    assert_eq!(readded.name, "Same");

    let names: HashSet<&str> = session.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names.len(), session.fields().len());
}

#[test]
fn lazy_image_click_builds_absolute_path_and_reads_data_src() {
    let doc = dom::parse(
        r#"<html><body>
            <div><p>Intro</p></div>
            <div><img data-src="https://x/a.jpg" src="/placeholder.gif"></div>
        </body></html>"#,
    );
    let mut session = selecting_session(&doc);
    assert_eq!(session.selector_language(), SelectorLanguage::Axis);

    let img = dom::select_all(&doc, "img")[0];
    let field = added_field(&mut session, &doc, &img);
    assert!(field.selector.is_axis());
    assert!(field.selector.expr().starts_with("/html/body/"));

    let verifier = Verifier::new(&doc);
    assert!(verifier.matches_exactly(&field.selector, &img));
    assert_eq!(field.value_kind, ValueKind::Src);

    let options = Options::default();
    let extractor = Extractor::new(verifier, &options);
    assert_eq!(extractor.value_of(&img, ValueKind::Src, ""), json!("https://x/a.jpg"));

    let scraped = session.scrape(&doc, None).into_result().unwrap();
    assert_eq!(scraped[&field.name], json!(["https://x/a.jpg"]));
}

#[test]
fn scrape_reads_stored_fields_on_a_sibling_page() {
    let picked_on = dom::parse(LISTING_PAGE);
    let mut session = selecting_session(&picked_on);
    let price = dom::select_all(&picked_on, ".value")[0];
    let field = added_field(&mut session, &picked_on, &price);

    let sibling = dom::parse(
        r#"<html><body>
            <h1 class="title">Quiet house</h1>
            <div class="info"><span class="label">Price</span><span class="value">7 billion</span></div>
            <div class="info"><span class="label">Area</span><span class="value">120 m2</span></div>
        </body></html>"#,
    );
    let scraped = session.scrape(&sibling, None).into_result().unwrap();
    assert_eq!(scraped[&field.name], json!("7 billion"));
}

#[test]
fn path_language_session_produces_css_fields() {
    let doc = dom::parse(LISTING_PAGE);
    let mut session = Session::new(Options::default());
    session.toggle_selecting(&doc, true, Some(SelectorLanguage::Path));

    let agent = dom::select_all(&doc, "a.agent")[0];
    let field = added_field(&mut session, &doc, &agent);
    assert_eq!(field.selector.language(), SelectorLanguage::Path);
    assert!(Verifier::new(&doc).includes(&field.selector, &agent));
    assert!(field
        .alternate_selector
        .as_ref()
        .is_some_and(|alt| alt.language() == SelectorLanguage::Axis));
}

#[test]
fn resolved_hrefs_use_page_url() {
    let doc = dom::parse(LISTING_PAGE);
    let options = Options {
        page_url: Some("https://homes.example/listing/12".to_string()),
        ..Options::default()
    };
    let base = parse_base(options.page_url.as_deref());
    assert!(base.is_some());

    let agent = dom::select_all(&doc, "a.agent")[0];
    let extractor = Extractor::new(Verifier::new(&doc), &options);
    assert_eq!(
        extractor.value_of(&agent, ValueKind::Href, ""),
        json!("https://homes.example/agent/7")
    );
}
