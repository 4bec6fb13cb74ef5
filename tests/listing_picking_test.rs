use pretty_assertions::assert_eq;
use regex::Regex;
use rs_field_picker::dom::{self, Document};
use rs_field_picker::{
    find_common_selector, ClickOutcome, Error, ListingSelectionKind, Mode, Options, Session, Verifier,
};

const ITEMS: &str = r#"<html><body>
    <header><a href="/">Home</a></header>
    <ul class="items">
        <li><a class="product-link" href="/p/101-red-chair">Red chair</a></li>
        <li><a class="product-link" href="/p/102-oak-table">Oak table</a></li>
        <li><a class="product-link" href="/p/103-lamp">Lamp</a></li>
        <li><a class="product-link" href="/p/104-rug">Rug</a></li>
    </ul>
    <div class="pagination">
        <a class="page" href="?page=1">1</a>
        <a class="page" href="?page=2">2</a>
        <a class="page" href="?page=3">3</a>
    </div>
</body></html>"#;

fn listing_session(doc: &Document, kind: ListingSelectionKind) -> Session {
    let mut session = Session::new(Options::default());
    session.set_mode(doc, Mode::Listing);
    session.start_listing_selection(kind);
    session
}

#[test]
fn two_clicks_find_a_pattern_covering_both_links() {
    let doc = dom::parse(ITEMS);
    let links = dom::select_all(&doc, "ul.items > li > a.product-link");
    let selector = find_common_selector(&doc, &links[0], &links[2]).unwrap();

    let matched = Verifier::new(&doc).execute(&selector);
    assert!(matched.len() > 1);
    assert!(matched.iter().any(|m| dom::is_same(m, &links[0])));
    assert!(matched.iter().any(|m| dom::is_same(m, &links[2])));
}

#[test]
fn session_records_first_item_then_stores_pattern() {
    let doc = dom::parse(ITEMS);
    let mut session = listing_session(&doc, ListingSelectionKind::ItemLink);
    let links = dom::select_all(&doc, "a.product-link");

    let first = session.click(&doc, &links[1]).into_result().unwrap();
    assert!(matches!(first, ClickOutcome::FirstItemRecorded { .. }));
    assert!(session.listing().item_link_selector.is_some());

    let second = session.click(&doc, &links[3]).into_result().unwrap();
    let ClickOutcome::ItemLinkSelected { selector, match_count } = second else {
        panic!("expected an item link pattern, got {second:?}");
    };
    assert_eq!(match_count, 4);
    assert_eq!(session.listing().item_link_selector.as_ref(), Some(&selector));
    assert_eq!(dom::select_all(&doc, ".scraper-field-selected").len(), 4);
}

#[test]
fn unrelated_links_report_no_pattern() {
    let doc = dom::parse(
        r#"<html><body>
            <nav><a href="/blog/2024/spring">Spring notes</a></nav>
            <footer><a href="/legal/terms">Terms</a></footer>
        </body></html>"#,
    );
    let links = dom::select_all(&doc, "a");
    let err = find_common_selector(&doc, &links[0], &links[1]).unwrap_err();
    assert!(matches!(err, Error::NoCommonPattern(_)));
    assert!(err.to_string().starts_with("No common pattern found"));
}

#[test]
fn item_link_click_outside_any_link_fails() {
    let doc = dom::parse(r#"<html><body><section><p>Nothing to follow</p></section></body></html>"#);
    let mut session = listing_session(&doc, ListingSelectionKind::ItemLink);
    let p = dom::select_all(&doc, "p")[0];

    let response = session.click(&doc, &p);
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("No link found near the clicked element"));
    assert!(session.listing().item_link_selector.is_none());
}

#[test]
fn next_page_selector_never_embeds_page_numbers() {
    let numeric_text = Regex::new(r"contains\((?:text\(\)|normalize-space\(\)).*\d").unwrap();
    let doc = dom::parse(ITEMS);

    for page in dom::select_all(&doc, ".pagination a") {
        let mut session = listing_session(&doc, ListingSelectionKind::NextPage);
        let outcome = session.click(&doc, &page).into_result().unwrap();
        let ClickOutcome::NextPageSelected { selector, match_count, .. } = outcome else {
            panic!("expected a next page selector, got {outcome:?}");
        };
        assert!(match_count > 0);
        assert!(
            !numeric_text.is_match(selector.expr()),
            "`{selector}` bakes in a page number"
        );
        assert_eq!(session.listing().next_page_selector.as_ref(), Some(&selector));
    }
}

#[test]
fn detail_clicks_are_ignored_until_selection_starts() {
    let doc = dom::parse(ITEMS);
    let mut session = Session::new(Options::default());
    session.set_mode(&doc, Mode::Listing);
    let link = dom::select_all(&doc, "a.product-link")[0];

    let response = session.click(&doc, &link);
    assert!(!response.success);
    assert!(session.listing().item_link_selector.is_none());
}
