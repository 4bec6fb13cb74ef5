//! Picking session: the fields, listing selectors and mode a user builds up
//! by clicking on a page.
//!
//! A [`Session`] owns no document. Every operation takes the parsed page it
//! applies to, so one session can be replayed against many pages and many
//! sessions can share one page. Operations a hosting UI calls return a
//! [`Response`] instead of an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::dom::{self, Document, NodeId, NodeRef};
use crate::error::{Error, Result};
use crate::extract::Extractor;
use crate::field::{generate_field_name, Field, ValueKind};
use crate::identity::{unique_id, ElementReference};
use crate::options::Options;
use crate::patterns::{GALLERY_KEYWORDS, GENERATED_ID};
use crate::result::Response;
use crate::selector::paths::{absolute_path, full_selector};
use crate::selector::{css, Selector, SelectorLanguage, Verifier};
use crate::synthesis::detail::bold_label_row;
use crate::synthesis::listing::{snap_to_main_link, target_link_element};
use crate::synthesis::rules::find_override;
use crate::synthesis::{map, DetailSynthesizer, ItemLinkPick, ListingSynthesizer, PaginationSynthesizer};
use crate::url_utils::parse_base;

/// Class placed on every node a stored field currently matches.
pub const HIGHLIGHT_CLASS: &str = "scraper-field-selected";

/// Longest `textContent` kept on a new field.
const MAX_FIELD_TEXT_CHARS: usize = 2000;

/// Tags the pointer never highlights.
const SKIPPED_HOVER_TAGS: &[&str] = &["script", "style", "noscript", "meta"];

/// Which kind of page the user is describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// One value per click on a record page.
    #[default]
    Detail,
    /// Item links and the next-page control on an index page.
    Listing,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Detail => "detail",
            Self::Listing => "listing",
        }
    }
}

/// What a click means while in [`Mode::Listing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListingSelectionKind {
    /// Two clicks on two items; the first also yields a one-click candidate.
    ItemLink,
    /// The "next page" control, through the pagination cascade.
    NextPage,
    /// `nav.page li[aria-current='page'] + li a`.
    NextPageV1,
    /// Last `li` link of the list around the click.
    NextLi,
    /// Last link of the nearest pagination container.
    NextLastPagination,
}

/// Selectors describing a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_link_selector: Option<Selector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_selector: Option<Selector>,
}

/// Everything a session persists between page loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub fields: Vec<Field>,
    pub listing: ListingSpec,
    pub mode: Mode,
    #[serde(rename = "selectorTypePreference")]
    pub selector_language: SelectorLanguage,
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClickOutcome {
    /// A new field was stored.
    #[serde(rename_all = "camelCase")]
    FieldAdded {
        field: Field,
        strategy: &'static str,
        match_count: usize,
    },
    /// The clicked element already had a field, which was removed.
    FieldRemoved { name: String },
    /// First of two item clicks; carries the one-click candidate, which is
    /// stored until the second click refines it.
    #[serde(rename_all = "camelCase")]
    FirstItemRecorded { candidate: ItemLinkPick },
    /// The two-click pattern covering both items.
    #[serde(rename_all = "camelCase")]
    ItemLinkSelected { selector: Selector, match_count: usize },
    #[serde(rename_all = "camelCase")]
    NextPageSelected {
        selector: Selector,
        strategy: &'static str,
        match_count: usize,
    },
}

/// Selector chosen for a detail click, before it becomes a field.
struct DetailPick<'a> {
    node: NodeRef<'a>,
    selector: Selector,
    strategy: &'static str,
    map_target: Option<map::MapTarget<'a>>,
}

/// User-visible picking state and the operations that change it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    options: Options,
    fields: Vec<Field>,
    listing: ListingSpec,
    mode: Mode,
    listing_kind: Option<ListingSelectionKind>,
    selecting: bool,
    first_item: Option<NodeId>,
}

impl Session {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Restores persisted state; selection starts switched off.
    #[must_use]
    pub fn from_snapshot(snapshot: SessionSnapshot, mut options: Options) -> Self {
        options.selector_language = snapshot.selector_language;
        Self {
            options,
            fields: snapshot.fields,
            listing: snapshot.listing,
            mode: snapshot.mode,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            fields: self.fields.clone(),
            listing: self.listing.clone(),
            mode: self.mode,
            selector_language: self.options.selector_language,
        }
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn listing(&self) -> &ListingSpec {
        &self.listing
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn listing_kind(&self) -> Option<ListingSelectionKind> {
        self.listing_kind
    }

    #[must_use]
    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    #[must_use]
    pub fn selector_language(&self) -> SelectorLanguage {
        self.options.selector_language
    }

    // === Mode and selection state ===

    /// Switches click handling on or off, optionally changing the language.
    pub fn toggle_selecting(&mut self, doc: &Document, on: bool, language: Option<SelectorLanguage>) {
        self.selecting = on;
        if let Some(language) = language {
            self.options.selector_language = language;
        }
        if on {
            self.update_field_highlights(doc);
        } else {
            dom::remove_class_everywhere(doc, HIGHLIGHT_CLASS);
        }
        debug!(on, language = self.options.selector_language.as_str(), "selecting toggled");
    }

    /// Switches mode, dropping any half-finished listing selection.
    pub fn set_mode(&mut self, doc: &Document, mode: Mode) {
        if self.selecting && mode == Mode::Detail && self.mode == Mode::Listing {
            self.selecting = false;
        }
        self.mode = mode;
        self.listing_kind = None;
        self.first_item = None;
        dom::remove_class_everywhere(doc, HIGHLIGHT_CLASS);
        debug!(mode = mode.as_str(), "mode set");
    }

    /// Enters listing mode and starts waiting for a `kind` click.
    pub fn start_listing_selection(&mut self, kind: ListingSelectionKind) {
        self.mode = Mode::Listing;
        self.listing_kind = Some(kind);
        self.selecting = true;
        if kind == ListingSelectionKind::ItemLink {
            self.first_item = None;
        }
    }

    /// Forgets the first of two item clicks.
    pub fn reset_item_link_selection(&mut self, doc: &Document) {
        self.first_item = None;
        dom::remove_class_everywhere(doc, HIGHLIGHT_CLASS);
    }

    /// Replaces the field list, as after edits in a field editor.
    pub fn update_fields(&mut self, doc: &Document, fields: Vec<Field>) {
        self.fields = fields;
        self.update_field_highlights(doc);
    }

    /// Flips the selector language; returns the new one.
    pub fn toggle_selector_language(&mut self) -> SelectorLanguage {
        self.options.selector_language = self.options.selector_language.toggled();
        info!(language = self.options.selector_language.as_str(), "selector language");
        self.options.selector_language
    }

    /// Stops selecting and clears highlights.
    pub fn cancel(&mut self, doc: &Document) {
        if self.selecting {
            self.selecting = false;
            dom::remove_class_everywhere(doc, HIGHLIGHT_CLASS);
        }
    }

    /// Marks every node a stored field matches with [`HIGHLIGHT_CLASS`].
    pub fn update_field_highlights(&self, doc: &Document) {
        dom::remove_class_everywhere(doc, HIGHLIGHT_CLASS);
        let verifier = Verifier::new(doc);
        for field in &self.fields {
            dom::add_class(&verifier.execute(&field.selector), HIGHLIGHT_CLASS);
        }
    }

    /// Node the pointer should highlight when it rests on `node`.
    ///
    /// While picking item links the highlight snaps onto the card's main link.
    #[must_use]
    pub fn hover_target<'a>(&self, node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
        if !self.selecting {
            return None;
        }
        let mut target = *node;
        if self.mode == Mode::Listing && self.listing_kind == Some(ListingSelectionKind::ItemLink) {
            target = snap_to_main_link(&target);
            if !dom::is_tag(&target, "a") {
                target = target_link_element(&target);
            }
        }
        let tag = dom::tag_name(&target);
        (!tag.is_empty() && !SKIPPED_HOVER_TAGS.contains(&tag.as_str())).then_some(target)
    }

    // === Queries ===

    /// `{name: value}` for `fields`, or for the session's own fields.
    #[must_use]
    pub fn scrape(&self, doc: &Document, fields: Option<&[Field]>) -> Response<Map<String, Value>> {
        let fields = fields.unwrap_or(&self.fields);
        Response::ok(Extractor::new(Verifier::new(doc), &self.options).scrape(fields))
    }

    /// Value `selector` yields right now.
    #[must_use]
    pub fn preview_value(
        &self,
        doc: &Document,
        selector: &Selector,
        kind: ValueKind,
        field: Option<&Field>,
    ) -> Response<Value> {
        Response::ok(Extractor::new(Verifier::new(doc), &self.options).preview(selector, kind, field))
    }

    /// Re-expresses `selector` in the other language.
    #[must_use]
    pub fn convert_selector(&self, doc: &Document, selector: &Selector, field: Option<&Field>) -> Response<Selector> {
        self.try_convert_selector(doc, selector, field).into()
    }

    fn try_convert_selector(&self, doc: &Document, selector: &Selector, field: Option<&Field>) -> Result<Selector> {
        let verifier = Verifier::new(doc);
        let found = verifier
            .try_execute(selector)
            .map_err(|e| Error::ConversionFailed(e.to_string()))?;
        let node = found
            .first()
            .ok_or_else(|| Error::ConversionFailed(format!("`{selector}` matches nothing")))?;
        let wanted = selector.language().toggled();

        let stored = field.and_then(|f| {
            [Some(&f.selector), f.alternate_selector.as_ref()]
                .into_iter()
                .flatten()
                .find(|s| s.language() == wanted)
                .cloned()
        });
        if let Some(stored) = stored {
            return Ok(stored);
        }

        let synth = DetailSynthesizer::new(verifier, &self.options);
        let converted = match wanted {
            SelectorLanguage::Path => dom::id(node)
                .filter(|id| !GENERATED_ID.is_match(id))
                .map(|id| Selector::path(css::id(&id)))
                .or_else(|| synth.counterpart(node, selector)),
            SelectorLanguage::Axis => synth
                .counterpart(node, selector)
                .or_else(|| absolute_path(node).map(Selector::axis)),
        };
        converted.ok_or_else(|| Error::ConversionFailed(format!("no {} form for `{selector}`", wanted.as_str())))
    }

    // === Clicks ===

    /// Handles a click on `node` according to the current mode.
    pub fn click(&mut self, doc: &Document, node: &NodeRef) -> Response<ClickOutcome> {
        self.try_click(doc, node).into()
    }

    /// [`Session::click`] with the error kept typed.
    pub fn try_click(&mut self, doc: &Document, node: &NodeRef) -> Result<ClickOutcome> {
        let outcome = match self.mode {
            Mode::Detail => self.click_detail(doc, node),
            Mode::Listing => self.click_listing(doc, node),
        };
        if let Err(err) = &outcome {
            warn!(%err, "click rejected");
        }
        outcome
    }

    fn click_detail(&mut self, doc: &Document, node: &NodeRef) -> Result<ClickOutcome> {
        if !self.selecting {
            return Err(Error::NotSelecting(Mode::Detail.as_str()));
        }
        let verifier = Verifier::new(doc);
        let base = parse_base(self.options.page_url.as_deref());

        let pick = self.pick_detail(verifier, node);
        let matches = verifier.execute(&pick.selector);
        if matches.len() > self.options.over_broad_threshold {
            warn!(selector = %pick.selector, count = matches.len(), "selector too broad");
            return Err(Error::OverBroadSelector {
                selector: pick.selector.to_string(),
                count: matches.len(),
                threshold: self.options.over_broad_threshold,
            });
        }
        if !matches.iter().any(|m| dom::is_same(m, &pick.node)) {
            return Err(Error::NoMatch(pick.selector.to_string()));
        }

        let reference = ElementReference::capture(&pick.node, &verifier, base.as_ref());
        let uid = unique_id(&pick.node, &pick.selector, base.as_ref());
        let existing = self.fields.iter().position(|f| {
            f.unique_id == uid || (reference.is_some() && f.element_reference == reference)
        });
        if let Some(index) = existing {
            let removed = self.fields.remove(index);
            info!(field = %removed.name, "field removed");
            self.update_field_highlights(doc);
            return Ok(ClickOutcome::FieldRemoved { name: removed.name });
        }

        let tag = dom::tag_name(&pick.node);
        let text = match &pick.map_target {
            Some(target) => map::frame_text(target),
            None => dom::extract_text(&pick.node),
        };
        let name = generate_field_name(&text, &tag, self.fields.iter().map(|f| f.name.as_str()));

        let synth = DetailSynthesizer::new(verifier, &self.options);
        let mut field = Field::new(name, pick.selector.clone());
        field.alternate_selector = synth.counterpart(&pick.node, &pick.selector);
        field.full_selector = Some(full_selector(&pick.node));
        field.unique_id = uid;
        field.element_reference = reference;
        field.text_content = dom::truncate_chars(&text, MAX_FIELD_TEXT_CHARS);
        field.value_kind = if pick.map_target.is_some() {
            ValueKind::Coordinates
        } else if wants_image_source(&pick.node) {
            ValueKind::Src
        } else {
            ValueKind::Text
        };
        field.tag_name = tag;

        info!(field = %field.name, selector = %field.selector, strategy = pick.strategy, "field added");
        self.fields.push(field.clone());
        self.update_field_highlights(doc);
        Ok(ClickOutcome::FieldAdded {
            field,
            strategy: pick.strategy,
            match_count: matches.len(),
        })
    }

    /// Chooses the node and selector a detail click stands for.
    fn pick_detail<'a>(&self, verifier: Verifier<'a>, clicked: &NodeRef<'a>) -> DetailPick<'a> {
        let language = self.options.selector_language;
        let synth = DetailSynthesizer::new(verifier, &self.options);

        let map_target = map::retarget(clicked);
        let mut node = map_target.map_or(*clicked, |t| t.frame);

        let bold = (language == SelectorLanguage::Axis)
            .then(|| bold_label_row(&node))
            .flatten();
        let (mut selector, mut strategy, mut forced) = match bold {
            Some(row) => {
                node = row.row;
                (row.selector, "bold-label", true)
            }
            None => {
                let found = synth.synthesize_in(&node, language);
                (found.selector, found.strategy, false)
            }
        };

        if map_target.is_some() {
            if let Some(frame) = map::frame_selector(&node, language) {
                selector = frame;
                strategy = "map-frame";
            }
        }

        if let Some(rule) = find_override(&self.options.override_rules, &node, self.options.page_url.as_deref()) {
            debug!(rule = rule.name, "override rule applies");
            selector = rule.selector(language);
            strategy = rule.name;
            forced = true;
        }

        if !forced {
            selector = synth.tighten(selector, &node);
        }
        DetailPick {
            node,
            selector,
            strategy,
            map_target,
        }
    }

    fn click_listing(&mut self, doc: &Document, node: &NodeRef) -> Result<ClickOutcome> {
        let kind = match (self.selecting, self.listing_kind) {
            (true, Some(kind)) => kind,
            _ => return Err(Error::NotSelecting(Mode::Listing.as_str())),
        };
        let verifier = Verifier::new(doc);

        if kind == ListingSelectionKind::ItemLink {
            return self.click_item_link(doc, verifier, node);
        }

        let synth = PaginationSynthesizer::new(verifier, &self.options);
        let (selector, strategy, match_count) = match kind {
            ListingSelectionKind::NextPageV1 => {
                let (s, n) = synth.next_after_current();
                (s, "next-after-current", n)
            }
            ListingSelectionKind::NextLi => {
                let (s, n) = synth.next_last_item(node);
                (s, "last-list-item", n)
            }
            ListingSelectionKind::NextLastPagination => {
                let (s, n) = synth.next_last_in_pagination(node);
                (s, "last-in-pagination", n)
            }
            _ => {
                let found = synth.synthesize(node);
                let n = verifier.count(&found.selector);
                (found.selector, found.strategy, n)
            }
        };
        if match_count == 0 {
            return Err(Error::NoMatch(selector.to_string()));
        }
        if match_count > self.options.over_broad_threshold {
            warn!(%selector, count = match_count, "next page selector too broad");
            return Err(Error::OverBroadSelector {
                selector: selector.to_string(),
                count: match_count,
                threshold: self.options.over_broad_threshold,
            });
        }
        info!(%selector, strategy, match_count, "next page selector");
        self.listing.next_page_selector = Some(selector.clone());
        Ok(ClickOutcome::NextPageSelected {
            selector,
            strategy,
            match_count,
        })
    }

    fn click_item_link(&mut self, doc: &Document, verifier: Verifier, node: &NodeRef) -> Result<ClickOutcome> {
        let synth = ListingSynthesizer::new(verifier, &self.options);
        let first = self.first_item.and_then(|id| dom::node_by_id(doc, id));

        let Some(first) = first else {
            let candidate = synth.item_link(node)?;
            dom::remove_class_everywhere(doc, HIGHLIGHT_CLASS);
            dom::add_class(&[snap_to_main_link(node)], HIGHLIGHT_CLASS);
            self.listing.item_link_selector = Some(candidate.selector.clone());
            self.first_item = Some(node.id);
            return Ok(ClickOutcome::FirstItemRecorded { candidate });
        };

        self.first_item = None;
        dom::remove_class_everywhere(doc, HIGHLIGHT_CLASS);
        let selector = synth.find_common_selector(&snap_to_main_link(&first), &snap_to_main_link(node))?;
        let match_count = verifier.count(&selector);
        info!(%selector, match_count, "item link pattern");
        dom::add_class(&verifier.execute(&selector), HIGHLIGHT_CLASS);
        self.listing.item_link_selector = Some(selector.clone());
        Ok(ClickOutcome::ItemLinkSelected { selector, match_count })
    }
}

/// Images, carousels and anything holding an image default to the `src` kind.
fn wants_image_source(node: &NodeRef) -> bool {
    let class = dom::class_name(node);
    dom::is_tag(node, "img")
        || GALLERY_KEYWORDS.iter().any(|k| class.contains(k))
        || dom::query_selector(node, "img").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DETAIL: &str = r#"<html><body>
        <div class="info">
            <span class="label">Price</span><span class="value">5 billion</span>
        </div>
        <div class="media"><img data-src="https://x/a.jpg" src="/blank.gif"></div>
        <table><tr><td><b>Hướng:</b> Đông</td></tr></table>
    </body></html>"#;

    fn selecting(options: Options, doc: &Document) -> Session {
        let mut session = Session::new(options);
        session.toggle_selecting(doc, true, None);
        session
    }

    fn added(response: Response<ClickOutcome>) -> Field {
        match response.into_result() {
            Ok(ClickOutcome::FieldAdded { field, .. }) => field,
            other => panic!("expected a new field, got {other:?}"),
        }
    }

    #[test]
    fn test_click_requires_selecting() {
        let doc = dom::parse(DETAIL);
        let mut session = Session::new(Options::default());
        let node = dom::select_all(&doc, ".value")[0];
        let response = session.click(&doc, &node);
        assert!(!response.success);
        assert!(session.fields().is_empty());
    }

    #[test]
    fn test_reclick_toggles_field() {
        let doc = dom::parse(DETAIL);
        let mut session = selecting(Options::default(), &doc);
        let node = dom::select_all(&doc, ".value")[0];

        let field = added(session.click(&doc, &node));
        assert!(Verifier::new(&doc).includes(&field.selector, &node));
        assert_eq!(dom::select_all(&doc, ".scraper-field-selected").len(), 1);

        let removed = session.click(&doc, &node).into_result().unwrap();
        assert_eq!(removed, ClickOutcome::FieldRemoved { name: field.name });
        assert!(session.fields().is_empty());

        let again = added(session.click(&doc, &node));
        assert_eq!(session.fields().len(), 1);
        assert_eq!(again.name, "5 billion");
    }

    #[test]
    fn test_image_click_stores_src_field() {
        let doc = dom::parse(DETAIL);
        let mut session = selecting(Options::default(), &doc);
        let img = dom::select_all(&doc, "img")[0];

        let field = added(session.click(&doc, &img));
        assert_eq!(field.selector, Selector::axis("/html/body/div[2]/img"));
        assert_eq!(field.tag_name, "img");
        assert_eq!(field.value_kind, ValueKind::Src);

        let out = session.scrape(&doc, None).into_result().unwrap();
        assert_eq!(out[&field.name], Value::from(vec!["https://x/a.jpg"]));
    }

    #[test]
    fn test_bold_label_row_is_forced() {
        let doc = dom::parse(DETAIL);
        let mut session = selecting(Options::default(), &doc);
        let td = dom::select_all(&doc, "td")[0];
        let field = added(session.click(&doc, &td));
        assert_eq!(
            field.selector,
            Selector::axis(r#"//td[b[contains(normalize-space(), "Hướng")]]"#)
        );
    }

    #[test]
    fn test_over_broad_selector_rejected() {
        let items: String = (0..5).map(|i| format!("<p>item {i}</p>")).collect();
        let doc = dom::parse(&format!("<html><body>{items}</body></html>"));
        let options = Options {
            over_broad_threshold: 3,
            override_rules: vec![crate::synthesis::rules::OverrideRule {
                name: "all-paragraphs",
                host_contains: None,
                applies: |n| dom::is_tag(n, "p"),
                path: "p".to_string(),
                axis: "//p".to_string(),
            }],
            ..Options::default()
        };
        let mut session = selecting(options, &doc);
        let p = dom::select_all(&doc, "p")[0];
        let response = session.click(&doc, &p);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("matched 5 elements"));
        assert!(session.fields().is_empty());
    }

    #[test]
    fn test_over_broad_next_page_not_stored() {
        let pager = r#"<nav class="page"><ul>
            <li aria-current="page"><a href="?p=1">1</a></li>
            <li><a href="?p=2">2</a></li>
        </ul></nav>"#;
        let doc = dom::parse(&format!("<html><body>{pager}<p>results</p>{pager}</body></html>"));
        let options = Options {
            over_broad_threshold: 1,
            ..Options::default()
        };
        let mut session = Session::new(options);
        session.start_listing_selection(ListingSelectionKind::NextPageV1);
        let next = dom::select_all(&doc, "li a")[1];

        let response = session.click(&doc, &next);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("matched 2 elements (limit 1)"));
        assert_eq!(session.listing().next_page_selector, None);

        let mut roomy = Session::new(Options::default());
        roomy.start_listing_selection(ListingSelectionKind::NextPageV1);
        let outcome = roomy.click(&doc, &next).into_result().unwrap();
        assert!(matches!(outcome, ClickOutcome::NextPageSelected { match_count: 2, .. }));
        assert!(roomy.listing().next_page_selector.is_some());
    }

    #[test]
    fn test_set_mode_clears_highlights_and_first_item() {
        let doc = dom::parse(DETAIL);
        let mut session = selecting(Options::default(), &doc);
        let node = dom::select_all(&doc, ".value")[0];
        added(session.click(&doc, &node));

        session.set_mode(&doc, Mode::Listing);
        assert_eq!(session.mode(), Mode::Listing);
        assert_eq!(session.listing_kind(), None);
        assert!(dom::select_all(&doc, ".scraper-field-selected").is_empty());
        assert_eq!(session.fields().len(), 1);
    }

    #[test]
    fn test_cancel_and_language_toggle() {
        let doc = dom::parse(DETAIL);
        let mut session = selecting(Options::default(), &doc);
        assert_eq!(session.toggle_selector_language(), SelectorLanguage::Path);
        session.cancel(&doc);
        assert!(!session.is_selecting());
        let node = dom::select_all(&doc, ".value")[0];
        assert!(session.hover_target(&node).is_none());
    }

    #[test]
    fn test_convert_selector_both_ways() {
        let doc = dom::parse(DETAIL);
        let session = Session::new(Options::default());
        let to_path = session
            .convert_selector(&doc, &Selector::axis("/html/body/div[2]/img"), None)
            .into_result()
            .unwrap();
        assert_eq!(to_path.language(), SelectorLanguage::Path);
        assert_eq!(dom::select_all(&doc, to_path.expr()).len(), 1);

        let to_axis = session
            .convert_selector(&doc, &Selector::path(".media img"), None)
            .into_result()
            .unwrap();
        assert_eq!(to_axis, Selector::axis("/html/body/div[2]/img"));

        let failed = session.convert_selector(&doc, &Selector::path("table.none"), None);
        assert!(!failed.success);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let doc = dom::parse(DETAIL);
        let mut session = selecting(Options::default(), &doc);
        let node = dom::select_all(&doc, ".value")[0];
        added(session.click(&doc, &node));

        let json = serde_json::to_string(&session.snapshot()).unwrap();
        let restored = Session::from_snapshot(serde_json::from_str(&json).unwrap(), Options::default());
        assert_eq!(restored.fields(), session.fields());
        assert!(!restored.is_selecting());
    }
}
