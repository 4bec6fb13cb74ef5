//! Listing-page selectors: one pattern matching every item link.
//!
//! The two-click flow takes two representative items and searches for the
//! narrowest selector that covers both; the one-click flows settle for the
//! clicked link's own classes. Every candidate is checked to include the
//! clicked links before it is accepted.

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::dom::{self, NodeRef};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::patterns::{
    CARD_CONTAINER_TAGS, LIST_CONTAINER_KEYWORDS, PRODUCT_LINK_SELECTOR, TITLE_LINK_SELECTOR,
};
use crate::selector::paths::{common_ancestor, path_from_ancestor};
use crate::selector::{css, first_success, first_verified, Selector, Verifier};
use crate::url_utils::{parse_base, resolve, trailing_path};

/// Ancestors climbed when a click lands beside, not on, a link.
const SNAP_CLIMB: usize = 10;

/// Ancestors searched for a class when a link has none.
const PARENT_CLASS_CLIMB: usize = 5;

/// Ancestors of the first link searched for a common ancestor.
const COMMON_ANCESTOR_LIMIT: usize = 20;

/// Ancestors of the common ancestor searched for a list container class.
const CONTAINER_CLIMB: usize = 10;

/// Longest `data-*` value used as a shared-attribute selector.
const MAX_DATA_VALUE_LEN: usize = 50;

/// Shortest link text that counts as a headline when snapping.
const MIN_HEADLINE_CHARS: usize = 5;

fn is_link(node: &NodeRef) -> bool {
    dom::is_tag(node, "a") && dom::get_attribute(node, "href").is_some()
}

fn below_body(node: &NodeRef) -> bool {
    !dom::is_tag(node, "body") && !dom::is_tag(node, "html")
}

/// Link classes usable in a pattern: longer than two chars, not ours.
fn link_classes(node: &NodeRef) -> Vec<String> {
    dom::meaningful_classes(node, 2)
}

fn longest_first(mut classes: Vec<String>) -> Vec<String> {
    classes.sort_by_key(|c| std::cmp::Reverse(c.chars().count()));
    classes
}

/// The link a click on a listing card most likely meant.
///
/// Links are returned as-is. Inside a card, product links win over headline
/// links, which win over the link with the longest text. Failing all of that,
/// ancestors are searched for a link; the click itself is returned when none
/// is found.
#[must_use]
pub fn snap_to_main_link<'a>(node: &NodeRef<'a>) -> NodeRef<'a> {
    if is_link(node) {
        return *node;
    }
    if let Some(link) = dom::closest(node, "a[href]") {
        return link;
    }

    let tag = dom::tag_name(node);
    if CARD_CONTAINER_TAGS.contains(&tag.as_str()) {
        if let Some(link) = dom::query_selector(node, PRODUCT_LINK_SELECTOR).filter(is_link) {
            return link;
        }
        if let Some(link) = dom::query_selector(node, TITLE_LINK_SELECTOR) {
            return link;
        }
        let links = dom::query_selector_all(node, "a[href]");
        let headline = links
            .iter()
            .map(|l| (l, dom::inner_text(l).chars().count()))
            .filter(|(_, len)| *len > MIN_HEADLINE_CHARS)
            .max_by_key(|(_, len)| *len)
            .map(|(l, _)| *l);
        if let Some(link) = headline.or_else(|| links.first().copied()) {
            return link;
        }
    }

    let climb = std::iter::once(*node)
        .chain(dom::ancestor_elements(node))
        .take_while(below_body)
        .take(SNAP_CLIMB);
    for current in climb {
        if is_link(&current) {
            return current;
        }
        let tag = dom::tag_name(&current);
        if CARD_CONTAINER_TAGS.contains(&tag.as_str()) && tag != "td" && tag != "tr" {
            if let Some(link) = dom::query_selector(&current, PRODUCT_LINK_SELECTOR).filter(is_link) {
                return link;
            }
            if let Some(link) = dom::query_selector(&current, "a[href]") {
                return link;
            }
        }
    }
    *node
}

/// The enclosing link, a headline link inside, any link inside, or `node`.
#[must_use]
pub fn target_link_element<'a>(node: &NodeRef<'a>) -> NodeRef<'a> {
    dom::closest(node, "a[href]")
        .or_else(|| dom::query_selector(node, "h3 a, h2 a, h1 a, .title a, [class*=\"title\"] a, a[class*=\"title\"]"))
        .or_else(|| dom::query_selector(node, "a[href]"))
        .unwrap_or(*node)
}

/// `node` when it is a link, else its first link, else the enclosing link.
fn first_link_with_href<'a>(node: &NodeRef<'a>) -> NodeRef<'a> {
    if is_link(node) {
        return *node;
    }
    dom::query_selector(node, "a[href]")
        .or_else(|| dom::closest(node, "a[href]"))
        .unwrap_or(*node)
}

/// Link found for a single item-link click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLinkPick {
    /// Class-only form, e.g. `.product-link`.
    pub class_selector: String,
    pub selector: Selector,
    pub matched_count: usize,
    pub preview_url: String,
    pub preview_urls: Vec<String>,
}

/// Outcome of the one-click best-count search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCandidate {
    pub selector: Selector,
    pub match_count: usize,
}

/// Synthesizes selectors for repeating listing items.
#[derive(Clone, Copy)]
pub struct ListingSynthesizer<'a, 'o> {
    verifier: Verifier<'a>,
    options: &'o Options,
}

impl<'a, 'o> ListingSynthesizer<'a, 'o> {
    #[must_use]
    pub fn new(verifier: Verifier<'a>, options: &'o Options) -> Self {
        Self { verifier, options }
    }

    fn base(&self) -> Option<Url> {
        parse_base(self.options.page_url.as_deref())
    }

    fn href(&self, node: &NodeRef) -> Option<String> {
        dom::non_empty_attribute(node, "href").map(|h| resolve(&h, self.base().as_ref()))
    }

    /// Selector matching both clicked items and their siblings.
    ///
    /// Both clicks are first moved onto their link. Returns
    /// [`Error::TagMismatch`] when they are not both links and
    /// [`Error::NoCommonPattern`] when no candidate covers both.
    pub fn find_common_selector(&self, first: &NodeRef<'a>, second: &NodeRef<'a>) -> Result<Selector> {
        let a = first_link_with_href(first);
        let b = first_link_with_href(second);
        let (tag_a, tag_b) = (dom::tag_name(&a), dom::tag_name(&b));
        if tag_a != tag_b || tag_a != "a" {
            return Err(Error::TagMismatch {
                first: tag_a,
                second: tag_b,
            });
        }
        if dom::is_same(&a, &b) {
            return Err(Error::NoCommonPattern(
                "both clicks resolved to the same link".to_string(),
            ));
        }

        let covers = |s: &Selector| self.verifier.includes_all(s, &[a, b]);

        let own_class = || {
            let candidates = longest_first(link_classes(&a))
                .into_iter()
                .map(|c| Selector::path(css::tag_class(&tag_a, &c)));
            first_verified(candidates, &covers)
        };
        let shared_class = || {
            let theirs = link_classes(&b);
            let shared = link_classes(&a)
                .into_iter()
                .filter(|c| theirs.contains(c))
                .collect();
            let candidates = longest_first(shared)
                .into_iter()
                .map(|c| Selector::path(css::tag_class(&tag_a, &c)));
            first_verified(candidates, &covers)
        };
        let shared_data = || {
            let theirs = dom::data_attributes(&b);
            let candidates = dom::data_attributes(&a)
                .into_iter()
                .filter(|(_, v)| !v.is_empty() && v.chars().count() < MAX_DATA_VALUE_LEN)
                .filter(|pair| theirs.contains(pair))
                .map(|(name, value)| Selector::path(css::attr_equals(&tag_a, &name, &value)));
            first_verified(candidates, &covers)
        };
        let structural = || self.structural(&a, &b, &tag_a, &covers);
        let href_pattern = || {
            let base = self.base();
            let pa = trailing_path(&dom::get_attribute(&a, "href")?, base.as_ref(), 2)?;
            let pb = trailing_path(&dom::get_attribute(&b, "href")?, base.as_ref(), 2)?;
            if pa != pb {
                return None;
            }
            let candidate = Selector::path(format!("a[href*={}]", css::string(&format!("/{pa}"))));
            covers(&candidate).then_some(candidate)
        };
        let same_parent = || {
            let pa = dom::parent_element(&a)?;
            let pb = dom::parent_element(&b)?;
            if !dom::is_same(&pa, &pb) {
                return None;
            }
            let candidate = Selector::path(tag_a.as_str());
            (self.verifier.count(&candidate) > 1 && covers(&candidate)).then_some(candidate)
        };

        first_success(
            "common",
            &[
                ("own-class", &own_class),
                ("shared-class", &shared_class),
                ("shared-data", &shared_data),
                ("structural", &structural),
                ("href-pattern", &href_pattern),
                ("same-parent", &same_parent),
            ],
        )
        .map(|found| found.selector)
        .ok_or_else(|| {
            warn!("no common pattern between the two clicked items");
            Error::NoCommonPattern(
                "the two items share no class, data attribute, container or URL pattern".to_string(),
            )
        })
    }

    /// Patterns built from the common ancestor of the two links.
    fn structural(
        &self,
        a: &NodeRef<'a>,
        b: &NodeRef<'a>,
        tag: &str,
        covers: &dyn Fn(&Selector) -> bool,
    ) -> Option<Selector> {
        let ancestor = common_ancestor(a, b, COMMON_ANCESTOR_LIMIT)?;

        let container = std::iter::once(ancestor)
            .chain(dom::ancestor_elements(&ancestor))
            .take_while(below_body)
            .take(CONTAINER_CLIMB)
            .find_map(|el| {
                dom::meaningful_classes(&el, 3)
                    .into_iter()
                    .find(|c| LIST_CONTAINER_KEYWORDS.iter().any(|k| c.contains(k)))
            })
            .map(|c| css::class(&c));

        let mut candidates = Vec::new();
        if let Some(container) = &container {
            candidates.push(Selector::path(format!("{container} {tag}")));
            candidates.push(Selector::path(format!("{container} > * > {tag}")));
        }
        let path_a = path_from_ancestor(a, &ancestor);
        let path_b = path_from_ancestor(b, &ancestor);
        if !path_a.is_empty() && path_a == path_b {
            candidates.push(Selector::path(match &container {
                Some(container) => format!("{container} {path_a}"),
                None => path_a,
            }));
        }
        candidates.push(Selector::path(format!("{} {tag}", dom::tag_name(&ancestor))));
        first_verified(candidates, covers)
    }

    /// One-click item link: the clicked link's longest class.
    ///
    /// Falls back to the first classed ancestor (`.card a`) and finally to
    /// `a[href]`. Returns [`Error::NoLinkFound`] when no link is near the click.
    pub fn item_link(&self, node: &NodeRef<'a>) -> Result<ItemLinkPick> {
        let link = self.item_link_target(node).ok_or(Error::NoLinkFound)?;

        let own = longest_first(link_classes(&link)).into_iter().next();
        let (class_selector, selector) = match own {
            Some(class) => (css::class(&class), Selector::path(css::tag_class("a", &class))),
            None => {
                let parent_class = dom::ancestor_elements(&link)
                    .take_while(below_body)
                    .take(PARENT_CLASS_CLIMB)
                    .find_map(|el| link_classes(&el).into_iter().next());
                match parent_class {
                    Some(class) => {
                        let scoped = format!("{} a", css::class(&class));
                        (scoped.clone(), Selector::path(scoped))
                    }
                    None => ("a[href]".to_string(), Selector::path("a[href]")),
                }
            }
        };

        let matches = self.verifier.execute(&selector);
        let preview_urls = matches
            .iter()
            .filter_map(|m| {
                if dom::is_tag(m, "a") {
                    self.href(m)
                } else {
                    dom::query_selector(m, "a[href]").and_then(|l| self.href(&l))
                }
            })
            .take(self.options.preview_url_limit)
            .collect();

        debug!(%selector, count = matches.len(), "item link selector");
        Ok(ItemLinkPick {
            class_selector,
            selector,
            matched_count: matches.len(),
            preview_url: self.href(&link).unwrap_or_default(),
            preview_urls,
        })
    }

    fn item_link_target(&self, node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
        if is_link(node) {
            return Some(*node);
        }
        let inside = dom::query_selector(node, "a[href]");
        let around = || {
            std::iter::once(*node)
                .chain(dom::ancestor_elements(node))
                .take_while(below_body)
                .take(SNAP_CLIMB)
                .find_map(|el| dom::query_selector(&el, "a[href]"))
        };
        inside
            .or_else(around)
            .or_else(|| dom::closest(node, "a[href]"))
            .filter(is_link)
    }

    /// Best one-click pattern by match count: own class, ancestor class, data
    /// attribute, then URL shape; the bare tag when nothing matches more than
    /// the clicked node.
    #[must_use]
    pub fn generate_listing_selector(&self, node: &NodeRef<'a>) -> ListingCandidate {
        let tag = dom::tag_name(node);
        let usable = |c: &String| !c.contains("__");
        let mut candidates: Vec<Selector> = Vec::new();

        candidates.extend(
            link_classes(node)
                .into_iter()
                .filter(usable)
                .map(|c| Selector::path(css::tag_class(&tag, &c))),
        );
        for ancestor in dom::ancestor_elements(node).take(3) {
            candidates.extend(
                link_classes(&ancestor)
                    .into_iter()
                    .filter(usable)
                    .map(|c| Selector::path(format!("{} {tag}", css::class(&c)))),
            );
        }
        candidates.extend(
            dom::data_attributes(node)
                .into_iter()
                .filter(|(_, v)| !v.is_empty() && v.chars().count() < MAX_DATA_VALUE_LEN)
                .map(|(name, value)| Selector::path(css::attr_equals(&tag, &name, &value))),
        );
        if tag == "a" {
            let pattern = dom::get_attribute(node, "href")
                .and_then(|h| trailing_path(&h, self.base().as_ref(), 2));
            if let Some(pattern) = pattern {
                candidates.push(Selector::path(format!(
                    "a[href*={}]",
                    css::string(&format!("/{pattern}"))
                )));
            }
        }

        let mut best: Option<ListingCandidate> = None;
        for selector in candidates {
            let found = self.verifier.execute(&selector);
            let count = found.len();
            let better = best.as_ref().map_or(true, |b| count > b.match_count);
            if count > 1 && better && found.iter().any(|n| dom::is_same(n, node)) {
                best = Some(ListingCandidate {
                    selector,
                    match_count: count,
                });
            }
        }

        best.unwrap_or_else(|| {
            let selector = Selector::path(tag.as_str());
            let match_count = self.verifier.count(&selector);
            ListingCandidate {
                selector,
                match_count,
            }
        })
    }
}
