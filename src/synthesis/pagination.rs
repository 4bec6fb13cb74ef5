//! "Next page" control selectors.
//!
//! Page numbers change on every page, so a selector that bakes one in stops
//! matching as soon as the crawler advances. The cascade here prefers icons,
//! position within the pager, and stable classes; text predicates only ever
//! come from the detail fallback and are dropped when the text is numeric.

use tracing::{debug, warn};

use crate::dom::{self, NodeRef};
use crate::options::Options;
use crate::patterns::{
    GENERATED_ID, ICON_KEYWORDS, NUMERIC_TEXT, PAGE_NUMBER_CLASS, PAGINATION_CONTAINER_SELECTOR,
    PAGINATION_DATA_KEYWORDS, PAGINATION_LINK_KEYWORDS, TEXT_PREDICATE_WITH_DIGIT,
};
use crate::selector::paths::{full_selector, unique_css_path};
use crate::selector::{
    css, first_success, first_verified, xpath, Selector, SelectorLanguage, Synthesized, Verifier,
};
use crate::synthesis::detail::DetailSynthesizer;

/// Template selector for pagers that mark the current page with `aria-current`.
pub const NEXT_AFTER_CURRENT: &str = "nav.page li[aria-current='page'] + li a";

/// Containers searched by the last-link variant.
const LAST_LINK_CONTAINER_SELECTOR: &str = r#"[class*="pagination"], [class*="page"], nav"#;

const ICON_TAGS: &str = "i, svg, span";

fn has_keyword(class: &str, keywords: &[&str]) -> bool {
    let lower = class.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn icon_class(node: &NodeRef) -> Option<String> {
    dom::meaningful_classes(node, 2)
        .into_iter()
        .find(|c| has_keyword(c, ICON_KEYWORDS))
}

/// An `i`/`svg`/`span` whose class names an arrow or chevron.
#[must_use]
pub fn is_icon(node: &NodeRef) -> bool {
    matches!(dom::tag_name(node).as_str(), "i" | "svg" | "span") && icon_class(node).is_some()
}

/// The icon at, inside, or around `node`.
#[must_use]
pub fn find_icon<'a>(node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    if is_icon(node) {
        return Some(*node);
    }
    dom::query_selector_all(node, ICON_TAGS)
        .into_iter()
        .find(is_icon)
        .or_else(|| dom::closest(node, ICON_TAGS).filter(is_icon))
}

/// Whether a selector relies on text that reads like a page number.
#[must_use]
pub fn has_numeric_text_predicate(selector: &Selector, node: &NodeRef) -> bool {
    let expr = selector.expr();
    if TEXT_PREDICATE_WITH_DIGIT.is_match(expr) {
        return true;
    }
    let text_predicate =
        expr.contains("contains(text()") || expr.contains("contains(normalize-space()");
    text_predicate && NUMERIC_TEXT.is_match(dom::extract_text(node).trim())
}

/// Pager around `node`: a pagination-named ancestor, else a parent holding
/// several controls of the node's tag.
fn pager<'a>(node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    let parent = dom::parent_element(node)?;
    if let Some(found) = dom::closest(&parent, PAGINATION_CONTAINER_SELECTOR) {
        return Some(found);
    }
    let tag = dom::tag_name(node);
    let twins = parent
        .element_children()
        .iter()
        .filter(|c| !dom::is_same(c, node) && dom::tag_name(c) == tag)
        .count();
    (twins > 0).then_some(parent)
}

/// Synthesizes the selector of a "next page" control.
#[derive(Clone, Copy)]
pub struct PaginationSynthesizer<'a, 'o> {
    verifier: Verifier<'a>,
    options: &'o Options,
}

impl<'a, 'o> PaginationSynthesizer<'a, 'o> {
    #[must_use]
    pub fn new(verifier: Verifier<'a>, options: &'o Options) -> Self {
        Self { verifier, options }
    }

    #[must_use]
    pub fn synthesize(&self, node: &NodeRef<'a>) -> Synthesized {
        self.synthesize_in(node, self.options.selector_language)
    }

    /// Selector for the control at `node`, never carrying a page number.
    #[must_use]
    pub fn synthesize_in(&self, node: &NodeRef<'a>, language: SelectorLanguage) -> Synthesized {
        let container = pager(node);
        let scope = container.as_ref().and_then(|c| {
            dom::meaningful_classes(c, 2)
                .into_iter()
                .next()
                .map(|class| (dom::tag_name(c), class))
        });
        let scoped = |tag: &str, axis_pred: &str, css_tail: &str| match (&scope, language) {
            (Some((ctag, class)), SelectorLanguage::Axis) => Selector::axis(format!(
                "//{ctag}[contains(@class, {})]//{tag}{axis_pred}",
                xpath::literal(class)
            )),
            (Some((_, class)), SelectorLanguage::Path) => {
                Selector::path(format!("{} {tag}{css_tail}", css::class(class)))
            }
            (None, SelectorLanguage::Axis) => Selector::axis(format!("//{tag}{axis_pred}")),
            (None, SelectorLanguage::Path) => Selector::path(format!("{tag}{css_tail}")),
        };

        let icon = || self.by_icon(node, language);
        let icon_named = || self.by_icon_class(node, &scoped);
        let last = || {
            container
                .as_ref()
                .and_then(|c| self.by_position(node, c, language))
        };
        let data = || self.by_data_attribute(node, &scoped);
        let id = || self.by_id(node, language);
        let class = || self.by_stable_class(node, &scoped);
        let detail = || {
            let found = DetailSynthesizer::new(self.verifier, self.options).synthesize_in(node, language);
            Some(found.selector)
        };

        let found = first_success(
            "pagination",
            &[
                ("icon-link", &icon),
                ("icon-class", &icon_named),
                ("last-in-pager", &last),
                ("data-attribute", &data),
                ("id", &id),
                ("stable-class", &class),
                ("detail", &detail),
            ],
        )
        .unwrap_or_else(|| Synthesized {
            selector: self.element_path(node),
            strategy: "css-path",
        });

        if has_numeric_text_predicate(&found.selector, node) {
            let structural = self.element_path(node);
            warn!(rejected = %found.selector, selector = %structural, "pagination selector carried a page number");
            return Synthesized {
                selector: structural,
                strategy: "css-path",
            };
        }
        found
    }

    /// Short CSS path, else the full `nth-of-type` path, else the tag.
    #[must_use]
    pub fn element_path(&self, node: &NodeRef) -> Selector {
        unique_css_path(
            &self.verifier,
            node,
            self.options.css_path_max_depth,
            &self.options.stable_class_prefixes,
        )
        .map(Selector::path)
        .or_else(|| {
            let full = Selector::path(full_selector(node));
            self.verifier.includes(&full, node).then_some(full)
        })
        .unwrap_or_else(|| Selector::path(dom::tag_name(node)))
    }

    /// Link wrapping an arrow icon, selected by its pager class and the icon.
    fn by_icon(&self, node: &NodeRef, language: SelectorLanguage) -> Option<Selector> {
        let icon = find_icon(node)?;
        let icon_cls = icon_class(&icon);

        let Some(link) = dom::closest(&icon, "a[href]") else {
            let cls = icon_cls.or_else(|| dom::meaningful_classes(&icon, 2).into_iter().next())?;
            let candidate = match language {
                SelectorLanguage::Axis => {
                    Selector::axis(format!("//*[contains(@class, {})]", xpath::literal(&cls)))
                }
                SelectorLanguage::Path => Selector::path(css::class(&cls)),
            };
            return self.verifier.first_is(&candidate, &icon).then_some(candidate);
        };

        let link_classes = dom::meaningful_classes(&link, 2);
        let link_cls = link_classes
            .iter()
            .find(|c| has_keyword(c, PAGINATION_LINK_KEYWORDS))
            .or_else(|| link_classes.first())
            .cloned();

        let mut candidates = Vec::new();
        match language {
            SelectorLanguage::Axis => {
                let link_pred = link_cls
                    .as_ref()
                    .map(|c| format!("[contains(@class, {})]", xpath::literal(c)));
                let icon_pred = icon_cls
                    .as_ref()
                    .map(|c| format!("[.//*[contains(@class, {})]]", xpath::literal(c)));
                if let (Some(l), Some(i)) = (&link_pred, &icon_pred) {
                    candidates.push(Selector::axis(format!("//a{l}{i}")));
                }
                if let Some(l) = &link_pred {
                    candidates.push(Selector::axis(format!("//a{l}")));
                }
                if let Some(i) = &icon_pred {
                    candidates.push(Selector::axis(format!("//a{i}")));
                }
            }
            SelectorLanguage::Path => {
                if let (Some(l), Some(i)) = (&link_cls, &icon_cls) {
                    candidates.push(Selector::path(format!(
                        "{}:has({})",
                        css::tag_class("a", l),
                        css::class(i)
                    )));
                }
                if let Some(l) = &link_cls {
                    candidates.push(Selector::path(css::tag_class("a", l)));
                }
                if let Some(i) = &icon_cls {
                    candidates.push(Selector::path(format!("a:has({})", css::class(i))));
                }
            }
        }
        first_verified(candidates, |c| self.verifier.first_is(c, &link))
    }

    fn by_icon_class(
        &self,
        node: &NodeRef,
        scoped: &dyn Fn(&str, &str, &str) -> Selector,
    ) -> Option<Selector> {
        let tag = dom::tag_name(node);
        let candidates = dom::meaningful_classes(node, 2)
            .into_iter()
            .filter(|c| has_keyword(c, ICON_KEYWORDS))
            .map(|c| {
                scoped(
                    &tag,
                    &format!("[contains(@class, {})]", xpath::literal(&c)),
                    &css::class(&c),
                )
            });
        first_verified(candidates, |c| self.verifier.first_is(c, node))
    }

    /// The last control of its kind inside the pager.
    fn by_position(
        &self,
        node: &NodeRef,
        container: &NodeRef,
        language: SelectorLanguage,
    ) -> Option<Selector> {
        let classes = dom::meaningful_classes(container, 2);
        let first = classes.first()?;
        let tag = dom::tag_name(node);
        let candidate = match language {
            SelectorLanguage::Axis => {
                let filter = classes
                    .iter()
                    .map(|c| format!("contains(@class, {})", xpath::literal(c)))
                    .collect::<Vec<_>>()
                    .join(" and ");
                Selector::axis(format!(
                    "//{}[{filter}]//{tag}[last()]",
                    dom::tag_name(container)
                ))
            }
            SelectorLanguage::Path => {
                Selector::path(format!("{} {tag}:last-child", css::class(first)))
            }
        };
        self.verifier
            .matches_exactly(&candidate, node)
            .then_some(candidate)
    }

    fn by_data_attribute(
        &self,
        node: &NodeRef,
        scoped: &dyn Fn(&str, &str, &str) -> Selector,
    ) -> Option<Selector> {
        let tag = dom::tag_name(node);
        let candidates = dom::data_attributes(node)
            .into_iter()
            .filter(|(name, _)| PAGINATION_DATA_KEYWORDS.iter().any(|k| name.contains(k)))
            .map(|(name, value)| {
                scoped(
                    &tag,
                    &format!("[@{name}={}]", xpath::literal(&value)),
                    &format!("[{name}={}]", css::string(&value)),
                )
            });
        first_verified(candidates, |c| self.verifier.first_is(c, node))
    }

    fn by_id(&self, node: &NodeRef, language: SelectorLanguage) -> Option<Selector> {
        let id = dom::id(node).filter(|id| !GENERATED_ID.is_match(id))?;
        let candidate = match language {
            SelectorLanguage::Axis => Selector::axis(format!(
                "//{}[@id={}]",
                dom::tag_name(node),
                xpath::literal(&id)
            )),
            SelectorLanguage::Path => Selector::path(css::id(&id)),
        };
        self.verifier
            .matches_exactly(&candidate, node)
            .then_some(candidate)
    }

    fn by_stable_class(
        &self,
        node: &NodeRef,
        scoped: &dyn Fn(&str, &str, &str) -> Selector,
    ) -> Option<Selector> {
        let class = dom::meaningful_classes(node, 2)
            .into_iter()
            .find(|c| !PAGE_NUMBER_CLASS.is_match(c))?;
        let tag = dom::tag_name(node);
        let candidate = scoped(
            &tag,
            &format!("[contains(@class, {})]", xpath::literal(&class)),
            &css::class(&class),
        );
        self.verifier.first_is(&candidate, node).then_some(candidate)
    }

    /// Link following the `aria-current` page.
    #[must_use]
    pub fn next_after_current(&self) -> (Selector, usize) {
        let selector = Selector::path(NEXT_AFTER_CURRENT);
        let count = self.verifier.count(&selector);
        (selector, count)
    }

    /// Last list item's link in the `ul` around `node`.
    #[must_use]
    pub fn next_last_item(&self, node: &NodeRef<'a>) -> (Selector, usize) {
        let in_list = dom::closest(node, "ul").and_then(|ul| {
            let selector = Selector::path(format!("{} li:last-child a", self.element_path(&ul)));
            let count = self.verifier.count(&selector);
            (count > 0).then_some((selector, count))
        });
        in_list.unwrap_or_else(|| self.element_fallback(node))
    }

    /// Last link in the nearest pagination-looking container, or the first
    /// such container in the document.
    #[must_use]
    pub fn next_last_in_pagination(&self, node: &NodeRef<'a>) -> (Selector, usize) {
        let container = dom::closest(node, LAST_LINK_CONTAINER_SELECTOR).or_else(|| {
            dom::select_all(self.verifier.document(), LAST_LINK_CONTAINER_SELECTOR)
                .into_iter()
                .next()
        });
        let found = container.and_then(|c| {
            let prefix = self.element_path(&c);
            let tail = if dom::query_selector(&c, "li:last-child a").is_some() {
                "li:last-child a"
            } else {
                "a:last-of-type"
            };
            let selector = Selector::path(format!("{prefix} {tail}"));
            let count = self.verifier.count(&selector);
            (count > 0).then_some((selector, count))
        });
        found.unwrap_or_else(|| self.element_fallback(node))
    }

    fn element_fallback(&self, node: &NodeRef) -> (Selector, usize) {
        let selector = self.element_path(node);
        let count = self.verifier.count(&selector);
        debug!(%selector, count, "pagination variant fell back to element path");
        (selector, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use pretty_assertions::assert_eq;

    const PAGER: &str = r#"<html><body>
        <div class="pagination">
            <a class="page-link" href="?p=1">1</a>
            <a class="page-link" href="?p=2">2</a>
            <a class="page-link" href="?p=3">3</a>
            <a class="page-link next-link" href="?p=2"><i class="icon-chevron-right"></i></a>
        </div>
    </body></html>"#;

    fn synth<'a, 'o>(doc: &'a Document, options: &'o Options) -> PaginationSynthesizer<'a, 'o> {
        PaginationSynthesizer::new(Verifier::new(doc), options)
    }

    #[test]
    fn test_icon_link_axis() {
        let doc = dom::parse(PAGER);
        let options = Options::default();
        let icon = dom::select_all(&doc, "i")[0];
        let found = synth(&doc, &options).synthesize_in(&icon, SelectorLanguage::Axis);
        assert_eq!(found.strategy, "icon-link");
        assert_eq!(
            found.selector,
            Selector::axis(
                r#"//a[contains(@class, "page-link")][.//*[contains(@class, "icon-chevron-right")]]"#
            )
        );
        let link = dom::select_all(&doc, "a.next-link")[0];
        assert!(Verifier::new(&doc).first_is(&found.selector, &link));
    }

    #[test]
    fn test_icon_link_path_uses_has() {
        let doc = dom::parse(PAGER);
        let options = Options::default();
        let link = dom::select_all(&doc, "a.next-link")[0];
        let found = synth(&doc, &options).synthesize_in(&link, SelectorLanguage::Path);
        assert_eq!(
            found.selector,
            Selector::path("a.page-link:has(.icon-chevron-right)")
        );
    }

    #[test]
    fn test_numeric_page_link_never_uses_text() {
        let doc = dom::parse(
            r#"<html><body><ul><li><a href="?p=1">1</a></li><li><a href="?p=2">2</a></li></ul><p>x</p></body></html>"#,
        );
        let options = Options::default();
        let two = dom::select_all(&doc, "a")[1];
        let found = synth(&doc, &options).synthesize_in(&two, SelectorLanguage::Axis);
        assert!(!TEXT_PREDICATE_WITH_DIGIT.is_match(found.selector.expr()));
        assert!(!has_numeric_text_predicate(&found.selector, &two));
        assert!(Verifier::new(&doc).includes(&found.selector, &two));
    }

    #[test]
    fn test_numeric_text_guard() {
        let doc = dom::parse(r#"<a href="?p=4">4</a>"#);
        let a = dom::select_all(&doc, "a")[0];
        assert!(has_numeric_text_predicate(
            &Selector::axis(r#"//a[contains(normalize-space(), "4")]"#),
            &a
        ));
        assert!(!has_numeric_text_predicate(&Selector::axis("//a[last()]"), &a));
    }

    #[test]
    fn test_last_in_pager() {
        let doc = dom::parse(
            r#"<html><body><nav class="pager-box"><a href="?p=1">Prev</a><a href="?p=3">Next</a></nav>
               <a href="/about">About</a></body></html>"#,
        );
        let options = Options::default();
        let next = dom::select_all(&doc, "nav a")[1];
        let found = synth(&doc, &options).synthesize_in(&next, SelectorLanguage::Axis);
        assert_eq!(found.strategy, "last-in-pager");
        assert_eq!(
            found.selector,
            Selector::axis(r#"//nav[contains(@class, "pager-box")]//a[last()]"#)
        );
    }

    #[test]
    fn test_template_variants() {
        let doc = dom::parse(
            r#"<html><body><nav class="page"><ul class="page-list">
                <li aria-current="page"><a href="?p=1">1</a></li>
                <li><a href="?p=2">2</a></li>
                <li><a href="?p=2">Next</a></li>
            </ul></nav></body></html>"#,
        );
        let options = Options::default();
        let s = synth(&doc, &options);
        let (v1, count) = s.next_after_current();
        assert_eq!(v1, Selector::path(NEXT_AFTER_CURRENT));
        assert_eq!(count, 1);

        let clicked = dom::select_all(&doc, "li a")[2];
        let (last_item, count) = s.next_last_item(&clicked);
        assert_eq!(last_item, Selector::path(".page-list li:last-child a"));
        assert_eq!(count, 1);

        let (last_pager, count) = s.next_last_in_pagination(&clicked);
        assert!(last_pager.expr().ends_with("li:last-child a"));
        assert_eq!(count, 1);
    }
}
