//! Detail-page selector synthesis.
//!
//! Given one clicked element, produce a selector that resolves to that element
//! alone and is likely to keep doing so on sibling pages built from the same
//! template. Candidates are generated strongest first and each is checked by
//! the [`Verifier`] before it is accepted.

use tracing::debug;

use crate::dom::{self, NodeRef};
use crate::options::Options;
use crate::patterns::{GENERATED_ID, WHITESPACE_RUN};
use crate::selector::paths::{absolute_path, full_selector, unique_css_path};
use crate::selector::{
    css, first_success, first_verified, xpath, Selector, SelectorLanguage, Synthesized, Verifier,
};

/// Previous element siblings searched for a label.
const LABEL_SCAN: usize = 5;

/// Of those, how many are accepted on text length alone.
const LABEL_SCAN_LOOSE: usize = 3;

/// Characters of text used in a text-predicate fallback.
const TEXT_PREDICATE_CHARS: usize = 50;

/// A sibling that reads like the label of the clicked value.
#[derive(Debug, Clone)]
pub struct LabelSibling<'a> {
    pub node: NodeRef<'a>,
    pub text: String,
}

/// `[contains(@class, "a") and contains(@class, "b")]`, or empty.
fn class_filter(classes: &[String]) -> String {
    if classes.is_empty() {
        return String::new();
    }
    format!("[{}]", class_conditions(classes))
}

fn class_conditions(classes: &[String]) -> String {
    classes
        .iter()
        .map(|c| format!("contains(@class, {})", xpath::literal(c)))
        .collect::<Vec<_>>()
        .join(" and ")
}

fn has_filter_classes(node: &NodeRef, classes: &[String]) -> bool {
    let attr = dom::class_name(node);
    classes.iter().all(|c| attr.contains(c.as_str()))
}

fn label_len_ok(text: &str) -> bool {
    let len = text.chars().count();
    len > 2 && len < 50
}

fn is_label_like(node: &NodeRef, text: &str) -> bool {
    let class = dom::class_name(node);
    let named = ["title", "label", "name"].iter().any(|k| class.contains(k));
    named || (text.chars().count() < 30 && !text.starts_with(|c: char| c.is_ascii_digit()))
}

/// Nearest preceding sibling that looks like a label for `node`.
///
/// The closest three siblings qualify on short text alone; the next two also
/// need a label-ish class or short non-numeric text.
#[must_use]
pub fn find_label_sibling<'a>(node: &NodeRef<'a>) -> Option<LabelSibling<'a>> {
    dom::previous_element_siblings(node)
        .take(LABEL_SCAN)
        .enumerate()
        .find_map(|(i, sibling)| {
            let text = dom::extract_text(&sibling);
            if !label_len_ok(&text) {
                return None;
            }
            (i < LABEL_SCAN_LOOSE || is_label_like(&sibling, &text)).then_some(LabelSibling {
                node: sibling,
                text,
            })
        })
}

/// Short, non-numeric text suitable as a label anchor.
fn is_label_text(text: &str) -> bool {
    !text.is_empty()
        && text.chars().count() < 50
        && !text.starts_with(|c: char| c.is_ascii_digit())
}

/// Text of the bold label inside a row, whitespace collapsed and without a
/// trailing colon.
fn bold_label(row: &NodeRef) -> Option<String> {
    let b = dom::query_selector(row, "b")?;
    let text = WHITESPACE_RUN.replace_all(&dom::text_content(&b), " ").trim().to_string();
    let text = text.strip_suffix(':').unwrap_or(text.as_str()).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// A row picked through its bold label rather than through the clicked node.
#[derive(Debug, Clone)]
pub struct BoldLabelRow<'a> {
    pub row: NodeRef<'a>,
    pub selector: Selector,
}

/// `//td[b[contains(normalize-space(), "Label")]]`, or the same for the
/// nearest `p`/`li`, when the click lands in a row labelled with `<b>`.
#[must_use]
pub fn bold_label_row<'a>(node: &NodeRef<'a>) -> Option<BoldLabelRow<'a>> {
    let build = |row: NodeRef<'a>| {
        let label = bold_label(&row)?;
        let selector = Selector::axis(format!(
            "//{}[b[contains(normalize-space(), {})]]",
            dom::tag_name(&row),
            xpath::literal(&label)
        ));
        Some(BoldLabelRow { row, selector })
    };

    if let Some(found) = dom::closest(node, "td").and_then(build) {
        return Some(found);
    }
    dom::closest(node, "p")
        .or_else(|| dom::closest(node, "li"))
        .and_then(build)
}

/// Runs the detail cascade for one document.
#[derive(Clone, Copy)]
pub struct DetailSynthesizer<'a, 'o> {
    verifier: Verifier<'a>,
    options: &'o Options,
}

impl<'a, 'o> DetailSynthesizer<'a, 'o> {
    #[must_use]
    pub fn new(verifier: Verifier<'a>, options: &'o Options) -> Self {
        Self { verifier, options }
    }

    fn exact(&self, candidate: Selector, node: &NodeRef) -> Option<Selector> {
        self.verifier
            .matches_exactly(&candidate, node)
            .then_some(candidate)
    }

    fn exact_first(
        &self,
        candidates: impl IntoIterator<Item = Selector>,
        node: &NodeRef,
    ) -> Option<Selector> {
        first_verified(candidates, |c| self.verifier.matches_exactly(c, node))
    }

    /// Selector for `node` in the configured language.
    #[must_use]
    pub fn synthesize(&self, node: &NodeRef<'a>) -> Synthesized {
        self.synthesize_in(node, self.options.selector_language)
    }

    /// Selector for `node`, preferring `language` where the cascade allows.
    ///
    /// Never fails: when no candidate verifies the unbounded `nth-of-type`
    /// path is returned, and when even that does not resolve, the bare tag.
    #[must_use]
    pub fn synthesize_in(&self, node: &NodeRef<'a>, language: SelectorLanguage) -> Synthesized {
        let axis = language == SelectorLanguage::Axis;
        let label = if axis && self.options.label_heuristics {
            find_label_sibling(node)
        } else {
            None
        };
        let label_search = axis && self.options.label_heuristics;

        let id = || self.by_id(node);
        let data_id = || self.by_data_id(node);
        let label_sibling = || label.as_ref().and_then(|l| self.by_label_sibling(node, l));
        let label_in_container = || {
            if label_search && label.is_none() {
                self.by_container_label(node)
            } else {
                None
            }
        };
        let itemprop = || axis.then(|| self.by_itemprop(node)).flatten();
        let test_id = || axis.then(|| self.by_test_id(node)).flatten();
        let absolute = || axis.then(|| self.by_absolute_path(node)).flatten();
        let text = || axis.then(|| self.by_text(node)).flatten();
        let class = || self.by_distinctive_class(node);
        let css_path = || self.by_css_path(node);

        let found = first_success(
            "detail",
            &[
                ("id", &id),
                ("data-id", &data_id),
                ("label-sibling", &label_sibling),
                ("label-in-container", &label_in_container),
                ("itemprop", &itemprop),
                ("data-testid", &test_id),
                ("absolute-path", &absolute),
                ("text", &text),
                ("distinctive-class", &class),
                ("css-path", &css_path),
            ],
        );
        found.unwrap_or_else(|| self.fallback(node))
    }

    fn fallback(&self, node: &NodeRef) -> Synthesized {
        let full = Selector::path(full_selector(node));
        if self.verifier.includes(&full, node) {
            debug!(selector = %full, "detail cascade fell back to full path");
            return Synthesized {
                selector: full,
                strategy: "full-path",
            };
        }
        let tag = Selector::path(dom::tag_name(node));
        debug!(selector = %tag, "detail cascade fell back to tag");
        Synthesized {
            selector: tag,
            strategy: "tag",
        }
    }

    fn by_id(&self, node: &NodeRef) -> Option<Selector> {
        let id = dom::id(node).filter(|id| !GENERATED_ID.is_match(id))?;
        self.exact(Selector::path(css::id(&id)), node)
    }

    fn by_data_id(&self, node: &NodeRef) -> Option<Selector> {
        let value = dom::get_attribute(node, "data-id")?;
        let tag = dom::tag_name(node);
        self.exact(Selector::path(css::attr_equals(&tag, "data-id", &value)), node)
    }

    /// `.../label[text]/following-sibling::value[n]`, most specific form first.
    fn by_label_sibling(&self, node: &NodeRef, label: &LabelSibling) -> Option<Selector> {
        let parent = dom::parent_element(node)?;
        if !dom::parent_element(&label.node).is_some_and(|p| dom::is_same(&p, &parent)) {
            return None;
        }

        let label_tag = dom::tag_name(&label.node);
        let value_tag = dom::tag_name(node);
        let label_classes = dom::meaningful_classes(&label.node, 2);
        let value_classes = dom::meaningful_classes(node, 2);
        let label_filter = class_filter(&label_classes);
        let value_filter = class_filter(&value_classes);
        let text = xpath::literal(&label.text);

        // Position among the following siblings the value step can match.
        let offset = std::iter::successors(label.node.next_element_sibling(), NodeRef::next_element_sibling)
            .take_while(|s| !dom::is_same(s, node))
            .filter(|s| dom::tag_name(s) == value_tag && has_filter_classes(s, &value_classes))
            .count()
            + 1;

        let parent_tag = dom::tag_name(&parent);
        let parent_classes = dom::meaningful_classes(&parent, 3);
        let tail = format!(
            "{label_tag}{label_filter}[contains(text(), {text})]/following-sibling::{value_tag}{value_filter}"
        );

        let mut candidates = Vec::new();
        if !parent_classes.is_empty() {
            candidates.push(Selector::axis(format!(
                "//{parent_tag}{}/{tail}[{offset}]",
                class_filter(&parent_classes)
            )));
        }
        candidates.push(Selector::axis(format!("//{parent_tag}/{tail}[{offset}]")));
        if offset == 1 {
            candidates.push(Selector::axis(format!("//{tail}[1]")));
        }
        self.exact_first(candidates, node)
    }

    /// Label `span` found elsewhere in the value's container.
    fn container_label(&self, node: &NodeRef, container: &NodeRef) -> Option<String> {
        let hinted = self.options.label_container_hints.iter().find_map(|hint| {
            let scope = dom::query_selector(
                container,
                &format!("div.{0}, [class*={1}]", css::ident(hint), css::string(hint)),
            )?;
            dom::query_selector_all(&scope, "span")
                .into_iter()
                .map(|s| dom::extract_text(&s))
                .find(|t| is_label_text(t))
        });
        hinted.or_else(|| {
            dom::query_selector_all(container, "span")
                .into_iter()
                .filter(|s| !dom::contains(node, s) && dom::closest(s, "strong").is_none())
                .map(|s| dom::extract_text(&s))
                .find(|t| is_label_text(t))
        })
    }

    /// Anchors on a label `span` in the value's container and walks back
    /// down to the value through `ancestor::`.
    fn by_container_label(&self, node: &NodeRef) -> Option<Selector> {
        let container = dom::parent_element(node)?;
        let label = self.container_label(node, &container)?;

        let anchor = format!("//span[contains(normalize-space(), {})]", xpath::literal(&label));
        let container_tag = dom::tag_name(&container);
        let container_classes = dom::meaningful_classes(&container, 2);
        let container_filter = class_filter(&container_classes);
        let value_tag = dom::tag_name(node);
        let value_filter = class_filter(&dom::meaningful_classes(node, 2));

        let mut candidates = Vec::new();
        if let Some(prop) = dom::non_empty_attribute(node, "itemprop") {
            let prop = xpath::literal(&prop);
            if !container_classes.is_empty() {
                candidates.push(Selector::axis(format!(
                    "{anchor}/ancestor::{container_tag}{container_filter}//{value_tag}[@itemprop={prop}]"
                )));
            }
            candidates.push(Selector::axis(format!(
                "{anchor}/ancestor::{container_tag}//{value_tag}[@itemprop={prop}]"
            )));
            candidates.push(Selector::axis(format!("//{value_tag}[@itemprop={prop}]")));
        }
        if !container_classes.is_empty() {
            candidates.push(Selector::axis(format!(
                "{anchor}/ancestor::{container_tag}{container_filter}//{value_tag}{value_filter}"
            )));
        }
        candidates.push(Selector::axis(format!(
            "{anchor}/ancestor::{container_tag}//{value_tag}{value_filter}"
        )));
        self.exact_first(candidates, node)
    }

    fn by_itemprop(&self, node: &NodeRef) -> Option<Selector> {
        let prop = xpath::literal(&dom::non_empty_attribute(node, "itemprop")?);
        let tag = dom::tag_name(node);
        let classes = dom::meaningful_classes(node, 2);

        let mut candidates = Vec::new();
        if !classes.is_empty() {
            candidates.push(Selector::axis(format!(
                "//{tag}[@itemprop={prop} and {}]",
                class_conditions(&classes)
            )));
        }
        candidates.push(Selector::axis(format!("//{tag}[@itemprop={prop}]")));
        if let Some(parent) = dom::parent_element(node) {
            let parent_classes = dom::meaningful_classes(&parent, 2);
            if !parent_classes.is_empty() {
                candidates.push(Selector::axis(format!(
                    "//{}{}//{tag}[@itemprop={prop}]",
                    dom::tag_name(&parent),
                    class_filter(&parent_classes)
                )));
            }
        }
        self.exact_first(candidates, node)
    }

    fn by_test_id(&self, node: &NodeRef) -> Option<Selector> {
        let value = dom::non_empty_attribute(node, "data-testid")?;
        self.exact(
            Selector::axis(format!(
                "//{}[@data-testid={}]",
                dom::tag_name(node),
                xpath::literal(&value)
            )),
            node,
        )
    }

    fn by_absolute_path(&self, node: &NodeRef) -> Option<Selector> {
        self.exact(Selector::axis(absolute_path(node)?), node)
    }

    fn by_text(&self, node: &NodeRef) -> Option<Selector> {
        let text = dom::extract_text(node);
        if text.is_empty() || text.chars().count() >= self.options.max_text_predicate_len {
            return None;
        }
        let snippet = dom::truncate_chars(&xpath::normalize_space(&text), TEXT_PREDICATE_CHARS);
        self.exact(
            Selector::axis(format!(
                "//{}[contains(normalize-space(), {})]",
                dom::tag_name(node),
                xpath::literal(&snippet)
            )),
            node,
        )
    }

    fn by_distinctive_class(&self, node: &NodeRef) -> Option<Selector> {
        let classes = dom::meaningful_classes(node, 5);
        let stable = classes.iter().find(|c| {
            self.options
                .stable_class_prefixes
                .iter()
                .any(|p| c.starts_with(p.as_str()))
        });
        let class = stable.or_else(|| classes.first())?;
        self.exact(Selector::path(css::class(class)), node)
    }

    fn by_css_path(&self, node: &NodeRef) -> Option<Selector> {
        unique_css_path(
            &self.verifier,
            node,
            self.options.css_path_max_depth,
            &self.options.stable_class_prefixes,
        )
        .map(Selector::path)
    }

    /// Narrows a selector that resolves to `node` among other nodes, or that
    /// lost `node` altogether.
    ///
    /// An axis selector matching nothing, or any selector that misses `node`,
    /// is replaced by the short CSS path when that includes `node`. A selector
    /// that includes `node` among several is replaced by the absolute path
    /// (axis) or the full `nth-of-type` path (path language) when that
    /// resolves to `node` first.
    #[must_use]
    pub fn tighten(&self, selector: Selector, node: &NodeRef<'a>) -> Selector {
        let mut selector = selector;
        let mut matches = self.verifier.execute(&selector);

        if !matches.iter().any(|m| dom::is_same(m, node)) {
            if let Some(path) = self.by_css_path(node) {
                let found = self.verifier.execute(&path);
                if found.iter().any(|m| dom::is_same(m, node)) {
                    debug!(from = %selector, to = %path, "replaced non-matching selector");
                    selector = path;
                    matches = found;
                }
            }
        }

        if matches.len() > 1 && matches.iter().any(|m| dom::is_same(m, node)) {
            let preferred = if selector.is_axis()
                || self.options.selector_language == SelectorLanguage::Axis
            {
                absolute_path(node).map(Selector::axis)
            } else {
                Some(Selector::path(full_selector(node)))
            };
            let preferred = preferred.or_else(|| self.by_css_path(node));
            if let Some(preferred) = preferred {
                if self.verifier.first_is(&preferred, node) {
                    debug!(from = %selector, to = %preferred, "tightened ambiguous selector");
                    selector = preferred;
                }
            }
        }
        selector
    }

    /// The other language's selector for `node`.
    #[must_use]
    pub fn counterpart(&self, node: &NodeRef<'a>, selector: &Selector) -> Option<Selector> {
        match selector.language() {
            SelectorLanguage::Axis => self
                .by_css_path(node)
                .or_else(|| Some(Selector::path(full_selector(node))))
                .filter(|s| self.verifier.includes(s, node)),
            SelectorLanguage::Path => absolute_path(node)
                .map(Selector::axis)
                .filter(|s| self.verifier.matches_exactly(s, node)),
        }
    }
}
