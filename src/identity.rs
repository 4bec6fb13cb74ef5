//! Element identity: a fingerprint that picks the clicked node back out of a
//! selector's match set on later runs.
//!
//! A reference is never queried on its own. It only narrows the nodes a
//! field's selector already matched.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dom::{self, NodeRef};
use crate::selector::paths::{absolute_path, full_selector};
use crate::selector::{css, Selector, Verifier};
use crate::url_utils::resolve;

/// Tags whose `src` is a resource URL.
const SRC_TAGS: &[&str] = &["img", "iframe", "video", "audio", "source", "embed", "script", "track", "input"];

/// Tags whose `href` is a navigation URL.
const HREF_TAGS: &[&str] = &["a", "area", "link", "base"];

/// Characters of a text snippet compared when reconciling loosely.
const FUZZY_PREFIX_CHARS: usize = 20;

/// Characters of text that identify a node without a stable attribute.
const ID_TEXT_CHARS: usize = 50;

/// Stable fingerprint of one element, strongest kind first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementReference {
    /// Resolved `src` URL.
    #[serde(rename = "src")]
    Src { value: String },
    /// Resolved `href` URL.
    #[serde(rename = "href")]
    Href { value: String },
    #[serde(rename = "data-id")]
    DataId { value: String },
    /// Axis-language path from the document root.
    #[serde(rename = "xpath")]
    AbsolutePath { value: String },
    /// Position within the matches of a broad class or tag selector.
    #[serde(rename = "index")]
    OrdinalIndex {
        value: usize,
        #[serde(rename = "commonSelector")]
        base_selector: String,
    },
    /// Path-language `nth-of-type` chain.
    #[serde(rename = "fullSelector")]
    FullPath { value: String },
    #[serde(rename = "text")]
    TextSnippet { value: String },
}

fn src_of(node: &NodeRef, base: Option<&Url>) -> Option<String> {
    let tag = dom::tag_name(node);
    if !SRC_TAGS.contains(&tag.as_str()) {
        return None;
    }
    dom::non_empty_attribute(node, "src").map(|s| resolve(&s, base))
}

fn href_of(node: &NodeRef, base: Option<&Url>) -> Option<String> {
    let tag = dom::tag_name(node);
    if !HREF_TAGS.contains(&tag.as_str()) {
        return None;
    }
    dom::non_empty_attribute(node, "href").map(|s| resolve(&s, base))
}

/// A class or tag selector broad enough to list the node's peers.
fn ordinal_base(node: &NodeRef) -> String {
    dom::meaningful_classes(node, 3)
        .first()
        .map_or_else(|| dom::tag_name(node), |c| css::class(c))
}

impl ElementReference {
    /// Fingerprints `node`, taking the first kind that can describe it.
    #[must_use]
    pub fn capture(node: &NodeRef, verifier: &Verifier, base: Option<&Url>) -> Option<Self> {
        if let Some(value) = src_of(node, base) {
            return Some(Self::Src { value });
        }
        if let Some(value) = href_of(node, base) {
            return Some(Self::Href { value });
        }
        if let Some(value) = dom::non_empty_attribute(node, "data-id") {
            return Some(Self::DataId { value });
        }
        if let Some(value) = absolute_path(node) {
            if verifier.matches_exactly(&Selector::axis(value.as_str()), node) {
                return Some(Self::AbsolutePath { value });
            }
        }

        let base_selector = ordinal_base(node);
        let peers = verifier.execute(&Selector::path(base_selector.as_str()));
        if let Some(value) = peers.iter().position(|p| dom::is_same(p, node)) {
            return Some(Self::OrdinalIndex {
                value,
                base_selector,
            });
        }

        let full = full_selector(node);
        if verifier.matches_exactly(&Selector::path(full.as_str()), node) {
            return Some(Self::FullPath { value: full });
        }

        let text = dom::extract_text(node);
        (!text.is_empty()).then(|| Self::TextSnippet {
            value: dom::truncate_chars(&text, 100),
        })
    }

    /// Whether `node` is the element this reference was captured from.
    #[must_use]
    pub fn matches(&self, node: &NodeRef, verifier: &Verifier, base: Option<&Url>) -> bool {
        match self {
            Self::Src { value } => src_of(node, base).as_ref() == Some(value),
            Self::Href { value } => href_of(node, base).as_ref() == Some(value),
            Self::DataId { value } => {
                dom::non_empty_attribute(node, "data-id").as_ref() == Some(value)
            }
            Self::AbsolutePath { value } => absolute_path(node).as_ref() == Some(value),
            Self::OrdinalIndex {
                value,
                base_selector,
            } => verifier
                .execute(&Selector::path(base_selector.as_str()))
                .get(*value)
                .is_some_and(|peer| dom::is_same(peer, node)),
            Self::FullPath { value } => full_selector(node) == *value,
            Self::TextSnippet { value } => {
                let text = dom::extract_text(node);
                text == *value || text.contains(&dom::truncate_chars(value, FUZZY_PREFIX_CHARS))
            }
        }
    }

    /// Keeps the members of `candidates` this reference identifies.
    #[must_use]
    pub fn filter<'a>(
        &self,
        candidates: &[NodeRef<'a>],
        verifier: &Verifier,
        base: Option<&Url>,
    ) -> Vec<NodeRef<'a>> {
        candidates
            .iter()
            .filter(|n| self.matches(n, verifier, base))
            .copied()
            .collect()
    }
}

/// Key used to recognise a re-click on an already captured element.
#[must_use]
pub fn unique_id(node: &NodeRef, selector: &Selector, base: Option<&Url>) -> String {
    if let Some(src) = src_of(node, base) {
        return format!("src:{src}");
    }
    if let Some(href) = href_of(node, base) {
        return format!("href:{href}");
    }
    if let Some(data_id) = dom::non_empty_attribute(node, "data-id") {
        return format!("data-id:{data_id}");
    }
    if let Some(path) = absolute_path(node) {
        return format!("xpath:{path}");
    }
    let text = dom::truncate_chars(&dom::extract_text(node), ID_TEXT_CHARS);
    format!("selector:{selector}:{text}")
}
