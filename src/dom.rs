//! DOM Operations Adapter
//!
//! Thin helpers over `dom_query::NodeRef` that give the selector synthesizers
//! browser-flavoured operations (`closest`, `querySelector`, class lists,
//! element-only sibling indices) without each call site re-deriving them.

pub use dom_query::{Document, Matcher, NodeId, NodeRef, Selection};

/// Class prefix reserved for marks this crate places on the tree.
pub const INTERNAL_CLASS_PREFIX: &str = "scraper-";

/// Parse an HTML string into a Document
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

// === Identity ===

/// Whether two handles point at the same tree node.
#[inline]
#[must_use]
pub fn is_same(a: &NodeRef, b: &NodeRef) -> bool {
    a.id == b.id
}

/// Looks a node back up by its id.
#[must_use]
pub fn node_by_id(doc: &Document, id: NodeId) -> Option<NodeRef<'_>> {
    doc.tree.get(&id)
}

/// Whether `node` is `ancestor` or lies beneath it.
#[must_use]
pub fn contains(ancestor: &NodeRef, node: &NodeRef) -> bool {
    is_same(ancestor, node) || node.ancestors_it(None).any(|a| a.id == ancestor.id)
}

// === Tag/Node Information ===

/// Get tag name (lowercase), empty for non-elements
#[must_use]
pub fn tag_name(node: &NodeRef) -> String {
    if !node.is_element() {
        return String::new();
    }
    node.node_name()
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_default()
}

#[inline]
#[must_use]
pub fn is_tag(node: &NodeRef, tag: &str) -> bool {
    node.is_element() && node.node_name().is_some_and(|t| t.eq_ignore_ascii_case(tag))
}

// === Attribute Operations ===

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(node: &NodeRef, name: &str) -> Option<String> {
    node.attr(name).map(|s| s.to_string())
}

/// Attribute value, treating an empty string as absent.
#[must_use]
pub fn non_empty_attribute(node: &NodeRef, name: &str) -> Option<String> {
    node.attr(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Get element ID attribute when it is non-empty
#[inline]
#[must_use]
pub fn id(node: &NodeRef) -> Option<String> {
    non_empty_attribute(node, "id")
}

/// Raw class attribute, empty when missing
#[inline]
#[must_use]
pub fn class_name(node: &NodeRef) -> String {
    node.class().map(|c| c.to_string()).unwrap_or_default()
}

/// Whitespace-separated class tokens in source order.
#[must_use]
pub fn class_list(node: &NodeRef) -> Vec<String> {
    class_name(node)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Class tokens longer than `min_len` chars, skipping our own marker classes.
#[must_use]
pub fn meaningful_classes(node: &NodeRef, min_len: usize) -> Vec<String> {
    class_list(node)
        .into_iter()
        .filter(|c| c.chars().count() > min_len && !c.contains(INTERNAL_CLASS_PREFIX))
        .collect()
}

/// All attributes as (lowercase name, value) pairs.
#[must_use]
pub fn get_all_attributes(node: &NodeRef) -> Vec<(String, String)> {
    node.attrs()
        .iter()
        .map(|attr| (attr.name.local.to_ascii_lowercase().to_string(), attr.value.to_string()))
        .collect()
}

/// `data-*` attributes as (name, value) pairs.
#[must_use]
pub fn data_attributes(node: &NodeRef) -> Vec<(String, String)> {
    get_all_attributes(node)
        .into_iter()
        .filter(|(name, _)| name.starts_with("data-"))
        .collect()
}

// === Tree Navigation ===

/// Parent, when it is an element
#[must_use]
pub fn parent_element<'a>(node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    node.parent().filter(NodeRef::is_element)
}

/// Element ancestors, nearest first.
pub fn ancestor_elements<'a>(node: &NodeRef<'a>) -> impl Iterator<Item = NodeRef<'a>> {
    node.ancestors_it(None).filter(NodeRef::is_element)
}

#[inline]
#[must_use]
pub fn element_children<'a>(node: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    node.element_children()
}

/// One-based position among preceding siblings with the same tag.
#[must_use]
pub fn same_tag_index(node: &NodeRef) -> usize {
    let tag = tag_name(node);
    1 + std::iter::successors(node.prev_element_sibling(), NodeRef::prev_element_sibling)
        .filter(|s| tag_name(s) == tag)
        .count()
}

/// Previous element siblings, nearest first.
pub fn previous_element_siblings<'a>(node: &NodeRef<'a>) -> impl Iterator<Item = NodeRef<'a>> {
    std::iter::successors(node.prev_element_sibling(), NodeRef::prev_element_sibling)
}

// === CSS Queries ===

/// Compiles a CSS selector, `None` when it is not valid.
#[must_use]
pub fn matcher(css: &str) -> Option<Matcher> {
    Matcher::new(css).ok()
}

/// Whether `node` matches `css`
#[must_use]
pub fn matches(node: &NodeRef, css: &str) -> bool {
    node.is_element() && matcher(css).is_some_and(|m| node.is_match(&m))
}

/// Nearest inclusive ancestor matching `css` (Element.closest).
#[must_use]
pub fn closest<'a>(node: &NodeRef<'a>, css: &str) -> Option<NodeRef<'a>> {
    let m = matcher(css)?;
    std::iter::once(*node)
        .chain(node.ancestors_it(None))
        .filter(NodeRef::is_element)
        .find(|n| n.is_match(&m))
}

/// First descendant matching `css` (Element.querySelector)
#[must_use]
pub fn query_selector<'a>(node: &NodeRef<'a>, css: &str) -> Option<NodeRef<'a>> {
    query_selector_all(node, css).into_iter().next()
}

/// Descendants matching `css` in document order
#[must_use]
pub fn query_selector_all<'a>(node: &NodeRef<'a>, css: &str) -> Vec<NodeRef<'a>> {
    let Some(m) = matcher(css) else {
        return Vec::new();
    };
    Selection::from(*node).select_matcher(&m).nodes().to_vec()
}

/// Document-wide matches for `css`, empty when the selector is invalid.
#[must_use]
pub fn select_all<'a>(doc: &'a Document, css: &str) -> Vec<NodeRef<'a>> {
    let Some(m) = matcher(css) else {
        return Vec::new();
    };
    doc.select_matcher(&m).nodes().to_vec()
}

// === Text Content ===

/// Text content of the node and its descendants
#[inline]
#[must_use]
pub fn text_content(node: &NodeRef) -> String {
    node.text().to_string()
}

/// Visible text: descendant text with `script`/`style` bodies dropped, trimmed.
#[must_use]
pub fn extract_text(node: &NodeRef) -> String {
    if node.is_text() {
        return node.text().trim().to_string();
    }
    let mut out = String::new();
    for child in node.descendants_it() {
        if !child.is_text() {
            continue;
        }
        let hidden = child
            .ancestors_it(None)
            .take_while(|a| a.id != node.id)
            .any(|a| is_tag(&a, "script") || is_tag(&a, "style"));
        if !hidden {
            out.push_str(&child.text());
        }
    }
    out.trim().to_string()
}

/// Layout-aware text, similar to `HTMLElement.innerText`.
#[must_use]
pub fn inner_text(node: &NodeRef) -> String {
    node.formatted_text().trim().to_string()
}

/// Get inner HTML content
#[inline]
#[must_use]
pub fn inner_html(node: &NodeRef) -> String {
    node.inner_html().to_string()
}

/// First `max` characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

// === Mutation ===

/// Add a class to every node in `nodes`.
pub fn add_class(nodes: &[NodeRef], class: &str) {
    for node in nodes {
        node.add_class(class);
    }
}

/// Remove a class from every element in the document carrying it.
pub fn remove_class_everywhere(doc: &Document, class: &str) {
    let marked = select_all(doc, &format!(".{class}"));
    for node in marked {
        node.remove_class(class);
    }
}
