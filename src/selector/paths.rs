//! Structural paths: selectors derived from where a node sits in the tree
//! rather than from its content.

use crate::dom::{self, NodeRef};
use crate::patterns::{GENERATED_ID, TIER_CLASS};
use crate::selector::{css, Selector, Verifier};

/// Absolute axis-language path from the document root, e.g. `/html/body/div[2]/img`.
///
/// A positional index is written whenever the node has same-tag siblings, so
/// the path addresses exactly one element. `None` for non-element nodes.
#[must_use]
pub fn absolute_path(node: &NodeRef) -> Option<String> {
    if !node.is_element() {
        return None;
    }

    let mut parts = Vec::new();
    let mut current = Some(*node);
    while let Some(el) = current.filter(NodeRef::is_element) {
        let tag = dom::tag_name(&el);
        let index = dom::same_tag_index(&el);
        let has_twins = index > 1
            || std::iter::successors(el.next_element_sibling(), NodeRef::next_element_sibling)
                .any(|s| dom::tag_name(&s) == tag);
        if has_twins {
            parts.push(format!("{tag}[{index}]"));
        } else {
            parts.push(tag);
        }
        current = el.parent();
    }

    parts.reverse();
    Some(format!("/{}", parts.join("/")))
}

/// Class usable as one step of a short CSS path: long, state-free, and either
/// carrying a known stable prefix or hyphenated.
fn path_class(node: &NodeRef, stable_prefixes: &[String]) -> Option<String> {
    dom::meaningful_classes(node, 4).into_iter().find(|c| {
        !c.contains("active")
            && !c.contains("selected")
            && (stable_prefixes.iter().any(|p| c.starts_with(p.as_str())) || c.contains('-'))
    })
}

/// Shortest ancestor-bounded CSS path (at most `max_depth` steps) that
/// resolves to `node` alone.
#[must_use]
pub fn unique_css_path(
    verifier: &Verifier,
    node: &NodeRef,
    max_depth: usize,
    stable_prefixes: &[String],
) -> Option<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut current = Some(*node);

    for _ in 0..max_depth {
        let Some(el) = current.filter(NodeRef::is_element) else {
            break;
        };

        let stable_id = dom::id(&el).filter(|id| !GENERATED_ID.is_match(id));
        let anchored = stable_id.is_some();
        let segment = if let Some(id) = stable_id {
            css::id(&id)
        } else if let Some(class) = path_class(&el, stable_prefixes) {
            css::class(&class)
        } else {
            dom::tag_name(&el)
        };
        segments.insert(0, segment);

        let candidate = Selector::path(segments.join(" > "));
        if verifier.matches_exactly(&candidate, node) {
            return Some(candidate.expr().to_string());
        }
        if anchored {
            break;
        }
        current = dom::parent_element(&el);
    }

    None
}

/// Unbounded `tag:nth-of-type(n)` chain up to the root or the nearest id.
#[must_use]
pub fn full_selector(node: &NodeRef) -> String {
    let mut segments = Vec::new();
    let mut current = Some(*node);

    while let Some(el) = current.filter(NodeRef::is_element) {
        let tag = dom::tag_name(&el);
        if let Some(id) = dom::id(&el) {
            segments.push(format!("{tag}{}", css::id(&id)));
            break;
        }
        match dom::parent_element(&el) {
            Some(parent) => {
                segments.push(format!("{tag}:nth-of-type({})", dom::same_tag_index(&el)));
                current = Some(parent);
            }
            None => {
                segments.push(tag);
                break;
            }
        }
    }

    segments.reverse();
    segments.join(" > ")
}

/// `tag.class > tag.class` steps from just below `ancestor` down to `node`.
///
/// Listing-tier classes (vip, premium, ...) are skipped since sibling cards
/// differ in them.
#[must_use]
pub fn path_from_ancestor(node: &NodeRef, ancestor: &NodeRef) -> String {
    let mut segments = Vec::new();
    let mut current = Some(*node);

    while let Some(el) = current {
        if dom::is_same(&el, ancestor) || !el.is_element() {
            break;
        }
        let tag = dom::tag_name(&el);
        let class = dom::class_list(&el)
            .into_iter()
            .find(|c| !TIER_CLASS.is_match(c) && !c.contains(dom::INTERNAL_CLASS_PREFIX));
        segments.push(match class {
            Some(c) => css::tag_class(&tag, &c),
            None => tag,
        });
        current = dom::parent_element(&el);
    }

    segments.reverse();
    segments.join(" > ")
}

/// Nearest element containing both nodes, searching at most `limit` levels
/// above `a` and never returning `body` or anything above it.
#[must_use]
pub fn common_ancestor<'a>(a: &NodeRef<'a>, b: &NodeRef<'a>, limit: usize) -> Option<NodeRef<'a>> {
    dom::ancestor_elements(a)
        .take_while(|el| !dom::is_tag(el, "body") && !dom::is_tag(el, "html"))
        .take(limit)
        .find(|el| dom::contains(el, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    const HTML: &str = r#"<html><body>
        <div class="page-wrap">
            <div><img data-src="/a.jpg"></div>
            <div class="box-main">
                <p>one</p>
                <p class="note-text">two</p>
            </div>
        </div>
        <section id="side"><span>s</span></section>
    </body></html>"#;

    fn first<'a>(doc: &'a Document, css: &str) -> NodeRef<'a> {
        dom::select_all(doc, css)[0]
    }

    #[test]
    fn test_absolute_path_resolves_uniquely() {
        let doc = dom::parse(HTML);
        let img = first(&doc, "img");
        let path = absolute_path(&img).unwrap();
        assert_eq!(path, "/html/body/div/div[1]/img");
        let v = Verifier::new(&doc);
        assert!(v.matches_exactly(&Selector::axis(path), &img));
    }

    #[test]
    fn test_unique_css_path_stops_when_unique() {
        let doc = dom::parse(HTML);
        let v = Verifier::new(&doc);
        let note = first(&doc, "p.note-text");
        assert_eq!(
            unique_css_path(&v, &note, 6, &[]).as_deref(),
            Some(".note-text")
        );
        let one = first(&doc, "p");
        assert_eq!(unique_css_path(&v, &one, 6, &[]), None);
        let span = first(&doc, "span");
        assert_eq!(unique_css_path(&v, &span, 6, &[]).as_deref(), Some("span"));
    }

    #[test]
    fn test_unique_css_path_anchors_on_id() {
        let doc = dom::parse(r#"<div id="x"><p>a</p></div><div><p>b</p></div>"#);
        let v = Verifier::new(&doc);
        let p = first(&doc, "p");
        assert_eq!(unique_css_path(&v, &p, 6, &[]).as_deref(), Some("#x > p"));
    }

    #[test]
    fn test_full_selector() {
        let doc = dom::parse(HTML);
        let one = first(&doc, "p");
        let full = full_selector(&one);
        assert_eq!(
            full,
            "html > body:nth-of-type(1) > div:nth-of-type(1) > div:nth-of-type(2) > p:nth-of-type(1)"
        );
        let v = Verifier::new(&doc);
        assert!(v.matches_exactly(&Selector::path(full), &one));
        let span = first(&doc, "span");
        assert_eq!(full_selector(&span), "section#side > span:nth-of-type(1)");
    }

    #[test]
    fn test_path_from_ancestor_and_common_ancestor() {
        let doc = dom::parse(
            r#"<ul class="items"><li class="vip card"><a class="lnk" href="/1">1</a></li>
               <li class="normal card"><a class="lnk" href="/2">2</a></li></ul>"#,
        );
        let links = dom::select_all(&doc, "a");
        let ul = common_ancestor(&links[0], &links[1], 20).unwrap();
        assert_eq!(dom::tag_name(&ul), "ul");
        assert_eq!(path_from_ancestor(&links[0], &ul), "li.card > a.lnk");
    }

    #[test]
    fn test_common_ancestor_never_body() {
        let doc = dom::parse(r#"<div><a href="/1">1</a></div><section><a href="/2">2</a></section>"#);
        let links = dom::select_all(&doc, "a");
        assert!(common_ancestor(&links[0], &links[1], 20).is_none());
    }
}
