//! Selector Infrastructure
//!
//! A [`Selector`] is a tagged expression in one of two query languages: the
//! path language (CSS) or the axis language (an XPath 1.0 subset). The
//! [`Verifier`] resolves either kind against a live document, and
//! [`first_success`] runs an ordered cascade of candidate generators until
//! one produces a verified selector.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::dom::{self, Document, NodeRef};
use crate::error::{Error, Result};

pub mod css;
pub mod paths;
pub mod xpath;

/// Query language of a selector expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectorLanguage {
    /// Path-language selectors (CSS).
    #[serde(rename = "css")]
    Path,
    /// Axis-language selectors (XPath).
    #[serde(rename = "xpath")]
    #[default]
    Axis,
}

impl SelectorLanguage {
    /// The other language.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Path => Self::Axis,
            Self::Axis => Self::Path,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "css",
            Self::Axis => "xpath",
        }
    }
}

impl fmt::Display for SelectorLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query expression tagged with its language.
///
/// # Example
///
/// ```rust
/// use rs_field_picker::{dom, Selector, Verifier};
///
/// let doc = dom::parse(r#"<ul><li class="a">1</li><li>2</li></ul>"#);
/// let verifier = Verifier::new(&doc);
///
/// assert_eq!(verifier.count(&Selector::path("li.a")), 1);
/// assert_eq!(verifier.count(&Selector::axis("//li[2]")), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "language", content = "expr")]
pub enum Selector {
    #[serde(rename = "css")]
    Path(String),
    #[serde(rename = "xpath")]
    Axis(String),
}

impl Selector {
    pub fn path(expr: impl Into<String>) -> Self {
        Self::Path(expr.into())
    }

    pub fn axis(expr: impl Into<String>) -> Self {
        Self::Axis(expr.into())
    }

    /// Builds a selector in `language`.
    pub fn new(language: SelectorLanguage, expr: impl Into<String>) -> Self {
        match language {
            SelectorLanguage::Path => Self::path(expr),
            SelectorLanguage::Axis => Self::axis(expr),
        }
    }

    /// Tags an untagged expression from an external record.
    ///
    /// Only for ingesting hand-written or legacy selectors: expressions that
    /// start like a location path (`/`, `(`, `./`) are read as axis-language.
    #[must_use]
    pub fn infer(expr: &str) -> Self {
        let trimmed = expr.trim();
        if trimmed.starts_with('/') || trimmed.starts_with('(') || trimmed.starts_with("./") {
            Self::axis(trimmed)
        } else {
            Self::path(trimmed)
        }
    }

    #[must_use]
    pub fn language(&self) -> SelectorLanguage {
        match self {
            Self::Path(_) => SelectorLanguage::Path,
            Self::Axis(_) => SelectorLanguage::Axis,
        }
    }

    #[must_use]
    pub fn expr(&self) -> &str {
        match self {
            Self::Path(e) | Self::Axis(e) => e,
        }
    }

    #[must_use]
    pub fn is_axis(&self) -> bool {
        matches!(self, Self::Axis(_))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expr())
    }
}

/// Resolves selectors against one document.
///
/// Malformed expressions never panic: [`Verifier::try_execute`] reports them,
/// every other method treats them as matching nothing.
#[derive(Clone, Copy)]
pub struct Verifier<'a> {
    doc: &'a Document,
}

impl<'a> Verifier<'a> {
    #[must_use]
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Matching elements in document order, or the parse error.
    pub fn try_execute(&self, selector: &Selector) -> Result<Vec<NodeRef<'a>>> {
        match selector {
            Selector::Path(css) => {
                let matcher = dom::Matcher::new(css).map_err(|e| Error::InvalidSelector {
                    selector: css.clone(),
                    reason: format!("{e:?}"),
                })?;
                Ok(self.doc.select_matcher(&matcher).nodes().to_vec())
            }
            Selector::Axis(expr) => Ok(xpath::select(self.doc, expr)?),
        }
    }

    /// Matching elements in document order; empty when the expression is malformed.
    #[must_use]
    pub fn execute(&self, selector: &Selector) -> Vec<NodeRef<'a>> {
        self.try_execute(selector).unwrap_or_else(|err| {
            trace!(%selector, %err, "selector did not parse");
            Vec::new()
        })
    }

    #[must_use]
    pub fn count(&self, selector: &Selector) -> usize {
        self.execute(selector).len()
    }

    /// Whether `selector` resolves to `target` and nothing else.
    #[must_use]
    pub fn matches_exactly(&self, selector: &Selector, target: &NodeRef) -> bool {
        let found = self.execute(selector);
        found.len() == 1 && dom::is_same(&found[0], target)
    }

    /// Whether the first match in document order is `target`.
    #[must_use]
    pub fn first_is(&self, selector: &Selector, target: &NodeRef) -> bool {
        self.execute(selector)
            .first()
            .is_some_and(|n| dom::is_same(n, target))
    }

    /// Whether `target` is among the matches.
    #[must_use]
    pub fn includes(&self, selector: &Selector, target: &NodeRef) -> bool {
        self.execute(selector).iter().any(|n| dom::is_same(n, target))
    }

    /// Whether every node in `targets` is among the matches.
    #[must_use]
    pub fn includes_all(&self, selector: &Selector, targets: &[NodeRef]) -> bool {
        let found = self.execute(selector);
        targets
            .iter()
            .all(|t| found.iter().any(|n| dom::is_same(n, t)))
    }
}

/// A selector together with the cascade step that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesized {
    pub selector: Selector,
    pub strategy: &'static str,
}

/// A named, lazily-run candidate generator.
pub type Strategy<'s> = (&'static str, &'s dyn Fn() -> Option<Selector>);

/// Runs `strategies` in order and returns the first one that yields a selector.
///
/// Each strategy is expected to verify its own candidates; a `None` means
/// "nothing verified here, try the next one".
pub fn first_success(cascade: &str, strategies: &[Strategy<'_>]) -> Option<Synthesized> {
    strategies.iter().find_map(|(name, run)| {
        let Some(selector) = run() else {
            trace!(cascade, strategy = *name, "no verified candidate");
            return None;
        };
        debug!(cascade, strategy = *name, %selector, "accepted selector");
        Some(Synthesized {
            selector,
            strategy: *name,
        })
    })
}

/// First candidate that passes `accept`.
pub fn first_verified(
    candidates: impl IntoIterator<Item = Selector>,
    accept: impl Fn(&Selector) -> bool,
) -> Option<Selector> {
    candidates.into_iter().find(|candidate| {
        let ok = accept(candidate);
        trace!(%candidate, ok, "verified candidate");
        ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HTML: &str = r#"<div id="box">
        <p class="a">one</p>
        <p class="a">two</p>
        <p class="b">three</p>
    </div>"#;

    #[test]
    fn test_execute_both_languages() {
        let doc = dom::parse(HTML);
        let v = Verifier::new(&doc);
        assert_eq!(v.count(&Selector::path("p.a")), 2);
        assert_eq!(v.count(&Selector::axis(r#"//p[@class="a"]"#)), 2);
    }

    #[test]
    fn test_malformed_selectors_match_nothing() {
        let doc = dom::parse(HTML);
        let v = Verifier::new(&doc);
        assert!(v.execute(&Selector::path("p[")).is_empty());
        assert!(v.execute(&Selector::axis("//p[")).is_empty());
        assert!(matches!(
            v.try_execute(&Selector::axis("//p[")),
            Err(Error::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_exact_and_inclusive_checks() {
        let doc = dom::parse(HTML);
        let v = Verifier::new(&doc);
        let b = dom::select_all(&doc, "p.b")[0];
        let first_a = dom::select_all(&doc, "p.a")[0];
        assert!(v.matches_exactly(&Selector::path("p.b"), &b));
        assert!(!v.matches_exactly(&Selector::path("p"), &b));
        assert!(v.includes(&Selector::path("p"), &b));
        assert!(v.first_is(&Selector::path("p"), &first_a));
        assert!(v.includes_all(&Selector::path("p"), &[b, first_a]));
        assert!(!v.includes_all(&Selector::path("p.a"), &[b, first_a]));
    }

    #[test]
    fn test_infer_language() {
        assert_eq!(Selector::infer("//a").language(), SelectorLanguage::Axis);
        assert_eq!(Selector::infer("(//a)[1]").language(), SelectorLanguage::Axis);
        assert_eq!(Selector::infer("div > a").language(), SelectorLanguage::Path);
    }

    #[test]
    fn test_selector_serializes_tagged() {
        let json = serde_json::to_string(&Selector::axis("//a")).unwrap();
        assert_eq!(json, r#"{"language":"xpath","expr":"//a"}"#);
        let back: Selector = serde_json::from_str(r#"{"language":"css","expr":"a.x"}"#).unwrap();
        assert_eq!(back, Selector::path("a.x"));
    }

    #[test]
    fn test_first_success_stops_at_first_hit() {
        let calls = std::cell::Cell::new(0);
        let miss = || -> Option<Selector> {
            calls.set(calls.get() + 1);
            None
        };
        let hit = || {
            calls.set(calls.get() + 1);
            Some(Selector::path("p.b"))
        };
        let never = || -> Option<Selector> { panic!("cascade should have stopped") };
        let found = first_success("test", &[("miss", &miss), ("hit", &hit), ("never", &never)]);
        assert_eq!(
            found,
            Some(Synthesized {
                selector: Selector::path("p.b"),
                strategy: "hit"
            })
        );
        assert_eq!(calls.get(), 2);
    }
}
