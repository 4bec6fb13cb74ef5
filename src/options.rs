//! Configuration options for selector synthesis and extraction.
//!
//! The `Options` struct holds the thresholds and site hints the synthesizers
//! consult. Everything has a working default.

use crate::selector::SelectorLanguage;
use crate::synthesis::rules::{default_rules, OverrideRule};

/// Configuration options for a picking session.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use rs_field_picker::{Options, SelectorLanguage};
///
/// // Use defaults
/// let options = Options::default();
/// assert_eq!(options.over_broad_threshold, 50);
///
/// // Customize specific fields
/// let options = Options {
///     selector_language: SelectorLanguage::Path,
///     page_url: Some("https://example.com/listing".to_string()),
///     ..Options::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Language new selectors are synthesized in.
    ///
    /// Default: `SelectorLanguage::Axis`
    pub selector_language: SelectorLanguage,

    /// A picked selector matching more nodes than this is rejected.
    ///
    /// Default: `50`
    pub over_broad_threshold: usize,

    /// Most ancestor steps in a short CSS path.
    ///
    /// Default: `6`
    pub css_path_max_depth: usize,

    /// How many URLs an item-link pick reports back.
    ///
    /// Default: `10`
    pub preview_url_limit: usize,

    /// Address of the loaded page, used to resolve relative `src`/`href`
    /// values and to gate host-specific override rules.
    ///
    /// Default: `None`
    pub page_url: Option<String>,

    /// Hand-written selectors for known page regions, checked before the
    /// generic cascade.
    ///
    /// Default: [`default_rules`]
    pub override_rules: Vec<OverrideRule>,

    /// Try label/value sibling patterns (bold label rows, label siblings,
    /// label-in-ancestor) before attribute fallbacks.
    ///
    /// Default: `true`
    pub label_heuristics: bool,

    /// Class fragments marking a wrapper whose `span` holds the label of a
    /// nearby value.
    ///
    /// Default: `["a4ep88f"]`
    pub label_container_hints: Vec<String>,

    /// Class prefixes that mark stable, script-facing class names.
    ///
    /// Default: `["js__", "re__"]`
    pub stable_class_prefixes: Vec<String>,

    /// Longest text a text-predicate fallback is built from.
    ///
    /// Default: `100`
    pub max_text_predicate_len: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            selector_language: SelectorLanguage::Axis,
            over_broad_threshold: 50,
            css_path_max_depth: 6,
            preview_url_limit: 10,
            page_url: None,
            override_rules: default_rules(),
            label_heuristics: true,
            label_container_hints: vec!["a4ep88f".to_string()],
            stable_class_prefixes: vec!["js__".to_string(), "re__".to_string()],
            max_text_predicate_len: 100,
        }
    }
}
