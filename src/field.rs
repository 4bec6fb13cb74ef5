//! Field records: what the user picked and how to read a value back out of it.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::identity::ElementReference;
use crate::patterns::{EXCLUDE_WORD_SEPARATOR, LABEL_COLON_VALUE, LABEL_THEN_DIGITS, WHITESPACE_RUN};
use crate::selector::{Selector, SelectorLanguage};

/// Longest generated field name before it is cut and suffixed with `...`.
const MAX_NAME_CHARS: usize = 100;

/// Which part of a matched node becomes the field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    /// Visible text with exclusion words removed.
    #[default]
    Text,
    /// Layout-aware text with exclusion words removed.
    InnerText,
    Html,
    /// Image URL from lazy-load or standard source attributes.
    Src,
    Href,
    Alt,
    Title,
    #[serde(rename = "data-id")]
    DataId,
    #[serde(rename = "data-phone")]
    DataPhone,
    /// Every `itemprop` value inside the node as a map.
    #[serde(rename = "all", alias = "container")]
    Container,
    /// `lat,lng` read from the node or an embedded map.
    #[serde(rename = "latlng")]
    Coordinates,
}

impl ValueKind {
    /// Attribute read verbatim for attribute-backed kinds.
    #[must_use]
    pub fn attribute(self) -> Option<&'static str> {
        match self {
            Self::Alt => Some("alt"),
            Self::Title => Some("title"),
            Self::DataId => Some("data-id"),
            Self::DataPhone => Some("data-phone"),
            _ => None,
        }
    }
}

/// One named data point on a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,

    /// Selector verified against the clicked node when the field was created.
    pub selector: Selector,

    /// Hand-edited replacement that takes precedence over `selector`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_selector: Option<Selector>,

    /// The same node expressed in the other selector language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_selector: Option<Selector>,

    /// Unbounded `nth-of-type` path, tried when `selector` stops matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_selector: Option<String>,

    #[serde(default)]
    pub unique_id: String,

    #[serde(default)]
    pub tag_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_reference: Option<ElementReference>,

    /// Text of the node at pick time, for display.
    #[serde(default)]
    pub text_content: String,

    #[serde(default, rename = "valueType")]
    pub value_kind: ValueKind,

    /// Words stripped from text values, separated by `|`, `,` or newlines.
    #[serde(default)]
    pub exclude_words: String,
}

impl Field {
    /// Minimal field around a selector; every optional part left empty.
    pub fn new(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selector,
            custom_selector: None,
            alternate_selector: None,
            full_selector: None,
            unique_id: String::new(),
            tag_name: String::new(),
            element_reference: None,
            text_content: String::new(),
            value_kind: ValueKind::Text,
            exclude_words: String::new(),
        }
    }

    /// The selector extraction should run: the hand-edited one when present.
    #[must_use]
    pub fn effective_selector(&self) -> &Selector {
        self.custom_selector.as_ref().unwrap_or(&self.selector)
    }

    #[must_use]
    pub fn selector_language(&self) -> SelectorLanguage {
        self.selector.language()
    }
}

/// Splits "Label: value" or "Label123 ..." into its label and value parts.
#[must_use]
pub fn split_label_value(text: &str) -> (Option<String>, String) {
    let trimmed = text.trim();
    for pattern in [&*LABEL_THEN_DIGITS, &*LABEL_COLON_VALUE] {
        if let Some(caps) = pattern.captures(trimmed) {
            let label = caps[1].trim().to_string();
            let value = caps[2].trim().to_string();
            if !label.is_empty() {
                return (Some(label), value);
            }
        }
    }
    (None, trimmed.to_string())
}

/// Name for a new field picked from a node with `text`.
///
/// Prefers the label part of the text, caps the length, falls back to
/// `fallback` (usually the tag) for text-less nodes, and appends ` (2)`,
/// ` (3)`, ... until the name is unused.
#[must_use]
pub fn generate_field_name<'n>(
    text: &str,
    fallback: &str,
    existing: impl IntoIterator<Item = &'n str> + Clone,
) -> String {
    let cleaned = WHITESPACE_RUN.replace_all(text.trim(), " ").to_string();
    let (label, _) = split_label_value(&cleaned);
    let mut base = label.unwrap_or(cleaned);
    if base.is_empty() {
        base = fallback.to_string();
    }
    if base.chars().count() > MAX_NAME_CHARS {
        base = format!("{}...", base.chars().take(MAX_NAME_CHARS).collect::<String>());
    }

    let taken = |candidate: &str| existing.clone().into_iter().any(|n| n == candidate);
    if !taken(&base) {
        return base;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{base} ({counter})");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Words listed in an exclusion string.
#[must_use]
pub fn parse_exclude_words(raw: &str) -> Vec<String> {
    EXCLUDE_WORD_SEPARATOR
        .split(raw)
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Removes every listed word (case-insensitive, literal) and tidies whitespace.
///
/// Text is returned untouched when the list is empty.
#[must_use]
pub fn apply_exclude_words(text: &str, raw: &str) -> String {
    let words = parse_exclude_words(raw);
    if words.is_empty() {
        return text.to_string();
    }

    let mut out = text.to_string();
    for word in &words {
        if let Ok(re) = Regex::new(&format!("(?i){}", regex::escape(word))) {
            out = re.replace_all(&out, "").into_owned();
        }
    }
    WHITESPACE_RUN.replace_all(&out, " ").trim().to_string()
}
