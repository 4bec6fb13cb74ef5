//! Path-language (CSS) expression builders.
//!
//! Class names and ids scraped from real pages are not always valid CSS
//! identifiers (`2col`, `a:b`, `w-1/2`); these helpers escape them so the
//! resulting selector parses.

use crate::patterns::PLAIN_CSS_IDENT;

/// Escapes `value` for use as a CSS identifier.
#[must_use]
pub fn ident(value: &str) -> String {
    if PLAIN_CSS_IDENT.is_match(value) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 4);
    let chars: Vec<char> = value.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let leading_digit = c.is_ascii_digit()
            && (i == 0 || (i == 1 && chars[0] == '-'));
        if leading_digit {
            out.push_str(&format!("\\{:x} ", u32::from(c)));
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Quotes `value` as a CSS string.
#[must_use]
pub fn string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// `.class`
#[must_use]
pub fn class(name: &str) -> String {
    format!(".{}", ident(name))
}

/// `#id`
#[must_use]
pub fn id(value: &str) -> String {
    format!("#{}", ident(value))
}

/// `tag.class`
#[must_use]
pub fn tag_class(tag: &str, name: &str) -> String {
    format!("{tag}{}", class(name))
}

/// `tag[name="value"]`
#[must_use]
pub fn attr_equals(tag: &str, name: &str, value: &str) -> String {
    format!("{tag}[{name}={}]", string(value))
}
