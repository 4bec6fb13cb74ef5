//! URL Utility Functions
//!
//! Resolution of relative `src`/`href` values against the page URL, and the
//! small path manipulations the listing synthesizer needs.

use url::Url;

/// Base used to read the path of a relative href when no page URL is known.
const PLACEHOLDER_BASE: &str = "http://localhost/";

/// Check if a string is a valid absolute http(s) URL.
///
/// # Returns
/// * `(is_absolute, parsed_url)` - Whether URL is absolute and the parsed URL if valid
#[must_use]
pub fn is_absolute_url(s: &str) -> (bool, Option<Url>) {
    let s = s.trim();

    if !s.starts_with("http://") && !s.starts_with("https://") {
        return (false, None);
    }

    match Url::parse(s) {
        Ok(url) if url.host().is_some() => (true, Some(url)),
        _ => (false, None),
    }
}

/// Parse a page URL into a resolution base.
#[must_use]
pub fn parse_base(page_url: Option<&str>) -> Option<Url> {
    page_url.and_then(|u| is_absolute_url(u).1)
}

/// Convert a relative or absolute URL to absolute form.
///
/// Special schemes (`data:`, `blob:`, `javascript:`, `mailto:`, `tel:`) and
/// values that cannot be joined are returned unchanged; so is everything when
/// there is no base.
#[must_use]
pub fn resolve(url_str: &str, base: Option<&Url>) -> String {
    let url_str = url_str.trim();

    if url_str.is_empty() {
        return String::new();
    }

    if ["data:", "blob:", "javascript:", "mailto:", "tel:"]
        .iter()
        .any(|scheme| url_str.starts_with(scheme))
    {
        return url_str.to_string();
    }

    if is_absolute_url(url_str).0 {
        return url_str.to_string();
    }

    match base.map(|b| b.join(url_str)) {
        Some(Ok(resolved)) => resolved.to_string(),
        _ => url_str.to_string(),
    }
}

/// Hostname of `url_str`, if it parses.
#[must_use]
pub fn host_of(url_str: &str) -> Option<String> {
    Url::parse(url_str).ok()?.host_str().map(str::to_string)
}

/// Non-empty path segments of an href, relative or absolute.
#[must_use]
pub fn path_segments(href: &str, base: Option<&Url>) -> Vec<String> {
    let fallback = Url::parse(PLACEHOLDER_BASE).ok();
    let Some(base) = base.cloned().or(fallback) else {
        return Vec::new();
    };
    base.join(href.trim())
        .ok()
        .and_then(|u| {
            u.path_segments()
                .map(|segs| segs.filter(|s| !s.is_empty()).map(str::to_string).collect())
        })
        .unwrap_or_default()
}

/// The last `n` path segments joined with `/`, when the path has at least `n`.
#[must_use]
pub fn trailing_path(href: &str, base: Option<&Url>, n: usize) -> Option<String> {
    let segments = path_segments(href, base);
    if n == 0 || segments.len() < n {
        return None;
    }
    Some(segments[segments.len() - n..].join("/"))
}
