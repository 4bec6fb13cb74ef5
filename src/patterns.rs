//! Compiled regex patterns and keyword tables used across synthesis and extraction.
//!
//! All patterns are compiled once using `LazyLock`.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Identity
// =============================================================================

/// Framework-generated ids that change between renders.
pub static GENERATED_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"__next|^:r[0-9a-z]*:$|^ember\d+$").expect("GENERATED_ID regex")
});

/// CSS identifiers that can be written without escaping.
pub static PLAIN_CSS_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$").expect("PLAIN_CSS_IDENT regex")
});

// =============================================================================
// Field naming
// =============================================================================

/// "Label123 rest": non-digit prefix followed by a digit-led value.
pub static LABEL_THEN_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^0-9]+?)(\d+.*)$").expect("LABEL_THEN_DIGITS regex"));

/// "Label: value".
pub static LABEL_COLON_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+?):\s*(.+)$").expect("LABEL_COLON_VALUE regex"));

pub static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN regex"));

/// Separators in a user-entered exclusion list.
pub static EXCLUDE_WORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|,\n]").expect("EXCLUDE_WORD_SEPARATOR regex"));

// =============================================================================
// Pagination
// =============================================================================

/// Text that is only a page number ("3", "1.5", "2,0").
pub static NUMERIC_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.,]?\d*$").expect("NUMERIC_TEXT regex"));

/// A text predicate that carries a digit somewhere after it.
pub static TEXT_PREDICATE_WITH_DIGIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"contains\((?:text|normalize-space)\(\).*\d").expect("TEXT_PREDICATE_WITH_DIGIT regex")
});

/// Classes that encode a page number and so differ on every page.
pub static PAGE_NUMBER_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+|page-\d+|\d+-page)$").expect("PAGE_NUMBER_CLASS regex")
});

/// Class fragments that mark next/previous arrow icons.
pub const ICON_KEYWORDS: &[&str] = &[
    "chevron", "next", "right", "arrow", "icon", "forward", "navigate", "caret",
];

/// Class fragments that mark a pagination link.
pub const PAGINATION_LINK_KEYWORDS: &[&str] = &["pagination", "pager", "page", "nav"];

/// Containers that usually wrap page links.
pub const PAGINATION_CONTAINER_SELECTOR: &str =
    r#"[class*="pagination"], [class*="pager"], [class*="page-nav"], nav, [role="navigation"]"#;

/// `data-*` attribute name fragments that identify pager controls.
pub const PAGINATION_DATA_KEYWORDS: &[&str] = &["next", "page", "action"];

// =============================================================================
// Links
// =============================================================================

/// Links that explicitly point at a product or listing detail page.
pub const PRODUCT_LINK_SELECTOR: &str = r#"a[class*="product-link"], a[class*="item-link"], a[class*="card-link"], a[class*="listing-link"], a.js__product-link-for-product-id, a[data-product-id], a[data-item-id]"#;

/// Headline links inside a card.
pub const TITLE_LINK_SELECTOR: &str = r#"h3 a[href], h2 a[href], h4 a[href], h1 a[href], .title a[href], [class*="title"] a[href], a[class*="title"][href]"#;

/// Tags that commonly wrap a whole listing card.
pub const CARD_CONTAINER_TAGS: &[&str] = &[
    "div", "li", "article", "section", "tr", "td", "span", "p", "h1", "h2", "h3", "h4", "h5",
    "h6",
];

/// Class fragments that name a list of repeated items.
pub const LIST_CONTAINER_KEYWORDS: &[&str] = &["list", "container", "grid", "items"];

/// Classes that vary by listing tier and must not anchor a shared path.
pub static TIER_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)vip|normal|premium|basic").expect("TIER_CLASS regex"));

// =============================================================================
// Images
// =============================================================================

/// Lazy-load and standard image source attributes, in lookup order.
pub const IMAGE_SOURCE_ATTRIBUTES: &[&str] = &["data-src", "src", "data-lazy-src", "data-original"];

/// Class or selector fragments that mark an image carousel.
pub const GALLERY_KEYWORDS: &[&str] = &[
    "slider",
    "gallery",
    "media-slide",
    "media-preview",
    "swiper",
    "image",
    "photo",
];

/// Resized thumbnail paths.
pub static THUMBNAIL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:resize/)?(?:50x50|100x100|200x200)/").expect("THUMBNAIL_PATH regex")
});

/// Full-size slides inside a carousel, tried before a generic image scan.
pub const FULL_SIZE_IMAGE_SELECTORS: &[&str] = &[
    ".swiper-slide .pr-img",
    ".swiper-slide img.pr-img",
    ".re__overlay .pr-img",
    ".swiper-slide img",
];

/// Strips of thumbnails that duplicate the full-size slides.
pub const THUMBNAIL_CONTAINER_SELECTOR: &str = ".re__media-thumb-item, .js__media-thumbs";

// =============================================================================
// Maps
// =============================================================================

/// Embedded map frame sources.
pub static MAP_FRAME_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)maps\.google\.com|google\.com/maps|output=embed").expect("MAP_FRAME_SRC regex")
});

/// `center=` / `q=` coordinate pairs inside a map URL.
pub static MAP_COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:center|q)=(-?\d+\.?\d*)\s*(?:,|%2C)\s*(-?\d+\.?\d*)")
        .expect("MAP_COORDINATES regex")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text() {
        assert!(NUMERIC_TEXT.is_match("3"));
        assert!(NUMERIC_TEXT.is_match("12,5"));
        assert!(!NUMERIC_TEXT.is_match("Next"));
        assert!(!NUMERIC_TEXT.is_match("3 >"));
    }

    #[test]
    fn test_text_predicate_with_digit() {
        assert!(TEXT_PREDICATE_WITH_DIGIT.is_match(r#"//a[contains(text(), "2")]"#));
        assert!(TEXT_PREDICATE_WITH_DIGIT
            .is_match(r#"//li[contains(normalize-space(), "Page")]/following-sibling::li[1]"#));
        assert!(!TEXT_PREDICATE_WITH_DIGIT.is_match(r#"//a[contains(text(), "Next")]"#));
        assert!(!TEXT_PREDICATE_WITH_DIGIT.is_match("//ul/li[3]/a"));
    }

    #[test]
    fn test_page_number_class() {
        assert!(PAGE_NUMBER_CLASS.is_match("page-4"));
        assert!(PAGE_NUMBER_CLASS.is_match("4-page"));
        assert!(PAGE_NUMBER_CLASS.is_match("12"));
        assert!(!PAGE_NUMBER_CLASS.is_match("page-link"));
    }

    #[test]
    fn test_thumbnail_path() {
        assert!(THUMBNAIL_PATH.is_match("https://cdn.x/resize/200x200/a.jpg"));
        assert!(THUMBNAIL_PATH.is_match("https://cdn.x/100x100/a.jpg"));
        assert!(!THUMBNAIL_PATH.is_match("https://cdn.x/resize/1275x717/a.jpg"));
    }

    #[test]
    fn test_map_coordinates() {
        let caps = MAP_COORDINATES
            .captures("https://maps.google.com/maps?q=10.77,106.70&output=embed")
            .unwrap();
        assert_eq!(&caps[1], "10.77");
        assert_eq!(&caps[2], "106.70");
        assert!(MAP_FRAME_SRC.is_match("https://www.google.com/maps/embed?pb=1"));
    }

    #[test]
    fn test_generated_ids() {
        assert!(GENERATED_ID.is_match("__next"));
        assert!(GENERATED_ID.is_match(":r1a:"));
        assert!(GENERATED_ID.is_match("ember42"));
        assert!(!GENERATED_ID.is_match("price-box"));
    }
}
