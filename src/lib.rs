//! # rs-field-picker
//!
//! Point-and-click selector synthesis and typed field extraction for parsed
//! HTML pages.
//!
//! A user clicks an element; the crate derives a selector that picks out that
//! element, checks it against the page before accepting it, and remembers a
//! fingerprint that finds the same element again among several matches.
//! Stored fields are later re-resolved on sibling pages and read back as
//! text, attributes or image sets.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_field_picker::{dom, Options, Session};
//!
//! let doc = dom::parse(r#"<html><body>
//!     <div class="info"><span class="label">Price</span><span class="value">5 billion</span></div>
//! </body></html>"#);
//!
//! let mut session = Session::new(Options::default());
//! session.toggle_selecting(&doc, true, None);
//!
//! let value = dom::select_all(&doc, ".value")[0];
//! assert!(session.click(&doc, &value).success);
//!
//! let scraped = session.scrape(&doc, None);
//! assert_eq!(scraped.data.unwrap()["5 billion"], "5 billion");
//! ```
//!
//! ## Features
//!
//! - **Detail selectors**: ids, label/value patterns, itemprops, absolute
//!   paths and short CSS paths, each verified against the page
//! - **Listing selectors**: one pattern covering every item link from two
//!   example clicks
//! - **Pagination selectors**: "next" controls without page numbers baked in
//! - **Extraction**: typed values, exclusion words and gallery-aware image
//!   collection
//! - **Both query languages**: CSS via `dom_query`, XPath via an in-crate
//!   evaluator

mod error;
mod options;
mod patterns;
mod result;

/// DOM operations adapter over `dom_query`.
pub mod dom;

/// Selectors, the verifier and the XPath evaluator.
pub mod selector;

/// Selector synthesis cascades for detail, listing and pagination clicks.
pub mod synthesis;

/// Element fingerprints used to disambiguate matches.
pub mod identity;

/// Field records, naming and exclusion words.
pub mod field;

/// Field extraction and previews.
pub mod extract;

/// Picking session state and operations.
pub mod session;

/// URL resolution helpers.
pub mod url_utils;

/// Page decoding and loading.
pub mod encoding;

// Public API - re-exports
pub use error::{Error, Result};
pub use extract::{scrape, Extractor};
pub use field::{Field, ValueKind};
pub use identity::ElementReference;
pub use options::Options;
pub use result::Response;
pub use selector::{Selector, SelectorLanguage, Synthesized, Verifier};
pub use session::{ClickOutcome, ListingSelectionKind, ListingSpec, Mode, Session, SessionSnapshot};
pub use synthesis::{DetailSynthesizer, ListingSynthesizer, OverrideRule, PaginationSynthesizer};

/// Synthesizes a selector for `node` with default options.
///
/// # Example
///
/// ```rust
/// use rs_field_picker::{dom, synthesize_selector, Selector, Verifier};
///
/// let doc = dom::parse(r#"<div id="price">5</div><div>6</div>"#);
/// let node = dom::select_all(&doc, "#price")[0];
/// let selector = synthesize_selector(&doc, &node);
///
/// assert_eq!(selector, Selector::path("#price"));
/// assert!(Verifier::new(&doc).matches_exactly(&selector, &node));
/// ```
#[must_use]
pub fn synthesize_selector(doc: &dom::Document, node: &dom::NodeRef) -> Selector {
    synthesize_selector_with_options(doc, node, &Options::default())
}

/// Synthesizes a selector for `node` with custom options.
#[must_use]
pub fn synthesize_selector_with_options(doc: &dom::Document, node: &dom::NodeRef, options: &Options) -> Selector {
    DetailSynthesizer::new(Verifier::new(doc), options)
        .synthesize(node)
        .selector
}

/// Two-click listing pattern between `first` and `second` with default options.
pub fn find_common_selector(doc: &dom::Document, first: &dom::NodeRef, second: &dom::NodeRef) -> Result<Selector> {
    let options = Options::default();
    ListingSynthesizer::new(Verifier::new(doc), &options).find_common_selector(first, second)
}
