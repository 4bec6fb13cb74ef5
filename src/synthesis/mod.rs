//! Selector synthesis for clicked elements.
//!
//! Each synthesizer runs a cascade of named strategies, most specific first,
//! and keeps the first candidate that verifies against the live document:
//!
//! - [`detail`]: one value on a detail page
//! - [`listing`]: every item link on a listing page
//! - [`pagination`]: the "next page" control
//! - [`map`]: embedded map frames and their coordinates
//! - [`rules`]: hand-written overrides for known page regions

pub mod detail;
pub mod listing;
pub mod map;
pub mod pagination;
pub mod rules;

pub use detail::DetailSynthesizer;
pub use listing::{ItemLinkPick, ListingCandidate, ListingSynthesizer};
pub use pagination::PaginationSynthesizer;
pub use rules::OverrideRule;
