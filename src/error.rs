//! Error types for rs-field-picker.
//!
//! This module defines the error types returned by selector synthesis,
//! verification and extraction operations.

use crate::selector::xpath::XPathError;

/// Error type for picker operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A selector expression could not be parsed.
    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        /// The offending expression.
        selector: String,
        /// Parser message.
        reason: String,
    },

    /// A selector resolved to nothing in the current document.
    #[error("Selector `{0}` matched no elements")]
    NoMatch(String),

    /// A candidate matched more nodes than the configured ceiling.
    #[error("Selector `{selector}` matched {count} elements (limit {threshold})")]
    OverBroadSelector {
        /// The rejected selector.
        selector: String,
        /// How many nodes it matched.
        count: usize,
        /// The configured ceiling.
        threshold: usize,
    },

    /// Two example clicks share no structural pattern.
    #[error("No common pattern found: {0}")]
    NoCommonPattern(String),

    /// No hyperlink could be located near the clicked element.
    #[error("No link found near the clicked element")]
    NoLinkFound,

    /// The two example clicks resolved to different element kinds.
    #[error("Clicked elements differ in tag: {first} vs {second}")]
    TagMismatch {
        /// Tag of the first click.
        first: String,
        /// Tag of the second click.
        second: String,
    },

    /// A selector could not be re-expressed in the other language.
    #[error("Selector conversion failed: {0}")]
    ConversionFailed(String),

    /// The session is not accepting clicks for the requested mode.
    #[error("Session is not selecting in {0} mode")]
    NotSelecting(&'static str),

    /// Reading or decoding a page failed.
    #[error("Page load failed: {0}")]
    PageLoad(String),

    /// Record (de)serialization failed.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl From<XPathError> for Error {
    fn from(err: XPathError) -> Self {
        Self::InvalidSelector {
            selector: err.expression().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias for picker operations.
pub type Result<T> = std::result::Result<T, Error>;
