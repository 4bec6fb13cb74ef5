//! Page loading: bytes on disk to a parsed [`Document`].
//!
//! Saved pages keep their original charset. A byte-order mark wins, then a
//! `<meta>` charset declaration in the first kilobyte, then UTF-8.

use std::path::Path;
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use tracing::debug;

use crate::dom::{self, Document};
use crate::error::{Error, Result};

/// Bytes searched for a charset declaration.
const SNIFF_LEN: usize = 1024;

/// `<meta charset=...>` or the `charset=` part of a `Content-Type` meta.
#[allow(clippy::expect_used)]
static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+?charset\s*=\s*["']?([A-Za-z0-9_:.\-]+)"#).expect("META_CHARSET regex")
});

/// Encoding a page declares, if any.
#[must_use]
pub fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Some(encoding);
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_LEN)]);
    let label = META_CHARSET.captures(&head)?.get(1)?.as_str().to_string();
    Encoding::for_label(label.as_bytes())
}

/// Decodes page bytes to UTF-8, replacing invalid sequences.
#[must_use]
pub fn decode_page(bytes: &[u8]) -> String {
    let encoding = declared_encoding(bytes).unwrap_or(UTF_8);
    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "page had undecodable bytes");
    }
    decoded.into_owned()
}

/// Reads and parses a saved page.
pub fn load_page(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::PageLoad(format!("{}: {e}", path.display())))?;
    Ok(dom::parse(&decode_page(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_meta_charset_forms() {
        let plain = br#"<meta charset="ISO-8859-1"><p>x</p>"#;
        assert_eq!(declared_encoding(plain).map(Encoding::name), Some("windows-1252"));

        let http_equiv =
            br#"<META HTTP-EQUIV="Content-Type" CONTENT="text/html; CHARSET=Shift_JIS">"#;
        assert_eq!(declared_encoding(http_equiv).map(Encoding::name), Some("Shift_JIS"));

        assert_eq!(declared_encoding(b"<p>none</p>"), None);
    }

    #[test]
    fn test_bom_beats_meta() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(br#"<meta charset="windows-1252">"#);
        assert_eq!(declared_encoding(&bytes), Some(UTF_8));
    }

    #[test]
    fn test_decode_legacy_page() {
        let bytes = b"<meta charset=\"windows-1252\"><p>Caf\xE9 \x93ok\x94</p>";
        assert!(decode_page(bytes).contains("Caf\u{e9} \u{201C}ok\u{201D}"));
    }

    #[test]
    fn test_decode_invalid_utf8_does_not_fail() {
        let text = decode_page(b"<p>Gi\xFF\xFE</p>");
        assert!(text.starts_with("<p>Gi"));
    }

    #[test]
    fn test_missing_file_is_page_load_error() {
        assert!(matches!(load_page("/nonexistent/page.html"), Err(Error::PageLoad(_))));
    }
}
