//! Field extraction: re-resolving stored fields and reading typed values.
//!
//! Resolution runs the field's selector, narrows the matches with its
//! [`ElementReference`](crate::identity::ElementReference) when one was
//! captured, and falls back to the selector alone and then the stored full
//! path. Matches that look like an
//! image carousel expand into an array of full-size image URLs.

use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::Url;

use crate::dom::{self, NodeRef};
use crate::field::{apply_exclude_words, Field, ValueKind};
use crate::options::Options;
use crate::patterns::{
    FULL_SIZE_IMAGE_SELECTORS, GALLERY_KEYWORDS, IMAGE_SOURCE_ATTRIBUTES, THUMBNAIL_CONTAINER_SELECTOR,
    THUMBNAIL_PATH,
};
use crate::selector::{Selector, Verifier};
use crate::synthesis::map;
use crate::url_utils::{parse_base, resolve};

/// Selector fragments that mark a carousel even when the node's own class does not.
const GALLERY_SELECTOR_KEYWORDS: &[&str] = &["slider", "gallery", "media-slide", "swiper"];

/// Full-size slide selectors used by previews (the generic slide scan is scrape-only).
const PREVIEW_FULL_SIZE_SELECTORS: usize = 3;

/// Reads values for stored fields from one document.
#[derive(Clone, Copy)]
pub struct Extractor<'a, 'o> {
    verifier: Verifier<'a>,
    options: &'o Options,
}

impl<'a, 'o> Extractor<'a, 'o> {
    #[must_use]
    pub fn new(verifier: Verifier<'a>, options: &'o Options) -> Self {
        Self { verifier, options }
    }

    fn base(&self) -> Option<Url> {
        parse_base(self.options.page_url.as_deref())
    }

    /// `{name: value}` for every field, `null` where nothing resolves.
    #[must_use]
    pub fn scrape(&self, fields: &[Field]) -> Map<String, Value> {
        let mut out = Map::new();
        for field in fields {
            let value = self.scrape_field(field);
            trace!(field = %field.name, ?value, "scraped");
            out.insert(field.name.clone(), value);
        }
        debug!(fields = fields.len(), "scrape finished");
        out
    }

    /// Nodes a stored field points at on this page.
    #[must_use]
    pub fn resolve_field(&self, field: &Field) -> Vec<NodeRef<'a>> {
        let base = self.base();
        if let Some(reference) = &field.element_reference {
            let candidates = self.verifier.execute(&field.selector);
            let narrowed = reference.filter(&candidates, &self.verifier, base.as_ref());
            if !narrowed.is_empty() {
                return narrowed;
            }
        }

        let found = self.verifier.execute(field.effective_selector());
        if !found.is_empty() {
            return found;
        }
        match &field.full_selector {
            Some(full) => self.verifier.execute(&Selector::infer(full)),
            None => Vec::new(),
        }
    }

    /// The value one field resolves to.
    #[must_use]
    pub fn scrape_field(&self, field: &Field) -> Value {
        let nodes = self.resolve_field(field);
        let Some(first) = nodes.first() else {
            return Value::Null;
        };

        if self.looks_like_gallery(field, first) {
            let images = gallery_images(&nodes, FULL_SIZE_IMAGE_SELECTORS);
            if !images.is_empty() {
                let urls = self.image_urls(&images, true);
                return Value::Array(urls.into_iter().map(Value::String).collect());
            }
            return self.value_of(first, field.value_kind, &field.exclude_words);
        }

        if nodes.len() == 1 || field.element_reference.is_some() {
            return self.value_of(first, field.value_kind, &field.exclude_words);
        }
        Value::Array(
            nodes
                .iter()
                .map(|n| self.value_of(n, field.value_kind, &field.exclude_words))
                .collect(),
        )
    }

    fn looks_like_gallery(&self, field: &Field, first: &NodeRef) -> bool {
        if field.value_kind == ValueKind::Src || field.tag_name == "img" {
            return true;
        }
        let class = dom::class_name(first);
        let expr = field.effective_selector().expr();
        GALLERY_KEYWORDS.iter().any(|k| class.contains(k))
            || GALLERY_SELECTOR_KEYWORDS.iter().any(|k| expr.contains(k))
            || dom::query_selector(first, "img").is_some()
    }

    /// Value `selector` yields right now, as the field editor previews it.
    ///
    /// `field` supplies the element reference and exclusion words when the
    /// selector belongs to an existing field.
    #[must_use]
    pub fn preview(&self, selector: &Selector, kind: ValueKind, field: Option<&Field>) -> Value {
        let base = self.base();
        let candidates = self.verifier.execute(selector);
        let narrowed = field
            .and_then(|f| f.element_reference.as_ref())
            .map(|r| r.filter(&candidates, &self.verifier, base.as_ref()))
            .unwrap_or_default();
        let nodes = if narrowed.is_empty() { candidates } else { narrowed };
        let Some(first) = nodes.first() else {
            return Value::Null;
        };

        match kind {
            ValueKind::Src => self.preview_images(&nodes),
            ValueKind::Container => container_values(first).map_or(Value::Null, Value::Object),
            _ => {
                let exclude = field.map_or("", |f| f.exclude_words.as_str());
                self.value_of(first, kind, exclude)
            }
        }
    }

    fn preview_images(&self, nodes: &[NodeRef]) -> Value {
        let Some(first) = nodes.first() else {
            return Value::Null;
        };
        let is_container = dom::query_selector(first, "img").is_some();
        let images = if is_container {
            gallery_images(
                std::slice::from_ref(first),
                &FULL_SIZE_IMAGE_SELECTORS[..PREVIEW_FULL_SIZE_SELECTORS],
            )
        } else {
            nodes.iter().filter(|n| dom::is_tag(n, "img")).copied().collect()
        };

        let mut urls = self.image_urls(&images, false);
        if urls.len() > 1 || is_container {
            Value::Array(urls.into_iter().map(Value::String).collect())
        } else {
            urls.pop().map_or(Value::Null, Value::String)
        }
    }

    /// Distinct, non-thumbnail image URLs in document order.
    fn image_urls(&self, images: &[NodeRef], allow_href: bool) -> Vec<String> {
        let base = self.base();
        let mut urls: Vec<String> = Vec::new();
        for img in images {
            let raw = image_source(img).or_else(|| {
                allow_href
                    .then(|| dom::non_empty_attribute(img, "href"))
                    .flatten()
                    .filter(|h| is_usable_image_url(h))
            });
            let Some(raw) = raw else { continue };
            if THUMBNAIL_PATH.is_match(&raw) {
                continue;
            }
            let url = resolve(&raw, base.as_ref());
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }

    /// Typed value of one node, `null` when the kind has nothing to read.
    #[must_use]
    pub fn value_of(&self, node: &NodeRef, kind: ValueKind, exclude_words: &str) -> Value {
        let base = self.base();
        let text = match kind {
            ValueKind::Text => Some(apply_exclude_words(&dom::extract_text(node), exclude_words)),
            ValueKind::InnerText => Some(apply_exclude_words(&dom::inner_text(node), exclude_words)),
            ValueKind::Html => Some(dom::inner_html(node).trim().to_string()),
            ValueKind::Src => image_source(node).map(|s| resolve(&s, base.as_ref())),
            ValueKind::Href => dom::non_empty_attribute(node, "href").map(|h| resolve(&h, base.as_ref())),
            ValueKind::Alt | ValueKind::Title | ValueKind::DataId | ValueKind::DataPhone => kind
                .attribute()
                .and_then(|name| dom::non_empty_attribute(node, name)),
            ValueKind::Container => {
                return container_values(node).map_or(Value::Null, Value::Object);
            }
            ValueKind::Coordinates => map::retarget(node)
                .map(|target| map::frame_text(&target))
                .or_else(|| map::coordinates(node).map(|c| c.to_string()))
                .filter(|t| !t.is_empty()),
        };
        text.map_or(Value::Null, Value::String)
    }
}

fn is_usable_image_url(src: &str) -> bool {
    !src.starts_with("data:") && !src.starts_with("blob:") && !src.contains(".svg")
}

/// First non-empty image source attribute, skipping inline and vector images.
#[must_use]
pub fn image_source(node: &NodeRef) -> Option<String> {
    IMAGE_SOURCE_ATTRIBUTES
        .iter()
        .find_map(|attr| dom::non_empty_attribute(node, attr))
        .filter(|src| is_usable_image_url(src))
}

fn is_thumbnail(img: &NodeRef) -> bool {
    let src = dom::non_empty_attribute(img, "src")
        .or_else(|| dom::non_empty_attribute(img, "data-src"))
        .unwrap_or_default();
    THUMBNAIL_PATH.is_match(&src)
        || dom::closest(img, THUMBNAIL_CONTAINER_SELECTOR).is_some()
        || (dom::closest(img, ".slick-slide").is_some() && dom::closest(img, ".swiper-slide").is_none())
}

/// Images inside `nodes`, full-size slides first.
///
/// Image nodes are kept as they are. For containers, the first of
/// `full_size` selectors that finds anything wins; otherwise every image
/// that is not a thumbnail is taken.
#[must_use]
pub fn gallery_images<'a>(nodes: &[NodeRef<'a>], full_size: &[&str]) -> Vec<NodeRef<'a>> {
    let mut images = Vec::new();
    for node in nodes {
        if dom::is_tag(node, "img") {
            images.push(*node);
            continue;
        }
        let slides: Vec<NodeRef> = dom::query_selector_all(node, &full_size.join(", "))
            .into_iter()
            .filter(|img| dom::closest(img, THUMBNAIL_CONTAINER_SELECTOR).is_none())
            .collect();
        if slides.is_empty() {
            images.extend(
                dom::query_selector_all(node, "img")
                    .into_iter()
                    .filter(|img| !is_thumbnail(img)),
            );
        } else {
            images.extend(slides);
        }
    }
    images
}

/// `{itemprop: text}` for every `strong[itemprop]` inside `node`.
#[must_use]
pub fn container_values(node: &NodeRef) -> Option<Map<String, Value>> {
    let mut out = Map::new();
    for strong in dom::query_selector_all(node, "strong[itemprop]") {
        let Some(prop) = dom::non_empty_attribute(&strong, "itemprop") else {
            continue;
        };
        let text = dom::extract_text(&strong);
        if !text.is_empty() {
            out.insert(prop, Value::String(text));
        }
    }
    (!out.is_empty()).then_some(out)
}

/// Runs [`Extractor::scrape`] with a fresh verifier over `doc`.
#[must_use]
pub fn scrape(doc: &dom::Document, fields: &[Field], options: &Options) -> Map<String, Value> {
    Extractor::new(Verifier::new(doc), options).scrape(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::identity::ElementReference;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const GALLERY: &str = r#"<html><body>
        <div class="re__media-preview">
            <img src="https://cdn.x/resize/1275x717/1.jpg">
            <img src="https://cdn.x/resize/200x200/1.jpg">
            <img data-src="https://cdn.x/resize/1275x717/2.jpg" src="data:image/gif;base64,AA">
            <img src="https://cdn.x/resize/200x200/2.jpg">
            <img src="https://cdn.x/resize/1275x717/1.jpg">
        </div>
        <p class="area">Diện tích: 133,17 m2</p>
        <div class="specs">
            <strong itemprop="bedrooms">3</strong>
            <strong itemprop="floors">2</strong>
            <strong>no prop</strong>
        </div>
        <span class="tag">a</span><span class="tag">b</span>
    </body></html>"#;

    fn extractor<'a, 'o>(doc: &'a Document, options: &'o Options) -> Extractor<'a, 'o> {
        Extractor::new(Verifier::new(doc), options)
    }

    #[test]
    fn test_gallery_drops_thumbnails_and_duplicates() {
        let doc = dom::parse(GALLERY);
        let options = Options::default();
        let mut field = Field::new("Images", Selector::path(".re__media-preview"));
        field.value_kind = ValueKind::Src;
        assert_eq!(
            extractor(&doc, &options).scrape_field(&field),
            json!([
                "https://cdn.x/resize/1275x717/1.jpg",
                "https://cdn.x/resize/1275x717/2.jpg"
            ])
        );
    }

    #[test]
    fn test_text_applies_exclude_words() {
        let doc = dom::parse(GALLERY);
        let options = Options::default();
        let mut field = Field::new("Area", Selector::path("p.area"));
        field.exclude_words = "Diện tích:".to_string();
        assert_eq!(extractor(&doc, &options).scrape_field(&field), json!("133,17 m2"));
    }

    #[test]
    fn test_multiple_matches_become_array() {
        let doc = dom::parse(GALLERY);
        let options = Options::default();
        let field = Field::new("Tags", Selector::path("span.tag"));
        assert_eq!(extractor(&doc, &options).scrape_field(&field), json!(["a", "b"]));
    }

    #[test]
    fn test_reference_narrows_matches() {
        let doc = dom::parse(GALLERY);
        let options = Options::default();
        let mut field = Field::new("Tag", Selector::path("span.tag"));
        field.element_reference = Some(ElementReference::OrdinalIndex {
            value: 1,
            base_selector: ".tag".to_string(),
        });
        assert_eq!(extractor(&doc, &options).scrape_field(&field), json!("b"));
    }

    #[test]
    fn test_falls_back_to_full_selector() {
        let doc = dom::parse(GALLERY);
        let options = Options::default();
        let mut field = Field::new("Area", Selector::path("p.gone"));
        field.full_selector = Some("body > p:nth-of-type(1)".to_string());
        assert_eq!(
            extractor(&doc, &options).scrape_field(&field),
            json!("Diện tích: 133,17 m2")
        );
    }

    #[test]
    fn test_missing_field_is_null() {
        let doc = dom::parse(GALLERY);
        let options = Options::default();
        let fields = vec![Field::new("Nope", Selector::axis("//table"))];
        let out = scrape(&doc, &fields, &options);
        assert_eq!(out.get("Nope"), Some(&Value::Null));
    }

    #[test]
    fn test_container_preview() {
        let doc = dom::parse(GALLERY);
        let options = Options::default();
        let value = extractor(&doc, &options).preview(
            &Selector::path(".specs"),
            ValueKind::Container,
            None,
        );
        assert_eq!(value, json!({"bedrooms": "3", "floors": "2"}));
    }

    #[test]
    fn test_src_prefers_data_src_and_resolves() {
        let doc = dom::parse(r#"<img data-src="/a.jpg" src="/placeholder.gif"><img src="/icon.svg">"#);
        let options = Options {
            page_url: Some("https://x.example/p/1".to_string()),
            ..Options::default()
        };
        let ex = extractor(&doc, &options);
        let imgs = dom::select_all(&doc, "img");
        assert_eq!(ex.value_of(&imgs[0], ValueKind::Src, ""), json!("https://x.example/a.jpg"));
        assert_eq!(ex.value_of(&imgs[1], ValueKind::Src, ""), Value::Null);
    }

    #[test]
    fn test_preview_single_image_is_scalar() {
        let doc = dom::parse(r#"<div><p><img src="https://x/a.jpg" class="hero"></p></div>"#);
        let options = Options::default();
        let value = extractor(&doc, &options).preview(&Selector::path("img.hero"), ValueKind::Src, None);
        assert_eq!(value, json!("https://x/a.jpg"));
    }
}
