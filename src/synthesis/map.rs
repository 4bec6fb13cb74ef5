//! Embedded map frames: retargeting a click to the frame and reading its
//! coordinates.

use std::fmt;

use crate::dom::{self, NodeRef};
use crate::patterns::{MAP_COORDINATES, MAP_FRAME_SRC};
use crate::selector::{xpath, Selector, SelectorLanguage};

/// Ancestor levels searched for a class to scope a frame selector.
const FRAME_SCOPE_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// A click resolved onto a map frame.
#[derive(Debug, Clone, Copy)]
pub struct MapTarget<'a> {
    pub frame: NodeRef<'a>,
    pub coordinates: Option<LatLng>,
}

/// `center=lat,lng` or `q=lat,lng` from a map URL.
#[must_use]
pub fn coordinates_from_url(url: &str) -> Option<LatLng> {
    let caps = MAP_COORDINATES.captures(url)?;
    let lat = caps[1].parse::<f64>().ok()?;
    let lng = caps[2].parse::<f64>().ok()?;
    Some(LatLng { lat, lng })
}

fn coordinates_of(node: &NodeRef) -> Option<LatLng> {
    let src = dom::non_empty_attribute(node, "src").or_else(|| dom::non_empty_attribute(node, "data-src"));
    if let Some(found) = src.as_deref().and_then(coordinates_from_url) {
        return Some(found);
    }
    let lat = dom::non_empty_attribute(node, "data-lat")?.parse::<f64>().ok()?;
    let lng = dom::non_empty_attribute(node, "data-lng")?.parse::<f64>().ok()?;
    Some(LatLng { lat, lng })
}

/// Coordinates on `node` or the nearest ancestor below `body` that carries them.
#[must_use]
pub fn coordinates(node: &NodeRef) -> Option<LatLng> {
    std::iter::once(*node)
        .chain(dom::ancestor_elements(node))
        .take_while(|el| !dom::is_tag(el, "body"))
        .find_map(|el| coordinates_of(&el))
}

/// An `iframe` that embeds a map.
#[must_use]
pub fn is_map_frame(node: &NodeRef) -> bool {
    if !dom::is_tag(node, "iframe") {
        return false;
    }
    coordinates(node).is_some()
        || dom::get_attribute(node, "src").is_some_and(|src| MAP_FRAME_SRC.is_match(&src))
}

/// Resolves a click on or around a map frame onto the frame itself.
#[must_use]
pub fn retarget<'a>(node: &NodeRef<'a>) -> Option<MapTarget<'a>> {
    let frame = if dom::is_tag(node, "iframe") {
        *node
    } else {
        dom::query_selector(node, "iframe")?
    };
    is_map_frame(&frame).then(|| MapTarget {
        frame,
        coordinates: coordinates(&frame),
    })
}

/// Frame selector scoped by the nearest classed ancestor, e.g. `.map-box iframe`.
#[must_use]
pub fn frame_selector(frame: &NodeRef, language: SelectorLanguage) -> Option<Selector> {
    let (scope, class) = dom::ancestor_elements(frame)
        .take_while(|el| !dom::is_tag(el, "body"))
        .take(FRAME_SCOPE_DEPTH)
        .find_map(|el| {
            dom::meaningful_classes(&el, 2)
                .into_iter()
                .next()
                .map(|c| (el, c))
        })?;

    Some(match language {
        SelectorLanguage::Path => Selector::path(format!(
            "{} iframe",
            crate::selector::css::class(&class)
        )),
        SelectorLanguage::Axis => Selector::axis(format!(
            "//{}[contains(@class,{})]//iframe",
            dom::tag_name(&scope),
            xpath::literal(&class)
        )),
    })
}

/// Text recorded for a picked frame: its coordinates, else its source URL.
#[must_use]
pub fn frame_text(target: &MapTarget) -> String {
    if let Some(coords) = target.coordinates {
        return coords.to_string();
    }
    dom::non_empty_attribute(&target.frame, "data-src")
        .or_else(|| dom::non_empty_attribute(&target.frame, "src"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Verifier;

    const HTML: &str = r#"<html><body>
        <section class="re__pr-map">
            <div class="map-inner">
                <iframe data-src="https://www.google.com/maps/embed/v1/place?q=10.7769,106.7009&key=k"></iframe>
            </div>
        </section>
        <div data-lat="21.02" data-lng="105.84"><span class="pin">here</span></div>
    </body></html>"#;

    #[test]
    fn test_retarget_from_container() {
        let doc = dom::parse(HTML);
        let section = dom::select_all(&doc, "section")[0];
        let target = retarget(&section).unwrap();
        assert!(dom::is_tag(&target.frame, "iframe"));
        assert_eq!(frame_text(&target), "10.7769,106.7009");
    }

    #[test]
    fn test_coordinates_from_ancestor_data_attributes() {
        let doc = dom::parse(HTML);
        let pin = dom::select_all(&doc, ".pin")[0];
        assert_eq!(
            coordinates(&pin),
            Some(LatLng {
                lat: 21.02,
                lng: 105.84
            })
        );
    }

    #[test]
    fn test_frame_selector_uses_nearest_class() {
        let doc = dom::parse(HTML);
        let frame = dom::select_all(&doc, "iframe")[0];
        let v = Verifier::new(&doc);

        let path = frame_selector(&frame, SelectorLanguage::Path).unwrap();
        assert_eq!(path, Selector::path(".map-inner iframe"));
        assert!(v.matches_exactly(&path, &frame));

        let axis = frame_selector(&frame, SelectorLanguage::Axis).unwrap();
        assert_eq!(
            axis,
            Selector::axis(r#"//div[contains(@class,"map-inner")]//iframe"#)
        );
        assert!(v.matches_exactly(&axis, &frame));
    }

    #[test]
    fn test_non_map_frame_is_ignored() {
        let doc = dom::parse(r#"<div><iframe src="https://video.example/embed/1"></iframe></div>"#);
        let div = dom::select_all(&doc, "div")[0];
        assert!(retarget(&div).is_none());
    }

    #[test]
    fn test_coordinates_from_encoded_url() {
        assert_eq!(
            coordinates_from_url("https://maps.google.com/?center=-33.86%2C151.2"),
            Some(LatLng {
                lat: -33.86,
                lng: 151.2
            })
        );
    }
}
