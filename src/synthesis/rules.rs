//! Site-specific override rules.
//!
//! A rule pins a hand-written selector pair to a page region whose generated
//! selectors would differ between page variants (for instance a standard and
//! a premium listing layout). Rules are data handed in through
//! [`Options::override_rules`](crate::Options), checked before the generic
//! cascade.

use crate::dom::{self, NodeRef};
use crate::selector::{Selector, SelectorLanguage};
use crate::url_utils::host_of;

/// Predicate deciding whether a clicked node falls in the rule's region.
pub type RulePredicate = fn(&NodeRef) -> bool;

/// A forced selector pair for one page region.
#[derive(Debug, Clone)]
pub struct OverrideRule {
    pub name: &'static str,
    /// Only applies when the page host contains this string.
    pub host_contains: Option<String>,
    pub applies: RulePredicate,
    pub path: String,
    pub axis: String,
}

impl OverrideRule {
    /// The rule's selector in `language`.
    #[must_use]
    pub fn selector(&self, language: SelectorLanguage) -> Selector {
        match language {
            SelectorLanguage::Path => Selector::path(self.path.as_str()),
            SelectorLanguage::Axis => Selector::axis(self.axis.as_str()),
        }
    }

    /// Whether the rule is enabled for a page at `page_url`.
    #[must_use]
    pub fn matches_host(&self, page_url: Option<&str>) -> bool {
        match &self.host_contains {
            None => true,
            Some(fragment) => page_url
                .and_then(host_of)
                .is_some_and(|host| host.contains(fragment.as_str())),
        }
    }
}

const AGENT_NAME_SELECTOR: &str = ".re__contact-name, .js__agent-contact-name";

fn is_agent_name(node: &NodeRef) -> bool {
    if dom::closest(node, ".re__agent-infor").is_none() {
        return false;
    }
    dom::matches(node, AGENT_NAME_SELECTOR) || dom::query_selector(node, AGENT_NAME_SELECTOR).is_some()
}

/// Agent contact name on batdongsan.com.vn, whose class differs between
/// normal and VIP listings.
#[must_use]
pub fn agent_contact_name() -> OverrideRule {
    OverrideRule {
        name: "agent-contact-name",
        host_contains: Some("batdongsan.com.vn".to_string()),
        applies: is_agent_name,
        path: ".re__agent-infor :is(.re__contact-name, .js__agent-contact-name)".to_string(),
        axis: r#"//div[contains(@class,"re__agent-infor")]//*[contains(@class,"re__contact-name") or contains(@class,"js__agent-contact-name")]"#.to_string(),
    }
}

/// Rules enabled out of the box.
#[must_use]
pub fn default_rules() -> Vec<OverrideRule> {
    vec![agent_contact_name()]
}

/// First rule enabled for `page_url` whose predicate accepts `node`.
#[must_use]
pub fn find_override<'r>(
    rules: &'r [OverrideRule],
    node: &NodeRef,
    page_url: Option<&str>,
) -> Option<&'r OverrideRule> {
    rules
        .iter()
        .find(|rule| rule.matches_host(page_url) && (rule.applies)(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Verifier;

    const HTML: &str = r#"<html><body>
        <div class="re__agent-infor">
            <div class="re__contact-name js__agent-contact-name">Nguyen Van A</div>
        </div>
        <div class="other"><span class="re__contact-name">Not agent</span></div>
    </body></html>"#;

    #[test]
    fn test_rule_gated_by_host() {
        let doc = dom::parse(HTML);
        let name = dom::select_all(&doc, ".re__agent-infor .re__contact-name")[0];
        let rules = default_rules();
        assert!(find_override(&rules, &name, Some("https://batdongsan.com.vn/ban-nha")).is_some());
        assert!(find_override(&rules, &name, Some("https://example.com/")).is_none());
        assert!(find_override(&rules, &name, None).is_none());
    }

    #[test]
    fn test_rule_needs_agent_region() {
        let doc = dom::parse(HTML);
        let outside = dom::select_all(&doc, ".other span")[0];
        let rules = default_rules();
        assert!(find_override(&rules, &outside, Some("https://batdongsan.com.vn/x")).is_none());
    }

    #[test]
    fn test_rule_selectors_resolve_to_agent_name() {
        let doc = dom::parse(HTML);
        let v = Verifier::new(&doc);
        let name = dom::select_all(&doc, ".re__agent-infor .re__contact-name")[0];
        let rule = agent_contact_name();
        assert!(v.matches_exactly(&rule.selector(SelectorLanguage::Axis), &name));
        assert!(v.matches_exactly(&rule.selector(SelectorLanguage::Path), &name));
    }
}
