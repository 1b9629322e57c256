//! Content (HTML filtering) rules
//!
//! `example.org$$div[tag-content="banner"][max-length="500"]` removes `div`
//! elements from the raw HTML of pages on `example.org` before they are parsed
//! by the browser. Documents here are `scraper::Html` trees.

use scraper::{ElementRef, Html, Selector};

use crate::rule::{DomainRestrictions, RuleBase};
use crate::wildcard::Wildcard;

/// Upper bound on the inner HTML length when no `max-length` is given.
pub const DEFAULT_MAX_LENGTH: usize = 8192;

/// Ancestor levels searched for `parent-elements` when not configured.
pub const DEFAULT_PARENT_SEARCH_LEVEL: usize = 3;

/// A compiled content rule.
#[derive(Debug, Clone)]
pub struct ContentRule {
    pub base: RuleBase,
    /// Tag name part of the selector (may be empty)
    pub tag_name: String,
    /// CSS selector text built from the tag and non-reserved attributes
    pub selector_text: String,
    /// Parsed selector
    pub selector: Selector,
    /// Everything after the `$$` / `$@$` mask; exceptions are keyed by it
    pub elements_filter: String,
    /// `tag-content`: substring the inner HTML must contain
    pub tag_content_filter: Option<String>,
    /// `wildcard`: pattern the inner HTML must match
    pub wildcard: Option<Wildcard>,
    /// `min-length` (0 disables the bound)
    pub min_length: usize,
    /// `max-length` (0 disables the bound)
    pub max_length: usize,
    /// `parent-elements`: lower-cased tag names of ancestors to remove instead
    pub parent_elements: Vec<String>,
    pub parent_search_level: usize,
    pub domains: DomainRestrictions,
}

impl ContentRule {
    #[inline]
    pub fn is_whitelist(&self) -> bool {
        self.base.is_whitelist
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        self.domains.is_generic()
    }

    /// Check the element content against the rule predicates.
    pub fn is_filtered(&self, element: &ElementRef<'_>) -> bool {
        let content = element.inner_html();
        let length = content.chars().count();

        if self.max_length > 0 && length > self.max_length {
            return false;
        }

        if self.min_length > 0 && length < self.min_length {
            return false;
        }

        if self.tag_content_filter.is_none() && self.wildcard.is_none() {
            return true;
        }

        if content.is_empty() {
            return false;
        }

        if let Some(filter) = &self.tag_content_filter {
            if !content.contains(filter.as_str()) {
                return false;
            }
        }

        if let Some(wildcard) = &self.wildcard {
            if !wildcard.matches(&content) {
                return false;
            }
        }

        true
    }

    /// Elements of `doc` this rule removes.
    ///
    /// With `parent_elements` set the nearest matching ancestor is returned in
    /// place of the element itself; elements without one are skipped.
    pub fn get_matched_elements<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        doc.select(&self.selector)
            .filter(|element| self.is_filtered(element))
            .filter_map(|element| {
                if self.parent_elements.is_empty() {
                    Some(element)
                } else {
                    self.search_for_parent_element(element)
                }
            })
            .collect()
    }

    /// Walk up at most `parent_search_level` ancestors looking for a listed tag.
    pub fn search_for_parent_element<'a>(&self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        if self.parent_elements.is_empty() {
            return None;
        }

        let mut current = element;
        for _ in 0..self.parent_search_level {
            let parent = current.parent().and_then(ElementRef::wrap)?;
            let tag = parent.value().name().to_ascii_lowercase();
            if self.parent_elements.iter().any(|p| *p == tag) {
                return Some(parent);
            }
            current = parent;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_rule(selector: &str) -> ContentRule {
        ContentRule {
            base: RuleBase::new(format!("example.org$${selector}"), 1, false),
            tag_name: "div".to_string(),
            selector_text: selector.to_string(),
            selector: Selector::parse(selector).expect("valid selector"),
            elements_filter: selector.to_string(),
            tag_content_filter: None,
            wildcard: None,
            min_length: 0,
            max_length: DEFAULT_MAX_LENGTH,
            parent_elements: Vec::new(),
            parent_search_level: DEFAULT_PARENT_SEARCH_LEVEL,
            domains: DomainRestrictions {
                permitted: vec!["example.org".to_string()],
                restricted: Vec::new(),
            },
        }
    }

    fn first_div(doc: &Html) -> ElementRef<'_> {
        let selector = Selector::parse("div").expect("valid selector");
        doc.select(&selector).next().expect("div present")
    }

    #[test]
    fn test_max_length() {
        let mut rule = content_rule("div");
        rule.max_length = 10;

        let short = Html::parse_fragment("<div>123456789</div>");
        assert!(rule.is_filtered(&first_div(&short)));

        let exact = Html::parse_fragment("<div>1234567890</div>");
        assert!(rule.is_filtered(&first_div(&exact)));

        let long = Html::parse_fragment("<div>12345678901</div>");
        assert!(!rule.is_filtered(&first_div(&long)));
    }

    #[test]
    fn test_min_length() {
        let mut rule = content_rule("div");
        rule.min_length = 5;

        let short = Html::parse_fragment("<div>1234</div>");
        assert!(!rule.is_filtered(&first_div(&short)));

        let long = Html::parse_fragment("<div>12345</div>");
        assert!(rule.is_filtered(&first_div(&long)));
    }

    #[test]
    fn test_tag_content_and_wildcard() {
        let mut rule = content_rule("div");
        rule.tag_content_filter = Some("banner".to_string());
        rule.wildcard = Some(Wildcard::new("*ad*banner*").expect("valid wildcard"));

        let doc = Html::parse_fragment("<div>An ad banner</div>");
        assert!(rule.is_filtered(&first_div(&doc)));

        let doc = Html::parse_fragment("<div>A banner</div>");
        assert!(!rule.is_filtered(&first_div(&doc)));

        let empty = Html::parse_fragment("<div></div>");
        assert!(!rule.is_filtered(&first_div(&empty)));
    }

    #[test]
    fn test_get_matched_elements() {
        let rule = content_rule(r#"div[id*="ad"]"#);
        let doc = Html::parse_document(
            r#"<html><body><div id="ad-1">x</div><div id="main">y</div><div id="top-ad">z</div></body></html>"#,
        );

        let matched = rule.get_matched_elements(&doc);
        let ids: Vec<&str> = matched.iter().filter_map(|e| e.value().attr("id")).collect();
        assert_eq!(ids, vec!["ad-1", "top-ad"]);
    }

    #[test]
    fn test_parent_elements() {
        let mut rule = content_rule("span");
        rule.parent_elements = vec!["td".to_string(), "table".to_string()];
        rule.parent_search_level = 2;

        let doc = Html::parse_document(
            "<html><body><table><tr><td><span>ad</span></td></tr></table><p><b><i><span>deep</span></i></b></p></body></html>",
        );

        let matched = rule.get_matched_elements(&doc);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].value().name(), "td");
    }
}
