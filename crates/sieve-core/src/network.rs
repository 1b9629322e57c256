//! Network (URL) rules
//!
//! A compiled `[@@]pattern[$options]` rule. The compiler in `sieve-compiler`
//! builds these; matching here never fails.

use regex::Regex;

use crate::rule::{DomainRestrictions, RuleBase};
use crate::types::{NetworkOptions, PartyMask, RequestType};

/// A compiled network rule.
#[derive(Debug, Clone)]
pub struct NetworkRule {
    pub base: RuleBase,
    /// Compiled URL regex
    pub url_regex: Regex,
    /// Source the regex was compiled from
    pub regex_source: String,
    /// Lower-cased literal that every matching URL contains
    pub shortcut: Option<String>,
    pub domains: DomainRestrictions,
    /// Request types the rule applies to
    pub permitted_types: RequestType,
    /// Request types the rule never applies to
    pub restricted_types: RequestType,
    pub party: PartyMask,
    pub options: NetworkOptions,
    /// Pattern was a `/regex/` literal
    pub is_regex_rule: bool,
    /// Rule applies to documents only (`$document`, `$elemhide`, ...)
    pub is_document_level: bool,
    /// `$csp=` directive
    pub csp_directive: Option<String>,
    /// For `$badfilter` rules: text of the rule being cancelled
    pub badfilter: Option<String>,
}

impl NetworkRule {
    #[inline]
    pub fn rule_text(&self) -> &str {
        &self.base.rule_text
    }

    #[inline]
    pub fn is_whitelist(&self) -> bool {
        self.base.is_whitelist
    }

    /// No permitted domains.
    #[inline]
    pub fn is_generic(&self) -> bool {
        self.domains.is_generic()
    }

    #[inline]
    pub fn is_important(&self) -> bool {
        self.options.contains(NetworkOptions::IMPORTANT)
    }

    #[inline]
    pub fn is_match_case(&self) -> bool {
        self.options.contains(NetworkOptions::MATCH_CASE)
    }

    #[inline]
    pub fn is_csp_rule(&self) -> bool {
        self.options.contains(NetworkOptions::CSP_RULE)
    }

    #[inline]
    pub fn is_option_enabled(&self, option: NetworkOptions) -> bool {
        self.options.contains(option)
    }

    /// `$third-party`
    #[inline]
    pub fn is_third_party(&self) -> bool {
        self.party.contains(PartyMask::THIRD_PARTY)
    }

    /// Rule carries a `$third-party` or `$~third-party` condition.
    #[inline]
    pub fn is_check_third_party(&self) -> bool {
        !self.party.is_empty()
    }

    /// Check the party condition against a request.
    #[inline]
    pub fn check_party(&self, third_party: bool) -> bool {
        if self.party.is_empty() {
            return true;
        }
        if third_party {
            self.party.contains(PartyMask::THIRD_PARTY)
        } else {
            self.party.contains(PartyMask::FIRST_PARTY)
        }
    }

    /// Check the request type against the permitted and restricted masks.
    #[inline]
    pub fn check_content_type(&self, request_type: RequestType) -> bool {
        let permitted = self.permitted_types == RequestType::ALL
            || self.permitted_types.intersects(request_type);
        let restricted = self.restricted_types.intersects(request_type);
        permitted && !restricted
    }

    /// Check whether the rule applies on the given document domain.
    ///
    /// For an empty domain, generic exception rules and generic rules without
    /// a party condition still apply.
    pub fn is_permitted(&self, domain: &str) -> bool {
        if domain.is_empty()
            && self.is_generic()
            && (self.is_whitelist() || !self.is_check_third_party())
        {
            return true;
        }

        self.domains.is_permitted(domain)
    }

    /// Check a request URL against the rule.
    pub fn is_filtered(&self, url: &str, third_party: bool, request_type: RequestType) -> bool {
        if !self.check_party(third_party) {
            return false;
        }

        if let Some(shortcut) = &self.shortcut {
            if !url.to_lowercase().contains(shortcut.as_str()) {
                return false;
            }
        }

        if !self.check_content_type(request_type) {
            return false;
        }

        self.url_regex.is_match(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::RegexBuilder;

    fn rule(source: &str, shortcut: Option<&str>) -> NetworkRule {
        NetworkRule {
            base: RuleBase::new(source, 1, false),
            url_regex: RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .expect("valid regex"),
            regex_source: source.to_string(),
            shortcut: shortcut.map(str::to_string),
            domains: DomainRestrictions::default(),
            permitted_types: RequestType::ALL,
            restricted_types: RequestType::empty(),
            party: PartyMask::empty(),
            options: NetworkOptions::empty(),
            is_regex_rule: false,
            is_document_level: false,
            csp_directive: None,
            badfilter: None,
        }
    }

    #[test]
    fn test_check_content_type() {
        let mut r = rule("ads", Some("ads"));
        assert!(r.check_content_type(RequestType::XMLHTTPREQUEST));

        r.permitted_types = RequestType::SCRIPT | RequestType::IMAGE;
        assert!(r.check_content_type(RequestType::SCRIPT));
        assert!(r.check_content_type(RequestType::IMAGE));
        assert!(!r.check_content_type(RequestType::XMLHTTPREQUEST));

        r.permitted_types = RequestType::ALL;
        r.restricted_types = RequestType::SCRIPT | RequestType::IMAGE;
        assert!(!r.check_content_type(RequestType::SCRIPT));
        assert!(r.check_content_type(RequestType::XMLHTTPREQUEST));
    }

    #[test]
    fn test_check_party() {
        let mut r = rule("ads", None);
        assert!(r.check_party(true) && r.check_party(false));

        r.party = PartyMask::THIRD_PARTY;
        assert!(r.check_party(true));
        assert!(!r.check_party(false));

        r.party = PartyMask::FIRST_PARTY;
        assert!(!r.check_party(true));
        assert!(r.check_party(false));
    }

    #[test]
    fn test_is_filtered_uses_shortcut_and_regex() {
        let r = rule(r"banner\.gif", Some("banner.gif"));
        assert!(r.is_filtered("https://example.com/BANNER.gif", false, RequestType::IMAGE));
        assert!(!r.is_filtered("https://example.com/logo.gif", false, RequestType::IMAGE));
    }

    #[test]
    fn test_is_permitted_empty_domain() {
        let mut r = rule("ads", None);
        assert!(r.is_permitted(""));

        r.party = PartyMask::THIRD_PARTY;
        assert!(!r.is_permitted(""));

        r.base.is_whitelist = true;
        assert!(r.is_permitted(""));

        r.domains.permitted.push("example.com".to_string());
        assert!(!r.is_permitted(""));
        assert!(r.is_permitted("www.example.com"));
    }
}
