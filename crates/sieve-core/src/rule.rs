//! Compiled rule model
//!
//! Every rule kind carries a [`RuleBase`] (original text, list id, exception
//! flag). Rules are immutable once the compiler has built them.

use crate::content::ContentRule;
use crate::cosmetic::{CssHideRule, ScriptRule};
use crate::network::NetworkRule;
use crate::scriptlet::ScriptletRule;
use crate::url::is_domain_or_subdomain_of_any;

// =============================================================================
// Shared Rule Fields
// =============================================================================

/// Fields shared by every rule kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBase {
    /// Rule text as it appeared in the list (trimmed)
    pub rule_text: String,
    /// Identifier of the list the rule came from
    pub filter_id: u32,
    /// Exception (`@@`, `#@#`, `$@$`, ...) rule
    pub is_whitelist: bool,
}

impl RuleBase {
    pub fn new(rule_text: impl Into<String>, filter_id: u32, is_whitelist: bool) -> Self {
        Self {
            rule_text: rule_text.into(),
            filter_id,
            is_whitelist,
        }
    }
}

// =============================================================================
// Domain Restrictions
// =============================================================================

/// Permitted / restricted document domains of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainRestrictions {
    /// Domains the rule applies to (lower-cased)
    pub permitted: Vec<String>,
    /// `~`-negated domains the rule never applies to (lower-cased)
    pub restricted: Vec<String>,
}

impl DomainRestrictions {
    /// True when there are no permitted domains.
    #[inline]
    pub fn is_generic(&self) -> bool {
        self.permitted.is_empty()
    }

    /// No domain restriction at all.
    pub fn is_empty(&self) -> bool {
        self.permitted.is_empty() && self.restricted.is_empty()
    }

    /// Check whether a rule with these restrictions applies on `domain`.
    pub fn is_permitted(&self, domain: &str) -> bool {
        if domain.is_empty() {
            return false;
        }

        if is_domain_or_subdomain_of_any(domain, &self.restricted) {
            return false;
        }

        if !self.permitted.is_empty() {
            return is_domain_or_subdomain_of_any(domain, &self.permitted);
        }

        true
    }
}

// =============================================================================
// Rule Enum
// =============================================================================

/// Any compiled rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Network(NetworkRule),
    Content(ContentRule),
    Scriptlet(ScriptletRule),
    CssHide(CssHideRule),
    Script(ScriptRule),
}

impl Rule {
    /// Shared base fields.
    pub fn base(&self) -> &RuleBase {
        match self {
            Rule::Network(r) => &r.base,
            Rule::Content(r) => &r.base,
            Rule::Scriptlet(r) => &r.base,
            Rule::CssHide(r) => &r.base,
            Rule::Script(r) => &r.base,
        }
    }

    /// Domain restrictions of the rule.
    pub fn domains(&self) -> &DomainRestrictions {
        match self {
            Rule::Network(r) => &r.domains,
            Rule::Content(r) => &r.domains,
            Rule::Scriptlet(r) => &r.domains,
            Rule::CssHide(r) => &r.domains,
            Rule::Script(r) => &r.domains,
        }
    }

    #[inline]
    pub fn rule_text(&self) -> &str {
        &self.base().rule_text
    }

    #[inline]
    pub fn filter_id(&self) -> u32 {
        self.base().filter_id
    }

    #[inline]
    pub fn is_whitelist(&self) -> bool {
        self.base().is_whitelist
    }

    /// A rule is generic when it has no permitted domain.
    #[inline]
    pub fn is_generic(&self) -> bool {
        self.domains().is_generic()
    }

    /// Short kind name, used in logs and CLI stats.
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Network(_) => "network",
            Rule::Content(_) => "content",
            Rule::Scriptlet(_) => "scriptlet",
            Rule::CssHide(_) => "css",
            Rule::Script(_) => "script",
        }
    }
}

impl From<NetworkRule> for Rule {
    fn from(rule: NetworkRule) -> Self {
        Rule::Network(rule)
    }
}

impl From<ContentRule> for Rule {
    fn from(rule: ContentRule) -> Self {
        Rule::Content(rule)
    }
}

impl From<ScriptletRule> for Rule {
    fn from(rule: ScriptletRule) -> Self {
        Rule::Scriptlet(rule)
    }
}

impl From<CssHideRule> for Rule {
    fn from(rule: CssHideRule) -> Self {
        Rule::CssHide(rule)
    }
}

impl From<ScriptRule> for Rule {
    fn from(rule: ScriptRule) -> Self {
        Rule::Script(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restrictions(permitted: &[&str], restricted: &[&str]) -> DomainRestrictions {
        DomainRestrictions {
            permitted: permitted.iter().map(|s| s.to_string()).collect(),
            restricted: restricted.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_generic_restrictions() {
        let d = restrictions(&[], &["example.org"]);
        assert!(d.is_generic());
        assert!(d.is_permitted("example.com"));
        assert!(!d.is_permitted("sub.example.org"));
        assert!(!d.is_permitted(""));
    }

    #[test]
    fn test_permitted_restrictions() {
        let d = restrictions(&["example.com"], &[]);
        assert!(!d.is_generic());
        assert!(d.is_permitted("example.com"));
        assert!(d.is_permitted("www.example.com"));
        assert!(!d.is_permitted("example.org"));
    }

    #[test]
    fn test_restricted_dominates_permitted() {
        let d = restrictions(&["example.com"], &["ads.example.com"]);
        assert!(d.is_permitted("www.example.com"));
        assert!(!d.is_permitted("ads.example.com"));
        assert!(!d.is_permitted("x.ads.example.com"));
    }

    #[test]
    fn test_tld_wildcard_restrictions() {
        let d = restrictions(&["google.*"], &[]);
        assert!(d.is_permitted("www.google.co.uk"));
        assert!(d.is_permitted("google.de"));
        assert!(!d.is_permitted("notgoogle.de"));
    }
}
