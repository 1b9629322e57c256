//! Network rule lookup tables
//!
//! Rules are distributed over three buckets so a request only evaluates a
//! small candidate set:
//!
//! 1. **Shortcut table**: rules with a long enough shortcut, keyed by the djb2
//!    hash of one 5-byte window of that shortcut. The window chosen is the one
//!    least used so far, which keeps buckets short. A lookup slides a 5-byte
//!    window over the lower-cased URL.
//! 2. **Domain table**: rules without a usable shortcut but with permitted
//!    domains, keyed by each domain. A lookup walks the document host and its
//!    parent domains.
//! 3. **Rules without shortcuts**: everything else, always evaluated.

use std::collections::HashMap;

use crate::hash::{djb2_hash, djb2_hash_between};
use crate::network::NetworkRule;
use crate::psl::get_parent_domain;
use crate::types::RequestType;

/// Width of the URL windows hashed by the shortcut table.
pub const SHORTCUT_LENGTH: usize = 5;

// =============================================================================
// Shortcut Table
// =============================================================================

/// Shortcuts that are only a scheme prefix match almost every URL.
fn is_any_url_shortcut(shortcut: &str) -> bool {
    let len = shortcut.len();
    len < SHORTCUT_LENGTH
        || (len < 6 && shortcut.starts_with("ws:"))
        || (len < 7 && shortcut.starts_with("|ws:"))
        || (len < 9 && shortcut.starts_with("http"))
        || (len < 10 && shortcut.starts_with("|http"))
}

/// Rules keyed by the hash of one shortcut window.
#[derive(Debug, Default)]
pub struct ShortcutsLookupTable {
    table: HashMap<u32, Vec<usize>>,
    histogram: HashMap<u32, u32>,
}

impl ShortcutsLookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a rule. Returns `false` when its shortcut is unusable.
    pub fn add_rule(&mut self, index: usize, rule: &NetworkRule) -> bool {
        let Some(shortcut) = rule.shortcut.as_deref() else {
            return false;
        };
        if is_any_url_shortcut(shortcut) {
            return false;
        }

        // Pick the least used window
        let mut best: Option<(u32, u32)> = None;
        for window in shortcut.as_bytes().windows(SHORTCUT_LENGTH) {
            let hash = djb2_hash(window);
            let count = self.histogram.get(&hash).copied().unwrap_or(0);
            if best.map_or(true, |(_, min)| count < min) {
                best = Some((hash, count));
            }
        }

        let Some((hash, _)) = best else {
            return false;
        };

        *self.histogram.entry(hash).or_insert(0) += 1;
        self.table.entry(hash).or_default().push(index);
        true
    }

    /// Collect indices of rules whose shortcut occurs in `url_lower`.
    pub fn lookup_rules(&self, url_lower: &str, rules: &[NetworkRule], out: &mut Vec<usize>) {
        let bytes = url_lower.as_bytes();
        if bytes.len() < SHORTCUT_LENGTH {
            return;
        }

        for start in 0..=bytes.len() - SHORTCUT_LENGTH {
            let hash = djb2_hash_between(bytes, start, start + SHORTCUT_LENGTH);
            let Some(bucket) = self.table.get(&hash) else {
                continue;
            };
            for &index in bucket {
                let matches = rules[index]
                    .shortcut
                    .as_deref()
                    .map_or(false, |shortcut| url_lower.contains(shortcut));
                if matches {
                    out.push(index);
                }
            }
        }
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// =============================================================================
// Domain Table
// =============================================================================

/// Rules keyed by their permitted domains.
#[derive(Debug, Default)]
pub struct DomainsLookupTable {
    table: HashMap<String, Vec<usize>>,
}

impl DomainsLookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a rule under each of its permitted domains.
    ///
    /// Rules without permitted domains, or with a `name.*` entry that has no
    /// fixed key, are not indexed.
    pub fn add_rule(&mut self, index: usize, rule: &NetworkRule) -> bool {
        let permitted = &rule.domains.permitted;
        if permitted.is_empty() || permitted.iter().any(|d| d.ends_with(".*")) {
            return false;
        }

        for domain in permitted {
            self.table.entry(domain.clone()).or_default().push(index);
        }
        true
    }

    /// Collect indices of rules permitted on `host` or one of its parents.
    pub fn lookup_rules(&self, host: &str, out: &mut Vec<usize>) {
        let mut current = host;
        while !current.is_empty() {
            if let Some(bucket) = self.table.get(current) {
                out.extend_from_slice(bucket);
            }
            current = match get_parent_domain(current) {
                Some(parent) => parent,
                None => break,
            };
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// =============================================================================
// URL Filter
// =============================================================================

/// Parameters of a lookup.
#[derive(Debug, Clone, Copy)]
pub struct LookupQuery<'a> {
    pub url: &'a str,
    /// Document host, empty when unknown
    pub document_host: &'a str,
    pub third_party: bool,
    pub request_type: RequestType,
    /// When `false` generic rules are skipped (`$genericblock`)
    pub generic_allowed: bool,
}

impl<'a> LookupQuery<'a> {
    pub fn new(url: &'a str, document_host: &'a str, third_party: bool, request_type: RequestType) -> Self {
        Self {
            url,
            document_host,
            third_party,
            request_type,
            generic_allowed: true,
        }
    }

    pub fn generic_allowed(mut self, allowed: bool) -> Self {
        self.generic_allowed = allowed;
        self
    }
}

/// An indexed collection of network rules.
#[derive(Debug, Default)]
pub struct UrlFilter {
    rules: Vec<NetworkRule>,
    shortcuts: ShortcutsLookupTable,
    domains: DomainsLookupTable,
    without_shortcuts: Vec<usize>,
}

impl UrlFilter {
    pub fn new(rules: Vec<NetworkRule>) -> Self {
        let mut shortcuts = ShortcutsLookupTable::new();
        let mut domains = DomainsLookupTable::new();
        let mut without_shortcuts = Vec::new();

        for (index, rule) in rules.iter().enumerate() {
            if !shortcuts.add_rule(index, rule) && !domains.add_rule(index, rule) {
                without_shortcuts.push(index);
            }
        }

        Self {
            rules,
            shortcuts,
            domains,
            without_shortcuts,
        }
    }

    /// All rules, in insertion order.
    pub fn rules(&self) -> &[NetworkRule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&NetworkRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules evaluated on every lookup.
    pub fn without_shortcuts_count(&self) -> usize {
        self.without_shortcuts.len()
    }

    /// Best matching rule: important over specific over generic, earlier rules
    /// first among equals. For document requests document-level rules are
    /// preferred.
    pub fn find_rule(&self, query: &LookupQuery<'_>) -> Option<&NetworkRule> {
        self.find_index_by(query, |_| true).map(|index| &self.rules[index])
    }

    /// Like [`UrlFilter::find_rule`], restricted to rules accepted by `accept`.
    pub fn find_index_by<F>(&self, query: &LookupQuery<'_>, accept: F) -> Option<usize>
    where
        F: Fn(&NetworkRule) -> bool,
    {
        let candidates = self.candidates(query);
        if candidates.is_empty() {
            return None;
        }

        if query.request_type == RequestType::DOCUMENT {
            let document_level = best_of(
                candidates.iter().copied().filter(|&index| {
                    let rule = &self.rules[index];
                    rule.is_document_level && accept(rule) && is_match(rule, query)
                }),
                &self.rules,
            );
            if document_level.is_some() {
                return document_level;
            }
        }

        best_of(
            candidates.into_iter().filter(|&index| {
                let rule = &self.rules[index];
                accept(rule) && is_match(rule, query)
            }),
            &self.rules,
        )
    }

    /// Every matching rule, in insertion order.
    pub fn find_all(&self, query: &LookupQuery<'_>) -> Vec<&NetworkRule> {
        self.find_all_indices(query)
            .into_iter()
            .map(|index| &self.rules[index])
            .collect()
    }

    /// Indices of every matching rule, in insertion order.
    pub fn find_all_indices(&self, query: &LookupQuery<'_>) -> Vec<usize> {
        self.candidates(query)
            .into_iter()
            .filter(|&index| is_match(&self.rules[index], query))
            .collect()
    }

    fn candidates(&self, query: &LookupQuery<'_>) -> Vec<usize> {
        let mut candidates = Vec::new();
        if query.url.is_empty() {
            return candidates;
        }

        let url_lower = query.url.to_lowercase();
        self.shortcuts.lookup_rules(&url_lower, &self.rules, &mut candidates);
        self.domains.lookup_rules(query.document_host, &mut candidates);
        candidates.extend_from_slice(&self.without_shortcuts);

        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }
}

fn is_match(rule: &NetworkRule, query: &LookupQuery<'_>) -> bool {
    rule.is_permitted(query.document_host)
        && (query.generic_allowed || !rule.is_generic())
        && rule.is_filtered(query.url, query.third_party, query.request_type)
}

/// Precedence rank of a rule among its peers.
fn rank(rule: &NetworkRule) -> u8 {
    let mut rank = 0;
    if rule.is_important() {
        rank += 2;
    }
    if !rule.is_generic() {
        rank += 1;
    }
    rank
}

fn best_of<I>(indices: I, rules: &[NetworkRule]) -> Option<usize>
where
    I: Iterator<Item = usize>,
{
    let mut best: Option<(usize, u8)> = None;
    for index in indices {
        let r = rank(&rules[index]);
        if best.map_or(true, |(_, best_rank)| r > best_rank) {
            best = Some((index, r));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{DomainRestrictions, RuleBase};
    use crate::types::{NetworkOptions, PartyMask};
    use regex::RegexBuilder;

    fn rule(text: &str, regex: &str, shortcut: Option<&str>, permitted: &[&str]) -> NetworkRule {
        NetworkRule {
            base: RuleBase::new(text, 1, false),
            url_regex: RegexBuilder::new(regex)
                .case_insensitive(true)
                .build()
                .expect("valid regex"),
            regex_source: regex.to_string(),
            shortcut: shortcut.map(str::to_string),
            domains: DomainRestrictions {
                permitted: permitted.iter().map(|d| d.to_string()).collect(),
                restricted: Vec::new(),
            },
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
    fn test_any_url_shortcut() {
        assert!(is_any_url_shortcut("abcd"));
        assert!(is_any_url_shortcut("http:"));
        assert!(is_any_url_shortcut("|https:"));
        assert!(!is_any_url_shortcut("banner"));
        assert!(!is_any_url_shortcut("https://ads"));
    }

    #[test]
    fn builds_buckets_by_kind() {
        let filter = UrlFilter::new(vec![
            rule("banner", "banner", Some("banner"), &[]),
            rule("ad$domain=example.com", "ad", Some("ad"), &["example.com"]),
            rule("x", "x", Some("x"), &[]),
        ]);

        assert_eq!(filter.len(), 3);
        assert_eq!(filter.shortcuts.len(), 1);
        assert_eq!(filter.domains.len(), 1);
        assert_eq!(filter.without_shortcuts_count(), 1);
    }

    #[test]
    fn test_least_used_window() {
        let rules = vec![
            rule("banner", "banner", Some("banner"), &[]),
            rule("banner2", "banner", Some("banner"), &[]),
        ];
        let mut table = ShortcutsLookupTable::new();
        assert!(table.add_rule(0, &rules[0]));
        assert!(table.add_rule(1, &rules[1]));
        // "banner" has two windows; each rule takes a different one
        assert_eq!(table.len(), 2);

        let mut out = Vec::new();
        table.lookup_rules("https://example.com/banner.gif", &rules, &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn test_domain_lookup_walks_parents() {
        let rules = vec![rule("ad$domain=example.com", "ad", None, &["example.com"])];
        let mut table = DomainsLookupTable::new();
        assert!(table.add_rule(0, &rules[0]));

        let mut out = Vec::new();
        table.lookup_rules("www.example.com", &mut out);
        assert_eq!(out, vec![0]);

        out.clear();
        table.lookup_rules("example.org", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_find_rule_prefers_specific() {
        let filter = UrlFilter::new(vec![
            rule("||ads.net^", "ads\\.net", Some("ads.net"), &[]),
            rule("||ads.net^$domain=example.com", "ads\\.net", Some("ads.net"), &["example.com"]),
        ]);

        let query = LookupQuery::new("https://ads.net/x.js", "example.com", true, RequestType::SCRIPT);
        let found = filter.find_rule(&query).expect("rule found");
        assert_eq!(found.rule_text(), "||ads.net^$domain=example.com");

        let query = LookupQuery::new("https://ads.net/x.js", "other.org", true, RequestType::SCRIPT);
        let found = filter.find_rule(&query).expect("rule found");
        assert_eq!(found.rule_text(), "||ads.net^");
    }

    #[test]
    fn test_generic_suppressed() {
        let filter = UrlFilter::new(vec![rule("||ads.net^", "ads\\.net", Some("ads.net"), &[])]);
        let query = LookupQuery::new("https://ads.net/", "example.com", true, RequestType::SCRIPT)
            .generic_allowed(false);
        assert!(filter.find_rule(&query).is_none());
    }

    #[test]
    fn test_find_all_in_order() {
        let filter = UrlFilter::new(vec![
            rule("one", "track", Some("track"), &[]),
            rule("two", "tracker", Some("tracker"), &[]),
        ]);
        let query = LookupQuery::new("https://tracker.io/", "", false, RequestType::OTHER);
        let found: Vec<&str> = filter.find_all(&query).iter().map(|r| r.rule_text()).collect();
        assert_eq!(found, vec!["one", "two"]);
    }
}
