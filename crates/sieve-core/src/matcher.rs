//! Request Filter
//!
//! Aggregates every compiled rule of a filter configuration and answers the
//! three questions a content blocker asks:
//!
//! - should this request be blocked (`match_request`, `find_csp_rules`)?
//! - what should be injected into this page (`cosmetic_result`)?
//! - which elements should be removed from this HTML (`content_rules_for_url`,
//!   `matched_elements`)?
//!
//! A `RequestFilter` is immutable once built. Filter updates build a new one
//! and publish it through [`SharedRequestFilter`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use scraper::{ElementRef, Html};

use crate::cache::LruCache;
use crate::content::ContentRule;
use crate::cosmetic::{build_css, CssHideRule, ScriptRule};
use crate::lookup::{LookupQuery, UrlFilter};
use crate::network::NetworkRule;
use crate::rule::{DomainRestrictions, Rule};
use crate::scriptlet::{ScriptletCall, ScriptletRule};
use crate::types::{MatchDecision, MatchResult, NetworkOptions, RequestContext, RequestType};
use crate::url::extract_host;

/// Default number of memoized request decisions.
pub const DEFAULT_REQUEST_CACHE_SIZE: usize = 1000;

// =============================================================================
// Configuration & Results
// =============================================================================

/// Request filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Maximum number of memoized request decisions (0 disables the cache)
    pub request_cache_size: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            request_cache_size: DEFAULT_REQUEST_CACHE_SIZE,
        }
    }
}

/// Everything to inject into a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CosmeticResult {
    /// Hiding and injection stylesheets
    pub css: Vec<String>,
    /// Stylesheets that need the extended CSS engine
    pub extended_css: Vec<String>,
    /// Raw JS snippets
    pub scripts: Vec<String>,
    /// Scriptlet invocations
    pub scriptlets: Vec<ScriptletCall>,
}

impl CosmeticResult {
    pub fn is_empty(&self) -> bool {
        self.css.is_empty()
            && self.extended_css.is_empty()
            && self.scripts.is_empty()
            && self.scriptlets.is_empty()
    }
}

/// Rule counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub blocking: usize,
    pub exceptions: usize,
    pub csp: usize,
    pub css: usize,
    pub scripts: usize,
    pub scriptlets: usize,
    pub content: usize,
    pub badfiltered: usize,
}

// =============================================================================
// Exception Index
// =============================================================================

/// Cosmetic and content exceptions keyed by rule body.
#[derive(Debug, Default)]
struct ExceptionIndex {
    by_key: HashMap<String, Vec<DomainRestrictions>>,
}

impl ExceptionIndex {
    fn add(&mut self, key: &str, domains: &DomainRestrictions) {
        self.by_key
            .entry(key.to_string())
            .or_default()
            .push(domains.clone());
    }

    /// An exception applies when it is permitted on `host`; generic exceptions
    /// are permitted everywhere except their restricted domains.
    fn is_excepted(&self, key: &str, host: &str) -> bool {
        self.by_key
            .get(key)
            .map_or(false, |all| all.iter().any(|domains| domains.is_permitted(host)))
    }

    fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }
}

// =============================================================================
// Request Filter
// =============================================================================

/// Which collection a cached rule lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleRef {
    Blocking(usize),
    Exception(usize),
}

#[derive(Debug, Clone, Copy)]
struct CachedMatch {
    decision: MatchDecision,
    rule: Option<RuleRef>,
}

type RequestKey = (String, String, RequestType);

/// Document-level exceptions found for a document URL.
#[derive(Debug, Default, Clone, Copy)]
struct DocumentRules {
    /// First rule carrying `$urlblock` (or `$document`)
    urlblock: Option<usize>,
    /// Union of the options of every matching document-level rule
    options: NetworkOptions,
}

/// Compiled rule collections plus the request cache.
#[derive(Debug)]
pub struct RequestFilter {
    blocking: UrlFilter,
    exceptions: UrlFilter,
    csp_rules: UrlFilter,
    csp_exceptions: UrlFilter,
    css_rules: Vec<CssHideRule>,
    css_exceptions: ExceptionIndex,
    scripts: Vec<ScriptRule>,
    script_exceptions: ExceptionIndex,
    scriptlets: Vec<ScriptletRule>,
    scriptlet_exceptions: ExceptionIndex,
    content_rules: Vec<ContentRule>,
    content_exceptions: ExceptionIndex,
    badfiltered: usize,
    request_cache: Mutex<LruCache<RequestKey, CachedMatch>>,
}

impl RequestFilter {
    /// Build a filter with the default configuration.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::with_config(rules, FilterConfig::default())
    }

    /// Sort rules into their collections.
    ///
    /// `$badfilter` rules are not added; rules they cancel are dropped.
    pub fn with_config(rules: Vec<Rule>, config: FilterConfig) -> Self {
        let cancelled: HashSet<String> = rules
            .iter()
            .filter_map(|rule| match rule {
                Rule::Network(r) => r.badfilter.clone(),
                _ => None,
            })
            .collect();

        let mut blocking = Vec::new();
        let mut exceptions = Vec::new();
        let mut csp_rules = Vec::new();
        let mut csp_exceptions = Vec::new();
        let mut css_rules = Vec::new();
        let mut css_exceptions = ExceptionIndex::default();
        let mut scripts = Vec::new();
        let mut script_exceptions = ExceptionIndex::default();
        let mut scriptlets = Vec::new();
        let mut scriptlet_exceptions = ExceptionIndex::default();
        let mut content_rules = Vec::new();
        let mut content_exceptions = ExceptionIndex::default();
        let mut badfiltered = 0;

        for rule in rules {
            match rule {
                Rule::Network(r) => {
                    if r.badfilter.is_some() {
                        continue;
                    }
                    if cancelled.contains(r.rule_text()) {
                        badfiltered += 1;
                        continue;
                    }
                    match (r.is_csp_rule(), r.is_whitelist()) {
                        (true, true) => csp_exceptions.push(r),
                        (true, false) => csp_rules.push(r),
                        (false, true) => exceptions.push(r),
                        (false, false) => blocking.push(r),
                    }
                }
                Rule::CssHide(r) => {
                    if r.is_whitelist() {
                        css_exceptions.add(&r.selector, &r.domains);
                    } else {
                        css_rules.push(r);
                    }
                }
                Rule::Script(r) => {
                    if r.is_whitelist() {
                        script_exceptions.add(&r.script, &r.domains);
                    } else {
                        scripts.push(r);
                    }
                }
                Rule::Scriptlet(r) => {
                    if r.is_whitelist() {
                        scriptlet_exceptions.add(&r.body, &r.domains);
                    } else {
                        scriptlets.push(r);
                    }
                }
                Rule::Content(r) => {
                    if r.is_whitelist() {
                        content_exceptions.add(&r.elements_filter, &r.domains);
                    } else {
                        content_rules.push(r);
                    }
                }
            }
        }

        let filter = Self {
            blocking: UrlFilter::new(blocking),
            exceptions: UrlFilter::new(exceptions),
            csp_rules: UrlFilter::new(csp_rules),
            csp_exceptions: UrlFilter::new(csp_exceptions),
            css_rules,
            css_exceptions,
            scripts,
            script_exceptions,
            scriptlets,
            scriptlet_exceptions,
            content_rules,
            content_exceptions,
            badfiltered,
            request_cache: Mutex::new(LruCache::new(config.request_cache_size)),
        };

        let stats = filter.stats();
        log::info!(
            "request filter built: {} blocking, {} exceptions, {} csp, {} css, {} scripts, {} scriptlets, {} content, {} badfiltered",
            stats.blocking,
            stats.exceptions,
            stats.csp,
            stats.css,
            stats.scripts,
            stats.scriptlets,
            stats.content,
            stats.badfiltered
        );

        filter
    }

    /// Rule counts per collection (exceptions included).
    pub fn stats(&self) -> FilterStats {
        FilterStats {
            blocking: self.blocking.len(),
            exceptions: self.exceptions.len(),
            csp: self.csp_rules.len() + self.csp_exceptions.len(),
            css: self.css_rules.len() + self.css_exceptions.len(),
            scripts: self.scripts.len() + self.script_exceptions.len(),
            scriptlets: self.scriptlets.len() + self.scriptlet_exceptions.len(),
            content: self.content_rules.len() + self.content_exceptions.len(),
            badfiltered: self.badfiltered,
        }
    }

    // =========================================================================
    // Network Requests
    // =========================================================================

    /// Decide a request.
    pub fn match_request(&self, ctx: &RequestContext<'_>) -> MatchResult<'_> {
        if ctx.url().is_empty() {
            return MatchResult::default();
        }

        let key: RequestKey = (
            ctx.url().to_string(),
            ctx.document_url().unwrap_or_default().to_string(),
            ctx.request_type(),
        );

        if let Ok(mut cache) = self.request_cache.lock() {
            if let Some(cached) = cache.get(&key) {
                return self.resolve(*cached);
            }
        }

        let cached = self.evaluate(ctx);

        if let Ok(mut cache) = self.request_cache.lock() {
            cache.insert(key, cached);
        }

        self.resolve(cached)
    }

    fn resolve(&self, cached: CachedMatch) -> MatchResult<'_> {
        let rule = cached.rule.and_then(|rule_ref| match rule_ref {
            RuleRef::Blocking(index) => self.blocking.rule(index),
            RuleRef::Exception(index) => self.exceptions.rule(index),
        });

        MatchResult {
            decision: cached.decision,
            rule,
        }
    }

    fn evaluate(&self, ctx: &RequestContext<'_>) -> CachedMatch {
        let document_host = ctx.document_host().unwrap_or("");
        let document = ctx
            .document_url()
            .map(|url| self.document_rules(url))
            .unwrap_or_default();

        let generic_allowed = !document.options.contains(NetworkOptions::GENERICBLOCK);

        let query = LookupQuery::new(ctx.url(), document_host, ctx.is_third_party(), ctx.request_type());

        // Document-level rules only whitelist the request itself when they
        // carry $urlblock ($document)
        let exception = self.exceptions.find_index_by(&query, |rule| {
            !rule.is_document_level || rule.is_option_enabled(NetworkOptions::URLBLOCK)
        });
        let blocking = self
            .blocking
            .find_index_by(&query.generic_allowed(generic_allowed), |_| true);

        let exception_rule = exception.and_then(|index| self.exceptions.rule(index));
        let blocking_rule = blocking.and_then(|index| self.blocking.rule(index));

        let allow = |index: usize| CachedMatch {
            decision: MatchDecision::Allow,
            rule: Some(RuleRef::Exception(index)),
        };
        let block = |index: usize| CachedMatch {
            decision: MatchDecision::Block,
            rule: Some(RuleRef::Blocking(index)),
        };

        // 1. Important exception
        if let (Some(index), Some(rule)) = (exception, exception_rule) {
            if rule.is_important() {
                log::debug!("allow {} by important exception {}", ctx.url(), rule.rule_text());
                return allow(index);
            }
        }

        // 2. The whole document is whitelisted
        if let Some(index) = document.urlblock {
            log::debug!("allow {} by document rule on {}", ctx.url(), document_host);
            return allow(index);
        }

        if let (Some(block_index), Some(block_rule)) = (blocking, blocking_rule) {
            // 3. Important block
            if block_rule.is_important() {
                log::debug!("block {} by important rule {}", ctx.url(), block_rule.rule_text());
                return block(block_index);
            }

            // 4. Specific block beats a generic exception
            if let Some(exception_rule) = exception_rule {
                if !block_rule.is_generic() && exception_rule.is_generic() {
                    log::debug!("block {} by specific rule {}", ctx.url(), block_rule.rule_text());
                    return block(block_index);
                }
            }
        }

        // 5. Any other exception
        if let (Some(index), Some(rule)) = (exception, exception_rule) {
            log::debug!("allow {} by exception {}", ctx.url(), rule.rule_text());
            return allow(index);
        }

        // 6. Block
        if let (Some(index), Some(rule)) = (blocking, blocking_rule) {
            log::debug!("block {} by rule {}", ctx.url(), rule.rule_text());
            return block(index);
        }

        CachedMatch {
            decision: MatchDecision::NoMatch,
            rule: None,
        }
    }

    /// Best document-level exception rule for a document URL.
    pub fn find_document_rule(&self, document_url: &str) -> Option<&NetworkRule> {
        let host = extract_host(document_url).unwrap_or("").to_ascii_lowercase();
        let query = LookupQuery::new(document_url, &host, false, RequestType::DOCUMENT);
        self.exceptions
            .find_index_by(&query, |rule| rule.is_document_level)
            .and_then(|index| self.exceptions.rule(index))
    }

    fn document_rules(&self, document_url: &str) -> DocumentRules {
        let host = extract_host(document_url).unwrap_or("").to_ascii_lowercase();
        let query = LookupQuery::new(document_url, &host, false, RequestType::DOCUMENT);

        let mut document = DocumentRules::default();
        for index in self.exceptions.find_all_indices(&query) {
            let Some(rule) = self.exceptions.rule(index) else {
                continue;
            };
            if !rule.is_document_level {
                continue;
            }
            document.options |= rule.options;
            if document.urlblock.is_none() && rule.is_option_enabled(NetworkOptions::URLBLOCK) {
                document.urlblock = Some(index);
            }
        }
        document
    }

    /// Options of every document-level exception matching `document_url`.
    pub fn document_options(&self, document_url: &str) -> NetworkOptions {
        self.document_rules(document_url).options
    }

    /// CSP directives to apply to a document or frame response.
    ///
    /// An `@@...$csp` exception without a directive disables every CSP rule;
    /// one with a directive cancels rules with the same directive.
    pub fn find_csp_rules(&self, ctx: &RequestContext<'_>) -> Vec<&NetworkRule> {
        if !ctx
            .request_type()
            .intersects(RequestType::DOCUMENT | RequestType::SUBDOCUMENT)
        {
            return Vec::new();
        }

        let document_host = ctx.document_host().unwrap_or("");
        let query = LookupQuery::new(ctx.url(), document_host, ctx.is_third_party(), ctx.request_type());

        let mut cancelled: HashSet<&str> = HashSet::new();
        for exception in self.csp_exceptions.find_all(&query) {
            match exception.csp_directive.as_deref() {
                None | Some("") => return Vec::new(),
                Some(directive) => {
                    cancelled.insert(directive);
                }
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        self.csp_rules
            .find_all(&query)
            .into_iter()
            .filter(|rule| {
                rule.csp_directive
                    .as_deref()
                    .map_or(false, |d| !cancelled.contains(d) && seen.insert(d))
            })
            .collect()
    }

    /// Drop all memoized decisions.
    pub fn clear_request_cache(&self) {
        if let Ok(mut cache) = self.request_cache.lock() {
            cache.clear();
        }
    }

    /// Number of memoized request decisions.
    pub fn cached_request_count(&self) -> usize {
        self.request_cache.lock().map_or(0, |cache| cache.len())
    }

    // =========================================================================
    // Cosmetics
    // =========================================================================

    /// CSS, JS and scriptlets to inject into the document at `document_url`.
    pub fn cosmetic_result(&self, document_url: &str) -> CosmeticResult {
        let mut result = CosmeticResult::default();

        let Some(host) = extract_host(document_url) else {
            return result;
        };
        let host = host.to_ascii_lowercase();
        let options = self.document_options(document_url);

        if !options.contains(NetworkOptions::ELEMHIDE) {
            let generichide = options.contains(NetworkOptions::GENERICHIDE);
            let (extended, regular): (Vec<&CssHideRule>, Vec<&CssHideRule>) = self
                .css_rules
                .iter()
                .filter(|rule| rule.domains.is_permitted(&host))
                .filter(|rule| !(generichide && rule.is_generic()))
                .filter(|rule| !self.css_exceptions.is_excepted(&rule.selector, &host))
                .partition(|rule| rule.is_extended_css);

            result.css = build_css(regular);
            result.extended_css = build_css(extended);
        }

        if !options.contains(NetworkOptions::JSINJECT) {
            result.scripts = self
                .scripts
                .iter()
                .filter(|rule| rule.domains.is_permitted(&host))
                .filter(|rule| !self.script_exceptions.is_excepted(&rule.script, &host))
                .map(|rule| rule.script.clone())
                .collect();

            result.scriptlets = self
                .scriptlets
                .iter()
                .filter(|rule| rule.domains.is_permitted(&host))
                .filter(|rule| !self.scriptlet_exceptions.is_excepted(&rule.body, &host))
                .flat_map(|rule| rule.calls.iter().cloned())
                .collect();
        }

        result
    }

    // =========================================================================
    // Content Filtering
    // =========================================================================

    /// Content rules that apply to the document at `document_url`.
    pub fn content_rules_for_url(&self, document_url: &str) -> Vec<&ContentRule> {
        let Some(host) = extract_host(document_url) else {
            return Vec::new();
        };
        let host = host.to_ascii_lowercase();

        if self.document_options(document_url).contains(NetworkOptions::CONTENT) {
            return Vec::new();
        }

        self.content_rules
            .iter()
            .filter(|rule| rule.domains.is_permitted(&host))
            .filter(|rule| !self.content_exceptions.is_excepted(&rule.elements_filter, &host))
            .collect()
    }

    /// Elements of `doc` removed by `rules`, each at most once.
    pub fn matched_elements<'a>(&self, doc: &'a Html, rules: &[&ContentRule]) -> Vec<ElementRef<'a>> {
        let mut seen = HashSet::new();
        rules
            .iter()
            .flat_map(|rule| rule.get_matched_elements(doc))
            .filter(|element| seen.insert(element.id()))
            .collect()
    }
}

// =============================================================================
// Shared Handle
// =============================================================================

/// Copy-on-write handle to the current request filter.
///
/// Readers keep the `Arc` they loaded for as long as they need it; a filter
/// update swaps in a freshly built filter without blocking them.
#[derive(Debug)]
pub struct SharedRequestFilter {
    inner: RwLock<Arc<RequestFilter>>,
}

impl SharedRequestFilter {
    pub fn new(filter: RequestFilter) -> Self {
        Self {
            inner: RwLock::new(Arc::new(filter)),
        }
    }

    /// Current filter.
    pub fn load(&self) -> Arc<RequestFilter> {
        let guard = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Publish a new filter, returning the previous one.
    pub fn swap(&self, filter: RequestFilter) -> Arc<RequestFilter> {
        let mut guard = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, Arc::new(filter))
    }
}

impl Default for SharedRequestFilter {
    fn default() -> Self {
        Self::new(RequestFilter::new(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleBase;
    use crate::scriptlet::ScriptletDialect;

    fn domains(permitted: &[&str]) -> DomainRestrictions {
        DomainRestrictions {
            permitted: permitted.iter().map(|d| d.to_string()).collect(),
            restricted: Vec::new(),
        }
    }

    fn css(selector: &str, permitted: &[&str], is_whitelist: bool) -> Rule {
        Rule::CssHide(CssHideRule {
            base: RuleBase::new(format!("##{selector}"), 1, is_whitelist),
            selector: selector.to_string(),
            is_inject: false,
            is_extended_css: false,
            domains: domains(permitted),
        })
    }

    fn scriptlet(name: &str, permitted: &[&str], is_whitelist: bool) -> Rule {
        Rule::Scriptlet(ScriptletRule {
            base: RuleBase::new(format!("##+js({name})"), 1, is_whitelist),
            calls: vec![ScriptletCall::new(format!("ubo-{name}"), Vec::new())],
            dialect: ScriptletDialect::Ubo,
            body: format!("+js({name})"),
            domains: domains(permitted),
        })
    }

    #[test]
    fn test_filter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RequestFilter>();
        assert_send_sync::<SharedRequestFilter>();
    }

    #[test]
    fn test_empty_filter_no_match() {
        let filter = RequestFilter::new(Vec::new());
        let ctx = RequestContext::new("https://example.com/ad.js", None, RequestType::SCRIPT);
        let result = filter.match_request(&ctx);
        assert_eq!(result.decision, MatchDecision::NoMatch);
        assert!(result.rule.is_none());
    }

    #[test]
    fn test_cosmetic_css_and_exceptions() {
        let filter = RequestFilter::new(vec![
            css(".ad", &[], false),
            css(".banner", &["example.com"], false),
            css(".ad", &["example.org"], true),
        ]);

        let on_com = filter.cosmetic_result("https://www.example.com/");
        assert_eq!(on_com.css, vec![".ad, .banner { display: none!important; }\n".to_string()]);

        let on_org = filter.cosmetic_result("https://example.org/");
        assert!(on_org.css.is_empty());
    }

    #[test]
    fn test_generic_css_exception_everywhere() {
        let filter = RequestFilter::new(vec![css(".ad", &["example.com"], false), css(".ad", &[], true)]);
        assert!(filter.cosmetic_result("https://example.com/").css.is_empty());
    }

    #[test]
    fn test_scriptlet_exceptions_keyed_by_body() {
        let filter = RequestFilter::new(vec![
            scriptlet("nobab", &["example.com"], false),
            scriptlet("noeval", &["example.com"], false),
            scriptlet("noeval", &["example.com"], true),
        ]);

        let result = filter.cosmetic_result("https://example.com/page");
        let names: Vec<&str> = result.scriptlets.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ubo-nobab"]);
    }

    #[test]
    fn test_shared_filter_swap() {
        let shared = SharedRequestFilter::new(RequestFilter::new(vec![css(".ad", &[], false)]));
        let before = shared.load();
        assert_eq!(before.stats().css, 1);

        let old = shared.swap(RequestFilter::new(Vec::new()));
        assert_eq!(old.stats().css, 1);
        assert_eq!(shared.load().stats().css, 0);
        // Readers keep the filter they observed
        assert_eq!(before.stats().css, 1);
    }
}
