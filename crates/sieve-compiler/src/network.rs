//! Network rule compiler
//!
//! Turns `[@@]pattern[$options]` text into a [`NetworkRule`]: a URL regex, a
//! lower-cased shortcut literal, domain restrictions, type and party masks.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use sieve_core::network::NetworkRule;
use sieve_core::rule::{DomainRestrictions, RuleBase};
use sieve_core::types::{NetworkOptions, PartyMask, RequestType};

use crate::domains::parse_domains;
use crate::error::{ParseError, RuleResult};

/// Exception rule prefix.
pub const MASK_WHITE_LIST: &str = "@@";

/// Regex rule delimiter (`/banner\d+/`).
pub const MASK_REGEX_RULE: &str = "/";

/// Options delimiter.
pub const OPTIONS_DELIMITER: char = '$';

/// `||` anchor: scheme and any subdomain.
pub const REGEX_START_URL: &str = r"^(http|https|ws|wss)://([a-z0-9\-_.]+\.)?";

/// `^` separator: anything but a letter, a digit or one of `_-.%`, or the end.
pub const REGEX_SEPARATOR: &str = r"([^ a-zA-Z0-9.%]|$)";

/// Regex matching every URL.
pub const REGEX_ANY_SYMBOL: &str = ".*";

const ESCAPE_CHARACTER: char = '\\';
const SPECIAL_CHARACTER: &str = "...";

static RE_ROUND_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\\]\(.*[^\\]\)").unwrap());
static RE_SQUARE_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\\]\[.*[^\\]\]").unwrap());
static RE_CURLY_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\\]\{.*[^\\]\}").unwrap());
static RE_LETTER_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\\]\\[a-zA-Z]").unwrap());
static RE_REGEX_SPECIALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\\^$*+?.()|\[\]{}]").unwrap());

// =============================================================================
// Rule Text Splitting
// =============================================================================

/// Result of splitting a network rule into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleParts<'a> {
    pub is_whitelist: bool,
    /// Pattern text without the `@@` prefix and the options
    pub pattern: &'a str,
    /// Options text after the delimiter, with `\$` unescaped
    pub options: Option<String>,
}

/// Split `[@@]pattern[$options]`.
///
/// The delimiter is the last unescaped `$` that is not the final character.
/// `/regex/` patterns are not split unless they carry a `replace=` option.
pub fn split_rule_text(text: &str) -> RuleParts<'_> {
    let (is_whitelist, start) = match text.strip_prefix(MASK_WHITE_LIST) {
        Some(_) => (true, MASK_WHITE_LIST.len()),
        None => (false, 0),
    };
    let body = &text[start..];

    let is_regex_literal = body.len() > 1
        && body.starts_with(MASK_REGEX_RULE)
        && body.ends_with(MASK_REGEX_RULE)
        && !body.contains("replace=");
    if is_regex_literal {
        return RuleParts {
            is_whitelist,
            pattern: body,
            options: None,
        };
    }

    let bytes = text.as_bytes();
    let mut found_escaped = false;
    let mut index = bytes.len().saturating_sub(1);
    while index > start {
        index -= 1;
        if bytes[index] != OPTIONS_DELIMITER as u8 {
            continue;
        }
        if index > 0 && bytes[index - 1] == ESCAPE_CHARACTER as u8 {
            found_escaped = true;
            continue;
        }

        let mut options = text[index + 1..].to_string();
        if found_escaped {
            options = options.replacen("\\$", "$", 1);
        }
        return RuleParts {
            is_whitelist,
            pattern: &text[start..index],
            options: Some(options),
        };
    }

    RuleParts {
        is_whitelist,
        pattern: body,
        options: None,
    }
}

/// Split options on `,`, honouring `\,` escapes. Empty parts are dropped.
pub fn split_options(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c == ',' {
            if current.ends_with(ESCAPE_CHARACTER) {
                current.pop();
                current.push(',');
                continue;
            }
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(c);
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

// =============================================================================
// Options
// =============================================================================

/// Options of a network rule, before they are folded into a [`NetworkRule`].
#[derive(Debug, Clone)]
pub struct ParsedOptions {
    pub domains: DomainRestrictions,
    /// Empty means "every type"
    pub permitted_types: RequestType,
    pub restricted_types: RequestType,
    pub party: PartyMask,
    pub options: NetworkOptions,
    pub csp_directive: Option<String>,
    pub badfilter: bool,
}

impl Default for ParsedOptions {
    fn default() -> Self {
        Self {
            domains: DomainRestrictions::default(),
            permitted_types: RequestType::empty(),
            restricted_types: RequestType::empty(),
            party: PartyMask::empty(),
            options: NetworkOptions::empty(),
            csp_directive: None,
            badfilter: false,
        }
    }
}

impl ParsedOptions {
    fn enable(&mut self, option: NetworkOptions, name: &str, is_whitelist: bool) -> Result<(), ParseError> {
        if !is_whitelist && NetworkOptions::WHITELIST_ONLY.intersects(option) {
            return Err(ParseError::WhitelistOnlyOption(name.to_string()));
        }
        if is_whitelist && option.contains(NetworkOptions::EMPTY_RESPONSE) {
            return Err(ParseError::BlacklistOnlyOption(name.to_string()));
        }
        self.options |= option;
        Ok(())
    }

    /// Options that restrict the rule to documents are present.
    pub fn is_document_level(&self) -> bool {
        self.options.intersects(NetworkOptions::DOCUMENT_LEVEL)
    }
}

fn is_ignored_option(name: &str) -> bool {
    matches!(
        name,
        "background" | "~background" | "extension" | "~extension" | "collapse" | "~collapse" | "~document"
    )
}

/// Parse the options text of a rule.
pub fn parse_options(text: &str, is_whitelist: bool) -> Result<ParsedOptions, ParseError> {
    let mut parsed = ParsedOptions::default();

    for option in split_options(text) {
        let (raw_name, value) = match option.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (option.as_str(), None),
        };
        let name = raw_name.trim().to_ascii_lowercase();

        match name.as_str() {
            "domain" => {
                if let Some(value) = value {
                    let domains = parse_domains(value)?;
                    parsed.domains.permitted.extend(domains.permitted);
                    parsed.domains.restricted.extend(domains.restricted);
                }
            }
            "third-party" => parsed.party = PartyMask::THIRD_PARTY,
            "~third-party" => parsed.party = PartyMask::FIRST_PARTY,
            "match-case" => parsed.options |= NetworkOptions::MATCH_CASE,
            "important" => parsed.options |= NetworkOptions::IMPORTANT,
            "~important" => parsed.options.remove(NetworkOptions::IMPORTANT),
            "elemhide" => parsed.enable(NetworkOptions::ELEMHIDE, &name, is_whitelist)?,
            "generichide" => parsed.enable(NetworkOptions::GENERICHIDE, &name, is_whitelist)?,
            "jsinject" => parsed.enable(NetworkOptions::JSINJECT, &name, is_whitelist)?,
            "content" => parsed.enable(NetworkOptions::CONTENT, &name, is_whitelist)?,
            "urlblock" => parsed.enable(NetworkOptions::URLBLOCK, &name, is_whitelist)?,
            "genericblock" => parsed.enable(NetworkOptions::GENERICBLOCK, &name, is_whitelist)?,
            "document" if is_whitelist => {
                parsed.enable(NetworkOptions::DOCUMENT_WHITELIST, &name, is_whitelist)?
            }
            "popup" => {
                parsed.options |= NetworkOptions::BLOCK_POPUPS;
                parsed.permitted_types |= RequestType::POPUP;
            }
            "empty" => parsed.enable(NetworkOptions::EMPTY_RESPONSE, &name, is_whitelist)?,
            "csp" => {
                parsed.options |= NetworkOptions::CSP_RULE;
                parsed.csp_directive = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
            }
            "badfilter" => parsed.badfilter = true,
            _ if is_ignored_option(&name) => {}
            _ => {
                if let Some(request_type) = RequestType::from_option_name(&name) {
                    parsed.permitted_types |= request_type;
                } else if let Some(request_type) = name.strip_prefix('~').and_then(RequestType::from_option_name) {
                    parsed.restricted_types |= request_type;
                } else {
                    return Err(ParseError::UnknownOption(raw_name.to_string()));
                }
            }
        }
    }

    if parsed.is_document_level() {
        parsed.permitted_types = RequestType::DOCUMENT;
    }

    Ok(parsed)
}

/// Check a `$csp` directive.
///
/// Blocking rules need a directive; `report-uri` and `report-to` are never allowed.
pub fn validate_csp(directive: Option<&str>, is_whitelist: bool) -> Result<(), ParseError> {
    match directive {
        None if !is_whitelist => Err(ParseError::EmptyCspDirective),
        None => Ok(()),
        Some(directive) => {
            let lower = directive.to_ascii_lowercase();
            if lower.contains("report-uri") || lower.contains("report-to") {
                return Err(ParseError::ForbiddenCspDirective(lower));
            }
            Ok(())
        }
    }
}

/// Text of the rule a `$badfilter` rule cancels.
pub fn badfilter_target(rule_text: &str) -> String {
    rule_text
        .replacen("$badfilter,", "$", 1)
        .replacen(",badfilter", "", 1)
        .replacen("$badfilter", "", 1)
}

// =============================================================================
// Pattern Compilation
// =============================================================================

/// Convert a basic pattern to regex source.
pub fn pattern_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    if let Some(stripped) = rest.strip_prefix("||") {
        out.push_str(REGEX_START_URL);
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('|') {
        out.push('^');
        rest = stripped;
    }

    let (rest, anchored_end) = match rest.strip_suffix('|') {
        Some(stripped) => (stripped, true),
        None => (rest, false),
    };

    let mut buf = [0u8; 4];
    for c in rest.chars() {
        match c {
            '*' => out.push_str(REGEX_ANY_SYMBOL),
            '^' => out.push_str(REGEX_SEPARATOR),
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }

    if anchored_end {
        out.push('$');
    }

    out
}

/// Longest part of a basic pattern between `*`, `^` and `|`, lower-cased.
pub fn find_shortcut(pattern: &str) -> Option<String> {
    let longest = pattern
        .split(['*', '^', '|'])
        .fold("", |longest, part| if part.len() > longest.len() { part } else { longest });

    if longest.is_empty() {
        None
    } else {
        Some(longest.to_lowercase())
    }
}

/// `|` outside a character escape.
fn has_alternation(text: &str) -> bool {
    let mut escaped = false;
    for c in text.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '|' => return true,
            _ => {}
        }
    }
    false
}

/// Longest literal of a regex rule body, lower-cased.
///
/// Every string the body matches contains the result. Bodies using `?`
/// (optional atoms, lazy quantifiers, lookahead) or a top-level `|` have no
/// shortcut.
pub fn extract_regex_shortcut(source: &str) -> Option<String> {
    if source.contains('?') {
        return None;
    }

    let text = format!("{SPECIAL_CHARACTER}{source}");
    let text = RE_ROUND_GROUP.replace(&text, SPECIAL_CHARACTER);
    let text = RE_SQUARE_GROUP.replace(&text, SPECIAL_CHARACTER);
    let text = RE_CURLY_GROUP.replace(&text, SPECIAL_CHARACTER);
    let text = RE_LETTER_ESCAPE.replace(&text, SPECIAL_CHARACTER);

    if has_alternation(&text) {
        return None;
    }

    let mut longest = "";
    let mut start = 0;
    for special in RE_REGEX_SPECIALS.find_iter(&text).map(Some).chain(std::iter::once(None)) {
        let end = special.map_or(text.len(), |m| m.start());
        let mut part = &text[start..end];
        // The atom before `*` may be absent from a match
        if special.map_or(false, |m| m.as_str() == "*") {
            part = part.char_indices().last().map_or("", |(index, _)| &part[..index]);
        }
        if part.len() > longest.len() {
            longest = part;
        }
        start = special.map_or(text.len(), |m| m.end());
    }

    if longest.is_empty() {
        None
    } else {
        Some(longest.to_lowercase())
    }
}

// =============================================================================
// Rule Compilation
// =============================================================================

/// Compile one network rule.
pub fn compile_network_rule(text: &str, filter_id: u32) -> RuleResult<NetworkRule> {
    let rule_text = text.trim();
    let parts = split_rule_text(rule_text);

    let parsed = match &parts.options {
        Some(options) => parse_options(options, parts.is_whitelist)?,
        None => ParsedOptions::default(),
    };

    let pattern = parts.pattern;
    let is_regex_rule = (pattern.len() > 1 && pattern.starts_with(MASK_REGEX_RULE) && pattern.ends_with(MASK_REGEX_RULE))
        || pattern.is_empty()
        || pattern == "*";

    let (regex_source, shortcut) = if is_regex_rule {
        let body = if pattern.len() > 1 { &pattern[1..pattern.len() - 1] } else { "" };
        if body.is_empty() || body == "*" {
            (REGEX_ANY_SYMBOL.to_string(), None)
        } else {
            (body.to_string(), extract_regex_shortcut(body))
        }
    } else {
        (pattern_to_regex(pattern), find_shortcut(pattern))
    };

    if regex_source == REGEX_ANY_SYMBOL && parsed.domains.is_generic() {
        return Err(ParseError::TooWide(rule_text.to_string()).into());
    }

    if parsed.options.contains(NetworkOptions::CSP_RULE) {
        validate_csp(parsed.csp_directive.as_deref(), parts.is_whitelist)?;
    }

    let url_regex = RegexBuilder::new(&regex_source)
        .case_insensitive(!parsed.options.contains(NetworkOptions::MATCH_CASE))
        .build()?;

    let is_document_level = parsed.is_document_level();
    let badfilter = parsed.badfilter.then(|| badfilter_target(rule_text));
    let permitted_types = if parsed.permitted_types.is_empty() {
        RequestType::ALL
    } else {
        parsed.permitted_types
    };

    Ok(NetworkRule {
        base: RuleBase::new(rule_text, filter_id, parts.is_whitelist),
        url_regex,
        regex_source,
        shortcut,
        domains: parsed.domains,
        permitted_types,
        restricted_types: parsed.restricted_types,
        party: parsed.party,
        options: parsed.options,
        is_regex_rule,
        is_document_level,
        csp_directive: parsed.csp_directive,
        badfilter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;

    fn compile(text: &str) -> NetworkRule {
        compile_network_rule(text, 1).expect("rule should compile")
    }

    #[test]
    fn test_split_rule_text() {
        let parts = split_rule_text("@@||example.com^$script,third-party");
        assert!(parts.is_whitelist);
        assert_eq!(parts.pattern, "||example.com^");
        assert_eq!(parts.options.as_deref(), Some("script,third-party"));

        let parts = split_rule_text("/ads$/");
        assert_eq!(parts.pattern, "/ads$/");
        assert!(parts.options.is_none());

        let parts = split_rule_text("||example.com/path$");
        assert_eq!(parts.pattern, "||example.com/path$");
        assert!(parts.options.is_none());
    }

    #[test]
    fn test_split_escaped_dollar() {
        let parts = split_rule_text(r"||example.com/a\$b$script");
        assert_eq!(parts.pattern, r"||example.com/a\$b");
        assert_eq!(parts.options.as_deref(), Some("script"));
    }

    #[test]
    fn test_split_options_with_escape() {
        assert_eq!(split_options(r"csp=a\,b,script"), vec!["csp=a,b", "script"]);
        assert_eq!(split_options("script,,image"), vec!["script", "image"]);
    }

    #[test]
    fn test_pattern_to_regex() {
        assert_eq!(
            pattern_to_regex("||example.com^"),
            format!(r"{REGEX_START_URL}example\.com{REGEX_SEPARATOR}")
        );
        assert_eq!(pattern_to_regex("|http://a.b/*.js|"), r"^http://a\.b/.*\.js$");
    }

    #[test]
    fn test_find_shortcut() {
        assert_eq!(find_shortcut("||Example.com^"), Some("example.com".to_string()));
        assert_eq!(find_shortcut("/banner/*/img^"), Some("/banner/".to_string()));
        assert_eq!(find_shortcut("*"), None);
    }

    #[test]
    fn test_extract_regex_shortcut() {
        assert_eq!(extract_regex_shortcut(r"banner\d+\.gif"), Some("banne".to_string()));
        assert_eq!(extract_regex_shortcut(r"example\.org/(ads|promo)/"), Some("example".to_string()));
        assert_eq!(extract_regex_shortcut(r"ads?\.js"), None);
        assert_eq!(extract_regex_shortcut(r"ads|banner"), None);
        assert_eq!(extract_regex_shortcut(r"ads\|banner"), Some("banner".to_string()));
        assert_eq!(extract_regex_shortcut(r"bannerx*\.gif"), Some("banner".to_string()));
    }

    #[test]
    fn test_regex_alternation_matches_every_branch() {
        let rule = compile("/ads|banner/");
        assert!(rule.shortcut.is_none());
        assert!(rule.is_filtered("http://x.com/ads.js", false, RequestType::SCRIPT));
        assert!(rule.is_filtered("http://x.com/banner.gif", false, RequestType::IMAGE));
        assert!(!rule.is_filtered("http://x.com/app.js", false, RequestType::SCRIPT));
    }

    #[test]
    fn test_domain_round_trip() {
        let rule = compile("||example.org^$domain=a.com|~b.com");
        assert_eq!(rule.domains.permitted, vec!["a.com".to_string()]);
        assert_eq!(rule.domains.restricted, vec!["b.com".to_string()]);
        assert!(!rule.is_generic());
    }

    #[test]
    fn test_restricted_only_is_generic() {
        let rule = compile("||example.org^$domain=~a.com|~b.com");
        assert!(rule.is_generic());
        assert!(!rule.is_permitted("a.com"));
        assert!(rule.is_permitted("c.com"));
    }

    #[test]
    fn test_content_type_modifiers() {
        let rule = compile("||example.org^$script,image");
        assert!(rule.is_filtered("http://example.org/a.js", false, RequestType::SCRIPT));
        assert!(rule.is_filtered("http://example.org/a.png", false, RequestType::IMAGE));
        assert!(!rule.is_filtered("http://example.org/a", false, RequestType::XMLHTTPREQUEST));

        let rule = compile("||example.org^$~script,~image");
        assert!(!rule.is_filtered("http://example.org/a.js", false, RequestType::SCRIPT));
        assert!(!rule.is_filtered("http://example.org/a.png", false, RequestType::IMAGE));
        assert!(rule.is_filtered("http://example.org/a", false, RequestType::XMLHTTPREQUEST));
        assert!(rule.is_filtered("http://example.org/a", false, RequestType::DOCUMENT));
    }

    #[test]
    fn test_popup_rule_end_to_end() {
        let rule = compile("||test.ru/^$domain=~nigma.ru|google.com,third-party,match-case,popup");
        assert!(rule.is_filtered("http://test.ru/", true, RequestType::POPUP));
        assert!(!rule.is_filtered("http://test.ru/", true, RequestType::DOCUMENT));
        assert!(!rule.is_permitted("nigma.ru"));
        assert!(rule.is_permitted("google.com"));
        assert!(rule.is_match_case());
        assert!(rule.is_option_enabled(NetworkOptions::BLOCK_POPUPS));
        assert!(!rule.is_document_level);
    }

    #[test]
    fn test_match_case() {
        let rule = compile("/BannerAd.gif$match-case");
        assert!(rule.is_filtered("http://example.com/BannerAd.gif", false, RequestType::IMAGE));
        assert!(!rule.is_filtered("http://example.com/bannerad.gif", false, RequestType::IMAGE));

        let rule = compile("/BannerAd.gif");
        assert!(rule.is_filtered("http://example.com/bannerad.gif", false, RequestType::IMAGE));
    }

    #[test]
    fn test_third_party_options() {
        let rule = compile("||ads.com^$third-party");
        assert!(rule.is_filtered("http://ads.com/x", true, RequestType::SCRIPT));
        assert!(!rule.is_filtered("http://ads.com/x", false, RequestType::SCRIPT));

        let rule = compile("||ads.com^$~third-party");
        assert!(!rule.is_filtered("http://ads.com/x", true, RequestType::SCRIPT));
        assert!(rule.is_filtered("http://ads.com/x", false, RequestType::SCRIPT));
    }

    #[test]
    fn test_regex_rule() {
        let rule = compile(r"/banner\d+\.gif$/");
        assert!(rule.is_regex_rule);
        assert!(rule.is_filtered("http://example.com/banner12.gif", false, RequestType::IMAGE));
        assert!(!rule.is_filtered("http://example.com/banner.gif", false, RequestType::IMAGE));
    }

    #[test]
    fn test_separator_anchor() {
        let rule = compile("||example.com^");
        assert!(rule.is_filtered("https://example.com/", false, RequestType::OTHER));
        assert!(rule.is_filtered("https://sub.example.com:8080/", false, RequestType::OTHER));
        assert!(rule.is_filtered("wss://example.com", false, RequestType::WEBSOCKET));
        assert!(!rule.is_filtered("https://example.company.org/", false, RequestType::OTHER));
        assert!(!rule.is_filtered("https://notexample.com/", false, RequestType::OTHER));
    }

    #[test]
    fn test_document_level_options() {
        let rule = compile("@@||example.com^$document");
        assert!(rule.is_document_level);
        assert_eq!(rule.permitted_types, RequestType::DOCUMENT);
        assert!(rule.is_option_enabled(NetworkOptions::DOCUMENT_WHITELIST));

        let rule = compile("@@||example.com^$generichide");
        assert!(rule.is_document_level);
        assert!(rule.is_option_enabled(NetworkOptions::GENERICHIDE));

        let rule = compile("||example.com^$document");
        assert!(!rule.is_document_level);
        assert_eq!(rule.permitted_types, RequestType::DOCUMENT);
    }

    #[test]
    fn test_option_errors() {
        let err = compile_network_rule("||example.com^$elemhide", 1).expect_err("blocking elemhide");
        assert!(matches!(err, RuleError::Parse(ParseError::WhitelistOnlyOption(_))));

        let err = compile_network_rule("@@||example.com^$empty", 1).expect_err("exception empty");
        assert!(matches!(err, RuleError::Parse(ParseError::BlacklistOnlyOption(_))));

        let err = compile_network_rule("||example.com^$foo", 1).expect_err("unknown option");
        assert!(matches!(err, RuleError::Parse(ParseError::UnknownOption(_))));

        assert!(compile_network_rule("||example.com^$collapse,~document", 1).is_ok());
    }

    #[test]
    fn test_too_wide_rules() {
        let err = compile_network_rule("$script", 1).expect_err("too wide");
        assert!(matches!(err, RuleError::Parse(ParseError::TooWide(_))));

        let rule = compile("$script,domain=example.com");
        assert_eq!(rule.regex_source, REGEX_ANY_SYMBOL);
        assert!(rule.shortcut.is_none());
        assert!(rule.is_filtered("http://anything.org/a.js", false, RequestType::SCRIPT));
    }

    #[test]
    fn test_csp_rules() {
        let rule = compile("||example.org^$csp=script-src 'self'");
        assert!(rule.is_csp_rule());
        assert_eq!(rule.csp_directive.as_deref(), Some("script-src 'self'"));

        let err = compile_network_rule("||example.org^$csp", 1).expect_err("empty directive");
        assert!(matches!(err, RuleError::Parse(ParseError::EmptyCspDirective)));

        let err = compile_network_rule("||example.org^$csp=report-uri /x", 1).expect_err("forbidden");
        assert!(matches!(err, RuleError::Parse(ParseError::ForbiddenCspDirective(_))));

        let rule = compile("@@||example.org^$csp");
        assert!(rule.csp_directive.is_none());
    }

    #[test]
    fn test_badfilter_target() {
        let rule = compile("||ads.com^$badfilter");
        assert_eq!(rule.badfilter.as_deref(), Some("||ads.com^"));

        let rule = compile("||ads.com^$script,badfilter");
        assert_eq!(rule.badfilter.as_deref(), Some("||ads.com^$script"));

        let rule = compile("||ads.com^$badfilter,script");
        assert_eq!(rule.badfilter.as_deref(), Some("||ads.com^$script"));
    }

    #[test]
    fn test_important_option() {
        let rule = compile("||ads.com^$important");
        assert!(rule.is_important());

        let rule = compile("||ads.com^$important,~important");
        assert!(!rule.is_important());
    }

    #[test]
    fn test_invalid_regex_is_compile_error() {
        let err = compile_network_rule("/ads(/", 1).expect_err("bad regex");
        assert!(matches!(err, RuleError::Compile(_)));
    }
}
