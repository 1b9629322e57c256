//! Cosmetic rule compiler: element hiding, CSS injection, JS and scriptlets
//!
//! ```text
//! example.org##.banner              hide
//! example.org#@#.banner             hide exception
//! example.org#$#.banner { top: 0 }  inject
//! example.org#?#div:has(> .ad)      extended CSS
//! example.org#%#window.x = 1;       JS
//! example.org#%#//scriptlet('log')  native scriptlet
//! example.org##+js(noeval)          uBO scriptlet
//! example.org#$#log hello           ABP snippet
//! ```

use sieve_core::cosmetic::{CssHideRule, ScriptRule};
use sieve_core::rule::{DomainRestrictions, Rule, RuleBase};
use sieve_core::scriptlet::{ScriptletDialect, ScriptletRule};

use crate::domains::parse_domains;
use crate::error::{ParseError, RuleResult};
use crate::scriptlet::parse_scriptlet;

pub const MASK_CSS_RULE: &str = "##";
pub const MASK_CSS_EXCEPTION_RULE: &str = "#@#";
pub const MASK_CSS_EXTENDED_CSS_RULE: &str = "#?#";
pub const MASK_CSS_EXCEPTION_EXTENDED_CSS_RULE: &str = "#@?#";
pub const MASK_CSS_INJECT_RULE: &str = "#$#";
pub const MASK_CSS_EXCEPTION_INJECT_RULE: &str = "#@$#";
pub const MASK_CSS_INJECT_EXTENDED_CSS_RULE: &str = "#$?#";
pub const MASK_CSS_EXCEPTION_INJECT_EXTENDED_CSS_RULE: &str = "#@$?#";
pub const MASK_SCRIPT_RULE: &str = "#%#";
pub const MASK_SCRIPT_EXCEPTION_RULE: &str = "#@%#";

/// CSS markers, longest first.
const CSS_MARKERS: &[&str] = &[
    MASK_CSS_EXCEPTION_INJECT_EXTENDED_CSS_RULE,
    MASK_CSS_INJECT_EXTENDED_CSS_RULE,
    MASK_CSS_EXCEPTION_INJECT_RULE,
    MASK_CSS_INJECT_RULE,
    MASK_CSS_EXCEPTION_EXTENDED_CSS_RULE,
    MASK_CSS_EXTENDED_CSS_RULE,
    MASK_CSS_EXCEPTION_RULE,
    MASK_CSS_RULE,
];

const SCRIPT_MARKERS: &[&str] = &[MASK_SCRIPT_EXCEPTION_RULE, MASK_SCRIPT_RULE];

const NATIVE_SCRIPTLET_PREFIX: &str = "//scriptlet";
const UBO_SCRIPTLET_PREFIXES: &[&str] = &["+js(", "script:inject("];

pub const SUPPORTED_PSEUDO_CLASSES: &[&str] = &[
    ":active", ":checked", ":contains", ":disabled", ":empty", ":enabled", ":first-child",
    ":first-of-type", ":focus", ":has", ":has-text", ":hover", ":if", ":if-not", ":in-range",
    ":invalid", ":lang", ":last-child", ":last-of-type", ":link", ":matches-css",
    ":matches-css-before", ":matches-css-after", ":not", ":nth-child", ":nth-last-child",
    ":nth-last-of-type", ":nth-of-type", ":only-child", ":only-of-type", ":optional",
    ":out-of-range", ":properties", ":read-only", ":read-write", ":required", ":root", ":target",
    ":valid", ":visited", ":-abp-has", ":-abp-contains", ":-abp-properties",
];

pub const EXTENDED_CSS_MARKERS: &[&str] = &[
    "[-ext-has=", "[-ext-contains=", "[-ext-has-text=", "[-ext-matches-css=",
    "[-ext-matches-css-before=", "[-ext-matches-css-after=", ":has(", ":has-text(", ":contains(",
    ":matches-css(", ":matches-css-before(", ":matches-css-after(", ":-abp-has(",
    ":-abp-contains(", ":if(", ":if-not(", ":properties(", ":-abp-properties(",
];

const PSEUDO_CLASS_STYLE: &str = ":style";
const PSEUDO_NAME_END: &[char] = &[' ', '\t', '>', '(', '[', '.', '#', ':', '+', '~', '"', '\''];

/// Find the first marker in `text`, scanning `#` positions left to right.
fn find_marker(text: &str, markers: &[&'static str]) -> Option<(usize, &'static str)> {
    text.match_indices('#').find_map(|(index, _)| {
        markers
            .iter()
            .find(|marker| text[index..].starts_with(**marker))
            .map(|marker| (index, *marker))
    })
}

/// Rule text is a JS or native scriptlet rule.
pub fn is_script_rule(text: &str) -> bool {
    find_marker(text, SCRIPT_MARKERS).is_some()
}

/// Rule text is a CSS, uBO scriptlet or ABP snippet rule.
pub fn is_css_rule(text: &str) -> bool {
    find_marker(text, CSS_MARKERS).is_some()
}

fn parse_prefix_domains(prefix: &str) -> Result<DomainRestrictions, ParseError> {
    if prefix.is_empty() {
        Ok(DomainRestrictions::default())
    } else {
        parse_domains(prefix)
    }
}

// =============================================================================
// Pseudo Classes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct PseudoClass<'a> {
    name: &'a str,
    start: usize,
}

/// First pseudo class outside attribute selectors, if any.
///
/// An escaped colon or a one-character name (pseudo elements) means none.
fn parse_pseudo_class(selector: &str) -> Option<PseudoClass<'_>> {
    let bytes = selector.as_bytes();
    let mut in_brackets = false;
    let mut start = None;

    for (index, &b) in bytes.iter().enumerate() {
        match b {
            b'[' => in_brackets = true,
            b']' => in_brackets = false,
            b':' if !in_brackets => {
                if index > 0 && bytes[index - 1] == b'\\' {
                    return None;
                }
                start = Some(index);
                break;
            }
            _ => {}
        }
    }

    let start = start?;
    let end = selector[start + 1..]
        .find(PSEUDO_NAME_END)
        .map_or(selector.len(), |i| start + 1 + i);
    let name = &selector[start..end];
    if name.len() <= 1 {
        return None;
    }

    Some(PseudoClass { name, start })
}

/// `selector:style(color: red)` -> `selector { color: red }`
fn convert_style_rule(pseudo: &PseudoClass<'_>, content: &str) -> Result<String, ParseError> {
    let selector = &content[..pseudo.start];
    let style_start = pseudo.start + pseudo.name.len() + 1;
    let style_end = content.len().saturating_sub(1);

    if style_end <= style_start || !content.ends_with(')') {
        return Err(ParseError::InvalidStyle(content.to_string()));
    }

    let style = &content[style_start..style_end];
    if selector.trim().is_empty() || style.trim().is_empty() {
        return Err(ParseError::InvalidStyle(content.to_string()));
    }

    Ok(format!("{selector} {{ {style} }}"))
}

/// `{` followed by at least one character and a later `}`.
fn has_style_block(content: &str) -> bool {
    match (content.find('{'), content.rfind('}')) {
        (Some(open), Some(close)) => close > open + 1,
        _ => false,
    }
}

fn is_extended_css(content: &str) -> bool {
    EXTENDED_CSS_MARKERS.iter().any(|marker| content.contains(marker))
}

// =============================================================================
// Compilation
// =============================================================================

/// Compile a `##`-family rule into a CSS or scriptlet rule.
pub fn compile_css_rule(text: &str, filter_id: u32) -> RuleResult<Rule> {
    let rule_text = text.trim();
    let (index, mask) = find_marker(rule_text, CSS_MARKERS).ok_or(ParseError::NotARule)?;

    let is_whitelist = mask.contains('@');
    let mut is_inject = mask.contains('$');
    let extended_mask = mask.contains('?');

    let domains = parse_prefix_domains(&rule_text[..index])?;
    let content = &rule_text[index + mask.len()..];
    if content.trim().is_empty() {
        return Err(ParseError::EmptyBody.into());
    }

    let base = RuleBase::new(rule_text, filter_id, is_whitelist);

    let is_ubo_scriptlet = (mask == MASK_CSS_RULE || mask == MASK_CSS_EXCEPTION_RULE)
        && UBO_SCRIPTLET_PREFIXES.iter().any(|prefix| content.starts_with(prefix));
    if is_ubo_scriptlet {
        return compile_scriptlet(base, ScriptletDialect::Ubo, rule_text, content, domains);
    }

    let is_abp_snippet = (mask == MASK_CSS_INJECT_RULE || mask == MASK_CSS_EXCEPTION_INJECT_RULE)
        && !has_style_block(content);
    if is_abp_snippet {
        return compile_scriptlet(base, ScriptletDialect::Abp, content, content, domains);
    }

    let mut selector = content.to_string();
    if !is_inject {
        if let Some(pseudo) = parse_pseudo_class(content) {
            if pseudo.name == PSEUDO_CLASS_STYLE {
                selector = convert_style_rule(&pseudo, content)?;
                is_inject = true;
            } else if !SUPPORTED_PSEUDO_CLASSES.contains(&pseudo.name) {
                return Err(ParseError::UnsupportedPseudoClass(pseudo.name.to_string()).into());
            }
        }
    }

    if is_inject && !has_style_block(&selector) {
        return Err(ParseError::MissingStyle(rule_text.to_string()).into());
    }

    Ok(Rule::CssHide(CssHideRule {
        base,
        is_extended_css: extended_mask || is_extended_css(&selector),
        selector,
        is_inject,
        domains,
    }))
}

/// Compile a `#%#` rule into a JS or native scriptlet rule.
pub fn compile_script_rule(text: &str, filter_id: u32) -> RuleResult<Rule> {
    let rule_text = text.trim();
    let (index, mask) = find_marker(rule_text, SCRIPT_MARKERS).ok_or(ParseError::NotARule)?;

    let is_whitelist = mask == MASK_SCRIPT_EXCEPTION_RULE;
    let domains = parse_prefix_domains(&rule_text[..index])?;
    let script = &rule_text[index + mask.len()..];
    if script.trim().is_empty() {
        return Err(ParseError::EmptyBody.into());
    }

    let base = RuleBase::new(rule_text, filter_id, is_whitelist);
    if script.trim_start().starts_with(NATIVE_SCRIPTLET_PREFIX) {
        return compile_scriptlet(base, ScriptletDialect::Native, script, script, domains);
    }

    Ok(Rule::Script(ScriptRule {
        base,
        script: script.to_string(),
        domains,
    }))
}

fn compile_scriptlet(
    base: RuleBase,
    dialect: ScriptletDialect,
    source: &str,
    body: &str,
    domains: DomainRestrictions,
) -> RuleResult<Rule> {
    let calls = parse_scriptlet(source, dialect)
        .ok_or_else(|| ParseError::InvalidScriptlet(base.rule_text.clone()))?;

    Ok(Rule::Scriptlet(ScriptletRule {
        base,
        calls,
        dialect,
        body: body.trim().to_string(),
        domains,
    }))
}
