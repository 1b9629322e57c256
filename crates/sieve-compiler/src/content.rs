//! Content rule compiler
//!
//! `example.org$$div[tag-content="banner"][id="ad"][max-length="500"]`

use scraper::Selector;

use sieve_core::content::{ContentRule, DEFAULT_MAX_LENGTH, DEFAULT_PARENT_SEARCH_LEVEL};
use sieve_core::rule::{DomainRestrictions, RuleBase};
use sieve_core::wildcard::Wildcard;

use crate::domains::parse_domains;
use crate::error::{CompileError, ParseError, RuleResult};

pub const MASK_CONTENT_RULE: &str = "$$";
pub const MASK_CONTENT_EXCEPTION_RULE: &str = "$@$";

const ATTRIBUTE_START_MARK: char = '[';
const ATTRIBUTE_END_MARK: char = ']';
const QUOTE: char = '"';

const TAG_CONTENT: &str = "tag-content";
const WILDCARD: &str = "wildcard";
const MAX_LENGTH: &str = "max-length";
const MIN_LENGTH: &str = "min-length";
const PARENT_ELEMENTS: &str = "parent-elements";
const PARENT_SEARCH_LEVEL: &str = "parent-search-level";

/// Rule text is a content rule.
pub fn is_content_rule(text: &str) -> bool {
    text.contains(MASK_CONTENT_RULE) || text.contains(MASK_CONTENT_EXCEPTION_RULE)
}

/// Find the closing quote of a value starting at `start`; `""` is an escaped quote.
fn find_closing_quote(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = start;
    loop {
        let index = pos + text.get(pos..)?.find(QUOTE)?;
        if bytes.get(index + 1) == Some(&(QUOTE as u8)) {
            pos = index + 2;
            continue;
        }
        return Some(index);
    }
}

fn parse_integer(name: &str, value: &str) -> Result<usize, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidInteger {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Compile one content rule.
pub fn compile_content_rule(text: &str, filter_id: u32) -> RuleResult<ContentRule> {
    let rule_text = text.trim();

    let (mask_index, mask, is_whitelist) = match rule_text.find(MASK_CONTENT_EXCEPTION_RULE) {
        Some(index) => (index, MASK_CONTENT_EXCEPTION_RULE, true),
        None => match rule_text.find(MASK_CONTENT_RULE) {
            Some(index) => (index, MASK_CONTENT_RULE, false),
            None => return Err(ParseError::NotARule.into()),
        },
    };

    let elements_filter = &rule_text[mask_index + mask.len()..];
    let domains = if mask_index > 0 {
        parse_domains(&rule_text[..mask_index])?
    } else {
        DomainRestrictions::default()
    };

    if !is_whitelist && domains.is_generic() {
        return Err(ParseError::ContentRuleWithoutDomain.into());
    }

    let attributes_start = elements_filter.find(ATTRIBUTE_START_MARK);
    let tag_name = match attributes_start {
        Some(index) => &elements_filter[..index],
        None => elements_filter,
    }
    .trim()
    .to_string();

    let mut selector_text = tag_name.clone();
    let mut tag_content_filter = None;
    let mut wildcard = None;
    let mut max_length = DEFAULT_MAX_LENGTH;
    let mut min_length = 0;
    let mut parent_elements = Vec::new();
    let mut parent_search_level = DEFAULT_PARENT_SEARCH_LEVEL;

    let mut cursor = attributes_start;
    while let Some(start) = cursor {
        let Some(equality) = elements_filter[start + 1..].find('=').map(|i| start + 1 + i) else {
            break;
        };
        let Some(quote_start) = elements_filter[equality + 1..].find(QUOTE).map(|i| equality + 1 + i) else {
            break;
        };
        let Some(quote_end) = find_closing_quote(elements_filter, quote_start + 1) else {
            break;
        };

        let name = elements_filter[start + 1..equality].trim();
        let value = elements_filter[quote_start + 1..quote_end].replace("\"\"", "\"");

        match name {
            TAG_CONTENT => tag_content_filter = Some(value),
            WILDCARD => wildcard = Some(Wildcard::new(&value).map_err(CompileError::from)?),
            MAX_LENGTH => max_length = parse_integer(name, &value)?,
            MIN_LENGTH => min_length = parse_integer(name, &value)?,
            PARENT_ELEMENTS => {
                parent_elements = value
                    .split(',')
                    .map(|tag| tag.trim().to_lowercase())
                    .filter(|tag| !tag.is_empty())
                    .collect();
            }
            PARENT_SEARCH_LEVEL => parent_search_level = parse_integer(name, &value)?,
            _ => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                selector_text.push_str(&format!("[{name}*=\"{escaped}\"]"));
            }
        }

        cursor = elements_filter[quote_end + 1..]
            .find(ATTRIBUTE_END_MARK)
            .map(|i| quote_end + 1 + i)
            .and_then(|end| elements_filter[end + 1..].find(ATTRIBUTE_START_MARK).map(|i| end + 1 + i));
    }

    let selector = Selector::parse(&selector_text).map_err(|err| CompileError::Selector {
        selector: selector_text.clone(),
        message: err.to_string(),
    })?;

    Ok(ContentRule {
        base: RuleBase::new(rule_text, filter_id, is_whitelist),
        tag_name,
        selector_text,
        selector,
        elements_filter: elements_filter.to_string(),
        tag_content_filter,
        wildcard,
        min_length,
        max_length,
        parent_elements,
        parent_search_level,
        domains,
    })
}
