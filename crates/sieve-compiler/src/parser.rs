//! Filter list parser
//!
//! One rule per line. A line that fails to compile is dropped, recorded and
//! logged; the rest of the list still loads.

use sieve_core::rule::Rule;

use crate::content::{compile_content_rule, is_content_rule};
use crate::cosmetic::{compile_css_rule, compile_script_rule, is_css_rule, is_script_rule};
use crate::error::{RuleError, RuleResult};
use crate::network::compile_network_rule;

/// Parser settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Identifier stored on every rule of the list
    pub filter_id: u32,
}

/// A dropped line.
#[derive(Debug)]
pub struct LineError {
    /// 1-based line number
    pub line: usize,
    pub text: String,
    pub error: RuleError,
}

/// Result of parsing a whole list.
#[derive(Debug, Default)]
pub struct ParsedList {
    pub rules: Vec<Rule>,
    pub errors: Vec<LineError>,
}

impl ParsedList {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append another list (rules keep their own filter ids).
    pub fn extend(&mut self, other: ParsedList) {
        self.rules.extend(other.rules);
        self.errors.extend(other.errors);
    }
}

/// `!` comments and `[Adblock Plus 2.0]` style headers.
fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || (line.starts_with('[') && line.ends_with(']'))
}

/// Compile one line. Blank lines and comments give `Ok(None)`.
pub fn parse_rule(line: &str, filter_id: u32) -> RuleResult<Option<Rule>> {
    let line = line.trim();
    if line.is_empty() || is_comment_line(line) {
        return Ok(None);
    }

    let rule = if is_script_rule(line) {
        compile_script_rule(line, filter_id)?
    } else if is_css_rule(line) {
        compile_css_rule(line, filter_id)?
    } else if is_content_rule(line) {
        Rule::Content(compile_content_rule(line, filter_id)?)
    } else {
        Rule::Network(compile_network_rule(line, filter_id)?)
    };

    Ok(Some(rule))
}

pub fn parse_filter_list(text: &str, options: &ParseOptions) -> ParsedList {
    let mut list = ParsedList::default();

    for (index, raw_line) in text.lines().enumerate() {
        match parse_rule(raw_line, options.filter_id) {
            Ok(Some(rule)) => list.rules.push(rule),
            Ok(None) => {}
            Err(error) => {
                log::warn!(
                    "filter {}: dropping line {}: {} ({})",
                    options.filter_id,
                    index + 1,
                    raw_line.trim(),
                    error
                );
                list.errors.push(LineError {
                    line: index + 1,
                    text: raw_line.trim().to_string(),
                    error,
                });
            }
        }
    }

    log::info!(
        "filter {}: parsed {} rules, dropped {} lines",
        options.filter_id,
        list.rules.len(),
        list.errors.len()
    );

    list
}
