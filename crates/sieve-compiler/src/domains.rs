//! Domain list parsing
//!
//! `example.com|~ads.example.com` (network `$domain=`) and
//! `example.com,~ads.example.com` (cosmetic and content prefixes).

use sieve_core::rule::DomainRestrictions;

use crate::error::ParseError;

/// Parse a domain list separated by `,` or `|`.
///
/// Entries are trimmed and lower-cased; `~` marks a restricted domain.
/// Empty entries are skipped, a lone `~` is an error.
pub fn parse_domains(text: &str) -> Result<DomainRestrictions, ParseError> {
    let mut domains = DomainRestrictions::default();

    for raw in text.split([',', '|']) {
        let entry = raw.trim();
        if entry.is_empty() {
            continue;
        }

        let (restricted, name) = match entry.strip_prefix('~') {
            Some(rest) => (true, rest.trim()),
            None => (false, entry),
        };

        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(ParseError::InvalidDomains(text.to_string()));
        }

        let name = name.to_lowercase();
        if restricted {
            domains.restricted.push(name);
        } else {
            domains.permitted.push(name);
        }
    }

    Ok(domains)
}
