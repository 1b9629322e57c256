//! URL and domain helpers
//!
//! These functions avoid allocations and work directly on string slices.

use crate::psl::get_public_suffix;

// =============================================================================
// Host Extraction
// =============================================================================

/// Get the position right after the scheme separator.
///
/// Hierarchical URLs (`https://...`) return the position after `://`.
/// Non-hierarchical ones (`stun:host:3478`, `data:...`) return the position after `:`.
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let colon_pos = url.find(':');

    match url.find("//") {
        Some(pos) if colon_pos.map_or(pos == 0, |colon| pos == colon + 1) => Some(pos + 2),
        _ => colon_pos.map(|colon| colon + 1),
    }
}

/// Get the start and end positions of the hostname in a URL.
#[inline]
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = get_scheme_end(url)?;
    let bytes = url.as_bytes();

    // Skip userinfo
    let mut host_start = scheme_end;
    for i in scheme_end..bytes.len() {
        if bytes[i] == b'@' {
            host_start = i + 1;
            break;
        }
        if bytes[i] == b'/' || bytes[i] == b'?' || bytes[i] == b'#' {
            break;
        }
    }

    let mut host_end = bytes.len();
    for i in host_start..bytes.len() {
        let b = bytes[i];
        if b == b'/' || b == b'?' || b == b'#' || b == b':' {
            host_end = i;
            break;
        }
    }

    if host_end == host_start {
        return None;
    }

    Some((host_start, host_end))
}

/// Fast host extraction without allocations.
/// Returns a slice into the original URL.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    Some(&url[host_start..host_end])
}

// =============================================================================
// Domain Matching
// =============================================================================

/// Check if `domain` equals `rule_domain` or is one of its subdomains.
///
/// A rule domain ending with `.*` matches the same name under any public suffix:
/// `example.*` matches `example.com`, `www.example.co.uk`.
pub fn is_domain_or_subdomain(domain: &str, rule_domain: &str) -> bool {
    if let Some(name) = rule_domain.strip_suffix(".*") {
        return match_tld_wildcard(domain, name);
    }

    domain == rule_domain
        || (domain.len() > rule_domain.len()
            && domain.ends_with(rule_domain)
            && domain.as_bytes()[domain.len() - rule_domain.len() - 1] == b'.')
}

/// Check if `domain` matches any of `rule_domains`.
pub fn is_domain_or_subdomain_of_any<S: AsRef<str>>(domain: &str, rule_domains: &[S]) -> bool {
    rule_domains
        .iter()
        .any(|rule_domain| is_domain_or_subdomain(domain, rule_domain.as_ref()))
}

fn match_tld_wildcard(domain: &str, name: &str) -> bool {
    let suffix = get_public_suffix(domain);
    if suffix.is_empty() || suffix.len() >= domain.len() {
        return false;
    }

    // Domain with its public suffix cut off: "www.example.co.uk" -> "www.example"
    let without_suffix = &domain[..domain.len() - suffix.len() - 1];
    is_domain_or_subdomain(without_suffix, name)
}
