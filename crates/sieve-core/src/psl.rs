//! Public suffix heuristics for eTLD+1 extraction
//!
//! A compact built-in suffix heuristic: the last label, or the last two labels
//! for the common two-part registries below.
//!
//! # Examples
//!
//! ```
//! use sieve_core::psl::get_etld1;
//!
//! assert_eq!(get_etld1("sub.example.com"), "example.com");
//! assert_eq!(get_etld1("sub.example.co.uk"), "example.co.uk");
//! ```

// =============================================================================
// eTLD+1 Extraction
// =============================================================================

/// Common two-part TLDs.
const COMMON_TWO_PART_TLDS: &[&str] = &[
    "co.uk", "co.jp", "co.nz", "co.za", "co.in", "co.kr", "co.il",
    "com.au", "com.br", "com.cn", "com.mx", "com.tw", "com.hk", "com.tr", "com.ua",
    "net.au", "net.nz", "net.ua",
    "org.uk", "org.au",
    "gov.uk", "gov.au",
    "ac.uk", "ac.jp",
    "ne.jp", "or.jp",
    "msk.ru", "spb.ru",
];

/// Get the public suffix of a hostname.
pub fn get_public_suffix(host: &str) -> &str {
    let host = host.trim_end_matches('.');
    let Some(last_dot) = host.rfind('.') else {
        return host;
    };

    if let Some(prev_dot) = host[..last_dot].rfind('.') {
        let last_two = &host[prev_dot + 1..];
        if is_two_part_tld(last_two) {
            return last_two;
        }
    }

    &host[last_dot + 1..]
}

/// Get the eTLD+1 (registrable domain) for a hostname.
pub fn get_etld1(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    let host = host.trim_end_matches('.');

    let labels: Vec<&str> = host.split('.').collect();
    fallback_etld1(&labels)
}

/// Fallback eTLD+1 heuristic.
fn fallback_etld1(labels: &[&str]) -> String {
    let n = labels.len();
    if n <= 2 {
        return labels.join(".");
    }

    // Check for common two-part TLDs
    let last_two = format!("{}.{}", labels[n - 2], labels[n - 1]);
    if is_two_part_tld(&last_two) {
        return labels[n - 3..].join(".");
    }

    // Default: last 2 labels
    labels[n - 2..].join(".")
}

fn is_two_part_tld(suffix: &str) -> bool {
    COMMON_TWO_PART_TLDS.contains(&suffix)
}

/// Check if two hosts share the same eTLD+1.
pub fn is_same_site(host1: &str, host2: &str) -> bool {
    get_etld1(host1) == get_etld1(host2)
}

/// Check if a request is third-party.
pub fn is_third_party(site_host: &str, req_host: &str) -> bool {
    !is_same_site(site_host, req_host)
}

/// Get the parent domain (strip leftmost label).
pub fn get_parent_domain(host: &str) -> Option<&str> {
    match host.find('.') {
        Some(idx) if idx < host.len() - 1 => Some(&host[idx + 1..]),
        _ => None,
    }
}
