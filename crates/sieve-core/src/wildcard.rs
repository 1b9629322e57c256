//! Wildcard patterns
//!
//! `*` matches any run of characters (newlines included), `?` matches one
//! character. Everything else is literal. Matching is case-insensitive and
//! anchored at both ends.
//!
//! # Examples
//!
//! ```
//! use sieve_core::wildcard::Wildcard;
//!
//! let w = Wildcard::new("*ad?banner*").unwrap();
//! assert!(w.matches("top AD-BANNER here"));
//! assert_eq!(w.shortcut(), "banner");
//! ```

use regex::{Regex, RegexBuilder};

/// A compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct Wildcard {
    regex: Regex,
    shortcut: String,
}

impl Wildcard {
    /// Compile a wildcard pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&wildcard_to_regex(pattern))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            regex,
            shortcut: extract_shortcut(pattern),
        })
    }

    /// Longest literal segment of the pattern, lower-cased.
    pub fn shortcut(&self) -> &str {
        &self.shortcut
    }

    /// Source of the compiled regex.
    pub fn regex_source(&self) -> &str {
        self.regex.as_str()
    }

    /// Check the whole input against the pattern.
    pub fn matches(&self, input: &str) -> bool {
        if input.is_empty() {
            return false;
        }

        if !self.shortcut.is_empty() && !input.to_lowercase().contains(&self.shortcut) {
            return false;
        }

        self.regex.is_match(input)
    }
}

fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut literal = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(r"[\s\S]*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }

    out.push('$');
    out
}

fn extract_shortcut(pattern: &str) -> String {
    pattern
        .split(['*', '?'])
        .fold("", |longest, part| if part.len() > longest.len() { part } else { longest })
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_is_longest_segment() {
        assert_eq!(Wildcard::new("a*Banner?x").expect("valid").shortcut(), "banner");
        assert_eq!(Wildcard::new("Tracker").expect("valid").shortcut(), "tracker");
        assert_eq!(Wildcard::new("*").expect("valid").shortcut(), "");
    }

    #[test]
    fn test_matches_anchored() {
        let w = Wildcard::new("ad*").expect("valid");
        assert!(w.matches("advert"));
        assert!(w.matches("AD"));
        assert!(!w.matches("bad"));
    }

    #[test]
    fn test_question_mark_single_char() {
        let w = Wildcard::new("a?c").expect("valid");
        assert!(w.matches("abc"));
        assert!(!w.matches("ac"));
        assert!(!w.matches("abbc"));
    }

    #[test]
    fn test_star_crosses_newlines() {
        let w = Wildcard::new("first*last").expect("valid");
        assert!(w.matches("first\nmiddle\nlast"));
    }

    #[test]
    fn test_special_chars_are_literal() {
        let w = Wildcard::new("a.b(c)[d]+").expect("valid");
        assert!(w.matches("a.b(c)[d]+"));
        assert!(!w.matches("axb(c)[d]+"));
    }

    #[test]
    fn test_empty_input_never_matches() {
        assert!(!Wildcard::new("*").expect("valid").matches(""));
    }

    #[test]
    fn test_shortcut_soundness() {
        let w = Wildcard::new("*promo*Banner*").expect("valid");
        for input in ["promo-BANNER", "xpromoybannerz", "PromoBanner"] {
            assert!(w.matches(input));
            assert!(input.to_lowercase().contains(w.shortcut()));
        }
    }
}
