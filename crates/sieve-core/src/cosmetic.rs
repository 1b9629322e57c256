//! Cosmetic rules: element hiding, CSS injection, raw JS
//!
//! Hiding rules (`##.banner`) are merged into `display: none` stylesheets by
//! [`build_css`]. Injection rules (`#$#.banner { color: red }`) are emitted as is.

use crate::rule::{DomainRestrictions, RuleBase};

/// Appended after a group of hiding selectors.
pub const ELEMHIDE_CSS_STYLE: &str = " { display: none!important; }\n";

/// Hiding selectors merged into one CSS rule.
pub const CSS_SELECTORS_PER_LINE: usize = 50;

// =============================================================================
// CSS Rules
// =============================================================================

/// A compiled element hiding or CSS injection rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssHideRule {
    pub base: RuleBase,
    /// Selector (hiding) or full `selector { style }` text (injection).
    /// Exceptions are keyed by it.
    pub selector: String,
    /// Style injection rule
    pub is_inject: bool,
    /// Needs the extended CSS engine (`:has(`, `:contains(`, `[-ext-...]`, ...)
    pub is_extended_css: bool,
    pub domains: DomainRestrictions,
}

impl CssHideRule {
    #[inline]
    pub fn is_whitelist(&self) -> bool {
        self.base.is_whitelist
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        self.domains.is_generic()
    }
}

// =============================================================================
// JS Rules
// =============================================================================

/// A raw JS injection rule (`example.org#%#window.x = 1;`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRule {
    pub base: RuleBase,
    /// Script text; exceptions are keyed by it
    pub script: String,
    pub domains: DomainRestrictions,
}

impl ScriptRule {
    #[inline]
    pub fn is_whitelist(&self) -> bool {
        self.base.is_whitelist
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        self.domains.is_generic()
    }
}

// =============================================================================
// CSS Builder
// =============================================================================

/// Build stylesheets from CSS rules.
///
/// Hiding selectors are joined in groups of [`CSS_SELECTORS_PER_LINE`] and
/// closed with [`ELEMHIDE_CSS_STYLE`]; extended CSS selectors always get their
/// own group. Injection rules follow in a separate stylesheet, one per line.
pub fn build_css<'a, I>(rules: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a CssHideRule>,
{
    let mut elemhide = String::new();
    let mut inject: Vec<&str> = Vec::new();
    let mut selectors_count = 0usize;

    for rule in rules {
        if rule.is_inject {
            inject.push(&rule.selector);
            continue;
        }

        elemhide.push_str(&rule.selector);
        selectors_count += 1;
        if selectors_count % CSS_SELECTORS_PER_LINE == 0 || rule.is_extended_css {
            elemhide.push_str(ELEMHIDE_CSS_STYLE);
        } else {
            elemhide.push_str(", ");
        }
    }

    // The last group is always closed with a style
    if let Some(open) = elemhide.strip_suffix(", ") {
        elemhide = format!("{open}{ELEMHIDE_CSS_STYLE}");
    }

    let mut styles = Vec::with_capacity(2);
    if !elemhide.is_empty() {
        styles.push(elemhide);
    }
    if !inject.is_empty() {
        styles.push(inject.join("\n"));
    }
    styles
}
