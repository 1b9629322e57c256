//! rulesieve filter list compiler
//!
//! Parses filter list text (network, cosmetic, scriptlet and content rules)
//! into the compiled rule model of `sieve-core`.

pub mod content;
pub mod cosmetic;
pub mod domains;
pub mod error;
pub mod network;
pub mod optimizer;
pub mod parser;
pub mod scriptlet;

pub use content::compile_content_rule;
pub use cosmetic::{compile_css_rule, compile_script_rule};
pub use error::{CompileError, ParseError, RuleError};
pub use network::compile_network_rule;
pub use optimizer::{optimize_rules, OptimizeStats};
pub use parser::{parse_filter_list, parse_rule, LineError, ParseOptions, ParsedList};
pub use scriptlet::{parse_abp_snippet, parse_native_scriptlet, parse_scriptlet, parse_ubo_scriptlet};

use sieve_core::{FilterConfig, RequestFilter};

/// Parse, optimize and load lists into a request filter.
///
/// Each entry is `(filter_id, text)`.
pub fn build_request_filter<'a, I>(lists: I, config: FilterConfig) -> (RequestFilter, Vec<LineError>)
where
    I: IntoIterator<Item = (u32, &'a str)>,
{
    let mut parsed = ParsedList::default();
    for (filter_id, text) in lists {
        parsed.extend(parse_filter_list(text, &ParseOptions { filter_id }));
    }

    let ParsedList { mut rules, errors } = parsed;
    let stats = optimize_rules(&mut rules);
    log::info!(
        "optimized {} rules to {} ({} duplicates, {} badfilter rules cancelling {})",
        stats.before,
        stats.after,
        stats.deduped,
        stats.badfilter_rules,
        stats.badfiltered_rules
    );

    (RequestFilter::with_config(rules, config), errors)
}
