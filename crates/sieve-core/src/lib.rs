//! rulesieve Core Library
//!
//! Runtime rule objects and the request matching engine. Rules are compiled
//! from filter list text by `sieve-compiler`; this crate only evaluates them.
//!
//! # Architecture
//!
//! Compiled rules are handed to a [`RequestFilter`], which sorts them into
//! indexed collections (network blocking, exceptions, CSP, CSS, JS,
//! scriptlets, content). Network rules are indexed by URL shortcut and
//! permitted domain so a request only evaluates a few candidates.
//!
//! # Modules
//!
//! - `types`: Request types, option flags, request context and match results
//! - `rule`: Shared rule fields, domain restrictions and the `Rule` enum
//! - `network`: URL blocking and exception rules
//! - `content`: HTML content filtering rules
//! - `cosmetic`: CSS hiding/injection rules, JS rules and the CSS builder
//! - `scriptlet`: Scriptlet rules and calls
//! - `wildcard`: `*` / `?` wildcard patterns
//! - `url`: Host extraction and domain matching
//! - `psl`: Public suffix heuristics for eTLD+1 extraction
//! - `hash`: djb2 hashing for the lookup tables
//! - `cache`: Bounded LRU cache
//! - `lookup`: Shortcut and domain lookup tables
//! - `matcher`: The request filter and its shared handle

pub mod cache;
pub mod content;
pub mod cosmetic;
pub mod hash;
pub mod lookup;
pub mod matcher;
pub mod network;
pub mod psl;
pub mod rule;
pub mod scriptlet;
pub mod types;
pub mod url;
pub mod wildcard;

// Re-export commonly used types
pub use content::ContentRule;
pub use cosmetic::{CssHideRule, ScriptRule};
pub use matcher::{CosmeticResult, FilterConfig, FilterStats, RequestFilter, SharedRequestFilter};
pub use network::NetworkRule;
pub use psl::{get_etld1, is_third_party};
pub use rule::{DomainRestrictions, Rule, RuleBase};
pub use scriptlet::{ScriptletCall, ScriptletDialect, ScriptletRule};
pub use types::{MatchDecision, MatchResult, NetworkOptions, PartyMask, RequestContext, RequestType};
pub use wildcard::Wildcard;
