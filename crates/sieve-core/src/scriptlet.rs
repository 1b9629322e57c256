//! Scriptlet rules
//!
//! A scriptlet rule injects one or more named library functions with string
//! arguments. Three dialects are understood by the compiler:
//!
//! - native: `example.org#%#//scriptlet('abort-on-property-read', 'alert')`
//! - uBO: `example.org##+js(set-constant, foo, false)`
//! - ABP: `example.org#$#log hello; abort-on-property-read foo`

use crate::rule::{DomainRestrictions, RuleBase};

/// Name prefix for uBO scriptlets.
pub const UBO_PREFIX: &str = "ubo-";

/// Name prefix for ABP snippets.
pub const ABP_PREFIX: &str = "abp-";

/// Scriptlet syntax a rule was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScriptletDialect {
    Native,
    Ubo,
    Abp,
}

impl ScriptletDialect {
    /// Prefix added to scriptlet names of this dialect.
    pub fn name_prefix(self) -> &'static str {
        match self {
            ScriptletDialect::Native => "",
            ScriptletDialect::Ubo => UBO_PREFIX,
            ScriptletDialect::Abp => ABP_PREFIX,
        }
    }
}

/// One scriptlet invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScriptletCall {
    pub name: String,
    pub args: Vec<String>,
}

impl ScriptletCall {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// A compiled scriptlet rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptletRule {
    pub base: RuleBase,
    /// Calls in rule order (ABP rules may carry several)
    pub calls: Vec<ScriptletCall>,
    pub dialect: ScriptletDialect,
    /// Text after the rule mask; exceptions are keyed by it
    pub body: String,
    pub domains: DomainRestrictions,
}

impl ScriptletRule {
    #[inline]
    pub fn is_whitelist(&self) -> bool {
        self.base.is_whitelist
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        self.domains.is_generic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_prefix() {
        assert_eq!(ScriptletDialect::Native.name_prefix(), "");
        assert_eq!(ScriptletDialect::Ubo.name_prefix(), "ubo-");
        assert_eq!(ScriptletDialect::Abp.name_prefix(), "abp-");
    }

    #[test]
    fn test_scriptlet_call_new() {
        let call = ScriptletCall::new("ubo-set-constant", vec!["foo".to_string(), "false".to_string()]);
        assert_eq!(call.name, "ubo-set-constant");
        assert_eq!(call.args.len(), 2);
    }
}
