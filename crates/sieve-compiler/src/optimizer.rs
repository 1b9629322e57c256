//! Rule list optimizer
//!
//! Runs between parsing and loading: applies `$badfilter` and drops
//! duplicate rules.

use std::collections::HashSet;

use sieve_core::rule::Rule;

/// Counters reported by [`optimize_rules`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
    pub badfilter_rules: usize,
    pub badfiltered_rules: usize,
}

fn badfilter_target(rule: &Rule) -> Option<&str> {
    match rule {
        Rule::Network(r) => r.badfilter.as_deref(),
        _ => None,
    }
}

/// Drop `$badfilter` rules and the rules they cancel, then exact duplicates
/// within the same list.
pub fn optimize_rules(rules: &mut Vec<Rule>) -> OptimizeStats {
    let before = rules.len();
    let mut badfilter_keys: HashSet<String> = HashSet::new();
    let mut badfilter_rules = 0usize;

    for rule in rules.iter() {
        if let Some(target) = badfilter_target(rule) {
            badfilter_rules += 1;
            badfilter_keys.insert(target.to_string());
        }
    }

    let mut badfiltered_rules = 0usize;
    if !badfilter_keys.is_empty() {
        rules.retain(|rule| {
            if badfilter_target(rule).is_some() {
                return false;
            }
            if badfilter_keys.contains(rule.rule_text()) {
                badfiltered_rules += 1;
                return false;
            }
            true
        });
    }

    let mut seen: HashSet<RuleKey> = HashSet::new();
    let mut deduped = 0usize;
    rules.retain(|rule| {
        let key = RuleKey::from(rule);
        if seen.contains(&key) {
            deduped += 1;
            false
        } else {
            seen.insert(key);
            true
        }
    });

    let after = rules.len();

    log::debug!(
        "optimized rules: {before} -> {after} ({deduped} duplicates, {badfiltered_rules} badfiltered)"
    );

    OptimizeStats {
        before,
        after,
        deduped,
        badfilter_rules,
        badfiltered_rules,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RuleKey {
    filter_id: u32,
    rule_text: String,
}

impl From<&Rule> for RuleKey {
    fn from(rule: &Rule) -> Self {
        Self {
            filter_id: rule.filter_id(),
            rule_text: rule.rule_text().to_string(),
        }
    }
}
