//! Error types for rule compilation

/// Malformed rule text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Not a filtering rule")]
    NotARule,
    #[error("Invalid scriptlet syntax: {0}")]
    InvalidScriptlet(String),
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("Option {0} cannot be applied to a blocking rule")]
    WhitelistOnlyOption(String),
    #[error("Option {0} cannot be applied to an exception rule")]
    BlacklistOnlyOption(String),
    #[error("Too wide basic rule: {0}")]
    TooWide(String),
    #[error("Invalid domain list: {0}")]
    InvalidDomains(String),
    #[error("Content rule must have at least one permitted domain")]
    ContentRuleWithoutDomain,
    #[error("Invalid integer for {name}: {value}")]
    InvalidInteger { name: String, value: String },
    #[error("CSP directive must not be empty")]
    EmptyCspDirective,
    #[error("Forbidden CSP directive: {0}")]
    ForbiddenCspDirective(String),
    #[error("Unknown pseudo class: {0}")]
    UnsupportedPseudoClass(String),
    #[error("Wrong :style pseudo class syntax: {0}")]
    InvalidStyle(String),
    #[error("Invalid css injection rule, no style presented: {0}")]
    MissingStyle(String),
    #[error("Empty rule body")]
    EmptyBody,
}

/// Rule text that parsed but does not compile.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid regex: {0}")]
    Regex(#[from] regex::Error),
    #[error("Invalid CSS selector {selector}: {message}")]
    Selector { selector: String, message: String },
}

/// Any failure while turning one line into a rule.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl From<regex::Error> for RuleError {
    fn from(err: regex::Error) -> Self {
        RuleError::Compile(CompileError::Regex(err))
    }
}

/// Result alias used by the rule compilers.
pub type RuleResult<T> = Result<T, RuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RuleError::from(ParseError::UnknownOption("foo".to_string()));
        assert_eq!(err.to_string(), "Unknown option: foo");

        let err = RuleError::from(ParseError::InvalidInteger {
            name: "max-length".to_string(),
            value: "ten".to_string(),
        });
        assert_eq!(err.to_string(), "Invalid integer for max-length: ten");
    }

    #[test]
    fn test_regex_error_converts() {
        let regex_err = regex::Regex::new("(").expect_err("unbalanced group");
        let err = RuleError::from(regex_err);
        assert!(matches!(err, RuleError::Compile(CompileError::Regex(_))));
    }
}
