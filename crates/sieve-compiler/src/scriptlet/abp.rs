//! ABP dialect: `log 'hello world'; abort-on-property-read foo`
//!
//! Statements are separated by `;`, arguments by spaces. Each statement
//! becomes its own call.

use sieve_core::scriptlet::{ScriptletCall, ScriptletDialect};

use super::{halt, into_call, Capture, Cursor, State, StateMachine, Transition};

struct AbpParser {
    cursor: Cursor,
    capture: Capture,
    leaves: Vec<Vec<String>>,
    /// Quote that opened the current argument
    quote: Option<char>,
}

impl AbpParser {
    fn capture_leaf(&mut self) {
        let props = self.capture.take_props();
        if !props.is_empty() {
            self.leaves.push(props);
        }
    }
}

fn in_param(p: &mut AbpParser) -> Option<State> {
    let Some(c) = p.cursor.next_char() else {
        if p.quote.is_some() {
            return Some(State::Error);
        }
        p.capture.capture_non_empty();
        p.capture_leaf();
        return Some(State::Close);
    };

    match p.quote {
        Some(quote) if c == quote => {
            p.quote = None;
            p.capture.capture_non_empty();
            Some(State::BetweenParams)
        }
        Some(_) if c == '\\' => match p.cursor.next_char() {
            Some(escaped) => {
                p.capture.push(escaped);
                Some(State::InParam)
            }
            None => Some(State::Error),
        },
        Some(_) => {
            p.capture.push(c);
            Some(State::InParam)
        }
        None => match c {
            '\'' | '"' => {
                p.quote = Some(c);
                Some(State::InParam)
            }
            ' ' | '\t' => {
                p.capture.capture_non_empty();
                Some(State::InParam)
            }
            ';' => {
                p.capture.capture_non_empty();
                p.capture_leaf();
                Some(State::InParam)
            }
            _ => {
                p.capture.push(c);
                Some(State::InParam)
            }
        },
    }
}

/// Right after a closing quote: a separator or the end must follow.
fn between_params(p: &mut AbpParser) -> Option<State> {
    match p.cursor.next_char() {
        Some(' ' | '\t') => Some(State::InParam),
        Some(';') => {
            p.capture_leaf();
            Some(State::InParam)
        }
        None => {
            p.capture_leaf();
            Some(State::Close)
        }
        Some(_) => Some(State::Error),
    }
}

const TRANSITIONS: &[Transition<AbpParser>] = &[
    Transition { from: State::Init, action: State::InParam, handler: in_param },
    Transition { from: State::InParam, action: State::InParam, handler: in_param },
    Transition { from: State::InParam, action: State::BetweenParams, handler: between_params },
    Transition { from: State::InParam, action: State::Close, handler: halt },
    Transition { from: State::InParam, action: State::Error, handler: halt },
    Transition { from: State::BetweenParams, action: State::InParam, handler: in_param },
    Transition { from: State::BetweenParams, action: State::Close, handler: halt },
    Transition { from: State::BetweenParams, action: State::Error, handler: halt },
];

/// Parse an ABP snippet body into one call per statement, names prefixed `abp-`.
pub fn parse_abp_snippet(text: &str) -> Option<Vec<ScriptletCall>> {
    let mut parser = AbpParser {
        cursor: Cursor::new(text.trim()),
        capture: Capture::default(),
        leaves: Vec::new(),
        quote: None,
    };

    let mut machine = StateMachine::new(TRANSITIONS);
    if !machine.run(State::InParam, &mut parser) {
        return None;
    }

    let prefix = ScriptletDialect::Abp.name_prefix();
    let calls: Vec<ScriptletCall> = parser
        .leaves
        .into_iter()
        .filter_map(|leaf| into_call(leaf, prefix))
        .collect();

    if calls.is_empty() {
        None
    } else {
        Some(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_statement() {
        let calls = parse_abp_snippet("abort-on-property-read foo bar").expect("valid snippet");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "abp-abort-on-property-read");
        assert_eq!(calls[0].args, vec!["foo", "bar"]);
    }

    #[test]
    fn test_chained_statements() {
        let calls = parse_abp_snippet("log hello; abort-on-property-read foo").expect("valid snippet");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "abp-log");
        assert_eq!(calls[0].args, vec!["hello"]);
        assert_eq!(calls[1].name, "abp-abort-on-property-read");
        assert_eq!(calls[1].args, vec!["foo"]);
    }

    #[test]
    fn test_quoted_arguments_keep_separators() {
        let calls = parse_abp_snippet(r#"log 'hello world; again' "x y""#).expect("valid snippet");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec!["hello world; again", "x y"]);
    }

    #[test]
    fn test_escape_inside_quotes() {
        let calls = parse_abp_snippet(r"log 'it\'s'").expect("valid snippet");
        assert_eq!(calls[0].args, vec!["it's"]);
    }

    #[test]
    fn test_empty_leaves_and_args_skipped() {
        let calls = parse_abp_snippet("log  a;; ;log b;").expect("valid snippet");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, vec!["a"]);
        assert_eq!(calls[1].args, vec!["b"]);
    }

    #[test]
    fn test_n_arguments_in_order() {
        let calls = parse_abp_snippet("f 1 2 3 4 5").expect("valid snippet");
        assert_eq!(calls[0].args, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(parse_abp_snippet("log 'hello").is_none());
    }

    #[test]
    fn test_text_after_closing_quote() {
        assert!(parse_abp_snippet("log 'a'b").is_none());
    }

    #[test]
    fn test_empty_snippet() {
        assert!(parse_abp_snippet("  ").is_none());
    }
}
