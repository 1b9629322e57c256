//! Native dialect: `//scriptlet('name', 'arg1', "arg2")`

use once_cell::sync::Lazy;
use regex::Regex;

use sieve_core::scriptlet::{ScriptletCall, ScriptletDialect};

use super::{halt, into_call, Capture, Cursor, State, StateMachine, Transition};

static NATIVE_MASK: Lazy<Regex> = Lazy::new(|| Regex::new(r"//\s*scriptlet").unwrap());

struct NativeParser {
    cursor: Cursor,
    capture: Capture,
    quote: char,
}

fn between_params(p: &mut NativeParser) -> Option<State> {
    match p.cursor.next_char() {
        Some(c @ ('\'' | '"')) => {
            p.quote = c;
            Some(State::InParam)
        }
        Some(' ' | '(' | ',') => Some(State::BetweenParams),
        Some(')') => Some(State::Close),
        _ => Some(State::Error),
    }
}

fn in_param(p: &mut NativeParser) -> Option<State> {
    match p.cursor.next_char() {
        Some(c) if c == p.quote => {
            if p.cursor.before_last() == Some('\\') {
                p.capture.push(c);
                Some(State::InParam)
            } else {
                p.capture.capture();
                Some(State::BetweenParams)
            }
        }
        Some(c) => {
            p.capture.push(c);
            Some(State::InParam)
        }
        None => Some(State::Error),
    }
}

const TRANSITIONS: &[Transition<NativeParser>] = &[
    Transition { from: State::Init, action: State::BetweenParams, handler: between_params },
    Transition { from: State::BetweenParams, action: State::BetweenParams, handler: between_params },
    Transition { from: State::BetweenParams, action: State::InParam, handler: in_param },
    Transition { from: State::BetweenParams, action: State::Close, handler: halt },
    Transition { from: State::BetweenParams, action: State::Error, handler: halt },
    Transition { from: State::InParam, action: State::InParam, handler: in_param },
    Transition { from: State::InParam, action: State::BetweenParams, handler: between_params },
    Transition { from: State::InParam, action: State::Error, handler: halt },
];

/// Text after the `//scriptlet` marker (the whole text when there is none).
fn strip_marker(text: &str) -> &str {
    match NATIVE_MASK.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Parse a native scriptlet call. The first quoted argument is the name.
pub fn parse_native_scriptlet(text: &str) -> Option<ScriptletCall> {
    let mut parser = NativeParser {
        cursor: Cursor::new(strip_marker(text)),
        capture: Capture::default(),
        quote: '\'',
    };

    let mut machine = StateMachine::new(TRANSITIONS);
    if !machine.run(State::BetweenParams, &mut parser) {
        return None;
    }

    into_call(parser.capture.take_props(), ScriptletDialect::Native.name_prefix())
}
