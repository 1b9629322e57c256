//! uBO dialect: `##+js(name, arg1, /re,gex/, arg3)` and `##script:inject(...)`

use once_cell::sync::Lazy;
use regex::Regex;

use sieve_core::scriptlet::{ScriptletCall, ScriptletDialect};

use super::{halt, into_call, Capture, Cursor, State, StateMachine, Transition};

static UBO_MASK: Lazy<Regex> = Lazy::new(|| Regex::new(r"##script:inject|\+js").unwrap());

struct UboParser {
    cursor: Cursor,
    capture: Capture,
    opened: bool,
}

/// Find the end of a `/regex/` argument starting at `start` (the opening `/`).
///
/// The closing `/` is followed by optional spaces and either `,` or a final `)`.
/// Returns the regex body and the position right after the closing `/`.
fn scan_regex(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut pos = start + 1;
    while pos < chars.len() {
        if chars[pos] == '/' && chars[pos - 1] != '\\' {
            let rest: String = chars[pos + 1..].iter().collect();
            let rest = rest.trim_start();
            if rest.starts_with(',') || rest.trim_end() == ")" {
                let body: String = chars[start + 1..pos].iter().collect();
                return Some((body, pos + 1));
            }
        }
        pos += 1;
    }
    None
}

/// `/body/`, with bare `/` inside the body escaped.
fn regex_literal(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 2);
    out.push('/');
    let mut prev = '\0';
    for c in body.chars() {
        if c == '/' && prev != '\\' {
            out.push('\\');
        }
        out.push(c);
        prev = c;
    }
    out.push('/');
    out
}

fn between_params(p: &mut UboParser) -> Option<State> {
    p.cursor.skip_whitespace();

    if !p.opened {
        return match p.cursor.next_char() {
            Some('(') => {
                p.opened = true;
                Some(State::BetweenParams)
            }
            _ => Some(State::Error),
        };
    }

    if p.cursor.peek() == Some('/') {
        let start = p.cursor.position();
        match scan_regex(p.cursor.chars(), start) {
            Some((body, end)) => {
                p.capture.push_str(&regex_literal(&body));
                p.cursor.set_position(end);
            }
            None => return Some(State::Error),
        }
    }

    Some(State::InParam)
}

fn in_param(p: &mut UboParser) -> Option<State> {
    match p.cursor.next_char() {
        Some(',') => {
            p.capture.capture_trimmed();
            Some(State::BetweenParams)
        }
        Some(')') => {
            p.capture.capture_trimmed();
            Some(State::Close)
        }
        Some(c) => {
            p.capture.push(c);
            Some(State::InParam)
        }
        None => Some(State::Error),
    }
}

const TRANSITIONS: &[Transition<UboParser>] = &[
    Transition { from: State::Init, action: State::BetweenParams, handler: between_params },
    Transition { from: State::BetweenParams, action: State::BetweenParams, handler: between_params },
    Transition { from: State::BetweenParams, action: State::InParam, handler: in_param },
    Transition { from: State::BetweenParams, action: State::Error, handler: halt },
    Transition { from: State::InParam, action: State::InParam, handler: in_param },
    Transition { from: State::InParam, action: State::BetweenParams, handler: between_params },
    Transition { from: State::InParam, action: State::Close, handler: halt },
    Transition { from: State::InParam, action: State::Error, handler: halt },
];

fn strip_marker(text: &str) -> &str {
    match UBO_MASK.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Parse a uBO scriptlet call; the name gets the `ubo-` prefix.
pub fn parse_ubo_scriptlet(text: &str) -> Option<ScriptletCall> {
    let mut parser = UboParser {
        cursor: Cursor::new(strip_marker(text)),
        capture: Capture::default(),
        opened: false,
    };

    let mut machine = StateMachine::new(TRANSITIONS);
    if !machine.run(State::BetweenParams, &mut parser) {
        return None;
    }

    into_call(parser.capture.take_props(), ScriptletDialect::Ubo.name_prefix())
}
