//! Scriptlet call parsers
//!
//! The three dialects share one driver: a [`StateMachine`] walks a static
//! transition table, each handler consumes input from its parser context and
//! returns the next action. Dispatching is a loop, so the depth never grows
//! with the rule length.
//!
//! A malformed call (unterminated quote, missing `)`, stray character) yields
//! `None`; parsers never panic.

pub mod abp;
pub mod native;
pub mod ubo;

use sieve_core::scriptlet::{ScriptletCall, ScriptletDialect};

pub use abp::parse_abp_snippet;
pub use native::parse_native_scriptlet;
pub use ubo::parse_ubo_scriptlet;

// =============================================================================
// State Machine
// =============================================================================

/// Parser states. Actions are named after the state they enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    BetweenParams,
    InParam,
    Close,
    Error,
}

/// Handler run on entering a state; returns the next action, if any.
pub type Handler<C> = fn(&mut C) -> Option<State>;

/// One `(from, action) -> handler` entry.
pub struct Transition<C> {
    pub from: State,
    pub action: State,
    pub handler: Handler<C>,
}

/// Handler for terminal states.
pub fn halt<C>(_ctx: &mut C) -> Option<State> {
    None
}

/// Table driven state machine over a parser context `C`.
pub struct StateMachine<C: 'static> {
    state: State,
    transitions: &'static [Transition<C>],
}

impl<C: 'static> StateMachine<C> {
    pub fn new(transitions: &'static [Transition<C>]) -> Self {
        Self {
            state: State::Init,
            transitions,
        }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Dispatch `action` and every action the handlers chain after it.
    ///
    /// An action with no entry for the current state stops the machine where
    /// it is.
    pub fn dispatch(&mut self, action: State, ctx: &mut C) {
        let mut next = Some(action);

        while let Some(action) = next {
            let Some(transition) = self
                .transitions
                .iter()
                .find(|t| t.from == self.state && t.action == action)
            else {
                return;
            };

            self.state = action;
            next = (transition.handler)(ctx);
        }
    }

    /// Run from `Init` and report whether the machine closed cleanly.
    pub fn run(&mut self, start: State, ctx: &mut C) -> bool {
        self.state = State::Init;
        self.dispatch(start, ctx);
        self.state == State::Close
    }
}

// =============================================================================
// Parser Helpers
// =============================================================================

/// Character cursor over the rule body.
#[derive(Debug, Clone)]
pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    /// Consume the next character.
    #[inline]
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Character before the last consumed one.
    #[inline]
    pub fn before_last(&self) -> Option<char> {
        self.pos.checked_sub(2).and_then(|i| self.chars.get(i).copied())
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.chars.len());
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Whole input.
    #[inline]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

/// Accumulates arguments character by character.
#[derive(Debug, Default, Clone)]
pub struct Capture {
    current: String,
    props: Vec<String>,
}

impl Capture {
    #[inline]
    pub fn push(&mut self, c: char) {
        self.current.push(c);
    }

    pub fn push_str(&mut self, s: &str) {
        self.current.push_str(s);
    }

    /// Finish the current argument.
    pub fn capture(&mut self) {
        self.props.push(std::mem::take(&mut self.current));
    }

    /// Finish the current argument, trimmed.
    pub fn capture_trimmed(&mut self) {
        let prop = std::mem::take(&mut self.current);
        self.props.push(prop.trim().to_string());
    }

    /// Finish the current argument unless it is empty.
    pub fn capture_non_empty(&mut self) {
        if !self.current.is_empty() {
            self.capture();
        }
    }

    /// Take every finished argument.
    pub fn take_props(&mut self) -> Vec<String> {
        std::mem::take(&mut self.props)
    }
}

/// Build a call from `[name, args...]`; an empty name is not a call.
pub(crate) fn into_call(mut props: Vec<String>, prefix: &str) -> Option<ScriptletCall> {
    if props.is_empty() || props[0].is_empty() {
        return None;
    }
    let args = props.split_off(1);
    let name = format!("{prefix}{}", props.remove(0));
    Some(ScriptletCall::new(name, args))
}

/// Parse a scriptlet body in the given dialect.
pub fn parse_scriptlet(body: &str, dialect: ScriptletDialect) -> Option<Vec<ScriptletCall>> {
    match dialect {
        ScriptletDialect::Native => parse_native_scriptlet(body).map(|call| vec![call]),
        ScriptletDialect::Ubo => parse_ubo_scriptlet(body).map(|call| vec![call]),
        ScriptletDialect::Abp => parse_abp_snippet(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        steps: usize,
        limit: usize,
    }

    fn step(ctx: &mut Counter) -> Option<State> {
        ctx.steps += 1;
        if ctx.steps >= ctx.limit {
            Some(State::Close)
        } else {
            Some(State::InParam)
        }
    }

    const COUNTER_TRANSITIONS: &[Transition<Counter>] = &[
        Transition {
            from: State::Init,
            action: State::InParam,
            handler: step,
        },
        Transition {
            from: State::InParam,
            action: State::InParam,
            handler: step,
        },
        Transition {
            from: State::InParam,
            action: State::Close,
            handler: halt,
        },
    ];

    #[test]
    fn test_dispatch_loops_without_recursion() {
        let mut ctx = Counter {
            steps: 0,
            limit: 100_000,
        };
        let mut machine = StateMachine::new(COUNTER_TRANSITIONS);
        assert!(machine.run(State::InParam, &mut ctx));
        assert_eq!(ctx.steps, 100_000);
    }

    #[test]
    fn test_unknown_action_stops_machine() {
        let mut ctx = Counter::default();
        let mut machine = StateMachine::new(COUNTER_TRANSITIONS);
        machine.dispatch(State::Close, &mut ctx);
        assert_eq!(machine.state(), State::Init);
        assert_eq!(ctx.steps, 0);
    }

    #[test]
    fn test_cursor() {
        let mut cursor = Cursor::new("a  b");
        assert_eq!(cursor.next_char(), Some('a'));
        cursor.skip_whitespace();
        assert_eq!(cursor.peek(), Some('b'));
        assert_eq!(cursor.next_char(), Some('b'));
        assert_eq!(cursor.before_last(), Some(' '));
        assert_eq!(cursor.next_char(), None);
    }

    #[test]
    fn test_parse_scriptlet_dispatches_dialects() {
        let calls = parse_scriptlet("//scriptlet('log', 'a')", ScriptletDialect::Native).expect("native");
        assert_eq!(calls[0].name, "log");

        let calls = parse_scriptlet("##+js(noeval)", ScriptletDialect::Ubo).expect("ubo");
        assert_eq!(calls[0].name, "ubo-noeval");

        let calls = parse_scriptlet("log a; log b", ScriptletDialect::Abp).expect("abp");
        assert_eq!(calls.len(), 2);
    }
}
