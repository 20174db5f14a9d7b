//! Semantics dispatch for rule matches
//!
//! The engine is agnostic about what a match produces: it hands every
//! capture and every completed rule to a [`Semantics`] object and threads
//! the returned values into the enclosing rule's action, bottom-up. Tree
//! builders implement this trait; [`SemanticsTracer`] decorates any
//! implementation to record action invocations without changing them.

use std::fmt;

use crate::mw::ast::span::{Position, Span};

use super::grammar::RuleId;

/// What a rule action gets to see about its match.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Name of the matched rule.
    pub rule: &'a str,
    /// Interned id of the matched rule.
    pub rule_id: RuleId,
    /// The slice of input the rule consumed.
    pub text: &'a str,
    /// Where the match started and ended.
    pub span: Span,
}

/// Visitor invoked per capture and per matched rule.
///
/// Values must be `Clone` because the packrat cache replays them on memo
/// hits, and `Debug` so the tracer can render them. Actions run as soon
/// as their rule matches; a surrounding alternative that later backtracks
/// simply drops the produced values.
pub trait Semantics {
    type Value: Clone + fmt::Debug;

    /// Called for each `capture` expression with the matched slice.
    fn token(&mut self, text: &str, span: Span) -> Self::Value;

    /// Called when a rule matches, with the values its body produced.
    fn reduce(&mut self, ctx: &ActionContext<'_>, children: Vec<Self::Value>) -> Self::Value;
}

/// One recorded semantic-action invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub rule: String,
    pub position: Position,
    /// Compact rendering of the produced value.
    pub outcome: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} -> {}", self.rule, self.position, self.outcome)
    }
}

/// Decorator that records every rule action while delegating unchanged.
///
/// Wrapping a semantics object in the tracer never alters parse results;
/// only the log differs. Note that the packrat cache means an action runs
/// once per (rule, position) even when the surrounding parse retries, so
/// the log reflects action executions, not match attempts.
pub struct SemanticsTracer<S> {
    inner: S,
    entries: Vec<TraceEntry>,
}

impl<S> SemanticsTracer<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entries: Vec::new(),
        }
    }

    /// The recorded log, in execution order.
    pub fn log(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn take_log(&mut self) -> Vec<TraceEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Semantics> Semantics for SemanticsTracer<S> {
    type Value = S::Value;

    fn token(&mut self, text: &str, span: Span) -> Self::Value {
        self.inner.token(text, span)
    }

    fn reduce(&mut self, ctx: &ActionContext<'_>, children: Vec<Self::Value>) -> Self::Value {
        let value = self.inner.reduce(ctx, children);
        self.entries.push(TraceEntry {
            rule: ctx.rule.to_string(),
            position: ctx.span.start,
            outcome: render_outcome(&value),
        });
        value
    }
}

const OUTCOME_LIMIT: usize = 120;

fn render_outcome(value: &dyn fmt::Debug) -> String {
    let mut rendered = format!("{:?}", value);
    if rendered.len() > OUTCOME_LIMIT {
        let mut cut = OUTCOME_LIMIT;
        while !rendered.is_char_boundary(cut) {
            cut -= 1;
        }
        rendered.truncate(cut);
        rendered.push_str("...");
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collect;

    impl Semantics for Collect {
        type Value = String;

        fn token(&mut self, text: &str, _span: Span) -> String {
            text.to_string()
        }

        fn reduce(&mut self, ctx: &ActionContext<'_>, children: Vec<String>) -> String {
            format!("{}[{}]", ctx.rule, children.join(","))
        }
    }

    fn dummy_ctx<'a>(rule: &'a str, text: &'a str) -> ActionContext<'a> {
        let start = Position::start();
        ActionContext {
            rule,
            rule_id: RuleId(0),
            text,
            span: Span::new(start, start.advanced(text)),
        }
    }

    #[test]
    fn test_tracer_delegates_and_records() {
        let mut tracer = SemanticsTracer::new(Collect);
        let ctx = dummy_ctx("greeting", "hi");
        let value = tracer.reduce(&ctx, vec!["hi".to_string()]);
        assert_eq!(value, "greeting[hi]");
        assert_eq!(tracer.log().len(), 1);
        assert_eq!(tracer.log()[0].rule, "greeting");
        assert_eq!(tracer.log()[0].position, Position::start());
        assert!(tracer.log()[0].outcome.contains("greeting[hi]"));
    }

    #[test]
    fn test_outcome_truncated() {
        let long = "x".repeat(400);
        let rendered = render_outcome(&long);
        assert!(rendered.len() <= OUTCOME_LIMIT + 3);
        assert!(rendered.ends_with("..."));
    }

    #[test]
    fn test_take_log_drains() {
        let mut tracer = SemanticsTracer::new(Collect);
        let ctx = dummy_ctx("r", "a");
        tracer.reduce(&ctx, vec![]);
        let log = tracer.take_log();
        assert_eq!(log.len(), 1);
        assert!(tracer.log().is_empty());
    }
}
