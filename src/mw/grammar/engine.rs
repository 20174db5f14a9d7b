//! Recursive-descent PEG matcher with packrat memoization
//!
//! Matching is single-threaded and synchronous: ordered choice with full
//! backtracking, greedy repetition that never revisits settled repeat
//! counts, and non-consuming lookahead. Every completed rule invokes the
//! semantics object exactly once per (rule, position) - the memo table
//! replays cached results on re-attempts after backtracking. The table
//! lives for one `parse` call and is discarded with the matcher.
//!
//! On total failure the error reports the rightmost position any terminal
//! reached, together with the rules being matched when it was reached.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::mw::ast::span::{Position, Span};

use super::expr::Expr;
use super::grammar::{Grammar, RuleId};
use super::semantics::{ActionContext, Semantics};

/// Failure of a whole parse, with rightmost-failure diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The furthest position matching reached before failing.
    pub position: Position,
    /// Names of the rules being attempted at that position, sorted.
    pub expected: Vec<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expected.is_empty() {
            write!(f, "parse error at {}", self.position)
        } else {
            write!(
                f,
                "parse error at {}: expected {}",
                self.position,
                self.expected.join(", ")
            )
        }
    }
}

impl std::error::Error for ParseError {}

/// Match `start` against `input`, routing matches through `semantics`.
///
/// Returns the start rule's reduced value and the position matching ended
/// at. The caller decides whether a partial match (end before the input's
/// end) is acceptable; grammars that must consume everything anchor
/// themselves with an end-of-input expression.
pub fn parse<S: Semantics>(
    grammar: &Grammar,
    start: &str,
    input: &str,
    semantics: &mut S,
) -> Result<(S::Value, Position), ParseError> {
    let id = match grammar.id(start) {
        Some(id) => id,
        None => {
            return Err(ParseError {
                position: Position::start(),
                expected: vec![start.to_string()],
            })
        }
    };
    let mut matcher = Matcher {
        grammar,
        input,
        semantics,
        memo: HashMap::new(),
        furthest: 0,
        expected: BTreeSet::new(),
        rule_stack: Vec::new(),
        lookahead: 0,
    };
    match matcher.match_rule(id, Position::start()) {
        Ok((value, end)) => Ok((value, end)),
        Err(()) => Err(matcher.into_error()),
    }
}

struct Matcher<'g, 'i, 's, S: Semantics> {
    grammar: &'g Grammar,
    input: &'i str,
    semantics: &'s mut S,
    memo: HashMap<(RuleId, usize), Result<(S::Value, Position), ()>>,
    furthest: usize,
    expected: BTreeSet<String>,
    rule_stack: Vec<RuleId>,
    lookahead: usize,
}

impl<'g, 'i, 's, S: Semantics> Matcher<'g, 'i, 's, S> {
    fn match_rule(&mut self, id: RuleId, pos: Position) -> Result<(S::Value, Position), ()> {
        if let Some(cached) = self.memo.get(&(id, pos.offset)) {
            return cached.clone();
        }
        let grammar = self.grammar;
        self.rule_stack.push(id);
        let mut children = Vec::new();
        let matched = self.match_expr(grammar.expr(id), pos, &mut children);
        self.rule_stack.pop();
        let result = match matched {
            Ok(end) => {
                let input: &'i str = self.input;
                let ctx = ActionContext {
                    rule: grammar.name(id),
                    rule_id: id,
                    text: &input[pos.offset..end.offset],
                    span: Span::new(pos, end),
                };
                Ok((self.semantics.reduce(&ctx, children), end))
            }
            Err(()) => Err(()),
        };
        self.memo.insert((id, pos.offset), result.clone());
        result
    }

    fn match_expr(
        &mut self,
        expr: &Expr,
        pos: Position,
        out: &mut Vec<S::Value>,
    ) -> Result<Position, ()> {
        match expr {
            Expr::Literal(text) => {
                if self.input[pos.offset..].starts_with(text.as_str()) {
                    Ok(pos.advanced(text))
                } else {
                    self.record_failure(pos);
                    Err(())
                }
            }
            Expr::OneOf(set) => match self.peek(pos) {
                Some(ch) if set.contains(ch) => Ok(self.advance_char(pos, ch)),
                _ => {
                    self.record_failure(pos);
                    Err(())
                }
            },
            Expr::NoneOf(set) => match self.peek(pos) {
                Some(ch) if !set.contains(ch) => Ok(self.advance_char(pos, ch)),
                _ => {
                    self.record_failure(pos);
                    Err(())
                }
            },
            Expr::Any => match self.peek(pos) {
                Some(ch) => Ok(self.advance_char(pos, ch)),
                None => {
                    self.record_failure(pos);
                    Err(())
                }
            },
            Expr::Eof => {
                if pos.offset == self.input.len() {
                    Ok(pos)
                } else {
                    self.record_failure(pos);
                    Err(())
                }
            }
            Expr::Seq(exprs) => {
                let mark = out.len();
                let mut cur = pos;
                for e in exprs {
                    match self.match_expr(e, cur, out) {
                        Ok(end) => cur = end,
                        Err(()) => {
                            out.truncate(mark);
                            return Err(());
                        }
                    }
                }
                Ok(cur)
            }
            Expr::Choice(exprs) => {
                for e in exprs {
                    let mark = out.len();
                    if let Ok(end) = self.match_expr(e, pos, out) {
                        return Ok(end);
                    }
                    out.truncate(mark);
                }
                Err(())
            }
            Expr::Repeat { expr, min, max } => {
                let mark = out.len();
                let mut cur = pos;
                let mut count = 0usize;
                loop {
                    if let Some(max) = max {
                        if count >= *max {
                            break;
                        }
                    }
                    let iter_mark = out.len();
                    match self.match_expr(expr, cur, out) {
                        Ok(end) => {
                            if end.offset == cur.offset {
                                // zero-width match; stop instead of looping
                                count += 1;
                                break;
                            }
                            cur = end;
                            count += 1;
                        }
                        Err(()) => {
                            out.truncate(iter_mark);
                            break;
                        }
                    }
                }
                if count >= *min {
                    Ok(cur)
                } else {
                    out.truncate(mark);
                    Err(())
                }
            }
            Expr::And(inner) => {
                let mut scratch = Vec::new();
                self.lookahead += 1;
                let result = self.match_expr(inner, pos, &mut scratch);
                self.lookahead -= 1;
                result.map(|_| pos)
            }
            Expr::Not(inner) => {
                let mut scratch = Vec::new();
                self.lookahead += 1;
                let result = self.match_expr(inner, pos, &mut scratch);
                self.lookahead -= 1;
                match result {
                    Ok(_) => Err(()),
                    Err(()) => Ok(pos),
                }
            }
            Expr::Capture(inner) => {
                let mut scratch = Vec::new();
                let end = self.match_expr(inner, pos, &mut scratch)?;
                let input: &'i str = self.input;
                let text = &input[pos.offset..end.offset];
                out.push(self.semantics.token(text, Span::new(pos, end)));
                Ok(end)
            }
            Expr::Rule(name) => {
                // build() validated the reference; a miss here is unreachable
                let id = match self.grammar.id(name) {
                    Some(id) => id,
                    None => return Err(()),
                };
                let (value, end) = self.match_rule(id, pos)?;
                out.push(value);
                Ok(end)
            }
        }
    }

    fn peek(&self, pos: Position) -> Option<char> {
        self.input[pos.offset..].chars().next()
    }

    fn advance_char(&self, pos: Position, ch: char) -> Position {
        let mut buf = [0u8; 4];
        pos.advanced(ch.encode_utf8(&mut buf))
    }

    fn record_failure(&mut self, pos: Position) {
        if self.lookahead > 0 {
            return;
        }
        match pos.offset.cmp(&self.furthest) {
            std::cmp::Ordering::Greater => {
                self.furthest = pos.offset;
                self.expected.clear();
            }
            std::cmp::Ordering::Less => return,
            std::cmp::Ordering::Equal => {}
        }
        if let Some(&id) = self.rule_stack.last() {
            self.expected.insert(self.grammar.name(id).to_string());
        }
    }

    fn into_error(self) -> ParseError {
        ParseError {
            position: Position::start().advanced(&self.input[..self.furthest]),
            expected: self.expected.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mw::grammar::expr::{and_, cap, choice, eof, lit, none_of, not, plus, rule, seq, star};

    /// Renders matches as bracketed terms, counting reductions per rule.
    struct Collect {
        reductions: HashMap<String, usize>,
    }

    impl Collect {
        fn new() -> Self {
            Self {
                reductions: HashMap::new(),
            }
        }
    }

    impl Semantics for Collect {
        type Value = String;

        fn token(&mut self, text: &str, _span: Span) -> String {
            text.to_string()
        }

        fn reduce(&mut self, ctx: &ActionContext<'_>, children: Vec<String>) -> String {
            *self.reductions.entry(ctx.rule.to_string()).or_insert(0) += 1;
            format!("{}[{}]", ctx.rule, children.join(","))
        }
    }

    #[test]
    fn test_sequence_and_capture() {
        let grammar = Grammar::builder()
            .rule("start", seq([lit("ab"), cap(lit("cd")), eof()]))
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let (value, end) = parse(&grammar, "start", "abcd", &mut sem).expect("matches");
        assert_eq!(value, "start[cd]");
        assert_eq!(end.offset, 4);
    }

    #[test]
    fn test_ordered_choice_first_wins() {
        let grammar = Grammar::builder()
            .rule("start", choice([cap(lit("a")), cap(lit("ab"))]))
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let (value, end) = parse(&grammar, "start", "ab", &mut sem).expect("matches");
        assert_eq!(value, "start[a]");
        // first alternative wins even though the second would match more
        assert_eq!(end.offset, 1);
    }

    #[test]
    fn test_backtracking_resets_position_and_values() {
        // first alternative partially matches then fails; second succeeds
        let grammar = Grammar::builder()
            .rule(
                "start",
                choice([
                    seq([cap(lit("x")), lit("a")]),
                    seq([cap(lit("x")), cap(lit("b"))]),
                ]),
            )
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let (value, _) = parse(&grammar, "start", "xb", &mut sem).expect("matches");
        assert_eq!(value, "start[x,b]");
    }

    #[test]
    fn test_greedy_repetition() {
        let grammar = Grammar::builder()
            .rule("start", seq([cap(star(lit("a"))), eof()]))
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let (value, _) = parse(&grammar, "start", "aaa", &mut sem).expect("matches");
        assert_eq!(value, "start[aaa]");
    }

    #[test]
    fn test_lookahead_consumes_nothing() {
        let grammar = Grammar::builder()
            .rule(
                "start",
                seq([and_(lit("ab")), cap(lit("a")), not(lit("c")), cap(lit("b"))]),
            )
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let (value, end) = parse(&grammar, "start", "ab", &mut sem).expect("matches");
        assert_eq!(value, "start[a,b]");
        assert_eq!(end.offset, 2);
    }

    #[test]
    fn test_memoization_runs_actions_once_per_position() {
        let grammar = Grammar::builder()
            .rule(
                "start",
                choice([seq([rule("x"), lit("a")]), seq([rule("x"), lit("b")])]),
            )
            .rule("x", cap(lit("x")))
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let (value, _) = parse(&grammar, "start", "xb", &mut sem).expect("matches");
        assert_eq!(value, "start[x[x]]");
        // "x" matched at offset 0 in both alternatives but reduced once
        assert_eq!(sem.reductions.get("x"), Some(&1));
    }

    #[test]
    fn test_rightmost_failure_reporting() {
        let grammar = Grammar::builder()
            .rule("start", seq([lit("ab"), rule("tail")]))
            .rule("tail", choice([lit("cd"), lit("ce")]))
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let err = parse(&grammar, "start", "abcf", &mut sem).unwrap_err();
        assert_eq!(err.position.offset, 2);
        assert_eq!(err.expected, vec!["tail".to_string()]);
    }

    #[test]
    fn test_error_position_tracks_lines() {
        let grammar = Grammar::builder()
            .rule("start", seq([lit("a\nb"), lit("Z")]))
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let err = parse(&grammar, "start", "a\nbc", &mut sem).unwrap_err();
        assert_eq!(err.position.line, 2);
        assert_eq!(err.position.column, 2);
    }

    #[test]
    fn test_unknown_start_rule() {
        let grammar = Grammar::builder()
            .rule("start", lit("a"))
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let err = parse(&grammar, "missing", "a", &mut sem).unwrap_err();
        assert_eq!(err.expected, vec!["missing".to_string()]);
    }

    #[test]
    fn test_none_of_matches_multibyte() {
        let grammar = Grammar::builder()
            .rule("start", seq([cap(plus(none_of("|"))), eof()]))
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        let (value, _) = parse(&grammar, "start", "héllo", &mut sem).expect("matches");
        assert_eq!(value, "start[héllo]");
    }

    #[test]
    fn test_repeat_minimum_enforced() {
        let grammar = Grammar::builder()
            .rule("start", plus(cap(lit("a"))))
            .build()
            .expect("valid grammar");
        let mut sem = Collect::new();
        assert!(parse(&grammar, "start", "b", &mut sem).is_err());
    }
}
