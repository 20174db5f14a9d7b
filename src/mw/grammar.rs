//! Reusable PEG grammar engine
//!
//! A grammar is a set of named parsing expressions ([`expr`]) collected
//! into a validated rule table ([`grammar`]). The engine ([`engine`])
//! matches a rule against input text by recursive descent with full
//! backtracking and packrat memoization, routing every rule match through
//! a caller-supplied semantics object ([`semantics`]). The preprocessor
//! and the main wikitext parser are both rule-sets over this engine.

pub mod engine;
pub mod expr;
pub mod grammar;
pub mod semantics;

pub use engine::{parse, ParseError};
pub use expr::Expr;
pub use grammar::{Grammar, GrammarBuilder, GrammarError, RuleId};
pub use semantics::{ActionContext, Semantics, SemanticsTracer, TraceEntry};
