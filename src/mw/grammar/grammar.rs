//! Named rule table with construction-time validation
//!
//! Rule names are unique within a grammar and every `Expr::Rule` reference
//! must resolve; both are checked when the builder finishes, so the engine
//! never meets a dangling rule at match time. Rule names are interned to
//! `RuleId` indices - semantics implementations resolve their handler
//! tables against these ids once, at construction.

use std::collections::HashMap;
use std::fmt;

use super::expr::Expr;

/// Index of a rule within its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub usize);

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub expr: Expr,
}

/// A validated set of named parsing expressions.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
}

impl Grammar {
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder { rules: Vec::new() }
    }

    pub fn id(&self, name: &str) -> Option<RuleId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: RuleId) -> &str {
        &self.rules[id.0].name
    }

    pub fn expr(&self, id: RuleId) -> &Expr {
        &self.rules[id.0].expr
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().enumerate().map(|(i, r)| (RuleId(i), r))
    }
}

/// Collects rules, then validates them into a [`Grammar`].
pub struct GrammarBuilder {
    rules: Vec<Rule>,
}

impl GrammarBuilder {
    pub fn rule(mut self, name: impl Into<String>, expr: Expr) -> Self {
        self.rules.push(Rule {
            name: name.into(),
            expr,
        });
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut index = HashMap::new();
        for (i, rule) in self.rules.iter().enumerate() {
            if index.insert(rule.name.clone(), RuleId(i)).is_some() {
                return Err(GrammarError::DuplicateRule(rule.name.clone()));
            }
        }
        for rule in &self.rules {
            let mut refs = Vec::new();
            rule.expr.referenced_rules(&mut refs);
            for name in refs {
                if !index.contains_key(name) {
                    return Err(GrammarError::UnknownRule {
                        rule: name.to_string(),
                        referenced_in: rule.name.clone(),
                    });
                }
            }
        }
        Ok(Grammar {
            rules: self.rules,
            index,
        })
    }
}

/// Errors detected while building a grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
    /// Two rules share a name.
    DuplicateRule(String),
    /// An expression references a rule that was never defined.
    UnknownRule { rule: String, referenced_in: String },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::DuplicateRule(name) => {
                write!(f, "duplicate rule name: {}", name)
            }
            GrammarError::UnknownRule {
                rule,
                referenced_in,
            } => {
                write!(f, "unknown rule {} referenced in {}", rule, referenced_in)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mw::grammar::expr::{lit, rule, seq};

    #[test]
    fn test_build_and_lookup() {
        let grammar = Grammar::builder()
            .rule("start", seq([lit("a"), rule("tail")]))
            .rule("tail", lit("b"))
            .build()
            .expect("valid grammar");
        assert_eq!(grammar.len(), 2);
        let id = grammar.id("tail").expect("tail exists");
        assert_eq!(grammar.name(id), "tail");
        assert!(grammar.id("missing").is_none());
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let err = Grammar::builder()
            .rule("a", lit("x"))
            .rule("a", lit("y"))
            .build()
            .unwrap_err();
        assert_eq!(err, GrammarError::DuplicateRule("a".to_string()));
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let err = Grammar::builder()
            .rule("a", rule("ghost"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            GrammarError::UnknownRule {
                rule: "ghost".to_string(),
                referenced_in: "a".to_string(),
            }
        );
    }
}
