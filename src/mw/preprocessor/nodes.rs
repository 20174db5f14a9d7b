//! Preprocessor node tree and its semantics
//!
//! The preprocessor grammar reduces to these nodes rather than straight to
//! text so the expander can resolve templates recursively and report
//! errors with positions. `PreBuilder` is the semantics object: it
//! resolves its handler table against the grammar once, at construction,
//! and dispatches by rule id on every match.

use crate::mw::ast::span::Position;
use crate::mw::ast::Span;
use crate::mw::grammar::{ActionContext, Grammar, Semantics};

/// A node of the preprocessor tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PreNode {
    /// A grouping of nodes with no markup of its own.
    Fragment(Vec<PreNode>),
    /// A literal text run.
    Text(String),
    /// A `<!-- -->` comment, stripped on expansion.
    Comment(String),
    /// A `{{...}}` transclusion or parser-function call.
    Template(PreTemplate),
    /// A `{{{...}}}` template-argument placeholder.
    Parameter(PreParameter),
    /// A `<noinclude>`/`<includeonly>`/`<onlyinclude>` section.
    Include(PreInclude),
    /// An unmatched `{{`.
    StrayOpen(Position),
    /// An unmatched `}}`.
    StrayClose(Position),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreTemplate {
    /// Name part, before the first `|`; may itself contain constructs.
    pub name: Vec<PreNode>,
    /// One entry per `|`-separated argument.
    pub args: Vec<Vec<PreNode>>,
    /// The original `{{...}}` source, for verbatim passthrough.
    pub raw: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreParameter {
    pub name: Vec<PreNode>,
    pub default: Option<Vec<PreNode>>,
    /// The original `{{{...}}}` source, for verbatim passthrough.
    pub raw: String,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    NoInclude,
    IncludeOnly,
    OnlyInclude,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreInclude {
    pub kind: IncludeKind,
    pub content: Vec<PreNode>,
}

impl PreNode {
    /// Unwrap a `Fragment` into its items; any other node becomes a
    /// single-item list.
    pub fn into_items(self) -> Vec<PreNode> {
        match self {
            PreNode::Fragment(items) => items,
            other => vec![other],
        }
    }
}

type Handler = fn(&ActionContext<'_>, Vec<PreNode>) -> PreNode;

/// Semantics that reduces preprocessor rule matches to [`PreNode`]s.
pub struct PreBuilder {
    handlers: Vec<Handler>,
}

impl PreBuilder {
    /// Resolve the handler table against `grammar`.
    pub fn new(grammar: &Grammar) -> Self {
        let mut handlers: Vec<Handler> = Vec::with_capacity(grammar.len());
        for (_, rule) in grammar.iter() {
            handlers.push(handler_for(&rule.name));
        }
        Self { handlers }
    }
}

impl Semantics for PreBuilder {
    type Value = PreNode;

    fn token(&mut self, text: &str, _span: Span) -> PreNode {
        PreNode::Text(text.to_string())
    }

    fn reduce(&mut self, ctx: &ActionContext<'_>, children: Vec<PreNode>) -> PreNode {
        (self.handlers[ctx.rule_id.0])(ctx, children)
    }
}

fn handler_for(rule: &str) -> Handler {
    match rule {
        "comment" => on_comment,
        "template" => on_template,
        "parameter" => on_parameter,
        "noinclude" => on_noinclude,
        "includeonly" => on_includeonly,
        "onlyinclude" => on_onlyinclude,
        "stray_open" => on_stray_open,
        "stray_close" => on_stray_close,
        "unit" | "inner_piece" | "value_piece" | "text" | "symbol" => on_passthrough,
        // wikitext, template_name, template_arg, param_name, param_value
        _ => on_fragment,
    }
}

fn on_fragment(_ctx: &ActionContext<'_>, children: Vec<PreNode>) -> PreNode {
    PreNode::Fragment(children)
}

fn on_passthrough(_ctx: &ActionContext<'_>, children: Vec<PreNode>) -> PreNode {
    children
        .into_iter()
        .next()
        .unwrap_or_else(|| PreNode::Text(String::new()))
}

fn on_comment(ctx: &ActionContext<'_>, _children: Vec<PreNode>) -> PreNode {
    PreNode::Comment(ctx.text.to_string())
}

fn on_template(ctx: &ActionContext<'_>, children: Vec<PreNode>) -> PreNode {
    let mut parts = children.into_iter();
    let name = parts.next().map(PreNode::into_items).unwrap_or_default();
    let args = parts.map(PreNode::into_items).collect();
    PreNode::Template(PreTemplate {
        name,
        args,
        raw: ctx.text.to_string(),
        position: ctx.span.start,
    })
}

fn on_parameter(ctx: &ActionContext<'_>, children: Vec<PreNode>) -> PreNode {
    let mut parts = children.into_iter();
    let name = parts.next().map(PreNode::into_items).unwrap_or_default();
    let default = parts.next().map(PreNode::into_items);
    PreNode::Parameter(PreParameter {
        name,
        default,
        raw: ctx.text.to_string(),
        position: ctx.span.start,
    })
}

fn on_noinclude(_ctx: &ActionContext<'_>, children: Vec<PreNode>) -> PreNode {
    on_include(IncludeKind::NoInclude, children)
}

fn on_includeonly(_ctx: &ActionContext<'_>, children: Vec<PreNode>) -> PreNode {
    on_include(IncludeKind::IncludeOnly, children)
}

fn on_onlyinclude(_ctx: &ActionContext<'_>, children: Vec<PreNode>) -> PreNode {
    on_include(IncludeKind::OnlyInclude, children)
}

fn on_include(kind: IncludeKind, children: Vec<PreNode>) -> PreNode {
    PreNode::Include(PreInclude {
        kind,
        content: children,
    })
}

fn on_stray_open(ctx: &ActionContext<'_>, _children: Vec<PreNode>) -> PreNode {
    PreNode::StrayOpen(ctx.span.start)
}

fn on_stray_close(ctx: &ActionContext<'_>, _children: Vec<PreNode>) -> PreNode {
    PreNode::StrayClose(ctx.span.start)
}
