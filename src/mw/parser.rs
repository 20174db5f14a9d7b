//! Main wikitext parser - expanded wikitext to document tree
//!
//! The grammar ([`grammar`]) is a rule-set over the PEG engine; the
//! tree-building semantics ([`builder`]) reduces its matches to AST
//! nodes. Parse the preprocessor's output here, or raw wikitext when
//! transclusion handling is not wanted.

pub mod builder;
pub mod grammar;

use crate::mw::ast::node::Document;
use crate::mw::ast::span::{Position, Span};
use crate::mw::grammar::engine::{self, ParseError};
use crate::mw::grammar::semantics::{SemanticsTracer, TraceEntry};

use builder::{BuildValue, TreeBuilder};

/// Parse expanded wikitext into a document tree.
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    let grammar = grammar::grammar();
    let mut builder = TreeBuilder::new(grammar);
    let (value, end) = engine::parse(grammar, "document", source, &mut builder)?;
    Ok(document_from(value, end))
}

/// Parse with the tracing decorator around the tree builder. The tree is
/// identical to [`parse_document`]'s; the log records every semantic
/// action that ran.
pub fn parse_document_traced(
    source: &str,
) -> Result<(Document, Vec<TraceEntry>), ParseError> {
    let grammar = grammar::grammar();
    let mut tracer = SemanticsTracer::new(TreeBuilder::new(grammar));
    let (value, end) = engine::parse(grammar, "document", source, &mut tracer)?;
    Ok((document_from(value, end), tracer.take_log()))
}

fn document_from(value: BuildValue, end: Position) -> Document {
    let children = match value {
        BuildValue::Nodes(nodes) => nodes,
        _ => Vec::new(),
    };
    Document::with_children(children).with_span(Some(Span::new(Position::start(), end)))
}
