//! The combined entry point: raw wikitext in, document tree out
//!
//! Composes the preprocessor and the main parser. Errors from either
//! stage propagate with their kind intact - callers match on
//! [`Error::Preprocessor`] versus [`Error::Parse`] to tell a bad
//! transclusion from unparseable markup.

use std::fmt;

use log::debug;

use crate::mw::ast::node::Document;
use crate::mw::grammar::engine::ParseError;
use crate::mw::grammar::semantics::TraceEntry;
use crate::mw::parser::{parse_document, parse_document_traced};
use crate::mw::preprocessor::{
    NullResolver, Preprocessor, PreprocessorError, TemplateResolver, DEFAULT_MAX_DEPTH,
};

/// Failure of either stage, carried unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Preprocessor(PreprocessorError),
    Parse(ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Preprocessor(err) => write!(f, "{}", err),
            Error::Parse(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Preprocessor(err) => Some(err),
            Error::Parse(err) => Some(err),
        }
    }
}

impl From<PreprocessorError> for Error {
    fn from(err: PreprocessorError) -> Self {
        Error::Preprocessor(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

static NULL_RESOLVER: NullResolver = NullResolver;

/// Configured two-stage parser.
pub struct MediaWiki<'r> {
    resolver: &'r dyn TemplateResolver,
    max_depth: usize,
}

impl<'r> MediaWiki<'r> {
    /// Defaults: no template resolution, standard recursion limit.
    pub fn new() -> Self {
        Self {
            resolver: &NULL_RESOLVER,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_resolver(mut self, resolver: &'r dyn TemplateResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Run only the expansion stage.
    pub fn expand(&self, source: &str) -> Result<String, Error> {
        let expanded = Preprocessor::new(self.resolver)
            .with_max_depth(self.max_depth)
            .expand(source)?;
        Ok(expanded)
    }

    /// Expand and parse `source` into a document tree.
    pub fn parse(&self, source: &str) -> Result<Document, Error> {
        let expanded = self.expand(source)?;
        debug!("expanded {} bytes to {}", source.len(), expanded.len());
        let document = parse_document(&expanded)?;
        Ok(document)
    }

    /// Like [`parse`](Self::parse), with the tracing semantics wrapped
    /// around the tree builder. The tree is identical; the log records
    /// the semantic actions that built it.
    pub fn parse_traced(&self, source: &str) -> Result<(Document, Vec<TraceEntry>), Error> {
        let expanded = self.expand(source)?;
        let (document, log) = parse_document_traced(&expanded)?;
        Ok((document, log))
    }
}

impl Default for MediaWiki<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse raw wikitext with default options.
pub fn mediawiki(source: &str) -> Result<Document, Error> {
    MediaWiki::new().parse(source)
}
