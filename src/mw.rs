//! MediaWiki wikitext parsing.
//!
//! Module layout follows the pipeline: [`grammar`] is the reusable PEG
//! engine, [`preprocessor`] expands raw wikitext, [`parser`] turns expanded
//! wikitext into the [`ast`] document tree, and [`mediawiki`] composes the
//! two stages behind one façade.

pub mod ast;
pub mod grammar;
pub mod mediawiki;
pub mod parser;
pub mod preprocessor;
