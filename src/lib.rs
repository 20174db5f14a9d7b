//! # mw
//!
//! A two-stage parser for MediaWiki wikitext.
//!
//! Stage one is a preprocessor that expands transclusions, parser functions
//! and template-argument placeholders into literal wikitext. Stage two is a
//! PEG grammar over the expanded text that builds a semantic document tree.
//! Both stages run on the same grammar engine and route their rule matches
//! through pluggable semantics objects; see [`mw::mediawiki`] for the
//! combined entry point.

pub mod mw;
