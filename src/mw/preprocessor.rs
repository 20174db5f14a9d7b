//! Wikitext preprocessor - the expansion stage
//!
//! The preprocessor parses raw wikitext with its own rule-set over the
//! grammar engine ([`grammar`]), building a small node tree ([`nodes`])
//! of text runs, comments, transclusions, placeholders and inclusion
//! sections. The expander ([`expand`]) then walks that tree, resolving
//! templates through a caller-supplied capability and emitting literal
//! wikitext for the main parser.

pub mod expand;
pub mod grammar;
pub mod nodes;

pub use expand::{
    MapResolver, NullResolver, Preprocessor, PreprocessorError, ResolverError, TemplateArgs,
    TemplateResolver, DEFAULT_MAX_DEPTH,
};
pub use nodes::{IncludeKind, PreNode};
