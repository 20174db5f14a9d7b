//! Document tree for parsed wikitext
//!
//! This module defines the node types produced by the main parser, the
//! position/span model shared with the grammar engine, and a normalized
//! snapshot form for serialization.

pub mod node;
pub mod snapshot;
pub mod span;

pub use node::{
    Document, ExternalLink, Formatted, Heading, Link, List, ListItem, ListKind, Node, Paragraph,
    Reference, Signature, Table, TableCaption, TableCell, TableRow, Template,
};
pub use snapshot::AstSnapshot;
pub use span::{Position, Span};
