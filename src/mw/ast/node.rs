//! AST node type definitions
//!
//! This module defines the node types that represent the parsed structure
//! of a wikitext document. Every node owns its children; trees are acyclic
//! by construction. Nodes carry spans over the text the parser consumed
//! (the expanded wikitext, when the preprocessor ran first), so slicing the
//! spans of the top-level children back out of that text reconstructs it.

use super::span::Span;
use std::fmt;

/// A parsed wikitext document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub children: Vec<Node>,
    pub span: Option<Span>,
}

/// Tagged variant over every node kind the parser produces.
///
/// Block-level nodes (headings, lists, tables, paragraphs, rules) appear as
/// document children; inline nodes appear inside paragraphs, headings,
/// list items and table cells. `Text` appears at both levels - blank lines
/// between blocks are kept as text so no input is silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(Text),
    Paragraph(Paragraph),
    Heading(Heading),
    HorizontalRule(HorizontalRule),
    List(List),
    Table(Table),
    Link(Link),
    ExternalLink(ExternalLink),
    Template(Template),
    Bold(Formatted),
    Italic(Formatted),
    BoldItalic(Formatted),
    Comment(Comment),
    Reference(Reference),
    Signature(Signature),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub inlines: Vec<Node>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Nesting level 1..=6, `min(leading, trailing)` marker count.
    pub level: u8,
    pub inlines: Vec<Node>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalRule {
    pub span: Option<Span>,
}

/// Marker character that opened a list line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `*`
    Bullet,
    /// `#`
    Ordered,
    /// `;`
    Definition,
    /// `:`
    Indent,
}

impl ListKind {
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '*' => Some(ListKind::Bullet),
            '#' => Some(ListKind::Ordered),
            ';' => Some(ListKind::Definition),
            ':' => Some(ListKind::Indent),
            _ => None,
        }
    }

    pub fn marker(&self) -> char {
        match self {
            ListKind::Bullet => '*',
            ListKind::Ordered => '#',
            ListKind::Definition => ';',
            ListKind::Indent => ':',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub kind: ListKind,
    pub items: Vec<ListItem>,
    pub span: Option<Span>,
}

/// One item of a list. Deeper marker runs on following lines become a
/// nested `Node::List` at the end of `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Node>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Raw attribute text from the `{|` line, if any.
    pub attributes: Option<String>,
    pub caption: Option<TableCaption>,
    pub rows: Vec<TableRow>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCaption {
    pub content: Vec<Node>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub header: bool,
    pub content: Vec<Node>,
    pub span: Option<Span>,
}

/// Internal link `[[target|label]]`. An empty label means the target text
/// doubles as the label.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub target: String,
    pub label: Vec<Node>,
    pub span: Option<Span>,
}

/// External link `[url label]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalLink {
    pub url: String,
    pub label: Vec<Node>,
    pub span: Option<Span>,
}

/// A transclusion the preprocessor declined to resolve, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    /// The original `{{...}}` source text.
    pub raw: String,
    pub span: Option<Span>,
}

/// Inline span for bold, italic and bold-italic runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Formatted {
    pub inlines: Vec<Node>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub span: Option<Span>,
}

/// `<ref>...</ref>` footnote reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Raw attribute text from the opening tag, if any.
    pub attributes: Option<String>,
    pub content: Vec<Node>,
    pub span: Option<Span>,
}

/// Signature marker, three to five tildes.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub tildes: u8,
    pub span: Option<Span>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            span: None,
        }
    }

    pub fn with_children(children: Vec<Node>) -> Self {
        Self {
            children,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    pub fn iter_headings(&self) -> impl Iterator<Item = &Heading> {
        self.children.iter().filter_map(|n| n.as_heading())
    }

    pub fn iter_paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.children.iter().filter_map(|n| n.as_paragraph())
    }

    pub fn iter_lists(&self) -> impl Iterator<Item = &List> {
        self.children.iter().filter_map(|n| n.as_list())
    }

    pub fn iter_tables(&self) -> impl Iterator<Item = &Table> {
        self.children.iter().filter_map(|n| n.as_table())
    }

    /// Reconstruct the parser input by slicing the top-level child spans
    /// back out of `source` in document order. Top-level blocks tile the
    /// input, so this returns a string equal to what the parser consumed.
    pub fn reconstruct(&self, source: &str) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let Some(span) = child.span() {
                out.push_str(span.slice(source));
            }
        }
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Text {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }
}

impl Paragraph {
    pub fn new(inlines: Vec<Node>) -> Self {
        Self {
            inlines,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    /// Concatenated text content of the paragraph.
    pub fn text(&self) -> String {
        collect_text(&self.inlines)
    }
}

impl Heading {
    pub fn new(level: u8, inlines: Vec<Node>) -> Self {
        Self {
            level,
            inlines,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    pub fn text(&self) -> String {
        collect_text(&self.inlines)
    }
}

impl List {
    pub fn new(kind: ListKind, items: Vec<ListItem>) -> Self {
        Self {
            kind,
            items,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }
}

impl ListItem {
    pub fn new(content: Vec<Node>) -> Self {
        Self {
            content,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    pub fn text(&self) -> String {
        collect_text(&self.content)
    }

    /// The nested list under this item, if its following lines were
    /// indented deeper.
    pub fn sublist(&self) -> Option<&List> {
        self.content.iter().rev().find_map(|n| n.as_list())
    }
}

impl Table {
    pub fn new() -> Self {
        Self {
            attributes: None,
            caption: None,
            rows: Vec::new(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRow {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            span: None,
        }
    }
}

impl Default for TableRow {
    fn default() -> Self {
        Self::new()
    }
}

impl TableCell {
    pub fn new(header: bool, content: Vec<Node>) -> Self {
        Self {
            header,
            content,
            span: None,
        }
    }

    pub fn text(&self) -> String {
        collect_text(&self.content)
    }
}

impl Link {
    pub fn new(target: impl Into<String>, label: Vec<Node>) -> Self {
        Self {
            target: target.into(),
            label,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    /// Label text, or the target when no label was given.
    pub fn label_text(&self) -> String {
        if self.label.is_empty() {
            self.target.clone()
        } else {
            collect_text(&self.label)
        }
    }
}

impl ExternalLink {
    pub fn new(url: impl Into<String>, label: Vec<Node>) -> Self {
        Self {
            url: url.into(),
            label,
            span: None,
        }
    }
}

impl Template {
    pub fn new(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw: raw.into(),
            span: None,
        }
    }
}

impl Formatted {
    pub fn new(inlines: Vec<Node>) -> Self {
        Self {
            inlines,
            span: None,
        }
    }

    pub fn text(&self) -> String {
        collect_text(&self.inlines)
    }
}

impl Signature {
    pub fn new(tildes: u8) -> Self {
        Self { tildes, span: None }
    }
}

/// Collect the text content of a node sequence, descending into inline
/// containers.
fn collect_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(&t.value),
            Node::Link(l) => out.push_str(&l.label_text()),
            Node::ExternalLink(e) => out.push_str(&collect_text(&e.label)),
            Node::Bold(f) | Node::Italic(f) | Node::BoldItalic(f) => {
                out.push_str(&collect_text(&f.inlines))
            }
            Node::Reference(r) => out.push_str(&collect_text(&r.content)),
            _ => {}
        }
    }
    out
}

impl Node {
    pub fn node_type(&self) -> &'static str {
        match self {
            Node::Text(_) => "Text",
            Node::Paragraph(_) => "Paragraph",
            Node::Heading(_) => "Heading",
            Node::HorizontalRule(_) => "HorizontalRule",
            Node::List(_) => "List",
            Node::Table(_) => "Table",
            Node::Link(_) => "Link",
            Node::ExternalLink(_) => "ExternalLink",
            Node::Template(_) => "Template",
            Node::Bold(_) => "Bold",
            Node::Italic(_) => "Italic",
            Node::BoldItalic(_) => "BoldItalic",
            Node::Comment(_) => "Comment",
            Node::Reference(_) => "Reference",
            Node::Signature(_) => "Signature",
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Node::Text(n) => n.span,
            Node::Paragraph(n) => n.span,
            Node::Heading(n) => n.span,
            Node::HorizontalRule(n) => n.span,
            Node::List(n) => n.span,
            Node::Table(n) => n.span,
            Node::Link(n) => n.span,
            Node::ExternalLink(n) => n.span,
            Node::Template(n) => n.span,
            Node::Bold(n) | Node::Italic(n) | Node::BoldItalic(n) => n.span,
            Node::Comment(n) => n.span,
            Node::Reference(n) => n.span,
            Node::Signature(n) => n.span,
        }
    }

    pub fn set_span(&mut self, span: Option<Span>) {
        match self {
            Node::Text(n) => n.span = span,
            Node::Paragraph(n) => n.span = span,
            Node::Heading(n) => n.span = span,
            Node::HorizontalRule(n) => n.span = span,
            Node::List(n) => n.span = span,
            Node::Table(n) => n.span = span,
            Node::Link(n) => n.span = span,
            Node::ExternalLink(n) => n.span = span,
            Node::Template(n) => n.span = span,
            Node::Bold(n) | Node::Italic(n) | Node::BoldItalic(n) => n.span = span,
            Node::Comment(n) => n.span = span,
            Node::Reference(n) => n.span = span,
            Node::Signature(n) => n.span = span,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Node::Paragraph(_))
    }
    pub fn is_heading(&self) -> bool {
        matches!(self, Node::Heading(_))
    }
    pub fn is_list(&self) -> bool {
        matches!(self, Node::List(_))
    }
    pub fn is_table(&self) -> bool {
        matches!(self, Node::Table(_))
    }
    pub fn is_link(&self) -> bool {
        matches!(self, Node::Link(_))
    }

    pub fn as_text(&self) -> Option<&Text> {
        if let Node::Text(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        if let Node::Paragraph(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_heading(&self) -> Option<&Heading> {
        if let Node::Heading(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_list(&self) -> Option<&List> {
        if let Node::List(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_table(&self) -> Option<&Table> {
        if let Node::Table(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_link(&self) -> Option<&Link> {
        if let Node::Link(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_external_link(&self) -> Option<&ExternalLink> {
        if let Node::ExternalLink(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_template(&self) -> Option<&Template> {
        if let Node::Template(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_reference(&self) -> Option<&Reference> {
        if let Node::Reference(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_signature(&self) -> Option<&Signature> {
        if let Node::Signature(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_comment(&self) -> Option<&Comment> {
        if let Node::Comment(n) = self {
            Some(n)
        } else {
            None
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Document({} children)", self.children.len())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(t) => write!(f, "Text({:?})", t.value),
            Node::Paragraph(p) => write!(f, "Paragraph({} inlines)", p.inlines.len()),
            Node::Heading(h) => write!(f, "Heading(level {}, {:?})", h.level, h.text()),
            Node::HorizontalRule(_) => write!(f, "HorizontalRule"),
            Node::List(l) => write!(f, "List({:?}, {} items)", l.kind, l.items.len()),
            Node::Table(t) => write!(f, "Table({} rows)", t.rows.len()),
            Node::Link(l) => write!(f, "Link({:?})", l.target),
            Node::ExternalLink(e) => write!(f, "ExternalLink({:?})", e.url),
            Node::Template(t) => write!(f, "Template({:?})", t.name),
            Node::Bold(_) => write!(f, "Bold"),
            Node::Italic(_) => write!(f, "Italic"),
            Node::BoldItalic(_) => write!(f, "BoldItalic"),
            Node::Comment(c) => write!(f, "Comment({:?})", c.text),
            Node::Reference(r) => write!(f, "Reference({} inlines)", r.content.len()),
            Node::Signature(s) => write!(f, "Signature({})", s.tildes),
        }
    }
}
