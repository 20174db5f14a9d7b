//! Tree-building semantics for the wikitext grammar
//!
//! Reduces grammar matches to [`Node`]s bottom-up. The handler table is
//! resolved against the grammar once, at construction, and dispatch is by
//! interned rule id. Most rules just flatten their children; the handlers
//! below carry the block-level assembly logic: heading level arithmetic,
//! list nesting from marker runs, and table row/cell accumulation.

use crate::mw::ast::node::{
    Comment, ExternalLink, Formatted, Heading, HorizontalRule, Link, List, ListItem, ListKind,
    Node, Paragraph, Reference, Signature, Table, TableCaption, TableCell, TableRow, Template,
    Text,
};
use crate::mw::ast::span::Span;
use crate::mw::grammar::{ActionContext, Grammar, Semantics};

/// Semantic value of the wikitext grammar.
///
/// Most rules produce `Nodes`; the table and list line rules produce the
/// richer variants their enclosing block rule assembles from.
#[derive(Debug, Clone)]
pub enum BuildValue {
    Nodes(Vec<Node>),
    ListLine {
        markers: String,
        content: Vec<Node>,
        span: Span,
    },
    Caption(TableCaption),
    Row(TableRow),
    Cells(Vec<TableCell>),
}

type Handler = fn(&ActionContext<'_>, Vec<BuildValue>) -> BuildValue;

/// Semantics that builds the document tree.
pub struct TreeBuilder {
    handlers: Vec<Handler>,
}

impl TreeBuilder {
    /// Resolve the handler table against `grammar`.
    pub fn new(grammar: &Grammar) -> Self {
        let mut handlers: Vec<Handler> = Vec::with_capacity(grammar.len());
        for (_, rule) in grammar.iter() {
            handlers.push(handler_for(&rule.name));
        }
        Self { handlers }
    }
}

impl Semantics for TreeBuilder {
    type Value = BuildValue;

    fn token(&mut self, text: &str, span: Span) -> BuildValue {
        BuildValue::Nodes(vec![Node::Text(Text::new(text).with_span(Some(span)))])
    }

    fn reduce(&mut self, ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
        (self.handlers[ctx.rule_id.0])(ctx, children)
    }
}

fn handler_for(rule: &str) -> Handler {
    match rule {
        "heading" => on_heading,
        "horizontal_rule" => on_horizontal_rule,
        "list" => on_list,
        "list_line" => on_list_line,
        "paragraph" => on_paragraph,
        "table" => on_table,
        "caption_line" => on_caption_line,
        "row_line" => on_row_line,
        "header_line" => on_header_line,
        "cell_line" => on_cell_line,
        "link" => on_link,
        "external_link" => on_external_link,
        "template" => on_template,
        // choice wrapper around the typed line values; keep them intact
        "table_line" => on_first,
        "ref_empty" => on_ref_empty,
        "ref_paired" => on_ref_paired,
        "comment" => on_comment,
        "signature" => on_signature,
        "bold" => on_bold,
        "italic" => on_italic,
        "bold_italic" => on_bold_italic,
        _ => on_flatten,
    }
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Flatten child values into nodes, merging adjacent text runs.
fn flatten(children: Vec<BuildValue>) -> Vec<Node> {
    let mut out = Vec::new();
    for child in children {
        if let BuildValue::Nodes(nodes) = child {
            out.extend(nodes);
        }
    }
    merge_text(out)
}

/// Merge adjacent text nodes, combining their spans.
fn merge_text(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    for node in nodes {
        if let (Some(Node::Text(last)), Node::Text(next)) = (out.last_mut(), &node) {
            last.value.push_str(&next.value);
            last.span = match (last.span, next.span) {
                (Some(a), Some(b)) => Some(Span::new(a.start, b.end)),
                _ => None,
            };
            continue;
        }
        out.push(node);
    }
    out
}

/// The text of a captured token value.
fn token_text(value: &BuildValue) -> String {
    if let BuildValue::Nodes(nodes) = value {
        if let Some(Node::Text(text)) = nodes.first() {
            return text.value.clone();
        }
    }
    String::new()
}

fn nodes_of(value: BuildValue) -> Vec<Node> {
    if let BuildValue::Nodes(nodes) = value {
        nodes
    } else {
        Vec::new()
    }
}

/// Trim whitespace off the edges of an inline sequence, dropping text
/// nodes that become empty. Spans are left as parsed.
fn trim_edges(mut nodes: Vec<Node>) -> Vec<Node> {
    if let Some(Node::Text(first)) = nodes.first_mut() {
        first.value = first.value.trim_start().to_string();
        if first.value.is_empty() {
            nodes.remove(0);
        }
    }
    if let Some(Node::Text(last)) = nodes.last_mut() {
        last.value = last.value.trim_end().to_string();
        if last.value.is_empty() {
            nodes.pop();
        }
    }
    nodes
}

// ---------------------------------------------------------------------------
// handlers
// ---------------------------------------------------------------------------

fn on_flatten(_ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    BuildValue::Nodes(flatten(children))
}

fn on_first(_ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    children
        .into_iter()
        .next()
        .unwrap_or_else(|| BuildValue::Nodes(Vec::new()))
}

fn on_heading(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let mut iter = children.into_iter();
    let lead = iter.next().map(|v| token_text(&v)).unwrap_or_default();
    let content = iter.next().map(nodes_of).unwrap_or_default();
    let trail = iter.next().map(|v| token_text(&v)).unwrap_or_default();

    let level = lead.len().min(trail.len()).min(6);
    let mut inlines = Vec::new();
    if lead.len() > level {
        // markers beyond the heading level belong to the title text
        let extra = lead.len() - level;
        let start = ctx.span.start.advanced(&lead[..level]);
        let span = Span::new(start, start.advanced(&lead[level..]));
        inlines.push(Node::Text(Text::new("=".repeat(extra)).with_span(Some(span))));
    }
    inlines.extend(content);
    if trail.len() > level {
        let extra = trail.len() - level;
        inlines.push(Node::Text(Text::new("=".repeat(extra))));
    }
    let inlines = trim_edges(merge_text(inlines));
    BuildValue::Nodes(vec![Node::Heading(
        Heading::new(level as u8, inlines).with_span(Some(ctx.span)),
    )])
}

fn on_horizontal_rule(ctx: &ActionContext<'_>, _children: Vec<BuildValue>) -> BuildValue {
    BuildValue::Nodes(vec![Node::HorizontalRule(HorizontalRule {
        span: Some(ctx.span),
    })])
}

fn on_list_line(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let mut iter = children.into_iter();
    let markers = iter.next().map(|v| token_text(&v)).unwrap_or_default();
    let content = trim_edges(iter.next().map(nodes_of).unwrap_or_default());
    BuildValue::ListLine {
        markers,
        content,
        span: ctx.span,
    }
}

#[derive(Clone)]
struct ListLineData {
    markers: String,
    content: Vec<Node>,
    span: Span,
}

fn on_list(_ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let lines: Vec<ListLineData> = children
        .into_iter()
        .filter_map(|value| match value {
            BuildValue::ListLine {
                markers,
                content,
                span,
            } => Some(ListLineData {
                markers,
                content,
                span,
            }),
            _ => None,
        })
        .collect();
    BuildValue::Nodes(build_lists(&lines))
}

/// Split consecutive list lines into lists by their first marker and
/// build each one. Mixed markers at the same depth produce sibling lists.
fn build_lists(lines: &[ListLineData]) -> Vec<Node> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let marker = match lines[i].markers.chars().next() {
            Some(ch) => ch,
            None => {
                i += 1;
                continue;
            }
        };
        let mut j = i;
        while j < lines.len() && lines[j].markers.starts_with(marker) {
            j += 1;
        }
        out.push(build_list(marker, &lines[i..j]));
        i = j;
    }
    out
}

fn build_list(marker: char, lines: &[ListLineData]) -> Node {
    let kind = ListKind::from_marker(marker).unwrap_or(ListKind::Bullet);
    let mut items = Vec::new();
    let mut k = 0;
    while k < lines.len() {
        if lines[k].markers.len() == 1 {
            let mut item =
                ListItem::new(lines[k].content.clone()).with_span(Some(lines[k].span));
            k += 1;
            let start = k;
            while k < lines.len() && lines[k].markers.len() > 1 {
                k += 1;
            }
            if k > start {
                // deeper lines nest under the item that precedes them
                let stripped = strip_markers(&lines[start..k]);
                item.content.extend(build_lists(&stripped));
                item.span = Some(Span::new(
                    lines[start - 1].span.start,
                    lines[k - 1].span.end,
                ));
            }
            items.push(item);
        } else {
            // deeper lines with no item to attach to become their own item
            let start = k;
            while k < lines.len() && lines[k].markers.len() > 1 {
                k += 1;
            }
            let stripped = strip_markers(&lines[start..k]);
            let span = Span::new(lines[start].span.start, lines[k - 1].span.end);
            items.push(ListItem::new(build_lists(&stripped)).with_span(Some(span)));
        }
    }
    let span = lines
        .first()
        .zip(lines.last())
        .map(|(first, last)| Span::new(first.span.start, last.span.end));
    Node::List(List {
        kind,
        items,
        span,
    })
}

fn strip_markers(lines: &[ListLineData]) -> Vec<ListLineData> {
    lines
        .iter()
        .map(|line| ListLineData {
            markers: line.markers[1..].to_string(),
            content: line.content.clone(),
            span: line.span,
        })
        .collect()
}

fn on_paragraph(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let inlines = flatten(children);
    BuildValue::Nodes(vec![Node::Paragraph(
        Paragraph::new(inlines).with_span(Some(ctx.span)),
    )])
}

fn on_table(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let mut iter = children.into_iter();
    let attrs = iter.next().map(|v| token_text(&v)).unwrap_or_default();
    let mut table = Table::new();
    let trimmed = attrs.trim();
    if !trimmed.is_empty() {
        table.attributes = Some(trimmed.to_string());
    }
    let mut row = TableRow::new();
    for value in iter {
        match value {
            BuildValue::Caption(caption) => {
                if table.caption.is_none() {
                    table.caption = Some(caption);
                }
            }
            BuildValue::Row(next) => {
                if !row.cells.is_empty() {
                    table.rows.push(row);
                }
                row = next;
            }
            BuildValue::Cells(cells) => row.cells.extend(cells),
            BuildValue::Nodes(nodes) => {
                // a plain line inside the table continues the last cell
                if let Some(cell) = row.cells.last_mut() {
                    cell.content.extend(nodes);
                    cell.content = merge_text(std::mem::take(&mut cell.content));
                }
            }
            BuildValue::ListLine { .. } => {}
        }
    }
    if !row.cells.is_empty() {
        table.rows.push(row);
    }
    table.span = Some(ctx.span);
    BuildValue::Nodes(vec![Node::Table(table)])
}

fn on_caption_line(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let content = trim_edges(flatten(children));
    BuildValue::Caption(TableCaption {
        content,
        span: Some(ctx.span),
    })
}

fn on_row_line(ctx: &ActionContext<'_>, _children: Vec<BuildValue>) -> BuildValue {
    BuildValue::Row(TableRow {
        cells: Vec::new(),
        span: Some(ctx.span),
    })
}

fn on_header_line(_ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    BuildValue::Cells(cells_from(children, true))
}

fn on_cell_line(_ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    BuildValue::Cells(cells_from(children, false))
}

fn cells_from(children: Vec<BuildValue>, header: bool) -> Vec<TableCell> {
    children
        .into_iter()
        .map(|value| TableCell::new(header, trim_edges(nodes_of(value))))
        .collect()
}

fn on_link(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let mut iter = children.into_iter();
    let target = iter.next().map(|v| token_text(&v)).unwrap_or_default();
    let label = trim_edges(iter.next().map(nodes_of).unwrap_or_default());
    BuildValue::Nodes(vec![Node::Link(
        Link::new(target.trim(), label).with_span(Some(ctx.span)),
    )])
}

fn on_external_link(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let mut iter = children.into_iter();
    let url = iter.next().map(|v| token_text(&v)).unwrap_or_default();
    let label = trim_edges(iter.next().map(nodes_of).unwrap_or_default());
    let mut node = ExternalLink::new(url, label);
    node.span = Some(ctx.span);
    BuildValue::Nodes(vec![Node::ExternalLink(node)])
}

fn on_template(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let inner = children.first().map(token_text).unwrap_or_default();
    let name = inner.split('|').next().unwrap_or("").trim().to_string();
    let mut node = Template::new(name, ctx.text);
    node.span = Some(ctx.span);
    BuildValue::Nodes(vec![Node::Template(node)])
}

fn on_ref_empty(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let attrs = children.first().map(token_text).unwrap_or_default();
    BuildValue::Nodes(vec![Node::Reference(Reference {
        attributes: non_empty(attrs),
        content: Vec::new(),
        span: Some(ctx.span),
    })])
}

fn on_ref_paired(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let mut iter = children.into_iter();
    let attrs = iter.next().map(|v| token_text(&v)).unwrap_or_default();
    let content = iter.next().map(nodes_of).unwrap_or_default();
    BuildValue::Nodes(vec![Node::Reference(Reference {
        attributes: non_empty(attrs),
        content,
        span: Some(ctx.span),
    })])
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn on_comment(ctx: &ActionContext<'_>, _children: Vec<BuildValue>) -> BuildValue {
    let inner = ctx
        .text
        .strip_prefix("<!--")
        .and_then(|t| t.strip_suffix("-->"))
        .unwrap_or(ctx.text);
    BuildValue::Nodes(vec![Node::Comment(Comment {
        text: inner.to_string(),
        span: Some(ctx.span),
    })])
}

fn on_signature(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    let tildes = children.first().map(token_text).unwrap_or_default().len() as u8;
    let mut node = Signature::new(tildes);
    node.span = Some(ctx.span);
    BuildValue::Nodes(vec![Node::Signature(node)])
}

fn on_bold(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    formatted(ctx, children, Node::Bold)
}

fn on_italic(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    formatted(ctx, children, Node::Italic)
}

fn on_bold_italic(ctx: &ActionContext<'_>, children: Vec<BuildValue>) -> BuildValue {
    formatted(ctx, children, Node::BoldItalic)
}

fn formatted(
    ctx: &ActionContext<'_>,
    children: Vec<BuildValue>,
    wrap: fn(Formatted) -> Node,
) -> BuildValue {
    let mut inner = Formatted::new(flatten(children));
    inner.span = Some(ctx.span);
    BuildValue::Nodes(vec![wrap(inner)])
}
