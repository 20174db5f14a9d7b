//! AST snapshot - a normalized representation of the document tree
//!
//! The snapshot captures the tree as node type + label + attributes +
//! children, so serializers produce the same shape regardless of the
//! in-memory node layout. Attributes are kept in a sorted map to make the
//! serialized output deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::node::{Document, Node};

/// A snapshot of an AST node in a normalized, serializable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstSnapshot {
    /// The type of node (e.g. "Heading", "Link", "Table")
    pub node_type: String,

    /// The primary label or text content of the node
    pub label: String,

    /// Additional attributes specific to the node type
    pub attributes: BTreeMap<String, String>,

    /// Child nodes in the tree
    pub children: Vec<AstSnapshot>,
}

impl AstSnapshot {
    pub fn new(node_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            label: label.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<AstSnapshot>) -> Self {
        self.children.extend(children);
        self
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl Document {
    /// Build the normalized snapshot form of this document.
    pub fn snapshot(&self) -> AstSnapshot {
        AstSnapshot::new("Document", "").with_children(snapshot_nodes(&self.children))
    }
}

fn snapshot_nodes(nodes: &[Node]) -> Vec<AstSnapshot> {
    nodes.iter().map(snapshot_node).collect()
}

fn snapshot_node(node: &Node) -> AstSnapshot {
    match node {
        Node::Text(t) => AstSnapshot::new("Text", t.value.clone()),
        Node::Paragraph(p) => {
            AstSnapshot::new("Paragraph", "").with_children(snapshot_nodes(&p.inlines))
        }
        Node::Heading(h) => AstSnapshot::new("Heading", h.text())
            .with_attribute("level", h.level.to_string())
            .with_children(snapshot_nodes(&h.inlines)),
        Node::HorizontalRule(_) => AstSnapshot::new("HorizontalRule", ""),
        Node::List(l) => AstSnapshot::new("List", "")
            .with_attribute("kind", format!("{:?}", l.kind))
            .with_children(
                l.items
                    .iter()
                    .map(|item| {
                        AstSnapshot::new("ListItem", "")
                            .with_children(snapshot_nodes(&item.content))
                    })
                    .collect(),
            ),
        Node::Table(t) => {
            let mut snap = AstSnapshot::new("Table", "");
            if let Some(attrs) = &t.attributes {
                snap = snap.with_attribute("attributes", attrs.clone());
            }
            if let Some(caption) = &t.caption {
                snap.children.push(
                    AstSnapshot::new("TableCaption", "")
                        .with_children(snapshot_nodes(&caption.content)),
                );
            }
            for row in &t.rows {
                snap.children.push(
                    AstSnapshot::new("TableRow", "").with_children(
                        row.cells
                            .iter()
                            .map(|cell| {
                                AstSnapshot::new("TableCell", "")
                                    .with_attribute("header", cell.header.to_string())
                                    .with_children(snapshot_nodes(&cell.content))
                            })
                            .collect(),
                    ),
                );
            }
            snap
        }
        Node::Link(l) => AstSnapshot::new("Link", l.target.clone())
            .with_children(snapshot_nodes(&l.label)),
        Node::ExternalLink(e) => AstSnapshot::new("ExternalLink", e.url.clone())
            .with_children(snapshot_nodes(&e.label)),
        Node::Template(t) => AstSnapshot::new("Template", t.name.clone()),
        Node::Bold(f) => AstSnapshot::new("Bold", "").with_children(snapshot_nodes(&f.inlines)),
        Node::Italic(f) => AstSnapshot::new("Italic", "").with_children(snapshot_nodes(&f.inlines)),
        Node::BoldItalic(f) => {
            AstSnapshot::new("BoldItalic", "").with_children(snapshot_nodes(&f.inlines))
        }
        Node::Comment(c) => AstSnapshot::new("Comment", c.text.clone()),
        Node::Reference(r) => {
            let mut snap = AstSnapshot::new("Reference", "");
            if let Some(attrs) = &r.attributes {
                snap = snap.with_attribute("attributes", attrs.clone());
            }
            snap.with_children(snapshot_nodes(&r.content))
        }
        Node::Signature(s) => {
            AstSnapshot::new("Signature", "").with_attribute("tildes", s.tildes.to_string())
        }
    }
}
