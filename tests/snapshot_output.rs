//! Snapshot tests for the serialized tree form
//!
//! The snapshot model is the stable external shape of a parse result;
//! these inline snapshots pin the JSON layout down exactly.

use mw::mw::parser::parse_document;

#[test]
fn test_heading_snapshot_json() {
    let doc = parse_document("== T ==\n").expect("parses");
    let json = doc.snapshot().to_json().expect("serializes");
    insta::assert_snapshot!(
        json,
        @r#"{"node_type":"Document","label":"","attributes":{},"children":[{"node_type":"Heading","label":"T","attributes":{"level":"2"},"children":[{"node_type":"Text","label":"T","attributes":{},"children":[]}]}]}"#
    );
}

#[test]
fn test_list_snapshot_json() {
    let doc = parse_document("* a\n").expect("parses");
    let json = doc.snapshot().to_json().expect("serializes");
    insta::assert_snapshot!(
        json,
        @r#"{"node_type":"Document","label":"","attributes":{},"children":[{"node_type":"List","label":"","attributes":{"kind":"Bullet"},"children":[{"node_type":"ListItem","label":"","attributes":{},"children":[{"node_type":"Text","label":"a","attributes":{},"children":[]}]}]}]}"#
    );
}

#[test]
fn test_yaml_serialization() {
    let doc = parse_document("== T ==\n").expect("parses");
    let yaml = doc.snapshot().to_yaml().expect("serializes");
    assert!(yaml.contains("node_type: Document"));
    assert!(yaml.contains("node_type: Heading"));
    assert!(yaml.contains("level: '2'"));
}

#[test]
fn test_snapshot_round_trips_through_json() {
    let doc = parse_document("* a\n* b\n\npara with [[link]]\n").expect("parses");
    let snap = doc.snapshot();
    let json = snap.to_json().expect("serializes");
    let back: mw::mw::ast::AstSnapshot = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(back, snap);
}
