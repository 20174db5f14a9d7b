//! Unit tests for table elements
//!
//! `{|` to `|}` with caption, row separators, data cells (`|`, `||`) and
//! header cells (`!`, `!!`). An unclosed table degrades to paragraphs.

use mw::mw::parser::parse_document;

#[test]
fn test_single_cell_table() {
    let doc = parse_document("{|\n| lonely\n|}\n").expect("parses");
    let table = doc.iter_tables().next().expect("table");
    assert!(table.attributes.is_none());
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].cells.len(), 1);
    assert_eq!(table.rows[0].cells[0].text(), "lonely");
}

#[test]
fn test_table_with_attributes() {
    let doc = parse_document("{| class=\"wikitable\"\n| x\n|}\n").expect("parses");
    let table = doc.iter_tables().next().expect("table");
    assert_eq!(table.attributes.as_deref(), Some("class=\"wikitable\""));
}

#[test]
fn test_caption() {
    let doc = parse_document("{|\n|+ Population by year\n| data\n|}\n").expect("parses");
    let table = doc.iter_tables().next().expect("table");
    let caption = table.caption.as_ref().expect("caption");
    assert_eq!(
        caption.content.first().and_then(|n| n.as_text()).map(|t| t.value.as_str()),
        Some("Population by year")
    );
}

#[test]
fn test_rows_and_cells() {
    let source = "{|\n|-\n| a || b\n|-\n| c || d\n|}\n";
    let doc = parse_document(source).expect("parses");
    let table = doc.iter_tables().next().expect("table");
    assert_eq!(table.rows.len(), 2);
    let texts: Vec<String> = table.rows[0].cells.iter().map(|c| c.text()).collect();
    assert_eq!(texts, vec!["a", "b"]);
    let texts: Vec<String> = table.rows[1].cells.iter().map(|c| c.text()).collect();
    assert_eq!(texts, vec!["c", "d"]);
}

#[test]
fn test_header_cells() {
    let source = "{|\n! Name !! Year\n|-\n| Ada || 1843\n|}\n";
    let doc = parse_document(source).expect("parses");
    let table = doc.iter_tables().next().expect("table");
    assert_eq!(table.rows.len(), 2);
    assert!(table.rows[0].cells.iter().all(|c| c.header));
    assert_eq!(table.rows[0].cells[0].text(), "Name");
    assert!(table.rows[1].cells.iter().all(|c| !c.header));
}

#[test]
fn test_cells_split_across_lines_share_a_row() {
    let source = "{|\n| first\n| second\n|}\n";
    let doc = parse_document(source).expect("parses");
    let table = doc.iter_tables().next().expect("table");
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].cells.len(), 2);
}

#[test]
fn test_plain_line_continues_last_cell() {
    let source = "{|\n| first\ncontinued\n|}\n";
    let doc = parse_document(source).expect("parses");
    let table = doc.iter_tables().next().expect("table");
    let text = table.rows[0].cells[0].text();
    assert!(text.contains("first"));
    assert!(text.contains("continued"));
}

#[test]
fn test_cell_with_inline_markup() {
    let source = "{|\n| see [[Main Page]] || '''bold'''\n|}\n";
    let doc = parse_document(source).expect("parses");
    let table = doc.iter_tables().next().expect("table");
    let cells = &table.rows[0].cells;
    assert!(cells[0].content.iter().any(|n| n.is_link()));
    assert_eq!(cells[1].text(), "bold");
}

#[test]
fn test_unclosed_table_degrades_to_text() {
    let doc = parse_document("{|\n| stranded\n").expect("parses");
    assert_eq!(doc.iter_tables().count(), 0);
    assert!(doc.iter_paragraphs().count() >= 1);
}

#[test]
fn test_table_between_paragraphs() {
    let source = "before\n{|\n| mid\n|}\nafter\n";
    let doc = parse_document(source).expect("parses");
    let kinds: Vec<&str> = doc.children.iter().map(|n| n.node_type()).collect();
    assert_eq!(kinds, vec!["Paragraph", "Table", "Paragraph"]);
}
