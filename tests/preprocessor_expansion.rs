//! Integration tests for the expansion stage
//!
//! Exercises the preprocessor through its public API and through the
//! two-stage façade: template resolution, argument binding, parser
//! functions, inclusion sections, and the failure modes.

use mw::mw::mediawiki::{Error, MediaWiki};
use mw::mw::preprocessor::{
    MapResolver, NullResolver, Preprocessor, PreprocessorError, TemplateArgs, TemplateResolver,
};

#[test]
fn test_identity_on_markup_free_text() {
    let text = "Nothing to expand here.\nJust two lines.\n";
    let expanded = Preprocessor::new(&NullResolver).expand(text).expect("expands");
    assert_eq!(expanded, text);
}

#[test]
fn test_identity_on_plain_wikitext_markup() {
    // main-parser markup is not the preprocessor's business
    let text = "== Heading ==\n* item with [[link]] and ''italic''\n";
    let expanded = Preprocessor::new(&NullResolver).expand(text).expect("expands");
    assert_eq!(expanded, text);
}

#[test]
fn test_missing_template_passthrough() {
    let expanded = Preprocessor::new(&NullResolver)
        .expand("{{undefinedTemplate}}")
        .expect("expands");
    assert_eq!(expanded, "{{undefinedTemplate}}");
}

#[test]
fn test_template_bodies_can_produce_block_markup() {
    let resolver = MapResolver::new().with("stooges", "* Moe\n* Larry\n* Curly\n");
    let doc = MediaWiki::new()
        .with_resolver(&resolver)
        .parse("{{stooges}}")
        .expect("parses");
    let list = doc.iter_lists().next().expect("list");
    assert_eq!(list.items.len(), 3);
    assert_eq!(list.items[2].text(), "Curly");
}

#[test]
fn test_arguments_flow_into_body() {
    let resolver = MapResolver::new().with("box", "[{{{1}}}/{{{style|plain}}}]");
    let mw = MediaWiki::new().with_resolver(&resolver);
    assert_eq!(
        mw.expand("{{box|content|style=fancy}}").expect("expands"),
        "[content/fancy]"
    );
    assert_eq!(mw.expand("{{box|content}}").expect("expands"), "[content/plain]");
}

#[test]
fn test_resolver_sees_expanded_arguments() {
    struct Recording;
    impl TemplateResolver for Recording {
        fn resolve(
            &self,
            name: &str,
            args: &TemplateArgs,
        ) -> Result<Option<String>, mw::mw::preprocessor::ResolverError> {
            assert_eq!(name, "probe");
            assert_eq!(args.positional(1), Some("INNER"));
            assert_eq!(args.get("k"), Some("v"));
            Ok(Some("ok".to_string()))
        }
    }
    let expanded = Preprocessor::new(&Recording)
        .expand("{{probe|{{uc:inner}}|k=v}}")
        .expect("expands");
    assert_eq!(expanded, "ok");
}

#[test]
fn test_comments_never_reach_the_tree() {
    let doc = MediaWiki::new().parse("ab<!-- hidden -->cd\n").expect("parses");
    let para = doc.iter_paragraphs().next().expect("paragraph");
    assert_eq!(para.text(), "abcd\n");
    assert!(para.inlines.iter().all(|n| n.as_comment().is_none()));
}

#[test]
fn test_parser_functions_compose_with_templates() {
    let resolver = MapResolver::new().with("status", "{{#if:{{{1|}}}|active|idle}}");
    let mw = MediaWiki::new().with_resolver(&resolver);
    assert_eq!(mw.expand("{{status|yes}}").expect("expands"), "active");
    assert_eq!(mw.expand("{{status}}").expect("expands"), "idle");
}

#[test]
fn test_switch_drives_template_output() {
    let source = "{{#switch:two|one=1|two=2|#default=?}}";
    let expanded = Preprocessor::new(&NullResolver).expand(source).expect("expands");
    assert_eq!(expanded, "2");
}

#[test]
fn test_recursion_limit_through_facade() {
    let resolver = MapResolver::new().with("ouroboros", "{{ouroboros}}");
    let err = MediaWiki::new()
        .with_resolver(&resolver)
        .with_max_depth(10)
        .parse("{{ouroboros}}")
        .unwrap_err();
    assert_eq!(
        err,
        Error::Preprocessor(PreprocessorError::RecursionLimit { limit: 10 })
    );
}

#[test]
fn test_deep_brace_nesting_hits_limit() {
    let depth = 6;
    let source = format!("{}x{}", "{{".repeat(depth + 2), "}}".repeat(depth + 2));
    let err = Preprocessor::new(&NullResolver)
        .with_max_depth(depth)
        .expand(&source)
        .unwrap_err();
    assert_eq!(err, PreprocessorError::RecursionLimit { limit: depth });
}

#[test]
fn test_unbalanced_braces_fail_with_position() {
    let err = Preprocessor::new(&NullResolver)
        .expand("line one\nbroken {{ here")
        .unwrap_err();
    match err {
        PreprocessorError::Unbalanced { marker, position } => {
            assert_eq!(marker, "{{");
            assert_eq!(position.line, 2);
        }
        other => panic!("expected unbalanced, got {:?}", other),
    }
}

#[test]
fn test_error_kinds_distinguishable_at_facade() {
    let preprocessor_err = MediaWiki::new().parse("bad }}").unwrap_err();
    assert!(matches!(preprocessor_err, Error::Preprocessor(_)));
}

#[test]
fn test_include_sections_end_to_end() {
    let resolver = MapResolver::new().with(
        "widget",
        "<noinclude>documentation</noinclude><includeonly>payload</includeonly>",
    );
    let mw = MediaWiki::new().with_resolver(&resolver);
    assert_eq!(mw.expand("{{widget}}").expect("expands"), "payload");
    // the same tags on the page itself behave the other way around
    assert_eq!(
        mw.expand("<noinclude>shown</noinclude><includeonly>hidden</includeonly>")
            .expect("expands"),
        "shown"
    );
}
