//! Preprocessor rule-set
//!
//! Recognizes the constructs the expansion stage cares about and nothing
//! else: `{{...}}` transclusions, `{{{...}}}` placeholders, `<!-- -->`
//! comments and the three inclusion-control tags. Everything else is
//! literal text. Unmatched `{{` / `}}` reduce to stray-brace nodes so the
//! expander can report them; single braces and angle brackets fall back to
//! literal text.
//!
//! Parse order within `unit` matters: `{{{` placeholders are tried before
//! `{{` transclusions, and stray braces only after both fail.

use once_cell::sync::Lazy;

use crate::mw::grammar::expr::{any, cap, choice, eof, lit, none_of, not, one_of, opt, plus, rule, seq, star};
use crate::mw::grammar::Grammar;

/// The preprocessor grammar, built once.
pub fn grammar() -> &'static Grammar {
    static GRAMMAR: Lazy<Grammar> = Lazy::new(build);
    &GRAMMAR
}

fn build() -> Grammar {
    // Text runs stop at the characters that can open a construct or
    // separate arguments; the symbol rules re-admit them one character at
    // a time when no construct matches.
    let inner_guard = || choice([lit("}}"), lit("|")]);

    Grammar::builder()
        .rule("wikitext", seq([star(rule("unit")), eof()]))
        .rule(
            "unit",
            choice([
                rule("comment"),
                rule("noinclude"),
                rule("includeonly"),
                rule("onlyinclude"),
                rule("parameter"),
                rule("template"),
                rule("stray_close"),
                rule("stray_open"),
                rule("text"),
                rule("symbol"),
            ]),
        )
        .rule(
            "comment",
            seq([
                lit("<!--"),
                star(seq([not(lit("-->")), any()])),
                choice([lit("-->"), eof()]),
            ]),
        )
        .rule(
            "noinclude",
            include_section("<noinclude>", "</noinclude>"),
        )
        .rule(
            "includeonly",
            include_section("<includeonly>", "</includeonly>"),
        )
        .rule(
            "onlyinclude",
            include_section("<onlyinclude>", "</onlyinclude>"),
        )
        .rule(
            "parameter",
            seq([
                lit("{{{"),
                rule("param_name"),
                opt(seq([lit("|"), rule("param_value")])),
                lit("}}}"),
            ]),
        )
        .rule(
            "param_name",
            star(seq([not(inner_guard()), rule("inner_piece")])),
        )
        // the default swallows further pipes: {{{x|a|b}}} defaults to "a|b"
        .rule(
            "param_value",
            star(seq([not(lit("}}")), rule("value_piece")])),
        )
        .rule(
            "template",
            seq([
                lit("{{"),
                rule("template_name"),
                star(seq([lit("|"), rule("template_arg")])),
                lit("}}"),
            ]),
        )
        .rule(
            "template_name",
            star(seq([not(inner_guard()), rule("inner_piece")])),
        )
        .rule(
            "template_arg",
            star(seq([not(inner_guard()), rule("inner_piece")])),
        )
        // No lone-brace fallback inside constructs: a brace that does not
        // open a nested construct fails the enclosing rule, so nested
        // brace runs resolve as placeholder/template nesting.
        .rule(
            "inner_piece",
            choice([
                rule("comment"),
                rule("parameter"),
                rule("template"),
                cap(plus(none_of("{}<|"))),
                cap(lit("<")),
            ]),
        )
        .rule(
            "value_piece",
            choice([
                rule("comment"),
                rule("parameter"),
                rule("template"),
                cap(plus(none_of("{}<"))),
                cap(lit("<")),
            ]),
        )
        .rule("stray_open", lit("{{"))
        .rule("stray_close", lit("}}"))
        .rule("text", cap(plus(none_of("{}<|"))))
        .rule("symbol", cap(one_of("{}<|")))
        .build()
        .expect("preprocessor grammar is valid")
}

fn include_section(open: &str, close: &str) -> crate::mw::grammar::Expr {
    seq([
        lit(open),
        star(seq([not(lit(close)), rule("unit")])),
        choice([lit(close), eof()]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mw::grammar::engine::parse;
    use crate::mw::preprocessor::nodes::{PreBuilder, PreNode};

    fn parse_units(source: &str) -> Vec<PreNode> {
        let grammar = grammar();
        let mut builder = PreBuilder::new(grammar);
        let (value, end) = parse(grammar, "wikitext", source, &mut builder).expect("total grammar");
        assert_eq!(end.offset, source.len());
        value.into_items()
    }

    #[test]
    fn test_plain_text_is_one_run() {
        let units = parse_units("just some text");
        assert_eq!(units, vec![PreNode::Text("just some text".into())]);
    }

    #[test]
    fn test_comment_recognized() {
        let units = parse_units("a<!-- hidden -->b");
        assert_eq!(units.len(), 3);
        assert!(matches!(&units[1], PreNode::Comment(c) if c.contains("hidden")));
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        let units = parse_units("a<!-- open");
        assert_eq!(units.len(), 2);
        assert!(matches!(&units[1], PreNode::Comment(_)));
    }

    #[test]
    fn test_template_with_args() {
        let units = parse_units("{{infobox|name=Ada|1880}}");
        assert_eq!(units.len(), 1);
        match &units[0] {
            PreNode::Template(t) => {
                assert_eq!(t.name, vec![PreNode::Text("infobox".into())]);
                assert_eq!(t.args.len(), 2);
                assert_eq!(t.raw, "{{infobox|name=Ada|1880}}");
            }
            other => panic!("expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_template_in_argument() {
        let units = parse_units("{{outer|{{inner}}}}");
        match &units[0] {
            PreNode::Template(t) => {
                assert_eq!(t.args.len(), 1);
                assert!(matches!(&t.args[0][0], PreNode::Template(inner)
                    if inner.name == vec![PreNode::Text("inner".into())]));
            }
            other => panic!("expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_with_default() {
        let units = parse_units("{{{1|fallback}}}");
        match &units[0] {
            PreNode::Parameter(p) => {
                assert_eq!(p.name, vec![PreNode::Text("1".into())]);
                assert_eq!(p.default, Some(vec![PreNode::Text("fallback".into())]));
            }
            other => panic!("expected parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_default_keeps_pipes() {
        let units = parse_units("{{{x|a|b}}}");
        match &units[0] {
            PreNode::Parameter(p) => {
                assert_eq!(p.default, Some(vec![PreNode::Text("a|b".into())]));
            }
            other => panic!("expected parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_stray_braces_surface_as_nodes() {
        let units = parse_units("a {{ b");
        assert!(units.iter().any(|u| matches!(u, PreNode::StrayOpen(_))));

        let units = parse_units("a }} b");
        assert!(units.iter().any(|u| matches!(u, PreNode::StrayClose(_))));
    }

    #[test]
    fn test_single_braces_stay_text() {
        let units = parse_units("{ a } b");
        assert!(units
            .iter()
            .all(|u| matches!(u, PreNode::Text(_))));
    }

    #[test]
    fn test_noinclude_section() {
        let units = parse_units("a<noinclude>hidden</noinclude>b");
        assert_eq!(units.len(), 3);
        match &units[1] {
            PreNode::Include(inc) => {
                assert_eq!(inc.kind, crate::mw::preprocessor::nodes::IncludeKind::NoInclude);
                assert_eq!(inc.content, vec![PreNode::Text("hidden".into())]);
            }
            other => panic!("expected include, got {:?}", other),
        }
    }

    #[test]
    fn test_template_in_name_position() {
        let units = parse_units("{{{{a}}}}");
        match &units[0] {
            PreNode::Template(t) => {
                assert!(matches!(&t.name[0], PreNode::Template(_)));
            }
            other => panic!("expected template, got {:?}", other),
        }
    }
}
