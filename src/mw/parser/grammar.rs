//! Main wikitext rule-set
//!
//! Operates on expanded wikitext. The grammar is total: every line falls
//! into some block, and inside a line every character falls into some
//! inline, with single special characters degrading to literal text when
//! no construct matches. That mirrors permissive wiki rendering - stray
//! markup is content, not an error.
//!
//! Block rules are line-oriented. A paragraph line guards itself with
//! negative lookahead against the block rules that could claim the line;
//! the packrat cache makes those probes cheap because the block choice
//! re-uses the memoized outcome.

use once_cell::sync::Lazy;

use crate::mw::grammar::expr::{
    any, cap, choice, eof, lit, none_of, not, one_of, opt, plus, rule, seq, star, Expr,
};
use crate::mw::grammar::Grammar;

/// The wikitext grammar, built once.
pub fn grammar() -> &'static Grammar {
    static GRAMMAR: Lazy<Grammar> = Lazy::new(build);
    &GRAMMAR
}

/// `=`+ trailing whitespace and end of line - closes a heading.
fn heading_close() -> Expr {
    seq([
        plus(lit("=")),
        star(one_of(" \t")),
        choice([lit("\n"), eof()]),
    ])
}

/// Whitespace-only line.
fn blank() -> Expr {
    seq([star(one_of(" \t")), lit("\n")])
}

fn line_end() -> Expr {
    choice([lit("\n"), eof()])
}

/// Tokens that stop a literal text run. The `symbol` rule re-admits the
/// single characters one at a time when no inline construct matches.
fn text_stop() -> Expr {
    choice([
        lit("["),
        lit("]"),
        lit("''"),
        lit("{{"),
        lit("<!--"),
        lit("<ref"),
        lit("</ref>"),
        lit("~~~"),
        lit("="),
        lit("|"),
        lit("!!"),
    ])
}

fn build() -> Grammar {
    Grammar::builder()
        .rule("document", seq([star(rule("block")), eof()]))
        .rule(
            "block",
            choice([
                rule("blank_line"),
                rule("heading"),
                rule("horizontal_rule"),
                rule("list"),
                rule("table"),
                rule("paragraph"),
            ]),
        )
        .rule("blank_line", cap(blank()))
        .rule(
            "heading",
            seq([
                cap(plus(lit("="))),
                rule("heading_content"),
                cap(plus(lit("="))),
                star(one_of(" \t")),
                rule("end_of_line"),
            ]),
        )
        .rule(
            "heading_content",
            star(seq([not(heading_close()), rule("inline")])),
        )
        .rule(
            "horizontal_rule",
            seq([
                lit("----"),
                star(lit("-")),
                star(one_of(" \t")),
                rule("end_of_line"),
            ]),
        )
        .rule("list", plus(rule("list_line")))
        .rule(
            "list_line",
            seq([
                cap(plus(one_of("*#:;"))),
                rule("line_inlines"),
                line_end(),
            ]),
        )
        .rule(
            "table",
            seq([
                lit("{|"),
                cap(star(none_of("\n"))),
                lit("\n"),
                star(seq([not(lit("|}")), rule("table_line")])),
                lit("|}"),
                star(one_of(" \t")),
                rule("end_of_line"),
            ]),
        )
        .rule(
            "table_line",
            choice([
                rule("caption_line"),
                rule("row_line"),
                rule("header_line"),
                rule("cell_line"),
                rule("table_text_line"),
            ]),
        )
        .rule(
            "caption_line",
            seq([lit("|+"), rule("cell_content"), line_end()]),
        )
        .rule(
            "row_line",
            seq([lit("|-"), star(lit("-")), star(none_of("\n")), line_end()]),
        )
        .rule(
            "header_line",
            seq([
                lit("!"),
                rule("cell_content"),
                star(seq([choice([lit("!!"), lit("||")]), rule("cell_content")])),
                line_end(),
            ]),
        )
        .rule(
            "cell_line",
            seq([
                lit("|"),
                not(one_of("}+-")),
                rule("cell_content"),
                star(seq([lit("||"), rule("cell_content")])),
                line_end(),
            ]),
        )
        .rule(
            "cell_content",
            star(seq([
                not(choice([lit("||"), lit("!!")])),
                rule("inline"),
            ])),
        )
        .rule("table_text_line", seq([rule("line_inlines"), line_end()]))
        .rule("paragraph", plus(rule("paragraph_line")))
        .rule(
            "paragraph_line",
            seq([
                not(eof()),
                not(blank()),
                not(one_of("*#:;")),
                not(rule("heading")),
                not(rule("horizontal_rule")),
                not(rule("table")),
                rule("line_inlines"),
                choice([cap(lit("\n")), eof()]),
            ]),
        )
        .rule("line_inlines", star(rule("inline")))
        .rule(
            "inline",
            choice([
                rule("link"),
                rule("external_link"),
                rule("template"),
                rule("reference"),
                rule("comment"),
                rule("signature"),
                rule("bold_italic"),
                rule("bold"),
                rule("italic"),
                rule("text"),
                rule("symbol"),
            ]),
        )
        .rule(
            "link",
            seq([
                lit("[["),
                cap(plus(seq([not(lit("]]")), none_of("|\n")]))),
                opt(seq([lit("|"), rule("link_label")])),
                lit("]]"),
            ]),
        )
        .rule(
            "link_label",
            star(seq([not(lit("]]")), rule("inline")])),
        )
        .rule(
            "external_link",
            seq([
                lit("["),
                cap(seq([
                    choice([
                        lit("https://"),
                        lit("http://"),
                        lit("ftps://"),
                        lit("ftp://"),
                        lit("irc://"),
                        lit("news:"),
                        lit("mailto:"),
                    ]),
                    plus(none_of(" ]\n")),
                ])),
                opt(seq([plus(one_of(" \t")), rule("extlink_label")])),
                lit("]"),
            ]),
        )
        .rule(
            "extlink_label",
            star(seq([not(lit("]")), rule("inline")])),
        )
        .rule(
            "template",
            seq([
                lit("{{"),
                cap(plus(seq([not(lit("}}")), any()]))),
                lit("}}"),
            ]),
        )
        .rule(
            "reference",
            choice([rule("ref_empty"), rule("ref_paired")]),
        )
        .rule(
            "ref_empty",
            seq([
                lit("<ref"),
                cap(star(seq([not(lit("/>")), none_of(">\n")]))),
                lit("/>"),
            ]),
        )
        .rule(
            "ref_paired",
            seq([
                lit("<ref"),
                cap(star(none_of(">\n"))),
                lit(">"),
                rule("ref_content"),
                lit("</ref>"),
            ]),
        )
        .rule(
            "ref_content",
            star(seq([
                not(lit("</ref>")),
                choice([rule("inline"), cap(lit("\n"))]),
            ])),
        )
        .rule(
            "comment",
            seq([
                lit("<!--"),
                star(seq([not(lit("-->")), any()])),
                lit("-->"),
            ]),
        )
        .rule(
            "signature",
            cap(choice([lit("~~~~~"), lit("~~~~"), lit("~~~")])),
        )
        .rule(
            "bold_italic",
            seq([lit("'''''"), rule("bi_content"), lit("'''''")]),
        )
        .rule(
            "bi_content",
            star(seq([not(lit("''")), rule("inline")])),
        )
        .rule("bold", seq([lit("'''"), rule("bold_content"), lit("'''")]))
        .rule(
            "bold_content",
            star(seq([not(lit("'''")), rule("inline")])),
        )
        .rule(
            "italic",
            seq([lit("''"), not(lit("'")), rule("italic_content"), lit("''")]),
        )
        .rule(
            "italic_content",
            star(seq([not(lit("''")), rule("inline")])),
        )
        .rule(
            "text",
            cap(plus(seq([not(text_stop()), none_of("\n")]))),
        )
        .rule("symbol", cap(one_of("[]'{<~=|!")))
        .rule("end_of_line", line_end())
        .build()
        .expect("wikitext grammar is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_builds() {
        let grammar = grammar();
        assert!(grammar.id("document").is_some());
        assert!(grammar.id("heading").is_some());
        assert!(grammar.id("inline").is_some());
    }
}
