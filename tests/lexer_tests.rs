//! Integration tests for the lexer

use metrica::diagnostics::{Reporter, SourceFile};
use metrica::lexer::{TokenKind, lex};
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenKind> {
    let mut reporter = Reporter::new(SourceFile::new("test.mt", source));
    let tokens = lex(source, &mut reporter);
    assert!(!reporter.has_errors(), "unexpected lex errors");
    tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn test_lex_simple_declaration() {
    assert_eq!(
        kinds("x = 1 + 2"),
        [
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::Number,
            TokenKind::Plus,
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_label_and_unit_block() {
    let source = "area <A_c> {mm^2} = 1";
    let mut reporter = Reporter::new(SourceFile::new("test.mt", source));
    let tokens = lex(source, &mut reporter);
    assert_eq!(tokens[1].kind, TokenKind::Label);
    assert_eq!(tokens[1].text, "<A_c>");
    assert_eq!(tokens[2].kind, TokenKind::UnitBlock);
    assert_eq!(tokens[2].text, "{mm^2}");
}

#[test]
fn test_lex_spans_are_byte_ranges() {
    let source = "ab = 12";
    let mut reporter = Reporter::new(SourceFile::new("test.mt", source));
    let tokens = lex(source, &mut reporter);
    assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 2));
    assert_eq!((tokens[2].span.start, tokens[2].span.end), (5, 7));
}

#[test]
fn test_lex_newlines_are_tokens() {
    assert_eq!(
        kinds("a = 1\nb = 2"),
        [
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_comments_skipped_to_end_of_line() {
    assert_eq!(
        kinds("a = 1 # trailing note\n# full line\nb = 2"),
        [
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Newline,
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_scientific_notation() {
    let source = "c = 2.998e8";
    let mut reporter = Reporter::new(SourceFile::new("test.mt", source));
    let tokens = lex(source, &mut reporter);
    assert_eq!(tokens[2].kind, TokenKind::Number);
    assert_eq!(tokens[2].text, "2.998e8");
}

#[test]
fn test_lex_error_recovery() {
    let source = "a = 1 ? 2\nb = 3";
    let mut reporter = Reporter::new(SourceFile::new("test.mt", source));
    let tokens = lex(source, &mut reporter);
    assert_eq!(reporter.error_count(), 1);
    // Everything around the bad byte is still tokenized.
    assert_eq!(
        tokens.iter().filter(|t| t.kind == TokenKind::Number).count(),
        3
    );
}
