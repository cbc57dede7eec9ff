//! Lexer for Metrica calculation sheets

mod tokens;

pub use tokens::{Token, TokenKind};

use logos::Logos;

use crate::common::Span;
use crate::diagnostics::{CompileError, Reporter};

/// Tokenize a source file. Unknown characters are reported and skipped so a
/// single stray byte cannot hide the rest of the sheet; the token stream
/// always ends with `Eof`.
pub fn lex(source: &str, reporter: &mut Reporter) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start, range.end);
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                span,
                text: lexer.slice().to_string(),
            }),
            Err(()) => {
                reporter.error(CompileError::UnexpectedCharacter {
                    found: lexer.slice().to_string(),
                    span: span.into(),
                    src: reporter.named_source(),
                });
            }
        }
    }
    let end = source.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
        text: String::new(),
    });
    tokens
}
