//! Parser for Metrica calculation sheets
//!
//! Hand-written recursive descent over the token stream. Each declaration
//! is one line (newline or `;` terminated); on a parse error the parser
//! reports and resynchronizes at the next terminator, so one malformed
//! declaration does not hide the rest of the sheet.

use tracing::debug;

use crate::ast::*;
use crate::common::{NodeId, Span};
use crate::diagnostics::{CompileError, Reporter};
use crate::lexer::{Token, TokenKind};

/// Parse a token stream into a document, accumulating errors in the
/// reporter. Always returns the declarations that did parse.
pub fn parse(tokens: &[Token], reporter: &mut Reporter) -> Document {
    let mut parser = Parser {
        tokens,
        pos: 0,
        next_id: 0,
        reporter,
    };
    parser.parse_document()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    next_id: u32,
    reporter: &'a mut Reporter,
}

impl<'a> Parser<'a> {
    fn parse_document(&mut self) -> Document {
        let mut declarations = Vec::new();
        loop {
            while self.check(TokenKind::Newline) || self.check(TokenKind::Semi) {
                self.advance();
            }
            if self.check(TokenKind::Eof) {
                break;
            }
            match self.parse_declaration() {
                Some(declaration) => declarations.push(declaration),
                None => self.synchronize(),
            }
        }
        debug!(count = declarations.len(), "parsed document");
        Document { declarations }
    }

    fn parse_declaration(&mut self) -> Option<Declaration> {
        let name_token = self.expect(TokenKind::Ident, "a declaration name")?;
        let name = name_token.text.clone();
        let start = name_token.span;

        let label = if self.check(TokenKind::Label) {
            let token = self.advance();
            Some(token.text[1..token.text.len() - 1].trim().to_string())
        } else {
            None
        };

        let annotation = if self.check(TokenKind::UnitBlock) {
            let token = self.advance().clone();
            Some(self.parse_unit_annotation(&token))
        } else {
            None
        };

        self.expect(TokenKind::Eq, "`=`")?;
        let value = self.parse_expr()?;

        if !self.peek().kind.is_terminator() {
            let token = self.peek().clone();
            self.error_unexpected(&token, "end of declaration");
            return None;
        }

        let span = start.merge(value.span());
        Some(Declaration {
            id: self.fresh_id(),
            name,
            label,
            annotation,
            value,
            span,
        })
    }

    // ==================== EXPRESSIONS ====================

    fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right);
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(op, left, right);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        if self.check(TokenKind::Minus) {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span());
            return Some(Expr::Unary {
                id: self.fresh_id(),
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Option<Expr> {
        let base = self.parse_postfix()?;
        if self.check(TokenKind::Caret) {
            self.advance();
            // Right-associative: `a^b^c` is `a^(b^c)`.
            let exponent = self.parse_unary()?;
            return Some(self.binary(BinaryOp::Pow, base, exponent));
        }
        Some(base)
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        while self.check(TokenKind::UnitBlock) {
            let token = self.advance().clone();
            let annotation = self.parse_unit_annotation(&token);
            let span = expr.span().merge(token.span);
            expr = Expr::UnitAssign {
                id: self.fresh_id(),
                expr: Box::new(expr),
                annotation,
                span,
            };
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value = match token.text.replace('_', "").parse::<f64>() {
                    Ok(value) => value,
                    Err(_) => {
                        self.error_unexpected(&token, "a numeric literal");
                        return None;
                    }
                };
                Some(Expr::Number {
                    id: self.fresh_id(),
                    value,
                    span: token.span,
                })
            }
            TokenKind::StringLit => {
                self.advance();
                Some(Expr::Str {
                    id: self.fresh_id(),
                    value: unescape(&token.text[1..token.text.len() - 1]),
                    span: token.span,
                })
            }
            TokenKind::Ident => {
                self.advance();
                Some(Expr::Name {
                    id: self.fresh_id(),
                    name: token.text.clone(),
                    span: token.span,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let close = self.expect(TokenKind::RParen, "`)`")?;
                let span = token.span.merge(close.span);
                Some(Expr::Group {
                    id: self.fresh_id(),
                    inner: Box::new(inner),
                    span,
                })
            }
            TokenKind::Eof => {
                self.reporter.error(CompileError::UnexpectedEof {
                    span: token.span.into(),
                    src: self.reporter.named_source(),
                });
                None
            }
            _ => {
                self.error_unexpected(&token, "an expression");
                None
            }
        }
    }

    // ==================== UNIT ANNOTATIONS ====================

    /// Parse the symbolic contents of a `{...}` block. Symbols stay
    /// unresolved; malformed syntax is reported but the well-formed prefix
    /// is kept.
    fn parse_unit_annotation(&mut self, token: &Token) -> UnitAnnotation {
        let inner = &token.text[1..token.text.len() - 1];
        let mut factors = Vec::new();
        let mut chars = inner.char_indices().peekable();
        let mut reciprocal = false;

        while let Some(&(offset, ch)) = chars.peek() {
            if ch.is_whitespace() || ch == '*' {
                chars.next();
                continue;
            }
            if ch == '/' {
                chars.next();
                reciprocal = true;
                continue;
            }
            if !ch.is_ascii_alphabetic() {
                self.reporter.error(CompileError::CouldNotResolveUnits {
                    reason: format!("malformed unit annotation `{}`", token.text),
                    span: Span::new(token.span.start + 1 + offset, token.span.end).into(),
                    src: self.reporter.named_source(),
                });
                break;
            }
            let mut symbol = String::new();
            while let Some(&(_, ch)) = chars.peek() {
                if ch.is_ascii_alphabetic() {
                    symbol.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            let mut power = 1i64;
            if let Some(&(_, '^')) = chars.peek() {
                chars.next();
                let mut digits = String::new();
                if let Some(&(_, '-')) = chars.peek() {
                    digits.push('-');
                    chars.next();
                }
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_ascii_digit() {
                        digits.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match digits.parse::<i64>() {
                    Ok(parsed) => power = parsed,
                    Err(_) => {
                        self.reporter.error(CompileError::CouldNotResolveUnits {
                            reason: format!("malformed exponent in `{}`", token.text),
                            span: token.span.into(),
                            src: self.reporter.named_source(),
                        });
                        break;
                    }
                }
            }
            factors.push(UnitFactor {
                symbol,
                power,
                reciprocal,
            });
            reciprocal = false;
        }

        UnitAnnotation {
            factors,
            span: token.span,
        }
    }

    // ==================== HELPERS ====================

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let span = left.span().merge(right.span());
        Expr::Binary {
            id: self.fresh_id(),
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Option<Token> {
        if self.check(kind) {
            return Some(self.advance().clone());
        }
        let token = self.peek().clone();
        if token.kind == TokenKind::Eof {
            self.reporter.error(CompileError::UnexpectedEof {
                span: token.span.into(),
                src: self.reporter.named_source(),
            });
        } else {
            self.error_unexpected(&token, expected);
        }
        None
    }

    fn error_unexpected(&mut self, token: &Token, expected: &str) {
        self.reporter.error(CompileError::UnexpectedToken {
            expected: expected.to_string(),
            found: token.kind.to_string(),
            span: token.span.into(),
            src: self.reporter.named_source(),
        });
    }

    /// Skip to the next declaration boundary after a parse error.
    fn synchronize(&mut self) {
        while !self.peek().kind.is_terminator() {
            self.advance();
        }
        while self.check(TokenKind::Newline) || self.check(TokenKind::Semi) {
            self.advance();
        }
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => break,
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SourceFile;
    use crate::lexer::lex;

    fn parse_source(source: &str) -> (Document, Reporter) {
        let mut reporter = Reporter::new(SourceFile::new("test.mt", source));
        let tokens = lex(source, &mut reporter);
        let document = parse(&tokens, &mut reporter);
        (document, reporter)
    }

    #[test]
    fn test_parse_full_declaration() {
        let (document, reporter) = parse_source("area <A> {mm^2} = 100 {mm} * 200 {mm}");
        assert!(!reporter.has_errors());
        assert_eq!(document.declarations.len(), 1);
        let declaration = &document.declarations[0];
        assert_eq!(declaration.name, "area");
        assert_eq!(declaration.label.as_deref(), Some("A"));
        let annotation = declaration.annotation.as_ref().unwrap();
        assert_eq!(annotation.factors.len(), 1);
        assert_eq!(annotation.factors[0].symbol, "mm");
        assert_eq!(annotation.factors[0].power, 2);
    }

    #[test]
    fn test_parse_annotation_with_division() {
        let (document, reporter) = parse_source("v {m/s^2} = 9.81 {m/s^2}");
        assert!(!reporter.has_errors());
        let annotation = document.declarations[0].annotation.as_ref().unwrap();
        assert_eq!(annotation.factors.len(), 2);
        assert_eq!(annotation.factors[0].symbol, "m");
        assert!(!annotation.factors[0].reciprocal);
        assert_eq!(annotation.factors[1].symbol, "s");
        assert!(annotation.factors[1].reciprocal);
        assert_eq!(annotation.factors[1].power, 2);
    }

    #[test]
    fn test_parse_precedence() {
        let (document, reporter) = parse_source("x = 1 + 2 * 3");
        assert!(!reporter.has_errors());
        let Expr::Binary { op, right, .. } = &document.declarations[0].value else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            **right,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_power_right_associative() {
        let (document, reporter) = parse_source("x = 2 ^ 3 ^ 2");
        assert!(!reporter.has_errors());
        let Expr::Binary { op, right, .. } = &document.declarations[0].value else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOp::Pow);
        assert!(matches!(
            **right,
            Expr::Binary {
                op: BinaryOp::Pow,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_unit_assign_binds_tighter_than_pow() {
        let (document, reporter) = parse_source("x = 2 {m} ^ 2");
        assert!(!reporter.has_errors());
        let Expr::Binary { op, left, .. } = &document.declarations[0].value else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOp::Pow);
        assert!(matches!(**left, Expr::UnitAssign { .. }));
    }

    #[test]
    fn test_parse_recovers_after_bad_declaration() {
        let (document, reporter) = parse_source("bad = * 2\ngood = 1");
        assert!(reporter.has_errors());
        assert_eq!(document.declarations.len(), 1);
        assert_eq!(document.declarations[0].name, "good");
    }

    #[test]
    fn test_parse_string_declaration() {
        let (document, reporter) = parse_source(r#"title = "Beam check""#);
        assert!(!reporter.has_errors());
        assert!(matches!(
            document.declarations[0].value,
            Expr::Str { .. }
        ));
    }

    #[test]
    fn test_parse_multiple_declarations() {
        let (document, reporter) = parse_source("a = 1; b = 2\nc = a + b");
        assert!(!reporter.has_errors());
        assert_eq!(document.declarations.len(), 3);
    }
}
