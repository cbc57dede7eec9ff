//! Abstract Syntax Tree for Metrica calculation sheets
//!
//! This module defines the AST types produced by the parser. Expressions
//! form a closed sum type so every pass matches exhaustively; there is no
//! runtime type dispatch anywhere downstream.

use crate::common::{NodeId, Span};
use serde::{Deserialize, Serialize};

/// A parsed calculation sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub declarations: Vec<Declaration>,
}

/// One declaration line, e.g. `area <A> {mm^2} = 100 {mm} * 200 {mm}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub id: NodeId,
    pub name: String,
    /// Display label from a `<...>` block, used by report renderers.
    pub label: Option<String>,
    /// Asserted unit from the declaration's `{...}` annotation.
    pub annotation: Option<UnitAnnotation>,
    pub value: Expr,
    pub span: Span,
}

/// The symbolic form of a `{...}` unit block. Symbols are resolved against
/// the registry during unit checking, not at parse time, so an unknown
/// symbol is a semantic error with a span rather than a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitAnnotation {
    pub factors: Vec<UnitFactor>,
    pub span: Span,
}

impl UnitAnnotation {
    /// An empty `{}` block: explicitly dimensionless.
    pub fn dimensionless(span: Span) -> Self {
        Self {
            factors: Vec::new(),
            span,
        }
    }
}

/// One symbol of a unit annotation, e.g. the `s^2` in `{m/s^2}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitFactor {
    pub symbol: String,
    pub power: i64,
    /// True when the factor follows a `/`.
    pub reciprocal: bool,
}

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Numeric constant
    Number { id: NodeId, value: f64, span: Span },
    /// String literal (text declarations only)
    Str {
        id: NodeId,
        value: String,
        span: Span,
    },
    /// Reference to another declaration
    Name {
        id: NodeId,
        name: String,
        span: Span,
    },
    /// Unit assignment, e.g. `100 {mm}`
    UnitAssign {
        id: NodeId,
        expr: Box<Expr>,
        annotation: UnitAnnotation,
        span: Span,
    },
    /// Unary operation
    Unary {
        id: NodeId,
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    /// Binary operation
    Binary {
        id: NodeId,
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// Parenthesized group
    Group {
        id: NodeId,
        inner: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Number { id, .. }
            | Expr::Str { id, .. }
            | Expr::Name { id, .. }
            | Expr::UnitAssign { id, .. }
            | Expr::Unary { id, .. }
            | Expr::Binary { id, .. }
            | Expr::Group { id, .. } => *id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Number { span, .. }
            | Expr::Str { span, .. }
            | Expr::Name { span, .. }
            | Expr::UnitAssign { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Group { span, .. } => *span,
        }
    }

    /// Fold to a compile-time numeric constant, when the expression is built
    /// only from literals and arithmetic. Names and unit assignments are
    /// runtime values and do not fold.
    pub fn as_constant_number(&self) -> Option<f64> {
        match self {
            Expr::Number { value, .. } => Some(*value),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
                ..
            } => operand.as_constant_number().map(|v| -v),
            Expr::Group { inner, .. } => inner.as_constant_number(),
            Expr::Binary {
                op, left, right, ..
            } => {
                let left = left.as_constant_number()?;
                let right = right.as_constant_number()?;
                Some(match op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Sub => left - right,
                    BinaryOp::Mul => left * right,
                    BinaryOp::Div => left / right,
                    BinaryOp::Pow => left.powf(right),
                })
            }
            Expr::Str { .. } | Expr::Name { .. } | Expr::UnitAssign { .. } => None,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
}
