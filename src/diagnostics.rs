//! Diagnostic reporting with source locations
//!
//! This module provides rich error messages with source locations using miette.

use crate::common::Span;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Source file for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }
}

/// Convert our Span to miette's SourceSpan
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// Compiler diagnostic
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CompileError {
    // === Lex/Parse Errors ===
    #[error("Unexpected character `{found}`")]
    #[diagnostic(code(lex::unexpected_char))]
    UnexpectedCharacter {
        found: String,
        #[label("not valid here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unexpected token: expected {expected}, found {found}")]
    #[diagnostic(code(parse::unexpected_token))]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("unexpected token here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unexpected end of file")]
    #[diagnostic(code(parse::unexpected_eof))]
    UnexpectedEof {
        #[label("expected more tokens")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    // === Name Errors ===
    #[error("Could not find name `{name}`")]
    #[diagnostic(
        code(name::undefined),
        help("every name must be declared somewhere in the sheet")
    )]
    CouldNotFindName {
        name: String,
        #[label("not declared in this sheet")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Ambiguous identifier `{name}`")]
    #[diagnostic(code(name::ambiguous))]
    AmbiguousIdentifier {
        name: String,
        #[label("redeclared here")]
        span: SourceSpan,
        #[label("first declared here")]
        first_span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    // === Structural Errors ===
    #[error("Circular reference through `{name}`")]
    #[diagnostic(
        code(structure::circular_reference),
        help("a declaration may not depend on its own value")
    )]
    CircularReference {
        name: String,
        #[label("participates in a reference cycle")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    // === Unit Errors ===
    #[error("Unit mismatch: expected `{expected}`, found `{found}`")]
    #[diagnostic(code(unit::mismatch))]
    UnitMismatch {
        expected: String,
        found: String,
        #[label("expected `{expected}`")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Could not resolve units: {reason}")]
    #[diagnostic(code(unit::unresolved))]
    CouldNotResolveUnits {
        reason: String,
        #[label("unit inference fails here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("String value used in a numeric expression")]
    #[diagnostic(code(unit::string_in_expression))]
    StringInExpression {
        #[label("text has no unit")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

impl CompileError {
    /// The stable diagnostic code, convenient for tests and exit-code logic.
    pub fn code_str(&self) -> &'static str {
        match self {
            CompileError::UnexpectedCharacter { .. } => "lex::unexpected_char",
            CompileError::UnexpectedToken { .. } => "parse::unexpected_token",
            CompileError::UnexpectedEof { .. } => "parse::unexpected_eof",
            CompileError::CouldNotFindName { .. } => "name::undefined",
            CompileError::AmbiguousIdentifier { .. } => "name::ambiguous",
            CompileError::CircularReference { .. } => "structure::circular_reference",
            CompileError::UnitMismatch { .. } => "unit::mismatch",
            CompileError::CouldNotResolveUnits { .. } => "unit::unresolved",
            CompileError::StringInExpression { .. } => "unit::string_in_expression",
        }
    }
}

/// Error reporter that collects diagnostics
pub struct Reporter {
    source: SourceFile,
    errors: Vec<CompileError>,
    warnings: Vec<CompileError>,
}

impl Reporter {
    pub fn new(source: SourceFile) -> Self {
        Self {
            source,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    pub fn warning(&mut self, warning: CompileError) {
        self.warnings.push(warning);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Create NamedSource for this file
    pub fn named_source(&self) -> NamedSource<String> {
        self.source.to_named_source()
    }

    /// Get the source file
    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    /// Print all diagnostics
    pub fn emit_all(&self) {
        for warning in &self.warnings {
            eprintln!("{:?}", miette::Report::new(warning.clone()));
        }
        for error in &self.errors {
            eprintln!("{:?}", miette::Report::new(error.clone()));
        }
    }

    /// Consume and return errors
    pub fn into_errors(self) -> Vec<CompileError> {
        self.errors
    }

    /// Get errors by reference
    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }
}
