//! Metrica (M) Calculation Language Compiler
//!
//! A small declarative language for engineering calculation sheets in which
//! every numeric value carries a physical unit:
//!
//! ```text
//! width  <b> {mm}   = 100
//! height <h> {mm}   = 200
//! area   <A> {mm^2} = width {mm} * height {mm}
//! ```
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Parser → Resolver → {Reference Checker, Unit Checker}
//!        → Evaluator → Report renderer
//! ```
//!
//! Units are dimension vectors with exact rational exponents; dependency
//! analysis memoizes per-declaration results so each node is visited once
//! regardless of sharing or visitation order, and circular references are
//! reported without aborting the rest of the sheet.

pub mod ast;
pub mod check;
pub mod common;
pub mod config;
pub mod diagnostics;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod resolve;
pub mod scope;
pub mod units;

// Re-export diagnostics for convenience
pub use diagnostics::{CompileError, Reporter, SourceFile};

// Re-exports for convenience
pub use check::Analysis;
pub use eval::Evaluation;
pub use resolve::ResolvedDocument;
pub use units::{Quantity, Rational, Unit, UnitRegistry};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything the pipeline produces for one sheet. The pipeline is total:
/// errors accumulate in `errors` and every stage still runs over whatever
/// the previous stage could produce.
pub struct Sheet {
    pub resolved: ResolvedDocument,
    pub analysis: Analysis,
    pub evaluation: Evaluation,
    pub errors: Vec<CompileError>,
}

impl Sheet {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Run the full pipeline over one source file.
pub fn process(name: &str, source: &str) -> Sheet {
    let registry = UnitRegistry::global();
    let mut reporter = Reporter::new(SourceFile::new(name, source));
    let tokens = lexer::lex(source, &mut reporter);
    let document = parser::parse(&tokens, &mut reporter);
    let resolved = resolve::resolve(document, &mut reporter);
    let analysis = check::analyze(&resolved, registry, &mut reporter);
    let evaluation = eval::evaluate(&resolved, &analysis, registry);
    Sheet {
        resolved,
        analysis,
        evaluation,
        errors: reporter.into_errors(),
    }
}

/// Parse source code to an AST
pub fn parse(source: &str) -> miette::Result<ast::Document> {
    let mut reporter = Reporter::new(SourceFile::new("<input>", source));
    let tokens = lexer::lex(source, &mut reporter);
    let document = parser::parse(&tokens, &mut reporter);
    match reporter.into_errors().into_iter().next() {
        Some(error) => Err(miette::Report::new(error)),
        None => Ok(document),
    }
}

/// Check source code without evaluating; fails on the first diagnostic.
pub fn check_source(source: &str) -> miette::Result<()> {
    let sheet = process("<input>", source);
    match sheet.errors.into_iter().next() {
        Some(error) => Err(miette::Report::new(error)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_process_clean_sheet() {
        let sheet = process("sheet.mt", "area {mm^2} = 100 {mm} * 200 {mm}");
        assert!(!sheet.has_errors());
        assert_eq!(sheet.resolved.scope.len(), 1);
    }

    #[test]
    fn test_check_source_reports_first_error() {
        assert!(check_source("x = 1 {m} + 1 {s}").is_err());
        assert!(check_source("x = 1 {m} + 1 {mm}").is_ok());
    }
}
