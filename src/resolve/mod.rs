//! Name resolution pass
//!
//! Moves parsed declarations into a [`Scope`] arena, reports duplicate
//! names, and records which declaration every name expression refers to.
//! Missing names are left unresolved here; the unit checker owns that
//! diagnostic, so it can point at the exact expression that needs the name.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ast::{Document, Expr};
use crate::common::NodeId;
use crate::diagnostics::{CompileError, Reporter};
use crate::scope::{DeclId, Declaration, Scope};

/// Resolved target of each `Expr::Name` node.
pub type NameTable = FxHashMap<NodeId, DeclId>;

/// A document whose declarations live in a scope arena.
#[derive(Debug)]
pub struct ResolvedDocument {
    pub scope: Scope,
    pub names: NameTable,
}

/// Resolve a parsed document.
pub fn resolve(document: Document, reporter: &mut Reporter) -> ResolvedDocument {
    let mut scope = Scope::new();

    // First pass: collect all declarations so later lines can reference
    // earlier ones and vice versa.
    for declaration in document.declarations {
        let span = declaration.span;
        let name = declaration.name.clone();
        let (_, existing) = scope.insert(Declaration {
            name: declaration.name,
            label: declaration.label,
            annotation: declaration.annotation,
            value: declaration.value,
            span,
            node_id: declaration.id,
        });
        if let Some(existing) = existing {
            let first_span = scope.get(existing).span;
            reporter.error(CompileError::AmbiguousIdentifier {
                name,
                span: span.into(),
                first_span: first_span.into(),
                src: reporter.named_source(),
            });
        }
    }

    // Second pass: record the target of every name expression.
    let mut names = NameTable::default();
    for (_, declaration) in scope.iter() {
        record_references(&declaration.value, &scope, &mut names);
    }

    debug!(
        declarations = scope.len(),
        references = names.len(),
        "resolved document"
    );
    ResolvedDocument { scope, names }
}

fn record_references(expr: &Expr, scope: &Scope, names: &mut NameTable) {
    match expr {
        Expr::Number { .. } | Expr::Str { .. } => {}
        Expr::Name { id, name, .. } => {
            if let Some(target) = scope.try_get_declaration(name) {
                names.insert(*id, target);
            }
        }
        Expr::UnitAssign { expr, .. } => record_references(expr, scope, names),
        Expr::Unary { operand, .. } => record_references(operand, scope, names),
        Expr::Binary { left, right, .. } => {
            record_references(left, scope, names);
            record_references(right, scope, names);
        }
        Expr::Group { inner, .. } => record_references(inner, scope, names),
    }
}
