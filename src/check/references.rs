//! Transitive reference collection and cycle detection
//!
//! For every declaration this pass computes the set of declarations its
//! expression transitively reads. A declaration already on the visited
//! path is a cycle: the recursion stops there and `{declaration}` flows
//! back as a poison value, flagging every node whose set ends up containing
//! itself or an already-flagged declaration.
//!
//! A set is cached only when it was fully computed, meaning it is
//! disjoint from the visited path (the node included). A set cut short by
//! a cycle would be incomplete if replayed from a different root, so those
//! stay uncached and the flagged nodes themselves are cheap to revisit.

use rustc_hash::FxHashSet;
use tracing::trace;

use super::Analysis;
use crate::ast::Expr;
use crate::diagnostics::{CompileError, Reporter};
use crate::resolve::ResolvedDocument;
use crate::scope::{DeclId, Scope};

pub struct ReferenceChecker<'a> {
    scope: &'a Scope,
    resolved: &'a ResolvedDocument,
    analysis: &'a mut Analysis,
    reporter: &'a mut Reporter,
}

impl<'a> ReferenceChecker<'a> {
    pub fn new(
        resolved: &'a ResolvedDocument,
        analysis: &'a mut Analysis,
        reporter: &'a mut Reporter,
    ) -> Self {
        Self {
            scope: &resolved.scope,
            resolved,
            analysis,
            reporter,
        }
    }

    /// Visit every declaration. Memoization makes the total cost linear in
    /// the graph size regardless of visitation order or sharing.
    pub fn run(mut self) {
        let ids: Vec<DeclId> = self.scope.iter().map(|(id, _)| id).collect();
        for id in ids {
            let mut path = Vec::new();
            self.visit_declaration(id, &mut path);
        }
    }

    /// The set of declarations `id` transitively references.
    pub fn visit_declaration(&mut self, id: DeclId, path: &mut Vec<DeclId>) -> FxHashSet<DeclId> {
        if let Some(cached) = self.analysis.references.get(&id) {
            return cached.clone();
        }
        if path.contains(&id) {
            // Reentry: stop here and let `{id}` poison every ancestor.
            self.flag_circular(id);
            let mut poison = FxHashSet::default();
            poison.insert(id);
            return poison;
        }

        path.push(id);
        let scope = self.scope;
        let set = self.visit_expr(&scope.get(id).value, path);
        path.pop();

        if set.contains(&id) || set.iter().any(|d| self.analysis.circular.contains(d)) {
            self.flag_circular(id);
        }

        let fully_computed = !set.contains(&id) && !path.iter().any(|p| set.contains(p));
        if fully_computed {
            trace!(?id, size = set.len(), "cached reference set");
            self.analysis.references.insert(id, set.clone());
        }
        set
    }

    fn visit_expr(&mut self, expr: &Expr, path: &mut Vec<DeclId>) -> FxHashSet<DeclId> {
        match expr {
            Expr::Number { .. } | Expr::Str { .. } => FxHashSet::default(),
            Expr::Name { id, .. } => {
                // An unresolved name contributes nothing; the unit checker
                // reports it.
                match self.resolved.names.get(id) {
                    Some(&target) => {
                        let mut set = self.visit_declaration(target, path);
                        set.insert(target);
                        set
                    }
                    None => FxHashSet::default(),
                }
            }
            Expr::UnitAssign { expr, .. } => self.visit_expr(expr, path),
            Expr::Unary { operand, .. } => self.visit_expr(operand, path),
            Expr::Binary { left, right, .. } => {
                let mut set = self.visit_expr(left, path);
                set.extend(self.visit_expr(right, path));
                set
            }
            Expr::Group { inner, .. } => self.visit_expr(inner, path),
        }
    }

    fn flag_circular(&mut self, id: DeclId) {
        if self.analysis.circular.insert(id) {
            let declaration = self.scope.get(id);
            self.reporter.error(CompileError::CircularReference {
                name: declaration.name.clone(),
                span: declaration.span.into(),
                src: self.reporter.named_source(),
            });
        }
    }
}
