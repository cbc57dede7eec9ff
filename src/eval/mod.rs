//! Default-value evaluation
//!
//! Walks each declaration's expression and produces a concrete value,
//! memoized per declaration so shared dependencies are computed once.
//! Declarations poisoned by earlier passes (cycles, failed inference on
//! something they read) simply produce no value; everything else still
//! evaluates.

mod value;

pub use value::Value;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::check::{Analysis, resolve_annotation};
use crate::resolve::ResolvedDocument;
use crate::scope::{DeclId, Scope};
use crate::units::{Quantity, Rational, UnitRegistry};

/// Evaluate every declaration of a checked document.
pub fn evaluate(
    resolved: &ResolvedDocument,
    analysis: &Analysis,
    registry: &UnitRegistry,
) -> Evaluation {
    let mut evaluator = Evaluator {
        scope: &resolved.scope,
        resolved,
        analysis,
        registry,
        values: FxHashMap::default(),
    };
    let ids: Vec<DeclId> = evaluator.scope.iter().map(|(id, _)| id).collect();
    for id in ids {
        evaluator.eval_declaration(id);
    }
    let computed = evaluator.values.values().filter(|v| v.is_some()).count();
    debug!(
        declarations = resolved.scope.len(),
        computed, "evaluation complete"
    );
    Evaluation {
        values: evaluator.values,
    }
}

/// Evaluated values per declaration. Declarations that could not be
/// evaluated (cycles, upstream errors) have no entry value.
#[derive(Debug)]
pub struct Evaluation {
    values: FxHashMap<DeclId, Option<Value>>,
}

impl Evaluation {
    pub fn value(&self, id: DeclId) -> Option<&Value> {
        self.values.get(&id).and_then(|value| value.as_ref())
    }
}

struct Evaluator<'a> {
    scope: &'a Scope,
    resolved: &'a ResolvedDocument,
    analysis: &'a Analysis,
    registry: &'a UnitRegistry,
    values: FxHashMap<DeclId, Option<Value>>,
}

impl<'a> Evaluator<'a> {
    fn eval_declaration(&mut self, id: DeclId) -> Option<Value> {
        if let Some(cached) = self.values.get(&id) {
            return cached.clone();
        }
        if self.analysis.has_circular_reference(id) {
            self.values.insert(id, None);
            return None;
        }
        self.values.insert(id, None);

        let scope = self.scope;
        let declaration = scope.get(id);
        let value = self.eval_expr(&declaration.value).map(|value| match value {
            Value::Quantity(quantity) => Value::Quantity(self.display_quantity(id, quantity)),
            text => text,
        });

        self.values.insert(id, value.clone());
        value
    }

    /// Pick the display unit for a finished quantity: the asserted unit when
    /// the declaration carries an annotation, otherwise a simplified
    /// decomposition chosen with the quantity's own magnitude.
    fn display_quantity(&self, id: DeclId, quantity: Quantity) -> Quantity {
        if self.scope.get(id).annotation.is_some() {
            if let Some(unit) = self.analysis.assigned_unit(id) {
                if quantity.unit().is_dimensionless() && !unit.is_dimensionless() {
                    // A dimensionless expression reads in the asserted unit.
                    return Quantity::new(quantity.base_value(), unit.clone());
                }
                if let Some(labeled) = quantity.in_unit(unit) {
                    return labeled;
                }
            }
        }
        let simplified = quantity
            .unit()
            .simplify(self.registry, Some(quantity.base_value()));
        quantity.in_unit(&simplified).unwrap_or(quantity)
    }

    fn eval_expr(&mut self, expr: &Expr) -> Option<Value> {
        match expr {
            Expr::Number { value, .. } => Some(Value::Quantity(Quantity::dimensionless(*value))),
            Expr::Str { value, .. } => Some(Value::Text(value.clone())),
            Expr::Name { id, .. } => {
                let target = *self.resolved.names.get(id)?;
                self.eval_declaration(target)
            }
            Expr::UnitAssign {
                expr, annotation, ..
            } => {
                let inner = self.eval_expr(expr)?.into_quantity()?;
                let unit = resolve_annotation(self.registry, annotation).ok()?;
                if inner.unit().is_dimensionless() {
                    Some(Value::Quantity(Quantity::new(inner.base_value(), unit)))
                } else {
                    inner.in_unit(&unit).map(Value::Quantity)
                }
            }
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
                ..
            } => {
                let quantity = self.eval_expr(operand)?.into_quantity()?;
                Some(Value::Quantity(quantity.negate()))
            }
            Expr::Group { inner, .. } => self.eval_expr(inner),
            Expr::Binary {
                op, left, right, ..
            } => {
                let left_value = self.eval_expr(left)?.into_quantity()?;
                if *op == BinaryOp::Pow {
                    return self.eval_power(&left_value, right);
                }
                let right_value = self.eval_expr(right)?.into_quantity()?;
                let result = match op {
                    BinaryOp::Add => left_value.add(&right_value),
                    BinaryOp::Sub => left_value.subtract(&right_value),
                    BinaryOp::Mul => left_value.multiply(&right_value),
                    BinaryOp::Div => left_value.divide(&right_value),
                    BinaryOp::Pow => unreachable!("handled above"),
                };
                if result.unit().is_valid() {
                    Some(Value::Quantity(result))
                } else {
                    // The unit checker already reported the mismatch.
                    None
                }
            }
        }
    }

    fn eval_power(&mut self, base: &Quantity, exponent: &Expr) -> Option<Value> {
        let value = exponent.as_constant_number()?;
        if base.unit().is_dimensionless() {
            return Some(Value::Quantity(Quantity::dimensionless(
                base.base_value().powf(value),
            )));
        }
        let rational = Rational::approximate(value, 16)?;
        Some(Value::Quantity(base.pow(rational)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::analyze;
    use crate::diagnostics::{Reporter, SourceFile};
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::resolve::resolve;

    fn eval_source(source: &str) -> (ResolvedDocument, Analysis, Evaluation) {
        let registry = UnitRegistry::global();
        let mut reporter = Reporter::new(SourceFile::new("test.mt", source));
        let tokens = lex(source, &mut reporter);
        let document = parse(&tokens, &mut reporter);
        let resolved = resolve(document, &mut reporter);
        let analysis = analyze(&resolved, registry, &mut reporter);
        let evaluation = evaluate(&resolved, &analysis, registry);
        (resolved, analysis, evaluation)
    }

    fn quantity_of<'e>(
        resolved: &ResolvedDocument,
        evaluation: &'e Evaluation,
        name: &str,
    ) -> &'e Quantity {
        let id = resolved.scope.try_get_declaration(name).expect("declared");
        match evaluation.value(id) {
            Some(Value::Quantity(quantity)) => quantity,
            other => panic!("expected quantity for {name}, got {other:?}"),
        }
    }

    #[test]
    fn test_evaluates_area() {
        let (resolved, _, evaluation) = eval_source("area {mm^2} = 100 {mm} * 200 {mm}");
        let area = quantity_of(&resolved, &evaluation, "area");
        assert!((area.base_value() - 0.02).abs() < 1e-12);
        assert!((area.converted_value() - 20_000.0).abs() < 1e-6);
        assert_eq!(area.unit().to_display_string(), "mm^2");
    }

    #[test]
    fn test_shared_dependency_memoized() {
        let (resolved, _, evaluation) = eval_source("a = 2\nb = a + a\nc = b * a");
        let c = quantity_of(&resolved, &evaluation, "c");
        assert!((c.base_value() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_cyclic_declaration_not_evaluated() {
        let (resolved, analysis, evaluation) = eval_source("x = 13 + y\ny = 25 + x\na = 45");
        let x = resolved.scope.try_get_declaration("x").unwrap();
        assert!(analysis.has_circular_reference(x));
        assert!(evaluation.value(x).is_none());
        // Unrelated declarations still evaluate.
        let a = quantity_of(&resolved, &evaluation, "a");
        assert!((a.base_value() - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_unannotated_result_simplifies_for_display() {
        let (resolved, _, evaluation) = eval_source("f = 2 {kg} * 3 {m} / (1 {s} * 1 {s})");
        let f = quantity_of(&resolved, &evaluation, "f");
        assert_eq!(f.unit().to_display_string(), "N");
        assert!((f.converted_value() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_sqrt_via_fractional_power() {
        let (resolved, _, evaluation) = eval_source("side = (400 {mm^2}) ^ 0.5");
        let side = quantity_of(&resolved, &evaluation, "side");
        assert!((side.base_value() - 0.02).abs() < 1e-12);
        assert_eq!(side.unit().to_display_string(), "mm");
    }

    #[test]
    fn test_text_declaration() {
        let (resolved, _, evaluation) = eval_source(r#"title = "Beam check""#);
        let id = resolved.scope.try_get_declaration("title").unwrap();
        match evaluation.value(id) {
            Some(Value::Text(text)) => assert_eq!(text, "Beam check"),
            other => panic!("expected text, got {other:?}"),
        }
    }
}
