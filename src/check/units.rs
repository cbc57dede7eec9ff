//! Unit inference
//!
//! Bottom-up inference of a [`Unit`] for every subexpression. Units behave
//! as a static type system: `+`/`-` demand dimension equality, `*`/`/`
//! compose freely, and `^` only accepts a compile-time constant exponent
//! because a unit raised to a statically-unknown power has no type.
//!
//! Inference is total: failures return `None` with an error attached to the
//! reporter, and sibling declarations keep checking.

use tracing::trace;

use super::Analysis;
use crate::ast::{BinaryOp, Expr, UnitAnnotation};
use crate::diagnostics::{CompileError, Reporter};
use crate::resolve::ResolvedDocument;
use crate::scope::{DeclId, Scope};
use crate::units::{Rational, Unit, UnitRegistry};

/// Largest denominator accepted when recovering an exact rational exponent
/// from a floating-point constant like `0.5`.
const MAX_EXPONENT_DENOMINATOR: i64 = 16;

pub struct UnitChecker<'a> {
    scope: &'a Scope,
    resolved: &'a ResolvedDocument,
    registry: &'a UnitRegistry,
    analysis: &'a mut Analysis,
    reporter: &'a mut Reporter,
}

impl<'a> UnitChecker<'a> {
    pub fn new(
        resolved: &'a ResolvedDocument,
        registry: &'a UnitRegistry,
        analysis: &'a mut Analysis,
        reporter: &'a mut Reporter,
    ) -> Self {
        Self {
            scope: &resolved.scope,
            resolved,
            registry,
            analysis,
            reporter,
        }
    }

    /// Infer a unit for every declaration, memoized per declaration.
    pub fn run(mut self) {
        let ids: Vec<DeclId> = self.scope.iter().map(|(id, _)| id).collect();
        for id in ids {
            self.check_declaration(id);
        }
    }

    /// The checked unit of a declaration: the asserted annotation when it
    /// is consistent with the inferred expression unit, otherwise the
    /// inferred unit alone. `None` records a failure.
    pub fn check_declaration(&mut self, id: DeclId) -> Option<Unit> {
        if let Some(cached) = self.analysis.units.get(&id) {
            return cached.clone();
        }
        // Cyclic declarations are skipped; their diagnostics already exist.
        if self.analysis.circular.contains(&id) {
            self.analysis.units.insert(id, None);
            return None;
        }
        // Claim the slot before descending: resolution guarantees acyclic
        // descent here, but a poisoned graph must not recurse forever.
        self.analysis.units.insert(id, None);

        let scope = self.scope;
        let declaration = scope.get(id);

        // A bare text declaration is legal and carries no unit; only string
        // literals inside numeric expressions are errors.
        if matches!(declaration.value, Expr::Str { .. }) {
            if let Some(annotation) = &declaration.annotation {
                self.resolve_annotation_reporting(annotation);
            }
            return None;
        }

        let inferred = self.infer_expr(&declaration.value);

        let checked = match (&declaration.annotation, inferred) {
            (None, inferred) => inferred,
            (Some(annotation), None) => {
                // The expression already failed; still surface unknown
                // symbols in the annotation itself.
                self.resolve_annotation_reporting(annotation);
                None
            }
            (Some(annotation), Some(inferred)) => {
                match self.resolve_annotation_reporting(annotation) {
                    None => None,
                    Some(asserted) => {
                        // A dimensionless expression reads in the asserted
                        // unit (`width {mm} = 100` is 100 mm); anything else
                        // must match the assertion's dimensions.
                        if inferred.is_dimensionless() || asserted.equal_dimensions(&inferred) {
                            Some(asserted)
                        } else {
                            self.reporter.error(CompileError::UnitMismatch {
                                expected: display_unit(&asserted),
                                found: display_unit(&inferred),
                                span: annotation.span.into(),
                                src: self.reporter.named_source(),
                            });
                            None
                        }
                    }
                }
            }
        };

        trace!(?id, unit = ?checked.as_ref().map(display_unit), "checked declaration");
        self.analysis.units.insert(id, checked.clone());
        checked
    }

    /// Infer the unit of one expression. `None` means an error was attached
    /// somewhere below; no second diagnostic is added for the same failure.
    pub fn infer_expr(&mut self, expr: &Expr) -> Option<Unit> {
        match expr {
            Expr::Number { .. } => Some(Unit::dimensionless()),
            Expr::Str { span, .. } => {
                self.reporter.error(CompileError::StringInExpression {
                    span: (*span).into(),
                    src: self.reporter.named_source(),
                });
                None
            }
            Expr::Name { id, name, span } => match self.resolved.names.get(id) {
                Some(&target) => {
                    let unit = self.check_declaration(target);
                    // Using a text declaration as a number is the same error
                    // as writing the literal inline.
                    if unit.is_none() && self.is_text_declaration(target) {
                        self.reporter.error(CompileError::StringInExpression {
                            span: (*span).into(),
                            src: self.reporter.named_source(),
                        });
                    }
                    unit
                }
                None => {
                    self.reporter.error(CompileError::CouldNotFindName {
                        name: name.clone(),
                        span: (*span).into(),
                        src: self.reporter.named_source(),
                    });
                    None
                }
            },
            Expr::UnitAssign {
                expr, annotation, ..
            } => {
                let inner = self.infer_expr(expr)?;
                let assigned = self.resolve_annotation_reporting(annotation)?;
                if inner.is_dimensionless() || inner.equal_dimensions(&assigned) {
                    Some(assigned)
                } else {
                    self.reporter.error(CompileError::UnitMismatch {
                        expected: display_unit(&assigned),
                        found: display_unit(&inner),
                        span: annotation.span.into(),
                        src: self.reporter.named_source(),
                    });
                    None
                }
            }
            Expr::Unary { operand, .. } => self.infer_expr(operand),
            Expr::Group { inner, .. } => self.infer_expr(inner),
            Expr::Binary {
                op,
                left,
                right,
                span,
                ..
            } => {
                let left_unit = self.infer_expr(left);
                let right_unit = self.infer_expr(right);
                let (left_unit, right_unit) = (left_unit?, right_unit?);
                match op {
                    BinaryOp::Add | BinaryOp::Sub => {
                        let combined = left_unit.add(&right_unit);
                        if combined.is_valid() {
                            Some(combined)
                        } else {
                            self.reporter.error(CompileError::UnitMismatch {
                                expected: display_unit(&left_unit),
                                found: display_unit(&right_unit),
                                span: (*span).into(),
                                src: self.reporter.named_source(),
                            });
                            None
                        }
                    }
                    BinaryOp::Mul => Some(left_unit.multiply(&right_unit)),
                    BinaryOp::Div => Some(left_unit.divide(&right_unit)),
                    BinaryOp::Pow => self.infer_power(&left_unit, &right_unit, right, expr),
                }
            }
        }
    }

    /// `^` needs a constant, dimensionless exponent; a dimensioned base
    /// additionally needs an exact rational value for the power.
    fn infer_power(
        &mut self,
        base: &Unit,
        exponent_unit: &Unit,
        exponent: &Expr,
        whole: &Expr,
    ) -> Option<Unit> {
        if !exponent_unit.is_dimensionless() {
            self.reporter.error(CompileError::CouldNotResolveUnits {
                reason: "an exponent must be dimensionless".to_string(),
                span: exponent.span().into(),
                src: self.reporter.named_source(),
            });
            return None;
        }
        let Some(value) = exponent.as_constant_number() else {
            self.reporter.error(CompileError::CouldNotResolveUnits {
                reason: "an exponent must be a constant number".to_string(),
                span: exponent.span().into(),
                src: self.reporter.named_source(),
            });
            return None;
        };
        if base.is_dimensionless() {
            return Some(Unit::dimensionless());
        }
        match Rational::approximate(value, MAX_EXPONENT_DENOMINATOR) {
            Some(rational) => Some(base.pow(rational)),
            None => {
                self.reporter.error(CompileError::CouldNotResolveUnits {
                    reason: format!("exponent {value} has no exact rational form"),
                    span: whole.span().into(),
                    src: self.reporter.named_source(),
                });
                None
            }
        }
    }

    fn is_text_declaration(&self, id: DeclId) -> bool {
        matches!(self.scope.get(id).value, Expr::Str { .. })
    }

    /// Resolve a `{...}` annotation, reporting unknown symbols.
    fn resolve_annotation_reporting(&mut self, annotation: &UnitAnnotation) -> Option<Unit> {
        match resolve_annotation(self.registry, annotation) {
            Ok(unit) => Some(unit),
            Err(symbol) => {
                self.reporter.error(CompileError::CouldNotResolveUnits {
                    reason: format!("unknown unit symbol `{symbol}`"),
                    span: annotation.span.into(),
                    src: self.reporter.named_source(),
                });
                None
            }
        }
    }
}

/// Resolve a symbolic annotation against the registry. An empty annotation
/// is explicitly dimensionless. On failure the offending symbol is returned.
pub fn resolve_annotation(
    registry: &UnitRegistry,
    annotation: &UnitAnnotation,
) -> Result<Unit, String> {
    let mut unit = Unit::dimensionless();
    for factor in &annotation.factors {
        let named = registry
            .lookup(&factor.symbol)
            .ok_or_else(|| factor.symbol.clone())?;
        let powered = named.unit.powi(factor.power);
        unit = if factor.reciprocal {
            unit.divide(&powered)
        } else {
            unit.multiply(&powered)
        };
    }
    Ok(unit)
}

fn display_unit(unit: &Unit) -> String {
    let text = unit.to_display_string();
    if text.is_empty() {
        "<dimensionless>".to_string()
    } else {
        text
    }
}
