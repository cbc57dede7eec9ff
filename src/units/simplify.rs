//! Rendering a compound dimension vector back into named units
//!
//! The search greedily factors derived units out of the remaining dimension
//! vector, falls back to raw base units for whatever is left, and finally
//! swaps in a metric-prefixed variant when that lands the displayed number
//! in a readable range. All candidate scans run in registry declaration
//! order, which is the documented tie-break between equally good
//! decompositions.

use tracing::trace;

use crate::units::registry::UnitRegistry;
use crate::units::unit::{Dimension, Unit};

impl Unit {
    /// Find a parsimonious named-unit decomposition that is dimension-equal
    /// to `self`. `reference_value` is the quantity's SI magnitude, used only
    /// to pick a metric prefix; pass `None` when no value is at hand.
    ///
    /// The result always satisfies `result.equal_dimensions(self)`.
    pub fn simplify(&self, registry: &UnitRegistry, reference_value: Option<f64>) -> Unit {
        if !self.is_valid() {
            return self.clone();
        }
        if self.is_dimensionless() {
            return Unit::dimensionless();
        }

        let mut remaining = self.clone();
        let mut result = Unit::dimensionless();

        while !remaining.is_dimensionless() {
            if let Some(step) = exact_finish(&remaining, registry) {
                result = result.multiply(&step);
                remaining = remaining.divide(&step);
                continue;
            }
            if let Some(step) = greedy_factor(&remaining, registry) {
                trace!(factor = %step, "factored derived unit");
                result = result.multiply(&step);
                remaining = remaining.divide(&step);
                continue;
            }
            // No derived unit fits: leftover axes become base units raised
            // to their residual rational powers.
            for dimension in Dimension::ALL {
                let power = remaining.power(dimension);
                if !power.is_zero() {
                    result = result.multiply(&Unit::base(dimension).pow(power));
                }
            }
            break;
        }

        debug_assert!(result.equal_dimensions(self));

        if let Some(value) = reference_value {
            if let Some(nicer) = prefer_readable_magnitude(&result, registry, value) {
                return nicer;
            }
        }
        result
    }
}

/// A derived unit (possibly raised to a whole power) that accounts for the
/// entire remaining vector, scanning in registry declaration order.
fn exact_finish(remaining: &Unit, registry: &UnitRegistry) -> Option<Unit> {
    for named in registry.derived() {
        let k = remaining.whole_divisor_exponent(&named.unit);
        if k >= 1 {
            let step = named.unit.powi(k);
            if remaining.divide(&step).is_dimensionless() {
                return Some(step);
            }
        }
    }
    None
}

/// The best partial factoring step: derived units covering at least two
/// dimension axes, widest coverage first, declaration order on ties.
/// Single-axis derived units (`Hz`) only ever win via an exact finish,
/// so a leftover `s^-1` inside a compound stays a plain `/s`.
fn greedy_factor(remaining: &Unit, registry: &UnitRegistry) -> Option<Unit> {
    let mut candidates: Vec<_> = registry
        .derived()
        .filter(|n| n.unit.dimension_coverage() >= 2)
        .collect();
    candidates.sort_by(|a, b| {
        b.unit
            .dimension_coverage()
            .cmp(&a.unit.dimension_coverage())
    });
    for named in candidates {
        let k = remaining.whole_divisor_exponent(&named.unit);
        if k >= 1 {
            return Some(named.unit.powi(k));
        }
    }
    None
}

/// When the decomposition is a single symbol, look for a dimension-equal
/// variant (metric prefix, or the symbol itself) whose converted value lands
/// in `0.1 ≤ |v| < 1000`. First hit in declaration order wins; when nothing
/// lands in range the caller keeps the unprefixed result.
fn prefer_readable_magnitude(
    result: &Unit,
    registry: &UnitRegistry,
    base_value: f64,
) -> Option<Unit> {
    let [component] = result.components() else {
        return None;
    };
    let power = component.power;
    for named in registry.iter() {
        let candidate = named.unit.pow(power);
        if !candidate.equal_dimensions(result) {
            continue;
        }
        let converted = (base_value * candidate.conversion_factor_from_base()).abs();
        if (0.1..1000.0).contains(&converted) {
            return Some(candidate);
        }
    }
    None
}
