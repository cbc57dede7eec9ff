//! Value/unit pairs
//!
//! The numeric value is always stored SI-normalized, so arithmetic is a
//! plain operation on `f64` and the resulting unit is computed
//! independently through unit algebra. Simplification therefore only ever
//! has to happen at display time.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::units::rational::Rational;
use crate::units::unit::Unit;

/// Absolute tolerance for quantity equality.
const EQ_EPSILON: f64 = 1e-14;

/// Caller contract violations on quantity operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("cannot order quantities of different dimensions")]
    DimensionMismatch,
}

/// A numeric value carrying a physical unit.
#[derive(Debug, Clone)]
pub struct Quantity {
    base_value: f64,
    unit: Unit,
}

impl Quantity {
    /// Wrap a value already expressed in SI base units.
    pub fn from_base(base_value: f64, unit: Unit) -> Self {
        Self { base_value, unit }
    }

    /// Wrap a value expressed in `unit`'s own scale (`100` with `mm` stores
    /// `0.1` metres).
    pub fn new(value: f64, unit: Unit) -> Self {
        let base_value = value * unit.scale_to_base();
        Self { base_value, unit }
    }

    /// A bare number.
    pub fn dimensionless(value: f64) -> Self {
        Self {
            base_value: value,
            unit: Unit::dimensionless(),
        }
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// The value in the carried unit's display scale.
    pub fn converted_value(&self) -> f64 {
        self.base_value * self.unit.conversion_factor_from_base()
    }

    /// Re-label with a dimension-equal display unit; the base value is
    /// unchanged. `None` when the units do not share dimensions.
    pub fn in_unit(&self, unit: &Unit) -> Option<Quantity> {
        if !self.unit.equal_dimensions(unit) {
            return None;
        }
        Some(Quantity {
            base_value: self.base_value,
            unit: unit.clone(),
        })
    }

    pub fn add(&self, other: &Quantity) -> Quantity {
        Quantity {
            base_value: self.base_value + other.base_value,
            unit: self.unit.add(&other.unit),
        }
    }

    pub fn subtract(&self, other: &Quantity) -> Quantity {
        Quantity {
            base_value: self.base_value - other.base_value,
            unit: self.unit.subtract(&other.unit),
        }
    }

    pub fn multiply(&self, other: &Quantity) -> Quantity {
        Quantity {
            base_value: self.base_value * other.base_value,
            unit: self.unit.multiply(&other.unit),
        }
    }

    pub fn divide(&self, other: &Quantity) -> Quantity {
        Quantity {
            base_value: self.base_value / other.base_value,
            unit: self.unit.divide(&other.unit),
        }
    }

    pub fn negate(&self) -> Quantity {
        Quantity {
            base_value: -self.base_value,
            unit: self.unit.clone(),
        }
    }

    pub fn pow(&self, exp: Rational) -> Quantity {
        Quantity {
            base_value: self.base_value.powf(exp.to_f64()),
            unit: self.unit.pow(exp),
        }
    }

    pub fn sqrt(&self) -> Quantity {
        self.pow(Rational::new(1, 2))
    }

    /// Ordering requires dimension equality; mismatches are a hard error,
    /// never a silent `false`.
    pub fn try_compare(&self, other: &Quantity) -> Result<Ordering, QuantityError> {
        if !self.unit.equal_dimensions(&other.unit) {
            return Err(QuantityError::DimensionMismatch);
        }
        self.base_value
            .partial_cmp(&other.base_value)
            .ok_or(QuantityError::DimensionMismatch)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.unit.equal_dimensions(&other.unit)
            && (self.base_value - other.base_value).abs() < EQ_EPSILON
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit.to_display_string();
        if unit.is_empty() {
            write!(f, "{}", self.converted_value())
        } else {
            write!(f, "{} {}", self.converted_value(), unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::registry::UnitRegistry;

    fn unit(symbol: &str) -> Unit {
        UnitRegistry::global()
            .lookup(symbol)
            .expect("registered")
            .unit
            .clone()
    }

    #[test]
    fn test_new_normalizes_to_base() {
        let q = Quantity::new(100.0, unit("mm"));
        assert!((q.base_value() - 0.1).abs() < 1e-12);
        assert!((q.converted_value() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_addition_in_base_units() {
        let a = Quantity::new(100.0, unit("mm"));
        let b = Quantity::new(1.0, unit("m"));
        let sum = a.add(&b);
        assert!((sum.base_value() - 1.1).abs() < 1e-12);
        // Display follows the left operand.
        assert!((sum.converted_value() - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_addition_dimension_mismatch_poisons_unit() {
        let a = Quantity::new(1.0, unit("m"));
        let b = Quantity::new(1.0, unit("s"));
        let sum = a.add(&b);
        assert!(!sum.unit().is_valid());
    }

    #[test]
    fn test_multiplication_composes_units() {
        let a = Quantity::new(100.0, unit("mm"));
        let b = Quantity::new(200.0, unit("mm"));
        let area = a.multiply(&b);
        assert!((area.base_value() - 0.02).abs() < 1e-12);
        assert_eq!(area.unit().to_display_string(), "mm^2");
        assert!((area.converted_value() - 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_pow_and_sqrt() {
        let side = Quantity::new(2.0, unit("m"));
        let area = side.pow(Rational::integer(2));
        assert!((area.base_value() - 4.0).abs() < 1e-12);
        let back = area.sqrt();
        assert!(back == side);
    }

    #[test]
    fn test_equality_tolerance() {
        let a = Quantity::from_base(1.0, unit("m"));
        let b = Quantity::from_base(1.0 + 1e-15, unit("m"));
        let c = Quantity::from_base(1.0 + 1e-9, unit("m"));
        assert!(a == b);
        assert!(a != c);
    }

    #[test]
    fn test_try_compare() {
        let a = Quantity::new(1.0, unit("m"));
        let b = Quantity::new(500.0, unit("mm"));
        assert_eq!(a.try_compare(&b), Ok(Ordering::Greater));
        let t = Quantity::new(1.0, unit("s"));
        assert_eq!(a.try_compare(&t), Err(QuantityError::DimensionMismatch));
    }

    #[test]
    fn test_conversion_between_named_units() {
        let hours = unit("h");
        let minutes = unit("min");
        let factor = hours.conversion_factor(&minutes).unwrap();
        assert!((factor - 60.0).abs() < 1e-9);
    }
}
