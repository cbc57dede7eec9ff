//! Dimension-vector representation of physical units
//!
//! A [`Unit`] is an immutable vector of rational powers over the fixed base
//! dimensions, with a per-axis scale factor tying the unit back to SI. Every
//! algebraic operation returns a new value; nothing here mutates in place.

use std::fmt;

use crate::units::rational::Rational;

/// The fixed base physical dimensions, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Mass,
    Length,
    Time,
    Current,
    Temperature,
    Angle,
    LuminousIntensity,
    AmountOfSubstance,
}

impl Dimension {
    pub const COUNT: usize = 8;

    pub const ALL: [Dimension; Dimension::COUNT] = [
        Dimension::Mass,
        Dimension::Length,
        Dimension::Time,
        Dimension::Current,
        Dimension::Temperature,
        Dimension::Angle,
        Dimension::LuminousIntensity,
        Dimension::AmountOfSubstance,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The SI base unit symbol for this axis.
    pub fn base_symbol(self) -> &'static str {
        match self {
            Dimension::Mass => "kg",
            Dimension::Length => "m",
            Dimension::Time => "s",
            Dimension::Current => "A",
            Dimension::Temperature => "K",
            Dimension::Angle => "rad",
            Dimension::LuminousIntensity => "cd",
            Dimension::AmountOfSubstance => "mol",
        }
    }
}

/// One axis of a unit: the rational exponent of a base dimension plus the
/// scale factor that converts one unit of this axis into the SI base unit,
/// compounded as the unit is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionEntry {
    pub power: Rational,
    pub factor: f64,
}

impl Default for DimensionEntry {
    fn default() -> Self {
        Self {
            power: Rational::ZERO,
            factor: 1.0,
        }
    }
}

/// One symbol of a unit's display decomposition, e.g. the `mm^2` in the
/// product `mm^2 / s`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitComponent {
    pub symbol: String,
    pub power: Rational,
}

/// A compound physical unit.
///
/// Dimension equality looks only at the powers; factors and the display
/// decomposition are presentation state. An invalid unit (the result of
/// adding dimension-unequal units) poisons every operation it touches.
#[derive(Debug, Clone)]
pub struct Unit {
    entries: [DimensionEntry; Dimension::COUNT],
    components: Vec<UnitComponent>,
    valid: bool,
}

impl Unit {
    /// The unit of a bare number.
    pub fn dimensionless() -> Self {
        Self {
            entries: Default::default(),
            components: Vec::new(),
            valid: true,
        }
    }

    /// The poison unit produced by dimension-mismatched addition.
    pub fn invalid() -> Self {
        Self {
            entries: Default::default(),
            components: Vec::new(),
            valid: false,
        }
    }

    /// The SI base unit of one dimension axis.
    pub fn base(dimension: Dimension) -> Self {
        let mut unit = Self::dimensionless();
        unit.entries[dimension.index()] = DimensionEntry {
            power: Rational::ONE,
            factor: 1.0,
        };
        unit.components.push(UnitComponent {
            symbol: dimension.base_symbol().to_string(),
            power: Rational::ONE,
        });
        unit
    }

    /// A rescaling of an existing unit under a new symbol (`mm`, `kN`, …).
    /// The factor lands on the first axis the unit touches, which keeps the
    /// product of axis factors equal to the overall scale.
    pub fn rescaled(&self, factor: f64, symbol: &str) -> Self {
        let mut unit = self.clone();
        let axis = Dimension::ALL
            .iter()
            .position(|d| !unit.entries[d.index()].power.is_zero())
            .unwrap_or(0);
        unit.entries[axis].factor *= factor;
        unit.components = vec![UnitComponent {
            symbol: symbol.to_string(),
            power: Rational::ONE,
        }];
        unit
    }

    /// Relabel a compound unit under a single derived symbol (`N`, `J`, …).
    pub fn named(&self, symbol: &str) -> Self {
        let mut unit = self.clone();
        unit.components = vec![UnitComponent {
            symbol: symbol.to_string(),
            power: Rational::ONE,
        }];
        unit
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_dimensionless(&self) -> bool {
        self.valid && self.entries.iter().all(|e| e.power.is_zero())
    }

    pub fn power(&self, dimension: Dimension) -> Rational {
        self.entries[dimension.index()].power
    }

    pub fn components(&self) -> &[UnitComponent] {
        &self.components
    }

    /// True iff every dimension power matches. Factors and display
    /// decomposition are irrelevant; invalid units compare equal to nothing.
    pub fn equal_dimensions(&self, other: &Unit) -> bool {
        self.valid
            && other.valid
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a.power == b.power)
    }

    /// Product of the axis factors: one of `self` expressed in SI base units.
    pub fn scale_to_base(&self) -> f64 {
        self.entries.iter().map(|e| e.factor).product()
    }

    /// Factor converting an SI base value into this unit's display scale.
    pub fn conversion_factor_from_base(&self) -> f64 {
        1.0 / self.scale_to_base()
    }

    /// Factor converting a value in `self` units to `target` units.
    /// `None` when the units are not dimension-equal.
    pub fn conversion_factor(&self, target: &Unit) -> Option<f64> {
        if !self.equal_dimensions(target) {
            return None;
        }
        Some(self.scale_to_base() / target.scale_to_base())
    }

    pub fn multiply(&self, other: &Unit) -> Unit {
        if !self.valid || !other.valid {
            return Unit::invalid();
        }
        let mut entries = self.entries;
        for (entry, rhs) in entries.iter_mut().zip(other.entries.iter()) {
            entry.power = entry.power + rhs.power;
            entry.factor *= rhs.factor;
        }
        Unit {
            entries,
            components: merge_components(&self.components, &other.components, false),
            valid: true,
        }
    }

    pub fn divide(&self, other: &Unit) -> Unit {
        if !self.valid || !other.valid {
            return Unit::invalid();
        }
        let mut entries = self.entries;
        for (entry, rhs) in entries.iter_mut().zip(other.entries.iter()) {
            entry.power = entry.power - rhs.power;
            entry.factor /= rhs.factor;
        }
        Unit {
            entries,
            components: merge_components(&self.components, &other.components, true),
            valid: true,
        }
    }

    /// Raise every power by a rational exponent; factors follow as
    /// `factor^exp`, so `sqrt` stays exact on the powers and only the scale
    /// goes through floating point.
    pub fn pow(&self, exp: Rational) -> Unit {
        if !self.valid {
            return Unit::invalid();
        }
        if exp.is_zero() {
            return Unit::dimensionless();
        }
        let mut entries = self.entries;
        for entry in entries.iter_mut() {
            entry.power = entry.power * exp;
            entry.factor = entry.factor.powf(exp.to_f64());
        }
        let components = self
            .components
            .iter()
            .map(|c| UnitComponent {
                symbol: c.symbol.clone(),
                power: c.power * exp,
            })
            .filter(|c| !c.power.is_zero())
            .collect();
        Unit {
            entries,
            components,
            valid: true,
        }
    }

    pub fn powi(&self, exp: i64) -> Unit {
        self.pow(Rational::integer(exp))
    }

    pub fn sqrt(&self) -> Unit {
        self.pow(Rational::new(1, 2))
    }

    /// Addition of units: requires dimension equality, the left operand's
    /// display wins. A mismatch yields the invalid unit rather than a panic
    /// so inference can surface a semantic error instead of crashing.
    pub fn add(&self, other: &Unit) -> Unit {
        if self.equal_dimensions(other) {
            self.clone()
        } else {
            Unit::invalid()
        }
    }

    /// Subtraction carries the same dimension contract as addition.
    pub fn subtract(&self, other: &Unit) -> Unit {
        self.add(other)
    }

    /// Largest rational `k` such that `self` contains at least `k` powers of
    /// every dimension `candidate` carries, with matching sign. Dimensions
    /// the candidate does not touch are ignored.
    pub fn partial_divisor_exponent(&self, candidate: &Unit) -> Rational {
        let mut result: Option<Rational> = None;
        for (own, cand) in self.entries.iter().zip(candidate.entries.iter()) {
            if cand.power.is_zero() {
                continue;
            }
            let ratio = own.power / cand.power;
            if !ratio.is_positive() {
                return Rational::ZERO;
            }
            result = Some(match result {
                Some(r) if r < ratio => r,
                _ => ratio,
            });
        }
        result.unwrap_or(Rational::ZERO)
    }

    /// How many whole copies of `candidate` can be factored out of `self`
    /// while leaving a sign-preserving remainder on every dimension the
    /// candidate carries.
    pub fn whole_divisor_exponent(&self, candidate: &Unit) -> i64 {
        self.partial_divisor_exponent(candidate).floor().max(0)
    }

    /// Number of dimension axes this unit touches.
    pub fn dimension_coverage(&self) -> usize {
        self.entries.iter().filter(|e| !e.power.is_zero()).count()
    }

    /// The display decomposition, synthesizing base-unit components for
    /// units that were built directly from dimension entries.
    fn display_components(&self) -> Vec<UnitComponent> {
        if !self.components.is_empty() {
            return self.components.clone();
        }
        Dimension::ALL
            .iter()
            .filter(|d| !self.entries[d.index()].power.is_zero())
            .map(|d| UnitComponent {
                symbol: d.base_symbol().to_string(),
                power: self.entries[d.index()].power,
            })
            .collect()
    }

    /// Plain-text form, e.g. `"N kg m^2/s"`. Dimensionless units render
    /// empty; an all-negative unit keeps explicit negative exponents.
    pub fn to_display_string(&self) -> String {
        if !self.valid {
            return "<invalid>".to_string();
        }
        let components = self.display_components();
        if components.is_empty() {
            return String::new();
        }
        let numerator: Vec<&UnitComponent> =
            components.iter().filter(|c| c.power.is_positive()).collect();
        let denominator: Vec<&UnitComponent> =
            components.iter().filter(|c| c.power.is_negative()).collect();

        if numerator.is_empty() {
            return components
                .iter()
                .map(|c| format_component(&c.symbol, c.power))
                .collect::<Vec<_>>()
                .join(" ");
        }

        let mut out = numerator
            .iter()
            .map(|c| format_component(&c.symbol, c.power))
            .collect::<Vec<_>>()
            .join(" ");
        if !denominator.is_empty() {
            out.push('/');
            out.push_str(
                &denominator
                    .iter()
                    .map(|c| format_component(&c.symbol, c.power.abs()))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        out
    }

    /// LaTeX form, e.g. `" \text{ N kg m}^{2} \text{ s}^{-1}"`. Consecutive
    /// power-one symbols share a `\text{…}` group; a group closes whenever a
    /// component carries an exponent.
    pub fn to_latex_string(&self) -> String {
        if !self.valid {
            return String::new();
        }
        let components = self.display_components();
        if components.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        let mut open = false;
        for component in &components {
            if !open {
                out.push_str(" \\text{");
                open = true;
            }
            out.push(' ');
            out.push_str(&component.symbol);
            if component.power != Rational::ONE {
                out.push_str(&format!("}}^{{{}}}", component.power));
                open = false;
            }
        }
        if open {
            out.push('}');
        }
        out
    }
}

fn format_component(symbol: &str, power: Rational) -> String {
    if power == Rational::ONE {
        symbol.to_string()
    } else {
        format!("{}^{}", symbol, power)
    }
}

/// Merge display decompositions for a product or quotient: same symbols sum
/// their powers, exhausted symbols drop out, new symbols append in order.
fn merge_components(
    left: &[UnitComponent],
    right: &[UnitComponent],
    negate_right: bool,
) -> Vec<UnitComponent> {
    let mut merged: Vec<UnitComponent> = left.to_vec();
    for component in right {
        let power = if negate_right {
            -component.power
        } else {
            component.power
        };
        match merged.iter_mut().find(|c| c.symbol == component.symbol) {
            Some(existing) => existing.power = existing.power + power,
            None => merged.push(UnitComponent {
                symbol: component.symbol.clone(),
                power,
            }),
        }
    }
    merged.retain(|c| !c.power.is_zero());
    merged
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}
