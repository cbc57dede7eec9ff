//! The named-unit registry
//!
//! A fixed, process-wide table mapping unit symbols to their dimension
//! vectors. Construction is explicit and deterministic: base units first,
//! then pure rescalings, then derived coherent units expressed in terms of
//! already-registered entries. Declaration order matters: it is the
//! documented tie-break for the simplification search and for prefix
//! selection, so new symbols must be appended with care.

use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::units::unit::{Dimension, Unit};

/// Partition of the registry used by the simplification search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// SI base unit of one dimension axis (`kg`, `m`, `s`, …).
    Base,
    /// Pure rescaling of another unit (`mm`, `min`, `kN`, …).
    Scaled,
    /// Coherent derived unit with its own symbol (`N`, `Pa`, `J`, …).
    Derived,
}

/// A registered unit symbol.
#[derive(Debug, Clone)]
pub struct NamedUnit {
    pub symbol: &'static str,
    pub kind: UnitKind,
    pub unit: Unit,
}

/// Symbol table of every unit the language knows.
#[derive(Debug)]
pub struct UnitRegistry {
    units: IndexMap<&'static str, NamedUnit>,
}

impl UnitRegistry {
    /// Build the full table. Order is load-bearing; see module docs.
    pub fn new() -> Self {
        let mut registry = Self {
            units: IndexMap::new(),
        };

        // Base units, one per dimension axis.
        for dimension in Dimension::ALL {
            registry.register(dimension.base_symbol(), UnitKind::Base, Unit::base(dimension));
        }

        let kg = registry.expect_unit("kg");
        let m = registry.expect_unit("m");
        let s = registry.expect_unit("s");
        let ampere = registry.expect_unit("A");
        let rad = registry.expect_unit("rad");

        // Rescalings of the base units.
        registry.register("g", UnitKind::Scaled, kg.rescaled(1e-3, "g"));
        registry.register("mg", UnitKind::Scaled, kg.rescaled(1e-6, "mg"));
        registry.register("t", UnitKind::Scaled, kg.rescaled(1e3, "t"));
        registry.register("km", UnitKind::Scaled, m.rescaled(1e3, "km"));
        // mm before cm: declaration order is the prefix preference order,
        // and drawings dimension in millimetres.
        registry.register("mm", UnitKind::Scaled, m.rescaled(1e-3, "mm"));
        registry.register("cm", UnitKind::Scaled, m.rescaled(1e-2, "cm"));
        registry.register("ms", UnitKind::Scaled, s.rescaled(1e-3, "ms"));
        registry.register("min", UnitKind::Scaled, s.rescaled(60.0, "min"));
        registry.register("h", UnitKind::Scaled, s.rescaled(3600.0, "h"));
        registry.register(
            "deg",
            UnitKind::Scaled,
            rad.rescaled(std::f64::consts::PI / 180.0, "deg"),
        );
        registry.register("L", UnitKind::Scaled, m.powi(3).rescaled(1e-3, "L"));

        // Derived coherent units, each in terms of earlier entries.
        let newton = kg.multiply(&m).divide(&s.powi(2)).named("N");
        registry.register("N", UnitKind::Derived, newton.clone());
        let pascal = newton.divide(&m.powi(2)).named("Pa");
        registry.register("Pa", UnitKind::Derived, pascal.clone());
        let joule = newton.multiply(&m).named("J");
        registry.register("J", UnitKind::Derived, joule.clone());
        let watt = joule.divide(&s).named("W");
        registry.register("W", UnitKind::Derived, watt.clone());
        registry.register("Hz", UnitKind::Derived, Unit::dimensionless().divide(&s).named("Hz"));
        registry.register("C", UnitKind::Derived, ampere.multiply(&s).named("C"));
        registry.register("V", UnitKind::Derived, watt.divide(&ampere).named("V"));

        // Prefixed variants of the derived units.
        registry.register("kN", UnitKind::Scaled, newton.rescaled(1e3, "kN"));
        registry.register("MN", UnitKind::Scaled, newton.rescaled(1e6, "MN"));
        registry.register("kPa", UnitKind::Scaled, pascal.rescaled(1e3, "kPa"));
        registry.register("MPa", UnitKind::Scaled, pascal.rescaled(1e6, "MPa"));
        registry.register("GPa", UnitKind::Scaled, pascal.rescaled(1e9, "GPa"));
        registry.register("kJ", UnitKind::Scaled, joule.rescaled(1e3, "kJ"));
        registry.register("kW", UnitKind::Scaled, watt.rescaled(1e3, "kW"));

        registry
    }

    /// The shared read-only instance. Passes take `&UnitRegistry` explicitly;
    /// this exists so unit literals can resolve without threading the table
    /// through the parser.
    pub fn global() -> &'static UnitRegistry {
        static GLOBAL: OnceLock<UnitRegistry> = OnceLock::new();
        GLOBAL.get_or_init(UnitRegistry::new)
    }

    fn register(&mut self, symbol: &'static str, kind: UnitKind, unit: Unit) {
        let previous = self.units.insert(symbol, NamedUnit { symbol, kind, unit });
        debug_assert!(previous.is_none(), "duplicate unit symbol {symbol}");
    }

    // Construction-time lookup of an already-registered symbol.
    fn expect_unit(&self, symbol: &str) -> Unit {
        self.units
            .get(symbol)
            .map(|n| n.unit.clone())
            .expect("unit registered earlier in construction")
    }

    /// Look up a symbol, e.g. from a `{...}` annotation.
    pub fn lookup(&self, symbol: &str) -> Option<&NamedUnit> {
        self.units.get(symbol)
    }

    /// All named units in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedUnit> {
        self.units.values()
    }

    /// The derived coherent units in declaration order: the search space for
    /// unit simplification.
    pub fn derived(&self) -> impl Iterator<Item = &NamedUnit> {
        self.iter().filter(|n| n.kind == UnitKind::Derived)
    }

    /// The SI base units in declaration order.
    pub fn base_units(&self) -> impl Iterator<Item = &NamedUnit> {
        self.iter().filter(|n| n.kind == UnitKind::Base)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
