//! Units of measure: exact rational exponents, dimension-vector algebra,
//! the named-unit registry, and unit-carrying quantities.

pub mod quantity;
pub mod rational;
pub mod registry;
mod simplify;
pub mod unit;

pub use quantity::{Quantity, QuantityError};
pub use rational::Rational;
pub use registry::{NamedUnit, UnitKind, UnitRegistry};
pub use unit::{Dimension, DimensionEntry, Unit, UnitComponent};
