//! Evaluated declaration values

use std::fmt;

use crate::units::Quantity;

/// The value of one declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A number with its unit.
    Quantity(Quantity),
    /// A text declaration (titles, notes).
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Quantity(_) => "quantity",
            Value::Text(_) => "text",
        }
    }

    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            Value::Quantity(quantity) => Some(quantity),
            Value::Text(_) => None,
        }
    }

    pub fn into_quantity(self) -> Option<Quantity> {
        match self {
            Value::Quantity(quantity) => Some(quantity),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Quantity(quantity) => write!(f, "{quantity}"),
            Value::Text(text) => write!(f, "{text}"),
        }
    }
}
