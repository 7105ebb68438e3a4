//! Declared attribute types

use super::unit::UnitTypeId;
use super::value::MetaValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a metadata attribute
///
/// Mirror declarations are only legal between attributes whose declared types
/// are exactly equal, so `ValueType` equality is structural and strict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean value (true/false)
    Boolean,
    /// Integer numeric value
    Integer,
    /// Double-precision floating point value
    Double,
    /// String value
    String,
    /// Reference to a type, stored as its qualified name
    Class,
    /// Constant of the named enum type
    Enum(String),
    /// Nested metadata unit instance of the given type
    Unit(UnitTypeId),
    /// Ordered array with a homogeneous element type
    Array(Box<ValueType>),
}

impl ValueType {
    /// Create an array type with the given element type
    pub fn array(element: ValueType) -> Self {
        ValueType::Array(Box::new(element))
    }

    /// Check whether a concrete value conforms to this declared type
    pub fn accepts(&self, value: &MetaValue) -> bool {
        match (self, value) {
            (ValueType::Boolean, MetaValue::Boolean(_)) => true,
            (ValueType::Integer, MetaValue::Integer(_)) => true,
            (ValueType::Double, MetaValue::Double(_)) => true,
            (ValueType::String, MetaValue::String(_)) => true,
            (ValueType::Class, MetaValue::Class(_)) => true,
            (ValueType::Enum(declared), MetaValue::Enum { enum_type, .. }) => {
                declared == enum_type
            }
            (ValueType::Unit(declared), MetaValue::Nested(instance)) => {
                *declared == instance.unit
            }
            (ValueType::Array(element), MetaValue::Array(values)) => {
                values.iter().all(|v| element.accepts(v))
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Double => write!(f, "double"),
            ValueType::String => write!(f, "string"),
            ValueType::Class => write!(f, "class"),
            ValueType::Enum(name) => write!(f, "enum<{name}>"),
            ValueType::Unit(unit) => write!(f, "unit<{unit}>"),
            ValueType::Array(element) => write!(f, "{element}[]"),
        }
    }
}
