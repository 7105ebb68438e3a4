//! Runtime attribute values

use super::unit::UnitInstance;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// A concrete attribute value as read off a metadata attachment
///
/// Values are plain data: resolution never mutates them, and equality is the
/// basis of mirror-conflict detection. Class references are carried as their
/// qualified names so that resolving metadata never forces a type to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    /// Boolean value
    Boolean(bool),
    /// Integer value (64-bit signed)
    Integer(i64),
    /// Double-precision floating point value
    Double(f64),
    /// String value
    String(String),
    /// Type reference, stored as the qualified type name
    Class(String),
    /// Enum constant
    Enum {
        /// Qualified name of the enum type
        enum_type: String,
        /// Constant name
        constant: String,
    },
    /// Nested metadata unit instance
    Nested(Box<UnitInstance>),
    /// Ordered array of values
    Array(Vec<MetaValue>),
}

impl MetaValue {
    /// Create a string value
    pub fn string(value: impl Into<String>) -> Self {
        MetaValue::String(value.into())
    }

    /// Create a class-reference value from a qualified type name
    pub fn class(name: impl Into<String>) -> Self {
        MetaValue::Class(name.into())
    }

    /// Create an enum-constant value
    pub fn enum_constant(enum_type: impl Into<String>, constant: impl Into<String>) -> Self {
        MetaValue::Enum {
            enum_type: enum_type.into(),
            constant: constant.into(),
        }
    }

    /// Create an array of string values
    pub fn array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MetaValue::Array(values.into_iter().map(MetaValue::string).collect())
    }

    /// Create a nested-instance value
    pub fn nested(instance: UnitInstance) -> Self {
        MetaValue::Nested(Box::new(instance))
    }

    /// Extract a boolean, if this value is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract an integer, if this value is one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a string slice, if this value is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract the qualified name of a class reference
    pub fn as_class(&self) -> Option<&str> {
        match self {
            MetaValue::Class(name) => Some(name),
            _ => None,
        }
    }

    /// Extract the array elements, if this value is an array
    pub fn as_array(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Convert to a JSON value
    ///
    /// Class references and enum constants render as strings; nested instances
    /// render as objects of their explicitly supplied values.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetaValue::Boolean(b) => json!(b),
            MetaValue::Integer(i) => json!(i),
            MetaValue::Double(d) => json!(d),
            MetaValue::String(s) => json!(s),
            MetaValue::Class(name) => json!(name),
            MetaValue::Enum { constant, .. } => json!(constant),
            MetaValue::Nested(instance) => {
                let map: serde_json::Map<String, serde_json::Value> = instance
                    .values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                serde_json::Value::Object(map)
            }
            MetaValue::Array(values) => {
                serde_json::Value::Array(values.iter().map(MetaValue::to_json).collect())
            }
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Boolean(b) => write!(f, "{b}"),
            MetaValue::Integer(i) => write!(f, "{i}"),
            MetaValue::Double(d) => write!(f, "{d}"),
            MetaValue::String(s) => write!(f, "\"{s}\""),
            MetaValue::Class(name) => write!(f, "{name}.class"),
            MetaValue::Enum {
                enum_type,
                constant,
            } => write!(f, "{enum_type}::{constant}"),
            MetaValue::Nested(instance) => write!(f, "@{}", instance.unit),
            MetaValue::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Boolean(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Double(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        assert_eq!(MetaValue::string("a.xml").to_string(), "\"a.xml\"");
        assert_eq!(MetaValue::class("com.example.App").to_string(), "com.example.App.class");
        assert_eq!(MetaValue::array(["a", "b"]).to_string(), "[\"a\", \"b\"]");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(MetaValue::Integer(3).to_json(), json!(3));
        assert_eq!(MetaValue::array(["x"]).to_json(), json!(["x"]));
        assert_eq!(
            MetaValue::enum_constant("Mode", "LAZY").to_json(),
            json!("LAZY")
        );
    }
}
