//! Schema-level error types

use super::types::ValueType;
use crate::mapping::MirrorConflict;
use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while validating a unit-type schema or building its mapping
/// tree
///
/// Schema errors are raised once per unit type and cached; every later query
/// against the same unit type observes the identical error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The unit type was never declared
    #[error("Unit type '{unit}' is not declared")]
    UnknownUnitType {
        /// Unit-type name
        unit: String,
    },

    /// Two attributes of one unit share a name
    #[error("Unit '{unit}' declares attribute '{attribute}' more than once")]
    DuplicateAttribute {
        /// Unit-type name
        unit: String,
        /// Attribute name
        attribute: String,
    },

    /// An alias declaration names its target through both shorthand and
    /// explicit fields
    #[error(
        "Alias on '{unit}.{attribute}' declares both 'value' and 'attribute'; only one may name the target"
    )]
    ConflictingAliasTarget {
        /// Declaring unit
        unit: String,
        /// Declaring attribute
        attribute: String,
    },

    /// An alias declaration points back at the declaring attribute
    #[error("Alias on '{unit}.{attribute}' points to itself")]
    SelfAlias {
        /// Declaring unit
        unit: String,
        /// Declaring attribute
        attribute: String,
    },

    /// The alias target attribute does not exist in the target unit
    #[error(
        "Alias on '{unit}.{attribute}' targets '{target_unit}.{target}', which is not declared"
    )]
    UnknownAliasTarget {
        /// Declaring unit
        unit: String,
        /// Declaring attribute
        attribute: String,
        /// Target unit
        target_unit: String,
        /// Target attribute
        target: String,
    },

    /// Alias partners declare different value types
    #[error(
        "Alias partners '{unit}.{attribute}' ({declared}) and '{target_unit}.{target}' ({target_type}) must declare the same value type"
    )]
    AliasTypeMismatch {
        /// Declaring unit
        unit: String,
        /// Declaring attribute
        attribute: String,
        /// Declared type of the declaring attribute
        declared: ValueType,
        /// Target unit
        target_unit: String,
        /// Target attribute
        target: String,
        /// Declared type of the target attribute
        target_type: ValueType,
    },

    /// An aliased attribute is missing its required default value
    #[error("Aliased attribute '{unit}.{attribute}' must declare a default value")]
    MissingDefault {
        /// Declaring unit
        unit: String,
        /// Attribute lacking a default
        attribute: String,
    },

    /// Same-unit alias partners declare differing default values
    #[error(
        "Mirror pair '{unit}.{attribute}' and '{unit}.{target}' must declare the same default value"
    )]
    DefaultMismatch {
        /// Declaring unit
        unit: String,
        /// Declaring attribute
        attribute: String,
        /// Target attribute
        target: String,
    },

    /// A declared default value does not conform to the attribute's type
    #[error("Default value of '{unit}.{attribute}' does not match its declared type {declared}")]
    DefaultWrongType {
        /// Declaring unit
        unit: String,
        /// Attribute name
        attribute: String,
        /// Declared value type
        declared: ValueType,
    },

    /// A cross-unit alias targets a unit type that is not reachable through
    /// the meta-declaration chain of the mapped root
    #[error(
        "Alias on '{unit}.{attribute}' targets unit '{target_unit}', which is not meta-present on root unit '{root}'"
    )]
    TargetNotMetaPresent {
        /// Declaring unit
        unit: String,
        /// Declaring attribute
        attribute: String,
        /// Target unit
        target_unit: String,
        /// Root unit of the mapping tree
        root: String,
    },

    /// A meta-declaration instance carries conflicting mirror values
    #[error("Invalid meta-declaration on '{unit}': {conflict}")]
    MetaMirrorConflict {
        /// Unit type carrying the broken meta-declaration
        unit: String,
        /// The underlying conflict
        conflict: MirrorConflict,
    },
}
