//! Unit-type declarations and the unit-type registry

use super::attribute::Attribute;
use super::intern::intern;
use super::value::MetaValue;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Interned identifier of a metadata unit type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitTypeId(Arc<str>);

impl UnitTypeId {
    /// Intern a unit-type name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(intern(name.as_ref()))
    }

    /// The unit-type name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitTypeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Serialize for UnitTypeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UnitTypeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(name))
    }
}

/// A concrete metadata occurrence: one unit type plus the raw attribute
/// values read off one physical attachment
///
/// Attributes absent from `values` take their declared defaults during
/// resolution. Insertion order is preserved for deterministic exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitInstance {
    /// The instantiated unit type
    pub unit: UnitTypeId,
    /// Explicitly supplied attribute values
    pub values: IndexMap<String, MetaValue>,
}

impl UnitInstance {
    /// Create an instance with no explicit values (all defaults)
    pub fn new(unit: impl Into<UnitTypeId>) -> Self {
        Self {
            unit: unit.into(),
            values: IndexMap::new(),
        }
    }

    /// Supply an explicit attribute value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Read an explicitly supplied value
    pub fn value(&self, name: &str) -> Option<&MetaValue> {
        self.values.get(name)
    }
}

/// Declaration of a metadata unit type: its attribute schema, the
/// meta-declarations attached to the type itself, and its inheritance marker
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTypeDecl {
    /// Unit-type identifier
    pub id: UnitTypeId,
    /// Attributes in declaration order
    pub attributes: Vec<Attribute>,
    /// Metadata units attached to this unit type's own declaration
    pub meta: Vec<UnitInstance>,
    /// Whether instances propagate to subtypes under the `Inherited` strategy
    pub inherited: bool,
}

impl UnitTypeDecl {
    /// Start building a unit-type declaration
    pub fn builder(name: impl AsRef<str>) -> UnitTypeDeclBuilder {
        UnitTypeDeclBuilder {
            decl: UnitTypeDecl {
                id: UnitTypeId::new(name),
                attributes: Vec::new(),
                meta: Vec::new(),
                inherited: false,
            },
        }
    }

    /// Find an attribute's declaration-order index by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }
}

/// Builder for [`UnitTypeDecl`]
pub struct UnitTypeDeclBuilder {
    decl: UnitTypeDecl,
}

impl UnitTypeDeclBuilder {
    /// Append an attribute (declaration order is significant)
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.decl.attributes.push(attribute);
        self
    }

    /// Attach a meta-declaration to the unit type
    pub fn meta(mut self, instance: UnitInstance) -> Self {
        self.decl.meta.push(instance);
        self
    }

    /// Mark instances of this unit type as inheritable
    pub fn inherited(mut self) -> Self {
        self.decl.inherited = true;
        self
    }

    /// Finish the declaration
    pub fn build(self) -> UnitTypeDecl {
        self.decl
    }
}

/// Registry of declared unit types
///
/// A unit type is declared once and is immutable afterwards; re-declaring an
/// existing id is a no-op, matching the first-load-wins lifecycle of schema
/// data.
#[derive(Debug, Default)]
pub struct UnitTypeRegistry {
    decls: DashMap<UnitTypeId, Arc<UnitTypeDecl>>,
}

impl UnitTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unit type, returning its id
    pub fn declare(&self, decl: UnitTypeDecl) -> UnitTypeId {
        let id = decl.id.clone();
        self.decls.entry(id.clone()).or_insert_with(|| Arc::new(decl));
        id
    }

    /// Look up a declared unit type
    pub fn get(&self, id: &UnitTypeId) -> Option<Arc<UnitTypeDecl>> {
        self.decls.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether the unit type has been declared
    pub fn contains(&self, id: &UnitTypeId) -> bool {
        self.decls.contains_key(id)
    }

    /// Number of declared unit types
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
