//! Attribute and alias declarations

use super::types::ValueType;
use super::unit::UnitTypeId;
use super::value::MetaValue;
use smallvec::SmallVec;

/// One attribute of a metadata unit type
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name, unique within its unit
    pub name: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Default value applied when an instance supplies none
    pub default: Option<MetaValue>,
    /// Alias declarations attached to this attribute
    pub aliases: SmallVec<[AliasDecl; 1]>,
}

impl Attribute {
    /// Create an attribute with no default and no aliases
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: None,
            aliases: SmallVec::new(),
        }
    }

    /// Attach a default value
    pub fn with_default(mut self, default: impl Into<MetaValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Attach an alias declaration
    pub fn alias_for(mut self, alias: AliasDecl) -> Self {
        self.aliases.push(alias);
        self
    }
}

/// A declared alias between two attributes
///
/// `value` and `attribute` are alternative ways of naming the target
/// attribute; declaring both is a schema error. `unit` names the target unit
/// type and defaults to the declaring unit. When `unit` is explicit and no
/// target attribute is named, the target defaults to the declaring
/// attribute's own name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AliasDecl {
    /// Shorthand target attribute name
    pub value: Option<String>,
    /// Explicit target attribute name
    pub attribute: Option<String>,
    /// Target unit type (None for the declaring unit)
    pub unit: Option<UnitTypeId>,
}

impl AliasDecl {
    /// Alias for another attribute of the same unit (a mirror pair)
    pub fn local(target: impl Into<String>) -> Self {
        Self {
            value: Some(target.into()),
            attribute: None,
            unit: None,
        }
    }

    /// Alias for a named attribute of a meta-declared unit type
    pub fn in_unit(unit: UnitTypeId, attribute: impl Into<String>) -> Self {
        Self {
            value: None,
            attribute: Some(attribute.into()),
            unit: Some(unit),
        }
    }

    /// Alias for the same-named attribute of a meta-declared unit type
    pub fn same_name(unit: UnitTypeId) -> Self {
        Self {
            value: None,
            attribute: None,
            unit: Some(unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_builders() {
        let attr = Attribute::new("locations", ValueType::array(ValueType::String))
            .with_default(MetaValue::Array(vec![]))
            .alias_for(AliasDecl::local("value"));
        assert_eq!(attr.name, "locations");
        assert_eq!(attr.aliases.len(), 1);
        assert_eq!(attr.aliases[0].value.as_deref(), Some("value"));
    }
}
