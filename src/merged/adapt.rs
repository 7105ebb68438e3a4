//! Adaptation flags for export operations

use crate::schema::{MetaValue, UnitInstance, UnitTypeRegistry};

/// How values are rendered by [`MergedEntry::as_map`](super::MergedEntry::as_map)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adapt {
    /// Render class references as their qualified-name strings
    ClassToString,
    /// Render nested metadata instances as complete value maps, with
    /// declared defaults filled in, instead of leaving them as raw instances
    NestedToMap,
}

impl Adapt {
    fn requested(self, adapts: &[Adapt]) -> bool {
        adapts.contains(&self)
    }
}

pub(crate) fn adapt_value(
    value: MetaValue,
    adapts: &[Adapt],
    registry: &UnitTypeRegistry,
) -> MetaValue {
    match value {
        MetaValue::Class(name) if Adapt::ClassToString.requested(adapts) => MetaValue::String(name),
        MetaValue::Nested(instance) if Adapt::NestedToMap.requested(adapts) => {
            MetaValue::nested(expand_instance(*instance, adapts, registry))
        }
        MetaValue::Array(values) => MetaValue::Array(
            values
                .into_iter()
                .map(|v| adapt_value(v, adapts, registry))
                .collect(),
        ),
        other => other,
    }
}

/// Fill in declared defaults for every attribute the instance leaves
/// implicit, recursing into nested instances
fn expand_instance(
    instance: UnitInstance,
    adapts: &[Adapt],
    registry: &UnitTypeRegistry,
) -> UnitInstance {
    let Some(decl) = registry.get(&instance.unit) else {
        let mut out = UnitInstance::new(instance.unit.clone());
        for (name, value) in instance.values {
            out.values.insert(name, adapt_value(value, adapts, registry));
        }
        return out;
    };
    let mut out = UnitInstance::new(instance.unit.clone());
    for attribute in &decl.attributes {
        let value = instance
            .value(&attribute.name)
            .cloned()
            .or_else(|| attribute.default.clone());
        if let Some(value) = value {
            out.values
                .insert(attribute.name.clone(), adapt_value(value, adapts, registry));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, UnitTypeDecl, ValueType};

    #[test]
    fn test_class_to_string() {
        let registry = UnitTypeRegistry::new();
        let value = MetaValue::Array(vec![MetaValue::class("com.example.App")]);
        assert_eq!(
            adapt_value(value.clone(), &[Adapt::ClassToString], &registry),
            MetaValue::Array(vec![MetaValue::string("com.example.App")])
        );
        assert_eq!(adapt_value(value.clone(), &[], &registry), value);
    }

    #[test]
    fn test_nested_to_map_fills_defaults() {
        let registry = UnitTypeRegistry::new();
        registry.declare(
            UnitTypeDecl::builder("Filter")
                .attribute(Attribute::new("pattern", ValueType::String).with_default("*"))
                .attribute(Attribute::new("negate", ValueType::Boolean).with_default(false))
                .build(),
        );
        let value = MetaValue::nested(UnitInstance::new("Filter").with("pattern", "foo.*"));
        let adapted = adapt_value(value, &[Adapt::NestedToMap], &registry);
        let MetaValue::Nested(instance) = adapted else {
            panic!("expected a nested instance");
        };
        assert_eq!(instance.value("pattern"), Some(&MetaValue::string("foo.*")));
        assert_eq!(instance.value("negate"), Some(&MetaValue::Boolean(false)));
    }
}
