//! Per-attribute value resolution against a mapping tree
//!
//! A [`ValueResolver`] answers "what is the merged value of attribute X on
//! the view of unit U" for one concrete root instance, following the routing
//! tables a [`UnitMappingTree`](crate::mapping::UnitMappingTree) carries:
//! explicit alias redirects first, then convention redirects, then the meta
//! level's own values with pre-resolved overrides, and finally declared
//! defaults.

use crate::mapping::{MirrorConflict, UnitMapping, UnitMappingTree, ValueExtractor, direct_extract};
use crate::schema::{MetaValue, UnitInstance};
use thiserror::Error;

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised while resolving a merged attribute value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// Two mirrored attributes disagree on the concrete instance
    #[error(transparent)]
    MirrorConflict(#[from] MirrorConflict),

    /// The unit type declares no attribute with the requested name
    #[error("Unit type '{unit}' has no attribute named '{attribute}'")]
    UnknownAttribute {
        /// Unit type queried
        unit: String,
        /// Requested attribute name
        attribute: String,
    },

    /// Neither an explicit value nor a declared default exists
    #[error("No value for attribute '{attribute}' of unit type '{unit}'")]
    NoValue {
        /// Unit type queried
        unit: String,
        /// Requested attribute name
        attribute: String,
    },
}

/// Resolves merged attribute values for one root instance
///
/// The resolver is cheap to construct; it borrows the tree and the root
/// instance and holds no state of its own.
pub struct ValueResolver<'a> {
    tree: &'a UnitMappingTree,
    root_values: &'a UnitInstance,
    extract: ValueExtractor<'a>,
}

impl<'a> ValueResolver<'a> {
    /// Create a resolver over a tree and the concrete root instance
    pub fn new(tree: &'a UnitMappingTree, root_values: &'a UnitInstance) -> Self {
        Self {
            tree,
            root_values,
            extract: &direct_extract,
        }
    }

    /// Replace the extractor applied to the root instance's values
    pub fn with_extractor(mut self, extract: ValueExtractor<'a>) -> Self {
        self.extract = extract;
        self
    }

    /// Merged value of a named attribute on the mapping at `mapping_index`
    pub fn resolve(&self, mapping_index: usize, attribute: &str) -> ResolveResult<MetaValue> {
        let mapping = self.tree.mapping(mapping_index);
        let index = mapping.schema().index_of(attribute).ok_or_else(|| {
            ResolveError::UnknownAttribute {
                unit: mapping.unit().to_string(),
                attribute: attribute.to_string(),
            }
        })?;
        self.resolve_index(mapping_index, index)
    }

    /// Merged value of the attribute at declaration-order `attribute` on the
    /// mapping at `mapping_index`
    pub fn resolve_index(
        &self,
        mapping_index: usize,
        attribute: usize,
    ) -> ResolveResult<MetaValue> {
        let mapping = self.tree.mapping(mapping_index);

        if mapping.distance() == 0 {
            return self.root_value(attribute);
        }
        // Explicit aliases outrank the same-name convention; both route the
        // read to the root instance.
        if let Some(root_attr) = mapping
            .alias_mapping(attribute)
            .or_else(|| mapping.convention_mapping(attribute))
        {
            return self.root_value(root_attr);
        }
        if let Some((source, source_attr)) = mapping.value_mapping(attribute) {
            return self.meta_value(self.tree.mapping(source), source_attr);
        }

        let instance = mapping
            .meta_instance()
            .expect("non-root mapping always carries its meta instance");
        let authoritative =
            mapping
                .mirror_groups()
                .resolve_for(attribute, mapping.schema(), instance, &direct_extract)?;
        self.meta_value(mapping, authoritative)
    }

    /// Read from the root instance, applying root-level mirror resolution and
    /// the configured extractor
    fn root_value(&self, attribute: usize) -> ResolveResult<MetaValue> {
        let root = self.tree.mapping(0);
        let authoritative = root.mirror_groups().resolve_for(
            attribute,
            root.schema(),
            self.root_values,
            self.extract,
        )?;
        let attr = root.schema().get(authoritative);
        (self.extract)(attr, self.root_values)
            .or_else(|| attr.default.clone())
            .ok_or_else(|| ResolveError::NoValue {
                unit: root.unit().to_string(),
                attribute: attr.name.clone(),
            })
    }

    /// Read from a meta level's fixed declaration instance, falling back to
    /// the declared default
    fn meta_value(&self, mapping: &UnitMapping, attribute: usize) -> ResolveResult<MetaValue> {
        let attr = mapping.schema().get(attribute);
        let instance = mapping
            .meta_instance()
            .expect("non-root mapping always carries its meta instance");
        direct_extract(attr, instance)
            .or_else(|| attr.default.clone())
            .ok_or_else(|| ResolveError::NoValue {
                unit: mapping.unit().to_string(),
                attribute: attr.name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailurePolicy;
    use crate::mapping::MappingCache;
    use crate::schema::{
        AliasDecl, Attribute, UnitTypeDecl, UnitTypeRegistry, ValueType,
    };
    use std::sync::Arc;

    fn string_array() -> ValueType {
        ValueType::array(ValueType::String)
    }

    fn registry() -> Arc<UnitTypeRegistry> {
        let registry = UnitTypeRegistry::new();
        registry.declare(
            UnitTypeDecl::builder("Config")
                .attribute(
                    Attribute::new("value", string_array())
                        .with_default(MetaValue::Array(vec![]))
                        .alias_for(AliasDecl::local("locations")),
                )
                .attribute(
                    Attribute::new("locations", string_array())
                        .with_default(MetaValue::Array(vec![]))
                        .alias_for(AliasDecl::local("value")),
                )
                .build(),
        );
        registry.declare(
            UnitTypeDecl::builder("XmlConfig")
                .attribute(
                    Attribute::new("xmlFiles", string_array())
                        .with_default(MetaValue::Array(vec![]))
                        .alias_for(AliasDecl::in_unit("Config".into(), "locations")),
                )
                .meta(UnitInstance::new("Config"))
                .build(),
        );
        Arc::new(registry)
    }

    #[test]
    fn test_mirror_pair_converges_on_root() {
        let cache = MappingCache::new(registry(), FailurePolicy::Fail);
        let tree = cache.tree(&"Config".into()).unwrap();
        let instance = UnitInstance::new("Config").with("value", MetaValue::array(["a.xml"]));
        let resolver = ValueResolver::new(&tree, &instance);
        assert_eq!(
            resolver.resolve(0, "locations").unwrap(),
            MetaValue::array(["a.xml"])
        );
        assert_eq!(
            resolver.resolve(0, "value").unwrap(),
            MetaValue::array(["a.xml"])
        );
    }

    #[test]
    fn test_cross_unit_alias_reads_from_root_instance() {
        let cache = MappingCache::new(registry(), FailurePolicy::Fail);
        let tree = cache.tree(&"XmlConfig".into()).unwrap();
        let instance = UnitInstance::new("XmlConfig").with("xmlFiles", MetaValue::array(["b.xml"]));
        let resolver = ValueResolver::new(&tree, &instance);
        // The meta-level Config view sees the root's overriding value.
        assert_eq!(
            resolver.resolve(1, "locations").unwrap(),
            MetaValue::array(["b.xml"])
        );
        assert_eq!(
            resolver.resolve(1, "value").unwrap(),
            MetaValue::array(["b.xml"])
        );
    }

    #[test]
    fn test_meta_default_when_root_declares_nothing() {
        let cache = MappingCache::new(registry(), FailurePolicy::Fail);
        let tree = cache.tree(&"XmlConfig".into()).unwrap();
        let instance = UnitInstance::new("XmlConfig");
        let resolver = ValueResolver::new(&tree, &instance);
        assert_eq!(
            resolver.resolve(1, "locations").unwrap(),
            MetaValue::Array(vec![])
        );
    }

    #[test]
    fn test_unknown_attribute() {
        let cache = MappingCache::new(registry(), FailurePolicy::Fail);
        let tree = cache.tree(&"Config".into()).unwrap();
        let instance = UnitInstance::new("Config");
        let resolver = ValueResolver::new(&tree, &instance);
        let err = resolver.resolve(0, "missing").unwrap_err();
        assert!(matches!(err, ResolveError::UnknownAttribute { .. }));
    }

    #[test]
    fn test_root_mirror_conflict_surfaces() {
        let cache = MappingCache::new(registry(), FailurePolicy::Fail);
        let tree = cache.tree(&"Config".into()).unwrap();
        let instance = UnitInstance::new("Config")
            .with("value", MetaValue::array(["a.xml"]))
            .with("locations", MetaValue::array(["b.xml"]));
        let resolver = ValueResolver::new(&tree, &instance);
        let err = resolver.resolve(0, "value").unwrap_err();
        assert!(matches!(err, ResolveError::MirrorConflict(_)));
    }
}
