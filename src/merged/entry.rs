//! One resolved metadata view

use super::adapt::{Adapt, adapt_value};
use crate::error::Result;
use crate::mapping::{MappingCache, UnitMappingTree};
use crate::resolve::ValueResolver;
use crate::scan::ElementId;
use crate::schema::{Attribute, MetaValue, UnitInstance, UnitTypeId};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Owned value-extraction function shared by every entry of a view
pub type ExtractorFn = dyn Fn(&Attribute, &UnitInstance) -> Option<MetaValue> + Send + Sync;

/// One merged view of a unit type for one concrete root instance
///
/// An entry pairs a mapping level of a [`UnitMappingTree`] with the raw
/// values of the instance found during scanning; every query resolves values
/// on demand through the tree's routing tables.
#[derive(Clone)]
pub struct MergedEntry {
    element: ElementId,
    source: ElementId,
    tree: Arc<UnitMappingTree>,
    mapping_index: usize,
    root_values: Arc<UnitInstance>,
    aggregate_index: usize,
    order: usize,
    extractor: Arc<ExtractorFn>,
    cache: Arc<MappingCache>,
}

impl MergedEntry {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        element: ElementId,
        source: ElementId,
        tree: Arc<UnitMappingTree>,
        mapping_index: usize,
        root_values: Arc<UnitInstance>,
        aggregate_index: usize,
        order: usize,
        extractor: Arc<ExtractorFn>,
        cache: Arc<MappingCache>,
    ) -> Self {
        Self {
            element,
            source,
            tree,
            mapping_index,
            root_values,
            aggregate_index,
            order,
            extractor,
            cache,
        }
    }

    /// The unit type this entry is a view of
    pub fn unit(&self) -> &UnitTypeId {
        self.tree.mapping(self.mapping_index).unit()
    }

    /// The unit type physically attached to the element
    pub fn root_unit(&self) -> &UnitTypeId {
        self.tree.root()
    }

    /// The element the query was made against
    pub fn element(&self) -> &ElementId {
        &self.element
    }

    /// The element the metadata is physically attached to
    pub fn source(&self) -> &ElementId {
        &self.source
    }

    /// Meta-declaration distance from the attached instance (0 = the
    /// instance's own type)
    pub fn distance(&self) -> usize {
        self.tree.mapping(self.mapping_index).distance()
    }

    /// Hierarchy depth the instance was found at (0 = the element itself)
    pub fn aggregate_index(&self) -> usize {
        self.aggregate_index
    }

    /// Encounter order across the whole scan
    pub(crate) fn order(&self) -> usize {
        self.order
    }

    /// The raw values of the attached root instance
    pub fn root_values(&self) -> &UnitInstance {
        &self.root_values
    }

    /// Merged value of a named attribute
    pub fn get(&self, attribute: &str) -> Result<MetaValue> {
        let resolver = ValueResolver::new(&self.tree, &self.root_values)
            .with_extractor(&*self.extractor);
        Ok(resolver.resolve(self.mapping_index, attribute)?)
    }

    /// Whether the merged value equals the attribute's declared default
    ///
    /// Attributes without a declared default never count as default.
    pub fn is_default(&self, attribute: &str) -> Result<bool> {
        let schema = self.tree.mapping(self.mapping_index).schema();
        let default = schema
            .index_of(attribute)
            .and_then(|index| schema.get(index).default.clone());
        match default {
            Some(default) => Ok(self.get(attribute)? == default),
            None => Ok(false),
        }
    }

    /// All merged values in declaration order, rendered per the adaptation
    /// flags
    pub fn as_map(&self, adapts: &[Adapt]) -> Result<IndexMap<String, MetaValue>> {
        let schema = self.tree.mapping(self.mapping_index).schema();
        let mut map = IndexMap::with_capacity(schema.len());
        for attribute in schema.attributes() {
            let value = self.get(&attribute.name)?;
            map.insert(
                attribute.name.clone(),
                adapt_value(value, adapts, self.cache.registry()),
            );
        }
        Ok(map)
    }

    /// The merged values as a JSON object, with class references rendered as
    /// strings and nested instances as complete objects
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let map = self.as_map(&[Adapt::ClassToString, Adapt::NestedToMap])?;
        let object: serde_json::Map<String, serde_json::Value> = map
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Ok(serde_json::Value::Object(object))
    }
}

impl fmt::Debug for MergedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergedEntry")
            .field("element", &self.element)
            .field("source", &self.source)
            .field("unit", self.unit())
            .field("distance", &self.distance())
            .field("aggregate_index", &self.aggregate_index)
            .finish()
    }
}
