//! Per-unit-type caches for schemas and mapping trees
//!
//! Schemas and trees are built lazily on first request and kept for the life
//! of the process; errors are cached the same way, so a broken unit type
//! fails identically on every later query. The entry API guarantees at most
//! one build per key under concurrent misses, and published values are
//! immutable `Arc`s that readers never lock for.

use super::tree::UnitMappingTree;
use crate::error::FailurePolicy;
use crate::schema::{AttributeSchema, SchemaError, SchemaResult, UnitTypeId, UnitTypeRegistry};
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;

/// Cache service for validated schemas and unit mapping trees
#[derive(Debug)]
pub struct MappingCache {
    registry: Arc<UnitTypeRegistry>,
    policy: FailurePolicy,
    schemas: DashMap<UnitTypeId, SchemaResult<Arc<AttributeSchema>>>,
    trees: DashMap<UnitTypeId, SchemaResult<Arc<UnitMappingTree>>>,
}

impl MappingCache {
    /// Create a cache over the given registry
    pub fn new(registry: Arc<UnitTypeRegistry>, policy: FailurePolicy) -> Self {
        Self {
            registry,
            policy,
            schemas: DashMap::new(),
            trees: DashMap::new(),
        }
    }

    /// The underlying unit-type registry
    pub fn registry(&self) -> &UnitTypeRegistry {
        &self.registry
    }

    /// The strictness applied to meta-level introspection failures
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// The validated schema for a unit type, built on first request
    pub fn schema(&self, unit: &UnitTypeId) -> SchemaResult<Arc<AttributeSchema>> {
        if let Some(hit) = self.schemas.get(unit) {
            return hit.clone();
        }
        self.schemas
            .entry(unit.clone())
            .or_insert_with(|| {
                debug!("building attribute schema for '{unit}'");
                let decl = self
                    .registry
                    .get(unit)
                    .ok_or_else(|| SchemaError::UnknownUnitType {
                        unit: unit.to_string(),
                    })?;
                AttributeSchema::build(decl).map(Arc::new)
            })
            .clone()
    }

    /// The mapping tree rooted at a unit type, built on first request
    pub fn tree(&self, root: &UnitTypeId) -> SchemaResult<Arc<UnitMappingTree>> {
        if let Some(hit) = self.trees.get(root) {
            return hit.clone();
        }
        self.trees
            .entry(root.clone())
            .or_insert_with(|| UnitMappingTree::build(root, self).map(Arc::new))
            .clone()
    }

    /// Number of cached schemas (hit or error)
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Number of cached trees (hit or error)
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}
