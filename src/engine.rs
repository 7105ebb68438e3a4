//! Merge engine - the main entry point for metadata resolution

use crate::error::{FailurePolicy, MergeError, Result};
use crate::mapping::{MappingCache, direct_extract};
use crate::merged::{ExtractorFn, MergedEntry, MergedView};
use crate::scan::{ElementId, ElementScanner, Introspector, ScanProcessor, SearchStrategy};
use crate::schema::{Attribute, MetaValue, UnitInstance, UnitTypeRegistry};
use log::warn;
use std::fmt;
use std::sync::Arc;

/// Tunable behavior of a [`MergeEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeConfig {
    /// Strictness applied to defects found on meta levels during tree
    /// expansion and scanning
    pub introspection_failures: FailurePolicy,
}

impl MergeConfig {
    /// Every defect fails the query
    pub fn strict() -> Self {
        Self {
            introspection_failures: FailurePolicy::Fail,
        }
    }

    /// Meta-level defects are logged and skipped
    pub fn lenient() -> Self {
        Self {
            introspection_failures: FailurePolicy::Warn,
        }
    }
}

/// Main engine for resolving merged metadata views
///
/// The engine owns the schema and mapping-tree caches; cloning it is cheap
/// and clones share the caches. Queries against a registry of declared unit
/// types go through [`MergeEngine::of`], which scans an element and wraps
/// everything found into a [`MergedView`].
#[derive(Clone)]
pub struct MergeEngine {
    cache: Arc<MappingCache>,
    extractor: Arc<ExtractorFn>,
}

impl MergeEngine {
    /// Create an engine over a unit-type registry with strict defaults
    pub fn new(registry: Arc<UnitTypeRegistry>) -> Self {
        Self::with_config(registry, MergeConfig::default())
    }

    /// Create an engine with explicit configuration
    pub fn with_config(registry: Arc<UnitTypeRegistry>, config: MergeConfig) -> Self {
        let extractor: Arc<ExtractorFn> = Arc::new(direct_extract);
        Self {
            cache: Arc::new(MappingCache::new(registry, config.introspection_failures)),
            extractor,
        }
    }

    /// Replace the value-extraction function applied to scanned instances
    pub fn with_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&Attribute, &UnitInstance) -> Option<MetaValue> + Send + Sync + 'static,
    {
        self.extractor = Arc::new(extractor);
        self
    }

    /// The unit-type registry queries resolve against
    pub fn registry(&self) -> &UnitTypeRegistry {
        self.cache.registry()
    }

    /// The shared schema and mapping-tree cache
    pub fn cache(&self) -> &Arc<MappingCache> {
        &self.cache
    }

    /// Merged metadata of an element under a search strategy
    pub fn of<I: Introspector + ?Sized>(
        &self,
        introspector: &I,
        element: &ElementId,
        strategy: SearchStrategy,
    ) -> Result<MergedView> {
        let scanner = ElementScanner::new(introspector, self.cache.registry());
        let mut collector = Collector {
            cache: &self.cache,
            extractor: &self.extractor,
            entries: Vec::new(),
            order: 0,
        };
        match scanner.scan(element, strategy, &mut collector)? {
            Some(err) => Err(err),
            None => Ok(MergedView::new(collector.entries)),
        }
    }
}

impl fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeEngine")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Turns every scanned instance into one entry per reachable mapping level
struct Collector<'a> {
    cache: &'a Arc<MappingCache>,
    extractor: &'a Arc<ExtractorFn>,
    entries: Vec<MergedEntry>,
    order: usize,
}

impl ScanProcessor for Collector<'_> {
    type Output = MergeError;

    fn process(
        &mut self,
        context: &ElementId,
        aggregate_index: usize,
        source: &ElementId,
        instances: &[Arc<UnitInstance>],
    ) -> Option<MergeError> {
        for instance in instances {
            let tree = match self.cache.tree(&instance.unit) {
                Ok(tree) => tree,
                Err(err) => match self.cache.policy() {
                    FailurePolicy::Fail => return Some(err.into()),
                    FailurePolicy::Warn => {
                        warn!("skipping unresolvable metadata '{}': {err}", instance.unit);
                        continue;
                    }
                    FailurePolicy::Ignore => continue,
                },
            };
            for mapping_index in 0..tree.len() {
                self.entries.push(MergedEntry::new(
                    context.clone(),
                    source.clone(),
                    Arc::clone(&tree),
                    mapping_index,
                    Arc::clone(instance),
                    aggregate_index,
                    self.order,
                    Arc::clone(self.extractor),
                    Arc::clone(self.cache),
                ));
                self.order += 1;
            }
        }
        None
    }
}
