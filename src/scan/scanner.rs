//! Strategy-driven traversal of an element's hierarchy

use super::element::{ElementId, Introspector, IntrospectionResult};
use super::strategy::SearchStrategy;
use crate::schema::{UnitInstance, UnitTypeId, UnitTypeRegistry};
use log::trace;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::Arc;

/// Per-level callback invoked during a scan
///
/// Returning `Some` from [`process`](ScanProcessor::process) short-circuits
/// the remaining traversal; [`finish`](ScanProcessor::finish) then receives
/// the last result and supplies the final one. Collect-everything processors
/// return `None` throughout.
pub trait ScanProcessor {
    /// Final result type of the scan
    type Output;

    /// Handle the raw metadata found at one hierarchy level
    ///
    /// `context` is the originally requested element, `aggregate_index` the
    /// traversal depth (0 = the element itself), and `source` the element
    /// the instances are physically attached to.
    fn process(
        &mut self,
        context: &ElementId,
        aggregate_index: usize,
        source: &ElementId,
        instances: &[Arc<UnitInstance>],
    ) -> Option<Self::Output>;

    /// Produce the final result once traversal ends
    fn finish(&mut self, last: Option<Self::Output>) -> Option<Self::Output> {
        last
    }
}

/// Walks an element's hierarchy under a [`SearchStrategy`], feeding raw
/// metadata to a [`ScanProcessor`]
pub struct ElementScanner<'a, I: Introspector + ?Sized> {
    introspector: &'a I,
    registry: &'a UnitTypeRegistry,
}

impl<'a, I: Introspector + ?Sized> ElementScanner<'a, I> {
    /// Create a scanner over the given introspector and unit-type registry
    pub fn new(introspector: &'a I, registry: &'a UnitTypeRegistry) -> Self {
        Self {
            introspector,
            registry,
        }
    }

    /// Scan the element per the strategy
    pub fn scan<P: ScanProcessor>(
        &self,
        element: &ElementId,
        strategy: SearchStrategy,
        processor: &mut P,
    ) -> IntrospectionResult<Option<P::Output>> {
        trace!("scanning '{element}' with strategy {strategy}");
        let last = match self.traverse(element, strategy, processor)? {
            ControlFlow::Break(result) => Some(result),
            ControlFlow::Continue(()) => None,
        };
        Ok(processor.finish(last))
    }

    fn traverse<P: ScanProcessor>(
        &self,
        element: &ElementId,
        strategy: SearchStrategy,
        processor: &mut P,
    ) -> IntrospectionResult<ControlFlow<P::Output>> {
        match strategy {
            SearchStrategy::Direct => self.process_level(element, 0, element, processor),
            SearchStrategy::Inherited => self.traverse_inherited(element, processor),
            SearchStrategy::Superclass => self.traverse_superclasses(element, processor),
            SearchStrategy::TypeHierarchy => {
                let mut visited = FxHashSet::default();
                match self.walk_type_hierarchy(element, element, 0, &mut visited, processor)? {
                    ControlFlow::Break(result) => Ok(ControlFlow::Break(result)),
                    ControlFlow::Continue(_) => Ok(ControlFlow::Continue(())),
                }
            }
            SearchStrategy::TypeHierarchyAndEnclosing => {
                let mut visited = FxHashSet::default();
                let mut depth = 0;
                let mut current = Some(element.clone());
                while let Some(scope) = current {
                    match self.walk_type_hierarchy(element, &scope, depth, &mut visited, processor)?
                    {
                        ControlFlow::Break(result) => return Ok(ControlFlow::Break(result)),
                        ControlFlow::Continue(next) => depth = next,
                    }
                    current = self.introspector.enclosing_of(&scope);
                }
                Ok(ControlFlow::Continue(()))
            }
        }
    }

    fn process_level<P: ScanProcessor>(
        &self,
        context: &ElementId,
        aggregate_index: usize,
        source: &ElementId,
        processor: &mut P,
    ) -> IntrospectionResult<ControlFlow<P::Output>> {
        let instances = self.introspector.raw_metadata_of(source)?;
        match processor.process(context, aggregate_index, source, &instances) {
            Some(result) => Ok(ControlFlow::Break(result)),
            None => Ok(ControlFlow::Continue(())),
        }
    }

    fn traverse_inherited<P: ScanProcessor>(
        &self,
        element: &ElementId,
        processor: &mut P,
    ) -> IntrospectionResult<ControlFlow<P::Output>> {
        if let ControlFlow::Break(result) = self.process_level(element, 0, element, processor)? {
            return Ok(ControlFlow::Break(result));
        }
        let mut depth = 1;
        let mut current = self.introspector.supertype_of(element);
        while let Some(supertype) = current {
            let instances = self.introspector.raw_metadata_of(&supertype)?;
            let inheritable: Vec<Arc<UnitInstance>> = instances
                .into_iter()
                .filter(|instance| self.is_inheritable(&instance.unit))
                .collect();
            // The inherited walk stops at the first supertype contributing
            // nothing.
            if inheritable.is_empty() {
                break;
            }
            if let Some(result) = processor.process(element, depth, &supertype, &inheritable) {
                return Ok(ControlFlow::Break(result));
            }
            depth += 1;
            current = self.introspector.supertype_of(&supertype);
        }
        Ok(ControlFlow::Continue(()))
    }

    fn traverse_superclasses<P: ScanProcessor>(
        &self,
        element: &ElementId,
        processor: &mut P,
    ) -> IntrospectionResult<ControlFlow<P::Output>> {
        let mut depth = 0;
        let mut current = Some(element.clone());
        while let Some(source) = current {
            if let ControlFlow::Break(result) =
                self.process_level(element, depth, &source, processor)?
            {
                return Ok(ControlFlow::Break(result));
            }
            depth += 1;
            current = self.introspector.supertype_of(&source);
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Breadth-first walk over supertypes and interfaces starting at `start`;
    /// returns the next unused aggregate index when traversal completes
    fn walk_type_hierarchy<P: ScanProcessor>(
        &self,
        context: &ElementId,
        start: &ElementId,
        start_depth: usize,
        visited: &mut FxHashSet<ElementId>,
        processor: &mut P,
    ) -> IntrospectionResult<ControlFlow<P::Output, usize>> {
        let mut queue: VecDeque<(ElementId, usize)> = VecDeque::new();
        queue.push_back((start.clone(), start_depth));
        let mut next_depth = start_depth;

        while let Some((source, depth)) = queue.pop_front() {
            if !visited.insert(source.clone()) {
                continue;
            }
            let instances = self.introspector.raw_metadata_of(&source)?;
            if let Some(result) = processor.process(context, depth, &source, &instances) {
                return Ok(ControlFlow::Break(result));
            }
            next_depth = next_depth.max(depth + 1);
            if let Some(supertype) = self.introspector.supertype_of(&source) {
                queue.push_back((supertype, depth + 1));
            }
            for interface in self.introspector.interfaces_of(&source) {
                queue.push_back((interface, depth + 1));
            }
        }
        Ok(ControlFlow::Continue(next_depth))
    }

    fn is_inheritable(&self, unit: &UnitTypeId) -> bool {
        self.registry
            .get(unit)
            .map(|decl| decl.inherited)
            .unwrap_or(false)
    }
}
