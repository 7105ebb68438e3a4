//! Unit mappings and the per-root mapping tree
//!
//! A [`UnitMappingTree`] materializes, for one root unit type, every meta
//! level reachable through its meta-declarations: level 0 is the root itself,
//! level N+1 holds the meta-declarations of level-N units. Each level is a
//! [`UnitMapping`] carrying the routing tables that later drive per-attribute
//! value resolution: explicit alias redirects to the root, convention-based
//! name matches, pre-resolved meta-level override sources, and the mirror
//! groups formed by attributes that converge on the same ancestor attribute.

use super::cache::MappingCache;
use super::mirror::{MirrorGroups, direct_extract};
use crate::error::FailurePolicy;
use crate::schema::{AttributeSchema, SchemaError, SchemaResult, UnitInstance, UnitTypeId};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Identity of one attribute within a mapping tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct AttrRef {
    unit: UnitTypeId,
    index: usize,
}

/// One (root unit type, unit type, meta-level distance) triple
#[derive(Debug)]
pub struct UnitMapping {
    unit: UnitTypeId,
    distance: usize,
    parent: Option<usize>,
    schema: Arc<AttributeSchema>,
    meta_instance: Option<Arc<UnitInstance>>,
    terminal: bool,
    aliased_by: FxHashMap<AttrRef, Vec<usize>>,
    alias_mappings: Vec<Option<usize>>,
    convention_mappings: Vec<Option<usize>>,
    value_mappings: Vec<Option<(usize, usize)>>,
    mirror_groups: MirrorGroups,
}

impl UnitMapping {
    fn new(
        unit: UnitTypeId,
        distance: usize,
        parent: Option<usize>,
        schema: Arc<AttributeSchema>,
        meta_instance: Option<Arc<UnitInstance>>,
        terminal: bool,
    ) -> Self {
        let count = schema.len();
        Self {
            unit,
            distance,
            parent,
            schema,
            meta_instance,
            terminal,
            aliased_by: FxHashMap::default(),
            alias_mappings: vec![None; count],
            convention_mappings: vec![None; count],
            value_mappings: vec![None; count],
            mirror_groups: MirrorGroups::new(count),
        }
    }

    /// The mapped unit type
    pub fn unit(&self) -> &UnitTypeId {
        &self.unit
    }

    /// Meta-level distance from the root (0 = the root unit itself)
    pub fn distance(&self) -> usize {
        self.distance
    }

    /// Index of the mapping this one was discovered on, if any
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// The unit's validated attribute schema
    pub fn schema(&self) -> &Arc<AttributeSchema> {
        &self.schema
    }

    /// The meta-declaration instance that introduced this level (None at the
    /// root)
    pub fn meta_instance(&self) -> Option<&Arc<UnitInstance>> {
        self.meta_instance.as_ref()
    }

    /// Root-attribute index this attribute is redirected to through an
    /// explicit alias chain
    pub fn alias_mapping(&self, attribute: usize) -> Option<usize> {
        self.alias_mappings[attribute]
    }

    /// Root-attribute index matched by the same-name convention
    pub fn convention_mapping(&self, attribute: usize) -> Option<usize> {
        self.convention_mappings[attribute]
    }

    /// Closest meta-level override source for this attribute, pre-resolved
    /// through that level's mirror groups
    pub fn value_mapping(&self, attribute: usize) -> Option<(usize, usize)> {
        self.value_mappings[attribute]
    }

    /// Mirror groups over this mapping's attributes
    pub fn mirror_groups(&self) -> &MirrorGroups {
        &self.mirror_groups
    }
}

/// All unit mappings reachable from one root unit type
///
/// Immutable once built; cached per root unit type by [`MappingCache`].
#[derive(Debug)]
pub struct UnitMappingTree {
    root: UnitTypeId,
    mappings: Vec<UnitMapping>,
}

impl UnitMappingTree {
    /// Breadth-first expansion over the root's meta-declarations
    pub(crate) fn build(root: &UnitTypeId, cache: &MappingCache) -> SchemaResult<Self> {
        let policy = cache.policy();
        let root_schema = cache.schema(root)?;
        let mut mappings = vec![UnitMapping::new(
            root.clone(),
            0,
            None,
            root_schema,
            None,
            false,
        )];
        let mut visited: FxHashMap<UnitTypeId, usize> = FxHashMap::default();
        visited.insert(root.clone(), 0);
        let mut queue: VecDeque<usize> = VecDeque::from([0]);

        while let Some(parent) = queue.pop_front() {
            if mappings[parent].terminal {
                continue;
            }
            let parent_unit = mappings[parent].unit.clone();
            let distance = mappings[parent].distance + 1;
            let Some(decl) = cache.registry().get(&parent_unit) else {
                continue;
            };
            for meta in &decl.meta {
                // A unit meta-declared with itself maps one terminal level
                // deeper; any other revisit is guarded against.
                let self_reference = meta.unit == parent_unit;
                if !self_reference && visited.contains_key(&meta.unit) {
                    continue;
                }
                let schema = match cache.schema(&meta.unit) {
                    Ok(schema) => schema,
                    Err(err) => {
                        match policy {
                            FailurePolicy::Fail => return Err(err),
                            FailurePolicy::Warn => {
                                warn!(
                                    "skipping meta-declaration '{}' on '{parent_unit}': {err}",
                                    meta.unit
                                );
                            }
                            FailurePolicy::Ignore => {}
                        }
                        continue;
                    }
                };
                let index = mappings.len();
                mappings.push(UnitMapping::new(
                    meta.unit.clone(),
                    distance,
                    Some(parent),
                    schema,
                    Some(Arc::new(meta.clone())),
                    self_reference,
                ));
                visited.insert(meta.unit.clone(), distance);
                queue.push_back(index);
            }
        }

        let mut tree = Self {
            root: root.clone(),
            mappings,
        };
        for index in 0..tree.mappings.len() {
            tree.register_aliases(index, policy)?;
        }
        for index in 0..tree.mappings.len() {
            tree.process_aliases(index, policy)?;
        }
        for index in 0..tree.mappings.len() {
            tree.add_convention_mappings(index);
        }
        debug!(
            "built mapping tree for '{root}': {} level(s)",
            tree.mappings.len()
        );
        Ok(tree)
    }

    /// The root unit type
    pub fn root(&self) -> &UnitTypeId {
        &self.root
    }

    /// All mappings in breadth-first discovery order (index 0 is the root)
    pub fn mappings(&self) -> &[UnitMapping] {
        &self.mappings
    }

    /// The mapping at the given index
    pub fn mapping(&self, index: usize) -> &UnitMapping {
        &self.mappings[index]
    }

    /// Number of mappings in the tree
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// A tree always contains at least the root mapping
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn find_mapping(&self, unit: &UnitTypeId) -> Option<usize> {
        self.mappings.iter().position(|m| m.unit == *unit)
    }

    /// Route one tree-build defect through the failure policy: defects in the
    /// root unit's own declarations always fail, meta-level defects follow
    /// the configured strictness.
    fn report(&self, distance: usize, policy: FailurePolicy, err: SchemaError) -> SchemaResult<()> {
        if distance == 0 || policy == FailurePolicy::Fail {
            return Err(err);
        }
        if policy == FailurePolicy::Warn {
            warn!("ignoring meta-level defect in tree for '{}': {err}", self.root);
        }
        Ok(())
    }

    /// Record, on each declaring mapping, which target attributes its own
    /// attributes alias, validating cross-unit targets on the way
    fn register_aliases(&mut self, index: usize, policy: FailurePolicy) -> SchemaResult<()> {
        if self.mappings[index].terminal {
            return Ok(());
        }
        let schema = Arc::clone(&self.mappings[index].schema);
        let unit = self.mappings[index].unit.clone();
        let distance = self.mappings[index].distance;

        for i in 0..schema.len() {
            for alias in schema.aliases_of(i).to_vec() {
                let target_mapping = if alias.unit == unit {
                    Some(index)
                } else {
                    self.find_mapping(&alias.unit)
                };
                let Some(tm) = target_mapping else {
                    self.report(
                        distance,
                        policy,
                        SchemaError::TargetNotMetaPresent {
                            unit: unit.to_string(),
                            attribute: schema.get(i).name.clone(),
                            target_unit: alias.unit.to_string(),
                            root: self.root.to_string(),
                        },
                    )?;
                    continue;
                };
                let target_schema = Arc::clone(&self.mappings[tm].schema);
                let Some(tj) = target_schema.index_of(&alias.attribute) else {
                    // Same-unit targets were checked at schema-build time.
                    self.report(
                        distance,
                        policy,
                        SchemaError::UnknownAliasTarget {
                            unit: unit.to_string(),
                            attribute: schema.get(i).name.clone(),
                            target_unit: alias.unit.to_string(),
                            target: alias.attribute.clone(),
                        },
                    )?;
                    continue;
                };
                if tm != index {
                    let declared = &schema.get(i).value_type;
                    let target_attr = target_schema.get(tj);
                    if target_attr.value_type != *declared {
                        self.report(
                            distance,
                            policy,
                            SchemaError::AliasTypeMismatch {
                                unit: unit.to_string(),
                                attribute: schema.get(i).name.clone(),
                                declared: declared.clone(),
                                target_unit: alias.unit.to_string(),
                                target: alias.attribute.clone(),
                                target_type: target_attr.value_type.clone(),
                            },
                        )?;
                        continue;
                    }
                    if target_attr.default.is_none() {
                        self.report(
                            distance,
                            policy,
                            SchemaError::MissingDefault {
                                unit: alias.unit.to_string(),
                                attribute: alias.attribute.clone(),
                            },
                        )?;
                        continue;
                    }
                }
                let target = AttrRef {
                    unit: alias.unit.clone(),
                    index: tj,
                };
                self.mappings[index]
                    .aliased_by
                    .entry(target)
                    .or_default()
                    .push(i);
            }
        }
        Ok(())
    }

    /// For every attribute, compute its transitive alias set and fold it into
    /// the routing tables of each mapping between here and the root
    fn process_aliases(&mut self, index: usize, policy: FailurePolicy) -> SchemaResult<()> {
        if self.mappings[index].terminal {
            return Ok(());
        }
        for i in 0..self.mappings[index].schema.len() {
            let seed = AttrRef {
                unit: self.mappings[index].unit.clone(),
                index: i,
            };
            let aliases = self.collect_aliases(index, seed);
            if aliases.len() < 2 {
                continue;
            }
            self.apply_alias_set(index, i, &aliases, policy)?;
        }
        Ok(())
    }

    /// Transitive closure of attributes that alias the seed, walked from the
    /// seed's own mapping toward the root
    fn collect_aliases(&self, index: usize, seed: AttrRef) -> Vec<AttrRef> {
        let mut aliases = vec![seed];
        let mut current = Some(index);
        while let Some(m) = current {
            let mapping = &self.mappings[m];
            let mut j = 0;
            while j < aliases.len() {
                if let Some(extra) = mapping.aliased_by.get(&aliases[j]) {
                    for &k in extra {
                        let aliased = AttrRef {
                            unit: mapping.unit.clone(),
                            index: k,
                        };
                        if !aliases.contains(&aliased) {
                            aliases.push(aliased);
                        }
                    }
                }
                j += 1;
            }
            current = mapping.parent;
        }
        aliases
    }

    fn apply_alias_set(
        &mut self,
        origin: usize,
        attribute: usize,
        aliases: &[AttrRef],
        policy: FailurePolicy,
    ) -> SchemaResult<()> {
        let root_attribute = {
            let root = &self.mappings[0];
            (0..root.schema.len()).find(|&j| {
                aliases.contains(&AttrRef {
                    unit: root.unit.clone(),
                    index: j,
                })
            })
        };

        let mut current = Some(origin);
        while let Some(m) = current {
            let local: Vec<usize> = {
                let mapping = &self.mappings[m];
                let mut local: Vec<usize> = aliases
                    .iter()
                    .filter(|a| a.unit == mapping.unit)
                    .map(|a| a.index)
                    .collect();
                local.sort_unstable();
                local
            };

            if let Some(root_attr) = root_attribute {
                if m != 0 {
                    for &j in &local {
                        self.mappings[m].alias_mappings[j] = Some(root_attr);
                    }
                }
            }
            self.mappings[m].mirror_groups.update_from(&local);

            // Pre-resolve this level's authoritative member against its own
            // meta-declaration instance: closer levels visited later in this
            // walk overwrite, so the route ends at the root-most override.
            if m != origin && !local.is_empty() && self.mappings[m].distance > 0 {
                let resolved = {
                    let mapping = &self.mappings[m];
                    let instance = mapping
                        .meta_instance
                        .as_ref()
                        .expect("meta-level mapping always carries its instance");
                    mapping.mirror_groups.resolve_for(
                        local[0],
                        &mapping.schema,
                        instance,
                        &direct_extract,
                    )
                };
                match resolved {
                    Ok(authoritative) => {
                        self.mappings[origin].value_mappings[attribute] = Some((m, authoritative));
                    }
                    Err(conflict) => {
                        let unit = self.mappings[m].unit.to_string();
                        self.report(
                            self.mappings[m].distance,
                            policy,
                            SchemaError::MetaMirrorConflict { unit, conflict },
                        )?;
                    }
                }
            }
            current = self.mappings[m].parent;
        }
        Ok(())
    }

    /// Same-name convention routing: a meta-level attribute is overridden by
    /// the root attribute of the same name, and by same-named attributes of
    /// closer meta levels; the attribute name `value` never participates
    fn add_convention_mappings(&mut self, index: usize) {
        if self.mappings[index].distance == 0 {
            return;
        }
        let schema = Arc::clone(&self.mappings[index].schema);
        let root_schema = Arc::clone(&self.mappings[0].schema);

        for i in 0..schema.len() {
            let name = &schema.get(i).name;
            if name == "value" {
                continue;
            }
            if let Some(root_attr) = root_schema.index_of(name) {
                self.mappings[index].convention_mappings[i] = Some(root_attr);
            }

            // Intermediate levels: the closest same-named attribute wins over
            // any alias-derived route that sits further from the root.
            let mut current = self.mappings[index].parent;
            while let Some(m) = current {
                if self.mappings[m].distance == 0 {
                    break;
                }
                if let Some(mj) = self.mappings[m].schema.index_of(name) {
                    let better = match self.mappings[index].value_mappings[i] {
                        None => true,
                        Some((src, _)) => self.mappings[src].distance > self.mappings[m].distance,
                    };
                    if better {
                        self.mappings[index].value_mappings[i] = Some((m, mj));
                    }
                }
                current = self.mappings[m].parent;
            }
        }
    }
}
