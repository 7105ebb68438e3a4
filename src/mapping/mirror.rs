//! Mirror groups and authoritative-member resolution

use crate::schema::{Attribute, AttributeSchema, MetaValue, UnitInstance, UnitTypeId};
use smallvec::SmallVec;
use thiserror::Error;

/// Two mirror-group members hold differing non-default values
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "In unit '{unit}', attribute '{attribute_a}' and its mirror '{attribute_b}' declare different values: {value_a} vs {value_b}"
)]
pub struct MirrorConflict {
    /// Unit type declaring both attributes
    pub unit: UnitTypeId,
    /// Earlier-declared attribute
    pub attribute_a: String,
    /// Later-declared attribute
    pub attribute_b: String,
    /// Value held by `attribute_a`
    pub value_a: MetaValue,
    /// Value held by `attribute_b`
    pub value_b: MetaValue,
}

/// Injected value-extraction function, decoupling resolution from how a
/// concrete instance stores its values
pub type ValueExtractor<'a> = &'a (dyn Fn(&Attribute, &UnitInstance) -> Option<MetaValue> + 'a);

/// The default extractor: read the instance's explicitly supplied value
pub fn direct_extract(attribute: &Attribute, instance: &UnitInstance) -> Option<MetaValue> {
    instance.value(&attribute.name).cloned()
}

/// One set of attribute indices whose values must agree
#[derive(Debug, Clone, Default)]
pub struct MirrorGroup {
    members: SmallVec<[usize; 4]>,
}

impl MirrorGroup {
    /// Member attribute indices in declaration order
    pub fn members(&self) -> &[usize] {
        &self.members
    }
}

/// Partition of one unit mapping's attributes into mirror groups
///
/// Attributes not claimed by any group resolve to themselves, so callers
/// always obtain an authoritative index, mirrored or not.
#[derive(Debug, Clone, Default)]
pub struct MirrorGroups {
    groups: Vec<MirrorGroup>,
    assigned: Vec<Option<usize>>,
}

impl MirrorGroups {
    /// Create groups for a unit with the given attribute count
    pub fn new(attribute_count: usize) -> Self {
        Self {
            groups: Vec::new(),
            assigned: vec![None; attribute_count],
        }
    }

    /// All groups with two or more members
    pub fn groups(&self) -> &[MirrorGroup] {
        &self.groups
    }

    /// The group claiming the given attribute index, if any
    pub fn group_of(&self, attribute: usize) -> Option<&MirrorGroup> {
        self.assigned[attribute].map(|g| &self.groups[g])
    }

    /// Claim the given attribute indices (ascending declaration order) as one
    /// mirror group, merging with or splitting prior claims the way the
    /// latest declaration wins
    pub(crate) fn update_from(&mut self, members: &[usize]) {
        if members.len() < 2 {
            return;
        }
        let group = self.groups.len();
        self.groups.push(MirrorGroup::default());
        for &i in members {
            self.assigned[i] = Some(group);
        }
        self.rebuild();
    }

    /// Recompute group membership from the assignment table, dropping empty
    /// and singleton groups and renumbering in first-appearance order
    fn rebuild(&mut self) {
        let mut remap: Vec<Option<usize>> = vec![None; self.groups.len()];
        let mut rebuilt: Vec<MirrorGroup> = Vec::new();
        for slot in &mut self.assigned {
            if let Some(old) = *slot {
                let new = match remap[old] {
                    Some(new) => new,
                    None => {
                        rebuilt.push(MirrorGroup::default());
                        let new = rebuilt.len() - 1;
                        remap[old] = Some(new);
                        new
                    }
                };
                *slot = Some(new);
            }
        }
        for (i, slot) in self.assigned.iter().enumerate() {
            if let Some(g) = *slot {
                rebuilt[g].members.push(i);
            }
        }
        // A later claim can strand an earlier group with a single member;
        // singletons are not mirror groups.
        let mut index = 0;
        let mut kept: Vec<Option<usize>> = vec![None; rebuilt.len()];
        let mut finished: Vec<MirrorGroup> = Vec::new();
        for (g, group) in rebuilt.into_iter().enumerate() {
            if group.members.len() >= 2 {
                kept[g] = Some(index);
                index += 1;
                finished.push(group);
            }
        }
        for slot in &mut self.assigned {
            *slot = slot.and_then(|g| kept[g]);
        }
        self.groups = finished;
    }

    /// Resolve the authoritative attribute index for `attribute` against one
    /// concrete instance
    ///
    /// Members are scanned in declaration order: the first non-default value
    /// wins, a second differing non-default value is a conflict, and when
    /// every member holds its default the earliest-declared member is
    /// authoritative.
    pub fn resolve_for(
        &self,
        attribute: usize,
        schema: &AttributeSchema,
        instance: &UnitInstance,
        extract: ValueExtractor<'_>,
    ) -> Result<usize, MirrorConflict> {
        let Some(group) = self.group_of(attribute) else {
            return Ok(attribute);
        };
        self.resolve_group(group, schema, instance, extract)
    }

    /// Resolve every attribute of the unit at once, returning the
    /// authoritative index per attribute
    pub fn resolve_all(
        &self,
        schema: &AttributeSchema,
        instance: &UnitInstance,
        extract: ValueExtractor<'_>,
    ) -> Result<Vec<usize>, MirrorConflict> {
        let mut resolved: Vec<usize> = (0..schema.len()).collect();
        for group in &self.groups {
            let authoritative = self.resolve_group(group, schema, instance, extract)?;
            for &member in group.members() {
                resolved[member] = authoritative;
            }
        }
        Ok(resolved)
    }

    fn resolve_group(
        &self,
        group: &MirrorGroup,
        schema: &AttributeSchema,
        instance: &UnitInstance,
        extract: ValueExtractor<'_>,
    ) -> Result<usize, MirrorConflict> {
        let mut result: Option<usize> = None;
        let mut last: Option<(usize, MetaValue)> = None;

        for &member in group.members() {
            let attr = schema.get(member);
            let raw = extract(attr, instance);
            let is_default = match (&raw, &attr.default) {
                (None, _) => true,
                (Some(v), Some(d)) => v == d,
                (Some(_), None) => false,
            };
            let effective = raw.or_else(|| attr.default.clone());

            if is_default || last.as_ref().map(|(_, v)| Some(v)) == Some(effective.as_ref()) {
                if result.is_none() {
                    result = Some(member);
                }
                continue;
            }
            // Non-default values always exist at this point: a missing raw
            // value counts as default above.
            let Some(value) = effective else { continue };
            if let Some((prior, prior_value)) = &last {
                let prior_attr = schema.get(*prior);
                return Err(MirrorConflict {
                    unit: schema.unit().clone(),
                    attribute_a: prior_attr.name.clone(),
                    attribute_b: attr.name.clone(),
                    value_a: prior_value.clone(),
                    value_b: value,
                });
            }
            result = Some(member);
            last = Some((member, value));
        }

        Ok(result.unwrap_or(group.members()[0]))
    }
}
