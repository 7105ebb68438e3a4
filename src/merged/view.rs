//! Query surface over collected merged entries

use super::entry::MergedEntry;
use super::selector::Selector;
use crate::error::{MergeError, Result};
use crate::schema::UnitTypeId;

/// All merged metadata found on one element under one search strategy
///
/// Entries appear in traversal order: hierarchy depth first, then encounter
/// order at a level, then meta-declaration distance within one attachment.
/// A view is immutable; repeated queries return identical results.
#[derive(Debug, Clone, Default)]
pub struct MergedView {
    entries: Vec<MergedEntry>,
}

impl MergedView {
    pub(crate) fn new(entries: Vec<MergedEntry>) -> Self {
        Self { entries }
    }

    /// A view with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether any entry exists for the unit type, directly or via
    /// meta-declaration
    pub fn is_present(&self, unit: &UnitTypeId) -> bool {
        self.entries.iter().any(|entry| entry.unit() == unit)
    }

    /// Whether an instance of the unit type is physically attached somewhere
    /// in the scanned hierarchy
    pub fn is_directly_present(&self, unit: &UnitTypeId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.unit() == unit && entry.distance() == 0)
    }

    /// The single best entry for a unit type under the default selector
    pub fn get(&self, unit: &UnitTypeId) -> Result<&MergedEntry> {
        self.get_with(unit, |_| true, Selector::default())
    }

    /// The single best entry for a unit type among the candidates accepted
    /// by the predicate, under an explicit selector
    pub fn get_with<P>(
        &self,
        unit: &UnitTypeId,
        predicate: P,
        selector: Selector,
    ) -> Result<&MergedEntry>
    where
        P: Fn(&MergedEntry) -> bool,
    {
        selector
            .select(self.stream_unit(unit).filter(|entry| predicate(entry)))
            .ok_or_else(|| MergeError::MissingEntry {
                unit: unit.to_string(),
            })
    }

    /// All entries in traversal order
    pub fn stream(&self) -> impl Iterator<Item = &MergedEntry> {
        self.entries.iter()
    }

    /// All entries of one unit type in traversal order
    pub fn stream_unit<'a>(
        &'a self,
        unit: &UnitTypeId,
    ) -> impl Iterator<Item = &'a MergedEntry> + use<'a> {
        let unit = unit.clone();
        self.entries.iter().filter(move |entry| *entry.unit() == unit)
    }

    /// Number of entries in the view
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the view holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
