//! Candidate selection among multiple matching entries

use super::entry::MergedEntry;

/// Chooses one entry when several match the same unit type
///
/// Ties are always broken deterministically: aggregate index ascending, then
/// meta-declaration distance ascending, then first-encountered order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Selector {
    /// Prefer the candidate nearest the scanned element (lowest aggregate
    /// index), then the one closest to root in its meta-declaration chain
    #[default]
    Nearest,
    /// Prefer a directly declared candidate (distance 0) over any
    /// meta-declared one, regardless of where in the hierarchy it was found
    FirstDeclared,
}

impl Selector {
    pub(crate) fn select<'a>(
        &self,
        candidates: impl Iterator<Item = &'a MergedEntry>,
    ) -> Option<&'a MergedEntry> {
        candidates.min_by_key(|entry| self.rank(entry))
    }

    fn rank(&self, entry: &MergedEntry) -> (usize, usize, usize, usize) {
        match self {
            Selector::Nearest => (
                0,
                entry.aggregate_index(),
                entry.distance(),
                entry.order(),
            ),
            Selector::FirstDeclared => (
                usize::from(entry.distance() != 0),
                entry.aggregate_index(),
                entry.distance(),
                entry.order(),
            ),
        }
    }
}
