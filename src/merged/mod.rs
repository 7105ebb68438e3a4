//! Merged entries, views, selectors, and export adaptations
//!
//! The public query surface of the crate: a [`MergedView`] collects the
//! [`MergedEntry`] candidates a scan produced, a [`Selector`] picks among
//! multiple matches, and [`Adapt`] flags shape exported value maps.

pub mod adapt;
pub mod entry;
pub mod selector;
pub mod view;

pub use adapt::Adapt;
pub use entry::{ExtractorFn, MergedEntry};
pub use selector::Selector;
pub use view::MergedView;
