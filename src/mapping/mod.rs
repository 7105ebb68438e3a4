//! Unit mappings, mirror groups, and their caches
//!
//! This layer turns unit-type declarations into the immutable routing
//! structures that drive resolution: per-root [`UnitMappingTree`]s, their
//! per-level [`UnitMapping`]s, and the [`MirrorGroups`] partitioning each
//! level's attributes.

pub mod cache;
pub mod mirror;
pub mod tree;

pub use cache::MappingCache;
pub use mirror::{MirrorConflict, MirrorGroup, MirrorGroups, ValueExtractor, direct_extract};
pub use tree::{UnitMapping, UnitMappingTree};
