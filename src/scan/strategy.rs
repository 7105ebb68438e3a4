//! Element-hierarchy traversal strategies

use std::fmt;

/// How far [`super::ElementScanner`] walks an element's hierarchy
///
/// Each strategy's candidate set contains the previous one's: `Inherited` ⊆
/// `Superclass` ⊆ `TypeHierarchy` ⊆ `TypeHierarchyAndEnclosing`. Within a
/// level the supertype is visited before interfaces, in declaration order;
/// enclosing scopes continue incrementing the aggregate index after the type
/// hierarchy is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchStrategy {
    /// Only metadata physically attached to the element
    #[default]
    Direct,
    /// Direct metadata plus supertype metadata of inheritable unit types,
    /// stopping at the first supertype contributing none
    Inherited,
    /// Direct metadata plus every supertype's direct metadata, inheritable
    /// or not
    Superclass,
    /// `Superclass` plus all implemented and extended interfaces,
    /// recursively
    TypeHierarchy,
    /// `TypeHierarchy`, repeated for each lexically enclosing element
    TypeHierarchyAndEnclosing,
}

impl SearchStrategy {
    /// Whether the strategy visits anything beyond the element itself
    pub fn searches_hierarchy(&self) -> bool {
        !matches!(self, SearchStrategy::Direct)
    }

    /// Whether the strategy visits interfaces
    pub fn searches_interfaces(&self) -> bool {
        matches!(
            self,
            SearchStrategy::TypeHierarchy | SearchStrategy::TypeHierarchyAndEnclosing
        )
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStrategy::Direct => "DIRECT",
            SearchStrategy::Inherited => "INHERITED",
            SearchStrategy::Superclass => "SUPERCLASS",
            SearchStrategy::TypeHierarchy => "TYPE_HIERARCHY",
            SearchStrategy::TypeHierarchyAndEnclosing => "TYPE_HIERARCHY_AND_ENCLOSING",
        };
        f.write_str(name)
    }
}
