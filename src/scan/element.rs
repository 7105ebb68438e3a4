//! Program elements and the introspection seam

use crate::schema::UnitInstance;
use crate::schema::intern::intern;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for introspection operations
pub type IntrospectionResult<T> = Result<T, IntrospectionError>;

/// Errors raised by the introspection collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntrospectionError {
    /// The element handle does not resolve to a known program element
    #[error("Unknown program element '{element}'")]
    UnknownElement {
        /// Element name
        element: String,
    },
}

/// Opaque handle to a program element (a type, method, or field)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(Arc<str>);

impl ElementId {
    /// Intern an element name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(intern(name.as_ref()))
    }

    /// The element name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Supplies raw metadata and hierarchy relations for program elements
///
/// The resolution core is decoupled from any concrete reflection mechanism
/// through this trait; [`ElementModel`] is the in-memory reference
/// implementation.
pub trait Introspector {
    /// Metadata instances physically attached to the element, in declaration
    /// order
    fn raw_metadata_of(&self, element: &ElementId) -> IntrospectionResult<Vec<Arc<UnitInstance>>>;

    /// The element's direct supertype, if any
    fn supertype_of(&self, element: &ElementId) -> Option<ElementId>;

    /// Interfaces the element directly implements or extends
    fn interfaces_of(&self, element: &ElementId) -> Vec<ElementId>;

    /// The lexically enclosing element, if any
    fn enclosing_of(&self, element: &ElementId) -> Option<ElementId>;
}

#[derive(Debug, Default)]
struct ElementData {
    metadata: Vec<Arc<UnitInstance>>,
    supertype: Option<ElementId>,
    interfaces: Vec<ElementId>,
    enclosing: Option<ElementId>,
}

/// Definition of one element for the in-memory model
#[derive(Debug)]
pub struct ElementDef {
    id: ElementId,
    data: ElementData,
}

impl ElementDef {
    /// Define an element with the given name
    pub fn new(id: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            data: ElementData::default(),
        }
    }

    /// Attach a metadata instance
    pub fn annotated(mut self, instance: UnitInstance) -> Self {
        self.data.metadata.push(Arc::new(instance));
        self
    }

    /// Set the direct supertype
    pub fn extends(mut self, supertype: impl Into<ElementId>) -> Self {
        self.data.supertype = Some(supertype.into());
        self
    }

    /// Add a directly implemented interface
    pub fn implements(mut self, interface: impl Into<ElementId>) -> Self {
        self.data.interfaces.push(interface.into());
        self
    }

    /// Set the lexically enclosing element
    pub fn enclosed_by(mut self, enclosing: impl Into<ElementId>) -> Self {
        self.data.enclosing = Some(enclosing.into());
        self
    }
}

/// In-memory element graph implementing [`Introspector`]
///
/// Elements are defined up front; the model is then read-only during
/// scanning.
#[derive(Debug, Default)]
pub struct ElementModel {
    elements: FxHashMap<ElementId, ElementData>,
}

impl ElementModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Define an element, returning its handle
    pub fn define(&mut self, def: ElementDef) -> ElementId {
        let id = def.id.clone();
        self.elements.insert(id.clone(), def.data);
        id
    }

    fn get(&self, element: &ElementId) -> Option<&ElementData> {
        self.elements.get(element)
    }
}

impl Introspector for ElementModel {
    fn raw_metadata_of(&self, element: &ElementId) -> IntrospectionResult<Vec<Arc<UnitInstance>>> {
        self.get(element)
            .map(|data| data.metadata.clone())
            .ok_or_else(|| IntrospectionError::UnknownElement {
                element: element.to_string(),
            })
    }

    fn supertype_of(&self, element: &ElementId) -> Option<ElementId> {
        self.get(element).and_then(|data| data.supertype.clone())
    }

    fn interfaces_of(&self, element: &ElementId) -> Vec<ElementId> {
        self.get(element)
            .map(|data| data.interfaces.clone())
            .unwrap_or_default()
    }

    fn enclosing_of(&self, element: &ElementId) -> Option<ElementId> {
        self.get(element).and_then(|data| data.enclosing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_edges() {
        let mut model = ElementModel::new();
        model.define(ElementDef::new("Base"));
        let service = model.define(
            ElementDef::new("Service")
                .extends("Base")
                .implements("Repository"),
        );
        assert_eq!(model.supertype_of(&service), Some("Base".into()));
        assert_eq!(model.interfaces_of(&service), vec!["Repository".into()]);
        assert_eq!(model.enclosing_of(&service), None);
    }

    #[test]
    fn test_unknown_element_is_an_error() {
        let model = ElementModel::new();
        let err = model.raw_metadata_of(&"Ghost".into()).unwrap_err();
        assert!(matches!(err, IntrospectionError::UnknownElement { .. }));
    }
}
