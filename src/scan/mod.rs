//! Element introspection and hierarchy scanning
//!
//! The scan layer finds the raw metadata that resolution operates on: an
//! [`Introspector`] supplies per-element facts, a [`SearchStrategy`] decides
//! how far to look, and [`ElementScanner`] drives the traversal through a
//! caller-supplied [`ScanProcessor`].

pub mod element;
pub mod scanner;
pub mod strategy;

pub use element::{
    ElementDef, ElementId, ElementModel, IntrospectionError, IntrospectionResult, Introspector,
};
pub use scanner::{ElementScanner, ScanProcessor};
pub use strategy::SearchStrategy;
