//! Declarative-metadata merging in Rust
//!
//! Resolves metadata ("annotations") attached to program elements into a
//! single, conflict-checked view, even when metadata unit types are
//! themselves decorated by other unit types and attributes alias each other
//! within or across units.
//!
//! ```
//! use metamerge::{
//!     Attribute, ElementDef, ElementModel, MergeEngine, MetaValue, SearchStrategy,
//!     UnitInstance, UnitTypeDecl, UnitTypeRegistry, ValueType,
//! };
//! use std::sync::Arc;
//!
//! let registry = UnitTypeRegistry::new();
//! registry.declare(
//!     UnitTypeDecl::builder("Service")
//!         .attribute(Attribute::new("name", ValueType::String).with_default(""))
//!         .build(),
//! );
//!
//! let mut model = ElementModel::new();
//! let element = model.define(
//!     ElementDef::new("OrderService").annotated(UnitInstance::new("Service").with("name", "orders")),
//! );
//!
//! let engine = MergeEngine::new(Arc::new(registry));
//! let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();
//! let entry = view.get(&"Service".into()).unwrap();
//! assert_eq!(entry.get("name").unwrap(), MetaValue::string("orders"));
//! ```

pub mod engine;
pub mod error;
pub mod mapping;
pub mod merged;
pub mod resolve;
pub mod scan;
pub mod schema;

pub use engine::{MergeConfig, MergeEngine};
pub use error::{FailurePolicy, MergeError, Result};
pub use mapping::{MappingCache, MirrorConflict, UnitMapping, UnitMappingTree};
pub use merged::{Adapt, MergedEntry, MergedView, Selector};
pub use resolve::{ResolveError, ValueResolver};
pub use scan::{
    ElementDef, ElementId, ElementModel, ElementScanner, IntrospectionError, Introspector,
    ScanProcessor, SearchStrategy,
};
pub use schema::{
    AliasDecl, Attribute, AttributeSchema, MetaValue, SchemaError, UnitInstance, UnitTypeDecl,
    UnitTypeId, UnitTypeRegistry, ValueType,
};
