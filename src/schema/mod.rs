//! Metadata schema model
//!
//! Unit-type declarations, their attributes and alias declarations, the
//! runtime value model, and the validated per-unit [`AttributeSchema`] that
//! the mapping layer is built from.

pub mod attribute;
pub mod error;
pub(crate) mod intern;
pub mod types;
pub mod unit;
pub mod value;

pub use attribute::{AliasDecl, Attribute};
pub use error::{SchemaError, SchemaResult};
pub use types::ValueType;
pub use unit::{UnitInstance, UnitTypeDecl, UnitTypeDeclBuilder, UnitTypeId, UnitTypeRegistry};
pub use value::MetaValue;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// An alias declaration with its target fully named
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAlias {
    /// Target unit type (the declaring unit for same-unit mirrors)
    pub unit: UnitTypeId,
    /// Target attribute name
    pub attribute: String,
}

/// Validated, ordered view over a unit type's attributes
///
/// Building the schema performs every check that can be made from the
/// declaration alone: duplicate attribute names, malformed alias targets,
/// type and default agreement between same-unit mirror partners. Checks that
/// need another unit's schema run later, when a mapping tree is assembled.
#[derive(Debug)]
pub struct AttributeSchema {
    decl: Arc<UnitTypeDecl>,
    index: FxHashMap<String, usize>,
    resolved_aliases: Vec<SmallVec<[ResolvedAlias; 1]>>,
}

impl AttributeSchema {
    /// Validate a declaration and build its schema
    pub fn build(decl: Arc<UnitTypeDecl>) -> SchemaResult<Self> {
        let unit = decl.id.clone();
        let mut index = FxHashMap::default();
        for (i, attribute) in decl.attributes.iter().enumerate() {
            if index.insert(attribute.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateAttribute {
                    unit: unit.to_string(),
                    attribute: attribute.name.clone(),
                });
            }
            if let Some(default) = &attribute.default {
                if !attribute.value_type.accepts(default) {
                    return Err(SchemaError::DefaultWrongType {
                        unit: unit.to_string(),
                        attribute: attribute.name.clone(),
                        declared: attribute.value_type.clone(),
                    });
                }
            }
        }

        let mut resolved_aliases = Vec::with_capacity(decl.attributes.len());
        for attribute in &decl.attributes {
            let mut resolved: SmallVec<[ResolvedAlias; 1]> = SmallVec::new();
            for alias in &attribute.aliases {
                resolved.push(Self::resolve_alias(&decl, attribute, alias, &index)?);
            }
            resolved_aliases.push(resolved);
        }

        Ok(Self {
            decl,
            index,
            resolved_aliases,
        })
    }

    fn resolve_alias(
        decl: &UnitTypeDecl,
        attribute: &Attribute,
        alias: &AliasDecl,
        index: &FxHashMap<String, usize>,
    ) -> SchemaResult<ResolvedAlias> {
        let unit = decl.id.to_string();

        if alias.value.is_some() && alias.attribute.is_some() {
            return Err(SchemaError::ConflictingAliasTarget {
                unit,
                attribute: attribute.name.clone(),
            });
        }
        let target = alias
            .value
            .as_deref()
            .or(alias.attribute.as_deref())
            .unwrap_or(&attribute.name)
            .to_string();
        let target_unit = alias.unit.clone().unwrap_or_else(|| decl.id.clone());

        // Any aliased attribute needs a default: resolution falls back to it
        // when deciding which mirror member is authoritative.
        if attribute.default.is_none() {
            return Err(SchemaError::MissingDefault {
                unit,
                attribute: attribute.name.clone(),
            });
        }

        if target_unit == decl.id {
            if target == attribute.name {
                return Err(SchemaError::SelfAlias {
                    unit,
                    attribute: attribute.name.clone(),
                });
            }
            let Some(&target_index) = index.get(&target) else {
                return Err(SchemaError::UnknownAliasTarget {
                    unit: unit.clone(),
                    attribute: attribute.name.clone(),
                    target_unit: unit,
                    target,
                });
            };
            let partner = &decl.attributes[target_index];
            if partner.value_type != attribute.value_type {
                return Err(SchemaError::AliasTypeMismatch {
                    unit: unit.clone(),
                    attribute: attribute.name.clone(),
                    declared: attribute.value_type.clone(),
                    target_unit: unit,
                    target,
                    target_type: partner.value_type.clone(),
                });
            }
            if partner.default.is_none() {
                return Err(SchemaError::MissingDefault {
                    unit,
                    attribute: partner.name.clone(),
                });
            }
            if partner.default != attribute.default {
                return Err(SchemaError::DefaultMismatch {
                    unit,
                    attribute: attribute.name.clone(),
                    target,
                });
            }
        }

        Ok(ResolvedAlias {
            unit: target_unit,
            attribute: target,
        })
    }

    /// The unit type this schema describes
    pub fn unit(&self) -> &UnitTypeId {
        &self.decl.id
    }

    /// The underlying declaration
    pub fn decl(&self) -> &Arc<UnitTypeDecl> {
        &self.decl
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> &[Attribute] {
        &self.decl.attributes
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.decl.attributes.len()
    }

    /// Whether the unit declares no attributes
    pub fn is_empty(&self) -> bool {
        self.decl.attributes.is_empty()
    }

    /// Attribute at the given declaration-order index
    pub fn get(&self, index: usize) -> &Attribute {
        &self.decl.attributes[index]
    }

    /// Declaration-order index of a named attribute
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Resolved alias targets of the attribute at the given index
    pub fn aliases_of(&self, index: usize) -> &[ResolvedAlias] {
        &self.resolved_aliases[index]
    }
}
