//! Crate-level error type and failure policy

use crate::mapping::MirrorConflict;
use crate::resolve::ResolveError;
use crate::scan::IntrospectionError;
use crate::schema::SchemaError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;

/// Top-level error for merged-view construction and queries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    /// A unit-type declaration or mapping tree is malformed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A merged attribute value could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The introspection collaborator failed during scanning
    #[error(transparent)]
    Introspection(#[from] IntrospectionError),

    /// A query required a unit type the view does not contain
    #[error("No metadata of unit type '{unit}' is present on the element")]
    MissingEntry {
        /// Requested unit type
        unit: String,
    },
}

impl From<MirrorConflict> for MergeError {
    fn from(conflict: MirrorConflict) -> Self {
        MergeError::Resolve(ResolveError::MirrorConflict(conflict))
    }
}

/// Strictness applied to defects found on meta levels
///
/// Defects in the directly queried unit type always fail; this policy only
/// governs defects discovered further up the meta-declaration hierarchy,
/// where one broken third-party declaration should not poison unrelated
/// queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Skip the defective declaration silently
    Ignore,
    /// Skip the defective declaration and log a warning
    Warn,
    /// Propagate the defect as an error
    #[default]
    Fail,
}
