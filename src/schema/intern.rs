//! Name interning for unit-type and element identifiers
//!
//! Identifiers are compared and hashed constantly during mapping construction,
//! so they are interned into shared `Arc<str>` handles once and cloned cheaply
//! afterwards.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Process-wide interner for identifier strings
static INTERNER: Lazy<DashMap<String, Arc<str>>> = Lazy::new(DashMap::new);

/// Intern a name, returning a shared `Arc<str>`
pub(crate) fn intern(name: &str) -> Arc<str> {
    if let Some(interned) = INTERNER.get(name) {
        return Arc::clone(&interned);
    }

    let interned: Arc<str> = Arc::from(name);
    match INTERNER.entry(name.to_string()) {
        dashmap::mapref::entry::Entry::Occupied(entry) => Arc::clone(entry.get()),
        dashmap::mapref::entry::Entry::Vacant(entry) => {
            let result = Arc::clone(&interned);
            entry.insert(interned);
            result
        }
    }
}
