//! Field resolution.
//!
//! Maps `(concrete type, field name)` to a composed accessor handle:
//! the projections leading from the concrete type to the declaring type,
//! then the field getter itself. Handles live in a process-wide cache that
//! is populated lazily, never invalidated, and safe to populate from many
//! evaluation threads at once. Racing resolutions of the same key converge
//! on a single cached handle.

use std::any::{Any, TypeId};
use std::sync::LazyLock;

use dashmap::DashMap;

use crate::types::{Fact, Getter, Object, RuleError};

static FIELD_CACHE: LazyLock<DashMap<(TypeId, String), FieldHandle>> =
    LazyLock::new(DashMap::new);

/// Number of `(type, field)` accessor handles resolved so far in this
/// process. Diagnostic; the cache itself is append-only.
#[must_use]
pub fn field_cache_entries() -> usize {
    FIELD_CACHE.len()
}

#[cfg(test)]
pub(crate) fn cache_contains(ty: TypeId, field: &str) -> bool {
    FIELD_CACHE.contains_key(&(ty, field.to_owned()))
}

/// A resolved accessor: zero or more base projections from the concrete
/// type, then the getter declared on the type where the field was found.
#[derive(Clone)]
struct FieldHandle {
    hops: Vec<&'static Getter>,
    get: &'static Getter,
}

impl FieldHandle {
    fn read<'a>(&self, obj: Object<'a>) -> Result<&'a dyn Fact, RuleError> {
        let mut instance: &'a dyn Any = obj.instance();
        let mut ty_name = obj.type_name();
        for hop in &self.hops {
            let base = hop(instance).ok_or_else(|| foreign_instance(ty_name))?;
            let base_obj = base.object().ok_or_else(|| foreign_instance(ty_name))?;
            instance = base_obj.instance();
            ty_name = base_obj.type_name();
        }
        (self.get)(instance).ok_or_else(|| foreign_instance(ty_name))
    }
}

/// Resolves `field` on the object's concrete type, searching its own
/// table first and then the base chain, most-derived first. The composed
/// handle is cached under the concrete type, so later resolutions for any
/// instance of that type skip the search entirely.
///
/// A field absent along the whole chain is a hard [`RuleError::FieldNotFound`],
/// never a silent null.
pub(crate) fn resolve<'a>(obj: Object<'a>, field: &str) -> Result<&'a dyn Fact, RuleError> {
    let key = (obj.instance().type_id(), field.to_owned());
    if let Some(cached) = FIELD_CACHE.get(&key) {
        let handle = cached.value().clone();
        return handle.read(obj);
    }

    let handle = search(obj, field)?;
    // First inserter wins; a racing resolver discards its own handle and
    // adopts the stored one.
    let handle = FIELD_CACHE.entry(key).or_insert(handle).value().clone();
    handle.read(obj)
}

fn search(obj: Object<'_>, field: &str) -> Result<FieldHandle, RuleError> {
    let origin = obj.type_name();
    let mut hops: Vec<&'static Getter> = Vec::new();
    let mut cur = obj;
    loop {
        if let Some(fd) = cur.ty().field(field) {
            return Ok(FieldHandle {
                hops,
                get: fd.get(),
            });
        }
        let Some(project) = cur.ty().base() else {
            return Err(RuleError::field_not_found(field, origin));
        };
        let base = project(cur.instance()).ok_or_else(|| foreign_instance(cur.type_name()))?;
        let Some(base_obj) = base.object() else {
            // The base value exposes no field table; the chain ends here.
            return Err(RuleError::field_not_found(field, origin));
        };
        hops.push(project);
        cur = base_obj;
    }
}

fn foreign_instance(ty_name: &str) -> RuleError {
    RuleError::mismatch(format!("instance of '{ty_name}'"), "a different type")
}
