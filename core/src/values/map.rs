//! The string-keyed generic map.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Error;
use crate::types::{TypeId, TypeRegistry};
use crate::values::handle::Handle;
use crate::values::init::MapInitEntry;
use crate::values::object::GcParticipant;
use crate::values::slot::{Value, ValueRef, ValueSlot};

/// A map from string keys to values of arbitrary per-entry type.
///
/// Each entry is its own [`ValueSlot`], so every entry carries its own type
/// tag and the slot's never-raising set/get discipline applies per key. Keys
/// are unique and iterate in lexicographic order; positional access walks the
/// ordering and is O(n) by design — it exists for script-side iteration, not
/// as an index.
pub struct DynamicMap {
    registry: Arc<TypeRegistry>,
    entries: BTreeMap<String, ValueSlot>,
}

impl DynamicMap {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry, entries: BTreeMap::new() }
    }

    /// Decode a map literal produced by the compiler front-end.
    ///
    /// A later entry for the same key overwrites the earlier one, matching
    /// repeated `set` calls.
    pub fn from_entries(
        registry: Arc<TypeRegistry>,
        entries: impl IntoIterator<Item = MapInitEntry>,
    ) -> Result<Self, Error> {
        let mut map = Self::new(registry);
        for entry in entries {
            if !map.set(entry.key, entry.ty, entry.value) {
                return Err(Error::TemplateMismatch);
            }
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `value` under `key` as type `ty`, creating or overwriting the
    /// entry. Returns `false` (map unchanged for a new key, entry unchanged
    /// for an existing one) when the value does not fit `ty`.
    pub fn set(&mut self, key: impl Into<String>, ty: TypeId, value: Value) -> bool {
        use std::collections::btree_map::Entry;
        match self.entries.entry(key.into()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().set(&self.registry, ty, value),
            Entry::Vacant(vacant) => {
                let mut slot = ValueSlot::new();
                if slot.set(&self.registry, ty, value) {
                    vacant.insert(slot);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Copy the value under `key` out as type `want`; `None` when the key is
    /// absent or the stored value does not convert.
    pub fn get(&self, key: &str, want: TypeId) -> Option<Value> {
        self.entries.get(key)?.get(&self.registry, want)
    }

    /// The type the value under `key` was stored as.
    pub fn get_type(&self, key: &str) -> Option<TypeId> {
        self.entries.get(key)?.type_id()
    }

    /// Borrowed view of the value under `key`.
    pub fn value_ref(&self, key: &str) -> Option<ValueRef<'_>> {
        self.entries.get(key)?.value_ref()
    }

    /// Remove the entry under `key`, releasing its payload. Returns whether
    /// an entry existed.
    pub fn erase(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(mut slot) => {
                slot.release();
                true
            }
            None => false,
        }
    }

    /// Release every entry.
    pub fn clear(&mut self) {
        for slot in self.entries.values_mut() {
            slot.release();
        }
        self.entries.clear();
    }

    /// All keys, in iteration (lexicographic) order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The key at iteration position `index`. O(n).
    pub fn key_at(&self, index: usize) -> Result<&str, Error> {
        self.entries
            .keys()
            .nth(index)
            .map(String::as_str)
            .ok_or(Error::OutOfBounds)
    }

    /// The entry at iteration position `index`. O(n).
    pub fn value_at(&self, index: usize) -> Result<(&str, &ValueSlot), Error> {
        self.entries
            .iter()
            .nth(index)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or(Error::OutOfBounds)
    }
}

impl GcParticipant for DynamicMap {
    fn enumerate_references(&self, visitor: &mut dyn FnMut(&Handle)) {
        for slot in self.entries.values() {
            slot.enumerate_refs(&self.registry, visitor);
        }
    }

    fn release_references(&mut self) {
        for slot in self.entries.values_mut() {
            slot.release_refs();
        }
    }
}

impl core::fmt::Debug for DynamicMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v.type_id())))
            .finish()
    }
}
