//! Metadata storage
//!
//! WeakMap-style side-table for attaching metadata to objects without
//! touching their property tables.
//!
//! Objects are keyed by handle identity. Entries live until deleted or until
//! the realm releases their object.

use rustc_hash::FxHashMap;

use crate::object::ObjectId;
use crate::value::Value;

/// A key for metadata - can be any string
pub type MetadataKey = String;

/// Realm-wide metadata store
#[derive(Debug, Default, Clone)]
pub struct MetadataStore {
    targets: FxHashMap<ObjectId, FxHashMap<MetadataKey, Value>>,
}

impl MetadataStore {
    /// Create a new empty metadata store
    pub fn new() -> Self {
        Self::default()
    }

    /// Define metadata on a target
    pub fn define_metadata(&mut self, key: impl Into<MetadataKey>, value: Value, target: ObjectId) {
        self.targets.entry(target).or_default().insert(key.into(), value);
    }

    /// Get metadata from a target
    pub fn get_metadata(&self, key: &str, target: ObjectId) -> Option<&Value> {
        self.targets.get(&target)?.get(key)
    }

    /// Check if target has metadata
    pub fn has_metadata(&self, key: &str, target: ObjectId) -> bool {
        self.targets.get(&target).is_some_and(|e| e.contains_key(key))
    }

    /// Delete metadata from a target.
    /// Returns true if the metadata existed and was deleted
    pub fn delete_metadata(&mut self, key: &str, target: ObjectId) -> bool {
        let Some(entry) = self.targets.get_mut(&target) else {
            return false;
        };
        let removed = entry.remove(key).is_some();
        if entry.is_empty() {
            self.targets.remove(&target);
        }
        removed
    }

    /// Clear all metadata for a target
    pub fn clear_target(&mut self, target: ObjectId) -> bool {
        self.targets.remove(&target).is_some()
    }

    /// Get total number of targets with metadata
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: u32) -> ObjectId {
        ObjectId::new(id, 0)
    }

    #[test]
    fn test_define_and_get_metadata() {
        let mut store = MetadataStore::new();
        let target = handle(1);

        store.define_metadata("key", Value::from(42), target);
        assert_eq!(store.get_metadata("key", target), Some(&Value::from(42)));
        assert_eq!(store.get_metadata("nonexistent", target), None);
    }

    #[test]
    fn test_has_metadata() {
        let mut store = MetadataStore::new();
        let target = handle(2);

        assert!(!store.has_metadata("key", target));
        store.define_metadata("key", Value::Bool(true), target);
        assert!(store.has_metadata("key", target));
        assert!(!store.has_metadata("other", target));
    }

    #[test]
    fn test_delete_metadata() {
        let mut store = MetadataStore::new();
        let target = handle(4);

        store.define_metadata("key", Value::from(100), target);
        store.define_metadata("other", Value::from(1), target);
        assert!(store.delete_metadata("key", target));
        assert!(!store.has_metadata("key", target));
        assert_eq!(store.target_count(), 1);

        // The last key takes the target entry with it
        assert!(store.delete_metadata("other", target));
        assert_eq!(store.target_count(), 0);

        // Deleting non-existent returns false
        assert!(!store.delete_metadata("key", target));
    }

    #[test]
    fn test_separate_targets() {
        let mut store = MetadataStore::new();
        let target1 = handle(10);
        let target2 = handle(20);

        store.define_metadata("key", Value::from(1), target1);
        store.define_metadata("key", Value::from(2), target2);

        assert_eq!(store.get_metadata("key", target1), Some(&Value::from(1)));
        assert_eq!(store.get_metadata("key", target2), Some(&Value::from(2)));

        assert!(store.clear_target(target1));
        assert!(!store.has_metadata("key", target1));
        assert!(!store.clear_target(target1));
        assert_eq!(store.target_count(), 1);
    }

    #[test]
    fn test_generations_are_distinct_targets() {
        let mut store = MetadataStore::new();
        store.define_metadata("key", Value::from(1), ObjectId::new(3, 0));
        assert!(!store.has_metadata("key", ObjectId::new(3, 1)));
    }
}
