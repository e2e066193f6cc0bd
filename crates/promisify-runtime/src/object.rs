//! Object model: identities, property descriptors and heap objects

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::RuntimeResult;
use crate::realm::Realm;
use crate::value::Value;

/// Opaque handle referencing an object in a [`Realm`]'s heap.
///
/// Handle equality is reference identity. A heap slot is reused after its
/// object is released, so a handle also carries the slot generation it was
/// issued for; stale handles never alias the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Index into the owning heap
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "#{}", self.index),
            g => write!(f, "#{}.{}", self.index, g),
        }
    }
}

// ============================================================================
// Property descriptors
// ============================================================================

/// Property descriptor: data vs accessor
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDescriptor {
    /// Data descriptor: has `value` and `writable`
    Data {
        /// Stored value
        value: Value,
        /// Can the value be reassigned
        writable: bool,
        /// Visible to key enumeration
        enumerable: bool,
        /// Can the descriptor be redefined or deleted
        configurable: bool,
    },
    /// Accessor descriptor: has `get` and/or `set`
    Accessor {
        /// Getter function
        get: Option<ObjectId>,
        /// Setter function
        set: Option<ObjectId>,
        /// Visible to key enumeration
        enumerable: bool,
        /// Can the descriptor be redefined or deleted
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Writable, enumerable, configurable data property (plain assignment)
    pub fn data(value: impl Into<Value>) -> Self {
        Self::Data {
            value: value.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable, configurable but non-enumerable data property (builtins)
    pub fn hidden(value: impl Into<Value>) -> Self {
        Self::Data {
            value: value.into(),
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Enumerable, configurable accessor property
    pub fn accessor(get: Option<ObjectId>, set: Option<ObjectId>) -> Self {
        Self::Accessor {
            get,
            set,
            enumerable: true,
            configurable: true,
        }
    }

    /// Is this descriptor configurable?
    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    /// Is this descriptor enumerable?
    pub fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    /// Is this a data descriptor?
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    /// Is this an accessor descriptor?
    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    /// Get the value if this is a data descriptor
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Is this a data descriptor with writable=true?
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { writable, .. } => *writable,
            Self::Accessor { .. } => false,
        }
    }

    pub(crate) fn freeze(&mut self) {
        match self {
            Self::Data {
                writable,
                configurable,
                ..
            } => {
                *writable = false;
                *configurable = false;
            }
            Self::Accessor { configurable, .. } => *configurable = false,
        }
    }
}

// ============================================================================
// PropertyMap
// ============================================================================

/// Insertion-ordered own-property table.
///
/// Replacing an existing key keeps its position; removal shifts later keys.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(String, PropertyDescriptor)>,
    index: FxHashMap<String, usize>,
}

impl PropertyMap {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a descriptor by key
    pub fn get(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    /// Look up a descriptor by key for in-place update
    pub fn get_mut(&mut self, key: &str) -> Option<&mut PropertyDescriptor> {
        let slot = *self.index.get(key)?;
        Some(&mut self.entries[slot].1)
    }

    /// Check for an own key
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace; returns the previous descriptor
    pub fn insert(&mut self, key: &str, desc: PropertyDescriptor) -> Option<PropertyDescriptor> {
        if let Some(&slot) = self.index.get(key) {
            return Some(std::mem::replace(&mut self.entries[slot].1, desc));
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push((key.to_string(), desc));
        None
    }

    /// Remove a key; returns the removed descriptor
    pub fn remove(&mut self, key: &str) -> Option<PropertyDescriptor> {
        let slot = self.index.remove(key)?;
        let (_, desc) = self.entries.remove(slot);
        for (_, later) in self.index.iter_mut() {
            if *later > slot {
                *later -= 1;
            }
        }
        Some(desc)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }

    /// Number of own properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no own properties
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Native function body: `(realm, this, args) -> result`.
///
/// Returning `Err(RuntimeError::Thrown(v))` throws `v` to the caller.
pub type NativeFn = Arc<dyn Fn(&mut Realm, &Value, &[Value]) -> RuntimeResult<Value> + Send + Sync>;

/// Callable payload of a function object
#[derive(Clone)]
pub struct FunctionData {
    /// Function name (diagnostics only)
    pub name: String,
    /// Can be used with `Realm::construct`
    pub constructible: bool,
    pub(crate) behavior: NativeFn,
}

impl fmt::Debug for FunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionData")
            .field("name", &self.name)
            .field("constructible", &self.constructible)
            .finish_non_exhaustive()
    }
}

/// Object payload
#[derive(Debug, Clone)]
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Callable object
    Function(FunctionData),
}

/// Heap-resident object
#[derive(Debug, Clone)]
pub struct HeapObject {
    pub(crate) kind: ObjectKind,
    pub(crate) prototype: Option<ObjectId>,
    pub(crate) properties: PropertyMap,
    pub(crate) extensible: bool,
    pub(crate) intrinsic: bool,
}

impl HeapObject {
    pub(crate) fn new(kind: ObjectKind, prototype: Option<ObjectId>) -> Self {
        Self {
            kind,
            prototype,
            properties: PropertyMap::new(),
            extensible: true,
            intrinsic: false,
        }
    }

    /// Get the function payload if this object is callable
    pub fn function(&self) -> Option<&FunctionData> {
        match &self.kind {
            ObjectKind::Function(data) => Some(data),
            ObjectKind::Ordinary => None,
        }
    }

    /// Check if this object is callable
    pub fn is_callable(&self) -> bool {
        self.function().is_some()
    }

    /// `[[Prototype]]` slot
    pub fn prototype(&self) -> Option<ObjectId> {
        self.prototype
    }

    /// Own property table
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Can new properties be added
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// Realm-provided builtin object
    pub fn is_intrinsic(&self) -> bool {
        self.intrinsic
    }
}
