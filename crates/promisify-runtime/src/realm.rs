//! Realm: object heap, intrinsics and property semantics
//!
//! The realm owns every object as an arena entry addressed by [`ObjectId`].
//! Two intrinsic prototypes are created up front:
//!
//! - `%Object.prototype%`: root of ordinary objects, carries
//!   `hasOwnProperty` and `toString`
//! - `%Function.prototype%`: prototype of every function, carries `call`
//!   and `apply`
//!
//! All builtins are non-enumerable and flagged intrinsic, so reflection over
//! user objects never reaches them.
//!
//! Objects stay alive until explicitly released. A released slot goes on a
//! free list and is handed out again with a bumped generation, so handles to
//! the old occupant turn invalid instead of aliasing the new one.
//!
//! Reflective operations (`get_own_property`, `own_keys`, `lookup`, ...)
//! only inspect descriptors. Semantic operations (`get`, `set`, `call`,
//! `construct`) may run native code, including accessors.

use std::sync::Arc;

use crate::error::{RuntimeError, RuntimeResult};
use crate::metadata::MetadataStore;
use crate::object::{FunctionData, HeapObject, ObjectId, ObjectKind, PropertyDescriptor};
use crate::value::Value;

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: HeapObject,
}

/// Object heap with intrinsics and a metadata side-table
#[derive(Debug)]
pub struct Realm {
    objects: Vec<Slot>,
    free: Vec<u32>,
    object_prototype: ObjectId,
    function_prototype: ObjectId,
    metadata: MetadataStore,
}

impl Realm {
    /// Create a realm with its intrinsic prototypes installed
    pub fn new() -> Self {
        let mut realm = Self {
            objects: Vec::new(),
            free: Vec::new(),
            object_prototype: ObjectId::new(0, 0),
            function_prototype: ObjectId::new(0, 0),
            metadata: MetadataStore::new(),
        };

        let object_prototype = realm.alloc(ObjectKind::Ordinary, None);
        let function_prototype = realm.alloc(ObjectKind::Ordinary, Some(object_prototype));
        realm.object_prototype = object_prototype;
        realm.function_prototype = function_prototype;
        realm.objects[object_prototype.index()].object.intrinsic = true;
        realm.objects[function_prototype.index()].object.intrinsic = true;

        realm.install_builtins();
        realm
    }

    fn install_builtins(&mut self) {
        let object_prototype = self.object_prototype;
        let function_prototype = self.function_prototype;

        self.install_builtin(object_prototype, "hasOwnProperty", |realm, this, args| {
            let id = this.as_object().ok_or_else(|| {
                RuntimeError::TypeError(format!("hasOwnProperty called on {}", this.type_name()))
            })?;
            let key = args.first().map(|k| k.to_string()).unwrap_or_default();
            Ok(Value::Bool(realm.has_own_property(id, &key)?))
        });
        self.install_builtin(object_prototype, "toString", |realm, this, _args| {
            let tag = match this.as_object() {
                Some(id) if realm.object(id)?.is_callable() => "Function",
                Some(_) => "Object",
                None => "Undefined",
            };
            Ok(Value::string(format!("[object {tag}]")))
        });
        self.install_builtin(function_prototype, "call", |realm, this, args| {
            let receiver = args.first().cloned().unwrap_or_default();
            let rest = args.get(1..).unwrap_or_default();
            realm.call(this, &receiver, rest)
        });
        self.install_builtin(function_prototype, "apply", |realm, this, args| {
            let receiver = args.first().cloned().unwrap_or_default();
            let forwarded = match args.get(1) {
                Some(Value::Array(items)) => items.clone(),
                Some(v) if v.is_nullish() => Vec::new(),
                None => Vec::new(),
                Some(other) => {
                    return Err(RuntimeError::TypeError(format!(
                        "apply expects an array of arguments, got {}",
                        other.type_name()
                    )))
                }
            };
            realm.call(this, &receiver, &forwarded)
        });
    }

    fn install_builtin<F>(&mut self, holder: ObjectId, name: &str, f: F)
    where
        F: Fn(&mut Realm, &Value, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        let builtin = self.create_function(name, f);
        self.objects[builtin.index()].object.intrinsic = true;
        self.objects[holder.index()]
            .object
            .properties
            .insert(name, PropertyDescriptor::hidden(builtin));
    }

    // ========================================================================
    // Heap access
    // ========================================================================

    fn alloc(&mut self, kind: ObjectKind, prototype: Option<ObjectId>) -> ObjectId {
        let object = HeapObject::new(kind, prototype);
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.objects[index as usize];
                slot.object = object;
                ObjectId::new(index, slot.generation)
            }
            None => {
                let index = self.objects.len() as u32;
                self.objects.push(Slot { generation: 0, object });
                ObjectId::new(index, 0)
            }
        }
    }

    /// Live heap object behind a handle, if the handle is still current
    fn live(&self, id: ObjectId) -> Option<&HeapObject> {
        self.objects
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .map(|slot| &slot.object)
    }

    /// Borrow a heap object
    pub fn object(&self, id: ObjectId) -> RuntimeResult<&HeapObject> {
        self.live(id).ok_or(RuntimeError::InvalidObject(id))
    }

    fn object_mut(&mut self, id: ObjectId) -> RuntimeResult<&mut HeapObject> {
        self.objects
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .map(|slot| &mut slot.object)
            .ok_or(RuntimeError::InvalidObject(id))
    }

    /// Release an object: its slot is recycled and its metadata dropped.
    ///
    /// Every handle to it turns invalid; calling one fails with
    /// `NotCallable`. Returns false for stale handles and intrinsics.
    pub fn release(&mut self, id: ObjectId) -> bool {
        let Some(slot) = self
            .objects
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation() && !slot.object.intrinsic)
        else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        slot.object = HeapObject::new(ObjectKind::Ordinary, None);
        self.free.push(id.index() as u32);
        self.metadata.clear_target(id);
        true
    }

    /// Number of live objects (intrinsics included)
    pub fn object_count(&self) -> usize {
        self.objects.len() - self.free.len()
    }

    /// `%Object.prototype%`
    pub fn object_prototype(&self) -> ObjectId {
        self.object_prototype
    }

    /// `%Function.prototype%`
    pub fn function_prototype(&self) -> ObjectId {
        self.function_prototype
    }

    /// Metadata side-table
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Mutable metadata side-table
    pub fn metadata_mut(&mut self) -> &mut MetadataStore {
        &mut self.metadata
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Allocate a plain object inheriting from `%Object.prototype%`
    pub fn create_object(&mut self) -> ObjectId {
        let proto = self.object_prototype;
        self.alloc(ObjectKind::Ordinary, Some(proto))
    }

    /// Allocate a plain object with an explicit prototype (`Object.create`)
    pub fn create_object_with_proto(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        self.alloc(ObjectKind::Ordinary, prototype)
    }

    /// Allocate a callable, non-constructible function without a `prototype`
    pub fn create_function<F>(&mut self, name: &str, f: F) -> ObjectId
    where
        F: Fn(&mut Realm, &Value, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        let proto = self.function_prototype;
        self.alloc(
            ObjectKind::Function(FunctionData {
                name: name.to_string(),
                constructible: false,
                behavior: Arc::new(f),
            }),
            Some(proto),
        )
    }

    /// Allocate a constructor: a constructible function owning a
    /// non-enumerable `prototype` whose non-enumerable `constructor` points back
    pub fn create_constructor<F>(&mut self, name: &str, f: F) -> ObjectId
    where
        F: Fn(&mut Realm, &Value, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        let function_proto = self.function_prototype;
        let ctor = self.alloc(
            ObjectKind::Function(FunctionData {
                name: name.to_string(),
                constructible: true,
                behavior: Arc::new(f),
            }),
            Some(function_proto),
        );
        let prototype = self.create_object();
        self.objects[prototype.index()]
            .object
            .properties
            .insert("constructor", PropertyDescriptor::hidden(ctor));
        self.objects[ctor.index()].object.properties.insert(
            "prototype",
            PropertyDescriptor::Data {
                value: Value::Object(prototype),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        ctor
    }

    /// Allocate a function and assign it as an enumerable data property
    pub fn define_method<F>(&mut self, target: ObjectId, name: &str, f: F) -> RuntimeResult<ObjectId>
    where
        F: Fn(&mut Realm, &Value, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        let method = self.create_function(name, f);
        self.set(target, name, Value::Object(method))?;
        Ok(method)
    }

    /// Create an error object carrying `name` and `message` properties
    pub fn type_error(&mut self, message: &str) -> Value {
        let error = self.create_object();
        let props = &mut self.objects[error.index()].object.properties;
        props.insert("name", PropertyDescriptor::hidden("TypeError"));
        props.insert("message", PropertyDescriptor::hidden(message));
        Value::Object(error)
    }

    // ========================================================================
    // Reflection (no side effects)
    // ========================================================================

    /// Own property descriptor, if any
    pub fn get_own_property(&self, id: ObjectId, key: &str) -> RuntimeResult<Option<&PropertyDescriptor>> {
        Ok(self.object(id)?.properties.get(key))
    }

    /// Check for an own property
    pub fn has_own_property(&self, id: ObjectId, key: &str) -> RuntimeResult<bool> {
        Ok(self.object(id)?.properties.contains(key))
    }

    /// All own keys in insertion order (`Object.getOwnPropertyNames`)
    pub fn own_keys(&self, id: ObjectId) -> RuntimeResult<Vec<String>> {
        Ok(self.object(id)?.properties.keys().map(str::to_string).collect())
    }

    /// Enumerable own keys in insertion order (`Object.keys`)
    pub fn enumerable_own_keys(&self, id: ObjectId) -> RuntimeResult<Vec<String>> {
        Ok(self
            .object(id)?
            .properties
            .iter()
            .filter(|(_, desc)| desc.is_enumerable())
            .map(|(key, _)| key.to_string())
            .collect())
    }

    /// Snapshot of all own descriptors in insertion order
    pub fn own_properties(&self, id: ObjectId) -> RuntimeResult<Vec<(String, PropertyDescriptor)>> {
        Ok(self
            .object(id)?
            .properties
            .iter()
            .map(|(key, desc)| (key.to_string(), desc.clone()))
            .collect())
    }

    /// `[[Prototype]]` of an object
    pub fn get_prototype_of(&self, id: ObjectId) -> RuntimeResult<Option<ObjectId>> {
        Ok(self.object(id)?.prototype)
    }

    /// Find the object on the prototype chain (starting at `id`) that owns
    /// `key`, together with a copy of its descriptor. Never runs accessors.
    pub fn lookup(&self, id: ObjectId, key: &str) -> RuntimeResult<Option<(ObjectId, PropertyDescriptor)>> {
        let mut current = Some(id);
        while let Some(holder) = current {
            let object = self.object(holder)?;
            if let Some(desc) = object.properties.get(key) {
                return Ok(Some((holder, desc.clone())));
            }
            current = object.prototype;
        }
        Ok(None)
    }

    /// Check if a value references a callable object
    pub fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|id| self.live(id))
            .is_some_and(HeapObject::is_callable)
    }

    /// Check if a value references a constructible function
    pub fn is_constructor(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|id| self.live(id))
            .and_then(HeapObject::function)
            .is_some_and(|f| f.constructible)
    }

    /// Check if an object is a realm builtin
    pub fn is_intrinsic(&self, id: ObjectId) -> bool {
        self.live(id).is_some_and(HeapObject::is_intrinsic)
    }

    /// Name of a function object
    pub fn function_name(&self, id: ObjectId) -> Option<&str> {
        self.live(id)
            .and_then(HeapObject::function)
            .map(|f| f.name.as_str())
    }

    /// Check if new properties can be added
    pub fn is_extensible(&self, id: ObjectId) -> RuntimeResult<bool> {
        Ok(self.object(id)?.extensible)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Define or redefine an own property (`Object.defineProperty`)
    pub fn define_property(&mut self, id: ObjectId, key: &str, desc: PropertyDescriptor) -> RuntimeResult<()> {
        let object = self.object_mut(id)?;
        match object.properties.get(key) {
            Some(existing) if !existing.is_configurable() => {
                // Only a value change on a writable data property is allowed
                let value_only = matches!(
                    (existing, &desc),
                    (
                        PropertyDescriptor::Data { writable: true, enumerable: e1, configurable: false, .. },
                        PropertyDescriptor::Data { enumerable: e2, configurable: false, .. },
                    ) if e1 == e2
                );
                if !value_only {
                    return Err(RuntimeError::NonConfigurable(key.to_string()));
                }
            }
            Some(_) => {}
            None if !object.extensible => return Err(RuntimeError::NotExtensible(key.to_string())),
            None => {}
        }
        object.properties.insert(key, desc);
        Ok(())
    }

    /// Delete an own property. Returns false for non-configurable properties.
    pub fn delete_property(&mut self, id: ObjectId, key: &str) -> RuntimeResult<bool> {
        let object = self.object_mut(id)?;
        let configurable = match object.properties.get(key) {
            None => return Ok(true),
            Some(desc) => desc.is_configurable(),
        };
        if configurable {
            object.properties.remove(key);
        }
        Ok(configurable)
    }

    /// Set `[[Prototype]]`, rejecting cycles
    pub fn set_prototype_of(&mut self, id: ObjectId, prototype: Option<ObjectId>) -> RuntimeResult<()> {
        let mut current = prototype;
        while let Some(ancestor) = current {
            if ancestor == id {
                return Err(RuntimeError::PrototypeCycle(id));
            }
            current = self.object(ancestor)?.prototype;
        }
        let object = self.object_mut(id)?;
        if !object.extensible && object.prototype != prototype {
            return Err(RuntimeError::TypeError(format!(
                "cannot change the prototype of non-extensible object {id}"
            )));
        }
        object.prototype = prototype;
        Ok(())
    }

    /// Prevent new properties from being added
    pub fn prevent_extensions(&mut self, id: ObjectId) -> RuntimeResult<()> {
        self.object_mut(id)?.extensible = false;
        Ok(())
    }

    /// Make every own property read-only and non-configurable, and prevent extensions
    pub fn freeze(&mut self, id: ObjectId) -> RuntimeResult<()> {
        let object = self.object_mut(id)?;
        let keys: Vec<String> = object.properties.keys().map(str::to_string).collect();
        for key in keys {
            if let Some(desc) = object.properties.get_mut(&key) {
                desc.freeze();
            }
        }
        object.extensible = false;
        Ok(())
    }

    // ========================================================================
    // Semantic access (may run native code)
    // ========================================================================

    /// `[[Get]]` with the object itself as receiver
    pub fn get(&mut self, id: ObjectId, key: &str) -> RuntimeResult<Value> {
        self.get_with_receiver(id, key, &Value::Object(id))
    }

    /// `[[Get]]` on an arbitrary value. Reading from `undefined`/`null` is a
    /// type error; other primitives have no properties.
    pub fn get_value(&mut self, receiver: &Value, key: &str) -> RuntimeResult<Value> {
        match receiver {
            Value::Object(id) => self.get_with_receiver(*id, key, receiver),
            v if v.is_nullish() => Err(RuntimeError::TypeError(format!(
                "Cannot read properties of {v} (reading '{key}')"
            ))),
            _ => Ok(Value::Undefined),
        }
    }

    fn get_with_receiver(&mut self, id: ObjectId, key: &str, receiver: &Value) -> RuntimeResult<Value> {
        match self.lookup(id, key)? {
            None => Ok(Value::Undefined),
            Some((_, PropertyDescriptor::Data { value, .. })) => Ok(value),
            Some((_, PropertyDescriptor::Accessor { get: Some(getter), .. })) => {
                self.call(&Value::Object(getter), receiver, &[])
            }
            Some((_, PropertyDescriptor::Accessor { get: None, .. })) => Ok(Value::Undefined),
        }
    }

    /// `[[Set]]`: runs inherited setters, respects read-only properties,
    /// otherwise creates or updates an own data property
    pub fn set(&mut self, id: ObjectId, key: &str, value: Value) -> RuntimeResult<()> {
        match self.lookup(id, key)? {
            Some((_, PropertyDescriptor::Data { writable: false, .. })) => {
                Err(RuntimeError::ReadOnly(key.to_string()))
            }
            Some((holder, PropertyDescriptor::Data { .. })) if holder == id => {
                if let Some(PropertyDescriptor::Data { value: slot, .. }) =
                    self.object_mut(id)?.properties.get_mut(key)
                {
                    *slot = value;
                }
                Ok(())
            }
            Some((_, PropertyDescriptor::Accessor { set: Some(setter), .. })) => {
                self.call(&Value::Object(setter), &Value::Object(id), &[value])?;
                Ok(())
            }
            Some((_, PropertyDescriptor::Accessor { set: None, .. })) => {
                Err(RuntimeError::ReadOnly(key.to_string()))
            }
            Some((_, PropertyDescriptor::Data { .. })) | None => {
                self.define_property(id, key, PropertyDescriptor::data(value))
            }
        }
    }

    /// Call `callee` with an explicit receiver
    pub fn call(&mut self, callee: &Value, this: &Value, args: &[Value]) -> RuntimeResult<Value> {
        let behavior = callee
            .as_object()
            .and_then(|id| self.live(id))
            .and_then(HeapObject::function)
            .map(|f| f.behavior.clone())
            .ok_or_else(|| RuntimeError::NotCallable(callee.to_string()))?;
        behavior(self, this, args)
    }

    /// `new ctor(...args)`: allocate an instance linked to `ctor.prototype`
    /// and run the body with it as receiver. An object returned by the body
    /// replaces the instance.
    pub fn construct(&mut self, ctor: ObjectId, args: &[Value]) -> RuntimeResult<ObjectId> {
        let callee = Value::Object(ctor);
        if !self.is_constructor(&callee) {
            let name = self.function_name(ctor).unwrap_or("anonymous").to_string();
            return Err(RuntimeError::NotConstructor(name));
        }
        let prototype = match self.get(ctor, "prototype")? {
            Value::Object(proto) => proto,
            _ => self.object_prototype,
        };
        let instance = self.create_object_with_proto(Some(prototype));
        match self.call(&callee, &Value::Object(instance), args)? {
            Value::Object(replacement) => Ok(replacement),
            _ => Ok(instance),
        }
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}
