//! Promisify Runtime
//!
//! Host object model that the promisification engine operates on:
//! - Values and heap objects addressed by identity (`ObjectId`)
//! - Property descriptors (data vs accessor) with insertion-ordered tables
//! - Prototype chains rooted at realm intrinsics
//! - Native functions with an explicit receiver (`this`)
//! - A metadata side-table keyed by object identity
//! - Deferred results (`Promise`) settled through a `Resolver`
//!
//! # Example
//!
//! ```ignore
//! use promisify_runtime::{Realm, Value};
//!
//! let mut realm = Realm::new();
//! let point = realm.create_constructor("Point", |realm, this, args| {
//!     let id = this.as_object().unwrap();
//!     realm.set(id, "x", args[0].clone())?;
//!     Ok(Value::Undefined)
//! });
//! let p = realm.construct(point, &[Value::from(1)])?;
//! assert_eq!(realm.get(p, "x")?, Value::from(1));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod metadata;
pub mod object;
pub mod promise;
pub mod realm;
pub mod value;

pub use error::{RuntimeError, RuntimeResult};
pub use metadata::{MetadataKey, MetadataStore};
pub use object::{FunctionData, HeapObject, NativeFn, ObjectId, ObjectKind, PropertyDescriptor, PropertyMap};
pub use promise::{Deferred, Promise, Resolver, Settlement};
pub use realm::Realm;
pub use value::Value;
