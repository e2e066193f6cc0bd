//! Promisify Core
//!
//! Adds a promise-returning sibling next to every callback-style function of
//! an object, a class or a module. For a member `get` the sibling is
//! `getAsync`: it forwards its arguments plus a completion callback to
//! whatever `get` currently is on the receiver and settles its promise from
//! that callback.
//!
//! Passes are idempotent and all-or-nothing:
//! - re-running a pass keeps existing wrappers (identity and key order);
//! - a wrapper whose origin was rebound is regenerated;
//! - a naming conflict leaves every object exactly as it was.
//!
//! # Example
//!
//! ```ignore
//! use promisify_core::promisify_all;
//! use promisify_runtime::{Realm, Value};
//!
//! let mut realm = Realm::new();
//! let db = realm.create_object();
//! realm.define_method(db, "get", |realm, _this, args| {
//!     let callback = args.last().cloned().unwrap_or_default();
//!     realm.call(&callback, &Value::Undefined, &[Value::Null, Value::from(42)])
//! })?;
//!
//! promisify_all(&mut realm, db)?;
//!
//! let get_async = realm.get(db, "getAsync")?;
//! let result = realm.call(&get_async, &Value::Object(db), &[])?;
//! assert_eq!(result.as_promise().unwrap().settled(), Some(Ok(Value::from(42))));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod driver;
pub mod error;
pub mod guard;
pub mod logging;
pub mod marker;
pub mod naming;
pub mod options;
pub mod recursion;
pub mod reflector;
pub mod wrapper;

pub use config::{ConfigError, PromisifyConfig, PromisifySettings};
pub use driver::{promisify_all, promisify_all_report, promisify_all_with, PromisifyReport};
pub use error::{ConflictReason, ConflictRecord, PromisifyError, PromisifyResult};
pub use logging::init_tracing;
pub use marker::WrapperMarker;
pub use options::{default_filter, Filter, PromiseConstructor, PromisifyOptions, StandardPromise, DEFAULT_SUFFIX};

pub use promisify_runtime as runtime;
