//! Wrapper generation
//!
//! A wrapper takes the origin's arguments, appends a completion callback and
//! calls whatever the receiver currently holds under the origin name. The
//! callback settles the wrapper's promise:
//!
//! - a non-null, non-undefined first argument rejects with that value;
//! - otherwise zero results fulfil with `undefined`, one result with that
//!   value, and several with an array of all of them.
//!
//! Only the first settlement counts. A synchronous failure of the delegated
//! call rejects the promise; calling a wrapper never fails.
//!
//! The callback is single-use: it releases itself from the realm when it
//! fires, and the wrapper releases it when the delegated call fails, so a
//! settled call leaves nothing behind on the heap.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use promisify_runtime::{Deferred, ObjectId, Promise, Realm, Resolver, RuntimeError, RuntimeResult, Value};
use tracing::trace;

use crate::marker::WrapperMarker;
use crate::options::PromiseConstructor;

/// Creates marker-tagged wrapper functions
#[derive(Clone)]
pub struct WrapperFactory {
    promises: Arc<dyn PromiseConstructor>,
}

impl WrapperFactory {
    /// Create a factory whose wrappers return promises from `promises`
    pub fn new(promises: Arc<dyn PromiseConstructor>) -> Self {
        Self { promises }
    }

    /// Allocate a wrapper for `origin`, generated from the function `source`.
    ///
    /// The wrapper is tagged but not installed anywhere.
    pub fn create(&self, realm: &mut Realm, origin: &str, wrapper_name: &str, source: ObjectId) -> ObjectId {
        let origin_key: Arc<str> = Arc::from(origin);
        let promises = Arc::clone(&self.promises);
        let wrapper = realm.create_function(wrapper_name, move |realm, this, args| {
            Ok(Value::Promise(invoke(realm, promises.as_ref(), &origin_key, this, args)))
        });
        WrapperMarker::new(origin, source).mark(realm, wrapper);
        wrapper
    }
}

fn invoke(
    realm: &mut Realm,
    promises: &dyn PromiseConstructor,
    origin: &Arc<str>,
    this: &Value,
    args: &[Value],
) -> Promise {
    let Deferred { promise, resolver } = promises.deferred();
    let callback = completion_callback(realm, Arc::clone(origin), resolver.clone());

    let mut forwarded = Vec::with_capacity(args.len() + 1);
    forwarded.extend_from_slice(args);
    forwarded.push(Value::Object(callback));

    if let Err(err) = delegate(realm, origin, this, &forwarded) {
        realm.release(callback);
        let reason = err.into_value(realm);
        if !resolver.reject(reason) {
            trace!(origin = %origin, "delegate failed after settling; failure ignored");
        }
    }
    promise
}

/// Late-bound call: the origin is looked up on the receiver at call time
fn delegate(realm: &mut Realm, origin: &str, this: &Value, args: &[Value]) -> RuntimeResult<Value> {
    let method = realm.get_value(this, origin)?;
    if !realm.is_callable(&method) {
        return Err(RuntimeError::NotCallable(origin.to_string()));
    }
    realm.call(&method, this, args)
}

fn completion_callback(realm: &mut Realm, origin: Arc<str>, resolver: Resolver) -> ObjectId {
    let own_id: Arc<OnceCell<ObjectId>> = Arc::new(OnceCell::new());
    let handle = Arc::clone(&own_id);
    let callback = realm.create_function("callback", move |realm, _, args| {
        if let Some(id) = handle.get() {
            realm.release(*id);
        }
        let settled = match args.split_first() {
            Some((error, _)) if !error.is_nullish() => resolver.reject(error.clone()),
            Some((_, results)) => resolver.resolve(collect_results(results)),
            None => resolver.resolve(Value::Undefined),
        };
        if !settled {
            trace!(origin = %origin, "callback fired after settlement; ignored");
        }
        Ok(Value::Undefined)
    });
    let _ = own_id.set(callback);
    callback
}

fn collect_results(results: &[Value]) -> Value {
    match results {
        [] => Value::Undefined,
        [single] => single.clone(),
        many => Value::Array(many.to_vec()),
    }
}
