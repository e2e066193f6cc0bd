//! Integration tests for calling generated wrappers
//!
//! Tests cover:
//! - Settlement from the completion callback (arity, errors, double calls)
//! - Synchronous failures of the delegated call
//! - Callbacks fired later, out of order, from other threads
//! - Callback reclamation once a call settles

use std::sync::Arc;

use futures::executor::block_on;
use parking_lot::Mutex;
use promisify_core::promisify_all;
use promisify_runtime::{ObjectId, Promise, Realm, RuntimeError, Settlement, Value};

fn call_async(realm: &mut Realm, receiver: ObjectId, name: &str, args: &[Value]) -> Promise {
    let method = realm.get(receiver, name).unwrap();
    let result = realm.call(&method, &Value::Object(receiver), args).unwrap();
    result.as_promise().cloned().expect("wrapper returns a promise")
}

/// Object with `reply(...values, cb)` calling `cb(...values)`
fn echo_object(realm: &mut Realm) -> ObjectId {
    let obj = realm.create_object();
    realm
        .define_method(obj, "reply", |realm, _, args| {
            let (callback, reply) = args.split_last().ok_or_else(|| RuntimeError::TypeError("no callback".into()))?;
            realm.call(callback, &Value::Undefined, reply)
        })
        .unwrap();
    promisify_all(realm, obj).unwrap();
    obj
}

fn reply(realm: &mut Realm, obj: ObjectId, values: Vec<Value>) -> Settlement {
    block_on(call_async(realm, obj, "replyAsync", &values))
}

#[test]
fn test_success_arity() {
    let mut realm = Realm::new();
    let obj = echo_object(&mut realm);

    assert_eq!(reply(&mut realm, obj, vec![]), Ok(Value::Undefined));
    assert_eq!(reply(&mut realm, obj, vec![Value::Null]), Ok(Value::Undefined));
    assert_eq!(reply(&mut realm, obj, vec![Value::Undefined, Value::from("one")]), Ok(Value::from("one")));
    assert_eq!(
        reply(&mut realm, obj, vec![Value::Null, Value::from(1), Value::Null, Value::from(3)]),
        Ok(Value::Array(vec![Value::from(1), Value::Null, Value::from(3)]))
    );
}

#[test]
fn test_single_array_result_is_not_flattened() {
    let mut realm = Realm::new();
    let obj = echo_object(&mut realm);
    let list = Value::Array(vec![Value::from(1), Value::from(2)]);
    assert_eq!(reply(&mut realm, obj, vec![Value::Null, list.clone()]), Ok(list));
}

#[test]
fn test_error_rejects_verbatim() {
    let mut realm = Realm::new();
    let obj = echo_object(&mut realm);

    assert_eq!(
        reply(&mut realm, obj, vec![Value::from("failed"), Value::from(1)]),
        Err(Value::from("failed"))
    );
    // Falsy but non-nullish errors still reject
    assert_eq!(reply(&mut realm, obj, vec![Value::Bool(false)]), Err(Value::Bool(false)));
    assert_eq!(reply(&mut realm, obj, vec![Value::from(0)]), Err(Value::from(0)));
}

#[test]
fn test_synchronous_throw_rejects_instead_of_failing_the_call() {
    let mut realm = Realm::new();
    let obj = realm.create_object();
    realm
        .define_method(obj, "explode", |_, _, _| Err(RuntimeError::throw("sync failure")))
        .unwrap();
    promisify_all(&mut realm, obj).unwrap();

    let promise = call_async(&mut realm, obj, "explodeAsync", &[]);
    assert_eq!(block_on(promise), Err(Value::from("sync failure")));
}

#[test]
fn test_detached_call_rejects_with_type_error() {
    let mut realm = Realm::new();
    let obj = echo_object(&mut realm);
    let wrapper = realm.get(obj, "replyAsync").unwrap();

    let result = realm.call(&wrapper, &Value::Undefined, &[]).unwrap();
    let reason = block_on(result.as_promise().cloned().unwrap()).unwrap_err();
    let error = reason.as_object().unwrap();
    assert_eq!(realm.get(error, "name").unwrap(), Value::from("TypeError"));
}

#[test]
fn test_throw_after_callback_keeps_first_settlement() {
    let mut realm = Realm::new();
    let obj = realm.create_object();
    realm
        .define_method(obj, "flaky", |realm, _, args| {
            realm.call(&args[0], &Value::Undefined, &[Value::Null, Value::from("done")])?;
            realm.call(&args[0], &Value::Undefined, &[Value::from("again")]).unwrap_err();
            Err(RuntimeError::throw("after"))
        })
        .unwrap();
    promisify_all(&mut realm, obj).unwrap();

    let promise = call_async(&mut realm, obj, "flakyAsync", &[]);
    assert_eq!(block_on(promise), Ok(Value::from("done")));
}

#[test]
fn test_each_call_gets_a_fresh_promise() {
    let mut realm = Realm::new();
    let obj = echo_object(&mut realm);
    let first = call_async(&mut realm, obj, "replyAsync", &[Value::Null, Value::from(1)]);
    let second = call_async(&mut realm, obj, "replyAsync", &[Value::Null, Value::from(2)]);

    assert_ne!(first, second);
    assert_eq!(block_on(first), Ok(Value::from(1)));
    assert_eq!(block_on(second), Ok(Value::from(2)));
}

#[test]
fn test_repeated_settled_calls_keep_heap_bounded() {
    let mut realm = Realm::new();
    let obj = echo_object(&mut realm);
    let baseline = realm.object_count();

    for i in 0..10_000 {
        assert_eq!(reply(&mut realm, obj, vec![Value::Null, Value::from(i)]), Ok(Value::from(i)));
    }
    assert_eq!(realm.object_count(), baseline);
}

#[test]
fn test_late_callback_is_released_after_firing() {
    let mut realm = Realm::new();
    let obj = realm.create_object();
    let stash = Arc::new(Mutex::new(Vec::new()));
    let stashed = stash.clone();
    realm
        .define_method(obj, "later", move |_, _, args| {
            stashed.lock().push(args.last().cloned().unwrap_or_default());
            Ok(Value::Undefined)
        })
        .unwrap();
    promisify_all(&mut realm, obj).unwrap();
    let baseline = realm.object_count();

    let promise = call_async(&mut realm, obj, "laterAsync", &[]);
    assert_eq!(realm.object_count(), baseline + 1);

    let callback = stash.lock().pop().unwrap();
    realm.call(&callback, &Value::Undefined, &[Value::Null, Value::from("late")]).unwrap();
    assert_eq!(block_on(promise), Ok(Value::from("late")));
    assert_eq!(realm.object_count(), baseline);
    assert!(matches!(
        realm.call(&callback, &Value::Undefined, &[]),
        Err(RuntimeError::NotCallable(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callbacks_fired_out_of_order_from_other_threads() {
    let pending: Arc<Mutex<Vec<(Value, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let realm = Arc::new(Mutex::new(Realm::new()));

    let promises = {
        let mut realm = realm.lock();
        let queue = realm.create_object();
        let stash = pending.clone();
        realm
            .define_method(queue, "enqueue", move |_, _, args| {
                let job = args.first().cloned().unwrap_or_default();
                let callback = args.last().cloned().unwrap_or_default();
                stash.lock().push((job, callback));
                Ok(Value::Undefined)
            })
            .unwrap();
        promisify_all(&mut realm, queue).unwrap();

        (1..=3)
            .map(|job| call_async(&mut realm, queue, "enqueueAsync", &[Value::from(job)]))
            .collect::<Vec<_>>()
    };
    assert!(promises.iter().all(Promise::is_pending));

    let jobs: Vec<(Value, Value)> = pending.lock().drain(..).rev().collect();
    let mut handles = Vec::new();
    for (job, callback) in jobs {
        let realm = realm.clone();
        handles.push(tokio::spawn(async move {
            let answer = Value::from(job.as_number().unwrap_or_default() * 10.0);
            realm
                .lock()
                .call(&callback, &Value::Undefined, &[Value::Null, answer])
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut results = Vec::new();
    for promise in promises {
        results.push(promise.await);
    }
    assert_eq!(
        results,
        vec![Ok(Value::from(10)), Ok(Value::from(20)), Ok(Value::from(30))]
    );
}
