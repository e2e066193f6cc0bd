use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use promisify_core::{promisify_all, promisify_all_with, PromisifyOptions};
use promisify_runtime::{ObjectId, Realm, Value};

fn object_with_methods(realm: &mut Realm, count: usize) -> ObjectId {
    let obj = realm.create_object();
    for i in 0..count {
        realm
            .define_method(obj, &format!("method{i}"), |realm, _, args| {
                let callback = args.last().cloned().unwrap_or_default();
                realm.call(&callback, &Value::Undefined, &[Value::Null, Value::from(1)])
            })
            .unwrap();
    }
    obj
}

fn module_with_classes(realm: &mut Realm, classes: usize, methods: usize) -> ObjectId {
    let module = realm.create_object();
    for c in 0..classes {
        let ctor = realm.create_constructor(&format!("Class{c}"), |_, _, _| Ok(Value::Undefined));
        let proto = realm.get(ctor, "prototype").unwrap().as_object().unwrap();
        for m in 0..methods {
            realm
                .define_method(proto, &format!("method{m}"), |_, _, _| Ok(Value::Undefined))
                .unwrap();
        }
        realm.set(module, &format!("Class{c}"), Value::Object(ctor)).unwrap();
    }
    module
}

fn bench_first_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_pass");

    for count in [8usize, 64, 256] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("object", count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let mut realm = Realm::new();
                    let obj = object_with_methods(&mut realm, count);
                    (realm, obj)
                },
                |(mut realm, obj)| promisify_all(&mut realm, black_box(obj)).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }

    group.bench_function("module_16x16", |b| {
        b.iter_batched(
            || {
                let mut realm = Realm::new();
                let module = module_with_classes(&mut realm, 16, 16);
                (realm, module)
            },
            |(mut realm, module)| promisify_all(&mut realm, black_box(module)).unwrap(),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_repeat_pass(c: &mut Criterion) {
    let mut realm = Realm::new();
    let obj = object_with_methods(&mut realm, 64);
    let options = PromisifyOptions::default();
    promisify_all_with(&mut realm, obj, &options).unwrap();

    c.bench_function("repeat_pass_64", |b| {
        b.iter(|| promisify_all_with(&mut realm, black_box(obj), &options).unwrap());
    });
}

fn bench_wrapper_call(c: &mut Criterion) {
    let mut realm = Realm::new();
    let obj = object_with_methods(&mut realm, 1);
    promisify_all(&mut realm, obj).unwrap();
    let wrapper = realm.get(obj, "method0Async").unwrap();
    let receiver = Value::Object(obj);

    c.bench_function("wrapper_call", |b| {
        b.iter(|| {
            let result = realm.call(&wrapper, &receiver, black_box(&[Value::from(7)])).unwrap();
            result.as_promise().and_then(|p| p.settled())
        });
    });
}

criterion_group!(benches, bench_first_pass, bench_repeat_pass, bench_wrapper_call);
criterion_main!(benches);
