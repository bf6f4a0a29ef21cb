use arbor_model::*;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;

fn wide_factory(fields: usize) -> ModelFactory {
    create_factory(move |_| {
        (0..fields).fold(BaseModel::new(), |base, i| base.prop(format!("f{i}"), i))
    })
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");
    let tree = Tree::new();

    for fields in [4_usize, 32, 256] {
        let factory = wide_factory(fields);
        group.throughput(Throughput::Elements(fields as u64));

        group.bench_with_input(BenchmarkId::new("defaults", fields), &factory, |b, f| {
            b.iter(|| f.create(&tree, json!({}), None).unwrap());
        });

        let snapshot = (0..fields).map(|i| (format!("f{i}"), json!(i * 2))).collect::<serde_json::Map<_, _>>();
        let snapshot = serde_json::Value::Object(snapshot);
        group.bench_with_input(BenchmarkId::new("snapshot", fields), &snapshot, |b, s| {
            b.iter(|| factory.create(&tree, black_box(s.clone()), None).unwrap());
        });
    }

    group.finish();
}

fn bench_infer(c: &mut Criterion) {
    let example = Value::from(json!({
        "name": "arbor",
        "tags": ["a", "b"],
        "owner": { "id": 1, "roles": ["admin"] },
        "todos": [{ "title": "x", "done": false }],
    }));

    c.bench_function("generate_factory", |b| b.iter(|| generate_factory(black_box(&example))));

    let Some(Factory::Model(factory)) = generate_factory(&example).into_factory() else {
        return;
    };
    let tree = Tree::new();
    c.bench_function("create_inferred", |b| {
        b.iter(|| {
            factory
                .create(&tree, json!({ "owner": { "id": 2 }, "todos": [{ "title": "y" }] }), None)
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_create, bench_infer);
criterion_main!(benches);
