use std::{fmt::Write, sync::Arc};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mql::{
    CodeBundle, CompilerConfig, ExecutionContext, Features, Schema, compile, execute,
    providers::MockProvider,
};

const SCHEMA: &str = include_str!("../tests/fixtures/schema.json");

/// A host with `count` users, half of them system accounts.
fn host(count: usize) -> String {
    let mut doc = String::from("[mondoo.mondoo]\nversion = \"unstable\"\n\n[users.users]\nlist = [");
    for idx in 0..count {
        if idx > 0 {
            doc.push_str(", ");
        }
        let _ = write!(doc, "\"user{idx}\"");
    }
    doc.push_str("]\n");
    for idx in 0..count {
        let uid = if idx % 2 == 0 { idx } else { 1000 + idx };
        let _ = write!(
            doc,
            "\n[user.user{idx}]\nname = \"user{idx}\"\nuid = {uid}\ngid = {uid}\nhome = \"/home/user{idx}\"\n"
        );
    }
    doc
}

fn compile_query(source: &str, schema: &Schema) -> CodeBundle {
    compile(source, schema, &CompilerConfig::default())
        .unwrap_or_else(|err| panic!("failed to compile {source:?}: {err}"))
}

fn bench_execute(c: &mut Criterion) {
    let schema = Schema::from_json(SCHEMA).expect("bench schema");
    let query = "users.all(uid < 1000); users.where(home != '').map(name); mondoo.version";

    let mut group = c.benchmark_group("execute/users");
    for count in [10usize, 100, 1000] {
        let provider = Arc::new(MockProvider::from_toml(schema.clone(), &host(count)).expect("bench host"));
        let bundle = compile_query(query, &schema);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("cold_cache", count), &bundle, |b, bundle| {
            b.iter(|| {
                let context = ExecutionContext::new(provider.clone(), Features::none());
                black_box(execute(bundle, &context).expect("execute"));
            });
        });

        let warm = ExecutionContext::new(provider.clone(), Features::none());
        group.bench_with_input(BenchmarkId::new("warm_cache", count), &bundle, |b, bundle| {
            b.iter(|| black_box(execute(bundle, &warm).expect("execute")));
        });
    }
    group.finish();

    c.bench_function("compile/assertions", |b| {
        b.iter(|| black_box(compile_query(black_box(query), &schema)));
    });
}

criterion_group!(benches, bench_execute);
criterion_main!(benches);
