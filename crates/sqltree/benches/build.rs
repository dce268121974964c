use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqltree::prelude::*;

/// SELECT (t1.col0), ... FROM t AS t1 WHERE ((t1.col0) = $1) AND ...
fn build_select(n: usize) -> Query {
    let t = table("t").alias();
    let mut q = query().from([&t]);
    for i in 0..n {
        let col = format!("col{i}");
        q = q.select([t.f(col.as_str())]).and_where(t.f(col.as_str()).eq(i as i64));
    }
    q
}

/// n self-joins, each with its own anonymous alias.
fn build_joins(n: usize) -> Query {
    let base = table("node").alias();
    let mut q = query().from([&base]);
    let mut prev = base;
    for _ in 0..n {
        let next = table("node").alias();
        q = q.left_join(&next, next.f("parent_id").eq(prev.f("id")));
        prev = next;
    }
    q
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build/select");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.build()));
        });
    }

    group.finish();
}

fn bench_construct_and_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build/construct_and_build");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n).build()));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("build/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let t = table("t");
                let q = query().from([&t]).and_where(t.f("id").in_list(values.clone()));
                black_box(q.build())
            });
        });
    }

    group.finish();
}

fn bench_joins(c: &mut Criterion) {
    let mut group = c.benchmark_group("build/joins");

    for n in [1, 5, 20] {
        let q = build_joins(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.build()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_construct_and_build,
    bench_in_list,
    bench_joins
);
criterion_main!(benches);
