use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use querydb::{QueryBuilder, Record, StatementKind, table};

/// SELECT col0, col1, ... FROM t WHERE col0 = $1 AND col1 = $2 ...
fn build_select(n: usize) -> QueryBuilder {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let column_refs: Vec<&str> = columns.iter().map(String::as_str).collect();

    let mut qb = table("t").select(&column_refs);
    for (i, column) in columns.iter().enumerate() {
        qb = qb.where_(column, i as i64);
    }
    qb
}

fn bench_compile_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("grammar/select");

    for n in [1, 5, 10, 50, 100] {
        let qb = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &qb, |b, qb| {
            b.iter(|| black_box(qb.compile(StatementKind::Select)));
        });
    }

    group.finish();
}

fn bench_compile_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("grammar/union");

    for members in [1, 5, 20] {
        let qb = build_select(5).union_all((0..members).map(|_| build_select(5)));
        group.bench_with_input(BenchmarkId::from_parameter(members), &qb, |b, qb| {
            b.iter(|| black_box(qb.compile(StatementKind::Select)));
        });
    }

    group.finish();
}

fn bench_multi_row_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("grammar/insert_rows");

    for rows in [1, 10, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                let records = (0..rows).map(|i| {
                    Record::new()
                        .set("id", i as i64)
                        .set("name", format!("user{i}"))
                        .set("active", true)
                });
                black_box(table("users").with_rows(records).compile(StatementKind::Insert))
            });
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("grammar/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let qb = table("t").in_list("id", values.iter().copied());
                black_box(qb.compile(StatementKind::Select))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compile_select,
    bench_compile_union,
    bench_multi_row_insert,
    bench_in_list
);
criterion_main!(benches);
