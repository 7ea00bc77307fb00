use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xycalc::{evaluate, parse, Environment};

const NESTED: &str = "-(X + 2.5) ** 2 / (Y - 1) * (X * Y + 3 ** -X) - 4 / (1 + Y ** 0.5)";

fn benchmark_parse(c: &mut Criterion) {
    c.bench_function("nested parse", |b| b.iter(|| parse(black_box(NESTED)).unwrap()));
}
fn benchmark_evaluate(c: &mut Criterion) {
    let tree = parse(NESTED).unwrap();
    let env = Environment::new(3.0, 7.0);
    c.bench_function("nested evaluate", |b| {
        b.iter(|| evaluate(black_box(&tree), black_box(&env)).unwrap())
    });
}
fn benchmark_default_trees(c: &mut Criterion) {
    let env = Environment::new(3.0, 5.0);
    c.bench_function("default trees parse and evaluate", |b| {
        b.iter(|| {
            let (tree1, tree2) = xycalc::request::default_trees().unwrap();
            (
                evaluate(&tree1, black_box(&env)).unwrap(),
                evaluate(&tree2, black_box(&env)).unwrap(),
            )
        })
    });
}
criterion_group!(
    benches,
    benchmark_parse,
    benchmark_evaluate,
    benchmark_default_trees
);
criterion_main!(benches);
