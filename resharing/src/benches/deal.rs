use crate::setup;
use criterion::{criterion_group, BatchSize, Criterion};
use std::hint::black_box;
use yoso_resharing::dealer;

fn benchmark_deal(c: &mut Criterion) {
    for n in [4, 8, 16, 32] {
        let mut rng = setup::rng();
        let (ctx, _, shares) = setup::round(n, 1, &mut rng);
        c.bench_function(&format!("{}/n={}", module_path!(), n), |b| {
            b.iter_batched(
                || shares[0].clone(),
                |share| black_box(dealer::deal(&ctx, &mut rng, 0, &share).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_deal
}
