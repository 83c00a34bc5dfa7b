use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use latent_translate::{
    estimators::{EstimatorMethod, LinearEstimator, LinearEstimatorConfig},
    transforms::{Centering, StandardScaling},
    LatentTranslator,
};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random source batch and a shifted, permuted copy as its target.
fn parallel_batches(rows: usize, dim: usize) -> (Array2<f64>, Array2<f64>) {
    let mut rng = StdRng::seed_from_u64(42);
    let source = Array2::from_shape_fn((rows, dim), |_| rng.gen_range(-1.0..1.0));
    let target = Array2::from_shape_fn((rows, dim), |(i, j)| 2.0 * source[[i, (j + 1) % dim]] + 0.5);
    (source, target)
}

fn translator(method: EstimatorMethod) -> LatentTranslator {
    LatentTranslator::new(0, method.build())
        .with_source_transform(Centering::new())
        .with_source_transform(StandardScaling::std_only())
        .with_target_transform(StandardScaling::new())
}

fn bench_fit(c: &mut Criterion) {
    let (source, target) = parallel_batches(1000, 128);

    for method in [EstimatorMethod::Svd, EstimatorMethod::Lstsq, EstimatorMethod::LstsqOrtho] {
        c.bench_with_input(BenchmarkId::new("fit", method), &method, |b, &m| {
            b.iter(|| {
                let mut t = translator(m);
                t.fit(black_box(source.view()), black_box(target.view()))
                    .expect("fit failed");
                t
            });
        });
    }
}

fn bench_fit_linear(c: &mut Criterion) {
    let (source, target) = parallel_batches(500, 32);

    for steps in [50, 200].iter() {
        c.bench_with_input(BenchmarkId::new("fit_linear", steps), steps, |b, &steps| {
            b.iter(|| {
                let estimator =
                    LinearEstimator::with_config(LinearEstimatorConfig::default().with_steps(steps));
                let mut t = LatentTranslator::new(0, estimator);
                t.fit(black_box(source.view()), black_box(target.view()))
                    .expect("fit failed");
                t
            });
        });
    }
}

fn bench_apply(c: &mut Criterion) {
    let (source, target) = parallel_batches(1000, 128);
    let mut t = translator(EstimatorMethod::Svd);
    t.fit(source.view(), target.view()).expect("fit failed");

    for rows in [10, 100, 1000].iter() {
        let (x, _) = parallel_batches(*rows, 128);
        c.bench_with_input(BenchmarkId::new("apply", rows), &x, |b, x| {
            b.iter(|| black_box(t.apply(black_box(x.view())).expect("apply failed")));
        });
    }
}

criterion_group!(benches, bench_fit, bench_fit_linear, bench_apply);
criterion_main!(benches);
