/// Classifier fitting and scoring benchmarks
///
/// Measures forest fitting across worker counts, SMO training, and the
/// statistic computation on a synthetic sparse period.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use drifteval::classifier::{Classifier, RandomForest, RbfSvm};
use drifteval::config::{ForestParams, SvmParams};
use drifteval::dataset::{SparseMatrix, SparseRow};
use drifteval::metrics::roc_auc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Sparse binary rows; malicious rows favor the low feature indices
fn synthetic(n_rows: usize, n_cols: usize, seed: u64) -> (SparseMatrix, Vec<bool>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = SparseMatrix::new(n_cols);
    let mut y = Vec::with_capacity(n_rows);
    for i in 0..n_rows {
        let malicious = i % 2 == 0;
        let entries: Vec<(u32, f64)> = (0..12)
            .map(|_| {
                let col = if malicious && rng.gen_bool(0.7) {
                    rng.gen_range(0..n_cols / 4)
                } else {
                    rng.gen_range(0..n_cols)
                };
                (col as u32, 1.0)
            })
            .collect();
        x.push_row(SparseRow::new(entries));
        y.push(malicious);
    }
    (x, y)
}

fn bench_forest_fit(c: &mut Criterion) {
    let (x, y) = synthetic(2_000, 400, 1);
    let mut group = c.benchmark_group("forest_fit");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(10);
    group.throughput(Throughput::Elements(x.n_rows() as u64));

    for jobs in [1usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(jobs), &jobs, |b, &jobs| {
            b.iter(|| {
                let params = ForestParams {
                    n_trees: 50,
                    ..ForestParams::default()
                };
                let mut forest = RandomForest::new(params, 7, jobs);
                forest.fit(black_box(&x), black_box(&y)).unwrap();
                forest
            });
        });
    }
    group.finish();
}

fn bench_svm_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("svm_fit");
    group.sample_size(10);

    for n in [250usize, 1_000] {
        let (x, y) = synthetic(n, 400, 2);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut svm = RbfSvm::new(SvmParams::default());
                svm.fit(black_box(&x), black_box(&y)).unwrap();
                svm
            });
        });
    }
    group.finish();
}

fn bench_roc_auc(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let labels: Vec<f64> = (0..50_000).map(|i| (i % 2) as f64).collect();
    let scores: Vec<f64> = (0..50_000).map(|_| rng.gen::<f64>()).collect();

    c.bench_function("roc_auc_50k", |b| {
        b.iter(|| roc_auc(black_box(&labels), black_box(&scores)).unwrap());
    });
}

criterion_group!(benches, bench_forest_fit, bench_svm_fit, bench_roc_auc);
criterion_main!(benches);
