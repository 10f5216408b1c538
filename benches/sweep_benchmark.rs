use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use gmca::{GmcaOptions, normalize_columns, optimize};
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

const N_CHANNELS: usize = 9;
const N_SOURCES: usize = 4;
const N_ITERATIONS: usize = 10;

fn random_mixture(n_samples: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(0x5EED_F64 + n_samples as u64);
    let mixing = Array2::from_shape_fn((N_CHANNELS, N_SOURCES), |_| {
        let v: f64 = StandardNormal.sample(&mut rng);
        v.abs()
    });
    let sources = Array2::from_shape_fn((N_SOURCES, n_samples), |_| StandardNormal.sample(&mut rng));
    mixing.dot(&sources)
}

fn benchmark_optimize(c: &mut Criterion) {
    let sample_counts = [1_024_usize, 4_096, 16_384];
    let problems: Vec<_> = sample_counts
        .iter()
        .map(|&n| (n, random_mixture(n)))
        .collect();

    let mut prior = Array2::ones((N_CHANNELS, N_SOURCES));
    normalize_columns(&mut prior);
    let lam_p = vec![0.0; N_SOURCES];
    let options = GmcaOptions {
        lam_s: 0.1,
        seed: Some(1),
        ..GmcaOptions::default()
    };

    let mut group = c.benchmark_group("gmca_optimize");
    for (n_samples, observations) in problems.iter() {
        group.throughput(Throughput::Elements((*n_samples * N_CHANNELS) as u64));
        group.bench_with_input(
            BenchmarkId::new("sweeps", n_samples),
            observations,
            |b, input| {
                b.iter(|| {
                    let mut mixing = prior.clone();
                    let mut sources = Array2::zeros((N_SOURCES, *n_samples));
                    let report = optimize(
                        black_box(input.view()),
                        N_SOURCES,
                        N_ITERATIONS,
                        &mut mixing,
                        &mut sources,
                        prior.view(),
                        &lam_p,
                        &options,
                    )
                    .unwrap();
                    black_box(report);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(gmca_optimize, benchmark_optimize);
criterion_main!(gmca_optimize);
