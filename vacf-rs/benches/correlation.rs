use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use num_complex::Complex;
use rand::rngs::ThreadRng;
use std::num::NonZeroUsize;
use vacf_rs::kernel::KernelLifecycle;
use vacf_rs::signal::correlation::{
    AveragedPsdConfig, AveragedPsdKernel, IntegrationMethod, SimplePsdConfig, SimplePsdKernel,
};
use vacf_rs::signal::traits::CorrelationPsd1D;

/// Multi-tone complex trajectory with randomized amplitudes and phases from
/// an instance of `rng`.
fn randomized_trajectory(
    mut rng: ThreadRng,
    num_tones: NonZeroUsize,
    num_samples: NonZeroUsize,
    time_step: f64,
) -> Vec<Complex<f64>> {
    use rand::Rng;

    let nt: usize = num_tones.into();
    let n: usize = num_samples.into();
    let nyquist = 0.5 / time_step; // Generated tones stay below this.

    let tones: Vec<(f64, f64, f64)> = (0..nt)
        .map(|k| {
            let amplitude = rng.random_range(0.5..1.5) / 1.1f64.powf(k as f64);
            let frequency = rng.random_range(0.05..0.95) * nyquist;
            let phase = rng.random_range(0.0..std::f64::consts::PI);
            (amplitude, frequency, phase)
        })
        .collect();

    (0..n)
        .map(|j| {
            let t = j as f64 * time_step;
            tones.iter().fold(Complex::new(0.0, 0.0), |acc, &(a, f, p)| {
                let theta = 2.0 * std::f64::consts::PI * f * t + p;
                acc + Complex::new(a * theta.cos(), a * theta.sin())
            })
        })
        .collect()
}

fn correlation_psd(c: &mut Criterion) {
    const STEP: usize = 10;
    const TIME_STEP: f64 = 0.005;

    let signal = randomized_trajectory(
        rand::rng(),
        NonZeroUsize::new(8).unwrap(),
        NonZeroUsize::new(1 << 10).unwrap(),
        TIME_STEP,
    );
    let frequencies: Vec<f64> = (0..64).map(|k| k as f64 * 0.35).collect();

    let averaged = AveragedPsdKernel::try_new(AveragedPsdConfig {
        time_step: TIME_STEP,
        step: STEP,
        method: IntegrationMethod::Rectangular,
    })
    .expect("averaged kernel config should be valid");
    c.bench_with_input(
        BenchmarkId::new("averaged_psd", STEP),
        &signal,
        |bench, sig| {
            bench.iter(|| {
                averaged.run_alloc(
                    black_box(sig.as_slice()),
                    black_box(frequencies.as_slice()),
                )
            })
        },
    );

    let simple = SimplePsdKernel::try_new(SimplePsdConfig {
        time_step: TIME_STEP,
        step: STEP,
        method: IntegrationMethod::Rectangular,
    })
    .expect("simple kernel config should be valid");
    c.bench_with_input(
        BenchmarkId::new("simple_psd", STEP),
        &signal,
        |bench, sig| {
            bench.iter(|| {
                simple.run_alloc(
                    black_box(sig.as_slice()),
                    black_box(frequencies.as_slice()),
                )
            })
        },
    );
}

criterion_group!(benches, correlation_psd);
criterion_main!(benches);
