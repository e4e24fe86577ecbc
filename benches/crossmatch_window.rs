use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mpcq::{
    crossmatch::cross_match, duplicates::find_duplicates,
    observations::observation_set::ObservationSet, time::parse_timestamp, time::shift_seconds,
    Observation, Tolerance,
};

/// Observations of one object spaced `step_s` seconds apart, drifting slowly in RA.
fn synthetic_track(n: usize, prefix: &str, submission: &str, step_s: f64, jitter: f64) -> Vec<Observation> {
    let t0 = parse_timestamp("2024-01-01T00:00:00").expect("valid epoch");
    (0..n)
        .map(|i| {
            let x = i as f64;
            // Deterministic pseudo-noise, keeps runs comparable
            let wobble = (x * 12.9898).sin() * jitter;
            Observation::builder(
                format!("{prefix}{i}"),
                "2024 BX1",
                shift_seconds(t0, x * step_s + wobble),
                (120.0 + x * 1e-4 + wobble * 1e-6).rem_euclid(360.0),
                -12.0 + x * 2e-5,
            )
            .stn("I41")
            .submission_id(submission)
            .build()
            .expect("valid observation")
        })
        .collect()
}

fn bench_cross_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_match");
    let tolerance = Tolerance::default();

    for &n in &[1_000usize, 10_000, 100_000] {
        let reference = ObservationSet::new(synthetic_track(n, "r", "mpc", 10.0, 0.0));
        let inputs = synthetic_track(n / 10, "in", "mine", 100.0, 2.0);

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(cross_match(&inputs, &reference, &tolerance)))
        });
    }
    group.finish();
}

fn bench_find_duplicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_duplicates");
    let tolerance = Tolerance::default();

    for &n in &[1_000usize, 10_000] {
        let mut rows = synthetic_track(n, "a", "s1", 60.0, 0.0);
        rows.extend(synthetic_track(n, "b", "s2", 60.0, 1.0));
        rows.extend(synthetic_track(n / 2, "c", "s3", 120.0, 5.0));

        group.bench_with_input(BenchmarkId::from_parameter(rows.len()), &rows, |b, rows| {
            b.iter(|| black_box(find_duplicates(rows, &tolerance)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cross_match, bench_find_duplicates);
criterion_main!(benches);
