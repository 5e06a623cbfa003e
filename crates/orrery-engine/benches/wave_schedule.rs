//! Benchmarks the two candidate forms of the wave delay schedule: the
//! descending threshold switch the engine uses, and the closed-form log₂
//! alternative.
//!
//! Run with: `cargo bench --bench wave_schedule`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use orrery_engine::C;

const SHELL_COUNT: u32 = 9;

fn shell_radius(n: u32) -> f64 {
    (1u64 << (2 * n)) as f64 * (C / 100.0)
}

struct WaveState {
    radius: f64,
    delay: u32,
}

/// Descending threshold switch; the first hit wins.
fn delay_switch(w: &mut WaveState) {
    for n in (0..SHELL_COUNT).rev() {
        if w.radius > shell_radius(n) {
            let d = 1u32 << (2 * n);
            if w.delay != d {
                w.delay = d;
            }
            return;
        }
    }
}

/// Closed-form variant: one log₂ instead of up to nine compares.
fn delay_log2(w: &mut WaveState) {
    if w.radius >= shell_radius(SHELL_COUNT - 1) {
        let d = 1u32 << (2 * (SHELL_COUNT - 1));
        if w.delay != d {
            w.delay = d;
        }
    } else {
        let n = (w.radius / (C / 100.0)).log2() as i32;
        if n > 0 {
            let d = 1u32 << n.min(31);
            if w.delay != d {
                w.delay = d;
            }
        }
    }
}

/// Deterministic xorshift so both benchmarks see the same radii.
fn radii(count: usize) -> Vec<f64> {
    let mut x = 0x9e3779b97f4a7c15u64;
    (0..count)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            (x % 1_000_000) as f64 / 1_000_000.0 * C * 2.0
        })
        .collect()
}

fn bench_delay_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("wave_delay_schedule");

    group.bench_function("switch", |b| {
        let mut waves: Vec<WaveState> = radii(10)
            .into_iter()
            .map(|radius| WaveState { radius, delay: 0 })
            .collect();
        b.iter(|| {
            for w in &mut waves {
                delay_switch(black_box(w));
            }
        });
    });

    group.bench_function("log2", |b| {
        let mut waves: Vec<WaveState> = radii(10)
            .into_iter()
            .map(|radius| WaveState { radius, delay: 0 })
            .collect();
        b.iter(|| {
            for w in &mut waves {
                delay_log2(black_box(w));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_delay_schedule);
criterion_main!(benches);
