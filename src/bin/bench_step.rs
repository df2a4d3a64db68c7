#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::time::Instant;

use sparse_wire::presets::{self, Preset};
use sparse_wire::{CellState, Wireworld};

const SEED: u64 = 0xBEEF_CAFE;

/// Time the first step (which rebuilds the neighbor cache) separately from
/// the steady-state steps that follow.
fn bench_field(side: i32, iterations: u64) {
    let mut engine = Wireworld::new();
    engine.load(0, 0, &presets::random_field(side, SEED));
    let cells = engine.cell_count();

    let start = Instant::now();
    engine.step(true);
    let rebuild_ms = start.elapsed().as_secs_f64() * 1000.0;

    let start = Instant::now();
    engine.step_n(iterations);
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    let avg_us = total_ms * 1000.0 / iterations as f64;
    let heads = engine.cells().census()[CellState::Head.index()];

    println!(
        "{:<12} {:>10} {:>14.3} {:>8} {:>12.1} {:>12.2} {:>8}",
        format!("{side}x{side}"),
        cells,
        rebuild_ms,
        iterations,
        total_ms,
        avg_us,
        heads
    );
}

/// A long row of clocks: every step touches every cell but the cache is
/// built once.
fn bench_clock_row(clocks: i32, iterations: u64) {
    let mut engine = Wireworld::new();
    let clock = Preset::Clock4.cells();
    for i in 0..clocks {
        engine.load(i * 4, 0, &clock);
    }

    let start = Instant::now();
    engine.step_n(iterations);
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    println!(
        "{:<28} {:>6} iters  {:>10.1} ms total  {:>10.2} us/step  cells={}",
        format!("clock4 x {clocks}"),
        iterations,
        total_ms,
        total_ms * 1000.0 / iterations as f64,
        engine.cell_count()
    );
}

/// Interleave single-cell structural edits with steps, so every step pays
/// for a cache rebuild.
fn bench_edit_churn(side: i32, edits: u64) {
    let mut engine = Wireworld::new();
    engine.load(0, 0, &presets::random_field(side, SEED));

    let start = Instant::now();
    for i in 0..edits {
        let x = side + (i % 64) as i32;
        let y = (i / 64) as i32;
        engine.set(x, y, CellState::Wire);
        engine.step(true);
    }
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    println!(
        "{:<28} {:>6} edits  {:>10.1} ms total  {:>10.2} us/edit+step",
        format!("churn {side}x{side}"),
        edits,
        total_ms,
        total_ms * 1000.0 / edits as f64
    );
}

fn main() {
    println!("=== Sparse Wireworld Step Benchmark ===\n");

    let scales: &[(i32, u64)] = &[(128, 500), (512, 200), (1024, 100), (2048, 30)];

    println!(
        "{:<12} {:>10} {:>14} {:>8} {:>12} {:>12} {:>8}",
        "Field", "Cells", "Rebuild(ms)", "Iters", "Total(ms)", "Avg(us)", "Heads"
    );
    println!("{}", "-".repeat(82));
    for &(side, iters) in scales {
        bench_field(side, iters);
    }

    println!();
    bench_clock_row(10_000, 1000);
    bench_edit_churn(256, 500);
}
