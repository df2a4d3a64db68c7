#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use sparse_wire::presets::{self, Preset};
use sparse_wire::{CellState, CellStore, Wireworld, WireworldConfig};
use tracing::info;

const DEFAULT_SEED: u64 = 0x5EED_1234_ABCD_EF01;

#[derive(Parser, Debug)]
#[command(
    name = "sparse-wire",
    version,
    about = "Run a sparse Wireworld simulation and report cell counts and timings"
)]
struct Cli {
    /// Built-in component to load, optionally offset: NAME or NAME@X,Y.
    #[arg(long = "preset", value_name = "NAME[@X,Y]")]
    presets: Vec<String>,

    /// Raw pattern as comma separated x,y,state triples.
    #[arg(long, value_name = "TRIPLES", allow_hyphen_values = true)]
    pattern: Option<String>,

    /// Side length of a random wire field anchored at the origin.
    #[arg(long, value_name = "N")]
    random: Option<i32>,

    /// Seed for the random wire field.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Number of generations to run.
    #[arg(long, default_value_t = 2000)]
    steps: u64,

    /// Print a report every N generations.
    #[arg(long, default_value_t = 500)]
    report_every: u64,

    /// Minimum time between scheduled steps, in milliseconds.
    /// Falls back to WIREWORLD_STEP_INTERVAL_MS, then 50 ms.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Drive rate-gated steps against the wall clock instead of forcing them.
    #[arg(long)]
    realtime: bool,

    /// Drop empty records before the run starts.
    #[arg(long)]
    trim: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if cli.report_every == 0 {
        bail!("--report-every must be positive");
    }

    let mut engine = build_engine(&cli)?;
    if cli.trim {
        engine.trim();
    }
    if engine.cell_count() == 0 {
        bail!("nothing to simulate: pass --preset, --pattern or --random");
    }

    info!(
        cells = engine.cell_count(),
        interval = ?engine.step_interval(),
        realtime = cli.realtime,
        "starting run"
    );
    if cli.realtime {
        run_realtime(&mut engine, cli.steps, cli.report_every);
    } else {
        run_forced(&mut engine, cli.steps, cli.report_every);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn build_engine(cli: &Cli) -> Result<Wireworld> {
    let mut config = WireworldConfig::default();
    if let Some(ms) = cli.interval_ms {
        config = config.step_interval(Duration::from_millis(ms));
    }
    let mut engine = Wireworld::with_config(config);

    for spec in &cli.presets {
        let (preset, x, y) = parse_placement(spec)?;
        engine.load(x, y, &preset.cells());
        info!(%preset, x, y, "loaded preset");
    }

    if let Some(raw) = &cli.pattern {
        let triples = parse_triples(raw)?;
        let patch = CellStore::try_from_triples(&triples).context("invalid --pattern")?;
        engine.load(0, 0, &patch);
        info!(cells = patch.len(), "loaded pattern");
    }

    if let Some(side) = cli.random {
        if side <= 0 {
            bail!("--random must be positive, got {side}");
        }
        let field = presets::random_field(side, cli.seed);
        engine.load(0, 0, &field);
        info!(side, seed = cli.seed, cells = field.len(), "loaded random field");
    }

    Ok(engine)
}

fn parse_placement(spec: &str) -> Result<(Preset, i32, i32)> {
    let (name, offset) = match spec.split_once('@') {
        Some((name, offset)) => (name, Some(offset)),
        None => (spec, None),
    };
    let preset: Preset = name
        .parse()
        .with_context(|| format!("invalid --preset {spec:?}"))?;
    let Some(offset) = offset else {
        return Ok((preset, 0, 0));
    };
    let Some((x, y)) = offset.split_once(',') else {
        bail!("invalid --preset {spec:?}: expected NAME@X,Y");
    };
    let x: i32 = x
        .trim()
        .parse()
        .with_context(|| format!("invalid x offset in --preset {spec:?}"))?;
    let y: i32 = y
        .trim()
        .parse()
        .with_context(|| format!("invalid y offset in --preset {spec:?}"))?;
    Ok((preset, x, y))
}

fn parse_triples(raw: &str) -> Result<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, s)| {
            s.parse::<i32>()
                .with_context(|| format!("--pattern value {i} is not an integer: {s:?}"))
        })
        .collect()
}

fn report(engine: &Wireworld, phase: Duration, steps: u64) {
    let census = engine.cells().census();
    let phase_ms = phase.as_secs_f64() * 1000.0;
    let avg_ms = if steps == 0 {
        0.0
    } else {
        phase_ms / steps as f64
    };
    println!(
        "Generation {}: cells = {}, wire = {}, heads = {}, tails = {}",
        engine.generation(),
        engine.cell_count(),
        census[CellState::Wire.index()],
        census[CellState::Head.index()],
        census[CellState::Tail.index()],
    );
    println!("  {phase_ms:.3} ms total, {avg_ms:.6} ms/step");
}

fn run_forced(engine: &mut Wireworld, steps: u64, report_every: u64) {
    let mut total = Duration::ZERO;
    let mut done = 0;
    while done < steps {
        let chunk = report_every.min(steps - done);
        let start = Instant::now();
        engine.step_n(chunk);
        let phase = start.elapsed();
        total += phase;
        done += chunk;
        report(engine, phase, chunk);
    }
    summary(total, steps);
}

fn run_realtime(engine: &mut Wireworld, steps: u64, report_every: u64) {
    engine.set_running(true);
    let interval = engine.step_interval();
    let mut total = Duration::ZERO;
    let mut phase = Duration::ZERO;
    let mut in_phase = 0;
    let mut done = 0;
    while done < steps {
        let start = Instant::now();
        if engine.step(false) {
            let elapsed = start.elapsed();
            phase += elapsed;
            total += elapsed;
            in_phase += 1;
            done += 1;
            if in_phase == report_every || done == steps {
                report(engine, phase, in_phase);
                phase = Duration::ZERO;
                in_phase = 0;
            }
        } else {
            std::thread::sleep((interval / 4).max(Duration::from_micros(50)));
        }
    }
    engine.set_running(false);
    summary(total, steps);
}

fn summary(total: Duration, steps: u64) {
    let total_ms = total.as_secs_f64() * 1000.0;
    let avg_ms = if steps == 0 {
        0.0
    } else {
        total_ms / steps as f64
    };
    println!("\n--- Summary ({steps} steps) ---");
    println!("{total_ms:.3} ms total, {avg_ms:.6} ms/step");
}
