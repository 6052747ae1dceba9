mod ic;

use clap::{Parser, ValueEnum};
use diffusion_core::{BoundaryKind, DiffusionEngine, EngineConfig, Scalar};
use ic::{IcType, Plate, generate_ic};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Boundary {
    Fixed,
    Clamped,
}

impl From<Boundary> for BoundaryKind {
    fn from(b: Boundary) -> Self {
        match b {
            Boundary::Fixed => BoundaryKind::Fixed,
            Boundary::Clamped => BoundaryKind::Clamped,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Precision {
    F32,
    F64,
}

impl Precision {
    fn as_str(&self) -> &'static str {
        match self {
            Precision::F32 => "f32",
            Precision::F64 => "f64",
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Grid rows
    #[arg(long, default_value_t = 256)]
    nx: usize,

    /// Grid columns
    #[arg(long, default_value_t = 256)]
    ny: usize,

    /// Diffusion coefficient, 0 < alpha <= 0.25
    #[arg(long, default_value_t = 0.2)]
    alpha: f64,

    /// Border rule
    #[arg(long, value_enum, default_value_t = Boundary::Fixed)]
    boundary: Boundary,

    /// Steps per run
    #[arg(long, default_value_t = 500)]
    steps: usize,

    /// Comma-separated worker counts, one run each, e.g. "1,2,4" (0 = all cores)
    #[arg(long, default_value = "0")]
    threads: String,

    /// Cell precision
    #[arg(long, value_enum, default_value_t = Precision::F32)]
    precision: Precision,

    /// Initial field
    #[arg(long, value_enum, default_value_t = IcType::HotRect)]
    ic: IcType,

    /// Temperature of the hot region
    #[arg(long, default_value_t = 100.0)]
    hot: f64,

    /// Temperature of the rest of the plate, borders included
    #[arg(long, default_value_t = 0.0)]
    ambient: f64,

    /// Share of each axis covered by the hot region
    #[arg(long, default_value_t = 0.25)]
    hot_fraction: f64,

    /// RNG seed for random initial fields
    #[arg(long, default_value_t = 123)]
    seed: u64,

    /// Output directory for runs.jsonl and final fields
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunRow {
    nx: usize,
    ny: usize,
    alpha: f64,
    boundary: &'static str,
    precision: &'static str,
    ic_type: &'static str,
    seed: u64,

    threads: usize,
    tiles: usize,
    steps: usize,

    elapsed_ms: f64,
    mcells_per_sec: f64,

    initial_sum: f64,
    final_sum: f64,
    final_min: f64,
    final_max: f64,
    finite: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if !(args.hot_fraction > 0.0 && args.hot_fraction <= 1.0) {
        return Err("hot_fraction must be in (0, 1]".into());
    }

    let thread_set = parse_thread_set(&args.threads)?;
    if thread_set.is_empty() {
        return Err("threads parsed to empty set".into());
    }

    // Fail on bad grid/alpha before building the initial field.
    config_for(&args, thread_set[0]).validate()?;

    let plate = Plate {
        ambient: args.ambient,
        hot: args.hot,
        fraction: args.hot_fraction,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let ic_field = generate_ic(&mut rng, args.nx, args.ny, args.ic, &plate);

    let mut meta_file = match &args.out {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            Some(BufWriter::new(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(dir.join("runs.jsonl"))?,
            ))
        }
        None => None,
    };

    let mut reference: Option<(usize, Vec<f64>)> = None;

    for &threads in &thread_set {
        let (row, final_field) = match args.precision {
            Precision::F32 => run::<f32>(&args, threads, &ic_field)?,
            Precision::F64 => run::<f64>(&args, threads, &ic_field)?,
        };

        println!(
            "threads={:<3} steps={} elapsed={:.3} ms  {:.1} Mcell/s  sum {:.6e} -> {:.6e}",
            row.threads, row.steps, row.elapsed_ms, row.mcells_per_sec, row.initial_sum, row.final_sum
        );

        if let Some((ref_threads, ref_field)) = &reference {
            let differing = count_differing(ref_field, &final_field);
            if differing > 0 {
                warn!(
                    threads = row.threads,
                    reference_threads = ref_threads,
                    differing,
                    "final field differs across thread counts"
                );
            }
        }
        if reference.is_none() {
            reference = Some((row.threads, final_field.clone()));
        }

        if let (Some(dir), Some(meta)) = (&args.out, meta_file.as_mut()) {
            serde_json::to_writer(&mut *meta, &row)?;
            meta.write_all(b"\n")?;

            let path = dir.join(format!("field_t{}.bin", row.threads));
            let mut w = BufWriter::new(File::create(&path)?);
            write_field(&mut w, args.nx, args.ny, &final_field)?;
            w.flush()?;
        }
    }

    if let Some(mut meta) = meta_file {
        meta.flush()?;
    }
    if let Some(dir) = &args.out {
        info!(dir = %dir.display(), runs = thread_set.len(), "wrote run records");
    }

    Ok(())
}

fn config_for(args: &Args, threads: usize) -> EngineConfig {
    EngineConfig {
        nx: args.nx,
        ny: args.ny,
        alpha: args.alpha,
        boundary: args.boundary.into(),
        threads,
    }
}

fn run<T: Scalar>(
    args: &Args,
    threads: usize,
    ic_field: &[f64],
) -> Result<(RunRow, Vec<f64>), Box<dyn std::error::Error>> {
    let mut engine = DiffusionEngine::<T>::new(config_for(args, threads))?;

    let init = ic_field
        .iter()
        .map(|&v| T::from_f64(v).ok_or("initial value not representable in cell type"))
        .collect::<Result<Vec<T>, _>>()?;
    engine.set_initial_field(&init)?;

    let initial_sum = engine.field().sum();
    let thread_count = engine.thread_count();
    let tiles = engine.tiles().iter().filter(|t| !t.is_empty()).count();

    let outcome = engine.run_steps(args.steps);
    let field = outcome.field;

    let row = RunRow {
        nx: args.nx,
        ny: args.ny,
        alpha: args.alpha,
        boundary: BoundaryKind::from(args.boundary).as_str(),
        precision: args.precision.as_str(),
        ic_type: args.ic.as_str(),
        seed: args.seed,

        threads: thread_count,
        tiles,
        steps: outcome.steps,

        elapsed_ms: outcome.elapsed.as_secs_f64() * 1e3,
        mcells_per_sec: outcome.cell_updates_per_sec() / 1e6,

        initial_sum,
        final_sum: field.sum(),
        final_min: field.min().as_f64(),
        final_max: field.max().as_f64(),
        finite: field.is_finite(),
    };
    let values = field.as_slice().iter().map(|v| v.as_f64()).collect();

    engine.finish();
    Ok((row, values))
}

fn count_differing(a: &[f64], b: &[f64]) -> usize {
    a.iter()
        .zip(b)
        .filter(|(x, y)| x.to_bits() != y.to_bits())
        .count()
}

/// Header `u32 nx`, `u32 ny`, then `f64` cells, all little-endian.
fn write_field<W: Write>(w: &mut W, nx: usize, ny: usize, v: &[f64]) -> std::io::Result<()> {
    w.write_all(&(nx as u32).to_le_bytes())?;
    w.write_all(&(ny as u32).to_le_bytes())?;
    for &x in v {
        w.write_all(&x.to_le_bytes())?;
    }
    Ok(())
}

fn parse_thread_set(s: &str) -> Result<Vec<usize>, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    for part in s.split(',') {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        let v: usize = p.parse()?;
        if !out.contains(&v) {
            out.push(v);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_set_keeps_order_and_drops_duplicates() {
        assert_eq!(parse_thread_set("4, 1,2,,4").unwrap(), vec![4, 1, 2]);
        assert!(parse_thread_set("two").is_err());
        assert!(parse_thread_set("").unwrap().is_empty());
    }

    #[test]
    fn field_header_is_little_endian() {
        let mut buf = Vec::new();
        write_field(&mut buf, 3, 4, &[1.5; 12]).unwrap();
        assert_eq!(buf.len(), 8 + 12 * 8);
        assert_eq!(&buf[0..4], &3u32.to_le_bytes());
        assert_eq!(&buf[4..8], &4u32.to_le_bytes());
        assert_eq!(&buf[8..16], &1.5f64.to_le_bytes());
    }

    #[test]
    fn run_reports_finite_drained_field() {
        let args = Args::parse_from([
            "diffusion-cli",
            "--nx",
            "12",
            "--ny",
            "10",
            "--steps",
            "20",
            "--precision",
            "f64",
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
        let plate = Plate {
            ambient: args.ambient,
            hot: args.hot,
            fraction: args.hot_fraction,
        };
        let ic_field = generate_ic(&mut rng, args.nx, args.ny, args.ic, &plate);

        let (row, field) = run::<f64>(&args, 2, &ic_field).unwrap();
        assert_eq!(row.steps, 20);
        assert_eq!(row.threads, 2);
        assert_eq!(row.tiles, 2);
        assert!(row.finite);
        assert!(row.final_sum <= row.initial_sum);
        assert_eq!(field.len(), 120);
    }
}
