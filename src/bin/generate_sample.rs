use std::path::PathBuf;

use anyhow::Result;
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;

use cluster_prep::config::DEFAULT_COLUMNS;
use cluster_prep::data::writer::{to_record_batch, write_table};
use cluster_prep::ClusterTable;

/// Write a synthetic cluster table with every configured column.
#[derive(Parser, Debug)]
struct Args {
    /// Output file (.parquet, .csv or .json)
    #[arg(long, default_value = "mc20a_withPU.parquet")]
    output: PathBuf,

    /// Number of clusters
    #[arg(long, default_value_t = 10_000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let u = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + (hi - lo) * u
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform(0.0, 1.0).max(1e-15);
        let u2 = self.uniform(0.0, 1.0);
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn log_normal(&mut self, mu: f64, sigma: f64) -> f64 {
        self.gauss(mu, sigma).exp()
    }
}

/// Draw one value of `column`. A small fraction of energies and
/// significances are non-positive so the quality cuts have work to do.
fn draw(column: &str, rng: &mut SimpleRng) -> f64 {
    match column {
        "clusterE" => rng.gauss(2.0, 3.0),
        "cluster_ENG_CALIB_TOT" => rng.log_normal(0.5, 1.0),
        "cluster_SIGNIFICANCE" => rng.gauss(5.0, 4.0),
        "cluster_time" => rng.gauss(0.0, 10.0),
        "cluster_EM_PROBABILITY" | "cluster_ENG_FRAC_EM" => rng.uniform(0.0, 1.0),
        "cluster_nCells_tot" => rng.uniform(1.0, 400.0).floor(),
        "cluster_AVG_TILE_Q" | "cluster_AVG_LAR_Q" => rng.uniform(0.0, 5000.0).floor(),
        "cluster_ISOLATION" | "cluster_LATERAL" => rng.uniform(0.0, 1.0),
        "nPrimVtx" => rng.uniform(5.0, 60.0).floor(),
        "avgMu" => rng.gauss(45.0, 12.0).max(0.0),
        _ => rng.log_normal(0.0, 1.5),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let mut columns: Vec<(String, Vec<f64>)> = DEFAULT_COLUMNS
        .iter()
        .map(|name| (name.to_string(), Vec::with_capacity(args.rows)))
        .collect();

    for _ in 0..args.rows {
        for (name, values) in &mut columns {
            values.push(draw(name, &mut rng));
        }
    }

    let table = ClusterTable::from_columns(columns)?;
    write_table(&table, &args.output)?;

    let batch = to_record_batch(&table)?;
    let preview = batch.slice(0, batch.num_rows().min(5));
    println!("{}", pretty_format_batches(&[preview])?);
    println!(
        "Wrote {} clusters ({} columns) to {}",
        table.len(),
        table.n_columns(),
        args.output.display()
    );
    Ok(())
}
