use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{ArgGroup, Parser};

use cluster_prep::campaign::RunMode;
use cluster_prep::{PipelineConfig, Preprocessor};

#[derive(Parser, Debug)]
#[command(about = "Perform preprocessing of cluster tables")]
#[command(group(ArgGroup::new("mode").required(true).args(["test", "full"])))]
struct Args {
    /// Run in test mode (process only mc20a_withPU)
    #[arg(long)]
    test: bool,

    /// Run full preprocessing on all samples
    #[arg(long)]
    full: bool,

    /// Skip log scaling, normalisation and time transformation
    #[arg(long)]
    no_normalisation: bool,

    /// TOML or JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the source tables
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory the preprocessed tables are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if args.no_normalisation {
        config.apply_normalisation = false;
    }
    if let Some(dir) = args.input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    config.validate()?;

    let mode = if args.test { RunMode::Test } else { RunMode::Full };
    log::info!("{mode:?} mode activated");

    let preprocessor = Preprocessor::new(config);
    let mut failed = Vec::new();

    for sample in mode.samples() {
        let cfg = preprocessor.config();
        let input = sample.input_path(&cfg.input_dir, cfg.input_format);
        if let Err(e) = preprocessor.process_file(&input) {
            log::error!("{sample}: {e:#}");
            failed.push(sample.stem());
        }
    }

    if !failed.is_empty() {
        bail!("{} sample(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
