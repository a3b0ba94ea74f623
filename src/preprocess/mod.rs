//! Preprocessing pipeline: cuts, response, transforms.
//!
//! Architecture:
//! ```text
//!   source file
//!        │  data::loader
//!        ▼
//!   ┌────────────┐
//!   │   cuts     │  drop clusters failing a quality cut, drop SIGNIFICANCE
//!   └────────────┘
//!        ▼
//!   ┌────────────┐
//!   │  response  │  add clusterE / ENG_CALIB_TOT, drop ENG_CALIB_TOT
//!   └────────────┘
//!        ▼             (skipped together when apply_normalisation = false)
//!   ┌────────────┐
//!   │ log_scale  │  shift-safe log10 of log_features
//!   │ normalise  │  (mean - x) / std of normal_features,
//!   │            │  cube root + z-score of cluster_time
//!   └────────────┘
//!        │  data::writer
//!        ▼
//!   {base}_{norm|raw}.{ext}
//! ```

pub mod cuts;
pub mod log_scale;
pub mod normalise;
pub mod response;
pub mod stats;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::data::loader::load_table;
use crate::data::model::ClusterTable;
use crate::data::writer::write_table;
use crate::error::PrepResult;

use cuts::CutSummary;
use log_scale::LogScaling;
use stats::Moments;

// ---------------------------------------------------------------------------
// Output tagging
// ---------------------------------------------------------------------------

/// Distinguishes transformed output from raw output in file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTag {
    Norm,
    Raw,
}

impl OutputTag {
    pub fn for_config(config: &PipelineConfig) -> Self {
        if config.apply_normalisation {
            OutputTag::Norm
        } else {
            OutputTag::Raw
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputTag::Norm => "norm",
            OutputTag::Raw => "raw",
        }
    }

    /// `{base_name}_{norm|raw}`
    pub fn identifier(self, base_name: &str) -> String {
        format!("{base_name}_{}", self.as_str())
    }
}

impl fmt::Display for OutputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// What the transform group did; `None` on the raw path.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformReport {
    pub log_scaling: Vec<(String, LogScaling)>,
    pub standardised: Vec<(String, Moments)>,
    pub time: Moments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub tag: OutputTag,
    pub cuts: CutSummary,
    pub transforms: Option<TransformReport>,
}

/// Runs the preprocessing stages with one fixed configuration.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PipelineConfig,
}

impl Preprocessor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn tag(&self) -> OutputTag {
        OutputTag::for_config(&self.config)
    }

    /// Apply every stage to `table` in place.
    pub fn run(&self, table: &mut ClusterTable) -> PrepResult<PipelineReport> {
        let cuts = cuts::apply_cuts(table)?;
        log::info!("Cuts applied: {} -> {} clusters", cuts.rows_before, cuts.rows_after);

        response::compute_response(table)?;
        log::info!("Response computed");

        let transforms = if self.config.apply_normalisation {
            Some(self.transform(table)?)
        } else {
            log::info!("Skipping log scale, normalisation and time transformation");
            None
        };

        Ok(PipelineReport {
            tag: self.tag(),
            cuts,
            transforms,
        })
    }

    fn transform(&self, table: &mut ClusterTable) -> PrepResult<TransformReport> {
        // Validate every name up front so a bad list cannot leave the table
        // half transformed.
        table.require(
            self.config
                .log_features
                .iter()
                .chain(&self.config.normal_features)
                .map(String::as_str)
                .chain([normalise::TIME_FEATURE]),
        )?;

        let log_scaling = log_scale::apply_log(table, &self.config.log_features)?;
        log::info!("Log transformation applied to {} features", log_scaling.len());

        let standardised = normalise::apply_standardisation(table, &self.config.normal_features)?;
        log::info!("Normalisation applied to {} features", standardised.len());

        let time = normalise::apply_time_transform(table)?;
        log::info!("Time transformation applied");

        Ok(TransformReport {
            log_scaling,
            standardised,
            time,
        })
    }

    /// Output file for `input` under the configured output directory.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let base_name = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let identifier = self.tag().identifier(&base_name);
        self.config.output_dir.join(format!(
            "{identifier}.{}",
            self.config.output_format.extension()
        ))
    }

    /// Load `input`, run the pipeline, write the result. Returns the path
    /// written.
    pub fn process_file(&self, input: &Path) -> Result<PathBuf> {
        log::info!("Preprocessing: {}", input.display());

        let mut table = load_table(input, &self.config.columns)?;
        self.run(&mut table)
            .with_context(|| format!("preprocessing {}", input.display()))?;

        let output = self.output_path(input);
        std::fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!("creating output directory {}", self.config.output_dir.display())
        })?;
        write_table(&table, &output)?;

        log::info!("Saved preprocessed data ({table}) to {}", output.display());
        Ok(output)
    }
}
