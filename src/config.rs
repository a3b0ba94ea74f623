//! Pipeline configuration.
//!
//! Defaults reproduce the reference feature lists; a TOML or JSON file can
//! override any field.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, PrepResult};
use crate::preprocess::cuts::CLUSTER_CUTS;
use crate::preprocess::normalise::TIME_FEATURE;
use crate::preprocess::response::{RESPONSE_DENOMINATOR, RESPONSE_NUMERATOR};

/// All columns loaded from a source, in output order.
pub const DEFAULT_COLUMNS: [&str; 18] = [
    "clusterE",
    "cluster_FIRST_ENG_DENS",
    "cluster_EM_PROBABILITY",
    "cluster_CENTER_LAMBDA",
    "cluster_CENTER_MAG",
    "cluster_nCells_tot",
    "cluster_ENG_FRAC_EM",
    "cluster_SECOND_TIME",
    "cluster_AVG_TILE_Q",
    "cluster_AVG_LAR_Q",
    "cluster_SECOND_R",
    "cluster_LATERAL",
    "cluster_time",
    "cluster_ISOLATION",
    "cluster_ENG_CALIB_TOT",
    "cluster_SIGNIFICANCE",
    "nPrimVtx",
    "avgMu",
];

pub const DEFAULT_LOG_FEATURES: [&str; 8] = [
    "clusterE",
    "cluster_FIRST_ENG_DENS",
    "cluster_CENTER_LAMBDA",
    "cluster_nCells_tot",
    "cluster_SECOND_TIME",
    "cluster_AVG_TILE_Q",
    "cluster_AVG_LAR_Q",
    "cluster_SECOND_R",
];

pub const DEFAULT_NORMAL_FEATURES: [&str; 13] = [
    "clusterE",
    "cluster_FIRST_ENG_DENS",
    "cluster_EM_PROBABILITY",
    "cluster_CENTER_LAMBDA",
    "cluster_CENTER_MAG",
    "cluster_nCells_tot",
    "cluster_ENG_FRAC_EM",
    "cluster_SECOND_TIME",
    "cluster_AVG_TILE_Q",
    "cluster_AVG_LAR_Q",
    "cluster_SECOND_R",
    "cluster_LATERAL",
    "cluster_ISOLATION",
];

// ---------------------------------------------------------------------------
// File formats
// ---------------------------------------------------------------------------

/// On-disk table formats understood by the loader and writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Parquet,
    Csv,
    Json,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Parquet => "parquet",
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }

    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> PrepResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "parquet" | "pq" => Ok(FileFormat::Parquet),
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            other => Err(PrepError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the log / standardisation / time transform group.
    pub apply_normalisation: bool,
    /// Columns loaded from every source (load schema).
    pub columns: Vec<String>,
    /// Columns mapped through the shift-safe log10.
    pub log_features: Vec<String>,
    /// Columns standardised as `(mean - x) / std`.
    pub normal_features: Vec<String>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub input_format: FileFormat,
    pub output_format: FileFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        Self {
            apply_normalisation: true,
            columns: owned(&DEFAULT_COLUMNS),
            log_features: owned(&DEFAULT_LOG_FEATURES),
            normal_features: owned(&DEFAULT_NORMAL_FEATURES),
            input_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/processed"),
            input_format: FileFormat::Parquet,
            output_format: FileFormat::Parquet,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file (`.toml` or `.json`) and validate it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let config: PipelineConfig = if is_json {
            serde_json::from_str(&text).context("parsing JSON config")?
        } else {
            toml::from_str(&text).context("parsing TOML config")?
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the column lists against each other and against the columns
    /// the fixed stages need.
    pub fn validate(&self) -> PrepResult<()> {
        for (label, list) in [
            ("columns", &self.columns),
            ("log_features", &self.log_features),
            ("normal_features", &self.normal_features),
        ] {
            let mut seen = BTreeSet::new();
            if let Some(dup) = list.iter().find(|name| !seen.insert(name.as_str())) {
                return Err(PrepError::InvalidConfig(format!(
                    "'{dup}' listed twice in {label}"
                )));
            }
        }

        let known: BTreeSet<&str> = self.columns.iter().map(String::as_str).collect();

        for (label, list) in [
            ("log_features", &self.log_features),
            ("normal_features", &self.normal_features),
        ] {
            if let Some(name) = list.iter().find(|name| !known.contains(name.as_str())) {
                return Err(PrepError::InvalidConfig(format!(
                    "{label} entry '{name}' is not in columns"
                )));
            }
        }

        let required = CLUSTER_CUTS
            .iter()
            .map(|cut| cut.column)
            .chain([RESPONSE_NUMERATOR, RESPONSE_DENOMINATOR, TIME_FEATURE]);
        for name in required {
            if !known.contains(name) {
                return Err(PrepError::InvalidConfig(format!(
                    "required column '{name}' is not in columns"
                )));
            }
        }

        Ok(())
    }
}
