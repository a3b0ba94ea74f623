//! Preprocessing of calorimeter cluster tables for response regression.
//!
//! A [`ClusterTable`] is loaded from disk, passed through quality cuts,
//! gains a `cluster_response` column and, unless disabled, has its features
//! log scaled and standardised before being written back out.

pub mod campaign;
pub mod config;
pub mod data;
pub mod error;
pub mod preprocess;

pub use config::{FileFormat, PipelineConfig};
pub use data::model::{ClusterTable, Column};
pub use error::{PrepError, PrepResult};
pub use preprocess::{OutputTag, PipelineReport, Preprocessor};
