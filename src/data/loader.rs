use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, UInt32Array,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::ClusterTable;
use crate::config::FileFormat;
use crate::error::PrepError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the requested `columns` of a cluster table.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one numeric column per feature
/// * `.csv`     – header row, one column per feature
/// * `.json`    – `{ "clusterE": [...], "cluster_time": [...], ... }`
///
/// Columns come back in the order of `columns`; anything else in the file is
/// ignored. Missing values become NaN.
pub fn load_table(path: &Path, columns: &[String]) -> Result<ClusterTable> {
    let format = FileFormat::from_path(path)?;
    let table = match format {
        FileFormat::Parquet => load_parquet(path, columns),
        FileFormat::Csv => load_csv(path, columns),
        FileFormat::Json => load_json(path, columns),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!("Loaded {} clusters from {}", table.len(), path.display());
    Ok(table)
}

fn assemble(columns: &[String], values: Vec<Vec<f64>>) -> Result<ClusterTable> {
    let table = ClusterTable::from_columns(columns.iter().cloned().zip(values))?;
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Column-oriented JSON, the layout of `df.to_json(orient='list')`:
///
/// ```json
/// {
///   "clusterE":     [1.2, 0.4, ...],
///   "cluster_time": [-0.3, null, ...]
/// }
/// ```
fn load_json(path: &Path, columns: &[String]) -> Result<ClusterTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let object = root
        .as_object()
        .context("Expected top-level JSON object of columns")?;

    let values = columns
        .iter()
        .map(|name| {
            let array = object
                .get(name)
                .ok_or_else(|| PrepError::missing(name))?
                .as_array()
                .with_context(|| format!("Column '{name}' is not a JSON array"))?;

            array
                .iter()
                .enumerate()
                .map(|(row, v)| match v {
                    JsonValue::Null => Ok(f64::NAN),
                    other => other
                        .as_f64()
                        .with_context(|| format!("{name}[{row}]: not a number")),
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    assemble(columns, values)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one cluster per record.
/// Empty cells are read as NaN.
fn load_csv(path: &Path, columns: &[String]) -> Result<ClusterTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let indices = columns
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PrepError::missing(name))
        })
        .collect::<Result<Vec<usize>, PrepError>>()?;

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        for (slot, (&col_idx, name)) in indices.iter().zip(columns).enumerate() {
            let cell = record.get(col_idx).unwrap_or("").trim();
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>()
                    .with_context(|| format!("Row {row_no}, {name}: '{cell}' is not a number"))?
            };
            values[slot].push(value);
        }
    }

    assemble(columns, values)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load the requested columns from a Parquet file, concatenating all record
/// batches.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, columns: &[String]) -> Result<ClusterTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let indices = columns
        .iter()
        .map(|name| schema.index_of(name).map_err(|_| PrepError::missing(name)))
        .collect::<Result<Vec<usize>, PrepError>>()?;

    let reader = builder.build().context("building parquet reader")?;
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (slot, (&col_idx, name)) in indices.iter().zip(columns).enumerate() {
            append_f64(batch.column(col_idx), &mut values[slot])
                .with_context(|| format!("reading column '{name}'"))?;
        }
    }

    assemble(columns, values)
}

// -- Arrow helpers --

/// Widen a numeric Arrow column to `f64`, mapping nulls to NaN.
fn append_f64(col: &Arc<dyn Array>, out: &mut Vec<f64>) -> Result<()> {
    macro_rules! widen {
        ($array:ty) => {{
            let arr = col
                .as_any()
                .downcast_ref::<$array>()
                .with_context(|| format!("expected {}", stringify!($array)))?;
            out.extend(arr.iter().map(|v| v.map_or(f64::NAN, |x| x as f64)));
        }};
    }

    match col.data_type() {
        DataType::Float64 => widen!(Float64Array),
        DataType::Float32 => widen!(Float32Array),
        DataType::Int32 => widen!(Int32Array),
        DataType::Int64 => widen!(Int64Array),
        DataType::UInt32 => widen!(UInt32Array),
        other => bail!("Expected a numeric column, got {other:?}"),
    }
    Ok(())
}
