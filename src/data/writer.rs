use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use super::model::ClusterTable;
use crate::config::FileFormat;

/// Write the full column set of `table` to `path`, format chosen by
/// extension.
///
/// The data goes to a temporary sibling first and is renamed into place, so
/// `path` either holds a complete table or is left as it was.
pub fn write_table(table: &ClusterTable, path: &Path) -> Result<()> {
    let format = FileFormat::from_path(path)?;
    let staging = staging_path(path);

    let written = match format {
        FileFormat::Parquet => write_parquet(table, &staging),
        FileFormat::Csv => write_csv(table, &staging),
        FileFormat::Json => write_json(table, &staging),
    };

    if let Err(e) = written {
        let _ = std::fs::remove_file(&staging);
        return Err(e).with_context(|| format!("writing {}", path.display()));
    }

    std::fs::rename(&staging, path)
        .with_context(|| format!("moving {} into place", path.display()))?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Convert the table into a single Arrow record batch, one non-nullable
/// Float64 column per table column.
pub fn to_record_batch(table: &ClusterTable) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(
        table
            .columns()
            .iter()
            .map(|c| Field::new(c.name.as_str(), DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));

    let arrays: Vec<ArrayRef> = table
        .columns()
        .iter()
        .map(|c| Arc::new(Float64Array::from(c.values.clone())) as ArrayRef)
        .collect();

    RecordBatch::try_new(schema, arrays).context("building record batch")
}

fn write_parquet(table: &ClusterTable, path: &Path) -> Result<()> {
    let batch = to_record_batch(table)?;
    let file = File::create(path).context("creating parquet file")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn write_csv(table: &ClusterTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer
        .write_record(table.column_names())
        .context("writing CSV header")?;

    for row in 0..table.len() {
        let record = table.columns().iter().map(|c| c.values[row].to_string());
        writer
            .write_record(record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Column-oriented JSON. Non-finite values have no JSON representation and
/// are written as `null`.
fn write_json(table: &ClusterTable, path: &Path) -> Result<()> {
    let mut object = Map::with_capacity(table.n_columns());
    for column in table.columns() {
        let values = column
            .values
            .iter()
            .map(|&v| serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number))
            .collect();
        object.insert(column.name.clone(), JsonValue::Array(values));
    }

    let file = File::create(path).context("creating JSON file")?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, &JsonValue::Object(object)).context("serialising JSON")?;
    out.flush().context("flushing JSON")?;
    Ok(())
}
