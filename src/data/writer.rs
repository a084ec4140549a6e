use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Float64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use super::model::{Grid, GridMeta};

/// Write a grid in the format implied by the file extension. Used by the
/// `generate_sample` binary and by tests that need fixtures on disk.
pub fn write_file(path: &Path, grid: &Grid, meta: &GridMeta) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let written = match ext.as_str() {
        "csv" => write_csv(path, grid),
        "dat" | "txt" => write_text(path, grid, meta),
        "json" => write_json(path, grid, meta),
        "parquet" | "pq" => write_parquet(path, grid, meta),
        other => bail!("Unsupported file extension: .{other}"),
    };
    written.with_context(|| format!("writing {}", path.display()))
}

fn write_csv(path: &Path, grid: &Grid) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context("creating CSV")?;
    for row in grid.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_text(path: &Path, grid: &Grid, meta: &GridMeta) -> Result<()> {
    let mut out = String::new();
    if let Some(dx) = meta.dx {
        writeln!(out, "# dx = {dx}")?;
    }
    if let Some(dy) = meta.dy {
        writeln!(out, "# dy = {dy}")?;
    }
    for row in grid.rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    std::fs::write(path, out)?;
    Ok(())
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    data: Vec<&'a [f64]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dy: Option<f64>,
}

fn write_json(path: &Path, grid: &Grid, meta: &GridMeta) -> Result<()> {
    let doc = JsonDocument {
        data: grid.rows().collect(),
        dx: meta.dx,
        dy: meta.dy,
    };
    let file = std::fs::File::create(path)?;
    serde_json::to_writer(file, &doc)?;
    Ok(())
}

fn write_parquet(path: &Path, grid: &Grid, meta: &GridMeta) -> Result<()> {
    let mut row_builder = ListBuilder::new(Float64Builder::new());
    for row in grid.rows() {
        row_builder.values().append_slice(row);
        row_builder.append(true);
    }
    let row_array = row_builder.finish();

    let mut metadata = HashMap::new();
    if let Some(dx) = meta.dx {
        metadata.insert("dx".to_string(), dx.to_string());
    }
    if let Some(dy) = meta.dy {
        metadata.insert("dy".to_string(), dy.to_string());
    }

    let schema = Arc::new(
        Schema::new(vec![Field::new(
            "row",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        )])
        .with_metadata(metadata),
    );

    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(row_array)])
        .context("building record batch")?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
