use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeListArray, ListArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{Grid, GridMeta, LoadedGrid};

// ---------------------------------------------------------------------------
// Loader capability
// ---------------------------------------------------------------------------

/// Anything that can turn a path into a grid.
///
/// The batch runner only talks to this trait, so tests can hand it an
/// in-memory fake instead of touching the filesystem.
pub trait GridLoader {
    fn load(&self, path: &Path) -> Result<LoadedGrid>;
}

/// The default loader: reads grids from disk, dispatching on extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileGridLoader;

impl GridLoader for FileGridLoader {
    fn load(&self, path: &Path) -> Result<LoadedGrid> {
        load_file(path)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a grid from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`           – comma-separated rows, no header
/// * `.dat` / `.txt`  – whitespace-separated rows (`numpy.savetxt` layout)
/// * `.json`          – nested array, or `{ "data": [[...]], "dx": .., "dy": .. }`
/// * `.parquet`       – `row` list column, or one numeric column per grid column
pub fn load_file(path: &Path) -> Result<LoadedGrid> {
    if path.is_dir() {
        bail!("{} is a directory", path.display());
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "csv" => load_csv(path),
        "dat" | "txt" => load_text(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    };
    let loaded = parsed.with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "Loaded {} with shape {} ({})",
        path.display(),
        loaded.grid.shape(),
        loaded.meta
    );
    Ok(loaded)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: one grid row per record, no header row.
/// Lines starting with `#` are skipped.
fn load_csv(path: &Path) -> Result<LoadedGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row = record
            .iter()
            .enumerate()
            .map(|(j, tok)| parse_cell(tok, row_no, j))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let grid = Grid::from_rows(rows)?;
    Ok(grid.into())
}

fn parse_cell(tok: &str, row: usize, col: usize) -> Result<f64> {
    tok.parse::<f64>()
        .with_context(|| format!("Row {row}, column {col}: '{tok}' is not a number"))
}

// ---------------------------------------------------------------------------
// Whitespace-delimited text loader
// ---------------------------------------------------------------------------

/// Plain text matrix, one row per line. `#` starts a comment; a comment of
/// the form `# dx = 0.5` records the spacing.
fn load_text(path: &Path) -> Result<LoadedGrid> {
    let text = std::fs::read_to_string(path).context("reading text file")?;
    parse_text(&text)
}

fn parse_text(text: &str) -> Result<LoadedGrid> {
    let mut meta = GridMeta::default();
    let mut rows = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let (data, comment) = match line.split_once('#') {
            Some((data, comment)) => (data, Some(comment)),
            None => (line, None),
        };

        if let Some(comment) = comment {
            read_spacing_comment(comment, line_no + 1, &mut meta);
        }

        let data = data.trim();
        if data.is_empty() {
            continue;
        }

        let row_no = rows.len();
        let row = data
            .split_whitespace()
            .enumerate()
            .map(|(j, tok)| parse_cell(tok, row_no, j))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let grid = Grid::from_rows(rows)?;
    Ok(LoadedGrid { grid, meta })
}

/// Picks `dx` / `dy` out of a comment such as `dx = 0.5` or `dx=0.1, dy=0.2`.
/// An unreadable value is logged and left unset.
fn read_spacing_comment(comment: &str, line_no: usize, meta: &mut GridMeta) {
    for pair in comment.split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let slot = match key.trim() {
            "dx" => &mut meta.dx,
            "dy" => &mut meta.dy,
            _ => continue,
        };
        let value = value.trim();
        match value.parse::<f64>() {
            Ok(v) => *slot = Some(v),
            Err(_) => {
                log::warn!("line {line_no}: ignoring spacing '{value}' for {}", key.trim());
                *slot = None;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Accepted JSON documents:
///
/// ```json
/// [[0.0, 0.1], [0.2, 0.3]]
/// ```
///
/// ```json
/// { "data": [[0.0, 0.1], [0.2, 0.3]], "dx": 0.5, "dy": 0.5 }
/// ```
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonGrid {
    Bare(Vec<Vec<f64>>),
    Document {
        data: Vec<Vec<f64>>,
        #[serde(default)]
        dx: Option<f64>,
        #[serde(default)]
        dy: Option<f64>,
    },
}

fn load_json(path: &Path) -> Result<LoadedGrid> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<LoadedGrid> {
    let doc: JsonGrid = serde_json::from_str(text)
        .context("parsing JSON (expected a nested array or an object with a 'data' array)")?;

    let (rows, meta) = match doc {
        JsonGrid::Bare(rows) => (rows, GridMeta::default()),
        JsonGrid::Document { data, dx, dy } => (data, GridMeta { dx, dy }),
    };

    let grid = Grid::from_rows(rows)?;
    Ok(LoadedGrid { grid, meta })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing a single grid.
///
/// Two layouts are understood:
/// - a `row` column of List<Float64> / LargeList<Float64>, one grid row per
///   record (what `generate_sample` writes);
/// - a wide table where every numeric column is one grid column, as written
///   by **Pandas** `DataFrame.to_parquet()` for a 2-D frame.
///
/// Schema metadata keys `dx` and `dy` are read as the grid spacing.
fn load_parquet(path: &Path) -> Result<LoadedGrid> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let meta = spacing_from_metadata(builder.schema().metadata());
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<f64>> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if let Ok(row_idx) = schema.index_of("row") {
            let col = batch.column(row_idx);
            for row in 0..batch.num_rows() {
                let values = extract_f64_list(col, row)
                    .with_context(|| format!("Row {}: failed to read 'row'", rows.len()))?;
                rows.push(values);
            }
        } else {
            let columns = batch
                .columns()
                .iter()
                .zip(schema.fields())
                .map(|(col, field)| {
                    column_to_f64(col).with_context(|| format!("column '{}'", field.name()))
                })
                .collect::<Result<Vec<Vec<f64>>>>()?;

            for row in 0..batch.num_rows() {
                rows.push(columns.iter().map(|c| c[row]).collect());
            }
        }
    }

    let grid = Grid::from_rows(rows)?;
    Ok(LoadedGrid { grid, meta })
}

fn spacing_from_metadata(metadata: &HashMap<String, String>) -> GridMeta {
    let read = |key: &str| -> Option<f64> {
        let v = metadata.get(key)?;
        match v.trim().parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("ignoring parquet metadata {key} = '{v}'");
                None
            }
        }
    };
    GridMeta {
        dx: read("dx"),
        dy: read("dy"),
    }
}

// -- Arrow helpers --

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    column_to_f64(&values_array)
}

/// Widen a flat numeric Arrow array to `f64`. Nulls become NaN.
fn column_to_f64(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    let any = col.as_any();
    if let Some(arr) = any.downcast_ref::<Float64Array>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(arr) = any.downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else if let Some(arr) = any.downcast_ref::<Int64Array>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, |v| v as f64)).collect())
    } else if let Some(arr) = any.downcast_ref::<Int32Array>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!("{:?} is not a numeric type", col.data_type())
    }
}
