use std::fs::File;
use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use log::warn;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::Recording;
use crate::config::{Delimiter, RecordingSchema};
use crate::error::{LoaderError, Result};
use crate::labels::MetadataRow;

// ---------------------------------------------------------------------------
// Recording files
// ---------------------------------------------------------------------------

/// Read one recording file according to its declared schema.
pub fn load_recording(path: &Path, schema: &RecordingSchema) -> Result<Recording> {
    match schema.delimiter {
        Delimiter::Semicolon => load_delimited(path, b';', schema),
        Delimiter::Whitespace => load_whitespace(path, schema),
    }
}

/// Semicolon (or any single-byte) delimited text, parsed with `csv`.
fn load_delimited(path: &Path, delimiter: u8, schema: &RecordingSchema) -> Result<Recording> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(schema.has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let header = if schema.has_header {
        Some(
            reader
                .headers()?
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>(),
        )
    } else {
        None
    };

    let mut matrix = MatrixBuilder::new(path, schema, header.as_ref().map(Vec::len));
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(row_no + 1);
        matrix.push(line, record.iter())?;
    }
    matrix.finish(header)
}

/// Columns separated by any run of spaces or tabs.
fn load_whitespace(path: &Path, schema: &RecordingSchema) -> Result<Recording> {
    let text = std::fs::read_to_string(path)?;
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let header = if schema.has_header {
        lines
            .next()
            .map(|(_, line)| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
    } else {
        None
    };

    let mut matrix = MatrixBuilder::new(path, schema, header.as_ref().map(Vec::len));
    for (line_no, line) in lines {
        matrix.push(line_no, line.split_whitespace())?;
    }
    matrix.finish(header)
}

/// Collects parsed rows and enforces a consistent column count.
struct MatrixBuilder<'a> {
    path: &'a Path,
    /// Declared column count; rows may be wider and are truncated.
    keep: Option<usize>,
    /// Exact width every row must have when nothing is declared.
    width: Option<usize>,
    rows: Vec<Vec<f64>>,
}

impl<'a> MatrixBuilder<'a> {
    fn new(path: &'a Path, schema: &RecordingSchema, header_width: Option<usize>) -> Self {
        Self {
            path,
            keep: schema.columns,
            width: header_width,
            rows: Vec::new(),
        }
    }

    fn error(&self, line: usize, message: String) -> LoaderError {
        LoaderError::Parse {
            path: self.path.to_path_buf(),
            line,
            message,
        }
    }

    fn push<'s>(&mut self, line: usize, cells: impl Iterator<Item = &'s str>) -> Result<()> {
        let mut cells: Vec<&str> = cells.collect();
        let found = cells.len();

        match self.keep {
            Some(keep) => {
                if found < keep {
                    return Err(self.error(
                        line,
                        format!("expected at least {keep} columns, found {found}"),
                    ));
                }
                cells.truncate(keep);
            }
            None => {
                let width = *self.width.get_or_insert(found);
                if found != width {
                    return Err(self.error(
                        line,
                        format!("expected {width} columns, found {found}"),
                    ));
                }
            }
        }

        let row = cells
            .iter()
            .enumerate()
            .map(|(col, tok)| parse_cell(tok).ok_or_else(|| {
                self.error(line, format!("column {col}: '{tok}' is not a number"))
            }))
            .collect::<Result<Vec<f64>>>()?;
        self.rows.push(row);
        Ok(())
    }

    fn finish(self, header: Option<Vec<String>>) -> Result<Recording> {
        let Some(width) = self.rows.first().map(Vec::len) else {
            return Err(LoaderError::EmptyRecording(self.path.to_path_buf()));
        };
        let columns = match header {
            Some(names) if names.len() >= width => names.into_iter().take(width).collect(),
            _ => (0..width).map(|i| format!("c{i}")).collect(),
        };
        Ok(Recording {
            columns,
            rows: self.rows,
        })
    }
}

/// Empty cells become NaN; anything else must be a float.
fn parse_cell(tok: &str) -> Option<f64> {
    let tok = tok.trim();
    if tok.is_empty() {
        return Some(f64::NAN);
    }
    tok.parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Metadata table – dispatch by extension
// ---------------------------------------------------------------------------

/// Load the metadata table.
///
/// Supported formats:
/// * `.csv`     – header row, comma separated
/// * `.json`    – `[{ "ID": "P01", "updrs_total": 12 }, ...]`
/// * `.parquet` – any id column castable to string, score castable to float
///
/// Rows without a usable id or score are skipped with a warning.
pub fn load_metadata(path: &Path, id_column: &str, score_column: &str) -> Result<Vec<MetadataRow>> {
    if !path.is_file() {
        return Err(LoaderError::MetadataNotFound(path.to_path_buf()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_metadata_csv(path, id_column, score_column),
        "json" => load_metadata_json(path, id_column, score_column),
        "parquet" | "pq" => load_metadata_parquet(path, id_column, score_column),
        other => Err(LoaderError::UnsupportedMetadataFormat(other.to_string())),
    }
}

fn usable_row(id: &str, score: Option<f64>, position: &str) -> Option<MetadataRow> {
    let id = id.trim();
    if id.is_empty() {
        warn!("Metadata {position}: empty id, skipped");
        return None;
    }
    match score {
        Some(score) if score.is_finite() => Some(MetadataRow {
            id: id.to_string(),
            score,
        }),
        _ => {
            warn!("Metadata {position}: no usable score for '{id}', skipped");
            None
        }
    }
}

fn load_metadata_csv(path: &Path, id_column: &str, score_column: &str) -> Result<Vec<MetadataRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let id_idx = headers
        .iter()
        .position(|h| h == id_column)
        .ok_or_else(|| LoaderError::MissingColumn(id_column.to_string()))?;
    let score_idx = headers
        .iter()
        .position(|h| h == score_column)
        .ok_or_else(|| LoaderError::MissingColumn(score_column.to_string()))?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let id = record.get(id_idx).unwrap_or("");
        let score = record
            .get(score_idx)
            .and_then(|s| s.trim().parse::<f64>().ok());
        if let Some(row) = usable_row(id, score, &format!("row {row_no}")) {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn load_metadata_json(path: &Path, id_column: &str, score_column: &str) -> Result<Vec<MetadataRow>> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;
    let records = root.as_array().ok_or_else(|| {
        LoaderError::MalformedMetadata("expected a top-level JSON array".to_string())
    })?;

    let mut rows = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoaderError::MalformedMetadata(format!("row {i} is not an object")))?;

        let id = match obj.get(id_column) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let score = match obj.get(score_column) {
            Some(JsonValue::Number(n)) => n.as_f64(),
            Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        if let Some(row) = usable_row(&id, score, &format!("row {i}")) {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn load_metadata_parquet(
    path: &Path,
    id_column: &str,
    score_column: &str,
) -> Result<Vec<MetadataRow>> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    // Checked on the file schema so an empty file still reports missing columns.
    let schema = builder.schema().clone();
    let id_idx = schema
        .index_of(id_column)
        .map_err(|_| LoaderError::MissingColumn(id_column.to_string()))?;
    let score_idx = schema
        .index_of(score_column)
        .map_err(|_| LoaderError::MissingColumn(score_column.to_string()))?;

    let reader = builder.build()?;
    let mut rows = Vec::new();
    let mut offset = 0;
    for batch in reader {
        let batch = batch?;
        let ids = cast(batch.column(id_idx), &DataType::Utf8)?;
        let ids = ids.as_string::<i32>();
        let scores = cast(batch.column(score_idx), &DataType::Float64)?;
        let scores = scores.as_primitive::<Float64Type>();

        for row in 0..batch.num_rows() {
            let id = if ids.is_null(row) { "" } else { ids.value(row) };
            let score = (!scores.is_null(row)).then(|| scores.value(row));
            if let Some(entry) = usable_row(id, score, &format!("row {}", offset + row)) {
                rows.push(entry);
            }
        }
        offset += batch.num_rows();
    }
    Ok(rows)
}
