// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use labgrid_app::validation::{infer_cell, parse_cell};
use labgrid_app::{CellValue, Dataset, TableSchema};
use std::env;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const APP_NAME: &str = "labgrid";
pub const DATA_PATH_ENV: &str = "LABGRID_DATA_PATH";

const DATA_FILE_NAME: &str = "projects.csv";
const UTF8_BOM: &str = "\u{feff}";

/// Loads a table file. Row ids follow file order starting at 1.
pub fn load_dataset(path: &Path, schema: &TableSchema) -> Result<Dataset> {
    let file = fs::File::open(path).with_context(|| {
        format!(
            "open data file {} -- run `labgrid --generate 100` to create sample data",
            path.display()
        )
    })?;
    let dataset =
        read_dataset(file, schema).with_context(|| format!("load {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Parses CSV text with a header row. A leading UTF-8 byte-order mark is
/// ignored; cells are typed through the schema, unknown columns are inferred.
pub fn read_dataset<R: Read>(mut reader: R, schema: &TableSchema) -> Result<Dataset> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .context("read table text; the file must be UTF-8")?;
    let body = text.strip_prefix(UTF8_BOM).unwrap_or(&text);

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());
    let headers = csv_reader
        .headers()
        .context("read header row")?
        .iter()
        .map(|header| header.trim().to_owned())
        .collect::<Vec<_>>();
    if headers.is_empty() {
        bail!("table has no header row");
    }
    let mut dataset = Dataset::new(headers.iter().cloned())?;

    for (index, record) in csv_reader.records().enumerate() {
        let line = index + 2;
        let record = record.with_context(|| format!("read line {line}"))?;
        let values = headers
            .iter()
            .zip(record.iter())
            .map(|(column, raw)| parse_field(schema, column, raw, line))
            .collect::<Result<Vec<_>>>()?;
        dataset
            .push_row(values)
            .with_context(|| format!("line {line}"))?;
    }
    debug!(rows = dataset.len(), "parsed table");
    Ok(dataset)
}

/// Atomically replaces `path` with the dataset. The file is written with a
/// UTF-8 byte-order mark so spreadsheet tools pick the right encoding.
pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("create data directory {}", parent.display()))?;

    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    write_dataset(staged.as_file_mut(), dataset)?;
    staged
        .as_file()
        .sync_all()
        .context("flush staged data file")?;
    staged
        .persist(path)
        .map_err(|error| anyhow!("replace {}: {}", path.display(), error.error))?;

    info!(
        path = %path.display(),
        rows = dataset.len(),
        version = dataset.version().get(),
        "dataset saved"
    );
    Ok(())
}

/// Money and progress are stored as bare numbers and dates as `YYYY-MM-DD`.
pub fn write_dataset<W: Write>(mut writer: W, dataset: &Dataset) -> Result<()> {
    writer
        .write_all(UTF8_BOM.as_bytes())
        .context("write byte-order mark")?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(dataset.columns())
        .context("write header row")?;
    for row in dataset.rows() {
        csv_writer
            .write_record(
                dataset
                    .columns()
                    .iter()
                    .map(|column| row.value(column).display()),
            )
            .with_context(|| format!("write row {}", row.id))?;
    }
    csv_writer.flush().context("flush table")?;
    Ok(())
}

pub fn default_data_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os(DATA_PATH_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set {DATA_PATH_ENV} to a writable CSV path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join(DATA_FILE_NAME))
}

pub fn validate_data_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("data path must not be empty");
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "data path {path:?} looks like a URI ({scheme}://); download the file and pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("data path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!("data path {path:?} contains '?'; remove query parameters and use a plain file path");
    }

    Ok(())
}

fn parse_field(schema: &TableSchema, column: &str, raw: &str, line: usize) -> Result<CellValue> {
    match schema.kind(column) {
        Some(kind) => parse_cell(kind, raw)
            .map_err(|error| anyhow!("line {line}, column {column:?}: {error} (got {raw:?})")),
        None => Ok(infer_cell(raw)),
    }
}
