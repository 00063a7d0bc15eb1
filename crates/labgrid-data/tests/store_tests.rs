// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use labgrid_app::{CellValue, RowId, TableSchema};
use labgrid_data::{load_dataset, read_dataset, save_dataset, validate_data_path, write_dataset};
use labgrid_testkit::{ResearchFaker, fixture_date, sample_dataset, temp_data_path};
use std::fs;
use time::{Date, Month};

#[test]
fn validate_data_path_rejects_uri_forms() {
    assert!(validate_data_path("").is_err());
    assert!(validate_data_path("file:projects.csv").is_err());
    assert!(validate_data_path("https://example.com/projects.csv").is_err());
    assert!(validate_data_path("projects.csv?raw=1").is_err());
    assert!(validate_data_path("/tmp/labgrid/projects.csv").is_ok());
}

#[test]
fn generated_register_survives_save_and_load() -> Result<()> {
    let (_dir, path) = temp_data_path()?;
    let schema = TableSchema::research_projects();
    let dataset = ResearchFaker::new(11, fixture_date()).research_dataset(25)?;

    save_dataset(&path, &dataset)?;
    let loaded = load_dataset(&path, &schema)?;

    assert_eq!(loaded.columns(), dataset.columns());
    assert_eq!(loaded.len(), dataset.len());
    for (before, after) in dataset.rows().iter().zip(loaded.rows()) {
        assert_eq!(before, after);
    }
    Ok(())
}

#[test]
fn saved_file_starts_with_a_byte_order_mark() -> Result<()> {
    let (_dir, path) = temp_data_path()?;
    save_dataset(&path, &sample_dataset()?)?;

    let bytes = fs::read(&path)?;
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
    let text = String::from_utf8(bytes)?;
    assert!(text.contains("cat,val\n"), "got {text:?}");
    Ok(())
}

#[test]
fn load_accepts_files_without_a_bom() -> Result<()> {
    let text = "cat,val\nA,10\nB,\n";
    let dataset = read_dataset(text.as_bytes(), &TableSchema::empty())?;

    assert_eq!(dataset.len(), 2);
    let second = dataset.row(RowId::new(2)).expect("second row");
    assert_eq!(second.value("cat"), &CellValue::text("B"));
    assert_eq!(second.value("val"), &CellValue::Empty);
    Ok(())
}

#[test]
fn load_parses_typed_columns() -> Result<()> {
    let text = "\u{feff}Project_ID,Start_Date,Budget,Progress,Status\n\
                PRJ-001,2025-03-01 00:00:00,\"125,000,000\",40,진행중\n";
    let dataset = read_dataset(text.as_bytes(), &TableSchema::research_projects())?;
    let row = dataset.row(RowId::new(1)).expect("first row");

    assert_eq!(
        row.value("Start_Date"),
        &CellValue::Date(Date::from_calendar_date(2025, Month::March, 1)?)
    );
    assert_eq!(row.value("Budget"), &CellValue::Int(125_000_000));
    assert_eq!(row.value("Progress"), &CellValue::Int(40));
    assert_eq!(row.value("Status"), &CellValue::text("진행중"));
    Ok(())
}

#[test]
fn load_reports_the_offending_line() -> Result<()> {
    let text = "Project_ID,Progress\nPRJ-001,40\nPRJ-002,140\n";
    let error = read_dataset(text.as_bytes(), &TableSchema::research_projects())
        .expect_err("out of range progress should fail");
    let message = format!("{error:#}");
    assert!(message.contains("line 3"), "got {message}");
    assert!(message.contains("Progress"), "got {message}");
    Ok(())
}

#[test]
fn unknown_columns_round_trip_unchanged() -> Result<()> {
    let text = "Project_ID,Grant_Code,Progress\nPRJ-001,007,40\nPRJ-002,+5,50\nPRJ-003,12,60\n";
    let dataset = read_dataset(text.as_bytes(), &TableSchema::research_projects())?;
    let first = dataset.row(RowId::new(1)).expect("first row");
    assert_eq!(first.value("Grant_Code"), &CellValue::text("007"));
    let third = dataset.row(RowId::new(3)).expect("third row");
    assert_eq!(third.value("Grant_Code"), &CellValue::Int(12));

    let mut out = Vec::new();
    write_dataset(&mut out, &dataset)?;
    let written = String::from_utf8(out)?;
    assert_eq!(written.strip_prefix('\u{feff}'), Some(text));
    Ok(())
}

#[test]
fn load_rejects_ragged_rows_and_duplicate_headers() {
    let ragged = "cat,val\nA,1,extra\n";
    assert!(read_dataset(ragged.as_bytes(), &TableSchema::empty()).is_err());

    let duplicate = "cat,cat\nA,B\n";
    let error = read_dataset(duplicate.as_bytes(), &TableSchema::empty())
        .expect_err("duplicate header should fail");
    assert!(error.to_string().contains("appears more than once"));
}

#[test]
fn missing_file_error_suggests_generating_data() -> Result<()> {
    let (_dir, path) = temp_data_path()?;
    let error =
        load_dataset(&path, &TableSchema::empty()).expect_err("missing file should fail");
    assert!(error.to_string().contains("--generate"));
    Ok(())
}

#[test]
fn save_replaces_an_existing_file() -> Result<()> {
    let (_dir, path) = temp_data_path()?;
    fs::write(&path, "stale contents that are much longer than the new table")?;
    save_dataset(&path, &sample_dataset()?)?;

    let loaded = load_dataset(&path, &TableSchema::empty())?;
    assert_eq!(loaded, sample_dataset()?);
    Ok(())
}

#[test]
fn write_dataset_renders_dates_iso() -> Result<()> {
    let mut dataset = labgrid_app::Dataset::new(["when"])?;
    dataset.push_row(vec![Date::from_calendar_date(2026, Month::January, 5)?.into()])?;

    let mut out = Vec::new();
    write_dataset(&mut out, &dataset)?;
    let text = String::from_utf8(out)?;
    assert!(text.ends_with("when\n2026-01-05\n"), "got {text:?}");
    Ok(())
}
