// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use labgrid_app::{Dataset, TableSchema};
use std::path::{Path, PathBuf};

/// Persists the session's table to a CSV file on disk.
pub struct FileRuntime {
    path: PathBuf,
    schema: TableSchema,
}

impl FileRuntime {
    pub fn new(path: PathBuf, schema: TableSchema) -> Self {
        Self { path, schema }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl labgrid_tui::AppRuntime for FileRuntime {
    fn save_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        labgrid_data::save_dataset(&self.path, dataset)
    }

    fn reload_dataset(&mut self) -> Result<Dataset> {
        labgrid_data::load_dataset(&self.path, &self.schema)
    }

    fn source_label(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps saves in memory so `--demo` never touches the real data file.
pub struct DemoRuntime {
    snapshot: Dataset,
}

impl DemoRuntime {
    pub fn new(initial: Dataset) -> Self {
        Self { snapshot: initial }
    }
}

impl labgrid_tui::AppRuntime for DemoRuntime {
    fn save_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        self.snapshot = dataset.clone();
        Ok(())
    }

    fn reload_dataset(&mut self) -> Result<Dataset> {
        Ok(self.snapshot.clone())
    }

    fn source_label(&self) -> String {
        "demo data (in memory)".to_owned()
    }
}
