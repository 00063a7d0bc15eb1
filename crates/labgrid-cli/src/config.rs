// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use labgrid_app::{DEFAULT_CACHE_CAPACITY, EditPolicy};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "LABGRID_CONFIG_PATH";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_FILE_NAME: &str = "labgrid.log";
const DEFAULT_FILTER_COLUMNS: [&str; 2] = ["Department", "Status"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub editing: Editing,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data: Data::default(),
            editing: Editing::default(),
            cache: Cache::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Data {
    pub path: Option<String>,
    pub filter_columns: Option<Vec<String>>,
}

impl Default for Data {
    fn default() -> Self {
        Self {
            path: None,
            filter_columns: Some(
                DEFAULT_FILTER_COLUMNS
                    .iter()
                    .map(|column| (*column).to_owned())
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Editing {
    pub allow_insert: Option<bool>,
    pub allow_delete: Option<bool>,
}

impl Default for Editing {
    fn default() -> Self {
        Self {
            allow_insert: Some(true),
            allow_delete: Some(true),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
    pub capacity: Option<i64>,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            capacity: Some(DEFAULT_CACHE_CAPACITY as i64),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(labgrid_data::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [data], [editing], [cache], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(data_path) = &self.data.path {
            labgrid_data::validate_data_path(data_path)?;
        }

        if let Some(columns) = &self.data.filter_columns
            && columns.iter().any(|column| column.trim().is_empty())
        {
            bail!(
                "data.filter_columns in {} must not contain blank names",
                path.display()
            );
        }

        if let Some(capacity) = self.cache.capacity
            && capacity < 0
        {
            bail!(
                "cache.capacity in {} must be non-negative, got {}",
                path.display(),
                capacity
            );
        }

        if let Some(level) = &self.log.level {
            level.parse::<LevelFilter>().map_err(|_| {
                anyhow!(
                    "log.level in {} must be one of off, error, warn, info, debug, trace; got {level:?}",
                    path.display()
                )
            })?;
        }

        if let Some(file) = &self.log.file
            && file.trim().is_empty()
        {
            bail!("log.file in {} must not be empty", path.display());
        }

        Ok(())
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => labgrid_data::default_data_path(),
        }
    }

    pub fn filter_columns(&self) -> Vec<String> {
        match &self.data.filter_columns {
            Some(columns) => columns.clone(),
            None => Data::default().filter_columns.unwrap_or_default(),
        }
    }

    pub fn edit_policy(&self) -> EditPolicy {
        EditPolicy {
            allow_insert: self.editing.allow_insert.unwrap_or(true),
            allow_delete: self.editing.allow_delete.unwrap_or(true),
        }
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache
            .capacity
            .and_then(|capacity| usize::try_from(capacity).ok())
            .unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }

        let data_root = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("cannot resolve data directory; set [log].file in the config"))?;
        Ok(data_root.join(labgrid_data::APP_NAME).join(LOG_FILE_NAME))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# labgrid config\n# Place this file at: {}\n\nversion = 1\n\n[data]\n# Optional. Default is platform data dir (for example ~/.local/share/labgrid/projects.csv)\n# path = \"/absolute/path/to/projects.csv\"\nfilter_columns = [\"Department\", \"Status\"]\n\n[editing]\nallow_insert = true\nallow_delete = true\n\n[cache]\n# Number of recent views kept; 0 disables caching\ncapacity = {}\n\n[log]\nlevel = \"{}\"\n# file = \"/absolute/path/to/labgrid.log\"\n",
            path.display(),
            DEFAULT_CACHE_CAPACITY,
            DEFAULT_LOG_LEVEL,
        )
    }
}
