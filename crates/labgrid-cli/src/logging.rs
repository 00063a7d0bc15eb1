// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Sends log output to `path`; the terminal belongs to the TUI. `RUST_LOG`
/// wins over the configured level.
pub fn init(level: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                path.display()
            )
        })?;

    let filter = build_filter(level, env::var("RUST_LOG").ok().as_deref())?;
    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("install log subscriber")?;
    tracing::info!(path = %path.display(), "logging initialized");
    Ok(())
}

fn build_filter(level: &str, env_override: Option<&str>) -> Result<EnvFilter> {
    if let Some(directives) = env_override.filter(|value| !value.trim().is_empty()) {
        return EnvFilter::try_new(directives)
            .map_err(|error| anyhow!("invalid RUST_LOG value {directives:?}: {error}"));
    }
    EnvFilter::try_new(level).map_err(|error| anyhow!("invalid log level {level:?}: {error}"))
}
