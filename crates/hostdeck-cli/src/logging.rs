// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "HOSTDECK_LOG";

/// Routes `tracing` output to the log file. The terminal belongs to the UI,
/// so nothing is written to stdout or stderr.
pub fn init_logging(config: &Config) -> Result<()> {
    let filter = resolve_filter(env::var(LOG_ENV_VAR).ok().as_deref(), config.log_level())?;
    let path = config.log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| {
            format!(
                "open log file {}; set [log].file to a writable path",
                path.display()
            )
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    tracing::debug!(path = %path.display(), "logging initialized");
    Ok(())
}

fn resolve_filter(env_value: Option<&str>, config_level: &str) -> Result<EnvFilter> {
    match env_value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => EnvFilter::try_new(raw).with_context(|| {
            format!("{LOG_ENV_VAR}={raw:?} is not a valid filter; unset it or use a level such as \"debug\"")
        }),
        None => EnvFilter::try_new(config_level)
            .with_context(|| format!("invalid log level {config_level:?} in [log].level")),
    }
}
