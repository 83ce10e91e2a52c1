use crate::config::LogConfig;
use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`).
pub fn parse_level(name: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(name.trim()).with_context(|| format!("unknown log level: {name}"))
}

/// Where the log goes when the config doesn't say.
pub fn default_log_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".local/state/rawsh/rawsh.log"))
}

/// Install a file logger.
///
/// The terminal belongs to the line editor, so records only ever go to a file.
/// A level of `off`, or no usable file location, leaves logging disabled.
pub fn init(config: &LogConfig, level_override: Option<LevelFilter>) -> Result<()> {
    let level = match level_override {
        Some(level) => level,
        None => parse_level(&config.level)?,
    };
    if level == LevelFilter::Off {
        return Ok(());
    }
    let Some(path) = config.file.clone().or_else(default_log_path) else {
        return Ok(());
    };

    let file = match open_log_file(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("rawsh: logging disabled: {e:#}");
            return Ok(());
        }
    };

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, log_config, file).context("logger already installed")?;
    log::info!("logging at {level} to {}", path.display());
    Ok(())
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("can't create {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("can't open {}", path.display()))
}
