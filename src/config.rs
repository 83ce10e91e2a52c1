use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub pager: PagerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    pub prompt: String,
    /// Printed when the session ends through `exit` or the interrupt key.
    pub farewell: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "$ ".to_string(),
            farewell: "Bye.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagerConfig {
    /// Lines shown per page by `less`.
    pub page_lines: usize,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self { page_lines: 20 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Log file; defaults to `~/.local/state/rawsh/rawsh.log`.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    shell: ShellOverlay,
    #[serde(default)]
    pager: PagerOverlay,
    #[serde(default)]
    log: LogOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct ShellOverlay {
    prompt: Option<String>,
    farewell: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PagerOverlay {
    page_lines: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct LogOverlay {
    level: Option<String>,
    file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// Parse the embedded default config.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay from `explicit` if given, otherwise from
    ///    ~/.config/rawsh/config.toml (if it exists)
    ///
    /// A file named explicitly must exist and parse. Problems with the
    /// implicit user file are reported on stderr and otherwise ignored.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();
        match explicit {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("can't read config {}", path.display()))?;
                config
                    .merge_str(&content)
                    .with_context(|| format!("can't parse config {}", path.display()))?;
            }
            None => {
                if let Some(path) = Self::user_config_path() {
                    if let Ok(content) = std::fs::read_to_string(&path) {
                        if let Err(e) = config.merge_str(&content) {
                            eprintln!("rawsh: config parse error in {}: {e:#}", path.display());
                        }
                    }
                }
            }
        }
        Ok(config)
    }

    /// Merge a TOML overlay given as text.
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let overlay: ConfigOverlay = toml::from_str(content)?;
        self.apply_overlay(overlay);
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(".config/rawsh/config.toml"))
    }

    /// Apply an overlay on top of this config: every value present overrides.
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(v) = overlay.shell.prompt {
            self.shell.prompt = v;
        }
        if let Some(v) = overlay.shell.farewell {
            self.shell.farewell = v;
        }
        if let Some(v) = overlay.pager.page_lines {
            self.pager.page_lines = v.max(1);
        }
        if let Some(v) = overlay.log.level {
            self.log.level = v;
        }
        if let Some(v) = overlay.log.file {
            self.log.file = Some(v);
        }
    }
}
