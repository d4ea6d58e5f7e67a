//! TOML configuration for the `sf` CLI.
//!
//! Every section and key is optional. A missing file is not an error when
//! no `--config` flag was given; [`Config::minimal`] supplies the defaults.
//!
//! ```toml
//! [annotate]
//! policy = "exact_then_positional"
//!
//! [render]
//! format = "markdown"
//! unresolved_glyph = "⚠"
//! max_preview_chars = 160
//!
//! [logging]
//! filter = "warn"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sourcefinder_core::ResolutionPolicy;
use std::path::Path;

use crate::render::OutputFormat;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub annotate: AnnotateConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnnotateConfig {
    #[serde(default)]
    pub policy: ResolutionPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Appended to markers that match no source.
    #[serde(default = "default_unresolved_glyph")]
    pub unresolved_glyph: String,
    #[serde(default = "default_verified_badge")]
    pub verified_badge: String,
    #[serde(default = "default_unverified_badge")]
    pub unverified_badge: String,
    #[serde(default = "default_true")]
    pub open_links_in_new_tab: bool,
    #[serde(default = "default_max_preview_chars")]
    pub max_preview_chars: usize,
    /// List sources the answer never cites below the cited ones.
    #[serde(default = "default_true")]
    pub show_uncited: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            unresolved_glyph: default_unresolved_glyph(),
            verified_badge: default_verified_badge(),
            unverified_badge: default_unverified_badge(),
            open_links_in_new_tab: true,
            max_preview_chars: default_max_preview_chars(),
            show_uncited: true,
        }
    }
}

fn default_unresolved_glyph() -> String {
    "⚠".to_string()
}
fn default_verified_badge() -> String {
    "✓ verified".to_string()
}
fn default_unverified_badge() -> String {
    "unverified".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_preview_chars() -> usize {
    160
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing` filter directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Config {
    /// All defaults, used when no config file is given.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.render.max_preview_chars == 0 {
        bail!("render.max_preview_chars must be > 0");
    }
    if config.render.unresolved_glyph.trim().is_empty() {
        bail!("render.unresolved_glyph must not be empty");
    }
    if config.render.verified_badge.trim().is_empty()
        || config.render.unverified_badge.trim().is_empty()
    {
        bail!("render.verified_badge and render.unverified_badge must not be empty");
    }
    if config.logging.filter.trim().is_empty() {
        bail!("logging.filter must not be empty");
    }
    Ok(())
}
