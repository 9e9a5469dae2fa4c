//! Application configuration for serialnorm.
//!
//! User config lives at `~/.serialnorm/serialnorm.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SerialNormError};
use crate::types::{ChapterOverride, OverrideTable};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "serialnorm.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".serialnorm";

// ---------------------------------------------------------------------------
// Config structs (matching serialnorm.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Extensions to the built-in pattern library.
    #[serde(default)]
    pub patterns: PatternsConfig,

    /// Per-chapter exceptions.
    #[serde(default)]
    pub overrides: Vec<OverrideRecord>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Last chapter index of the dash-divider era.
    #[serde(default = "default_era_threshold")]
    pub era_threshold: u32,

    /// Chapter indices that legitimately carry no title.
    #[serde(default = "default_untitled")]
    pub untitled: Vec<u32>,

    /// How many leading blocks are searched for a title.
    #[serde(default = "default_title_search_blocks")]
    pub title_search_blocks: usize,

    /// Word count at which a paragraph counts as body text and ends the
    /// title search.
    #[serde(default = "default_substantial_words")]
    pub substantial_words: usize,

    /// Concurrent chapters in a batch run.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            era_threshold: default_era_threshold(),
            untitled: default_untitled(),
            title_search_blocks: default_title_search_blocks(),
            substantial_words: default_substantial_words(),
            workers: default_workers(),
        }
    }
}

fn default_era_threshold() -> u32 {
    40
}
fn default_untitled() -> Vec<u32> {
    vec![1]
}
fn default_title_search_blocks() -> usize {
    10
}
fn default_substantial_words() -> usize {
    20
}
fn default_workers() -> usize {
    4
}

/// `[patterns]` section. Every entry except `ellipsis_markers` is a
/// case-insensitive regex added to the built-in matchers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsConfig {
    /// Extra link texts that mark a navigation link.
    #[serde(default)]
    pub nav_keywords: Vec<String>,

    /// Extra link texts that point at the next chapter.
    #[serde(default)]
    pub next_keywords: Vec<String>,

    /// Extra leading markers of an author's note.
    #[serde(default)]
    pub author_note_markers: Vec<String>,

    /// Extra leading markers of a content warning.
    #[serde(default)]
    pub content_warning_markers: Vec<String>,

    /// Literal scene-break markers of the post-40 era.
    #[serde(default = "default_ellipsis_markers")]
    pub ellipsis_markers: Vec<String>,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            nav_keywords: Vec::new(),
            next_keywords: Vec::new(),
            author_note_markers: Vec::new(),
            content_warning_markers: Vec::new(),
            ellipsis_markers: default_ellipsis_markers(),
        }
    }
}

fn default_ellipsis_markers() -> Vec<String> {
    vec!["â€¦".into(), "…".into()]
}

/// `[[overrides]]` entry: exceptions for one chapter index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// Chapter index the entry applies to.
    pub chapter: u32,
    #[serde(flatten)]
    pub entry: ChapterOverride,
}

impl AppConfig {
    /// Build the override table, rejecting duplicate chapter entries.
    pub fn override_table(&self) -> Result<OverrideTable> {
        let mut table = OverrideTable::new();
        for record in &self.overrides {
            if record.chapter == 0 {
                return Err(SerialNormError::config(
                    "override chapter indices start at 1",
                ));
            }
            if table.insert(record.chapter, record.entry.clone()).is_some() {
                return Err(SerialNormError::config(format!(
                    "duplicate override for chapter {}",
                    record.chapter
                )));
            }
        }
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Normalize settings (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime normalization settings derived from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeSettings {
    /// Last chapter index of the dash-divider era.
    pub era_threshold: u32,
    /// Chapter indices without a title unless overridden.
    pub untitled: Vec<u32>,
    /// Leading blocks searched for a title.
    pub title_search_blocks: usize,
    /// Word count that ends the title search.
    pub substantial_words: usize,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for NormalizeSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            era_threshold: config.defaults.era_threshold,
            untitled: config.defaults.untitled.clone(),
            title_search_blocks: config.defaults.title_search_blocks,
            substantial_words: config.defaults.substantial_words,
        }
    }
}

impl NormalizeSettings {
    /// Whether the index carries no title unless an override says otherwise.
    pub fn is_untitled(&self, chapter_index: u32) -> bool {
        self.untitled.contains(&chapter_index)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.serialnorm/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SerialNormError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.serialnorm/serialnorm.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SerialNormError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        SerialNormError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SerialNormError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SerialNormError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SerialNormError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check value ranges that serde cannot express.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.defaults.workers == 0 {
        return Err(SerialNormError::config("defaults.workers must be at least 1"));
    }
    if config.defaults.title_search_blocks == 0 {
        return Err(SerialNormError::config(
            "defaults.title_search_blocks must be at least 1",
        ));
    }
    if config.patterns.ellipsis_markers.iter().any(|m| m.trim().is_empty()) {
        return Err(SerialNormError::config(
            "patterns.ellipsis_markers must not contain blank entries",
        ));
    }
    config.override_table().map(|_| ())
}
