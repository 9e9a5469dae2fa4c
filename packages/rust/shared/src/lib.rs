//! Shared types, error model, and configuration for serialnorm.
//!
//! This crate is the foundation depended on by all other serialnorm crates.
//! It provides:
//! - [`SerialNormError`], the unified error type
//! - Domain types ([`ChapterInput`], [`Era`], [`OverrideTable`], manifests)
//! - Configuration ([`AppConfig`], [`NormalizeSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, NormalizeSettings, OverrideRecord, PatternsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{Result, SerialNormError};
pub use types::{
    CURRENT_SCHEMA_VERSION, ChapterInput, ChapterOverride, Era, OverrideTable,
    ProcessedChapterEntry, ProcessedManifest, RawChapterEntry, RawManifest, RunId,
    TitleReplacement,
};
