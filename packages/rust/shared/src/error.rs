//! Error model.
//!
//! A [`SerialNormError`] either aborts a whole operation (config, corpus
//! layout, manifests) or, as [`SerialNormError::MalformedInput`], fails a
//! single chapter while the batch goes on. Title and divider problems are
//! never errors; they end up as report warnings. The CLI wraps errors with
//! `color-eyre`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SerialNormError {
    /// Config file unreadable as TOML, or values out of range.
    #[error("config error: {message}")]
    Config { message: String },

    /// A manifest file that does not deserialize.
    #[error("cannot parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Corpus layout or manifest contents that cannot be processed.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A normalization worker died or the pool shut down.
    #[error("worker error: {message}")]
    Worker { message: String },

    /// Raw text that cannot be a chapter: empty, or chapter index 0.
    #[error("malformed input for chapter {chapter_index}: {reason}")]
    MalformedInput { chapter_index: u32, reason: String },
}

pub type Result<T> = std::result::Result<T, SerialNormError>;

impl SerialNormError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn worker(message: impl std::fmt::Display) -> Self {
        Self::Worker {
            message: message.to_string(),
        }
    }

    pub fn malformed(chapter_index: u32, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            chapter_index,
            reason: reason.into(),
        }
    }
}
