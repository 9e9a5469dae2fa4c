//! Core domain types shared by the normalizer, the batch driver and the CLI.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for the processed manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Era
// ---------------------------------------------------------------------------

/// Divider convention period of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Era {
    /// Dash dividers, rewritten to the canonical `-----`.
    Pre40,
    /// Ellipsis dividers, passed through unchanged.
    Post40,
}

impl Era {
    /// Derive the era from the chapter index and the configured threshold.
    ///
    /// Indices up to and including `threshold` are [`Era::Pre40`].
    pub fn for_index(chapter_index: u32, threshold: u32) -> Self {
        if chapter_index <= threshold {
            Self::Pre40
        } else {
            Self::Post40
        }
    }
}

impl std::fmt::Display for Era {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pre40 => f.write_str("pre40"),
            Self::Post40 => f.write_str("post40"),
        }
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// A literal correction applied to detected or fallback title text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleReplacement {
    pub find: String,
    pub replace: String,
}

/// Known exception for a single chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterOverride {
    /// Title text placed after `Chapter N - `, replacing anything detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_title: Option<String>,
    /// `Some(true)` forces an untitled chapter, `Some(false)` lifts a
    /// default-untitled index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untitled: Option<bool>,
    /// Forces the divider convention regardless of the index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<Era>,
    /// Typo fixes for the detected or fallback title text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace: Vec<TitleReplacement>,
}

impl ChapterOverride {
    /// Apply the configured replacements. Returns `None` when nothing changed.
    pub fn correct(&self, title: &str) -> Option<String> {
        let mut corrected = title.to_string();
        for fix in &self.replace {
            if !fix.find.is_empty() {
                corrected = corrected.replace(&fix.find, &fix.replace);
            }
        }
        (corrected != title).then_some(corrected)
    }
}

/// Chapter exceptions keyed by chapter index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideTable(BTreeMap<u32, ChapterOverride>);

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the previous one for that index.
    pub fn insert(&mut self, chapter_index: u32, entry: ChapterOverride) -> Option<ChapterOverride> {
        self.0.insert(chapter_index, entry)
    }

    pub fn get(&self, chapter_index: u32) -> Option<&ChapterOverride> {
        self.0.get(&chapter_index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(u32, ChapterOverride)> for OverrideTable {
    fn from_iter<I: IntoIterator<Item = (u32, ChapterOverride)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// ChapterInput
// ---------------------------------------------------------------------------

/// One raw chapter as handed to the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterInput {
    /// Unstructured post body.
    pub raw_text: String,
    /// Externally assigned, positive, unique position in the serial.
    pub chapter_index: u32,
    /// Title of the originating post.
    pub fallback_title: Option<String>,
    /// Exception record for this chapter. Takes precedence over the
    /// normalizer's own override table.
    pub overrides: Option<ChapterOverride>,
}

impl ChapterInput {
    pub fn new(raw_text: impl Into<String>, chapter_index: u32) -> Self {
        Self {
            raw_text: raw_text.into(),
            chapter_index,
            fallback_title: None,
            overrides: None,
        }
    }

    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = Some(title.into());
        self
    }

    pub fn with_override(mut self, entry: ChapterOverride) -> Self {
        self.overrides = Some(entry);
        self
    }
}

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 identifying one batch run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Raw corpus manifest
// ---------------------------------------------------------------------------

/// `manifest.json` at the root of a raw corpus directory, written by the
/// downloader that scraped the posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawManifest {
    /// Series name (wiki section the chapters were listed under).
    pub series: String,
    /// Raw chapters, in any order.
    pub chapters: Vec<RawChapterEntry>,
}

/// A single downloaded post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChapterEntry {
    /// Position in the serial.
    pub index: u32,
    /// File name relative to the corpus directory.
    pub filename: String,
    /// Title of the originating post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Post URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Unix seconds of the last revision (post or author reply chain).
    pub revision_date: i64,
}

impl RawChapterEntry {
    /// Revision date as a UTC timestamp.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.revision_date, 0)
    }
}

// ---------------------------------------------------------------------------
// Processed manifest
// ---------------------------------------------------------------------------

/// `processed.json` written next to the normalized chapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedManifest {
    pub schema_version: u32,
    /// Run that last wrote this manifest.
    pub run_id: RunId,
    pub series: String,
    pub processed_at: DateTime<Utc>,
    pub chapters: Vec<ProcessedChapterEntry>,
}

/// A normalized chapter on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedChapterEntry {
    pub index: u32,
    /// Output file name relative to the output directory.
    pub filename: String,
    /// Raw file this chapter was produced from.
    pub source_filename: String,
    /// Resolved title heading text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub revision_date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    /// SHA-256 of the raw text the chapter was produced from.
    pub content_hash: String,
    /// Set when the title could not be resolved.
    #[serde(default)]
    pub needs_review: bool,
    /// Human-readable report warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
