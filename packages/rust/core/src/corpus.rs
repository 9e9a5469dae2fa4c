//! Raw corpus input and normalized corpus output.
//!
//! A raw corpus is a directory with `manifest.json` (see [`RawManifest`])
//! and one Markdown file per downloaded post. The normalized corpus is a
//! directory of `<index:04>.md` files plus `processed.json`.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use serialnorm_shared::{ProcessedManifest, RawChapterEntry, RawManifest, Result, SerialNormError};

/// Raw manifest file name inside a raw corpus directory.
pub const RAW_MANIFEST_FILE: &str = "manifest.json";

/// Processed manifest file name inside an output directory.
pub const PROCESSED_MANIFEST_FILE: &str = "processed.json";

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Where raw chapters come from.
pub trait ChapterSource: Send + Sync {
    /// Read and validate the chapter listing.
    fn manifest(&self) -> Result<RawManifest>;
    /// Read one chapter's raw text.
    fn read_chapter(&self, entry: &RawChapterEntry) -> Result<String>;
}

/// Where normalized chapters go.
pub trait ChapterSink: Send + Sync {
    /// The manifest of the previous run, if there was one.
    fn load_manifest(&self) -> Result<Option<ProcessedManifest>>;
    fn write_chapter(&self, filename: &str, text: &str) -> Result<()>;
    fn has_chapter(&self, filename: &str) -> bool;
    fn remove_chapter(&self, filename: &str) -> Result<()>;
    fn write_manifest(&self, manifest: &ProcessedManifest) -> Result<()>;
}

/// A raw chapter read from a source, with the hash of its text.
#[derive(Debug, Clone)]
pub struct SourceChapter {
    pub entry: RawChapterEntry,
    pub raw_text: String,
    pub content_hash: String,
}

impl SourceChapter {
    pub fn new(entry: RawChapterEntry, raw_text: String) -> Self {
        let content_hash = content_hash(&raw_text);
        Self {
            entry,
            raw_text,
            content_hash,
        }
    }
}

/// Output file name for a chapter index.
pub fn output_filename(index: u32) -> String {
    format!("{index:04}.md")
}

/// SHA-256 hex digest of raw chapter text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check manifest consistency that serde cannot express.
pub fn validate_manifest(manifest: &RawManifest) -> Result<()> {
    let mut seen = HashSet::new();
    for entry in &manifest.chapters {
        if entry.index == 0 {
            return Err(SerialNormError::validation(format!(
                "{RAW_MANIFEST_FILE}: chapter indices start at 1 ({})",
                entry.filename
            )));
        }
        if !seen.insert(entry.index) {
            return Err(SerialNormError::validation(format!(
                "{RAW_MANIFEST_FILE}: duplicate chapter index {}",
                entry.index
            )));
        }
        if !is_plain_relative(&entry.filename) {
            return Err(SerialNormError::validation(format!(
                "{RAW_MANIFEST_FILE}: chapter file {:?} must be a relative path inside the corpus",
                entry.filename
            )));
        }
    }
    Ok(())
}

fn is_plain_relative(filename: &str) -> bool {
    let path = Path::new(filename);
    !filename.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

// ---------------------------------------------------------------------------
// Directory source
// ---------------------------------------------------------------------------

/// Raw corpus stored in a local directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SerialNormError::validation(format!(
                "raw corpus directory not found: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ChapterSource for DirectorySource {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn manifest(&self) -> Result<RawManifest> {
        let path = self.root.join(RAW_MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| SerialNormError::io(&path, e))?;
        let manifest: RawManifest = serde_json::from_str(&content)
            .map_err(|e| SerialNormError::parse(&path, e))?;
        validate_manifest(&manifest)?;
        debug!(chapters = manifest.chapters.len(), series = %manifest.series, "read raw manifest");
        Ok(manifest)
    }

    fn read_chapter(&self, entry: &RawChapterEntry) -> Result<String> {
        let path = self.root.join(&entry.filename);
        std::fs::read_to_string(&path).map_err(|e| SerialNormError::io(&path, e))
    }
}

// ---------------------------------------------------------------------------
// Directory sink
// ---------------------------------------------------------------------------

/// Normalized corpus written to a local directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Use `root` as the output directory, creating it if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| SerialNormError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ChapterSink for DirectorySink {
    fn load_manifest(&self) -> Result<Option<ProcessedManifest>> {
        let path = self.root.join(PROCESSED_MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| SerialNormError::io(&path, e))?;
        let manifest =
            serde_json::from_str(&content).map_err(|e| SerialNormError::parse(&path, e))?;
        Ok(Some(manifest))
    }

    /// Written with a trailing newline.
    fn write_chapter(&self, filename: &str, text: &str) -> Result<()> {
        let mut content = String::with_capacity(text.len() + 1);
        content.push_str(text);
        content.push('\n');
        write_atomic(&self.root, filename, &content)
    }

    fn has_chapter(&self, filename: &str) -> bool {
        self.root.join(filename).is_file()
    }

    fn remove_chapter(&self, filename: &str) -> Result<()> {
        let path = self.root.join(filename);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed chapter");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SerialNormError::io(&path, e)),
        }
    }

    fn write_manifest(&self, manifest: &ProcessedManifest) -> Result<()> {
        let json = serde_json::to_string_pretty(manifest).map_err(|e| {
            SerialNormError::validation(format!("JSON serialization failed: {e}"))
        })?;
        write_atomic(&self.root, PROCESSED_MANIFEST_FILE, &json)
    }
}

/// Write to a temp file next to the target, then rename over it.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> Result<()> {
    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, content).map_err(|e| SerialNormError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| SerialNormError::io(&target, e))?;

    debug!(path = %target.display(), size = content.len(), "wrote file");
    Ok(())
}
