//! Incremental re-runs.
//!
//! Compares the raw corpus against the previous run's `processed.json` so
//! only new or changed chapters are normalized again.

use std::collections::{HashMap, HashSet};

use serialnorm_shared::{ProcessedChapterEntry, ProcessedManifest, RawManifest};
use tracing::info;

use crate::corpus::SourceChapter;

/// Chapter indices grouped by change status.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChapterDiff {
    /// Not in the previous run.
    pub new_chapters: Vec<u32>,
    /// Newer revision date or different raw content.
    pub changed_chapters: Vec<u32>,
    pub unchanged_chapters: Vec<u32>,
    /// In the previous run but gone from the raw corpus.
    pub removed_chapters: Vec<u32>,
}

impl ChapterDiff {
    /// Indices that need normalizing, ascending.
    pub fn to_process(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self
            .new_chapters
            .iter()
            .chain(&self.changed_chapters)
            .copied()
            .collect();
        indices.sort_unstable();
        indices
    }
}

/// Compute the diff between the previous run and the current raw chapters.
///
/// `current` holds the chapters that could be read; a chapter still listed
/// in `raw` but not readable is neither processed nor removed. With
/// `force`, every chapter that was processed before counts as changed.
pub fn diff_chapters(
    previous: &[ProcessedChapterEntry],
    raw: &RawManifest,
    current: &[SourceChapter],
    force: bool,
) -> ChapterDiff {
    let previous_by_index: HashMap<u32, &ProcessedChapterEntry> =
        previous.iter().map(|e| (e.index, e)).collect();
    let listed: HashSet<u32> = raw.chapters.iter().map(|e| e.index).collect();

    let mut diff = ChapterDiff::default();

    for chapter in current {
        let index = chapter.entry.index;
        match previous_by_index.get(&index) {
            Some(old)
                if !force
                    && old.content_hash == chapter.content_hash
                    && old.revision_date >= chapter.entry.revision_date =>
            {
                diff.unchanged_chapters.push(index);
            }
            Some(_) => diff.changed_chapters.push(index),
            None => diff.new_chapters.push(index),
        }
    }

    for old in previous {
        if !listed.contains(&old.index) {
            diff.removed_chapters.push(old.index);
        }
    }

    for list in [
        &mut diff.new_chapters,
        &mut diff.changed_chapters,
        &mut diff.unchanged_chapters,
        &mut diff.removed_chapters,
    ] {
        list.sort_unstable();
    }
    diff
}

/// The previous run's chapters, unless the previous run was for another
/// series (then everything is processed again).
pub fn previous_chapters<'a>(
    previous: Option<&'a ProcessedManifest>,
    raw: &RawManifest,
) -> &'a [ProcessedChapterEntry] {
    match previous {
        Some(manifest) if manifest.series == raw.series => &manifest.chapters,
        Some(manifest) => {
            info!(
                previous = %manifest.series,
                current = %raw.series,
                "series changed, running full normalization"
            );
            &[]
        }
        None => &[],
    }
}
