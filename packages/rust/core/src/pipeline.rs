//! Batch `run` pipeline: raw corpus → diff → normalize → normalized corpus.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use serialnorm_normalize::{NormalizedChapter, Normalizer};
use serialnorm_shared::{
    AppConfig, CURRENT_SCHEMA_VERSION, ChapterInput, ProcessedChapterEntry, ProcessedManifest,
    Result, RunId, SerialNormError,
};

use crate::corpus::{ChapterSink, ChapterSource, SourceChapter, output_filename};
use crate::update::{ChapterDiff, diff_chapters, previous_chapters};

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Rule set shared by all workers.
    pub normalizer: Arc<Normalizer>,
    /// Chapters normalized concurrently.
    pub workers: usize,
    /// Re-normalize chapters even when their raw text is unchanged.
    pub force: bool,
    /// Delete outputs of chapters no longer in the raw corpus.
    pub prune: bool,
}

impl BatchConfig {
    /// Build from the app config; `force` and `prune` start off.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            normalizer: Arc::new(Normalizer::from_config(config)?),
            workers: config.defaults.workers,
            force: false,
            prune: false,
        })
    }
}

/// A chapter that could not be read or normalized.
#[derive(Debug, Clone)]
pub struct ChapterFailure {
    pub index: u32,
    pub source_filename: String,
    pub error: String,
}

/// Result of a batch run.
#[derive(Debug)]
pub struct BatchResult {
    pub run_id: RunId,
    pub series: String,
    /// Chapters normalized and written this run.
    pub written: usize,
    /// Chapters skipped because nothing changed.
    pub unchanged: usize,
    /// Outputs deleted by `prune`.
    pub removed: usize,
    /// Per-chapter failures; the rest of the run went ahead.
    pub failures: Vec<ChapterFailure>,
    /// Chapters written without a resolvable title.
    pub needs_review: Vec<u32>,
    /// Report warnings across written chapters.
    pub warnings: usize,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a chapter finished, successfully or not.
    fn chapter_done(&self, index: u32, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, result: &BatchResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn chapter_done(&self, _index: u32, _current: usize, _total: usize) {}
    fn done(&self, _result: &BatchResult) {}
}

/// Run the batch pipeline.
///
/// 1. Read the raw manifest and every chapter's raw text
/// 2. Diff against the previous run's `processed.json`
/// 3. Normalize new and changed chapters on the worker pool
/// 4. Write chapters, prune removed ones, write `processed.json`
#[instrument(skip_all, fields(workers = config.workers, force = config.force))]
pub async fn run_batch(
    config: &BatchConfig,
    source: &dyn ChapterSource,
    sink: &dyn ChapterSink,
    progress: &dyn ProgressReporter,
) -> Result<BatchResult> {
    let start = Instant::now();
    let run_id = RunId::new();

    // --- Phase 1: Read raw corpus ---
    progress.phase("Reading raw corpus");
    let manifest = source.manifest()?;
    info!(%run_id, series = %manifest.series, chapters = manifest.chapters.len(), "starting run");

    let mut failures: Vec<ChapterFailure> = Vec::new();
    let mut chapters: Vec<SourceChapter> = Vec::with_capacity(manifest.chapters.len());
    for entry in &manifest.chapters {
        match source.read_chapter(entry) {
            Ok(text) => chapters.push(SourceChapter::new(entry.clone(), text)),
            Err(e) => {
                warn!(index = entry.index, error = %e, "cannot read raw chapter, skipping");
                failures.push(ChapterFailure {
                    index: entry.index,
                    source_filename: entry.filename.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    chapters.sort_by_key(|c| c.entry.index);

    // --- Phase 2: Diff against previous run ---
    progress.phase("Comparing with previous run");
    let previous = match sink.load_manifest() {
        Ok(previous) => previous,
        Err(e) => {
            warn!(error = %e, "previous run manifest unreadable, running full normalization");
            None
        }
    };
    let previous_entries = previous_chapters(previous.as_ref(), &manifest);
    let mut diff = diff_chapters(previous_entries, &manifest, &chapters, config.force);
    requeue_missing_outputs(&mut diff, previous_entries, sink);

    info!(
        new = diff.new_chapters.len(),
        changed = diff.changed_chapters.len(),
        unchanged = diff.unchanged_chapters.len(),
        removed = diff.removed_chapters.len(),
        "chapter diff computed"
    );

    // --- Phase 3: Normalize ---
    progress.phase("Normalizing chapters");
    let to_process = diff.to_process();
    let by_index: HashMap<u32, &SourceChapter> =
        chapters.iter().map(|c| (c.entry.index, c)).collect();
    let jobs: Vec<&SourceChapter> = to_process
        .iter()
        .filter_map(|i| by_index.get(i).copied())
        .collect();

    let results = normalize_all(config, &jobs).await;

    // --- Phase 4: Write outputs ---
    progress.phase("Writing normalized chapters");
    let mut entries: BTreeMap<u32, ProcessedChapterEntry> = previous_entries
        .iter()
        .map(|e| (e.index, e.clone()))
        .collect();

    let total = jobs.len();
    let mut written = 0;
    let mut warnings = 0;
    let mut needs_review = Vec::new();

    for (i, (chapter, result)) in jobs.iter().zip(results).enumerate() {
        let index = chapter.entry.index;
        let outcome = result.and_then(|normalized| {
            let filename = output_filename(index);
            sink.write_chapter(&filename, &normalized.text)?;
            Ok(processed_entry(chapter, filename, &normalized))
        });

        match outcome {
            Ok(entry) => {
                written += 1;
                warnings += entry.warnings.len();
                if entry.needs_review {
                    needs_review.push(index);
                }
                entries.insert(index, entry);
            }
            Err(e) => {
                warn!(index, error = %e, "chapter failed, continuing");
                failures.push(ChapterFailure {
                    index,
                    source_filename: chapter.entry.filename.clone(),
                    error: e.to_string(),
                });
            }
        }
        progress.chapter_done(index, i + 1, total);
    }

    // --- Phase 5: Prune ---
    let mut removed = 0;
    if config.prune {
        progress.phase("Pruning removed chapters");
        for index in &diff.removed_chapters {
            if let Some(entry) = entries.remove(index) {
                sink.remove_chapter(&entry.filename)?;
                removed += 1;
            }
        }
    }

    // --- Phase 6: Manifest ---
    progress.phase("Writing processed manifest");
    let processed = ProcessedManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        run_id: run_id.clone(),
        series: manifest.series.clone(),
        processed_at: Utc::now(),
        chapters: entries.into_values().collect(),
    };
    sink.write_manifest(&processed)?;

    failures.sort_by_key(|f| f.index);
    let result = BatchResult {
        run_id,
        series: manifest.series,
        written,
        unchanged: diff.unchanged_chapters.len(),
        removed,
        failures,
        needs_review,
        warnings,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        run_id = %result.run_id,
        written = result.written,
        unchanged = result.unchanged,
        removed = result.removed,
        failed = result.failures.len(),
        needs_review = result.needs_review.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "run complete"
    );

    Ok(result)
}

/// Normalize chapters on a bounded pool of blocking workers. Results come
/// back in job order.
async fn normalize_all(
    config: &BatchConfig,
    jobs: &[&SourceChapter],
) -> Vec<Result<NormalizedChapter>> {
    let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));
    let mut handles = Vec::with_capacity(jobs.len());

    for chapter in jobs {
        let sem = semaphore.clone();
        let normalizer = Arc::clone(&config.normalizer);
        let mut input = ChapterInput::new(chapter.raw_text.clone(), chapter.entry.index);
        input.fallback_title = chapter.entry.title.clone();

        handles.push(tokio::spawn(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(SerialNormError::worker)?;
            tokio::task::spawn_blocking(move || normalizer.normalize(&input))
                .await
                .map_err(SerialNormError::worker)?
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(match handle.await {
            Ok(result) => result,
            Err(e) => Err(SerialNormError::worker(e)),
        });
    }
    results
}

/// Unchanged chapters whose output file went missing are written again.
fn requeue_missing_outputs(
    diff: &mut ChapterDiff,
    previous: &[ProcessedChapterEntry],
    sink: &dyn ChapterSink,
) {
    let filenames: HashMap<u32, &str> = previous
        .iter()
        .map(|e| (e.index, e.filename.as_str()))
        .collect();

    let (missing, present): (Vec<u32>, Vec<u32>) = diff
        .unchanged_chapters
        .iter()
        .partition(|i| filenames.get(*i).is_some_and(|f| !sink.has_chapter(f)));

    if !missing.is_empty() {
        warn!(count = missing.len(), "outputs missing for unchanged chapters, rewriting");
        diff.changed_chapters.extend(missing);
        diff.changed_chapters.sort_unstable();
    }
    diff.unchanged_chapters = present;
}

fn processed_entry(
    chapter: &SourceChapter,
    filename: String,
    normalized: &NormalizedChapter,
) -> ProcessedChapterEntry {
    ProcessedChapterEntry {
        index: chapter.entry.index,
        filename,
        source_filename: chapter.entry.filename.clone(),
        title: normalized.title.as_ref().map(|t| t.heading.clone()),
        revision_date: chapter.entry.revision_date,
        published: chapter.entry.published(),
        content_hash: chapter.content_hash.clone(),
        needs_review: normalized.report.needs_review(),
        warnings: normalized
            .report
            .warnings
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
