//! Corpus-level orchestration for serialnorm.
//!
//! Reads a raw corpus, decides which chapters need normalizing since the
//! last run, normalizes them on a worker pool and writes the normalized
//! corpus with its `processed.json` manifest (see [`pipeline::run_batch`]).

pub mod corpus;
pub mod pipeline;
pub mod update;

pub use corpus::{ChapterSink, ChapterSource, DirectorySink, DirectorySource, SourceChapter};
pub use pipeline::{BatchConfig, BatchResult, ChapterFailure, ProgressReporter, SilentProgress, run_batch};
pub use update::{ChapterDiff, diff_chapters};
