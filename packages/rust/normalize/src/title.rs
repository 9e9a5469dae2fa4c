//! Title resolution.
//!
//! Picks at most one title for the chapter, in priority order:
//! override, detected heading, fallback post title, none.

use serde::{Deserialize, Serialize};
use serialnorm_shared::{ChapterOverride, NormalizeSettings};
use tracing::{debug, instrument};

use crate::block::{Block, HeadingCandidate};
use crate::patterns::PatternLibrary;
use crate::report::{Action, ProcessingReport, TitleSource, Warning};

/// The title a chapter ends up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTitle {
    /// Chapter number the title names, when it names one.
    pub number: Option<u32>,
    /// Heading text without the leading `# `.
    pub heading: String,
    pub source: TitleSource,
}

/// Inputs the resolver needs besides the blocks.
pub(crate) struct TitleContext<'a> {
    pub chapter_index: u32,
    pub fallback_title: Option<&'a str>,
    pub overrides: Option<&'a ChapterOverride>,
    pub settings: &'a NormalizeSettings,
    pub patterns: &'a PatternLibrary,
}

impl TitleContext<'_> {
    fn is_untitled(&self) -> bool {
        match self.overrides {
            Some(o) if o.untitled == Some(true) => true,
            Some(o) if o.untitled == Some(false) || o.forced_title.is_some() => false,
            _ => self.settings.is_untitled(self.chapter_index),
        }
    }
}

/// Resolve the title and take its heading candidates out of the sequence.
///
/// The candidate that supplied the title and any others naming the same
/// chapter number are removed; remaining candidates become paragraphs.
#[instrument(skip_all, fields(chapter = ctx.chapter_index))]
pub(crate) fn resolve(
    blocks: &mut Vec<Block>,
    ctx: &TitleContext<'_>,
    report: &mut ProcessingReport,
) -> Option<ResolvedTitle> {
    if ctx.is_untitled() {
        let removed = drop_chapter_headings(blocks);
        if removed > 0 {
            report.record(Action::RemovedDuplicateHeading { count: removed });
        }
        report.record(Action::ResolvedTitle {
            source: TitleSource::None,
        });
        debug!(removed, "untitled chapter");
        return None;
    }

    let picked = pick_candidate(blocks, ctx.chapter_index);
    let picked_number = picked.and_then(|i| candidate_at(blocks, i)?.detected_number);

    let resolved = if let Some(forced) = ctx.overrides.and_then(|o| o.forced_title.as_deref()) {
        Some(ResolvedTitle {
            number: Some(ctx.chapter_index),
            heading: format!("Chapter {} - {}", ctx.chapter_index, forced.trim()),
            source: TitleSource::Override,
        })
    } else if let Some(candidate) = picked.and_then(|i| candidate_at(blocks, i)) {
        Some(from_candidate(candidate, ctx, report))
    } else {
        from_fallback(ctx)
    };

    let duplicates = demote_candidates(blocks, picked, picked_number);
    if duplicates > 0 {
        report.record(Action::RemovedDuplicateHeading { count: duplicates });
    }

    match &resolved {
        Some(title) => {
            debug!(heading = %title.heading, source = ?title.source, "resolved title");
            report.record(Action::ResolvedTitle {
                source: title.source,
            });
        }
        None => {
            report.record(Action::ResolvedTitle {
                source: TitleSource::None,
            });
            report.warn(Warning::UnresolvableTitle);
        }
    }
    resolved
}

/// Prefer the candidate naming this chapter, then any numbered one, then
/// the first.
fn pick_candidate(blocks: &[Block], chapter_index: u32) -> Option<usize> {
    let candidates: Vec<(usize, &HeadingCandidate)> = blocks
        .iter()
        .enumerate()
        .filter_map(|(i, b)| match b {
            Block::HeadingCandidate(c) => Some((i, c)),
            _ => None,
        })
        .collect();

    candidates
        .iter()
        .find(|(_, c)| c.detected_number == Some(chapter_index))
        .or_else(|| candidates.iter().find(|(_, c)| c.detected_number.is_some()))
        .or_else(|| candidates.first())
        .map(|(i, _)| *i)
}

fn candidate_at(blocks: &[Block], index: usize) -> Option<&HeadingCandidate> {
    match blocks.get(index) {
        Some(Block::HeadingCandidate(c)) => Some(c),
        _ => None,
    }
}

fn from_candidate(
    candidate: &HeadingCandidate,
    ctx: &TitleContext<'_>,
    report: &mut ProcessingReport,
) -> ResolvedTitle {
    if candidate.is_unparseable() {
        report.warn(Warning::UnparseableTitle {
            text: candidate.raw_text.trim().to_string(),
        });
    }
    if let Some(detected) = candidate.detected_number {
        if detected != ctx.chapter_index {
            report.warn(Warning::NumberMismatch {
                detected,
                expected: ctx.chapter_index,
            });
        }
    }

    let heading = candidate.heading_text();
    match ctx.overrides.and_then(|o| o.correct(&heading)) {
        Some(corrected) => ResolvedTitle {
            number: candidate.detected_number,
            heading: corrected,
            source: TitleSource::Override,
        },
        None => ResolvedTitle {
            number: candidate.detected_number,
            heading,
            source: TitleSource::Detected,
        },
    }
}

/// The post title, in the same canonical form a detected heading gets.
fn from_fallback(ctx: &TitleContext<'_>) -> Option<ResolvedTitle> {
    let fallback = ctx.fallback_title.map(str::trim).filter(|t| !t.is_empty())?;

    let (number, heading) = match ctx.patterns.parse_title(&format!("# {fallback}")) {
        Some(m) => {
            let candidate = HeadingCandidate {
                raw_text: fallback.to_string(),
                detected_number: m.number,
                label: m.label,
                detected_title: m.title,
                format_markers: m.markers,
            };
            (candidate.detected_number, candidate.heading_text())
        }
        None => (None, fallback.to_string()),
    };

    let heading = ctx
        .overrides
        .and_then(|o| o.correct(&heading))
        .unwrap_or(heading);
    Some(ResolvedTitle {
        number,
        heading,
        source: TitleSource::Fallback,
    })
}

/// Untitled chapters keep no `Chapter N` heading; plain headings stay as
/// paragraphs. Returns the number removed.
fn drop_chapter_headings(blocks: &mut Vec<Block>) -> usize {
    let before = blocks.len();
    blocks.retain(|b| !matches!(b, Block::HeadingCandidate(c) if c.has_chapter_label()));
    let removed = before - blocks.len();

    for block in blocks.iter_mut() {
        if let Block::HeadingCandidate(c) = block {
            let raw = std::mem::take(&mut c.raw_text);
            *block = Block::Paragraph(raw);
        }
    }
    removed
}

/// Remove the picked candidate and same-numbered duplicates, demote the
/// rest to paragraphs. Returns the number of duplicates removed.
fn demote_candidates(blocks: &mut Vec<Block>, picked: Option<usize>, number: Option<u32>) -> usize {
    let mut duplicates = 0;
    let kept: Vec<Block> = std::mem::take(blocks)
        .into_iter()
        .enumerate()
        .filter_map(|(i, block)| match block {
            Block::HeadingCandidate(_) if Some(i) == picked => None,
            Block::HeadingCandidate(c) if number.is_some() && c.detected_number == number => {
                debug!(raw = %c.raw_text, "removed duplicate heading");
                duplicates += 1;
                None
            }
            Block::HeadingCandidate(c) => Some(Block::Paragraph(c.raw_text)),
            other => Some(other),
        })
        .collect();
    *blocks = kept;
    duplicates
}
