//! Final assembly and serialization of a normalized chapter.

use serde::Serialize;
use serialnorm_shared::Era;

use crate::block::{Block, OutputBlock};
use crate::report::ProcessingReport;
use crate::title::ResolvedTitle;

/// One chapter after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedChapter {
    pub chapter_index: u32,
    pub era: Era,
    pub title: Option<ResolvedTitle>,
    pub blocks: Vec<OutputBlock>,
    /// Serialized Markdown, blocks separated by one blank line, no trailing
    /// newline.
    pub text: String,
    pub report: ProcessingReport,
}

/// Place the title first, keep the surviving blocks in order, and render.
pub(crate) fn assemble(
    title: Option<ResolvedTitle>,
    blocks: Vec<Block>,
    report: ProcessingReport,
) -> NormalizedChapter {
    let mut output: Vec<OutputBlock> = Vec::with_capacity(blocks.len() + 1);

    if let Some(title) = &title {
        output.push(OutputBlock::Heading(title.heading.clone()));
    }

    output.extend(blocks.into_iter().filter_map(|block| match block {
        Block::Paragraph(text) => Some(OutputBlock::Paragraph(demote_heading(text))),
        Block::HeadingCandidate(candidate) => {
            Some(OutputBlock::Paragraph(demote_heading(candidate.raw_text)))
        }
        Block::DividerCandidate(text) => Some(OutputBlock::Divider(text)),
        Block::NoticeCandidate { .. } | Block::FooterLinkCandidate(_) | Block::HeaderLinkBlock(_) => {
            None
        }
    }));

    let text = output
        .iter()
        .map(OutputBlock::render)
        .collect::<Vec<_>>()
        .join("\n\n");

    NormalizedChapter {
        chapter_index: report.chapter_index,
        era: report.era,
        title,
        blocks: output,
        text,
        report,
    }
}

/// Only the resolved title may be a top-level heading.
fn demote_heading(text: String) -> String {
    if text.starts_with("# ") {
        format!("#{text}")
    } else {
        text
    }
}
