//! Split cleaned chapter text into the ordered block sequence.
//!
//! Paragraphs (blank-line-delimited) are the unit of classification.
//! Structural lines inside a paragraph (dividers, navigation lines, and
//! title lines near the top) are split into units of their own first.

use serialnorm_shared::{Era, NormalizeSettings};
use tracing::{debug, instrument};

use crate::block::{Block, HeadingCandidate};
use crate::patterns::PatternLibrary;

/// Classifies paragraphs of one chapter.
pub(crate) struct Segmenter<'a> {
    patterns: &'a PatternLibrary,
    settings: &'a NormalizeSettings,
    era: Era,
}

/// Running state of one segmentation pass.
#[derive(Debug)]
struct ScanState {
    /// Still inside the leading run of navigation blocks.
    header_run: bool,
    /// Content units seen so far.
    content_units: usize,
    /// Title candidates are still being looked for.
    window_open: bool,
    /// The previous unit was a bare notice marker (`**A/N**`).
    absorb_next: bool,
}

impl<'a> Segmenter<'a> {
    pub(crate) fn new(patterns: &'a PatternLibrary, settings: &'a NormalizeSettings, era: Era) -> Self {
        Self {
            patterns,
            settings,
            era,
        }
    }

    /// Produce the block sequence for cleaned text. Never drops content.
    #[instrument(skip_all, fields(era = %self.era))]
    pub(crate) fn segment(&self, text: &str) -> Vec<Block> {
        let mut state = ScanState {
            header_run: true,
            content_units: 0,
            window_open: true,
            absorb_next: false,
        };
        let mut blocks: Vec<Block> = Vec::new();

        let paragraphs = text
            .split("\n\n")
            .map(|p| p.trim_matches('\n'))
            .filter(|p| !p.trim().is_empty());

        for paragraph in paragraphs {
            for unit in self.split_units(paragraph, &state) {
                if state.absorb_next {
                    state.absorb_next = false;
                    if is_fully_emphasized(&unit) && !self.is_structural_unit(&unit) {
                        if let Some(Block::NoticeCandidate { text, .. }) = blocks.last_mut() {
                            text.push_str("\n\n");
                            text.push_str(&unit);
                            continue;
                        }
                    }
                }

                let block = self.classify(unit, &mut state);
                blocks.push(block);
            }
        }

        self.mark_footer(&mut blocks);
        debug!(blocks = blocks.len(), "segmented chapter");
        blocks
    }

    /// Split a paragraph around its structural lines.
    fn split_units(&self, paragraph: &str, state: &ScanState) -> Vec<String> {
        let lines: Vec<&str> = paragraph.lines().collect();
        if lines.len() < 2 || self.patterns.classify_notice(paragraph).is_some() {
            return vec![paragraph.to_string()];
        }

        let mut units = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for (i, line) in lines.iter().copied().enumerate() {
            if self.is_structural_line(line, i == 0, state) {
                if !current.is_empty() {
                    units.push(current.join("\n"));
                    current.clear();
                }
                units.push(line.to_string());
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            units.push(current.join("\n"));
        }
        units
    }

    /// Titles, dividers and navigation are never part of a notice body.
    fn is_structural_unit(&self, unit: &str) -> bool {
        self.patterns.parse_title(unit).is_some()
            || self.patterns.divider_style(unit, self.era).is_some()
            || self.patterns.is_nav_line(unit)
    }

    fn is_structural_line(&self, line: &str, first: bool, state: &ScanState) -> bool {
        if self.patterns.divider_style(line, self.era).is_some() || self.patterns.is_nav_line(line) {
            return true;
        }
        if !state.window_open {
            return false;
        }
        // Past the first line only explicitly marked titles are split off.
        self.patterns.parse_title(line).is_some_and(|m| {
            first || m.markers.heading_level.is_some() || m.markers.bold
        })
    }

    fn classify(&self, unit: String, state: &mut ScanState) -> Block {
        if state.header_run && self.patterns.is_nav_block(&unit) {
            return Block::HeaderLinkBlock(unit);
        }

        if !unit.contains('\n') && self.patterns.divider_style(&unit, self.era).is_some() {
            return Block::DividerCandidate(unit);
        }

        if let Some(kind) = self.patterns.classify_notice(&unit) {
            state.absorb_next = self.patterns.is_marker_only_notice(&unit);
            return Block::NoticeCandidate { kind, text: unit };
        }

        state.header_run = false;

        if state.window_open && !unit.contains('\n') {
            if let Some(m) = self.patterns.parse_title(&unit) {
                self.count_content(state, 0);
                return Block::HeadingCandidate(HeadingCandidate {
                    raw_text: unit,
                    detected_number: m.number,
                    label: m.label,
                    detected_title: m.title,
                    format_markers: m.markers,
                });
            }
        }

        self.count_content(state, unit.split_whitespace().count());
        Block::Paragraph(unit)
    }

    fn count_content(&self, state: &mut ScanState, words: usize) {
        state.content_units += 1;
        if state.content_units >= self.settings.title_search_blocks
            || words >= self.settings.substantial_words
        {
            state.window_open = false;
        }
    }

    /// Turn the trailing run of navigation paragraphs into footer candidates
    /// when any of them points at the next chapter.
    fn mark_footer(&self, blocks: &mut [Block]) {
        let mut run = Vec::new();
        let mut has_next = false;

        for (i, block) in blocks.iter().enumerate().rev() {
            match block {
                Block::NoticeCandidate { .. } => continue,
                Block::Paragraph(text) => {
                    let footer = self.patterns.is_footer_block(text);
                    if !footer && !self.patterns.is_nav_block(text) {
                        break;
                    }
                    has_next |= footer;
                    run.push(i);
                }
                _ => break,
            }
        }

        if !has_next {
            return;
        }
        for i in run {
            if let Block::Paragraph(text) = &mut blocks[i] {
                let text = std::mem::take(text);
                blocks[i] = Block::FooterLinkCandidate(text);
            }
        }
    }
}

/// Whole unit wrapped in bold or italic markers.
fn is_fully_emphasized(text: &str) -> bool {
    let text = text.trim();
    ["**", "__", "*", "_"]
        .into_iter()
        .any(|m| text.len() > 2 * m.len() && text.starts_with(m) && text.ends_with(m))
}
