//! Scene-break normalization.
//!
//! Up to the era threshold chapters used dash runs (often mangled by
//! reddit's backslash escapes); after it, a mis-encoded ellipsis literal.

use serialnorm_shared::Era;
use tracing::{debug, instrument};

use crate::block::Block;
use crate::patterns::{CANONICAL_DIVIDER, DividerStyle, PatternLibrary};
use crate::report::{Action, ProcessingReport, Warning};

/// Rewrite divider candidates to their canonical form and drop dividers
/// with no story on one side, or directly repeating another divider.
#[instrument(skip_all, fields(%era))]
pub(crate) fn normalize(
    blocks: &mut Vec<Block>,
    era: Era,
    patterns: &PatternLibrary,
    report: &mut ProcessingReport,
) {
    let mut rewritten = 0;
    for block in blocks.iter_mut() {
        let Block::DividerCandidate(text) = block else {
            continue;
        };
        match patterns.divider_style(text, era) {
            Some(DividerStyle::Dash) => {
                if era == Era::Post40 {
                    report.warn(Warning::AmbiguousDivider { text: text.clone() });
                }
                if *text != CANONICAL_DIVIDER {
                    debug!(raw = %text, "normalized divider");
                    *text = CANONICAL_DIVIDER.to_string();
                    rewritten += 1;
                }
            }
            Some(DividerStyle::Ellipsis) | None => {}
        }
    }
    if rewritten > 0 {
        report.record(Action::NormalizedDivider { count: rewritten });
    }

    let dropped = drop_stray_dividers(blocks);
    if dropped > 0 {
        debug!(dropped, "dropped stray dividers");
        report.record(Action::DroppedDivider { count: dropped });
    }
}

/// Leading, trailing, and back-to-back dividers are left over from removed
/// boilerplate.
fn drop_stray_dividers(blocks: &mut Vec<Block>) -> usize {
    let Some(first_content) = blocks.iter().position(Block::is_content) else {
        let before = blocks.len();
        blocks.retain(|b| !b.is_divider());
        return before - blocks.len();
    };
    let last_content = blocks
        .iter()
        .rposition(Block::is_content)
        .unwrap_or(first_content);

    let before = blocks.len();
    let mut previous_divider = false;
    let kept: Vec<Block> = std::mem::take(blocks)
        .into_iter()
        .enumerate()
        .filter(|(i, block)| {
            if !block.is_divider() {
                previous_divider = false;
                return true;
            }
            let keep = *i > first_content && *i < last_content && !previous_divider;
            previous_divider = true;
            keep
        })
        .map(|(_, block)| block)
        .collect();
    *blocks = kept;
    before - blocks.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Block {
        Block::Paragraph(text.into())
    }

    fn divider(text: &str) -> Block {
        Block::DividerCandidate(text.into())
    }

    fn run(blocks: &mut Vec<Block>, era: Era) -> ProcessingReport {
        let mut report = ProcessingReport::new(1, era);
        normalize(blocks, era, &PatternLibrary::default(), &mut report);
        report
    }

    #[test]
    fn pre40_dashes_become_canonical() {
        let mut blocks = vec![para("A"), divider("\\--\\"), para("B"), divider("---"), para("C")];
        let report = run(&mut blocks, Era::Pre40);

        assert_eq!(
            blocks,
            vec![para("A"), divider("-----"), para("B"), divider("-----"), para("C")]
        );
        assert_eq!(report.actions, vec![Action::NormalizedDivider { count: 2 }]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn post40_ellipsis_untouched() {
        let mut blocks = vec![para("A"), divider("â€¦"), para("B")];
        let report = run(&mut blocks, Era::Post40);
        assert_eq!(blocks[1], divider("â€¦"));
        assert!(report.actions.is_empty());
    }

    #[test]
    fn post40_dash_is_normalized_and_warned() {
        let mut blocks = vec![para("A"), divider("\\-----"), para("B")];
        let report = run(&mut blocks, Era::Post40);
        assert_eq!(blocks[1], divider("-----"));
        assert_eq!(
            report.warnings,
            vec![Warning::AmbiguousDivider {
                text: "\\-----".into()
            }]
        );
    }

    #[test]
    fn stray_dividers_dropped() {
        let mut blocks = vec![
            divider("-----"),
            para("A"),
            divider("-----"),
            divider("--"),
            para("B"),
            divider("-----"),
        ];
        let report = run(&mut blocks, Era::Pre40);
        assert_eq!(blocks, vec![para("A"), divider("-----"), para("B")]);
        assert!(report.actions.contains(&Action::DroppedDivider { count: 3 }));
    }

    #[test]
    fn only_dividers_leaves_nothing() {
        let mut blocks = vec![divider("-----"), divider("-----")];
        run(&mut blocks, Era::Pre40);
        assert!(blocks.is_empty());
    }
}
