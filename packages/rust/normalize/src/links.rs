//! Header navigation and footer next-chapter link removal.

use tracing::debug;

use crate::block::Block;
use crate::report::{Action, ProcessingReport};

/// Remove the leading navigation run.
pub(crate) fn strip_header_links(blocks: &mut Vec<Block>, report: &mut ProcessingReport) {
    let before = blocks.len();
    blocks.retain(|b| !matches!(b, Block::HeaderLinkBlock(_)));

    let removed = before - blocks.len();
    if removed > 0 {
        debug!(removed, "stripped header links");
        report.record(Action::RemovedHeaderLinks { blocks: removed });
    }
}

/// Remove the trailing footer links and any dividers directly above them.
///
/// A chapter without a footer (next chapter not out yet) is left alone.
pub(crate) fn strip_footer(blocks: &mut Vec<Block>, report: &mut ProcessingReport) {
    let Some(first) = blocks
        .iter()
        .position(|b| matches!(b, Block::FooterLinkCandidate(_)))
    else {
        return;
    };

    let mut start = first;
    while start > 0 && blocks[start - 1].is_divider() {
        start -= 1;
    }

    let mut footer_blocks = 0;
    let mut dividers = 0;
    let kept: Vec<Block> = std::mem::take(blocks)
        .into_iter()
        .enumerate()
        .filter(|(i, block)| {
            if matches!(block, Block::FooterLinkCandidate(_)) {
                footer_blocks += 1;
                false
            } else if (start..first).contains(i) {
                dividers += 1;
                false
            } else {
                true
            }
        })
        .map(|(_, block)| block)
        .collect();
    *blocks = kept;

    debug!(footer_blocks, dividers, "stripped footer");
    report.record(Action::RemovedFooterLink {
        blocks: footer_blocks,
        dividers,
    });
}

#[cfg(test)]
mod tests {
    use serialnorm_shared::Era;

    use super::*;

    fn para(text: &str) -> Block {
        Block::Paragraph(text.into())
    }

    #[test]
    fn header_links_removed_as_unit() {
        let mut blocks = vec![
            Block::HeaderLinkBlock("[First](a)".into()),
            Block::HeaderLinkBlock("[Wiki](b)".into()),
            para("Body."),
        ];
        let mut report = ProcessingReport::new(3, Era::Pre40);
        strip_header_links(&mut blocks, &mut report);

        assert_eq!(blocks, vec![para("Body.")]);
        assert_eq!(report.actions, vec![Action::RemovedHeaderLinks { blocks: 2 }]);
    }

    #[test]
    fn footer_takes_divider_above_it() {
        let mut blocks = vec![
            para("Body."),
            Block::DividerCandidate("-----".into()),
            Block::FooterLinkCandidate("[Next](a)".into()),
        ];
        let mut report = ProcessingReport::new(3, Era::Pre40);
        strip_footer(&mut blocks, &mut report);

        assert_eq!(blocks, vec![para("Body.")]);
        assert_eq!(
            report.actions,
            vec![Action::RemovedFooterLink {
                blocks: 1,
                dividers: 1
            }]
        );
    }

    #[test]
    fn notice_between_footer_links_survives() {
        let mut blocks = vec![
            para("Body."),
            Block::FooterLinkCandidate("[Next](a)".into()),
            Block::NoticeCandidate {
                kind: crate::block::NoticeKind::AuthorNote,
                text: "A/N: bye".into(),
            },
        ];
        let mut report = ProcessingReport::new(3, Era::Pre40);
        strip_footer(&mut blocks, &mut report);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn missing_footer_is_not_an_error() {
        let mut blocks = vec![para("Body.")];
        let mut report = ProcessingReport::new(3, Era::Pre40);
        strip_footer(&mut blocks, &mut report);
        assert_eq!(blocks.len(), 1);
        assert!(report.actions.is_empty());
    }
}
