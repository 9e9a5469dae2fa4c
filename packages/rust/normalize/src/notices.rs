//! Author's note and content warning removal.

use std::collections::BTreeMap;

use tracing::debug;

use crate::block::{Block, NoticeKind};
use crate::report::{Action, ProcessingReport};

/// Remove every notice block, wherever it sits. One report entry per kind.
pub(crate) fn filter(blocks: &mut Vec<Block>, report: &mut ProcessingReport) {
    let mut removed: BTreeMap<NoticeKind, usize> = BTreeMap::new();

    blocks.retain(|block| match block {
        Block::NoticeCandidate { kind, text } => {
            debug!(%kind, chars = text.len(), "removed notice");
            *removed.entry(*kind).or_default() += 1;
            false
        }
        _ => true,
    });

    for (kind, count) in removed {
        report.record(Action::RemovedNotice { kind, count });
    }
}

#[cfg(test)]
mod tests {
    use serialnorm_shared::Era;

    use super::*;

    fn notice(kind: NoticeKind) -> Block {
        Block::NoticeCandidate {
            kind,
            text: "note".into(),
        }
    }

    #[test]
    fn removes_notices_anywhere() {
        let mut blocks = vec![
            notice(NoticeKind::ContentWarning),
            Block::Paragraph("Body.".into()),
            notice(NoticeKind::AuthorNote),
            Block::Paragraph("More.".into()),
            notice(NoticeKind::AuthorNote),
        ];
        let mut report = ProcessingReport::new(8, Era::Pre40);
        filter(&mut blocks, &mut report);

        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("Body.".into()),
                Block::Paragraph("More.".into())
            ]
        );
        assert_eq!(report.removed_notices(NoticeKind::AuthorNote), 2);
        assert_eq!(report.removed_notices(NoticeKind::ContentWarning), 1);
        assert_eq!(report.actions.len(), 2);
    }

    #[test]
    fn nothing_to_remove_records_nothing() {
        let mut blocks = vec![Block::Paragraph("Body.".into())];
        let mut report = ProcessingReport::new(8, Era::Pre40);
        filter(&mut blocks, &mut report);
        assert!(report.actions.is_empty());
    }
}
