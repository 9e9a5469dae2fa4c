//! Per-chapter processing report.

use serde::{Deserialize, Serialize};
use serialnorm_shared::Era;

use crate::block::NoticeKind;

/// Where the resolved title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleSource {
    Detected,
    Fallback,
    Override,
    None,
}

/// Something the pipeline did to the chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    RemovedHeaderLinks { blocks: usize },
    RemovedNotice { kind: NoticeKind, count: usize },
    ResolvedTitle { source: TitleSource },
    RemovedDuplicateHeading { count: usize },
    NormalizedDivider { count: usize },
    DroppedDivider { count: usize },
    RemovedFooterLink { blocks: usize, dividers: usize },
}

/// A non-fatal finding that may need a human look.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "kebab-case")]
pub enum Warning {
    /// No override, heading, or fallback for a chapter expected to have a title.
    UnresolvableTitle,
    /// A `Chapter <label>` heading whose label is not a number.
    UnparseableTitle { text: String },
    /// The in-text chapter number disagrees with the supplied index.
    NumberMismatch { detected: u32, expected: u32 },
    /// A dash divider in a chapter whose era uses another marker.
    AmbiguousDivider { text: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvableTitle => f.write_str("no title could be resolved"),
            Self::UnparseableTitle { text } => write!(f, "unparseable chapter number in {text:?}"),
            Self::NumberMismatch { detected, expected } => {
                write!(f, "heading says chapter {detected}, index is {expected}")
            }
            Self::AmbiguousDivider { text } => write!(f, "dash divider {text:?} in post-40 chapter"),
        }
    }
}

/// Actions and warnings recorded while normalizing one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub chapter_index: u32,
    pub era: Era,
    pub actions: Vec<Action>,
    pub warnings: Vec<Warning>,
}

impl ProcessingReport {
    pub fn new(chapter_index: u32, era: Era) -> Self {
        Self {
            chapter_index,
            era,
            actions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        tracing::warn!(chapter = self.chapter_index, %warning, "normalization warning");
        self.warnings.push(warning);
    }

    /// Source of the resolved title, once the title stage has run.
    pub fn title_source(&self) -> Option<TitleSource> {
        self.actions.iter().find_map(|a| match a {
            Action::ResolvedTitle { source } => Some(*source),
            _ => None,
        })
    }

    /// Number of removed notices of the given kind.
    pub fn removed_notices(&self, kind: NoticeKind) -> usize {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::RemovedNotice { kind: k, count } if *k == kind => Some(*count),
                _ => None,
            })
            .sum()
    }

    /// Chapters without a resolvable title are flagged for manual review.
    pub fn needs_review(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, Warning::UnresolvableTitle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_kebab_case_tags() {
        let mut report = ProcessingReport::new(12, Era::Pre40);
        report.record(Action::RemovedNotice {
            kind: NoticeKind::AuthorNote,
            count: 1,
        });
        report.record(Action::ResolvedTitle {
            source: TitleSource::Detected,
        });

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["era"], "pre40");
        assert_eq!(json["actions"][0]["action"], "removed-notice");
        assert_eq!(json["actions"][0]["kind"], "author-note");
        assert_eq!(json["actions"][1]["source"], "detected");
    }

    #[test]
    fn review_flag_follows_unresolvable_title() {
        let mut report = ProcessingReport::new(5, Era::Pre40);
        report.warn(Warning::NumberMismatch {
            detected: 4,
            expected: 5,
        });
        assert!(!report.needs_review());
        report.warn(Warning::UnresolvableTitle);
        assert!(report.needs_review());
    }

    #[test]
    fn warning_display() {
        let w = Warning::NumberMismatch {
            detected: 13,
            expected: 12,
        };
        assert_eq!(w.to_string(), "heading says chapter 13, index is 12");
    }
}
