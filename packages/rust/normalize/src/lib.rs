//! Chapter normalization for reddit-serialized fiction.
//!
//! Turns one raw chapter post into clean Markdown: navigation and footer
//! links, author's notes and content warnings are removed, the chapter
//! title is resolved and placed first, and scene-break dividers are
//! rewritten according to the chapter's era.
//!
//! Pipeline stages, in order:
//! 1. Cleanup (line endings, invisible padding, blank-line runs)
//! 2. Segmentation into classified blocks
//! 3. Header link and footer link removal
//! 4. Notice removal
//! 5. Title resolution
//! 6. Divider normalization
//! 7. Assembly and serialization
//!
//! Normalization is a pure function of the input and the [`Normalizer`],
//! which is immutable and can be shared between threads.

mod assembler;
pub mod block;
mod cleanup;
mod dividers;
mod links;
mod notices;
pub mod patterns;
pub mod report;
mod segmenter;
mod title;

use serialnorm_shared::{
    AppConfig, ChapterInput, ChapterOverride, Era, NormalizeSettings, OverrideTable, Result,
    SerialNormError,
};
use tracing::{debug, instrument};

pub use assembler::NormalizedChapter;
pub use block::{Block, FormatMarkers, HeadingCandidate, NoticeKind, OutputBlock};
pub use patterns::{CANONICAL_DIVIDER, Category, DividerStyle, PatternLibrary, TitleMatch};
pub use report::{Action, ProcessingReport, TitleSource, Warning};
pub use title::ResolvedTitle;

use segmenter::Segmenter;
use title::TitleContext;

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// The rule set applied to every chapter of a run: patterns, per-chapter
/// overrides, and thresholds.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    patterns: PatternLibrary,
    overrides: OverrideTable,
    settings: NormalizeSettings,
}

impl Normalizer {
    pub fn new(patterns: PatternLibrary, overrides: OverrideTable, settings: NormalizeSettings) -> Self {
        Self {
            patterns,
            overrides,
            settings,
        }
    }

    /// Build the rule set from the application config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let overrides = config.override_table()?;
        debug!(overrides = overrides.len(), "loaded chapter overrides");
        Ok(Self::new(
            PatternLibrary::new(&config.patterns)?,
            overrides,
            NormalizeSettings::from(config),
        ))
    }

    /// Era of a chapter: the override's, else by index against the threshold.
    pub fn era_for(&self, chapter_index: u32, entry: Option<&ChapterOverride>) -> Era {
        entry
            .and_then(|o| o.era)
            .unwrap_or_else(|| Era::for_index(chapter_index, self.settings.era_threshold))
    }

    /// Normalize one chapter.
    ///
    /// Fails only for input that cannot be a chapter at all (empty text,
    /// index 0). Everything else, including a missing title, ends up in the
    /// report as a warning.
    #[instrument(skip(self, input), fields(chapter = input.chapter_index))]
    pub fn normalize(&self, input: &ChapterInput) -> Result<NormalizedChapter> {
        let index = input.chapter_index;
        if index == 0 {
            return Err(SerialNormError::malformed(index, "chapter indices start at 1"));
        }

        let cleaned = cleanup::run_pipeline(&input.raw_text);
        if cleaned.trim().is_empty() {
            return Err(SerialNormError::malformed(index, "raw text is empty"));
        }

        let entry = input.overrides.as_ref().or_else(|| self.overrides.get(index));
        let era = self.era_for(index, entry);
        let mut report = ProcessingReport::new(index, era);

        let mut blocks = Segmenter::new(&self.patterns, &self.settings, era).segment(&cleaned);

        links::strip_header_links(&mut blocks, &mut report);
        links::strip_footer(&mut blocks, &mut report);
        notices::filter(&mut blocks, &mut report);

        let ctx = TitleContext {
            chapter_index: index,
            fallback_title: input.fallback_title.as_deref(),
            overrides: entry,
            settings: &self.settings,
            patterns: &self.patterns,
        };
        let title = title::resolve(&mut blocks, &ctx, &mut report);

        dividers::normalize(&mut blocks, era, &self.patterns, &mut report);

        let chapter = assembler::assemble(title, blocks, report);
        debug!(
            %era,
            blocks = chapter.blocks.len(),
            warnings = chapter.report.warnings.len(),
            "chapter normalized"
        );
        Ok(chapter)
    }
}

/// Normalize one chapter with the built-in patterns and default settings.
pub fn normalize(
    raw_text: &str,
    chapter_index: u32,
    fallback_title: Option<&str>,
    overrides: &OverrideTable,
) -> Result<(String, ProcessingReport)> {
    let normalizer = Normalizer::new(
        PatternLibrary::default(),
        overrides.clone(),
        NormalizeSettings::default(),
    );
    let mut input = ChapterInput::new(raw_text, chapter_index);
    input.fallback_title = fallback_title.map(String::from);

    let chapter = normalizer.normalize(&input)?;
    Ok((chapter.text, chapter.report))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serialnorm_shared::TitleReplacement;

    use super::*;

    fn run(raw: &str, index: u32) -> (String, ProcessingReport) {
        normalize(raw, index, None, &OverrideTable::new()).unwrap()
    }

    #[test]
    fn author_note_title_and_divider() {
        let raw = "**A/N**\nSome note\n\nChapter 12 - The Deal\n\nBody text.\n\n\\--\\\\\n\nMore text.";
        let (text, report) = run(raw, 12);

        assert_eq!(text, "# Chapter 12 - The Deal\n\nBody text.\n\n-----\n\nMore text.");
        assert!(report.warnings.is_empty());
        assert_eq!(report.removed_notices(NoticeKind::AuthorNote), 1);
        assert_eq!(report.title_source(), Some(TitleSource::Detected));
    }

    #[test]
    fn post40_ellipsis_preserved() {
        let raw = "Chapter 45 - Drift\n\nThe void.\n\nâ€¦\n\nLater.";
        let (text, report) = run(raw, 45);

        assert_eq!(text, "# Chapter 45 - Drift\n\nThe void.\n\nâ€¦\n\nLater.");
        assert_eq!(report.era, Era::Post40);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn chapter_one_has_no_heading() {
        let raw = "Twas a dark night.\n\nThe end.";
        let (text, report) = run(raw, 1);

        assert_eq!(text, "Twas a dark night.\n\nThe end.");
        assert_eq!(report.title_source(), Some(TitleSource::None));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn full_reddit_post() {
        let raw = "[\\[First\\]](https://redd.it/a) | [\\[Previous\\]](https://redd.it/b) | [\\[Wiki\\]](https://reddit.com/r/HFY/wiki)\r\n\
                   \r\n\
                   &#x200B;\r\n\
                   \r\n\
                   **Content Warning: graphic violence**\r\n\
                   \r\n\
                   &#x200B;\r\n\
                   \r\n\
                   **Chapter 7** - *Aftermath*\r\n\
                   \r\n\
                   The station was quiet.\r\n\
                   \r\n\
                   \\-----\r\n\
                   \r\n\
                   Nobody spoke.\r\n\
                   \r\n\
                   \\-----\r\n\
                   \r\n\
                   [\\[Next\\]](https://redd.it/c)\r\n";
        let (text, report) = run(raw, 7);

        assert_eq!(
            text,
            "# Chapter 7 - Aftermath\n\nThe station was quiet.\n\n-----\n\nNobody spoke."
        );
        assert!(report.actions.contains(&Action::RemovedHeaderLinks { blocks: 1 }));
        assert!(report.actions.contains(&Action::RemovedFooterLink {
            blocks: 1,
            dividers: 1
        }));
        assert_eq!(report.removed_notices(NoticeKind::ContentWarning), 1);
        assert!(!text.contains("&#x200B;"));
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let inputs = [
            ("**A/N**\nSome note\n\nChapter 12 - The Deal\n\nBody text.\n\n\\--\\\\\n\nMore text.", 12),
            ("# Chapter 45: Drift\n\nThe void.\n\nâ€¦\n\nLater.\n\n[Next](https://x)", 45),
            ("Twas a dark night.\n\n# Aside\n\nThe end.", 1),
            ("Chapter 3\n\n# Part Two\n\nText.\n\n---\n\n---\n\nEnd.", 3),
            ("# Chapter 1 - Arrival\n\n# Landfall\n\nBody.", 1),
            ("**A/N**\n\n**Chapter 7**\n\nBody.\n\n[the map](https://x) next to it.", 7),
        ];
        for (raw, index) in inputs {
            let (once, _) = run(raw, index);
            let (twice, _) = run(&once, index);
            assert_eq!(once, twice, "not idempotent for chapter {index}");
        }
    }

    #[test]
    fn pre40_dividers_are_canonical() {
        let raw = "Chapter 20\n\nA.\n\n--\n\nB.\n\n\\---\\\n\nC.\n\n— — —\n\nD.";
        let (text, _) = run(raw, 20);
        let dividers: Vec<&str> = text
            .split("\n\n")
            .filter(|b| b.starts_with(['-', '—', '\\']))
            .collect();
        assert_eq!(dividers, vec!["-----", "-----", "-----"]);
    }

    #[test]
    fn boilerplate_never_survives() {
        let raw = "[Chapter 1](https://a) | [Discord](https://b)\n\n\
                   A/N: thanks for reading!\n\n\
                   TW: torture\n\n\
                   Chapter 8\n\n\
                   Body.\n\n\
                   **Author's note:** see you next week\n\n\
                   [Previous](https://c) | [Next](https://d)";
        let (text, _) = run(raw, 8);
        assert_eq!(text, "# Chapter 8\n\nBody.");
    }

    #[test]
    fn fallback_title_when_text_has_none() {
        let (text, report) = normalize(
            "Some story.",
            23,
            Some("Interlude: The Other Side"),
            &OverrideTable::new(),
        )
        .unwrap();
        assert_eq!(text, "# Interlude: The Other Side\n\nSome story.");
        assert_eq!(report.title_source(), Some(TitleSource::Fallback));
    }

    #[test]
    fn fallback_title_is_stable_across_runs() {
        let table = OverrideTable::new();
        let fallback = Some("Chapter 22: Homecoming");
        let (once, _) = normalize("Some story.", 22, fallback, &table).unwrap();
        assert_eq!(once, "# Chapter 22 - Homecoming\n\nSome story.");

        let (twice, report) = normalize(&once, 22, fallback, &table).unwrap();
        assert_eq!(once, twice);
        assert_eq!(report.title_source(), Some(TitleSource::Detected));
    }

    #[test]
    fn bold_title_after_bold_author_note() {
        let (text, report) = run("**A/N**\n\n**Chapter 7**\n\nBody text.", 7);
        assert_eq!(text, "# Chapter 7\n\nBody text.");
        assert_eq!(report.removed_notices(NoticeKind::AuthorNote), 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn chapter_one_heading_in_text_is_dropped() {
        let raw = "# Chapter 1 - A Job for a Deathworlder\n\n# Landfall\n\nBody text.";
        let (text, report) = run(raw, 1);
        assert_eq!(text, "## Landfall\n\nBody text.");
        assert!(!text.lines().any(|l| l.starts_with("# ")));
        assert_eq!(report.title_source(), Some(TitleSource::None));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn closing_prose_with_link_is_kept() {
        let raw = "Chapter 9\n\nBody text.\n\nShe pinned [the map](https://i.imgur.com/x.png) next to the door.";
        let (text, _) = run(raw, 9);
        assert_eq!(
            text,
            "# Chapter 9\n\nBody text.\n\nShe pinned [the map](https://i.imgur.com/x.png) next to the door."
        );
    }

    #[test]
    fn missing_title_flagged_for_review() {
        let (text, report) = run("Some story.", 23);
        assert_eq!(text, "Some story.");
        assert!(report.needs_review());
    }

    #[test]
    fn override_table_applies() {
        let mut table = OverrideTable::new();
        table.insert(
            3,
            ChapterOverride {
                replace: vec![TitleReplacement {
                    find: "Deathwolder".into(),
                    replace: "Deathworlder".into(),
                }],
                ..Default::default()
            },
        );
        table.insert(
            5,
            ChapterOverride {
                untitled: Some(true),
                ..Default::default()
            },
        );
        table.insert(
            41,
            ChapterOverride {
                era: Some(Era::Pre40),
                ..Default::default()
            },
        );

        let (text, _) = normalize("Chapter 3 - The Deathwolder\n\nBody.", 3, None, &table).unwrap();
        assert_eq!(text, "# Chapter 3 - The Deathworlder\n\nBody.");

        let (text, _) = normalize("Chapter 5\n\nBody.", 5, None, &table).unwrap();
        assert_eq!(text, "Body.");

        let (_, report) = normalize("Chapter 41\n\nA.\n\n-----\n\nB.", 41, None, &table).unwrap();
        assert_eq!(report.era, Era::Pre40);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn input_override_beats_table() {
        let normalizer = Normalizer::default();
        let input = ChapterInput::new("Body.", 9).with_override(ChapterOverride {
            forced_title: Some("Reunion".into()),
            ..Default::default()
        });
        let chapter = normalizer.normalize(&input).unwrap();
        assert_eq!(chapter.text, "# Chapter 9 - Reunion\n\nBody.");
        assert_eq!(chapter.title.map(|t| t.source), Some(TitleSource::Override));
    }

    #[test]
    fn malformed_input_rejected() {
        let table = OverrideTable::new();
        assert!(matches!(
            normalize("   \n\n  ", 4, None, &table),
            Err(SerialNormError::MalformedInput { chapter_index: 4, .. })
        ));
        assert!(matches!(
            normalize("&#x200B;", 4, None, &table),
            Err(SerialNormError::MalformedInput { .. })
        ));
        assert!(matches!(
            normalize("Body.", 0, None, &table),
            Err(SerialNormError::MalformedInput { .. })
        ));
    }

    #[test]
    fn configured_threshold_moves_era() {
        let mut config = AppConfig::default();
        config.defaults.era_threshold = 30;
        let normalizer = Normalizer::from_config(&config).unwrap();
        assert_eq!(normalizer.era_for(35, None), Era::Post40);
        assert_eq!(normalizer.era_for(30, None), Era::Pre40);
    }

    #[test]
    fn normalizer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Normalizer>();
    }
}
