//! Pattern library: the recognized surface forms of every boilerplate
//! category.
//!
//! Built-in matchers cover the forms seen across the serial's history;
//! `[patterns]` in the config file appends extra regexes per category.
//! Everything here is a pure predicate or extractor over a single text
//! unit, so the library can be shared read-only between workers.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serialnorm_shared::{Era, PatternsConfig, Result, SerialNormError};

use crate::block::{FormatMarkers, NoticeKind};

/// Canonical scene-break marker.
pub const CANONICAL_DIVIDER: &str = "-----";

/// Boilerplate categories, for uniform predicate access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    HeaderLink,
    FooterLink,
    AuthorNote,
    ContentWarning,
    Title,
    Divider,
}

/// How a divider line was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DividerStyle {
    /// Two or more dashes, possibly wrapped in backslash escapes.
    Dash,
    /// One of the configured ellipsis literals.
    Ellipsis,
}

/// Fields extracted from a title-shaped line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    pub number: Option<u32>,
    /// `None` for plain `# Heading` lines.
    pub label: Option<String>,
    pub title: Option<String>,
    pub markers: FormatMarkers,
}

// ---------------------------------------------------------------------------
// Built-in matchers
// ---------------------------------------------------------------------------

/// Markdown link, including reddit's escaped-bracket text (`[\[Next\]](..)`)
/// and one level of nested brackets.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[((?:\\.|[^\[\]\\]|\[(?:\\.|[^\[\]\\])*\])*)\]\(([^)]*)\)").expect("valid regex")
});

static NAV_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:first|previous|prev|next|last|latest|wiki|discord|patreon|ko-?fi|index|series|subreddit|table of contents|(?:chapter|part)\s*\d+)\b",
    )
    .expect("valid regex")
});

static NEXT_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnext\b").expect("valid regex"));

static AUTHOR_NOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:a\s*[/\\]\s*n\b|author'?s?\s+notes?\b|authors?\s+notes?\b)")
        .expect("valid regex")
});

static CONTENT_WARNING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:content\s+warnings?\b|trigger\s+warnings?\b|(?:cw|tw)\b)")
        .expect("valid regex")
});

static GENERIC_NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^notes?\s*:").expect("valid regex"));

static GENERIC_WARNING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^warnings?\s*:").expect("valid regex"));

/// Keywords that tip a generic `Note:`/`Warning:` towards a content warning.
static SENSITIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:violen\w*|gore|gory|death|dying|suicid\w*|self-harm|abuse\w*|tortur\w*|graphic|trigger\w*|sexual\w*|assault\w*|blood)\b",
    )
    .expect("valid regex")
});

static DASH_DIVIDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\\*\s*[-–—](?:\s*[-–—])+\s*\\*$").expect("valid regex"));

static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^chapter\s+(?P<label>\d+[a-z]?(?:\s*/\s*\d+[a-z]?)?|[a-z]+(?:-[a-z]+)?)(?:\s*(?:[:.]|[-–—]+)\s*(?P<title>.*?)|\s+(?P<bare>.+?))?$",
    )
    .expect("valid regex")
});

static HEADING_MARK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s*").expect("valid regex"));

static PADDING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)&#x200b;|&#8203;|&nbsp;|&#160;|[\u{200B}\u{00A0}\u{FEFF}]")
        .expect("valid regex")
});

/// Longest bare (separator-less) title accepted on an unformatted line.
const MAX_BARE_TITLE_WORDS: usize = 10;

/// Longest single-line footer that is not a pure navigation line.
const MAX_FOOTER_WORDS: usize = 15;

/// Longest lead-in before the link of a `Next chapter: [here](..)` footer.
const MAX_FOOTER_LEAD_WORDS: usize = 4;

// ---------------------------------------------------------------------------
// PatternLibrary
// ---------------------------------------------------------------------------

/// Table of matchers for every boilerplate category.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    nav_keywords: Vec<Regex>,
    next_keywords: Vec<Regex>,
    author_note_markers: Vec<Regex>,
    content_warning_markers: Vec<Regex>,
    ellipsis_markers: Vec<String>,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self {
            nav_keywords: Vec::new(),
            next_keywords: Vec::new(),
            author_note_markers: Vec::new(),
            content_warning_markers: Vec::new(),
            ellipsis_markers: PatternsConfig::default().ellipsis_markers,
        }
    }
}

impl PatternLibrary {
    /// Build the library from the built-ins plus configured extensions.
    pub fn new(config: &PatternsConfig) -> Result<Self> {
        Ok(Self {
            nav_keywords: compile_all(&config.nav_keywords, "nav_keywords", false)?,
            next_keywords: compile_all(&config.next_keywords, "next_keywords", false)?,
            author_note_markers: compile_all(
                &config.author_note_markers,
                "author_note_markers",
                true,
            )?,
            content_warning_markers: compile_all(
                &config.content_warning_markers,
                "content_warning_markers",
                true,
            )?,
            ellipsis_markers: config
                .ellipsis_markers
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
        })
    }

    /// Uniform predicate over every category.
    pub fn matches(&self, category: Category, text: &str) -> bool {
        match category {
            Category::HeaderLink => self.is_nav_block(text),
            Category::FooterLink => self.is_footer_block(text),
            Category::AuthorNote => self.classify_notice(text) == Some(NoticeKind::AuthorNote),
            Category::ContentWarning => {
                self.classify_notice(text) == Some(NoticeKind::ContentWarning)
            }
            Category::Title => !text.contains('\n') && self.parse_title(text).is_some(),
            Category::Divider => self.divider_style(text, Era::Post40).is_some(),
        }
    }

    // -- navigation links ---------------------------------------------------

    /// A line made only of links and separators, with at least one link that
    /// reads like chapter navigation.
    pub fn is_nav_line(&self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }

        let mut has_nav_link = false;
        for caps in LINK_RE.captures_iter(line) {
            if self.is_nav_text(&link_text(&caps[1])) {
                has_nav_link = true;
            }
        }
        if !has_nav_link {
            return false;
        }

        is_separator_residue(&LINK_RE.replace_all(line, ""))
    }

    /// Every non-empty line of the unit is a navigation line.
    pub fn is_nav_block(&self, text: &str) -> bool {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty()).peekable();
        lines.peek().is_some() && lines.all(|l| self.is_nav_line(l))
    }

    /// A block pointing at the next chapter: either a navigation block with a
    /// "next" link, or one short line that opens with a "next" link
    /// (`[Next chapter](..) drops Friday`) or with a "next" lead-in followed
    /// only by links (`Next chapter: [here](..)`).
    pub fn is_footer_block(&self, text: &str) -> bool {
        let text = text.trim();
        if !LINK_RE.is_match(text) {
            return false;
        }
        if self.is_nav_block(text) {
            return LINK_RE
                .captures_iter(text)
                .any(|caps| self.is_next_text(&link_text(&caps[1])));
        }
        if text.contains('\n') || text.split_whitespace().count() > MAX_FOOTER_WORDS {
            return false;
        }

        let mut residue = LINK_RE.split(text);
        let lead = residue.next().unwrap_or_default();
        let rest_is_links = residue.all(is_separator_residue);

        if is_separator_residue(lead) {
            return LINK_RE
                .captures(text)
                .is_some_and(|caps| self.is_next_text(&link_text(&caps[1])));
        }
        rest_is_links
            && lead.split_whitespace().count() <= MAX_FOOTER_LEAD_WORDS
            && self.is_next_text(lead)
    }

    fn is_nav_text(&self, label: &str) -> bool {
        NAV_KEYWORD_RE.is_match(label) || self.nav_keywords.iter().any(|re| re.is_match(label))
    }

    fn is_next_text(&self, label: &str) -> bool {
        NEXT_KEYWORD_RE.is_match(label) || self.next_keywords.iter().any(|re| re.is_match(label))
    }

    // -- notices ------------------------------------------------------------

    /// Classify a unit as an author's note or content warning by its leading
    /// marker.
    ///
    /// An explicit marker decides the kind. Generic `Note:` markers count as
    /// content warnings when the text names sensitive content, author notes
    /// otherwise; generic `Warning:` markers only count when it does.
    pub fn classify_notice(&self, text: &str) -> Option<NoticeKind> {
        let lead = strip_lead_markers(text);

        if AUTHOR_NOTE_RE.is_match(lead) || self.author_note_markers.iter().any(|re| re.is_match(lead))
        {
            return Some(NoticeKind::AuthorNote);
        }
        if CONTENT_WARNING_RE.is_match(lead)
            || self.content_warning_markers.iter().any(|re| re.is_match(lead))
        {
            return Some(NoticeKind::ContentWarning);
        }
        if GENERIC_NOTE_RE.is_match(lead) {
            return Some(if SENSITIVE_RE.is_match(lead) {
                NoticeKind::ContentWarning
            } else {
                NoticeKind::AuthorNote
            });
        }
        if GENERIC_WARNING_RE.is_match(lead) && SENSITIVE_RE.is_match(lead) {
            return Some(NoticeKind::ContentWarning);
        }
        None
    }

    /// A notice unit holding only its marker (`**A/N**`, `# Content Warning`).
    pub fn is_marker_only_notice(&self, text: &str) -> bool {
        if text.trim().contains('\n') {
            return false;
        }
        let lead = strip_lead_markers(text);
        let marker_len = [&*AUTHOR_NOTE_RE, &*CONTENT_WARNING_RE, &*GENERIC_NOTE_RE]
            .into_iter()
            .chain(self.author_note_markers.iter())
            .chain(self.content_warning_markers.iter())
            .filter_map(|re| re.find(lead))
            .map(|m| m.end())
            .max();

        match marker_len {
            Some(end) => lead[end..]
                .chars()
                .all(|c| c.is_whitespace() || "*_:-–—#".contains(c)),
            None => false,
        }
    }

    // -- titles -------------------------------------------------------------

    /// Extract chapter number and title from a title-shaped line.
    ///
    /// Recognizes `Chapter N`, `**Chapter N**` and `# Chapter N`, optionally
    /// followed by a separator and title text, and any single-`#` heading.
    pub fn parse_title(&self, line: &str) -> Option<TitleMatch> {
        let (inner, markers) = strip_title_markers(line);
        if inner.is_empty() {
            return None;
        }

        if let Some(caps) = CHAPTER_RE.captures(&inner) {
            let raw_label = caps.name("label").map_or("", |m| m.as_str());
            let separated = caps.name("title").map(|m| m.as_str().trim());
            let bare = caps.name("bare").map(|m| m.as_str().trim());
            let formatted = markers.heading_level.is_some() || markers.bold;

            if let Some(bare) = bare {
                if !formatted && !is_plausible_bare_title(bare) {
                    return self.plain_heading(inner, markers);
                }
            }

            let (number, label) = parse_label(raw_label);
            if number.is_none() && separated.is_none() && !formatted {
                return None;
            }

            let title = separated
                .or(bare)
                .filter(|t| !t.is_empty())
                .map(String::from);

            return Some(TitleMatch {
                number,
                label: Some(label),
                title,
                markers,
            });
        }

        self.plain_heading(inner, markers)
    }

    fn plain_heading(&self, inner: String, markers: FormatMarkers) -> Option<TitleMatch> {
        (markers.heading_level == Some(1)).then_some(TitleMatch {
            number: None,
            label: None,
            title: Some(inner),
            markers,
        })
    }

    // -- dividers -----------------------------------------------------------

    /// Classify a single-line unit as a scene-break marker for the era.
    pub fn divider_style(&self, text: &str, era: Era) -> Option<DividerStyle> {
        let text = text.trim();
        if text.contains('\n') {
            return None;
        }
        if DASH_DIVIDER_RE.is_match(text) {
            return Some(DividerStyle::Dash);
        }
        if era == Era::Post40 && self.ellipsis_markers.iter().any(|m| m == text) {
            return Some(DividerStyle::Ellipsis);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compile_all(patterns: &[String], field: &str, anchored: bool) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            let source = if anchored {
                format!("^(?:{p})")
            } else {
                p.clone()
            };
            RegexBuilder::new(&source)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    SerialNormError::config(format!("invalid regex in patterns.{field} ({p:?}): {e}"))
                })
        })
        .collect()
}

/// Link text without escape backslashes, brackets, and emphasis.
/// Text left between links that is only separators (`|`, `/`, arrows).
fn is_separator_residue(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_whitespace() || "|/\\-–—•·*_><:,.!".contains(c))
}

fn link_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\\' | '[' | ']' | '*' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Skip heading, quote, and emphasis markers in front of a notice marker.
fn strip_lead_markers(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '#' | '>' | '*' | '_'))
}

/// Strip heading, emphasis, and padding markers from a line, recording what
/// was there.
fn strip_title_markers(line: &str) -> (String, FormatMarkers) {
    let mut markers = FormatMarkers::default();
    let mut text = line.trim().to_string();

    if PADDING_RE.is_match(&text) {
        markers.padded = true;
        text = PADDING_RE.replace_all(&text, " ").trim().to_string();
    }

    if let Some(caps) = HEADING_MARK_RE.captures(&text) {
        // At most six `#`, so the cast cannot truncate.
        markers.heading_level = Some(caps[1].len() as u8);
        let end = caps.get(0).map_or(0, |m| m.end());
        text = text[end..].to_string();
    }

    if text.contains("**") || text.contains("__") {
        markers.bold = true;
        text = text.replace("**", "").replace("__", "");
    }
    if text.contains('*') || (text.starts_with('_') && text.ends_with('_')) {
        markers.italic = true;
        text = text.replace('*', "");
        text = text.trim().trim_matches('_').to_string();
    }

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (text, markers)
}

/// A separator-less title must look like a title, not a sentence.
fn is_plausible_bare_title(bare: &str) -> bool {
    let words = bare.split_whitespace().count();
    words <= MAX_BARE_TITLE_WORDS && !bare.ends_with(['.', '!', '?', ',', ';', '"'])
}

/// Parse a chapter label into its number and canonical label text.
fn parse_label(raw: &str) -> (Option<u32>, String) {
    let compact: String = raw.split_whitespace().collect();

    if compact.starts_with(|c: char| c.is_ascii_digit()) {
        let digits: String = compact.chars().take_while(char::is_ascii_digit).collect();
        let number = digits.parse().ok();
        let label = compact.to_uppercase();
        return (number, label);
    }

    match parse_number_words(&compact).or_else(|| parse_roman(&compact)) {
        Some(n) => (Some(n), n.to_string()),
        None => (None, raw.trim().to_string()),
    }
}

/// English number words from one to ninety-nine (`twenty-one`).
fn parse_number_words(word: &str) -> Option<u32> {
    const UNITS: [&str; 19] = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
        "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
        "nineteen",
    ];
    const TENS: [&str; 8] = [
        "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ];

    let word = word.to_lowercase();
    let unit = |w: &str| UNITS.iter().position(|u| *u == w).map(|i| i as u32 + 1);
    let tens = |w: &str| TENS.iter().position(|t| *t == w).map(|i| (i as u32 + 2) * 10);

    match word.split_once('-') {
        Some((t, u)) => {
            let u = unit(u).filter(|u| *u < 10)?;
            Some(tens(t)? + u)
        }
        None => unit(&word).or_else(|| tens(&word)),
    }
}

/// Upper- or lower-case roman numerals up to 399.
fn parse_roman(word: &str) -> Option<u32> {
    if word.is_empty() || word.len() > 12 {
        return None;
    }
    let value = |c: char| match c.to_ascii_uppercase() {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        _ => None,
    };
    let digits: Vec<u32> = word.chars().map(value).collect::<Option<_>>()?;

    let mut total = 0;
    for (i, d) in digits.iter().enumerate() {
        match digits.get(i + 1) {
            Some(next) if next > d => total -= *d as i64,
            _ => total += *d as i64,
        }
    }
    let total = u32::try_from(total).ok().filter(|t| *t > 0)?;

    // Reject non-canonical spellings like "IIII" or "VX".
    (to_roman(total).eq_ignore_ascii_case(word)).then_some(total)
}

fn to_roman(mut n: u32) -> String {
    const TABLE: [(u32, &str); 9] = [
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, symbol) in TABLE {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lib() -> PatternLibrary {
        PatternLibrary::default()
    }

    // --- navigation ---

    #[test]
    fn nav_line_with_escaped_brackets() {
        let line = r"[\[Chapter 1\]](https://redd.it/abc) | [\[Wiki\]](https://reddit.com/r/HFY/wiki) | [\[Discord\]](https://discord.gg/x)";
        assert!(lib().is_nav_line(line));
    }

    #[test]
    fn nav_line_rejects_prose_with_link() {
        let line = "She pointed at [the map](https://example.com/map.png) and sighed.";
        assert!(!lib().is_nav_line(line));
    }

    #[test]
    fn nav_line_needs_navigation_text() {
        assert!(!lib().is_nav_line("[Ship schematic](https://i.imgur.com/x.png)"));
        assert!(lib().is_nav_line("**[First](https://a) / [Previous](https://b)**"));
    }

    #[test]
    fn footer_requires_next_link() {
        assert!(lib().is_footer_block(r"[\[Next Chapter\]](https://redd.it/next)"));
        assert!(lib().is_footer_block("[Previous](https://a) | [Next](https://b)"));
        assert!(!lib().is_footer_block("[Previous](https://a) | [Wiki](https://b)"));
        assert!(!lib().is_footer_block("Next chapter comes out on Friday!"));
    }

    #[test]
    fn short_footer_line_with_link() {
        assert!(lib().is_footer_block("Next chapter: [here](https://redd.it/x)"));
        assert!(lib().is_footer_block("[Next chapter](https://redd.it/x) drops Friday"));
        assert!(!lib().is_footer_block("[Ship schematic](https://redd.it/next) attached"));
    }

    #[test]
    fn prose_mentioning_next_is_not_footer() {
        let lib = lib();
        assert!(!lib.is_footer_block(
            "She pinned [the map](https://i.imgur.com/x.png) next to the door."
        ));
        assert!(!lib.is_footer_block("The next morning she sent [this](https://a) to Ives."));
        assert!(!lib.is_footer_block("She clicked [next](https://a) and waited for the page."));
    }

    #[test]
    fn configured_nav_keyword() {
        let config = PatternsConfig {
            nav_keywords: vec![r"\bpatreon-exclusive\b".into()],
            next_keywords: vec![r"\bonwards\b".into()],
            ..Default::default()
        };
        let lib = PatternLibrary::new(&config).unwrap();
        assert!(!lib.is_nav_line("[Onwards](https://a)"));
        assert!(lib.is_nav_line("[patreon-exclusive](https://a)"));
        assert!(lib.is_footer_block("[Chapter 5](https://a) | [Onwards](https://b)"));
    }

    #[test]
    fn invalid_extension_is_config_error() {
        let config = PatternsConfig {
            author_note_markers: vec!["(unclosed".into()],
            ..Default::default()
        };
        let err = PatternLibrary::new(&config).unwrap_err();
        assert!(err.to_string().contains("patterns.author_note_markers"));
    }

    // --- notices ---

    #[test]
    fn author_note_forms() {
        let lib = lib();
        assert_eq!(lib.classify_notice("A/N: thanks for reading"), Some(NoticeKind::AuthorNote));
        assert_eq!(lib.classify_notice("**A/N**\nSome note"), Some(NoticeKind::AuthorNote));
        assert_eq!(lib.classify_notice("**Author's Note:** hi"), Some(NoticeKind::AuthorNote));
        assert_eq!(lib.classify_notice("A\\N short one"), Some(NoticeKind::AuthorNote));
    }

    #[test]
    fn content_warning_forms() {
        let lib = lib();
        assert_eq!(
            lib.classify_notice("Content warning: torture"),
            Some(NoticeKind::ContentWarning)
        );
        assert_eq!(
            lib.classify_notice("**TW: graphic violence**"),
            Some(NoticeKind::ContentWarning)
        );
        assert_eq!(
            lib.classify_notice("# Trigger Warning"),
            Some(NoticeKind::ContentWarning)
        );
    }

    #[test]
    fn explicit_marker_beats_keywords() {
        assert_eq!(
            lib().classify_notice("A/N: content warning for gore below"),
            Some(NoticeKind::AuthorNote)
        );
    }

    #[test]
    fn generic_markers_use_keyword_policy() {
        let lib = lib();
        assert_eq!(lib.classify_notice("Note: posting late"), Some(NoticeKind::AuthorNote));
        assert_eq!(
            lib.classify_notice("Note: depictions of death ahead"),
            Some(NoticeKind::ContentWarning)
        );
        assert_eq!(
            lib.classify_notice("**Warning:** scenes of torture"),
            Some(NoticeKind::ContentWarning)
        );
        assert_eq!(lib.classify_notice("WARNING: HULL BREACH DETECTED"), None);
    }

    #[test]
    fn prose_is_not_a_notice() {
        let lib = lib();
        assert_eq!(lib.classify_notice("Twas a dark night."), None);
        assert_eq!(lib.classify_notice("Annotated maps lay on the table."), None);
        assert_eq!(lib.classify_notice("\"Note: he's lying,\" she said."), None);
    }

    #[test]
    fn marker_only_detection() {
        let lib = lib();
        assert!(lib.is_marker_only_notice("**A/N**"));
        assert!(lib.is_marker_only_notice("# Content Warning:"));
        assert!(!lib.is_marker_only_notice("A/N: thanks"));
        assert!(!lib.is_marker_only_notice("**A/N**\nSome note"));
    }

    // --- titles ---

    #[test]
    fn plain_numbered_title() {
        let m = lib().parse_title("Chapter 12 - The Deal").unwrap();
        assert_eq!(m.number, Some(12));
        assert_eq!(m.label.as_deref(), Some("12"));
        assert_eq!(m.title.as_deref(), Some("The Deal"));
        assert_eq!(m.markers, FormatMarkers::default());
    }

    #[test]
    fn bold_and_heading_titles() {
        let m = lib().parse_title("**Chapter 7**").unwrap();
        assert_eq!(m.number, Some(7));
        assert!(m.markers.bold);
        assert_eq!(m.title, None);

        let m = lib().parse_title("# Chapter 9 – Homecoming").unwrap();
        assert_eq!(m.number, Some(9));
        assert_eq!(m.markers.heading_level, Some(1));
        assert_eq!(m.title.as_deref(), Some("Homecoming"));

        let m = lib().parse_title("**Chapter 21** - *Fallout*").unwrap();
        assert_eq!(m.title.as_deref(), Some("Fallout"));
        assert!(m.markers.bold && m.markers.italic);
    }

    #[test]
    fn padded_title_is_cleaned() {
        let m = lib().parse_title("&#x200B; Chapter 4: Landfall &#x200B;").unwrap();
        assert!(m.markers.padded);
        assert_eq!(m.number, Some(4));
        assert_eq!(m.title.as_deref(), Some("Landfall"));
    }

    #[test]
    fn split_and_suffixed_labels() {
        let m = lib().parse_title("Chapter 12b - Part Two").unwrap();
        assert_eq!(m.number, Some(12));
        assert_eq!(m.label.as_deref(), Some("12B"));

        let m = lib().parse_title("Chapter 30 / 31 - Double").unwrap();
        assert_eq!(m.number, Some(30));
        assert_eq!(m.label.as_deref(), Some("30/31"));
    }

    #[test]
    fn word_and_roman_numbers() {
        let m = lib().parse_title("Chapter one").unwrap();
        assert_eq!(m.number, Some(1));
        assert_eq!(m.label.as_deref(), Some("1"));

        let m = lib().parse_title("Chapter Twenty-One - Ghosts").unwrap();
        assert_eq!(m.number, Some(21));

        let m = lib().parse_title("**Chapter XIV**").unwrap();
        assert_eq!(m.number, Some(14));
    }

    #[test]
    fn unparseable_label_needs_title_shape() {
        assert!(lib().parse_title("Chapter summary").is_none());

        let m = lib().parse_title("**Chapter Zero-Point**").unwrap();
        assert_eq!(m.number, None);
        assert_eq!(m.label.as_deref(), Some("Zero-Point"));
    }

    #[test]
    fn sentences_are_not_titles() {
        assert!(lib().parse_title("Chapter 3 was where it all went wrong.").is_none());
        assert!(lib().parse_title("Chapters blurred together.").is_none());
    }

    #[test]
    fn bare_title_without_separator() {
        let m = lib().parse_title("Chapter 5 The Long Night").unwrap();
        assert_eq!(m.number, Some(5));
        assert_eq!(m.title.as_deref(), Some("The Long Night"));
    }

    #[test]
    fn plain_heading_is_candidate() {
        let m = lib().parse_title("# Interlude: The Other Side").unwrap();
        assert_eq!(m.number, None);
        assert_eq!(m.label, None);
        assert_eq!(m.title.as_deref(), Some("Interlude: The Other Side"));

        assert!(lib().parse_title("## Subsection").is_none());
        assert!(lib().parse_title("Just a line").is_none());
    }

    // --- dividers ---

    #[test]
    fn dash_dividers() {
        let lib = lib();
        for text in ["-----", "--", r"\-----", r"\--\", r"\--\\", "- - -", "———"] {
            assert_eq!(lib.divider_style(text, Era::Pre40), Some(DividerStyle::Dash), "{text}");
        }
        assert_eq!(lib.divider_style("-", Era::Pre40), None);
        assert_eq!(lib.divider_style("--and then", Era::Pre40), None);
    }

    #[test]
    fn ellipsis_only_after_threshold() {
        let lib = lib();
        assert_eq!(lib.divider_style("â€¦", Era::Post40), Some(DividerStyle::Ellipsis));
        assert_eq!(lib.divider_style("…", Era::Post40), Some(DividerStyle::Ellipsis));
        assert_eq!(lib.divider_style("â€¦", Era::Pre40), None);
        assert_eq!(lib.divider_style("...", Era::Post40), None);
    }

    #[test]
    fn uniform_matches() {
        let lib = lib();
        assert!(lib.matches(Category::Title, "Chapter 2"));
        assert!(lib.matches(Category::Divider, "â€¦"));
        assert!(lib.matches(Category::AuthorNote, "A/N: hi"));
        assert!(lib.matches(Category::FooterLink, "[Next](https://x)"));
        assert!(!lib.matches(Category::HeaderLink, "Body text."));
    }

    #[test]
    fn roman_rejects_non_canonical() {
        assert_eq!(parse_roman("IIII"), None);
        assert_eq!(parse_roman("xl"), Some(40));
        assert_eq!(parse_roman("civic"), None);
    }
}
