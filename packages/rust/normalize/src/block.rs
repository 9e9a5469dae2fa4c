//! Block model shared by every pipeline stage.

use serde::{Deserialize, Serialize};

/// Surface form a heading-like line was written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatMarkers {
    /// Number of leading `#` characters, if the line was heading-marked.
    pub heading_level: Option<u8>,
    /// Wrapped in `**` / `__`.
    pub bold: bool,
    /// Wrapped in single `*` / `_`.
    pub italic: bool,
    /// Carried zero-width or non-breaking padding entities.
    pub padded: bool,
}

/// A title-shaped line found near the top of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingCandidate {
    /// The line exactly as it appeared.
    pub raw_text: String,
    /// Chapter number parsed from the label, if it parsed.
    pub detected_number: Option<u32>,
    /// Text after `Chapter`, normalized when it parsed (`12`, `12B`, `12/13`)
    /// and verbatim when it did not. `None` for plain headings.
    pub label: Option<String>,
    /// Title text after the number, or the whole heading for plain headings.
    pub detected_title: Option<String>,
    pub format_markers: FormatMarkers,
}

impl HeadingCandidate {
    /// Whether the line used the `Chapter <label>` form.
    pub fn has_chapter_label(&self) -> bool {
        self.label.is_some()
    }

    /// Whether the line named a chapter whose number could not be read.
    pub fn is_unparseable(&self) -> bool {
        self.label.is_some() && self.detected_number.is_none()
    }

    /// Canonical heading text, without the leading `# `.
    pub fn heading_text(&self) -> String {
        match (&self.label, &self.detected_title) {
            (Some(label), Some(title)) => format!("Chapter {label} - {title}"),
            (Some(label), None) => format!("Chapter {label}"),
            (None, Some(title)) => title.clone(),
            (None, None) => self.raw_text.trim().to_string(),
        }
    }
}

/// Kind of an out-of-story notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeKind {
    AuthorNote,
    ContentWarning,
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthorNote => f.write_str("author note"),
            Self::ContentWarning => f.write_str("content warning"),
        }
    }
}

/// One classified unit of a chapter, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    HeadingCandidate(HeadingCandidate),
    NoticeCandidate { kind: NoticeKind, text: String },
    DividerCandidate(String),
    FooterLinkCandidate(String),
    HeaderLinkBlock(String),
}

impl Block {
    /// Text as it appeared in the source.
    pub fn raw_text(&self) -> &str {
        match self {
            Self::Paragraph(text)
            | Self::DividerCandidate(text)
            | Self::FooterLinkCandidate(text)
            | Self::HeaderLinkBlock(text) => text,
            Self::HeadingCandidate(candidate) => &candidate.raw_text,
            Self::NoticeCandidate { text, .. } => text,
        }
    }

    /// Whether the block carries story content (ends the leading region).
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Paragraph(_) | Self::HeadingCandidate(_))
    }

    pub fn is_divider(&self) -> bool {
        matches!(self, Self::DividerCandidate(_))
    }
}

/// A block that survives into the normalized chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "kebab-case")]
pub enum OutputBlock {
    /// Top-level heading text, without the `# ` marker.
    Heading(String),
    Paragraph(String),
    Divider(String),
}

impl OutputBlock {
    /// Serialized Markdown form.
    pub fn render(&self) -> String {
        match self {
            Self::Heading(text) => format!("# {text}"),
            Self::Paragraph(text) | Self::Divider(text) => text.clone(),
        }
    }
}
