//! Pre-segmentation cleanup passes for raw post text.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! The passes only touch whitespace and invisible padding; prose is never
//! rewritten here.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on raw chapter text.
pub(crate) fn run_pipeline(raw: &str) -> String {
    let mut result = normalize_line_endings(raw);

    result = strip_invisible_chars(&result);
    result = blank_padding_lines(&result);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);

    result.trim_matches('\n').to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Normalize line endings
// ---------------------------------------------------------------------------

fn normalize_line_endings(md: &str) -> String {
    md.replace("\r\n", "\n").replace('\r', "\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Strip zero-width characters
// ---------------------------------------------------------------------------

/// Remove zero-width spaces and BOMs, both literal and as HTML entities.
///
/// Reddit authors pad titles with `&#x200B;` lines; they carry no content.
fn strip_invisible_chars(md: &str) -> String {
    static ZW_ENTITY_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)&#x200b;|&#8203;|&#xfeff;").expect("valid regex"));

    let stripped = ZW_ENTITY_RE.replace_all(md, "");
    stripped.replace(['\u{200B}', '\u{FEFF}', '\u{2060}'], "")
}

// ---------------------------------------------------------------------------
// Pass 3: Blank out padding-only lines
// ---------------------------------------------------------------------------

/// Lines holding nothing but non-breaking spaces become empty lines, so
/// they act as paragraph boundaries instead of paragraphs.
fn blank_padding_lines(md: &str) -> String {
    static NBSP_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)&nbsp;|&#160;|&#xa0;").expect("valid regex"));

    md.lines()
        .map(|line| {
            let residue = NBSP_RE.replace_all(line, "");
            if residue.chars().all(|c| c.is_whitespace()) {
                ""
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 4: Normalize whitespace
// ---------------------------------------------------------------------------

/// Clean up trailing whitespace on lines.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 5: Collapse blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into a single paragraph break.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings_become_lf() {
        assert_eq!(normalize_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn zero_width_entities_removed() {
        let input = "&#x200B;\n\n**Chapter 3**\n\n&#x200b;";
        let result = strip_invisible_chars(input);
        assert_eq!(result, "\n\n**Chapter 3**\n\n");
    }

    #[test]
    fn literal_zero_width_removed() {
        assert_eq!(strip_invisible_chars("\u{FEFF}Hello\u{200B}"), "Hello");
    }

    #[test]
    fn nbsp_only_lines_blanked() {
        let input = "Text\n&nbsp;\nMore\n \u{00A0} ";
        let result = blank_padding_lines(input);
        assert_eq!(result, "Text\n\nMore\n");
    }

    #[test]
    fn inline_nbsp_kept() {
        let input = "Wait&nbsp;what";
        assert_eq!(blank_padding_lines(input), input);
    }

    #[test]
    fn blank_runs_collapse_to_one_break() {
        assert_eq!(clean_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn pipeline_trims_and_collapses() {
        let input = "\r\n&#x200B;\r\n\r\nChapter 2   \r\n\r\n\r\n\r\nBody.\r\n\r\n";
        assert_eq!(run_pipeline(input), "Chapter 2\n\nBody.");
    }
}
