//! Post-processing: deterministic cleanup of the model's analysis.
//!
//! The prompt asks for `##`/`###`/`####` headings and `-` bullets, but models
//! drift: they wrap the answer in code fences, open with a single `#`, use
//! `*` or `●` for bullets, or bold the whole heading. These rules bring the
//! text back to the conventions [`crate::layout`] classifies, so the PDF and
//! the Markdown download show the same structure.
//!
//! ## Rule Order
//!
//! Fences come off first so the other rules see the real first line.
//! Invisible characters are removed before bullet detection because a BOM
//! or zero-width space in front of `*` hides the marker.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to the raw completion.
///
/// Rules (applied in order):
/// 1. Strip outer markdown fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Trim trailing whitespace per line
/// 5. Normalise bullet markers (`*`, `+`, `●`, `▪`, `•` → `-`)
/// 6. Normalise headings (`#` → `##`, deeper than `####` → `####`,
///    missing space after the hashes, bold-wrapped heading text)
/// 7. Collapse runs of blank lines to one
/// 8. Ensure the text ends with exactly one newline
pub fn clean_analysis(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = normalise_bullets(&s);
    let s = normalise_headings(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Normalise bullet markers ─────────────────────────────────────────

static RE_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)[*+●▪◦•‣][ \t]+").unwrap());

fn normalise_bullets(input: &str) -> String {
    RE_BULLET.replace_all(input, "${1}- ").to_string()
}

// ── Rule 6: Normalise headings ───────────────────────────────────────────────

static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*(#{1,6})[ \t]*(.*?)[ \t]*#*$").unwrap());

static RE_BOLD_WRAPPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*(.+?)\*\*:?$|^__(.+?)__:?$").unwrap());

fn normalise_headings(input: &str) -> String {
    input
        .lines()
        .map(|line| match normalise_heading_line(line) {
            Some(heading) => heading,
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrite one heading line, or `None` when `line` is not a heading.
///
/// `#hashtag`-style words are only treated as headings when at least two
/// hashes are present, so a body line such as `#1 priority` survives.
fn normalise_heading_line(line: &str) -> Option<String> {
    let caps = RE_HEADING.captures(line)?;
    let hashes = caps[1].len();
    let text = caps[2].trim();
    if text.is_empty() {
        return None;
    }
    let spaced = line.trim_start()[hashes..].starts_with([' ', '\t']);
    if hashes == 1 && !spaced {
        return None;
    }

    let text = match RE_BOLD_WRAPPED.captures(text) {
        Some(b) => b
            .get(1)
            .or_else(|| b.get(2))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| text.to_string()),
        None => text.to_string(),
    };

    let level = hashes.clamp(2, 4);
    Some(format!("{} {}", "#".repeat(level), text))
}

// ── Rule 7: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 8: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let input = "```markdown\n## Scope\nText\n```";
        assert_eq!(strip_markdown_fences(input), "## Scope\nText");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\n## Scope\nText\n```";
        assert_eq!(strip_markdown_fences(input), "## Scope\nText");
    }

    #[test]
    fn test_inner_code_block_kept() {
        let input = "## Scope\n```\ncode\n```\nmore";
        assert_eq!(strip_markdown_fences(input), input);
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  hello   \nworld  "),
            "  hello\nworld"
        );
    }

    #[test]
    fn test_bullets_normalised() {
        let input = "* one\n● two\n▪ three\n  + nested\n• four\n- five";
        assert_eq!(
            normalise_bullets(input),
            "- one\n- two\n- three\n  - nested\n- four\n- five"
        );
    }

    #[test]
    fn test_bold_line_is_not_a_bullet() {
        let input = "**Deadline:** 31 March";
        assert_eq!(normalise_bullets(input), input);
    }

    #[test]
    fn test_single_hash_is_promoted() {
        assert_eq!(normalise_headings("# Overview"), "## Overview");
    }

    #[test]
    fn test_deep_heading_is_capped() {
        assert_eq!(normalise_headings("###### Note"), "#### Note");
    }

    #[test]
    fn test_missing_space_after_hashes() {
        assert_eq!(normalise_headings("###Penalties"), "### Penalties");
    }

    #[test]
    fn test_bold_heading_unwrapped() {
        assert_eq!(normalise_headings("## **Key Points**"), "## Key Points");
        assert_eq!(normalise_headings("### __Timeline__:"), "### Timeline");
    }

    #[test]
    fn test_closing_hashes_removed() {
        assert_eq!(normalise_headings("## Scope ##"), "## Scope");
    }

    #[test]
    fn test_hash_word_is_not_heading() {
        assert_eq!(normalise_headings("#1 priority for insurers"), "#1 priority for insurers");
        assert_eq!(normalise_headings("##"), "##");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_ensure_final_newline() {
        assert_eq!(ensure_final_newline("hello"), "hello\n");
        assert_eq!(ensure_final_newline("hello\n\n\n"), "hello\n");
        assert_eq!(ensure_final_newline(""), "\n");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn test_clean_analysis_full_pipeline() {
        let input = "```markdown\n\u{FEFF}# Circular Summary\r\n\r\n\r\n\r\n## **Scope**   \r\n\
                     * Applies to all insurers\r\n1. File by 31-Mar-2024\r\n```";
        assert_eq!(
            clean_analysis(input),
            "## Circular Summary\n\n## Scope\n- Applies to all insurers\n1. File by 31-Mar-2024\n"
        );
    }
}
