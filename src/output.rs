//! Output types and format rendering.
//!
//! An analysis run produces one [`DigestOutput`]. The analysis itself is
//! Markdown; [`DigestOutput::render`] turns it into any [`OutputFormat`].

use crate::error::{DigestError, DocumentError};
use crate::layout::{self, LayoutConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Base name of the download file, before the extension.
pub const DEFAULT_FILE_STEM: &str = "irdai_circular_analysis";

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Text,
    Pdf,
}

impl OutputFormat {
    /// Infer the format from a file extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(OutputFormat::Markdown),
            "txt" | "text" => Some(OutputFormat::Text),
            "pdf" => Some(OutputFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Text => "txt",
            OutputFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "text/markdown",
            OutputFormat::Text => "text/plain",
            OutputFormat::Pdf => "application/pdf",
        }
    }

    /// `irdai_circular_analysis.<ext>`.
    pub fn default_file_name(self) -> String {
        format!("{}.{}", DEFAULT_FILE_STEM, self.extension())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Text => "text",
            OutputFormat::Pdf => "pdf",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "text" | "txt" => Ok(OutputFormat::Text),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(DigestError::InvalidConfig(format!(
                "unknown output format '{other}' (expected markdown, text or pdf)"
            ))),
        }
    }
}

/// PDF metadata of one source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// One successfully loaded source PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Position in the caller's input list.
    pub index: usize,
    /// Display name (file name or URL tail).
    pub name: String,
    /// The path or URL as given.
    pub source: String,
    /// Raw text of each page.
    #[serde(default, skip_serializing)]
    pub pages: Vec<String>,
    /// Text contributed to the prompt, after the optional language filter.
    #[serde(default, skip_serializing)]
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl SourceDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Statistics of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigestStats {
    pub documents_requested: usize,
    pub documents_loaded: usize,
    pub documents_failed: usize,
    pub total_pages: usize,
    /// Characters in the rendered prompt.
    pub prompt_chars: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Provider attempts, including retries.
    pub llm_attempts: u32,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of a full analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestOutput {
    /// Cleaned analysis Markdown.
    pub analysis: String,
    pub documents: Vec<SourceDocument>,
    /// Documents that failed to load; the analysis covers the others.
    pub errors: Vec<DocumentError>,
    pub stats: DigestStats,
}

impl DigestOutput {
    /// Render the analysis in `format`.
    ///
    /// # Errors
    /// For [`OutputFormat::Pdf`], any error of [`layout::render_pdf`].
    pub fn render(
        &self,
        format: OutputFormat,
        layout: &LayoutConfig,
    ) -> Result<Vec<u8>, DigestError> {
        render_analysis(&self.analysis, format, layout, false)
    }

    /// Like [`render`](Self::render), but first replaces characters the PDF
    /// fonts cannot show.
    pub fn render_repaired(
        &self,
        format: OutputFormat,
        layout: &LayoutConfig,
    ) -> Result<Vec<u8>, DigestError> {
        render_analysis(&self.analysis, format, layout, true)
    }
}

/// Render analysis Markdown in `format`.
///
/// `repair_encoding` only affects PDF output: the text goes through
/// [`layout::repair_text`] before layout.
pub fn render_analysis(
    analysis: &str,
    format: OutputFormat,
    layout: &LayoutConfig,
    repair_encoding: bool,
) -> Result<Vec<u8>, DigestError> {
    match format {
        OutputFormat::Markdown => Ok(analysis.as_bytes().to_vec()),
        OutputFormat::Text => Ok(to_plain_text(analysis).into_bytes()),
        OutputFormat::Pdf => {
            let text = strip_inline_markup(analysis);
            let text = if repair_encoding {
                layout::repair_text(&text)
            } else {
                text
            };
            layout::render_pdf(&text, layout)
        }
    }
}

// ── Plain text ───────────────────────────────────────────────────────────

static RE_HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}[ \t]+").unwrap());
static RE_LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([ \t]*)[-*+•][ \t]+").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").unwrap());
static RE_ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w*])\*([^*\s][^*]*?)\*").unwrap());
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

/// Remove emphasis, inline code and link markup, keeping the text.
///
/// Line prefixes (`##`, `-`, `1.`) are left alone.
pub fn strip_inline_markup(text: &str) -> String {
    let s = RE_BOLD.replace_all(text, |caps: &regex::Captures<'_>| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    });
    let s = RE_ITALIC.replace_all(&s, "$1$2");
    let s = RE_CODE.replace_all(&s, "$1");
    RE_LINK.replace_all(&s, "$1 ($2)").into_owned()
}

/// Render analysis Markdown as plain text.
///
/// Heading markers are dropped, bullets become `•`, inline markup is
/// stripped. Numbered items and blank lines are kept.
pub fn to_plain_text(markdown: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in markdown.lines() {
        let line = line.trim_end();
        let trimmed = line.trim_start();
        if RE_HEADING_MARKER.is_match(trimmed) {
            out.push(RE_HEADING_MARKER.replace(trimmed, "").into_owned());
        } else if RE_LIST_MARKER.is_match(line) {
            out.push(RE_LIST_MARKER.replace(line, "${1}• ").into_owned());
        } else {
            out.push(line.to_string());
        }
    }
    let joined = strip_inline_markup(&out.join("\n"));
    format!("{}\n", joined.trim_end())
}
