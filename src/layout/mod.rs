//! Document layout: analysis text → styled, paginated PDF.
//!
//! ## Data Flow
//!
//! ```text
//! text ──▶ split lines ──▶ classify ──▶ Document ──▶ backend ──▶ PDF bytes
//!                          (per line)   (title + blocks)  (wrap, paginate)
//! ```
//!
//! 1. [`classify`] — map one trimmed line to a tier by its prefix
//! 2. [`style`]    — the immutable tier → formatting table
//! 3. [`metrics`]  — AFM widths and WinAnsi encoding for the standard fonts
//! 4. `pdf`        — the `lopdf` backend: wrapping, page breaks, serialisation
//!
//! A render call owns everything it touches: it builds its own [`Document`]
//! and reads a [`StyleTable`] by reference, so renders never share state.
//!
//! ```rust
//! use edgequake_digest::layout::{Document, Tier};
//!
//! let doc = Document::from_text("## Scope\n- All insurers", "Circular Analysis");
//! let tiers: Vec<Tier> = doc.blocks().iter().map(|b| b.tier).collect();
//! assert_eq!(tiers, vec![Tier::Title, Tier::H1, Tier::ListItem]);
//! ```

pub mod classify;
pub mod metrics;
mod pdf;
pub mod style;

pub use classify::classify_line;
pub use metrics::repair_text;
pub use style::{Alignment, FontFace, Rgb, StyleRule, StyleTable};

use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default caption of the title block.
pub const DEFAULT_TITLE: &str = "IRDAI Circular Analysis";

/// Visual and semantic category of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Title,
    /// `## ` main header.
    H1,
    /// `### ` sub-header.
    H2,
    /// `#### ` sub-sub-header.
    H3,
    Body,
    /// Bullet or numbered item.
    ListItem,
}

/// One styled unit of output text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub tier: Tier,
    pub text: String,
    /// 1-based line of the input this block came from; 0 for the title.
    pub source_line: usize,
}

impl Block {
    pub fn new(tier: Tier, text: impl Into<String>) -> Self {
        Self {
            tier,
            text: text.into(),
            source_line: 0,
        }
    }
}

/// The ordered blocks of one render: a title followed by one block per
/// non-blank input line, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Build a document from raw text and a fixed title caption.
    pub fn from_text(text: &str, title: &str) -> Self {
        let mut blocks = vec![Block::new(Tier::Title, title)];
        for (i, line) in text.lines().enumerate() {
            if let Some(mut block) = classify_line(line) {
                block.source_line = i + 1;
                blocks.push(block);
            }
        }

        if blocks.len() == 1 {
            warn!("Layout input has no non-blank lines; document holds only the title");
        }
        debug!("Classified {} blocks", blocks.len() - 1);

        Self { blocks }
    }

    /// All blocks, title first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The title block.
    pub fn title(&self) -> &Block {
        &self.blocks[0]
    }

    /// Every block after the title.
    pub fn body(&self) -> &[Block] {
        &self.blocks[1..]
    }
}

// ── Page setup ───────────────────────────────────────────────────────────

/// Standard page formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 210 × 297 mm (default).
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

/// Resolved page geometry handed to the backend. Margins are equal on all
/// four sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageSetup {
    pub fn new(size: PageSize, margin: f32) -> Self {
        let (width, height) = size.dimensions();
        Self {
            width,
            height,
            margin,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::new(PageSize::A4, 72.0)
    }
}

/// Caller-facing layout options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Caption of the title block. Never derived from the input text.
    pub title: String,
    pub page_size: PageSize,
    /// Margin on every side, in points. Default: 72 (one inch).
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            page_size: PageSize::default(),
            margin: 72.0,
        }
    }
}

impl LayoutConfig {
    /// Check the margins against the standard style table.
    pub fn validate(&self) -> Result<(), DigestError> {
        self.validate_with(&StyleTable::standard())
    }

    /// Check the margins leave room for the most indented line of `styles`
    /// and for the tallest line.
    pub fn validate_with(&self, styles: &StyleTable) -> Result<(), DigestError> {
        let setup = self.page_setup();
        let rules = [
            &styles.title,
            &styles.h1,
            &styles.h2,
            &styles.h3,
            &styles.body,
            &styles.list_item,
        ];
        let deepest = rules
            .iter()
            .map(|r| r.left_indent + r.hanging_indent)
            .fold(0.0_f32, f32::max);
        let tallest = rules.iter().map(|r| r.leading).fold(0.0_f32, f32::max);
        let min_width = deepest + 72.0;
        if self.margin.is_nan() || self.margin < 0.0 || setup.content_width() < min_width {
            return Err(DigestError::InvalidConfig(format!(
                "margin {}pt leaves {:.0}pt of text width on {:?}; need at least {:.0}pt",
                self.margin,
                setup.content_width(),
                self.page_size,
                min_width
            )));
        }
        if setup.height - 2.0 * self.margin < tallest {
            return Err(DigestError::InvalidConfig(format!(
                "margin {}pt leaves no vertical room on {:?}",
                self.margin, self.page_size
            )));
        }
        Ok(())
    }

    pub fn page_setup(&self) -> PageSetup {
        PageSetup::new(self.page_size, self.margin)
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Render analysis text to PDF bytes with the standard style table.
///
/// # Errors
/// [`DigestError::UnencodableCharacter`] if any line holds a character the
/// standard fonts cannot encode. No bytes are returned in that case; use
/// [`repair_text`] first to transliterate such characters.
pub fn render_pdf(text: &str, layout: &LayoutConfig) -> Result<Vec<u8>, DigestError> {
    render_pdf_with_styles(text, layout, &StyleTable::standard())
}

/// Render with a caller-supplied style table.
pub fn render_pdf_with_styles(
    text: &str,
    layout: &LayoutConfig,
    styles: &StyleTable,
) -> Result<Vec<u8>, DigestError> {
    layout.validate_with(styles)?;
    let document = Document::from_text(text, &layout.title);
    render_document(&document, layout, styles)
}

/// Render an already-assembled document.
pub fn render_document(
    document: &Document,
    layout: &LayoutConfig,
    styles: &StyleTable,
) -> Result<Vec<u8>, DigestError> {
    pdf::write_pdf(document, styles, &layout.page_setup())
}
