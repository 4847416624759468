//! Layout backend: wrap, paginate and serialise a [`Document`] with `lopdf`.
//!
//! The backend places each block in flow from the top margin down. Lines
//! are broken greedily on spaces using the AFM widths in
//! [`super::metrics`]; a word wider than the line is split across lines.
//! Justified blocks stretch every line but the last with the `Tw`
//! word-spacing operator, which WinAnsi-encoded fonts apply to byte 0x20.
//!
//! Every block is encoded before the first page is written, so an
//! unencodable character fails the render without partial output.
//!
//! Nothing time- or randomness-dependent goes into the file (no creation
//! date, no `/ID`), so the same blocks always produce the same bytes.

use crate::error::DigestError;
use crate::layout::metrics::{self, SPACE};
use crate::layout::style::{Alignment, FontFace, StyleRule, StyleTable};
use crate::layout::{Document, PageSetup};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

const PRODUCER: &str = concat!("edgequake-digest ", env!("CARGO_PKG_VERSION"));

/// One output line after wrapping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WrappedLine {
    pub bytes: Vec<u8>,
    /// Natural width in points, without justification.
    pub width: f32,
    pub spaces: usize,
}

/// Render `document` to PDF bytes.
pub(crate) fn write_pdf(
    document: &Document,
    styles: &StyleTable,
    page: &PageSetup,
) -> Result<Vec<u8>, DigestError> {
    let encoded = document
        .blocks()
        .iter()
        .map(|b| metrics::encode_str(&b.text, b.source_line))
        .collect::<Result<Vec<_>, _>>()?;

    let mut flow = Flow::new(page);
    for (block, bytes) in document.blocks().iter().zip(&encoded) {
        flow.place_block(styles.rule(block.tier), bytes);
    }
    let pages = flow.finish();
    debug!(
        "Laid out {} blocks on {} page(s)",
        document.blocks().len(),
        pages.len()
    );

    serialise(pages, page, encoded.first().map(Vec::as_slice).unwrap_or(&[]))
}

// ── Line breaking ────────────────────────────────────────────────────────

/// Break encoded text into lines no wider than the given widths.
///
/// The first line gets `first_width`, every following line `rest_width`.
/// Runs of spaces collapse to one.
pub(crate) fn wrap(
    bytes: &[u8],
    font: FontFace,
    size: f32,
    first_width: f32,
    rest_width: f32,
) -> Vec<WrappedLine> {
    let space_w = metrics::text_width(font, &[SPACE], size);
    let mut lines = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut current_w = 0.0f32;
    let mut spaces = 0usize;

    let limit = |lines: &Vec<WrappedLine>| {
        if lines.is_empty() {
            first_width
        } else {
            rest_width
        }
    };

    for word in bytes.split(|&b| b == SPACE).filter(|w| !w.is_empty()) {
        let word_w = metrics::text_width(font, word, size);

        if !current.is_empty() && current_w + space_w + word_w <= limit(&lines) {
            current.push(SPACE);
            current.extend_from_slice(word);
            current_w += space_w + word_w;
            spaces += 1;
            continue;
        }

        if !current.is_empty() {
            lines.push(WrappedLine {
                bytes: std::mem::take(&mut current),
                width: current_w,
                spaces,
            });
            spaces = 0;
        }

        // Split words that cannot fit on an empty line.
        let mut rest = word;
        while rest.len() > 1 && metrics::text_width(font, rest, size) > limit(&lines) {
            let cut = fitting_prefix(rest, font, size, limit(&lines));
            lines.push(WrappedLine {
                bytes: rest[..cut].to_vec(),
                width: metrics::text_width(font, &rest[..cut], size),
                spaces: 0,
            });
            rest = &rest[cut..];
        }
        current.extend_from_slice(rest);
        current_w = metrics::text_width(font, rest, size);
    }

    if !current.is_empty() {
        lines.push(WrappedLine {
            bytes: current,
            width: current_w,
            spaces,
        });
    }
    lines
}

/// Length of the longest prefix of `word` that fits in `width`; at least 1.
fn fitting_prefix(word: &[u8], font: FontFace, size: f32, width: f32) -> usize {
    let mut used = 0.0;
    for (i, &b) in word.iter().enumerate() {
        used += metrics::glyph_width(font, b) as f32 * size / 1000.0;
        if used > width {
            return i.max(1);
        }
    }
    word.len()
}

// ── Pagination ───────────────────────────────────────────────────────────

struct Flow<'a> {
    page: &'a PageSetup,
    done: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    /// Top of the next line, in PDF user space (origin bottom-left).
    y: f32,
    at_top: bool,
}

impl<'a> Flow<'a> {
    fn new(page: &'a PageSetup) -> Self {
        Self {
            page,
            done: Vec::new(),
            current: Vec::new(),
            y: page.height - page.margin,
            at_top: true,
        }
    }

    fn new_page(&mut self) {
        self.done.push(std::mem::take(&mut self.current));
        self.y = self.page.height - self.page.margin;
        self.at_top = true;
    }

    fn place_block(&mut self, rule: &StyleRule, bytes: &[u8]) {
        if !self.at_top {
            self.y -= rule.space_before;
        }

        let content_w = self.page.content_width();
        let first_w = content_w - rule.left_indent;
        let rest_w = first_w - rule.hanging_indent;
        let lines = wrap(bytes, rule.font, rule.font_size, first_w, rest_w);
        let count = lines.len();

        for (i, line) in lines.into_iter().enumerate() {
            if self.y - rule.leading < self.page.margin {
                self.new_page();
            }
            let baseline = self.y - rule.font_size;
            self.y -= rule.leading;
            self.at_top = false;

            let indent = if i == 0 {
                rule.left_indent
            } else {
                rule.left_indent + rule.hanging_indent
            };
            let avail = content_w - indent;
            let is_last = i + 1 == count;

            let (x, word_spacing) = match rule.alignment {
                Alignment::Left => (self.page.margin + indent, 0.0),
                Alignment::Center => (
                    self.page.margin + indent + ((avail - line.width) / 2.0).max(0.0),
                    0.0,
                ),
                Alignment::Justify if !is_last && line.spaces > 0 => (
                    self.page.margin + indent,
                    ((avail - line.width) / line.spaces as f32).max(0.0),
                ),
                Alignment::Justify => (self.page.margin + indent, 0.0),
            };

            self.emit_line(rule, line.bytes, x, baseline, word_spacing);
        }

        self.y -= rule.space_after;
    }

    fn emit_line(&mut self, rule: &StyleRule, bytes: Vec<u8>, x: f32, y: f32, word_spacing: f32) {
        let ops = &mut self.current;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![
                Object::Name(rule.font.resource_name().as_bytes().to_vec()),
                Object::Real(rule.font_size),
            ],
        ));
        ops.push(Operation::new(
            "rg",
            vec![
                Object::Real(rule.color.0),
                Object::Real(rule.color.1),
                Object::Real(rule.color.2),
            ],
        ));
        ops.push(Operation::new("Tw", vec![Object::Real(round2(word_spacing))]));
        ops.push(Operation::new(
            "Td",
            vec![Object::Real(round2(x)), Object::Real(round2(y))],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(bytes, StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        self.done.push(self.current);
        self.done
    }
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

// ── Serialisation ────────────────────────────────────────────────────────

fn serialise(
    pages: Vec<Vec<Operation>>,
    setup: &PageSetup,
    title: &[u8],
) -> Result<Vec<u8>, DigestError> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(FontFace::Regular));
    let bold_id = doc.add_object(font_dictionary(FontFace::Bold));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FontFace::Regular.resource_name() => regular_id,
            FontFace::Bold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| DigestError::PdfWriteFailed(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(setup.width),
                Object::Real(setup.height),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(title.to_vec(), StringFormat::Literal),
        "Producer" => Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| DigestError::PdfWriteFailed(e.to_string()))?;
    Ok(buf)
}

fn font_dictionary(face: FontFace) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}
