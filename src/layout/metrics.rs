//! Glyph metrics and WinAnsi encoding for the two standard fonts.
//!
//! The backend writes Helvetica and Helvetica-Bold as non-embedded Type1
//! fonts with `/WinAnsiEncoding`, so every character must map to one byte
//! of that encoding and every width comes from the Adobe AFM tables.
//!
//! Width tables cover ASCII 0x20..=0x7E (95 printable characters), in
//! 1/1000 em. Index = (byte as usize) - 32. The upper half of WinAnsi is
//! handled by [`upper_width`], which lists the glyphs that show up in
//! regulatory text and falls back to an average width for the rest.

use crate::error::DigestError;
use crate::layout::style::FontFace;

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Byte code of the space glyph; `Tw` word spacing applies only to it.
pub const SPACE: u8 = 0x20;

/// Fallback for upper-half glyphs without a listed width.
const AVERAGE_WIDTH: u16 = 556;

/// Width of one encoded byte in 1/1000 em.
pub fn glyph_width(font: FontFace, code: u8) -> u16 {
    match code {
        0x20..=0x7E => {
            let table = match font {
                FontFace::Regular => &HELVETICA,
                FontFace::Bold => &HELVETICA_BOLD,
            };
            table[(code - 0x20) as usize]
        }
        _ => upper_width(font, code),
    }
}

fn upper_width(font: FontFace, code: u8) -> u16 {
    let bold = font == FontFace::Bold;
    match code {
        0x95 => 350,                                   // bullet
        0x96 | 0x80 => 556,                            // endash, Euro
        0x97 | 0x85 | 0x89 => 1000,                    // emdash, ellipsis, perthousand
        0x91 | 0x92 | 0x82 => if bold { 278 } else { 222 },
        0x93 | 0x94 | 0x84 => if bold { 500 } else { 333 },
        0xA0 => 278,                                   // nbsp
        0xA9 | 0xAE => 737,                            // copyright, registered
        0xB0 => 400,                                   // degree
        0xD7 => 584,                                   // multiply
        _ => AVERAGE_WIDTH,
    }
}

/// Width of encoded text at `size` points.
pub fn text_width(font: FontFace, bytes: &[u8], size: f32) -> f32 {
    let units: u32 = bytes.iter().map(|&b| glyph_width(font, b) as u32).sum();
    units as f32 * size / 1000.0
}

/// Encode one character as a WinAnsi byte.
pub fn encode_char(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        // Tabs survive trimming inside a line; render them as a space.
        0x09 => Some(SPACE),
        _ => match ch {
            '€' => Some(0x80),
            '‚' => Some(0x82),
            'ƒ' => Some(0x83),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '†' => Some(0x86),
            '‡' => Some(0x87),
            'ˆ' => Some(0x88),
            '‰' => Some(0x89),
            'Š' => Some(0x8A),
            '‹' => Some(0x8B),
            'Œ' => Some(0x8C),
            'Ž' => Some(0x8E),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '˜' => Some(0x98),
            '™' => Some(0x99),
            'š' => Some(0x9A),
            '›' => Some(0x9B),
            'œ' => Some(0x9C),
            'ž' => Some(0x9E),
            'Ÿ' => Some(0x9F),
            _ => None,
        },
    }
}

/// Encode a whole string, failing on the first character without a code.
///
/// `line` is the 1-based input line reported in the error.
pub fn encode_str(text: &str, line: usize) -> Result<Vec<u8>, DigestError> {
    text.chars()
        .map(|ch| encode_char(ch).ok_or_else(|| DigestError::unencodable(line, ch)))
        .collect()
}

/// Replace characters the PDF fonts cannot show.
///
/// Common symbols in Indian regulatory text are transliterated; anything
/// else without a WinAnsi code becomes `?`. Text that already encodes is
/// returned unchanged, except that a lone `\r` becomes `\n`.
pub fn repair_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        // A lone CR is a line break; `str::lines` only splits on LF.
        if ch == '\r' && chars.peek() != Some(&'\n') {
            out.push('\n');
            continue;
        }
        if ch == '\n' || ch == '\r' || encode_char(ch).is_some() {
            out.push(ch);
            continue;
        }
        match ch {
            '₹' => out.push_str("Rs."),
            '●' | '▪' | '◦' | '○' | '■' | '‣' | '∙' => out.push('•'),
            '−' | '‐' | '‑' | '‒' => out.push('-'),
            '≤' => out.push_str("<="),
            '≥' => out.push_str(">="),
            '≠' => out.push_str("!="),
            '→' => out.push_str("->"),
            '←' => out.push_str("<-"),
            '✓' | '✔' => out.push_str("[x]"),
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' => {}
            '\u{2009}' | '\u{202F}' | '\u{2002}' | '\u{2003}' => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}
