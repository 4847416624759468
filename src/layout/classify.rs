//! Line classification: one trimmed line of analysis text → one [`Block`].
//!
//! The LLM is asked for Markdown-style headings and bullets, so the
//! classifier only needs to look at a line's prefix. It keeps no state
//! between lines: the same line always yields the same block regardless of
//! what came before it.
//!
//! ## Prefix precedence
//!
//! Heading prefixes share characters (`## ` is a suffix of `#### `), so they
//! are tested longest first. Testing `## ` first would turn `#### Fees` into
//! an H1 reading `## Fees`.

use crate::layout::{Block, Tier};
use once_cell::sync::Lazy;
use regex::Regex;

/// Heading prefixes in match order, longest first.
const HEADING_PREFIXES: [(&str, Tier); 3] = [
    ("#### ", Tier::H3),
    ("### ", Tier::H2),
    ("## ", Tier::H1),
];

/// Bullet markers accepted from the model; both render as `•`.
const BULLET_PREFIXES: [&str; 2] = ["• ", "- "];

/// Display prefix for every bullet item.
pub const BULLET: &str = "• ";

static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.[ \t]").unwrap());

/// Classify a single line.
///
/// Returns `None` for blank lines. Every other line maps to exactly one tier;
/// [`Tier::Body`] is the catch-all.
pub fn classify_line(raw: &str) -> Option<Block> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }

    for (prefix, tier) in HEADING_PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Some(Block::new(tier, rest));
        }
    }

    for prefix in BULLET_PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Some(Block::new(Tier::ListItem, format!("{BULLET}{rest}")));
        }
    }

    // Numbered items keep their number; the model's numbering is content.
    if RE_NUMBERED.is_match(line) {
        return Some(Block::new(Tier::ListItem, line));
    }

    Some(Block::new(Tier::Body, line))
}
