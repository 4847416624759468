//! English-only line filter for bilingual circulars.
//!
//! IRDAI circulars usually carry the Hindi text and the English text side by
//! side, and pdfium returns both interleaved. [`filter_english`] keeps the
//! English lines.
//!
//! Detection works on script statistics: the share of Devanagari, Latin and
//! other letters in a line, plus the share of English function words among
//! Latin words. A line that is too short or too mixed to call comes back as
//! [`Detection::Undetermined`], and only then does the keyword heuristic in
//! [`looks_english`] decide.

use crate::config::EmptyFilterPolicy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Letters needed before script statistics are trusted.
const MIN_LETTERS: usize = 4;

/// Share of one script above which a line is attributed to it.
const DOMINANT_SHARE: f32 = 0.7;

/// Share of English function words among Latin words for a positive call.
const STOPWORD_SHARE: f32 = 0.12;

/// Latin words needed before the function-word share is meaningful.
const MIN_WORDS: usize = 3;

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "all", "an", "and", "any", "are", "as", "at", "be", "been", "by", "for", "from", "has",
    "have", "in", "is", "it", "its", "may", "no", "not", "of", "on", "or", "shall", "such",
    "that", "the", "their", "this", "to", "under", "which", "with", "within",
];

const DOMAIN_KEYWORDS: &[&str] = &[
    "irdai",
    "insurer",
    "insurance",
    "circular",
    "authority",
    "regulation",
    "policyholder",
    "compliance",
    "intermediar",
    "premium",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    Hindi,
    /// Any other script, or Latin text that is clearly not English.
    Other,
}

/// Outcome of detecting the language of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Detected(Language),
    Undetermined,
}

#[derive(Debug, Default, Clone, Copy)]
struct ScriptCounts {
    latin: usize,
    devanagari: usize,
    other: usize,
}

impl ScriptCounts {
    fn of(text: &str) -> Self {
        let mut counts = Self::default();
        for ch in text.chars().filter(|c| c.is_alphabetic()) {
            match ch as u32 {
                0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F => counts.latin += 1,
                0x0900..=0x097F | 0xA8E0..=0xA8FF => counts.devanagari += 1,
                _ => counts.other += 1,
            }
        }
        counts
    }

    fn total(&self) -> usize {
        self.latin + self.devanagari + self.other
    }

    fn share(&self, n: usize) -> f32 {
        match self.total() {
            0 => 0.0,
            total => n as f32 / total as f32,
        }
    }
}

/// Detect the language of a single line.
pub fn detect(line: &str) -> Detection {
    let counts = ScriptCounts::of(line);
    if counts.total() < MIN_LETTERS {
        return Detection::Undetermined;
    }

    if counts.share(counts.devanagari) >= DOMINANT_SHARE {
        return Detection::Detected(Language::Hindi);
    }
    if counts.share(counts.other) >= DOMINANT_SHARE {
        return Detection::Detected(Language::Other);
    }
    if counts.share(counts.latin) < DOMINANT_SHARE {
        return Detection::Undetermined;
    }

    let words: Vec<String> = line
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.len() < MIN_WORDS {
        return Detection::Undetermined;
    }

    let stop = words
        .iter()
        .filter(|w| ENGLISH_STOPWORDS.contains(&w.as_str()))
        .count();
    if stop as f32 / words.len() as f32 >= STOPWORD_SHARE {
        Detection::Detected(Language::English)
    } else {
        Detection::Undetermined
    }
}

/// Keyword and character-share heuristic for lines detection cannot call.
///
/// True when the line names a domain keyword, or when most of its letters
/// are ASCII.
pub fn looks_english(line: &str) -> bool {
    let lower = line.to_lowercase();
    if DOMAIN_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    if letters == 0 {
        // Numbers, dates and references ("2024-25", "Ref. No. 12") carry
        // no language and stay with their neighbours.
        return line.chars().any(|c| c.is_ascii_alphanumeric());
    }
    let ascii = line.chars().filter(|c| c.is_ascii_alphabetic()).count();
    ascii as f32 / letters as f32 >= DOMINANT_SHARE
}

/// Whether a non-blank line should be kept by the English-only filter.
pub fn is_english(line: &str) -> bool {
    match detect(line) {
        Detection::Detected(lang) => lang == Language::English,
        Detection::Undetermined => looks_english(line),
    }
}

/// Keep the English lines of `text`. Blank lines are preserved.
///
/// If no non-blank line survives, `policy` decides between returning the
/// input unchanged and returning an empty string.
pub fn filter_english(text: &str, policy: EmptyFilterPolicy) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut dropped = 0usize;
    let mut kept_content = 0usize;

    for line in text.lines() {
        if line.trim().is_empty() {
            kept.push(line);
        } else if is_english(line) {
            kept.push(line);
            kept_content += 1;
        } else {
            dropped += 1;
        }
    }

    if kept_content == 0 && dropped > 0 {
        return match policy {
            EmptyFilterPolicy::KeepOriginal => {
                warn!(
                    "English-only filter matched none of {} lines; keeping original text",
                    dropped
                );
                text.to_string()
            }
            EmptyFilterPolicy::Drop => {
                warn!(
                    "English-only filter matched none of {} lines; dropping text",
                    dropped
                );
                String::new()
            }
        };
    }

    debug!("Language filter kept {} lines, dropped {}", kept_content, dropped);
    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_sentence_is_detected() {
        assert_eq!(
            detect("This circular applies to all insurers registered with the Authority."),
            Detection::Detected(Language::English)
        );
    }

    #[test]
    fn hindi_sentence_is_detected() {
        assert_eq!(
            detect("यह परिपत्र सभी बीमाकर्ताओं पर लागू होता है।"),
            Detection::Detected(Language::Hindi)
        );
    }

    #[test]
    fn short_or_reference_lines_are_undetermined() {
        assert_eq!(detect("Ref."), Detection::Undetermined);
        assert_eq!(detect("IRDAI/HLT/CIR/MISC/112/2024"), Detection::Undetermined);
        assert_eq!(detect("12.03.2024"), Detection::Undetermined);
    }

    #[test]
    fn mixed_script_is_undetermined() {
        assert_eq!(detect("बीमा नियामक Insurance"), Detection::Undetermined);
    }

    #[test]
    fn fallback_uses_keywords_and_ascii_share() {
        assert!(looks_english("IRDAI/HLT/CIR/MISC/112/2024"));
        assert!(looks_english("बीमा नियामक Insurance"));
        assert!(looks_english("12.03.2024"));
        assert!(!looks_english("भारतीय बीमा विनियामक"));
    }

    #[test]
    fn filter_keeps_english_lines_and_blanks() {
        let text = "भारतीय बीमा विनियामक और विकास प्राधिकरण\n\
                    Insurance Regulatory and Development Authority of India\n\
                    \n\
                    यह परिपत्र सभी बीमाकर्ताओं पर लागू होता है।\n\
                    This circular applies to all insurers.";
        let out = filter_english(text, EmptyFilterPolicy::KeepOriginal);
        assert_eq!(
            out,
            "Insurance Regulatory and Development Authority of India\n\
             \n\
             This circular applies to all insurers."
        );
    }

    #[test]
    fn all_dropped_keeps_original_by_default() {
        let text = "यह परिपत्र सभी बीमाकर्ताओं पर लागू होता है।";
        assert_eq!(filter_english(text, EmptyFilterPolicy::default()), text);
    }

    #[test]
    fn all_dropped_with_drop_policy_is_empty() {
        let text = "यह परिपत्र सभी बीमाकर्ताओं पर लागू होता है।";
        assert_eq!(filter_english(text, EmptyFilterPolicy::Drop), "");
    }

    #[test]
    fn blank_input_is_unchanged() {
        assert_eq!(filter_english("", EmptyFilterPolicy::Drop), "");
        assert_eq!(filter_english("\n\n", EmptyFilterPolicy::Drop), "\n");
    }
}
