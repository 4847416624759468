//! Pipeline stages for circular analysis.
//!
//! Each submodule implements one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ language ──▶ llm ──▶ postprocess
//! (URL/path)  (pdfium)   (optional)   (chat)   (cleanup)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]  — page text and metadata; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`language`] — keep only the English half of bilingual circulars
//! 4. [`llm`]      — the single chat completion, with timeout and retry
//! 5. [`postprocess`] — deterministic rules bringing the answer back to the
//!    heading and bullet conventions the layout renderer understands

pub mod extract;
pub mod input;
pub mod language;
pub mod llm;
pub mod postprocess;
