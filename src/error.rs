//! Error types for the edgequake-digest library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DigestError`] — **Fatal**: the analysis cannot proceed at all
//!   (no document could be loaded, provider not configured, the layout
//!   backend could not place a character). Returned as `Err(DigestError)`
//!   from the top-level `analyze*` and `render*` functions.
//!
//! * [`DocumentError`] — **Non-fatal**: one source PDF failed to load but the
//!   others are fine. Stored in [`crate::output::DigestOutput::errors`] so a
//!   batch of circulars is not lost to one corrupt upload.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-digest library.
#[derive(Debug, Error)]
pub enum DigestError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium could not produce the text layer of a page.
    #[error("Text extraction failed for page {page} of '{path}': {detail}")]
    TextExtractionFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// Every requested document failed to load.
    #[error("None of the {total} documents could be loaded.\nFirst error: {first_error}")]
    NoDocumentsLoaded { total: usize, first_error: String },

    /// Documents loaded but contained no text (scanned images, or everything
    /// was removed by the language filter).
    #[error("No extractable text found in {documents} document(s)")]
    NoExtractableText { documents: usize },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error on every attempt.
    #[error("LLM API error after {attempts} attempt(s): {message}")]
    LlmApiError { attempts: u32, message: String },

    /// The LLM call did not return within the configured timeout.
    #[error("LLM call timed out after {secs}s\nIncrease --api-timeout.")]
    ApiTimeout { secs: u64 },

    /// The provider answered with an empty completion.
    #[error("LLM returned an empty analysis")]
    EmptyAnalysis,

    // ── Render errors ─────────────────────────────────────────────────────
    /// The layout backend has no glyph code for a character.
    ///
    /// Raised before any bytes are produced; callers can pass the text
    /// through [`crate::layout::repair_text`] and render again.
    #[error(
        "Line {line}: character {ch:?} (U+{code:04X}) cannot be encoded by the PDF fonts\n\
Re-run with --repair-encoding to transliterate unsupported characters."
    )]
    UnencodableCharacter { line: usize, ch: char, code: u32 },

    /// The PDF object model could not be serialised.
    #[error("Failed to serialise PDF: {0}")]
    PdfWriteFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs the pdfium shared library. You can:\n\
  • Install pdfium system-wide (libpdfium.so / libpdfium.dylib / pdfium.dll).\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DigestError {
    /// Build an [`DigestError::UnencodableCharacter`] for `ch` on a 1-based line.
    pub fn unencodable(line: usize, ch: char) -> Self {
        DigestError::UnencodableCharacter {
            line,
            ch,
            code: ch as u32,
        }
    }
}

/// A non-fatal error for a single source document.
///
/// Stored in [`crate::output::DigestOutput::errors`]. The analysis continues
/// unless every document fails.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The input could not be resolved or opened.
    #[error("{name}: could not be loaded: {detail}")]
    LoadFailed { name: String, detail: String },

    /// The PDF opened but its text layer could not be read.
    #[error("{name}: text extraction failed: {detail}")]
    ExtractFailed { name: String, detail: String },
}

impl DocumentError {
    /// The document name (path or URL as given by the caller).
    pub fn name(&self) -> &str {
        match self {
            DocumentError::LoadFailed { name, .. } | DocumentError::ExtractFailed { name, .. } => {
                name
            }
        }
    }

    /// Classify a fatal pipeline error for a single document as non-fatal.
    pub fn from_digest_error(name: &str, err: &DigestError) -> Self {
        match err {
            DigestError::TextExtractionFailed { .. } => DocumentError::ExtractFailed {
                name: name.to_string(),
                detail: err.to_string(),
            },
            _ => DocumentError::LoadFailed {
                name: name.to_string(),
                detail: err.to_string(),
            },
        }
    }
}
