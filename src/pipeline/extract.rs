//! Text extraction: read the text layer and metadata of a PDF via pdfium.
//!
//! pdfium is a blocking C library, so every call here goes through
//! `tokio::task::spawn_blocking`. Each call binds its own `Pdfium` handle;
//! nothing is shared between documents being extracted concurrently.

use crate::error::DigestError;
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Page text and metadata of one PDF.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Text of each page, in page order.
    pub pages: Vec<String>,
    pub metadata: DocumentMetadata,
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` when set, otherwise the system library.
pub fn bind_pdfium() -> Result<Pdfium, DigestError> {
    if let Ok(lib) = std::env::var(PDFIUM_LIB_ENV) {
        let path = PathBuf::from(&lib);
        if path.exists() {
            debug!("Binding pdfium from {}", path.display());
            return Pdfium::bind_to_library(&path)
                .map(Pdfium::new)
                .map_err(|e| {
                    DigestError::PdfiumBindingFailed(format!("{}: {}", path.display(), e))
                });
        }
        warn!("{} '{}' does not exist; trying the system library", PDFIUM_LIB_ENV, lib);
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| DigestError::PdfiumBindingFailed(e.to_string()))
}

/// Extract the text of every page plus document metadata.
pub async fn extract_document(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedText, DigestError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| DigestError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract only the metadata.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, DigestError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open(&pdfium, &path, pwd.as_deref())?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| DigestError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_blocking(pdf_path: &Path, password: Option<&str>) -> Result<ExtractedText, DigestError> {
    let pdfium = bind_pdfium()?;
    let document = open(&pdfium, pdf_path, password)?;
    let metadata = read_metadata(&document);
    info!(
        "PDF loaded: {} ({} pages)",
        pdf_path.display(),
        metadata.page_count
    );

    let mut pages = Vec::with_capacity(metadata.page_count);
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| DigestError::TextExtractionFailed {
                path: pdf_path.to_path_buf(),
                page: idx + 1,
                detail: e.to_string(),
            })?
            .all();
        debug!("Page {}: {} chars", idx + 1, text.len());
        pages.push(text);
    }

    if pages.iter().all(|p| p.trim().is_empty()) {
        warn!(
            "{} has no text layer (scanned document?)",
            pdf_path.display()
        );
    }

    Ok(ExtractedText { pages, metadata })
}

fn open<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, DigestError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                DigestError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                DigestError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            DigestError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}
