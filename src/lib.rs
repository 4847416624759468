//! # edgequake-digest
//!
//! Turn batches of regulatory circulars (PDF) into a structured analysis:
//! headers, sub-headers, key points, deadlines and compliance actions,
//! delivered as Markdown, plain text, or a styled PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs
//!  │
//!  ├─ 1. Input     resolve local files or download from URLs
//!  ├─ 2. Extract   page text via pdfium (spawn_blocking, bounded concurrency)
//!  ├─ 3. Language  optional English-only filter for bilingual circulars
//!  ├─ 4. Prompt    combined text substituted into the analysis template
//!  ├─ 5. LLM       one chat completion (Azure OpenAI / OpenAI / Anthropic / …)
//!  ├─ 6. Polish    heading / bullet / fence cleanup
//!  └─ 7. Output    Markdown, plain text, or PDF via the layout renderer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_digest::{analyze, DigestConfig, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from AZURE_OPENAI_API_KEY / OPENAI_API_KEY / …
//!     let config = DigestConfig::builder().english_only(true).build()?;
//!     let output = analyze(&["circular-1.pdf", "circular-2.pdf"], &config).await?;
//!     println!("{}", output.analysis);
//!
//!     let pdf = output.render(OutputFormat::Pdf, &config.layout)?;
//!     std::fs::write(OutputFormat::Pdf.default_file_name(), pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! The layout renderer works without any provider:
//!
//! ```rust
//! use edgequake_digest::layout::{render_pdf, LayoutConfig};
//!
//! let pdf = render_pdf("## Scope\n- All insurers", &LayoutConfig::default()).unwrap();
//! assert!(pdf.starts_with(b"%PDF"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `digest` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-digest = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze, analyze_from_bytes, analyze_sync, analyze_text, analyze_to_file, inspect,
    load_documents,
};
pub use config::{DigestConfig, DigestConfigBuilder, EmptyFilterPolicy};
pub use error::{DigestError, DocumentError};
pub use layout::{render_pdf, LayoutConfig, PageSize};
pub use output::{DigestOutput, DigestStats, DocumentMetadata, OutputFormat, SourceDocument};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
