//! CLI binary for edgequake-digest.
//!
//! A thin shim over the library crate that maps CLI flags to `DigestConfig`,
//! runs the analysis and writes the chosen output format.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_digest::analyze::write_atomic;
use edgequake_digest::output::render_analysis;
use edgequake_digest::{
    analyze, inspect, AnalysisProgressCallback, DigestConfig, DigestOutput, LayoutConfig,
    OutputFormat, PageSize, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar step per document, then a spinner while the
/// model writes the analysis.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, total_documents: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_documents as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Loading");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Loading {total_documents} document(s)…"))
        ));
    }

    fn on_document_loaded(&self, _index: usize, name: &str, pages: usize) {
        self.bar.println(format!(
            "  {} {:<40}  {}",
            green("✓"),
            name,
            dim(&format!("{pages} pages"))
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, _index: usize, name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let first_line = error.lines().next().unwrap_or(error);
        let msg: String = if first_line.chars().count() > 80 {
            first_line.chars().take(79).chain(['…']).collect()
        } else {
            first_line.to_string()
        };
        self.bar
            .println(format!("  {} {:<40}  {}", red("✗"), name, red(&msg)));
        self.bar.inc(1);
    }

    fn on_llm_start(&self, prompt_chars: usize) {
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        self.bar.set_prefix("Analyzing");
        self.bar
            .set_message(format!("{prompt_chars} prompt chars sent to the LLM"));
    }

    fn on_llm_complete(&self, output_chars: usize) {
        self.bar.set_message(format!("{output_chars} chars received"));
    }

    fn on_analysis_complete(&self, loaded: usize, failed: usize) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} document(s) analyzed",
                green("✔"),
                bold(&loaded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} document(s) analyzed  ({} skipped)",
                cyan("⚠"),
                bold(&loaded.to_string()),
                loaded + failed,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze two circulars, Markdown to stdout
  digest circular-1.pdf circular-2.pdf

  # Styled PDF report (format from extension)
  digest circulars/*.pdf -o irdai_circular_analysis.pdf

  # Bilingual circulars: keep only the English text
  digest --english-only master-circular.pdf -o analysis.md

  # Azure OpenAI deployment
  digest --provider azure --model gpt-35-turbo \
    --azure-endpoint https://myres.openai.azure.com --azure-api-version 2023-05-15 circular.pdf

  # Download from a URL
  digest https://irdai.gov.in/documents/circular.pdf -o analysis.txt

  # Re-render an existing analysis without calling the LLM
  digest --render-only analysis.md -o analysis.pdf --repair-encoding

  # Inspect PDF metadata (no API key needed)
  digest --inspect-only circular.pdf

OUTPUT FORMATS:
  .md / .markdown   analysis as returned by the model, cleaned
  .txt              plain text (heading markers and emphasis removed)
  .pdf              styled report: title, three heading levels, body, lists

  Without -o, Markdown and text go to stdout and PDF is written to
  ./irdai_circular_analysis.pdf.

ENVIRONMENT VARIABLES:
  AZURE_OPENAI_API_KEY          Azure OpenAI API key (preferred when set)
  AZURE_OPENAI_DEPLOYMENT_NAME  Azure deployment used when --model is absent
  AZURE_OPENAI_ENDPOINT         Azure resource URL used when --azure-endpoint is absent
  AZURE_OPENAI_API_VERSION      Azure API version used when --azure-api-version is absent
  OPENAI_API_KEY                OpenAI API key
  ANTHROPIC_API_KEY             Anthropic API key
  EDGEQUAKE_LLM_PROVIDER        Override provider (azure, openai, anthropic, ollama)
  EDGEQUAKE_MODEL               Override model ID
  PDFIUM_LIB_PATH               Path to libpdfium; otherwise the system library
  DIGEST_*                      Every flag, e.g. DIGEST_ENGLISH_ONLY=true
"#;

/// Analyze regulatory circulars (PDF) with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "digest",
    version,
    about = "Analyze regulatory circulars (PDF) into structured Markdown, text or PDF",
    long_about = "Extract the text of one or more PDF circulars (local files or URLs), ask an LLM \
to organise it under headers and sub-headers with key points, deadlines and compliance actions, \
and write the analysis as Markdown, plain text, or a styled PDF report. Supports Azure OpenAI, \
OpenAI, Anthropic, Gemini and any edgequake-llm provider.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file paths or HTTP/HTTPS URLs.
    #[arg(required_unless_present = "render_only")]
    inputs: Vec<String>,

    /// Write the analysis to this file instead of stdout.
    #[arg(short, long, env = "DIGEST_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format; inferred from the --output extension when absent.
    #[arg(long, env = "DIGEST_FORMAT", value_enum)]
    format: Option<FormatArg>,

    /// LLM model or Azure deployment (e.g. gpt-35-turbo, gpt-4.1-mini).
    #[arg(long, env = "DIGEST_MODEL")]
    model: Option<String>,

    /// LLM provider: azure, openai, anthropic, gemini, ollama.
    #[arg(
        long,
        env = "DIGEST_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: azure, openai, anthropic, gemini, ollama, or any edgequake-llm provider."
    )]
    provider: Option<String>,

    /// Azure OpenAI resource URL (e.g. https://myres.openai.azure.com).
    #[arg(long, env = "DIGEST_AZURE_ENDPOINT")]
    azure_endpoint: Option<String>,

    /// Azure OpenAI API version (e.g. 2023-05-15, 2023-07-01-preview, 2023-08-01-preview).
    #[arg(long, env = "DIGEST_AZURE_API_VERSION")]
    azure_api_version: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DIGEST_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max tokens the model may generate.
    #[arg(long, env = "DIGEST_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: usize,

    /// Retries on LLM failure.
    #[arg(long, env = "DIGEST_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// LLM call timeout in seconds.
    #[arg(long, env = "DIGEST_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DIGEST_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DIGEST_PASSWORD")]
    password: Option<String>,

    /// Text file with a custom prompt template containing {document_content}.
    #[arg(long, env = "DIGEST_PROMPT_TEMPLATE")]
    prompt_template: Option<PathBuf>,

    /// Keep only the English lines of bilingual circulars.
    #[arg(long, env = "DIGEST_ENGLISH_ONLY")]
    english_only: bool,

    /// Documents extracted at once.
    #[arg(short, long, env = "DIGEST_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Title caption of the PDF report.
    #[arg(long, env = "DIGEST_TITLE", default_value = edgequake_digest::layout::DEFAULT_TITLE)]
    title: String,

    /// PDF page size.
    #[arg(long, env = "DIGEST_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// PDF margin on every side, in points.
    #[arg(long, env = "DIGEST_MARGIN", default_value_t = 72.0)]
    margin: f32,

    /// Transliterate characters the PDF fonts cannot show (₹ → Rs., others → ?).
    #[arg(long, env = "DIGEST_REPAIR_ENCODING")]
    repair_encoding: bool,

    /// Render an existing Markdown/text analysis file; no LLM call.
    #[arg(long, value_name = "FILE", conflicts_with = "inspect_only")]
    render_only: Option<PathBuf>,

    /// Print PDF metadata only, no analysis.
    #[arg(long)]
    inspect_only: bool,

    /// Output structured JSON (DigestOutput) instead of the analysis text.
    #[arg(long, env = "DIGEST_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DIGEST_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DIGEST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DIGEST_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Markdown,
    Text,
    Pdf,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Pdf => OutputFormat::Pdf,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs would interleave with the progress bar.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.render_only.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let layout = LayoutConfig {
        title: cli.title.clone(),
        page_size: cli.page_size.into(),
        margin: cli.margin,
    };
    layout.validate().context("Invalid page layout")?;

    let format = output_format(&cli);

    // ── Render-only mode ─────────────────────────────────────────────────
    if let Some(ref source) = cli.render_only {
        let text = tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read {}", source.display()))?;
        let bytes = render_analysis(&text, format, &layout, cli.repair_encoding)
            .with_context(|| format!("Failed to render {}", source.display()))?;
        emit(&cli, format, &bytes).await?;
        return Ok(());
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        return inspect_all(&cli).await;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, layout, progress_cb).await?;

    // ── Run analysis ─────────────────────────────────────────────────────
    let output = analyze(&cli.inputs, &config)
        .await
        .context("Analysis failed")?;

    if !show_progress && !cli.quiet {
        for err in &output.errors {
            eprintln!("{} {}", red("✗"), err);
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let bytes = if cli.repair_encoding {
            output.render_repaired(format, &config.layout)
        } else {
            output.render(format, &config.layout)
        }
        .context("Failed to render the analysis")?;
        emit(&cli, format, &bytes).await?;
    }

    if !cli.quiet && !cli.json {
        print_summary(&output);
    }

    Ok(())
}

/// Explicit `--format`, then the `--output` extension, then Markdown.
fn output_format(cli: &Cli) -> OutputFormat {
    cli.format
        .map(OutputFormat::from)
        .or_else(|| cli.output.as_deref().and_then(OutputFormat::from_path))
        .unwrap_or_default()
}

/// Write rendered bytes: to `--output`, to stdout for text formats, or to the
/// default file name for PDF.
async fn emit(cli: &Cli, format: OutputFormat, bytes: &[u8]) -> Result<()> {
    let target: Option<PathBuf> = match (&cli.output, format) {
        (Some(path), _) => Some(path.clone()),
        (None, OutputFormat::Pdf) => Some(PathBuf::from(format.default_file_name())),
        (None, _) => None,
    };

    match target {
        Some(path) => {
            write_atomic(&path, bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} bytes  →  {}",
                    green("✔"),
                    bytes.len(),
                    bold(&path.display().to_string())
                );
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(bytes)
                .context("Failed to write to stdout")?;
            if !bytes.ends_with(b"\n") {
                handle.write_all(b"\n").ok();
            }
        }
    }
    Ok(())
}

async fn inspect_all(cli: &Cli) -> Result<()> {
    let mut all = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let meta = inspect(input)
            .await
            .with_context(|| format!("Failed to inspect {input}"))?;
        all.push((input.clone(), meta));
    }

    if cli.json {
        let json: Vec<_> = all
            .iter()
            .map(|(input, meta)| serde_json::json!({ "input": input, "metadata": meta }))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialize metadata")?
        );
        return Ok(());
    }

    for (i, (input, meta)) in all.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("File:         {}", input);
        if let Some(ref t) = meta.title {
            println!("Title:        {}", t);
        }
        if let Some(ref a) = meta.author {
            println!("Author:       {}", a);
        }
        if let Some(ref s) = meta.subject {
            println!("Subject:      {}", s);
        }
        println!("Pages:        {}", meta.page_count);
        println!("PDF Version:  {}", meta.pdf_version);
        if let Some(ref d) = meta.creation_date {
            println!("Created:      {}", d);
        }
        if let Some(ref p) = meta.producer {
            println!("Producer:     {}", p);
        }
    }
    Ok(())
}

fn print_summary(output: &DigestOutput) {
    let stats = &output.stats;
    eprintln!(
        "   {} pages  ·  {} tokens in  /  {} tokens out  —  {}ms total",
        stats.total_pages,
        dim(&stats.input_tokens.to_string()),
        dim(&stats.output_tokens.to_string()),
        stats.total_duration_ms,
    );
    if stats.llm_attempts > 1 {
        eprintln!("   {} LLM attempts", stats.llm_attempts);
    }
}

/// Map CLI args to `DigestConfig`.
async fn build_config(
    cli: &Cli,
    layout: LayoutConfig,
    progress: Option<ProgressCallback>,
) -> Result<DigestConfig> {
    let mut builder = DigestConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .english_only(cli.english_only)
        .concurrency(cli.concurrency)
        .layout(layout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref endpoint) = cli.azure_endpoint {
        builder = builder.azure_endpoint(endpoint);
    }
    if let Some(ref version) = cli.azure_api_version {
        builder = builder.azure_api_version(version);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(ref path) = cli.prompt_template {
        builder = builder.prompt_template(read_template(path).await?);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn read_template(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read prompt template from {:?}", path))
}
