//! Analysis entry points.
//!
//! [`analyze`] runs the whole pipeline over a batch of circulars and waits
//! for the single LLM answer. A document that fails to load is recorded in
//! [`DigestOutput::errors`] and skipped; the run fails only when none loads.

use crate::config::DigestConfig;
use crate::error::{DigestError, DocumentError};
use crate::output::{
    render_analysis, DigestOutput, DigestStats, DocumentMetadata, OutputFormat, SourceDocument,
};
use crate::pipeline::{extract, input, language, llm, postprocess};
use crate::prompts;
use edgequake_llm::{AzureOpenAIProvider, LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default deployment when Azure OpenAI is picked from the environment.
const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-35-turbo";

/// Default model for every other named provider.
const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Analyze one or more PDF files or URLs.
///
/// # Errors
/// Returns `Err(DigestError)` only for fatal errors:
/// - no provider could be configured
/// - none of the documents loaded, or none had any text
/// - the LLM call failed after all retries, or returned nothing
pub async fn analyze<S>(inputs: &[S], config: &DigestConfig) -> Result<DigestOutput, DigestError>
where
    S: AsRef<str> + Sync,
{
    let total_start = Instant::now();
    info!("Starting analysis of {} document(s)", inputs.len());

    if inputs.is_empty() {
        return Err(DigestError::NoDocumentsLoaded {
            total: 0,
            first_error: "no input documents given".to_string(),
        });
    }

    // ── Step 1: Provider (before any slow extraction) ────────────────────
    let provider = resolve_provider(config)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start(inputs.len());
    }

    // ── Step 2: Load documents ───────────────────────────────────────────
    let extract_start = Instant::now();
    let (documents, errors) = load_documents(inputs, config).await;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    if documents.is_empty() {
        let first_error = errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(DigestError::NoDocumentsLoaded {
            total: inputs.len(),
            first_error,
        });
    }

    // ── Step 3: Combine text ─────────────────────────────────────────────
    let combined = prompts::combine_documents(documents.iter().map(|d| d.text.as_str()));
    if combined.trim().is_empty() {
        return Err(DigestError::NoExtractableText {
            documents: documents.len(),
        });
    }

    // ── Step 4: Prompt + LLM + cleanup ───────────────────────────────────
    let mut output = run_analysis(&provider, &combined, config).await?;

    output.stats.documents_requested = inputs.len();
    output.stats.documents_loaded = documents.len();
    output.stats.documents_failed = errors.len();
    output.stats.total_pages = documents.iter().map(SourceDocument::page_count).sum();
    output.stats.extract_duration_ms = extract_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    output.documents = documents;
    output.errors = errors;

    info!(
        "Analysis complete: {}/{} documents, {} output chars, {}ms total",
        output.stats.documents_loaded,
        output.stats.documents_requested,
        output.analysis.len(),
        output.stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_complete(output.stats.documents_loaded, output.stats.documents_failed);
    }

    Ok(output)
}

/// Analyze text that has already been extracted.
///
/// Skips PDF loading and the language filter.
pub async fn analyze_text(text: &str, config: &DigestConfig) -> Result<DigestOutput, DigestError> {
    let start = Instant::now();
    if text.trim().is_empty() {
        return Err(DigestError::NoExtractableText { documents: 0 });
    }
    let provider = resolve_provider(config)?;
    let mut output = run_analysis(&provider, text, config).await?;
    output.stats.total_duration_ms = start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Analyze and write the result to `output_path`.
///
/// The format is `format` when given, otherwise inferred from the file
/// extension, otherwise Markdown. The file is written atomically, and only
/// after rendering succeeded.
pub async fn analyze_to_file<S>(
    inputs: &[S],
    output_path: impl AsRef<Path>,
    format: Option<OutputFormat>,
    config: &DigestConfig,
) -> Result<DigestStats, DigestError>
where
    S: AsRef<str> + Sync,
{
    let path = output_path.as_ref();
    let format = format
        .or_else(|| OutputFormat::from_path(path))
        .unwrap_or_default();

    let output = analyze(inputs, config).await?;
    let bytes = render_analysis(&output.analysis, format, &config.layout, false)?;
    write_atomic(path, &bytes).await?;
    info!("Wrote {} ({} bytes, {})", path.display(), bytes.len(), format);

    Ok(output.stats)
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync<S>(inputs: &[S], config: &DigestConfig) -> Result<DigestOutput, DigestError>
where
    S: AsRef<str> + Sync,
{
    tokio::runtime::Runtime::new()
        .map_err(|e| DigestError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(inputs, config))
}

/// Analyze a PDF held in memory.
///
/// The bytes go to a managed temp file that is removed on return.
///
/// # Example
/// ```rust,no_run
/// use edgequake_digest::{analyze_from_bytes, DigestConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("circular.pdf")?;
/// let output = analyze_from_bytes(&bytes, &DigestConfig::default()).await?;
/// println!("{}", output.analysis);
/// # Ok(())
/// # }
/// ```
pub async fn analyze_from_bytes(
    bytes: &[u8],
    config: &DigestConfig,
) -> Result<DigestOutput, DigestError> {
    let resolved = input::resolve_bytes(bytes)?;
    let path = resolved.path().to_string_lossy().to_string();
    let mut output = analyze(&[path], config).await?;
    for doc in &mut output.documents {
        doc.name = "memory.pdf".to_string();
        doc.source = "<memory>".to_string();
    }
    // `resolved` is dropped (and the file deleted) here
    Ok(output)
}

/// Extract PDF metadata without analyzing content.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, DigestError> {
    let config = DigestConfig::default();
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    extract::extract_metadata(resolved.path(), None).await
}

/// Resolve, extract and filter every input.
///
/// Up to `config.concurrency` documents load at once. Both returned lists
/// are in input order.
pub async fn load_documents<S>(
    inputs: &[S],
    config: &DigestConfig,
) -> (Vec<SourceDocument>, Vec<DocumentError>)
where
    S: AsRef<str> + Sync,
{
    let mut results: Vec<(usize, String, Result<SourceDocument, DigestError>)> =
        stream::iter(inputs.iter().enumerate().map(|(index, source)| {
            let source = source.as_ref();
            async move {
                let name = input::display_name(source);
                let result = load_document(index, source, &name, config).await;
                if let Some(ref cb) = config.progress_callback {
                    match &result {
                        Ok(doc) => cb.on_document_loaded(index, &doc.name, doc.page_count()),
                        Err(e) => cb.on_document_error(index, &name, &e.to_string()),
                    }
                }
                (index, name, result)
            }
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(index, _, _)| *index);

    let mut documents = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (_, name, result) in results {
        match result {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                errors.push(DocumentError::from_digest_error(&name, &e));
            }
        }
    }
    (documents, errors)
}

/// Write `bytes` to `path` via a temp file and rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DigestError> {
    let write_err = |source| DigestError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn load_document(
    index: usize,
    source: &str,
    name: &str,
    config: &DigestConfig,
) -> Result<SourceDocument, DigestError> {
    let resolved = input::resolve_input(source, config.download_timeout_secs).await?;
    let extracted = extract::extract_document(resolved.path(), config.password.as_deref()).await?;

    let raw = prompts::combine_documents(extracted.pages.iter().map(String::as_str));
    let text = if config.english_only {
        language::filter_english(&raw, config.empty_filter_policy)
    } else {
        raw
    };
    debug!(
        "{}: {} pages, {} chars for the prompt",
        name,
        extracted.pages.len(),
        text.len()
    );

    Ok(SourceDocument {
        index,
        name: name.to_string(),
        source: source.to_string(),
        pages: extracted.pages,
        text,
        metadata: extracted.metadata,
    })
}

/// Prompt, call and clean. Stats cover the LLM stage only.
async fn run_analysis(
    provider: &Arc<dyn LLMProvider>,
    content: &str,
    config: &DigestConfig,
) -> Result<DigestOutput, DigestError> {
    let prompt = prompts::render_prompt(config.template(), content);
    if let Some(ref cb) = config.progress_callback {
        cb.on_llm_start(prompt.len());
    }

    let response = llm::analyze_prompt(provider, &prompt, config).await?;
    let analysis = postprocess::clean_analysis(&response.content);

    if let Some(ref cb) = config.progress_callback {
        cb.on_llm_complete(analysis.len());
    }

    Ok(DigestOutput {
        analysis,
        documents: Vec::new(),
        errors: Vec::new(),
        stats: DigestStats {
            prompt_chars: prompt.len(),
            input_tokens: response.input_tokens as u64,
            output_tokens: response.output_tokens as u64,
            llm_attempts: response.attempts,
            llm_duration_ms: response.duration_ms,
            ..DigestStats::default()
        },
    })
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, DigestError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DigestError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn is_azure(provider_name: &str) -> bool {
    matches!(
        provider_name.to_ascii_lowercase().as_str(),
        "azure" | "azure-openai" | "azure_openai"
    )
}

/// Connection settings for an Azure OpenAI deployment.
#[derive(Debug, Clone, PartialEq)]
struct AzureSettings {
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: Option<String>,
}

/// Config values first, then the `AZURE_OPENAI_*` variables read via `env`.
fn azure_settings(
    config: &DigestConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AzureSettings, DigestError> {
    let not_configured = |hint: &str| DigestError::ProviderNotConfigured {
        provider: "azure".to_string(),
        hint: hint.to_string(),
    };

    let endpoint = config
        .azure_endpoint
        .clone()
        .or_else(|| env("AZURE_OPENAI_ENDPOINT"))
        .ok_or_else(|| not_configured("Set AZURE_OPENAI_ENDPOINT or pass --azure-endpoint."))?;
    let api_key = env("AZURE_OPENAI_API_KEY")
        .ok_or_else(|| not_configured("Set AZURE_OPENAI_API_KEY."))?;
    let deployment = config
        .model
        .clone()
        .or_else(|| env("AZURE_OPENAI_DEPLOYMENT_NAME"))
        .unwrap_or_else(|| DEFAULT_AZURE_DEPLOYMENT.to_string());
    let api_version = config
        .azure_api_version
        .clone()
        .or_else(|| env("AZURE_OPENAI_API_VERSION"));

    Ok(AzureSettings {
        endpoint,
        api_key,
        deployment,
        api_version,
    })
}

fn create_azure_provider(settings: AzureSettings) -> Arc<dyn LLMProvider> {
    info!(
        "Using Azure OpenAI deployment '{}' at {} (API version {})",
        settings.deployment,
        settings.endpoint,
        settings.api_version.as_deref().unwrap_or("default")
    );
    let mut provider =
        AzureOpenAIProvider::new(settings.endpoint, settings.api_key, settings.deployment);
    if let Some(version) = settings.api_version {
        provider = provider.with_api_version(version);
    }
    Arc::new(provider)
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Azure OpenAI** when `AZURE_OPENAI_API_KEY` is set; the deployment is
///    `config.model`, then `AZURE_OPENAI_DEPLOYMENT_NAME`, then `gpt-35-turbo`.
///    Endpoint and API version come from the config, then
///    `AZURE_OPENAI_ENDPOINT` and `AZURE_OPENAI_API_VERSION`.
/// 5. **OpenAI** when `OPENAI_API_KEY` is set.
/// 6. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &DigestConfig) -> Result<Arc<dyn LLMProvider>, DigestError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        if is_azure(name) {
            return azure_settings(config, env_non_empty).map(create_azure_provider);
        }
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Some(prov), Some(model)) = (
        env_non_empty("EDGEQUAKE_LLM_PROVIDER"),
        env_non_empty("EDGEQUAKE_MODEL"),
    ) {
        return create_provider(&prov, &model);
    }

    if env_non_empty("AZURE_OPENAI_API_KEY").is_some() {
        return azure_settings(config, env_non_empty).map(create_azure_provider);
    }

    if env_non_empty("OPENAI_API_KEY").is_some() {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DigestError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set AZURE_OPENAI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::AnalysisProgressCallback;
    use edgequake_llm::{ChatMessage, CompletionOptions, LLMResponse, LlmError};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Answers every chat with `answer`, after failing `failures` times.
    struct CannedProvider {
        answer: String,
        failures: AtomicU32,
        seen: Mutex<Vec<ChatMessage>>,
    }

    impl CannedProvider {
        fn new(answer: &str, failures: u32) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.to_string(),
                failures: AtomicU32::new(failures),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LLMProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-model"
        }

        fn max_context_length(&self) -> usize {
            128_000
        }

        async fn complete(&self, prompt: &str) -> edgequake_llm::Result<LLMResponse> {
            self.chat(&[ChatMessage::user(prompt)], None).await
        }

        async fn complete_with_options(
            &self,
            prompt: &str,
            _options: &CompletionOptions,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.complete(prompt).await
        }

        async fn chat(
            &self,
            messages: &[ChatMessage],
            _options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.seen.lock().unwrap().extend(messages.iter().cloned());
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(LlmError::NetworkError("connection reset".into()));
            }
            Ok(LLMResponse::new(self.answer.clone(), "canned-model").with_usage(120, 45))
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl AnalysisProgressCallback for Recorder {
        fn on_llm_start(&self, prompt_chars: usize) {
            self.events.lock().unwrap().push(format!("llm_start:{prompt_chars}"));
        }

        fn on_llm_complete(&self, output_chars: usize) {
            self.events.lock().unwrap().push(format!("llm_complete:{output_chars}"));
        }
    }

    const FENCED_ANSWER: &str = "```markdown\n# IRDAI Circular Analysis\n\n\n\
        * Scope: all insurers\n##### Deadline\n- 31-Mar-2024\n```";

    #[tokio::test]
    async fn analyze_text_fills_template_and_cleans_answer() {
        let provider = CannedProvider::new(FENCED_ANSWER, 0);
        let recorder = Arc::new(Recorder::default());
        let config = DigestConfig::builder()
            .provider(provider.clone())
            .prompt_template("Circular:\n{document_content}")
            .progress_callback(recorder.clone())
            .build()
            .unwrap();

        let output = analyze_text("Insurers shall file returns.", &config)
            .await
            .unwrap();

        assert_eq!(
            output.analysis,
            "## IRDAI Circular Analysis\n\n- Scope: all insurers\n#### Deadline\n- 31-Mar-2024\n"
        );

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].content, prompts::SYSTEM_PROMPT);
        assert_eq!(seen[1].content, "Circular:\nInsurers shall file returns.");

        let prompt_chars = seen[1].content.len();
        assert_eq!(output.stats.prompt_chars, prompt_chars);
        assert_eq!(output.stats.input_tokens, 120);
        assert_eq!(output.stats.output_tokens, 45);
        assert_eq!(output.stats.llm_attempts, 1);
        assert!(output.documents.is_empty());

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                format!("llm_start:{prompt_chars}"),
                format!("llm_complete:{}", output.analysis.len()),
            ]
        );
    }

    #[tokio::test]
    async fn transient_provider_failure_is_retried() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("edgequake_digest=debug")
            .with_test_writer()
            .try_init();
        let provider = CannedProvider::new("## Scope\nAll insurers", 1);
        let config = DigestConfig::builder()
            .provider(provider.clone())
            .retry_backoff_ms(1)
            .build()
            .unwrap();

        let output = analyze_text("Body", &config).await.unwrap();
        assert_eq!(output.analysis, "## Scope\nAll insurers\n");
        assert_eq!(output.stats.llm_attempts, 2);
        // system + user on each attempt
        assert_eq!(provider.seen.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn blank_answer_is_an_error() {
        let config = DigestConfig::builder()
            .provider(CannedProvider::new("  \n", 0))
            .build()
            .unwrap();
        let err = analyze_text("Body", &config).await.unwrap_err();
        assert!(matches!(err, DigestError::EmptyAnalysis));
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn azure_settings_prefer_config_over_env() {
        let config = DigestConfig::builder()
            .azure_endpoint("https://cfg.openai.azure.com")
            .azure_api_version("2023-08-01-preview")
            .model("gpt-4o-circulars")
            .build()
            .unwrap();
        let env = env_from(&[
            ("AZURE_OPENAI_ENDPOINT", "https://env.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "key"),
            ("AZURE_OPENAI_DEPLOYMENT_NAME", "env-deployment"),
            ("AZURE_OPENAI_API_VERSION", "2023-05-15"),
        ]);
        let s = azure_settings(&config, env).unwrap();
        assert_eq!(s.endpoint, "https://cfg.openai.azure.com");
        assert_eq!(s.deployment, "gpt-4o-circulars");
        assert_eq!(s.api_version.as_deref(), Some("2023-08-01-preview"));
    }

    #[test]
    fn azure_settings_fall_back_to_env_and_defaults() {
        let env = env_from(&[
            ("AZURE_OPENAI_ENDPOINT", "https://env.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "key"),
        ]);
        let s = azure_settings(&DigestConfig::default(), env).unwrap();
        assert_eq!(s.endpoint, "https://env.openai.azure.com");
        assert_eq!(s.api_key, "key");
        assert_eq!(s.deployment, DEFAULT_AZURE_DEPLOYMENT);
        assert_eq!(s.api_version, None);
    }

    #[test]
    fn azure_without_endpoint_is_not_configured() {
        let env = env_from(&[("AZURE_OPENAI_API_KEY", "key")]);
        let err = azure_settings(&DigestConfig::default(), env).unwrap_err();
        match err {
            DigestError::ProviderNotConfigured { provider, hint } => {
                assert_eq!(provider, "azure");
                assert!(hint.contains("AZURE_OPENAI_ENDPOINT"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn azure_provider_uses_the_deployment() {
        let provider = create_azure_provider(AzureSettings {
            endpoint: "https://irdai-res.openai.azure.com".into(),
            api_key: "key".into(),
            deployment: "gpt-35-turbo".into(),
            api_version: Some("2023-05-15".into()),
        });
        assert_eq!(provider.model(), "gpt-35-turbo");
    }

    #[test]
    fn azure_name_aliases() {
        assert!(is_azure("azure"));
        assert!(is_azure("Azure-OpenAI"));
        assert!(!is_azure("openai"));
    }

    #[tokio::test]
    async fn write_atomic_creates_parent_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("irdai_circular_analysis.md");
        write_atomic(&path, b"## Scope\n").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"## Scope\n");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn failed_documents_are_collected_in_order() {
        let config = DigestConfig::builder().concurrency(2).build().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let not_pdf = dir.path().join("notes.pdf");
        std::fs::write(&not_pdf, b"plain text").unwrap();

        let inputs = vec![
            "/nonexistent/a.pdf".to_string(),
            not_pdf.to_string_lossy().to_string(),
            "/nonexistent/c.pdf".to_string(),
        ];
        let (docs, errors) = load_documents(&inputs, &config).await;
        assert!(docs.is_empty());
        let names: Vec<&str> = errors.iter().map(DocumentError::name).collect();
        assert_eq!(names, vec!["a.pdf", "notes.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_provider() {
        let err = analyze_text("   \n", &DigestConfig::default()).await.unwrap_err();
        assert!(matches!(err, DigestError::NoExtractableText { .. }));
    }

    #[tokio::test]
    async fn no_inputs_is_fatal() {
        let inputs: Vec<String> = Vec::new();
        let err = analyze(&inputs, &DigestConfig::default()).await.unwrap_err();
        assert!(matches!(err, DigestError::NoDocumentsLoaded { total: 0, .. }));
    }

    #[test]
    fn sync_wrapper_surfaces_fatal_errors() {
        let inputs: Vec<&str> = Vec::new();
        let err = analyze_sync(&inputs, &DigestConfig::default()).unwrap_err();
        assert!(matches!(err, DigestError::NoDocumentsLoaded { .. }));
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.txt");
        std::fs::write(&path, b"old").unwrap();
        tokio_test::block_on(write_atomic(&path, b"new")).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }
}
