//! Configuration types for circular analysis.
//!
//! All analysis behaviour is controlled through [`DigestConfig`], built via
//! its [`DigestConfigBuilder`]. One struct holds every knob so a config can
//! be shared across tasks, logged, and compared between runs.

use crate::error::DigestError;
use crate::layout::{LayoutConfig, PageSize};
use crate::progress::ProgressCallback;
use crate::prompts;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for one analysis run.
///
/// Built via [`DigestConfig::builder()`] or using [`DigestConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_digest::DigestConfig;
///
/// let config = DigestConfig::builder()
///     .provider_name("azure")
///     .model("gpt-35-turbo")
///     .temperature(0.3)
///     .english_only(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DigestConfig {
    /// LLM model or deployment identifier, e.g. "gpt-35-turbo".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "azure", "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Azure OpenAI resource endpoint, e.g. `https://myres.openai.azure.com`.
    /// Falls back to `AZURE_OPENAI_ENDPOINT`.
    pub azure_endpoint: Option<String>,

    /// Azure OpenAI REST API version, e.g. "2023-05-15".
    /// Falls back to `AZURE_OPENAI_API_VERSION`, then the provider default.
    pub azure_api_version: Option<String>,

    /// Sampling temperature. Default: 0.3.
    ///
    /// Low enough that the section structure is stable between runs, high
    /// enough that the model rewrites rather than copies the circular.
    pub temperature: f32,

    /// Maximum tokens the model may generate for the analysis. Default: 2000.
    pub max_tokens: usize,

    /// Retry attempts on a failed provider call. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Timeout for the provider call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password, tried on every encrypted input.
    pub password: Option<String>,

    /// Custom prompt template. Must contain `{document_content}`.
    /// If None, uses [`prompts::DEFAULT_PROMPT_TEMPLATE`].
    pub prompt_template: Option<String>,

    /// Keep only English lines of the extracted text. Default: false.
    ///
    /// IRDAI circulars are often bilingual (Hindi and English side by
    /// side); sending both halves doubles the prompt for no gain.
    pub english_only: bool,

    /// What the language filter does when it would remove everything.
    pub empty_filter_policy: EmptyFilterPolicy,

    /// Documents extracted at once. Default: 4.
    pub concurrency: usize,

    /// PDF output options.
    pub layout: LayoutConfig,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            azure_endpoint: None,
            azure_api_version: None,
            temperature: 0.3,
            max_tokens: 2000,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            password: None,
            prompt_template: None,
            english_only: false,
            empty_filter_policy: EmptyFilterPolicy::default(),
            concurrency: 4,
            layout: LayoutConfig::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("azure_endpoint", &self.azure_endpoint)
            .field("azure_api_version", &self.azure_api_version)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("prompt_template", &self.prompt_template.as_ref().map(|t| t.len()))
            .field("english_only", &self.english_only)
            .field("empty_filter_policy", &self.empty_filter_policy)
            .field("concurrency", &self.concurrency)
            .field("layout", &self.layout)
            .finish()
    }
}

impl DigestConfig {
    /// Create a new builder for `DigestConfig`.
    pub fn builder() -> DigestConfigBuilder {
        DigestConfigBuilder {
            config: Self::default(),
        }
    }

    /// The template in effect.
    pub fn template(&self) -> &str {
        self.prompt_template
            .as_deref()
            .unwrap_or(prompts::DEFAULT_PROMPT_TEMPLATE)
    }
}

/// Builder for [`DigestConfig`].
#[derive(Debug)]
pub struct DigestConfigBuilder {
    config: DigestConfig,
}

impl DigestConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn azure_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.azure_endpoint = Some(endpoint.into());
        self
    }

    pub fn azure_api_version(mut self, version: impl Into<String>) -> Self {
        self.config.azure_api_version = Some(version.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn english_only(mut self, v: bool) -> Self {
        self.config.english_only = v;
        self
    }

    pub fn empty_filter_policy(mut self, policy: EmptyFilterPolicy) -> Self {
        self.config.empty_filter_policy = policy;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.layout.title = title.into();
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.layout.page_size = size;
        self
    }

    pub fn margin(mut self, points: f32) -> Self {
        self.config.layout.margin = points;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DigestConfig, DigestError> {
        let c = &self.config;
        if let Some(ref template) = c.prompt_template {
            if !prompts::has_placeholder(template) {
                return Err(DigestError::InvalidConfig(format!(
                    "prompt template must contain {}",
                    prompts::CONTENT_PLACEHOLDER
                )));
            }
        }
        if c.max_tokens == 0 {
            return Err(DigestError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(DigestError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if let Some(ref endpoint) = c.azure_endpoint {
            if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                return Err(DigestError::InvalidConfig(format!(
                    "azure endpoint must be an http(s) URL, got '{endpoint}'"
                )));
            }
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Outcome when the English-only filter finds no English line at all.
///
/// Scanned or Hindi-only circulars would otherwise reach the model as an
/// empty prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyFilterPolicy {
    /// Send the unfiltered text and log a warning. (default)
    #[default]
    KeepOriginal,
    /// Send nothing for that document.
    Drop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let c = DigestConfig::default();
        assert_eq!(c.temperature, 0.3);
        assert_eq!(c.max_tokens, 2000);
        assert!(!c.english_only);
        assert_eq!(c.empty_filter_policy, EmptyFilterPolicy::KeepOriginal);
        assert_eq!(c.template(), prompts::DEFAULT_PROMPT_TEMPLATE);
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let err = DigestConfig::builder()
            .prompt_template("Summarise this.")
            .build()
            .unwrap_err();
        assert!(matches!(err, DigestError::InvalidConfig(_)));
    }

    #[test]
    fn custom_template_is_used() {
        let c = DigestConfig::builder()
            .prompt_template("Summarise:\n{document_content}")
            .build()
            .unwrap();
        assert_eq!(c.template(), "Summarise:\n{document_content}");
    }

    #[test]
    fn temperature_is_clamped() {
        let c = DigestConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn concurrency_floor_is_one() {
        let c = DigestConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn bad_margin_fails_build() {
        let err = DigestConfig::builder().margin(400.0).build().unwrap_err();
        assert!(matches!(err, DigestError::InvalidConfig(_)));
    }

    #[test]
    fn azure_settings_are_kept() {
        let c = DigestConfig::builder()
            .azure_endpoint("https://irdai-res.openai.azure.com/")
            .azure_api_version("2023-07-01-preview")
            .build()
            .unwrap();
        assert_eq!(c.azure_endpoint.as_deref(), Some("https://irdai-res.openai.azure.com/"));
        assert_eq!(c.azure_api_version.as_deref(), Some("2023-07-01-preview"));
    }

    #[test]
    fn azure_endpoint_must_be_a_url() {
        let err = DigestConfig::builder()
            .azure_endpoint("irdai-res.openai.azure.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, DigestError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_password() {
        let c = DigestConfig::builder().password("s3cret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("s3cret"));
    }
}
