//! LLM interaction: build the chat messages and call the provider.
//!
//! Prompt wording lives in [`crate::prompts`]; this module owns the call
//! itself: options, per-attempt timeout, and retry with exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`, so 500 ms → 1 s → 2 s with the
//! defaults).

use crate::config::DigestConfig;
use crate::error::DigestError;
use crate::prompts::SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Result of one successful analysis call.
#[derive(Debug, Clone)]
pub struct AnalysisResponse {
    /// Raw completion text, before post-processing.
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    /// Total attempts made, including the successful one.
    pub attempts: u32,
}

/// Messages sent for an analysis: the role line, then the rendered prompt.
pub fn build_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)]
}

/// Send `prompt` to the provider and return the completion.
///
/// # Errors
/// * [`DigestError::ApiTimeout`] when the last attempt timed out
/// * [`DigestError::LlmApiError`] when every attempt failed
/// * [`DigestError::EmptyAnalysis`] when the provider answered with blank text
pub async fn analyze_prompt(
    provider: &Arc<dyn LLMProvider>,
    prompt: &str,
    config: &DigestConfig,
) -> Result<AnalysisResponse, DigestError> {
    let start = Instant::now();
    let messages = build_messages(prompt);
    let options = build_options(config);

    info!("Sending {} prompt chars to the LLM", prompt.len());

    let (response, attempts) = with_retries(
        config.max_retries,
        config.retry_backoff_ms,
        config.api_timeout_secs,
        || provider.chat(&messages, Some(&options)),
    )
    .await?;

    if response.content.trim().is_empty() {
        return Err(DigestError::EmptyAnalysis);
    }

    let duration = start.elapsed();
    debug!(
        "{} input tokens, {} output tokens, {:?}",
        response.prompt_tokens, response.completion_tokens, duration
    );

    Ok(AnalysisResponse {
        content: response.content,
        input_tokens: response.prompt_tokens,
        output_tokens: response.completion_tokens,
        duration_ms: duration.as_millis() as u64,
        attempts,
    })
}

/// Build `CompletionOptions` from the digest config.
fn build_options(config: &DigestConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

enum Failure {
    Timeout,
    Api(String),
}

/// Run `op` up to `max_retries + 1` times, each bounded by `timeout_secs`.
///
/// Returns the value and the number of attempts it took.
pub(crate) async fn with_retries<T, E, F, Fut>(
    max_retries: u32,
    backoff_ms: u64,
    timeout_secs: u64,
    mut op: F,
) -> Result<(T, u32), DigestError>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last = Failure::Api("no attempt made".to_string());

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff = backoff_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
            warn!("LLM retry {}/{} after {}ms", attempt, max_retries, backoff);
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(Duration::from_secs(timeout_secs), op()).await {
            Ok(Ok(value)) => return Ok((value, attempt + 1)),
            Ok(Err(e)) => {
                warn!("LLM attempt {} failed: {}", attempt + 1, e);
                last = Failure::Api(e.to_string());
            }
            Err(_) => {
                warn!("LLM attempt {} timed out after {}s", attempt + 1, timeout_secs);
                last = Failure::Timeout;
            }
        }
    }

    Err(match last {
        Failure::Timeout => DigestError::ApiTimeout { secs: timeout_secs },
        Failure::Api(message) => DigestError::LlmApiError {
            attempts: max_retries + 1,
            message,
        },
    })
}
